// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

/// YOLOv4 实时目标检测
///
/// 摄像头 / MJPEG 流 → YOLOv4 → 置信度过滤 + NMS → 标注 → 显示窗口, 每 60 帧保存半分辨率快照.
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use yolov4_rs::detection::{ClassRegistry, LabelBinder, Postprocessor};
use yolov4_rs::input;
use yolov4_rs::renderer::Annotator;
use yolov4_rs::renderer_macroquad::{run_windowed, window_conf};
use yolov4_rs::{runtime, Args, CancellationToken, Model, Pipeline, PipelineConfig, RunContext};

const WINDOW_WIDTH: i32 = 1280;
const WINDOW_HEIGHT: i32 = 720;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("❌ {:#}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(feature = "ort-backend")]
fn build_model(config: &PipelineConfig) -> anyhow::Result<Box<dyn Model>> {
    let model = yolov4_rs::YOLOv4::new(config)
        .with_context(|| format!("加载模型失败: {}", config.model))?;
    Ok(Box::new(model))
}

#[cfg(not(feature = "ort-backend"))]
fn build_model(config: &PipelineConfig) -> anyhow::Result<Box<dyn Model>> {
    anyhow::bail!(
        "无法加载模型 {}: 编译时未启用 `ort-backend` 特性",
        config.model
    )
}

fn run(args: Args) -> anyhow::Result<()> {
    let config = PipelineConfig::from_args(&args).context("配置无效")?;

    let token = CancellationToken::new();
    {
        let token = token.clone();
        ctrlc::set_handler(move || {
            log::info!("🛑 收到 Ctrl-C, 正在退出...");
            token.cancel();
        })
        .context("注册 Ctrl-C 处理失败")?;
    }

    let snapshots = runtime::initialize(&config);

    let registry = ClassRegistry::load(&config.names);
    log::info!("🏷️  类别数: {}", registry.len());
    let postprocessor = Postprocessor::new(
        config.postprocess(),
        LabelBinder::with_random_colors(registry),
    );

    let model = build_model(&config)?;
    model.summary();

    let source = input::open_source(&config.input_source())
        .with_context(|| format!("打开输入源失败: {}", config.source))?;
    let annotator = Annotator::from_font_path(config.font.as_deref());

    let mut pipeline = Pipeline::new(source, model, postprocessor, annotator, snapshots)
        .with_reconnect(config.reconnect())
        .with_profile(config.profile);
    let ctx = RunContext::new(token).with_max_frames(config.max_frames);

    if config.headless {
        let stats = pipeline.run(&ctx)?;
        runtime::shutdown(&stats);
        return Ok(());
    }

    let conf = window_conf("YOLOv4", WINDOW_WIDTH, WINDOW_HEIGHT);
    macroquad::Window::from_config(conf, async move {
        match run_windowed(&mut pipeline, &ctx).await {
            Ok(stats) => runtime::shutdown(&stats),
            Err(e) => {
                log::error!("❌ {}", e);
                std::process::exit(1);
            }
        }
    });
    Ok(())
}
