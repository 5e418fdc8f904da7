// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 运行参数: 命令行 (clap) + 可选的 JSON 配置文件

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::detection::{NmsMode, PostprocessConfig};
use crate::error::{Error, Result};

/// 默认置信度阈值
pub const DEFAULT_MIN_PROBABILITY: f32 = 0.5;
/// 默认 NMS IoU 阈值
pub const DEFAULT_IOU_THRESHOLD: f32 = 0.3;
/// 默认推理输入尺寸
pub const DEFAULT_INPUT_SIZE: u32 = 256;
/// 每隔多少帧保存一次快照
pub const DEFAULT_SNAPSHOT_EVERY: u64 = 60;

/// YOLOv4 实时检测参数
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "YOLOv4 实时目标检测", long_about = None)]
pub struct Args {
    /// 输入源: 摄像头索引 (0 / camera:0), MJPEG 地址 (http://...), 图片或图片目录 [默认: 0]
    #[arg(short, long)]
    pub source: Option<String>,

    /// ONNX 模型路径 [默认: models/yolov4.onnx]
    #[arg(short, long)]
    pub model: Option<String>,

    /// 类别名称文件 (每行一个) [默认: models/yolov4.names]
    #[arg(short, long)]
    pub names: Option<String>,

    /// JSON 配置文件, 命令行参数优先
    #[arg(long)]
    pub config: Option<String>,

    /// 置信度阈值
    #[arg(long)]
    pub conf: Option<f32>,

    /// NMS IoU 阈值
    #[arg(long)]
    pub iou: Option<f32>,

    /// 推理输入宽度
    #[arg(long)]
    pub width: Option<u32>,

    /// 推理输入高度
    #[arg(long)]
    pub height: Option<u32>,

    /// 按类别分别做 NMS (默认所有类别一起)
    #[arg(long)]
    pub per_class_nms: bool,

    /// 使用 CUDA
    #[arg(long)]
    pub cuda: bool,

    /// 使用 TensorRT
    #[arg(long)]
    pub trt: bool,

    /// GPU 设备ID [默认: 0]
    #[arg(long)]
    pub device_id: Option<i32>,

    /// 快照输出目录 (启动时清空)
    #[arg(short, long)]
    pub output_dir: Option<String>,

    /// 每隔N帧保存一张半分辨率快照, 0 表示不保存
    #[arg(long)]
    pub snapshot_every: Option<u64>,

    /// 标签字体 (ttf/otf)
    #[arg(long)]
    pub font: Option<String>,

    /// 无窗口模式
    #[arg(long)]
    pub headless: bool,

    /// 处理N帧后退出
    #[arg(long)]
    pub max_frames: Option<u64>,

    /// 读帧失败后的重连次数, 0 表示直接退出
    #[arg(long)]
    pub reconnect_retries: Option<u32>,

    /// 重连退避时间 (毫秒, 按次数递增)
    #[arg(long)]
    pub reconnect_backoff_ms: Option<u64>,

    /// 打印各阶段耗时
    #[arg(long)]
    pub profile: bool,
}

/// 推理后端 (Execution Provider)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionProvider {
    #[default]
    Cpu,
    Cuda,
    TensorRt,
}

/// 读帧失败后的重连策略
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl ReconnectPolicy {
    /// 直接失败, 不重连
    pub fn fatal() -> Self {
        Self {
            max_retries: 0,
            backoff: Duration::ZERO,
        }
    }

    /// 第 `attempt` 次重连前的等待时间
    pub fn delay(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(attempt)
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::fatal()
    }
}

/// 输入源
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputSource {
    /// 本地摄像头
    Camera(usize),
    /// 网络 MJPEG 流
    Mjpeg(String),
    /// 单张图片或图片目录
    Images(PathBuf),
}

impl InputSource {
    pub fn parse(source: &str) -> Self {
        let source = source.trim();
        if source.starts_with("http://") || source.starts_with("https://") {
            return InputSource::Mjpeg(source.to_string());
        }
        let index = source.strip_prefix("camera:").unwrap_or(source);
        match index.parse::<usize>() {
            Ok(index) => InputSource::Camera(index),
            Err(_) => InputSource::Images(PathBuf::from(source)),
        }
    }
}

/// 检测流水线配置 (JSON文件字段, 缺省取默认值)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub source: String,
    pub model: String,
    pub names: String,
    pub min_probability: f32,
    pub iou_threshold: f32,
    pub per_class_nms: bool,
    pub input_width: u32,
    pub input_height: u32,
    pub provider: ExecutionProvider,
    pub device_id: i32,
    pub output_dir: String,
    pub snapshot_every: u64,
    pub font: Option<String>,
    pub headless: bool,
    pub max_frames: Option<u64>,
    pub reconnect_retries: u32,
    pub reconnect_backoff_ms: u64,
    pub profile: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source: "0".to_string(),
            model: "models/yolov4.onnx".to_string(),
            names: "models/yolov4.names".to_string(),
            min_probability: DEFAULT_MIN_PROBABILITY,
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            per_class_nms: false,
            input_width: DEFAULT_INPUT_SIZE,
            input_height: DEFAULT_INPUT_SIZE,
            provider: ExecutionProvider::Cpu,
            device_id: 0,
            output_dir: "out".to_string(),
            snapshot_every: DEFAULT_SNAPSHOT_EVERY,
            font: None,
            headless: false,
            max_frames: None,
            reconnect_retries: 0,
            reconnect_backoff_ms: 1000,
            profile: false,
        }
    }
}

impl PipelineConfig {
    /// 从JSON文件加载配置
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        log::info!("✅ 配置已从 {} 加载", path.display());
        Ok(config)
    }

    /// 命令行参数 (+ 可选配置文件) → 配置, 命令行优先
    pub fn from_args(args: &Args) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_args(args);
        config.validate()?;
        Ok(config)
    }

    fn apply_args(&mut self, args: &Args) {
        // 只覆盖命令行显式给出的参数
        if let Some(source) = &args.source {
            self.source = source.clone();
        }
        if let Some(model) = &args.model {
            self.model = model.clone();
        }
        if let Some(names) = &args.names {
            self.names = names.clone();
        }
        if let Some(conf) = args.conf {
            self.min_probability = conf;
        }
        if let Some(iou) = args.iou {
            self.iou_threshold = iou;
        }
        if let Some(width) = args.width {
            self.input_width = width;
        }
        if let Some(height) = args.height {
            self.input_height = height;
        }
        if args.per_class_nms {
            self.per_class_nms = true;
        }
        if args.trt {
            self.provider = ExecutionProvider::TensorRt;
        } else if args.cuda {
            self.provider = ExecutionProvider::Cuda;
        }
        if let Some(device_id) = args.device_id {
            self.device_id = device_id;
        }
        if let Some(dir) = &args.output_dir {
            self.output_dir = dir.clone();
        }
        if let Some(every) = args.snapshot_every {
            self.snapshot_every = every;
        }
        if args.font.is_some() {
            self.font = args.font.clone();
        }
        if args.headless {
            self.headless = true;
        }
        if args.max_frames.is_some() {
            self.max_frames = args.max_frames;
        }
        if let Some(retries) = args.reconnect_retries {
            self.reconnect_retries = retries;
        }
        if let Some(ms) = args.reconnect_backoff_ms {
            self.reconnect_backoff_ms = ms;
        }
        if args.profile {
            self.profile = true;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.min_probability) {
            return Err(Error::Config(format!(
                "置信度阈值必须在 [0, 1] 内: {}",
                self.min_probability
            )));
        }
        if !(0.0..=1.0).contains(&self.iou_threshold) {
            return Err(Error::Config(format!(
                "IoU 阈值必须在 [0, 1] 内: {}",
                self.iou_threshold
            )));
        }
        if self.input_width == 0 || self.input_height == 0 {
            return Err(Error::Config(format!(
                "推理输入尺寸不能为0: {}x{}",
                self.input_width, self.input_height
            )));
        }
        Ok(())
    }

    pub fn input_source(&self) -> InputSource {
        InputSource::parse(&self.source)
    }

    pub fn postprocess(&self) -> PostprocessConfig {
        PostprocessConfig {
            min_probability: self.min_probability,
            iou_threshold: self.iou_threshold,
            nms_mode: if self.per_class_nms {
                NmsMode::PerClass
            } else {
                NmsMode::ClassAgnostic
            },
        }
    }

    pub fn reconnect(&self) -> ReconnectPolicy {
        ReconnectPolicy {
            max_retries: self.reconnect_retries,
            backoff: Duration::from_millis(self.reconnect_backoff_ms),
        }
    }

    /// 打印当前配置
    pub fn print_summary(&self) {
        log::info!("🎛️  当前配置:");
        log::info!("  输入源: {}", self.source);
        log::info!("  模型: {} ({:?}, device {})", self.model, self.provider, self.device_id);
        log::info!("  类别文件: {}", self.names);
        log::info!(
            "  置信度阈值: {:.2} | IoU阈值: {:.2} | NMS: {}",
            self.min_probability,
            self.iou_threshold,
            if self.per_class_nms { "按类别" } else { "全部类别" }
        );
        log::info!("  推理尺寸: {}x{}", self.input_width, self.input_height);
        log::info!(
            "  快照: {} (每 {} 帧)",
            self.output_dir,
            self.snapshot_every
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["yolov4"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::from_args(&args(&[])).unwrap();
        assert_eq!(config.min_probability, 0.5);
        assert_eq!(config.iou_threshold, 0.3);
        assert_eq!((config.input_width, config.input_height), (256, 256));
        assert_eq!(config.snapshot_every, 60);
        assert_eq!(config.provider, ExecutionProvider::Cpu);
        assert_eq!(config.reconnect().max_retries, 0);
        assert_eq!(config.source, "0");
        assert_eq!(config.model, "models/yolov4.onnx");
        assert_eq!(config.postprocess().nms_mode, NmsMode::ClassAgnostic);
    }

    #[test]
    fn test_cli_overrides() {
        let config = PipelineConfig::from_args(&args(&[
            "--conf",
            "0.25",
            "--iou",
            "0.45",
            "--cuda",
            "--per-class-nms",
            "--source",
            "http://192.168.4.1:81/stream",
        ]))
        .unwrap();
        assert_eq!(config.min_probability, 0.25);
        assert_eq!(config.iou_threshold, 0.45);
        assert_eq!(config.provider, ExecutionProvider::Cuda);
        assert_eq!(config.postprocess().nms_mode, NmsMode::PerClass);
        assert_eq!(
            config.input_source(),
            InputSource::Mjpeg("http://192.168.4.1:81/stream".to_string())
        );
    }

    #[test]
    fn test_cli_default_values_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{ "source": "camera:3", "model": "a.onnx", "names": "a.names", "device_id": 2 }"#,
        )
        .unwrap();
        let path = path.to_string_lossy().into_owned();

        let config = PipelineConfig::from_args(&args(&[
            "--config",
            &path,
            "--source",
            "0",
            "--model",
            "models/yolov4.onnx",
            "--names",
            "models/yolov4.names",
            "--device-id",
            "0",
        ]))
        .unwrap();
        assert_eq!(config.input_source(), InputSource::Camera(0));
        assert_eq!(config.model, "models/yolov4.onnx");
        assert_eq!(config.names, "models/yolov4.names");
        assert_eq!(config.device_id, 0);

        let from_file = PipelineConfig::from_args(&args(&["--config", &path])).unwrap();
        assert_eq!(from_file.input_source(), InputSource::Camera(3));
        assert_eq!(from_file.device_id, 2);
    }

    #[test]
    fn test_invalid_threshold() {
        assert!(matches!(
            PipelineConfig::from_args(&args(&["--conf", "1.5"])),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            PipelineConfig::from_args(&args(&["--width", "0"])),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_input_source_parse() {
        assert_eq!(InputSource::parse("0"), InputSource::Camera(0));
        assert_eq!(InputSource::parse("camera:2"), InputSource::Camera(2));
        assert_eq!(
            InputSource::parse("https://cam/stream"),
            InputSource::Mjpeg("https://cam/stream".to_string())
        );
        assert_eq!(
            InputSource::parse("frames/"),
            InputSource::Images(PathBuf::from("frames/"))
        );
    }

    #[test]
    fn test_reconnect_delay() {
        let policy = ReconnectPolicy {
            max_retries: 3,
            backoff: Duration::from_millis(100),
        };
        assert_eq!(policy.delay(3), Duration::from_millis(300));
    }
}
