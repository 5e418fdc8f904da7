// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 摄像头输入模块
//!
//! 处理本地摄像头输入,支持 DirectShow(Windows) / AVFoundation(macOS) / V4L2(Linux).
//! FFmpeg 在独立线程中解码, 帧经有界通道送到管线.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{bounded, Receiver};
use ez_ffmpeg::core::context::null_output::create_null_output;
use ez_ffmpeg::filter::frame_pipeline_builder::FramePipelineBuilder;
use ez_ffmpeg::{AVMediaType, FfmpegContext, Input};
use image::RgbImage;

use super::decode_filter::DecodeFilter;
use super::FrameSource;
use crate::error::{Error, Result};

/// 通道容量, 满时丢帧
const FRAME_QUEUE: usize = 2;

/// 摄像头帧来源
pub struct CameraSource {
    device_index: usize,
    rx: Receiver<RgbImage>,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl CameraSource {
    pub fn open(device_index: usize) -> Result<Self> {
        let (rx, stop, worker) = spawn_decoder(device_index)?;
        Ok(Self {
            device_index,
            rx,
            stop,
            worker: Some(worker),
        })
    }

    fn close(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(worker) = self.worker.take() {
            // 解码线程在下一帧时退出
            if worker.join().is_err() {
                log::warn!("⚠️ 摄像头解码线程异常退出");
            }
        }
    }
}

impl FrameSource for CameraSource {
    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        self.rx
            .recv()
            .map(Some)
            .map_err(|_| Error::Source(format!("摄像头 {} 已断开", self.device_index)))
    }

    fn reconnect(&mut self) -> Result<()> {
        self.close();
        let (rx, stop, worker) = spawn_decoder(self.device_index)?;
        self.rx = rx;
        self.stop = stop;
        self.worker = Some(worker);
        Ok(())
    }

    fn describe(&self) -> String {
        format!("camera {}", self.device_index)
    }
}

impl Drop for CameraSource {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        // 不等待: 设备可能已不再出帧
        self.worker.take();
    }
}

fn spawn_decoder(
    device_index: usize,
) -> Result<(Receiver<RgbImage>, Arc<AtomicBool>, JoinHandle<()>)> {
    let (tx, rx) = bounded(FRAME_QUEUE);
    let stop = Arc::new(AtomicBool::new(false));
    let filter = DecodeFilter::new(tx, stop.clone());
    let url = format_camera_url(device_index);

    let worker = std::thread::Builder::new()
        .name(format!("camera-{}", device_index))
        .spawn(move || decode_camera(&url, filter))?;
    Ok((rx, stop, worker))
}

/// 获取设备名 (Windows dshow 需要名称而不是索引)
fn device_name(index: usize) -> Option<String> {
    match ez_ffmpeg::device::get_input_video_devices() {
        Ok(devices) => devices.into_iter().nth(index),
        Err(e) => {
            log::warn!("⚠️ 获取摄像头列表失败: {}", e);
            None
        }
    }
}

/// 格式化摄像头URL - 根据平台选择
fn format_camera_url(index: usize) -> String {
    #[cfg(target_os = "windows")]
    {
        format!(
            "video={}",
            device_name(index).unwrap_or_else(|| index.to_string())
        )
    }
    #[cfg(target_os = "linux")]
    {
        if let Some(name) = device_name(index) {
            log::info!("📷 设备名称: {}", name);
        }
        format!("/dev/video{}", index)
    }
    #[cfg(not(any(target_os = "windows", target_os = "linux")))]
    {
        if let Some(name) = device_name(index) {
            log::info!("📷 设备名称: {}", name);
        }
        format!("{}", index)
    }
}

/// 摄像头解码实现, 在解码线程中运行直到断流或被关闭
fn decode_camera(camera_input: &str, filter: DecodeFilter) {
    #[cfg(target_os = "windows")]
    let format = "dshow";
    #[cfg(target_os = "macos")]
    let format = "avfoundation";
    #[cfg(target_os = "linux")]
    let format = "v4l2";
    #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
    let format = "video4linux2";

    log::info!("🎥 打开摄像头: {} (格式: {})", camera_input, format);

    let pipe: FramePipelineBuilder = AVMediaType::AVMEDIA_TYPE_VIDEO.into();
    let pipe = pipe.filter("decode", Box::new(filter));
    let out = create_null_output().add_frame_pipeline(pipe);
    let input = Input::new(camera_input).set_format(format);

    let ctx = match FfmpegContext::builder()
        .input(input)
        .filter_desc("format=yuv420p")
        .output(out)
        .build()
    {
        Ok(ctx) => ctx,
        Err(e) => {
            log::error!("❌ 摄像头构建失败: {}", e);
            log::info!("💡 提示: 请检查设备是否存在,或尝试关闭其他占用摄像头的程序");
            return;
        }
    };

    let sch = match ctx.start() {
        Ok(s) => s,
        Err(e) => {
            log::error!("❌ 摄像头启动失败: {}", e);
            return;
        }
    };
    log::info!("✅ 摄像头连接成功,开始解码!");

    if let Err(e) = sch.wait() {
        log::warn!("⚠️ 摄像头解码结束: {}", e);
    }
    log::info!("📹 摄像头解码循环结束");
}
