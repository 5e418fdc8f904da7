// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

/// 视频输入系统 (Video Input System)
///
/// - MjpegSource:  网络 MJPEG 流 (HTTP)
/// - ImageSource:  单张图片 / 图片目录 (离线调试)
/// - CameraSource: 本地摄像头 (FFmpeg, 需要 `camera` 特性)
pub mod images;
pub mod mjpeg;

#[cfg(feature = "camera")]
pub mod camera;
#[cfg(feature = "camera")]
pub mod decode_filter;

pub use images::ImageSource;
pub use mjpeg::{MjpegConfig, MjpegSource};

#[cfg(feature = "camera")]
pub use camera::CameraSource;

use image::RgbImage;

use crate::config::InputSource;
use crate::error::{Error, Result};

/// 帧来源
pub trait FrameSource {
    /// 读取下一帧. `Ok(None)` 表示有限输入已读完.
    ///
    /// 会阻塞直到有帧或出错, 没有超时.
    fn next_frame(&mut self) -> Result<Option<RgbImage>>;

    /// 断流后重新连接
    fn reconnect(&mut self) -> Result<()> {
        Ok(())
    }

    /// 用于日志的描述
    fn describe(&self) -> String;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        (**self).next_frame()
    }

    fn reconnect(&mut self) -> Result<()> {
        (**self).reconnect()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// 根据输入源创建帧来源
pub fn open_source(source: &InputSource) -> Result<Box<dyn FrameSource>> {
    match source {
        InputSource::Mjpeg(url) => {
            let mut src = MjpegSource::new(MjpegConfig {
                url: url.clone(),
                ..MjpegConfig::default()
            });
            src.connect()?;
            Ok(Box::new(src))
        }
        InputSource::Images(path) => Ok(Box::new(ImageSource::open(path)?)),
        #[cfg(feature = "camera")]
        InputSource::Camera(index) => Ok(Box::new(CameraSource::open(*index)?)),
        #[cfg(not(feature = "camera"))]
        InputSource::Camera(index) => Err(Error::Source(format!(
            "摄像头 {} 不可用: 编译时未启用 `camera` 特性",
            index
        ))),
    }
}

/// 空帧检查 (宽或高为0)
pub fn check_frame(frame: &RgbImage) -> Result<()> {
    let (width, height) = frame.dimensions();
    if width == 0 || height == 0 {
        return Err(Error::EmptyFrame { width, height });
    }
    Ok(())
}
