// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 错误类型 (Error types)

use thiserror::Error;

/// 检测系统错误
#[derive(Error, Debug)]
pub enum Error {
    #[error("配置错误 (config): {0}")]
    Config(String),

    #[error("模型错误 (model): {0}")]
    Model(String),

    /// 视频源读帧失败 (断流、解码失败等)
    #[error("读帧失败 (frame): {0}")]
    Frame(String),

    /// 视频源返回了空帧 (宽或高为0)
    #[error("空帧 (empty frame): {width}x{height}")]
    EmptyFrame { width: u32, height: u32 },

    #[error("视频源错误 (source): {0}")]
    Source(String),

    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("图像错误: {0}")]
    Image(#[from] image::ImageError),
}

impl Error {
    /// 是否为读帧类错误 (重连策略只对这类错误生效)
    pub fn is_frame_error(&self) -> bool {
        matches!(
            self,
            Error::Frame(_) | Error::EmptyFrame { .. } | Error::Source(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
