#![allow(clippy::type_complexity)]
// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
pub mod config; // 运行参数
pub mod detection; // 检测后处理 (解码 / NMS / 标签)
pub mod error; // 错误类型
pub mod input; // 视频输入系统
pub mod models; // 模型接口与 YOLOv4
pub mod pipeline; // 逐帧处理流水线
pub mod renderer; // 帧标注
pub mod renderer_macroquad; // 显示窗口
pub mod runtime; // 初始化 / 收尾
pub mod snapshot; // 周期快照

#[cfg(feature = "ort-backend")]
pub mod ort_backend;

pub use crate::config::{Args, InputSource, PipelineConfig, ReconnectPolicy};
pub use crate::detection::{
    BBox, Detection, DetectionDecoder, LabelBinder, NmsMode, Postprocessor, SuppressedSet,
};
pub use crate::error::{Error, Result};
pub use crate::input::FrameSource;
pub use crate::models::Model;
pub use crate::pipeline::{CancellationToken, Pipeline, RunContext, RunStats};

#[cfg(feature = "ort-backend")]
pub use crate::models::YOLOv4;
#[cfg(feature = "ort-backend")]
pub use crate::ort_backend::{OrtBackend, OrtConfig, OrtEP};
