/// 检测后处理系统 (Detection post-processing)
///
/// - Decoder:       原始输出行 → 候选检测 (置信度过滤 + 坐标还原)
/// - NMS:           候选检测 → 保留索引
/// - Labels:        类别名称表 + 颜色表 → 绘制标签
/// - Postprocessor: 以上三步串起来
pub mod decoder;
pub mod labels;
pub mod nms;
pub mod postprocessor;
pub mod types;

pub use decoder::DetectionDecoder;
pub use labels::{format_label, BoundLabel, ClassRegistry, ColorPalette, LabelBinder};
pub use nms::non_max_suppression;
pub use postprocessor::{FrameDetections, LabeledDetection, PostprocessConfig, Postprocessor};
pub use types::{BBox, Detection, NmsMode, SuppressedSet, SCORES_OFFSET};
