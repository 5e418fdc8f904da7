// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
// YOLOv4 后处理: 置信度过滤 + 坐标解码 → NMS → 标签/颜色绑定

use ndarray::{Array, IxDyn};

use super::decoder::DetectionDecoder;
use super::labels::{BoundLabel, LabelBinder};
use super::nms::non_max_suppression;
use super::types::{Detection, NmsMode, SuppressedSet};

/// 后处理参数
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PostprocessConfig {
    pub min_probability: f32,
    pub iou_threshold: f32,
    pub nms_mode: NmsMode,
}

impl Default for PostprocessConfig {
    fn default() -> Self {
        Self {
            min_probability: 0.5,
            iou_threshold: 0.3,
            nms_mode: NmsMode::ClassAgnostic,
        }
    }
}

/// 可直接绘制的检测结果
#[derive(Clone, Debug, PartialEq)]
pub struct LabeledDetection {
    pub detection: Detection,
    pub label: BoundLabel,
}

/// 单帧后处理结果, 处理完一帧即丢弃
#[derive(Clone, Debug, Default)]
pub struct FrameDetections {
    /// 解码后的全部候选
    pub candidates: Vec<Detection>,
    /// NMS 保留的候选索引
    pub kept: SuppressedSet,
    /// 保留且类别有效的检测 (按NMS选中顺序)
    pub labeled: Vec<LabeledDetection>,
}

impl FrameDetections {
    pub fn is_empty(&self) -> bool {
        self.labeled.is_empty()
    }

    pub fn len(&self) -> usize {
        self.labeled.len()
    }
}

/// YOLOv4 后处理器
#[derive(Clone, Debug)]
pub struct Postprocessor {
    config: PostprocessConfig,
    decoder: DetectionDecoder,
    binder: LabelBinder,
}

impl Postprocessor {
    pub fn new(config: PostprocessConfig, binder: LabelBinder) -> Self {
        Self {
            decoder: DetectionDecoder::new(config.min_probability),
            config,
            binder,
        }
    }

    pub fn config(&self) -> &PostprocessConfig {
        &self.config
    }

    pub fn binder(&self) -> &LabelBinder {
        &self.binder
    }

    /// 后处理主函数
    ///
    /// # 参数
    /// - `outputs`: 模型原始输出
    /// - `frame_width`/`frame_height`: 原始帧尺寸 (用于坐标还原)
    pub fn postprocess(
        &self,
        outputs: &[Array<f32, IxDyn>],
        frame_width: u32,
        frame_height: u32,
    ) -> FrameDetections {
        let candidates = self.decoder.decode(outputs, frame_width, frame_height);
        let kept = non_max_suppression(
            &candidates,
            self.config.min_probability,
            self.config.iou_threshold,
            self.config.nms_mode,
        );

        // 通过NMS返回的索引取检测框
        let labeled = kept
            .select(&candidates)
            .filter_map(|det| match self.binder.bind(det) {
                Some(label) => Some(LabeledDetection {
                    detection: *det,
                    label,
                }),
                None => {
                    log::debug!(
                        "丢弃类别越界的检测: class_id={} (类别数 {})",
                        det.class_id,
                        self.binder.num_classes()
                    );
                    None
                }
            })
            .collect();

        FrameDetections {
            candidates,
            kept,
            labeled,
        }
    }
}
