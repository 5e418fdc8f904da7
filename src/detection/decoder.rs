// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
// YOLOv4 输出解码
// 输出行布局: [cx, cy, w, h, objectness, class_score_0 ... class_score_{C-1}]
// 坐标为相对网络输入的归一化值 (0..1)

use ndarray::{Array, ArrayView1, IxDyn};

use super::types::{BBox, Detection, SCORES_OFFSET};

/// 检测解码器: 原始输出张量 → 候选检测列表
#[derive(Clone, Debug)]
pub struct DetectionDecoder {
    min_probability: f32,
}

impl DetectionDecoder {
    pub fn new(min_probability: f32) -> Self {
        Self { min_probability }
    }

    pub fn min_probability(&self) -> f32 {
        self.min_probability
    }

    /// 解码一次推理的全部输出
    ///
    /// 顺序: 先按输出张量顺序, 再按行顺序. 置信度 <= 阈值的行直接丢弃.
    pub fn decode(
        &self,
        outputs: &[Array<f32, IxDyn>],
        frame_width: u32,
        frame_height: u32,
    ) -> Vec<Detection> {
        let mut detections = Vec::new();
        for output in outputs {
            let Some(&cols) = output.shape().last() else {
                continue;
            };
            if cols <= SCORES_OFFSET {
                continue;
            }
            // 前面所有维度展平成行
            let n_rows = output.len() / cols;
            let Ok(rows) = output.to_shape((n_rows, cols)) else {
                continue;
            };
            for row in rows.rows() {
                if let Some(det) = self.decode_row(row, frame_width as f32, frame_height as f32) {
                    detections.push(det);
                }
            }
        }
        log::trace!(
            "decoded {} candidates from {} outputs",
            detections.len(),
            outputs.len()
        );
        detections
    }

    /// 解码单行, 未通过阈值返回 None
    pub fn decode_row(
        &self,
        row: ArrayView1<f32>,
        frame_width: f32,
        frame_height: f32,
    ) -> Option<Detection> {
        let (class_id, confidence) = best_class(row.iter().skip(SCORES_OFFSET).copied())?;

        if confidence.is_nan() || confidence <= self.min_probability {
            return None;
        }

        let bbox =
            BBox::from_normalized_cxcywh(row[0], row[1], row[2], row[3], frame_width, frame_height);
        Some(Detection::new(class_id, confidence, bbox))
    }
}

/// 最大分数及其类别索引, 并列时取第一个
fn best_class(scores: impl Iterator<Item = f32>) -> Option<(usize, f32)> {
    scores
        .enumerate()
        .reduce(|max, x| if x.1 > max.1 { x } else { max })
}
