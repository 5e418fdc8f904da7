// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use super::types::{Detection, NmsMode, SuppressedSet};

/// 非极大值抑制 (greedy NMS)
///
/// - 只考虑置信度 > `min_probability` 的候选
/// - 按置信度降序稳定排序, 置信度相同时先出现的优先
/// - 与已保留框 IoU > `iou_threshold` 的候选被丢弃
///
/// 返回保留候选在 `candidates` 中的索引, 按选中顺序排列.
pub fn non_max_suppression(
    candidates: &[Detection],
    min_probability: f32,
    iou_threshold: f32,
    mode: NmsMode,
) -> SuppressedSet {
    let mut order: Vec<usize> = (0..candidates.len())
        .filter(|&i| candidates[i].confidence > min_probability)
        .collect();
    // sort_by 是稳定排序
    order.sort_by(|&a, &b| {
        candidates[b]
            .confidence
            .total_cmp(&candidates[a].confidence)
    });

    let mut kept: Vec<usize> = Vec::with_capacity(order.len());
    for index in order {
        let current = &candidates[index];
        let drop = kept.iter().any(|&prev| {
            let prev = &candidates[prev];
            let competes = match mode {
                NmsMode::ClassAgnostic => true,
                NmsMode::PerClass => prev.class_id == current.class_id,
            };
            competes && prev.iou(current) > iou_threshold
        });
        if !drop {
            kept.push(index);
        }
    }

    SuppressedSet::new(kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::types::BBox;

    fn det(class_id: usize, confidence: f32, x: f32, y: f32, w: f32, h: f32) -> Detection {
        Detection::new(class_id, confidence, BBox::new(x, y, w, h))
    }

    #[test]
    fn test_overlapping_keeps_best() {
        let dets = vec![
            det(0, 0.6, 41., 41., 20., 20.),
            det(0, 0.9, 40., 40., 20., 20.),
        ];
        let kept = non_max_suppression(&dets, 0.5, 0.3, NmsMode::ClassAgnostic);
        assert_eq!(kept.indices(), &[1]);
    }

    #[test]
    fn test_disjoint_keeps_both() {
        let dets = vec![
            det(0, 0.7, 0., 0., 10., 10.),
            det(1, 0.8, 50., 50., 10., 10.),
        ];
        let kept = non_max_suppression(&dets, 0.5, 0.3, NmsMode::ClassAgnostic);
        // 按选中顺序: 0.8 在前
        assert_eq!(kept.indices(), &[1, 0]);
    }

    #[test]
    fn test_empty() {
        let kept = non_max_suppression(&[], 0.5, 0.3, NmsMode::ClassAgnostic);
        assert!(kept.is_empty());
    }

    #[test]
    fn test_tie_first_seen_wins() {
        let dets = vec![
            det(0, 0.8, 0., 0., 10., 10.),
            det(1, 0.8, 1., 1., 10., 10.),
        ];
        let kept = non_max_suppression(&dets, 0.5, 0.3, NmsMode::ClassAgnostic);
        assert_eq!(kept.indices(), &[0]);
    }

    #[test]
    fn test_confidence_floor() {
        let dets = vec![det(0, 0.5, 0., 0., 10., 10.), det(0, 0.4, 50., 0., 10., 10.)];
        let kept = non_max_suppression(&dets, 0.5, 0.3, NmsMode::ClassAgnostic);
        assert!(kept.is_empty());
    }

    #[test]
    fn test_iou_equal_to_threshold_is_kept() {
        // IoU = 50 / 150 = 1/3
        let dets = vec![det(0, 0.9, 0., 0., 10., 10.), det(0, 0.8, 5., 0., 10., 10.)];
        let iou = dets[0].iou(&dets[1]);
        let kept = non_max_suppression(&dets, 0.5, iou, NmsMode::ClassAgnostic);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_class_agnostic_suppresses_across_classes() {
        let dets = vec![
            det(0, 0.9, 0., 0., 10., 10.),
            det(3, 0.8, 0., 0., 10., 10.),
        ];
        let agnostic = non_max_suppression(&dets, 0.5, 0.3, NmsMode::ClassAgnostic);
        assert_eq!(agnostic.indices(), &[0]);

        let per_class = non_max_suppression(&dets, 0.5, 0.3, NmsMode::PerClass);
        assert_eq!(per_class.indices(), &[0, 1]);
    }

    #[test]
    fn test_chain_is_greedy() {
        // b 被 a 抑制后不再参与抑制 c
        let dets = vec![
            det(0, 0.9, 0., 0., 10., 10.),
            det(0, 0.8, 4., 0., 10., 10.),
            det(0, 0.7, 8., 0., 10., 10.),
        ];
        let kept = non_max_suppression(&dets, 0.5, 0.3, NmsMode::ClassAgnostic);
        assert_eq!(kept.indices(), &[0, 2]);
    }
}
