// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

/// 检测系统数据结构定义
/// Data structures for the detection post-processing pipeline

// ========== 公共常量 ==========

/// 原始输出行中类别分数的起始列: [cx, cy, w, h, objectness, scores...]
pub const SCORES_OFFSET: usize = 5;

// ========== 数据结构 ==========

/// 检测框 (Detection bounding box)
///
/// 原图像素坐标, 左上角 + 宽高. 左上角可以为负 (框超出画面边缘时不裁剪).
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct BBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// 由归一化的中心点坐标还原到原图像素坐标
    pub fn from_normalized_cxcywh(
        cx: f32,
        cy: f32,
        w: f32,
        h: f32,
        frame_width: f32,
        frame_height: f32,
    ) -> Self {
        let center_x = cx * frame_width;
        let center_y = cy * frame_height;
        let box_width = w * frame_width;
        let box_height = h * frame_height;
        Self::new(
            center_x - box_width / 2.,
            center_y - box_height / 2.,
            box_width,
            box_height,
        )
    }

    pub fn xmax(&self) -> f32 {
        self.x + self.width
    }

    pub fn ymax(&self) -> f32 {
        self.y + self.height
    }

    pub fn area(&self) -> f32 {
        self.width.max(0.) * self.height.max(0.)
    }

    pub fn intersection_area(&self, another: &BBox) -> f32 {
        let l = self.x.max(another.x);
        let r = self.xmax().min(another.xmax());
        let t = self.y.max(another.y);
        let b = self.ymax().min(another.ymax());
        (r - l).max(0.) * (b - t).max(0.)
    }

    pub fn union(&self, another: &BBox) -> f32 {
        self.area() + another.area() - self.intersection_area(another)
    }

    /// Intersection-over-Union, 面积为0时返回0
    pub fn iou(&self, another: &BBox) -> f32 {
        let union = self.union(another);
        if union <= 0. {
            return 0.;
        }
        self.intersection_area(another) / union
    }

    /// 裁剪到画面范围内 (仅用于绘制, 检测结果本身不裁剪)
    pub fn clamped(&self, frame_width: f32, frame_height: f32) -> Self {
        let x1 = self.x.clamp(0., frame_width);
        let y1 = self.y.clamp(0., frame_height);
        let x2 = self.xmax().clamp(0., frame_width);
        let y2 = self.ymax().clamp(0., frame_height);
        Self::new(x1, y1, x2 - x1, y2 - y1)
    }
}

/// 单个检测结果
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Detection {
    pub class_id: usize,
    pub confidence: f32,
    pub bbox: BBox,
}

impl Detection {
    pub fn new(class_id: usize, confidence: f32, bbox: BBox) -> Self {
        Self {
            class_id,
            confidence,
            bbox,
        }
    }

    pub fn iou(&self, another: &Detection) -> f32 {
        self.bbox.iou(&another.bbox)
    }
}

/// NMS 保留下来的候选索引 (按选中顺序, 置信度从高到低)
///
/// 索引指向解码器输出的候选列表, 取检测框时必须通过这里的索引取.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SuppressedSet {
    indices: Vec<usize>,
}

impl SuppressedSet {
    pub fn new(indices: Vec<usize>) -> Self {
        Self { indices }
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// 按选中顺序取出保留的检测
    pub fn select<'a>(&'a self, candidates: &'a [Detection]) -> impl Iterator<Item = &'a Detection> {
        self.indices.iter().filter_map(move |&i| candidates.get(i))
    }
}

/// NMS 模式
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum NmsMode {
    /// 所有类别一起做NMS (默认)
    #[default]
    ClassAgnostic,
    /// 只在同类别之间抑制
    PerClass,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_normalized() {
        let b = BBox::from_normalized_cxcywh(0.5, 0.5, 0.2, 0.2, 100., 100.);
        assert!((b.x - 40.).abs() < 1e-4);
        assert!((b.y - 40.).abs() < 1e-4);
        assert!((b.width - 20.).abs() < 1e-4);
        assert!((b.height - 20.).abs() < 1e-4);
    }

    #[test]
    fn test_negative_origin_not_clamped() {
        let b = BBox::from_normalized_cxcywh(0.05, 0.05, 0.4, 0.4, 100., 100.);
        assert!(b.x < 0.);
        assert!(b.y < 0.);
    }

    #[test]
    fn test_iou() {
        let a = BBox::new(0., 0., 10., 10.);
        let b = BBox::new(5., 0., 10., 10.);
        // 交集50, 并集150
        assert!((a.iou(&b) - 1. / 3.).abs() < 1e-5);
        assert_eq!(a.iou(&BBox::new(20., 20., 5., 5.)), 0.);
        // 相邻不重叠
        assert_eq!(a.iou(&BBox::new(10., 0., 10., 10.)), 0.);
        assert_eq!(BBox::default().iou(&BBox::default()), 0.);
    }

    #[test]
    fn test_clamped() {
        let b = BBox::new(-5., -5., 20., 20.).clamped(10., 10.);
        assert_eq!(b, BBox::new(0., 0., 10., 10.));
    }

    #[test]
    fn test_select_uses_kept_indices() {
        let dets = vec![
            Detection::new(0, 0.6, BBox::new(0., 0., 1., 1.)),
            Detection::new(1, 0.9, BBox::new(5., 5., 1., 1.)),
        ];
        let kept = SuppressedSet::new(vec![1, 0]);
        let ids: Vec<usize> = kept.select(&dets).map(|d| d.class_id).collect();
        assert_eq!(ids, vec![1, 0]);
    }
}
