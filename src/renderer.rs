// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 帧标注: 在原始帧上画检测框和标签
//!
//! 框在绘制时裁剪到画面内, `Detection` 本身保持未裁剪的坐标.

use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;

use crate::detection::LabeledDetection;

/// 框线宽 (像素)
pub const BOX_THICKNESS: u32 = 2;
/// 标签基线在框上方的距离
pub const LABEL_OFFSET: i32 = 10;
/// 标签字号
pub const LABEL_SCALE: f32 = 16.0;

/// 在帧上绘制全部检测结果; `font` 为空时只画框
pub fn annotate(frame: &mut RgbImage, detections: &[LabeledDetection], font: Option<&FontVec>) {
    let (fw, fh) = frame.dimensions();
    for labeled in detections {
        let color = Rgb(labeled.label.color);
        let bbox = labeled.detection.bbox.clamped(fw as f32, fh as f32);
        let x = bbox.x.round() as i32;
        let y = bbox.y.round() as i32;
        let w = bbox.width.round() as u32;
        let h = bbox.height.round() as u32;

        for inset in 0..BOX_THICKNESS {
            let (iw, ih) = (
                w.saturating_sub(2 * inset),
                h.saturating_sub(2 * inset),
            );
            // 完全在画面外或已收缩为空
            if iw == 0 || ih == 0 {
                break;
            }
            let rect = Rect::at(x + inset as i32, y + inset as i32).of_size(iw, ih);
            draw_hollow_rect_mut(frame, rect, color);
        }

        if let Some(font) = font {
            let scale = PxScale::from(LABEL_SCALE);
            let text_top = y - LABEL_OFFSET - LABEL_SCALE as i32;
            draw_text_mut(frame, color, x, text_top, scale, font, &labeled.label.text);
        }
    }
}

/// 持有标签字体的标注器, 字体缺失时只警告一次
pub struct Annotator {
    font: Option<FontVec>,
    warned: bool,
}

impl Annotator {
    pub fn new(font: Option<FontVec>) -> Self {
        Self {
            font,
            warned: false,
        }
    }

    /// 从字体文件创建; 读取失败时退化为只画框
    pub fn from_font_path(path: Option<&str>) -> Self {
        Self::new(path.and_then(|p| load_font(p)))
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    pub fn annotate(&mut self, frame: &mut RgbImage, detections: &[LabeledDetection]) {
        if self.font.is_none() && !self.warned && !detections.is_empty() {
            log::warn!("⚠️ 未加载字体 (--font), 只绘制检测框");
            self.warned = true;
        }
        annotate(frame, detections, self.font.as_ref());
    }
}

/// 读取 TTF/OTF 字体
pub fn load_font(path: impl AsRef<Path>) -> Option<FontVec> {
    let path = path.as_ref();
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            log::warn!("⚠️ 读取字体失败 {}: {}", path.display(), e);
            return None;
        }
    };
    match FontVec::try_from_vec(bytes) {
        Ok(font) => {
            log::info!("🔤 加载字体: {}", path.display());
            Some(font)
        }
        Err(e) => {
            log::warn!("⚠️ 字体格式无效 {}: {}", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::{BBox, BoundLabel, Detection};

    fn labeled(bbox: BBox, color: [u8; 3]) -> LabeledDetection {
        LabeledDetection {
            detection: Detection::new(0, 0.9, bbox),
            label: BoundLabel {
                text: "person: 0.90".to_string(),
                color,
            },
        }
    }

    #[test]
    fn test_two_pixel_border() {
        let mut frame = RgbImage::new(20, 20);
        let red = [255, 0, 0];
        annotate(&mut frame, &[labeled(BBox::new(5., 5., 10., 10.), red)], None);

        assert_eq!(frame.get_pixel(5, 5).0, red);
        assert_eq!(frame.get_pixel(6, 6).0, red);
        assert_eq!(frame.get_pixel(14, 14).0, red);
        assert_eq!(frame.get_pixel(13, 13).0, red);
        // 内部不填充
        assert_eq!(frame.get_pixel(7, 7).0, [0, 0, 0]);
        assert_eq!(frame.get_pixel(10, 10).0, [0, 0, 0]);
    }

    #[test]
    fn test_box_clipped_to_frame() {
        let mut frame = RgbImage::new(10, 10);
        let green = [0, 255, 0];
        annotate(
            &mut frame,
            &[labeled(BBox::new(-5., -5., 10., 10.), green)],
            None,
        );
        assert_eq!(frame.get_pixel(0, 0).0, green);
        assert_eq!(frame.get_pixel(4, 4).0, green);
        assert_eq!(frame.get_pixel(2, 2).0, [0, 0, 0]);
    }

    #[test]
    fn test_box_outside_frame_is_skipped() {
        let mut frame = RgbImage::new(10, 10);
        annotate(
            &mut frame,
            &[labeled(BBox::new(50., 50., 10., 10.), [1, 2, 3])],
            None,
        );
        assert!(frame.pixels().all(|p| p.0 == [0, 0, 0]));
    }

    #[test]
    fn test_missing_font_path() {
        let annotator = Annotator::from_font_path(Some("/no/such/font.ttf"));
        assert!(!annotator.has_font());
    }
}
