// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

/// 检测模型接口与实现
///
/// ## Model Trait
/// 统一的模型接口, 定义标准流程: preprocess → run
///
/// ```text
/// 原始帧 → preprocess (缩放到输入尺寸, /255, NCHW) → 张量
///          ↓
///     推理引擎 run
///          ↓
///     原始输出 (每行 [cx, cy, w, h, obj, scores...]) → detection::Postprocessor
/// ```
///
/// 后处理不属于模型, 由 `detection::Postprocessor` 统一完成.
use anyhow::Result;
use image::{imageops, RgbImage};
use ndarray::{Array, IxDyn};

#[cfg(feature = "ort-backend")]
pub mod yolov4;

#[cfg(feature = "ort-backend")]
pub use yolov4::YOLOv4;

/// 统一的检测模型接口
pub trait Model {
    /// 网络输入尺寸 (width, height)
    fn input_size(&self) -> (u32, u32);

    /// 预处理: 图片 → NCHW 张量
    fn preprocess(&mut self, image: &RgbImage) -> Result<Array<f32, IxDyn>> {
        let (width, height) = self.input_size();
        Ok(blob_from_image(image, width, height, 1. / 255.))
    }

    /// 推理: 执行模型前向传播, 返回所有输出层的原始张量
    fn run(&mut self, xs: Array<f32, IxDyn>, profile: bool) -> Result<Vec<Array<f32, IxDyn>>>;

    /// 完整流程: preprocess → run
    fn forward(&mut self, image: &RgbImage, profile: bool) -> Result<Vec<Array<f32, IxDyn>>> {
        let t_pre = std::time::Instant::now();
        let xs = self.preprocess(image)?;
        if profile {
            log::info!("[Model Preprocess]: {:?}", t_pre.elapsed());
        }
        let t_run = std::time::Instant::now();
        let ys = self.run(xs, profile)?;
        if profile {
            log::info!("[Model Inference]: {:?}", t_run.elapsed());
        }
        Ok(ys)
    }

    /// 打印模型信息
    fn summary(&self);
}

impl<M: Model + ?Sized> Model for Box<M> {
    fn input_size(&self) -> (u32, u32) {
        (**self).input_size()
    }

    fn preprocess(&mut self, image: &RgbImage) -> Result<Array<f32, IxDyn>> {
        (**self).preprocess(image)
    }

    fn run(&mut self, xs: Array<f32, IxDyn>, profile: bool) -> Result<Vec<Array<f32, IxDyn>>> {
        (**self).run(xs, profile)
    }

    fn summary(&self) {
        (**self).summary()
    }
}

/// 缩放到 (width, height) 并转成 [1, 3, H, W] 的 f32 张量
///
/// 直接拉伸, 不做 letterbox.
pub fn blob_from_image(image: &RgbImage, width: u32, height: u32, scale: f32) -> Array<f32, IxDyn> {
    let resized = if image.dimensions() == (width, height) {
        image.clone()
    } else {
        imageops::resize(image, width, height, imageops::FilterType::Triangle)
    };

    let mut ys = Array::zeros((1, 3, height as usize, width as usize)).into_dyn();
    for (x, y, rgb) in resized.enumerate_pixels() {
        let x = x as usize;
        let y = y as usize;
        let [r, g, b] = rgb.0;
        ys[[0, 0, y, x]] = (r as f32) * scale;
        ys[[0, 1, y, x]] = (g as f32) * scale;
        ys[[0, 2, y, x]] = (b as f32) * scale;
    }
    ys
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_blob_shape_and_scale() {
        let img = RgbImage::from_pixel(64, 48, Rgb([255, 0, 51]));
        let blob = blob_from_image(&img, 32, 32, 1. / 255.);
        assert_eq!(blob.shape(), &[1, 3, 32, 32]);
        assert!((blob[[0, 0, 5, 5]] - 1.0).abs() < 1e-6);
        assert!(blob[[0, 1, 5, 5]].abs() < 1e-6);
        assert!((blob[[0, 2, 5, 5]] - 0.2).abs() < 1e-6);
    }

    struct Echo;

    impl Model for Echo {
        fn input_size(&self) -> (u32, u32) {
            (8, 4)
        }

        fn run(&mut self, xs: Array<f32, IxDyn>, _profile: bool) -> Result<Vec<Array<f32, IxDyn>>> {
            Ok(vec![xs])
        }

        fn summary(&self) {}
    }

    #[test]
    fn test_forward_uses_input_size() {
        let img = RgbImage::new(100, 100);
        let ys = Echo.forward(&img, false).unwrap();
        assert_eq!(ys[0].shape(), &[1, 3, 4, 8]);
    }
}
