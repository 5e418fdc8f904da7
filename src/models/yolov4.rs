// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
// YOLOv4 模型 (ONNX)
// 输出为 region 层格式, 每行 [cx, cy, w, h, obj, scores...], 解码交给 detection::Postprocessor

use anyhow::Result;
use ndarray::{Array, IxDyn};

use crate::config::PipelineConfig;
use crate::{OrtBackend, OrtConfig, OrtEP};

/// YOLOv4 模型结构
pub struct YOLOv4 {
    engine: OrtBackend,
    model: String,
}

impl YOLOv4 {
    /// 从配置创建 YOLOv4 模型
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        let ep = OrtEP::new(config.provider, config.device_id);
        let engine = OrtBackend::build(OrtConfig {
            f: config.model.clone(),
            ep,
            trt_fp16: false,
            image_size: (config.input_height, config.input_width),
        })?;

        Ok(Self {
            engine,
            model: config.model.clone(),
        })
    }

    pub fn engine(&self) -> &OrtBackend {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut OrtBackend {
        &mut self.engine
    }
}

impl super::Model for YOLOv4 {
    fn input_size(&self) -> (u32, u32) {
        (self.engine.width(), self.engine.height())
    }

    fn run(&mut self, xs: Array<f32, IxDyn>, profile: bool) -> Result<Vec<Array<f32, IxDyn>>> {
        self.engine.run(xs, profile)
    }

    fn summary(&self) {
        log::info!(
            "\nSummary:\n\
            > Model: YOLOv4 ({})\n\
            > EP: {:?} {}\n\
            > Input: {} ({}x{})\n\
            > Outputs: {:?}",
            self.model,
            self.engine.ep(),
            if let OrtEP::CPU = self.engine.ep() {
                ""
            } else {
                "(May still fall back to CPU)"
            },
            self.engine.input_name(),
            self.engine.width(),
            self.engine.height(),
            self.engine.output_names(),
        );
    }
}
