// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
// ONNX Runtime 推理引擎封装

use anyhow::{Context, Result};
use ndarray::{Array, IxDyn};
use ort::{
    CPUExecutionProvider, CUDAExecutionProvider, ExecutionProviderDispatch,
    GraphOptimizationLevel, Session, TensorRTExecutionProvider,
};

use crate::config::ExecutionProvider;

/// 推理后端 (Execution Provider) + 设备ID
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrtEP {
    CPU,
    CUDA(i32),
    Trt(i32),
}

impl OrtEP {
    pub fn new(provider: ExecutionProvider, device_id: i32) -> Self {
        match provider {
            ExecutionProvider::Cpu => OrtEP::CPU,
            ExecutionProvider::Cuda => OrtEP::CUDA(device_id),
            ExecutionProvider::TensorRt => OrtEP::Trt(device_id),
        }
    }
}

/// 引擎构建参数
#[derive(Debug, Clone)]
pub struct OrtConfig {
    pub f: String,
    pub ep: OrtEP,
    pub trt_fp16: bool,
    /// (height, width), 模型输入为动态尺寸时使用
    pub image_size: (u32, u32),
}

/// ONNX Runtime 会话
pub struct OrtBackend {
    session: Session,
    ep: OrtEP,
    input_name: String,
    output_names: Vec<String>,
    height: u32,
    width: u32,
}

impl OrtBackend {
    pub fn build(config: OrtConfig) -> Result<Self> {
        let provider: ExecutionProviderDispatch = match config.ep {
            OrtEP::Trt(device_id) => TensorRTExecutionProvider::default()
                .with_device_id(device_id)
                .with_fp16(config.trt_fp16)
                .build(),
            OrtEP::CUDA(device_id) => CUDAExecutionProvider::default()
                .with_device_id(device_id)
                .build(),
            OrtEP::CPU => CPUExecutionProvider::default().build(),
        };

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_execution_providers([provider])?
            .commit_from_file(&config.f)
            .with_context(|| format!("加载模型失败: {}", config.f))?;

        let input = session
            .inputs
            .first()
            .context("模型没有输入层")?;
        let input_name = input.name.clone();

        // NCHW, 动态维度 (<=0) 时使用配置的尺寸
        let (mut height, mut width) = config.image_size;
        if let Some(dims) = input.input_type.tensor_dimensions() {
            if dims.len() == 4 {
                if dims[2] > 0 {
                    height = dims[2] as u32;
                }
                if dims[3] > 0 {
                    width = dims[3] as u32;
                }
            }
        }

        let output_names = session.outputs.iter().map(|o| o.name.clone()).collect();

        Ok(Self {
            session,
            ep: config.ep,
            input_name,
            output_names,
            height,
            width,
        })
    }

    /// 前向推理, 按模型输出顺序返回全部输出
    pub fn run(&mut self, xs: Array<f32, IxDyn>, profile: bool) -> Result<Vec<Array<f32, IxDyn>>> {
        let t = std::time::Instant::now();
        let outputs = self
            .session
            .run(ort::inputs![self.input_name.as_str() => xs.view()]?)?;
        if profile {
            log::info!("[ORT run]: {:?}", t.elapsed());
        }

        let mut ys = Vec::with_capacity(self.output_names.len());
        for name in &self.output_names {
            let y = outputs[name.as_str()]
                .try_extract_tensor::<f32>()
                .with_context(|| format!("读取输出 {} 失败", name))?
                .into_owned();
            ys.push(y);
        }
        Ok(ys)
    }

    pub fn ep(&self) -> &OrtEP {
        &self.ep
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn input_name(&self) -> &str {
        &self.input_name
    }

    pub fn output_names(&self) -> &[String] {
        &self.output_names
    }
}
