// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

/// 单线程同步处理流水线 (Frame Pipeline)
///
/// ```text
/// FrameSource → Model::forward → Postprocessor (解码 → NMS → 标签) → 标注 → 快照
/// ```
///
/// 每次循环开始检查取消标记; 帧获取失败按 `ReconnectPolicy` 重试, 默认直接返回错误.
pub mod context;
pub mod stats;

pub use context::{CancellationToken, RunContext};
pub use stats::{FpsMeter, RunStats};

use std::path::PathBuf;
use std::time::Instant;

use image::RgbImage;

use crate::config::ReconnectPolicy;
use crate::detection::{FrameDetections, Postprocessor};
use crate::error::{Error, Result};
use crate::input::{check_frame, FrameSource};
use crate::models::Model;
use crate::renderer::Annotator;
use crate::snapshot::SnapshotWriter;

/// 一帧的处理结果
pub struct ProcessedFrame {
    /// 帧序号, 从0开始
    pub index: u64,
    /// 标注后的画面 (原始分辨率)
    pub frame: RgbImage,
    pub detections: FrameDetections,
    /// 本帧写出的快照
    pub snapshot: Option<PathBuf>,
}

pub struct Pipeline<S, M> {
    source: S,
    model: M,
    postprocessor: Postprocessor,
    annotator: Annotator,
    snapshots: SnapshotWriter,
    reconnect: ReconnectPolicy,
    profile: bool,
    frame_index: u64,
    stats: RunStats,
    meter: FpsMeter,
    started: Instant,
}

impl<S: FrameSource, M: Model> Pipeline<S, M> {
    pub fn new(
        source: S,
        model: M,
        postprocessor: Postprocessor,
        annotator: Annotator,
        snapshots: SnapshotWriter,
    ) -> Self {
        Self {
            source,
            model,
            postprocessor,
            annotator,
            snapshots,
            reconnect: ReconnectPolicy::default(),
            profile: false,
            frame_index: 0,
            stats: RunStats::default(),
            meter: FpsMeter::default(),
            started: Instant::now(),
        }
    }

    pub fn with_reconnect(mut self, reconnect: ReconnectPolicy) -> Self {
        self.reconnect = reconnect;
        self
    }

    pub fn with_profile(mut self, profile: bool) -> Self {
        self.profile = profile;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn postprocessor(&self) -> &Postprocessor {
        &self.postprocessor
    }

    pub fn stats(&self) -> RunStats {
        RunStats {
            elapsed: self.started.elapsed(),
            ..self.stats.clone()
        }
    }

    /// 读取下一帧; 失败时按重连策略重试. 取消或输入结束时返回 `None`.
    fn acquire(&mut self, ctx: &RunContext) -> Result<Option<RgbImage>> {
        let mut attempt = 0;
        loop {
            let result = self.source.next_frame().and_then(|frame| {
                if let Some(frame) = &frame {
                    check_frame(frame)?;
                }
                Ok(frame)
            });

            match result {
                Ok(frame) => return Ok(frame),
                Err(e) if e.is_frame_error() && attempt < self.reconnect.max_retries => {
                    attempt += 1;
                    let delay = self.reconnect.delay(attempt);
                    log::warn!(
                        "⚠️ 获取帧失败 ({}): {}, {:?} 后重连 ({}/{})",
                        self.source.describe(),
                        e,
                        delay,
                        attempt,
                        self.reconnect.max_retries
                    );
                    std::thread::sleep(delay);
                    if ctx.is_cancelled() {
                        return Ok(None);
                    }
                    self.stats.reconnects += 1;
                    if let Err(e) = self.source.reconnect() {
                        log::warn!("⚠️ 重连失败: {}", e);
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// 处理一帧: 获取 → 推理 → 后处理 → 标注 → 快照
    pub fn step(&mut self, ctx: &RunContext) -> Result<Option<ProcessedFrame>> {
        if ctx.is_cancelled() {
            return Ok(None);
        }
        let Some(mut frame) = self.acquire(ctx)? else {
            return Ok(None);
        };
        let (width, height) = frame.dimensions();

        let outputs = self
            .model
            .forward(&frame, self.profile)
            .map_err(|e| Error::Model(format!("{:#}", e)))?;

        let t_post = Instant::now();
        let detections = self.postprocessor.postprocess(&outputs, width, height);
        if self.profile {
            log::info!("[Postprocess]: {:?}", t_post.elapsed());
        }

        let index = self.frame_index;
        log::debug!(
            "帧 #{}: 候选 {} | NMS保留 {} | 绘制 {}",
            index,
            detections.candidates.len(),
            detections.kept.len(),
            detections.labeled.len()
        );

        self.annotator.annotate(&mut frame, &detections.labeled);
        let snapshot = self.snapshots.maybe_save(index, &frame);

        self.frame_index += 1;
        self.stats.frames += 1;
        self.stats.detections += detections.labeled.len() as u64;
        if snapshot.is_some() {
            self.stats.snapshots += 1;
        }
        self.meter.tick(detections.labeled.len());

        Ok(Some(ProcessedFrame {
            index,
            frame,
            detections,
            snapshot,
        }))
    }

    /// 无窗口运行, 直到取消 / 达到帧数上限 / 输入结束 / 出错
    pub fn run(&mut self, ctx: &RunContext) -> Result<RunStats> {
        log::info!("▶️ 开始处理: {}", self.source.describe());
        while !ctx.should_stop(self.stats.frames) {
            if self.step(ctx)?.is_none() {
                break;
            }
        }
        if ctx.is_cancelled() {
            log::info!("🛑 已取消");
        }
        Ok(self.stats())
    }
}
