// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// 取消标记: Ctrl-C / 关闭窗口 / q / Esc 设置, 每次循环开始时检查
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// 单次运行的上下文
#[derive(Clone, Debug, Default)]
pub struct RunContext {
    token: CancellationToken,
    max_frames: Option<u64>,
}

impl RunContext {
    pub fn new(token: CancellationToken) -> Self {
        Self {
            token,
            max_frames: None,
        }
    }

    /// 处理到指定帧数后停止
    pub fn with_max_frames(mut self, max_frames: Option<u64>) -> Self {
        self.max_frames = max_frames;
        self
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn max_frames(&self) -> Option<u64> {
        self.max_frames
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn should_stop(&self, processed: u64) -> bool {
        self.is_cancelled() || self.max_frames.is_some_and(|max| processed >= max)
    }
}
