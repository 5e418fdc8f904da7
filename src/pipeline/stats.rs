// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use std::time::{Duration, Instant};

/// 运行统计, 由 `runtime::shutdown` 打印
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunStats {
    /// 已处理帧数
    pub frames: u64,
    /// NMS后绘制的检测数
    pub detections: u64,
    /// 写入的快照数
    pub snapshots: u64,
    /// 重连次数
    pub reconnects: u64,
    pub elapsed: Duration,
}

impl RunStats {
    pub fn fps(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.frames as f64 / secs
        } else {
            0.0
        }
    }
}

/// 每秒输出一次吞吐量
pub struct FpsMeter {
    count: u64,
    detections: u64,
    last: Instant,
}

impl Default for FpsMeter {
    fn default() -> Self {
        Self {
            count: 0,
            detections: 0,
            last: Instant::now(),
        }
    }
}

impl FpsMeter {
    /// 记录一帧, 满一秒时返回 fps
    pub fn tick(&mut self, detections: usize) -> Option<f64> {
        self.count += 1;
        self.detections += detections as u64;
        let elapsed = self.last.elapsed().as_secs_f64();
        if elapsed < 1.0 {
            return None;
        }
        let fps = self.count as f64 / elapsed;
        log::info!(
            "📊 处理 {:.1} fps | 平均检测 {:.1}/帧",
            fps,
            self.detections as f64 / self.count as f64
        );
        self.count = 0;
        self.detections = 0;
        self.last = Instant::now();
        Some(fps)
    }
}
