// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 进程级初始化与收尾, 由入口显式调用

use crate::config::PipelineConfig;
use crate::pipeline::RunStats;
use crate::snapshot::SnapshotWriter;

/// 启动: 打印版本与配置, 重建输出目录
pub fn initialize(config: &PipelineConfig) -> SnapshotWriter {
    log::info!(
        "🚀 {} v{} 启动",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );
    config.print_summary();

    let writer = SnapshotWriter::new(&config.output_dir, config.snapshot_every);
    if config.snapshot_every > 0 {
        writer.prepare();
    }
    writer
}

/// 结束: 打印运行统计
pub fn shutdown(stats: &RunStats) {
    log::info!(
        "✅ 结束: {} 帧 | {:.1} fps | 检测 {} | 快照 {} | 重连 {} | 用时 {:.1?}",
        stats.frames,
        stats.fps(),
        stats.detections,
        stats.snapshots,
        stats.reconnects,
        stats.elapsed
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_prepares_output_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("snapshots");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("0.png"), b"stale").unwrap();

        let config = PipelineConfig {
            output_dir: dir.to_string_lossy().into_owned(),
            ..PipelineConfig::default()
        };
        let writer = initialize(&config);
        assert_eq!(writer.dir(), dir.as_path());
        assert!(dir.is_dir());
        assert!(!dir.join("0.png").exists());
    }
}
