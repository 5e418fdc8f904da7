// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 周期快照: 每 N 帧把标注后的画面以半分辨率写入输出目录 (`<dir>/<帧号>.png`)

use std::fs;
use std::path::{Path, PathBuf};

use image::{imageops, RgbImage};

pub struct SnapshotWriter {
    dir: PathBuf,
    every: u64,
}

impl SnapshotWriter {
    /// `every == 0` 时不写快照
    pub fn new(dir: impl Into<PathBuf>, every: u64) -> Self {
        Self {
            dir: dir.into(),
            every,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn every(&self) -> u64 {
        self.every
    }

    /// 删除并重建输出目录, 失败只记录日志
    pub fn prepare(&self) -> bool {
        if self.dir.exists() {
            if let Err(e) = fs::remove_dir_all(&self.dir) {
                log::warn!("⚠️ 清理输出目录失败 {}: {}", self.dir.display(), e);
            }
        }
        match fs::create_dir_all(&self.dir) {
            Ok(()) => {
                log::info!("📁 输出目录: {}", self.dir.display());
                true
            }
            Err(e) => {
                log::warn!("⚠️ 创建输出目录失败 {}: {}", self.dir.display(), e);
                false
            }
        }
    }

    pub fn is_due(&self, frame_index: u64) -> bool {
        self.every > 0 && frame_index % self.every == 0
    }

    pub fn path_for(&self, frame_index: u64) -> PathBuf {
        self.dir.join(format!("{}.png", frame_index))
    }

    /// 到期时写入半分辨率快照, 返回写入的路径
    pub fn maybe_save(&self, frame_index: u64, frame: &RgbImage) -> Option<PathBuf> {
        if !self.is_due(frame_index) {
            return None;
        }
        let path = self.path_for(frame_index);
        match half_resolution(frame).save(&path) {
            Ok(()) => {
                log::debug!("📸 快照: {}", path.display());
                Some(path)
            }
            Err(e) => {
                log::warn!("⚠️ 写入快照失败 {}: {}", path.display(), e);
                None
            }
        }
    }
}

/// 宽高各减半 (至少1像素)
pub fn half_resolution(frame: &RgbImage) -> RgbImage {
    let (w, h) = frame.dimensions();
    imageops::resize(
        frame,
        (w / 2).max(1),
        (h / 2).max(1),
        imageops::FilterType::Triangle,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_due_frames() {
        let writer = SnapshotWriter::new("out", 60);
        let due: Vec<u64> = (0..181).filter(|i| writer.is_due(*i)).collect();
        assert_eq!(due, vec![0, 60, 120, 180]);
        assert!(!SnapshotWriter::new("out", 0).is_due(0));
    }

    #[test]
    fn test_prepare_clears_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("out");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("stale.png"), b"old").unwrap();

        let writer = SnapshotWriter::new(&dir, 60);
        assert!(writer.prepare());
        assert!(dir.is_dir());
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 0);
    }

    #[test]
    fn test_save_half_resolution() {
        let tmp = tempfile::tempdir().unwrap();
        let writer = SnapshotWriter::new(tmp.path(), 60);
        let frame = RgbImage::new(64, 48);

        assert!(writer.maybe_save(1, &frame).is_none());
        let path = writer.maybe_save(60, &frame).unwrap();
        assert_eq!(path, tmp.path().join("60.png"));
        assert_eq!(image::open(&path).unwrap().into_rgb8().dimensions(), (32, 24));
    }

    #[test]
    fn test_save_failure_is_not_fatal() {
        let writer = SnapshotWriter::new("/no/such/dir/for/snapshots", 1);
        assert!(writer.maybe_save(0, &RgbImage::new(2, 2)).is_none());
    }
}
