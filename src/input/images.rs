// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 图片输入: 单张图片或目录下的全部图片 (按文件名排序), 读完即结束

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use image::RgbImage;

use super::FrameSource;
use crate::error::{Error, Result};

const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "bmp", "webp", "tiff"];

/// 图片帧来源
pub struct ImageSource {
    root: PathBuf,
    pending: VecDeque<PathBuf>,
}

impl ImageSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let root = path.as_ref().to_path_buf();
        let pending: VecDeque<PathBuf> = if root.is_dir() {
            let mut files: Vec<PathBuf> = fs::read_dir(&root)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && is_image(p))
                .collect();
            files.sort();
            files.into()
        } else if root.is_file() {
            VecDeque::from([root.clone()])
        } else {
            return Err(Error::Source(format!("输入不存在: {}", root.display())));
        };
        log::info!("🖼️  图片输入: {} ({} 张)", root.display(), pending.len());
        Ok(Self { root, pending })
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

impl FrameSource for ImageSource {
    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        let Some(path) = self.pending.pop_front() else {
            return Ok(None);
        };
        let image = image::open(&path)
            .map_err(|e| Error::Frame(format!("读取图片失败 {}: {}", path.display(), e)))?;
        Ok(Some(image.into_rgb8()))
    }

    fn describe(&self) -> String {
        format!("images {}", self.root.display())
    }
}
