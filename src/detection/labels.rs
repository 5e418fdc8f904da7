// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 类别名称与颜色
//!
//! - `ClassRegistry`: 类别名称表, 行号即类别ID
//! - `ColorPalette`: 每个类别一个随机颜色, 整个运行期间不变
//! - `LabelBinder`: 检测结果 → 绘制用的标签文本与颜色

use std::fs;
use std::path::Path;

use rand::Rng;

use super::types::Detection;

/// 类别名称表 (启动时加载一次, 之后只读)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClassRegistry {
    names: Vec<String>,
}

impl ClassRegistry {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    /// 从文本文件加载, 每行一个类别名
    ///
    /// 文件不存在或无法读取时返回空表, 不视为致命错误.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(text) => {
                let registry = Self::parse(&text);
                log::info!(
                    "✅ 类别文件已加载: {} ({} 类)",
                    path.display(),
                    registry.len()
                );
                registry
            }
            Err(e) => {
                log::warn!("⚠️  类别文件读取失败 {}: {}, 使用空类别表", path.display(), e);
                Self::default()
            }
        }
    }

    /// 解析类别文本, 忽略末尾空行
    pub fn parse(text: &str) -> Self {
        let mut names: Vec<String> = text
            .lines()
            .map(|line| line.trim_end_matches('\r').to_string())
            .collect();
        while names.last().is_some_and(|name| name.trim().is_empty()) {
            names.pop();
        }
        Self { names }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn name(&self, class_id: usize) -> Option<&str> {
        self.names.get(class_id).map(String::as_str)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// 类别颜色表 (RGB)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColorPalette {
    colors: Vec<[u8; 3]>,
}

impl ColorPalette {
    /// 为每个类别随机生成颜色 (三个独立的 0-255 随机字节)
    pub fn random(num_classes: usize) -> Self {
        Self::random_with(num_classes, &mut rand::thread_rng())
    }

    pub fn random_with<R: Rng + ?Sized>(num_classes: usize, rng: &mut R) -> Self {
        let colors = (0..num_classes)
            .map(|_| [rng.gen::<u8>(), rng.gen::<u8>(), rng.gen::<u8>()])
            .collect();
        Self { colors }
    }

    pub fn from_colors(colors: Vec<[u8; 3]>) -> Self {
        Self { colors }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn color(&self, class_id: usize) -> Option<[u8; 3]> {
        self.colors.get(class_id).copied()
    }
}

/// 绘制用标签
#[derive(Clone, Debug, PartialEq)]
pub struct BoundLabel {
    pub text: String,
    pub color: [u8; 3],
}

/// 标签绑定器: 类别ID → "名称: 置信度" + 颜色
#[derive(Clone, Debug)]
pub struct LabelBinder {
    registry: ClassRegistry,
    palette: ColorPalette,
}

impl LabelBinder {
    pub fn new(registry: ClassRegistry, palette: ColorPalette) -> Self {
        Self { registry, palette }
    }

    /// 用随机颜色表构建
    pub fn with_random_colors(registry: ClassRegistry) -> Self {
        let palette = ColorPalette::random(registry.len());
        Self::new(registry, palette)
    }

    pub fn registry(&self) -> &ClassRegistry {
        &self.registry
    }

    pub fn palette(&self) -> &ColorPalette {
        &self.palette
    }

    /// 类别数量
    pub fn num_classes(&self) -> usize {
        self.registry.len()
    }

    /// 类别ID超出类别表时返回 None
    pub fn bind(&self, detection: &Detection) -> Option<BoundLabel> {
        let name = self.registry.name(detection.class_id)?;
        let color = self.palette.color(detection.class_id)?;
        Some(BoundLabel {
            text: format_label(name, detection.confidence),
            color,
        })
    }
}

/// 标签文本: "<name>: <confidence 两位小数>"
pub fn format_label(name: &str, confidence: f32) -> String {
    format!("{}: {:.2}", name, confidence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::types::BBox;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_parse() {
        let registry = ClassRegistry::parse("person\r\nbicycle\ncar\n\n");
        assert_eq!(registry.names(), &["person", "bicycle", "car"]);
    }

    #[test]
    fn test_parse_keeps_inner_blank_lines() {
        let registry = ClassRegistry::parse("a\n\nc\n");
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.name(1), Some(""));
    }

    #[test]
    fn test_missing_file_is_empty() {
        let registry = ClassRegistry::load("/definitely/not/here.names");
        assert!(registry.is_empty());
    }

    #[test]
    fn test_palette_size_and_stability() {
        let palette = ColorPalette::random_with(80, &mut StdRng::seed_from_u64(7));
        assert_eq!(palette.len(), 80);
        assert_eq!(palette.color(3), palette.color(3));
        assert_eq!(palette.color(80), None);
    }

    #[test]
    fn test_format_label() {
        assert_eq!(format_label("dog", 0.876), "dog: 0.88");
        assert_eq!(format_label("cat", 0.5), "cat: 0.50");
    }

    #[test]
    fn test_bind() {
        let registry = ClassRegistry::parse("person\ncar\ntruck\n");
        let palette = ColorPalette::from_colors(vec![[1, 2, 3], [4, 5, 6], [7, 8, 9]]);
        let binder = LabelBinder::new(registry, palette);

        let det = Detection::new(2, 0.91, BBox::new(0., 0., 1., 1.));
        let label = binder.bind(&det).unwrap();
        assert_eq!(label.text, "truck: 0.91");
        assert_eq!(label.color, [7, 8, 9]);

        let unknown = Detection::new(3, 0.91, BBox::default());
        assert!(binder.bind(&unknown).is_none());
    }
}
