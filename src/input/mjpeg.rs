// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 网络 MJPEG 输入模块
//!
//! 通过 HTTP 拉取 multipart MJPEG 流 (或单张 JPEG 快照地址), 在内存中解码为 RGB 帧.

use std::io::Read;

use image::RgbImage;

use super::FrameSource;
use crate::error::{Error, Result};

/// 单帧 JPEG 最大字节数
const MAX_JPEG_BYTES: usize = 5 * 1024 * 1024;

/// MJPEG 输入配置
#[derive(Clone, Debug)]
pub struct MjpegConfig {
    /// 流地址 (http/https)
    pub url: String,
    /// 读缓冲大小
    pub chunk_size: usize,
}

impl Default for MjpegConfig {
    fn default() -> Self {
        Self {
            url: "http://192.168.4.1:81/stream".to_string(),
            chunk_size: 8192,
        }
    }
}

enum HttpStream {
    Mjpeg(MjpegStream),
    SingleJpeg,
}

/// 网络 MJPEG 帧来源
pub struct MjpegSource {
    config: MjpegConfig,
    stream: Option<HttpStream>,
    frame_count: u64,
}

impl MjpegSource {
    pub fn new(config: MjpegConfig) -> Self {
        Self {
            config,
            stream: None,
            frame_count: 0,
        }
    }

    /// 连接流地址, 根据 Content-Type 判断是 multipart 流还是单张快照
    pub fn connect(&mut self) -> Result<()> {
        log::info!("🔗 连接 MJPEG 流: {}", self.config.url);
        let response = ureq::get(&self.config.url)
            .call()
            .map_err(|e| Error::Source(format!("连接 {} 失败: {}", self.config.url, e)))?;
        let content_type = response.header("Content-Type").unwrap_or("").to_lowercase();
        if content_type.contains("multipart") {
            let reader = response.into_reader();
            self.stream = Some(HttpStream::Mjpeg(MjpegStream::new(
                reader,
                self.config.chunk_size,
            )));
        } else {
            self.stream = Some(HttpStream::SingleJpeg);
        }
        log::info!("✅ MJPEG 流连接成功 ({})", content_type);
        Ok(())
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

impl FrameSource for MjpegSource {
    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| Error::Source("MJPEG 流未连接".to_string()))?;
        let jpeg = match stream {
            HttpStream::Mjpeg(stream) => stream.read_next_jpeg()?,
            HttpStream::SingleJpeg => fetch_single_jpeg(&self.config.url)?,
        };
        let frame = decode_jpeg(&jpeg)?;
        self.frame_count += 1;
        Ok(Some(frame))
    }

    fn reconnect(&mut self) -> Result<()> {
        self.stream = None;
        self.connect()
    }

    fn describe(&self) -> String {
        format!("MJPEG {}", self.config.url)
    }
}

/// multipart 流中按 SOI/EOI 标记切出 JPEG
pub struct MjpegStream {
    reader: Box<dyn Read + Send>,
    buffer: Vec<u8>,
    chunk: Vec<u8>,
}

impl MjpegStream {
    pub fn new(reader: Box<dyn Read + Send>, chunk_size: usize) -> Self {
        Self {
            reader,
            buffer: Vec::with_capacity(64 * 1024),
            chunk: vec![0u8; chunk_size.max(1)],
        }
    }

    pub fn read_next_jpeg(&mut self) -> Result<Vec<u8>> {
        loop {
            if let Some((start, end)) = find_jpeg_bounds(&self.buffer) {
                let frame = self.buffer[start..end].to_vec();
                self.buffer.drain(..end);
                return Ok(frame);
            }

            let read = self
                .reader
                .read(&mut self.chunk)
                .map_err(|e| Error::Frame(format!("读取 MJPEG 数据失败: {}", e)))?;
            if read == 0 {
                return Err(Error::Frame("MJPEG 流已结束".to_string()));
            }
            self.buffer.extend_from_slice(&self.chunk[..read]);

            // 一直找不到完整帧时只保留末尾, 防止缓冲无限增长
            if self.buffer.len() > MAX_JPEG_BYTES * 2 {
                let drain_len = self.buffer.len() - 2;
                self.buffer.drain(..drain_len);
            }
        }
    }
}

fn fetch_single_jpeg(url: &str) -> Result<Vec<u8>> {
    let response = ureq::get(url)
        .call()
        .map_err(|e| Error::Frame(format!("获取 JPEG 快照失败 {}: {}", url, e)))?;
    read_jpeg_body(response.into_reader(), MAX_JPEG_BYTES)
}

/// 读取整张 JPEG, 超过 `limit` 字节视为错误
fn read_jpeg_body(reader: impl Read, limit: usize) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    reader
        .take(limit as u64 + 1)
        .read_to_end(&mut bytes)
        .map_err(|e| Error::Frame(format!("读取 JPEG 快照失败: {}", e)))?;
    if bytes.len() > limit {
        return Err(Error::Frame(format!("JPEG 快照过大 (> {} 字节)", limit)));
    }
    if bytes.is_empty() {
        return Err(Error::Frame("JPEG 快照为空".to_string()));
    }
    Ok(bytes)
}

/// JPEG 字节 → RGB 帧
pub fn decode_jpeg(bytes: &[u8]) -> Result<RgbImage> {
    let image = image::load_from_memory(bytes)
        .map_err(|e| Error::Frame(format!("JPEG 解码失败: {}", e)))?;
    Ok(image.into_rgb8())
}

/// 查找第一个完整 JPEG 的 [start, end)
pub fn find_jpeg_bounds(buffer: &[u8]) -> Option<(usize, usize)> {
    let start = buffer.windows(2).position(|w| w == [0xFF, 0xD8])?;
    let end = buffer[start + 2..]
        .windows(2)
        .position(|w| w == [0xFF, 0xD9])?;
    Some((start, start + 2 + end + 2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{codecs::jpeg::JpegEncoder, Rgb};
    use std::io::Cursor;

    fn jpeg(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb(color));
        let mut bytes = Vec::new();
        JpegEncoder::new_with_quality(&mut bytes, 90)
            .encode_image(&img)
            .unwrap();
        bytes
    }

    #[test]
    fn test_find_jpeg_bounds() {
        let buf = [0x00, 0xFF, 0xD8, 0x01, 0x02, 0xFF, 0xD9, 0x03];
        assert_eq!(find_jpeg_bounds(&buf), Some((1, 7)));
        assert_eq!(find_jpeg_bounds(&[0xFF, 0xD8, 0x01]), None);
        assert_eq!(find_jpeg_bounds(&[]), None);
    }

    #[test]
    fn test_multipart_stream() {
        let mut body = Vec::new();
        for (w, h) in [(16, 8), (8, 16)] {
            body.extend_from_slice(b"--frame\r\nContent-Type: image/jpeg\r\n\r\n");
            body.extend_from_slice(&jpeg(w, h, [200, 10, 10]));
            body.extend_from_slice(b"\r\n");
        }
        // 小缓冲强制跨块拼接
        let mut stream = MjpegStream::new(Box::new(Cursor::new(body)), 7);

        let first = decode_jpeg(&stream.read_next_jpeg().unwrap()).unwrap();
        assert_eq!(first.dimensions(), (16, 8));
        let second = decode_jpeg(&stream.read_next_jpeg().unwrap()).unwrap();
        assert_eq!(second.dimensions(), (8, 16));

        assert!(matches!(stream.read_next_jpeg(), Err(Error::Frame(_))));
    }

    #[test]
    fn test_snapshot_body_limit() {
        let body = jpeg(8, 8, [0, 0, 0]);
        let len = body.len();
        assert_eq!(read_jpeg_body(Cursor::new(body.clone()), len).unwrap(), body);
        assert!(matches!(
            read_jpeg_body(Cursor::new(body), len - 1),
            Err(Error::Frame(ref msg)) if msg.contains("过大")
        ));
        assert!(matches!(
            read_jpeg_body(Cursor::new(Vec::new()), 16),
            Err(Error::Frame(_))
        ));
    }

    #[test]
    fn test_not_connected() {
        let mut source = MjpegSource::new(MjpegConfig::default());
        assert!(matches!(source.next_frame(), Err(Error::Source(_))));
    }
}
