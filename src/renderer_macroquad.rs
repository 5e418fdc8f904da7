// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! macroquad 显示窗口
//!
//! 主线程跑 macroquad 的帧循环, 每帧驱动一次 `Pipeline::step`, 把标注后的画面画成纹理.
//! 关闭窗口 / 按 q / Esc 设置取消标记.

use std::time::Instant;

use image::buffer::ConvertBuffer;
use image::{RgbImage, RgbaImage};
use macroquad::prelude::*;

use crate::error::Result;
use crate::input::FrameSource;
use crate::models::Model;
use crate::pipeline::{Pipeline, RunContext, RunStats};

/// 窗口配置
pub fn window_conf(title: &str, width: i32, height: i32) -> Conf {
    Conf {
        window_title: title.to_string(),
        window_width: width,
        window_height: height,
        high_dpi: true,
        ..Default::default()
    }
}

/// 显示最新一帧的窗口
pub struct FrameWindow {
    texture: Option<Texture2D>,
    render_count: u64,
    render_last: Instant,
    render_fps: f64,
}

impl Default for FrameWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameWindow {
    pub fn new() -> Self {
        Self {
            texture: None,
            render_count: 0,
            render_last: Instant::now(),
            render_fps: 0.0,
        }
    }

    /// 上传新帧; 只在分辨率变化时重建纹理
    pub fn update(&mut self, frame: &RgbImage) -> bool {
        let Some((w, h)) = texture_size(frame.width(), frame.height()) else {
            log::warn!(
                "⚠️ 帧尺寸超出纹理上限, 跳过显示: {}x{}",
                frame.width(),
                frame.height()
            );
            return false;
        };
        let rgba: RgbaImage = frame.convert();

        match &self.texture {
            Some(tex) if tex.width() as u16 == w && tex.height() as u16 == h => {
                tex.update(&Image {
                    bytes: rgba.into_raw(),
                    width: w,
                    height: h,
                });
            }
            _ => {
                let texture = Texture2D::from_rgba8(w, h, rgba.as_raw());
                texture.set_filter(FilterMode::Linear);
                self.texture = Some(texture);
            }
        }
        true
    }

    /// 等比缩放居中绘制
    pub fn draw(&mut self) {
        clear_background(BLACK);

        if let Some(texture) = &self.texture {
            let scale = (screen_width() / texture.width()).min(screen_height() / texture.height());
            let scaled_width = texture.width() * scale;
            let scaled_height = texture.height() * scale;
            let x = (screen_width() - scaled_width) / 2.0;
            let y = (screen_height() - scaled_height) / 2.0;

            draw_texture_ex(
                texture,
                x,
                y,
                WHITE,
                DrawTextureParams {
                    dest_size: Some(vec2(scaled_width, scaled_height)),
                    ..Default::default()
                },
            );
        }

        self.render_count += 1;
        let now = Instant::now();
        if now.duration_since(self.render_last).as_secs() >= 1 {
            self.render_fps =
                self.render_count as f64 / now.duration_since(self.render_last).as_secs_f64();
            self.render_count = 0;
            self.render_last = now;
        }
        draw_text(
            &format!("{:.1} fps", self.render_fps),
            10.0,
            screen_height() - 10.0,
            20.0,
            WHITE,
        );
    }
}

/// 纹理尺寸为 u16, 超出时返回 None
pub fn texture_size(width: u32, height: u32) -> Option<(u16, u16)> {
    Some((u16::try_from(width).ok()?, u16::try_from(height).ok()?))
}

/// 关闭窗口或按 q / Esc
pub fn close_requested() -> bool {
    is_quit_requested() || is_key_pressed(KeyCode::Q) || is_key_pressed(KeyCode::Escape)
}

/// 带窗口运行. 有限输入读完后保留最后一帧, 直到窗口关闭.
pub async fn run_windowed<S: FrameSource, M: Model>(
    pipeline: &mut Pipeline<S, M>,
    ctx: &RunContext,
) -> Result<RunStats> {
    prevent_quit();
    let mut window = FrameWindow::new();
    let mut exhausted = false;

    log::info!("🖥️  显示窗口已启动 (q / Esc 退出)");
    loop {
        if close_requested() {
            ctx.token().cancel();
        }
        if ctx.should_stop(pipeline.stats().frames) {
            break;
        }

        if !exhausted {
            match pipeline.step(ctx)? {
                Some(processed) => {
                    window.update(&processed.frame);
                }
                None if ctx.is_cancelled() => break,
                None => {
                    log::info!("⏹️ 输入已结束, 关闭窗口退出");
                    exhausted = true;
                }
            }
        }

        window.draw();
        next_frame().await;
    }

    Ok(pipeline.stats())
}
