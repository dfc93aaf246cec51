//! # 画布
//!
//! ## 设计思路
//!
//! `Canvas` 是一次调用独占的 RGBA 光栅面，提供最小的 2D 绘制原语：
//! 矩形填充、图片绘制、文本绘制与 PNG 编码。
//!
//! ## 实现思路
//!
//! - 所有绘制都按 source-over 规则做 alpha 合成，并裁剪到画布范围内。
//! - 图片缩放不在这里做：调用方先把图片缩放到目标矩形尺寸（见 `pipeline`），再按左上角绘制。

use std::fmt;
use std::io::Cursor;

use image::{ImageFormat, Rgba, RgbaImage};

use super::config::TextStyle;
use super::{CollageError, text};

/// RGBA 画布。
#[derive(Clone, PartialEq)]
pub struct Canvas {
    pixels: RgbaImage,
}

impl fmt::Debug for Canvas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Canvas")
            .field("dimensions", &self.dimensions())
            .finish()
    }
}

impl Canvas {
    /// 创建全透明画布。
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::new(width, height),
        }
    }

    pub fn from_rgba(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    /// 读取单个像素，越界返回 `None`。
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        self.pixels.get_pixel_checked(x, y).copied()
    }

    pub fn as_rgba(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn into_rgba(self) -> RgbaImage {
        self.pixels
    }

    /// 以颜色填满整个画布。
    pub fn fill(&mut self, color: Rgba<u8>) {
        let (width, height) = self.dimensions();
        self.fill_rect(0, 0, width, height, color);
    }

    pub fn fill_rect(&mut self, x: i64, y: i64, width: u32, height: u32, color: Rgba<u8>) {
        let Some((x0, y0, x1, y1)) = self.clip(x, y, width, height) else {
            return;
        };

        for py in y0..y1 {
            for px in x0..x1 {
                let blended = blend_over(*self.pixels.get_pixel(px, py), color, 1.0);
                self.pixels.put_pixel(px, py, blended);
            }
        }
    }

    /// 以 `(x, y)` 为左上角绘制已缩放好的图片。
    pub fn draw_image(&mut self, image: &RgbaImage, x: i64, y: i64) {
        let Some((x0, y0, x1, y1)) = self.clip(x, y, image.width(), image.height()) else {
            return;
        };

        for py in y0..y1 {
            for px in x0..x1 {
                let src = *image.get_pixel((px as i64 - x) as u32, (py as i64 - y) as u32);
                let blended = blend_over(*self.pixels.get_pixel(px, py), src, 1.0);
                self.pixels.put_pixel(px, py, blended);
            }
        }
    }

    /// 以 `(x, baseline)` 为起点绘制单行文本。
    pub fn fill_text(
        &mut self,
        content: &str,
        x: i64,
        baseline: i64,
        style: &TextStyle,
    ) -> Result<(), CollageError> {
        text::draw_text(&mut self.pixels, content, x, baseline, style.font_size, style.fill)
    }

    /// 编码为 PNG 字节。
    pub fn to_png_bytes(&self) -> Result<Vec<u8>, CollageError> {
        let mut cursor = Cursor::new(Vec::new());
        self.pixels
            .write_to(&mut cursor, ImageFormat::Png)
            .map_err(|e| CollageError::Render(format!("画布编码失败：{}", e)))?;
        Ok(cursor.into_inner())
    }

    /// 将矩形裁剪到画布内，返回 `[x0, x1) × [y0, y1)`；完全不可见时返回 `None`。
    fn clip(&self, x: i64, y: i64, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = x.saturating_add(width as i64).min(self.width() as i64);
        let y1 = y.saturating_add(height as i64).min(self.height() as i64);

        if x0 >= x1 || y0 >= y1 {
            return None;
        }

        Some((x0 as u32, y0 as u32, x1 as u32, y1 as u32))
    }
}

/// Porter-Duff "over"：`coverage` 额外乘到前景 alpha 上（用于文字抗锯齿）。
pub(crate) fn blend_over(background: Rgba<u8>, foreground: Rgba<u8>, coverage: f32) -> Rgba<u8> {
    let coverage = coverage.clamp(0.0, 1.0);
    if foreground[3] == 255 && coverage >= 1.0 {
        return foreground;
    }

    let fg_alpha = foreground[3] as f32 / 255.0 * coverage;
    let bg_alpha = background[3] as f32 / 255.0;
    let out_alpha = fg_alpha + bg_alpha * (1.0 - fg_alpha);

    if out_alpha < 0.001 {
        return Rgba([0, 0, 0, 0]);
    }

    let channel = |fg: u8, bg: u8| -> u8 {
        let value = (fg as f32 * fg_alpha + bg as f32 * bg_alpha * (1.0 - fg_alpha)) / out_alpha;
        value.round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        channel(foreground[0], background[0]),
        channel(foreground[1], background[1]),
        channel(foreground[2], background[2]),
        (out_alpha * 255.0).round() as u8,
    ])
}
