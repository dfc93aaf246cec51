//! # 文本光栅化
//!
//! 使用内置 DejaVu Sans 字体，首次使用时解析一次。
//! 绘制坐标的 `y` 为字母基线，与常见 2D 画布的默认基线一致。

use ab_glyph::{Font, FontRef, GlyphId, PxScale, ScaleFont, point};
use image::{Rgba, RgbaImage};
use once_cell::sync::OnceCell;

use super::canvas::blend_over;
use super::CollageError;

const EMBEDDED_FONT_DATA: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");

static DEFAULT_FONT: OnceCell<FontRef<'static>> = OnceCell::new();

fn default_font() -> Result<&'static FontRef<'static>, CollageError> {
    DEFAULT_FONT.get_or_try_init(|| {
        FontRef::try_from_slice(EMBEDDED_FONT_DATA)
            .map_err(|e| CollageError::Render(format!("内置字体加载失败：{}", e)))
    })
}

/// 计算文本渲染后的宽高（像素，向上取整）。
pub fn measure_text(text: &str, font_size: f32) -> Result<(u32, u32), CollageError> {
    let font = default_font()?;
    let scaled = font.as_scaled(PxScale::from(font_size));

    let mut width = 0.0f32;
    let mut prev: Option<GlyphId> = None;
    for c in text.chars() {
        let id = scaled.glyph_id(c);
        if let Some(prev) = prev {
            width += scaled.kern(prev, id);
        }
        width += scaled.h_advance(id);
        prev = Some(id);
    }

    Ok((width.ceil().max(0.0) as u32, scaled.height().ceil() as u32))
}

/// 从 `(x, baseline)` 开始绘制单行文本，超出画布的部分被裁剪；整行都不可见时直接返回。
pub(crate) fn draw_text(
    target: &mut RgbaImage,
    text: &str,
    x: i64,
    baseline: i64,
    font_size: f32,
    fill: Rgba<u8>,
) -> Result<(), CollageError> {
    if !(font_size.is_finite() && font_size > 0.0) {
        return Err(CollageError::Render(format!("字号无效：{}", font_size)));
    }

    let (width, height) = (target.width() as i64, target.height() as i64);
    let (text_width, _) = measure_text(text, font_size)?;
    let reach = (font_size * 2.0).ceil() as i64;
    let off_canvas = x.saturating_sub(reach) >= width
        || x.saturating_add(text_width as i64) <= 0
        || baseline.saturating_sub(reach) >= height
        || baseline.saturating_add(reach) <= 0;
    if off_canvas {
        return Ok(());
    }

    let font = default_font()?;
    let scale = PxScale::from(font_size);
    let scaled = font.as_scaled(scale);

    let mut cursor_x = x as f32;
    let mut prev: Option<GlyphId> = None;

    for c in text.chars() {
        let id = scaled.glyph_id(c);
        if let Some(prev) = prev {
            cursor_x += scaled.kern(prev, id);
        }

        let glyph = id.with_scale_and_position(scale, point(cursor_x, baseline as f32));
        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                let px = (bounds.min.x as i64).saturating_add(gx as i64);
                let py = (bounds.min.y as i64).saturating_add(gy as i64);
                if px < 0 || py < 0 || px >= width || py >= height {
                    return;
                }

                let (px, py) = (px as u32, py as u32);
                let blended = blend_over(*target.get_pixel(px, py), fill, coverage);
                target.put_pixel(px, py, blended);
            });
        }

        cursor_x += scaled.h_advance(id);
        prev = Some(id);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_font_loads() {
        assert!(default_font().is_ok());
    }

    #[test]
    fn larger_font_measures_larger() {
        let (w1, h1) = measure_text("Hello", 20.0).unwrap();
        let (w2, h2) = measure_text("Hello", 40.0).unwrap();

        assert!(w2 > w1);
        assert!(h2 > h1);
        assert_eq!(measure_text("", 40.0).unwrap().0, 0);
    }

    #[test]
    fn glyphs_sit_above_the_baseline() {
        let mut image = RgbaImage::from_pixel(200, 100, Rgba([255, 255, 255, 255]));
        draw_text(&mut image, "H", 20, 60, 40.0, Rgba([0, 0, 0, 255])).unwrap();

        let dark = |x: u32, y: u32| image.get_pixel(x, y)[0] < 128;
        let inked_rows: Vec<u32> = (0..100).filter(|&y| (0..200).any(|x| dark(x, y))).collect();

        assert!(!inked_rows.is_empty());
        assert!(*inked_rows.last().unwrap() <= 60);
        assert!(*inked_rows.first().unwrap() >= 20);
        assert!((0..100).all(|y| (0..20).all(|x| !dark(x, y))));
    }

    #[test]
    fn text_outside_the_image_is_clipped() {
        let mut image = RgbaImage::new(10, 10);
        draw_text(&mut image, "clipped", -500, -500, 40.0, Rgba([0, 0, 0, 255])).unwrap();

        assert!(image.pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn extreme_origin_does_not_overflow() {
        let mut image = RgbaImage::new(10, 10);
        draw_text(&mut image, "edge", i64::MAX, i64::MAX, 40.0, Rgba([0, 0, 0, 255])).unwrap();
        draw_text(&mut image, "edge", i64::MIN, i64::MIN, 40.0, Rgba([0, 0, 0, 255])).unwrap();

        assert!(image.pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn rejects_non_positive_font_size() {
        let mut image = RgbaImage::new(10, 10);

        assert!(matches!(
            draw_text(&mut image, "x", 0, 5, 0.0, Rgba([0, 0, 0, 255])),
            Err(CollageError::Render(_))
        ));
    }
}
