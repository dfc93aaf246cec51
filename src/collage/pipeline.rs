//! # 解码与缩放流水线模块
//!
//! ## 设计思路
//!
//! 将“字节 → 图像 → 目标矩形尺寸的 RGBA”集中管理，并在完整解码前做资源上限控制。
//!
//! ## 实现思路
//!
//! 1. 通过文件签名（magic bytes）确认是图片
//! 2. 读取 header 尺寸，按像素上限快速拒绝
//! 3. 完整解码
//! 4. 使用 `fast_image_resize` 缩放到目标尺寸，失败时回退 `image::resize_exact`

use std::io::Cursor;

use fast_image_resize as fr;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageBuffer, ImageReader, Rgba, RgbaImage};

use super::{CollageError, Composer};

impl Composer {
    /// 将原始字节解码为图像。`hint` 仅用于日志。
    pub(super) fn decode_image(&self, bytes: &[u8], hint: &str) -> Result<DynamicImage, CollageError> {
        validate_image_signature(bytes)?;

        let (header_width, header_height) = inspect_dimensions_from_memory(bytes)?;
        self.validate_pixel_limits(header_width, header_height)?;

        let decoded = image::load_from_memory(bytes)
            .map_err(|e| CollageError::Decode(format!("图片解码失败：{}", e)))?;

        log::debug!(
            "🖼️ 图片解码成功 - 来源: {} 尺寸: {}x{}",
            hint,
            decoded.width(),
            decoded.height()
        );

        Ok(decoded)
    }

    /// 缩放到目标矩形尺寸；尺寸一致时直接转换，不经过滤镜。
    pub(super) fn scale_to(&self, image: &DynamicImage, width: u32, height: u32) -> RgbaImage {
        if image.dimensions() == (width, height) {
            return image.to_rgba8();
        }
        if width == 0 || height == 0 {
            return RgbaImage::new(width, height);
        }

        let filter = self.config().resize_filter;
        match resize_with_fast_image_resize(image, width, height, filter) {
            Ok(resized) => resized,
            Err(err) => {
                log::warn!("⚠️ fast_image_resize 缩放失败，回退 image::resize_exact：{}", err);
                image.resize_exact(width, height, filter).to_rgba8()
            }
        }
    }

    fn validate_pixel_limits(&self, width: u32, height: u32) -> Result<(), CollageError> {
        let pixels = (width as u64)
            .checked_mul(height as u64)
            .ok_or_else(|| CollageError::ResourceLimit("图片像素数溢出".to_string()))?;

        let limit = self.config().max_decoded_pixels;
        if pixels > limit {
            return Err(CollageError::ResourceLimit(format!(
                "图片像素过大：{} 像素（限制：{} 像素）",
                pixels, limit
            )));
        }

        Ok(())
    }
}

/// 仅通过图片头信息读取宽高。
fn inspect_dimensions_from_memory(bytes: &[u8]) -> Result<(u32, u32), CollageError> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| CollageError::InvalidFormat(format!("无法识别图片格式：{}", e)))?
        .into_dimensions()
        .map_err(|e| CollageError::InvalidFormat(format!("无法读取图片尺寸：{}", e)))
}

/// 通过文件签名校验输入是否为图片。
fn validate_image_signature(bytes: &[u8]) -> Result<(), CollageError> {
    if bytes.is_empty() {
        return Err(CollageError::InvalidFormat("图片内容为空".to_string()));
    }

    let kind = infer::get(bytes)
        .ok_or_else(|| CollageError::InvalidFormat("无法识别图片类型".to_string()))?;

    if kind.matcher_type() != infer::MatcherType::Image {
        return Err(CollageError::InvalidFormat(format!(
            "文件签名不是图片类型：{}",
            kind.mime_type()
        )));
    }

    Ok(())
}

fn resize_with_fast_image_resize(
    image: &DynamicImage,
    target_width: u32,
    target_height: u32,
    filter: FilterType,
) -> Result<RgbaImage, CollageError> {
    let src = image.to_rgba8();
    let (src_width, src_height) = src.dimensions();

    let src_image =
        fr::images::Image::from_vec_u8(src_width, src_height, src.into_raw(), fr::PixelType::U8x4)
            .map_err(|e| CollageError::Decode(format!("构建源图像缓冲失败：{}", e)))?;

    let mut dst_image = fr::images::Image::new(target_width, target_height, fr::PixelType::U8x4);

    let mut resizer = fr::Resizer::new();
    let options =
        fr::ResizeOptions::new().resize_alg(fr::ResizeAlg::Convolution(to_fast_filter(filter)));

    resizer
        .resize(&src_image, &mut dst_image, Some(&options))
        .map_err(|e| CollageError::Decode(format!("fast_image_resize 执行失败：{}", e)))?;

    ImageBuffer::<Rgba<u8>, Vec<u8>>::from_raw(target_width, target_height, dst_image.into_vec())
        .ok_or_else(|| CollageError::Decode("fast_image_resize 输出缓冲长度异常".to_string()))
}

fn to_fast_filter(filter: FilterType) -> fr::FilterType {
    match filter {
        FilterType::Nearest => fr::FilterType::Box,
        FilterType::Triangle => fr::FilterType::Bilinear,
        FilterType::CatmullRom => fr::FilterType::CatmullRom,
        FilterType::Gaussian => fr::FilterType::Mitchell,
        FilterType::Lanczos3 => fr::FilterType::Lanczos3,
    }
}
