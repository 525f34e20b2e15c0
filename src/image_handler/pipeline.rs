//! # 解码与正方形规范化流水线
//!
//! ## 设计思路
//!
//! 将“字节 → 图像 → 正方形 PNG”的过程集中管理，并在关键节点增加资源上限控制。
//! 优先做尺寸检查，再进行完整解码，降低恶意输入触发高内存开销的风险。
//!
//! ## 几何规则
//!
//! `scale = max(target / width, target / height)`：按“铺满”而非“适应”缩放，
//! 缩放后图像中心对齐画布中心，超出画布的部分被裁掉。等价地，在源图坐标系中
//! 取一个边长为 `target / scale` 的居中正方形，再整体缩放到 `target × target`。
//! 这样输出永远不会出现空白边框。

use base64::{Engine as _, engine::general_purpose};
use fast_image_resize as fr;
use image::{DynamicImage, GenericImageView, ImageBuffer, ImageFormat, Rgba};
use std::io::Cursor;

use super::source::RawImageData;
use super::{ImageConfig, ImageError, ImageHandler};

/// 源图坐标系中的居中裁剪区域。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FillCrop {
    /// 源图 → 画布的缩放比例。
    pub scale: f64,
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// 计算“铺满 + 居中裁剪”所需的源图区域。
///
/// 宽高任一为 0 时返回 `None`。
pub fn compute_fill_crop(src_width: u32, src_height: u32, target: u32) -> Option<FillCrop> {
    if src_width == 0 || src_height == 0 || target == 0 {
        return None;
    }

    let w = src_width as f64;
    let h = src_height as f64;
    let t = target as f64;

    let scale = (t / w).max(t / h);
    let side = t / scale;
    let width = side.min(w);
    let height = side.min(h);

    Some(FillCrop {
        scale,
        left: (w - width) / 2.0,
        top: (h - height) / 2.0,
        width,
        height,
    })
}

impl ImageHandler {
    /// 将原始字节解码为受限大小的图像。
    pub(super) fn decode_with_limits(
        &self,
        raw: &RawImageData,
        config: &ImageConfig,
    ) -> Result<DynamicImage, ImageError> {
        let (header_width, header_height) = Self::inspect_dimensions_from_memory(&raw.bytes)?;
        Self::validate_pixel_limits(config, header_width, header_height)?;
        Self::validate_decoded_memory_limits(config, header_width, header_height)?;

        let decoded = image::load_from_memory(&raw.bytes)
            .map_err(|e| ImageError::Decode(format!("图片解码失败：{}", e)))?;

        let (width, height) = decoded.dimensions();
        Self::validate_pixel_limits(config, width, height)?;

        log::debug!(
            "🖼️ logo 解码成功 - 来源: {} 尺寸: {}x{}",
            raw.source_hint,
            width,
            height
        );

        Ok(decoded)
    }

    /// 仅通过内存中的图片头信息读取宽高。
    fn inspect_dimensions_from_memory(bytes: &[u8]) -> Result<(u32, u32), ImageError> {
        let cursor = Cursor::new(bytes);
        let reader = image::ImageReader::new(cursor)
            .with_guessed_format()
            .map_err(|e| ImageError::Decode(format!("无法识别图片格式：{}", e)))?;

        reader
            .into_dimensions()
            .map_err(|e| ImageError::Decode(format!("无法读取图片尺寸：{}", e)))
    }

    fn validate_pixel_limits(config: &ImageConfig, width: u32, height: u32) -> Result<(), ImageError> {
        let pixels = (width as u64)
            .checked_mul(height as u64)
            .ok_or_else(|| ImageError::ResourceLimit("图片像素数溢出".to_string()))?;

        if pixels > config.max_decoded_pixels {
            return Err(ImageError::ResourceLimit(format!(
                "图片像素过大：{} 像素（限制：{} 像素）",
                pixels, config.max_decoded_pixels
            )));
        }

        Ok(())
    }

    fn validate_decoded_memory_limits(
        config: &ImageConfig,
        width: u32,
        height: u32,
    ) -> Result<(), ImageError> {
        let estimated = (width as u64)
            .checked_mul(height as u64)
            .and_then(|pixels| pixels.checked_mul(4))
            .ok_or_else(|| ImageError::ResourceLimit("图片解码内存估算溢出".to_string()))?;

        if estimated > config.max_decoded_bytes {
            return Err(ImageError::ResourceLimit(format!(
                "图片解码预计内存过大：{:.2} MB（限制：{:.2} MB）",
                estimated as f64 / 1024.0 / 1024.0,
                config.max_decoded_bytes as f64 / 1024.0 / 1024.0
            )));
        }

        Ok(())
    }

    /// 铺满缩放 + 居中裁剪到 `target × target`。
    pub(crate) fn fill_square(
        image: &DynamicImage,
        target: u32,
        filter: image::imageops::FilterType,
    ) -> Result<DynamicImage, ImageError> {
        let (width, height) = image.dimensions();
        let crop = compute_fill_crop(width, height, target)
            .ok_or_else(|| ImageError::Decode(format!("图片尺寸无效：{}x{}", width, height)))?;

        match Self::fill_with_fast_image_resize(image, target, &crop, filter) {
            Ok(square) => Ok(square),
            Err(err) => {
                log::warn!(
                    "⚠️ fast_image_resize 裁剪缩放失败，回退 image::resize_exact：{}",
                    err
                );
                Ok(Self::fill_with_image_ops(image, target, &crop, filter))
            }
        }
    }

    fn fill_with_fast_image_resize(
        image: &DynamicImage,
        target: u32,
        crop: &FillCrop,
        filter: image::imageops::FilterType,
    ) -> Result<DynamicImage, ImageError> {
        let src = image.to_rgba8();
        let (src_width, src_height) = src.dimensions();

        let src_image = fr::images::Image::from_vec_u8(
            src_width,
            src_height,
            src.into_raw(),
            fr::PixelType::U8x4,
        )
        .map_err(|e| ImageError::Decode(format!("构建源图像缓冲失败：{}", e)))?;

        let mut dst_image = fr::images::Image::new(target, target, fr::PixelType::U8x4);

        let mut resizer = fr::Resizer::new();
        let options = fr::ResizeOptions::new()
            .resize_alg(fr::ResizeAlg::Convolution(Self::to_fast_filter(filter)))
            .crop(crop.left, crop.top, crop.width, crop.height);

        resizer
            .resize(&src_image, &mut dst_image, Some(&options))
            .map_err(|e| ImageError::Decode(format!("fast_image_resize 执行失败：{}", e)))?;

        let rgba = ImageBuffer::<Rgba<u8>, Vec<u8>>::from_raw(target, target, dst_image.into_vec())
            .ok_or_else(|| ImageError::Decode("fast_image_resize 输出缓冲长度异常".to_string()))?;

        Ok(DynamicImage::ImageRgba8(rgba))
    }

    fn fill_with_image_ops(
        image: &DynamicImage,
        target: u32,
        crop: &FillCrop,
        filter: image::imageops::FilterType,
    ) -> DynamicImage {
        let x = crop.left.round() as u32;
        let y = crop.top.round() as u32;
        let w = (crop.width.round() as u32).max(1);
        let h = (crop.height.round() as u32).max(1);

        image.crop_imm(x, y, w, h).resize_exact(target, target, filter)
    }

    fn to_fast_filter(filter: image::imageops::FilterType) -> fr::FilterType {
        match filter {
            image::imageops::FilterType::Nearest => fr::FilterType::Box,
            image::imageops::FilterType::Triangle => fr::FilterType::Bilinear,
            image::imageops::FilterType::CatmullRom => fr::FilterType::CatmullRom,
            image::imageops::FilterType::Gaussian => fr::FilterType::Mitchell,
            image::imageops::FilterType::Lanczos3 => fr::FilterType::Lanczos3,
        }
    }

    /// 以无损 PNG 重新编码并包装为 Data URL。
    pub(super) fn encode_png_data_uri(image: &DynamicImage) -> Result<String, ImageError> {
        let mut cursor = Cursor::new(Vec::new());
        image
            .write_to(&mut cursor, ImageFormat::Png)
            .map_err(|e| ImageError::Encode(format!("PNG 编码失败：{}", e)))?;

        let encoded = general_purpose::STANDARD.encode(cursor.into_inner());
        Ok(format!("data:image/png;base64,{}", encoded))
    }
}

/// 把 Data URL / Base64 形式的图片解码成 RGBA 图像。
///
/// 渲染器在嵌入 logo 前调用，失败即视为更新被拒绝。
pub fn decode_data_uri_image(data: &str) -> Result<image::RgbaImage, ImageError> {
    let bytes = ImageHandler::decode_base64(data, u64::MAX)?;
    let decoded = image::load_from_memory(&bytes)
        .map_err(|e| ImageError::Decode(format!("图片解码失败：{}", e)))?;
    Ok(decoded.to_rgba8())
}
