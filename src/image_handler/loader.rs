//! # logo 字节加载
//!
//! 三种来源（文件 / Data URL 或 Base64 / 内存字节）在这里统一成 `RawImageData`。
//! 体积限制尽量在读取或解码之前判断：文件看 metadata，Base64 先按长度估算解码上限。
//! 最后统一用 magic bytes 确认是图片，非图片内容不会进入解码阶段。

use base64::{Engine as _, engine::general_purpose};
use std::path::Path;

use super::source::RawImageData;
use super::{ImageConfig, ImageError, ImageHandler};

const DATA_URI_MARKER: &str = ";base64,";

fn megabytes(len: u64) -> f64 {
    len as f64 / 1024.0 / 1024.0
}

/// 超过 `limit` 时返回 `ResourceLimit`，`what` 描述被限制的对象。
fn ensure_within_limit(len: u64, limit: u64, what: &str) -> Result<(), ImageError> {
    if len > limit {
        return Err(ImageError::ResourceLimit(format!(
            "{}过大：{:.2} MB（限制：{:.2} MB）",
            what,
            megabytes(len),
            megabytes(limit)
        )));
    }
    Ok(())
}

/// 去掉 `data:<mime>;base64,` 前缀，纯 Base64 原样返回。
fn strip_data_uri(data: &str) -> Result<&str, ImageError> {
    let data = data.trim();
    if !data.starts_with("data:") {
        return Ok(data);
    }

    data.split_once(DATA_URI_MARKER)
        .map(|(_, payload)| payload)
        .ok_or_else(|| ImageError::InvalidFormat("Data URL 缺少 base64 标记".to_string()))
}

/// 每 4 个字符最多解出 3 个字节。
fn decoded_len_upper_bound(encoded: &str) -> u64 {
    (encoded.len() as u64).div_ceil(4).saturating_mul(3)
}

impl ImageHandler {
    /// 解析 Data URL 或纯 Base64，`limit` 在解码前按估算体积检查。
    pub(crate) fn decode_base64(data: &str, limit: u64) -> Result<Vec<u8>, ImageError> {
        let payload = strip_data_uri(data)?;
        ensure_within_limit(decoded_len_upper_bound(payload), limit, "Base64 预计解码体积")?;

        general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| ImageError::Decode(format!("Base64 解码失败：{}", e)))
    }

    pub(super) fn load_from_base64(&self, data: &str, config: &ImageConfig) -> Result<RawImageData, ImageError> {
        log::info!("📝 读取内联 logo（{} 字符）", data.len());

        let bytes = Self::decode_base64(data, config.max_file_size)?;
        ensure_within_limit(bytes.len() as u64, config.max_file_size, "Base64 解码后体积")?;
        Self::ensure_image_signature(&bytes)?;

        Ok(RawImageData {
            bytes,
            source_hint: "base64",
        })
    }

    pub(super) fn load_from_file(&self, path: &str, config: &ImageConfig) -> Result<RawImageData, ImageError> {
        log::info!("📁 读取 logo 文件: {}", path);

        let file_path = Path::new(path);
        let metadata = std::fs::metadata(file_path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ImageError::FileSystem(format!("文件不存在：{}", path)),
            _ => ImageError::FileSystem(format!("无法读取文件信息：{}", e)),
        })?;
        ensure_within_limit(metadata.len(), config.max_file_size, "logo 文件")?;

        let bytes =
            std::fs::read(file_path).map_err(|e| ImageError::FileSystem(format!("无法读取 logo 文件：{}", e)))?;
        Self::ensure_image_signature(&bytes)?;

        Ok(RawImageData {
            bytes,
            source_hint: "file",
        })
    }

    pub(super) fn load_from_bytes(&self, bytes: Vec<u8>, config: &ImageConfig) -> Result<RawImageData, ImageError> {
        ensure_within_limit(bytes.len() as u64, config.max_file_size, "logo 字节")?;
        Self::ensure_image_signature(&bytes)?;

        Ok(RawImageData {
            bytes,
            source_hint: "bytes",
        })
    }

    fn ensure_image_signature(bytes: &[u8]) -> Result<(), ImageError> {
        let kind = infer::get(bytes).ok_or_else(|| {
            ImageError::Decode(if bytes.is_empty() {
                "logo 内容为空".to_string()
            } else {
                "无法识别 logo 的图片类型".to_string()
            })
        })?;

        match kind.matcher_type() {
            infer::MatcherType::Image => Ok(()),
            _ => Err(ImageError::Decode(format!("logo 不是图片：{}", kind.mime_type()))),
        }
    }
}
