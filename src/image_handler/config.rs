//! # 配置模块
//!
//! ## 设计思路
//!
//! 将 logo 处理的“可调策略”集中到 `ImageConfig`，保证运行时行为可观测、可调整、可测试。
//! 性能档位（quality / balanced / speed）作为高层语义，映射到重采样滤镜。
//!
//! ## 实现思路
//!
//! - `Default` 提供生产可用的平衡配置。
//! - `ImagePerformanceProfile` 负责档位字符串解析与反向输出。
//! - `apply_performance_profile` 将档位转换为具体滤镜。
//! - `infer_performance_profile` 用于从当前配置反推档位。

use image::imageops::FilterType;

use super::ImageError;

/// 未指定目标尺寸时使用的默认 logo 边长。
pub const DEFAULT_TARGET_SIZE: u32 = 140;

/// 图片处理配置。
#[derive(Debug, Clone)]
pub struct ImageConfig {
    /// 读取原始字节时允许的最大文件体积（字节）。
    pub max_file_size: u64,
    /// 解码后的像素上限（`width * height`）。
    pub max_decoded_pixels: u64,
    /// 解码阶段允许的预计内存上限（按 RGBA 估算，字节）。
    pub max_decoded_bytes: u64,
    /// 正方形输出允许的最大边长。
    pub max_target_size: u32,
    /// 重采样滤镜策略。
    pub resize_filter: FilterType,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            max_file_size: 20 * 1024 * 1024,
            max_decoded_pixels: 40_000_000,
            max_decoded_bytes: 160 * 1024 * 1024,
            max_target_size: 4096,
            resize_filter: FilterType::CatmullRom,
        }
    }
}

/// 图片性能档位（面向产品/用户语义）。
///
/// - `Quality`：尽量保真
/// - `Balanced`：质量与性能平衡
/// - `Speed`：优先处理速度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImagePerformanceProfile {
    Quality,
    Balanced,
    Speed,
}

impl ImagePerformanceProfile {
    /// 从外部字符串解析档位。
    ///
    /// # 示例
    /// ```rust
    /// use qr_platform::image_handler::ImagePerformanceProfile;
    ///
    /// let p = ImagePerformanceProfile::parse("balanced")?;
    /// assert_eq!(p.as_str(), "balanced");
    /// # Ok::<(), qr_platform::image_handler::ImageError>(())
    /// ```
    pub fn parse(profile: &str) -> Result<Self, ImageError> {
        match profile.trim().to_lowercase().as_str() {
            "quality" => Ok(Self::Quality),
            "balanced" => Ok(Self::Balanced),
            "speed" => Ok(Self::Speed),
            other => Err(ImageError::InvalidFormat(format!(
                "未知性能档位：{}（可选：quality / balanced / speed）",
                other
            ))),
        }
    }

    /// 将档位输出为稳定字符串，供设置文件持久化。
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Quality => "quality",
            Self::Balanced => "balanced",
            Self::Speed => "speed",
        }
    }
}

impl ImageConfig {
    /// 基于当前滤镜反推性能档位。
    pub(crate) fn infer_performance_profile(&self) -> ImagePerformanceProfile {
        match self.resize_filter {
            FilterType::Lanczos3 => ImagePerformanceProfile::Quality,
            FilterType::Nearest | FilterType::Triangle => ImagePerformanceProfile::Speed,
            _ => ImagePerformanceProfile::Balanced,
        }
    }

    /// 应用指定性能档位到实际参数。
    pub(crate) fn apply_performance_profile(&mut self, profile: ImagePerformanceProfile) {
        self.resize_filter = match profile {
            ImagePerformanceProfile::Quality => FilterType::Lanczos3,
            ImagePerformanceProfile::Balanced => FilterType::CatmullRom,
            ImagePerformanceProfile::Speed => FilterType::Triangle,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_roundtrips_through_config() {
        let mut config = ImageConfig::default();
        for profile in [
            ImagePerformanceProfile::Quality,
            ImagePerformanceProfile::Balanced,
            ImagePerformanceProfile::Speed,
        ] {
            config.apply_performance_profile(profile);
            assert_eq!(config.infer_performance_profile(), profile);
        }
    }

    #[test]
    fn unknown_profile_is_rejected() {
        assert!(matches!(
            ImagePerformanceProfile::parse("turbo"),
            Err(ImageError::InvalidFormat(_))
        ));
        assert_eq!(
            ImagePerformanceProfile::parse(" Speed ").map(|p| p.as_str()).ok(),
            Some("speed")
        );
    }
}
