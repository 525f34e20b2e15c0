//! 应用设置模块
//!
//! # 设计思路
//!
//! 所有可调项集中在一个 JSON 文件中，缺字段取默认值；
//! 文件不存在或无法解析时整体回退到默认设置并记录警告，绝不因设置问题中断生成流程。

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::image_handler::{DEFAULT_TARGET_SIZE, ImagePerformanceProfile};
use crate::qr::{HexColor, StyleChoice, StyleMode};
use crate::share::ShareRetryPolicy;

/// 默认设置文件名（位于当前目录）。
pub const SETTINGS_FILE_NAME: &str = "qr-platform.json";

/// 应用设置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// 默认样式模式。
    pub style: StyleMode,
    /// 默认主色。
    pub primary: HexColor,
    /// 默认渐变终点色。
    pub secondary: HexColor,
    /// 表单页二维码边长（像素）。
    pub page_size: u32,
    /// 首页即时生成的二维码边长（像素）。
    pub instant_size: u32,
    /// 表单页 logo 规范化后的边长（像素）。
    pub logo_size: u32,
    /// 首页即时生成的 logo 边长（像素）。
    pub instant_logo_size: u32,
    /// 表单页占位动画时长（毫秒）。
    pub form_delay_ms: u64,
    /// 即时生成占位动画时长（毫秒）。
    pub instant_delay_ms: u64,
    /// 自定义输出目录。
    pub output_dir: Option<String>,
    /// logo 处理性能档位：quality / balanced / speed。
    pub performance_profile: String,
    pub share_retry: ShareRetryPolicy,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            style: StyleMode::Basic,
            primary: HexColor::rgb(0x00, 0xf2, 0xff),
            secondary: HexColor::rgb(0xff, 0x00, 0xc8),
            page_size: 300,
            instant_size: 260,
            logo_size: 120,
            instant_logo_size: DEFAULT_TARGET_SIZE,
            form_delay_ms: 3_000,
            instant_delay_ms: 2_000,
            output_dir: None,
            performance_profile: "balanced".to_string(),
            share_retry: ShareRetryPolicy::default(),
        }
    }
}

impl AppSettings {
    pub fn style_choice(&self) -> StyleChoice {
        StyleChoice {
            mode: self.style,
            primary: self.primary,
            secondary: self.secondary,
        }
    }

    pub fn form_delay(&self) -> Duration {
        Duration::from_millis(self.form_delay_ms)
    }

    pub fn instant_delay(&self) -> Duration {
        Duration::from_millis(self.instant_delay_ms)
    }

    /// 档位无法识别时回退到 balanced。
    pub fn performance_profile(&self) -> ImagePerformanceProfile {
        ImagePerformanceProfile::parse(&self.performance_profile).unwrap_or_else(|e| {
            log::warn!("⚠️ {}，使用 balanced", e);
            ImagePerformanceProfile::Balanced
        })
    }
}

pub fn default_settings_path() -> PathBuf {
    PathBuf::from(SETTINGS_FILE_NAME)
}

/// 读取设置，缺失或损坏时回退默认值。
pub fn load_settings_from_path(path: &Path) -> AppSettings {
    if !path.exists() {
        log::debug!("⚙️ 未找到设置文件 {}，使用默认设置", path.display());
        return AppSettings::default();
    }

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            log::warn!("⚠️ 读取设置文件失败: {}，使用默认设置", e);
            return AppSettings::default();
        }
    };

    match serde_json::from_str(&content) {
        Ok(settings) => {
            log::info!("⚙️ 已加载设置: {}", path.display());
            settings
        }
        Err(e) => {
            log::warn!("⚠️ 解析设置文件失败: {}，使用默认设置", e);
            AppSettings::default()
        }
    }
}

pub fn save_settings_to_path(path: &Path, settings: &AppSettings) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| AppError::Settings(format!("创建设置目录失败: {}", e)))?;
    }

    let content = serde_json::to_string_pretty(settings)
        .map_err(|e| AppError::Settings(format!("序列化设置失败: {}", e)))?;

    fs::write(path, content)?;
    Ok(())
}
