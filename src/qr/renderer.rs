//! # 渲染器能力接口
//!
//! 会话层与配置器只依赖 `QrRenderer` trait：
//!
//! ```text
//! create(request)            → RenderedQr
//! update(&mut instance, upd) → 原地修改（失败时实例保持不变）
//! to_blob(instance, format)  → Bytes
//! append(instance, target)   → 挂载到预览目标（先清空再挂载）
//! ```
//!
//! 二维码编码本身交给 `qrcode` crate，这里只持有编码结果（模块矩阵）。

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use image::RgbaImage;
use qrcode::{Color, QrCode};

use super::RenderError;
use super::request::{QrRenderRequest, StylePatch};
use super::target::RenderTarget;

/// 导出格式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExportFormat {
    #[default]
    Png,
    Jpeg,
    Svg,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Svg => "svg",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Svg => "image/svg+xml",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "svg" => Ok(Self::Svg),
            other => Err(RenderError::Export(format!("不支持的格式：{}", other))),
        }
    }
}

/// 对已渲染实例的更新。
#[derive(Debug, Clone, PartialEq)]
pub enum RenderUpdate {
    /// 整体替换点/背景/渐变/定位角样式。
    Style(StylePatch),
    /// 替换 logo，`None` 表示移除。
    Image(Option<String>),
}

/// `qrcode` 编码结果：`width × width` 的模块矩阵，不含静区。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleMatrix {
    width: usize,
    modules: Vec<bool>,
}

impl ModuleMatrix {
    pub fn encode(data: &str, request: &QrRenderRequest) -> Result<Self, RenderError> {
        let code = QrCode::with_error_correction_level(data.as_bytes(), request.error_correction.to_ec_level())
            .map_err(|e| RenderError::Encode(e.to_string()))?;

        let width = code.width();
        let modules = code.to_colors().into_iter().map(|c| c == Color::Dark).collect();

        Ok(Self { width, modules })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// 越界坐标视为浅色。
    pub fn is_dark(&self, x: isize, y: isize) -> bool {
        if x < 0 || y < 0 {
            return false;
        }
        let (x, y) = (x as usize, y as usize);
        if x >= self.width || y >= self.width {
            return false;
        }
        self.modules[y * self.width + x]
    }

    /// 三个 7×7 定位图案所在区域。
    pub fn in_finder(&self, x: usize, y: usize) -> bool {
        let far = self.width.saturating_sub(7);
        (x < 7 && y < 7) || (x >= far && y < 7) || (x < 7 && y >= far)
    }

    /// 定位图案左上角坐标（模块单位）。
    pub fn finder_origins(&self) -> [(usize, usize); 3] {
        let far = self.width.saturating_sub(7);
        [(0, 0), (far, 0), (0, far)]
    }
}

/// 已渲染的二维码实例。
#[derive(Debug, Clone)]
pub struct RenderedQr {
    pub(crate) request: QrRenderRequest,
    pub(crate) matrix: ModuleMatrix,
    pub(crate) logo: Option<RgbaImage>,
}

impl RenderedQr {
    pub fn request(&self) -> &QrRenderRequest {
        &self.request
    }

    pub fn matrix(&self) -> &ModuleMatrix {
        &self.matrix
    }

    pub fn has_logo(&self) -> bool {
        self.logo.is_some()
    }

    /// 输出边长（像素），创建后固定。
    pub fn size(&self) -> u32 {
        self.request.width
    }
}

/// 渲染器能力接口。
pub trait QrRenderer: Send + Sync {
    fn create(&self, request: QrRenderRequest) -> Result<RenderedQr, RenderError>;

    /// 失败时 `instance` 必须保持调用前的状态。
    fn update(&self, instance: &mut RenderedQr, update: RenderUpdate) -> Result<(), RenderError>;

    fn to_blob(&self, instance: &RenderedQr, format: ExportFormat) -> Result<Bytes, RenderError>;

    fn append(&self, instance: &RenderedQr, target: &mut dyn RenderTarget) -> Result<(), RenderError>;
}
