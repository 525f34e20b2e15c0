//! # 二维码模块
//!
//! ## 调用链
//!
//! ```text
//! QrStyleConfig
//!    ↓ build_render_request（纯函数）
//! QrRenderRequest
//!    ↓ QrRenderer::create
//! RenderedQr ──update──▶ 实时样式 / logo 切换（configurator）
//!    ├─ to_blob（PNG / JPEG / SVG）
//!    └─ append（文件预览 / 终端预览）
//! ```

mod configurator;
mod error;
mod raster;
mod renderer;
mod request;
mod style;
mod svg;
mod target;

pub use configurator::{QrInstance, apply_style, create_instance, set_logo};
pub use error::RenderError;
pub use raster::RasterRenderer;
pub use renderer::{ExportFormat, ModuleMatrix, QrRenderer, RenderUpdate, RenderedQr};
pub use request::{
    BackgroundOptions, ColorStop, CornerDotKind, CornerSquareKind, CornersDotOptions, CornersSquareOptions, DotKind,
    DotsOptions, ErrorCorrection, Gradient, GradientKind, ImageOptions, LOGO_MARGIN_PX, LOGO_SIZE_RATIO, MAX_QR_SIZE,
    QrRenderRequest, StylePatch, build_render_request, derive_style,
};
pub use style::{HexColor, QrStyleConfig, StyleChoice, StyleDelta, StyleMode};
pub use target::{FilePreview, PreviewFrame, RenderTarget, TerminalPreview};
