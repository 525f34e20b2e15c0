//! # 页面会话模块
//!
//! ## 设计思路
//!
//! 五个表单页与首页即时生成共用同一个 `PageSession`，差异由 `PageProfile`
//! （尺寸、占位时长、下载文件名）与 `PayloadBuilder`（校验 + 内容）表达。
//!
//! 每个会话最多持有一个活动实例，每次生成整体替换，从不并发修改。
//!
//! ## 生成流程
//!
//! ```text
//! GenerationGuard（重复提交 → Busy）
//!    ↓
//! 表单校验（失败 → Validation，不做任何渲染）
//!    ↓
//! 占位延迟（可配置，可为 0）
//!    ↓
//! logo 规范化（blocking 线程池；失败只记日志，继续无 logo 生成）
//!    ↓
//! create_instance → set_logo → 替换活动实例
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use bytes::Bytes;
use serde::Serialize;

use crate::error::AppError;
use crate::image_handler::{ImageHandler, ImageSource};
use crate::payload::{PayloadBuilder, PayloadKind};
use crate::qr::{
    ExportFormat, QrInstance, QrRenderer, QrStyleConfig, RenderError, RenderTarget, StyleChoice, StyleDelta,
    apply_style, create_instance, set_logo,
};
use crate::settings::AppSettings;
use crate::share::{ShareError, ShareSheet, SharedFile};
use crate::storage::{self, SavedFile};

/// 页面参数。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageProfile {
    pub kind: PayloadKind,
    /// 二维码边长（像素）。
    pub size: u32,
    /// logo 规范化边长（像素）。
    pub logo_size: u32,
    /// 占位动画时长。
    #[serde(skip)]
    pub delay: Duration,
    /// 下载文件基础名。
    pub download_stem: &'static str,
}

impl PageProfile {
    pub fn for_kind(kind: PayloadKind, settings: &AppSettings) -> Self {
        let download_stem = match kind {
            PayloadKind::Email => "qr-email",
            PayloadKind::Text => "qr-text",
            PayloadKind::Url => "qr-url",
            PayloadKind::Vcard => "qr-vcard",
            PayloadKind::Whatsapp => "qr-whatsapp",
            PayloadKind::InstantUrl => "qr-instant-url",
        };
        let (size, logo_size, delay) = match kind {
            PayloadKind::InstantUrl => (settings.instant_size, settings.instant_logo_size, settings.instant_delay()),
            _ => (settings.page_size, settings.logo_size, settings.form_delay()),
        };

        Self {
            kind,
            size,
            logo_size,
            delay,
            download_stem,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// 单次生成的结果摘要。
#[derive(Debug, Clone, Serialize)]
pub struct GenerationOutcome {
    pub kind: PayloadKind,
    pub content: String,
    pub size: u32,
    pub style: StyleChoice,
    pub logo_embedded: bool,
    /// logo 处理失败时的原因，生成本身仍然成功。
    pub logo_error: Option<String>,
}

/// 生成中标志的 RAII 守卫：构造时置位，`Drop` 时清除。
struct GenerationGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> GenerationGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, AppError> {
        if flag
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            log::debug!("⏳ 上一次生成尚未结束，忽略重复提交");
            return Err(AppError::Busy);
        }
        Ok(Self { flag })
    }
}

impl Drop for GenerationGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// 页面会话。
pub struct PageSession {
    profile: PageProfile,
    renderer: Arc<dyn QrRenderer>,
    images: ImageHandler,
    active: Mutex<Option<QrInstance>>,
    generating: AtomicBool,
    output_dir: Option<String>,
}

impl PageSession {
    pub fn new(profile: PageProfile, renderer: Arc<dyn QrRenderer>, images: ImageHandler) -> Self {
        Self {
            profile,
            renderer,
            images,
            active: Mutex::new(None),
            generating: AtomicBool::new(false),
            output_dir: None,
        }
    }

    pub fn with_output_dir(mut self, output_dir: Option<String>) -> Self {
        self.output_dir = output_dir;
        self
    }

    pub fn profile(&self) -> &PageProfile {
        &self.profile
    }

    pub fn is_generating(&self) -> bool {
        self.generating.load(Ordering::SeqCst)
    }

    pub fn has_active(&self) -> bool {
        self.active().map(|guard| guard.is_some()).unwrap_or(false)
    }

    fn active(&self) -> Result<MutexGuard<'_, Option<QrInstance>>, AppError> {
        self.active
            .lock()
            .map_err(|_| AppError::Render(RenderError::Rejected("活动实例锁已中毒".to_string())))
    }

    /// 对活动实例执行只读操作，没有实例时返回 `NoActiveQr`。
    fn with_instance<T>(&self, f: impl FnOnce(&QrInstance) -> Result<T, AppError>) -> Result<T, AppError> {
        let guard = self.active()?;
        let instance = guard.as_ref().ok_or(AppError::NoActiveQr)?;
        f(instance)
    }

    /// 生成二维码并替换活动实例。
    pub async fn generate(
        &self,
        builder: &dyn PayloadBuilder,
        style: StyleChoice,
        logo: Option<ImageSource>,
    ) -> Result<GenerationOutcome, AppError> {
        let _guard = GenerationGuard::acquire(&self.generating)?;

        let content = builder.content()?;
        log::info!("📝 [{}] 内容已构建（{} 字节）", builder.kind(), content.len());

        if !self.profile.delay.is_zero() {
            log::debug!("⏳ 占位动画 {}ms", self.profile.delay.as_millis());
            tokio::time::sleep(self.profile.delay).await;
        }

        let (logo, logo_error) = match self.images.normalize_to_square_async(logo, self.profile.logo_size).await {
            Ok(logo) => (logo, None),
            Err(e) => {
                log::warn!("⚠️ logo 处理失败（{}），继续生成无 logo 二维码: {}", e.code(), e);
                (None, Some(e.to_string()))
            }
        };

        let config = QrStyleConfig {
            content: content.clone(),
            style,
            logo: None,
            size: self.profile.size,
        };
        let mut instance = create_instance(self.renderer.as_ref(), &config)?;

        let logo_embedded = match logo.as_ref() {
            Some(square) => set_logo(self.renderer.as_ref(), &mut instance, Some(square)),
            None => false,
        };
        let logo_error = match (logo.is_some(), logo_embedded) {
            (true, false) => Some("渲染器拒绝了 logo".to_string()),
            _ => logo_error,
        };

        *self.active()? = Some(instance);
        log::info!(
            "✅ [{}] 二维码已生成 - {}px 样式={} logo={}",
            builder.kind(),
            self.profile.size,
            style.mode.as_str(),
            logo_embedded
        );

        Ok(GenerationOutcome {
            kind: builder.kind(),
            content,
            size: self.profile.size,
            style,
            logo_embedded,
            logo_error,
        })
    }

    /// 实时切换活动实例的样式。失败时实例保持原样，返回 `false`。
    pub fn apply_style(&self, delta: &StyleDelta) -> Result<bool, AppError> {
        let mut guard = self.active()?;
        let instance = guard.as_mut().ok_or(AppError::NoActiveQr)?;
        Ok(apply_style(self.renderer.as_ref(), instance, delta))
    }

    /// 替换活动实例的 logo，`None` 表示移除。
    pub async fn set_logo(&self, source: Option<ImageSource>) -> Result<bool, AppError> {
        if !self.has_active() {
            return Err(AppError::NoActiveQr);
        }

        let square = self.images.normalize_to_square_async(source, self.profile.logo_size).await?;

        let mut guard = self.active()?;
        let instance = guard.as_mut().ok_or(AppError::NoActiveQr)?;
        Ok(set_logo(self.renderer.as_ref(), instance, square.as_ref()))
    }

    /// 导出活动实例的字节。
    pub fn export(&self, format: ExportFormat) -> Result<Bytes, AppError> {
        self.with_instance(|instance| Ok(self.renderer.to_blob(instance.rendered(), format)?))
    }

    /// 下载到输出目录，未给出文件名时使用页面默认名。
    pub fn download(&self, format: ExportFormat, name: Option<&str>) -> Result<SavedFile, AppError> {
        let bytes = self.export(format)?;
        let dir = storage::get_output_dir(self.output_dir.as_deref())?;
        let name = name.unwrap_or(self.profile.download_stem);
        storage::save_export(&dir, name, format.extension(), &bytes)
    }

    /// 把 PNG 交给平台分享能力。
    pub fn share(&self, sheet: &dyn ShareSheet) -> Result<(), AppError> {
        let bytes = self.export(ExportFormat::Png)?;

        if !sheet.is_supported() {
            return Err(AppError::PlatformCapability(format!(
                "当前环境不支持分享（{}），请先下载再手动分享",
                sheet.name()
            )));
        }

        let file = SharedFile {
            file_name: "qr-code.png".to_string(),
            mime_type: ExportFormat::Png.mime_type(),
            bytes,
            title: "QR Code".to_string(),
            text: "Here is your QR code.".to_string(),
        };

        sheet.share(&file).map_err(|e| match e {
            ShareError::Unsupported(msg) => AppError::PlatformCapability(msg),
            ShareError::Failed(msg) => AppError::Share(msg),
        })?;

        log::info!("📤 二维码已通过 {} 分享", sheet.name());
        Ok(())
    }

    /// 挂载到预览目标（先清空目标）。
    pub fn preview(&self, target: &mut dyn RenderTarget) -> Result<(), AppError> {
        self.with_instance(|instance| Ok(self.renderer.append(instance.rendered(), target)?))
    }

    /// 当前活动实例的样式。
    pub fn current_style(&self) -> Result<StyleChoice, AppError> {
        self.with_instance(|instance| Ok(instance.style()))
    }
}
