//! # 分享模块
//!
//! ## 设计思路
//!
//! 平台分享能力抽象为 `ShareSheet` trait，会话层只负责拿到 PNG 字节并交出去。
//! 桌面端没有统一的系统分享面板，默认实现把图片写入系统剪贴板（`arboard`），
//! 用户随后可直接粘贴到任意聊天或邮件应用中。
//!
//! ## 实现思路
//!
//! - `is_supported` 对应“平台是否具备分享能力”，不具备时上层报告
//!   `PlatformCapability`，属于提示性错误而非崩溃。
//! - 剪贴板可能被其他进程短暂占用，写入采用“有限重试 + 指数退避 + 抖动”，
//!   并受总预算约束。
//! - `NoShareSheet` 用于无图形环境，始终报告能力缺失。

use std::borrow::Cow;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// 待分享的文件。
#[derive(Debug, Clone)]
pub struct SharedFile {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Bytes,
    pub title: String,
    pub text: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ShareError {
    /// 当前平台不具备分享能力。
    #[error("当前平台不支持分享：{0}")]
    Unsupported(String),

    /// 具备能力但本次分享失败。
    #[error("无法打开分享：{0}")]
    Failed(String),
}

/// 平台分享能力接口。
pub trait ShareSheet: Send + Sync {
    fn name(&self) -> &'static str;

    fn is_supported(&self) -> bool;

    fn share(&self, file: &SharedFile) -> Result<(), ShareError>;
}

/// 剪贴板写入重试策略。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShareRetryPolicy {
    /// 最大尝试次数。
    pub retries: u32,
    /// 退避基础间隔（毫秒）。
    pub retry_delay_ms: u64,
    /// 单次分享允许的总重试预算（毫秒）。
    pub max_total_ms: u64,
    /// 单次退避延迟上限（毫秒）。
    pub max_delay_ms: u64,
}

impl Default for ShareRetryPolicy {
    fn default() -> Self {
        Self {
            retries: 3,
            retry_delay_ms: 100,
            max_total_ms: 1_800,
            max_delay_ms: 900,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClipboardFailureKind {
    Busy,
    Transient,
    Fatal,
}

#[derive(Debug, Clone)]
struct ClipboardWriteFailure {
    kind: ClipboardFailureKind,
    message: String,
}

impl ClipboardWriteFailure {
    fn busy(message: impl Into<String>) -> Self {
        Self {
            kind: ClipboardFailureKind::Busy,
            message: message.into(),
        }
    }

    fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: ClipboardFailureKind::Transient,
            message: message.into(),
        }
    }

    fn fatal(message: impl Into<String>) -> Self {
        Self {
            kind: ClipboardFailureKind::Fatal,
            message: message.into(),
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self.kind, ClipboardFailureKind::Busy | ClipboardFailureKind::Transient)
    }
}

static JITTER_STATE: AtomicU64 = AtomicU64::new(0);

fn seed_jitter_state() -> u64 {
    let time_seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    let mut state = time_seed ^ ((std::process::id() as u64) << 32) ^ 0x9E37_79B9_7F4A_7C15;
    if state == 0 {
        state = 0xA5A5_5A5A_0123_4567;
    }
    state
}

fn next_jitter_u64() -> u64 {
    let mut current = JITTER_STATE.load(Ordering::Relaxed);

    loop {
        let seeded = if current == 0 {
            seed_jitter_state()
        } else {
            current
        };

        let mut next = seeded;
        next ^= next << 13;
        next ^= next >> 7;
        next ^= next << 17;

        match JITTER_STATE.compare_exchange_weak(current, next, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(observed) => current = observed,
        }
    }
}

fn compute_backoff_delay_with_jitter(base_delay_ms: u64, attempt: u32, max_delay_ms: u64) -> u64 {
    let exp = base_delay_ms.saturating_mul(1_u64 << attempt.saturating_sub(1).min(8));
    let capped = exp.min(max_delay_ms.max(base_delay_ms));
    let jitter_bound = (capped / 3).max(1);
    let jitter = next_jitter_u64() % (jitter_bound + 1);
    capped.saturating_add(jitter)
}

fn would_exceed_retry_budget(elapsed_ms: u64, wait_ms: u64, budget_ms: u64) -> bool {
    elapsed_ms.saturating_add(wait_ms) > budget_ms
}

/// 以系统剪贴板充当分享面板。
pub struct ClipboardShareSheet {
    policy: ShareRetryPolicy,
}

impl ClipboardShareSheet {
    pub fn new(policy: ShareRetryPolicy) -> Self {
        Self { policy }
    }

    fn write_with_retry(&self, width: usize, height: usize, rgba: &[u8]) -> Result<(), ShareError> {
        let retry_count = self.policy.retries.max(1);
        let started = Instant::now();
        let mut last_error = None;

        for attempt in 1..=retry_count {
            if attempt > 1 {
                let elapsed_ms = started.elapsed().as_millis() as u64;
                let wait_ms = compute_backoff_delay_with_jitter(
                    self.policy.retry_delay_ms.max(1),
                    attempt - 1,
                    self.policy.max_delay_ms,
                );

                if would_exceed_retry_budget(elapsed_ms, wait_ms, self.policy.max_total_ms) {
                    log::warn!(
                        "⏱️ 跳过第 {} 次重试：等待 {}ms 会超过预算 {}ms",
                        attempt,
                        wait_ms,
                        self.policy.max_total_ms
                    );
                    break;
                }

                log::debug!("🔄 重试 {}/{}，等待 {}ms（指数退避+抖动）", attempt, retry_count, wait_ms);
                std::thread::sleep(Duration::from_millis(wait_ms));
            }

            match Self::try_clipboard_write(width, height, rgba) {
                Ok(()) => {
                    log::info!("✅ 二维码已写入剪贴板 (尝试 {})", attempt);
                    return Ok(());
                }
                Err(failure) => {
                    log::warn!(
                        "❌ 尝试 {} 失败: {}（kind={:?}, retryable={}）",
                        attempt,
                        failure.message,
                        failure.kind,
                        failure.is_retryable()
                    );
                    let retryable = failure.is_retryable();
                    last_error = Some(failure.message);

                    if !retryable {
                        log::warn!("🛑 非可重试错误，提前终止重试");
                        break;
                    }
                }
            }
        }

        Err(ShareError::Failed(
            last_error.unwrap_or_else(|| "未知错误".to_string()),
        ))
    }

    fn try_clipboard_write(width: usize, height: usize, rgba: &[u8]) -> Result<(), ClipboardWriteFailure> {
        let expected = width
            .checked_mul(height)
            .and_then(|pixels| pixels.checked_mul(4))
            .ok_or_else(|| ClipboardWriteFailure::fatal("图片尺寸溢出"))?;
        if rgba.len() != expected {
            return Err(ClipboardWriteFailure::fatal("像素数据长度异常"));
        }

        let mut clipboard = arboard::Clipboard::new()
            .map_err(|e| ClipboardWriteFailure::busy(format!("无法访问剪贴板：{}", e)))?;

        let image_data = arboard::ImageData {
            width,
            height,
            bytes: Cow::Borrowed(rgba),
        };

        clipboard
            .set_image(image_data)
            .map_err(|e| ClipboardWriteFailure::transient(format!("复制失败：{}", e)))
    }
}

impl ShareSheet for ClipboardShareSheet {
    fn name(&self) -> &'static str {
        "clipboard"
    }

    fn is_supported(&self) -> bool {
        arboard::Clipboard::new().is_ok()
    }

    fn share(&self, file: &SharedFile) -> Result<(), ShareError> {
        if !self.is_supported() {
            return Err(ShareError::Unsupported("无法访问系统剪贴板".to_string()));
        }

        let decoded = image::load_from_memory(&file.bytes)
            .map_err(|e| ShareError::Failed(format!("分享文件不是有效图片：{}", e)))?
            .to_rgba8();
        let (width, height) = decoded.dimensions();

        log::debug!("📋 准备分享 {} - {}x{}", file.file_name, width, height);
        self.write_with_retry(width as usize, height as usize, decoded.as_raw())
    }
}

/// 不具备分享能力的平台。
pub struct NoShareSheet;

impl ShareSheet for NoShareSheet {
    fn name(&self) -> &'static str {
        "none"
    }

    fn is_supported(&self) -> bool {
        false
    }

    fn share(&self, _file: &SharedFile) -> Result<(), ShareError> {
        Err(ShareError::Unsupported(
            "请先下载二维码再手动分享".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_delay_stays_within_expected_bounds() {
        let delay = compute_backoff_delay_with_jitter(100, 4, 900);

        assert!(delay >= 800, "delay should be at least exponential base");
        assert!(delay <= 1200, "delay should include bounded jitter only");
    }

    #[test]
    fn backoff_delay_respects_max_cap() {
        let delay = compute_backoff_delay_with_jitter(300, 8, 500);

        assert!(delay >= 500, "delay should be capped at max_delay floor");
        assert!(delay <= 666, "delay should not exceed capped value + jitter");
    }

    #[test]
    fn retry_budget_checker_works() {
        assert!(would_exceed_retry_budget(1700, 120, 1800));
        assert!(!would_exceed_retry_budget(1600, 120, 1800));
        assert!(!would_exceed_retry_budget(0, 0, 1800));
    }

    #[test]
    fn mismatched_pixel_buffer_is_fatal() {
        let result = ClipboardShareSheet::try_clipboard_write(4, 4, &[0u8; 10]);

        assert!(matches!(
            result,
            Err(ClipboardWriteFailure {
                kind: ClipboardFailureKind::Fatal,
                ..
            })
        ));
    }

    #[test]
    fn no_share_sheet_reports_unsupported() {
        let file = SharedFile {
            file_name: "qr-code.png".to_string(),
            mime_type: "image/png",
            bytes: Bytes::from_static(b"\x89PNG"),
            title: "QR Code".to_string(),
            text: "Here is your QR code.".to_string(),
        };

        assert!(!NoShareSheet.is_supported());
        assert!(matches!(NoShareSheet.share(&file), Err(ShareError::Unsupported(_))));
    }
}
