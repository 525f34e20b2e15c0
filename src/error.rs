//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 各子系统各自定义 `thiserror` 错误（`ImageError` / `RenderError` / `ValidationError`），
//! 在会话层统一折叠为 `AppError`，CLI 与 JSON 报告都只面对这一种类型。
//!
//! # 实现思路
//!
//! - 子系统错误通过 `#[from]` 自动转换，无需手动 map。
//! - 实现 `Serialize` 将错误序列化为字符串，便于输出 JSON 报告。
//! - `is_informational` 区分“提示性”错误（如平台不支持分享）与真正的失败。

use serde::Serialize;

use crate::image_handler::ImageError;
use crate::payload::ValidationError;
use crate::qr::RenderError;

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 表单校验失败，未做任何渲染
    #[error("输入无效 - {0}")]
    Validation(#[from] ValidationError),

    /// logo 处理失败（解码 / 编码 / 资源限制）
    #[error("{0}")]
    Image(#[from] ImageError),

    /// 二维码创建或导出失败
    #[error("{0}")]
    Render(#[from] RenderError),

    /// 平台不具备某项能力（例如分享）
    #[error("{0}")]
    PlatformCapability(String),

    /// 分享失败
    #[error("分享失败: {0}")]
    Share(String),

    /// 上一次生成仍在进行
    #[error("正在生成二维码，请稍候")]
    Busy,

    /// 尚未生成二维码
    #[error("请先生成二维码")]
    NoActiveQr,

    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),

    /// 输出目录不可用
    #[error("存储目录不可用: {0}")]
    Storage(String),

    /// 设置文件读写失败
    #[error("设置错误: {0}")]
    Settings(String),
}

impl AppError {
    /// 仅需提示用户、不算失败的错误。
    pub fn is_informational(&self) -> bool {
        matches!(self, Self::PlatformCapability(_) | Self::NoActiveQr | Self::Busy)
    }
}

/// 将错误序列化为人类可读的字符串。
impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_keeps_field_in_message() {
        let err: AppError = ValidationError::new("url", "bad").into();
        assert_eq!(err.to_string(), "输入无效 - url: bad");
    }

    #[test]
    fn serializes_as_plain_string() {
        let json = serde_json::to_string(&AppError::NoActiveQr).expect("serialize");
        assert_eq!(json, "\"请先生成二维码\"");
    }

    #[test]
    fn capability_errors_are_informational() {
        assert!(AppError::PlatformCapability("no share".to_string()).is_informational());
        assert!(!AppError::Share("boom".to_string()).is_informational());
    }
}
