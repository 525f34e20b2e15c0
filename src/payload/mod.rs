//! # 页面内容构建模块（payload）
//!
//! ## 设计思路
//!
//! 五个页面的差异只在“表单校验 + 内容字符串”两步，抽象为 `PayloadBuilder` trait，
//! 由同一个 `PageSession` 驱动，避免五份几乎相同的页面控制逻辑。
//!
//! - `validation`：预编译正则与通用校验
//! - `encoding`：与浏览器 `encodeURIComponent` 一致的百分号编码
//! - `phone`：国家码 + 本地号码拼接与去重
//! - `email / text / url / vcard / whatsapp`：各页面表单
//!
//! 所有构建器都是无状态的值对象，校验失败时不会触发任何渲染工作。

mod email;
mod encoding;
mod phone;
mod text;
mod url;
mod validation;
mod vcard;
mod whatsapp;

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

pub use email::EmailForm;
pub use encoding::encode_uri_component;
pub use phone::compose_phone;
pub use text::TextForm;
pub use url::UrlForm;
pub use vcard::VcardForm;
pub use whatsapp::WhatsappForm;

/// 页面类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadKind {
    Email,
    Text,
    Url,
    Vcard,
    Whatsapp,
    /// 首页的即时 URL 生成。
    InstantUrl,
}

impl PayloadKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Text => "text",
            Self::Url => "url",
            Self::Vcard => "vcard",
            Self::Whatsapp => "whatsapp",
            Self::InstantUrl => "instant_url",
        }
    }
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PayloadKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "email" => Ok(Self::Email),
            "text" => Ok(Self::Text),
            "url" => Ok(Self::Url),
            "vcard" => Ok(Self::Vcard),
            "whatsapp" => Ok(Self::Whatsapp),
            "instant_url" | "instant" => Ok(Self::InstantUrl),
            other => Err(format!("未知页面类型：{}", other)),
        }
    }
}

/// 表单校验失败，指向出错的字段。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// 页面内容构建器。
pub trait PayloadBuilder: Send + Sync {
    fn kind(&self) -> PayloadKind;

    /// 校验表单，返回第一个出错的字段。
    fn validate(&self) -> Result<(), ValidationError>;

    /// 构建内容字符串，调用前必须已通过校验。
    fn build(&self) -> String;

    /// 校验并构建。
    fn content(&self) -> Result<String, ValidationError> {
        self.validate()?;
        Ok(self.build())
    }
}
