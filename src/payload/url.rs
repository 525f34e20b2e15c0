use serde::{Deserialize, Serialize};

use super::validation::is_http_url;
use super::{PayloadBuilder, PayloadKind, ValidationError};

/// URL 页面与首页即时生成共用，差别只在 `kind`。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UrlForm {
    pub url: String,
    #[serde(skip)]
    pub instant: bool,
}

impl UrlForm {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            instant: false,
        }
    }

    pub fn instant(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            instant: true,
        }
    }
}

impl PayloadBuilder for UrlForm {
    fn kind(&self) -> PayloadKind {
        if self.instant {
            PayloadKind::InstantUrl
        } else {
            PayloadKind::Url
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if !is_http_url(self.url.trim()) {
            return Err(ValidationError::new("url", "请输入以 http:// 或 https:// 开头的有效链接"));
        }
        Ok(())
    }

    fn build(&self) -> String {
        self.url.trim().to_string()
    }
}
