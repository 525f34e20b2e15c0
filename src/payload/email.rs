use serde::{Deserialize, Serialize};

use super::encoding::encode_uri_component;
use super::validation::{is_email, require_non_empty};
use super::{PayloadBuilder, PayloadKind, ValidationError};

/// 邮件页面：`mailto:<address>?subject=<enc>&body=<enc>`。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailForm {
    pub address: String,
    pub subject: String,
    pub body: String,
}

impl PayloadBuilder for EmailForm {
    fn kind(&self) -> PayloadKind {
        PayloadKind::Email
    }

    fn validate(&self) -> Result<(), ValidationError> {
        let address = self.address.trim();
        require_non_empty("address", address, "邮箱地址不能为空")?;
        if !is_email(address) {
            return Err(ValidationError::new("address", "请输入有效的邮箱地址"));
        }
        Ok(())
    }

    fn build(&self) -> String {
        let subject = self.subject.trim();
        let body = self.body.trim();

        let mut params = Vec::with_capacity(2);
        if !subject.is_empty() {
            params.push(format!("subject={}", encode_uri_component(subject)));
        }
        if !body.is_empty() {
            params.push(format!("body={}", encode_uri_component(body)));
        }

        let query = if params.is_empty() {
            String::new()
        } else {
            format!("?{}", params.join("&"))
        };

        format!("mailto:{}{}", self.address.trim(), query)
    }
}
