use serde::{Deserialize, Serialize};

use super::encoding::encode_uri_component;
use super::phone::compose_phone;
use super::validation::{is_country_code, is_local_number};
use super::vcard::DEFAULT_COUNTRY_CODE;
use super::{PayloadBuilder, PayloadKind, ValidationError};

/// WhatsApp 页面：`https://wa.me/<cc><local>?text=<enc>`。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WhatsappForm {
    pub country_code: String,
    pub number: String,
    pub message: String,
}

impl Default for WhatsappForm {
    fn default() -> Self {
        Self {
            country_code: DEFAULT_COUNTRY_CODE.to_string(),
            number: String::new(),
            message: String::new(),
        }
    }
}

impl PayloadBuilder for WhatsappForm {
    fn kind(&self) -> PayloadKind {
        PayloadKind::Whatsapp
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if !is_country_code(self.country_code.trim()) {
            return Err(ValidationError::new("country_code", "请输入有效的国家码，例如 +91"));
        }
        if !is_local_number(self.number.trim()) {
            return Err(ValidationError::new("number", "请输入有效的本地号码（6–15 位数字）"));
        }
        Ok(())
    }

    fn build(&self) -> String {
        let (code, local) = compose_phone(&self.country_code, &self.number);
        let message = self.message.trim();

        let query = if message.is_empty() {
            String::new()
        } else {
            format!("?text={}", encode_uri_component(message))
        };

        format!("https://wa.me/{}{}{}", code, local, query)
    }
}
