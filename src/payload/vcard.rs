use serde::{Deserialize, Serialize};

use super::phone::compose_phone;
use super::validation::{digit_count, is_email};
use super::{PayloadBuilder, PayloadKind, ValidationError};

/// 默认国家码。
pub const DEFAULT_COUNTRY_CODE: &str = "+91";

/// 联系人名片页面，输出 vCard 3.0。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VcardForm {
    pub name: String,
    pub country_code: String,
    pub phone: String,
    pub email: String,
    pub organization: String,
}

impl Default for VcardForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            country_code: DEFAULT_COUNTRY_CODE.to_string(),
            phone: String::new(),
            email: String::new(),
            organization: String::new(),
        }
    }
}

impl VcardForm {
    /// 完整号码 `+<cc><local>`；本地号码为空时不输出。
    fn full_phone(&self) -> Option<String> {
        if self.phone.trim().is_empty() {
            return None;
        }
        let (code, local) = compose_phone(&self.country_code, &self.phone);
        if code.is_empty() && local.is_empty() {
            return None;
        }
        Some(format!("+{}{}", code, local))
    }
}

impl PayloadBuilder for VcardForm {
    fn kind(&self) -> PayloadKind {
        PayloadKind::Vcard
    }

    fn validate(&self) -> Result<(), ValidationError> {
        let name = self.name.trim();
        let phone = self.phone.trim();
        let email = self.email.trim();

        if name.is_empty() && phone.is_empty() && email.is_empty() {
            return Err(ValidationError::new("name", "姓名、电话、邮箱至少填写一项"));
        }

        if !phone.is_empty() {
            let digits = digit_count(phone);
            if !(6..=15).contains(&digits) {
                return Err(ValidationError::new("phone", "请输入有效的电话号码（6–15 位数字）"));
            }
        }

        if !email.is_empty() && !is_email(email) {
            return Err(ValidationError::new("email", "请输入有效的邮箱地址"));
        }

        Ok(())
    }

    fn build(&self) -> String {
        let name = self.name.trim();
        let email = self.email.trim();
        let organization = self.organization.trim();

        let mut lines = vec!["BEGIN:VCARD".to_string(), "VERSION:3.0".to_string()];
        if !name.is_empty() {
            lines.push(format!("FN:{}", name));
            lines.push(format!("N:{};;;;", name));
        }
        if let Some(phone) = self.full_phone() {
            lines.push(format!("TEL;TYPE=CELL:{}", phone));
        }
        if !email.is_empty() {
            lines.push(format!("EMAIL;TYPE=INTERNET:{}", email));
        }
        if !organization.is_empty() {
            lines.push(format!("ORG:{}", organization));
        }
        lines.push("END:VCARD".to_string());

        lines.join("\n")
    }
}
