use serde::{Deserialize, Serialize};

use super::validation::require_non_empty;
use super::{PayloadBuilder, PayloadKind, ValidationError};

/// 纯文本页面：内容为去除首尾空白后的原文。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextForm {
    pub text: String,
}

impl PayloadBuilder for TextForm {
    fn kind(&self) -> PayloadKind {
        PayloadKind::Text
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("text", &self.text, "文本不能为空")
    }

    fn build(&self) -> String {
        self.text.trim().to_string()
    }
}
