//! 预编译正则与通用校验。

use once_cell::sync::Lazy;
use regex::Regex;

use super::ValidationError;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

/// 只接受 http/https，协议大小写不敏感。
static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^(https?://).+").unwrap());

static COUNTRY_CODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+?\d{1,4}$").unwrap());

static LOCAL_NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{6,15}$").unwrap());

pub(super) fn is_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

pub(super) fn is_http_url(value: &str) -> bool {
    URL_RE.is_match(value)
}

pub(super) fn is_country_code(value: &str) -> bool {
    COUNTRY_CODE_RE.is_match(value)
}

pub(super) fn is_local_number(value: &str) -> bool {
    LOCAL_NUMBER_RE.is_match(value)
}

pub(super) fn digit_count(value: &str) -> usize {
    value.chars().filter(|c| c.is_ascii_digit()).count()
}

pub(super) fn require_non_empty(field: &'static str, value: &str, message: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, message));
    }
    Ok(())
}
