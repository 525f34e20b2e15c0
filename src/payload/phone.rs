//! 国家码与本地号码拼接。

fn digits_only(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// 返回 `(国家码, 本地号码)`，均为纯数字。
///
/// 1. 两部分都只保留数字
/// 2. 去掉国家码的前导 0
/// 3. 本地号码已带国家码前缀时去掉该前缀
/// 4. 去掉本地号码的前导 0
pub fn compose_phone(country_code: &str, local: &str) -> (String, String) {
    let code = digits_only(country_code).trim_start_matches('0').to_string();
    let mut number = digits_only(local);

    if !code.is_empty() && number.starts_with(&code) {
        number = number[code.len()..].to_string();
    }

    (code, number.trim_start_matches('0').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_local_number() {
        assert_eq!(compose_phone("+91", "9876543210"), ("91".to_string(), "9876543210".to_string()));
    }

    #[test]
    fn prefixed_local_number_is_deduplicated() {
        assert_eq!(compose_phone("+91", "919876543210"), ("91".to_string(), "9876543210".to_string()));
    }

    #[test]
    fn leading_zeros_are_stripped() {
        assert_eq!(compose_phone("0044", "07911 123456"), ("44".to_string(), "7911123456".to_string()));
    }

    #[test]
    fn formatting_characters_are_dropped() {
        assert_eq!(compose_phone("+1", "(555) 010-9999"), ("1".to_string(), "5550109999".to_string()));
    }
}
