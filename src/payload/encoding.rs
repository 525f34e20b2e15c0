//! 百分号编码。

use std::borrow::Cow;

/// `urlencoding` 会额外转义 `!'()*`，浏览器的 `encodeURIComponent` 不会。
const UNRESERVED_EXTRAS: [(&str, &str); 5] = [("%21", "!"), ("%27", "'"), ("%28", "("), ("%29", ")"), ("%2A", "*")];

/// 与 JavaScript `encodeURIComponent` 输出一致的编码。
///
/// ```rust
/// use qr_platform::payload::encode_uri_component;
///
/// assert_eq!(encode_uri_component("hi there!"), "hi%20there!");
/// ```
pub fn encode_uri_component(input: &str) -> String {
    let encoded = urlencoding::encode(input);
    match encoded {
        Cow::Borrowed(s) => s.to_string(),
        Cow::Owned(mut s) => {
            for (escaped, raw) in UNRESERVED_EXTRAS {
                if s.contains(escaped) {
                    s = s.replace(escaped, raw);
                }
            }
            s
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_js_unreserved_marks() {
        assert_eq!(encode_uri_component("a-b_c.d~e!f*g'h(i)"), "a-b_c.d~e!f*g'h(i)");
    }

    #[test]
    fn escapes_reserved_and_unicode() {
        assert_eq!(encode_uri_component("a b&c=d?"), "a%20b%26c%3Dd%3F");
        assert_eq!(encode_uri_component("你好"), "%E4%BD%A0%E5%A5%BD");
        assert_eq!(encode_uri_component("100%"), "100%25");
    }

    #[test]
    fn literal_percent_sequences_are_not_unescaped() {
        assert_eq!(encode_uri_component("%21"), "%2521");
    }
}
