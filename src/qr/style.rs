//! # 样式值对象
//!
//! `QrStyleConfig` 每次生成时新建，不可变；`StyleDelta` 表示实时切换样式时的局部修改。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::RenderError;
use crate::image_handler::SquareImage;

/// 样式模式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleMode {
    #[default]
    Basic,
    Colored,
}

impl StyleMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Colored => "colored",
        }
    }
}

impl FromStr for StyleMode {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "basic" => Ok(Self::Basic),
            "colored" => Ok(Self::Colored),
            other => Err(RenderError::InvalidStyle(other.to_string())),
        }
    }
}

/// `#rrggbb` 颜色。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl HexColor {
    pub const BLACK: HexColor = HexColor::rgb(0x00, 0x00, 0x00);
    pub const WHITE: HexColor = HexColor::rgb(0xff, 0xff, 0xff);
    /// 彩色模式的固定深色背景。
    pub const MIDNIGHT: HexColor = HexColor::rgb(0x02, 0x06, 0x17);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// 解析 `#rrggbb` 或 `#rgb`（`#` 可省略，大小写不敏感）。
    pub fn parse(input: &str) -> Result<Self, RenderError> {
        let hex = input.trim().trim_start_matches('#');
        let invalid = || RenderError::InvalidColor(input.to_string());

        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let expanded: String = match hex.len() {
            3 => hex.chars().flat_map(|c| [c, c]).collect(),
            6 => hex.to_string(),
            _ => return Err(invalid()),
        };

        let channel = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).map_err(|_| invalid());
        Ok(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, 255]
    }

    /// 线性插值，`t` 会被限制在 `[0, 1]`。
    pub fn lerp(self, other: HexColor, t: f32) -> [u8; 4] {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        [mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b), 255]
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for HexColor {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for HexColor {
    type Error = RenderError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<HexColor> for String {
    fn from(color: HexColor) -> Self {
        color.to_string()
    }
}

/// 用户在页面上选择的样式（模式 + 两个颜色）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StyleChoice {
    pub mode: StyleMode,
    pub primary: HexColor,
    /// 渐变终点色，仅彩色模式使用。
    pub secondary: HexColor,
}

impl Default for StyleChoice {
    fn default() -> Self {
        Self {
            mode: StyleMode::Basic,
            primary: HexColor::BLACK,
            secondary: HexColor::rgb(0xff, 0x00, 0xc8),
        }
    }
}

impl StyleChoice {
    pub fn merge(self, delta: &StyleDelta) -> Self {
        Self {
            mode: delta.mode.unwrap_or(self.mode),
            primary: delta.primary.unwrap_or(self.primary),
            secondary: delta.secondary.unwrap_or(self.secondary),
        }
    }
}

/// 实时样式切换的局部修改，`None` 表示沿用当前值。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StyleDelta {
    pub mode: Option<StyleMode>,
    pub primary: Option<HexColor>,
    pub secondary: Option<HexColor>,
}

/// 单次生成请求的完整样式配置。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrStyleConfig {
    /// 要编码的内容字符串。
    pub content: String,
    pub style: StyleChoice,
    pub logo: Option<SquareImage>,
    /// 输出边长（像素），实例创建后不可修改。
    pub size: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_long_and_short_hex() {
        assert_eq!(HexColor::parse("#00F2FF").ok(), Some(HexColor::rgb(0x00, 0xf2, 0xff)));
        assert_eq!(HexColor::parse("fc8").ok(), Some(HexColor::rgb(0xff, 0xcc, 0x88)));
    }

    #[test]
    fn rejects_malformed_hex() {
        for bad in ["", "#12", "#12345g", "#1234567", "red"] {
            assert!(matches!(HexColor::parse(bad), Err(RenderError::InvalidColor(_))), "{bad}");
        }
    }

    #[test]
    fn display_is_lowercase_hex() {
        assert_eq!(HexColor::MIDNIGHT.to_string(), "#020617");
    }

    #[test]
    fn lerp_hits_both_endpoints() {
        let a = HexColor::rgb(0, 100, 200);
        let b = HexColor::rgb(200, 100, 0);

        assert_eq!(a.lerp(b, 0.0), [0, 100, 200, 255]);
        assert_eq!(a.lerp(b, 1.0), [200, 100, 0, 255]);
        assert_eq!(a.lerp(b, 0.5), [100, 100, 100, 255]);
    }

    #[test]
    fn delta_only_overrides_given_fields() {
        let base = StyleChoice::default();
        let merged = base.merge(&StyleDelta {
            mode: Some(StyleMode::Colored),
            ..Default::default()
        });

        assert_eq!(merged.mode, StyleMode::Colored);
        assert_eq!(merged.primary, base.primary);
        assert_eq!(merged.secondary, base.secondary);
    }

    #[test]
    fn style_mode_parses_case_insensitively() {
        assert_eq!("Colored".parse::<StyleMode>().ok(), Some(StyleMode::Colored));
        assert!("neon".parse::<StyleMode>().is_err());
    }
}
