//! # 渲染请求推导
//!
//! ## 设计思路
//!
//! `QrStyleConfig` → `QrRenderRequest` 是一个纯函数：相同输入永远得到相同输出。
//! 渲染器本身是黑盒，可测试性完全依赖这一层的确定性。
//!
//! ## 推导规则
//!
//! | 模式 | 点颜色 | 背景 | 渐变 |
//! |------|--------|------|------|
//! | basic | `#000000` | `#ffffff` | 无 |
//! | colored | primary | `#020617` | 线性，primary → secondary，rotation 0 |
//!
//! 定位角外框与内点始终使用点颜色（不带渐变）；内点不指定类型，跟随码点的 `rounded`。logo 与模式无关，存在即居中嵌入。

use serde::Serialize;

use super::style::{HexColor, QrStyleConfig, StyleChoice, StyleMode};

/// logo 占二维码边长的比例。
pub const LOGO_SIZE_RATIO: f32 = 0.4;
/// logo 与周围码点之间的留白（像素）。
pub const LOGO_MARGIN_PX: u32 = 4;
/// 二维码画布边长上限（像素），与 logo 规范化的上限一致。
pub const MAX_QR_SIZE: u32 = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCorrection {
    L,
    M,
    Q,
    H,
}

impl ErrorCorrection {
    pub(crate) fn to_ec_level(self) -> qrcode::EcLevel {
        match self {
            Self::L => qrcode::EcLevel::L,
            Self::M => qrcode::EcLevel::M,
            Self::Q => qrcode::EcLevel::Q,
            Self::H => qrcode::EcLevel::H,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DotKind {
    Square,
    Rounded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CornerSquareKind {
    Square,
    Dot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CornerDotKind {
    Square,
    Dot,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorStop {
    pub offset: f32,
    pub color: HexColor,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GradientKind {
    Linear,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Gradient {
    #[serde(rename = "type")]
    pub kind: GradientKind,
    /// 弧度，0 表示从左到右。
    pub rotation: f32,
    pub color_stops: Vec<ColorStop>,
}

impl Gradient {
    /// 在 `t ∈ [0, 1]` 处采样颜色。
    pub fn sample(&self, t: f32) -> [u8; 4] {
        let t = t.clamp(0.0, 1.0);
        let Some(first) = self.color_stops.first() else {
            return HexColor::BLACK.to_rgba();
        };

        let mut previous = first;
        for stop in &self.color_stops {
            if t <= stop.offset {
                let span = stop.offset - previous.offset;
                if span <= f32::EPSILON {
                    return stop.color.to_rgba();
                }
                return previous.color.lerp(stop.color, (t - previous.offset) / span);
            }
            previous = stop;
        }

        previous.color.to_rgba()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DotsOptions {
    #[serde(rename = "type")]
    pub kind: DotKind,
    pub color: HexColor,
    pub gradient: Option<Gradient>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BackgroundOptions {
    pub color: HexColor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CornersSquareOptions {
    #[serde(rename = "type")]
    pub kind: CornerSquareKind,
    pub color: HexColor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CornersDotOptions {
    /// `None` 时内点按码点类型绘制。
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<CornerDotKind>,
    pub color: HexColor,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageOptions {
    pub margin: u32,
    pub image_size: f32,
    pub hide_background_dots: bool,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            margin: LOGO_MARGIN_PX,
            image_size: LOGO_SIZE_RATIO,
            hide_background_dots: true,
        }
    }
}

/// 由样式选择推导出的可变部分，实时切换样式时整体替换。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StylePatch {
    pub dots: DotsOptions,
    pub background: BackgroundOptions,
    pub corners_square: CornersSquareOptions,
    pub corners_dot: CornersDotOptions,
}

/// 完整渲染请求。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QrRenderRequest {
    pub width: u32,
    pub height: u32,
    pub data: String,
    pub error_correction: ErrorCorrection,
    #[serde(flatten)]
    pub style: StylePatch,
    /// logo Data URL。
    pub image: Option<String>,
    pub image_options: ImageOptions,
}

/// 唯一的样式推导规则。
pub fn derive_style(choice: &StyleChoice) -> StylePatch {
    let (dots_color, background, gradient) = match choice.mode {
        StyleMode::Basic => (HexColor::BLACK, HexColor::WHITE, None),
        StyleMode::Colored => (
            choice.primary,
            HexColor::MIDNIGHT,
            Some(Gradient {
                kind: GradientKind::Linear,
                rotation: 0.0,
                color_stops: vec![
                    ColorStop {
                        offset: 0.0,
                        color: choice.primary,
                    },
                    ColorStop {
                        offset: 1.0,
                        color: choice.secondary,
                    },
                ],
            }),
        ),
    };

    StylePatch {
        dots: DotsOptions {
            kind: DotKind::Rounded,
            color: dots_color,
            gradient,
        },
        background: BackgroundOptions { color: background },
        corners_square: CornersSquareOptions {
            kind: CornerSquareKind::Dot,
            color: dots_color,
        },
        corners_dot: CornersDotOptions {
            kind: None,
            color: dots_color,
        },
    }
}

/// 由样式配置构建渲染请求（纯函数）。
///
/// # 示例
/// ```rust
/// use qr_platform::qr::{build_render_request, HexColor, QrStyleConfig, StyleChoice, StyleMode};
///
/// let config = QrStyleConfig {
///     content: "https://example.com".into(),
///     style: StyleChoice { mode: StyleMode::Basic, primary: HexColor::rgb(0, 242, 255), secondary: HexColor::rgb(255, 0, 200) },
///     logo: None,
///     size: 300,
/// };
/// let request = build_render_request(&config);
/// assert_eq!(request.style.dots.color, HexColor::BLACK);
/// assert_eq!(request.style.background.color, HexColor::WHITE);
/// ```
pub fn build_render_request(config: &QrStyleConfig) -> QrRenderRequest {
    QrRenderRequest {
        width: config.size,
        height: config.size,
        data: config.content.clone(),
        error_correction: ErrorCorrection::Q,
        style: derive_style(&config.style),
        image: config.logo.as_ref().map(|logo| logo.as_data_uri().to_string()),
        image_options: ImageOptions::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_handler::SquareImage;

    fn config(mode: StyleMode) -> QrStyleConfig {
        QrStyleConfig {
            content: "hello".to_string(),
            style: StyleChoice {
                mode,
                primary: HexColor::rgb(0x00, 0xf2, 0xff),
                secondary: HexColor::rgb(0xff, 0x00, 0xc8),
            },
            logo: None,
            size: 300,
        }
    }

    #[test]
    fn basic_mode_ignores_picked_colors() {
        let request = build_render_request(&config(StyleMode::Basic));

        assert_eq!(request.style.dots.color, HexColor::BLACK);
        assert_eq!(request.style.background.color, HexColor::WHITE);
        assert!(request.style.dots.gradient.is_none());
        assert_eq!(request.style.corners_square.color, HexColor::BLACK);
        assert_eq!(request.style.corners_dot.color, HexColor::BLACK);
        assert_eq!(request.style.corners_dot.kind, None);
    }

    #[test]
    fn colored_mode_uses_gradient_and_dark_background() {
        let request = build_render_request(&config(StyleMode::Colored));

        assert_eq!(request.style.dots.color, HexColor::rgb(0x00, 0xf2, 0xff));
        assert_eq!(request.style.background.color, HexColor::MIDNIGHT);

        let gradient = request.style.dots.gradient.expect("colored mode has gradient");
        assert_eq!(gradient.kind, GradientKind::Linear);
        assert_eq!(gradient.rotation, 0.0);
        assert_eq!(gradient.color_stops.len(), 2);
        assert_eq!(gradient.color_stops[0].color, HexColor::rgb(0x00, 0xf2, 0xff));
        assert_eq!(gradient.color_stops[1].offset, 1.0);
        assert_eq!(gradient.color_stops[1].color, HexColor::rgb(0xff, 0x00, 0xc8));
    }

    #[test]
    fn logo_is_embedded_in_every_mode() {
        for mode in [StyleMode::Basic, StyleMode::Colored] {
            let mut cfg = config(mode);
            cfg.logo = Some(SquareImage {
                size: 120,
                data_uri: "data:image/png;base64,AAAA".to_string(),
            });

            let request = build_render_request(&cfg);
            assert_eq!(request.image.as_deref(), Some("data:image/png;base64,AAAA"));
            assert!(request.image_options.hide_background_dots);
            assert_eq!(request.image_options.margin, LOGO_MARGIN_PX);
        }
    }

    #[test]
    fn size_is_carried_to_both_dimensions() {
        let mut cfg = config(StyleMode::Basic);
        cfg.size = 260;

        let request = build_render_request(&cfg);
        assert_eq!((request.width, request.height), (260, 260));
        assert_eq!(request.error_correction, ErrorCorrection::Q);
    }

    #[test]
    fn gradient_sample_interpolates_between_stops() {
        let gradient = derive_style(&config(StyleMode::Colored).style)
            .dots
            .gradient
            .expect("gradient");

        assert_eq!(gradient.sample(0.0), [0x00, 0xf2, 0xff, 255]);
        assert_eq!(gradient.sample(1.0), [0xff, 0x00, 0xc8, 255]);
        assert_eq!(gradient.sample(2.0), [0xff, 0x00, 0xc8, 255]);
    }

    #[test]
    fn request_serializes_with_library_style_keys() {
        let json = serde_json::to_value(build_render_request(&config(StyleMode::Colored)))
            .expect("serialize");

        assert_eq!(json["dots"]["type"], "rounded");
        assert_eq!(json["background"]["color"], "#020617");
        assert_eq!(json["cornersSquare"]["type"], "dot");
        assert!(json["cornersDot"].get("type").is_none());
        assert_eq!(json["dots"]["gradient"]["colorStops"][1]["color"], "#ff00c8");
    }
}
