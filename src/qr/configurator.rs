//! # 二维码实例配置器
//!
//! ## 设计思路
//!
//! 配置器只依赖 `QrRenderer` trait，负责三件事：
//!
//! - `create_instance`：样式配置 → 渲染请求 → 新实例
//! - `apply_style`：把样式增量合并进实例当前样式，按同一规则重新推导后原地更新
//! - `set_logo`：替换或移除 logo，幂等
//!
//! 更新失败只记录日志，实例保留上一个有效状态，调用方无需处理错误。

use super::RenderError;
use super::renderer::{QrRenderer, RenderUpdate, RenderedQr};
use super::request::{build_render_request, derive_style};
use super::style::{QrStyleConfig, StyleChoice, StyleDelta};
use crate::image_handler::SquareImage;

/// 已渲染实例及其当前样式选择。
#[derive(Debug, Clone)]
pub struct QrInstance {
    rendered: RenderedQr,
    style: StyleChoice,
}

impl QrInstance {
    pub fn rendered(&self) -> &RenderedQr {
        &self.rendered
    }

    pub fn style(&self) -> StyleChoice {
        self.style
    }

    pub fn size(&self) -> u32 {
        self.rendered.size()
    }

    pub fn content(&self) -> &str {
        &self.rendered.request().data
    }
}

/// 按样式配置创建新实例，尺寸在此固定。
pub fn create_instance(renderer: &dyn QrRenderer, config: &QrStyleConfig) -> Result<QrInstance, RenderError> {
    let request = build_render_request(config);
    let rendered = renderer.create(request)?;

    Ok(QrInstance {
        rendered,
        style: config.style,
    })
}

/// 实时切换样式。返回是否成功应用。
pub fn apply_style(renderer: &dyn QrRenderer, instance: &mut QrInstance, delta: &StyleDelta) -> bool {
    let next = instance.style.merge(delta);
    if next == instance.style {
        return true;
    }

    match renderer.update(&mut instance.rendered, RenderUpdate::Style(derive_style(&next))) {
        Ok(()) => {
            log::debug!("🎨 样式已切换为 {} ({} → {})", next.mode.as_str(), next.primary, next.secondary);
            instance.style = next;
            true
        }
        Err(e) => {
            log::warn!("⚠️ 样式更新被拒绝，保留当前样式：{}", e);
            false
        }
    }
}

/// 替换 logo，`None` 表示移除。返回是否成功应用。
pub fn set_logo(renderer: &dyn QrRenderer, instance: &mut QrInstance, logo: Option<&SquareImage>) -> bool {
    let uri = logo.map(|l| l.as_data_uri().to_string());
    if instance.rendered.request().image == uri {
        return true;
    }

    match renderer.update(&mut instance.rendered, RenderUpdate::Image(uri)) {
        Ok(()) => {
            log::debug!("🖼️ logo 已{}", if logo.is_some() { "更新" } else { "移除" });
            true
        }
        Err(e) => {
            log::warn!("⚠️ logo 更新被拒绝，保留当前 logo：{}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qr::{HexColor, RasterRenderer, StyleMode};

    fn config() -> QrStyleConfig {
        QrStyleConfig {
            content: "mailto:a@b.com".to_string(),
            style: StyleChoice {
                mode: StyleMode::Basic,
                primary: HexColor::rgb(0x00, 0xf2, 0xff),
                secondary: HexColor::rgb(0xff, 0x00, 0xc8),
            },
            logo: None,
            size: 300,
        }
    }

    #[test]
    fn apply_style_rederives_from_merged_choice() {
        let renderer = RasterRenderer::new();
        let mut instance = create_instance(&renderer, &config()).expect("create");

        let applied = apply_style(
            &renderer,
            &mut instance,
            &StyleDelta {
                mode: Some(StyleMode::Colored),
                ..Default::default()
            },
        );

        assert!(applied);
        assert_eq!(instance.style().mode, StyleMode::Colored);
        let style = &instance.rendered().request().style;
        assert_eq!(style.dots.color, HexColor::rgb(0x00, 0xf2, 0xff));
        assert_eq!(style.background.color, HexColor::MIDNIGHT);
        assert!(style.dots.gradient.is_some());
    }

    #[test]
    fn switching_back_to_basic_forces_black_and_white() {
        let renderer = RasterRenderer::new();
        let mut cfg = config();
        cfg.style.mode = StyleMode::Colored;
        let mut instance = create_instance(&renderer, &cfg).expect("create");

        apply_style(
            &renderer,
            &mut instance,
            &StyleDelta {
                mode: Some(StyleMode::Basic),
                primary: Some(HexColor::rgb(0x12, 0x34, 0x56)),
                secondary: None,
            },
        );

        let style = &instance.rendered().request().style;
        assert_eq!(style.dots.color, HexColor::BLACK);
        assert_eq!(style.background.color, HexColor::WHITE);
        assert!(style.dots.gradient.is_none());
    }

    #[test]
    fn rejected_logo_leaves_instance_unchanged() {
        let renderer = RasterRenderer::new();
        let mut instance = create_instance(&renderer, &config()).expect("create");
        let bad = SquareImage {
            size: 120,
            data_uri: "data:image/png;base64,AAAA".to_string(),
        };

        assert!(!set_logo(&renderer, &mut instance, Some(&bad)));
        assert!(!instance.rendered().has_logo());
        assert!(instance.rendered().request().image.is_none());
    }

    #[test]
    fn removing_absent_logo_is_a_no_op() {
        let renderer = RasterRenderer::new();
        let mut instance = create_instance(&renderer, &config()).expect("create");

        assert!(set_logo(&renderer, &mut instance, None));
        assert!(set_logo(&renderer, &mut instance, None));
        assert_eq!(instance.size(), 300);
        assert_eq!(instance.content(), "mailto:a@b.com");
    }
}
