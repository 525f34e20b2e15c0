//! SVG 导出，与位图渲染共用同一套布局与圆角规则。

use std::fmt::Write;

use base64::Engine;

use super::RenderError;
use super::raster::{Layout, rounded_corners};
use super::renderer::RenderedQr;
use super::request::{CornerDotKind, CornerSquareKind, DotKind, StylePatch};

const GRADIENT_ID: &str = "qr-dots-gradient";

pub(super) fn render_svg(instance: &RenderedQr) -> Result<Vec<u8>, RenderError> {
    let request = instance.request();
    let matrix = instance.matrix();
    let style = &request.style;
    let layout = Layout::compute(request, matrix, instance.has_logo())?;
    let size = layout.size;

    let mut out = String::new();
    let fmt_err = |e: std::fmt::Error| RenderError::Export(e.to_string());

    write!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{size}" height="{size}" viewBox="0 0 {size} {size}">"#
    )
    .map_err(fmt_err)?;

    write_gradient_defs(&mut out, style, size).map_err(fmt_err)?;

    write!(
        out,
        r#"<rect x="0" y="0" width="{size}" height="{size}" fill="{}"/>"#,
        style.background.color
    )
    .map_err(fmt_err)?;

    let dots_fill = match style.dots.gradient {
        Some(_) => format!("url(#{GRADIENT_ID})"),
        None => style.dots.color.to_string(),
    };

    let mut path = String::new();
    for y in 0..layout.count as usize {
        for x in 0..layout.count as usize {
            if matrix.in_finder(x, y) || !matrix.is_dark(x as isize, y as isize) {
                continue;
            }
            if request.image_options.hide_background_dots && layout.hidden_by_logo(x, y) {
                continue;
            }

            let corners = match style.dots.kind {
                DotKind::Rounded => rounded_corners(matrix, x, y),
                DotKind::Square => [false; 4],
            };
            let (ox, oy) = layout.origin(x, y);
            push_module_path(&mut path, ox as f32, oy as f32, layout.module as f32, corners).map_err(fmt_err)?;
        }
    }
    write!(out, r#"<path fill="{dots_fill}" d="{path}"/>"#).map_err(fmt_err)?;

    for (fx, fy) in matrix.finder_origins() {
        write_finder(&mut out, &layout, style, fx, fy).map_err(fmt_err)?;
    }

    if let (Some(uri), Some((start, side))) = (request.image.as_deref(), layout.logo) {
        // 只写入重新编码后的 base64 内容
        let payload = uri
            .split_once(";base64,")
            .map(|(_, data)| data)
            .unwrap_or(uri);
        let normalized = base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map(|bytes| base64::engine::general_purpose::STANDARD.encode(bytes))
            .map_err(|e| RenderError::InvalidImage(e.to_string()))?;

        write!(
            out,
            r#"<image x="{start}" y="{start}" width="{side}" height="{side}" xlink:href="data:image/png;base64,{normalized}"/>"#
        )
        .map_err(fmt_err)?;
    }

    out.push_str("</svg>");
    Ok(out.into_bytes())
}

fn write_gradient_defs(out: &mut String, style: &StylePatch, size: u32) -> std::fmt::Result {
    let Some(gradient) = &style.dots.gradient else {
        return Ok(());
    };

    write!(
        out,
        r#"<defs><linearGradient id="{GRADIENT_ID}" gradientUnits="userSpaceOnUse" x1="0" y1="0" x2="{size}" y2="0">"#
    )?;
    for stop in &gradient.color_stops {
        write!(
            out,
            r#"<stop offset="{}%" stop-color="{}"/>"#,
            stop.offset * 100.0,
            stop.color
        )?;
    }
    out.push_str("</linearGradient></defs>");
    Ok(())
}

/// 单个模块的路径，`corners` 为 [左上, 右上, 右下, 左下] 是否画圆。
fn push_module_path(path: &mut String, x: f32, y: f32, m: f32, corners: [bool; 4]) -> std::fmt::Result {
    let r = m / 2.0;
    let radius = |round: bool| if round { r } else { 0.0 };
    let [tl, tr, br, bl] = corners.map(radius);

    write!(path, "M{} {}", x + tl, y)?;
    write!(path, "H{}", x + m - tr)?;
    if tr > 0.0 {
        write!(path, "A{tr} {tr} 0 0 1 {} {}", x + m, y + tr)?;
    }
    write!(path, "V{}", y + m - br)?;
    if br > 0.0 {
        write!(path, "A{br} {br} 0 0 1 {} {}", x + m - br, y + m)?;
    }
    write!(path, "H{}", x + bl)?;
    if bl > 0.0 {
        write!(path, "A{bl} {bl} 0 0 1 {} {}", x, y + m - bl)?;
    }
    write!(path, "V{}", y + tl)?;
    if tl > 0.0 {
        write!(path, "A{tl} {tl} 0 0 1 {} {}", x + tl, y)?;
    }
    path.push('Z');
    Ok(())
}

fn write_finder(out: &mut String, layout: &Layout, style: &StylePatch, fx: usize, fy: usize) -> std::fmt::Result {
    let (ox, oy) = layout.origin(fx, fy);
    let m = layout.module as f32;
    let cx = ox as f32 + 3.5 * m;
    let cy = oy as f32 + 3.5 * m;

    match style.corners_square.kind {
        CornerSquareKind::Dot => write!(
            out,
            r#"<circle cx="{cx}" cy="{cy}" r="{}" fill="none" stroke="{}" stroke-width="{m}"/>"#,
            3.0 * m,
            style.corners_square.color
        )?,
        CornerSquareKind::Square => write!(
            out,
            r#"<rect x="{}" y="{}" width="{}" height="{}" fill="none" stroke="{}" stroke-width="{m}"/>"#,
            ox as f32 + 0.5 * m,
            oy as f32 + 0.5 * m,
            6.0 * m,
            6.0 * m,
            style.corners_square.color
        )?,
    }

    let corner_radius = match (style.corners_dot.kind, style.dots.kind) {
        (Some(CornerDotKind::Dot), _) => None,
        (Some(CornerDotKind::Square), _) | (None, DotKind::Square) => Some(0.0),
        (None, DotKind::Rounded) => Some(m / 2.0),
    };

    match corner_radius {
        Some(radius) => write!(
            out,
            r#"<rect x="{}" y="{}" width="{}" height="{}" rx="{radius}" fill="{}"/>"#,
            cx - 1.5 * m,
            cy - 1.5 * m,
            3.0 * m,
            3.0 * m,
            style.corners_dot.color
        ),
        None => write!(
            out,
            r#"<circle cx="{cx}" cy="{cy}" r="{}" fill="{}"/>"#,
            1.5 * m,
            style.corners_dot.color
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qr::{HexColor, QrRenderer, QrStyleConfig, RasterRenderer, StyleChoice, StyleMode, build_render_request};

    fn render(mode: StyleMode) -> String {
        let renderer = RasterRenderer::new();
        let request = build_render_request(&QrStyleConfig {
            content: "hello".to_string(),
            style: StyleChoice {
                mode,
                primary: HexColor::rgb(0x00, 0xf2, 0xff),
                secondary: HexColor::rgb(0xff, 0x00, 0xc8),
            },
            logo: None,
            size: 300,
        });
        let instance = renderer.create(request).expect("create");
        String::from_utf8(render_svg(&instance).expect("svg")).expect("utf8")
    }

    #[test]
    fn basic_svg_has_no_gradient() {
        let svg = render(StyleMode::Basic);

        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(!svg.contains("linearGradient"));
        assert!(svg.contains(r##"fill="#ffffff""##));
        assert!(svg.contains(r##"fill="#000000""##));
    }

    #[test]
    fn colored_svg_references_gradient() {
        let svg = render(StyleMode::Colored);

        assert!(svg.contains("linearGradient"));
        assert!(svg.contains(r##"stop-color="#ff00c8""##));
        assert!(svg.contains(r##"fill="url(#qr-dots-gradient)""##));
        assert!(svg.contains(r##"fill="#020617""##));
    }

    #[test]
    fn finder_center_is_rounded_rect() {
        let svg = render(StyleMode::Basic);

        assert_eq!(svg.matches("<circle").count(), 3);
        assert!(svg.contains(r#"rx=""#));
        assert!(!svg.contains(r#"rx="0""#));
    }

    #[test]
    fn square_module_path_is_closed_rectangle() {
        let mut path = String::new();
        push_module_path(&mut path, 0.0, 0.0, 10.0, [false; 4]).expect("path");

        assert_eq!(path, "M0 0H10V10H0V0Z");
    }
}
