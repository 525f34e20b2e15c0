//! # 位图渲染器
//!
//! ## 实现思路
//!
//! 1. `qrcode` 给出模块矩阵，不留静区；模块边长 `floor(size / count)`，整体居中。
//! 2. 普通码点为 `rounded`：某个外角两侧都没有深色邻居时才把该角画圆。
//! 3. 定位图案单独绘制：外框为圆环（`dot`），内点为 3×3 块，未指定类型时按码点类型画成圆角方块，
//!    颜色与码点一致且不带渐变。
//! 4. 渐变沿水平方向从画布左缘插值到右缘。
//! 5. logo 边长为二维码区域的 40%，居中放置；与 logo（含 4px 留白）相交的码点不绘制。
//!
//! 更新总是先在副本上完成，成功后再替换，失败的更新不会留下半成品。

use std::io::Cursor;

use bytes::Bytes;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};

use super::RenderError;
use super::renderer::{ExportFormat, ModuleMatrix, QrRenderer, RenderUpdate, RenderedQr};
use super::request::{CornerDotKind, CornerSquareKind, DotKind, MAX_QR_SIZE, QrRenderRequest, StylePatch};
use super::svg;
use super::target::{PreviewFrame, RenderTarget};
use crate::image_handler::decode_data_uri_image;

/// JPEG 导出质量。
const JPEG_QUALITY: u8 = 92;

/// 像素布局：模块尺寸、偏移与 logo 区域。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Layout {
    pub(super) size: u32,
    pub(super) count: u32,
    pub(super) module: u32,
    pub(super) offset: u32,
    /// logo 左上角与边长（像素），仅在有 logo 时存在。
    pub(super) logo: Option<(u32, u32)>,
    pub(super) margin: u32,
}

impl Layout {
    pub(super) fn compute(request: &QrRenderRequest, matrix: &ModuleMatrix, with_logo: bool) -> Result<Self, RenderError> {
        let size = request.width;
        if size > MAX_QR_SIZE {
            return Err(RenderError::SizeOutOfRange { size, max: MAX_QR_SIZE });
        }
        let count = matrix.width() as u32;
        let module = if count == 0 { 0 } else { size / count };
        if module == 0 {
            return Err(RenderError::Encode(format!(
                "尺寸 {}px 不足以容纳 {}×{} 个模块",
                size, count, count
            )));
        }

        let drawn = module * count;
        let offset = (size - drawn) / 2;

        let logo = with_logo
            .then(|| {
                let side = (drawn as f32 * request.image_options.image_size).floor() as u32;
                (side > 0).then(|| (offset + (drawn - side) / 2, side))
            })
            .flatten();

        Ok(Self {
            size,
            count,
            module,
            offset,
            logo,
            margin: request.image_options.margin,
        })
    }

    /// 模块左上角像素坐标。
    pub(super) fn origin(&self, x: usize, y: usize) -> (u32, u32) {
        (self.offset + x as u32 * self.module, self.offset + y as u32 * self.module)
    }

    /// 该模块是否被 logo（含留白）遮挡。
    pub(super) fn hidden_by_logo(&self, x: usize, y: usize) -> bool {
        let Some((start, side)) = self.logo else {
            return false;
        };

        let lo = start.saturating_sub(self.margin);
        let hi = start + side + self.margin;
        let (px, py) = self.origin(x, y);

        px < hi && px + self.module > lo && py < hi && py + self.module > lo
    }
}

/// 基于 `qrcode` + `image` 的默认渲染器。
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterRenderer;

impl RasterRenderer {
    pub fn new() -> Self {
        Self
    }

    fn decode_logo(uri: &str) -> Result<RgbaImage, RenderError> {
        decode_data_uri_image(uri).map_err(|e| RenderError::InvalidImage(e.to_string()))
    }

    fn validate_style(style: &StylePatch) -> Result<(), RenderError> {
        if let Some(gradient) = &style.dots.gradient {
            if gradient.color_stops.len() < 2 {
                return Err(RenderError::Rejected("渐变至少需要两个色标".to_string()));
            }
            if gradient.color_stops.iter().any(|s| !(0.0..=1.0).contains(&s.offset)) {
                return Err(RenderError::Rejected("色标位置必须在 0 到 1 之间".to_string()));
            }
        }
        Ok(())
    }

    /// 栅格化为 `size × size` 的 RGBA 图像。
    pub fn rasterize(&self, instance: &RenderedQr) -> Result<RgbaImage, RenderError> {
        let request = &instance.request;
        let matrix = &instance.matrix;
        let style = &request.style;
        let layout = Layout::compute(request, matrix, instance.logo.is_some())?;

        let mut canvas = RgbaImage::from_pixel(layout.size, layout.size, Rgba(style.background.color.to_rgba()));

        for y in 0..matrix.width() {
            for x in 0..matrix.width() {
                if matrix.in_finder(x, y) || !matrix.is_dark(x as isize, y as isize) {
                    continue;
                }
                if request.image_options.hide_background_dots && layout.hidden_by_logo(x, y) {
                    continue;
                }
                draw_dot(&mut canvas, &layout, matrix, style, x, y);
            }
        }

        for (fx, fy) in matrix.finder_origins() {
            draw_finder(&mut canvas, &layout, style, fx, fy);
        }

        if let (Some(logo), Some((start, side))) = (&instance.logo, layout.logo) {
            let scaled = image::imageops::resize(logo, side, side, image::imageops::FilterType::Triangle);
            image::imageops::overlay(&mut canvas, &scaled, start as i64, start as i64);
        }

        Ok(canvas)
    }

    fn encode_raster(&self, instance: &RenderedQr, format: ImageFormat) -> Result<Bytes, RenderError> {
        let canvas = self.rasterize(instance)?;
        let mut buffer = Cursor::new(Vec::new());

        let image = match format {
            // JPEG 不支持透明通道，先压到背景色上
            ImageFormat::Jpeg => {
                let background = instance.request.style.background.color.to_rgba();
                DynamicImage::ImageRgb8(flatten_alpha(&canvas, background))
            }
            _ => DynamicImage::ImageRgba8(canvas),
        };

        if format == ImageFormat::Jpeg {
            let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY);
            image
                .write_with_encoder(encoder)
                .map_err(|e| RenderError::Export(e.to_string()))?;
        } else {
            image
                .write_to(&mut buffer, format)
                .map_err(|e| RenderError::Export(e.to_string()))?;
        }

        Ok(Bytes::from(buffer.into_inner()))
    }
}

impl QrRenderer for RasterRenderer {
    fn create(&self, request: QrRenderRequest) -> Result<RenderedQr, RenderError> {
        Self::validate_style(&request.style)?;

        let matrix = ModuleMatrix::encode(&request.data, &request)?;
        let logo = request.image.as_deref().map(Self::decode_logo).transpose()?;
        Layout::compute(&request, &matrix, logo.is_some())?;

        log::debug!(
            "🔳 二维码已创建：{} 个模块，{}px，logo={}",
            matrix.width(),
            request.width,
            logo.is_some()
        );

        Ok(RenderedQr { request, matrix, logo })
    }

    fn update(&self, instance: &mut RenderedQr, update: RenderUpdate) -> Result<(), RenderError> {
        let mut next = instance.clone();

        match update {
            RenderUpdate::Style(patch) => {
                Self::validate_style(&patch)?;
                next.request.style = patch;
            }
            RenderUpdate::Image(Some(uri)) => {
                next.logo = Some(Self::decode_logo(&uri)?);
                next.request.image = Some(uri);
            }
            RenderUpdate::Image(None) => {
                next.logo = None;
                next.request.image = None;
            }
        }

        Layout::compute(&next.request, &next.matrix, next.logo.is_some())?;
        *instance = next;
        Ok(())
    }

    fn to_blob(&self, instance: &RenderedQr, format: ExportFormat) -> Result<Bytes, RenderError> {
        match format {
            ExportFormat::Png => self.encode_raster(instance, ImageFormat::Png),
            ExportFormat::Jpeg => self.encode_raster(instance, ImageFormat::Jpeg),
            ExportFormat::Svg => svg::render_svg(instance).map(Bytes::from),
        }
    }

    fn append(&self, instance: &RenderedQr, target: &mut dyn RenderTarget) -> Result<(), RenderError> {
        let image = self.rasterize(instance)?;
        target.clear()?;
        target.mount(&PreviewFrame {
            image: &image,
            background: instance.request.style.background.color,
        })
    }
}

fn dot_color(style: &StylePatch, layout: &Layout, px: u32) -> Rgba<u8> {
    match &style.dots.gradient {
        Some(gradient) => {
            let span = layout.size.saturating_sub(1).max(1) as f32;
            Rgba(gradient.sample(px as f32 / span))
        }
        None => Rgba(style.dots.color.to_rgba()),
    }
}

/// 在圆角半径 `r` 下，模块内点 `(fx, fy)` 是否落在被削掉的角上。
fn outside_rounded_corner(fx: f32, fy: f32, m: f32, r: f32, corners: [bool; 4]) -> bool {
    // corners: [左上, 右上, 右下, 左下]
    let centers = [(r, r), (m - r, r), (m - r, m - r), (r, m - r)];
    for (i, &(cx, cy)) in centers.iter().enumerate() {
        if !corners[i] {
            continue;
        }
        let in_quadrant = match i {
            0 => fx < cx && fy < cy,
            1 => fx > cx && fy < cy,
            2 => fx > cx && fy > cy,
            _ => fx < cx && fy > cy,
        };
        if in_quadrant && (fx - cx).powi(2) + (fy - cy).powi(2) > r * r {
            return true;
        }
    }
    false
}

/// 每个外角是否应当画圆：两侧都没有深色邻居。
pub(super) fn rounded_corners(matrix: &ModuleMatrix, x: usize, y: usize) -> [bool; 4] {
    let (x, y) = (x as isize, y as isize);
    let top = matrix.is_dark(x, y - 1);
    let right = matrix.is_dark(x + 1, y);
    let bottom = matrix.is_dark(x, y + 1);
    let left = matrix.is_dark(x - 1, y);

    [!top && !left, !top && !right, !bottom && !right, !bottom && !left]
}

fn draw_dot(canvas: &mut RgbaImage, layout: &Layout, matrix: &ModuleMatrix, style: &StylePatch, x: usize, y: usize) {
    let (ox, oy) = layout.origin(x, y);
    let m = layout.module as f32;
    let corners = match style.dots.kind {
        DotKind::Rounded => rounded_corners(matrix, x, y),
        DotKind::Square => [false; 4],
    };

    for dy in 0..layout.module {
        for dx in 0..layout.module {
            let (fx, fy) = (dx as f32 + 0.5, dy as f32 + 0.5);
            if outside_rounded_corner(fx, fy, m, m / 2.0, corners) {
                continue;
            }
            let px = ox + dx;
            canvas.put_pixel(px, oy + dy, dot_color(style, layout, px));
        }
    }
}

fn draw_finder(canvas: &mut RgbaImage, layout: &Layout, style: &StylePatch, fx: usize, fy: usize) {
    let (ox, oy) = layout.origin(fx, fy);
    let m = layout.module as f32;
    let side = layout.module * 7;
    let center = side as f32 / 2.0;
    let square_color = Rgba(style.corners_square.color.to_rgba());
    let dot_color = Rgba(style.corners_dot.color.to_rgba());

    for dy in 0..side {
        for dx in 0..side {
            let (px, py) = (dx as f32 + 0.5, dy as f32 + 0.5);
            let (rx, ry) = (px - center, py - center);

            let in_ring = match style.corners_square.kind {
                CornerSquareKind::Dot => {
                    let distance = (rx * rx + ry * ry).sqrt();
                    distance <= 3.5 * m && distance >= 2.5 * m
                }
                CornerSquareKind::Square => {
                    let chebyshev = rx.abs().max(ry.abs());
                    chebyshev <= 3.5 * m && chebyshev >= 2.5 * m
                }
            };

            let in_dot = in_finder_dot(style, rx, ry, m);

            if in_ring {
                canvas.put_pixel(ox + dx, oy + dy, square_color);
            } else if in_dot {
                canvas.put_pixel(ox + dx, oy + dy, dot_color);
            }
        }
    }
}

/// 内点（3×3 模块）是否覆盖相对中心的 `(rx, ry)`。
fn in_finder_dot(style: &StylePatch, rx: f32, ry: f32, m: f32) -> bool {
    let (ax, ay) = (rx.abs(), ry.abs());
    let in_square = ax <= 1.5 * m && ay <= 1.5 * m;

    match (style.corners_dot.kind, style.dots.kind) {
        (Some(CornerDotKind::Dot), _) => (rx * rx + ry * ry).sqrt() <= 1.5 * m,
        (Some(CornerDotKind::Square), _) | (None, DotKind::Square) => in_square,
        // 3×3 个 rounded 码点拼成的块，只有四个外角被削圆
        (None, DotKind::Rounded) => {
            if !in_square {
                return false;
            }
            if ax <= m || ay <= m {
                return true;
            }
            (ax - m).powi(2) + (ay - m).powi(2) <= (m / 2.0).powi(2)
        }
    }
}

fn flatten_alpha(image: &RgbaImage, background: [u8; 4]) -> image::RgbImage {
    image::RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b, a] = image.get_pixel(x, y).0;
        let alpha = a as f32 / 255.0;
        let mix = |c: u8, bg: u8| (c as f32 * alpha + bg as f32 * (1.0 - alpha)).round() as u8;
        image::Rgb([mix(r, background[0]), mix(g, background[1]), mix(b, background[2])])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qr::{HexColor, QrStyleConfig, StyleChoice, StyleMode, build_render_request, derive_style};

    fn red_logo_uri() -> String {
        use base64::Engine;

        let logo = RgbaImage::from_pixel(120, 120, Rgba([255, 0, 0, 255]));
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(logo)
            .write_to(&mut buffer, ImageFormat::Png)
            .expect("encode logo");
        format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(buffer.into_inner())
        )
    }

    fn request(mode: StyleMode, size: u32) -> QrRenderRequest {
        build_render_request(&QrStyleConfig {
            content: "https://example.com".to_string(),
            style: StyleChoice {
                mode,
                primary: HexColor::rgb(0x00, 0xf2, 0xff),
                secondary: HexColor::rgb(0xff, 0x00, 0xc8),
            },
            logo: None,
            size,
        })
    }

    #[test]
    fn basic_render_is_black_on_white() {
        let renderer = RasterRenderer::new();
        let instance = renderer.create(request(StyleMode::Basic, 300)).expect("create");
        let image = renderer.rasterize(&instance).expect("rasterize");

        assert_eq!(image.dimensions(), (300, 300));
        for pixel in image.pixels() {
            assert!(pixel.0 == [0, 0, 0, 255] || pixel.0 == [255, 255, 255, 255]);
        }

        // 定位图案外环中点
        let layout = Layout::compute(&instance.request, &instance.matrix, false).expect("layout");
        let (ox, oy) = layout.origin(0, 0);
        let ring_y = oy + layout.module / 2;
        let ring_x = ox + layout.module * 7 / 2;
        assert_eq!(image.get_pixel(ring_x, ring_y).0, [0, 0, 0, 255]);
    }

    #[test]
    fn colored_render_uses_dark_background() {
        let renderer = RasterRenderer::new();
        let instance = renderer.create(request(StyleMode::Colored, 300)).expect("create");
        let image = renderer.rasterize(&instance).expect("rasterize");
        let layout = Layout::compute(&instance.request, &instance.matrix, false).expect("layout");

        // 定位图案外环与内点之间的空隙
        let (ox, oy) = layout.origin(0, 0);
        let gap_x = ox + layout.module * 11 / 2;
        let gap_y = oy + layout.module * 7 / 2;
        assert_eq!(image.get_pixel(gap_x, gap_y).0, [0x02, 0x06, 0x17, 255]);

        // 外环使用主色
        let ring_x = ox + layout.module * 7 / 2;
        let ring_y = oy + layout.module / 2;
        assert_eq!(image.get_pixel(ring_x, ring_y).0, [0x00, 0xf2, 0xff, 255]);
    }

    #[test]
    fn too_small_canvas_is_rejected() {
        let renderer = RasterRenderer::new();
        let result = renderer.create(request(StyleMode::Basic, 10));

        assert!(matches!(result, Err(RenderError::Encode(_))));
    }

    #[test]
    fn oversize_canvas_is_rejected_before_allocation() {
        let renderer = RasterRenderer::new();

        let result = renderer.create(request(StyleMode::Basic, u32::MAX));
        assert!(matches!(
            result,
            Err(RenderError::SizeOutOfRange { size: u32::MAX, max: MAX_QR_SIZE })
        ));

        let result = renderer.create(request(StyleMode::Colored, MAX_QR_SIZE + 1));
        assert!(matches!(result, Err(RenderError::SizeOutOfRange { .. })));
    }

    #[test]
    fn size_at_limit_is_accepted() {
        let renderer = RasterRenderer::new();

        assert!(renderer.create(request(StyleMode::Basic, MAX_QR_SIZE)).is_ok());
    }

    #[test]
    fn logo_is_centered_and_hides_dots() {
        let renderer = RasterRenderer::new();
        let mut req = request(StyleMode::Basic, 300);
        req.image = Some(red_logo_uri());
        let instance = renderer.create(req).expect("create");
        let image = renderer.rasterize(&instance).expect("rasterize");

        assert_eq!(image.get_pixel(150, 150).0, [255, 0, 0, 255]);
    }

    #[test]
    fn rejected_update_keeps_last_good_state() {
        let renderer = RasterRenderer::new();
        let mut instance = renderer.create(request(StyleMode::Basic, 300)).expect("create");
        let before = instance.request.clone();

        let result = renderer.update(
            &mut instance,
            RenderUpdate::Image(Some("data:image/png;base64,bm90IGFuIGltYWdl".to_string())),
        );

        assert!(matches!(result, Err(RenderError::InvalidImage(_))));
        assert_eq!(instance.request, before);
        assert!(!instance.has_logo());
    }

    #[test]
    fn style_update_switches_colors_in_place() {
        let renderer = RasterRenderer::new();
        let mut instance = renderer.create(request(StyleMode::Basic, 300)).expect("create");
        let patch = derive_style(&StyleChoice {
            mode: StyleMode::Colored,
            primary: HexColor::rgb(0x00, 0xf2, 0xff),
            secondary: HexColor::rgb(0xff, 0x00, 0xc8),
        });

        renderer.update(&mut instance, RenderUpdate::Style(patch.clone())).expect("update");

        assert_eq!(instance.request.style, patch);
        assert_eq!(instance.size(), 300);
    }

    #[test]
    fn all_formats_export_non_empty_blobs() {
        let renderer = RasterRenderer::new();
        let instance = renderer.create(request(StyleMode::Colored, 260)).expect("create");

        let png = renderer.to_blob(&instance, ExportFormat::Png).expect("png");
        assert_eq!(infer::get(&png).map(|t| t.mime_type()), Some("image/png"));

        let jpeg = renderer.to_blob(&instance, ExportFormat::Jpeg).expect("jpeg");
        assert_eq!(infer::get(&jpeg).map(|t| t.mime_type()), Some("image/jpeg"));

        let svg = renderer.to_blob(&instance, ExportFormat::Svg).expect("svg");
        assert!(std::str::from_utf8(&svg).expect("utf8").starts_with("<svg"));
    }

    #[test]
    fn surrounded_module_keeps_square_corners() {
        let req = request(StyleMode::Basic, 300);
        let matrix = ModuleMatrix::encode(&req.data, &req).expect("encode");

        // 定位图案内点中心四周都是深色
        assert_eq!(rounded_corners(&matrix, 3, 3), [false; 4]);
    }

    #[test]
    fn finder_center_follows_rounded_dots() {
        let renderer = RasterRenderer::new();
        let instance = renderer.create(request(StyleMode::Basic, 300)).expect("create");
        let image = renderer.rasterize(&instance).expect("rasterize");
        let layout = Layout::compute(&instance.request, &instance.matrix, false).expect("layout");
        let (ox, oy) = layout.origin(0, 0);
        let m = layout.module;

        // 内点左上角被削圆，露出背景
        assert_eq!(image.get_pixel(ox + 2 * m, oy + 2 * m).0, [255, 255, 255, 255]);
        // 上边中点与正中心仍是实心
        assert_eq!(image.get_pixel(ox + m * 7 / 2, oy + 2 * m).0, [0, 0, 0, 255]);
        assert_eq!(image.get_pixel(ox + m * 7 / 2, oy + m * 7 / 2).0, [0, 0, 0, 255]);
    }

    #[test]
    fn explicit_square_center_keeps_hard_corners() {
        let mut style = derive_style(&StyleChoice::default());
        style.corners_dot.kind = Some(CornerDotKind::Square);
        let m = 10.0;

        assert!(in_finder_dot(&style, -14.5, -14.5, m));
        style.corners_dot.kind = None;
        assert!(!in_finder_dot(&style, -14.5, -14.5, m));
        assert!(in_finder_dot(&style, 0.0, -14.5, m));
    }

    #[test]
    fn flatten_alpha_blends_onto_background() {
        let image = RgbaImage::from_pixel(1, 1, Rgba([255, 255, 255, 0]));
        let flat = flatten_alpha(&image, [2, 6, 23, 255]);

        assert_eq!(flat.get_pixel(0, 0).0, [2, 6, 23]);
    }
}
