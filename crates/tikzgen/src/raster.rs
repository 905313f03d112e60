#![forbid(unsafe_code)]

use tikzgen_core::viewport::{Rect, Size, ViewportState};

#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error("failed to parse SVG")]
    SvgParse(#[source] usvg::Error),
    #[error("failed to allocate pixmap for raster rendering")]
    PixmapAlloc,
    #[error("failed to encode PNG")]
    PngEncode,
    #[error("invalid background color `{0}`")]
    Background(String),
}

pub type Result<T> = std::result::Result<T, RasterError>;

/// Export resolution relative to screen pixels.
pub const EXPORT_UPSCALE: f64 = 3.0;

#[derive(Debug, Clone)]
pub struct RasterOptions {
    pub scale: f32,
    pub background: Option<String>,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            scale: 1.0,
            background: Some("white".to_string()),
        }
    }
}

/// Renders the whole SVG at `options.scale`.
pub fn svg_to_png(svg: &str, options: &RasterOptions) -> Result<Vec<u8>> {
    let tree = parse_tree(svg)?;
    let size = tree.size();
    let scale = options.scale;
    let width_px = (size.width() * scale).ceil().max(1.0) as u32;
    let height_px = (size.height() * scale).ceil().max(1.0) as u32;

    let mut pixmap = tiny_skia::Pixmap::new(width_px, height_px).ok_or(RasterError::PixmapAlloc)?;
    if let Some(bg) = options.background.as_deref() {
        let color = parse_tiny_skia_color(bg).ok_or_else(|| RasterError::Background(bg.to_string()))?;
        pixmap.fill(color);
    }
    resvg::render(
        &tree,
        tiny_skia::Transform::from_scale(scale, scale),
        &mut pixmap.as_mut(),
    );
    pixmap.encode_png().map_err(|_| RasterError::PngEncode)
}

/// Intrinsic size of the SVG document (its `width`/`height`, or the `viewBox` size).
pub fn natural_size(svg: &str) -> Result<Size> {
    let size = parse_tree(svg)?.size();
    Ok(Size::new(size.width() as f64, size.height() as f64))
}

/// Rasterizes the pixels under `crop`.
///
/// `content` and `crop` are the on-screen boxes of the displayed image and of the crop
/// rectangle. The surface is `crop` scaled by `upscale`, filled white, with the image drawn
/// into `content` shifted so the crop's top-left corner lands at the origin.
///
/// Returns `Ok(None)` when there is no image to export.
pub fn rasterize_crop(svg: &str, content: Rect, crop: Rect, upscale: f64) -> Result<Option<Vec<u8>>> {
    if svg.trim().is_empty() || !content.size().is_positive() {
        return Ok(None);
    }
    let tree = parse_tree(svg)?;
    render_crop(&tree, content, crop, upscale).map(Some)
}

/// Exports the crop rectangle of `viewport` for an image displayed in `container`.
///
/// The image's on-screen box is derived from its natural size and the pan/zoom of `viewport`.
/// Zoom and crop size are clamped to the viewport limits first.
pub fn export_crop(svg: &str, viewport: &ViewportState, container: Size) -> Result<Option<Vec<u8>>> {
    if svg.trim().is_empty() {
        return Ok(None);
    }
    let viewport = viewport.normalized();
    let tree = parse_tree(svg)?;
    let size = tree.size();
    let natural = Size::new(size.width() as f64, size.height() as f64);
    let content = viewport.content_rect(container, natural);
    tracing::debug!(?content, crop = ?viewport.crop, "exporting crop");
    render_crop(&tree, content, viewport.crop, EXPORT_UPSCALE).map(Some)
}

/// `tikz_export_<unix-millis>.png`
pub fn export_file_name(now: chrono::DateTime<chrono::Utc>) -> String {
    format!("tikz_export_{}.png", now.timestamp_millis())
}

fn parse_tree(svg: &str) -> Result<usvg::Tree> {
    let mut opt = usvg::Options::default();
    // Labels fall back to system fonts; pick a serif face to stay close to LaTeX output.
    opt.fontdb_mut().load_system_fonts();
    opt.font_family = "Times New Roman".to_string();
    usvg::Tree::from_str(svg, &opt).map_err(RasterError::SvgParse)
}

fn render_crop(tree: &usvg::Tree, content: Rect, crop: Rect, upscale: f64) -> Result<Vec<u8>> {
    let width_px = (crop.width * upscale).round().max(1.0) as u32;
    let height_px = (crop.height * upscale).round().max(1.0) as u32;
    let mut pixmap = tiny_skia::Pixmap::new(width_px, height_px).ok_or(RasterError::PixmapAlloc)?;
    pixmap.fill(tiny_skia::Color::WHITE);

    let size = tree.size();
    let sx = content.width / size.width() as f64;
    let sy = content.height / size.height() as f64;
    let dx = content.left - crop.left;
    let dy = content.top - crop.top;
    let transform = tiny_skia::Transform::from_row(
        (upscale * sx) as f32,
        0.0,
        0.0,
        (upscale * sy) as f32,
        (upscale * dx) as f32,
        (upscale * dy) as f32,
    );
    resvg::render(tree, transform, &mut pixmap.as_mut());
    pixmap.encode_png().map_err(|_| RasterError::PngEncode)
}

fn parse_tiny_skia_color(text: &str) -> Option<tiny_skia::Color> {
    let s = text.trim().to_ascii_lowercase();
    match s.as_str() {
        "transparent" => return Some(tiny_skia::Color::TRANSPARENT),
        "white" => return Some(tiny_skia::Color::WHITE),
        "black" => return Some(tiny_skia::Color::BLACK),
        _ => {}
    }

    let hex = s.strip_prefix('#')?;
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    match hex.len() {
        6 => Some(tiny_skia::Color::from_rgba8(channel(0)?, channel(2)?, channel(4)?, 255)),
        8 => Some(tiny_skia::Color::from_rgba8(
            channel(0)?,
            channel(2)?,
            channel(4)?,
            channel(6)?,
        )),
        _ => None,
    }
}
