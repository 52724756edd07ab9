//! Rasterizing SVG documents into PNG images.

use std::io::Cursor;

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use log::trace;
use resvg::tiny_skia::{Pixmap, PremultipliedColorU8, Transform};
use resvg::usvg::{Options, Tree};

use crate::error::RenderError;
use crate::font::FontCatalog;
use crate::request::SizeHints;

/// Something that can turn SVG markup into PNG bytes.
pub trait Renderer {
    /// Render `svg` into an encoded PNG image.
    ///
    /// A constrained axis in `hints` fixes the size of the output on that axis. How
    /// an unconstrained axis is sized is up to the renderer.
    fn render(&self, svg: &str, hints: SizeHints) -> Result<Vec<u8>, RenderError>;
}

impl<R: Renderer + ?Sized> Renderer for &R {
    fn render(&self, svg: &str, hints: SizeHints) -> Result<Vec<u8>, RenderError> {
        (**self).render(svg, hints)
    }
}

/// Settings to apply during rendering.
#[derive(Debug, Clone)]
pub struct RenderSettings {
    /// The largest allowed width or height of the output, in pixels.
    pub max_dimension: u32,
    /// The font family to use for text that does not specify one.
    pub default_font_family: String,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            max_dimension: 16384,
            default_font_family: "Arimo".to_string(),
        }
    }
}

/// A [`Renderer`] backed by `resvg`.
///
/// - Without constraints, the output has the intrinsic size of the document.
/// - With one constrained axis, the other one is scaled proportionally.
/// - With both axes constrained, the document is scaled uniformly to fit into the
///   requested canvas and centered on it.
#[derive(Debug, Clone)]
pub struct ResvgRenderer {
    fonts: FontCatalog,
    settings: RenderSettings,
}

impl ResvgRenderer {
    /// Create a new renderer using the fonts from `fonts`.
    pub fn new(fonts: FontCatalog, settings: RenderSettings) -> Self {
        Self { fonts, settings }
    }

    fn options(&self) -> Options<'static> {
        let mut options = Options::default();
        options.fontdb = self.fonts.database();
        options.font_family = self.settings.default_font_family.clone();

        options
    }
}

impl Renderer for ResvgRenderer {
    fn render(&self, svg: &str, hints: SizeHints) -> Result<Vec<u8>, RenderError> {
        let tree = Tree::from_str(svg, &self.options()).map_err(RenderError::Parse)?;
        let size = tree.size();
        let layout = Layout::fit(size.width() as f64, size.height() as f64, hints);

        trace!(
            "intrinsic size {}x{}, output {}x{}",
            size.width(),
            size.height(),
            layout.width,
            layout.height
        );

        layout.check(self.settings.max_dimension)?;

        let mut pixmap = Pixmap::new(layout.width, layout.height).ok_or(
            RenderError::InvalidSize {
                width: layout.width,
                height: layout.height,
            },
        )?;

        resvg::render(&tree, layout.transform(), &mut pixmap.as_mut());

        encode_png(pixmap)
    }
}

/// Where a document ends up on the output canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Layout {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) scale: f64,
    pub(crate) x_offset: f64,
    pub(crate) y_offset: f64,
}

impl Layout {
    pub(crate) fn fit(width: f64, height: f64, hints: SizeHints) -> Self {
        let hint = |h: Option<core::num::NonZeroU32>| h.map(|h| h.get() as f64);

        let (out_width, out_height, scale) = match (hint(hints.width), hint(hints.height)) {
            (None, None) => (width.ceil(), height.ceil(), 1.0),
            (Some(w), None) => {
                let scale = w / width;
                (w, (height * scale).round().max(1.0), scale)
            }
            (None, Some(h)) => {
                let scale = h / height;
                ((width * scale).round().max(1.0), h, scale)
            }
            (Some(w), Some(h)) => (w, h, (w / width).min(h / height)),
        };

        Self {
            width: out_width as u32,
            height: out_height as u32,
            scale,
            x_offset: (out_width - width * scale) / 2.0,
            y_offset: (out_height - height * scale) / 2.0,
        }
    }

    fn check(&self, max_dimension: u32) -> Result<(), RenderError> {
        if self.width == 0 || self.height == 0 {
            return Err(RenderError::InvalidSize {
                width: self.width,
                height: self.height,
            });
        }

        if self.width > max_dimension || self.height > max_dimension {
            return Err(RenderError::TooLarge {
                width: self.width,
                height: self.height,
                limit: max_dimension,
            });
        }

        Ok(())
    }

    fn transform(&self) -> Transform {
        Transform::from_scale(self.scale as f32, self.scale as f32)
            .post_translate(self.x_offset as f32, self.y_offset as f32)
    }
}

/// Encode the pixmap into a PNG file.
fn encode_png(mut pixmap: Pixmap) -> Result<Vec<u8>, RenderError> {
    // PNG stores straight alpha, the pixmap is premultiplied.
    demultiply(pixmap.data_mut());

    let mut png_data = Vec::new();
    let cursor = Cursor::new(&mut png_data);
    let encoder = PngEncoder::new(cursor);
    encoder
        .write_image(
            pixmap.data(),
            pixmap.width(),
            pixmap.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(RenderError::Encode)?;

    Ok(png_data)
}

/// Convert premultiplied RGBA data to straight alpha in place.
fn demultiply(data: &mut [u8]) {
    for pixel in data.chunks_exact_mut(4) {
        let Some(color) = PremultipliedColorU8::from_rgba(pixel[0], pixel[1], pixel[2], pixel[3])
        else {
            continue;
        };

        let color = color.demultiply();
        pixel.copy_from_slice(&[color.red(), color.green(), color.blue(), color.alpha()]);
    }
}
