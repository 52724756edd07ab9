//! Turning decoded requests into images.

use log::debug;

use crate::error::RenderError;
use crate::render::Renderer;
use crate::request::ConversionRequest;

/// The media type of every successful conversion.
pub const CONTENT_TYPE: &str = "image/png";

/// Drives a [`Renderer`] for one request at a time.
///
/// A pipeline holds no per-request state and can be shared between threads if the
/// renderer can.
#[derive(Debug, Clone)]
pub struct Pipeline<R> {
    renderer: R,
}

impl<R: Renderer> Pipeline<R> {
    /// Create a new pipeline.
    pub fn new(renderer: R) -> Self {
        Self { renderer }
    }

    /// Render the request into a PNG image.
    ///
    /// Dimension hints are forwarded as they are: a hint of `0` leaves the axis to
    /// the renderer.
    pub fn convert(&self, request: ConversionRequest) -> Result<ConversionResult, RenderError> {
        let hints = request.size_hints();
        debug!("rendering with hints {hints:?}");

        match self.renderer.render(request.svg(), hints) {
            Ok(bytes) => {
                let result = ConversionResult { bytes };
                debug!("rendered {} bytes", result.byte_length());

                Ok(result)
            }
            Err(err) => {
                debug!("rendering failed: {err}");

                Err(err)
            }
        }
    }
}

/// A rendered PNG image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionResult {
    bytes: Vec<u8>,
}

impl ConversionResult {
    /// The encoded image.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The exact length of the encoded image in bytes.
    pub fn byte_length(&self) -> usize {
        self.bytes.len()
    }

    /// The media type of the image.
    pub fn content_type(&self) -> &'static str {
        CONTENT_TYPE
    }

    /// Consume the result, returning the encoded image.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}
