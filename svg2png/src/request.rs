//! Decoded conversion requests.

use core::num::NonZeroU32;

use crate::error::{DecodeError, Field};

/// A request to rasterize one SVG document.
///
/// A request is either in diagnostic mode, in which case it always renders at the
/// intrinsic size of the document, or carries explicit dimension hints. The two
/// constructors keep those modes apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    svg: String,
    diagnostic: Option<String>,
    width: u32,
    height: u32,
}

impl ConversionRequest {
    /// Create a request with explicit dimension hints, where `0` means "no
    /// constraint" for the respective axis.
    pub fn new(svg: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            svg: svg.into(),
            diagnostic: None,
            width,
            height,
        }
    }

    /// Create a diagnostic request. Both dimension hints are `0`.
    ///
    /// An empty flag does not activate diagnostic mode.
    pub fn diagnostic(svg: impl Into<String>, flag: impl Into<String>) -> Self {
        let flag = flag.into();

        Self {
            svg: svg.into(),
            diagnostic: (!flag.is_empty()).then_some(flag),
            width: 0,
            height: 0,
        }
    }

    /// The SVG document.
    pub fn svg(&self) -> &str {
        &self.svg
    }

    /// The diagnostic flag, if diagnostic mode is active.
    pub fn diagnostic_flag(&self) -> Option<&str> {
        self.diagnostic.as_deref()
    }

    /// The requested width in pixels, or `0` for the intrinsic width.
    pub fn width_hint(&self) -> u32 {
        self.width
    }

    /// The requested height in pixels, or `0` for the intrinsic height.
    pub fn height_hint(&self) -> u32 {
        self.height
    }

    /// The dimension hints as constraints for a renderer.
    pub fn size_hints(&self) -> SizeHints {
        SizeHints::new(self.width, self.height)
    }
}

/// Optional per-axis size constraints for a render.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SizeHints {
    /// The output width, if constrained.
    pub width: Option<NonZeroU32>,
    /// The output height, if constrained.
    pub height: Option<NonZeroU32>,
}

impl SizeHints {
    /// Build size hints from raw dimensions, treating `0` as unconstrained.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: NonZeroU32::new(width),
            height: NonZeroU32::new(height),
        }
    }
}

/// How a decoder treats absent dimension fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sizing {
    /// An absent `w` or `h` means "no constraint".
    Lenient,
    /// An absent `w` or `h` is an error unless diagnostic mode is active.
    Strict,
}

/// The raw textual field values found in a request.
///
/// Only the first value of each field is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields {
    svg: Option<String>,
    test: Option<String>,
    width: Option<String>,
    height: Option<String>,
}

impl Fields {
    fn slot(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::Svg => &mut self.svg,
            Field::Test => &mut self.test,
            Field::Width => &mut self.width,
            Field::Height => &mut self.height,
        }
    }

    /// Record a value for `field`, unless one was recorded before.
    pub fn insert(&mut self, field: Field, value: String) {
        self.slot(field).get_or_insert(value);
    }

    /// Return the value recorded for `field`.
    pub fn get(&self, field: Field) -> Option<&str> {
        match field {
            Field::Svg => self.svg.as_deref(),
            Field::Test => self.test.as_deref(),
            Field::Width => self.width.as_deref(),
            Field::Height => self.height.as_deref(),
        }
    }

    /// Turn the raw values into a request.
    ///
    /// A non-empty `test` field takes precedence over `w` and `h`, which are
    /// not even looked at in that case.
    pub fn resolve(self, sizing: Sizing) -> Result<ConversionRequest, DecodeError> {
        let svg = self.svg.ok_or(DecodeError::MissingField(Field::Svg))?;

        if let Some(flag) = self.test.filter(|flag| !flag.is_empty()) {
            return Ok(ConversionRequest::diagnostic(svg, flag));
        }

        let width = parse_dimension(Field::Width, self.width, sizing)?;
        let height = parse_dimension(Field::Height, self.height, sizing)?;

        Ok(ConversionRequest::new(svg, width, height))
    }
}

fn parse_dimension(
    field: Field,
    value: Option<String>,
    sizing: Sizing,
) -> Result<u32, DecodeError> {
    match (value, sizing) {
        (Some(value), _) => value
            .parse::<u32>()
            .map_err(|_| DecodeError::InvalidDimension { field, value }),
        (None, Sizing::Lenient) => Ok(0),
        (None, Sizing::Strict) => Err(DecodeError::MissingField(field)),
    }
}
