//! Error types for decoding and converting requests.

use core::fmt;
use std::io;

use resvg::usvg;

/// A specialized [`Result`] type for conversions.
pub type Result<T> = core::result::Result<T, Error>;

/// One of the logical fields of a conversion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// The SVG document itself.
    Svg,
    /// The diagnostic flag.
    Test,
    /// The requested output width.
    Width,
    /// The requested output height.
    Height,
}

impl Field {
    /// The name of the field as it appears in a form or a multipart part.
    pub fn name(self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Test => "test",
            Self::Width => "w",
            Self::Height => "h",
        }
    }

    pub(crate) fn from_name(name: &str) -> Option<Self> {
        match name {
            "svg" => Some(Self::Svg),
            "test" => Some(Self::Test),
            "w" => Some(Self::Width),
            "h" => Some(Self::Height),
            _ => None,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An error encountered while turning an inbound request into a
/// [`ConversionRequest`](crate::ConversionRequest).
#[derive(Debug)]
pub enum DecodeError {
    /// A required field was not supplied.
    MissingField(Field),
    /// A dimension field was supplied but is not a non-negative integer.
    InvalidDimension {
        /// The offending field.
        field: Field,
        /// The text that failed to parse.
        value: String,
    },
    /// A multipart field was not valid UTF-8.
    InvalidUtf8(Field),
    /// The byte source ended before the declared length was consumed.
    Truncated {
        /// The number of bytes that were announced.
        expected: usize,
        /// The number of bytes that could actually be read.
        actual: usize,
    },
    /// The request body exceeds the configured limit.
    BodyTooLarge {
        /// The limit in bytes.
        limit: usize,
    },
    /// The multipart body could not be split into parts.
    MalformedMultipart(&'static str),
    /// Reading the request body failed.
    Io(io::Error),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "missing field `{field}`"),
            Self::InvalidDimension { field, value } => {
                write!(f, "field `{field}` is not a valid dimension: {value:?}")
            }
            Self::InvalidUtf8(field) => write!(f, "field `{field}` is not valid UTF-8"),
            Self::Truncated { expected, actual } => {
                write!(f, "body truncated: expected {expected} bytes, got {actual}")
            }
            Self::BodyTooLarge { limit } => {
                write!(f, "request body exceeds the limit of {limit} bytes")
            }
            Self::MalformedMultipart(reason) => write!(f, "malformed multipart body: {reason}"),
            Self::Io(err) => write!(f, "failed to read request body: {err}"),
        }
    }
}

impl core::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for DecodeError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

/// An error produced while rasterizing an SVG document.
#[derive(Debug)]
pub enum RenderError {
    /// The document could not be parsed.
    Parse(usvg::Error),
    /// The resulting image would have no pixels.
    InvalidSize {
        /// Output width in pixels.
        width: u32,
        /// Output height in pixels.
        height: u32,
    },
    /// The resulting image exceeds the configured edge limit.
    TooLarge {
        /// Output width in pixels.
        width: u32,
        /// Output height in pixels.
        height: u32,
        /// The largest allowed edge.
        limit: u32,
    },
    /// The rendered pixmap could not be encoded as PNG.
    Encode(image::ImageError),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "failed to parse SVG: {err}"),
            Self::InvalidSize { width, height } => {
                write!(f, "invalid output size {width}x{height}")
            }
            Self::TooLarge {
                width,
                height,
                limit,
            } => write!(
                f,
                "output size {width}x{height} exceeds the limit of {limit} pixels per edge"
            ),
            Self::Encode(err) => write!(f, "failed to encode PNG: {err}"),
        }
    }
}

impl core::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::Encode(err) => Some(err),
            _ => None,
        }
    }
}

/// Any error that can occur between receiving a request and producing an image.
#[derive(Debug)]
pub enum Error {
    /// The request could not be decoded.
    Decode(DecodeError),
    /// The document could not be rendered.
    Render(RenderError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode(err) => err.fmt(f),
            Self::Render(err) => err.fmt(f),
        }
    }
}

impl core::error::Error for Error {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Decode(err) => Some(err),
            Self::Render(err) => Some(err),
        }
    }
}

impl From<DecodeError> for Error {
    fn from(err: DecodeError) -> Self {
        Self::Decode(err)
    }
}

impl From<RenderError> for Error {
    fn from(err: RenderError) -> Self {
        Self::Render(err)
    }
}
