//! Extracting conversion requests from form-encoded and multipart bodies.
//!
//! Both encodings carry the same logical fields (`svg`, `test`, `w` and `h`), but
//! differ in how they are framed and in whether absent dimensions are tolerated.
//! Each encoding is handled by its own [`Decoder`], and [`RequestDecoder`] picks
//! the right one based on the content type of the request.

use std::io::Read;

use log::debug;

use crate::error::DecodeError;
use crate::request::{ConversionRequest, Fields, Sizing};

mod form;
mod multipart;

pub use form::FormDecoder;
pub use multipart::MultipartDecoder;

const MULTIPART_FORM_DATA: &str = "multipart/form-data";

/// Settings to apply while decoding a request.
#[derive(Debug, Clone, Copy)]
pub struct DecodeSettings {
    /// The largest request body, in bytes, that will be read.
    pub max_body_size: usize,
}

impl Default for DecodeSettings {
    fn default() -> Self {
        Self {
            max_body_size: 32 * 1024 * 1024,
        }
    }
}

/// A transport-independent view of an inbound request.
pub struct RawRequest<'a> {
    content_type: Option<&'a str>,
    query: Option<&'a str>,
    content_length: Option<usize>,
    body: &'a mut dyn Read,
}

impl<'a> RawRequest<'a> {
    /// Create a new request reading its body from `body`.
    pub fn new(body: &'a mut dyn Read) -> Self {
        Self {
            content_type: None,
            query: None,
            content_length: None,
            body,
        }
    }

    /// Set the value of the `Content-Type` header.
    pub fn with_content_type(mut self, content_type: Option<&'a str>) -> Self {
        self.content_type = content_type;
        self
    }

    /// Set the query string of the request URL, without the leading `?`.
    pub fn with_query(mut self, query: Option<&'a str>) -> Self {
        self.query = query;
        self
    }

    /// Set the declared length of the body.
    pub fn with_content_length(mut self, content_length: Option<usize>) -> Self {
        self.content_length = content_length;
        self
    }

    /// The value of the `Content-Type` header.
    pub fn content_type(&self) -> Option<&'a str> {
        self.content_type
    }

    /// The query string of the request URL.
    pub fn query(&self) -> Option<&'a str> {
        self.query
    }

    /// Read the whole body, honoring the declared length and the size limit.
    pub fn read_body(&mut self, settings: &DecodeSettings) -> Result<Vec<u8>, DecodeError> {
        let limit = settings.max_body_size;

        match self.content_length {
            Some(len) if len > limit => Err(DecodeError::BodyTooLarge { limit }),
            Some(len) => read_declared(&mut self.body, len),
            None => {
                let mut body = Vec::new();
                (&mut self.body)
                    .take(limit as u64 + 1)
                    .read_to_end(&mut body)?;

                if body.len() > limit {
                    return Err(DecodeError::BodyTooLarge { limit });
                }

                Ok(body)
            }
        }
    }
}

/// Read exactly `len` bytes from `source`.
///
/// A single call to [`Read::read`] may return fewer bytes than requested, so this
/// keeps reading until the declared length has been consumed. If the source runs
/// dry before that, a [`DecodeError::Truncated`] is returned instead of the
/// partial data.
pub fn read_declared<R: Read + ?Sized>(source: &mut R, len: usize) -> Result<Vec<u8>, DecodeError> {
    let mut buf = vec![0; len];
    let mut filled = 0;

    while filled < len {
        match source.read(&mut buf[filled..]) {
            Ok(0) => {
                return Err(DecodeError::Truncated {
                    expected: len,
                    actual: filled,
                });
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }

    Ok(buf)
}

/// A strategy for extracting the request fields from one body encoding.
pub trait Decoder {
    /// How absent dimension fields are treated by this encoding.
    fn sizing(&self) -> Sizing;

    /// Extract the raw field values from the request.
    fn fields(
        &self,
        request: &mut RawRequest<'_>,
        settings: &DecodeSettings,
    ) -> Result<Fields, DecodeError>;

    /// Decode the request into a [`ConversionRequest`].
    fn decode(
        &self,
        request: &mut RawRequest<'_>,
        settings: &DecodeSettings,
    ) -> Result<ConversionRequest, DecodeError> {
        self.fields(request, settings)?.resolve(self.sizing())
    }
}

/// The decoder matching the encoding of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestDecoder {
    /// A `multipart/form-data` body.
    Multipart(MultipartDecoder),
    /// A URL-encoded form, in the body and/or the query string.
    Form(FormDecoder),
}

impl RequestDecoder {
    /// Pick the decoder for the given `Content-Type` header value.
    ///
    /// Anything that is not `multipart/form-data` is treated as a URL-encoded form,
    /// including a missing header.
    pub fn for_content_type(content_type: Option<&str>) -> Result<Self, DecodeError> {
        match content_type {
            Some(content_type) if is_multipart(content_type) => {
                MultipartDecoder::from_content_type(content_type).map(Self::Multipart)
            }
            _ => Ok(Self::Form(FormDecoder)),
        }
    }
}

impl Decoder for RequestDecoder {
    fn sizing(&self) -> Sizing {
        match self {
            Self::Multipart(d) => d.sizing(),
            Self::Form(d) => d.sizing(),
        }
    }

    fn fields(
        &self,
        request: &mut RawRequest<'_>,
        settings: &DecodeSettings,
    ) -> Result<Fields, DecodeError> {
        match self {
            Self::Multipart(d) => d.fields(request, settings),
            Self::Form(d) => d.fields(request, settings),
        }
    }
}

/// Decode a request, choosing the decoder from its content type.
pub fn decode(
    request: &mut RawRequest<'_>,
    settings: &DecodeSettings,
) -> Result<ConversionRequest, DecodeError> {
    let decoder = RequestDecoder::for_content_type(request.content_type())?;
    let request = decoder.decode(request, settings)?;

    debug!(
        "decoded request: {} bytes of SVG, hints {}x{}, diagnostic: {}",
        request.svg().len(),
        request.width_hint(),
        request.height_hint(),
        request.diagnostic_flag().is_some()
    );

    Ok(request)
}

fn is_multipart(content_type: &str) -> bool {
    content_type
        .get(..MULTIPART_FORM_DATA.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(MULTIPART_FORM_DATA))
}

/// Split a header value like `form-data; name="svg"; filename="a;b.svg"` into its
/// `key=value` parameters. Quotes around values are removed; the leading token
/// without a `=` is skipped.
pub(crate) fn header_params(value: &str) -> impl Iterator<Item = (&str, &str)> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut quoted = false;

    for (i, c) in value.char_indices() {
        match c {
            '"' => quoted = !quoted,
            ';' if !quoted => {
                segments.push(&value[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    segments.push(&value[start..]);

    segments.into_iter().filter_map(|segment| {
        let (key, value) = segment.split_once('=')?;
        let value = value.trim();
        let value = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .unwrap_or(value);

        Some((key.trim(), value))
    })
}
