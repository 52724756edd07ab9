/*!
A crate for converting SVG documents into PNG images on behalf of HTTP clients.

The crate covers everything between the raw bytes of an inbound request and the
encoded image that is sent back, but leaves the actual HTTP handling to its caller.
A conversion happens in two steps:

1. A request body, either `multipart/form-data` or a URL-encoded form, is decoded
   into a [`ConversionRequest`]. This is where the `svg`, `test`, `w` and `h` fields
   are extracted and the output dimensions are resolved. See [`decode`].
2. A [`Pipeline`] hands the request to a [`Renderer`] and captures the resulting
   PNG bytes in a [`ConversionResult`], whose length is known before anything is
   written out.

The renderer shipped with this crate, [`ResvgRenderer`], is based on `resvg`. Text
in SVG documents is laid out with the fonts of a [`FontCatalog`], which is built
once at startup and never changes afterwards.

## Example
```no_run
use svg2png::{DecodeSettings, FontCatalog, FontSettings, Pipeline, RawRequest};
use svg2png::{RenderSettings, ResvgRenderer, decode};

let fonts = FontCatalog::init(&FontSettings::default());
let pipeline = Pipeline::new(ResvgRenderer::new(fonts, RenderSettings::default()));

let mut body = &b"svg=%3Csvg%20xmlns%3D%22http%3A%2F%2Fwww.w3.org%2F2000%2Fsvg%22%20width%3D%2210%22%20height%3D%2210%22%2F%3E&w=20&h=20"[..];
let mut raw = RawRequest::new(&mut body)
    .with_content_type(Some("application/x-www-form-urlencoded"));

let request = decode(&mut raw, &DecodeSettings::default()).unwrap();
let result = pipeline.convert(request).unwrap();
std::fs::write("out.png", result.bytes()).unwrap();
```

## Safety
This crate forbids unsafe code via a crate-level attribute.
*/

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod decode;
mod error;
mod font;
mod pipeline;
mod reader;
mod render;
mod request;

pub use decode::{
    DecodeSettings, Decoder, FormDecoder, MultipartDecoder, RawRequest, RequestDecoder, decode,
    read_declared,
};
pub use error::{DecodeError, Error, Field, RenderError, Result};
pub use font::{DEFAULT_FONT_FILE, FontCatalog, FontLoadWarning, FontSettings};
pub use pipeline::{CONTENT_TYPE, ConversionResult, Pipeline};
pub use render::{RenderSettings, Renderer, ResvgRenderer};
pub use request::{ConversionRequest, Fields, SizeHints, Sizing};
