/*!
An HTTP service converting SVG documents into PNG images.

The service exposes a single endpoint that accepts `POST` requests carrying an SVG
document, either as `multipart/form-data` or as a URL-encoded form, and answers with
the rendered PNG image. The actual conversion is done by the [`svg2png`] crate; this
crate only adds configuration, the HTTP transport and a pool of worker threads.

## Safety
This crate forbids unsafe code via a crate-level attribute.
*/

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod config;
mod server;
mod service;

pub use config::Config;
pub use server::{BindError, Server, ShutdownHandle};
pub use service::Service;
