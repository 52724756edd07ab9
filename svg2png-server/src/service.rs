//! Handling individual HTTP requests.

use std::io::Cursor;
use std::time::Instant;

use log::{error, info, warn};
use svg2png::{
    ConversionResult, DecodeError, DecodeSettings, Error, Pipeline, RawRequest, ResvgRenderer,
    decode,
};
use tiny_http::{Header, Method, Request, Response, StatusCode};

/// The conversion endpoint.
#[derive(Debug)]
pub struct Service {
    pipeline: Pipeline<ResvgRenderer>,
    decode: DecodeSettings,
    path: String,
}

impl Service {
    /// Create a new service mounted at `path`.
    pub fn new(pipeline: Pipeline<ResvgRenderer>, decode: DecodeSettings, path: String) -> Self {
        Self {
            pipeline,
            decode,
            path,
        }
    }

    /// Answer a single request.
    pub fn handle(&self, mut request: Request) {
        let start = Instant::now();
        let method = request.method().clone();
        let url = request.url().to_string();
        let (path, query) = match url.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (url.as_str(), None),
        };

        let reply = if path != self.path {
            Reply::error(404, "not found")
        } else if method != Method::Post {
            Reply::error(405, "only POST is supported").with_header("Allow", "POST")
        } else {
            self.convert(&mut request, query)
        };

        let status = reply.status;
        let length = reply.body.len();

        if let Err(err) = request.respond(reply.into_response()) {
            warn!("failed to send response: {err}");
        }

        info!(
            "{method} {path} -> {status} ({length} bytes, {:.1?})",
            start.elapsed()
        );
    }

    fn convert(&self, request: &mut Request, query: Option<&str>) -> Reply {
        match self.run(request, query) {
            Ok(result) => Reply::image(result),
            Err(err @ Error::Decode(_)) => {
                warn!("rejecting request: {err}");
                Reply::error(error_status(&err), &err.to_string())
            }
            Err(err) => {
                error!("conversion failed: {err}");
                Reply::error(error_status(&err), &err.to_string())
            }
        }
    }

    fn run(
        &self,
        request: &mut Request,
        query: Option<&str>,
    ) -> svg2png::Result<ConversionResult> {
        let content_type = request
            .headers()
            .iter()
            .find(|header| header.field.equiv("Content-Type"))
            .map(|header| header.value.as_str().to_string());
        let content_length = request.body_length();

        let mut raw = RawRequest::new(request.as_reader())
            .with_content_type(content_type.as_deref())
            .with_query(query)
            .with_content_length(content_length);

        let conversion = decode(&mut raw, &self.decode)?;

        Ok(self.pipeline.convert(conversion)?)
    }
}

/// The status code answering a request that failed with `err`.
pub(crate) fn error_status(err: &Error) -> u16 {
    match err {
        Error::Decode(DecodeError::BodyTooLarge { .. }) => 413,
        Error::Decode(_) => 400,
        Error::Render(_) => 500,
    }
}

struct Reply {
    status: u16,
    headers: Vec<Header>,
    body: Vec<u8>,
}

impl Reply {
    fn image(result: ConversionResult) -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body: Vec::new(),
        }
        .with_header("Content-Type", result.content_type())
        .with_body(result.into_bytes())
    }

    fn error(status: u16, message: &str) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
        .with_header("Content-Type", "text/plain; charset=utf-8")
        .with_body(format!("{message}\n").into_bytes())
    }

    fn with_header(mut self, field: &str, value: &str) -> Self {
        match Header::from_bytes(field.as_bytes(), value.as_bytes()) {
            Ok(header) => self.headers.push(header),
            Err(()) => warn!("dropping invalid header {field}"),
        }

        self
    }

    fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    fn into_response(self) -> Response<Cursor<Vec<u8>>> {
        // The declared length is taken from the buffer that is sent.
        let length = self.body.len();

        Response::new(
            StatusCode(self.status),
            self.headers,
            Cursor::new(self.body),
            Some(length),
            None,
        )
    }
}
