//! Decoding `multipart/form-data` bodies.

use log::{trace, warn};

use super::{DecodeSettings, Decoder, RawRequest, header_params};
use crate::error::{DecodeError, Field};
use crate::reader::{Reader, is_padding};
use crate::request::{Fields, Sizing};

/// Decodes `multipart/form-data` bodies.
///
/// Each field is carried in a part of the same name. Absent `test`, `w` and `h`
/// parts are tolerated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartDecoder {
    boundary: String,
}

impl MultipartDecoder {
    /// Create a decoder for parts separated by `boundary`.
    pub fn new(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
        }
    }

    /// Create a decoder from the `boundary` parameter of a `Content-Type` value.
    pub fn from_content_type(content_type: &str) -> Result<Self, DecodeError> {
        header_params(content_type)
            .find(|(key, _)| key.eq_ignore_ascii_case("boundary"))
            .map(|(_, boundary)| boundary)
            .filter(|boundary| !boundary.is_empty())
            .map(Self::new)
            .ok_or(DecodeError::MalformedMultipart("missing boundary"))
    }

}

impl Decoder for MultipartDecoder {
    fn sizing(&self) -> Sizing {
        Sizing::Lenient
    }

    fn fields(
        &self,
        request: &mut RawRequest<'_>,
        settings: &DecodeSettings,
    ) -> Result<Fields, DecodeError> {
        let body = request.read_body(settings)?;
        let mut fields = Fields::default();

        for part in parse(&body, self.boundary.as_bytes())? {
            let Some(field) = part.name.and_then(Field::from_name) else {
                trace!("skipping multipart part {:?}", part.name);
                continue;
            };

            let actual = part.body.len();
            match part.content_length {
                Some(expected) if expected > actual => {
                    return Err(DecodeError::Truncated { expected, actual });
                }
                Some(expected) if expected < actual => {
                    return Err(DecodeError::MalformedMultipart("part length mismatch"));
                }
                _ => {}
            }

            let text = String::from_utf8(part.body.to_vec())
                .map_err(|_| DecodeError::InvalidUtf8(field))?;

            fields.insert(field, text);
        }

        Ok(fields)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Part<'a> {
    name: Option<&'a str>,
    content_length: Option<usize>,
    body: &'a [u8],
}

fn parse<'a>(data: &'a [u8], boundary: &[u8]) -> Result<Vec<Part<'a>>, DecodeError> {
    let mut delimiter = b"--".to_vec();
    delimiter.extend_from_slice(boundary);

    let mut close = b"\r\n".to_vec();
    close.extend_from_slice(&delimiter);

    let mut r = Reader::new(data);

    // Anything before the first delimiter is preamble.
    r.read_until(&delimiter)
        .ok_or(DecodeError::MalformedMultipart("missing opening boundary"))?;
    r.forward_tag(&delimiter)
        .ok_or(DecodeError::MalformedMultipart("missing opening boundary"))?;

    let mut parts = Vec::new();

    loop {
        if r.forward_tag(b"--").is_some() {
            return Ok(parts);
        }

        r.forward_while(is_padding);
        r.eol()
            .ok_or(DecodeError::MalformedMultipart("garbage after boundary"))?;

        let mut part = read_headers(&mut r)?;

        // A part may directly follow its headers with the closing delimiter, in which
        // case the line break before the delimiter doubles as the one ending the headers.
        let body: &[u8] = if r.peek_tag(&delimiter).is_some() {
            &[]
        } else {
            r.read_until(&close)
                .ok_or(DecodeError::MalformedMultipart("unterminated part"))?
        };

        r.forward_tag(b"\r\n");
        r.forward_tag(&delimiter)
            .ok_or(DecodeError::MalformedMultipart("unterminated part"))?;

        part.body = body;
        parts.push(part);
    }
}

fn read_headers<'a>(r: &mut Reader<'a>) -> Result<Part<'a>, DecodeError> {
    let mut part = Part {
        name: None,
        content_length: None,
        body: &[],
    };

    loop {
        let line = r
            .read_line()
            .ok_or(DecodeError::MalformedMultipart("unterminated part headers"))?;

        if line.is_empty() {
            return Ok(part);
        }

        let Some((name, value)) = core::str::from_utf8(line)
            .ok()
            .and_then(|line| line.split_once(':'))
        else {
            warn!("ignoring malformed multipart header");
            continue;
        };

        let value = value.trim();

        if name.eq_ignore_ascii_case("content-disposition") {
            part.name = header_params(value)
                .find(|(key, _)| key.eq_ignore_ascii_case("name"))
                .map(|(_, name)| name);
        } else if name.eq_ignore_ascii_case("content-length") {
            part.content_length = Some(
                value
                    .parse()
                    .map_err(|_| DecodeError::MalformedMultipart("invalid part length"))?,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::decode;
    use crate::decode::tests::Trickle;

    const BOUNDARY: &str = "----svg2pngBoundary7MA4YWxkTrZu0gW";

    fn body(parts: &[(&str, &str)]) -> Vec<u8> {
        let mut out = Vec::new();
        for (name, value) in parts {
            out.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            out.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
            );
            out.extend_from_slice(value.as_bytes());
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        out
    }

    fn content_type() -> String {
        format!("multipart/form-data; boundary={BOUNDARY}")
    }

    fn fields_of(data: &[u8]) -> Result<Fields, DecodeError> {
        let mut source = data;
        let mut request = RawRequest::new(&mut source)
            .with_content_length(Some(data.len()))
            .with_content_type(Some("multipart/form-data"));

        MultipartDecoder::new(BOUNDARY).fields(&mut request, &DecodeSettings::default())
    }

    #[test]
    fn boundary_from_content_type() {
        let decoder =
            MultipartDecoder::from_content_type("multipart/form-data; boundary=\"a b\"").unwrap();
        assert_eq!(decoder.boundary, "a b");

        assert!(MultipartDecoder::from_content_type("multipart/form-data; boundary=").is_err());
    }

    #[test]
    fn all_fields() {
        let data = body(&[("svg", "<svg/>"), ("test", "yes"), ("w", "1"), ("h", "2")]);
        let fields = fields_of(&data).unwrap();

        assert_eq!(fields.get(Field::Svg), Some("<svg/>"));
        assert_eq!(fields.get(Field::Test), Some("yes"));
        assert_eq!(fields.get(Field::Width), Some("1"));
        assert_eq!(fields.get(Field::Height), Some("2"));
    }

    #[test]
    fn absent_parts_are_tolerated() {
        let data = body(&[("svg", "<svg/>"), ("other", "ignored")]);
        let mut source = &data[..];
        let ct = content_type();
        let mut request = RawRequest::new(&mut source).with_content_type(Some(&ct));

        let request = decode(&mut request, &DecodeSettings::default()).unwrap();
        assert_eq!((request.width_hint(), request.height_hint()), (0, 0));
        assert_eq!(request.diagnostic_flag(), None);
    }

    #[test]
    fn missing_svg_part() {
        let data = body(&[("w", "10"), ("h", "10")]);
        let mut source = &data[..];
        let ct = content_type();
        let mut request = RawRequest::new(&mut source).with_content_type(Some(&ct));

        assert!(matches!(
            decode(&mut request, &DecodeSettings::default()),
            Err(DecodeError::MissingField(Field::Svg))
        ));
    }

    #[test]
    fn invalid_dimension_part() {
        let data = body(&[("svg", "<svg/>"), ("w", "abc")]);
        let mut source = &data[..];
        let ct = content_type();
        let mut request = RawRequest::new(&mut source).with_content_type(Some(&ct));

        assert!(matches!(
            decode(&mut request, &DecodeSettings::default()),
            Err(DecodeError::InvalidDimension {
                field: Field::Width,
                ..
            })
        ));
    }

    #[test]
    fn large_svg_survives_short_reads() {
        let mut svg = String::from("<svg xmlns=\"http://www.w3.org/2000/svg\">");
        while svg.len() < 64 * 1024 {
            svg.push_str("<rect width=\"1\" height=\"1\" fill=\"#ff00aa\"/>\u{1F600}\r\n");
        }
        svg.push_str("</svg>");

        let data = body(&[("svg", &svg), ("w", "5"), ("h", "5")]);
        let mut source = Trickle(&data);
        let ct = content_type();
        let mut request = RawRequest::new(&mut source)
            .with_content_type(Some(&ct))
            .with_content_length(Some(data.len()));

        let request = decode(&mut request, &DecodeSettings::default()).unwrap();
        assert_eq!(request.svg(), svg);
    }

    #[test]
    fn short_body_is_an_error() {
        let data = body(&[("svg", "<svg/>")]);
        let mut source = Trickle(&data);
        let ct = content_type();
        let mut request = RawRequest::new(&mut source)
            .with_content_type(Some(&ct))
            .with_content_length(Some(data.len() + 10));

        assert!(matches!(
            decode(&mut request, &DecodeSettings::default()),
            Err(DecodeError::Truncated { .. })
        ));
    }

    #[test]
    fn part_content_length() {
        let data = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"svg\"\r\nContent-Length: 6\r\n\r\n<svg/>\r\n--{BOUNDARY}--"
        );
        let fields = fields_of(data.as_bytes()).unwrap();
        assert_eq!(fields.get(Field::Svg), Some("<svg/>"));

        let data = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"svg\"\r\nContent-Length: 60\r\n\r\n<svg/>\r\n--{BOUNDARY}--"
        );
        assert!(matches!(
            fields_of(data.as_bytes()),
            Err(DecodeError::Truncated {
                expected: 60,
                actual: 6
            })
        ));
    }

    #[test]
    fn part_content_length_shorter_than_body() {
        let data = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"svg\"\r\nContent-Length: 3\r\n\r\n<svg/>\r\n--{BOUNDARY}--"
        );

        assert!(matches!(
            fields_of(data.as_bytes()),
            Err(DecodeError::MalformedMultipart("part length mismatch"))
        ));
    }

    #[test]
    fn preamble_and_empty_part() {
        let data = format!(
            "this is a preamble\r\n--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"test\"\r\n\r\n\r\n--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"svg\"\r\n\r\n<svg/>\r\n--{BOUNDARY}--"
        );
        let fields = fields_of(data.as_bytes()).unwrap();
        assert_eq!(fields.get(Field::Test), Some(""));
        assert_eq!(fields.get(Field::Svg), Some("<svg/>"));
    }

    #[test]
    fn invalid_utf8() {
        let mut data = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"svg\"\r\n\r\n"
        )
        .into_bytes();
        data.extend_from_slice(&[0xff, 0xfe]);
        data.extend_from_slice(format!("\r\n--{BOUNDARY}--").as_bytes());

        assert!(matches!(
            fields_of(&data),
            Err(DecodeError::InvalidUtf8(Field::Svg))
        ));
    }

    #[test]
    fn malformed() {
        assert!(matches!(
            fields_of(b"no boundary here"),
            Err(DecodeError::MalformedMultipart(_))
        ));

        let data = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"svg\"\r\n\r\n<svg/>"
        );
        assert!(matches!(
            fields_of(data.as_bytes()),
            Err(DecodeError::MalformedMultipart(_))
        ));
    }
}
