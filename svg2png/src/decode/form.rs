//! Decoding URL-encoded forms.

use url::form_urlencoded;

use super::{DecodeSettings, Decoder, RawRequest};
use crate::error::{DecodeError, Field};
use crate::request::{Fields, Sizing};

/// Decodes `application/x-www-form-urlencoded` forms.
///
/// Fields are looked up in the query string first and in the body second. Unless
/// the `test` field is set, both `w` and `h` must be present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormDecoder;

impl Decoder for FormDecoder {
    fn sizing(&self) -> Sizing {
        Sizing::Strict
    }

    fn fields(
        &self,
        request: &mut RawRequest<'_>,
        settings: &DecodeSettings,
    ) -> Result<Fields, DecodeError> {
        let body = request.read_body(settings)?;
        let mut fields = Fields::default();

        if let Some(query) = request.query() {
            collect(query.as_bytes(), &mut fields);
        }

        collect(&body, &mut fields);

        Ok(fields)
    }
}

fn collect(data: &[u8], fields: &mut Fields) {
    for (name, value) in form_urlencoded::parse(data) {
        if let Some(field) = Field::from_name(&name) {
            fields.insert(field, value.into_owned());
        }
    }
}
