use bytes::Bytes;
use url::form_urlencoded;

use super::{Codec, CodecError};
use crate::types::mime;

/// Ordered `application/x-www-form-urlencoded` fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormBody {
    fields: Vec<(String, String)>,
}

impl FormBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.fields.push((name.into(), value.to_string()));
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Parse urlencoded bytes, keeping field order.
    pub fn parse(bytes: &[u8]) -> Self {
        Self {
            fields: form_urlencoded::parse(bytes).into_owned().collect(),
        }
    }
}

/// Codec for [`FormBody`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FormCodec;

impl Codec<FormBody> for FormCodec {
    fn content_type(&self) -> &str {
        mime::APPLICATION_FORM_URL_ENCODED
    }

    fn encode(&self, value: &FormBody) -> Result<Bytes, CodecError> {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (k, v) in value.iter() {
            serializer.append_pair(k, v);
        }
        Ok(Bytes::from(serializer.finish()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<FormBody, CodecError> {
        Ok(FormBody::parse(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_keeps_order_and_escapes() {
        let form = FormBody::new().field("q", "a b&c").field("page", 2);
        let bytes = FormCodec.encode(&form).unwrap();
        assert_eq!(&bytes[..], b"q=a+b%26c&page=2");
        assert_eq!(FormCodec.decode(&bytes).unwrap(), form);
        assert_eq!(form.get("page"), Some("2"));
    }
}
