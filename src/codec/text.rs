use bytes::Bytes;

use super::{Codec, CodecError};
use crate::types::mime;

/// Passes UTF-8 bodies through as `String`, unparsed.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextCodec;

impl Codec<String> for TextCodec {
    fn content_type(&self) -> &str {
        mime::TEXT_PLAIN
    }

    fn encode(&self, value: &String) -> Result<Bytes, CodecError> {
        Ok(Bytes::copy_from_slice(value.as_bytes()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<String, CodecError> {
        String::from_utf8(bytes.to_vec())
            .map_err(|e| CodecError::decode(format!("body is not valid UTF-8: {}", e)))
    }
}

/// For endpoints whose payload is irrelevant; decoding ignores the body.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyCodec;

impl Codec<()> for EmptyCodec {
    fn encode(&self, _value: &()) -> Result<Bytes, CodecError> {
        Ok(Bytes::new())
    }

    fn decode(&self, _bytes: &[u8]) -> Result<(), CodecError> {
        Ok(())
    }
}
