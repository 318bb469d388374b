//! JSON codec.
//!
//! Encoding goes through a `serde_json::Value` tree first. Its object map is
//! key-sorted, so output bytes do not depend on struct declaration order or on
//! `HashMap` iteration order.

use bytes::Bytes;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;

use super::{Codec, CodecError};

static MISSING_FIELD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"missing field `([^`]+)`").expect("static regex"));

pub struct JsonCodec<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonCodec<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for JsonCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for JsonCodec<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> Codec<T> for JsonCodec<T>
where
    T: Serialize + DeserializeOwned,
{
    fn encode(&self, value: &T) -> Result<Bytes, CodecError> {
        let tree = serde_json::to_value(value).map_err(|e| CodecError::encode(e.to_string()))?;
        let bytes = serde_json::to_vec(&tree).map_err(|e| CodecError::encode(e.to_string()))?;
        Ok(Bytes::from(bytes))
    }

    fn decode(&self, bytes: &[u8]) -> Result<T, CodecError> {
        serde_json::from_slice(bytes).map_err(from_serde)
    }
}

pub(crate) fn from_serde(err: serde_json::Error) -> CodecError {
    let message = err.to_string();
    let field = MISSING_FIELD
        .captures(&message)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string());
    CodecError::Decode { field, message }
}
