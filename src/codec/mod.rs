//! Body codecs: bidirectional conversion between typed values and wire bytes.
//!
//! A [`Codec<T>`] handles exactly one logical type. Codecs are collected in a
//! [`CodecRegistry`] keyed by [`TypeKey`], which endpoints reference for their body,
//! success and error types. Registries are frozen once the client is built and are
//! shared by every in-flight call without locking.
//!
//! ## Submodules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`form`] | Urlencoded form bodies |
//! | [`json`] | Deterministic JSON codec over `serde` |
//! | [`text`] | Plain-text passthrough and empty-body codecs |
//! | [`registry`] | Type-keyed codec registry |

pub mod form;
pub mod json;
pub mod registry;
pub mod text;

pub use form::{FormBody, FormCodec};
pub use json::JsonCodec;
pub use registry::CodecRegistry;
pub use text::{EmptyCodec, TextCodec};

use bytes::Bytes;
use std::any::{type_name, TypeId};
use std::fmt;
use thiserror::Error;

/// Failure inside a codec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("encode failed: {message}")]
    Encode { message: String },

    #[error("decode failed: {message}")]
    Decode {
        /// Offending field when the codec can name it (missing required field).
        field: Option<String>,
        message: String,
    },
}

impl CodecError {
    pub fn encode(message: impl Into<String>) -> Self {
        CodecError::Encode {
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        CodecError::Decode {
            field: None,
            message: message.into(),
        }
    }

    pub fn field(&self) -> Option<&str> {
        match self {
            CodecError::Decode { field, .. } => field.as_deref(),
            CodecError::Encode { .. } => None,
        }
    }
}

/// Encoder/decoder for one logical type.
///
/// Implementations must be free of side effects and deterministic: encoding the
/// same value twice yields identical bytes.
pub trait Codec<T>: Send + Sync {
    /// Media type written to `Content-Type` for encoded bodies.
    fn content_type(&self) -> &str {
        crate::types::mime::APPLICATION_JSON
    }

    fn encode(&self, value: &T) -> Result<Bytes, CodecError>;

    fn decode(&self, bytes: &[u8]) -> Result<T, CodecError>;
}

/// Identity of a logical type in a [`CodecRegistry`].
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl std::hash::Hash for TypeKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
