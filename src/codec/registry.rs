//! Type-keyed codec registry.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::Any;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use super::{Codec, CodecError, EmptyCodec, FormBody, FormCodec, JsonCodec, TextCodec, TypeKey};

/// Codec with the value type erased, so the engine can stay non-generic.
pub(crate) trait ErasedCodec: Send + Sync {
    fn content_type(&self) -> &str;

    fn encode_any(&self, value: &(dyn Any + Send + Sync)) -> Result<Bytes, CodecError>;

    fn decode_any(&self, bytes: &[u8]) -> Result<Box<dyn Any + Send + Sync>, CodecError>;
}

struct Entry<T, C> {
    codec: C,
    _marker: PhantomData<fn() -> T>,
}

impl<T, C> ErasedCodec for Entry<T, C>
where
    T: Send + Sync + 'static,
    C: Codec<T>,
{
    fn content_type(&self) -> &str {
        self.codec.content_type()
    }

    fn encode_any(&self, value: &(dyn Any + Send + Sync)) -> Result<Bytes, CodecError> {
        let value = value.downcast_ref::<T>().ok_or_else(|| {
            CodecError::encode(format!(
                "value is not a {}",
                std::any::type_name::<T>()
            ))
        })?;
        self.codec.encode(value)
    }

    fn decode_any(&self, bytes: &[u8]) -> Result<Box<dyn Any + Send + Sync>, CodecError> {
        let value = self.codec.decode(bytes)?;
        Ok(Box::new(value))
    }
}

/// Registry of codecs, one per logical type.
///
/// `CodecRegistry::new()` already knows `serde_json::Value` (JSON), `String`
/// (plain text), `()` (empty body) and [`FormBody`] (urlencoded form).
#[derive(Clone)]
pub struct CodecRegistry {
    entries: HashMap<TypeKey, Arc<dyn ErasedCodec>>,
}

impl CodecRegistry {
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry
            .register::<serde_json::Value, _>(JsonCodec::new())
            .register::<String, _>(TextCodec)
            .register::<(), _>(EmptyCodec)
            .register::<FormBody, _>(FormCodec);
        registry
    }

    /// A registry without the default codecs.
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Register (or replace) the codec for `T`.
    pub fn register<T, C>(&mut self, codec: C) -> &mut Self
    where
        T: Send + Sync + 'static,
        C: Codec<T> + 'static,
    {
        self.entries.insert(
            TypeKey::of::<T>(),
            Arc::new(Entry {
                codec,
                _marker: PhantomData,
            }),
        );
        self
    }

    /// Register the JSON codec for `T`.
    pub fn register_json<T>(&mut self) -> &mut Self
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        self.register::<T, _>(JsonCodec::<T>::new())
    }

    pub fn with<T, C>(mut self, codec: C) -> Self
    where
        T: Send + Sync + 'static,
        C: Codec<T> + 'static,
    {
        self.register::<T, C>(codec);
        self
    }

    pub fn with_json<T>(mut self) -> Self
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        self.register_json::<T>();
        self
    }

    pub fn contains(&self, key: &TypeKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn content_type(&self, key: &TypeKey) -> Option<&str> {
        self.entries.get(key).map(|c| c.content_type())
    }

    pub fn encode<T: Send + Sync + 'static>(&self, value: &T) -> Result<Bytes, CodecError> {
        self.erased(&TypeKey::of::<T>())
            .ok_or_else(|| Self::unregistered(TypeKey::of::<T>()))?
            .encode_any(value)
    }

    pub fn decode<T: Send + Sync + 'static>(&self, bytes: &[u8]) -> Result<T, CodecError> {
        let key = TypeKey::of::<T>();
        let boxed = self
            .erased(&key)
            .ok_or_else(|| Self::unregistered(key))?
            .decode_any(bytes)?;
        boxed
            .downcast::<T>()
            .map(|b| *b)
            .map_err(|_| CodecError::decode(format!("codec for {} produced another type", key)))
    }

    pub(crate) fn erased(&self, key: &TypeKey) -> Option<&Arc<dyn ErasedCodec>> {
        self.entries.get(key)
    }

    fn unregistered(key: TypeKey) -> CodecError {
        CodecError::encode(format!("no codec registered for {}", key))
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}
