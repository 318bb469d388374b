use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use crate::codec::TypeKey;
use crate::types::HeaderList;

/// Typed request body waiting to be encoded by the registered codec.
pub(crate) struct PendingBody {
    pub(crate) key: TypeKey,
    pub(crate) value: Box<dyn Any + Send + Sync>,
}

/// Caller-supplied arguments for one call.
#[derive(Default)]
pub struct CallArgs {
    pub(crate) path: HashMap<String, Value>,
    pub(crate) query: Vec<(String, Value)>,
    pub(crate) headers: HeaderList,
    pub(crate) sensitive: Vec<String>,
    pub(crate) body: Option<PendingBody>,
    pub(crate) timeout: Option<Duration>,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.path.insert(name.into(), value.into());
        self
    }

    /// Add a query parameter. Repeating a name replaces the earlier value.
    pub fn query(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.query.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.query.push((name, value)),
        }
        self
    }

    /// Per-call header override; wins over every other header tier.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Per-call header whose value must be redacted in logs.
    pub fn sensitive_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.sensitive.push(name.clone());
        self.headers.insert(name, value);
        self
    }

    pub fn body<B: Any + Send + Sync>(mut self, value: B) -> Self {
        self.body = Some(PendingBody {
            key: TypeKey::of::<B>(),
            value: Box::new(value),
        });
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl fmt::Debug for CallArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallArgs")
            .field("path", &self.path)
            .field("query", &self.query)
            .field("headers", &self.headers.names().collect::<Vec<_>>())
            .field("body", &self.body.as_ref().map(|b| b.key))
            .field("timeout", &self.timeout)
            .finish()
    }
}
