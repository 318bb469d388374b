//! Static endpoint definitions.

use serde_json::Value;
use std::time::Duration;

use crate::codec::TypeKey;
use crate::types::{HeaderList, HttpMethod};

/// Where a parameter is placed on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamLocation {
    Path,
    Query,
}

/// Expected shape of a parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    String,
    Integer,
    Number,
    Boolean,
    /// Any scalar. Query parameters additionally accept arrays of scalars.
    Any,
}

impl ParamKind {
    pub(crate) fn accepts(&self, value: &Value) -> bool {
        match self {
            ParamKind::String => value.is_string(),
            ParamKind::Integer => value.is_i64() || value.is_u64(),
            ParamKind::Number => value.is_number(),
            ParamKind::Boolean => value.is_boolean(),
            ParamKind::Any => value.is_string() || value.is_number() || value.is_boolean(),
        }
    }

    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            ParamKind::String => "string",
            ParamKind::Integer => "integer",
            ParamKind::Number => "number",
            ParamKind::Boolean => "boolean",
            ParamKind::Any => "scalar",
        }
    }
}

/// Declared binding of a named call argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamBinding {
    pub name: String,
    pub location: ParamLocation,
    pub kind: ParamKind,
    pub required: bool,
}

impl ParamBinding {
    /// A path parameter. Path parameters are always required.
    pub fn path(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: ParamLocation::Path,
            kind: ParamKind::Any,
            required: true,
        }
    }

    /// An optional query parameter.
    pub fn query(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: ParamLocation::Query,
            kind: ParamKind::Any,
            required: false,
        }
    }

    pub fn kind(mut self, kind: ParamKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }
}

/// Static description of one callable operation.
///
/// Definitions are registered on the client builder and never mutated after
/// [`HttpClientBuilder::build`](crate::HttpClientBuilder::build).
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointDefinition {
    pub id: String,
    pub method: HttpMethod,
    pub path: String,
    pub params: Vec<ParamBinding>,
    pub headers: HeaderList,
    /// Overrides the client base URL for this endpoint only.
    pub base_url: Option<String>,
    pub timeout: Option<Duration>,
    pub body: Option<TypeKey>,
    pub success: TypeKey,
    pub error: TypeKey,
}

impl EndpointDefinition {
    /// New endpoint returning and failing with `serde_json::Value` until told otherwise.
    pub fn new(id: impl Into<String>, method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            method,
            path: path.into(),
            params: Vec::new(),
            headers: HeaderList::new(),
            base_url: None,
            timeout: None,
            body: None,
            success: TypeKey::of::<Value>(),
            error: TypeKey::of::<Value>(),
        }
    }

    pub fn get(id: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(id, HttpMethod::Get, path)
    }

    pub fn post(id: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(id, HttpMethod::Post, path)
    }

    pub fn put(id: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(id, HttpMethod::Put, path)
    }

    pub fn patch(id: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(id, HttpMethod::Patch, path)
    }

    pub fn delete(id: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(id, HttpMethod::Delete, path)
    }

    pub fn param(mut self, binding: ParamBinding) -> Self {
        self.params.push(binding);
        self
    }

    /// Declare a path parameter for every placeholder not yet bound.
    pub fn path_params_from_template(mut self) -> Self {
        if let Ok(template) = super::PathTemplate::parse(&self.path) {
            for name in template.placeholders() {
                if !self.params.iter().any(|p| p.name == name) {
                    self.params.push(ParamBinding::path(name));
                }
            }
        }
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Declare the request body type.
    pub fn body<B: 'static>(mut self) -> Self {
        self.body = Some(TypeKey::of::<B>());
        self
    }

    /// Declare the success payload type.
    pub fn returns<T: 'static>(mut self) -> Self {
        self.success = TypeKey::of::<T>();
        self
    }

    /// Declare the error payload type for non-2xx responses.
    pub fn error<E: 'static>(mut self) -> Self {
        self.error = TypeKey::of::<E>();
        self
    }

    pub fn binding(&self, name: &str) -> Option<&ParamBinding> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Every codec type this endpoint depends on.
    pub fn codec_types(&self) -> impl Iterator<Item = (&'static str, TypeKey)> + '_ {
        self.body
            .map(|k| ("body", k))
            .into_iter()
            .chain([("success", self.success), ("error", self.error)])
    }
}
