use std::any::Any;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::types::HeaderList;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ErrorContext {
    /// Field path or configuration key that caused the error (e.g., "endpoint.path", "args.path.id")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected shape, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "client_builder", "request_builder")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Transport-level failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetworkErrorKind {
    /// Could not establish a connection.
    Connect,
    /// The deadline elapsed before a full response arrived.
    Timeout,
    /// Sending the request failed.
    Write,
    /// Receiving the response failed.
    Read,
    Other,
}

impl fmt::Display for NetworkErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NetworkErrorKind::Connect => "connect",
            NetworkErrorKind::Timeout => "timeout",
            NetworkErrorKind::Write => "write",
            NetworkErrorKind::Read => "read",
            NetworkErrorKind::Other => "other",
        };
        f.write_str(s)
    }
}

/// Failure reported by a transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} failure: {message}")]
pub struct NetworkError {
    pub kind: NetworkErrorKind,
    pub message: String,
}

impl NetworkError {
    pub fn new(kind: NetworkErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn connect(message: impl Into<String>) -> Self {
        Self::new(NetworkErrorKind::Connect, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(NetworkErrorKind::Timeout, message)
    }

    pub fn write(message: impl Into<String>) -> Self {
        Self::new(NetworkErrorKind::Write, message)
    }

    pub fn read(message: impl Into<String>) -> Self {
        Self::new(NetworkErrorKind::Read, message)
    }
}

/// Decoded error payload of a non-2xx response.
///
/// The value is decoded with the endpoint's declared error type; use
/// [`ErrorBody::downcast_ref`] to get it back.
#[derive(Clone)]
pub struct ErrorBody {
    value: Option<Arc<dyn Any + Send + Sync>>,
    type_name: &'static str,
    excerpt: String,
}

impl ErrorBody {
    /// A failure response that carried no body.
    pub fn empty() -> Self {
        Self {
            value: None,
            type_name: "()",
            excerpt: String::new(),
        }
    }

    pub(crate) fn decoded(
        value: Arc<dyn Any + Send + Sync>,
        type_name: &'static str,
        excerpt: String,
    ) -> Self {
        Self {
            value: Some(value),
            type_name,
            excerpt,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_none()
    }

    pub fn downcast_ref<E: Any>(&self) -> Option<&E> {
        self.value.as_ref().and_then(|v| v.downcast_ref::<E>())
    }

    /// Name of the type the body was decoded into.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Bounded excerpt of the raw body, for diagnostics.
    pub fn excerpt(&self) -> &str {
        &self.excerpt
    }
}

impl fmt::Debug for ErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorBody")
            .field("type_name", &self.type_name)
            .field("decoded", &self.value.is_some())
            .field("excerpt", &self.excerpt)
            .finish()
    }
}

/// Variant tag of a [`ClientError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Configuration,
    Network,
    Http,
    Decode,
    Cancelled,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::Network => "network",
            ErrorKind::Http => "http",
            ErrorKind::Decode => "decode",
            ErrorKind::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Unified error type of the client core.
///
/// Every failed call resolves to exactly one of these variants.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("HTTP error: status {status}")]
    Http {
        status: u16,
        headers: HeaderList,
        body: ErrorBody,
    },

    #[error("Decode error{}: {message}{}", format_status(.status), format_field(.field))]
    Decode {
        status: Option<u16>,
        field: Option<String>,
        message: String,
        excerpt: String,
    },

    #[error("Call cancelled")]
    Cancelled,
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

fn format_status(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default()
}

fn format_field(field: &Option<String>) -> String {
    field
        .as_ref()
        .map(|f| format!(" [field: {}]", f))
        .unwrap_or_default()
}

impl ClientError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        ClientError::Configuration {
            message: msg.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create a new configuration error with structured context
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        ClientError::Configuration {
            message: msg.into(),
            context,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Configuration { .. } => ErrorKind::Configuration,
            ClientError::Network(_) => ErrorKind::Network,
            ClientError::Http { .. } => ErrorKind::Http,
            ClientError::Decode { .. } => ErrorKind::Decode,
            ClientError::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// HTTP status attached to the error, if a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            ClientError::Decode { status, .. } => *status,
            _ => None,
        }
    }

    pub fn network_kind(&self) -> Option<NetworkErrorKind> {
        match self {
            ClientError::Network(e) => Some(e.kind),
            _ => None,
        }
    }

    /// Whether an external retry policy may reasonably try again.
    ///
    /// The core itself never retries.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Network(_) => true,
            ClientError::Http { status, .. } => *status == 429 || (500..=599).contains(status),
            _ => false,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ClientError::Cancelled)
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            ClientError::Configuration { context, .. } => Some(context),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_display_includes_context() {
        let err = ClientError::configuration_with_context(
            "missing required parameter 'id'",
            ErrorContext::new()
                .with_field_path("args.path.id")
                .with_source("request_builder"),
        );
        let text = err.to_string();
        assert!(text.contains("missing required parameter 'id'"));
        assert!(text.contains("field: args.path.id"));
        assert!(text.contains("source: request_builder"));
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_decode_display_names_field() {
        let err = ClientError::Decode {
            status: Some(200),
            field: Some("name".into()),
            message: "missing field `name`".into(),
            excerpt: "{}".into(),
        };
        let text = err.to_string();
        assert!(text.contains("HTTP 200"));
        assert!(text.contains("[field: name]"));
        assert_eq!(err.status(), Some(200));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(ClientError::from(NetworkError::timeout("slow")).is_retryable());
        let http = |status| ClientError::Http {
            status,
            headers: HeaderList::new(),
            body: ErrorBody::empty(),
        };
        assert!(http(503).is_retryable());
        assert!(http(429).is_retryable());
        assert!(!http(404).is_retryable());
        assert!(!ClientError::Cancelled.is_retryable());
    }

    #[test]
    fn test_error_body_downcast() {
        let body = ErrorBody::decoded(Arc::new(String::from("boom")), "String", "boom".into());
        assert_eq!(body.downcast_ref::<String>().map(String::as_str), Some("boom"));
        assert!(body.downcast_ref::<u32>().is_none());
        assert!(ErrorBody::empty().is_empty());
    }
}
