use bytes::Bytes;
use std::time::Duration;

use super::headers::HeaderList;

/// Undecoded response as produced by a [`Transport`](crate::transport::Transport).
///
/// Owned by the transport until it is handed to the interceptor chain, then
/// consumed by the response pipeline.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub headers: HeaderList,
    pub body: Bytes,
    pub elapsed: Duration,
}

impl RawResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HeaderList::new(),
            body: Bytes::new(),
            elapsed: Duration::ZERO,
        }
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Successfully decoded outcome of a call.
#[derive(Debug, Clone)]
pub struct TypedResult<T> {
    pub value: T,
    pub status: u16,
    pub headers: HeaderList,
    pub request_id: String,
}

impl<T> TypedResult<T> {
    pub fn into_inner(self) -> T {
        self.value
    }
}
