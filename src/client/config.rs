use std::time::Duration;

use crate::codec::CodecRegistry;
use crate::interceptors::InterceptorChain;
use crate::types::HeaderList;

/// Per-attempt timeout used when neither the call nor the endpoint sets one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Client-wide configuration, immutable once the client is built.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub default_headers: HeaderList,
    pub default_timeout: Duration,
    pub interceptors: InterceptorChain,
    pub codecs: CodecRegistry,
    /// Extra header names redacted in logs, on top of the built-in credentials set.
    pub sensitive_headers: Vec<String>,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            default_headers: HeaderList::new(),
            default_timeout: DEFAULT_TIMEOUT,
            interceptors: InterceptorChain::new(),
            codecs: CodecRegistry::new(),
            sensitive_headers: Vec::new(),
        }
    }
}
