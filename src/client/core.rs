use std::collections::HashMap;
use std::sync::Arc;
use tokio::runtime::{Handle, Runtime};
use url::Url;

use super::builder::HttpClientBuilder;
use crate::codec::CodecRegistry;
use crate::interceptors::InterceptorChain;
use crate::request::{BoundEndpoint, CallArgs, EndpointDefinition, RequestDefaults, RequestModel};
use crate::transport::Transport;
use crate::{ClientError, ErrorContext, Result};

/// Runtime created by the client when none was available at build time.
pub(crate) struct OwnedRuntime(Option<Runtime>);

impl OwnedRuntime {
    pub(crate) fn new(runtime: Option<Runtime>) -> Self {
        Self(runtime)
    }
}

impl Drop for OwnedRuntime {
    fn drop(&mut self) {
        // Dropping a runtime from async context panics; shutting down in the background does not.
        if let Some(rt) = self.0.take() {
            rt.shutdown_background();
        }
    }
}

pub(crate) struct ClientInner {
    pub(crate) base_url: Url,
    pub(crate) endpoints: HashMap<String, Arc<BoundEndpoint>>,
    pub(crate) order: Vec<String>,
    pub(crate) defaults: RequestDefaults,
    pub(crate) interceptors: Arc<InterceptorChain>,
    pub(crate) codecs: Arc<CodecRegistry>,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) runtime: Handle,
    pub(crate) _owned_runtime: OwnedRuntime,
}

/// Declarative HTTP client.
///
/// Cheap to clone; clones share configuration, transport and worker runtime.
/// Nothing reachable from a client is mutated after [`HttpClientBuilder::build`].
#[derive(Clone)]
pub struct HttpClient {
    pub(crate) inner: Arc<ClientInner>,
}

impl HttpClient {
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::new()
    }

    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    pub fn endpoint(&self, id: &str) -> Option<&EndpointDefinition> {
        self.inner.endpoints.get(id).map(|e| &e.definition)
    }

    /// Registered endpoints in registration order.
    pub fn endpoints(&self) -> impl Iterator<Item = &EndpointDefinition> {
        self.inner
            .order
            .iter()
            .filter_map(|id| self.inner.endpoints.get(id))
            .map(|e| &e.definition)
    }

    pub fn codecs(&self) -> &CodecRegistry {
        &self.inner.codecs
    }

    pub fn interceptors(&self) -> &InterceptorChain {
        &self.inner.interceptors
    }

    /// Resolve a request without sending it.
    pub fn prepare_request(&self, endpoint_id: &str, args: CallArgs) -> Result<RequestModel> {
        let endpoint = self.bound(endpoint_id)?;
        RequestModel::build(endpoint, &self.inner.defaults, &self.inner.codecs, args)
    }

    pub(crate) fn bound(&self, endpoint_id: &str) -> Result<&Arc<BoundEndpoint>> {
        self.inner.endpoints.get(endpoint_id).ok_or_else(|| {
            ClientError::configuration_with_context(
                format!("unknown endpoint '{}'", endpoint_id),
                ErrorContext::new()
                    .with_field_path("endpoint_id")
                    .with_details(format!("registered: {}", self.inner.order.join(", ")))
                    .with_source("http_client"),
            )
        })
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("endpoints", &self.inner.order)
            .field("interceptors", &self.inner.interceptors)
            .finish()
    }
}
