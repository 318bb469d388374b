use async_trait::async_trait;
use std::sync::Arc;
use tracing::trace;

use super::{CallContext, Interceptor};
use crate::request::RequestModel;
use crate::types::HeaderList;
use crate::Result;

/// Supplies headers for a request, e.g. a current auth token.
pub trait HeaderProvider: Send + Sync {
    fn headers(&self, request: &RequestModel) -> HeaderList;
}

impl<F> HeaderProvider for F
where
    F: Fn(&RequestModel) -> HeaderList + Send + Sync,
{
    fn headers(&self, request: &RequestModel) -> HeaderList {
        self(request)
    }
}

/// Adds provider headers at the interceptor tier.
///
/// Entries with an empty name or value are skipped, and so are names the call
/// already set with a per-call override.
#[derive(Clone)]
pub struct HeaderInjector {
    provider: Arc<dyn HeaderProvider>,
}

impl HeaderInjector {
    pub fn new(provider: impl HeaderProvider + 'static) -> Self {
        Self {
            provider: Arc::new(provider),
        }
    }

    /// Inject the same headers into every request.
    pub fn fixed(headers: HeaderList) -> Self {
        Self::new(move |_: &RequestModel| headers.clone())
    }
}

#[async_trait]
impl Interceptor for HeaderInjector {
    fn name(&self) -> &str {
        "header_injector"
    }

    async fn on_request(&self, ctx: &CallContext, request: &mut RequestModel) -> Result<()> {
        let headers = self.provider.headers(request);
        for (name, value) in headers.iter() {
            if name.trim().is_empty() || value.is_empty() {
                continue;
            }
            if !request.inject_header(name, value) {
                trace!(request_id = %ctx.request_id(), header = name, "kept per-call header");
            }
        }
        Ok(())
    }
}
