//! Interceptor chain: ordered hooks around the transport step of every call.
//!
//! ## Ordering
//!
//! ```text
//! on_request:         I1 → I2 → … → In → Transport
//! on_transport_error:                 In → … → I1   (first Some(delay) re-executes)
//! on_response:        I1 ← I2 ← … ← In ← Transport
//! on_complete:        In → … → I1                   (once per call, any outcome)
//! ```
//!
//! An `Err` from `on_request` or `on_response` aborts the call immediately: no
//! further interceptor runs and, in the request phase, the transport is never
//! reached.
//!
//! ## Shipped interceptors
//!
//! | Interceptor | Description |
//! |-------------|-------------|
//! | [`LoggingInterceptor`] | One structured event per call, sensitive headers redacted |
//! | [`HeaderInjector`] | Headers from a [`HeaderProvider`] at the interceptor tier |
//! | [`RetryInterceptor`] | Re-executes the transport on network failures |
//! | [`BodyTransformer`] | Form bodies rewritten as JSON |
//! | [`PayloadCipher`] | Request encryption and success-response decryption |
//! | [`ResponseAnalyzer`] | Read-only inspection of every received body |

mod analyzer;
mod body;
mod cipher;
mod headers;
mod logging;
mod retry;

pub use analyzer::{ContentAnalyzer, ResponseAnalyzer};
pub use body::{BodyBuilder, BodyTransformer, RebuiltBody};
pub use cipher::{Decryptor, Encryptor, PayloadCipher};
pub use headers::{HeaderInjector, HeaderProvider};
pub use logging::LoggingInterceptor;
pub use retry::RetryInterceptor;

use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

use crate::error::NetworkError;
use crate::pipeline::{CallState, StateTracker};
use crate::request::RequestModel;
use crate::transport::Transport;
use crate::types::{HeaderList, HttpMethod, RawResponse};
use crate::{ClientError, Result};

/// Per-call context shared by every hook of one call.
#[derive(Debug)]
pub struct CallContext {
    request_id: String,
    endpoint_id: String,
    method: HttpMethod,
    started: std::time::Instant,
    attempts: AtomicU32,
    cancel: CancellationToken,
    state: StateTracker,
}

impl CallContext {
    pub fn new(request: &RequestModel, cancel: CancellationToken) -> Self {
        Self {
            request_id: request.request_id().to_string(),
            endpoint_id: request.endpoint_id().to_string(),
            method: request.method(),
            started: std::time::Instant::now(),
            attempts: AtomicU32::new(0),
            cancel,
            state: StateTracker::new(request.request_id()),
        }
    }

    /// Context for a call rejected before a request could be built.
    pub(crate) fn detached(endpoint_id: &str, method: HttpMethod, cancel: CancellationToken) -> Self {
        let request_id = Uuid::new_v4().to_string();
        Self {
            state: StateTracker::new(&request_id),
            request_id,
            endpoint_id: endpoint_id.to_string(),
            method,
            started: std::time::Instant::now(),
            attempts: AtomicU32::new(0),
            cancel,
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn endpoint_id(&self) -> &str {
        &self.endpoint_id
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Transport attempts made so far.
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn state(&self) -> &StateTracker {
        &self.state
    }

    fn begin_attempt(&self) -> u32 {
        self.attempts.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// Final record of a call, handed to [`Interceptor::on_complete`].
#[derive(Debug, Clone)]
pub struct CallSummary {
    pub request_id: String,
    pub endpoint_id: String,
    pub method: HttpMethod,
    /// Resolved URL, or the endpoint's unresolved template URL when the call
    /// was rejected before a request was built.
    pub url: String,
    pub request_headers: HeaderList,
    /// Header names the caller marked sensitive for this call.
    pub sensitive: Vec<String>,
    /// Status of the last response received, if any.
    pub status: Option<u16>,
    pub error: Option<ClientError>,
    pub elapsed: Duration,
    pub attempts: u32,
    pub state: CallState,
}

impl CallSummary {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Hook points around the transport step. Every hook defaults to a no-op.
#[async_trait]
pub trait Interceptor: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    async fn on_request(&self, _ctx: &CallContext, _request: &mut RequestModel) -> Result<()> {
        Ok(())
    }

    async fn on_response(
        &self,
        _ctx: &CallContext,
        _request: &RequestModel,
        _response: &mut RawResponse,
    ) -> Result<()> {
        Ok(())
    }

    /// Return `Some(delay)` to run the transport again after `delay`.
    ///
    /// `attempt` is the 1-based number of the attempt that just failed.
    async fn on_transport_error(
        &self,
        _ctx: &CallContext,
        _request: &RequestModel,
        _error: &ClientError,
        _attempt: u32,
    ) -> Option<Duration> {
        None
    }

    /// Runs once per call, before its outcome is delivered to the handle.
    ///
    /// Delivery, including a cancelled outcome, waits for every completion
    /// hook. Hooks must return promptly and spawn any slow work.
    async fn on_complete(&self, _ctx: &CallContext, _summary: &CallSummary) {}
}

/// Ordered list of interceptors, immutable once the client is built.
#[derive(Clone, Default)]
pub struct InterceptorChain {
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl InterceptorChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<I: Interceptor + 'static>(mut self, interceptor: I) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    pub fn push(&mut self, interceptor: Arc<dyn Interceptor>) {
        self.interceptors.push(interceptor);
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Interceptor>> {
        self.interceptors.iter()
    }

    /// Run the request phase, the transport (with any requested re-executions)
    /// and the response phase.
    pub(crate) async fn dispatch(
        &self,
        ctx: &CallContext,
        request: &mut RequestModel,
        transport: &dyn Transport,
    ) -> Result<RawResponse> {
        for ic in &self.interceptors {
            if let Err(e) = ic.on_request(ctx, request).await {
                debug!(request_id = %ctx.request_id(), interceptor = ic.name(), error = %e, "request phase aborted");
                return Err(e);
            }
        }

        let mut response = loop {
            if ctx.is_cancelled() {
                return Err(ClientError::Cancelled);
            }
            let attempt = ctx.begin_attempt();
            ctx.state().advance(CallState::AwaitingResponse);

            let timeout = request.timeout();
            let deadline = Instant::now() + timeout;
            let outcome = tokio::time::timeout_at(deadline, transport.execute(request, deadline))
                .await
                .unwrap_or_else(|_| Err(NetworkError::timeout(format!("no response within {:?}", timeout))));

            let err = match outcome {
                Ok(response) => break response,
                Err(net) => ClientError::Network(net),
            };
            match self.retry_delay(ctx, request, &err, attempt).await {
                Some(delay) => {
                    debug!(
                        request_id = %ctx.request_id(),
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "re-executing transport"
                    );
                    tokio::time::sleep(delay).await;
                }
                None => return Err(err),
            }
        };

        for ic in self.interceptors.iter().rev() {
            if let Err(e) = ic.on_response(ctx, request, &mut response).await {
                debug!(request_id = %ctx.request_id(), interceptor = ic.name(), error = %e, "response phase aborted");
                return Err(e);
            }
        }
        Ok(response)
    }

    async fn retry_delay(
        &self,
        ctx: &CallContext,
        request: &RequestModel,
        error: &ClientError,
        attempt: u32,
    ) -> Option<Duration> {
        for ic in self.interceptors.iter().rev() {
            if let Some(delay) = ic.on_transport_error(ctx, request, error, attempt).await {
                return Some(delay);
            }
        }
        None
    }

    pub(crate) async fn complete(&self, ctx: &CallContext, summary: &CallSummary) {
        for ic in self.interceptors.iter().rev() {
            ic.on_complete(ctx, summary).await;
        }
    }
}

impl std::fmt::Debug for InterceptorChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.interceptors.iter().map(|i| i.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::CodecRegistry;
    use crate::request::{BoundEndpoint, CallArgs, EndpointDefinition, RequestDefaults};
    use std::sync::Mutex;
    use url::Url;

    struct Recorder {
        label: &'static str,
        log: Arc<Mutex<Vec<String>>>,
        fail_request: bool,
    }

    #[async_trait]
    impl Interceptor for Recorder {
        fn name(&self) -> &str {
            self.label
        }

        async fn on_request(&self, _ctx: &CallContext, _request: &mut RequestModel) -> Result<()> {
            self.log.lock().unwrap().push(format!("req:{}", self.label));
            if self.fail_request {
                return Err(ClientError::configuration("rejected"));
            }
            Ok(())
        }

        async fn on_response(
            &self,
            _ctx: &CallContext,
            _request: &RequestModel,
            _response: &mut RawResponse,
        ) -> Result<()> {
            self.log.lock().unwrap().push(format!("resp:{}", self.label));
            Ok(())
        }
    }

    struct Fixed {
        calls: AtomicU32,
        fail_first: u32,
    }

    #[async_trait]
    impl Transport for Fixed {
        async fn execute(
            &self,
            _request: &RequestModel,
            _deadline: Instant,
        ) -> std::result::Result<RawResponse, NetworkError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_first {
                return Err(NetworkError::connect("refused"));
            }
            Ok(RawResponse::new(200))
        }
    }

    fn request() -> RequestModel {
        let base = Url::parse("http://localhost/").unwrap();
        let ep = BoundEndpoint::bind(EndpointDefinition::get("ping", "/ping"), &base).unwrap();
        let defaults = RequestDefaults {
            headers: HeaderList::new(),
            timeout: Duration::from_secs(5),
            sensitive: Vec::new(),
        };
        RequestModel::build(&ep, &defaults, &CodecRegistry::new(), CallArgs::new()).unwrap()
    }

    fn recorder(label: &'static str, log: &Arc<Mutex<Vec<String>>>, fail: bool) -> Recorder {
        Recorder {
            label,
            log: log.clone(),
            fail_request: fail,
        }
    }

    #[tokio::test]
    async fn test_response_phase_runs_in_reverse() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = InterceptorChain::new()
            .with(recorder("a", &log, false))
            .with(recorder("b", &log, false))
            .with(recorder("c", &log, false));
        let transport = Fixed {
            calls: AtomicU32::new(0),
            fail_first: 0,
        };
        let mut req = request();
        let ctx = CallContext::new(&req, CancellationToken::new());

        chain.dispatch(&ctx, &mut req, &transport).await.unwrap();
        assert_eq!(
            *log.lock().unwrap(),
            vec!["req:a", "req:b", "req:c", "resp:c", "resp:b", "resp:a"]
        );
    }

    #[tokio::test]
    async fn test_request_error_short_circuits() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = InterceptorChain::new()
            .with(recorder("a", &log, true))
            .with(recorder("b", &log, false));
        let transport = Fixed {
            calls: AtomicU32::new(0),
            fail_first: 0,
        };
        let mut req = request();
        let ctx = CallContext::new(&req, CancellationToken::new());

        let err = chain.dispatch(&ctx, &mut req, &transport).await.unwrap_err();
        assert!(matches!(err, ClientError::Configuration { .. }));
        assert_eq!(*log.lock().unwrap(), vec!["req:a"]);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_transport_error_without_retry() {
        let chain = InterceptorChain::new();
        let transport = Fixed {
            calls: AtomicU32::new(0),
            fail_first: 1,
        };
        let mut req = request();
        let ctx = CallContext::new(&req, CancellationToken::new());

        let err = chain.dispatch(&ctx, &mut req, &transport).await.unwrap_err();
        assert_eq!(err.network_kind(), Some(crate::NetworkErrorKind::Connect));
        assert_eq!(ctx.attempts(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_context_skips_transport() {
        let token = CancellationToken::new();
        token.cancel();
        let transport = Fixed {
            calls: AtomicU32::new(0),
            fail_first: 0,
        };
        let mut req = request();
        let ctx = CallContext::new(&req, token);

        let err = InterceptorChain::new()
            .dispatch(&ctx, &mut req, &transport)
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }
}
