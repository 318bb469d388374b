//! Call execution: one task per call on the worker runtime, one delivery per call.

use std::sync::Arc;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use super::core::HttpClient;
use super::handle::{CallHandle, CancelHandle, Delivery};
use crate::codec::{CodecRegistry, TypeKey};
use crate::interceptors::{CallContext, CallSummary, InterceptorChain};
use crate::pipeline::{decode_response, CallState};
use crate::request::{BoundEndpoint, CallArgs, RequestModel};
use crate::transport::Transport;
use crate::types::{HeaderList, TypedResult};
use crate::{ClientError, ErrorContext, Result};

impl HttpClient {
    /// Start a call and return its handle without waiting.
    ///
    /// `T` must be the endpoint's declared success type. Argument and type
    /// problems are reported through the handle as
    /// [`ClientError::Configuration`] and never reach the transport.
    pub fn call<T: Send + Sync + 'static>(&self, endpoint_id: &str, args: CallArgs) -> CallHandle<T> {
        let (tx, rx) = oneshot::channel();
        let cancel = CancelHandle::new();
        let handle = CallHandle::new(rx, cancel.clone(), self.inner.runtime.clone());

        let endpoint = match self.bound(endpoint_id) {
            Ok(endpoint) => endpoint.clone(),
            Err(e) => {
                warn!(endpoint = endpoint_id, error = %e, "call rejected: unknown endpoint");
                let _ = tx.send(Err(e));
                return handle;
            }
        };

        let mut headers = endpoint.definition.headers.clone();
        headers.merge(&self.inner.defaults.headers);
        headers.merge(&args.headers);
        let mut sensitive = self.inner.defaults.sensitive.clone();
        sensitive.extend(args.sensitive.iter().cloned());

        let job = CallJob {
            endpoint,
            interceptors: self.inner.interceptors.clone(),
            codecs: self.inner.codecs.clone(),
            transport: self.inner.transport.clone(),
        };
        match self.prepare::<T>(&job.endpoint, args) {
            Ok(request) => {
                self.inner.runtime.spawn(job.run(request, cancel.token(), tx));
            }
            Err(e) => {
                self.inner
                    .runtime
                    .spawn(job.reject(e, headers, sensitive, cancel.token(), tx));
            }
        }
        handle
    }

    /// Run a call to completion.
    pub async fn execute<T: Send + Sync + 'static>(
        &self,
        endpoint_id: &str,
        args: CallArgs,
    ) -> Result<TypedResult<T>> {
        self.call::<T>(endpoint_id, args).await
    }

    fn prepare<T: 'static>(&self, endpoint: &BoundEndpoint, args: CallArgs) -> Result<RequestModel> {
        let expected = TypeKey::of::<T>();
        let id = &endpoint.definition.id;
        if endpoint.definition.success != expected {
            return Err(ClientError::configuration_with_context(
                format!(
                    "endpoint '{}' returns {}, not {}",
                    id, endpoint.definition.success, expected
                ),
                ErrorContext::new()
                    .with_field_path(format!("endpoints.{}.success", id))
                    .with_source("http_client"),
            ));
        }
        RequestModel::build(endpoint, &self.inner.defaults, &self.inner.codecs, args)
    }
}

/// Everything a spawned call needs. Holds no reference to the client itself.
struct CallJob {
    endpoint: Arc<BoundEndpoint>,
    interceptors: Arc<InterceptorChain>,
    codecs: Arc<CodecRegistry>,
    transport: Arc<dyn Transport>,
}

impl CallJob {
    async fn run(self, mut request: RequestModel, token: CancellationToken, tx: oneshot::Sender<Delivery>) {
        let ctx = CallContext::new(&request, token.clone());
        debug!(
            request_id = %ctx.request_id(),
            endpoint = %ctx.endpoint_id(),
            method = %ctx.method(),
            url = %request.url(),
            "call dispatched"
        );

        let outcome = {
            let work = async {
                let response = self
                    .interceptors
                    .dispatch(&ctx, &mut request, self.transport.as_ref())
                    .await?;
                if ctx.is_cancelled() {
                    return Err(ClientError::Cancelled);
                }
                decode_response(
                    ctx.state(),
                    &self.endpoint.definition,
                    &self.codecs,
                    ctx.request_id(),
                    response,
                )
            };
            tokio::select! {
                biased;
                _ = token.cancelled() => Err(ClientError::Cancelled),
                outcome = work => outcome,
            }
        };

        let state = ctx.state();
        if !state.current().is_terminal() {
            state.advance(match &outcome {
                Ok(_) => CallState::Succeeded,
                Err(ClientError::Cancelled) => CallState::Cancelled,
                Err(ClientError::Network(_)) => CallState::TransportFailed,
                Err(_) => CallState::Failed,
            });
        }

        let summary = CallSummary {
            request_id: ctx.request_id().to_string(),
            endpoint_id: ctx.endpoint_id().to_string(),
            method: ctx.method(),
            url: request.url().to_string(),
            request_headers: request.headers().clone(),
            sensitive: request.sensitive_headers().to_vec(),
            status: match &outcome {
                Ok(result) => Some(result.status),
                Err(e) => e.status(),
            },
            error: outcome.as_ref().err().cloned(),
            elapsed: ctx.elapsed(),
            attempts: ctx.attempts(),
            state: state.current(),
        };
        self.interceptors.complete(&ctx, &summary).await;

        if tx.send(outcome).is_err() {
            trace!(request_id = %ctx.request_id(), "handle dropped before delivery");
        }
    }

    /// Report a call whose arguments never produced a request. Completion hooks
    /// still see it, with the endpoint's unresolved URL.
    async fn reject(
        self,
        error: ClientError,
        request_headers: HeaderList,
        sensitive: Vec<String>,
        token: CancellationToken,
        tx: oneshot::Sender<Delivery>,
    ) {
        let def = &self.endpoint.definition;
        let ctx = CallContext::detached(&def.id, def.method, token);
        debug!(
            request_id = %ctx.request_id(),
            endpoint = %def.id,
            error = %error,
            "call rejected before dispatch"
        );
        ctx.state().advance(CallState::Failed);

        let summary = CallSummary {
            request_id: ctx.request_id().to_string(),
            endpoint_id: def.id.clone(),
            method: def.method,
            url: format!(
                "{}/{}",
                self.endpoint.base_url.as_str().trim_end_matches('/'),
                self.endpoint.template.as_str().trim_start_matches('/')
            ),
            request_headers,
            sensitive,
            status: None,
            error: Some(error.clone()),
            elapsed: ctx.elapsed(),
            attempts: 0,
            state: ctx.state().current(),
        };
        self.interceptors.complete(&ctx, &summary).await;

        if tx.send(Err(error)).is_err() {
            trace!(request_id = %ctx.request_id(), "handle dropped before delivery");
        }
    }
}
