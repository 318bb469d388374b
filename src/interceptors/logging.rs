use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::{CallContext, CallSummary, Interceptor};
use crate::pipeline::{excerpt, EXCERPT_LIMIT};
use crate::request::RequestModel;
use crate::types::{RawResponse, SensitiveHeaders};
use crate::Result;

/// Emits one structured `tracing` event per call.
///
/// Fields: `request_id`, `method`, `url`, `status` or `error`, `elapsed_ms`,
/// `attempts` and `headers`. Header values named in the sensitive set, or marked
/// sensitive by the call itself, are replaced with `[REDACTED]`. Bodies are only
/// logged when enabled, at `debug` level and truncated. The payload is never altered.
#[derive(Debug, Clone)]
pub struct LoggingInterceptor {
    sensitive: SensitiveHeaders,
    log_bodies: bool,
}

impl LoggingInterceptor {
    pub fn new() -> Self {
        Self {
            sensitive: SensitiveHeaders::new(),
            log_bodies: false,
        }
    }

    pub fn with_sensitive_headers(mut self, sensitive: SensitiveHeaders) -> Self {
        self.sensitive = sensitive;
        self
    }

    pub fn with_sensitive_header(mut self, name: &str) -> Self {
        self.sensitive.insert(name);
        self
    }

    pub fn with_bodies(mut self, enabled: bool) -> Self {
        self.log_bodies = enabled;
        self
    }
}

impl Default for LoggingInterceptor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Interceptor for LoggingInterceptor {
    fn name(&self) -> &str {
        "logging"
    }

    async fn on_request(&self, ctx: &CallContext, request: &mut RequestModel) -> Result<()> {
        if self.log_bodies {
            if let Some(body) = request.body() {
                debug!(
                    request_id = %ctx.request_id(),
                    bytes = body.len(),
                    body = %excerpt(body, EXCERPT_LIMIT),
                    "request body"
                );
            }
        }
        Ok(())
    }

    async fn on_response(
        &self,
        ctx: &CallContext,
        _request: &RequestModel,
        response: &mut RawResponse,
    ) -> Result<()> {
        if self.log_bodies && !response.body.is_empty() {
            debug!(
                request_id = %ctx.request_id(),
                status = response.status,
                bytes = response.body.len(),
                body = %excerpt(&response.body, EXCERPT_LIMIT),
                "response body"
            );
        }
        Ok(())
    }

    async fn on_complete(&self, _ctx: &CallContext, summary: &CallSummary) {
        let mut sensitive = self.sensitive.clone();
        sensitive.extend(summary.sensitive.iter().map(String::as_str));
        let headers = summary.request_headers.redacted(&sensitive);
        let elapsed_ms = summary.elapsed.as_millis() as u64;

        match &summary.error {
            None => info!(
                request_id = %summary.request_id,
                method = %summary.method,
                url = %summary.url,
                status = summary.status.unwrap_or_default(),
                elapsed_ms,
                attempts = summary.attempts,
                headers = %headers,
                "http call completed"
            ),
            Some(error) => warn!(
                request_id = %summary.request_id,
                method = %summary.method,
                url = %summary.url,
                status = ?summary.status,
                error = %error,
                elapsed_ms,
                attempts = summary.attempts,
                headers = %headers,
                "http call failed"
            ),
        }
    }
}
