use async_trait::async_trait;
use std::time::Duration;

use super::{CallContext, Interceptor};
use crate::request::RequestModel;
use crate::ClientError;

/// Re-executes the transport after network failures.
///
/// `max_attempts` counts every transport attempt including the first, and is
/// never below 1. Delays grow exponentially from `min_delay` up to `max_delay`.
/// HTTP error statuses are responses, not transport failures, and are not retried.
#[derive(Debug, Clone)]
pub struct RetryInterceptor {
    max_attempts: u32,
    min_delay: Duration,
    max_delay: Duration,
}

impl RetryInterceptor {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            min_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(2),
        }
    }

    pub fn with_delays(mut self, min_delay: Duration, max_delay: Duration) -> Self {
        self.min_delay = min_delay;
        self.max_delay = max_delay.max(min_delay);
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay before the attempt following `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let base = self.min_delay.as_millis() as u64;
        let cap = self.max_delay.as_millis() as u64;
        let shift = attempt.saturating_sub(1).min(32);

        // base * 2^(attempt-1)
        let delay = base.saturating_mul(1u64 << shift).min(cap);
        Duration::from_millis(delay)
    }
}

#[async_trait]
impl Interceptor for RetryInterceptor {
    fn name(&self) -> &str {
        "retry"
    }

    async fn on_transport_error(
        &self,
        _ctx: &CallContext,
        _request: &RequestModel,
        error: &ClientError,
        attempt: u32,
    ) -> Option<Duration> {
        if attempt >= self.max_attempts || !matches!(error, ClientError::Network(_)) {
            return None;
        }
        Some(self.backoff(attempt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_attempts_is_at_least_one() {
        assert_eq!(RetryInterceptor::new(0).max_attempts(), 1);
        assert_eq!(RetryInterceptor::new(4).max_attempts(), 4);
    }

    #[test]
    fn test_backoff_is_exponential_and_capped() {
        let retry = RetryInterceptor::new(10)
            .with_delays(Duration::from_millis(100), Duration::from_millis(500));
        assert_eq!(retry.backoff(1), Duration::from_millis(100));
        assert_eq!(retry.backoff(2), Duration::from_millis(200));
        assert_eq!(retry.backoff(3), Duration::from_millis(400));
        assert_eq!(retry.backoff(4), Duration::from_millis(500));
        assert_eq!(retry.backoff(60), Duration::from_millis(500));
    }
}
