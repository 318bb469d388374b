//! Per-call lifecycle state.

use std::fmt;
use std::sync::Mutex;
use tracing::{debug, trace};

/// Where a call is in its lifecycle.
///
/// ```text
/// Sent -> AwaitingResponse -> Decoding -> Succeeded
///                 |              \-----> Failed
///                 \-> TransportFailed
/// ```
///
/// Any non-terminal state may move to `Cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallState {
    /// Handed to the interceptor chain.
    Sent,
    /// Transport step in flight. Re-entered on every retry.
    AwaitingResponse,
    Decoding,
    Succeeded,
    Failed,
    TransportFailed,
    Cancelled,
}

impl CallState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CallState::Succeeded | CallState::Failed | CallState::TransportFailed | CallState::Cancelled
        )
    }

    pub fn can_advance_to(&self, next: CallState) -> bool {
        use CallState::*;
        match (self, next) {
            (s, Cancelled) => !s.is_terminal(),
            (Sent, AwaitingResponse) | (Sent, Failed) => true,
            (AwaitingResponse, AwaitingResponse)
            | (AwaitingResponse, Decoding)
            | (AwaitingResponse, TransportFailed)
            | (AwaitingResponse, Failed) => true,
            (Decoding, Succeeded) | (Decoding, Failed) => true,
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CallState::Sent => "sent",
            CallState::AwaitingResponse => "awaiting_response",
            CallState::Decoding => "decoding",
            CallState::Succeeded => "succeeded",
            CallState::Failed => "failed",
            CallState::TransportFailed => "transport_failed",
            CallState::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for CallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validating holder of a call's current [`CallState`].
#[derive(Debug)]
pub struct StateTracker {
    request_id: String,
    current: Mutex<CallState>,
}

impl StateTracker {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            current: Mutex::new(CallState::Sent),
        }
    }

    pub fn current(&self) -> CallState {
        *self.current.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Move to `next`. Illegal transitions are ignored and reported as `false`.
    pub fn advance(&self, next: CallState) -> bool {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        if !current.can_advance_to(next) {
            debug!(
                request_id = %self.request_id,
                from = %*current,
                to = %next,
                "ignoring illegal call state transition"
            );
            return false;
        }
        trace!(request_id = %self.request_id, from = %*current, to = %next, "call state");
        *current = next;
        true
    }
}
