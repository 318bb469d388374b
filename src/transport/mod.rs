//! Transport boundary: the component performing raw network I/O.
//!
//! The core only depends on the [`Transport`] trait. [`HttpTransport`] is the
//! default implementation backed by `reqwest`; tests and embedders can plug in
//! their own.

mod http;

pub use http::{HttpTransport, HttpTransportConfig};

use async_trait::async_trait;
use tokio::time::Instant;

use crate::error::NetworkError;
use crate::request::RequestModel;
use crate::types::RawResponse;

/// Executes one request.
///
/// Implementations must give up once `deadline` passes and report failures with a
/// distinguishable [`NetworkErrorKind`](crate::NetworkErrorKind). Dropping the
/// returned future is the cancellation signal and should abort any I/O in flight.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(
        &self,
        request: &RequestModel,
        deadline: Instant,
    ) -> Result<RawResponse, NetworkError>;
}
