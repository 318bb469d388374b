use futures::FutureExt;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::mpsc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::error::NetworkError;
use crate::pipeline::AnyValue;
use crate::types::TypedResult;
use crate::{ClientError, ErrorContext, Result};

pub(crate) type Delivery = Result<TypedResult<AnyValue>>;

/// Cancels one call. Clones control the same call.
///
/// Cancelling is idempotent and a no-op once the call has completed.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub(crate) fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}

/// Pending outcome of one call.
///
/// Resolves exactly once, to either a [`TypedResult`] or a [`ClientError`]. Await
/// it, hand it to an observer with [`subscribe`](Self::subscribe), or block on it
/// with [`wait_timeout`](Self::wait_timeout). Dropping the handle does not cancel
/// the call.
#[must_use = "a call handle does nothing unless awaited, subscribed or waited on"]
pub struct CallHandle<T> {
    rx: oneshot::Receiver<Delivery>,
    cancel: CancelHandle,
    runtime: Handle,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + 'static> CallHandle<T> {
    pub(crate) fn new(rx: oneshot::Receiver<Delivery>, cancel: CancelHandle, runtime: Handle) -> Self {
        Self {
            rx,
            cancel,
            runtime,
            _marker: PhantomData,
        }
    }

    /// Cancel the call. The outcome becomes [`ClientError::Cancelled`] unless the
    /// call already completed.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Deliver the outcome to `observer` on the worker runtime.
    pub fn subscribe<F>(self, observer: F) -> CancelHandle
    where
        F: FnOnce(Result<TypedResult<T>>) + Send + 'static,
    {
        let cancel = self.cancel.clone();
        let runtime = self.runtime.clone();
        runtime.spawn(async move {
            let outcome = self.await;
            observer(outcome);
        });
        cancel
    }

    /// Block the current thread for at most `timeout`.
    ///
    /// On timeout the call is cancelled and a [`NetworkErrorKind::Timeout`]
    /// error is returned. On a multi-thread runtime worker the wait goes through
    /// [`tokio::task::block_in_place`]. A current-thread runtime has no other
    /// worker to drive the call, so the call is cancelled and a configuration
    /// error is returned without blocking.
    ///
    /// [`NetworkErrorKind::Timeout`]: crate::NetworkErrorKind::Timeout
    pub fn wait_timeout(self, timeout: Duration) -> Result<TypedResult<T>> {
        let in_runtime = match Handle::try_current() {
            Err(_) => false,
            Ok(current) => match current.runtime_flavor() {
                RuntimeFlavor::CurrentThread => {
                    self.cancel.cancel();
                    return Err(ClientError::configuration_with_context(
                        "wait_timeout cannot block a current-thread runtime, await the handle instead",
                        ErrorContext::new().with_source("call_handle"),
                    ));
                }
                _ => true,
            },
        };

        let cancel = self.cancel.clone();
        let runtime = self.runtime.clone();
        let (tx, rx) = mpsc::sync_channel(1);
        runtime.spawn(async move {
            let _ = tx.send(self.await);
        });

        let received = if in_runtime {
            tokio::task::block_in_place(|| rx.recv_timeout(timeout))
        } else {
            rx.recv_timeout(timeout)
        };
        match received {
            Ok(outcome) => outcome,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                cancel.cancel();
                Err(NetworkError::timeout(format!("no outcome within {:?}", timeout)).into())
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(ClientError::Cancelled),
        }
    }
}

impl<T: 'static> Future for CallHandle<T> {
    type Output = Result<TypedResult<T>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let delivery = match self.rx.poll_unpin(cx) {
            Poll::Pending => return Poll::Pending,
            // Sender dropped without delivering: the worker runtime shut down.
            Poll::Ready(Err(_)) => return Poll::Ready(Err(ClientError::Cancelled)),
            Poll::Ready(Ok(delivery)) => delivery,
        };
        Poll::Ready(delivery.and_then(downcast::<T>))
    }
}

fn downcast<T: 'static>(result: TypedResult<AnyValue>) -> Result<TypedResult<T>> {
    let TypedResult {
        value,
        status,
        headers,
        request_id,
    } = result;
    let value = value.downcast::<T>().map_err(|_| {
        ClientError::configuration(format!(
            "decoded value is not a {}",
            std::any::type_name::<T>()
        ))
    })?;
    Ok(TypedResult {
        value: *value,
        status,
        headers,
        request_id,
    })
}

impl<T> std::fmt::Debug for CallHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallHandle")
            .field("type", &std::any::type_name::<T>())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}
