//! In-memory transport with a scripted sequence of outcomes

use async_trait::async_trait;
use lib_http::request::RequestModel;
use lib_http::{NetworkError, RawResponse, Transport};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

pub enum Step {
    Respond(RawResponse),
    Fail(NetworkError),
    /// Never completes; only the deadline or cancellation ends the attempt.
    Hang,
}

/// Plays back queued steps in order, then answers `200 {}` forever.
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Step>>,
    delay: Duration,
    calls: AtomicUsize,
    requests: Mutex<Vec<RequestModel>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn respond(self, response: RawResponse) -> Self {
        self.script.lock().unwrap().push_back(Step::Respond(response));
        self
    }

    pub fn json(self, status: u16, body: &str) -> Self {
        self.respond(
            RawResponse::new(status)
                .with_header("Content-Type", "application/json")
                .with_body(body.to_string()),
        )
    }

    pub fn fail(self, error: NetworkError) -> Self {
        self.script.lock().unwrap().push_back(Step::Fail(error));
        self
    }

    pub fn hang(self) -> Self {
        self.script.lock().unwrap().push_back(Step::Hang);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Requests exactly as the transport received them.
    pub fn requests(&self) -> Vec<RequestModel> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(
        &self,
        request: &RequestModel,
        _deadline: Instant,
    ) -> Result<RawResponse, NetworkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        let step = self.script.lock().unwrap().pop_front();

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match step {
            Some(Step::Respond(response)) => Ok(response),
            Some(Step::Fail(error)) => Err(error),
            Some(Step::Hang) => std::future::pending().await,
            None => Ok(RawResponse::new(200).with_body("{}")),
        }
    }
}
