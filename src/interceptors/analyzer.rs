use async_trait::async_trait;
use std::sync::Arc;

use super::{CallContext, Interceptor};
use crate::request::RequestModel;
use crate::types::RawResponse;
use crate::Result;

/// Receives every response body as text, e.g. to spot session expiry markers.
pub trait ContentAnalyzer: Send + Sync {
    fn analyze(&self, request: &RequestModel, status: u16, body: &str);
}

impl<F> ContentAnalyzer for F
where
    F: Fn(&RequestModel, u16, &str) + Send + Sync,
{
    fn analyze(&self, request: &RequestModel, status: u16, body: &str) {
        self(request, status, body)
    }
}

/// Hands received bodies to a [`ContentAnalyzer`] without altering them.
#[derive(Clone)]
pub struct ResponseAnalyzer {
    analyzer: Arc<dyn ContentAnalyzer>,
}

impl ResponseAnalyzer {
    pub fn new(analyzer: impl ContentAnalyzer + 'static) -> Self {
        Self {
            analyzer: Arc::new(analyzer),
        }
    }
}

#[async_trait]
impl Interceptor for ResponseAnalyzer {
    fn name(&self) -> &str {
        "response_analyzer"
    }

    async fn on_response(
        &self,
        _ctx: &CallContext,
        request: &RequestModel,
        response: &mut RawResponse,
    ) -> Result<()> {
        let text = String::from_utf8_lossy(&response.body);
        self.analyzer.analyze(request, response.status, &text);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::CodecRegistry;
    use crate::request::{BoundEndpoint, CallArgs, EndpointDefinition, RequestDefaults};
    use crate::types::HeaderList;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;
    use url::Url;

    #[test]
    fn test_analyzer_sees_body_without_altering_it() {
        let base = Url::parse("http://localhost/").unwrap();
        let ep = BoundEndpoint::bind(EndpointDefinition::get("feed", "/feed"), &base).unwrap();
        let defaults = RequestDefaults {
            headers: HeaderList::new(),
            timeout: Duration::from_secs(1),
            sensitive: Vec::new(),
        };
        let req = RequestModel::build(&ep, &defaults, &CodecRegistry::new(), CallArgs::new()).unwrap();
        let ctx = CallContext::new(&req, CancellationToken::new());

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let analyzer = ResponseAnalyzer::new(move |_: &RequestModel, status: u16, body: &str| {
            sink.lock().unwrap().push(format!("{} {}", status, body));
        });

        let mut response = RawResponse::new(401).with_body("token expired");
        tokio_test::block_on(analyzer.on_response(&ctx, &req, &mut response)).unwrap();

        assert_eq!(*seen.lock().unwrap(), vec!["401 token expired"]);
        assert_eq!(response.body.as_ref(), b"token expired");
        assert_eq!(response.status, 401);
    }
}
