//! Mock HTTP server setup for integration tests

use lib_http::{EndpointDefinition, HttpClient, HttpClientBuilder};
use mockito::{Server, ServerGuard};

/// Test fixture that manages a mock server
pub struct MockServerFixture {
    pub server: ServerGuard,
    pub base_url: String,
}

impl MockServerFixture {
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        let base_url = format!("{}/v1/", server.url());
        Self { server, base_url }
    }

    /// Builder pointed at the mock server, using the default HTTP transport
    pub fn builder(&self) -> HttpClientBuilder {
        HttpClient::builder().base_url(&self.base_url)
    }

    pub fn client(&self, endpoints: Vec<EndpointDefinition>) -> lib_http::Result<HttpClient> {
        self.builder().endpoints(endpoints).build()
    }
}
