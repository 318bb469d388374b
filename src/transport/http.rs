use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;
use tracing::trace;

use super::Transport;
use crate::error::{NetworkError, NetworkErrorKind};
use crate::request::RequestModel;
use crate::types::{HeaderList, RawResponse};
use crate::{ClientError, ErrorContext, Result};

/// Connection-level settings for [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    pub connect_timeout: Duration,
    pub pool_max_idle_per_host: usize,
    pub pool_idle_timeout: Duration,
    pub user_agent: Option<String>,
    /// Hosts accepted for `https` requests. Empty accepts every host.
    pub trusted_hosts: Vec<String>,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(15),
            pool_max_idle_per_host: 32,
            pool_idle_timeout: Duration::from_secs(90),
            user_agent: Some(concat!("lib-http/", env!("CARGO_PKG_VERSION")).to_string()),
            trusted_hosts: Vec::new(),
        }
    }
}

impl HttpTransportConfig {
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_pool_max_idle_per_host(mut self, n: usize) -> Self {
        self.pool_max_idle_per_host = n;
        self
    }

    pub fn with_user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Trust a host, given bare (`api.example.com`) or as a URL.
    pub fn with_trusted_host(mut self, host_or_url: &str) -> Self {
        self.trusted_hosts.push(normalize_host(host_or_url));
        self
    }
}

fn normalize_host(host_or_url: &str) -> String {
    let raw = host_or_url.trim();
    url::Url::parse(raw)
        .ok()
        .and_then(|url| url.host_str().map(str::to_ascii_lowercase))
        .unwrap_or_else(|| raw.trim_end_matches('/').to_ascii_lowercase())
}

/// Default transport over a pooled `reqwest` client.
pub struct HttpTransport {
    client: reqwest::Client,
    trusted_hosts: Vec<String>,
}

#[derive(Clone, Copy)]
enum Phase {
    Send,
    Receive,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        Self::with_config(HttpTransportConfig::default())
    }

    pub fn with_config(config: HttpTransportConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(Some(config.pool_idle_timeout));
        if let Some(ua) = &config.user_agent {
            builder = builder.user_agent(ua.clone());
        }

        let client = builder.build().map_err(|e| {
            ClientError::configuration_with_context(
                format!("failed to build HTTP transport: {}", e),
                ErrorContext::new().with_source("http_transport"),
            )
        })?;
        Ok(Self {
            client,
            trusted_hosts: config.trusted_hosts,
        })
    }

    /// Wrap an already configured `reqwest` client.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self {
            client,
            trusted_hosts: Vec::new(),
        }
    }

    fn is_trusted(&self, url: &url::Url) -> bool {
        if self.trusted_hosts.is_empty() || url.scheme() != "https" {
            return true;
        }
        let host = url.host_str().unwrap_or_default();
        self.trusted_hosts
            .iter()
            .any(|trusted| trusted.eq_ignore_ascii_case(host))
    }

    fn classify(err: reqwest::Error, phase: Phase) -> NetworkError {
        let kind = if err.is_timeout() {
            NetworkErrorKind::Timeout
        } else if err.is_connect() {
            NetworkErrorKind::Connect
        } else {
            match phase {
                Phase::Send if err.is_request() || err.is_body() => NetworkErrorKind::Write,
                Phase::Receive if err.is_body() || err.is_decode() => NetworkErrorKind::Read,
                _ => NetworkErrorKind::Other,
            }
        };
        NetworkError::new(kind, err.to_string())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(
        &self,
        request: &RequestModel,
        deadline: Instant,
    ) -> std::result::Result<RawResponse, NetworkError> {
        let method = reqwest::Method::from_bytes(request.method().as_str().as_bytes())
            .map_err(|e| NetworkError::new(NetworkErrorKind::Other, e.to_string()))?;

        if !self.is_trusted(request.url()) {
            return Err(NetworkError::connect(format!(
                "host '{}' is not trusted",
                request.url().host_str().unwrap_or_default()
            )));
        }

        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(NetworkError::timeout("deadline passed before the request was sent"));
        }

        let mut builder = self
            .client
            .request(method, request.url().clone())
            .timeout(remaining);
        for (name, value) in request.headers().iter() {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body() {
            builder = builder.body(body.clone());
        }

        let started = std::time::Instant::now();
        let exchange = async {
            let resp = builder
                .send()
                .await
                .map_err(|e| Self::classify(e, Phase::Send))?;
            let status = resp.status().as_u16();
            let mut headers = HeaderList::new();
            for (name, value) in resp.headers() {
                headers.append(name.as_str(), String::from_utf8_lossy(value.as_bytes()));
            }
            let body = resp
                .bytes()
                .await
                .map_err(|e| Self::classify(e, Phase::Receive))?;
            Ok::<_, NetworkError>(RawResponse {
                status,
                headers,
                body,
                elapsed: started.elapsed(),
            })
        };

        let response = tokio::time::timeout_at(deadline, exchange)
            .await
            .map_err(|_| NetworkError::timeout(format!("no response within {:?}", remaining)))??;

        trace!(
            url = %request.url(),
            status = response.status,
            bytes = response.body.len(),
            "http transport exchange finished"
        );
        Ok(response)
    }
}
