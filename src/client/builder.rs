use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::{Handle, Runtime};
use tracing::info;

use super::config::ClientConfig;
use super::core::{ClientInner, HttpClient, OwnedRuntime};
use crate::codec::Codec;
use crate::interceptors::Interceptor;
use crate::request::{parse_base_url, BoundEndpoint, EndpointDefinition, RequestDefaults};
use crate::transport::{HttpTransport, Transport};
use crate::{ClientError, ErrorContext, Result};

/// Builder for [`HttpClient`].
///
/// Everything is validated in [`build`](Self::build); a client that builds
/// successfully never reports setup problems later.
pub struct HttpClientBuilder {
    config: ClientConfig,
    endpoints: Vec<EndpointDefinition>,
    transport: Option<Arc<dyn Transport>>,
    runtime: Option<Handle>,
}

impl HttpClientBuilder {
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
            endpoints: Vec::new(),
            transport: None,
            runtime: None,
        }
    }

    /// Replace the whole configuration at once.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(name, value);
        self
    }

    pub fn default_timeout(mut self, timeout: Duration) -> Self {
        self.config.default_timeout = timeout;
        self
    }

    /// Append an interceptor. Request hooks run in insertion order.
    pub fn interceptor<I: Interceptor + 'static>(mut self, interceptor: I) -> Self {
        self.config.interceptors.push(Arc::new(interceptor));
        self
    }

    pub fn interceptor_arc(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.config.interceptors.push(interceptor);
        self
    }

    pub fn codec<T, C>(mut self, codec: C) -> Self
    where
        T: Send + Sync + 'static,
        C: Codec<T> + 'static,
    {
        self.config.codecs.register::<T, C>(codec);
        self
    }

    /// Register the JSON codec for `T`.
    pub fn json<T>(mut self) -> Self
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        self.config.codecs.register_json::<T>();
        self
    }

    /// Redact this header in logs for every call.
    pub fn sensitive_header(mut self, name: impl Into<String>) -> Self {
        self.config.sensitive_headers.push(name.into());
        self
    }

    pub fn endpoint(mut self, endpoint: EndpointDefinition) -> Self {
        self.endpoints.push(endpoint);
        self
    }

    pub fn endpoints(mut self, endpoints: impl IntoIterator<Item = EndpointDefinition>) -> Self {
        self.endpoints.extend(endpoints);
        self
    }

    /// Use a custom transport instead of the default [`HttpTransport`].
    pub fn transport<T: Transport + 'static>(mut self, transport: T) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    pub fn transport_arc(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Run calls on this runtime. Defaults to the runtime active during
    /// [`build`](Self::build), or a runtime owned by the client when there is none.
    pub fn runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    /// Validate the configuration and build the client.
    pub fn build(self) -> Result<HttpClient> {
        let ClientConfig {
            base_url,
            default_headers,
            default_timeout,
            interceptors,
            codecs,
            sensitive_headers,
        } = self.config;

        let base_url = parse_base_url(&base_url, "base_url")?;
        if default_timeout.is_zero() {
            return Err(ClientError::configuration_with_context(
                "default timeout must be greater than zero",
                ErrorContext::new()
                    .with_field_path("default_timeout")
                    .with_source("client_builder"),
            ));
        }

        let mut endpoints = HashMap::new();
        let mut order = Vec::new();
        let mut routes: HashSet<(String, String)> = HashSet::new();

        for definition in self.endpoints {
            let id = definition.id.clone();
            let ctx = |field: String| {
                ErrorContext::new()
                    .with_field_path(field)
                    .with_source("client_builder")
            };

            if id.trim().is_empty() {
                return Err(ClientError::configuration_with_context(
                    "endpoint id must not be empty",
                    ctx("endpoints.id".into()),
                ));
            }
            if endpoints.contains_key(&id) {
                return Err(ClientError::configuration_with_context(
                    format!("duplicate endpoint id '{}'", id),
                    ctx(format!("endpoints.{}", id)),
                ));
            }

            let bound = BoundEndpoint::bind(definition, &base_url)?;

            // Placeholders compare positionally: /users/{id} and /users/{name} collide.
            let route = (
                bound.definition.method.to_string(),
                format!("{}{}", bound.base_url.as_str().trim_end_matches('/'), bound.template.signature()),
            );
            if !routes.insert(route) {
                return Err(ClientError::configuration_with_context(
                    format!(
                        "endpoint '{}': {} {} conflicts with an earlier endpoint",
                        id, bound.definition.method, bound.definition.path
                    ),
                    ctx(format!("endpoints.{}.path", id)),
                ));
            }

            for (role, key) in bound.definition.codec_types() {
                if !codecs.contains(&key) {
                    return Err(ClientError::configuration_with_context(
                        format!("endpoint '{}': no codec registered for {} type {}", id, role, key),
                        ctx(format!("endpoints.{}.{}", id, role)).with_details(key.name()),
                    ));
                }
            }

            order.push(id.clone());
            endpoints.insert(id, Arc::new(bound));
        }

        let transport = match self.transport {
            Some(t) => t,
            None => Arc::new(HttpTransport::new()?) as Arc<dyn Transport>,
        };

        let (runtime, owned) = match self.runtime {
            Some(handle) => (handle, None),
            None => match Handle::try_current() {
                Ok(handle) => (handle, None),
                Err(_) => {
                    let rt = owned_runtime()?;
                    (rt.handle().clone(), Some(rt))
                }
            },
        };

        info!(
            base_url = %base_url,
            endpoints = order.len(),
            interceptors = interceptors.len(),
            codecs = codecs.len(),
            owned_runtime = owned.is_some(),
            "http client built"
        );

        Ok(HttpClient {
            inner: Arc::new(ClientInner {
                base_url,
                endpoints,
                order,
                defaults: RequestDefaults {
                    headers: default_headers,
                    timeout: default_timeout,
                    sensitive: sensitive_headers,
                },
                interceptors: Arc::new(interceptors),
                codecs: Arc::new(codecs),
                transport,
                runtime,
                _owned_runtime: OwnedRuntime::new(owned),
            }),
        })
    }
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn owned_runtime() -> Result<Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("lib-http-worker")
        .build()
        .map_err(|e| {
            ClientError::configuration_with_context(
                format!("failed to start worker runtime: {}", e),
                ErrorContext::new().with_source("client_builder"),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::ParamBinding;

    fn builder() -> HttpClientBuilder {
        HttpClientBuilder::new().base_url("https://api.example.com/v1/")
    }

    fn err_text(b: HttpClientBuilder) -> String {
        match b.build() {
            Ok(_) => panic!("expected build to fail"),
            Err(e) => e.to_string(),
        }
    }

    #[tokio::test]
    async fn test_build_registers_endpoints() {
        let client = builder()
            .endpoint(EndpointDefinition::get("list", "/users"))
            .endpoint(EndpointDefinition::get("one", "/users/{id}").path_params_from_template())
            .build()
            .unwrap();
        let ids: Vec<_> = client.endpoints().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["list", "one"]);
        assert_eq!(client.base_url().as_str(), "https://api.example.com/v1/");
    }

    #[tokio::test]
    async fn test_invalid_base_url() {
        assert!(err_text(HttpClientBuilder::new().base_url("::nope")).contains("invalid base URL"));
        assert!(err_text(HttpClientBuilder::new()).contains("base_url"));
    }

    #[tokio::test]
    async fn test_duplicate_and_conflicting_endpoints() {
        let dup = builder()
            .endpoint(EndpointDefinition::get("a", "/x"))
            .endpoint(EndpointDefinition::post("a", "/y"));
        assert!(err_text(dup).contains("duplicate endpoint id 'a'"));

        let conflict = builder()
            .endpoint(EndpointDefinition::get("by_id", "/users/{id}").path_params_from_template())
            .endpoint(EndpointDefinition::get("by_name", "users/{name}/").path_params_from_template());
        assert!(err_text(conflict).contains("conflicts"));

        let other_method = builder()
            .endpoint(EndpointDefinition::get("get", "/users/{id}").path_params_from_template())
            .endpoint(EndpointDefinition::delete("del", "/users/{id}").path_params_from_template());
        assert!(other_method.build().is_ok());
    }

    #[tokio::test]
    async fn test_template_and_binding_errors() {
        let malformed = builder().endpoint(EndpointDefinition::get("bad", "/users/{id"));
        assert!(err_text(malformed).contains("bad"));

        let unbound = builder().endpoint(EndpointDefinition::get("u", "/users/{id}"));
        assert!(err_text(unbound).contains("no path binding"));

        let query_for_path = builder()
            .endpoint(EndpointDefinition::get("q", "/users/{id}").param(ParamBinding::query("id")));
        assert!(err_text(query_for_path).contains("no path binding"));
    }

    #[tokio::test]
    async fn test_missing_codec() {
        struct Unregistered;

        let missing = builder().endpoint(EndpointDefinition::get("m", "/m").returns::<Unregistered>());
        let text = err_text(missing);
        assert!(text.contains("no codec registered for success type"));
        assert!(text.contains("endpoints.m.success"));
    }

    #[tokio::test]
    async fn test_zero_default_timeout() {
        let b = builder().default_timeout(Duration::ZERO);
        assert!(err_text(b).contains("timeout"));
    }
}
