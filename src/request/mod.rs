//! Request model: endpoint definitions plus caller arguments resolved into a
//! concrete outbound call.
//!
//! ## Header precedence
//!
//! Headers are merged tier by tier, later tiers replacing earlier ones by
//! case-insensitive name:
//!
//! ```text
//! codec Content-Type < endpoint defaults < client defaults < interceptor injected < per-call overrides
//! ```
//!
//! Per-call overrides are applied at build time and *pinned*: interceptors that
//! inject headers through [`RequestModel::inject_header`] cannot replace them.

mod args;
mod endpoint;
mod template;

pub use args::CallArgs;
pub use endpoint::{EndpointDefinition, ParamBinding, ParamKind, ParamLocation};
pub use template::PathTemplate;

use bytes::Bytes;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;
use uuid::Uuid;

use crate::codec::CodecRegistry;
use crate::types::{mime, HeaderList, HttpMethod};
use crate::{ClientError, ErrorContext, Result};

/// An endpoint definition validated against the client configuration.
#[derive(Debug, Clone)]
pub struct BoundEndpoint {
    pub definition: EndpointDefinition,
    pub template: PathTemplate,
    pub base_url: Url,
}

impl BoundEndpoint {
    /// Parse the template and check its placeholders against the declared bindings.
    pub fn bind(definition: EndpointDefinition, client_base: &Url) -> Result<Self> {
        let ctx = |field: String| {
            ErrorContext::new()
                .with_field_path(field)
                .with_source("endpoint_binding")
        };
        let id = definition.id.clone();

        let template = PathTemplate::parse(&definition.path).map_err(|e| match e {
            ClientError::Configuration { message, context } => ClientError::Configuration {
                message: format!("endpoint '{}': {}", id, message),
                context,
            },
            other => other,
        })?;

        for name in template.placeholders() {
            match definition.binding(name) {
                Some(b) if b.location == ParamLocation::Path => {}
                _ => {
                    return Err(ClientError::configuration_with_context(
                        format!("endpoint '{}': placeholder '{{{}}}' has no path binding", id, name),
                        ctx(format!("endpoints.{}.params.{}", id, name)),
                    ))
                }
            }
        }

        let mut seen = Vec::new();
        for binding in &definition.params {
            if seen.contains(&binding.name.as_str()) {
                return Err(ClientError::configuration_with_context(
                    format!("endpoint '{}': parameter '{}' declared twice", id, binding.name),
                    ctx(format!("endpoints.{}.params.{}", id, binding.name)),
                ));
            }
            seen.push(binding.name.as_str());

            if binding.location == ParamLocation::Path {
                if !template.placeholders().any(|p| p == binding.name) {
                    return Err(ClientError::configuration_with_context(
                        format!(
                            "endpoint '{}': path parameter '{}' does not appear in '{}'",
                            id, binding.name, definition.path
                        ),
                        ctx(format!("endpoints.{}.params.{}", id, binding.name)),
                    ));
                }
                if !binding.required {
                    return Err(ClientError::configuration_with_context(
                        format!("endpoint '{}': path parameter '{}' must be required", id, binding.name),
                        ctx(format!("endpoints.{}.params.{}", id, binding.name)),
                    ));
                }
            }
        }

        if definition.body.is_some() && !definition.method.allows_body() {
            return Err(ClientError::configuration_with_context(
                format!("endpoint '{}': {} requests cannot carry a body", id, definition.method),
                ctx(format!("endpoints.{}.body", id)),
            ));
        }

        if definition.timeout == Some(Duration::ZERO) {
            return Err(ClientError::configuration_with_context(
                format!("endpoint '{}': timeout must be greater than zero", id),
                ctx(format!("endpoints.{}.timeout", id)),
            ));
        }

        let base_url = match &definition.base_url {
            Some(raw) => parse_base_url(raw, &format!("endpoints.{}.base_url", id))?,
            None => client_base.clone(),
        };

        Ok(Self {
            definition,
            template,
            base_url,
        })
    }

    pub fn id(&self) -> &str {
        &self.definition.id
    }
}

/// Parse a base URL, rejecting URLs that cannot carry a path.
pub(crate) fn parse_base_url(raw: &str, field: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| {
        ClientError::configuration_with_context(
            format!("invalid base URL '{}': {}", raw, e),
            ErrorContext::new()
                .with_field_path(field.to_string())
                .with_source("client_builder"),
        )
    })?;
    if url.cannot_be_a_base() || url.query().is_some() || url.fragment().is_some() {
        return Err(ClientError::configuration_with_context(
            format!("base URL '{}' must be a hierarchical URL without query or fragment", raw),
            ErrorContext::new()
                .with_field_path(field.to_string())
                .with_source("client_builder"),
        ));
    }
    Ok(url)
}

/// Client-wide defaults applied to every request.
#[derive(Debug, Clone)]
pub struct RequestDefaults {
    pub headers: HeaderList,
    pub timeout: Duration,
    pub sensitive: Vec<String>,
}

/// One outbound call, fully resolved. Owned by the call that created it.
#[derive(Debug, Clone)]
pub struct RequestModel {
    request_id: String,
    endpoint_id: String,
    method: HttpMethod,
    url: Url,
    headers: HeaderList,
    pinned: Vec<String>,
    sensitive: Vec<String>,
    body: Option<Bytes>,
    timeout: Duration,
}

impl RequestModel {
    /// Resolve `args` against `endpoint`. Fails before any network activity when an
    /// argument is missing, of the wrong shape or not declared.
    pub fn build(
        endpoint: &BoundEndpoint,
        defaults: &RequestDefaults,
        codecs: &CodecRegistry,
        args: CallArgs,
    ) -> Result<Self> {
        let def = &endpoint.definition;
        let id = def.id.as_str();
        let arg_error = |msg: String, field: String| {
            ClientError::configuration_with_context(
                format!("endpoint '{}': {}", id, msg),
                ErrorContext::new()
                    .with_field_path(field)
                    .with_source("request_builder"),
            )
        };

        for name in args.path.keys() {
            match def.binding(name) {
                Some(b) if b.location == ParamLocation::Path => {}
                _ => {
                    return Err(arg_error(
                        format!("unknown path parameter '{}'", name),
                        format!("args.path.{}", name),
                    ))
                }
            }
        }

        let mut path_values = HashMap::new();
        let mut query_pairs: Vec<(String, String)> = Vec::new();

        for binding in &def.params {
            match binding.location {
                ParamLocation::Path => {
                    let field = format!("args.path.{}", binding.name);
                    let value = args
                        .path
                        .get(&binding.name)
                        .filter(|v| !v.is_null() && v.as_str() != Some(""))
                        .ok_or_else(|| {
                            arg_error(
                                format!("missing required path parameter '{}'", binding.name),
                                field.clone(),
                            )
                        })?;
                    if !binding.kind.accepts(value) {
                        return Err(arg_error(
                            format!(
                                "path parameter '{}' expected {}, got {}",
                                binding.name,
                                binding.kind.as_str(),
                                value
                            ),
                            field,
                        ));
                    }
                    path_values.insert(binding.name.clone(), scalar_to_string(value));
                }
                ParamLocation::Query => {
                    let field = format!("args.query.{}", binding.name);
                    let value = args
                        .query
                        .iter()
                        .find(|(k, _)| *k == binding.name)
                        .map(|(_, v)| v)
                        .filter(|v| !v.is_null());
                    match value {
                        None if binding.required => {
                            return Err(arg_error(
                                format!("missing required query parameter '{}'", binding.name),
                                field,
                            ))
                        }
                        None => {}
                        Some(value) => {
                            push_query(&mut query_pairs, &binding.name, value, binding.kind)
                                .map_err(|msg| arg_error(msg, field))?;
                        }
                    }
                }
            }
        }

        for (name, value) in &args.query {
            if def.binding(name).is_some() || value.is_null() {
                continue;
            }
            push_query(&mut query_pairs, name, value, ParamKind::Any)
                .map_err(|msg| arg_error(msg, format!("args.query.{}", name)))?;
        }

        let mut url = endpoint.template.render_onto(&endpoint.base_url, &path_values)?;
        if !query_pairs.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in &query_pairs {
                pairs.append_pair(k, v);
            }
        }

        let mut headers = HeaderList::new();
        let body = match (def.body, args.body) {
            (None, None) => None,
            (Some(expected), Some(pending)) => {
                if pending.key != expected {
                    return Err(arg_error(
                        format!("body must be {}, got {}", expected, pending.key),
                        "args.body".into(),
                    ));
                }
                let codec = codecs.erased(&expected).ok_or_else(|| {
                    arg_error(format!("no codec registered for {}", expected), "args.body".into())
                })?;
                let bytes = codec
                    .encode_any(&*pending.value)
                    .map_err(|e| arg_error(e.to_string(), "args.body".into()))?;
                headers.insert(mime::CONTENT_TYPE, codec.content_type());
                Some(bytes)
            }
            (Some(expected), None) => {
                return Err(arg_error(
                    format!("missing request body of type {}", expected),
                    "args.body".into(),
                ))
            }
            (None, Some(pending)) => {
                return Err(arg_error(
                    format!("endpoint declares no body, got {}", pending.key),
                    "args.body".into(),
                ))
            }
        };

        headers.merge(&def.headers);
        headers.merge(&defaults.headers);
        headers.merge(&args.headers);
        let pinned = args
            .headers
            .names()
            .map(|n| n.to_ascii_lowercase())
            .collect();

        let timeout = args
            .timeout
            .or(def.timeout)
            .unwrap_or(defaults.timeout);
        if timeout.is_zero() {
            return Err(arg_error(
                "timeout must be greater than zero".into(),
                "args.timeout".into(),
            ));
        }

        let mut sensitive = defaults.sensitive.clone();
        sensitive.extend(args.sensitive);

        Ok(Self {
            request_id: Uuid::new_v4().to_string(),
            endpoint_id: def.id.clone(),
            method: def.method,
            url,
            headers,
            pinned,
            sensitive,
            body,
            timeout,
        })
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn endpoint_id(&self) -> &str {
        &self.endpoint_id
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &HeaderList {
        &self.headers
    }

    /// Direct header access. Bypasses override pinning; prefer [`Self::inject_header`].
    pub fn headers_mut(&mut self) -> &mut HeaderList {
        &mut self.headers
    }

    /// Insert a header at the interceptor tier.
    ///
    /// Returns `false` and leaves the request untouched when the call pinned the
    /// name with a per-call override.
    pub fn inject_header(&mut self, name: &str, value: &str) -> bool {
        if self.is_pinned(name) {
            return false;
        }
        self.headers.insert(name, value);
        true
    }

    pub fn is_pinned(&self, name: &str) -> bool {
        self.pinned.iter().any(|p| p.eq_ignore_ascii_case(name))
    }

    /// Header names the caller marked sensitive for this call.
    pub fn sensitive_headers(&self) -> &[String] {
        &self.sensitive
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    pub fn set_body(&mut self, body: Option<Bytes>) {
        self.body = body;
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn push_query(
    pairs: &mut Vec<(String, String)>,
    name: &str,
    value: &Value,
    kind: ParamKind,
) -> std::result::Result<(), String> {
    let items: Vec<&Value> = match value {
        Value::Array(items) => items.iter().filter(|v| !v.is_null()).collect(),
        single => vec![single],
    };
    for item in items {
        if !kind.accepts(item) {
            return Err(format!(
                "query parameter '{}' expected {}, got {}",
                name,
                kind.as_str(),
                item
            ));
        }
        pairs.push((name.to_string(), scalar_to_string(item)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize)]
    struct NewNote {
        title: String,
    }

    fn base() -> Url {
        Url::parse("https://api.example.com/v1/").unwrap()
    }

    fn defaults() -> RequestDefaults {
        RequestDefaults {
            headers: HeaderList::new()
                .with("Accept", "application/json")
                .with("X-Client", "default"),
            timeout: Duration::from_secs(15),
            sensitive: Vec::new(),
        }
    }

    fn note_endpoint() -> BoundEndpoint {
        let def = EndpointDefinition::get("note", "/users/{user}/notes/{note}")
            .param(ParamBinding::path("user").kind(ParamKind::Integer))
            .param(ParamBinding::path("note").kind(ParamKind::String))
            .param(ParamBinding::query("verbose").kind(ParamKind::Boolean))
            .param(ParamBinding::query("fields").required(true))
            .header("X-Client", "endpoint")
            .header("X-Endpoint", "note");
        BoundEndpoint::bind(def, &base()).unwrap()
    }

    #[test]
    fn test_build_resolves_url_and_query_order() {
        let ep = note_endpoint();
        let args = CallArgs::new()
            .path("user", 42)
            .path("note", "n 1")
            .query("extra", "x")
            .query("fields", json!(["a", "b"]))
            .query("verbose", true);
        let req = RequestModel::build(&ep, &defaults(), &CodecRegistry::new(), args).unwrap();

        assert_eq!(
            req.url().as_str(),
            "https://api.example.com/v1/users/42/notes/n%201?verbose=true&fields=a&fields=b&extra=x"
        );
        assert_eq!(req.method(), HttpMethod::Get);
        assert_eq!(req.timeout(), Duration::from_secs(15));
        assert!(req.body().is_none());
        assert!(!req.request_id().is_empty());
    }

    #[test]
    fn test_missing_or_misshaped_params_fail() {
        let ep = note_endpoint();
        let codecs = CodecRegistry::new();

        let missing = CallArgs::new().path("user", 1).query("fields", "a");
        let err = RequestModel::build(&ep, &defaults(), &codecs, missing).unwrap_err();
        assert!(err.to_string().contains("missing required path parameter 'note'"));

        let wrong = CallArgs::new()
            .path("user", "one")
            .path("note", "n")
            .query("fields", "a");
        let err = RequestModel::build(&ep, &defaults(), &codecs, wrong).unwrap_err();
        assert_eq!(
            err.context().and_then(|c| c.field_path.as_deref()),
            Some("args.path.user")
        );

        let no_query = CallArgs::new().path("user", 1).path("note", "n");
        let err = RequestModel::build(&ep, &defaults(), &codecs, no_query).unwrap_err();
        assert!(err.to_string().contains("missing required query parameter 'fields'"));

        let unknown = CallArgs::new()
            .path("user", 1)
            .path("note", "n")
            .path("bogus", 1)
            .query("fields", "a");
        assert!(RequestModel::build(&ep, &defaults(), &codecs, unknown).is_err());
    }

    #[test]
    fn test_empty_and_dot_path_values_fail() {
        let ep = note_endpoint();
        let codecs = CodecRegistry::new();

        let empty = CallArgs::new().path("user", 1).path("note", "").query("fields", "a");
        let err = RequestModel::build(&ep, &defaults(), &codecs, empty).unwrap_err();
        assert!(err.to_string().contains("missing required path parameter 'note'"));

        for value in ["..", "."] {
            let args = CallArgs::new().path("user", 1).path("note", value).query("fields", "a");
            let err = RequestModel::build(&ep, &defaults(), &codecs, args).unwrap_err();
            assert_eq!(
                err.context().and_then(|c| c.field_path.as_deref()),
                Some("args.path.note")
            );
        }
    }

    #[test]
    fn test_header_precedence() {
        let ep = note_endpoint();
        let args = CallArgs::new()
            .path("user", 1)
            .path("note", "n")
            .query("fields", "a")
            .header("accept", "text/plain");
        let mut req = RequestModel::build(&ep, &defaults(), &CodecRegistry::new(), args).unwrap();

        assert_eq!(req.headers().get("X-Client"), Some("default"));
        assert_eq!(req.headers().get("X-Endpoint"), Some("note"));
        assert_eq!(req.headers().get("Accept"), Some("text/plain"));

        assert!(req.inject_header("X-Client", "interceptor"));
        assert!(!req.inject_header("ACCEPT", "application/xml"));
        assert_eq!(req.headers().get("x-client"), Some("interceptor"));
        assert_eq!(req.headers().get("accept"), Some("text/plain"));
    }

    #[test]
    fn test_building_leaves_endpoint_untouched() {
        let ep = note_endpoint();
        let before = ep.definition.clone();
        for i in 0..3 {
            let args = CallArgs::new()
                .path("user", i)
                .path("note", "n")
                .query("fields", "a")
                .header("X-Endpoint", "override");
            RequestModel::build(&ep, &defaults(), &CodecRegistry::new(), args).unwrap();
        }
        assert_eq!(ep.definition, before);
    }

    #[test]
    fn test_body_is_encoded_with_registered_codec() {
        let def = EndpointDefinition::post("create", "/notes").body::<NewNote>();
        let ep = BoundEndpoint::bind(def, &base()).unwrap();
        let codecs = CodecRegistry::new().with_json::<NewNote>();

        let args = CallArgs::new().body(NewNote {
            title: "hello".into(),
        });
        let req = RequestModel::build(&ep, &defaults(), &codecs, args).unwrap();
        assert_eq!(req.body().unwrap().as_ref(), br#"{"title":"hello"}"#);
        assert_eq!(req.headers().get("content-type"), Some(mime::APPLICATION_JSON));

        let wrong = CallArgs::new().body("text".to_string());
        assert!(RequestModel::build(&ep, &defaults(), &codecs, wrong).is_err());
        assert!(RequestModel::build(&ep, &defaults(), &codecs, CallArgs::new()).is_err());
    }

    #[test]
    fn test_bind_rejects_inconsistent_definitions() {
        let unbound = EndpointDefinition::get("a", "/users/{id}");
        assert!(BoundEndpoint::bind(unbound, &base()).is_err());

        let stray = EndpointDefinition::get("b", "/users").param(ParamBinding::path("id"));
        assert!(BoundEndpoint::bind(stray, &base()).is_err());

        let body_on_get = EndpointDefinition::get("c", "/users").body::<String>();
        assert!(BoundEndpoint::bind(body_on_get, &base()).is_err());

        let bad_base = EndpointDefinition::get("d", "/users").base_url("not a url");
        assert!(BoundEndpoint::bind(bad_base, &base()).is_err());
    }

    #[test]
    fn test_timeout_resolution() {
        let def = EndpointDefinition::get("slow", "/slow").timeout(Duration::from_secs(60));
        let ep = BoundEndpoint::bind(def, &base()).unwrap();
        let codecs = CodecRegistry::new();

        let req = RequestModel::build(&ep, &defaults(), &codecs, CallArgs::new()).unwrap();
        assert_eq!(req.timeout(), Duration::from_secs(60));

        let args = CallArgs::new().timeout(Duration::from_millis(250));
        let req = RequestModel::build(&ep, &defaults(), &codecs, args).unwrap();
        assert_eq!(req.timeout(), Duration::from_millis(250));
    }
}
