use async_trait::async_trait;
use bytes::Bytes;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::debug;

use super::{CallContext, Interceptor};
use crate::codec::FormBody;
use crate::request::RequestModel;
use crate::types::{mime, HttpMethod};
use crate::{ClientError, ErrorContext, Result};

const DEFAULT_PAGE: i64 = 1;
const DEFAULT_PAGE_SIZE: i64 = 10;

/// Replacement body produced by a [`BodyBuilder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebuiltBody {
    pub content_type: String,
    pub bytes: Bytes,
}

impl RebuiltBody {
    pub fn json(value: &Value) -> Result<Self> {
        let bytes = serde_json::to_vec(value).map_err(|e| {
            ClientError::configuration_with_context(
                format!("failed to encode rebuilt body: {}", e),
                ErrorContext::new().with_source("body_transformer"),
            )
        })?;
        Ok(Self {
            content_type: mime::APPLICATION_JSON.to_string(),
            bytes: Bytes::from(bytes),
        })
    }
}

/// Builds a new body from the non-empty fields of a form body.
pub trait BodyBuilder: Send + Sync {
    fn build_body(&self, request: &RequestModel, fields: Map<String, Value>) -> Result<RebuiltBody>;
}

impl<F> BodyBuilder for F
where
    F: Fn(&RequestModel, Map<String, Value>) -> Result<RebuiltBody> + Send + Sync,
{
    fn build_body(&self, request: &RequestModel, fields: Map<String, Value>) -> Result<RebuiltBody> {
        self(request, fields)
    }
}

/// Rewrites urlencoded form bodies of non-GET requests as JSON.
///
/// Without a [`BodyBuilder`] the fields become the paging envelope
///
/// ```text
/// {"data": {...fields}, "pageQueryReq": {"page": 1, "pageSize": 10}}
/// ```
///
/// where `page` and `pageSize` are lifted out of the form and `pageQueryReq`
/// is present only when the form carried either of them. Fields with an empty
/// name or value are dropped.
#[derive(Clone, Default)]
pub struct BodyTransformer {
    builder: Option<Arc<dyn BodyBuilder>>,
}

impl BodyTransformer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builder(builder: impl BodyBuilder + 'static) -> Self {
        Self {
            builder: Some(Arc::new(builder)),
        }
    }
}

fn is_form(request: &RequestModel) -> bool {
    request
        .headers()
        .get(mime::CONTENT_TYPE)
        .map(|ct| {
            ct.split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .eq_ignore_ascii_case(mime::APPLICATION_FORM_URL_ENCODED)
        })
        .unwrap_or(false)
}

fn page_value(name: &str, raw: &str) -> Result<i64> {
    raw.trim().parse::<i64>().map_err(|_| {
        ClientError::configuration_with_context(
            format!("form field '{}' is not an integer", name),
            ErrorContext::new()
                .with_field_path(format!("args.body.{}", name))
                .with_details(raw.to_string())
                .with_source("body_transformer"),
        )
    })
}

fn paging_envelope(fields: Map<String, Value>) -> Result<Value> {
    let mut data = Map::new();
    let mut page = None;
    let mut page_size = None;
    for (name, value) in fields {
        let raw = value.as_str().unwrap_or_default();
        match name.as_str() {
            "page" => page = Some(page_value(&name, raw)?),
            "pageSize" => page_size = Some(page_value(&name, raw)?),
            _ => {
                data.insert(name, value);
            }
        }
    }

    let mut envelope = json!({ "data": data });
    if page.is_some() || page_size.is_some() {
        envelope["pageQueryReq"] = json!({
            "page": page.unwrap_or(DEFAULT_PAGE),
            "pageSize": page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        });
    }
    Ok(envelope)
}

#[async_trait]
impl Interceptor for BodyTransformer {
    fn name(&self) -> &str {
        "body_transformer"
    }

    async fn on_request(&self, ctx: &CallContext, request: &mut RequestModel) -> Result<()> {
        if request.method() == HttpMethod::Get || !is_form(request) {
            return Ok(());
        }
        let Some(body) = request.body() else {
            return Ok(());
        };

        let mut fields = Map::new();
        for (name, value) in FormBody::parse(body).iter() {
            if name.is_empty() || value.is_empty() {
                continue;
            }
            fields.insert(name.to_string(), Value::String(value.to_string()));
        }

        let rebuilt = match &self.builder {
            Some(builder) => builder.build_body(request, fields)?,
            None => RebuiltBody::json(&paging_envelope(fields)?)?,
        };
        debug!(
            request_id = %ctx.request_id(),
            content_type = %rebuilt.content_type,
            bytes = rebuilt.bytes.len(),
            "form body rewritten"
        );
        request
            .headers_mut()
            .insert(mime::CONTENT_TYPE, rebuilt.content_type);
        request.set_body(Some(rebuilt.bytes));
        Ok(())
    }
}
