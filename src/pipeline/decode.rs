use bytes::Bytes;
use std::any::Any;
use std::sync::Arc;
use tracing::debug;

use super::state::{CallState, StateTracker};
use crate::codec::{CodecError, CodecRegistry, TypeKey};
use crate::error::ErrorBody;
use crate::request::EndpointDefinition;
use crate::types::{RawResponse, TypedResult};
use crate::{ClientError, ErrorContext, Result};

/// Maximum size of body excerpts attached to errors and debug logs.
pub const EXCERPT_LIMIT: usize = 256;

pub(crate) type AnyValue = Box<dyn Any + Send + Sync>;

/// Lossy UTF-8 view of at most `limit` bytes of `body`, never splitting a character.
pub fn excerpt(body: &[u8], limit: usize) -> String {
    let cut = &body[..body.len().min(limit)];
    match std::str::from_utf8(cut) {
        Ok(text) => text.to_string(),
        // Cut in the middle of a multi-byte sequence.
        Err(e) if e.error_len().is_none() => String::from_utf8_lossy(&cut[..e.valid_up_to()]).into_owned(),
        Err(_) => String::from_utf8_lossy(cut).into_owned(),
    }
}

/// Turn a raw response into the endpoint's success value or a classified error.
///
/// 2xx bodies are decoded with the success type. Any other status becomes
/// [`ClientError::Http`], with the body decoded as the error type when present.
/// A body that does not parse as the expected type yields [`ClientError::Decode`].
pub(crate) fn decode_response(
    tracker: &StateTracker,
    definition: &EndpointDefinition,
    codecs: &CodecRegistry,
    request_id: &str,
    response: RawResponse,
) -> Result<TypedResult<AnyValue>> {
    tracker.advance(CallState::Decoding);
    let outcome = decode(definition, codecs, request_id, response);
    tracker.advance(if outcome.is_ok() {
        CallState::Succeeded
    } else {
        CallState::Failed
    });
    outcome
}

fn decode(
    definition: &EndpointDefinition,
    codecs: &CodecRegistry,
    request_id: &str,
    response: RawResponse,
) -> Result<TypedResult<AnyValue>> {
    let RawResponse {
        status,
        headers,
        body,
        ..
    } = response;

    if (200..300).contains(&status) {
        let value = decode_as(codecs, &definition.success, status, &body)?;
        return Ok(TypedResult {
            value,
            status,
            headers,
            request_id: request_id.to_string(),
        });
    }

    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ClientError::Http {
            status,
            headers,
            body: ErrorBody::empty(),
        });
    }

    let value = decode_as(codecs, &definition.error, status, &body)?;
    Err(ClientError::Http {
        status,
        headers,
        body: ErrorBody::decoded(
            Arc::from(value),
            definition.error.name(),
            excerpt(&body, EXCERPT_LIMIT),
        ),
    })
}

fn decode_as(codecs: &CodecRegistry, key: &TypeKey, status: u16, body: &Bytes) -> Result<AnyValue> {
    let codec = codecs.erased(key).ok_or_else(|| {
        ClientError::configuration_with_context(
            format!("no codec registered for {}", key),
            ErrorContext::new()
                .with_details(format!("HTTP {}", status))
                .with_source("response_pipeline"),
        )
    })?;
    codec
        .decode_any(body)
        .map_err(|e| decode_failure(e, status, body))
}

fn decode_failure(err: CodecError, status: u16, body: &[u8]) -> ClientError {
    debug!(status, error = %err, "response body did not match the expected type");
    let field = err.field().map(str::to_string);
    let message = match err {
        CodecError::Decode { message, .. } | CodecError::Encode { message } => message,
    };
    ClientError::Decode {
        status: Some(status),
        field,
        message,
        excerpt: excerpt(body, EXCERPT_LIMIT),
    }
}
