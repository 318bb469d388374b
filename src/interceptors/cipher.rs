use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use tracing::debug;
use url::Url;

use super::{CallContext, Interceptor};
use crate::request::RequestModel;
use crate::types::RawResponse;
use crate::Result;

/// Encrypts an outgoing body. `url` is the resolved request URL.
pub trait Encryptor: Send + Sync {
    fn encrypt(&self, url: &Url, plaintext: &str) -> String;
}

/// Decrypts a successful response body.
pub trait Decryptor: Send + Sync {
    fn decrypt(&self, url: &Url, ciphertext: &str) -> String;
}

impl<F> Encryptor for F
where
    F: Fn(&Url, &str) -> String + Send + Sync,
{
    fn encrypt(&self, url: &Url, plaintext: &str) -> String {
        self(url, plaintext)
    }
}

impl<F> Decryptor for F
where
    F: Fn(&Url, &str) -> String + Send + Sync,
{
    fn decrypt(&self, url: &Url, ciphertext: &str) -> String {
        self(url, ciphertext)
    }
}

/// Transparent body encryption and decryption.
///
/// Only UTF-8 bodies are touched. Response bodies are decrypted for 2xx
/// statuses only. An empty or unchanged result leaves the payload as it was.
#[derive(Clone, Default)]
pub struct PayloadCipher {
    encryptor: Option<Arc<dyn Encryptor>>,
    decryptor: Option<Arc<dyn Decryptor>>,
}

impl PayloadCipher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_encryptor(mut self, encryptor: impl Encryptor + 'static) -> Self {
        self.encryptor = Some(Arc::new(encryptor));
        self
    }

    pub fn with_decryptor(mut self, decryptor: impl Decryptor + 'static) -> Self {
        self.decryptor = Some(Arc::new(decryptor));
        self
    }
}

fn transformed(body: &[u8], apply: impl FnOnce(&str) -> String) -> Option<Bytes> {
    let text = std::str::from_utf8(body).ok()?;
    let out = apply(text);
    if out.is_empty() || out == text {
        return None;
    }
    Some(Bytes::from(out))
}

#[async_trait]
impl Interceptor for PayloadCipher {
    fn name(&self) -> &str {
        "payload_cipher"
    }

    async fn on_request(&self, ctx: &CallContext, request: &mut RequestModel) -> Result<()> {
        let Some(encryptor) = &self.encryptor else {
            return Ok(());
        };
        let Some(body) = request.body().filter(|b| !b.is_empty()) else {
            return Ok(());
        };
        let url = request.url().clone();
        if let Some(encrypted) = transformed(body, |text| encryptor.encrypt(&url, text)) {
            debug!(request_id = %ctx.request_id(), bytes = encrypted.len(), "request body encrypted");
            request.set_body(Some(encrypted));
        }
        Ok(())
    }

    async fn on_response(
        &self,
        ctx: &CallContext,
        request: &RequestModel,
        response: &mut RawResponse,
    ) -> Result<()> {
        let Some(decryptor) = &self.decryptor else {
            return Ok(());
        };
        if !response.is_success() || response.body.is_empty() {
            return Ok(());
        }
        if let Some(plain) = transformed(&response.body, |text| decryptor.decrypt(request.url(), text)) {
            debug!(request_id = %ctx.request_id(), bytes = plain.len(), "response body decrypted");
            response.body = plain;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reverse(_: &Url, s: &str) -> String {
        s.chars().rev().collect()
    }

    #[test]
    fn test_unchanged_or_empty_output_keeps_payload() {
        assert!(transformed(b"abc", |s| s.to_string()).is_none());
        assert!(transformed(b"abc", |_| String::new()).is_none());
        assert!(transformed(&[0xff, 0x00], |_| "x".into()).is_none());
        assert_eq!(
            transformed(b"abc", |s| reverse(&Url::parse("http://h/").unwrap(), s)).unwrap(),
            Bytes::from_static(b"cba")
        );
    }
}
