//! Request execution behind the `HttpTransport` capability.
//!
//! # Design
//! The pipeline classifies responses; it does not perform I/O itself. A
//! transport takes the prepared `HttpRequest`, executes it however the host
//! likes, and reports either a `ResponseEnvelope` or a `TransportError` for
//! requests that never produced a status code. `ReqwestTransport` is the
//! batteries-included implementation; tests substitute scripted transports,
//! and FFI hosts bypass this trait entirely by driving `prepare`/`interpret`
//! themselves.
//!
//! Non-2xx statuses are not transport errors. The envelope is handed back
//! as-is and classification happens in the pipeline.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::http::{HttpRequest, Method, ResponseEnvelope};

/// The request never completed: refused connection, DNS failure, timeout,
/// or the connection died mid-response.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// Executes prepared requests on behalf of the pipeline.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn dispatch(&self, request: &HttpRequest) -> Result<ResponseEnvelope, TransportError>;
}

/// `HttpTransport` backed by a shared `reqwest` client.
///
/// Mirrors the platform primitive's encoding: GET folds `data` into the
/// query string, every other method sends it as a JSON body.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn dispatch(&self, request: &HttpRequest) -> Result<ResponseEnvelope, TransportError> {
        let (method, url) = match request.method {
            Method::Get => (reqwest::Method::GET, request.url_with_query()),
            Method::Post => (reqwest::Method::POST, request.url.clone()),
            Method::Put => (reqwest::Method::PUT, request.url.clone()),
            Method::Delete => (reqwest::Method::DELETE, request.url.clone()),
        };
        tracing::debug!(%url, method = ?request.method, "dispatching request");

        let mut builder = self.http.request(method, url);
        for (key, value) in &request.headers {
            builder = builder.header(key, value);
        }
        if request.method != Method::Get && !request.data.is_empty() {
            builder = builder.json(&request.data);
        }

        let response = builder.send().await?;
        let status_code = response.status().as_u16();
        let bytes = response.bytes().await?;

        Ok(ResponseEnvelope {
            status_code,
            data: decode_body(&bytes),
        })
    }
}

/// Decode a raw response body the way the platform primitive does: parsed
/// JSON when the body is JSON, the raw text otherwise, `null` when empty.
///
/// Public so hosts that execute requests themselves can feed their bodies
/// through the same decoding before `interpret`.
pub fn decode_body(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}
