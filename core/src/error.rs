//! Error types for the request pipeline.
//!
//! # Design
//! Every failed request resolves into exactly one `RequestError` variant, and
//! the variant tells the caller which side effects already ran. `AuthExpired`
//! means the stored token was removed and the login redirect was issued.
//! `Api` means the user was already notified with the backend's message and
//! the caller gets the full envelope for inspection. `Transport` means the
//! request never produced a status code at all.

use thiserror::Error;

use crate::http::ResponseEnvelope;
use crate::transport::TransportError;

/// Errors surfaced by `ApiClient` and the typed endpoint helpers.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The server answered 401. The stored token is gone and the login
    /// redirect has been issued by the time callers see this.
    #[error("authentication expired")]
    AuthExpired,

    /// The server answered with a status other than 200 or 401.
    #[error("api error: status {}", .0.status_code)]
    Api(ResponseEnvelope),

    /// The request never completed: refused connection, DNS failure, timeout.
    #[error("transport failed: {0}")]
    Transport(#[from] TransportError),

    /// A 200 payload did not match the expected shape.
    #[error("unexpected response shape: {0}")]
    Decode(String),
}

impl RequestError {
    /// The envelope of a non-200 response, when there was one.
    pub fn envelope(&self) -> Option<&ResponseEnvelope> {
        match self {
            RequestError::Api(envelope) => Some(envelope),
            _ => None,
        }
    }
}
