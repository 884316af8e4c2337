//! The request pipeline: auth injection, dispatch, response classification.
//!
//! # Design
//! `ApiClient` is the single entry point for backend traffic. A request walks
//! three steps: `prepare` makes the URL absolute and injects the stored
//! token, a transport executes it, and `interpret` classifies the envelope
//! into exactly one outcome while running the side effects that outcome owes
//! the user. The split is public on purpose: async hosts call `request` and
//! get all three steps, FFI hosts drive `prepare`/`interpret` around their
//! own I/O.
//!
//! Side effects follow the outcome, never the other way around: a request
//! resolves exactly once, and each resolution runs its effects at most once.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::RequestError;
use crate::http::{HttpRequest, RequestOptions, ResponseEnvelope};
use crate::store::{MemoryTokenStore, TokenStore};
use crate::transport::{HttpTransport, ReqwestTransport, TransportError};
use crate::ui::{LoggingUi, UiBridge};

/// Backend reached when no base URL is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// App page the pipeline redirects to when the session expires.
pub const LOGIN_ROUTE: &str = "/pages/login/login";

/// Notice shown for a non-200 response whose payload carries no message.
pub const REQUEST_FAILED_NOTICE: &str = "request failed";

/// Notice shown when the request never produced a status code.
pub const NETWORK_FAILED_NOTICE: &str = "network request failed";

const AUTHORIZATION: &str = "Authorization";

/// Shared client for the app backend.
///
/// Cheap to clone; all capabilities sit behind `Arc`s, so clones share the
/// token store and see each other's login state.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    store: Arc<dyn TokenStore>,
    ui: Arc<dyn UiBridge>,
    transport: Arc<dyn HttpTransport>,
}

impl ApiClient {
    /// Client with the default capabilities: in-memory token store, logging
    /// UI, `reqwest` transport.
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            store: Arc::new(MemoryTokenStore::new()),
            ui: Arc::new(LoggingUi),
            transport: Arc::new(ReqwestTransport::new()),
        }
    }

    pub fn with_store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_ui(mut self, ui: Arc<dyn UiBridge>) -> Self {
        self.ui = ui;
        self
    }

    pub fn with_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = transport;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The token store this client reads before every request.
    pub fn token_store(&self) -> &dyn TokenStore {
        self.store.as_ref()
    }

    /// Pre-request step: absolute URL, stored token applied.
    ///
    /// A stored token always wins over a caller-supplied `Authorization`
    /// header; with no stored token the caller's headers pass through
    /// untouched.
    pub fn prepare(&self, options: RequestOptions) -> HttpRequest {
        let RequestOptions {
            url,
            method,
            data,
            mut header,
        } = options;
        if let Some(token) = self.store.get() {
            header.insert(AUTHORIZATION.to_string(), format!("Bearer {token}"));
        }
        HttpRequest {
            method,
            url: format!("{}{}", self.base_url, url),
            headers: header,
            data,
        }
    }

    /// Post-response step: classify the envelope and run its side effects.
    ///
    /// * 200 unwraps the payload.
    /// * 401 removes the stored token, redirects to [`LOGIN_ROUTE`] and
    ///   resolves as [`RequestError::AuthExpired`].
    /// * Anything else notifies the user with the payload's `message` (or
    ///   the generic notice) and hands the envelope back for inspection.
    pub fn interpret(&self, envelope: ResponseEnvelope) -> Result<Value, RequestError> {
        match envelope.status_code {
            200 => Ok(envelope.data),
            401 => {
                tracing::info!("session expired, clearing stored token");
                self.store.remove();
                self.ui.redirect(LOGIN_ROUTE);
                Err(RequestError::AuthExpired)
            }
            status => {
                let notice = envelope
                    .message()
                    .unwrap_or(REQUEST_FAILED_NOTICE)
                    .to_string();
                tracing::warn!(status, notice, "request rejected by backend");
                self.ui.notify(&notice);
                Err(RequestError::Api(envelope))
            }
        }
    }

    /// Side effect for requests that never reached the backend. Returns the
    /// error to resolve with so the two dispatch styles stay in step.
    pub fn report_transport_failure(&self, error: TransportError) -> RequestError {
        self.ui.notify(NETWORK_FAILED_NOTICE);
        RequestError::Transport(error)
    }

    /// Full pipeline: prepare, dispatch through the transport, interpret.
    pub async fn request(&self, options: RequestOptions) -> Result<Value, RequestError> {
        let request = self.prepare(options);
        tracing::debug!(url = %request.url, method = ?request.method, "request");
        match self.transport.dispatch(&request).await {
            Ok(envelope) => {
                tracing::debug!(status = envelope.status_code, "response");
                self.interpret(envelope)
            }
            Err(err) => {
                tracing::warn!(url = %request.url, error = %err, "transport failure");
                Err(self.report_transport_failure(err))
            }
        }
    }
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}
