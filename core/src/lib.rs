//! Request pipeline and typed API client for the app backend.
//!
//! # Overview
//! Wraps every backend call in one pipeline: inject the stored session
//! token, dispatch, then classify the response. 200 unwraps the payload,
//! 401 clears the token and redirects to the login page, anything else
//! notifies the user with the backend's message. A request that never
//! reached the backend notifies with a generic network notice instead.
//!
//! # Design
//! - `ApiClient` owns no I/O. Token storage, user-facing effects and
//!   request execution sit behind the `TokenStore`, `UiBridge` and
//!   `HttpTransport` capabilities, so hosts decide what "storage", "toast"
//!   and "HTTP" mean.
//! - The pipeline's two pure-ish halves, `prepare` and `interpret`, are
//!   public: FFI hosts run their own I/O between them, async Rust hosts
//!   just call `request`.
//! - Every request resolves exactly once, and user-facing side effects
//!   follow the resolution.
//! - Types use owned fields to simplify FFI mapping.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod store;
pub mod transport;
pub mod types;
pub mod ui;

pub use client::{
    ApiClient, DEFAULT_BASE_URL, LOGIN_ROUTE, NETWORK_FAILED_NOTICE, REQUEST_FAILED_NOTICE,
};
pub use config::{ConfigError, DevServerConfig, ProxyRule, ShellConfig};
pub use error::RequestError;
pub use http::{HttpRequest, Method, RequestOptions, ResponseEnvelope};
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore, TOKEN_KEY};
pub use transport::{decode_body, HttpTransport, ReqwestTransport, TransportError};
pub use types::{
    ApiPayload, Credentials, LoginData, NewAccount, Notification, NotificationPage, Pagination,
    RegistrationData, UserProfile,
};
pub use ui::{LoggingUi, UiBridge, UiEvent, UiOutbox};
