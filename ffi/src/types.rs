//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type but uses C-compatible representations:
//! `*mut c_char` instead of `String`, raw pointers instead of maps, and
//! tagged enums with explicit discriminants. JSON-shaped values (request
//! payloads, response bodies) cross the boundary as JSON text, which is the
//! form the app shell holds them in anyway. Conversion functions live here
//! to keep `lib.rs` focused on the `extern "C"` surface.

use std::ffi::CString;
use std::os::raw::c_char;
use std::sync::Arc;

use opsapp_core::error::RequestError;
use opsapp_core::http::Method;
use opsapp_core::store::MemoryTokenStore;
use opsapp_core::ui::{UiEvent, UiOutbox};
use opsapp_core::ApiClient;
use serde_json::Value;

/// Turn an owned string into a C string, dropping interior NUL bytes.
pub(crate) fn c_string(s: String) -> *mut c_char {
    match CString::new(s) {
        Ok(cs) => cs.into_raw(),
        Err(err) => {
            let bytes: Vec<u8> = err.into_vec().into_iter().filter(|&b| b != 0).collect();
            CString::new(bytes).unwrap_or_default().into_raw()
        }
    }
}

/// Opaque handle to an `ApiClient`. C callers receive a pointer to this and
/// pass it back into every FFI function.
///
/// The handle keeps direct references to the client's token store and UI
/// outbox: the store so the host can sync its own key-value storage, the
/// outbox so `opsapp_interpret` can hand UI effects back as data.
pub struct FfiApiClient {
    pub(crate) inner: ApiClient,
    pub(crate) store: Arc<MemoryTokenStore>,
    pub(crate) ui: Arc<UiOutbox>,
}

impl FfiApiClient {
    pub(crate) fn new(base_url: &str) -> Self {
        let store = Arc::new(MemoryTokenStore::new());
        let ui = Arc::new(UiOutbox::new());
        let inner = ApiClient::new(base_url)
            .with_store(store.clone())
            .with_ui(ui.clone());
        Self { inner, store, ui }
    }
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// HTTP method as a C enum.
#[repr(C)]
#[derive(Clone, Copy)]
pub enum FfiMethod {
    Get = 0,
    Post = 1,
    Put = 2,
    Delete = 3,
}

impl From<FfiMethod> for Method {
    fn from(m: FfiMethod) -> Self {
        match m {
            FfiMethod::Get => Method::Get,
            FfiMethod::Post => Method::Post,
            FfiMethod::Put => Method::Put,
            FfiMethod::Delete => Method::Delete,
        }
    }
}

impl From<Method> for FfiMethod {
    fn from(m: Method) -> Self {
        match m {
            Method::Get => FfiMethod::Get,
            Method::Post => FfiMethod::Post,
            Method::Put => FfiMethod::Put,
            Method::Delete => FfiMethod::Delete,
        }
    }
}

/// Caller-provided request description.
///
/// `url` is the path relative to the client's base URL. `data_json` is a
/// JSON object with the request payload, or null for none. `headers_json`
/// is a JSON object of string values, or null. The FFI layer reads but
/// never frees these fields.
#[repr(C)]
pub struct FfiRequestOptions {
    pub method: FfiMethod,
    pub url: *const c_char,
    pub data_json: *const c_char,
    pub headers_json: *const c_char,
}

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// A prepared request the host executes with its own HTTP stack.
///
/// For GET the payload is already folded into `url`'s query string and
/// `body_json` is null; for other methods `body_json` carries the JSON body
/// to send (or null for none). Free with `opsapp_request_free`.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiMethod,
    pub url: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub body_json: *mut c_char,
}

impl FfiHttpRequest {
    /// Convert a prepared core request into a heap-allocated FFI request.
    ///
    /// Requests that carry a JSON body also carry `content-type:
    /// application/json` unless the caller set that header themselves, so the
    /// host can put the prepared request on the wire as-is.
    pub(crate) fn from_core(request: opsapp_core::HttpRequest) -> *mut Self {
        let url = c_string(match request.method {
            Method::Get => request.url_with_query(),
            _ => request.url.clone(),
        });
        let opsapp_core::HttpRequest {
            method,
            mut headers,
            data,
            ..
        } = request;

        let body_json = if method == Method::Get || data.is_empty() {
            std::ptr::null_mut()
        } else {
            c_string(Value::Object(data).to_string())
        };

        if !body_json.is_null()
            && !headers.keys().any(|k| k.eq_ignore_ascii_case("content-type"))
        {
            headers.insert("content-type".to_string(), "application/json".to_string());
        }

        let headers_len = headers.len() as u32;
        let headers = if headers.is_empty() {
            std::ptr::null_mut()
        } else {
            let mut ffi_headers: Vec<FfiHeader> = headers
                .into_iter()
                .map(|(key, value)| FfiHeader {
                    key: c_string(key),
                    value: c_string(value),
                })
                .collect();
            let ptr = ffi_headers.as_mut_ptr();
            std::mem::forget(ffi_headers);
            ptr
        };

        Box::into_raw(Box::new(FfiHttpRequest {
            method: method.into(),
            url,
            headers,
            headers_len,
            body_json,
        }))
    }
}

// ---------------------------------------------------------------------------
// Outcome types
// ---------------------------------------------------------------------------

/// How a request resolved, as a C enum.
#[repr(C)]
pub enum FfiOutcomeCode {
    Ok = 0,
    AuthExpired = 1,
    ApiError = 2,
    Transport = 3,
    Decode = 4,
    NullArg = 5,
    Panic = 6,
}

/// Result envelope for `opsapp_interpret` and `opsapp_report_network_failure`.
///
/// Exactly one outcome per call. `payload_json` carries the response payload
/// on `Ok` and the error payload on `ApiError`; it is null otherwise.
/// `notice` and `redirect` are the UI effects the host owes the user: show
/// `notice` as a toast if non-null, navigate to `redirect` if non-null.
/// Free with `opsapp_outcome_free`.
#[repr(C)]
pub struct FfiOutcome {
    pub code: FfiOutcomeCode,
    /// HTTP status the outcome was classified from, 0 when none exists.
    pub status: u16,
    pub payload_json: *mut c_char,
    pub error_message: *mut c_char,
    pub notice: *mut c_char,
    pub redirect: *mut c_char,
}

impl FfiOutcome {
    /// Build an outcome from a pipeline resolution plus the UI events it
    /// queued.
    ///
    /// One call drains at most one event of each kind; should concurrent use
    /// of a handle queue more, the latest of each kind wins.
    pub(crate) fn from_result(
        status: u16,
        result: Result<Value, RequestError>,
        events: Vec<UiEvent>,
    ) -> *mut Self {
        let mut notice = None;
        let mut redirect = None;
        for event in events {
            match event {
                UiEvent::Notify(message) => notice = Some(message),
                UiEvent::Redirect(path) => redirect = Some(path),
            }
        }
        let notice = notice.map_or(std::ptr::null_mut(), c_string);
        let redirect = redirect.map_or(std::ptr::null_mut(), c_string);

        let (code, status, payload_json, error_message) = match result {
            Ok(payload) => (
                FfiOutcomeCode::Ok,
                status,
                c_string(payload.to_string()),
                std::ptr::null_mut(),
            ),
            Err(err @ RequestError::AuthExpired) => (
                FfiOutcomeCode::AuthExpired,
                status,
                std::ptr::null_mut(),
                c_string(err.to_string()),
            ),
            Err(RequestError::Api(envelope)) => {
                let message = c_string(format!("api error: status {}", envelope.status_code));
                (
                    FfiOutcomeCode::ApiError,
                    envelope.status_code,
                    c_string(envelope.data.to_string()),
                    message,
                )
            }
            Err(err @ RequestError::Transport(_)) => (
                FfiOutcomeCode::Transport,
                0,
                std::ptr::null_mut(),
                c_string(err.to_string()),
            ),
            Err(err @ RequestError::Decode(_)) => (
                FfiOutcomeCode::Decode,
                status,
                std::ptr::null_mut(),
                c_string(err.to_string()),
            ),
        };

        Box::into_raw(Box::new(FfiOutcome {
            code,
            status,
            payload_json,
            error_message,
            notice,
            redirect,
        }))
    }

    /// Build an error outcome for a null argument.
    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Box::into_raw(Box::new(FfiOutcome {
            code: FfiOutcomeCode::NullArg,
            status: 0,
            payload_json: std::ptr::null_mut(),
            error_message: c_string(format!("null argument: {name}")),
            notice: std::ptr::null_mut(),
            redirect: std::ptr::null_mut(),
        }))
    }

    /// Build an error outcome for a caught panic.
    pub(crate) fn panic(message: &str) -> *mut Self {
        Box::into_raw(Box::new(FfiOutcome {
            code: FfiOutcomeCode::Panic,
            status: 0,
            payload_json: std::ptr::null_mut(),
            error_message: c_string(message.to_string()),
            notice: std::ptr::null_mut(),
            redirect: std::ptr::null_mut(),
        }))
    }
}
