//! C-ABI wrapper around `opsapp-core`.
//!
//! # Overview
//! Exposes the request pipeline through `extern "C"` functions so the mobile
//! and web shells can drive it without linking Rust's async runtime. The
//! host owns the HTTP stack: `opsapp_prepare` turns caller options into a
//! ready-to-send request (absolute URL, stored token injected), the host
//! executes it however it likes, and `opsapp_interpret` classifies the
//! response, updates the token store and reports the UI effects the host
//! owes the user. Requests that never completed go through
//! `opsapp_report_network_failure` instead.
//!
//! # Design
//! - Each `extern "C"` body runs inside `catch_unwind`; a panic becomes a
//!   `FfiOutcomeCode::Panic` outcome instead of crossing the boundary. The
//!   client handle goes in as `AssertUnwindSafe`: its only interior state,
//!   the token and outbox locks, recovers from poisoning, so a caught panic
//!   cannot leave the handle unusable.
//! - JSON-shaped values cross the boundary as JSON text; structured fields
//!   (method, status, outcome code) cross as C types.
//! - UI effects are returned as data on the `FfiOutcome`, never invoked as
//!   callbacks, so the host replays them on its own UI thread.
//! - Returned pointers are owned by the C caller, who releases them with the
//!   matching `opsapp_*_free` function.

pub mod types;

use std::collections::BTreeMap;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};

use opsapp_core::client::DEFAULT_BASE_URL;
use opsapp_core::http::{RequestOptions, ResponseEnvelope};
use opsapp_core::store::TokenStore;
use opsapp_core::transport::{decode_body, TransportError};
use serde_json::{Map, Value};

use types::*;

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a new client bound to `base_url`, or to the default backend when
/// `base_url` is null.
///
/// Returns null only if an internal panic occurs. The caller must free the
/// returned pointer with `opsapp_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn opsapp_client_new(base_url: *const c_char) -> *mut FfiApiClient {
    catch_unwind(|| {
        let url = if base_url.is_null() {
            DEFAULT_BASE_URL.to_string()
        } else {
            owned_str(base_url)
        };
        Box::into_raw(Box::new(FfiApiClient::new(&url)))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a client created by `opsapp_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn opsapp_client_free(client: *mut FfiApiClient) {
    if !client.is_null() {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            drop(unsafe { Box::from_raw(client) });
        }));
    }
}

// ---------------------------------------------------------------------------
// Token storage
// ---------------------------------------------------------------------------

/// Store the session token the client injects into every request.
///
/// Hosts call this after reading the token out of their own key-value
/// storage, and again whenever a login refreshes it. A null or empty token
/// clears the stored one instead.
#[unsafe(no_mangle)]
pub extern "C" fn opsapp_client_set_token(client: *const FfiApiClient, token: *const c_char) {
    if client.is_null() {
        return;
    }
    let _ = catch_unwind(AssertUnwindSafe(|| {
        let client = unsafe { &*client };
        let token = if token.is_null() {
            String::new()
        } else {
            owned_str(token)
        };
        if token.is_empty() {
            client.store.remove();
        } else {
            client.store.set(&token);
        }
    }));
}

/// Drop the stored session token. Safe to call when none is stored.
#[unsafe(no_mangle)]
pub extern "C" fn opsapp_client_clear_token(client: *const FfiApiClient) {
    if client.is_null() {
        return;
    }
    let _ = catch_unwind(AssertUnwindSafe(|| {
        let client = unsafe { &*client };
        client.store.remove();
    }));
}

/// The stored session token, or null when none is stored.
///
/// Hosts call this after `opsapp_interpret` to mirror the client's token
/// state back into their own key-value storage. The caller must free the
/// returned string with `opsapp_string_free`.
#[unsafe(no_mangle)]
pub extern "C" fn opsapp_client_token(client: *const FfiApiClient) -> *mut c_char {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        match client.store.get() {
            Some(token) => c_string(token),
            None => std::ptr::null_mut(),
        }
    }))
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Pipeline: prepare and interpret
// ---------------------------------------------------------------------------

/// Turn caller options into the request the host should execute.
///
/// The returned request carries the absolute URL (base URL plus
/// `options.url`) and the caller headers with the stored token applied as
/// `Authorization: Bearer <token>`. For GET the payload is folded into the
/// URL's query string; for other methods it is returned as `body_json` and
/// `content-type: application/json` is added unless the caller set that
/// header themselves.
///
/// Returns null if `client`, `options` or `options.url` is null, or if
/// `data_json` / `headers_json` is not a JSON object. The caller must free
/// the returned pointer with `opsapp_request_free`.
#[unsafe(no_mangle)]
pub extern "C" fn opsapp_prepare(
    client: *const FfiApiClient,
    options: *const FfiRequestOptions,
) -> *mut FfiHttpRequest {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() || options.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        let options = unsafe { &*options };
        if options.url.is_null() {
            return std::ptr::null_mut();
        }
        let data = match json_object(options.data_json) {
            Some(map) => map,
            None => return std::ptr::null_mut(),
        };
        let header = match string_map(options.headers_json) {
            Some(map) => map,
            None => return std::ptr::null_mut(),
        };
        let request = client.inner.prepare(RequestOptions {
            url: owned_str(options.url),
            method: options.method.into(),
            data,
            header,
        });
        FfiHttpRequest::from_core(request)
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// Classify a response the host received for a prepared request.
///
/// `body` is the raw response body, or null for an empty body. Runs the
/// pipeline's post-response step: 200 resolves `Ok` with the payload, 401
/// clears the stored token and asks for a redirect to the login page,
/// anything else carries the backend's error payload plus the notice to
/// show. The caller must free the returned pointer with
/// `opsapp_outcome_free`.
#[unsafe(no_mangle)]
pub extern "C" fn opsapp_interpret(
    client: *const FfiApiClient,
    status_code: u16,
    body: *const c_char,
) -> *mut FfiOutcome {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return FfiOutcome::null_arg("client");
        }
        let client = unsafe { &*client };
        let data = if body.is_null() {
            Value::Null
        } else {
            decode_body(unsafe { CStr::from_ptr(body) }.to_bytes())
        };
        let result = client.inner.interpret(ResponseEnvelope { status_code, data });
        FfiOutcome::from_result(status_code, result, client.ui.drain())
    }))
    .unwrap_or_else(|_| FfiOutcome::panic("panic in opsapp_interpret"))
}

/// Report a request that never produced a status code: refused connection,
/// DNS failure, timeout.
///
/// `detail` is the host's description of the failure and may be null.
/// Returns a `Transport` outcome carrying the generic network notice to
/// show. The caller must free the returned pointer with
/// `opsapp_outcome_free`.
#[unsafe(no_mangle)]
pub extern "C" fn opsapp_report_network_failure(
    client: *const FfiApiClient,
    detail: *const c_char,
) -> *mut FfiOutcome {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return FfiOutcome::null_arg("client");
        }
        let client = unsafe { &*client };
        let detail = if detail.is_null() {
            "request did not complete".to_string()
        } else {
            owned_str(detail)
        };
        let err = client.inner.report_transport_failure(TransportError::new(detail));
        FfiOutcome::from_result(0, Err(err), client.ui.drain())
    }))
    .unwrap_or_else(|_| FfiOutcome::panic("panic in opsapp_report_network_failure"))
}

// ---------------------------------------------------------------------------
// Argument helpers
// ---------------------------------------------------------------------------

/// Copy a non-null C string, replacing invalid UTF-8 with an empty string.
fn owned_str(ptr: *const c_char) -> String {
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .unwrap_or("")
        .to_string()
}

/// Parse a JSON object argument. Null and empty mean no entries; anything
/// that is not a JSON object is rejected.
fn json_object(ptr: *const c_char) -> Option<Map<String, Value>> {
    if ptr.is_null() {
        return Some(Map::new());
    }
    let raw = unsafe { CStr::from_ptr(ptr) }.to_str().unwrap_or("");
    if raw.is_empty() {
        return Some(Map::new());
    }
    serde_json::from_str(raw).ok()
}

/// Parse a JSON object of string values, as used for headers.
fn string_map(ptr: *const c_char) -> Option<BTreeMap<String, String>> {
    if ptr.is_null() {
        return Some(BTreeMap::new());
    }
    let raw = unsafe { CStr::from_ptr(ptr) }.to_str().unwrap_or("");
    if raw.is_empty() {
        return Some(BTreeMap::new());
    }
    serde_json::from_str(raw).ok()
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiHttpRequest` returned by `opsapp_prepare`. Safe to call with
/// null.
#[unsafe(no_mangle)]
pub extern "C" fn opsapp_request_free(request: *mut FfiHttpRequest) {
    if request.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let request = unsafe { Box::from_raw(request) };
        if !request.url.is_null() {
            drop(unsafe { CString::from_raw(request.url) });
        }
        if !request.body_json.is_null() {
            drop(unsafe { CString::from_raw(request.body_json) });
        }
        if !request.headers.is_null() && request.headers_len > 0 {
            let headers = unsafe {
                Vec::from_raw_parts(
                    request.headers,
                    request.headers_len as usize,
                    request.headers_len as usize,
                )
            };
            for h in headers {
                if !h.key.is_null() {
                    drop(unsafe { CString::from_raw(h.key) });
                }
                if !h.value.is_null() {
                    drop(unsafe { CString::from_raw(h.value) });
                }
            }
        }
    });
}

/// Free an `FfiOutcome` returned by `opsapp_interpret` or
/// `opsapp_report_network_failure`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn opsapp_outcome_free(outcome: *mut FfiOutcome) {
    if outcome.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let outcome = unsafe { Box::from_raw(outcome) };
        for ptr in [
            outcome.payload_json,
            outcome.error_message,
            outcome.notice,
            outcome.redirect,
        ] {
            if !ptr.is_null() {
                drop(unsafe { CString::from_raw(ptr) });
            }
        }
    });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn opsapp_string_free(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { CString::from_raw(s) });
        });
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
