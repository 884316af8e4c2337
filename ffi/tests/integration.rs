//! Session lifecycle test driving the C ABI against the live mock server.
//!
//! # Design
//! Plays the role of a host shell with its own HTTP stack: each call is
//! prepared through `opsapp_prepare`, executed over real HTTP with ureq,
//! and its status and body fed back into `opsapp_interpret`. Outcomes carry
//! the token and UI effects the host must act on, which is exactly what the
//! mobile and web shells do with these bindings.

use std::ffi::{CStr, CString};

use opsapp_ffi::types::{
    FfiApiClient, FfiHttpRequest, FfiMethod, FfiOutcome, FfiOutcomeCode, FfiRequestOptions,
};
use opsapp_ffi::{
    opsapp_client_clear_token, opsapp_client_free, opsapp_client_new, opsapp_client_set_token,
    opsapp_client_token, opsapp_interpret, opsapp_outcome_free, opsapp_prepare,
    opsapp_request_free,
};
use serde_json::{json, Value};

/// Prepare a request through the FFI, panicking on a null result.
fn prepare(
    client: *mut FfiApiClient,
    method: FfiMethod,
    url: &str,
    data: Option<&Value>,
) -> *mut FfiHttpRequest {
    let url = CString::new(url).unwrap();
    let data_text = data.map(|d| CString::new(d.to_string()).unwrap());
    let options = FfiRequestOptions {
        method,
        url: url.as_ptr(),
        data_json: data_text
            .as_ref()
            .map_or(std::ptr::null(), |d| d.as_ptr()),
        headers_json: std::ptr::null(),
    };
    let request = opsapp_prepare(client, &options);
    assert!(!request.is_null(), "prepare returned null");
    request
}

/// Read a header off a prepared request, exact key match.
fn request_header(request: *const FfiHttpRequest, key: &str) -> Option<String> {
    let request = unsafe { &*request };
    if request.headers.is_null() {
        return None;
    }
    let headers =
        unsafe { std::slice::from_raw_parts(request.headers, request.headers_len as usize) };
    headers.iter().find_map(|h| {
        let k = unsafe { CStr::from_ptr(h.key) }.to_str().ok()?;
        if k == key {
            let v = unsafe { CStr::from_ptr(h.value) }.to_str().ok()?;
            Some(v.to_string())
        } else {
            None
        }
    })
}

/// Execute a prepared FFI request using ureq, free it, and return the
/// status and body.
///
/// Puts exactly the prepared URL, headers and body on the wire, the way a
/// host shell would. Disables ureq's automatic status-code-as-error behavior
/// so 4xx/5xx responses come back as data for `opsapp_interpret` to
/// classify.
fn execute(request: *mut FfiHttpRequest) -> (u16, String) {
    let agent = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .new_agent();

    let (status, body) = {
        let request_ref = unsafe { &*request };
        let url = unsafe { CStr::from_ptr(request_ref.url) }
            .to_str()
            .unwrap()
            .to_string();
        let mut headers = Vec::new();
        if !request_ref.headers.is_null() {
            let raw = unsafe {
                std::slice::from_raw_parts(request_ref.headers, request_ref.headers_len as usize)
            };
            for h in raw {
                let key = unsafe { CStr::from_ptr(h.key) }.to_str().unwrap().to_string();
                let value = unsafe { CStr::from_ptr(h.value) }
                    .to_str()
                    .unwrap()
                    .to_string();
                headers.push((key, value));
            }
        }
        let body = if request_ref.body_json.is_null() {
            None
        } else {
            Some(
                unsafe { CStr::from_ptr(request_ref.body_json) }
                    .to_str()
                    .unwrap()
                    .to_string(),
            )
        };

        let mut response = match (request_ref.method, body) {
            (FfiMethod::Get, _) => {
                let mut call = agent.get(&url);
                for (k, v) in &headers {
                    call = call.header(k.as_str(), v.as_str());
                }
                call.call()
            }
            (FfiMethod::Delete, _) => {
                let mut call = agent.delete(&url);
                for (k, v) in &headers {
                    call = call.header(k.as_str(), v.as_str());
                }
                call.call()
            }
            (FfiMethod::Post, Some(body)) => {
                let mut call = agent.post(&url);
                for (k, v) in &headers {
                    call = call.header(k.as_str(), v.as_str());
                }
                call.send(body.as_bytes())
            }
            (FfiMethod::Post, None) => {
                let mut call = agent.post(&url);
                for (k, v) in &headers {
                    call = call.header(k.as_str(), v.as_str());
                }
                call.send_empty()
            }
            (FfiMethod::Put, Some(body)) => {
                let mut call = agent.put(&url);
                for (k, v) in &headers {
                    call = call.header(k.as_str(), v.as_str());
                }
                call.send(body.as_bytes())
            }
            (FfiMethod::Put, None) => {
                let mut call = agent.put(&url);
                for (k, v) in &headers {
                    call = call.header(k.as_str(), v.as_str());
                }
                call.send_empty()
            }
        }
        .expect("HTTP transport error");

        let status = response.status().as_u16();
        let body = response.body_mut().read_to_string().unwrap_or_default();
        (status, body)
    };

    opsapp_request_free(request);
    (status, body)
}

fn interpret(client: *mut FfiApiClient, status: u16, body: &str) -> *mut FfiOutcome {
    let body = CString::new(body).unwrap();
    opsapp_interpret(client, status, body.as_ptr())
}

fn payload(outcome: &FfiOutcome) -> Value {
    assert!(!outcome.payload_json.is_null(), "outcome carried no payload");
    let raw = unsafe { CStr::from_ptr(outcome.payload_json) }
        .to_str()
        .unwrap();
    serde_json::from_str(raw).unwrap()
}

#[test]
fn session_lifecycle_over_c_abi() {
    // Step 1: start mock server on a random port.
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    let base = CString::new(format!("http://{addr}")).unwrap();
    let client = opsapp_client_new(base.as_ptr());
    assert!(!client.is_null());

    // Step 2: profile fetch without a session redirects to login.
    let request = prepare(client, FfiMethod::Get, "/api/users/me", None);
    let (status, body) = execute(request);
    assert_eq!(status, 401);
    let outcome = interpret(client, status, &body);
    let o = unsafe { &*outcome };
    assert!(matches!(o.code, FfiOutcomeCode::AuthExpired));
    let redirect = unsafe { CStr::from_ptr(o.redirect) }.to_str().unwrap();
    assert_eq!(redirect, "/pages/login/login");
    opsapp_outcome_free(outcome);

    // Step 3: login and mirror the minted token into the client. The
    // prepared request must already be wire-complete, content type included.
    let request = prepare(
        client,
        FfiMethod::Post,
        "/api/login",
        Some(&json!({"username": "alice", "password": "wonderland"})),
    );
    assert_eq!(
        request_header(request, "content-type").as_deref(),
        Some("application/json")
    );
    let (status, body) = execute(request);
    assert_eq!(status, 200);
    let outcome = interpret(client, status, &body);
    let o = unsafe { &*outcome };
    assert!(matches!(o.code, FfiOutcomeCode::Ok));
    let token = payload(o)["data"]["token"].as_str().unwrap().to_string();
    assert!(token.starts_with("tok-"));
    opsapp_outcome_free(outcome);

    let token_c = CString::new(token.clone()).unwrap();
    opsapp_client_set_token(client, token_c.as_ptr());

    // Step 4: the same profile fetch now carries the bearer token.
    let request = prepare(client, FfiMethod::Get, "/api/users/me", None);
    let (status, body) = execute(request);
    let outcome = interpret(client, status, &body);
    let o = unsafe { &*outcome };
    assert!(matches!(o.code, FfiOutcomeCode::Ok));
    let profile = payload(o);
    assert_eq!(profile["data"]["username"], "alice");
    assert_eq!(profile["data"]["roles"][0], "admin");
    opsapp_outcome_free(outcome);

    // Step 5: notifications, with the page folded into the query string.
    let request = prepare(
        client,
        FfiMethod::Get,
        "/api/notifications",
        Some(&json!({"page": 1, "per_page": 2})),
    );
    {
        let request_ref = unsafe { &*request };
        let url = unsafe { CStr::from_ptr(request_ref.url) }.to_str().unwrap();
        assert!(url.ends_with("/api/notifications?page=1&per_page=2"));
    }
    let (status, body) = execute(request);
    let outcome = interpret(client, status, &body);
    let o = unsafe { &*outcome };
    assert!(matches!(o.code, FfiOutcomeCode::Ok));
    let page = payload(o);
    assert_eq!(page["data"]["notifications"].as_array().unwrap().len(), 2);
    assert_eq!(page["data"]["pagination"]["total"], 3);
    opsapp_outcome_free(outcome);

    // Step 6: a forged token is rejected and wiped from the store.
    let forged = CString::new("tok-forged").unwrap();
    opsapp_client_set_token(client, forged.as_ptr());
    let request = prepare(client, FfiMethod::Get, "/api/users/me", None);
    let (status, body) = execute(request);
    assert_eq!(status, 401);
    let outcome = interpret(client, status, &body);
    let o = unsafe { &*outcome };
    assert!(matches!(o.code, FfiOutcomeCode::AuthExpired));
    opsapp_outcome_free(outcome);
    assert!(opsapp_client_token(client).is_null());

    // Step 7: log back in, then log out and drop the mirrored token.
    let request = prepare(
        client,
        FfiMethod::Post,
        "/api/login",
        Some(&json!({"username": "alice", "password": "wonderland"})),
    );
    let (status, body) = execute(request);
    let outcome = interpret(client, status, &body);
    let token = payload(unsafe { &*outcome })["data"]["token"]
        .as_str()
        .unwrap()
        .to_string();
    opsapp_outcome_free(outcome);
    let token_c = CString::new(token).unwrap();
    opsapp_client_set_token(client, token_c.as_ptr());

    let request = prepare(client, FfiMethod::Post, "/api/logout", None);
    let (status, body) = execute(request);
    assert_eq!(status, 200);
    let outcome = interpret(client, status, &body);
    assert!(matches!(
        unsafe { &*outcome }.code,
        FfiOutcomeCode::Ok
    ));
    opsapp_outcome_free(outcome);
    opsapp_client_clear_token(client);

    // Step 8: duplicate registration surfaces the backend's message.
    let request = prepare(
        client,
        FfiMethod::Post,
        "/api/register",
        Some(&json!({
            "username": "alice",
            "email": "alice@example.com",
            "password": "secret",
        })),
    );
    let (status, body) = execute(request);
    assert_eq!(status, 400);
    let outcome = interpret(client, status, &body);
    let o = unsafe { &*outcome };
    assert!(matches!(o.code, FfiOutcomeCode::ApiError));
    assert_eq!(o.status, 400);
    let notice = unsafe { CStr::from_ptr(o.notice) }.to_str().unwrap();
    assert_eq!(notice, "username already exists");
    opsapp_outcome_free(outcome);

    opsapp_client_free(client);
}
