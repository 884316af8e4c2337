//! Request/response data model for the pipeline.
//!
//! # Design
//! These types describe HTTP traffic as plain data. `RequestOptions` is what
//! callers hand to the pipeline: a path relative to the client's base URL plus
//! optional method, payload and headers. `HttpRequest` is the dispatched form
//! after the pre-request step ran: absolute URL, auth header applied. The
//! platform transport answers with a `ResponseEnvelope` carrying the status
//! code and the parsed body.
//!
//! All fields use owned types (`String`, maps) so values can cross the FFI
//! boundary without lifetime concerns.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

/// HTTP method for a request. Defaults to GET, like the platform primitive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Delete,
}

/// Caller-supplied request description, before the pipeline touched it.
///
/// `url` is relative and gets prefixed with the client's base URL; everything
/// else is optional with the defaults the platform primitive uses. The
/// pipeline mutates the header map exactly once (auth injection) and never
/// looks at `data`.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub url: String,
    pub method: Method,
    pub data: Map<String, Value>,
    pub header: BTreeMap<String, String>,
}

impl RequestOptions {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// GET request with no payload.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(url)
    }

    /// POST request carrying a JSON object payload.
    pub fn post(url: impl Into<String>, data: Map<String, Value>) -> Self {
        Self {
            url: url.into(),
            method: Method::Post,
            data,
            header: BTreeMap::new(),
        }
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.header.insert(key.into(), value.into());
        self
    }
}

/// A request in its dispatched form: absolute URL, headers final.
///
/// Produced by `ApiClient::prepare`. The transport (or, over FFI, the host)
/// executes it and reports back a `ResponseEnvelope`.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub data: Map<String, Value>,
}

impl HttpRequest {
    /// URL with `data` folded into the query string, for GET dispatch.
    ///
    /// The platform primitive serializes `data` into the query for GET and
    /// into the body for everything else; transports and the FFI layer share
    /// this encoding so both dispatch forms agree.
    pub fn url_with_query(&self) -> String {
        if self.data.is_empty() {
            return self.url.clone();
        }
        let mut query = form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.data {
            match value {
                Value::String(s) => query.append_pair(key, s),
                other => query.append_pair(key, &other.to_string()),
            };
        }
        let separator = if self.url.contains('?') { '&' } else { '?' };
        format!("{}{}{}", self.url, separator, query.finish())
    }
}

/// What the platform primitive reports on the success callback: a status code
/// and the response payload. Read-only; the pipeline never mutates it.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEnvelope {
    pub status_code: u16,
    pub data: Value,
}

impl ResponseEnvelope {
    /// The backend's human-readable error message, when the payload carries
    /// one (`{"message": "..."}` shape).
    pub fn message(&self) -> Option<&str> {
        self.data.get("message").and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn options_default_to_get_with_empty_maps() {
        let options = RequestOptions::new("/items");
        assert_eq!(options.method, Method::Get);
        assert!(options.data.is_empty());
        assert!(options.header.is_empty());
    }

    #[test]
    fn post_constructor_sets_method_and_data() {
        let mut data = Map::new();
        data.insert("name".to_string(), json!("gravel"));
        let options = RequestOptions::post("/api/materials", data);
        assert_eq!(options.method, Method::Post);
        assert_eq!(options.data["name"], "gravel");
    }

    #[test]
    fn url_with_query_appends_pairs() {
        let mut data = Map::new();
        data.insert("page".to_string(), json!(2));
        data.insert("q".to_string(), json!("iron ore"));
        let request = HttpRequest {
            method: Method::Get,
            url: "http://localhost:5000/api/materials".to_string(),
            headers: BTreeMap::new(),
            data,
        };
        assert_eq!(
            request.url_with_query(),
            "http://localhost:5000/api/materials?page=2&q=iron+ore"
        );
    }

    #[test]
    fn url_with_query_extends_existing_query() {
        let mut data = Map::new();
        data.insert("page".to_string(), json!(1));
        let request = HttpRequest {
            method: Method::Get,
            url: "http://localhost:5000/api/materials?sort=asc".to_string(),
            headers: BTreeMap::new(),
            data,
        };
        assert_eq!(
            request.url_with_query(),
            "http://localhost:5000/api/materials?sort=asc&page=1"
        );
    }

    #[test]
    fn url_with_query_is_identity_without_data() {
        let request = HttpRequest {
            method: Method::Get,
            url: "http://localhost:5000/api/users/me".to_string(),
            headers: BTreeMap::new(),
            data: Map::new(),
        };
        assert_eq!(request.url_with_query(), request.url);
    }

    #[test]
    fn envelope_message_reads_payload_field() {
        let envelope = ResponseEnvelope {
            status_code: 400,
            data: json!({"success": false, "message": "username already exists"}),
        };
        assert_eq!(envelope.message(), Some("username already exists"));

        let bare = ResponseEnvelope {
            status_code: 500,
            data: json!("gateway exploded"),
        };
        assert_eq!(bare.message(), None);
    }
}
