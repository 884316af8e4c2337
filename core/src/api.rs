//! Typed endpoint helpers layered on the request pipeline.
//!
//! # Design
//! Every helper goes through `ApiClient::request`, so auth injection, the
//! expiry redirect and failure notices behave identically whether a caller
//! speaks raw JSON or the typed surface. Helpers only add envelope
//! unwrapping plus the token bookkeeping around login and logout.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::client::ApiClient;
use crate::error::RequestError;
use crate::http::{Method, RequestOptions};
use crate::types::{
    ApiPayload, Credentials, LoginData, NewAccount, NotificationPage, RegistrationData,
    UserProfile,
};

impl ApiClient {
    /// POST `/api/login`. On success the session token is stored, so
    /// subsequent requests authenticate automatically.
    ///
    /// The backend answers wrong credentials with 401, which the pipeline
    /// treats like any expired session: stored token removed, login
    /// redirect issued, [`RequestError::AuthExpired`] returned.
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginData, RequestError> {
        let payload = self
            .request(RequestOptions::post("/api/login", to_object(credentials)?))
            .await?;
        let data: LoginData = require_data(payload)?;
        self.token_store().set(&data.token);
        Ok(data)
    }

    /// POST `/api/register`. Does not log the new account in; the app sends
    /// users to the login page afterwards.
    pub async fn register(&self, account: &NewAccount) -> Result<UserProfile, RequestError> {
        let payload = self
            .request(RequestOptions::post("/api/register", to_object(account)?))
            .await?;
        let data: RegistrationData = require_data(payload)?;
        Ok(data.user)
    }

    /// POST `/api/logout`, then drop the stored token.
    pub async fn logout(&self) -> Result<(), RequestError> {
        self.request(RequestOptions {
            url: "/api/logout".to_string(),
            method: Method::Post,
            ..RequestOptions::default()
        })
        .await?;
        self.token_store().remove();
        Ok(())
    }

    /// GET `/api/users/me`.
    pub async fn current_user(&self) -> Result<UserProfile, RequestError> {
        let payload = self.request(RequestOptions::get("/api/users/me")).await?;
        require_data(payload)
    }

    /// GET `/api/notifications`, newest first. `is_read` filters the feed
    /// when set; `None` returns read and unread alike.
    pub async fn notifications(
        &self,
        page: u32,
        per_page: u32,
        is_read: Option<bool>,
    ) -> Result<NotificationPage, RequestError> {
        let mut data = Map::new();
        data.insert("page".to_string(), Value::from(page));
        data.insert("per_page".to_string(), Value::from(per_page));
        if let Some(is_read) = is_read {
            data.insert("is_read".to_string(), Value::from(is_read));
        }
        let payload = self
            .request(RequestOptions {
                url: "/api/notifications".to_string(),
                data,
                ..RequestOptions::default()
            })
            .await?;
        require_data(payload)
    }
}

/// Serialize a form into the object map the request pipeline carries.
fn to_object<T: Serialize>(form: &T) -> Result<Map<String, Value>, RequestError> {
    let value = serde_json::to_value(form).map_err(|e| RequestError::Decode(e.to_string()))?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(RequestError::Decode(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}

/// Unwrap the backend envelope and require its `data` member.
fn require_data<T: DeserializeOwned>(payload: Value) -> Result<T, RequestError> {
    let wrapper: ApiPayload<T> =
        serde_json::from_value(payload).map_err(|e| RequestError::Decode(e.to_string()))?;
    wrapper
        .data
        .ok_or_else(|| RequestError::Decode("payload carried no data".to_string()))
}
