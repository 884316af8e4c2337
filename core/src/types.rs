//! Domain DTOs for the app backend.
//!
//! # Design
//! The backend wraps every response in the same `{success, message, data}`
//! envelope; `ApiPayload<T>` models that wrapper once so the endpoint
//! helpers can unwrap any payload uniformly. The inner types mirror the
//! mock-server's schema but are defined independently. Integration tests
//! catch schema drift between the two crates.
//!
//! Timestamps stay as the ISO 8601 strings the backend sends; none of the
//! app's screens do date arithmetic.

use serde::{Deserialize, Serialize};

/// The `{success, message, data}` wrapper around every backend response.
///
/// `data` carries no `#[serde(default)]`: on a generic field the attribute
/// puts a `T: Default` bound on the derived `Deserialize` impl, and a missing
/// or null `Option` field reads as `None` without it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiPayload<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// Login form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Registration form. The display name is optional; the backend falls back
/// to the username.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// An account as the backend reports it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub name: String,
    /// Only the profile endpoint includes roles; other payloads omit them.
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Payload of a successful login: the session token plus the account it
/// belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginData {
    pub token: String,
    pub user: UserProfile,
}

/// Payload of a successful registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationData {
    pub user: UserProfile,
}

/// One in-app notification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notification {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub is_read: bool,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_at: Option<String>,
}

/// One page of the notification feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationPage {
    pub notifications: Vec<Notification>,
    pub pagination: Pagination,
}

/// Paging block the backend attaches to list payloads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub pages: u32,
    pub per_page: u32,
    pub total: u64,
}
