//! In-memory stand-in for the app backend, used by integration tests and
//! local development. Speaks the backend's envelope dialect: every response
//! is `{success, message?, data?}`, guarded routes answer 401 with an
//! `error_code`, and notification lists come paginated.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

/// A registered account. Passwords stay plaintext here; this server only
/// ever holds seed data.
#[derive(Clone, Debug)]
pub struct Account {
    pub id: i64,
    pub username: String,
    pub password: String,
    pub email: String,
    pub name: String,
    pub roles: Vec<String>,
}

impl Account {
    fn profile(&self) -> Value {
        json!({
            "id": self.id,
            "username": self.username,
            "email": self.email,
            "name": self.name,
        })
    }

    fn profile_with_roles(&self) -> Value {
        json!({
            "id": self.id,
            "username": self.username,
            "email": self.email,
            "name": self.name,
            "roles": self.roles,
        })
    }
}

/// A stored notification. `user_id` is bookkeeping and never serialized.
#[derive(Clone, Debug, Serialize)]
pub struct Notification {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub is_read: bool,
    pub created_at: String,
    pub read_at: Option<String>,
    #[serde(skip)]
    pub user_id: i64,
}

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub name: Option<String>,
}

#[derive(Deserialize)]
pub struct NotificationQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    pub is_read: Option<bool>,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    10
}

#[derive(Debug)]
pub struct AppState {
    accounts: RwLock<Vec<Account>>,
    /// Bearer token to account id.
    sessions: RwLock<HashMap<String, i64>>,
    notifications: Vec<Notification>,
}

impl AppState {
    /// Demo accounts and a small notification feed, newest first.
    pub fn seeded() -> Self {
        let accounts = vec![
            Account {
                id: 1,
                username: "alice".to_string(),
                password: "wonderland".to_string(),
                email: "alice@example.com".to_string(),
                name: "Alice Liddell".to_string(),
                roles: vec!["admin".to_string()],
            },
            Account {
                id: 2,
                username: "bob".to_string(),
                password: "builder".to_string(),
                email: "bob@example.com".to_string(),
                name: "Bob".to_string(),
                roles: Vec::new(),
            },
        ];
        let notifications = vec![
            Notification {
                id: 3,
                title: "scheduled maintenance".to_string(),
                content: "backend restarts tonight at 02:00".to_string(),
                is_read: false,
                created_at: "2024-05-03T18:00:00".to_string(),
                read_at: None,
                user_id: 1,
            },
            Notification {
                id: 2,
                title: "password policy updated".to_string(),
                content: "minimum length is now 10 characters".to_string(),
                is_read: false,
                created_at: "2024-05-02T09:15:00".to_string(),
                read_at: None,
                user_id: 1,
            },
            Notification {
                id: 1,
                title: "welcome aboard".to_string(),
                content: "your account has been activated".to_string(),
                is_read: true,
                created_at: "2024-05-01T08:30:00".to_string(),
                read_at: Some("2024-05-01T09:00:00".to_string()),
                user_id: 1,
            },
        ];
        Self {
            accounts: RwLock::new(accounts),
            sessions: RwLock::new(HashMap::new()),
            notifications,
        }
    }
}

pub type Db = Arc<AppState>;

pub fn app() -> Router {
    app_with_state(Arc::new(AppState::seeded()))
}

pub fn app_with_state(state: Db) -> Router {
    Router::new()
        .route("/api/login", post(login))
        .route("/api/register", post(register))
        .route("/api/logout", post(logout))
        .route("/api/users/me", get(current_user))
        .route("/api/notifications", get(notifications))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

type Reply = (StatusCode, Json<Value>);

fn fail(status: StatusCode, message: &str) -> Reply {
    (status, Json(json!({"success": false, "message": message})))
}

fn unauthorized(message: &str, error_code: &str) -> Reply {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"success": false, "message": message, "error_code": error_code})),
    )
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Resolve the request's bearer token to an account, mirroring the
/// backend's auth guard: no token and unknown token answer differently.
async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<Account, Reply> {
    let Some(token) = bearer_token(headers) else {
        return Err(unauthorized("login required", "UNAUTHORIZED"));
    };
    let account_id = {
        let sessions = state.sessions.read().await;
        sessions.get(token).copied()
    };
    let Some(account_id) = account_id else {
        return Err(unauthorized("token invalid or expired", "INVALID_TOKEN"));
    };
    let accounts = state.accounts.read().await;
    accounts
        .iter()
        .find(|account| account.id == account_id)
        .cloned()
        .ok_or_else(|| unauthorized("token invalid or expired", "INVALID_TOKEN"))
}

fn mint_token() -> String {
    format!("tok-{}", Uuid::new_v4())
}

async fn login(State(state): State<Db>, Json(form): Json<LoginForm>) -> Result<Json<Value>, Reply> {
    if form.username.is_empty() || form.password.is_empty() {
        return Err(fail(
            StatusCode::BAD_REQUEST,
            "username and password required",
        ));
    }

    let accounts = state.accounts.read().await;
    let account = accounts
        .iter()
        .find(|account| account.username == form.username && account.password == form.password)
        .cloned();
    drop(accounts);

    let Some(account) = account else {
        return Err(fail(
            StatusCode::UNAUTHORIZED,
            "invalid username or password",
        ));
    };

    let token = mint_token();
    state
        .sessions
        .write()
        .await
        .insert(token.clone(), account.id);
    tracing::debug!(username = %account.username, "login ok");

    Ok(Json(json!({
        "success": true,
        "message": "login successful",
        "data": {"token": token, "user": account.profile()},
    })))
}

async fn register(
    State(state): State<Db>,
    Json(form): Json<RegisterForm>,
) -> Result<Json<Value>, Reply> {
    if form.username.is_empty() || form.email.is_empty() || form.password.is_empty() {
        return Err(fail(
            StatusCode::BAD_REQUEST,
            "username, email and password required",
        ));
    }

    let mut accounts = state.accounts.write().await;
    if accounts.iter().any(|account| account.username == form.username) {
        return Err(fail(StatusCode::BAD_REQUEST, "username already exists"));
    }
    if accounts.iter().any(|account| account.email == form.email) {
        return Err(fail(StatusCode::BAD_REQUEST, "email already exists"));
    }

    let account = Account {
        id: accounts.iter().map(|account| account.id).max().unwrap_or(0) + 1,
        name: form.name.unwrap_or_else(|| form.username.clone()),
        username: form.username,
        password: form.password,
        email: form.email,
        roles: Vec::new(),
    };
    accounts.push(account.clone());
    tracing::debug!(username = %account.username, "account registered");

    Ok(Json(json!({
        "success": true,
        "message": "registration successful",
        "data": {"user": account.profile()},
    })))
}

async fn logout(State(state): State<Db>, headers: HeaderMap) -> Result<Json<Value>, Reply> {
    authenticate(&state, &headers).await?;
    if let Some(token) = bearer_token(&headers) {
        state.sessions.write().await.remove(token);
    }
    Ok(Json(json!({"success": true, "message": "logout successful"})))
}

async fn current_user(State(state): State<Db>, headers: HeaderMap) -> Result<Json<Value>, Reply> {
    let account = authenticate(&state, &headers).await?;
    Ok(Json(json!({
        "success": true,
        "data": account.profile_with_roles(),
    })))
}

async fn notifications(
    State(state): State<Db>,
    headers: HeaderMap,
    Query(query): Query<NotificationQuery>,
) -> Result<Json<Value>, Reply> {
    let account = authenticate(&state, &headers).await?;

    let mut feed: Vec<Notification> = state
        .notifications
        .iter()
        .filter(|n| n.user_id == account.id)
        .filter(|n| query.is_read.is_none_or(|is_read| n.is_read == is_read))
        .cloned()
        .collect();
    feed.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let (items, pagination) = paginate(feed, query.page, query.per_page);
    Ok(Json(json!({
        "success": true,
        "data": {"notifications": items, "pagination": pagination},
    })))
}

/// Slice one page out of the feed. A page past the end is empty rather
/// than an error, like the backend's paginator.
fn paginate(items: Vec<Notification>, page: u32, per_page: u32) -> (Vec<Notification>, Value) {
    let per_page = per_page.max(1);
    let total = items.len() as u64;
    let pages = total.div_ceil(per_page as u64);
    let start = (page.saturating_sub(1) as usize).saturating_mul(per_page as usize);
    let slice: Vec<Notification> = items
        .into_iter()
        .skip(start)
        .take(per_page as usize)
        .collect();
    let pagination = json!({
        "page": page,
        "pages": pages,
        "per_page": per_page,
        "total": total,
    });
    (slice, pagination)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(len: i64) -> Vec<Notification> {
        (1..=len)
            .map(|id| Notification {
                id,
                title: format!("notification {id}"),
                content: String::new(),
                is_read: false,
                created_at: format!("2024-05-{:02}T00:00:00", id),
                read_at: None,
                user_id: 1,
            })
            .collect()
    }

    #[test]
    fn notification_serializes_wire_shape() {
        let json = serde_json::to_value(&feed(1)[0]).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["is_read"], false);
        assert_eq!(json["read_at"], Value::Null);
        assert!(json.get("user_id").is_none());
    }

    #[test]
    fn login_form_defaults_missing_fields_to_empty() {
        let form: LoginForm = serde_json::from_str(r#"{"username":"alice"}"#).unwrap();
        assert_eq!(form.username, "alice");
        assert!(form.password.is_empty());
    }

    #[test]
    fn paginate_slices_and_counts() {
        let (items, pagination) = paginate(feed(5), 2, 2);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, 3);
        assert_eq!(pagination["pages"], 3);
        assert_eq!(pagination["total"], 5);
    }

    #[test]
    fn paginate_past_the_end_is_empty() {
        let (items, pagination) = paginate(feed(3), 9, 10);
        assert!(items.is_empty());
        assert_eq!(pagination["total"], 3);
    }

    #[test]
    fn paginate_clamps_zero_per_page() {
        let (items, pagination) = paginate(feed(3), 1, 0);
        assert_eq!(items.len(), 1);
        assert_eq!(pagination["per_page"], 1);
    }

    #[test]
    fn seeded_state_has_a_demo_admin() {
        let state = AppState::seeded();
        let accounts = state.accounts.try_read().unwrap();
        let alice = accounts.iter().find(|a| a.username == "alice").unwrap();
        assert_eq!(alice.roles, vec!["admin".to_string()]);
        assert!(state.notifications.iter().all(|n| n.user_id == alice.id));
    }
}
