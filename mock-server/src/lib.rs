use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const API_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Length of a rate-limit window, seconds.
pub const RATE_WINDOW: i64 = 60;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Permission {
    User,
    Admin,
    Root,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Token {
    pub id: i64,
    pub permission: Permission,
    pub token: String,
    pub userid: i64,
    pub retired: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Ban {
    pub id: i64,
    pub reason: String,
    pub admin: i64,
    pub date: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Deserialize)]
pub struct AddBan {
    pub id: i64,
    pub reason: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateToken {
    pub id: i64,
    pub permission: Permission,
}

#[derive(Debug, Default)]
pub struct Store {
    pub bans: BTreeMap<i64, Ban>,
    pub tokens: BTreeMap<i64, Token>,
    next_token_id: i64,
    rate_limit: Option<u32>,
    usage: HashMap<i64, (i64, u32)>,
}

impl Store {
    /// Store seeded with a single `Root` token (id 1, user 0).
    pub fn new(root_token: &str) -> Self {
        let mut store = Self {
            next_token_id: 1,
            ..Self::default()
        };
        store.insert_token(0, Permission::Root, root_token.to_string());
        store
    }

    /// Allow each token at most `limit` requests per `RATE_WINDOW`.
    pub fn with_rate_limit(mut self, limit: u32) -> Self {
        self.rate_limit = Some(limit);
        self
    }

    pub fn insert_token(&mut self, userid: i64, permission: Permission, secret: String) -> Token {
        let token = Token {
            id: self.next_token_id,
            permission,
            token: secret,
            userid,
            retired: false,
        };
        self.next_token_id += 1;
        self.tokens.insert(token.id, token.clone());
        token
    }

    fn find_active(&self, secret: &str) -> Option<&Token> {
        self.tokens
            .values()
            .find(|token| token.token == secret && !token.retired)
    }

    /// Count one request against `token_id`; returns the window end when the
    /// limit is exhausted.
    fn consume(&mut self, token_id: i64, now: i64) -> Result<(), i64> {
        let Some(limit) = self.rate_limit else {
            return Ok(());
        };
        let (start, count) = self.usage.entry(token_id).or_insert((now, 0));
        if now - *start >= RATE_WINDOW {
            *start = now;
            *count = 0;
        }
        if *count >= limit {
            return Err(*start + RATE_WINDOW);
        }
        *count += 1;
        Ok(())
    }
}

pub type Db = Arc<RwLock<Store>>;

/// Error response: a status plus `{"error": ...}` and any extra fields.
#[derive(Debug)]
pub struct Failure {
    status: StatusCode,
    body: Value,
}

impl Failure {
    fn new(status: StatusCode, message: &str) -> Self {
        Self {
            status,
            body: json!({ "error": message }),
        }
    }

    fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "Not Found")
    }
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

pub fn app(root_token: &str) -> Router {
    router(Store::new(root_token))
}

pub fn router(store: Store) -> Router {
    let db: Db = Arc::new(RwLock::new(store));
    Router::new()
        .route("/version", get(version))
        .route("/stats", get(stats))
        .route("/banlist", get(list_bans).post(add_ban))
        .route("/banlist/all", get(ban_ids))
        .route("/banlist/{id}", get(get_ban).delete(delete_ban))
        .route("/tokens", get(list_tokens).post(create_token))
        .route("/tokens/userid/{id}", get(user_tokens))
        .route("/tokens/{id}", get(get_token).delete(delete_token))
        .with_state(db)
}

pub async fn run(listener: TcpListener, root_token: &str) -> Result<(), std::io::Error> {
    axum::serve(listener, app(root_token)).await
}

fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Resolve the caller's token and check it against `required`.
fn authorize(store: &mut Store, headers: &HeaderMap, required: Permission) -> Result<Token, Failure> {
    let Some(caller) = bearer(headers).and_then(|secret| store.find_active(secret)).cloned() else {
        tracing::warn!("rejected request with missing or invalid token");
        return Err(Failure::new(StatusCode::UNAUTHORIZED, "Unauthorized"));
    };
    if let Err(until) = store.consume(caller.id, now()) {
        tracing::warn!(token_id = caller.id, until, "rate limit exceeded");
        return Err(Failure {
            status: StatusCode::TOO_MANY_REQUESTS,
            body: json!({ "error": "Too Many Requests", "until": until }),
        });
    }
    if caller.permission < required {
        tracing::warn!(token_id = caller.id, ?required, "insufficient permission");
        return Err(Failure::new(StatusCode::FORBIDDEN, "Forbidden"));
    }
    Ok(caller)
}

async fn version(State(db): State<Db>, headers: HeaderMap) -> Result<Json<Value>, Failure> {
    authorize(&mut *db.write().await, &headers, Permission::User)?;
    Ok(Json(json!({ "version": API_VERSION })))
}

async fn stats(State(db): State<Db>, headers: HeaderMap) -> Result<Json<Value>, Failure> {
    let mut store = db.write().await;
    authorize(&mut store, &headers, Permission::User)?;
    Ok(Json(json!({ "total_ban_count": store.bans.len() })))
}

async fn list_bans(State(db): State<Db>, headers: HeaderMap) -> Result<Json<Vec<Ban>>, Failure> {
    let mut store = db.write().await;
    authorize(&mut store, &headers, Permission::Root)?;
    Ok(Json(store.bans.values().cloned().collect()))
}

async fn add_ban(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<AddBan>,
) -> Result<StatusCode, Failure> {
    let mut store = db.write().await;
    let caller = authorize(&mut store, &headers, Permission::Admin)?;
    if input.reason.trim().is_empty() {
        return Err(Failure::new(StatusCode::BAD_REQUEST, "reason is required"));
    }
    let ban = Ban {
        id: input.id,
        reason: input.reason,
        admin: caller.id,
        date: now(),
        message: input.message,
    };
    tracing::info!(user_id = ban.id, admin = caller.id, "ban added");
    store.bans.insert(ban.id, ban);
    Ok(StatusCode::NO_CONTENT)
}

async fn ban_ids(State(db): State<Db>, headers: HeaderMap) -> Result<Json<Vec<i64>>, Failure> {
    let mut store = db.write().await;
    authorize(&mut store, &headers, Permission::User)?;
    Ok(Json(store.bans.keys().copied().collect()))
}

async fn get_ban(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Ban>, Failure> {
    let mut store = db.write().await;
    authorize(&mut store, &headers, Permission::User)?;
    store.bans.get(&id).cloned().map(Json).ok_or_else(Failure::not_found)
}

async fn delete_ban(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<StatusCode, Failure> {
    let mut store = db.write().await;
    let caller = authorize(&mut store, &headers, Permission::Admin)?;
    store.bans.remove(&id).ok_or_else(Failure::not_found)?;
    tracing::info!(user_id = id, admin = caller.id, "ban lifted");
    Ok(StatusCode::NO_CONTENT)
}

async fn list_tokens(State(db): State<Db>, headers: HeaderMap) -> Result<Json<Vec<Token>>, Failure> {
    let mut store = db.write().await;
    authorize(&mut store, &headers, Permission::Root)?;
    Ok(Json(store.tokens.values().cloned().collect()))
}

async fn create_token(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<CreateToken>,
) -> Result<(StatusCode, Json<Token>), Failure> {
    let mut store = db.write().await;
    authorize(&mut store, &headers, Permission::Root)?;
    if input.permission == Permission::Root {
        return Err(Failure::new(StatusCode::BAD_REQUEST, "Root tokens cannot be created"));
    }
    let token = store.insert_token(input.id, input.permission, Uuid::new_v4().simple().to_string());
    tracing::info!(token_id = token.id, userid = token.userid, "token created");
    Ok((StatusCode::CREATED, Json(token)))
}

async fn get_token(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Token>, Failure> {
    let mut store = db.write().await;
    authorize(&mut store, &headers, Permission::Root)?;
    store.tokens.get(&id).cloned().map(Json).ok_or_else(Failure::not_found)
}

async fn user_tokens(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(userid): Path<i64>,
) -> Result<Json<Vec<Token>>, Failure> {
    let mut store = db.write().await;
    authorize(&mut store, &headers, Permission::Root)?;
    let tokens: Vec<Token> = store
        .tokens
        .values()
        .filter(|token| token.userid == userid)
        .cloned()
        .collect();
    if tokens.is_empty() {
        return Err(Failure::not_found());
    }
    Ok(Json(tokens))
}

async fn delete_token(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<StatusCode, Failure> {
    let mut store = db.write().await;
    authorize(&mut store, &headers, Permission::Root)?;
    let token = store.tokens.get_mut(&id).ok_or_else(Failure::not_found)?;
    token.retired = true;
    tracing::info!(token_id = id, "token retired");
    Ok(StatusCode::NO_CONTENT)
}
