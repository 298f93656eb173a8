use std::{collections::HashMap, sync::Arc};

use axum::{
    body::Bytes,
    extract::{Query, RawQuery, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const ACCESS_TOKEN_HEADER: &str = "geocore-access-token";
pub const USER_NOT_REGISTERED: &str = "Auth.0001";
pub const WRONG_PASSWORD: &str = "Auth.0002";
pub const UNKNOWN_PROJECT: &str = "Request.0001";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Obj {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
}

#[derive(Deserialize)]
pub struct Login {
    pub id: String,
    pub password: String,
    pub project_id: String,
}

#[derive(Debug, Default)]
pub struct Store {
    pub project_id: String,
    pub users: HashMap<String, User>,
    pub tokens: HashMap<String, String>,
    pub objs: Vec<Obj>,
    /// Number of successful `/register` calls, for retry assertions.
    pub registrations: usize,
    /// Number of `/auth` calls, successful or not.
    pub logins: usize,
}

pub type Db = Arc<RwLock<Store>>;

/// Envelope for a successful call.
pub fn success(result: impl Serialize) -> Json<Value> {
    Json(json!({"status": "success", "result": result}))
}

/// Envelope for a failed call (still HTTP 200).
pub fn failure(code: &str, message: &str) -> Json<Value> {
    Json(json!({"status": "fail", "code": code, "message": message}))
}

pub fn db(project_id: &str) -> Db {
    Arc::new(RwLock::new(Store {
        project_id: project_id.to_string(),
        ..Store::default()
    }))
}

pub fn app(db: Db) -> Router {
    Router::new()
        .route("/auth", post(login))
        .route("/register", post(register))
        .route("/users/self", get(current_user))
        .route("/objs", get(list_objs).post(create_obj))
        .route("/nothing", get(nothing))
        .route("/echo", get(echo).post(echo).put(echo).delete(echo))
        .route("/upload", post(upload))
        .route("/broken", get(broken))
        .with_state(db)
}

pub async fn run(listener: TcpListener, db: Db) -> Result<(), std::io::Error> {
    axum::serve(listener, app(db)).await
}

fn token_user(store: &Store, headers: &HeaderMap) -> Option<User> {
    let token = headers.get(ACCESS_TOKEN_HEADER)?.to_str().ok()?;
    let user_id = store.tokens.get(token)?;
    store.users.get(user_id).cloned()
}

async fn login(State(db): State<Db>, Json(input): Json<Login>) -> Json<Value> {
    let mut store = db.write().await;
    store.logins += 1;
    if input.project_id != store.project_id {
        return failure(UNKNOWN_PROJECT, "unknown project");
    }
    let Some(user) = store.users.get(&input.id) else {
        return failure(USER_NOT_REGISTERED, "user not registered");
    };
    if user.password.as_deref() != Some(input.password.as_str()) {
        return failure(WRONG_PASSWORD, "wrong password");
    }
    let token = Uuid::new_v4().to_string();
    store.tokens.insert(token.clone(), input.id);
    success(json!({ "token": token }))
}

async fn register(
    State(db): State<Db>,
    Query(query): Query<HashMap<String, String>>,
    Json(user): Json<User>,
) -> Json<Value> {
    let mut store = db.write().await;
    if query.get("project_id") != Some(&store.project_id) {
        return failure(UNKNOWN_PROJECT, "unknown project");
    }
    store.registrations += 1;
    store.users.insert(user.id.clone(), user.clone());
    success(user)
}

async fn current_user(
    State(db): State<Db>,
    headers: HeaderMap,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let store = db.read().await;
    token_user(&store, &headers)
        .map(success)
        .ok_or((StatusCode::FORBIDDEN, failure("Auth.0403", "forbidden")))
}

async fn list_objs(State(db): State<Db>) -> Json<Value> {
    success(db.read().await.objs.clone())
}

async fn create_obj(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(mut obj): Json<Obj>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let mut store = db.write().await;
    if token_user(&store, &headers).is_none() {
        return Err((StatusCode::FORBIDDEN, failure("Auth.0403", "forbidden")));
    }
    obj.id = Some(format!("OBJ-{}", store.objs.len() + 1));
    store.objs.push(obj.clone());
    Ok(success(obj))
}

async fn nothing() -> Json<Value> {
    success(Value::Null)
}

/// Reflects what arrived, so clients can check request construction.
async fn echo(RawQuery(query): RawQuery, headers: HeaderMap, body: Bytes) -> Json<Value> {
    let body: Value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).into_owned()))
    };
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string);
    success(json!({
        "query": query,
        "body": body,
        "token": header(ACCESS_TOKEN_HEADER),
        "content_type": header("content-type"),
    }))
}

async fn upload(headers: HeaderMap, body: Bytes) -> Json<Value> {
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let Some(boundary) = content_type.strip_prefix("multipart/form-data; boundary=") else {
        return failure("Upload.0001", "not a multipart request");
    };
    let text = String::from_utf8_lossy(&body);
    let closing = format!("--{boundary}--\r\n");
    if !text.starts_with(&format!("--{boundary}\r\n")) || !text.ends_with(&closing) {
        return failure("Upload.0002", "malformed multipart body");
    }
    success(json!({ "bytes": body.len(), "boundary": boundary }))
}

async fn broken() -> (StatusCode, &'static str) {
    (StatusCode::OK, "<html>not json</html>")
}
