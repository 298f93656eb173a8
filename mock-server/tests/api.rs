use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, db, Db};
use serde_json::{json, Value};
use tower::ServiceExt;

const PROJECT: &str = "PRO-TEST-1";

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

async fn register(state: &Db, id: &str, password: &str) {
    let resp = app(state.clone())
        .oneshot(json_request(
            "POST",
            &format!("/register?project_id={PROJECT}"),
            &json!({"id": id, "password": password}).to_string(),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

async fn login(state: &Db, id: &str, password: &str) -> Value {
    let resp = app(state.clone())
        .oneshot(json_request(
            "POST",
            "/auth",
            &json!({"id": id, "password": password, "project_id": PROJECT}).to_string(),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    body_json(resp).await
}

// --- auth ---

#[tokio::test]
async fn login_unknown_user_is_not_registered() {
    let state = db(PROJECT);
    let envelope = login(&state, "ghost", "pw").await;
    assert_eq!(envelope["status"], "fail");
    assert_eq!(envelope["code"], "Auth.0001");
}

#[tokio::test]
async fn register_then_login_returns_token() {
    let state = db(PROJECT);
    register(&state, "u1", "pw").await;
    let envelope = login(&state, "u1", "pw").await;
    assert_eq!(envelope["status"], "success");
    assert!(envelope["result"]["token"].is_string());

    let store = state.read().await;
    assert_eq!(store.registrations, 1);
    assert_eq!(store.logins, 1);
}

#[tokio::test]
async fn wrong_password_fails() {
    let state = db(PROJECT);
    register(&state, "u1", "pw").await;
    let envelope = login(&state, "u1", "nope").await;
    assert_eq!(envelope["code"], "Auth.0002");
}

#[tokio::test]
async fn register_requires_matching_project() {
    let state = db(PROJECT);
    let resp = app(state.clone())
        .oneshot(json_request(
            "POST",
            "/register?project_id=OTHER",
            r#"{"id":"u1","password":"pw"}"#,
        ))
        .await
        .unwrap();
    let envelope = body_json(resp).await;
    assert_eq!(envelope["code"], "Request.0001");
    assert!(state.read().await.users.is_empty());
}

#[tokio::test]
async fn register_decodes_percent_encoded_project() {
    let state = db("PRO TEST/1");
    let resp = app(state.clone())
        .oneshot(json_request(
            "POST",
            "/register?project_id=PRO+TEST%2F1",
            r#"{"id":"u1","password":"pw"}"#,
        ))
        .await
        .unwrap();
    let envelope = body_json(resp).await;
    assert_eq!(envelope["status"], "success");
    assert_eq!(state.read().await.registrations, 1);
}

#[tokio::test]
async fn register_without_project_is_rejected() {
    let state = db(PROJECT);
    let resp = app(state.clone())
        .oneshot(json_request("POST", "/register", r#"{"id":"u1","password":"pw"}"#))
        .await
        .unwrap();
    let envelope = body_json(resp).await;
    assert_eq!(envelope["code"], "Request.0001");
}

#[tokio::test]
async fn malformed_login_json_returns_422() {
    let resp = app(db(PROJECT))
        .oneshot(json_request("POST", "/auth", r#"{"id":1}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// --- users ---

#[tokio::test]
async fn current_user_without_token_is_forbidden() {
    let resp = app(db(PROJECT))
        .oneshot(Request::builder().uri("/users/self").body(String::new()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn current_user_with_token() {
    let state = db(PROJECT);
    register(&state, "u1", "pw").await;
    let token = login(&state, "u1", "pw").await["result"]["token"]
        .as_str()
        .unwrap()
        .to_string();

    let resp = app(state)
        .oneshot(
            Request::builder()
                .uri("/users/self")
                .header("Geocore-Access-Token", token)
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let envelope = body_json(resp).await;
    assert_eq!(envelope["result"]["id"], "u1");
    assert!(envelope["result"].get("password").is_none());
}

// --- objs ---

#[tokio::test]
async fn list_objs_empty() {
    let resp = app(db(PROJECT))
        .oneshot(Request::builder().uri("/objs").body(String::new()).unwrap())
        .await
        .unwrap();
    assert_eq!(body_json(resp).await, json!({"status": "success", "result": []}));
}

#[tokio::test]
async fn create_obj_requires_token() {
    let resp = app(db(PROJECT))
        .oneshot(json_request("POST", "/objs", r#"{"name":"cafe"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn nothing_returns_null_result() {
    let resp = app(db(PROJECT))
        .oneshot(Request::builder().uri("/nothing").body(String::new()).unwrap())
        .await
        .unwrap();
    assert_eq!(body_json(resp).await, json!({"status": "success", "result": null}));
}

// --- echo / upload ---

#[tokio::test]
async fn echo_reflects_query_and_body() {
    let resp = app(db(PROJECT))
        .oneshot(json_request("PUT", "/echo?a=1&b=2", r#"{"x":true}"#))
        .await
        .unwrap();
    let envelope = body_json(resp).await;
    assert_eq!(envelope["result"]["query"], "a=1&b=2");
    assert_eq!(envelope["result"]["body"], json!({"x": true}));
    assert_eq!(envelope["result"]["content_type"], "application/json");
    assert_eq!(envelope["result"]["token"], Value::Null);
}

#[tokio::test]
async fn upload_checks_multipart_framing() {
    let body = "--B1\r\nContent-Disposition: form-data; name=\"f\"; filename=\"a\"\r\nContent-Type: text/plain\r\n\r\nhi\r\n--B1--\r\n";
    let resp = app(db(PROJECT))
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/upload")
                .header(http::header::CONTENT_TYPE, "multipart/form-data; boundary=B1")
                .body(body.to_string())
                .unwrap(),
        )
        .await
        .unwrap();
    let envelope = body_json(resp).await;
    assert_eq!(envelope["status"], "success");
    assert_eq!(envelope["result"]["bytes"], body.len());
    assert_eq!(envelope["result"]["boundary"], "B1");
}

#[tokio::test]
async fn upload_rejects_plain_json() {
    let resp = app(db(PROJECT))
        .oneshot(json_request("POST", "/upload", "{}"))
        .await
        .unwrap();
    assert_eq!(body_json(resp).await["code"], "Upload.0001");
}

#[tokio::test]
async fn broken_endpoint_is_not_an_envelope() {
    let resp = app(db(PROJECT))
        .oneshot(Request::builder().uri("/broken").body(String::new()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(&body_bytes(resp).await[..], b"<html>not json</html>");
}
