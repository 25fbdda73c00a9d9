//! End-to-end tests over the full router, in-memory store behind the
//! connection manager.
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use inventory_common::Role;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use inventory_backend_lib::{
    config::Settings,
    connection::Dialer,
    router::create_router,
    storage::{MemoryStore, Store},
    AppState,
};

const PASSWORD: &str = "Str0ng&Secure1";

struct MemoryDialer;

#[async_trait::async_trait]
impl Dialer for MemoryDialer {
    async fn dial(&self) -> anyhow::Result<Arc<dyn Store>> {
        Ok(Arc::new(MemoryStore::new()))
    }
}

fn test_app() -> (AppState, Router) {
    let state = AppState::new(Arc::new(MemoryDialer), Settings::default());
    let app = create_router(state.clone());
    (state, app)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1 << 20)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn register(app: &Router, username: &str) -> (String, Uuid) {
    let (status, body) = send(
        app,
        Method::POST,
        "/users/register",
        None,
        Some(json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": PASSWORD,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
    let token = body["token"].as_str().unwrap().to_string();
    let user_id = body["user"]["id"].as_str().unwrap().parse().unwrap();
    (token, user_id)
}

async fn create_item(app: &Router, token: &str, name: &str) -> Uuid {
    let (status, body) = send(
        app,
        Method::POST,
        "/items",
        Some(token),
        Some(json!({ "name": name, "quantity": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
    body["id"].as_str().unwrap().parse().unwrap()
}

#[tokio::test]
async fn register_returns_token_and_user() {
    let (_state, app) = test_app();
    let (token, _) = register(&app, "alice").await;
    assert!(!token.is_empty());

    // the token works immediately
    let (status, body) = send(&app, Method::GET, "/users/profile", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "alice");
    assert_eq!(body["role"], "standard");
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
async fn register_validates_input() {
    let (_state, app) = test_app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/users/register",
        None,
        Some(json!({ "username": "al", "email": "al@example.com", "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VAL_001");

    let (status, _) = send(
        &app,
        Method::POST,
        "/users/register",
        None,
        Some(json!({ "username": "alice", "email": "alice@example.com", "password": "weak" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn register_rejects_duplicates() {
    let (_state, app) = test_app();
    register(&app, "alice").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/users/register",
        None,
        Some(json!({
            "username": "alice2",
            "email": "alice@example.com",
            "password": PASSWORD,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "DUP_001");
}

#[tokio::test]
async fn login_round_trip() {
    let (_state, app) = test_app();
    register(&app, "alice").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/users/login",
        None,
        Some(json!({ "email": "alice@example.com", "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].as_str().is_some());

    let (status, body) = send(
        &app,
        Method::POST,
        "/users/login",
        None,
        Some(json!({ "email": "alice@example.com", "password": "WrongPass1!" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "AUTH_001");

    // unknown account looks the same as a bad password
    let (status, _) = send(
        &app,
        Method::POST,
        "/users/login",
        None,
        Some(json!({ "email": "nobody@example.com", "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn password_change_rehashes_credentials() {
    let (_state, app) = test_app();
    let (token, _) = register(&app, "alice").await;

    let (status, body) = send(
        &app,
        Method::PUT,
        "/users/profile",
        Some(&token),
        Some(json!({ "password": "N3w&Secure99" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "password change failed: {body}");
    assert_eq!(body["username"], "alice");
    assert!(body.get("password_hash").is_none());

    // the old password stops working, the new one takes over
    let (status, _) = send(
        &app,
        Method::POST,
        "/users/login",
        None,
        Some(json!({ "email": "alice@example.com", "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        Method::POST,
        "/users/login",
        None,
        Some(json!({ "email": "alice@example.com", "password": "N3w&Secure99" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].as_str().is_some());
}

#[tokio::test]
async fn password_change_requires_auth_and_strength() {
    let (_state, app) = test_app();
    let (token, _) = register(&app, "alice").await;

    let (status, _) = send(
        &app,
        Method::PUT,
        "/users/profile",
        None,
        Some(json!({ "password": "N3w&Secure99" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        Method::PUT,
        "/users/profile",
        Some(&token),
        Some(json!({ "password": "weak" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VAL_001");

    // the rejected change must not disturb the stored credential
    let (status, _) = send(
        &app,
        Method::POST,
        "/users/login",
        None,
        Some(json!({ "email": "alice@example.com", "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn ownership_is_enforced_on_mutation() {
    let (_state, app) = test_app();
    let (alice_token, _) = register(&app, "alice").await;
    let (bob_token, _) = register(&app, "bob").await;

    let item_id = create_item(&app, &bob_token, "bobs-crate").await;

    // alice may not touch bob's item
    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/items/{item_id}"),
        Some(&alice_token),
        Some(json!({ "name": "stolen" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "AUTHZ_001");

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/items/{item_id}"),
        Some(&alice_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // bob may
    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/items/{item_id}"),
        Some(&bob_token),
        Some(json!({ "quantity": 7 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["quantity"], 7);
    assert_eq!(body["name"], "bobs-crate");
}

#[tokio::test]
async fn admin_may_mutate_any_item() {
    let (state, app) = test_app();
    let (bob_token, _) = register(&app, "bob").await;
    let item_id = create_item(&app, &bob_token, "bobs-crate").await;

    // the token is the sole source of the caller's role
    let admin_token = state.tokens.issue(Uuid::new_v4(), Role::Admin).unwrap();
    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/items/{item_id}"),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, Method::GET, &format!("/items/{item_id}"), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn missing_item_is_404_regardless_of_caller() {
    let (_state, app) = test_app();
    let (token, _) = register(&app, "alice").await;
    let ghost = Uuid::new_v4();

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/items/{ghost}"),
        Some(&token),
        Some(json!({ "name": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NF_001");
}

#[tokio::test]
async fn mandatory_routes_reject_anonymous_and_expired() {
    let (state, app) = test_app();
    register(&app, "alice").await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/items",
        None,
        Some(json!({ "name": "widget" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let expired = state
        .tokens
        .issue_with_ttl(Uuid::new_v4(), Role::Standard, Duration::from_secs(1))
        .unwrap();
    tokio::time::sleep(Duration::from_secs(2)).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/items",
        Some(&expired),
        Some(json!({ "name": "widget" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "AUTH_001");
}

#[tokio::test]
async fn anonymous_reads_omit_owner_fields() {
    let (_state, app) = test_app();
    let (bob_token, bob_id) = register(&app, "bob").await;
    create_item(&app, &bob_token, "bobs-crate").await;

    // anonymous: item visible, owner withheld
    let (status, body) = send(&app, Method::GET, "/items", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["name"], "bobs-crate");
    assert!(items[0].get("created_by").is_none());

    // authenticated: owner block present
    let (status, body) = send(&app, Method::GET, "/items", Some(&bob_token), None).await;
    assert_eq!(status, StatusCode::OK);
    let items = body.as_array().unwrap();
    assert_eq!(
        items[0]["created_by"]["id"].as_str().unwrap(),
        bob_id.to_string()
    );
    assert_eq!(items[0]["created_by"]["username"], "bob");
}

#[tokio::test]
async fn health_and_index_need_no_auth() {
    let (_state, app) = test_app();

    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = send(&app, Method::GET, "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["endpoints"]["items"]["get_all"].is_string());
}
