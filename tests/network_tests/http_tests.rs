//! Tests for the HTTP front end
//!
//! These tests verify:
//! - POST then GET round-trips a value as JSON
//! - Status codes for misses, malformed input and a closed store
//! - Health endpoint
//! - Server shutdown closes the store

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use segkv::network::{router, GetResponse, Server};
use segkv::{Config, SegKvError, Store};
use tempfile::TempDir;
use tower::ServiceExt;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_app() -> (TempDir, Arc<Store>, Router) {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(Store::open_path(temp_dir.path()).unwrap());
    let app = router(Arc::clone(&store));
    (temp_dir, store, app)
}

fn post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

// =============================================================================
// Round-Trip Tests
// =============================================================================

#[tokio::test]
async fn test_post_then_get() {
    let (_temp, _store, app) = setup_app();

    let response = app
        .clone()
        .oneshot(post("/db/alpha", r#"{"value":"one"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/db/alpha")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let parsed: GetResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(
        parsed,
        GetResponse {
            key: "alpha".to_string(),
            value: "one".to_string(),
        }
    );
}

#[tokio::test]
async fn test_post_without_content_type() {
    let (_temp, store, app) = setup_app();

    let request = Request::builder()
        .method("POST")
        .uri("/db/plain")
        .body(Body::from(r#"{"value":"text"}"#))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(store.get(b"plain").unwrap(), b"text");
}

#[tokio::test]
async fn test_post_overwrites_value() {
    let (_temp, _store, app) = setup_app();

    for value in ["first", "second"] {
        let body = format!(r#"{{"value":"{}"}}"#, value);
        let response = app.clone().oneshot(post("/db/k", &body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app.oneshot(get("/db/k")).await.unwrap();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let parsed: GetResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(parsed.value, "second");
}

#[tokio::test]
async fn test_key_may_contain_slashes() {
    let (_temp, store, app) = setup_app();

    let response = app
        .clone()
        .oneshot(post("/db/users/42/name", r#"{"value":"ada"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(store.get(b"users/42/name").unwrap(), b"ada");

    let response = app.oneshot(get("/db/users/42/name")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let parsed: GetResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(parsed.key, "users/42/name");
    assert_eq!(parsed.value, "ada");
}

// =============================================================================
// Error Status Tests
// =============================================================================

#[tokio::test]
async fn test_get_missing_key_is_404() {
    let (_temp, _store, app) = setup_app();

    let response = app.oneshot(get("/db/nothing")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_json_is_400() {
    let (_temp, _store, app) = setup_app();

    let response = app.oneshot(post("/db/bad", "{not json")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_value_field_is_400() {
    let (_temp, _store, app) = setup_app();

    let response = app.oneshot(post("/db/bad", r#"{"other":"x"}"#)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_empty_key_is_400() {
    let (_temp, _store, app) = setup_app();

    let response = app.oneshot(get("/db/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unsupported_method_is_405() {
    let (_temp, _store, app) = setup_app();

    let request = Request::builder()
        .method("DELETE")
        .uri("/db/key")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_closed_store_is_503() {
    let (_temp, store, app) = setup_app();
    store.close().unwrap();

    let response = app.clone().oneshot(get("/db/key")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let response = app.oneshot(post("/db/key", r#"{"value":"v"}"#)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

// =============================================================================
// Health Tests
// =============================================================================

#[tokio::test]
async fn test_health() {
    let (_temp, _store, app) = setup_app();

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"OK");
}

// =============================================================================
// Server Lifecycle Tests
// =============================================================================

#[tokio::test]
async fn test_server_shutdown_closes_store() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path())
        .listen_addr("127.0.0.1:0")
        .build();
    let store = Arc::new(Store::open(config.clone()).unwrap());
    store.put(b"before", b"shutdown").unwrap();

    Server::new(config, Arc::clone(&store))
        .run_until(async {})
        .await
        .unwrap();

    assert!(matches!(store.put(b"after", b"v"), Err(SegKvError::StoreClosed)));
    assert!(matches!(store.get(b"before"), Err(SegKvError::StoreClosed)));

    drop(store);
    let reopened = Store::open_path(temp_dir.path()).unwrap();
    assert_eq!(reopened.get(b"before").unwrap(), b"shutdown");
}
