//! HTTP handlers
//!
//! Maps requests on `/db/{*key}` onto store calls. The key is the rest of the
//! path, so it may contain `/`. Store calls block, so they
//! run on tokio's blocking pool.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::SegKvError;
use crate::store::Store;

/// Body of `POST /db/{key}`
#[derive(Debug, Serialize, Deserialize)]
pub struct PutRequest {
    pub value: String,
}

/// Body returned by `GET /db/{key}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetResponse {
    pub key: String,
    pub value: String,
}

/// Build the router over a shared store
pub fn router(store: Arc<Store>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/db/", get(missing_key).post(missing_key))
        .route("/db/{*key}", get(get_value).post(put_value))
        .with_state(store)
}

async fn health() -> &'static str {
    "OK"
}

async fn missing_key() -> ApiError {
    ApiError::BadRequest("missing key".to_string())
}

async fn get_value(
    State(store): State<Arc<Store>>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>, ApiError> {
    tracing::trace!(key = %key, "GET");

    let lookup = key.clone();
    let value = tokio::task::spawn_blocking(move || store.get(lookup.as_bytes())).await??;
    let value = String::from_utf8(value)
        .map_err(|_| ApiError::Internal(format!("value for {} is not valid UTF-8", key)))?;

    Ok(Json(GetResponse { key, value }))
}

async fn put_value(
    State(store): State<Arc<Store>>,
    Path(key): Path<String>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    tracing::trace!(key = %key, bytes = body.len(), "POST");

    // Parsed by hand so a missing Content-Type is still accepted
    let request: PutRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("invalid JSON: {}", e)))?;

    tokio::task::spawn_blocking(move || store.put(key.as_bytes(), request.value.as_bytes()))
        .await??;

    Ok(StatusCode::OK)
}

/// Handler failure, rendered as a status code
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Store(SegKvError),
    Internal(String),
}

impl From<SegKvError> for ApiError {
    fn from(e: SegKvError) -> Self {
        ApiError::Store(e)
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(e: tokio::task::JoinError) -> Self {
        ApiError::Internal(format!("store task failed: {}", e))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message).into_response(),
            ApiError::Store(SegKvError::NotFound) => StatusCode::NOT_FOUND.into_response(),
            ApiError::Store(SegKvError::StoreClosed) => {
                (StatusCode::SERVICE_UNAVAILABLE, "store is closed").into_response()
            }
            ApiError::Store(e) => {
                tracing::error!(error = %e, "Store operation failed");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
            }
            ApiError::Internal(message) => {
                tracing::error!(error = %message, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
            }
        }
    }
}
