//! Network Module
//!
//! HTTP front end over the store.
//!
//! ## Routes
//! - `GET  /db/{key}`  → 200 `{"key": .., "value": ..}`, 404 if absent
//! - `POST /db/{key}`  with `{"value": ..}` → 200, 400 on malformed JSON
//! - `GET  /health`    → 200 `OK`
//!
//! `{key}` is everything after `/db/`, slashes included.
//!
//! Internal failures map to 500; requests after the store closed get 503.

mod handlers;
mod server;

pub use handlers::{router, ApiError, GetResponse, PutRequest};
pub use server::Server;
