//! HTTP Server
//!
//! Binds the listen address, serves the router until shutdown, then closes
//! the store.

use std::future::Future;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::config::Config;
use crate::error::{Result, SegKvError};
use crate::store::Store;

use super::handlers::router;

/// HTTP server for segkv
pub struct Server {
    config: Config,
    store: Arc<Store>,
}

impl Server {
    /// Create a new server with the given config and store
    pub fn new(config: Config, store: Arc<Store>) -> Self {
        Self { config, store }
    }

    /// Serve until Ctrl+C
    pub async fn run(self) -> Result<()> {
        self.run_until(ctrl_c()).await
    }

    /// Serve until `shutdown` resolves, then drain and close the store
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.config.listen_addr.clone();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| SegKvError::Http(format!("failed to bind {}: {}", addr, e)))?;

        tracing::info!("Listening on http://{}", addr);

        axum::serve(listener, router(Arc::clone(&self.store)))
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| SegKvError::Http(e.to_string()))?;

        tracing::info!("HTTP server stopped, closing store");

        let store = self.store;
        tokio::task::spawn_blocking(move || store.close())
            .await
            .map_err(|e| SegKvError::Http(format!("close task failed: {}", e)))?
    }
}

async fn ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl+C, initiating shutdown..."),
        Err(e) => tracing::error!("Failed to listen for Ctrl+C: {}", e),
    }
}
