//! segkv Server Binary
//!
//! Opens the store and serves it over HTTP.

use std::sync::Arc;

use clap::Parser;
use segkv::network::Server;
use segkv::{Config, Store, SyncStrategy};
use tracing_subscriber::{fmt, EnvFilter};

/// segkv Server
#[derive(Parser, Debug)]
#[command(name = "segkv-server")]
#[command(about = "Segmented append-only key-value store over HTTP")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./segkv_data")]
    data_dir: String,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:8079")]
    listen: String,

    /// Segment size in bytes before rotation
    #[arg(short, long, default_value = "100")]
    segment_size: u64,

    /// Number of read workers
    #[arg(short, long, default_value = "10")]
    read_workers: usize,

    /// fsync every N writes (0 = every write)
    #[arg(long, default_value = "0")]
    sync_every: usize,
}

#[tokio::main]
async fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,segkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("segkv Server v{}", segkv::VERSION);
    tracing::info!("Data directory: {}", args.data_dir);
    tracing::info!("Listen address: {}", args.listen);

    let sync_strategy = match args.sync_every {
        0 => SyncStrategy::EveryWrite,
        count => SyncStrategy::EveryNEntries { count },
    };

    // Build config from args
    let config = Config::builder()
        .data_dir(&args.data_dir)
        .listen_addr(&args.listen)
        .segment_size_limit(args.segment_size)
        .read_workers(args.read_workers)
        .sync_strategy(sync_strategy)
        .build();

    // Open store
    let store = match Store::open(config.clone()) {
        Ok(s) => Arc::new(s),
        Err(e) => {
            if e.is_corruption() {
                tracing::error!("Segment data in {} is corrupt: {}", args.data_dir, e);
            } else {
                tracing::error!("Failed to open store: {}", e);
            }
            std::process::exit(1);
        }
    };

    tracing::info!(
        segments = store.segment_count(),
        bytes = store.size(),
        "Store initialized successfully"
    );

    let server = Server::new(config, store);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
