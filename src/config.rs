//! Configuration for segkv
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{Result, SegKvError};

/// Main configuration for a segkv store
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Directory holding the segment files
    ///   {data_dir}/
    ///     ├── segment-0
    ///     ├── segment-1
    ///     └── segment-N        (current write target)
    pub data_dir: PathBuf,

    /// Rotate the current segment once its size reaches this many bytes
    pub segment_size_limit: u64,

    /// How often appended records are fsynced
    pub sync_strategy: SyncStrategy,

    // -------------------------------------------------------------------------
    // Concurrency Configuration
    // -------------------------------------------------------------------------
    /// Number of read worker threads
    pub read_workers: usize,

    /// Capacity of the write intent queue
    pub write_queue_depth: usize,

    /// Capacity of the lookup queue shared by the read workers
    pub read_queue_depth: usize,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// HTTP listen address
    pub listen_addr: String,
}

/// Segment sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    /// fsync after every append (a successful put is durable)
    EveryWrite,

    /// fsync after N appends; rotation and close always fsync
    EveryNEntries { count: usize },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./segkv_data"),
            segment_size_limit: 100,
            sync_strategy: SyncStrategy::EveryWrite,
            read_workers: 10,
            write_queue_depth: 128,
            read_queue_depth: 128,
            listen_addr: "127.0.0.1:8079".to_string(),
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject settings the store cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.segment_size_limit == 0 {
            return Err(SegKvError::Config(
                "segment_size_limit must be greater than zero".to_string(),
            ));
        }
        if self.read_workers == 0 {
            return Err(SegKvError::Config(
                "read_workers must be greater than zero".to_string(),
            ));
        }
        if self.write_queue_depth == 0 || self.read_queue_depth == 0 {
            return Err(SegKvError::Config(
                "queue depths must be greater than zero".to_string(),
            ));
        }
        if let SyncStrategy::EveryNEntries { count: 0 } = self.sync_strategy {
            return Err(SegKvError::Config(
                "EveryNEntries count must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the segment rotation threshold (in bytes)
    pub fn segment_size_limit(mut self, bytes: u64) -> Self {
        self.config.segment_size_limit = bytes;
        self
    }

    /// Set the sync strategy
    pub fn sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.config.sync_strategy = strategy;
        self
    }

    /// Set the number of read workers
    pub fn read_workers(mut self, count: usize) -> Self {
        self.config.read_workers = count;
        self
    }

    /// Set the write queue capacity
    pub fn write_queue_depth(mut self, depth: usize) -> Self {
        self.config.write_queue_depth = depth;
        self
    }

    /// Set the read queue capacity
    pub fn read_queue_depth(mut self, depth: usize) -> Self {
        self.config.read_queue_depth = depth;
        self
    }

    /// Set the HTTP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
