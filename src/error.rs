//! Error types for segkv
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using SegKvError
pub type Result<T> = std::result::Result<T, SegKvError>;

/// Unified error type for segkv operations
#[derive(Debug, Error)]
pub enum SegKvError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Record Errors
    // -------------------------------------------------------------------------
    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    #[error("Truncated record: expected {expected} bytes, got {got}")]
    TruncatedRecord { expected: usize, got: usize },

    // -------------------------------------------------------------------------
    // Lookup / Lifecycle Errors
    // -------------------------------------------------------------------------
    #[error("Key not found")]
    NotFound,

    #[error("Store is closed")]
    StoreClosed,

    #[error("Segment {id} is sealed")]
    SegmentSealed { id: u64 },

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("HTTP error: {0}")]
    Http(String),
}

impl SegKvError {
    /// True for the codec-level corruption variants
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            SegKvError::MalformedRecord(_) | SegKvError::TruncatedRecord { .. }
        )
    }
}
