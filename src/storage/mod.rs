//! Storage Module
//!
//! Segment files: the physical half of the store.
//!
//! ## Responsibilities
//! - Own one append-only file per segment
//! - Rebuild each segment's key → offset index by replay at open
//! - Point lookups by seeking straight to the indexed record
//! - Track segment size for rotation decisions
//!
//! ## Directory Layout
//! ```text
//! {data_dir}/
//!   ├── segment-0      (sealed)
//!   ├── segment-1      (sealed)
//!   └── segment-2      (current: the only append target)
//! ```
//!
//! Each file is a raw concatenation of records (see [`crate::codec`]) with no
//! file-level header, trailer or checksum.

mod io;
mod segment;

pub use segment::{
    parse_segment_id, segment_file_name, Segment, LEGACY_SEGMENT_NAME, SEGMENT_PREFIX,
};
