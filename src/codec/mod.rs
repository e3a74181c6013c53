//! Record Codec Module
//!
//! Self-delimiting binary records, so a segment file can be replayed from
//! offset 0 without any external index.
//!
//! ## Record Format
//! ```text
//! ┌──────────────┬──────────────┬─────────┬──────────────┬───────────┐
//! │ TotalLen (4) │ KeyLen (4)   │ Key     │ ValueLen (4) │ Value     │
//! └──────────────┴──────────────┴─────────┴──────────────┴───────────┘
//! ```
//!
//! All integers are little-endian u32. `TotalLen` counts the whole record,
//! header included, so `TotalLen == 12 + KeyLen + ValueLen`. There is no
//! checksum: a stream that ends mid-record is the only detectable corruption.

mod reader;
mod record;

pub use reader::RecordIterator;
pub use record::{decode_from_stream, encoded_len, Entry, HEADER_SIZE};
