//! Segment
//!
//! One append-only log file plus an in-memory index of key → offset of the
//! key's latest record in that file.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};

use crate::codec::{decode_from_stream, Entry, RecordIterator, HEADER_SIZE};
use crate::error::{Result, SegKvError};

use super::io::{write_all_at, ReadAt};

/// File name prefix shared by every segment file
pub const SEGMENT_PREFIX: &str = "segment-";

/// Older fixed name for the first log file; opened as segment 0
pub const LEGACY_SEGMENT_NAME: &str = "current-data";

/// File name for the segment with the given id
pub fn segment_file_name(id: u64) -> String {
    format!("{}{}", SEGMENT_PREFIX, id)
}

/// Parse a segment id from a file name
/// "segment-42" → Some(42), "current-data" → Some(0)
pub fn parse_segment_id(name: &str) -> Option<u64> {
    if name == LEGACY_SEGMENT_NAME {
        return Some(0);
    }
    let digits = name.strip_prefix(SEGMENT_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// A single log file and its index
///
/// ## Concurrency:
/// - Reads use positional I/O on the shared handle, no file lock
/// - `index`: short RwLock, mutated only by the appending thread
/// - `write_offset`: published after the record and index entry are in place,
///   so a reader never follows an offset past the written data
pub struct Segment {
    id: u64,
    path: PathBuf,
    file: File,
    index: RwLock<HashMap<Vec<u8>, u64>>,
    write_offset: AtomicU64,
    sealed: AtomicBool,
    /// Serializes appends
    append_lock: Mutex<()>,
}

impl Segment {
    /// Open a segment file, creating it empty if it does not exist
    ///
    /// An existing file is replayed from offset 0; a later record for a key
    /// overwrites the earlier index entry. Any truncated or malformed record
    /// fails the open.
    pub fn open(path: &Path, id: u64) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;

        let mut index = HashMap::new();
        let mut records = RecordIterator::new(BufReader::new(&file));
        let mut replayed = 0u64;
        for record in &mut records {
            let (offset, entry) = record?;
            index.insert(entry.key, offset);
            replayed += 1;
        }
        let write_offset = records.offset();

        tracing::debug!(
            segment = id,
            path = %path.display(),
            records = replayed,
            keys = index.len(),
            bytes = write_offset,
            "Segment opened"
        );

        Ok(Self {
            id,
            path: path.to_path_buf(),
            file,
            index: RwLock::new(index),
            write_offset: AtomicU64::new(write_offset),
            sealed: AtomicBool::new(false),
            append_lock: Mutex::new(()),
        })
    }

    /// Append an entry at the end of the segment
    ///
    /// Returns the offset the record was written at. On a failed write the
    /// index and `write_offset` are left untouched and the file is cut back
    /// to `write_offset`.
    pub fn append(&self, entry: Entry) -> Result<u64> {
        let _guard = self.append_lock.lock();
        if self.is_sealed() {
            return Err(SegKvError::SegmentSealed { id: self.id });
        }

        let record = entry.encode()?;
        let offset = self.write_offset.load(Ordering::Acquire);

        if let Err(e) = write_all_at(&self.file, &record, offset) {
            if let Err(truncate_err) = self.file.set_len(offset) {
                tracing::warn!(
                    segment = self.id,
                    offset,
                    error = %truncate_err,
                    "Could not cut back partial record"
                );
            }
            return Err(e.into());
        }

        self.index.write().insert(entry.key, offset);
        self.write_offset
            .store(offset + record.len() as u64, Ordering::Release);

        Ok(offset)
    }

    /// Look up the latest value for `key` in this segment
    ///
    /// Returns:
    /// - `Ok(value)` — key present
    /// - `Err(NotFound)` — key not in this segment
    /// - any other error — the record could not be read back
    pub fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        let offset = match self.index.read().get(key) {
            Some(&offset) => offset,
            None => return Err(SegKvError::NotFound),
        };

        let mut reader = ReadAt::new(&self.file, offset);
        let (entry, _) = decode_from_stream(&mut reader)?.ok_or(SegKvError::TruncatedRecord {
            expected: HEADER_SIZE,
            got: 0,
        })?;

        if entry.key != key {
            return Err(SegKvError::MalformedRecord(format!(
                "record at offset {} in segment {} holds a different key",
                offset, self.id
            )));
        }

        Ok(entry.value)
    }

    /// Bytes written so far
    pub fn size(&self) -> u64 {
        self.write_offset.load(Ordering::Acquire)
    }

    /// Number of distinct keys indexed
    pub fn key_count(&self) -> usize {
        self.index.read().len()
    }

    /// Flush written records to durable storage
    pub fn sync(&self) -> Result<()> {
        self.file.sync_data()?;
        Ok(())
    }

    /// Make the segment permanently read-only
    pub fn seal(&self) -> Result<()> {
        let _guard = self.append_lock.lock();
        self.sync()?;
        self.sealed.store(true, Ordering::Release);
        Ok(())
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::Acquire)
    }

    /// Release the file handle
    pub fn close(self) -> Result<()> {
        if !self.is_sealed() {
            self.sync()?;
        }
        tracing::debug!(segment = self.id, "Segment closed");
        Ok(())
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
