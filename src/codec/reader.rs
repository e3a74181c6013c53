//! Sequential record reader
//!
//! Lazily decodes the records of a stream in order. Used for replay at
//! segment open time and for dumping a segment from the CLI.

use std::io::Read;

use crate::error::Result;

use super::record::{decode_from_stream, Entry};

/// Iterator over `(offset, entry)` pairs of a record stream
///
/// Stops after the first error; a clean end of stream on a record boundary
/// ends iteration normally.
pub struct RecordIterator<R> {
    reader: R,
    /// Offset of the next record, relative to where the stream started
    offset: u64,
    done: bool,
}

impl<R: Read> RecordIterator<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            offset: 0,
            done: false,
        }
    }

    /// Bytes consumed so far
    ///
    /// After the iterator is exhausted without error this is the stream length.
    pub fn offset(&self) -> u64 {
        self.offset
    }
}

impl<R: Read> Iterator for RecordIterator<R> {
    type Item = Result<(u64, Entry)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match decode_from_stream(&mut self.reader) {
            Ok(Some((entry, consumed))) => {
                let at = self.offset;
                self.offset += consumed as u64;
                Some(Ok((at, entry)))
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
