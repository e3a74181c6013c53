//! Writer and read worker loops
//!
//! The writer is the only thread that appends or rotates. Read workers share
//! one lookup queue and scan segment snapshots newest → oldest.

use std::sync::Arc;

use crossbeam::channel::{Receiver, Sender};

use crate::codec::Entry;
use crate::config::SyncStrategy;
use crate::error::{Result, SegKvError};
use crate::storage::{segment_file_name, Segment};

use super::Shared;

/// A write intent; the caller blocks on `reply`
pub(crate) struct WriteRequest {
    pub entry: Entry,
    pub reply: Sender<Result<()>>,
}

/// A lookup; the caller blocks on `reply`
pub(crate) struct ReadRequest {
    pub key: Vec<u8>,
    pub reply: Sender<Result<Vec<u8>>>,
}

/// State owned by the writer thread
pub(crate) struct Writer {
    shared: Arc<Shared>,
    segment_size_limit: u64,
    sync_strategy: SyncStrategy,
    /// Appends since the last fsync
    unsynced: usize,
}

impl Writer {
    pub fn new(shared: Arc<Shared>, segment_size_limit: u64, sync_strategy: SyncStrategy) -> Self {
        Self {
            shared,
            segment_size_limit,
            sync_strategy,
            unsynced: 0,
        }
    }

    /// Apply write intents in receipt order until every sender is gone
    pub fn run(mut self, requests: Receiver<WriteRequest>) {
        tracing::debug!("Writer started");
        for request in requests.iter() {
            let result = self.apply(request.entry);
            // The caller only disappears if its thread died; nothing to report to
            let _ = request.reply.send(result);
        }
        tracing::debug!("Writer stopped");
    }

    /// Append to the current segment, then rotate if it crossed the limit
    ///
    /// A rotation that fails after the append is retried before the next
    /// append. Only that later write reports the error, and its record is
    /// not written.
    fn apply(&mut self, entry: Entry) -> Result<()> {
        let mut current = self.shared.current()?;
        if current.size() >= self.segment_size_limit {
            self.rotate(&current)?;
            current = self.shared.current()?;
        }

        current.append(entry)?;
        self.sync_after_append(&current)?;

        if current.size() >= self.segment_size_limit {
            if let Err(e) = self.rotate(&current) {
                tracing::warn!(
                    segment = current.id(),
                    error = %e,
                    "Rotation failed, retrying before the next write"
                );
            }
        }
        Ok(())
    }

    fn sync_after_append(&mut self, segment: &Segment) -> Result<()> {
        match self.sync_strategy {
            SyncStrategy::EveryWrite => segment.sync(),
            SyncStrategy::EveryNEntries { count } => {
                self.unsynced += 1;
                if self.unsynced >= count {
                    segment.sync()?;
                    self.unsynced = 0;
                }
                Ok(())
            }
        }
    }

    /// Seal `current` and promote a fresh segment in its place
    ///
    /// The new file is created before anything is sealed, so a failure here
    /// leaves `current` writable and the next write retries the rotation.
    fn rotate(&mut self, current: &Arc<Segment>) -> Result<()> {
        let id = current.id() + 1;
        let path = self.shared.dir.join(segment_file_name(id));
        let next = Arc::new(Segment::open(&path, id)?);

        current.seal()?;
        self.unsynced = 0;

        self.shared.segments.write().promote(next);

        tracing::debug!(
            sealed = current.id(),
            sealed_bytes = current.size(),
            current = id,
            "Rotated segment"
        );
        Ok(())
    }
}

/// Answer lookups until every sender is gone
pub(crate) fn run_reader(worker: usize, shared: Arc<Shared>, requests: Receiver<ReadRequest>) {
    tracing::debug!(worker, "Read worker started");
    for request in requests.iter() {
        let result = lookup(&shared, &request.key);
        let _ = request.reply.send(result);
    }
    tracing::debug!(worker, "Read worker stopped");
}

/// Scan segments newest → oldest and return the first hit
fn lookup(shared: &Shared, key: &[u8]) -> Result<Vec<u8>> {
    let snapshot = shared.segments.read().snapshot();

    for segment in snapshot.iter().rev() {
        match segment.get(key) {
            Ok(value) => return Ok(value),
            Err(SegKvError::NotFound) => continue,
            Err(e) => return Err(e),
        }
    }

    Err(SegKvError::NotFound)
}
