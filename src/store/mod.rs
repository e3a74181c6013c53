//! Store Module
//!
//! The coordinator that owns every segment and the single logical key space.
//!
//! ## Responsibilities
//! - Discover and replay segment files on open
//! - Funnel all writes through one writer thread (append + rotation)
//! - Fan lookups out to a fixed pool of read workers
//! - Drain both paths and release every file on close

mod workers;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{bounded, Sender};
use parking_lot::{Mutex, RwLock};

use crate::codec::Entry;
use crate::config::Config;
use crate::error::{Result, SegKvError};
use crate::storage::{parse_segment_id, segment_file_name, Segment};

use workers::{ReadRequest, WriteRequest, Writer};

/// Ordered segments, oldest first, plus the index of the write target
///
/// `current` always names the last element.
#[derive(Default)]
struct SegmentList {
    segments: Vec<Arc<Segment>>,
    current: usize,
}

impl SegmentList {
    fn new(segments: Vec<Arc<Segment>>) -> Self {
        let current = segments.len().saturating_sub(1);
        Self { segments, current }
    }

    fn snapshot(&self) -> Vec<Arc<Segment>> {
        self.segments.clone()
    }

    fn current(&self) -> Option<Arc<Segment>> {
        self.segments.get(self.current).cloned()
    }

    /// Append a new segment and make it the write target
    fn promote(&mut self, segment: Arc<Segment>) {
        self.segments.push(segment);
        self.current = self.segments.len() - 1;
    }
}

/// State shared by the writer, the read workers and the handle
pub(crate) struct Shared {
    dir: PathBuf,
    segments: RwLock<SegmentList>,
}

impl Shared {
    fn current(&self) -> Result<Arc<Segment>> {
        self.segments.read().current().ok_or(SegKvError::StoreClosed)
    }
}

/// Per-segment numbers for tooling
#[derive(Debug, Clone)]
pub struct SegmentStats {
    pub id: u64,
    pub path: PathBuf,
    pub size: u64,
    pub keys: usize,
    pub current: bool,
}

/// A persistent key-value store over a directory of segment files
///
/// ## Concurrency Model
///
/// - **Writes**: every `put` becomes a message on one bounded queue consumed
///   by a single writer thread. Appends and rotations are applied in receipt
///   order; the caller blocks until its own write is applied.
/// - **Reads**: every `get` goes to a pool of read workers. A worker takes
///   the segment list lock just long enough to clone the list, then scans
///   without it. Sealed segments never change and the current segment's
///   index is only mutated by the writer.
/// - **Close**: drops the queue senders, joins every thread once the queues
///   drain, then closes the segments.
pub struct Store {
    config: Config,
    shared: Arc<Shared>,
    write_tx: RwLock<Option<Sender<WriteRequest>>>,
    read_tx: RwLock<Option<Sender<ReadRequest>>>,
    threads: Mutex<Vec<JoinHandle<()>>>,
}

impl Store {
    /// Open or create a store with the given config
    ///
    /// On startup:
    /// 1. Create the data directory if it doesn't exist
    /// 2. Replay every segment file, oldest first
    /// 3. Create `segment-0` if there were none
    /// 4. Start the writer and the read workers
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;
        fs::create_dir_all(&config.data_dir)?;

        let segments = Self::load_segments(&config.data_dir)?;
        let total: u64 = segments.iter().map(|s| s.size()).sum();
        tracing::info!(
            dir = %config.data_dir.display(),
            segments = segments.len(),
            bytes = total,
            "Store opened"
        );

        let shared = Arc::new(Shared {
            dir: config.data_dir.clone(),
            segments: RwLock::new(SegmentList::new(segments)),
        });

        let (write_tx, write_rx) = bounded(config.write_queue_depth);
        let (read_tx, read_rx) = bounded(config.read_queue_depth);
        let mut threads = Vec::with_capacity(config.read_workers + 1);

        let writer = Writer::new(
            Arc::clone(&shared),
            config.segment_size_limit,
            config.sync_strategy,
        );
        threads.push(
            thread::Builder::new()
                .name("segkv-writer".to_string())
                .spawn(move || writer.run(write_rx))?,
        );

        for worker in 0..config.read_workers {
            let shared = Arc::clone(&shared);
            let requests = read_rx.clone();
            threads.push(
                thread::Builder::new()
                    .name(format!("segkv-reader-{}", worker))
                    .spawn(move || workers::run_reader(worker, shared, requests))?,
            );
        }

        Ok(Self {
            config,
            shared,
            write_tx: RwLock::new(Some(write_tx)),
            read_tx: RwLock::new(Some(read_tx)),
            threads: Mutex::new(threads),
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        let config = Config::builder().data_dir(path).build();
        Self::open(config)
    }

    /// Store a value, blocking until the writer has applied it
    ///
    /// A rotation triggered by this write happens before this returns. If that
    /// rotation fails the write still succeeds, and the next write retries the
    /// rotation before appending, so a rotation error is only reported by a
    /// write that was not appended.
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let (reply_tx, reply_rx) = bounded(1);
        {
            let guard = self.write_tx.read();
            let tx = guard.as_ref().ok_or(SegKvError::StoreClosed)?;
            tx.send(WriteRequest {
                entry: Entry::new(key, value),
                reply: reply_tx,
            })
            .map_err(|_| SegKvError::StoreClosed)?;
        }
        reply_rx.recv().map_err(|_| SegKvError::StoreClosed)?
    }

    /// Get the newest value for `key`
    ///
    /// Returns `Err(NotFound)` when no segment holds the key.
    pub fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        let (reply_tx, reply_rx) = bounded(1);
        {
            let guard = self.read_tx.read();
            let tx = guard.as_ref().ok_or(SegKvError::StoreClosed)?;
            tx.send(ReadRequest {
                key: key.to_vec(),
                reply: reply_tx,
            })
            .map_err(|_| SegKvError::StoreClosed)?;
        }
        reply_rx.recv().map_err(|_| SegKvError::StoreClosed)?
    }

    /// Total bytes across all segments
    pub fn size(&self) -> u64 {
        self.shared
            .segments
            .read()
            .segments
            .iter()
            .map(|s| s.size())
            .sum()
    }

    /// Stop accepting work, drain in-flight operations, close every segment
    ///
    /// Calling it again is a no-op.
    pub fn close(&self) -> Result<()> {
        let write_tx = self.write_tx.write().take();
        let read_tx = self.read_tx.write().take();
        if write_tx.is_none() && read_tx.is_none() {
            return Ok(());
        }
        drop(write_tx);
        drop(read_tx);

        let mut first_error: Option<SegKvError> = None;

        // Queues drain before the loops end
        let threads = std::mem::take(&mut *self.threads.lock());
        for handle in threads {
            let name = handle.thread().name().unwrap_or("segkv-worker").to_string();
            if handle.join().is_err() {
                tracing::error!(thread = %name, "Worker thread panicked");
                first_error.get_or_insert_with(|| {
                    SegKvError::Io(io::Error::new(
                        io::ErrorKind::Other,
                        format!("{} panicked", name),
                    ))
                });
            }
        }

        let list = std::mem::take(&mut *self.shared.segments.write());
        let count = list.segments.len();
        for segment in list.segments {
            let result = match Arc::try_unwrap(segment) {
                Ok(segment) => segment.close(),
                Err(segment) => segment.sync(),
            };
            if let Err(e) = result {
                first_error.get_or_insert(e);
            }
        }

        tracing::info!(segments = count, "Store closed");

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    // =========================================================================
    // Accessors (for tooling and tests)
    // =========================================================================

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of segments, sealed and current
    pub fn segment_count(&self) -> usize {
        self.shared.segments.read().segments.len()
    }

    /// Id of the segment currently accepting writes
    pub fn current_segment_id(&self) -> Option<u64> {
        self.shared.segments.read().current().map(|s| s.id())
    }

    /// Size and key count for every segment, oldest first
    pub fn segment_stats(&self) -> Vec<SegmentStats> {
        let list = self.shared.segments.read();
        list.segments
            .iter()
            .enumerate()
            .map(|(i, s)| SegmentStats {
                id: s.id(),
                path: s.path().to_path_buf(),
                size: s.size(),
                keys: s.key_count(),
                current: i == list.current,
            })
            .collect()
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Open every segment file in `dir`, ordered by id
    ///
    /// All but the newest are sealed. An empty directory gets `segment-0`.
    fn load_segments(dir: &Path) -> Result<Vec<Arc<Segment>>> {
        let mut found: Vec<(u64, String)> = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if let Some(id) = parse_segment_id(name) {
                found.push((id, name.to_string()));
            }
        }

        // Numeric id order; the legacy name sorts ahead of segment-0
        found.sort();

        let mut segments = Vec::with_capacity(found.len().max(1));
        for (id, name) in &found {
            segments.push(Arc::new(Segment::open(&dir.join(name), *id)?));
        }

        if segments.is_empty() {
            let path = dir.join(segment_file_name(0));
            segments.push(Arc::new(Segment::open(&path, 0)?));
        }

        if let Some((_, sealed)) = segments.split_last() {
            for segment in sealed {
                segment.seal()?;
            }
        }

        Ok(segments)
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!(error = %e, "Error closing store on drop");
        }
    }
}
