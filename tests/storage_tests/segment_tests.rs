//! Tests for Segment
//!
//! These tests verify:
//! - Creating and reopening segment files
//! - Append/get and last-write-wins inside one segment
//! - Replay rebuilds the index and write offset
//! - Corrupt files fail to open
//! - Sealed segments stay readable but reject appends

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use segkv::codec::Entry;
use segkv::storage::Segment;
use segkv::SegKvError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_segment_path() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("segment-0");
    (temp_dir, path)
}

// =============================================================================
// Open/Create Tests
// =============================================================================

#[test]
fn test_open_creates_empty_file() {
    let (_temp, path) = setup_temp_segment_path();

    let segment = Segment::open(&path, 0).unwrap();

    assert!(path.exists());
    assert_eq!(segment.size(), 0);
    assert_eq!(segment.key_count(), 0);
    assert_eq!(segment.id(), 0);
    assert_eq!(segment.path(), path.as_path());
}

#[test]
fn test_open_fails_for_missing_directory() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("missing").join("segment-0");

    let result = Segment::open(&path, 0);

    assert!(matches!(result, Err(SegKvError::Io(_))));
}

// =============================================================================
// Append/Get Tests
// =============================================================================

#[test]
fn test_append_and_get() {
    let (_temp, path) = setup_temp_segment_path();
    let segment = Segment::open(&path, 0).unwrap();

    segment.append(Entry::new("hello", "world")).unwrap();

    assert_eq!(segment.get(b"hello").unwrap(), b"world");
}

#[test]
fn test_append_returns_record_offsets() {
    let (_temp, path) = setup_temp_segment_path();
    let segment = Segment::open(&path, 0).unwrap();

    let first = Entry::new("a", "1");
    let first_len = first.encoded_len() as u64;

    assert_eq!(segment.append(first).unwrap(), 0);
    assert_eq!(segment.append(Entry::new("b", "2")).unwrap(), first_len);
}

#[test]
fn test_size_tracks_encoded_bytes() {
    let (_temp, path) = setup_temp_segment_path();
    let segment = Segment::open(&path, 0).unwrap();

    let entries = [Entry::new("k1", "v1"), Entry::new("key2", "value2")];
    let expected: usize = entries.iter().map(|e| e.encoded_len()).sum();
    for entry in entries {
        segment.append(entry).unwrap();
    }

    assert_eq!(segment.size(), expected as u64);
    assert_eq!(fs::metadata(&path).unwrap().len(), expected as u64);
}

#[test]
fn test_get_missing_key() {
    let (_temp, path) = setup_temp_segment_path();
    let segment = Segment::open(&path, 0).unwrap();
    segment.append(Entry::new("present", "yes")).unwrap();

    let result = segment.get(b"absent");

    assert!(matches!(result, Err(SegKvError::NotFound)));
}

#[test]
fn test_last_write_wins() {
    let (_temp, path) = setup_temp_segment_path();
    let segment = Segment::open(&path, 0).unwrap();

    segment.append(Entry::new("key", "a")).unwrap();
    segment.append(Entry::new("key", "b")).unwrap();

    assert_eq!(segment.get(b"key").unwrap(), b"b");
    assert_eq!(segment.key_count(), 1);
}

#[test]
fn test_binary_and_empty_keys() {
    let (_temp, path) = setup_temp_segment_path();
    let segment = Segment::open(&path, 0).unwrap();

    segment.append(Entry::new(vec![0x00u8, 0xFF], vec![0x01u8])).unwrap();
    segment.append(Entry::new("", "empty key")).unwrap();
    segment.append(Entry::new("empty value", "")).unwrap();

    assert_eq!(segment.get(&[0x00, 0xFF]).unwrap(), vec![0x01]);
    assert_eq!(segment.get(b"").unwrap(), b"empty key");
    assert_eq!(segment.get(b"empty value").unwrap(), b"");
}

// =============================================================================
// Replay Tests
// =============================================================================

#[test]
fn test_reopen_replays_index() {
    let (_temp, path) = setup_temp_segment_path();
    let size_before;
    {
        let segment = Segment::open(&path, 0).unwrap();
        segment.append(Entry::new("k1", "v1")).unwrap();
        segment.append(Entry::new("k2", "v2")).unwrap();
        segment.append(Entry::new("k1", "v1-updated")).unwrap();
        size_before = segment.size();
        segment.close().unwrap();
    }

    let segment = Segment::open(&path, 0).unwrap();

    assert_eq!(segment.size(), size_before);
    assert_eq!(segment.key_count(), 2);
    assert_eq!(segment.get(b"k1").unwrap(), b"v1-updated");
    assert_eq!(segment.get(b"k2").unwrap(), b"v2");
}

#[test]
fn test_append_after_reopen_continues_at_end() {
    let (_temp, path) = setup_temp_segment_path();
    {
        let segment = Segment::open(&path, 0).unwrap();
        segment.append(Entry::new("first", "1")).unwrap();
        segment.close().unwrap();
    }

    let segment = Segment::open(&path, 0).unwrap();
    let offset = segment.append(Entry::new("second", "2")).unwrap();

    assert_eq!(offset, Entry::new("first", "1").encoded_len() as u64);
    assert_eq!(segment.get(b"first").unwrap(), b"1");
    assert_eq!(segment.get(b"second").unwrap(), b"2");
}

#[test]
fn test_open_truncated_file_fails() {
    let (_temp, path) = setup_temp_segment_path();
    {
        let segment = Segment::open(&path, 0).unwrap();
        segment.append(Entry::new("key", "value")).unwrap();
        segment.close().unwrap();
    }

    // Half of a second record
    let partial = Entry::new("other", "value").encode().unwrap();
    let mut file = OpenOptions::new().append(true).open(&path).unwrap();
    file.write_all(&partial[..partial.len() / 2]).unwrap();
    drop(file);

    let result = Segment::open(&path, 0);

    assert!(matches!(result, Err(SegKvError::TruncatedRecord { .. })));
}

#[test]
fn test_open_malformed_file_fails() {
    let (_temp, path) = setup_temp_segment_path();
    // Declared length smaller than a header
    fs::write(&path, 3u32.to_le_bytes()).unwrap();

    let result = Segment::open(&path, 0);

    assert!(matches!(result, Err(SegKvError::MalformedRecord(_))));
}

// =============================================================================
// Seal Tests
// =============================================================================

#[test]
fn test_sealed_segment_rejects_append() {
    let (_temp, path) = setup_temp_segment_path();
    let segment = Segment::open(&path, 7).unwrap();
    segment.append(Entry::new("key", "value")).unwrap();

    segment.seal().unwrap();

    assert!(segment.is_sealed());
    let result = segment.append(Entry::new("key", "other"));
    assert!(matches!(result, Err(SegKvError::SegmentSealed { id: 7 })));
    assert_eq!(segment.get(b"key").unwrap(), b"value");
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_reads_during_appends() {
    let (_temp, path) = setup_temp_segment_path();
    let segment = Arc::new(Segment::open(&path, 0).unwrap());
    segment.append(Entry::new("stable", "value")).unwrap();

    let mut handles = vec![];
    for _ in 0..4 {
        let segment = Arc::clone(&segment);
        handles.push(thread::spawn(move || {
            for _ in 0..200 {
                assert_eq!(segment.get(b"stable").unwrap(), b"value");
            }
        }));
    }

    for i in 0..200 {
        segment
            .append(Entry::new(format!("key{}", i), format!("value{}", i)))
            .unwrap();
    }

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(segment.key_count(), 201);
    assert_eq!(segment.get(b"key199").unwrap(), b"value199");
}
