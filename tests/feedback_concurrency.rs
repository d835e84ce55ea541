//! Concurrent writers against one feedback database

use std::thread;

use support_assist::feedback::ConfidenceSource;
use support_assist::{AssistError, FeedbackStore};
use tempfile::TempDir;

#[test]
fn test_parallel_upserts_lose_nothing() {
    let dir = TempDir::new().unwrap();
    let store = FeedbackStore::open(dir.path().join("feedback.db")).unwrap();

    const WRITERS: u64 = 16;
    let handles: Vec<_> = (0..WRITERS)
        .map(|_| {
            let store = store.clone();
            thread::spawn(move || store.record_outcome("T-1", 1, true))
        })
        .collect();
    for h in handles {
        h.join().unwrap().unwrap();
    }

    let record = store.record("T-1", 1).unwrap();
    assert_eq!(record.attempt_count, WRITERS);
    assert_eq!(record.success_count, WRITERS);
}

#[test]
fn test_mixed_outcomes_keep_counters_consistent() {
    let dir = TempDir::new().unwrap();
    let store = FeedbackStore::open(dir.path().join("feedback.db")).unwrap();

    let handles: Vec<_> = (0..12u64)
        .map(|i| {
            let store = store.clone();
            thread::spawn(move || store.record_outcome("T-2", 3, i % 3 == 0))
        })
        .collect();
    for h in handles {
        h.join().unwrap().unwrap();
    }

    let record = store.record("T-2", 3).unwrap();
    assert_eq!(record.attempt_count, 12);
    assert_eq!(record.success_count, 4);
    assert!(record.success_count <= record.attempt_count);

    let confidence = store.confidence("T-2", 3).unwrap();
    assert!(confidence > 0.0 && confidence < 4.0 / 12.0);
}

#[test]
fn test_second_handle_sees_first_handles_writes() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("feedback.db");
    let a = FeedbackStore::open(&path).unwrap();
    let b = FeedbackStore::open(&path).unwrap();

    a.record_outcome("T-3", 2, false).unwrap();
    b.record_outcome("T-3", 2, true).unwrap();

    let record = a.record("T-3", 2).unwrap();
    assert_eq!((record.success_count, record.attempt_count), (1, 2));
}

#[test]
fn test_locked_database_fails_retryably_without_partial_write() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("feedback.db");
    let store = FeedbackStore::open(&path).unwrap();
    store.record_outcome("T-4", 1, true).unwrap();

    // Another session holds the write lock past the busy timeout
    let blocker = rusqlite::Connection::open(&path).unwrap();
    blocker.execute_batch("BEGIN EXCLUSIVE").unwrap();

    let err = store.record_outcome("T-4", 1, true).unwrap_err();
    assert!(matches!(err, AssistError::StorageFailure(_)));
    assert!(err.is_retryable());

    blocker.execute_batch("ROLLBACK").unwrap();
    let record = store.record("T-4", 1).unwrap();
    assert_eq!((record.success_count, record.attempt_count), (1, 1));
}
