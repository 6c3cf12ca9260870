//! Store edge condition tests
//!
//! Exercises the two bad-timing paths of the client contract: a
//! subscriber whose change feed has already overwritten its oldest
//! entries, and a transaction whose read-commit window collides on
//! every attempt until the retry bound trips.

use std::sync::Arc;

use serde_json::json;

use tallyspin_core::{CounterDoc, DocKey, DocSnapshot, DocumentStore, MemoryStore, TallyError};

// ============================================================================
// Test Utilities
// ============================================================================

fn counter_key() -> DocKey {
    DocKey::new("counters", "clicks")
}

fn count_of(snapshot: &DocSnapshot) -> u64 {
    snapshot
        .parse::<CounterDoc>()
        .ok()
        .flatten()
        .unwrap_or_default()
        .count
}

// ============================================================================
// Subscription Lag Tests
// ============================================================================

/// Test that a lagging subscriber skips overwritten entries and still
/// converges on the newest count
#[tokio::test]
async fn test_lagged_watch_converges_on_latest_count() {
    let store = MemoryStore::new();
    let key = counter_key();
    let mut watch = store.subscribe(&key);

    let initial = watch.changed().await.unwrap();
    assert!(!initial.exists());

    // More writes than the change feed retains, while the watch sits
    // idle; the feed overwrites its oldest entries underneath it.
    for i in 1..=300u64 {
        store.put(&key, json!({ "count": i }));
    }

    let mut deliveries = 0u32;
    let mut last = 0u64;
    while last != 300 {
        assert!(deliveries < 300, "watch should have converged by now");
        let snapshot = watch.changed().await.unwrap();
        assert_eq!(snapshot.key(), &key);

        let count = count_of(&snapshot);
        assert!(count > last, "catch-up went backwards: {} after {}", count, last);
        last = count;
        deliveries += 1;
    }

    // The overwritten entries were skipped, not replayed one by one.
    assert!(deliveries < 300);
}

// ============================================================================
// Retry Bound Tests
// ============================================================================

/// Test that a transaction colliding on every attempt gives up with a
/// contention error instead of spinning forever
#[tokio::test]
async fn test_contended_transaction_exhausts_its_retries() {
    let store = Arc::new(MemoryStore::new());
    let key = counter_key();

    // A writer that bumps the document version at every scheduling
    // point lands inside each read-commit window in turn.
    let writer = tokio::spawn({
        let store = store.clone();
        let key = key.clone();
        async move {
            for _ in 0..32 {
                store.put(&key, json!({ "count": 0 }));
                tokio::task::yield_now().await;
            }
        }
    });

    let result = store
        .run_transaction(&key, |snap| json!({ "count": count_of(snap) + 1 }))
        .await;

    match result {
        Err(TallyError::TransactionContention { attempts }) => assert_eq!(attempts, 8),
        other => panic!("expected contention exhaustion, got {:?}", other),
    }

    writer.await.unwrap();
    // The increment never landed; the document holds the writer's value.
    assert_eq!(count_of(&store.snapshot(&key)), 0);
}
