//! In-memory document store
//!
//! Reference implementation of the client contract, shared by the kiosk
//! and the test suite. Documents are versioned so the transaction path
//! really is optimistic: the read happens under one lock acquisition,
//! the commit under another, with a scheduling point between them, and
//! a commit only lands if the version it read is still current.

use std::collections::HashMap;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::debug;

use super::{DocSnapshot, DocWatch, DocumentStore};
use crate::error::{TallyError, TallyResult};
use crate::types::DocKey;

/// Capacity of each document's change feed
const CHANGE_CHANNEL_CAPACITY: usize = 256;

/// Read-modify-write attempts before a transaction gives up
const MAX_TRANSACTION_ATTEMPTS: u32 = 8;

struct DocEntry {
    data: Option<Value>,
    version: u64,
    changes: broadcast::Sender<DocSnapshot>,
}

impl DocEntry {
    fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            data: None,
            version: 0,
            changes,
        }
    }

    fn snapshot(&self, key: &DocKey) -> DocSnapshot {
        DocSnapshot::new(key.clone(), self.data.clone())
    }

    fn commit(&mut self, key: &DocKey, data: Option<Value>) {
        self.data = data;
        self.version += 1;
        // No receivers is fine; nobody is watching this document yet.
        let _ = self.changes.send(self.snapshot(key));
    }
}

/// Shared in-memory store of versioned documents
#[derive(Default)]
pub struct MemoryStore {
    docs: Mutex<HashMap<DocKey, DocEntry>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Plain write outside any transaction
    ///
    /// Stands in for the writes other clients make against the shared
    /// store; subscribers observe it like any committed change.
    pub fn put(&self, key: &DocKey, data: Value) {
        let mut docs = self.docs.lock();
        let entry = docs.entry(key.clone()).or_insert_with(DocEntry::new);
        entry.commit(key, Some(data));
    }

    /// Remove a document; subscribers observe a missing snapshot
    pub fn delete(&self, key: &DocKey) {
        let mut docs = self.docs.lock();
        if let Some(entry) = docs.get_mut(key) {
            entry.commit(key, None);
        }
    }
}

impl DocumentStore for MemoryStore {
    fn snapshot(&self, key: &DocKey) -> DocSnapshot {
        let docs = self.docs.lock();
        match docs.get(key) {
            Some(entry) => entry.snapshot(key),
            None => DocSnapshot::missing(key.clone()),
        }
    }

    async fn run_transaction<F>(&self, key: &DocKey, mut apply: F) -> TallyResult<DocSnapshot>
    where
        F: FnMut(&DocSnapshot) -> Value + Send,
    {
        for attempt in 1..=MAX_TRANSACTION_ATTEMPTS {
            let (read_version, read_snapshot) = {
                let docs = self.docs.lock();
                match docs.get(key) {
                    Some(entry) => (entry.version, entry.snapshot(key)),
                    None => (0, DocSnapshot::missing(key.clone())),
                }
            };

            let next = apply(&read_snapshot);

            // Scheduling point between read and commit, where a real
            // client would be waiting on the wire. Concurrent
            // transactions interleave here and collide on the version
            // check below.
            tokio::task::yield_now().await;

            let committed = {
                let mut docs = self.docs.lock();
                let entry = docs.entry(key.clone()).or_insert_with(DocEntry::new);
                if entry.version == read_version {
                    entry.commit(key, Some(next));
                    Some(entry.snapshot(key))
                } else {
                    None
                }
            };

            match committed {
                Some(snapshot) => return Ok(snapshot),
                None => {
                    debug!(key = %key, attempt, "transaction conflicted, retrying");
                }
            }
        }

        Err(TallyError::TransactionContention {
            attempts: MAX_TRANSACTION_ATTEMPTS,
        })
    }

    fn subscribe(&self, key: &DocKey) -> DocWatch {
        let mut docs = self.docs.lock();
        let entry = docs.entry(key.clone()).or_insert_with(DocEntry::new);
        // Snapshot and receiver are taken under the same lock, so no
        // commit can fall between the initial state and the feed.
        DocWatch::new(entry.snapshot(key), entry.changes.subscribe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use serde_json::json;

    use crate::types::CounterDoc;

    fn clicks() -> DocKey {
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

    #[tokio::test]
    async fn test_transaction_creates_missing_document() {
        let store = MemoryStore::new();
        let key = clicks();
        assert!(!store.snapshot(&key).exists());

        let committed = store
            .run_transaction(&key, |snap| json!({ "count": count_of(snap) + 1 }))
            .await
            .unwrap();

        assert_eq!(committed.key(), &key);
        assert_eq!(count_of(&committed), 1);
        assert_eq!(count_of(&store.snapshot(&key)), 1);
    }

    #[tokio::test]
    async fn test_concurrent_transactions_all_land() {
        let store = Arc::new(MemoryStore::new());
        let key = clicks();

        // A failed commit means some other task committed, so with no
        // more committers than retry attempts every task lands.
        let mut tasks = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            let key = key.clone();
            tasks.push(tokio::spawn(async move {
                store
                    .run_transaction(&key, |snap| json!({ "count": count_of(snap) + 1 }))
                    .await
                    .unwrap();
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(count_of(&store.snapshot(&key)), 8);
    }

    #[tokio::test]
    async fn test_subscribe_observes_later_creation() {
        let store = MemoryStore::new();
        let key = clicks();
        let mut watch = store.subscribe(&key);

        let initial = watch.changed().await.unwrap();
        assert!(!initial.exists());

        store.put(&key, json!({ "count": 5 }));
        let updated = watch.changed().await.unwrap();
        assert_eq!(count_of(&updated), 5);
    }

    #[tokio::test]
    async fn test_delete_notifies_with_missing_snapshot() {
        let store = MemoryStore::new();
        let key = clicks();
        store.put(&key, json!({ "count": 3 }));

        let mut watch = store.subscribe(&key);
        assert!(watch.changed().await.unwrap().exists());

        store.delete(&key);
        assert!(!watch.changed().await.unwrap().exists());
    }
}
