//! Document-store client contract
//!
//! The remote store is an opaque key-value document service reached
//! through a client the host constructs. Only the client-side contract
//! is modelled here:
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │  DocumentStore: what a client can do                           │
//! │  ├── snapshot: point-in-time read of one document              │
//! │  ├── run_transaction: atomic read-then-conditional-write       │
//! │  └── subscribe: current snapshot, then one per change          │
//! │                                                                │
//! │  ClientGate: how the host hands the client to a widget         │
//! │  └── Pending until the host provides; Ready afterwards         │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`memory::MemoryStore`] is the reference client used by the kiosk
//! and the test suite.

pub mod gate;
pub mod memory;

use std::future::Future;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::debug;

use crate::error::TallyResult;
use crate::types::DocKey;

/// Point-in-time state of one document
#[derive(Debug, Clone, PartialEq)]
pub struct DocSnapshot {
    key: DocKey,
    data: Option<Value>,
}

impl DocSnapshot {
    /// Snapshot of a document that holds `data` (or does not exist)
    pub fn new(key: DocKey, data: Option<Value>) -> Self {
        Self { key, data }
    }

    /// Snapshot of a document that does not exist
    pub fn missing(key: DocKey) -> Self {
        Self { key, data: None }
    }

    /// The document this snapshot was taken of
    pub fn key(&self) -> &DocKey {
        &self.key
    }

    /// Whether the document existed when the snapshot was taken
    pub fn exists(&self) -> bool {
        self.data.is_some()
    }

    /// The raw document payload, if the document existed
    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    /// Deserialize the payload into a typed document
    ///
    /// Returns `Ok(None)` for a missing document.
    ///
    /// # Errors
    ///
    /// Returns `TallyError::Serialization` if the payload exists but
    /// does not match the expected shape.
    pub fn parse<T: DeserializeOwned>(&self) -> TallyResult<Option<T>> {
        match &self.data {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }
}

/// A live subscription to one document
///
/// The first call to [`changed`](DocWatch::changed) yields the snapshot
/// taken at subscribe time, then every subsequent commit to the
/// document. A subscriber that falls behind the change stream skips the
/// overwritten entries and catches up with the newer ones; each
/// delivery carries the full document state, so the latest delivery
/// always wins.
pub struct DocWatch {
    initial: Option<DocSnapshot>,
    changes: broadcast::Receiver<DocSnapshot>,
}

impl DocWatch {
    /// Build a watch from the subscribe-time snapshot and a change feed
    pub fn new(initial: DocSnapshot, changes: broadcast::Receiver<DocSnapshot>) -> Self {
        Self {
            initial: Some(initial),
            changes,
        }
    }

    /// Next observed state of the document
    ///
    /// Returns `None` once the store side of the subscription is gone.
    pub async fn changed(&mut self) -> Option<DocSnapshot> {
        if let Some(initial) = self.initial.take() {
            return Some(initial);
        }
        loop {
            match self.changes.recv().await {
                Ok(snapshot) => return Some(snapshot),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "document subscription lagged, catching up");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// What a remote document-store client can do
///
/// The transaction method returns a named future rather than using
/// `async fn` so callers can require `Send` futures and hand the
/// increment off to a detached task.
pub trait DocumentStore: Send + Sync + 'static {
    /// Point-in-time read of the document at `key`
    fn snapshot(&self, key: &DocKey) -> DocSnapshot;

    /// Atomic read-then-conditional-write of one document
    ///
    /// `apply` receives the current snapshot and returns the full
    /// payload to write. The store commits only if the document was not
    /// concurrently modified between the read and the write; otherwise
    /// it re-reads and calls `apply` again. Returns the committed
    /// snapshot.
    ///
    /// # Errors
    ///
    /// Returns `TallyError::TransactionContention` when the commit kept
    /// colliding, or `TallyError::Store` for client-specific failures.
    fn run_transaction<F>(
        &self,
        key: &DocKey,
        apply: F,
    ) -> impl Future<Output = TallyResult<DocSnapshot>> + Send
    where
        F: FnMut(&DocSnapshot) -> Value + Send;

    /// Subscribe to the document at `key`
    ///
    /// Subscribing to a document that does not exist yet is valid; the
    /// watch observes its later creation.
    fn subscribe(&self, key: &DocKey) -> DocWatch;
}
