//! Client readiness gate
//!
//! The store client is often constructed after the widgets that need
//! it. Instead of widgets polling an ambient global for the client to
//! appear, the host creates a gate pair up front: widgets hold the
//! [`ClientGate`] and await [`ready`](ClientGate::ready); the host
//! resolves the wait exactly once by calling
//! [`provide`](GateSetter::provide) when its client is up.

use std::sync::Arc;

use tokio::sync::watch;

use super::DocumentStore;

/// Capability state of a client gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// The host has provided a client
    Ready,
    /// No client yet; `ready()` would suspend
    Pending,
}

/// Host-side half of the gate; resolves the widgets' readiness wait
pub struct GateSetter<S> {
    tx: watch::Sender<Option<Arc<S>>>,
}

impl<S: DocumentStore> GateSetter<S> {
    /// Hand the constructed client to every waiting gate
    ///
    /// Consumes the setter: a gate resolves at most once.
    pub fn provide(self, store: Arc<S>) {
        // Succeeds even if every widget already went away.
        let _ = self.tx.send(Some(store));
    }
}

/// Widget-side half of the gate
///
/// Cheap to clone; every widget sharing one host client holds a clone
/// of the same gate.
pub struct ClientGate<S> {
    rx: watch::Receiver<Option<Arc<S>>>,
}

impl<S> Clone for ClientGate<S> {
    fn clone(&self) -> Self {
        Self {
            rx: self.rx.clone(),
        }
    }
}

impl<S: DocumentStore> ClientGate<S> {
    /// Create a pending gate and the setter that will resolve it
    pub fn channel() -> (GateSetter<S>, ClientGate<S>) {
        let (tx, rx) = watch::channel(None);
        (GateSetter { tx }, ClientGate { rx })
    }

    /// Create a gate that is ready from the start
    pub fn immediate(store: Arc<S>) -> ClientGate<S> {
        let (_, rx) = watch::channel(Some(store));
        ClientGate { rx }
    }

    /// Check readiness without suspending
    pub fn poll_ready(&self) -> Readiness {
        if self.rx.borrow().is_some() {
            Readiness::Ready
        } else {
            Readiness::Pending
        }
    }

    /// The client, if the host already provided one
    pub fn client(&self) -> Option<Arc<S>> {
        self.rx.borrow().clone()
    }

    /// Wait until the host provides the client
    ///
    /// Returns `None` if the setter was dropped without ever providing
    /// one; the gate can then never become ready.
    pub async fn ready(&mut self) -> Option<Arc<S>> {
        match self.rx.wait_for(|slot| slot.is_some()).await {
            Ok(slot) => slot.clone(),
            Err(_) => None,
        }
    }
}
