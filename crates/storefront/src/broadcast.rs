//! Fan-out of product list snapshots to live observers.
//!
//! Every connected real-time client holds an [`Observer`]. The catalog
//! publishes a full snapshot after each successful mutation and every
//! observer receives it, whichever client (or HTTP request) caused it.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use catalog_core::Product;
use tokio::sync::broadcast;

/// The full product list at one point in time.
pub type Snapshot = Arc<[Product]>;

/// Number of snapshots buffered per observer before it starts lagging.
const CHANNEL_CAPACITY: usize = 64;

/// Publishes product list snapshots to every connected observer.
///
/// Cheap to clone; all clones share the same observer set.
#[derive(Clone)]
pub struct ChangeBroadcaster {
    tx: broadcast::Sender<Snapshot>,
    observers: Arc<AtomicUsize>,
    next_observer_id: Arc<AtomicU64>,
}

impl Default for ChangeBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeBroadcaster {
    /// Create a broadcaster with no observers.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            tx,
            observers: Arc::new(AtomicUsize::new(0)),
            next_observer_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Register a new observer.
    ///
    /// The observer only receives snapshots published after this call, so
    /// callers should subscribe first and then send the current state.
    #[must_use]
    pub fn subscribe(&self) -> Observer {
        let id = self.next_observer_id.fetch_add(1, Ordering::Relaxed);
        let connected = self.observers.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::info!(observer_id = id, connected, "Observer connected");

        Observer {
            id,
            rx: self.tx.subscribe(),
            observers: Arc::clone(&self.observers),
        }
    }

    /// Send `snapshot` to every observer. Returns how many received it.
    pub fn publish(&self, snapshot: Snapshot) -> usize {
        let products = snapshot.len();
        // An error only means nobody is listening.
        let delivered = self.tx.send(snapshot).unwrap_or(0);
        tracing::debug!(products, delivered, "Product list broadcast");
        delivered
    }

    /// Number of currently connected observers.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.observers.load(Ordering::Relaxed)
    }
}

/// A live subscription to product list snapshots.
///
/// Dropping the observer removes it from the broadcaster.
pub struct Observer {
    id: u64,
    rx: broadcast::Receiver<Snapshot>,
    observers: Arc<AtomicUsize>,
}

impl Observer {
    /// Identifier used in logs.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Wait for the next snapshot.
    ///
    /// Snapshots skipped because this observer fell behind are not replayed;
    /// the next one delivered is a complete state anyway. Returns `None` once
    /// the broadcaster is gone.
    pub async fn recv(&mut self) -> Option<Snapshot> {
        loop {
            match self.rx.recv().await {
                Ok(snapshot) => return Some(snapshot),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(observer_id = self.id, skipped, "Observer lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

impl Drop for Observer {
    fn drop(&mut self) {
        let remaining = self.observers.fetch_sub(1, Ordering::Relaxed) - 1;
        tracing::info!(observer_id = self.id, connected = remaining, "Observer disconnected");
    }
}
