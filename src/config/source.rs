//! Publish/subscribe channel for configuration snapshots.
//!
//! # Data Flow
//! ```text
//! loader / watcher / tests
//!     → ConfigSource::publish(Config)
//!     → watch channel (latest snapshot wins)
//!     → one receiver per subscription
//! ```
//!
//! # Design Decisions
//! - `None` until the first snapshot; readers wait for it indefinitely
//! - Slow subscribers observe the latest snapshot, not every intermediate one
//! - Dropping every `ConfigSource` handle closes the stream

use std::sync::Arc;

use tokio::sync::watch;

use crate::config::error::ConfigError;
use crate::config::snapshot::Config;
use crate::observability::metrics::SNAPSHOTS_PUBLISHED;

/// Receiver side of the snapshot stream.
pub type SnapshotReceiver = watch::Receiver<Option<Arc<Config>>>;

/// Publisher of configuration snapshots.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    tx: Arc<watch::Sender<Option<Arc<Config>>>>,
}

impl ConfigSource {
    /// Create a source with no snapshot yet.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Create a source that already holds `config`.
    pub fn with_initial(config: Config) -> Self {
        let (tx, _) = watch::channel(Some(Arc::new(config)));
        Self { tx: Arc::new(tx) }
    }

    /// Publish a new snapshot to every subscriber.
    pub fn publish(&self, config: Config) {
        self.tx.send_replace(Some(Arc::new(config)));
        metrics::counter!(SNAPSHOTS_PUBLISHED).increment(1);
        tracing::debug!(subscribers = self.tx.receiver_count(), "Published config snapshot");
    }

    /// Subscribe to the snapshot stream.
    pub fn subscribe(&self) -> SnapshotReceiver {
        self.tx.subscribe()
    }
}

impl Default for ConfigSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait until the receiver holds a snapshot and return it.
pub(crate) async fn first_snapshot(rx: &mut SnapshotReceiver) -> Result<Arc<Config>, ConfigError> {
    let guard = rx
        .wait_for(|snapshot| snapshot.is_some())
        .await
        .map_err(|_| ConfigError::SourceClosed)?;
    guard.clone().ok_or(ConfigError::SourceClosed)
}

/// Live stream of whole snapshots, unfiltered.
#[derive(Debug)]
pub struct SnapshotSubscription {
    rx: SnapshotReceiver,
    primed: bool,
}

impl SnapshotSubscription {
    pub(crate) fn new(rx: SnapshotReceiver) -> Self {
        Self { rx, primed: false }
    }

    /// Next snapshot, or `None` once the source is closed.
    ///
    /// The first call yields the current snapshot (waiting for one if needed).
    pub async fn next(&mut self) -> Option<Arc<Config>> {
        if !self.primed {
            let first = first_snapshot(&mut self.rx).await.ok();
            self.primed = true;
            return first;
        }
        loop {
            self.rx.changed().await.ok()?;
            if let Some(snapshot) = self.rx.borrow_and_update().clone() {
                return Some(snapshot);
            }
        }
    }
}
