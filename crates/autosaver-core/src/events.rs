//! Change notifications for control surfaces.
//!
//! A panel subscribes when it attaches and drops its receiver when it
//! detaches:
//!
//! ```ignore
//! let mut rx = autosaver.subscribe();
//! tokio::spawn(async move {
//!     while let Ok(event) = rx.recv().await {
//!         if let AutosaveEvent::ConfigChanged(config) = event {
//!             redraw(&config);
//!         }
//!     }
//! });
//! ```

use crate::AutosaveConfig;
use autosaver_snapshot::{Snapshot, SnapshotKind};
use std::path::PathBuf;
use tokio::sync::broadcast;
use tracing::trace;

/// Default channel capacity.
const DEFAULT_CAPACITY: usize = 64;

/// Something a control surface may want to redraw for.
#[derive(Debug, Clone)]
pub enum AutosaveEvent {
    /// A setting changed (or was toggled).
    ConfigChanged(AutosaveConfig),
    SnapshotWritten(Snapshot),
    SnapshotFailed { kind: SnapshotKind, message: String },
    /// Old snapshots were deleted by a retention pass.
    Pruned { deleted: Vec<PathBuf>, failures: usize },
}

/// Broadcasts [`AutosaveEvent`]s to any number of subscribers.
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<AutosaveEvent>,
}

impl EventPublisher {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Slow subscribers lag (and skip events) once `capacity` are queued.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Register a listener. Dropping the receiver unregisters it.
    pub fn subscribe(&self) -> broadcast::Receiver<AutosaveEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Publish to current subscribers. Returns how many received it.
    pub fn publish(&self, event: AutosaveEvent) -> usize {
        match self.sender.send(event) {
            Ok(count) => count,
            Err(_) => {
                trace!("No autosave event subscribers");
                0
            }
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_subscribe() {
        let events = EventPublisher::new();
        let mut rx = events.subscribe();

        let delivered = events.publish(AutosaveEvent::ConfigChanged(AutosaveConfig::default()));
        assert_eq!(delivered, 1);

        match rx.recv().await.unwrap() {
            AutosaveEvent::ConfigChanged(config) => assert_eq!(config.max_snapshots, 10),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_publish_without_subscribers() {
        let events = EventPublisher::new();
        assert_eq!(
            events.publish(AutosaveEvent::Pruned {
                deleted: vec![],
                failures: 0
            }),
            0
        );
    }

    #[tokio::test]
    async fn test_detach_unregisters() {
        let events = EventPublisher::new();
        let rx1 = events.subscribe();
        let _rx2 = events.subscribe();
        assert_eq!(events.subscriber_count(), 2);

        drop(rx1);
        assert_eq!(events.subscriber_count(), 1);
    }
}
