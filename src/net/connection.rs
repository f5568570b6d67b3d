//! Open-connection accounting for graceful drain.
//!
//! Every accepted connection holds a [`ConnectionGuard`]. The stopping server
//! waits on [`ConnectionTracker::wait_for_drain`], which resolves when the
//! last guard is dropped.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;

/// Per-listener connection sequence number, used in trace events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

#[derive(Debug)]
struct Shared {
    open: watch::Sender<usize>,
    next_id: AtomicU64,
}

#[derive(Debug, Clone)]
pub struct ConnectionTracker {
    shared: Arc<Shared>,
}

impl Default for ConnectionTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                open: watch::Sender::new(0),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    pub fn track(&self) -> ConnectionGuard {
        self.shared.open.send_modify(|open| *open += 1);
        ConnectionGuard {
            id: ConnectionId(self.shared.next_id.fetch_add(1, Ordering::Relaxed)),
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn active_count(&self) -> usize {
        *self.shared.open.borrow()
    }

    /// Resolves once no guard is alive.
    pub async fn wait_for_drain(&self) {
        let mut open = self.shared.open.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = open.wait_for(|open| *open == 0).await;
    }
}

/// Held by a connection task for as long as the connection is open.
#[derive(Debug)]
pub struct ConnectionGuard {
    id: ConnectionId,
    shared: Arc<Shared>,
}

impl ConnectionGuard {
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.shared.open.send_modify(|open| *open -= 1);
        tracing::trace!(connection_id = %self.id, "Connection closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn ids_are_sequential_per_tracker() {
        let tracker = ConnectionTracker::new();
        let first = tracker.track();
        let second = tracker.track();

        assert_eq!(first.id().to_string(), "conn-1");
        assert_eq!(second.id().to_string(), "conn-2");
    }

    #[test]
    fn guards_adjust_open_count() {
        let tracker = ConnectionTracker::new();
        let a = tracker.track();
        let b = tracker.track();
        assert_eq!(tracker.active_count(), 2);

        drop(a);
        assert_eq!(tracker.active_count(), 1);
        drop(b);
        assert_eq!(tracker.active_count(), 0);
    }

    #[tokio::test]
    async fn drain_is_immediate_when_idle() {
        let tracker = ConnectionTracker::new();
        tokio::time::timeout(Duration::from_millis(100), tracker.wait_for_drain())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn drain_waits_for_last_guard() {
        let tracker = ConnectionTracker::new();
        let guard = tracker.track();

        let waiter = {
            let tracker = tracker.clone();
            tokio::spawn(async move { tracker.wait_for_drain().await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }
}
