//! Connectivity signal and debounced reconnect notifications.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::debug;

/// Point-in-time connectivity, fed by the platform adapter.
///
/// Clones share the same signal: a platform adapter can hold one handle and
/// call [`set_online`](Self::set_online) while the engine holds another.
#[derive(Debug, Clone)]
pub struct NetworkMonitor {
    tx: Arc<watch::Sender<bool>>,
}

impl NetworkMonitor {
    /// Creates a monitor with the given initial state.
    pub fn new(online: bool) -> Self {
        let (tx, _rx) = watch::channel(online);
        Self { tx: Arc::new(tx) }
    }

    /// Returns the current connectivity.
    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    /// Records a connectivity change. Repeating the current state is a no-op.
    pub fn set_online(&self, online: bool) {
        let changed = self.tx.send_if_modified(|current| {
            if *current == online {
                return false;
            }
            *current = online;
            true
        });
        if changed {
            debug!(online, "connectivity changed");
        }
    }

    /// Subscribes to offline → online transitions.
    ///
    /// The connection must stay online for `debounce` before a transition is
    /// reported.
    pub fn subscribe(&self, debounce: Duration) -> ReconnectSubscription {
        let mut rx = self.tx.subscribe();
        let was_online = *rx.borrow_and_update();
        ReconnectSubscription {
            rx,
            debounce,
            was_online,
        }
    }
}

impl Default for NetworkMonitor {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Debounced reconnect notifications from a [`NetworkMonitor`].
#[derive(Debug)]
pub struct ReconnectSubscription {
    rx: watch::Receiver<bool>,
    debounce: Duration,
    was_online: bool,
}

impl ReconnectSubscription {
    /// Waits for the next offline → online transition.
    ///
    /// Resolves once per transition, after the connection stayed online for
    /// the debounce window; flapping inside the window collapses into one
    /// notification. Returns `false` once every monitor handle is dropped.
    pub async fn reconnected(&mut self) -> bool {
        loop {
            if self.rx.changed().await.is_err() {
                return false;
            }
            let online = *self.rx.borrow_and_update();
            if !online {
                self.was_online = false;
                continue;
            }
            if self.was_online {
                continue;
            }

            tokio::time::sleep(self.debounce).await;
            if *self.rx.borrow_and_update() {
                self.was_online = true;
                return true;
            }
            self.was_online = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    const DEBOUNCE: Duration = Duration::from_millis(30);

    #[test]
    fn set_online_is_point_in_time() {
        let monitor = NetworkMonitor::new(false);
        assert!(!monitor.is_online());
        monitor.set_online(true);
        assert!(monitor.is_online());

        let handle = monitor.clone();
        handle.set_online(false);
        assert!(!monitor.is_online());
    }

    #[tokio::test]
    async fn reconnect_fires_after_debounce() {
        let monitor = NetworkMonitor::new(false);
        let mut reconnects = monitor.subscribe(DEBOUNCE);

        monitor.set_online(true);
        let fired = timeout(Duration::from_secs(2), reconnects.reconnected()).await;
        assert_eq!(fired, Ok(true));
    }

    #[tokio::test]
    async fn flapping_collapses_into_one_notification() {
        let monitor = NetworkMonitor::new(false);
        let mut reconnects = monitor.subscribe(DEBOUNCE);

        for _ in 0..5 {
            monitor.set_online(true);
            monitor.set_online(false);
        }
        monitor.set_online(true);

        let first = timeout(Duration::from_secs(2), reconnects.reconnected()).await;
        assert_eq!(first, Ok(true));

        let second = timeout(DEBOUNCE * 4, reconnects.reconnected()).await;
        assert!(second.is_err(), "no second notification without a new transition");
    }

    #[tokio::test]
    async fn brief_reconnect_is_ignored() {
        let monitor = NetworkMonitor::new(false);
        let mut reconnects = monitor.subscribe(Duration::from_millis(200));

        let waiter = tokio::spawn(async move { reconnects.reconnected().await });
        monitor.set_online(true);
        tokio::time::sleep(Duration::from_millis(20)).await;
        monitor.set_online(false);

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(!waiter.is_finished());
        waiter.abort();
    }

    #[tokio::test]
    async fn already_online_needs_a_transition() {
        let monitor = NetworkMonitor::new(true);
        let mut reconnects = monitor.subscribe(DEBOUNCE);

        let early = timeout(DEBOUNCE * 4, reconnects.reconnected()).await;
        assert!(early.is_err());

        monitor.set_online(false);
        monitor.set_online(true);
        let fired = timeout(Duration::from_secs(2), reconnects.reconnected()).await;
        assert_eq!(fired, Ok(true));
    }

    #[tokio::test]
    async fn dropping_the_monitor_ends_the_subscription() {
        let monitor = NetworkMonitor::new(false);
        let mut reconnects = monitor.subscribe(DEBOUNCE);
        drop(monitor);
        assert!(!reconnects.reconnected().await);
    }
}
