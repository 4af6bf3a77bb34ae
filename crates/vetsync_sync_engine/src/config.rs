//! Configuration for the sync engine.

use std::time::Duration;

/// Configuration for sync runs and reconnect handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// How long the connection must stay online after an offline period
    /// before a reconnect sync starts.
    pub reconnect_debounce: Duration,
    /// Whether a completed push pass is followed by a full pull of the
    /// user's remote rows.
    pub reconcile_after_push: bool,
}

impl SyncConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the reconnect debounce window.
    pub fn with_reconnect_debounce(mut self, debounce: Duration) -> Self {
        self.reconnect_debounce = debounce;
        self
    }

    /// Enables or disables the reconciliation pull.
    pub fn with_reconcile_after_push(mut self, enabled: bool) -> Self {
        self.reconcile_after_push = enabled;
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            reconnect_debounce: Duration::from_millis(500),
            reconcile_after_push: true,
        }
    }
}
