//! Retry command implementation.

use super::open_existing;
use std::path::Path;
use tracing::info;
use vetsync_sync_protocol::UserId;

/// Runs the retry command.
///
/// Failed operations go back to `pending`; the next sync on the device
/// pushes them.
pub fn run(path: &Path, user: &UserId) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_existing(path)?;
    let reset = store.queue().mark_all_for_retry(user);
    info!(user = %user, reset, "marked failed operations for retry");
    println!("{reset} operation(s) marked for retry");
    Ok(())
}
