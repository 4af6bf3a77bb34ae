//! Reset command implementation.

use super::open_existing;
use std::path::Path;
use tracing::info;
use vetsync_sync_protocol::UserId;

/// Runs the reset command.
pub fn run(path: &Path, user: &UserId) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_existing(path)?;
    let queued = store.queue().len(user);
    store.reset(user);
    info!(user = %user, dropped_operations = queued, "reset local state");
    println!("Local state for {user} removed ({queued} queued operation(s) dropped)");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::data_dir;
    use vetsync_core::DurableStore;

    #[test]
    fn reset_removes_user() {
        let (dir, user) = data_dir();

        run(dir.path(), &user).unwrap();

        let store = DurableStore::open(dir.path()).unwrap();
        assert!(store.users().is_empty());
        assert_eq!(store.queue().len(&user), 0);
    }
}
