//! CLI command implementations.

pub mod queue;
pub mod reset;
pub mod retry;
pub mod snapshot;
pub mod users;

use std::path::Path;
use vetsync_core::DurableStore;

/// Opens the store in an existing data directory.
///
/// Unlike [`DurableStore::open`], a missing directory is an error rather
/// than created.
pub fn open_existing(path: &Path) -> Result<DurableStore, Box<dyn std::error::Error>> {
    if !path.is_dir() {
        return Err(format!("No data directory found at {:?}", path).into());
    }
    Ok(DurableStore::open(path)?)
}

/// Formats an optional text field for text output.
pub(crate) fn or_dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

#[cfg(test)]
pub(crate) mod test_support {
    use tempfile::TempDir;
    use vetsync_core::{DurableStore, OperationPayload, PendingOperation, Pet, PetFields};
    use vetsync_sync_protocol::UserId;

    /// A data directory holding one queued pet for `user-1`.
    pub fn data_dir() -> (TempDir, UserId) {
        let dir = TempDir::new().unwrap();
        let user = UserId::from("user-1");
        let store = DurableStore::open(dir.path()).unwrap();
        let pet = Pet::create(&user, PetFields::new("Thor", "dog"), chrono::Utc::now());
        let op =
            PendingOperation::insert(OperationPayload::CreatePet(pet.to_row()), pet.created_at);
        store.queue().record_creation(&user, pet, op);
        drop(store);
        (dir, user)
    }
}
