//! In-memory storage backend.

use crate::backend::StorageBackend;
use crate::error::StorageResult;
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// An in-memory storage backend.
///
/// This backend stores all records in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - The session-scoped fallback used when persistent storage fails
///
/// # Example
///
/// ```rust
/// use vetsync_storage::{StorageBackend, InMemoryBackend};
///
/// let mut backend = InMemoryBackend::new();
/// backend.write("a", b"1").unwrap();
/// assert_eq!(backend.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    records: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl InMemoryBackend {
    /// Creates a new empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new in-memory backend with pre-existing records.
    ///
    /// Useful for testing recovery scenarios.
    #[must_use]
    pub fn with_records(records: impl IntoIterator<Item = (String, Vec<u8>)>) -> Self {
        Self {
            records: RwLock::new(records.into_iter().collect()),
        }
    }

    /// Returns the number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Returns true if no records are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Clears all records from the backend.
    pub fn clear(&mut self) {
        self.records.write().clear();
    }
}

impl StorageBackend for InMemoryBackend {
    fn read(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.records.read().get(key).cloned())
    }

    fn write(&mut self, key: &str, data: &[u8]) -> StorageResult<()> {
        self.records.write().insert(key.to_string(), data.to_vec());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StorageResult<()> {
        self.records.write().remove(key);
        Ok(())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        Ok(self.records.read().keys().cloned().collect())
    }

    fn sync(&mut self) -> StorageResult<()> {
        // Nothing to make durable
        Ok(())
    }
}
