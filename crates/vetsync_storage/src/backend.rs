//! Storage backend trait definition.

use crate::error::StorageResult;

/// A low-level keyed storage backend.
///
/// Backends are **opaque record stores**. Each key maps to one byte blob,
/// and a write replaces the blob as a whole. The durable store owns the
/// record encoding; backends never interpret the bytes.
///
/// # Invariants
///
/// - `read` returns exactly the bytes of the last successful `write` for a key
/// - `write` is all-or-nothing: a failed write leaves the previous record intact
/// - `keys` lists every key with a record, in ascending order
/// - Backends must be `Send + Sync` for shared access
///
/// # Implementors
///
/// - [`super::InMemoryBackend`] - For testing and fallback
/// - [`super::FileBackend`] - For persistent storage
/// - [`super::FaultInjectingBackend`] - For failure tests
pub trait StorageBackend: Send + Sync {
    /// Reads the record stored under `key`.
    ///
    /// Returns `None` if no record exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn read(&self, key: &str) -> StorageResult<Option<Vec<u8>>>;

    /// Stores `data` under `key`, replacing any previous record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be written.
    fn write(&mut self, key: &str, data: &[u8]) -> StorageResult<()>;

    /// Removes the record stored under `key`.
    ///
    /// Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the record exists but cannot be removed.
    fn remove(&mut self, key: &str) -> StorageResult<()>;

    /// Lists all keys that currently hold a record.
    ///
    /// # Errors
    ///
    /// Returns an error if the key set cannot be enumerated.
    fn keys(&self) -> StorageResult<Vec<String>>;

    /// Syncs all data and metadata to durable storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync operation fails.
    fn sync(&mut self) -> StorageResult<()>;
}
