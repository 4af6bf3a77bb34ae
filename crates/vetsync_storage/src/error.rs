//! Error types for storage operations.

use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A stored record could not be interpreted.
    #[error("storage corrupted: {0}")]
    Corrupted(String),

    /// Another process holds the data directory.
    #[error("storage locked: {path} is in use by another process")]
    Locked {
        /// The directory that could not be locked.
        path: String,
    },

    /// The backend refused the operation (quota exceeded, disabled, private mode).
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}
