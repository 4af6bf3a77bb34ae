//! Error types for VetSync core.

use thiserror::Error;
use vetsync_storage::StorageError;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in core operations.
///
/// Storage only fails while opening a store; afterwards the store degrades
/// to memory instead of failing its callers.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Input to a create call was malformed.
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// The store could not be opened.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// A create call was rejected before touching the store or the queue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The user id was empty.
    #[error("user id must not be empty")]
    EmptyUserId,

    /// A required text field was empty or whitespace.
    #[error("field `{field}` must not be empty")]
    EmptyField {
        /// Name of the field.
        field: &'static str,
    },

    /// A text field exceeded its maximum length.
    #[error("field `{field}` is longer than {max} characters")]
    TooLong {
        /// Name of the field.
        field: &'static str,
        /// Maximum allowed length in characters.
        max: usize,
    },
}
