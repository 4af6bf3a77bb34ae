//! Error types for the sync engine.

use thiserror::Error;
use vetsync_core::ValidationError;
use vetsync_sync_protocol::RemoteError;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors surfaced to callers of the engine and the client facade.
///
/// Rejections and conflicts never show up here: conflicts count as success
/// and rejections are recorded on the operation itself.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The remote service could not be reached during a user-initiated run.
    #[error("sync aborted: {0}")]
    Network(RemoteError),

    /// Input to a create call was malformed.
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),
}

impl SyncError {
    /// Returns true if running the sync again later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SyncError::Network(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_errors() {
        assert!(SyncError::Network(RemoteError::network("offline")).is_retryable());
        assert!(!SyncError::Validation(ValidationError::EmptyUserId).is_retryable());
    }

    #[test]
    fn error_display() {
        let err = SyncError::Network(RemoteError::network("connection reset"));
        assert_eq!(err.to_string(), "sync aborted: network error: connection reset");

        let err = SyncError::from(ValidationError::EmptyField { field: "reason" });
        assert_eq!(err.to_string(), "invalid input: field `reason` must not be empty");
    }
}
