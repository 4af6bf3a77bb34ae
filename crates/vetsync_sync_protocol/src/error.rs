//! Remote error classification.

use std::fmt;
use thiserror::Error;

/// Result type for remote data service calls.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Backend code for a unique-constraint violation (PostgreSQL `23505`).
pub const UNIQUE_VIOLATION: &str = "23505";

/// What kind of failure a remote call hit.
///
/// The engine's retry and conflict policy is keyed on this kind only, never
/// on backend-specific codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteErrorKind {
    /// A row with this primary key already exists. For client-generated ids
    /// this means an earlier attempt already succeeded.
    Conflict,
    /// The request never reached the service, or the reply was lost.
    Network,
    /// The service refused the write (validation, permission, constraint).
    Rejected,
}

impl fmt::Display for RemoteErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RemoteErrorKind::Conflict => "conflict",
            RemoteErrorKind::Network => "network",
            RemoteErrorKind::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

/// An error returned by the remote data service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} error: {message}")]
pub struct RemoteError {
    /// Classified kind.
    pub kind: RemoteErrorKind,
    /// Backend error code, when the service sent one.
    pub code: Option<String>,
    /// Human-readable message.
    pub message: String,
}

impl RemoteError {
    /// Creates an error of the given kind without a backend code.
    pub fn new(kind: RemoteErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: None,
            message: message.into(),
        }
    }

    /// Classifies a backend error code.
    ///
    /// A unique violation is a [`RemoteErrorKind::Conflict`]; every other
    /// code the service answers with is a [`RemoteErrorKind::Rejected`].
    pub fn from_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        let code = code.into();
        let kind = if code == UNIQUE_VIOLATION {
            RemoteErrorKind::Conflict
        } else {
            RemoteErrorKind::Rejected
        };
        Self {
            kind,
            code: Some(code),
            message: message.into(),
        }
    }

    /// Creates a duplicate-key conflict.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::from_code(UNIQUE_VIOLATION, message)
    }

    /// Creates a transient network failure.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Network, message)
    }

    /// Creates a rejection without a backend code.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Rejected, message)
    }

    /// Returns true for duplicate-key conflicts.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        self.kind == RemoteErrorKind::Conflict
    }

    /// Returns true for transient network failures.
    #[must_use]
    pub fn is_network(&self) -> bool {
        self.kind == RemoteErrorKind::Network
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_violation_is_conflict() {
        let err = RemoteError::from_code("23505", "duplicate key value violates unique constraint");
        assert!(err.is_conflict());
        assert_eq!(err.code.as_deref(), Some("23505"));
    }

    #[test]
    fn other_codes_are_rejections() {
        let err = RemoteError::from_code("42501", "permission denied");
        assert_eq!(err.kind, RemoteErrorKind::Rejected);
        assert!(!err.is_conflict());
    }

    #[test]
    fn display_includes_kind() {
        let err = RemoteError::network("connection reset");
        assert_eq!(err.to_string(), "network error: connection reset");
        assert!(err.is_network());
    }
}
