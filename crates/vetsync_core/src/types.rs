//! Core type definitions for VetSync.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Whether an entity's creation has been confirmed by the remote service.
///
/// Valid transitions, per creation attempt:
///
/// ```text
/// pending --success|conflict--> synced
/// pending --rejection---------> failed
/// failed  --manual retry------> pending
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    /// Written locally, waiting to be sent.
    Pending,
    /// Confirmed by the remote service.
    Synced,
    /// Rejected by the remote service; waits for a manual retry.
    Failed,
}

impl SyncState {
    /// Returns true if moving from `self` to `next` is a valid transition.
    #[must_use]
    pub fn can_transition_to(self, next: SyncState) -> bool {
        matches!(
            (self, next),
            (SyncState::Pending, SyncState::Synced)
                | (SyncState::Pending, SyncState::Failed)
                | (SyncState::Failed, SyncState::Pending)
        )
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SyncState::Pending => "pending",
            SyncState::Synced => "synced",
            SyncState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// The two entity kinds handled by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A pet record.
    Pet,
    /// An appointment request.
    AppointmentRequest,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntityKind::Pet => "pet",
            EntityKind::AppointmentRequest => "appointment_request",
        };
        f.write_str(s)
    }
}

/// Unique identifier of a queued operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationId(pub Uuid);

impl OperationId {
    /// Generates a fresh random operation id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op:{}", self.0)
    }
}

/// The write a queued operation performs remotely.
///
/// Only inserts exist today: the engine never updates or deletes remotely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// Insert a new row keyed by the client-generated id.
    Insert,
}

/// Queue status of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    /// Will be attempted by the next sync run.
    Pending,
    /// Rejected remotely; skipped until marked for retry.
    Failed,
}
