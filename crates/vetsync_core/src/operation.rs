//! Queued remote writes.

use crate::model::EntityId;
use crate::types::{EntityKind, OperationId, OperationKind, OperationStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vetsync_sync_protocol::{AppointmentRow, PetId, PetRow};

/// The remote row an operation inserts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OperationPayload {
    /// Insert into `pets`.
    CreatePet(PetRow),
    /// Insert into `appointment_requests`.
    CreateAppointment(AppointmentRow),
}

impl OperationPayload {
    /// Identifier of the entity the payload creates.
    #[must_use]
    pub fn entity_id(&self) -> EntityId {
        match self {
            OperationPayload::CreatePet(row) => EntityId::Pet(row.id),
            OperationPayload::CreateAppointment(row) => EntityId::AppointmentRequest(row.id),
        }
    }
}

/// A durable record of a local write that still has to reach the remote
/// service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingOperation {
    /// Operation id.
    pub id: OperationId,
    /// Remote write kind.
    pub operation_kind: OperationKind,
    /// Row to insert. Never discarded until the insert is confirmed.
    pub payload: OperationPayload,
    /// Queue status.
    pub status: OperationStatus,
    /// Number of rejected attempts since the last manual retry.
    pub attempt_count: u32,
    /// Message of the most recent rejection.
    pub last_error: Option<String>,
    /// Enqueue time; orders the queue.
    pub created_at: DateTime<Utc>,
    /// Last bookkeeping change.
    pub updated_at: DateTime<Utc>,
}

impl PendingOperation {
    /// Creates a fresh insert operation.
    pub fn insert(payload: OperationPayload, now: DateTime<Utc>) -> Self {
        Self {
            id: OperationId::generate(),
            operation_kind: OperationKind::Insert,
            payload,
            status: OperationStatus::Pending,
            attempt_count: 0,
            last_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Kind of the entity this operation creates.
    #[must_use]
    pub fn entity_kind(&self) -> EntityKind {
        self.entity_id().kind()
    }

    /// Identifier of the entity this operation creates.
    #[must_use]
    pub fn entity_id(&self) -> EntityId {
        self.payload.entity_id()
    }

    /// For appointment inserts, the pet the row references.
    #[must_use]
    pub fn referenced_pet(&self) -> Option<PetId> {
        match &self.payload {
            OperationPayload::CreateAppointment(row) => Some(row.pet_id),
            OperationPayload::CreatePet(_) => None,
        }
    }

    /// Returns true if the next sync run will attempt this operation.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == OperationStatus::Pending
    }

    /// Records a remote rejection.
    pub fn mark_failed(&mut self, message: impl Into<String>, now: DateTime<Utc>) {
        self.status = OperationStatus::Failed;
        self.attempt_count = self.attempt_count.saturating_add(1);
        self.last_error = Some(message.into());
        self.updated_at = now;
    }

    /// Returns a failed operation to the queue with clean bookkeeping.
    pub fn reset_for_retry(&mut self, now: DateTime<Utc>) {
        self.status = OperationStatus::Pending;
        self.attempt_count = 0;
        self.last_error = None;
        self.updated_at = now;
    }
}
