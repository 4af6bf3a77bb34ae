//! Per-user local state.

use crate::model::{AppointmentRequest, EntityId, LocalEntity, Pet};
use crate::operation::PendingOperation;
use crate::types::{OperationStatus, SyncState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vetsync_sync_protocol::PetId;

/// Everything stored for one user: entities, operation queue and cursor.
///
/// This is the unit the durable store reads and writes; every mutation of a
/// scope happens inside [`DurableStore::mutate`](crate::DurableStore::mutate).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserScope {
    /// Pets in insertion order.
    pub pets: Vec<Pet>,
    /// Appointment requests in insertion order.
    pub appointments: Vec<AppointmentRequest>,
    /// Queued operations in insertion order.
    pub operations: Vec<PendingOperation>,
    /// Time of the last sync that made progress.
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl UserScope {
    /// Returns true if the scope holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pets.is_empty()
            && self.appointments.is_empty()
            && self.operations.is_empty()
            && self.last_synced_at.is_none()
    }

    /// Inserts an entity or replaces the one with the same id.
    pub fn upsert<E: LocalEntity>(&mut self, entity: E) {
        let rows = E::rows_mut(self);
        let id = entity.entity_id();
        match rows.iter_mut().find(|row| row.entity_id() == id) {
            Some(existing) => *existing = entity,
            None => rows.push(entity),
        }
    }

    /// Finds a pet by id.
    #[must_use]
    pub fn pet(&self, id: PetId) -> Option<&Pet> {
        self.pets.iter().find(|pet| pet.id == id)
    }

    /// Moves an entity to `next` if that is a valid transition.
    ///
    /// Returns false if the entity is missing or the transition is invalid.
    pub fn transition(&mut self, id: EntityId, next: SyncState) -> bool {
        match id {
            EntityId::Pet(_) => transition_in(&mut self.pets, id, next),
            EntityId::AppointmentRequest(_) => transition_in(&mut self.appointments, id, next),
        }
    }

    /// Sync state of an entity, if present.
    #[must_use]
    pub fn sync_state_of(&self, id: EntityId) -> Option<SyncState> {
        match id {
            EntityId::Pet(_) => state_in(&self.pets, id),
            EntityId::AppointmentRequest(_) => state_in(&self.appointments, id),
        }
    }

    /// Returns true if any queued operation references `id`.
    #[must_use]
    pub fn has_operation_for(&self, id: EntityId) -> bool {
        self.operations.iter().any(|op| op.entity_id() == id)
    }

    /// Counts queued operations with the given status.
    #[must_use]
    pub fn count_operations(&self, status: OperationStatus) -> usize {
        self.operations.iter().filter(|op| op.status == status).count()
    }
}

fn transition_in<E: LocalEntity>(rows: &mut [E], id: EntityId, next: SyncState) -> bool {
    match rows.iter_mut().find(|row| row.entity_id() == id) {
        Some(row) if row.sync_state().can_transition_to(next) => {
            row.set_sync_state(next);
            true
        }
        _ => false,
    }
}

fn state_in<E: LocalEntity>(rows: &[E], id: EntityId) -> Option<SyncState> {
    rows.iter()
        .find(|row| row.entity_id() == id)
        .map(LocalEntity::sync_state)
}
