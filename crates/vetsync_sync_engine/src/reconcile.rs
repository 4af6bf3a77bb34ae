//! Reconciliation pull: merge the user's remote rows into local state.

use crate::port::RemoteDataPort;
use std::collections::HashSet;
use vetsync_core::{
    AppointmentRequest, DurableStore, EntityId, LocalEntity, Pet, SyncState, UserScope,
};
use vetsync_sync_protocol::{AppointmentRow, PetRow, RemoteResult, SelectQuery, UserId};

/// Selects both collections for `user` and merges them into the store.
///
/// Nothing is merged unless both selects succeed. Returns the number of
/// remote rows read.
pub(crate) fn pull<P: RemoteDataPort + ?Sized>(
    port: &P,
    store: &DurableStore,
    user: &UserId,
) -> RemoteResult<usize> {
    let query = SelectQuery::for_user(user.clone());
    let pets = port.select_pets(&query)?;
    let appointments = port.select_appointments(&query)?;
    let pulled = pets.len() + appointments.len();

    store.mutate(user, |scope| merge(scope, pets, appointments));
    Ok(pulled)
}

/// Merges remote rows into a scope.
///
/// - remote rows replace local ones and are marked synced
/// - an entity that still has a queued operation keeps its local version
/// - local rows missing remotely are kept; a pull never deletes
pub(crate) fn merge(scope: &mut UserScope, pets: Vec<PetRow>, appointments: Vec<AppointmentRow>) {
    let queued: HashSet<EntityId> = scope.operations.iter().map(|op| op.entity_id()).collect();

    let local_pets = std::mem::take(&mut scope.pets);
    scope.pets = merge_rows(
        local_pets,
        pets.into_iter().map(|row| Pet::from_row(row, SyncState::Synced)),
        &queued,
    );

    let local_appointments = std::mem::take(&mut scope.appointments);
    scope.appointments = merge_rows(
        local_appointments,
        appointments
            .into_iter()
            .map(|row| AppointmentRequest::from_row(row, SyncState::Synced)),
        &queued,
    );
}

fn merge_rows<E: LocalEntity>(
    local: Vec<E>,
    remote: impl Iterator<Item = E>,
    queued: &HashSet<EntityId>,
) -> Vec<E> {
    let mut merged: Vec<E> = Vec::new();
    let mut seen = HashSet::new();

    for row in remote {
        let id = row.entity_id();
        if !seen.insert(id) {
            continue;
        }
        let kept = if queued.contains(&id) {
            local.iter().find(|l| l.entity_id() == id).cloned()
        } else {
            None
        };
        merged.push(kept.unwrap_or(row));
    }

    merged.extend(local.into_iter().filter(|row| !seen.contains(&row.entity_id())));

    merged.sort_by_key(|row| row.created_at());
    merged
}
