//! Push ordering for one sync run.

use std::collections::{HashMap, HashSet};
use vetsync_core::{OperationPayload, PendingOperation};
use vetsync_sync_protocol::PetId;

/// Orders a run's pending operations for pushing.
///
/// Input is oldest first. Output keeps that order, except that a queued pet
/// insert is moved in front of the first appointment that references it.
pub(crate) fn push_order(pending: Vec<PendingOperation>) -> Vec<PendingOperation> {
    let pet_index: HashMap<PetId, usize> = pending
        .iter()
        .enumerate()
        .filter_map(|(i, op)| match &op.payload {
            OperationPayload::CreatePet(row) => Some((row.id, i)),
            OperationPayload::CreateAppointment(_) => None,
        })
        .collect();

    let mut emitted = HashSet::with_capacity(pending.len());
    let mut order = Vec::with_capacity(pending.len());
    for (i, op) in pending.iter().enumerate() {
        if let Some(pet) = op.referenced_pet().and_then(|pet| pet_index.get(&pet).copied()) {
            if emitted.insert(pet) {
                order.push(pet);
            }
        }
        if emitted.insert(i) {
            order.push(i);
        }
    }

    let mut slots: Vec<Option<PendingOperation>> = pending.into_iter().map(Some).collect();
    order
        .into_iter()
        .filter_map(|i| slots[i].take())
        .collect()
}

/// Pet ids that still have a queued insert, in any status.
pub(crate) fn unconfirmed_pets(queued: &[PendingOperation]) -> HashSet<PetId> {
    queued
        .iter()
        .filter_map(|op| match &op.payload {
            OperationPayload::CreatePet(row) => Some(row.id),
            OperationPayload::CreateAppointment(_) => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, NaiveTime, Utc};
    use vetsync_core::{AppointmentFields, AppointmentRequest, Pet, PetFields};
    use vetsync_sync_protocol::UserId;

    fn user() -> UserId {
        UserId::from("user-1")
    }

    fn pet_op(offset: i64) -> (PetId, PendingOperation) {
        let at = Utc::now() + Duration::seconds(offset);
        let pet = Pet::create(&user(), PetFields::new("Thor", "dog"), at);
        (pet.id, PendingOperation::insert(OperationPayload::CreatePet(pet.to_row()), at))
    }

    fn appointment_op(pet: PetId, offset: i64) -> PendingOperation {
        let at = Utc::now() + Duration::seconds(offset);
        let fields = AppointmentFields::new(
            pet,
            NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
            NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            "Checkup",
        );
        let appt = AppointmentRequest::create(&user(), fields, at);
        PendingOperation::insert(OperationPayload::CreateAppointment(appt.to_row()), at)
    }

    #[test]
    fn keeps_fifo_when_already_ordered() {
        let (pet, p) = pet_op(0);
        let a = appointment_op(pet, 1);
        let ids = vec![p.id, a.id];

        let ordered: Vec<_> = push_order(vec![p, a]).into_iter().map(|op| op.id).collect();
        assert_eq!(ordered, ids);
    }

    #[test]
    fn hoists_pet_before_its_appointment() {
        let (pet, p) = pet_op(0);
        let (_, other) = pet_op(0);
        let a = appointment_op(pet, 0);
        let expected = vec![other.id, p.id, a.id];

        let ordered: Vec<_> = push_order(vec![other, a, p])
            .into_iter()
            .map(|op| op.id)
            .collect();
        assert_eq!(ordered, expected);
    }

    #[test]
    fn appointment_for_synced_pet_stays_in_place() {
        let a = appointment_op(PetId::generate(), 0);
        let (_, p) = pet_op(1);
        let expected = vec![a.id, p.id];

        let ordered: Vec<_> = push_order(vec![a, p]).into_iter().map(|op| op.id).collect();
        assert_eq!(ordered, expected);
    }

    #[test]
    fn unconfirmed_pets_lists_pet_inserts() {
        let (pet, p) = pet_op(0);
        let a = appointment_op(PetId::generate(), 0);
        let pets = unconfirmed_pets(&[p, a]);
        assert_eq!(pets.len(), 1);
        assert!(pets.contains(&pet));
    }
}
