//! Offline batch scenarios.
//!
//! Apply a batch of offline actions, drain the queue, then check that every
//! local entity landed on the remote exactly once.

use crate::fixtures::TestClient;
use crate::generators::OfflineAction;
use std::collections::HashSet;
use vetsync_core::{AppointmentFields, SyncState};
use vetsync_sync_engine::{SyncOutcome, SyncTrigger};
use vetsync_sync_protocol::PetId;

/// What an offline batch created locally.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchResult {
    /// Pets created, in order.
    pub pets: Vec<PetId>,
    /// Appointment requests created.
    pub appointments: usize,
}

impl BatchResult {
    /// Total operations the batch queued.
    pub fn operations(&self) -> usize {
        self.pets.len() + self.appointments
    }
}

/// Applies `actions` through the client's create calls.
pub fn apply_batch(client: &TestClient, actions: &[OfflineAction]) -> BatchResult {
    let mut result = BatchResult::default();
    for action in actions {
        match action {
            OfflineAction::CreatePet(fields) => {
                let created = client
                    .create_pet_local_first(&client.user, fields.clone())
                    .expect("Failed to create pet");
                result.pets.push(created.pet.id);
            }
            OfflineAction::CreateAppointment {
                pet_index,
                date,
                time,
                reason,
            } => {
                if result.pets.is_empty() {
                    continue;
                }
                let pet = result.pets[pet_index % result.pets.len()];
                let fields = AppointmentFields::new(pet, *date, *time, reason.clone());
                client
                    .create_appointment_local_first(&client.user, fields)
                    .expect("Failed to create appointment");
                result.appointments += 1;
            }
        }
    }
    result
}

/// Runs background syncs until the queue is empty.
///
/// Returns the number of runs, or an error if the queue is still not empty
/// after `max_runs`.
pub fn drain(client: &TestClient, max_runs: usize) -> Result<usize, String> {
    for run in 1..=max_runs {
        let summary = client
            .sync_client_portal_data(&client.user, SyncTrigger::Background)
            .map_err(|e| e.to_string())?;
        if summary.outcome == SyncOutcome::Offline {
            return Err("client is offline".into());
        }
        if summary.pending_operations == 0 {
            return Ok(run);
        }
    }
    Err(format!(
        "queue not drained after {max_runs} runs, {} left",
        client.queued()
    ))
}

/// Checks the state a fully drained client must be in.
///
/// - the queue is empty
/// - every local entity is synced
/// - the remote holds each local entity exactly once, and nothing else for
///   this user
pub fn check_drained(client: &TestClient) -> Result<(), String> {
    if client.queued() != 0 {
        return Err(format!("{} operations still queued", client.queued()));
    }

    let snapshot = client.get_client_portal_snapshot(&client.user);
    if let Some(pet) = snapshot.pets.iter().find(|p| p.sync_state != SyncState::Synced) {
        return Err(format!("{} is {}", pet.id, pet.sync_state));
    }
    if let Some(view) = snapshot
        .appointments
        .iter()
        .find(|a| a.appointment.sync_state != SyncState::Synced)
    {
        return Err(format!(
            "{} is {}",
            view.appointment.id, view.appointment.sync_state
        ));
    }

    let remote_pets: Vec<PetId> = client
        .remote
        .pets()
        .into_iter()
        .filter(|row| row.user_id == client.user)
        .map(|row| row.id)
        .collect();
    let unique: HashSet<PetId> = remote_pets.iter().copied().collect();
    if unique.len() != remote_pets.len() {
        return Err("duplicate pet rows on remote".into());
    }
    let local: HashSet<PetId> = snapshot.pets.iter().map(|p| p.id).collect();
    if unique != local {
        return Err(format!(
            "remote has {} pets, local has {}",
            unique.len(),
            local.len()
        ));
    }

    let remote_appointments = client
        .remote
        .appointments()
        .into_iter()
        .filter(|row| row.user_id == client.user)
        .count();
    if remote_appointments != snapshot.appointments.len() {
        return Err(format!(
            "remote has {remote_appointments} appointments, local has {}",
            snapshot.appointments.len()
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::pet_fields;
    use chrono::{NaiveDate, NaiveTime};
    use vetsync_sync_protocol::RemoteError;

    fn batch() -> Vec<OfflineAction> {
        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let time = NaiveTime::from_hms_opt(10, 0, 0).unwrap();
        vec![
            OfflineAction::CreateAppointment {
                pet_index: 0,
                date,
                time,
                reason: "skipped".into(),
            },
            OfflineAction::CreatePet(pet_fields("Thor")),
            OfflineAction::CreateAppointment {
                pet_index: 3,
                date,
                time,
                reason: "Checkup".into(),
            },
        ]
    }

    #[test]
    fn appointment_without_pet_is_skipped() {
        let client = TestClient::memory();
        client.go_offline();
        let result = apply_batch(&client, &batch());

        assert_eq!(result.pets.len(), 1);
        assert_eq!(result.appointments, 1);
        assert_eq!(client.queued(), result.operations());
    }

    #[test]
    fn drain_survives_a_network_failure() {
        let client = TestClient::memory();
        client.go_offline();
        apply_batch(&client, &batch());
        client.go_online();
        client.remote.fail_next_insert(RemoteError::network("timeout"));

        assert_eq!(drain(&client, 3), Ok(2));
        assert_eq!(check_drained(&client), Ok(()));
    }

    #[test]
    fn drain_reports_offline() {
        let client = TestClient::memory();
        client.go_offline();
        apply_batch(&client, &batch());

        assert!(drain(&client, 1).is_err());
        assert!(check_drained(&client).is_err());
    }
}
