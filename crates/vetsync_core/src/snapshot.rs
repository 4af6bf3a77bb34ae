//! Read model for the client portal.

use crate::model::{AppointmentRequest, Pet, PetSummary};
use crate::scope::UserScope;
use crate::types::OperationStatus;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Reverse;

/// An appointment joined with a summary of its pet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppointmentView {
    /// The appointment request.
    #[serde(flatten)]
    pub appointment: AppointmentRequest,
    /// The pet, when it is known locally.
    pub pet: Option<PetSummary>,
}

/// Everything the portal UI renders, assembled from local state only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientPortalSnapshot {
    /// Pets, newest first.
    pub pets: Vec<Pet>,
    /// Appointment requests, newest first.
    pub appointments: Vec<AppointmentView>,
    /// Queued operations not yet confirmed, failed ones included.
    pub pending_operations: usize,
    /// Operations waiting for a manual retry.
    pub failed_operations: usize,
    /// Time of the last sync that made progress.
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl ClientPortalSnapshot {
    /// Builds the snapshot for one scope.
    pub fn assemble(scope: &UserScope) -> Self {
        let mut pets = scope.pets.clone();
        pets.sort_by_key(|pet| Reverse(pet.created_at));

        let mut appointments: Vec<AppointmentView> = scope
            .appointments
            .iter()
            .map(|appointment| AppointmentView {
                pet: scope.pet(appointment.pet_id).map(Pet::summary),
                appointment: appointment.clone(),
            })
            .collect();
        appointments.sort_by_key(|view| Reverse(view.appointment.created_at));

        Self {
            pets,
            appointments,
            pending_operations: scope.operations.len(),
            failed_operations: scope.count_operations(OperationStatus::Failed),
            last_synced_at: scope.last_synced_at,
        }
    }
}
