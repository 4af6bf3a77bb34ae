//! Local entities and the input accepted by create calls.

use crate::error::ValidationError;
use crate::scope::UserScope;
use crate::types::{EntityKind, SyncState};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use vetsync_sync_protocol::{AppointmentId, AppointmentRow, PetId, PetRow, UserId};

/// Maximum length of short text fields (names, species, breed, reason).
pub const MAX_SHORT_TEXT: usize = 200;

/// Maximum length of free-form notes.
pub const MAX_NOTES: usize = 4000;

/// Workflow status given to every new appointment request.
pub const INITIAL_APPOINTMENT_STATUS: &str = "pending";

/// Identifier of any local entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityId {
    /// A pet id.
    Pet(PetId),
    /// An appointment request id.
    AppointmentRequest(AppointmentId),
}

impl EntityId {
    /// Returns the kind of entity this id names.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        match self {
            EntityId::Pet(_) => EntityKind::Pet,
            EntityId::AppointmentRequest(_) => EntityKind::AppointmentRequest,
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Pet(id) => id.fmt(f),
            EntityId::AppointmentRequest(id) => id.fmt(f),
        }
    }
}

/// Behavior shared by the entity kinds kept in a [`UserScope`].
///
/// Lets the store and queue handle both kinds generically.
pub trait LocalEntity: Clone {
    /// The entity kind.
    const KIND: EntityKind;

    /// Returns the entity's identifier.
    fn entity_id(&self) -> EntityId;

    /// Returns the current sync state.
    fn sync_state(&self) -> SyncState;

    /// Overwrites the sync state.
    fn set_sync_state(&mut self, state: SyncState);

    /// Client creation time.
    fn created_at(&self) -> DateTime<Utc>;

    /// This kind's rows in a scope, in insertion order.
    fn rows(scope: &UserScope) -> &[Self];

    /// Mutable access to this kind's rows in a scope.
    fn rows_mut(scope: &mut UserScope) -> &mut Vec<Self>;
}

/// A pet as stored locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pet {
    /// Client-generated id, reused as the remote primary key.
    pub id: PetId,
    /// Owning user.
    pub user_id: UserId,
    /// Pet name.
    pub name: String,
    /// Species.
    pub species: String,
    /// Breed.
    pub breed: Option<String>,
    /// Free-form age.
    pub age: Option<String>,
    /// Free-form weight.
    pub weight: Option<String>,
    /// Owner notes.
    pub notes: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
    /// Sync state.
    pub sync_state: SyncState,
}

impl Pet {
    /// Builds a new, not yet synced pet from validated fields.
    pub fn create(user: &UserId, fields: PetFields, now: DateTime<Utc>) -> Self {
        Self {
            id: PetId::generate(),
            user_id: user.clone(),
            name: fields.name.trim().to_string(),
            species: fields.species.trim().to_string(),
            breed: fields.breed,
            age: fields.age,
            weight: fields.weight,
            notes: fields.notes,
            created_at: now,
            updated_at: now,
            sync_state: SyncState::Pending,
        }
    }

    /// Returns the row inserted remotely for this pet.
    #[must_use]
    pub fn to_row(&self) -> PetRow {
        PetRow {
            id: self.id,
            user_id: self.user_id.clone(),
            name: self.name.clone(),
            species: self.species.clone(),
            breed: self.breed.clone(),
            age: self.age.clone(),
            weight: self.weight.clone(),
            notes: self.notes.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    /// Builds a local pet from a remote row.
    #[must_use]
    pub fn from_row(row: PetRow, sync_state: SyncState) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            species: row.species,
            breed: row.breed,
            age: row.age,
            weight: row.weight,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
            sync_state,
        }
    }

    /// Returns the summary joined into appointment views.
    #[must_use]
    pub fn summary(&self) -> PetSummary {
        PetSummary {
            id: self.id,
            name: self.name.clone(),
            species: self.species.clone(),
            breed: self.breed.clone(),
        }
    }
}

impl LocalEntity for Pet {
    const KIND: EntityKind = EntityKind::Pet;

    fn entity_id(&self) -> EntityId {
        EntityId::Pet(self.id)
    }

    fn sync_state(&self) -> SyncState {
        self.sync_state
    }

    fn set_sync_state(&mut self, state: SyncState) {
        self.sync_state = state;
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn rows(scope: &UserScope) -> &[Self] {
        &scope.pets
    }

    fn rows_mut(scope: &mut UserScope) -> &mut Vec<Self> {
        &mut scope.pets
    }
}

/// An appointment request as stored locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppointmentRequest {
    /// Client-generated id, reused as the remote primary key.
    pub id: AppointmentId,
    /// Owning user.
    pub user_id: UserId,
    /// Pet the request is for.
    pub pet_id: PetId,
    /// Requested day.
    pub preferred_date: NaiveDate,
    /// Requested time.
    pub preferred_time: NaiveTime,
    /// Reason for the visit.
    pub reason: String,
    /// Owner notes.
    pub notes: Option<String>,
    /// Clinic workflow status.
    pub status: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
    /// Sync state.
    pub sync_state: SyncState,
}

impl AppointmentRequest {
    /// Builds a new, not yet synced request from validated fields.
    pub fn create(user: &UserId, fields: AppointmentFields, now: DateTime<Utc>) -> Self {
        Self {
            id: AppointmentId::generate(),
            user_id: user.clone(),
            pet_id: fields.pet_id,
            preferred_date: fields.preferred_date,
            preferred_time: fields.preferred_time,
            reason: fields.reason.trim().to_string(),
            notes: fields.notes,
            status: INITIAL_APPOINTMENT_STATUS.to_string(),
            created_at: now,
            updated_at: now,
            sync_state: SyncState::Pending,
        }
    }

    /// Returns the row inserted remotely for this request.
    #[must_use]
    pub fn to_row(&self) -> AppointmentRow {
        AppointmentRow {
            id: self.id,
            user_id: self.user_id.clone(),
            pet_id: self.pet_id,
            preferred_date: self.preferred_date,
            preferred_time: self.preferred_time,
            reason: self.reason.clone(),
            notes: self.notes.clone(),
            status: self.status.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    /// Builds a local request from a remote row.
    #[must_use]
    pub fn from_row(row: AppointmentRow, sync_state: SyncState) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            pet_id: row.pet_id,
            preferred_date: row.preferred_date,
            preferred_time: row.preferred_time,
            reason: row.reason,
            notes: row.notes,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
            sync_state,
        }
    }
}

impl LocalEntity for AppointmentRequest {
    const KIND: EntityKind = EntityKind::AppointmentRequest;

    fn entity_id(&self) -> EntityId {
        EntityId::AppointmentRequest(self.id)
    }

    fn sync_state(&self) -> SyncState {
        self.sync_state
    }

    fn set_sync_state(&mut self, state: SyncState) {
        self.sync_state = state;
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn rows(scope: &UserScope) -> &[Self] {
        &scope.appointments
    }

    fn rows_mut(scope: &mut UserScope) -> &mut Vec<Self> {
        &mut scope.appointments
    }
}

/// The pet fields joined into each appointment of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetSummary {
    /// Pet id.
    pub id: PetId,
    /// Pet name.
    pub name: String,
    /// Species.
    pub species: String,
    /// Breed.
    pub breed: Option<String>,
}

/// Input for creating a pet.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PetFields {
    /// Pet name (required).
    pub name: String,
    /// Species (required).
    pub species: String,
    /// Breed.
    pub breed: Option<String>,
    /// Free-form age.
    pub age: Option<String>,
    /// Free-form weight.
    pub weight: Option<String>,
    /// Owner notes.
    pub notes: Option<String>,
}

impl PetFields {
    /// Creates fields with the two required values.
    pub fn new(name: impl Into<String>, species: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            species: species.into(),
            ..Self::default()
        }
    }

    /// Sets the breed.
    #[must_use]
    pub fn breed(mut self, breed: impl Into<String>) -> Self {
        self.breed = Some(breed.into());
        self
    }

    /// Sets the age.
    #[must_use]
    pub fn age(mut self, age: impl Into<String>) -> Self {
        self.age = Some(age.into());
        self
    }

    /// Sets the weight.
    #[must_use]
    pub fn weight(mut self, weight: impl Into<String>) -> Self {
        self.weight = Some(weight.into());
        self
    }

    /// Sets the notes.
    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Checks required fields and lengths.
    pub fn validate(&self) -> Result<(), ValidationError> {
        required("name", &self.name)?;
        required("species", &self.species)?;
        optional("breed", self.breed.as_deref(), MAX_SHORT_TEXT)?;
        optional("age", self.age.as_deref(), MAX_SHORT_TEXT)?;
        optional("weight", self.weight.as_deref(), MAX_SHORT_TEXT)?;
        optional("notes", self.notes.as_deref(), MAX_NOTES)
    }
}

/// Input for creating an appointment request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentFields {
    /// Pet the request is for.
    pub pet_id: PetId,
    /// Requested day.
    pub preferred_date: NaiveDate,
    /// Requested time.
    pub preferred_time: NaiveTime,
    /// Reason for the visit (required).
    pub reason: String,
    /// Owner notes.
    pub notes: Option<String>,
}

impl AppointmentFields {
    /// Creates fields with every required value.
    pub fn new(
        pet_id: PetId,
        preferred_date: NaiveDate,
        preferred_time: NaiveTime,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            pet_id,
            preferred_date,
            preferred_time,
            reason: reason.into(),
            notes: None,
        }
    }

    /// Sets the notes.
    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Checks required fields and lengths.
    pub fn validate(&self) -> Result<(), ValidationError> {
        required("reason", &self.reason)?;
        optional("notes", self.notes.as_deref(), MAX_NOTES)
    }
}

/// Rejects empty user ids.
pub fn validate_user(user: &UserId) -> Result<(), ValidationError> {
    if user.as_str().trim().is_empty() {
        return Err(ValidationError::EmptyUserId);
    }
    Ok(())
}

fn required(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField { field });
    }
    optional(field, Some(value), MAX_SHORT_TEXT)
}

fn optional(field: &'static str, value: Option<&str>, max: usize) -> Result<(), ValidationError> {
    match value {
        Some(v) if v.chars().count() > max => Err(ValidationError::TooLong { field, max }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
    }

    fn time() -> NaiveTime {
        NaiveTime::from_hms_opt(9, 30, 0).unwrap()
    }

    #[test]
    fn pet_fields_validation() {
        assert!(PetFields::new("Thor", "dog").validate().is_ok());
        assert_eq!(
            PetFields::new("  ", "dog").validate(),
            Err(ValidationError::EmptyField { field: "name" })
        );
        assert_eq!(
            PetFields::new("Thor", "").validate(),
            Err(ValidationError::EmptyField { field: "species" })
        );
        let long = "x".repeat(MAX_NOTES + 1);
        assert_eq!(
            PetFields::new("Thor", "dog").notes(long).validate(),
            Err(ValidationError::TooLong { field: "notes", max: MAX_NOTES })
        );
    }

    #[test]
    fn appointment_fields_validation() {
        let fields = AppointmentFields::new(PetId::generate(), date(), time(), "Checkup");
        assert!(fields.validate().is_ok());

        let blank = AppointmentFields::new(PetId::generate(), date(), time(), "\t");
        assert_eq!(
            blank.validate(),
            Err(ValidationError::EmptyField { field: "reason" })
        );
    }

    #[test]
    fn empty_user_rejected() {
        assert_eq!(validate_user(&UserId::from(" ")), Err(ValidationError::EmptyUserId));
        assert!(validate_user(&UserId::from("user-1")).is_ok());
    }

    #[test]
    fn created_pet_is_pending() {
        let now = Utc::now();
        let pet = Pet::create(&UserId::from("user-1"), PetFields::new(" Thor ", "dog"), now);
        assert_eq!(pet.sync_state, SyncState::Pending);
        assert_eq!(pet.name, "Thor");
        assert_eq!(pet.created_at, pet.updated_at);
    }

    #[test]
    fn pet_row_conversion_keeps_id() {
        let pet = Pet::create(
            &UserId::from("user-1"),
            PetFields::new("Luna", "cat").breed("Siamese"),
            Utc::now(),
        );
        let row = pet.to_row();
        assert_eq!(row.id, pet.id);
        let back = Pet::from_row(row, SyncState::Pending);
        assert_eq!(back, pet);
    }

    #[test]
    fn new_appointment_has_initial_status() {
        let fields = AppointmentFields::new(PetId::generate(), date(), time(), "Vaccine");
        let appt = AppointmentRequest::create(&UserId::from("user-1"), fields.clone(), Utc::now());
        assert_eq!(appt.status, INITIAL_APPOINTMENT_STATUS);
        assert_eq!(appt.pet_id, fields.pet_id);
        assert_eq!(appt.entity_id().kind(), EntityKind::AppointmentRequest);
    }
}
