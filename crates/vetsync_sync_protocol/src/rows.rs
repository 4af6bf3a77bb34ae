//! Remote rows for the two collections.

use crate::ids::{AppointmentId, PetId, UserId};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The remote collections the engine writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Table {
    /// The `pets` collection.
    Pets,
    /// The `appointment_requests` collection.
    AppointmentRequests,
}

impl Table {
    /// Returns the remote collection name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Table::Pets => "pets",
            Table::AppointmentRequests => "appointment_requests",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A row of the remote `pets` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PetRow {
    /// Client-generated primary key.
    pub id: PetId,
    /// Owning user.
    pub user_id: UserId,
    /// Pet name.
    pub name: String,
    /// Species ("dog", "cat", ...). Stored remotely as `type`.
    #[serde(rename = "type")]
    pub species: String,
    /// Breed, if known.
    pub breed: Option<String>,
    /// Free-form age ("3 years").
    pub age: Option<String>,
    /// Free-form weight ("12kg").
    pub weight: Option<String>,
    /// Owner notes.
    pub notes: Option<String>,
    /// Creation time on the client.
    pub created_at: DateTime<Utc>,
    /// Last update time on the client.
    pub updated_at: DateTime<Utc>,
}

/// A row of the remote `appointment_requests` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppointmentRow {
    /// Client-generated primary key.
    pub id: AppointmentId,
    /// Owning user.
    pub user_id: UserId,
    /// Pet the appointment is for.
    pub pet_id: PetId,
    /// Requested day.
    pub preferred_date: NaiveDate,
    /// Requested time of day.
    pub preferred_time: NaiveTime,
    /// Reason for the visit.
    pub reason: String,
    /// Owner notes.
    pub notes: Option<String>,
    /// Clinic workflow status ("pending", "confirmed", ...).
    pub status: String,
    /// Creation time on the client.
    pub created_at: DateTime<Utc>,
    /// Last update time on the client.
    pub updated_at: DateTime<Utc>,
}
