//! # VetSync Core
//!
//! Local-first data model and storage for the VetSync client.
//!
//! This crate provides:
//! - The two entity kinds ([`Pet`], [`AppointmentRequest`]) and their
//!   [`SyncState`]
//! - [`PendingOperation`]: a queued remote insert that survives restarts
//! - [`DurableStore`]: per-user persistence that falls back to memory when
//!   the backend fails
//! - [`OperationQueue`]: the FIFO view the sync engine drains
//! - [`ClientPortalSnapshot`]: the read model rendered by the UI
//!
//! Nothing in this crate talks to the network; see `vetsync_sync_engine`.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod model;
mod operation;
mod queue;
mod scope;
mod snapshot;
mod store;
mod types;

pub use config::StoreConfig;
pub use error::{CoreError, CoreResult, ValidationError};
pub use model::{
    validate_user, AppointmentFields, AppointmentRequest, EntityId, LocalEntity, Pet, PetFields,
    PetSummary, INITIAL_APPOINTMENT_STATUS, MAX_NOTES, MAX_SHORT_TEXT,
};
pub use operation::{OperationPayload, PendingOperation};
pub use queue::OperationQueue;
pub use scope::UserScope;
pub use snapshot::{AppointmentView, ClientPortalSnapshot};
pub use store::DurableStore;
pub use types::{EntityKind, OperationId, OperationKind, OperationStatus, SyncState};

/// Crate version, reported by the CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
