//! # VetSync Sync Protocol
//!
//! Types exchanged with the remote data service.
//!
//! This crate provides:
//! - Typed identifiers ([`UserId`], [`PetId`], [`AppointmentId`])
//! - Remote rows for the two collections ([`PetRow`], [`AppointmentRow`])
//! - [`SelectQuery`] for full-state reconciliation reads
//! - [`RemoteError`] with a backend-independent [`RemoteErrorKind`]
//!
//! This is a pure protocol crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod ids;
mod query;
mod rows;

pub use error::{RemoteError, RemoteErrorKind, RemoteResult, UNIQUE_VIOLATION};
pub use ids::{AppointmentId, PetId, UserId};
pub use query::{SelectQuery, SortOrder};
pub use rows::{AppointmentRow, PetRow, Table};
