//! # VetSync Sync Engine
//!
//! Drains the offline operation queue against the remote data service.
//!
//! This crate provides:
//! - [`RemoteDataPort`], the remote service boundary, and [`MemoryRemote`]
//! - [`NetworkMonitor`] with debounced reconnect notifications
//! - [`SyncEngine`]: one-run-per-user queue draining with reconciliation
//! - [`LocalFirstClient`]: the create/snapshot/sync facade used by the UI
//!
//! ## Architecture
//!
//! The engine implements a **push-then-pull** model:
//! 1. Push pending operations oldest first, pets before their appointments
//! 2. Pull the user's remote rows and merge them into local state
//! 3. Advance the sync cursor if the run made progress
//!
//! ## Key Invariants
//!
//! - Client-generated ids make retried inserts idempotent; a duplicate-key
//!   conflict counts as success
//! - A network failure stops the run and leaves the rest of the queue intact
//! - A rejected operation is kept, marked failed, and waits for a manual retry
//! - At most one run per user at a time

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod config;
mod engine;
mod error;
mod listener;
mod lock;
mod monitor;
mod plan;
mod port;
mod reconcile;

pub use client::{CreatedAppointment, CreatedPet, LocalFirstClient};
pub use config::SyncConfig;
pub use engine::{SyncEngine, SyncOutcome, SyncStats, SyncSummary, SyncTrigger};
pub use error::{SyncError, SyncResult};
pub use listener::spawn_reconnect_sync;
pub use monitor::{NetworkMonitor, ReconnectSubscription};
pub use port::{MemoryRemote, PausedInsert, RemoteDataPort, FOREIGN_KEY_VIOLATION};
