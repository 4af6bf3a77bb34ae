//! # VetSync Testkit
//!
//! Test utilities for VetSync.
//!
//! This crate provides:
//! - [`TestClient`]: a client wired to an in-memory remote and a
//!   controllable network signal
//! - Property-based generators for pet and appointment input
//! - Offline batch scenarios and the checks a drained queue must pass
//!
//! ## Usage
//!
//! ```rust
//! use vetsync_testkit::prelude::*;
//!
//! let client = TestClient::memory();
//! client.go_offline();
//! let pet = client.create_pet("Thor");
//! client.create_appointment(pet);
//!
//! client.go_online();
//! drain(&client, 4).unwrap();
//! check_drained(&client).unwrap();
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod scenario;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::scenario::*;
}

pub use fixtures::*;
pub use generators::*;
pub use scenario::*;
