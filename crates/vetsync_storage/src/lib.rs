//! # VetSync Storage
//!
//! Keyed storage backends for the VetSync local-first store.
//!
//! Backends are **opaque record stores**: they map string keys to byte
//! blobs and know nothing about pets, appointments or operation queues.
//! The durable store in `vetsync_core` owns the record format.
//!
//! ## Design Principles
//!
//! - Backends are simple keyed stores (read, write, remove, list)
//! - A write replaces the whole record for a key
//! - Must be `Send + Sync` so a store can be shared across threads
//! - Failures are reported, never hidden; the layer above decides how to degrade
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - For tests and the session-scoped memory fallback
//! - [`FileBackend`] - For persistent storage, one file per key
//! - [`FaultInjectingBackend`] - Wrapper that fails on demand, for tests
//!
//! ## Example
//!
//! ```rust
//! use vetsync_storage::{StorageBackend, InMemoryBackend};
//!
//! let mut backend = InMemoryBackend::new();
//! backend.write("user:ana", b"record").unwrap();
//! assert_eq!(backend.read("user:ana").unwrap().as_deref(), Some(&b"record"[..]));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod fault;
mod file;
mod memory;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use fault::{FaultInjectingBackend, FaultSwitch};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
