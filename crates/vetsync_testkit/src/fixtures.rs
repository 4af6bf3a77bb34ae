//! Test fixtures and client helpers.
//!
//! Provides a local-first client wired to an in-memory remote, plus
//! ready-made pet and appointment input.

use chrono::{NaiveDate, NaiveTime};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use vetsync_core::{AppointmentFields, DurableStore, PetFields};
use vetsync_sync_engine::{LocalFirstClient, MemoryRemote, NetworkMonitor, SyncConfig};
use vetsync_sync_protocol::{PetId, UserId};

/// The client type every fixture builds.
pub type TestLocalFirstClient = LocalFirstClient<Arc<MemoryRemote>>;

/// A client with its remote, network signal and (optionally) its store
/// directory, cleaned up on drop.
pub struct TestClient {
    /// The client under test.
    pub client: TestLocalFirstClient,
    /// Connectivity signal shared with the client.
    pub monitor: NetworkMonitor,
    /// The remote the client pushes to.
    pub remote: Arc<MemoryRemote>,
    /// The user every helper acts for.
    pub user: UserId,
    /// The temporary directory (kept alive to prevent cleanup).
    _temp_dir: Option<TempDir>,
}

impl TestClient {
    /// Creates an online client over an in-memory store.
    pub fn memory() -> Self {
        Self::build(
            DurableStore::open_in_memory(),
            NetworkMonitor::new(true),
            Arc::new(MemoryRemote::new()),
            None,
        )
    }

    /// Creates an online client over a file store in a temporary directory.
    pub fn file() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = open_file_store(temp_dir.path());
        Self::build(
            store,
            NetworkMonitor::new(true),
            Arc::new(MemoryRemote::new()),
            Some(temp_dir),
        )
    }

    /// Closes the store and opens it again, keeping the remote and the
    /// network signal. Simulates an app restart.
    ///
    /// # Panics
    ///
    /// Panics for in-memory clients.
    pub fn reopen(self) -> Self {
        let Self {
            client,
            monitor,
            remote,
            user,
            _temp_dir,
        } = self;
        drop(client);
        let temp_dir = _temp_dir.expect("reopen requires a file-backed client");
        let mut reopened = Self::build(
            open_file_store(temp_dir.path()),
            monitor,
            remote,
            Some(temp_dir),
        );
        reopened.user = user;
        reopened
    }

    fn build(
        store: DurableStore,
        monitor: NetworkMonitor,
        remote: Arc<MemoryRemote>,
        temp_dir: Option<TempDir>,
    ) -> Self {
        let config = SyncConfig::default().with_reconnect_debounce(Duration::from_millis(10));
        let client = LocalFirstClient::new(
            config,
            Arc::new(store),
            Arc::clone(&remote),
            monitor.clone(),
        );
        Self {
            client,
            monitor,
            remote,
            user: UserId::from("test-user"),
            _temp_dir: temp_dir,
        }
    }

    /// Acts as `user` from now on.
    #[must_use]
    pub fn as_user(mut self, user: impl Into<UserId>) -> Self {
        self.user = user.into();
        self
    }

    /// Reports the device offline.
    pub fn go_offline(&self) {
        self.monitor.set_online(false);
    }

    /// Reports the device online.
    pub fn go_online(&self) {
        self.monitor.set_online(true);
    }

    /// Creates a pet with [`pet_fields`] and returns its id.
    pub fn create_pet(&self, name: &str) -> PetId {
        self.client
            .create_pet_local_first(&self.user, pet_fields(name))
            .expect("Failed to create pet")
            .pet
            .id
    }

    /// Creates an appointment request for `pet` with [`appointment_fields`].
    pub fn create_appointment(&self, pet: PetId) {
        self.client
            .create_appointment_local_first(&self.user, appointment_fields(pet))
            .expect("Failed to create appointment");
    }

    /// Number of queued operations for the current user.
    pub fn queued(&self) -> usize {
        self.client.store().queue().len(&self.user)
    }
}

impl std::ops::Deref for TestClient {
    type Target = TestLocalFirstClient;

    fn deref(&self) -> &Self::Target {
        &self.client
    }
}

fn open_file_store(dir: &Path) -> DurableStore {
    DurableStore::open(&dir.join("vetsync.db")).expect("Failed to open file store")
}

/// Valid pet input: a dog named `name` with every optional field set.
pub fn pet_fields(name: &str) -> PetFields {
    PetFields::new(name, "dog")
        .breed("Labrador")
        .age("4 years")
        .weight("28kg")
        .notes("Friendly")
}

/// Valid appointment input for `pet`.
pub fn appointment_fields(pet: PetId) -> AppointmentFields {
    AppointmentFields::new(
        pet,
        NaiveDate::from_ymd_opt(2026, 5, 4).expect("valid date"),
        NaiveTime::from_hms_opt(14, 0, 0).expect("valid time"),
        "Vaccination",
    )
    .notes("Annual booster")
}
