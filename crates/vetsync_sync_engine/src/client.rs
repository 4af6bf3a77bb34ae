//! The local-first client facade used by the portal UI.

use crate::config::SyncConfig;
use crate::engine::{SyncEngine, SyncSummary, SyncTrigger};
use crate::error::SyncResult;
use crate::listener::spawn_reconnect_sync;
use crate::monitor::NetworkMonitor;
use crate::port::RemoteDataPort;
use chrono::Utc;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::debug;
use vetsync_core::{
    validate_user, AppointmentFields, AppointmentRequest, ClientPortalSnapshot, DurableStore,
    OperationPayload, PendingOperation, Pet, PetFields,
};
use vetsync_sync_protocol::UserId;

/// Result of [`LocalFirstClient::create_pet_local_first`].
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedPet {
    /// The pet as stored after the call.
    pub pet: Pet,
    /// Operations still queued for the user.
    pub pending_operations: usize,
}

/// Result of [`LocalFirstClient::create_appointment_local_first`].
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedAppointment {
    /// The appointment request as stored after the call.
    pub appointment: AppointmentRequest,
    /// Operations still queued for the user.
    pub pending_operations: usize,
}

/// Writes locally first, syncs when it can.
///
/// Every create call stores the entity and its queued insert in one store
/// mutation, then, if the device is online, runs a background sync right
/// away. A failed sync never fails the create: the data stays queued for the
/// next run.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use vetsync_core::{DurableStore, PetFields, SyncState};
/// use vetsync_sync_engine::{LocalFirstClient, MemoryRemote, NetworkMonitor, SyncConfig};
/// use vetsync_sync_protocol::UserId;
///
/// let monitor = NetworkMonitor::new(false);
/// let client = LocalFirstClient::new(
///     SyncConfig::default(),
///     Arc::new(DurableStore::open_in_memory()),
///     MemoryRemote::new(),
///     monitor.clone(),
/// );
/// let user = UserId::from("user-1");
///
/// let created = client.create_pet_local_first(&user, PetFields::new("Thor", "dog")).unwrap();
/// assert_eq!(created.pet.sync_state, SyncState::Pending);
/// assert_eq!(created.pending_operations, 1);
/// ```
pub struct LocalFirstClient<P: RemoteDataPort> {
    engine: Arc<SyncEngine<P>>,
}

impl<P: RemoteDataPort> LocalFirstClient<P> {
    /// Creates a client over a store, a remote port and a connectivity signal.
    pub fn new(
        config: SyncConfig,
        store: Arc<DurableStore>,
        port: P,
        monitor: NetworkMonitor,
    ) -> Self {
        Self::from_engine(Arc::new(SyncEngine::new(config, store, port, monitor)))
    }

    /// Wraps an existing engine.
    pub fn from_engine(engine: Arc<SyncEngine<P>>) -> Self {
        Self { engine }
    }

    /// Returns the sync engine.
    pub fn engine(&self) -> &Arc<SyncEngine<P>> {
        &self.engine
    }

    /// Returns the local store.
    pub fn store(&self) -> &DurableStore {
        self.engine.store()
    }

    /// Creates a pet locally and queues its remote insert.
    ///
    /// # Errors
    ///
    /// [`SyncError::Validation`](crate::SyncError::Validation) if the input is
    /// malformed; nothing is written in that case.
    pub fn create_pet_local_first(
        &self,
        user: &UserId,
        fields: PetFields,
    ) -> SyncResult<CreatedPet> {
        validate_user(user)?;
        fields.validate()?;

        let pet = Pet::create(user, fields, Utc::now());
        let op = PendingOperation::insert(
            OperationPayload::CreatePet(pet.to_row()),
            pet.created_at,
        );
        self.store().queue().record_creation(user, pet.clone(), op);
        debug!(user = %user, pet = %pet.id, "pet created locally");

        self.sync_opportunistically(user);

        let pet = self
            .store()
            .read(user, |scope| scope.pet(pet.id).cloned())
            .unwrap_or(pet);
        Ok(CreatedPet {
            pet,
            pending_operations: self.store().queue().len(user),
        })
    }

    /// Creates an appointment request locally and queues its remote insert.
    ///
    /// The pet may still be unsynced; the engine sends the pet first.
    ///
    /// # Errors
    ///
    /// [`SyncError::Validation`](crate::SyncError::Validation) if the input is
    /// malformed; nothing is written in that case.
    pub fn create_appointment_local_first(
        &self,
        user: &UserId,
        fields: AppointmentFields,
    ) -> SyncResult<CreatedAppointment> {
        validate_user(user)?;
        fields.validate()?;

        let appointment = AppointmentRequest::create(user, fields, Utc::now());
        let op = PendingOperation::insert(
            OperationPayload::CreateAppointment(appointment.to_row()),
            appointment.created_at,
        );
        self.store()
            .queue()
            .record_creation(user, appointment.clone(), op);
        debug!(user = %user, appointment = %appointment.id, "appointment created locally");

        self.sync_opportunistically(user);

        let appointment = self
            .store()
            .read(user, |scope| {
                scope
                    .appointments
                    .iter()
                    .find(|a| a.id == appointment.id)
                    .cloned()
            })
            .unwrap_or(appointment);
        Ok(CreatedAppointment {
            appointment,
            pending_operations: self.store().queue().len(user),
        })
    }

    /// Returns the portal read model from local state only.
    pub fn get_client_portal_snapshot(&self, user: &UserId) -> ClientPortalSnapshot {
        self.store().snapshot(user)
    }

    /// Runs a sync pass for `user`.
    pub fn sync_client_portal_data(
        &self,
        user: &UserId,
        trigger: SyncTrigger,
    ) -> SyncResult<SyncSummary> {
        self.engine.sync(user, trigger)
    }

    /// Returns the current connectivity.
    pub fn is_network_online(&self) -> bool {
        self.engine.monitor().is_online()
    }

    /// Returns failed operations and their entities to `pending`.
    ///
    /// Does not start a sync. Returns how many operations were reset.
    pub fn mark_queue_for_retry(&self, user: &UserId) -> usize {
        self.store().queue().mark_all_for_retry(user)
    }

    /// Clears every user's local state, leaves degraded mode and zeroes the
    /// engine counters.
    pub fn reset_local_first_state_for_tests(&self) {
        self.store().reset_all_for_tests();
        self.engine.reset_stats();
    }

    /// Drops the store's memory fallback, leaves degraded mode and zeroes the
    /// engine counters. Persisted records stay.
    pub fn clear_memory_fallback_for_tests(&self) {
        self.store().clear_memory_fallback_for_tests();
        self.engine.reset_stats();
    }

    fn sync_opportunistically(&self, user: &UserId) {
        if !self.is_network_online() {
            return;
        }
        if let Err(err) = self.engine.sync(user, SyncTrigger::Background) {
            debug!(user = %user, error = %err, "opportunistic sync failed, data stays queued");
        }
    }
}

impl<P: RemoteDataPort + 'static> LocalFirstClient<P> {
    /// Starts syncing `user` in the background after every reconnect.
    ///
    /// See [`spawn_reconnect_sync`].
    pub fn spawn_reconnect_sync(&self, user: UserId) -> JoinHandle<()> {
        spawn_reconnect_sync(Arc::clone(&self.engine), user)
    }
}

impl<P: RemoteDataPort> Clone for LocalFirstClient<P> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
        }
    }
}
