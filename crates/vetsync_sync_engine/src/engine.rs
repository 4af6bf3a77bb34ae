//! The sync engine: drains a user's operation queue against the remote.

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::lock::SyncLocks;
use crate::monitor::NetworkMonitor;
use crate::plan::{push_order, unconfirmed_pets};
use crate::port::RemoteDataPort;
use crate::reconcile;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, warn};
use vetsync_core::{DurableStore, OperationPayload, PendingOperation};
use vetsync_sync_protocol::{RemoteError, RemoteResult, UserId};

/// Who asked for a sync run.
///
/// Decides whether a transient network failure is returned to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncTrigger {
    /// Reconnect events and opportunistic syncs after a local write.
    Background,
    /// An explicit request from the user, who should hear about failures.
    UserInitiated,
}

/// How a sync run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The device is offline; nothing was attempted.
    Offline,
    /// Another run for the same user is in progress; nothing was attempted.
    AlreadyRunning,
    /// A network failure stopped the run; the rest of the queue is untouched.
    Aborted,
    /// Every pending operation was attempted or deferred.
    Completed,
}

/// What a sync run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSummary {
    /// How the run ended.
    pub outcome: SyncOutcome,
    /// Operations confirmed by the remote (conflicts included).
    pub pushed: usize,
    /// Operations rejected in this run.
    pub failed: usize,
    /// Appointments left pending because their pet is not synced yet.
    pub deferred: usize,
    /// Remote rows read by the reconciliation pull.
    pub pulled: usize,
    /// Operations still queued after the run.
    pub pending_operations: usize,
}

impl SyncSummary {
    fn empty(outcome: SyncOutcome) -> Self {
        Self {
            outcome,
            pushed: 0,
            failed: 0,
            deferred: 0,
            pulled: 0,
            pending_operations: 0,
        }
    }
}

/// Counters across all runs of one engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Runs that reached the end of the queue.
    pub runs_completed: u64,
    /// Runs stopped by a network failure.
    pub runs_aborted: u64,
    /// Operations confirmed by the remote.
    pub operations_pushed: u64,
    /// Confirmations that arrived as duplicate-key conflicts.
    pub conflicts_absorbed: u64,
    /// Operations rejected by the remote.
    pub rejections: u64,
    /// Remote rows read by reconciliation pulls.
    pub rows_pulled: u64,
    /// End of the last completed run.
    pub last_sync_time: Option<DateTime<Utc>>,
    /// Message of the last network failure or rejection.
    pub last_error: Option<String>,
}

enum PushResult {
    Confirmed { conflict: bool },
    Rejected(RemoteError),
}

/// Drains per-user operation queues against a [`RemoteDataPort`].
///
/// A run pushes every pending operation oldest first (pets before the
/// appointments that reference them), then optionally pulls the user's
/// remote rows to reconcile local state. At most one run per user is active
/// at a time; a concurrent call returns [`SyncOutcome::AlreadyRunning`].
///
/// Runs are synchronous. Async callers should use `spawn_blocking`, as
/// [`spawn_reconnect_sync`](crate::spawn_reconnect_sync) does.
pub struct SyncEngine<P: RemoteDataPort> {
    config: SyncConfig,
    store: Arc<DurableStore>,
    port: Arc<P>,
    monitor: NetworkMonitor,
    locks: SyncLocks,
    stats: RwLock<SyncStats>,
}

impl<P: RemoteDataPort> SyncEngine<P> {
    /// Creates a new sync engine.
    pub fn new(
        config: SyncConfig,
        store: Arc<DurableStore>,
        port: P,
        monitor: NetworkMonitor,
    ) -> Self {
        Self {
            config,
            store,
            port: Arc::new(port),
            monitor,
            locks: SyncLocks::default(),
            stats: RwLock::new(SyncStats::default()),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Returns the local store.
    pub fn store(&self) -> &Arc<DurableStore> {
        &self.store
    }

    /// Returns the remote port.
    pub fn port(&self) -> &P {
        &self.port
    }

    /// Returns the connectivity monitor.
    pub fn monitor(&self) -> &NetworkMonitor {
        &self.monitor
    }

    /// Returns a copy of the counters.
    pub fn stats(&self) -> SyncStats {
        self.stats.read().clone()
    }

    /// Zeroes the counters.
    pub fn reset_stats(&self) {
        *self.stats.write() = SyncStats::default();
    }

    /// Returns true while a run for `user` is in progress.
    pub fn is_syncing(&self, user: &UserId) -> bool {
        self.locks.is_held(user)
    }

    /// Runs one sync pass for `user`.
    ///
    /// # Errors
    ///
    /// Only [`SyncError::Network`], and only for
    /// [`SyncTrigger::UserInitiated`] runs. Background runs report the same
    /// failure as [`SyncOutcome::Aborted`].
    pub fn sync(&self, user: &UserId, trigger: SyncTrigger) -> SyncResult<SyncSummary> {
        if !self.monitor.is_online() {
            debug!(user = %user, "offline, skipping sync");
            return Ok(self.finish(user, SyncSummary::empty(SyncOutcome::Offline)));
        }

        let Some(_guard) = self.locks.try_acquire(user) else {
            debug!(user = %user, "sync already running");
            return Ok(self.finish(user, SyncSummary::empty(SyncOutcome::AlreadyRunning)));
        };

        let mut summary = SyncSummary::empty(SyncOutcome::Completed);
        let queue = self.store.queue();
        let queued = queue.peek_all(user);
        let mut unconfirmed = unconfirmed_pets(&queued);
        let pending: Vec<PendingOperation> = queued
            .into_iter()
            .filter(PendingOperation::is_pending)
            .collect();

        for op in push_order(pending) {
            if let Some(pet) = op.referenced_pet() {
                if unconfirmed.contains(&pet) {
                    debug!(
                        user = %user, op = %op.id, pet = %pet,
                        "deferring appointment until its pet is synced"
                    );
                    summary.deferred += 1;
                    continue;
                }
            }

            match self.push(&op) {
                Ok(PushResult::Confirmed { conflict }) => {
                    queue.confirm(user, op.id);
                    if let OperationPayload::CreatePet(row) = &op.payload {
                        unconfirmed.remove(&row.id);
                    }
                    summary.pushed += 1;
                    let mut stats = self.stats.write();
                    stats.operations_pushed += 1;
                    if conflict {
                        stats.conflicts_absorbed += 1;
                    }
                }
                Ok(PushResult::Rejected(err)) => {
                    let attempts = queue.record_rejection(user, op.id, &err.message);
                    warn!(
                        user = %user, op = %op.id, entity = %op.entity_id(),
                        ?attempts, error = %err,
                        "remote rejected operation"
                    );
                    summary.failed += 1;
                    let mut stats = self.stats.write();
                    stats.rejections += 1;
                    stats.last_error = Some(err.to_string());
                }
                Err(err) => return self.abort(user, trigger, err, summary),
            }
        }

        let mut pulled = false;
        if self.config.reconcile_after_push {
            match reconcile::pull(self.port.as_ref(), &self.store, user) {
                Ok(rows) => {
                    summary.pulled = rows;
                    pulled = true;
                    self.stats.write().rows_pulled += rows as u64;
                }
                Err(err) if err.is_network() => return self.abort(user, trigger, err, summary),
                Err(err) => {
                    warn!(user = %user, error = %err, "reconciliation pull failed");
                }
            }
        }

        let now = Utc::now();
        if summary.pushed > 0 || pulled {
            self.store.set_cursor(user, now);
        }
        {
            let mut stats = self.stats.write();
            stats.runs_completed += 1;
            stats.last_sync_time = Some(now);
        }

        let summary = self.finish(user, summary);
        info!(
            user = %user,
            pushed = summary.pushed,
            failed = summary.failed,
            deferred = summary.deferred,
            pulled = summary.pulled,
            pending = summary.pending_operations,
            "sync completed"
        );
        Ok(summary)
    }

    /// Sends one operation; `Err` only for network failures.
    fn push(&self, op: &PendingOperation) -> RemoteResult<PushResult> {
        let result = match &op.payload {
            OperationPayload::CreatePet(row) => self.port.insert_pet(row),
            OperationPayload::CreateAppointment(row) => self.port.insert_appointment(row),
        };
        match result {
            Ok(()) => {
                debug!(op = %op.id, entity = %op.entity_id(), "pushed");
                Ok(PushResult::Confirmed { conflict: false })
            }
            Err(err) if err.is_conflict() => {
                debug!(
                    op = %op.id, entity = %op.entity_id(),
                    "already on remote, treating as pushed"
                );
                Ok(PushResult::Confirmed { conflict: true })
            }
            Err(err) if err.is_network() => Err(err),
            Err(err) => Ok(PushResult::Rejected(err)),
        }
    }

    fn abort(
        &self,
        user: &UserId,
        trigger: SyncTrigger,
        err: RemoteError,
        mut summary: SyncSummary,
    ) -> SyncResult<SyncSummary> {
        if summary.pushed > 0 {
            self.store.set_cursor(user, Utc::now());
        }
        {
            let mut stats = self.stats.write();
            stats.runs_aborted += 1;
            stats.last_error = Some(err.to_string());
        }
        match trigger {
            SyncTrigger::UserInitiated => {
                warn!(user = %user, error = %err, "sync aborted");
                Err(SyncError::Network(err))
            }
            SyncTrigger::Background => {
                warn!(
                    user = %user, error = %err,
                    "background sync aborted, will retry on next trigger"
                );
                summary.outcome = SyncOutcome::Aborted;
                Ok(self.finish(user, summary))
            }
        }
    }

    fn finish(&self, user: &UserId, mut summary: SyncSummary) -> SyncSummary {
        summary.pending_operations = self.store.queue().len(user);
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::MemoryRemote;
    use chrono::{NaiveDate, NaiveTime};
    use vetsync_core::{
        AppointmentFields, AppointmentRequest, OperationStatus, Pet, PetFields, SyncState,
    };
    use vetsync_sync_protocol::PetId;

    fn user() -> UserId {
        UserId::from("user-1")
    }

    fn engine(online: bool) -> SyncEngine<MemoryRemote> {
        SyncEngine::new(
            SyncConfig::default(),
            Arc::new(DurableStore::open_in_memory()),
            MemoryRemote::new(),
            NetworkMonitor::new(online),
        )
    }

    fn queue_pet(engine: &SyncEngine<MemoryRemote>, name: &str) -> Pet {
        let pet = Pet::create(&user(), PetFields::new(name, "dog"), Utc::now());
        let op =
            PendingOperation::insert(OperationPayload::CreatePet(pet.to_row()), pet.created_at);
        engine.store().queue().record_creation(&user(), pet.clone(), op);
        pet
    }

    fn queue_appointment(engine: &SyncEngine<MemoryRemote>, pet: PetId) -> AppointmentRequest {
        let fields = AppointmentFields::new(
            pet,
            NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
            NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            "Checkup",
        );
        let appt = AppointmentRequest::create(&user(), fields, Utc::now());
        let op = PendingOperation::insert(
            OperationPayload::CreateAppointment(appt.to_row()),
            appt.created_at,
        );
        engine.store().queue().record_creation(&user(), appt.clone(), op);
        appt
    }

    fn pet_state(engine: &SyncEngine<MemoryRemote>, pet: &Pet) -> Option<SyncState> {
        engine
            .store()
            .read(&user(), |scope| scope.pet(pet.id).map(|p| p.sync_state))
    }

    #[test]
    fn offline_run_does_nothing() {
        let engine = engine(false);
        queue_pet(&engine, "Thor");

        let summary = engine.sync(&user(), SyncTrigger::UserInitiated).unwrap();

        assert_eq!(summary.outcome, SyncOutcome::Offline);
        assert_eq!(summary.pending_operations, 1);
        assert_eq!(engine.port().insert_attempts(), 0);
    }

    #[test]
    fn drains_queue_and_sets_cursor() {
        let engine = engine(true);
        let pet = queue_pet(&engine, "Luna");
        queue_appointment(&engine, pet.id);

        let summary = engine.sync(&user(), SyncTrigger::Background).unwrap();

        assert_eq!(summary.outcome, SyncOutcome::Completed);
        assert_eq!(summary.pushed, 2);
        assert_eq!(summary.pending_operations, 0);
        assert_eq!(summary.pulled, 2);
        assert_eq!(pet_state(&engine, &pet), Some(SyncState::Synced));
        assert!(engine.store().get_cursor(&user()).is_some());
        assert_eq!(engine.stats().operations_pushed, 2);
    }

    #[test]
    fn conflict_counts_as_success() {
        let engine = engine(true);
        let pet = queue_pet(&engine, "Thor");
        engine.port().seed_pet(pet.to_row());

        let summary = engine.sync(&user(), SyncTrigger::Background).unwrap();

        assert_eq!(summary.pushed, 1);
        assert_eq!(pet_state(&engine, &pet), Some(SyncState::Synced));
        assert_eq!(engine.port().pets().len(), 1);
        assert_eq!(engine.stats().conflicts_absorbed, 1);
    }

    #[test]
    fn rejection_marks_failed_and_continues() {
        let engine = engine(true);
        let rejected = queue_pet(&engine, "Rex");
        let accepted = queue_pet(&engine, "Luna");
        engine
            .port()
            .reject_pet(rejected.id, RemoteError::from_code("42501", "permission denied"));

        let summary = engine.sync(&user(), SyncTrigger::Background).unwrap();

        assert_eq!(summary.pushed, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(pet_state(&engine, &rejected), Some(SyncState::Failed));
        assert_eq!(pet_state(&engine, &accepted), Some(SyncState::Synced));

        let ops = engine.store().queue().peek_all(&user());
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].status, OperationStatus::Failed);
        assert_eq!(ops[0].last_error.as_deref(), Some("permission denied"));
    }

    #[test]
    fn failed_operations_are_not_retried_automatically() {
        let engine = engine(true);
        let pet = queue_pet(&engine, "Rex");
        engine.port().reject_pet(pet.id, RemoteError::rejected("invalid"));
        engine.sync(&user(), SyncTrigger::Background).unwrap();
        let attempts = engine.port().insert_attempts();

        engine.sync(&user(), SyncTrigger::Background).unwrap();
        assert_eq!(engine.port().insert_attempts(), attempts);
    }

    #[test]
    fn appointment_deferred_when_pet_fails() {
        let engine = engine(true);
        let pet = queue_pet(&engine, "Rex");
        let appt = queue_appointment(&engine, pet.id);
        engine.port().reject_pet(pet.id, RemoteError::rejected("invalid species"));

        let summary = engine.sync(&user(), SyncTrigger::Background).unwrap();

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.deferred, 1);
        assert!(engine.port().appointments().is_empty());
        let state = engine.store().read(&user(), |scope| {
            scope
                .appointments
                .iter()
                .find(|a| a.id == appt.id)
                .map(|a| a.sync_state)
        });
        assert_eq!(state, Some(SyncState::Pending));
    }

    #[test]
    fn network_failure_aborts_background_run() {
        let engine = engine(true);
        let first = queue_pet(&engine, "Thor");
        let second = queue_pet(&engine, "Luna");
        engine.port().fail_next_insert(RemoteError::network("timeout"));

        let summary = engine.sync(&user(), SyncTrigger::Background).unwrap();

        assert_eq!(summary.outcome, SyncOutcome::Aborted);
        assert_eq!(summary.pending_operations, 2);
        assert_eq!(pet_state(&engine, &first), Some(SyncState::Pending));
        assert_eq!(pet_state(&engine, &second), Some(SyncState::Pending));
        assert!(engine.store().get_cursor(&user()).is_none());
        assert!(!engine.is_syncing(&user()));
        assert_eq!(engine.stats().runs_aborted, 1);
    }

    #[test]
    fn partial_run_still_advances_cursor() {
        let engine = engine(true);
        let pet = queue_pet(&engine, "Thor");
        engine
            .port()
            .fail_next_select(RemoteError::network("connection reset"));

        let summary = engine.sync(&user(), SyncTrigger::Background).unwrap();

        assert_eq!(summary.outcome, SyncOutcome::Aborted);
        assert_eq!(summary.pushed, 1);
        assert_eq!(summary.pending_operations, 0);
        assert_eq!(pet_state(&engine, &pet), Some(SyncState::Synced));
        assert!(engine.store().get_cursor(&user()).is_some());
    }

    #[test]
    fn cursor_advances_when_later_insert_fails() {
        let engine = engine(true);
        let first = queue_pet(&engine, "Thor");
        let second = queue_pet(&engine, "Luna");
        engine
            .port()
            .reject_pet(second.id, RemoteError::network("timeout"));

        let err = engine.sync(&user(), SyncTrigger::UserInitiated).unwrap_err();

        assert!(err.is_retryable());
        assert_eq!(pet_state(&engine, &first), Some(SyncState::Synced));
        assert_eq!(pet_state(&engine, &second), Some(SyncState::Pending));
        assert!(engine.store().get_cursor(&user()).is_some());
    }

    #[test]
    fn network_failure_surfaces_for_user_initiated_run() {
        let engine = engine(true);
        queue_pet(&engine, "Thor");
        engine.port().set_reachable(false);

        let err = engine.sync(&user(), SyncTrigger::UserInitiated).unwrap_err();

        assert!(err.is_retryable());
        assert!(!engine.is_syncing(&user()));
        assert_eq!(engine.store().queue().len(&user()), 1);
    }

    #[test]
    fn pull_failure_other_than_network_keeps_pushes() {
        let engine = engine(true);
        let pet = queue_pet(&engine, "Thor");
        engine
            .port()
            .fail_next_select(RemoteError::from_code("42P01", "relation does not exist"));

        let summary = engine.sync(&user(), SyncTrigger::UserInitiated).unwrap();

        assert_eq!(summary.outcome, SyncOutcome::Completed);
        assert_eq!(summary.pulled, 0);
        assert_eq!(pet_state(&engine, &pet), Some(SyncState::Synced));
        assert!(engine.store().get_cursor(&user()).is_some());
    }

    #[test]
    fn reconcile_can_be_disabled() {
        let engine = SyncEngine::new(
            SyncConfig::default().with_reconcile_after_push(false),
            Arc::new(DurableStore::open_in_memory()),
            MemoryRemote::new(),
            NetworkMonitor::new(true),
        );
        let summary = engine.sync(&user(), SyncTrigger::Background).unwrap();

        assert_eq!(summary.pulled, 0);
        assert!(engine.store().get_cursor(&user()).is_none());
    }

    #[test]
    fn empty_queue_with_pull_sets_cursor() {
        let engine = engine(true);
        let summary = engine.sync(&user(), SyncTrigger::Background).unwrap();
        assert_eq!(summary.outcome, SyncOutcome::Completed);
        assert!(engine.store().get_cursor(&user()).is_some());
    }
}
