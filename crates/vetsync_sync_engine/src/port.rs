//! Remote data service abstraction.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use uuid::Uuid;
use vetsync_sync_protocol::{
    AppointmentId, AppointmentRow, PetId, PetRow, RemoteError, RemoteResult, SelectQuery,
    SortOrder,
};

/// Backend code for a foreign-key violation (PostgreSQL `23503`).
pub const FOREIGN_KEY_VIOLATION: &str = "23503";

/// The remote data service the engine pushes to and pulls from.
///
/// Inserts carry the client-generated id as primary key. A service that
/// already holds a row with that id must answer with a
/// [`Conflict`](vetsync_sync_protocol::RemoteErrorKind::Conflict).
///
/// Calls are blocking; the engine never holds a store lock across them.
pub trait RemoteDataPort: Send + Sync {
    /// Inserts a pet row.
    fn insert_pet(&self, row: &PetRow) -> RemoteResult<()>;

    /// Inserts an appointment request row.
    fn insert_appointment(&self, row: &AppointmentRow) -> RemoteResult<()>;

    /// Selects a user's pets.
    fn select_pets(&self, query: &SelectQuery) -> RemoteResult<Vec<PetRow>>;

    /// Selects a user's appointment requests.
    fn select_appointments(&self, query: &SelectQuery) -> RemoteResult<Vec<AppointmentRow>>;
}

impl<P: RemoteDataPort + ?Sized> RemoteDataPort for Arc<P> {
    fn insert_pet(&self, row: &PetRow) -> RemoteResult<()> {
        (**self).insert_pet(row)
    }

    fn insert_appointment(&self, row: &AppointmentRow) -> RemoteResult<()> {
        (**self).insert_appointment(row)
    }

    fn select_pets(&self, query: &SelectQuery) -> RemoteResult<Vec<PetRow>> {
        (**self).select_pets(query)
    }

    fn select_appointments(&self, query: &SelectQuery) -> RemoteResult<Vec<AppointmentRow>> {
        (**self).select_appointments(query)
    }
}

/// An in-memory remote service for tests and demos.
///
/// Enforces unique primary keys and the appointment → pet reference, and
/// can be told to fail in the ways a hosted backend does:
///
/// - [`set_reachable(false)`](Self::set_reachable): every call is a network failure
/// - [`fail_next_insert`](Self::fail_next_insert): one-shot error for the next insert
/// - [`lose_next_reply`](Self::lose_next_reply): the next insert commits but its reply is lost
/// - [`reject_pet`](Self::reject_pet) / [`reject_appointment`](Self::reject_appointment):
///   persistent rejection of one row
/// - [`pause_next_insert`](Self::pause_next_insert): blocks an insert until released
#[derive(Debug, Default)]
pub struct MemoryRemote {
    pets: Mutex<Vec<PetRow>>,
    appointments: Mutex<Vec<AppointmentRow>>,
    faults: Mutex<Faults>,
    insert_attempts: AtomicU64,
}

#[derive(Debug, Default)]
struct Faults {
    unreachable: bool,
    allow_dangling_pets: bool,
    next_insert: VecDeque<RemoteError>,
    lose_next_reply: bool,
    next_select: Option<RemoteError>,
    rejected: HashMap<Uuid, RemoteError>,
    pause: Option<PauseHook>,
}

#[derive(Debug)]
struct PauseHook {
    entered: Sender<()>,
    release: Receiver<()>,
}

/// Test handle for an insert paused with [`MemoryRemote::pause_next_insert`].
#[derive(Debug)]
pub struct PausedInsert {
    entered: Receiver<()>,
    release: Sender<()>,
}

impl PausedInsert {
    /// Blocks until the paused insert has started.
    pub fn wait_entered(&self) {
        let _ = self.entered.recv();
    }

    /// Lets the paused insert continue.
    pub fn release(self) {
        let _ = self.release.send(());
    }
}

impl MemoryRemote {
    /// Creates an empty, reachable remote.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every call fail with a network error while `false`.
    pub fn set_reachable(&self, reachable: bool) {
        self.faults.lock().unreachable = !reachable;
    }

    /// Accepts appointments whose pet row does not exist.
    pub fn allow_dangling_pets(&self, allow: bool) {
        self.faults.lock().allow_dangling_pets = allow;
    }

    /// Fails the next insert with `error`. Calls queue up.
    pub fn fail_next_insert(&self, error: RemoteError) {
        self.faults.lock().next_insert.push_back(error);
    }

    /// Commits the next insert but reports a network failure.
    pub fn lose_next_reply(&self) {
        self.faults.lock().lose_next_reply = true;
    }

    /// Fails the next select with `error`.
    pub fn fail_next_select(&self, error: RemoteError) {
        self.faults.lock().next_select = Some(error);
    }

    /// Rejects every insert of this pet with `error`.
    pub fn reject_pet(&self, id: PetId, error: RemoteError) {
        self.faults.lock().rejected.insert(id.as_uuid(), error);
    }

    /// Rejects every insert of this appointment with `error`.
    pub fn reject_appointment(&self, id: AppointmentId, error: RemoteError) {
        self.faults.lock().rejected.insert(id.as_uuid(), error);
    }

    /// Stops rejecting rows.
    pub fn clear_rejections(&self) {
        self.faults.lock().rejected.clear();
    }

    /// Blocks the next insert until the returned handle is released.
    pub fn pause_next_insert(&self) -> PausedInsert {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        self.faults.lock().pause = Some(PauseHook {
            entered: entered_tx,
            release: release_rx,
        });
        PausedInsert {
            entered: entered_rx,
            release: release_tx,
        }
    }

    /// Stores a pet row directly, bypassing faults.
    pub fn seed_pet(&self, row: PetRow) {
        self.pets.lock().push(row);
    }

    /// Stores an appointment row directly, bypassing faults.
    pub fn seed_appointment(&self, row: AppointmentRow) {
        self.appointments.lock().push(row);
    }

    /// All stored pet rows.
    pub fn pets(&self) -> Vec<PetRow> {
        self.pets.lock().clone()
    }

    /// All stored appointment rows.
    pub fn appointments(&self) -> Vec<AppointmentRow> {
        self.appointments.lock().clone()
    }

    /// Number of insert calls received, failed ones included.
    pub fn insert_attempts(&self) -> u64 {
        self.insert_attempts.load(Ordering::SeqCst)
    }

    /// Applies injected faults for an insert of `id`.
    ///
    /// `Ok(true)` means the insert should commit and then report a lost reply.
    fn before_insert(&self, id: Uuid) -> RemoteResult<bool> {
        self.insert_attempts.fetch_add(1, Ordering::SeqCst);

        let pause = self.faults.lock().pause.take();
        if let Some(hook) = pause {
            let _ = hook.entered.send(());
            let _ = hook.release.recv();
        }

        let mut faults = self.faults.lock();
        if faults.unreachable {
            return Err(RemoteError::network("remote unreachable"));
        }
        if let Some(error) = faults.next_insert.pop_front() {
            return Err(error);
        }
        if let Some(error) = faults.rejected.get(&id) {
            return Err(error.clone());
        }
        Ok(std::mem::take(&mut faults.lose_next_reply))
    }

    fn before_select(&self) -> RemoteResult<()> {
        let mut faults = self.faults.lock();
        if faults.unreachable {
            return Err(RemoteError::network("remote unreachable"));
        }
        match faults.next_select.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

fn lost_reply<T>(result: RemoteResult<T>, lost: bool) -> RemoteResult<T> {
    match result {
        Ok(_) if lost => Err(RemoteError::network("connection reset before reply")),
        other => other,
    }
}

fn sorted<T>(mut rows: Vec<T>, order: SortOrder, key: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
    rows.sort_by_key(|row| key(row));
    if order == SortOrder::Descending {
        rows.reverse();
    }
    rows
}

impl RemoteDataPort for MemoryRemote {
    fn insert_pet(&self, row: &PetRow) -> RemoteResult<()> {
        let lost = self.before_insert(row.id.as_uuid())?;
        let mut pets = self.pets.lock();
        let result = if pets.iter().any(|p| p.id == row.id) {
            Err(RemoteError::conflict(
                "duplicate key value violates unique constraint \"pets_pkey\"",
            ))
        } else {
            pets.push(row.clone());
            Ok(())
        };
        lost_reply(result, lost)
    }

    fn insert_appointment(&self, row: &AppointmentRow) -> RemoteResult<()> {
        let lost = self.before_insert(row.id.as_uuid())?;
        let allow_dangling = self.faults.lock().allow_dangling_pets;
        if !allow_dangling && !self.pets.lock().iter().any(|p| p.id == row.pet_id) {
            return Err(RemoteError::from_code(
                FOREIGN_KEY_VIOLATION,
                "insert violates foreign key constraint \"appointment_requests_pet_id_fkey\"",
            ));
        }

        let mut appointments = self.appointments.lock();
        let result = if appointments.iter().any(|a| a.id == row.id) {
            Err(RemoteError::conflict(
                "duplicate key value violates unique constraint \"appointment_requests_pkey\"",
            ))
        } else {
            appointments.push(row.clone());
            Ok(())
        };
        lost_reply(result, lost)
    }

    fn select_pets(&self, query: &SelectQuery) -> RemoteResult<Vec<PetRow>> {
        self.before_select()?;
        let rows: Vec<PetRow> = self
            .pets
            .lock()
            .iter()
            .filter(|p| p.user_id == query.user_id)
            .cloned()
            .collect();
        Ok(sorted(rows, query.order, |p: &PetRow| p.created_at))
    }

    fn select_appointments(&self, query: &SelectQuery) -> RemoteResult<Vec<AppointmentRow>> {
        self.before_select()?;
        let rows: Vec<AppointmentRow> = self
            .appointments
            .lock()
            .iter()
            .filter(|a| a.user_id == query.user_id)
            .cloned()
            .collect();
        Ok(sorted(rows, query.order, |a: &AppointmentRow| a.created_at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, NaiveTime};
    use vetsync_sync_protocol::{RemoteErrorKind, UserId};

    fn pet_row(user: &str) -> PetRow {
        let now = Utc::now();
        PetRow {
            id: PetId::generate(),
            user_id: UserId::from(user),
            name: "Thor".into(),
            species: "dog".into(),
            breed: None,
            age: None,
            weight: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn appointment_row(pet: &PetRow) -> AppointmentRow {
        AppointmentRow {
            id: AppointmentId::generate(),
            user_id: pet.user_id.clone(),
            pet_id: pet.id,
            preferred_date: NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
            preferred_time: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            reason: "Checkup".into(),
            notes: None,
            status: "pending".into(),
            created_at: pet.created_at,
            updated_at: pet.created_at,
        }
    }

    #[test]
    fn duplicate_insert_is_conflict() {
        let remote = MemoryRemote::new();
        let row = pet_row("user-1");
        remote.insert_pet(&row).unwrap();

        let err = remote.insert_pet(&row).unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(remote.pets().len(), 1);
        assert_eq!(remote.insert_attempts(), 2);
    }

    #[test]
    fn appointment_requires_pet() {
        let remote = MemoryRemote::new();
        let pet = pet_row("user-1");
        let appt = appointment_row(&pet);

        let err = remote.insert_appointment(&appt).unwrap_err();
        assert_eq!(err.kind, RemoteErrorKind::Rejected);
        assert_eq!(err.code.as_deref(), Some(FOREIGN_KEY_VIOLATION));

        remote.insert_pet(&pet).unwrap();
        remote.insert_appointment(&appt).unwrap();
        assert_eq!(remote.appointments().len(), 1);
    }

    #[test]
    fn unreachable_remote_fails_everything() {
        let remote = MemoryRemote::new();
        remote.set_reachable(false);
        assert!(remote.insert_pet(&pet_row("user-1")).unwrap_err().is_network());
        let query = SelectQuery::for_user(UserId::from("user-1"));
        assert!(remote.select_pets(&query).unwrap_err().is_network());
        assert!(remote.pets().is_empty());
    }

    #[test]
    fn lost_reply_still_commits() {
        let remote = MemoryRemote::new();
        let row = pet_row("user-1");
        remote.lose_next_reply();

        assert!(remote.insert_pet(&row).unwrap_err().is_network());
        assert_eq!(remote.pets().len(), 1);
        assert!(remote.insert_pet(&row).unwrap_err().is_conflict());
    }

    #[test]
    fn one_shot_failures() {
        let remote = MemoryRemote::new();
        remote.fail_next_insert(RemoteError::rejected("check constraint"));
        assert!(remote.insert_pet(&pet_row("user-1")).is_err());
        assert!(remote.insert_pet(&pet_row("user-1")).is_ok());
    }

    #[test]
    fn select_filters_by_user_and_orders() {
        let remote = MemoryRemote::new();
        let mut older = pet_row("user-1");
        older.created_at -= Duration::minutes(5);
        let newer = pet_row("user-1");
        remote.seed_pet(older.clone());
        remote.seed_pet(newer.clone());
        remote.seed_pet(pet_row("user-2"));

        let query = SelectQuery::for_user(UserId::from("user-1"));
        let rows = remote.select_pets(&query).unwrap();
        assert_eq!(rows.iter().map(|p| p.id).collect::<Vec<_>>(), vec![newer.id, older.id]);

        let rows = remote
            .select_pets(&query.with_order(SortOrder::Ascending))
            .unwrap();
        assert_eq!(rows[0].id, older.id);
    }

    #[test]
    fn paused_insert_waits_for_release() {
        let remote = Arc::new(MemoryRemote::new());
        let paused = remote.pause_next_insert();
        let row = pet_row("user-1");

        let worker = {
            let remote = Arc::clone(&remote);
            let row = row.clone();
            std::thread::spawn(move || remote.insert_pet(&row))
        };

        paused.wait_entered();
        assert!(remote.pets().is_empty());
        paused.release();

        worker.join().unwrap().unwrap();
        assert_eq!(remote.pets().len(), 1);
    }
}
