//! Durable per-user store with a session-scoped memory fallback.

use crate::config::StoreConfig;
use crate::error::CoreResult;
use crate::model::LocalEntity;
use crate::operation::PendingOperation;
use crate::queue::OperationQueue;
use crate::scope::UserScope;
use crate::snapshot::ClientPortalSnapshot;
use crate::types::OperationId;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use tracing::{debug, warn};
use vetsync_codec::{decode_record, encode_record};
use vetsync_storage::{FileBackend, InMemoryBackend, StorageBackend};
use vetsync_sync_protocol::UserId;

/// Persists every user's [`UserScope`] and never fails its callers.
///
/// Each scope is one record in the backend, encoded with `vetsync_codec`.
/// Alongside the backend the store keeps a memory mirror of every scope
/// touched in this session:
///
/// - every write lands in the mirror first, then in the backend
/// - the first backend failure (read, write or decode) marks the store
///   *degraded*; from then on it serves and accepts everything from the
///   mirror only
///
/// The degraded state lasts for the rest of the session (or until
/// [`clear_memory_fallback_for_tests`](Self::clear_memory_fallback_for_tests)).
///
/// All access to a scope goes through one mutex, so a read-modify-write
/// through [`mutate`](Self::mutate) never loses a concurrent update.
///
/// # Example
///
/// ```rust
/// use vetsync_core::DurableStore;
/// use vetsync_sync_protocol::UserId;
///
/// let store = DurableStore::open_in_memory();
/// let user = UserId::from("user-1");
/// store.set_cursor(&user, chrono::Utc::now());
/// assert!(store.get_cursor(&user).is_some());
/// ```
pub struct DurableStore {
    config: StoreConfig,
    inner: Mutex<Inner>,
}

struct Inner {
    backend: Box<dyn StorageBackend>,
    mirror: HashMap<UserId, UserScope>,
    degraded: bool,
}

impl DurableStore {
    /// Opens a file-backed store in `path`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Fails if the directory cannot be created or is locked by another
    /// process. Once open, the store never returns storage errors.
    pub fn open(path: &Path) -> CoreResult<Self> {
        Self::open_with_config(path, StoreConfig::default())
    }

    /// Opens a file-backed store with custom configuration.
    pub fn open_with_config(path: &Path, config: StoreConfig) -> CoreResult<Self> {
        let backend = FileBackend::open(path)?;
        Ok(Self::open_with_backend(backend, config))
    }

    /// Creates a store over a fresh in-memory backend.
    #[must_use]
    pub fn open_in_memory() -> Self {
        Self::open_with_backend(InMemoryBackend::new(), StoreConfig::default())
    }

    /// Creates a store over any backend.
    pub fn open_with_backend(backend: impl StorageBackend + 'static, config: StoreConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(Inner {
                backend: Box::new(backend),
                mirror: HashMap::new(),
                degraded: false,
            }),
        }
    }

    /// Returns the store configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Returns true once the store has fallen back to memory.
    pub fn is_degraded(&self) -> bool {
        self.inner.lock().degraded
    }

    /// Runs `f` on the user's scope and persists the result, atomically.
    pub fn mutate<R>(&self, user: &UserId, f: impl FnOnce(&mut UserScope) -> R) -> R {
        let mut inner = self.inner.lock();
        let key = self.config.user_key(user.as_str());
        let mut scope = inner.load(user, &key);
        let result = f(&mut scope);
        inner.persist(user, &key, scope);
        result
    }

    /// Runs `f` on a consistent view of the user's scope.
    pub fn read<R>(&self, user: &UserId, f: impl FnOnce(&UserScope) -> R) -> R {
        let mut inner = self.inner.lock();
        let key = self.config.user_key(user.as_str());
        let scope = inner.load(user, &key);
        f(&scope)
    }

    /// Upserts an entity by id.
    pub fn write<E: LocalEntity>(&self, user: &UserId, entity: E) {
        self.mutate(user, |scope| scope.upsert(entity));
    }

    /// Returns every entity of one kind in insertion order.
    pub fn read_all<E: LocalEntity>(&self, user: &UserId) -> Vec<E> {
        self.read(user, |scope| E::rows(scope).to_vec())
    }

    /// Appends an operation to the user's queue.
    pub fn append_operation(&self, user: &UserId, op: PendingOperation) {
        self.mutate(user, |scope| scope.operations.push(op));
    }

    /// Removes an operation; returns false if it was not queued.
    pub fn remove_operation(&self, user: &UserId, id: OperationId) -> bool {
        self.mutate(user, |scope| {
            let before = scope.operations.len();
            scope.operations.retain(|op| op.id != id);
            scope.operations.len() != before
        })
    }

    /// Returns the user's operations in insertion order.
    pub fn list_operations(&self, user: &UserId) -> Vec<PendingOperation> {
        self.read(user, |scope| scope.operations.clone())
    }

    /// Returns the time of the user's last successful sync.
    pub fn get_cursor(&self, user: &UserId) -> Option<DateTime<Utc>> {
        self.read(user, |scope| scope.last_synced_at)
    }

    /// Records a successful sync.
    pub fn set_cursor(&self, user: &UserId, at: DateTime<Utc>) {
        self.mutate(user, |scope| scope.last_synced_at = Some(at));
    }

    /// Returns a queue view over this store.
    pub fn queue(&self) -> OperationQueue<'_> {
        OperationQueue::new(self)
    }

    /// Assembles the read model for the user's portal.
    pub fn snapshot(&self, user: &UserId) -> ClientPortalSnapshot {
        self.read(user, ClientPortalSnapshot::assemble)
    }

    /// Lists the users with stored state, in order.
    pub fn users(&self) -> Vec<UserId> {
        let mut inner = self.inner.lock();
        let mut users: BTreeSet<UserId> = inner
            .mirror
            .iter()
            .filter(|(_, scope)| !scope.is_empty())
            .map(|(user, _)| user.clone())
            .collect();
        for key in inner.backend_keys() {
            if let Some(user) = self.config.user_from_key(&key) {
                users.insert(UserId::from(user));
            }
        }
        users.into_iter().collect()
    }

    /// Clears all state for one user.
    pub fn reset(&self, user: &UserId) {
        let mut inner = self.inner.lock();
        let key = self.config.user_key(user.as_str());
        inner.mirror.remove(user);
        if !inner.degraded {
            match inner.backend.remove(&key) {
                Ok(()) => inner.flush(&key),
                Err(e) => inner.degrade(&format!("remove {key}: {e}")),
            }
        }
        debug!(user = %user, "reset local-first state");
    }

    /// Clears every user's state in the mirror and in the backend, and leaves
    /// degraded mode.
    ///
    /// If the backend still fails, the store degrades again and starts from
    /// an empty mirror.
    pub fn reset_all_for_tests(&self) {
        let mut inner = self.inner.lock();
        inner.mirror.clear();
        inner.degraded = false;
        let mut removed = false;
        for key in inner.backend_keys() {
            if self.config.user_from_key(&key).is_none() {
                continue;
            }
            match inner.backend.remove(&key) {
                Ok(()) => removed = true,
                Err(e) => inner.degrade(&format!("remove {key}: {e}")),
            }
        }
        if removed {
            inner.flush("reset");
        }
    }

    /// Drops the memory mirror and leaves degraded mode.
    ///
    /// Persisted records are kept: the next access reads them from the
    /// backend, as after a restart.
    pub fn clear_memory_fallback_for_tests(&self) {
        let mut inner = self.inner.lock();
        inner.mirror.clear();
        inner.degraded = false;
    }
}

impl Inner {
    fn load(&mut self, user: &UserId, key: &str) -> UserScope {
        if let Some(scope) = self.mirror.get(user) {
            return scope.clone();
        }
        if self.degraded {
            return UserScope::default();
        }

        let scope = match self.backend.read(key) {
            Ok(Some(bytes)) => match decode_record::<UserScope>(&bytes) {
                Ok(scope) => scope,
                Err(e) => {
                    self.degrade(&format!("decode {key}: {e}"));
                    UserScope::default()
                }
            },
            Ok(None) => UserScope::default(),
            Err(e) => {
                self.degrade(&format!("read {key}: {e}"));
                UserScope::default()
            }
        };
        self.mirror.insert(user.clone(), scope.clone());
        scope
    }

    fn persist(&mut self, user: &UserId, key: &str, scope: UserScope) {
        let encoded = if self.degraded {
            None
        } else {
            match encode_record(&scope) {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    self.degrade(&format!("encode {key}: {e}"));
                    None
                }
            }
        };
        self.mirror.insert(user.clone(), scope);

        if let Some(bytes) = encoded {
            match self.backend.write(key, &bytes) {
                Ok(()) => self.flush(key),
                Err(e) => self.degrade(&format!("write {key}: {e}")),
            }
        }
    }

    /// Makes completed writes and removals durable.
    fn flush(&mut self, key: &str) {
        if let Err(e) = self.backend.sync() {
            self.degrade(&format!("sync after {key}: {e}"));
        }
    }

    /// Backend keys, or none once degraded.
    fn backend_keys(&mut self) -> Vec<String> {
        if self.degraded {
            return Vec::new();
        }
        match self.backend.keys() {
            Ok(keys) => keys,
            Err(e) => {
                self.degrade(&format!("list keys: {e}"));
                Vec::new()
            }
        }
    }

    fn degrade(&mut self, reason: &str) {
        if !self.degraded {
            warn!(
                %reason,
                "persistent storage unavailable, falling back to memory for this session"
            );
        }
        self.degraded = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Pet, PetFields};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use vetsync_storage::{FaultInjectingBackend, StorageResult};

    fn user() -> UserId {
        UserId::from("user-1")
    }

    fn pet(name: &str) -> Pet {
        Pet::create(&user(), PetFields::new(name, "dog"), Utc::now())
    }

    #[test]
    fn write_and_read_all() {
        let store = DurableStore::open_in_memory();
        let thor = pet("Thor");
        store.write(&user(), thor.clone());
        store.write(&user(), thor.clone());
        store.write(&user(), pet("Luna"));

        let pets: Vec<Pet> = store.read_all(&user());
        assert_eq!(pets.len(), 2);
        assert_eq!(pets[0], thor);
    }

    #[test]
    fn scopes_are_isolated() {
        let store = DurableStore::open_in_memory();
        store.write(&user(), pet("Thor"));
        assert!(store.read_all::<Pet>(&UserId::from("user-2")).is_empty());
    }

    #[test]
    fn cursor_round_trip() {
        let store = DurableStore::open_in_memory();
        assert!(store.get_cursor(&user()).is_none());
        let now = Utc::now();
        store.set_cursor(&user(), now);
        assert_eq!(store.get_cursor(&user()), Some(now));
    }

    #[test]
    fn reset_clears_one_user() {
        let store = DurableStore::open_in_memory();
        let other = UserId::from("user-2");
        store.write(&user(), pet("Thor"));
        store.write(&other, pet("Luna"));

        store.reset(&user());

        assert!(store.read(&user(), UserScope::is_empty));
        assert_eq!(store.read_all::<Pet>(&other).len(), 1);
    }

    #[test]
    fn write_failure_falls_back_to_memory() {
        let backend = FaultInjectingBackend::new(InMemoryBackend::new());
        let faults = backend.faults();
        let store = DurableStore::open_with_backend(backend, StoreConfig::default());

        faults.fail_writes(true);
        store.write(&user(), pet("Thor"));

        assert!(store.is_degraded());
        assert_eq!(store.read_all::<Pet>(&user()).len(), 1);

        faults.fail_writes(false);
        store.write(&user(), pet("Luna"));
        assert!(store.is_degraded());
        assert_eq!(store.read_all::<Pet>(&user()).len(), 2);
    }

    #[test]
    fn read_failure_falls_back_to_memory() {
        let backend = FaultInjectingBackend::new(InMemoryBackend::new());
        backend.faults().fail_reads(true);
        let store = DurableStore::open_with_backend(backend, StoreConfig::default());

        assert!(store.read_all::<Pet>(&user()).is_empty());
        assert!(store.is_degraded());

        store.write(&user(), pet("Thor"));
        assert_eq!(store.read_all::<Pet>(&user()).len(), 1);
    }

    #[test]
    fn corrupted_record_falls_back_to_memory() {
        let config = StoreConfig::default();
        let backend =
            InMemoryBackend::with_records([(config.user_key("user-1"), b"garbage".to_vec())]);
        let store = DurableStore::open_with_backend(backend, config);

        assert!(store.read(&user(), UserScope::is_empty));
        assert!(store.is_degraded());
    }

    #[test]
    fn clear_memory_fallback_rereads_backend() {
        let store = DurableStore::open_in_memory();
        store.write(&user(), pet("Thor"));
        store.clear_memory_fallback_for_tests();

        assert!(!store.is_degraded());
        assert_eq!(store.read_all::<Pet>(&user()).len(), 1);
    }

    #[test]
    fn clear_memory_fallback_leaves_degraded_mode() {
        let backend = FaultInjectingBackend::new(InMemoryBackend::new());
        let faults = backend.faults();
        let store = DurableStore::open_with_backend(backend, StoreConfig::default());
        store.write(&user(), pet("Thor"));

        faults.fail_writes(true);
        store.write(&user(), pet("Luna"));
        assert!(store.is_degraded());

        faults.fail_writes(false);
        store.clear_memory_fallback_for_tests();
        assert!(!store.is_degraded());
        // Only the write made before degrading was persisted.
        assert_eq!(store.read_all::<Pet>(&user()).len(), 1);

        store.write(&user(), pet("Bolt"));
        store.clear_memory_fallback_for_tests();
        assert!(!store.is_degraded());
        assert_eq!(store.read_all::<Pet>(&user()).len(), 2);
    }

    #[test]
    fn reset_all_leaves_degraded_mode_and_clears_backend() {
        let backend = FaultInjectingBackend::new(InMemoryBackend::new());
        let faults = backend.faults();
        let store = DurableStore::open_with_backend(backend, StoreConfig::default());
        store.write(&user(), pet("Thor"));
        faults.fail_writes(true);
        store.write(&user(), pet("Luna"));
        assert!(store.is_degraded());

        faults.fail_writes(false);
        store.reset_all_for_tests();

        assert!(!store.is_degraded());
        assert!(store.users().is_empty());
        store.clear_memory_fallback_for_tests();
        assert!(store.read(&user(), UserScope::is_empty));

        store.write(&user(), pet("Bolt"));
        store.clear_memory_fallback_for_tests();
        assert_eq!(store.read_all::<Pet>(&user()).len(), 1);
    }

    /// Counts `sync` calls on an in-memory backend.
    struct SyncCounting {
        inner: InMemoryBackend,
        syncs: Arc<AtomicUsize>,
    }

    impl StorageBackend for SyncCounting {
        fn read(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
            self.inner.read(key)
        }

        fn write(&mut self, key: &str, data: &[u8]) -> StorageResult<()> {
            self.inner.write(key, data)
        }

        fn remove(&mut self, key: &str) -> StorageResult<()> {
            self.inner.remove(key)
        }

        fn keys(&self) -> StorageResult<Vec<String>> {
            self.inner.keys()
        }

        fn sync(&mut self) -> StorageResult<()> {
            self.syncs.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn writes_and_removals_are_synced() {
        let syncs = Arc::new(AtomicUsize::new(0));
        let backend = SyncCounting {
            inner: InMemoryBackend::new(),
            syncs: Arc::clone(&syncs),
        };
        let store = DurableStore::open_with_backend(backend, StoreConfig::default());

        store.write(&user(), pet("Thor"));
        assert_eq!(syncs.load(Ordering::SeqCst), 1);

        store.reset(&user());
        assert_eq!(syncs.load(Ordering::SeqCst), 2);

        store.write(&user(), pet("Luna"));
        store.reset_all_for_tests();
        assert_eq!(syncs.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn users_lists_stored_scopes() {
        let store = DurableStore::open_in_memory();
        store.write(&UserId::from("b"), pet("Thor"));
        store.write(&UserId::from("a"), pet("Luna"));
        assert_eq!(store.users(), vec![UserId::from("a"), UserId::from("b")]);

        store.reset_all_for_tests();
        assert!(store.users().is_empty());
    }
}
