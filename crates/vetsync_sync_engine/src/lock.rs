//! Per-user sync exclusion.

use parking_lot::Mutex;
use std::collections::HashSet;
use vetsync_sync_protocol::UserId;

/// The set of users with a sync run in progress.
#[derive(Debug, Default)]
pub(crate) struct SyncLocks {
    held: Mutex<HashSet<UserId>>,
}

impl SyncLocks {
    /// Takes the user's lock, or `None` if a run already holds it.
    pub(crate) fn try_acquire(&self, user: &UserId) -> Option<SyncGuard<'_>> {
        if !self.held.lock().insert(user.clone()) {
            return None;
        }
        Some(SyncGuard {
            locks: self,
            user: user.clone(),
        })
    }

    pub(crate) fn is_held(&self, user: &UserId) -> bool {
        self.held.lock().contains(user)
    }
}

/// Releases the user's lock when dropped, on every exit path of a run.
#[derive(Debug)]
pub(crate) struct SyncGuard<'a> {
    locks: &'a SyncLocks,
    user: UserId,
}

impl Drop for SyncGuard<'_> {
    fn drop(&mut self) {
        self.locks.held.lock().remove(&self.user);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_until_release() {
        let locks = SyncLocks::default();
        let user = UserId::from("user-1");

        let guard = locks.try_acquire(&user).unwrap();
        assert!(locks.try_acquire(&user).is_none());
        assert!(locks.is_held(&user));

        drop(guard);
        assert!(!locks.is_held(&user));
        assert!(locks.try_acquire(&user).is_some());
    }

    #[test]
    fn users_are_independent() {
        let locks = SyncLocks::default();
        let _a = locks.try_acquire(&UserId::from("a")).unwrap();
        assert!(locks.try_acquire(&UserId::from("b")).is_some());
    }

    #[test]
    fn released_on_panic() {
        let locks = SyncLocks::default();
        let user = UserId::from("user-1");
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = locks.try_acquire(&user).unwrap();
            panic!("run failed");
        }));
        assert!(result.is_err());
        assert!(!locks.is_held(&user));
    }
}
