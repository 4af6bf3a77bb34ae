//! Fault-injecting backend wrapper for failure tests.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared toggles controlling a [`FaultInjectingBackend`].
///
/// Cloning the switch yields a handle to the same toggles, so a test can
/// keep one while the backend itself is moved into a store.
#[derive(Debug, Clone, Default)]
pub struct FaultSwitch {
    fail_reads: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
}

impl FaultSwitch {
    /// Makes every subsequent read (and key listing) fail.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent write, remove and sync fail.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Makes every operation fail.
    pub fn fail_all(&self, fail: bool) {
        self.fail_reads(fail);
        self.fail_writes(fail);
    }

    fn check_read(&self) -> StorageResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("injected read failure".into()));
        }
        Ok(())
    }

    fn check_write(&self) -> StorageResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("quota exceeded (injected)".into()));
        }
        Ok(())
    }
}

/// A backend wrapper that fails on demand.
///
/// Emulates platform storage that throws: quota exceeded, storage disabled
/// by policy, private browsing mode. Operations that are not failing are
/// passed through to the wrapped backend unchanged.
///
/// # Example
///
/// ```rust
/// use vetsync_storage::{FaultInjectingBackend, InMemoryBackend, StorageBackend};
///
/// let mut backend = FaultInjectingBackend::new(InMemoryBackend::new());
/// backend.faults().fail_writes(true);
/// assert!(backend.write("k", b"v").is_err());
/// ```
#[derive(Debug)]
pub struct FaultInjectingBackend<B> {
    inner: B,
    switch: FaultSwitch,
}

impl<B: StorageBackend> FaultInjectingBackend<B> {
    /// Wraps `inner` with all faults disabled.
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            switch: FaultSwitch::default(),
        }
    }

    /// Returns a handle to this backend's fault toggles.
    #[must_use]
    pub fn faults(&self) -> FaultSwitch {
        self.switch.clone()
    }

    /// Returns the wrapped backend.
    pub fn inner(&self) -> &B {
        &self.inner
    }
}

impl<B: StorageBackend> StorageBackend for FaultInjectingBackend<B> {
    fn read(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        self.switch.check_read()?;
        self.inner.read(key)
    }

    fn write(&mut self, key: &str, data: &[u8]) -> StorageResult<()> {
        self.switch.check_write()?;
        self.inner.write(key, data)
    }

    fn remove(&mut self, key: &str) -> StorageResult<()> {
        self.switch.check_write()?;
        self.inner.remove(key)
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        self.switch.check_read()?;
        self.inner.keys()
    }

    fn sync(&mut self) -> StorageResult<()> {
        self.switch.check_write()?;
        self.inner.sync()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryBackend;

    #[test]
    fn passes_through_when_healthy() {
        let mut backend = FaultInjectingBackend::new(InMemoryBackend::new());
        backend.write("k", b"v").unwrap();
        assert_eq!(backend.read("k").unwrap().unwrap(), b"v");
    }

    #[test]
    fn failed_write_leaves_inner_untouched() {
        let mut backend = FaultInjectingBackend::new(InMemoryBackend::new());
        let faults = backend.faults();

        faults.fail_writes(true);
        assert!(matches!(
            backend.write("k", b"v"),
            Err(StorageError::Unavailable(_))
        ));
        assert!(backend.inner().is_empty());

        faults.fail_writes(false);
        backend.write("k", b"v").unwrap();
        assert_eq!(backend.inner().len(), 1);
    }

    #[test]
    fn read_faults_cover_key_listing() {
        let backend = FaultInjectingBackend::new(InMemoryBackend::new());
        backend.faults().fail_reads(true);

        assert!(backend.read("k").is_err());
        assert!(backend.keys().is_err());
    }
}
