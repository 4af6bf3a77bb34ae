//! File-based storage backend for persistent storage.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

const RECORD_EXT: &str = "rec";
const TEMP_EXT: &str = "tmp";
const LOCK_FILE: &str = "LOCK";

/// A file-based storage backend.
///
/// Each key is stored in its own file inside a data directory. File names
/// are the hex encoding of the key, so any key is a valid file name.
/// Records survive process restarts.
///
/// # Durability
///
/// A write goes to a temporary file, is flushed with `sync_all`, and then
/// atomically renamed over the previous record. A crash mid-write leaves
/// the previous record intact.
///
/// # Exclusivity
///
/// The backend holds an exclusive advisory lock on `LOCK` inside the data
/// directory for its whole lifetime. A second backend on the same directory
/// fails with [`StorageError::Locked`].
///
/// # Example
///
/// ```no_run
/// use vetsync_storage::{StorageBackend, FileBackend};
/// use std::path::Path;
///
/// let mut backend = FileBackend::open(Path::new("vetsync-data")).unwrap();
/// backend.write("user:ana", b"record").unwrap();
/// ```
#[derive(Debug)]
pub struct FileBackend {
    dir: PathBuf,
    _lock: File,
}

impl FileBackend {
    /// Opens or creates a data directory and takes its lock.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created, or if another
    /// backend already holds the lock.
    pub fn open(dir: &Path) -> StorageResult<Self> {
        fs::create_dir_all(dir)?;

        let lock = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(dir.join(LOCK_FILE))?;

        lock.try_lock_exclusive().map_err(|_| StorageError::Locked {
            path: dir.display().to_string(),
        })?;
        tracing::debug!(dir = %dir.display(), "opened file backend");

        Ok(Self {
            dir: dir.to_path_buf(),
            _lock: lock,
        })
    }

    /// Returns the data directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, key: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{RECORD_EXT}", hex::encode(key.as_bytes())))
    }
}

impl StorageBackend for FileBackend {
    fn read(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        match fs::read(self.record_path(key)) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, key: &str, data: &[u8]) -> StorageResult<()> {
        let target = self.record_path(key);
        let temp = target.with_extension(TEMP_EXT);

        {
            let mut file = File::create(&temp)?;
            file.write_all(data)?;
            file.sync_all()?;
        }
        fs::rename(&temp, &target)?;

        Ok(())
    }

    fn remove(&mut self, key: &str) -> StorageResult<()> {
        match fs::remove_file(self.record_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        let mut keys = Vec::new();

        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXT) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let bytes = hex::decode(stem).map_err(|e| {
                StorageError::Corrupted(format!("bad record name {stem}: {e}"))
            })?;
            let key = String::from_utf8(bytes).map_err(|e| {
                StorageError::Corrupted(format!("bad record name {stem}: {e}"))
            })?;
            keys.push(key);
        }

        keys.sort();
        Ok(keys)
    }

    fn sync(&mut self) -> StorageResult<()> {
        // Records are synced on write; sync the directory entry list too.
        File::open(&self.dir)?.sync_all()?;
        Ok(())
    }
}
