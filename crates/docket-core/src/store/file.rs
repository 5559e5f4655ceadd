//! File-backed store: one `<name>.json` file per collection.
//!
//! Writes go to a sibling temp file, are synced, then renamed over the
//! target while the exclusive store lock is held. A failed write never
//! leaves a truncated collection behind.

use std::fs::{self, File};
use std::io::{self, Write as IoWrite};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, trace};

use super::Store;
use super::lock::{LockMode, StoreLock};
use crate::error::StorageError;

const LOCK_FILE: &str = "lock";
const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(2);

/// Persisted store rooted at a directory (normally `.docket/`).
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
    lock_timeout: Duration,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    #[must_use]
    pub const fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file holding collection `name`.
    #[must_use]
    pub fn collection_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.json"))
    }

    #[must_use]
    pub fn lock_path(&self) -> PathBuf {
        self.root.join(LOCK_FILE)
    }

    fn temp_path(&self, name: &str) -> PathBuf {
        self.root
            .join(format!(".{name}.json.{}.tmp", std::process::id()))
    }

    fn lock(&self, name: &str, mode: LockMode) -> Result<StoreLock, StorageError> {
        Ok(StoreLock::acquire(
            &self.lock_path(),
            name,
            mode,
            self.lock_timeout,
        )?)
    }
}

impl Store for FileStore {
    fn read(&self, name: &str) -> Result<Option<Vec<u8>>, StorageError> {
        if !self.root.is_dir() {
            return Ok(None);
        }
        let path = self.collection_path(name);
        let _lock = self.lock(name, LockMode::Read)?;

        match fs::read(&path) {
            Ok(bytes) => {
                trace!(collection = name, bytes = bytes.len(), "read collection");
                Ok(Some(bytes))
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StorageError::read(name, err)),
        }
    }

    fn write(&self, name: &str, bytes: &[u8]) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root).map_err(|err| StorageError::write(name, err))?;
        let _lock = self.lock(name, LockMode::Write)?;

        let target = self.collection_path(name);
        let temp = self.temp_path(name);
        if let Err(err) = write_synced(&temp, bytes).and_then(|()| fs::rename(&temp, &target)) {
            let _ = fs::remove_file(&temp);
            return Err(StorageError::write(name, err));
        }

        debug!(collection = name, bytes = bytes.len(), "replaced collection");
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<(), StorageError> {
        if !self.root.is_dir() {
            return Ok(());
        }
        let _lock = self.lock(name, LockMode::Write)?;
        match fs::remove_file(self.collection_path(name)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StorageError::write(name, err)),
        }
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.flush()?;
    file.sync_all()
}
