//! Advisory locking for [`FileStore`](super::FileStore).
//!
//! A single `lock` file under the store root guards every collection.
//! Reads take it shared; writes and removals take it exclusively for the
//! whole temp-write + rename. Contention is retried until the store's
//! timeout runs out.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use fs2::FileExt;
use tracing::trace;

use crate::error::ErrorCode;

const RETRY_INTERVAL: Duration = Duration::from_millis(10);

/// How a collection is being accessed while the lock is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    /// Shared with other readers.
    Read,
    /// Exclusive; blocks readers and other writers.
    Write,
}

impl fmt::Display for LockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => f.write_str("read"),
            Self::Write => f.write_str("write"),
        }
    }
}

/// Failure to take the store lock on behalf of one collection.
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error(
        "{mode} of collection '{collection}' gave up after {waited:?} waiting for {}",
        .path.display()
    )]
    Timeout {
        collection: String,
        mode: LockMode,
        path: PathBuf,
        waited: Duration,
    },

    #[error("cannot open {} for {mode} of collection '{collection}': {source}", .path.display())]
    Open {
        collection: String,
        mode: LockMode,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl LockError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Timeout { .. } => ErrorCode::LockContention,
            Self::Open {
                mode: LockMode::Read,
                ..
            } => ErrorCode::StoreReadFailed,
            Self::Open {
                mode: LockMode::Write,
                ..
            } => ErrorCode::StoreWriteFailed,
        }
    }

    /// The collection whose access was refused.
    #[must_use]
    pub fn collection(&self) -> &str {
        match self {
            Self::Timeout { collection, .. } | Self::Open { collection, .. } => collection,
        }
    }
}

/// Held store lock; released on drop.
#[derive(Debug)]
#[must_use = "the store lock is released as soon as the guard is dropped"]
pub(crate) struct StoreLock {
    file: File,
}

impl StoreLock {
    /// Take the lock at `path` for `mode` access to `collection`. The lock
    /// file is created if missing, but its directory must already exist.
    pub(crate) fn acquire(
        path: &Path,
        collection: &str,
        mode: LockMode,
        timeout: Duration,
    ) -> Result<Self, LockError> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)
            .map_err(|source| LockError::Open {
                collection: collection.to_string(),
                mode,
                path: path.to_path_buf(),
                source,
            })?;

        let start = Instant::now();
        loop {
            let taken = match mode {
                LockMode::Read => FileExt::try_lock_shared(&file),
                LockMode::Write => FileExt::try_lock_exclusive(&file),
            };
            if taken.is_ok() {
                trace!(collection, %mode, "store lock held");
                return Ok(Self { file });
            }

            let waited = start.elapsed();
            if waited >= timeout {
                return Err(LockError::Timeout {
                    collection: collection.to_string(),
                    mode,
                    path: path.to_path_buf(),
                    waited,
                });
            }
            thread::sleep(RETRY_INTERVAL);
        }
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}
