//! Persisted store: named collections of JSON bytes.
//!
//! Repositories are the only callers. Each one reads a whole collection,
//! mutates it in memory, and writes the whole collection back; the store
//! never sees partial patches.
//!
//! # Layout
//!
//! ```text
//! tickets        JSON array of tickets
//! comments       JSON array of comments
//! users          JSON array of known users (read-only here)
//! loggedInUser   JSON object for the active session
//! theme          display preference, not read by the core
//! ```

mod file;
mod lock;

pub use file::FileStore;
pub use lock::{LockError, LockMode};

use std::collections::HashMap;
use std::io;
use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::StorageError;

pub const TICKETS: &str = "tickets";
pub const COMMENTS: &str = "comments";
pub const USERS: &str = "users";
pub const SESSION: &str = "loggedInUser";
pub const THEME: &str = "theme";

/// Synchronous key/value byte store.
///
/// Implementations must make `write` all-or-nothing: after a failed write the
/// previous bytes for that name are still what `read` returns.
pub trait Store: Send + Sync {
    fn read(&self, name: &str) -> Result<Option<Vec<u8>>, StorageError>;

    fn write(&self, name: &str, bytes: &[u8]) -> Result<(), StorageError>;

    fn remove(&self, name: &str) -> Result<(), StorageError>;
}

/// Load a JSON array collection. Missing, empty, or `null` reads as empty.
///
/// # Errors
///
/// Returns [`StorageError::Corrupt`] if the bytes are not a JSON array of `T`,
/// or the store's own read error.
pub fn load_collection<T: DeserializeOwned>(
    store: &dyn Store,
    name: &str,
) -> Result<Vec<T>, StorageError> {
    Ok(load_record::<Vec<T>>(store, name)?.unwrap_or_default())
}

/// Replace a collection with `records`, serialized as a JSON array.
///
/// # Errors
///
/// Returns [`StorageError::Serialize`] or the store's write error.
pub fn save_collection<T: Serialize>(
    store: &dyn Store,
    name: &str,
    records: &[T],
) -> Result<(), StorageError> {
    save_record(store, name, records)
}

/// Load a single JSON value stored under `name`.
///
/// # Errors
///
/// Returns [`StorageError::Corrupt`] if the bytes do not decode as `T`.
pub fn load_record<T: DeserializeOwned>(
    store: &dyn Store,
    name: &str,
) -> Result<Option<T>, StorageError> {
    let Some(bytes) = store.read(name)? else {
        return Ok(None);
    };
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    serde_json::from_slice::<Option<T>>(&bytes).map_err(|source| StorageError::Corrupt {
        collection: name.to_string(),
        source,
    })
}

/// Serialize `value` and write it under `name`.
///
/// # Errors
///
/// Returns [`StorageError::Serialize`] or the store's write error.
pub fn save_record<T: Serialize + ?Sized>(
    store: &dyn Store,
    name: &str,
    value: &T,
) -> Result<(), StorageError> {
    let bytes = serde_json::to_vec(value).map_err(|source| StorageError::Serialize {
        collection: name.to_string(),
        source,
    })?;
    store.write(name, &bytes)
}

/// Process-local store backed by a map. The reference fake for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
    read_only: Mutex<bool>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed raw bytes under `name`, bypassing serialization.
    #[must_use]
    pub fn with_raw(self, name: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), bytes.into());
        self
    }

    /// Raw bytes currently stored under `name`.
    #[must_use]
    pub fn raw(&self, name: &str) -> Option<Vec<u8>> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Make every subsequent write and remove fail, as a full disk would.
    pub fn set_read_only(&self, read_only: bool) {
        *self.read_only.lock().unwrap_or_else(PoisonError::into_inner) = read_only;
    }

    fn check_writable(&self, name: &str) -> Result<(), StorageError> {
        if *self.read_only.lock().unwrap_or_else(PoisonError::into_inner) {
            return Err(StorageError::write(
                name,
                io::Error::new(io::ErrorKind::PermissionDenied, "store is read-only"),
            ));
        }
        Ok(())
    }
}

impl Store for MemoryStore {
    fn read(&self, name: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.raw(name))
    }

    fn write(&self, name: &str, bytes: &[u8]) -> Result<(), StorageError> {
        self.check_writable(name)?;
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), bytes.to_vec());
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<(), StorageError> {
        self.check_writable(name)?;
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_collection_reads_as_empty() {
        let store = MemoryStore::new();
        let rows: Vec<serde_json::Value> = load_collection(&store, TICKETS).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn null_and_blank_collections_read_as_empty() {
        let store = MemoryStore::new()
            .with_raw(TICKETS, "null")
            .with_raw(COMMENTS, "  \n");
        let tickets: Vec<serde_json::Value> = load_collection(&store, TICKETS).unwrap();
        let comments: Vec<serde_json::Value> = load_collection(&store, COMMENTS).unwrap();
        assert!(tickets.is_empty());
        assert!(comments.is_empty());
    }

    #[test]
    fn malformed_json_is_reported_with_collection_name() {
        let store = MemoryStore::new().with_raw(TICKETS, "[{not json");
        let err = load_collection::<serde_json::Value>(&store, TICKETS).unwrap_err();
        assert!(matches!(err, StorageError::Corrupt { ref collection, .. } if collection == TICKETS));
    }

    #[test]
    fn save_then_load_preserves_order() {
        let store = MemoryStore::new();
        save_collection(&store, USERS, &["b", "a", "c"]).unwrap();
        let back: Vec<String> = load_collection(&store, USERS).unwrap();
        assert_eq!(back, vec!["b", "a", "c"]);
    }

    #[test]
    fn read_only_store_keeps_previous_bytes() {
        let store = MemoryStore::new();
        save_collection(&store, USERS, &["kept"]).unwrap();
        store.set_read_only(true);

        let err = save_collection(&store, USERS, &["lost"]).unwrap_err();
        assert!(matches!(err, StorageError::Write { .. }));
        assert!(store.remove(USERS).is_err());

        let back: Vec<String> = load_collection(&store, USERS).unwrap();
        assert_eq!(back, vec!["kept"]);
    }
}
