//! Key-value persistence contract shared by the annotation editor and the
//! floor-plan viewer.
//!
//! The browser app persists everything through an asynchronous string store
//! (IndexedDB in production). This crate owns only the contract: the
//! [`KeyValueStore`] trait, an in-memory backend for tests and previews, a
//! `localStorage` backend behind the `web` feature, and JSON helpers that turn
//! backend failures into a logged warning plus a safe default.
//!
//! Each call is atomic for its own key. Nothing here offers cross-key
//! transactions; two tabs editing the same report resolve as last write wins.


#[cfg(feature = "web")]
pub mod local;
pub mod memory;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

pub use memory::MemoryStore;

/// Suffix appended to every report-scoped key.
pub const KEY_VERSION: &str = "_v1";

/// Error returned by a [`KeyValueStore`] backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend rejected the operation (quota, closed database, missing storage).
    #[error("storage backend error: {0}")]
    Backend(String),
    /// A stored value could not be encoded or decoded as JSON.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Asynchronous string key-value store.
///
/// Values are opaque to the store; callers serialize with [`write_json`] and
/// read back with [`read_json`].
#[async_trait(?Send)]
pub trait KeyValueStore {
    /// Fetch the value for `key`, or `None` when absent.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: String) -> Result<(), StoreError>;

    /// Delete `key`. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Delete every key.
    async fn clear(&self) -> Result<(), StoreError>;
}

/// Build a report-scoped key such as `JL_pins_<report>_v1`.
#[must_use]
pub fn scoped_key(prefix: &str, scope: &str) -> String {
    format!("{prefix}{scope}{KEY_VERSION}")
}

/// Read and decode a JSON value.
///
/// Missing keys yield `default`. Backend and decode failures are logged and
/// also yield `default`, so a broken store degrades to "starting blank".
pub async fn read_json<S, T>(store: &S, key: &str, default: T) -> T
where
    S: KeyValueStore + ?Sized,
    T: DeserializeOwned,
{
    let raw = match store.get(key).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return default,
        Err(e) => {
            warn!(error = %e, key, "store read failed; using default");
            return default;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, key, "stored value is not valid JSON for this record; using default");
            default
        }
    }
}

/// Encode and write a JSON value. Returns `false` when the write was lost.
///
/// Writes are best-effort: the caller keeps its in-memory state either way.
pub async fn write_json<S, T>(store: &S, key: &str, value: &T) -> bool
where
    S: KeyValueStore + ?Sized,
    T: Serialize + ?Sized,
{
    let raw = match serde_json::to_string(value) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(error = %e, key, "failed to encode value for store");
            return false;
        }
    };
    match store.set(key, raw).await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, key, "store write failed; change kept in memory only");
            false
        }
    }
}

/// Remove a key, logging instead of failing. Returns `false` on backend error.
pub async fn remove_logged<S>(store: &S, key: &str) -> bool
where
    S: KeyValueStore + ?Sized,
{
    match store.remove(key).await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, key, "store remove failed");
            false
        }
    }
}
