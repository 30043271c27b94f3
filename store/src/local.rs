//! Browser `localStorage` backend.
//!
//! Synchronous under the hood; the async trait surface lets hosts swap in an
//! IndexedDB-backed store without touching callers.

use async_trait::async_trait;
use wasm_bindgen::JsValue;
use web_sys::Storage;

use crate::{KeyValueStore, StoreError};

/// [`KeyValueStore`] over `window.localStorage`.
pub struct LocalStore {
    storage: Storage,
}

impl LocalStore {
    /// Bind to the current window's `localStorage`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] when there is no window or storage is
    /// disabled (private browsing, sandboxed iframe).
    pub fn open() -> Result<Self, StoreError> {
        let Some(window) = web_sys::window() else {
            return Err(StoreError::Backend("no window".into()));
        };
        match window.local_storage() {
            Ok(Some(storage)) => Ok(Self { storage }),
            Ok(None) => Err(StoreError::Backend("localStorage unavailable".into())),
            Err(e) => Err(StoreError::Backend(format!("{e:?}"))),
        }
    }
}

fn backend(e: JsValue) -> StoreError {
    StoreError::Backend(format!("{e:?}"))
}

#[async_trait(?Send)]
impl KeyValueStore for LocalStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.storage.get_item(key).map_err(backend)
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.storage.set_item(key, &value).map_err(backend)
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.storage.remove_item(key).map_err(backend)
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.storage.clear().map_err(backend)
    }
}
