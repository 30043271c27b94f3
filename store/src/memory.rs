//! In-memory [`KeyValueStore`] used by tests and by hosts without durable storage.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use async_trait::async_trait;

use crate::{KeyValueStore, StoreError};

/// `HashMap`-backed store with switchable failure injection.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
    fail_reads: Cell<bool>,
    fail_writes: Cell<bool>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `get` fail with a backend error.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.set(fail);
    }

    /// Make every subsequent `set`/`remove`/`clear` fail with a backend error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    /// Synchronous peek for assertions.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    fn check_write(&self) -> Result<(), StoreError> {
        if self.fail_writes.get() {
            return Err(StoreError::Backend("memory store writes disabled".into()));
        }
        Ok(())
    }
}

#[async_trait(?Send)]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        if self.fail_reads.get() {
            return Err(StoreError::Backend("memory store reads disabled".into()));
        }
        Ok(self.entries.borrow().get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.check_write()?;
        self.entries.borrow_mut().insert(key.to_owned(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.check_write()?;
        self.entries.borrow_mut().remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.check_write()?;
        self.entries.borrow_mut().clear();
        Ok(())
    }
}
