//! Pluggable key-value persistence for client/session identity.

use thiserror::Error;

/// Errors raised by a [`KeyValueStore`] implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The underlying storage mechanism rejected the operation.
    #[error("storage backend rejected the operation: {0}")]
    Backend(String),
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// A small persistence surface the session manager reads and writes
/// through, so the browser's `localStorage` and an in-memory stand-in share
/// one contract.
pub trait KeyValueStore {
    /// Read the value stored at `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` at `key`.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove whatever is stored at `key`.
    fn remove(&self, key: &str) -> Result<()>;
}

/// A shared handle to a [`KeyValueStore`] implementation.
pub type KeyValueStoreHandle = std::rc::Rc<dyn KeyValueStore>;

/// An in-process store backed by a `RefCell<HashMap>`.
///
/// Used directly off `wasm32`, and reached for automatically when
/// `BrowserLocalStorage` is unavailable or errors — per spec, identity
/// storage failures are swallowed rather than surfaced to the caller, so
/// the session manager treats this as a silent fallback, not an error path.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    values: std::cell::RefCell<std::collections::HashMap<String, String>>,
}

impl InMemoryStore {
    /// Create an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for InMemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values.borrow_mut().remove(key);
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm::BrowserLocalStorage;

#[cfg(target_arch = "wasm32")]
mod wasm {
    use super::{KeyValueStore, Result, StoreError};

    /// `window.localStorage`-backed store.
    pub struct BrowserLocalStorage {
        storage: web_sys::Storage,
    }

    impl BrowserLocalStorage {
        /// Obtain the page's `localStorage`, or `None` if unavailable (e.g.
        /// private browsing, quota exceeded, or disabled by host policy).
        #[must_use]
        pub fn new() -> Option<Self> {
            let window = web_sys::window()?;
            let storage = window.local_storage().ok().flatten()?;
            Some(Self { storage })
        }
    }

    impl KeyValueStore for BrowserLocalStorage {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.storage
                .get_item(key)
                .map_err(|e| StoreError::Backend(format!("{e:?}")))
        }

        fn set(&self, key: &str, value: &str) -> Result<()> {
            self.storage
                .set_item(key, value)
                .map_err(|e| StoreError::Backend(format!("{e:?}")))
        }

        fn remove(&self, key: &str) -> Result<()> {
            self.storage
                .remove_item(key)
                .map_err(|e| StoreError::Backend(format!("{e:?}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_value() {
        let store = InMemoryStore::new();
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap(), Some("v".to_string()));
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn missing_key_reads_as_none() {
        let store = InMemoryStore::new();
        assert_eq!(store.get("absent").unwrap(), None);
    }
}
