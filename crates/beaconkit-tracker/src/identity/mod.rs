//! Client/session identity: pluggable persistence plus inactivity-based
//! session rotation.

mod session;
mod store;

pub use session::SessionManager;
pub use store::{InMemoryStore, KeyValueStore, KeyValueStoreHandle, StoreError};

#[cfg(target_arch = "wasm32")]
pub use store::BrowserLocalStorage;
