//! Process-wide SDK lifecycle: one [`Tracker`] per page, reached through a
//! thread-local handle since everything here runs on the page's single JS
//! thread.

use std::cell::RefCell;
use std::rc::Rc;

use crate::config::SdkConfig;
use crate::error::{Result, TrackerError};
use crate::identity::KeyValueStoreHandle;
use crate::tracker::Tracker;
use beaconkit_plugins::TrackerHandle;

thread_local! {
    static SDK: RefCell<Option<Rc<Tracker>>> = const { RefCell::new(None) };
}

/// Default identity store for a fresh SDK instance: `localStorage` on
/// `wasm32` when available, falling back to an in-memory store everywhere
/// else (including a browser with `localStorage` disabled).
fn default_store() -> Option<KeyValueStoreHandle> {
    #[cfg(target_arch = "wasm32")]
    {
        crate::identity::BrowserLocalStorage::new()
            .map(|store| Rc::new(store) as KeyValueStoreHandle)
            .or_else(|| Some(Rc::new(crate::identity::InMemoryStore::new()) as KeyValueStoreHandle))
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        Some(Rc::new(crate::identity::InMemoryStore::new()) as KeyValueStoreHandle)
    }
}

/// Initialize the SDK for this page with `config`, registering and starting
/// the built-in auto-capture plugins.
///
/// # Errors
///
/// Returns [`TrackerError::AlreadyInitialized`] if an instance already
/// exists, or a configuration/queue construction error if `config` or the
/// transport layer could not be set up.
pub async fn initialize_sdk(config: SdkConfig) -> Result<()> {
    let already_initialized = SDK.with(|cell| cell.borrow().is_some());
    if already_initialized {
        return Err(TrackerError::AlreadyInitialized);
    }

    let tracker = Tracker::new(config, default_store())?;
    tracker.start().await;

    SDK.with(|cell| {
        *cell.borrow_mut() = Some(tracker);
    });
    Ok(())
}

/// Run `f` with the active tracker, if one has been initialized.
///
/// # Errors
///
/// Returns [`TrackerError::NotInitialized`] if [`initialize_sdk`] has not
/// run (or [`destroy_sdk`] already has).
pub fn with_sdk<R>(f: impl FnOnce(&Rc<Tracker>) -> R) -> Result<R> {
    SDK.with(|cell| {
        cell.borrow()
            .as_ref()
            .map(f)
            .ok_or(TrackerError::NotInitialized)
    })
}

/// Flush the active tracker's pending batch, if one exists.
pub fn flush_sdk() -> Result<()> {
    with_sdk(|tracker| tracker.flush())
}

/// Tear down the active tracker, flushing any pending batch first, and clear
/// the thread-local handle so a later [`initialize_sdk`] call can succeed
/// again.
///
/// # Errors
///
/// Returns [`TrackerError::NotInitialized`] if no instance exists.
pub async fn destroy_sdk() -> Result<()> {
    let tracker = SDK
        .with(|cell| cell.borrow_mut().take())
        .ok_or(TrackerError::NotInitialized)?;
    tracker.destroy().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SdkConfig {
        SdkConfig::try_new("proj", "https://collect.example.com/v1").unwrap()
    }

    #[tokio::test]
    async fn initialize_then_destroy_round_trips_cleanly() {
        let _ = destroy_sdk().await;
        initialize_sdk(config()).await.unwrap();
        assert!(with_sdk(|_| ()).is_ok());
        destroy_sdk().await.unwrap();
        assert!(with_sdk(|_| ()).is_err());
    }

    #[tokio::test]
    async fn double_initialize_fails() {
        let _ = destroy_sdk().await;
        initialize_sdk(config()).await.unwrap();
        let err = initialize_sdk(config()).await.unwrap_err();
        assert!(matches!(err, TrackerError::AlreadyInitialized));
        destroy_sdk().await.unwrap();
    }

    #[tokio::test]
    async fn destroy_without_initialize_fails() {
        let _ = destroy_sdk().await;
        let err = destroy_sdk().await.unwrap_err();
        assert!(matches!(err, TrackerError::NotInitialized));
    }
}
