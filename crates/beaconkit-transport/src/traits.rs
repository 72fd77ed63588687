//! The `Transmitter` abstraction: anything that can deliver a batch of
//! events off the page.
//!
//! Two transmitters exist because the browser gives you two different sets
//! of guarantees. A normal HTTP request can retry and report failure back to
//! the queue, but the browser is free to cancel it the moment the page
//! starts unloading. `navigator.sendBeacon` survives unload but is
//! fire-and-forget: the browser only tells you whether it *queued* the
//! request, never whether the server received it.

use async_trait::async_trait;

use crate::error::Result;
use beaconkit_protocol::Batch;

/// Delivers batches to the collection endpoint, with retry.
///
/// Implementations run on the main thread and are not required to be
/// `Send`/`Sync`: the wasm32 build holds `JsValue`-backed clients, which are
/// `!Send`, and this trait's only caller is the single-threaded tracker
/// event loop.
#[async_trait(?Send)]
pub trait Transmitter {
    /// Send `batch`, retrying per this transmitter's policy.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::TransportError`] if every retry attempt
    /// failed.
    async fn send(&self, batch: &Batch) -> Result<()>;

    /// A short name for logging and diagnostics, e.g. `"http"`.
    fn name(&self) -> &'static str;
}

/// A best-effort, non-retrying fallback used when the page is unloading and
/// a normal async send would be cancelled before it completes.
pub trait BeaconFallback {
    /// Queue `batch` for delivery via a browser mechanism that survives
    /// navigation (e.g. `navigator.sendBeacon`).
    ///
    /// Returns `true` if the host accepted the beacon for delivery. This is
    /// not a delivery guarantee — only that the browser queued it.
    fn send_beacon(&self, batch: &Batch) -> bool;
}
