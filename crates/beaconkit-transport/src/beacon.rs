//! The unload-safe fallback transmitter, backed by `navigator.sendBeacon`.
//!
//! `sendBeacon` is the only browser API guaranteed to survive a
//! `beforeunload`/`pagehide` handler: a normal `fetch` started from inside
//! one of those handlers is liable to be cancelled the instant the
//! navigation commits. The tradeoff is that `sendBeacon` is fire-and-forget —
//! there is no retry and no response body, only a boolean telling you
//! whether the browser accepted the payload into its send queue.

use beaconkit_protocol::Batch;

use crate::error::{Result, TransportError};
use crate::traits::BeaconFallback;

/// Fallback transmitter used during page unload.
#[derive(Clone, Debug, Default)]
pub struct BeaconTransmitter {
    endpoint: String,
}

impl BeaconTransmitter {
    /// Create a fallback transmitter posting to `endpoint`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }

    /// Encode `batch` and hand it to [`BeaconFallback::send_beacon`],
    /// returning an error rather than a bare `bool` so callers composing
    /// this with other transmitters can treat it uniformly.
    pub fn send(&self, batch: &Batch) -> Result<()> {
        if self.send_beacon(batch) {
            Ok(())
        } else {
            Err(TransportError::HostRejected(
                "navigator.sendBeacon rejected the payload".into(),
            ))
        }
    }
}

#[cfg(target_arch = "wasm32")]
impl BeaconFallback for BeaconTransmitter {
    fn send_beacon(&self, batch: &Batch) -> bool {
        let Ok(body) = serde_json::to_string(batch) else {
            return false;
        };
        let Some(window) = web_sys::window() else {
            return false;
        };
        let navigator = window.navigator();
        navigator
            .send_beacon_with_opt_str(&self.endpoint, Some(&body))
            .unwrap_or(false)
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl BeaconFallback for BeaconTransmitter {
    /// `sendBeacon` has no native equivalent. This spawns a best-effort,
    /// unretried POST onto the ambient Tokio runtime and returns
    /// immediately without waiting on it — mirroring `sendBeacon`'s own
    /// contract of "the host accepted it", not "it was delivered". Returns
    /// `false` outright if there is no runtime to spawn onto (send_beacon is
    /// synchronous and cannot block on one here).
    fn send_beacon(&self, batch: &Batch) -> bool {
        let Ok(body) = serde_json::to_string(batch) else {
            return false;
        };
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return false;
        };

        let endpoint = self.endpoint.clone();
        handle.spawn(async move {
            let _ = reqwest::Client::new()
                .post(&endpoint)
                .header("content-type", "application/json")
                .body(body)
                .send()
                .await;
        });
        true
    }
}
