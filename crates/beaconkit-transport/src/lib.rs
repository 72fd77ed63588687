//! Delivery layer for the BeaconKit analytics instrumentation SDK.
//!
//! Provides a trait-based transmitter abstraction with two implementations:
//!
//! - [`HttpTransmitter`]: the primary transmitter, POSTing batches with
//!   retry over `fetch` (wasm32) or `reqwest` (native).
//! - [`BeaconTransmitter`]: the unload-safe fallback, using
//!   `navigator.sendBeacon`.
//!
//! # Architecture
//!
//! - **Transmitter trait**: generic interface any delivery mechanism
//!   implements
//! - **HTTP transmitter**: retried POST, the normal delivery path
//! - **Beacon transmitter**: fire-and-forget, used only when the page is
//!   unloading
//! - **Error handling**: unified error type across both

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod beacon;
pub mod error;
pub mod http;
pub mod traits;

pub use beacon::BeaconTransmitter;
pub use error::{Result, TransportError};
pub use http::{HttpTransmitter, HttpTransmitterConfig};
pub use traits::{BeaconFallback, Transmitter};
