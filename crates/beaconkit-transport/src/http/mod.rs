//! HTTP-backed primary transmitter.
//!
//! Posts batches to the collection endpoint with retry. Backed by `fetch`
//! on `wasm32`, by `reqwest` elsewhere.

pub mod client;
pub mod retry;

pub use client::{HttpTransmitter, HttpTransmitterConfig};
pub use retry::RetryPolicy;
