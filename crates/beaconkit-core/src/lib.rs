#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Core abstractions shared across the BeaconKit analytics workspace.
//!
//! This crate provides the foundational, host-agnostic pieces every other
//! `beaconkit-*` crate builds on:
//!
//! - **Universal retry strategies** via `BackoffStrategy` trait
//!   - Exponential backoff with jitter, used by the primary transmitter's
//!     retry loop.
//! - **A monotonic clock abstraction** via `Clock`, so every timestamp in the
//!   workspace comes from one source of truth that tests can fake.
//!
//! # Examples
//!
//! ```rust
//! use beaconkit_core::prelude::*;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backoff = ExponentialBackoff::builder()
//!     .max_retries(3)
//!     .initial_delay(Duration::from_millis(1000))
//!     .build();
//!
//! let result = backoff.execute(|| async {
//!     Ok::<_, std::io::Error>(42)
//! }).await?;
//! # Ok(())
//! # }
//! ```

pub mod retry;
pub mod time;

/// Convenient re-exports of commonly used items.
///
/// Import all core abstractions with:
///
/// ```rust
/// use beaconkit_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::retry::{BackoffStrategy, ExponentialBackoff, ExponentialBackoffBuilder};
    pub use crate::time::{Clock, MonotonicClock, SystemClock};
}
