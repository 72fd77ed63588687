//! Tracker runtime for the BeaconKit analytics instrumentation SDK.
//!
//! This crate wires together every other `beaconkit-*` crate into the
//! browser-facing surface: validated [`config::SdkConfig`], client/session
//! identity ([`identity`]), a priority-ordered batching [`queue`], and the
//! auto-capture [`tracker::Tracker`] that drives `beaconkit-plugins`' built-in
//! plugins through [`beaconkit_plugins::TrackerHandle`].
//!
//! # Architecture
//!
//! - **Configuration** (`config`): validated, immutable `SdkConfig`, built
//!   through a `with_*` builder
//! - **Identity** (`identity`): client/session id persistence and
//!   inactivity-based session rotation
//! - **Queue** (`queue`): batches events and tries transmitters in priority
//!   order, falling back from HTTP to `sendBeacon`
//! - **Tracker** (`tracker`): the sole `TrackerHandle` implementation,
//!   enriching and emitting events
//! - **SDK** (`sdk`): process-wide `initialize_sdk`/`destroy_sdk` lifecycle
//!   over a thread-local tracker handle
//!
//! # Usage Example
//!
//! ```ignore
//! use beaconkit_tracker::{config::SdkConfig, sdk};
//!
//! let config = SdkConfig::try_new("my-project", "https://collect.example.com/v1")?;
//! sdk::initialize_sdk(config).await?;
//! sdk::with_sdk(|tracker| tracker.track_custom("signup".into(), None))?;
//! sdk::destroy_sdk().await?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod identity;
pub mod queue;
pub mod sdk;
pub mod tracker;

pub use config::SdkConfig;
pub use error::{ConfigError, QueueError, Result, TrackerError};
pub use sdk::{destroy_sdk, flush_sdk, initialize_sdk, with_sdk};
pub use tracker::Tracker;
