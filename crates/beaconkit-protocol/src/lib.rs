//! Shared wire types for the BeaconKit analytics instrumentation SDK.
//!
//! This crate provides the core event and batch types shared by the tracker
//! runtime ([`beaconkit-tracker`](https://docs.rs/beaconkit-tracker)) and the
//! transmitters that deliver them
//! ([`beaconkit-transport`](https://docs.rs/beaconkit-transport)). Centralizing
//! these types keeps the wire format consistent regardless of which
//! transmitter sent a batch.
//!
//! # Type Organization
//!
//! - **Event types**: [`event`] - the base record plus page-view/click/custom/snapshot payloads
//! - **Batch types**: [`batch`] - immutable groups of events ready to send
//! - **Error types**: [`error`] - construction and (de)serialization errors
//!
//! # Design Principles
//!
//! - **Zero I/O**: all types are pure data structures
//! - **Serialization**: serde-based, camelCase on the wire to match the
//!   browser-origin JSON the rest of the ecosystem expects
//! - **Validated construction**: [`Event::new`] rejects events missing
//!   required identity fields rather than trusting callers

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod batch;
pub mod error;
pub mod event;

pub use batch::Batch;
pub use error::{ProtocolError, Result};
pub use event::{
    CompressionKind, Event, EventContext, EventPayload, MaskMetadata, PageDimensions,
    ScreenClass, SnapshotKind, ViewportDimensions,
};
