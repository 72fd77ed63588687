//! DOM utilities for the BeaconKit analytics instrumentation SDK.
//!
//! Pure of the tracker and the queue — selector generation, layout hashing,
//! and snapshot sanitization operate on a read-only [`node::DomNode`] view
//! and never touch the queue, transmitters, or configuration.
//!
//! # Modules
//!
//! - [`node`]: the `DomNode` trait and its in-memory/`web_sys` implementations
//! - [`selector`]: CSS selector and XPath generation for clicked elements
//! - [`layout_hash`]: deterministic structural digest of a subtree
//! - [`privacy`]: selector matching for masking/blocking
//! - [`snapshot`]: sanitized, size-bounded, compressed DOM serialization

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod layout_hash;
pub mod node;
pub mod privacy;
pub mod selector;
pub mod snapshot;

pub use error::{DomError, Result};
pub use layout_hash::layout_hash;
pub use node::{DomNode, InMemoryElement, Rect};
pub use privacy::PrivacyConfig;
pub use selector::{css_selector, xpath};
pub use snapshot::{build_snapshot, SnapshotPayload, DEFAULT_MAX_SNAPSHOT_SIZE_BYTES};

/// Classify a viewport width into the coarse [`beaconkit_protocol::ScreenClass`]
/// buckets: `mobile` below 768px, `tablet` below 1024px, `desktop` otherwise.
pub fn screen_class(viewport_width: u32) -> beaconkit_protocol::ScreenClass {
    beaconkit_protocol::ScreenClass::from_viewport_width(viewport_width)
}
