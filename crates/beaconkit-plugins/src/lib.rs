//! Plugin registry and built-in auto-capture plugins for the BeaconKit
//! analytics SDK.
//!
//! A plugin declares a unique name, an async `init`, and an optional async
//! `destroy`; [`registry::PluginRegistry`] owns the lifecycle, and
//! [`plugin::PluginContext`] is the only privileged surface any plugin
//! gets — built-in plugins ([`builtin`]) are ordinary consumers of it, not
//! special cases.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod builtin;
pub mod error;
pub mod plugin;
pub mod registry;

pub use builtin::{ClickPlugin, PageViewPlugin, SnapshotPlugin};
pub use error::{PluginError, Result};
pub use plugin::{Plugin, PluginConfigView, PluginContext, PluginLogger, SnapshotPluginConfig, TrackerHandle};
pub use registry::PluginRegistry;
