//! Built-in plugins: page-view, click-tracking, and session-snapshot.
//!
//! Each lives entirely behind the [`crate::plugin::Plugin`] contract so the
//! registry treats them exactly like a third-party plugin — no privileged
//! access beyond [`crate::plugin::PluginContext`].

mod click;
mod page_view;
mod snapshot;

pub use click::ClickPlugin;
pub use page_view::PageViewPlugin;
pub use snapshot::SnapshotPlugin;
