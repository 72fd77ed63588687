//! The plugin contract and the context handed to each plugin at init time.

use async_trait::async_trait;

use crate::error::Result;

/// Capabilities a plugin can invoke on the tracker.
///
/// Kept deliberately narrow: a plugin never holds a reference to the
/// concrete tracker type, only to this trait, so built-in and third-party
/// plugins share no privileged access beyond [`PluginContext`].
pub trait TrackerHandle {
    /// Record a page-view event.
    fn track_page_view(&self, is_initial_load: bool);

    /// Record a click event for an already-resolved element path.
    fn track_click(
        &self,
        x: f64,
        y: f64,
        css_selector: String,
        xpath: Option<String>,
        tag_name: String,
        text_hash: Option<String>,
    );

    /// Record a DOM snapshot event.
    fn track_snapshot(&self, kind: beaconkit_protocol::SnapshotKind);

    /// Record a caller-named custom event.
    fn track_custom(&self, name: String, properties: Option<serde_json::Value>);

    /// Flush the pending batch immediately.
    fn flush(&self);
}

/// Sink for plugin diagnostics. The tracker wires this to its debug logger
/// when `debug` is enabled in configuration; otherwise plugins run silently.
pub trait PluginLogger {
    /// Log a line at debug level.
    fn log(&self, message: &str);
}

/// Snapshot-capture settings a plugin needs, mirrored from configuration.
#[derive(Debug, Clone)]
pub struct SnapshotPluginConfig {
    /// Whether any snapshot capture is enabled at all.
    pub enabled: bool,
    /// Capture one snapshot shortly after the initial page load.
    pub capture_initial: bool,
    /// Capture a snapshot after debounced DOM mutations.
    pub capture_mutations: bool,
    /// Debounce window for mutation-triggered snapshots, in milliseconds.
    pub mutation_throttle_ms: u32,
    /// Capture a snapshot on a fixed interval.
    pub capture_periodic: bool,
    /// Interval for periodic snapshots, in milliseconds.
    pub periodic_interval_ms: u32,
    /// Size bound passed through to `beaconkit_dom::build_snapshot`.
    pub max_snapshot_size_bytes: usize,
}

impl Default for SnapshotPluginConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            capture_initial: true,
            capture_mutations: false,
            mutation_throttle_ms: 3_000,
            capture_periodic: false,
            periodic_interval_ms: 60_000,
            max_snapshot_size_bytes: beaconkit_dom::DEFAULT_MAX_SNAPSHOT_SIZE_BYTES,
        }
    }
}

/// The read-only view of configuration a plugin is allowed to see.
#[derive(Debug, Clone, Default)]
pub struct PluginConfigView {
    /// Mirrors `Configuration.debug`.
    pub debug: bool,
    /// Mirrors the `snapshot.*` configuration group.
    pub snapshot: SnapshotPluginConfig,
    /// Mirrors the `privacy.*` configuration group.
    pub privacy: beaconkit_dom::PrivacyConfig,
}

/// Everything a plugin receives at `init` time. Cheap to clone: every field
/// is reference-counted or `Copy`-sized.
#[derive(Clone)]
pub struct PluginContext {
    /// Handle to the tracker's public emit surface.
    pub tracker: std::rc::Rc<dyn TrackerHandle>,
    /// Read-only configuration snapshot.
    pub config: PluginConfigView,
    /// Optional diagnostics sink, present only when `debug` is enabled.
    pub logger: Option<std::rc::Rc<dyn PluginLogger>>,
}

impl PluginContext {
    /// Log `message` through the context's logger, if one was wired up.
    pub fn log(&self, message: &str) {
        if let Some(logger) = &self.logger {
            logger.log(message);
        }
    }
}

/// A self-contained auto-capture or emission extension.
///
/// A plugin declares a unique name and a semver version, receives a
/// [`PluginContext`] at `init`, and may optionally react to pause/resume
/// and tear itself down at `destroy`. None of these calls may assume they
/// run on any thread but the host page's single event loop.
#[async_trait(?Send)]
pub trait Plugin {
    /// A unique name within the registry. Used for duplicate detection and
    /// diagnostics.
    fn name(&self) -> &str;

    /// A semver version string, surfaced only for diagnostics.
    fn version(&self) -> &str {
        "0.0.0"
    }

    /// Wire up listeners, timers, or any other state the plugin needs.
    ///
    /// # Errors
    ///
    /// An error here is logged by the registry and does not prevent other
    /// plugins from initializing.
    async fn init(&mut self, context: PluginContext) -> Result<()>;

    /// Temporarily stop emitting, without tearing down state. Default is a
    /// no-op: most plugins have nothing to pause.
    fn pause(&mut self) {}

    /// Resume emitting after [`Plugin::pause`].
    fn resume(&mut self) {}

    /// Detach listeners and release any resources. Called once, in
    /// registration order, when the registry is destroyed.
    async fn destroy(&mut self) -> Result<()> {
        Ok(())
    }
}
