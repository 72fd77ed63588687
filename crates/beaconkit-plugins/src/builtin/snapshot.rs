//! Initial and periodic DOM snapshot capture.

use async_trait::async_trait;

use crate::error::Result;
use crate::plugin::{Plugin, PluginContext};

/// Decide whether a newly computed layout hash warrants emitting another
/// snapshot event.
///
/// Initial snapshots always emit; non-initial snapshots (mutation or
/// periodic) emit only when the hash changed since the last captured one.
#[must_use]
pub fn should_emit(kind: beaconkit_protocol::SnapshotKind, last_hash: Option<&str>, new_hash: &str) -> bool {
    match kind {
        beaconkit_protocol::SnapshotKind::Initial => true,
        _ => last_hash != Some(new_hash),
    }
}

/// Schedules snapshot capture per configuration: an initial snapshot, and
/// an optional periodic one.
///
/// On `wasm32` this wires an interval timer for `capture_periodic`;
/// elsewhere `init` only fires the initial snapshot synchronously, which
/// keeps [`should_emit`] the only piece of logic under test off-browser.
/// Mutation-debounced capture (`capture_mutations`) has no wiring yet — see
/// the crate's design notes.
pub struct SnapshotPlugin {
    last_hash: Option<String>,
    enabled: bool,
    #[cfg(target_arch = "wasm32")]
    wiring: Option<wasm::Wiring>,
}

impl SnapshotPlugin {
    /// Create a new, unpaused snapshot plugin.
    #[must_use]
    pub fn new() -> Self {
        Self {
            last_hash: None,
            enabled: true,
            #[cfg(target_arch = "wasm32")]
            wiring: None,
        }
    }

    /// Record a newly computed hash, returning whether this call should
    /// actually emit an event.
    pub fn record(&mut self, kind: beaconkit_protocol::SnapshotKind, new_hash: String) -> bool {
        let emit = should_emit(kind, self.last_hash.as_deref(), &new_hash);
        self.last_hash = Some(new_hash);
        emit
    }
}

impl Default for SnapshotPlugin {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait(?Send)]
impl Plugin for SnapshotPlugin {
    fn name(&self) -> &str {
        "session-snapshot"
    }

    #[cfg(not(target_arch = "wasm32"))]
    async fn init(&mut self, context: PluginContext) -> Result<()> {
        if !context.config.snapshot.enabled {
            return Ok(());
        }
        if context.config.snapshot.capture_initial {
            context.tracker.track_snapshot(beaconkit_protocol::SnapshotKind::Initial);
        }
        Ok(())
    }

    #[cfg(target_arch = "wasm32")]
    async fn init(&mut self, context: PluginContext) -> Result<()> {
        if !context.config.snapshot.enabled {
            return Ok(());
        }
        if context.config.snapshot.capture_initial {
            context.tracker.track_snapshot(beaconkit_protocol::SnapshotKind::Initial);
        }
        if context.config.snapshot.capture_periodic {
            self.wiring = wasm::install_periodic(
                context.clone(),
                context.config.snapshot.periodic_interval_ms,
            );
        }
        Ok(())
    }

    fn pause(&mut self) {
        self.enabled = false;
    }

    fn resume(&mut self) {
        self.enabled = true;
    }

    #[cfg(not(target_arch = "wasm32"))]
    async fn destroy(&mut self) -> Result<()> {
        Ok(())
    }

    #[cfg(target_arch = "wasm32")]
    async fn destroy(&mut self) -> Result<()> {
        if let Some(wiring) = self.wiring.take() {
            wiring.uninstall();
        }
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
mod wasm {
    use gloo_timers::callback::Interval;

    use crate::plugin::PluginContext;

    /// Holds the periodic-capture timer so `destroy` can cancel it.
    pub struct Wiring {
        _interval: Interval,
    }

    impl Wiring {
        pub fn uninstall(self) {
            drop(self._interval);
        }
    }

    pub fn install_periodic(context: PluginContext, interval_ms: u32) -> Option<Wiring> {
        let interval = Interval::new(interval_ms, move || {
            context.tracker.track_snapshot(beaconkit_protocol::SnapshotKind::Periodic);
        });
        Some(Wiring { _interval: interval })
    }
}
