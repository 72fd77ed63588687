//! The tracker: owns identity, the batching queue, and plugin lifecycle, and
//! is the sole implementor of [`beaconkit_plugins::TrackerHandle`].

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use beaconkit_core::time::{Clock, MonotonicClock, SystemClock};
use beaconkit_dom::PrivacyConfig;
use beaconkit_protocol::{Event, EventContext, EventPayload, PageDimensions, SnapshotKind, ViewportDimensions};
use beaconkit_transport::{BeaconTransmitter, HttpTransmitter, HttpTransmitterConfig, Transmitter};
use beaconkit_plugins::{
    ClickPlugin, PageViewPlugin, PluginConfigView, PluginContext, PluginRegistry, SnapshotPlugin,
    TrackerHandle,
};

use crate::config::SdkConfig;
use crate::error::{QueueError, Result};
use crate::identity::{KeyValueStoreHandle, SessionManager};
use crate::queue::{BatchingQueue, BeaconTransmitterAdapter};

/// Where the tracker sits in its own lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrackerState {
    Running,
    Paused,
    Destroyed,
}

/// Forwards plugin debug diagnostics to `tracing` when `config.debug()` is
/// set.
struct TracingLogger;

impl beaconkit_plugins::PluginLogger for TracingLogger {
    fn log(&self, message: &str) {
        tracing::debug!(target: "beaconkit", "{message}");
    }
}

/// Owns the emit surface of the BeaconKit analytics instrumentation SDK for
/// one page: identity, the batching queue, and the plugin registry driving
/// auto-capture.
pub struct Tracker {
    config: SdkConfig,
    session: Rc<SessionManager>,
    queue: Rc<BatchingQueue>,
    plugins: RefCell<PluginRegistry>,
    clock: Rc<dyn Clock>,
    state: Cell<TrackerState>,
    user_id: RefCell<Option<String>>,
    #[cfg(target_arch = "wasm32")]
    unload_wiring: RefCell<Option<wasm::UnloadWiring>>,
}

impl Tracker {
    /// Construct a tracker from validated configuration and an optional
    /// identity store (`None` falls back to an in-memory session that does
    /// not survive a reload).
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::TrackerError::Queue`] if the primary HTTP
    /// transmitter could not be constructed from `config`.
    pub fn new(config: SdkConfig, store: Option<KeyValueStoreHandle>) -> Result<Rc<Self>> {
        let clock: Rc<dyn Clock> = Rc::new(MonotonicClock::new(SystemClock));

        let session = Rc::new(SessionManager::new(
            config.session_storage_key().to_string(),
            config.inactivity_timeout_ms(),
            Rc::clone(&clock),
            store,
        ));

        let http_config = HttpTransmitterConfig {
            endpoint: config.endpoint().to_string(),
            timeout: std::time::Duration::from_millis(u64::from(config.transmit_timeout_ms())),
            retry_policy: beaconkit_transport::http::RetryPolicy::default(),
        };
        let http = HttpTransmitter::with_config(http_config).map_err(QueueError::TransmitterInit)?;
        let beacon = BeaconTransmitterAdapter::new(BeaconTransmitter::new(config.beacon_endpoint()));

        let transmitters: Vec<(Box<dyn Transmitter>, i32)> =
            vec![(Box::new(http), 10), (Box::new(beacon), 5)];

        let queue = Rc::new(BatchingQueue::new(
            transmitters,
            config.batch_size(),
            config.batch_timeout_ms(),
            Rc::clone(&clock),
        ));

        Ok(Rc::new(Self {
            config,
            session,
            queue,
            plugins: RefCell::new(PluginRegistry::new()),
            clock,
            state: Cell::new(TrackerState::Running),
            user_id: RefCell::new(None),
            #[cfg(target_arch = "wasm32")]
            unload_wiring: RefCell::new(None),
        }))
    }

    /// Register the built-in auto-capture plugins and initialize them.
    ///
    /// Split out from [`Tracker::new`] because plugin `init` needs a
    /// `Rc<dyn TrackerHandle>` pointing back at `self`, which only exists
    /// once the tracker itself is already behind an `Rc`.
    pub async fn start(self: &Rc<Self>) {
        {
            let mut plugins = self.plugins.borrow_mut();
            let _ = plugins.register(Box::new(PageViewPlugin::new()));
            let _ = plugins.register(Box::new(ClickPlugin::new()));
            let _ = plugins.register(Box::new(SnapshotPlugin::new()));
        }

        let logger: Option<Rc<dyn beaconkit_plugins::PluginLogger>> = if self.config.debug() {
            Some(Rc::new(TracingLogger))
        } else {
            None
        };

        let context = PluginContext {
            tracker: Rc::clone(self) as Rc<dyn TrackerHandle>,
            config: PluginConfigView {
                debug: self.config.debug(),
                snapshot: self.config.snapshot().clone(),
                privacy: self.config.privacy().clone(),
            },
            logger,
        };

        self.plugins.borrow_mut().initialize(context).await;

        #[cfg(target_arch = "wasm32")]
        {
            *self.unload_wiring.borrow_mut() = wasm::install_unload_listener(Rc::clone(&self.queue));
        }
    }

    /// Pause auto-capture without tearing down plugin state.
    pub fn pause(&self) {
        if self.state.get() == TrackerState::Destroyed {
            return;
        }
        self.plugins.borrow_mut().pause_all();
        self.state.set(TrackerState::Paused);
    }

    /// Resume auto-capture after [`Tracker::pause`].
    pub fn resume(&self) {
        if self.state.get() == TrackerState::Destroyed {
            return;
        }
        self.plugins.borrow_mut().resume_all();
        self.state.set(TrackerState::Running);
    }

    /// Tear down plugins and stop accepting further events.
    pub async fn destroy(&self) {
        if self.state.get() == TrackerState::Destroyed {
            return;
        }
        #[cfg(target_arch = "wasm32")]
        if let Some(wiring) = self.unload_wiring.borrow_mut().take() {
            wiring.uninstall();
        }
        self.queue.spawn_flush();
        self.plugins.borrow_mut().destroy().await;
        self.state.set(TrackerState::Destroyed);
    }

    /// `true` once [`Tracker::destroy`] has run.
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.state.get() == TrackerState::Destroyed
    }

    fn running(&self) -> bool {
        matches!(self.state.get(), TrackerState::Running)
    }

    /// Attach `user_id` to every subsequently emitted event, or clear it by
    /// passing `None`.
    pub fn set_user_id(&self, user_id: Option<String>) {
        *self.user_id.borrow_mut() = user_id;
    }

    /// Explicitly override the client id, persisting it through the identity
    /// store immediately.
    pub fn set_client_id(&self, client_id: impl Into<String>) {
        self.session.set_client_id(client_id);
    }

    /// The current session id.
    #[must_use]
    pub fn get_session_id(&self) -> String {
        self.session.get_session_id()
    }

    /// Force-rotate to a brand new session ahead of its natural inactivity
    /// expiry, returning the new session id.
    pub fn new_session(&self) -> String {
        self.session.start_new_session()
    }

    fn event_context(&self) -> EventContext {
        self.session.check_session_expired();
        self.session.update_activity();

        let (url, referrer, page, viewport) = page_context();

        EventContext {
            project_id: self.config.project_id().to_string(),
            client_id: self.session.get_client_id(),
            session_id: self.session.get_session_id(),
            user_id: self.user_id.borrow().clone(),
            url,
            referrer,
            page,
            viewport,
        }
    }

    fn emit(&self, payload: EventPayload, properties: Option<HashMap<String, serde_json::Value>>) {
        if !self.running() {
            return;
        }
        let context = self.event_context();
        match Event::new(context, self.clock.now_ms(), properties, payload) {
            Ok(event) => self.queue.enqueue(event),
            Err(err) => tracing::warn!(error = %err, "dropping event that failed validation"),
        }
    }
}

impl TrackerHandle for Tracker {
    fn track_page_view(&self, is_initial_load: bool) {
        let (title, route) = page_identity();
        self.emit(
            EventPayload::PageView {
                title,
                route,
                is_initial_load,
            },
            None,
        );
    }

    fn track_click(
        &self,
        x: f64,
        y: f64,
        css_selector: String,
        xpath: Option<String>,
        tag_name: String,
        text_hash: Option<String>,
    ) {
        self.emit(
            EventPayload::Click {
                x,
                y,
                selector: css_selector,
                xpath,
                tag_name,
                text_hash,
            },
            None,
        );
    }

    fn track_snapshot(&self, kind: SnapshotKind) {
        if !self.running() || !self.config.snapshot().enabled {
            return;
        }
        let Some(payload) = build_snapshot_payload(kind, self.config.privacy(), self.config.snapshot().max_snapshot_size_bytes) else {
            return;
        };
        self.emit(payload, None);
    }

    fn track_custom(&self, name: String, properties: Option<serde_json::Value>) {
        let properties = properties.and_then(|value| match value {
            serde_json::Value::Object(map) => Some(map.into_iter().collect()),
            _ => None,
        });
        self.emit(EventPayload::Custom { name }, properties);
    }

    fn flush(&self) {
        self.queue.spawn_flush();
    }
}

/// Build a [`beaconkit_protocol::EventPayload::Snapshot`] of the live
/// document. Returns `None` off `wasm32`, where there is no document to
/// capture — the snapshot plugin's `capture_initial` wiring only fires in a
/// real browser.
fn build_snapshot_payload(kind: SnapshotKind, privacy: &PrivacyConfig, max_size_bytes: usize) -> Option<EventPayload> {
    #[cfg(target_arch = "wasm32")]
    {
        wasm::build_snapshot_payload(kind, privacy, max_size_bytes)
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = (kind, privacy, max_size_bytes);
        None
    }
}

#[cfg(target_arch = "wasm32")]
mod wasm {
    use std::rc::Rc;

    use beaconkit_dom::node::WebElement;
    use beaconkit_dom::{build_snapshot, layout_hash, PrivacyConfig};
    use beaconkit_protocol::{EventPayload, ScreenClass, SnapshotKind};
    use wasm_bindgen::prelude::*;
    use wasm_bindgen::JsCast;

    use crate::queue::BatchingQueue;

    /// Holds the `pagehide`/`visibilitychange` closures that flush the queue
    /// through `sendBeacon` during page unload, so `Tracker::destroy` can
    /// detach both listeners instead of leaking them for the page's
    /// remaining lifetime.
    pub struct UnloadWiring {
        pagehide_closure: Closure<dyn FnMut(web_sys::Event)>,
        visibilitychange_closure: Closure<dyn FnMut(web_sys::Event)>,
    }

    impl UnloadWiring {
        pub fn uninstall(self) {
            if let Some(window) = web_sys::window() {
                let _ = window.remove_event_listener_with_callback(
                    "pagehide",
                    self.pagehide_closure.as_ref().unchecked_ref(),
                );
                if let Some(document) = window.document() {
                    let _ = document.remove_event_listener_with_callback(
                        "visibilitychange",
                        self.visibilitychange_closure.as_ref().unchecked_ref(),
                    );
                }
            }
        }
    }

    /// Flushes the queue synchronously through the `"beacon"` transmitter on
    /// `pagehide`, and again whenever the tab is backgrounded
    /// (`visibilitychange` to `hidden`) since mobile browsers do not
    /// reliably fire `pagehide` before suspending a tab.
    pub fn install_unload_listener(queue: Rc<BatchingQueue>) -> Option<UnloadWiring> {
        let window = web_sys::window()?;

        let flush_queue = Rc::clone(&queue);
        let pagehide_closure: Closure<dyn FnMut(web_sys::Event)> =
            Closure::new(move |_event: web_sys::Event| {
                flush_queue.flush_via_beacon();
            });
        let _ = window.add_event_listener_with_callback(
            "pagehide",
            pagehide_closure.as_ref().unchecked_ref(),
        );

        let flush_queue = Rc::clone(&queue);
        let visibilitychange_closure: Closure<dyn FnMut(web_sys::Event)> =
            Closure::new(move |_event: web_sys::Event| {
                if let Some(document) = web_sys::window().and_then(|w| w.document()) {
                    if document.visibility_state() == web_sys::VisibilityState::Hidden {
                        flush_queue.flush_via_beacon();
                    }
                }
            });
        if let Some(document) = window.document() {
            let _ = document.add_event_listener_with_callback(
                "visibilitychange",
                visibilitychange_closure.as_ref().unchecked_ref(),
            );
        }

        Some(UnloadWiring {
            pagehide_closure,
            visibilitychange_closure,
        })
    }

    pub fn build_snapshot_payload(
        kind: SnapshotKind,
        privacy: &PrivacyConfig,
        max_size_bytes: usize,
    ) -> Option<EventPayload> {
        let window = web_sys::window()?;
        let document = window.document()?;
        let root = document.document_element()?;
        let element = WebElement::new(root);

        let hash = layout_hash(&element);
        let snapshot = build_snapshot(&element, privacy, max_size_bytes);
        let viewport_width = window.inner_width().ok()?.as_f64()? as u32;

        Some(EventPayload::Snapshot {
            kind,
            screen_class: ScreenClass::from_viewport_width(viewport_width),
            layout_hash: hash,
            dom: snapshot.dom,
            compression: snapshot.compression,
            original_size: snapshot.original_size,
            compressed_size: snapshot.compressed_size,
            truncated: snapshot.truncated,
            mask_metadata: snapshot.mask_metadata,
            schema_version: beaconkit_dom::snapshot::SCHEMA_VERSION.to_string(),
        })
    }
}

#[cfg(target_arch = "wasm32")]
fn page_context() -> (String, String, PageDimensions, ViewportDimensions) {
    let zero_page = PageDimensions {
        scroll_width: 0,
        scroll_height: 0,
    };
    let zero_viewport = ViewportDimensions {
        inner_width: 0,
        inner_height: 0,
    };
    let Some(window) = web_sys::window() else {
        return (String::new(), String::new(), zero_page, zero_viewport);
    };
    let url = window.location().href().unwrap_or_default();
    let referrer = window.document().map(|d| d.referrer()).unwrap_or_default();
    let page = window
        .document()
        .and_then(|d| d.document_element())
        .map(|el| PageDimensions {
            scroll_width: el.scroll_width().max(0) as u32,
            scroll_height: el.scroll_height().max(0) as u32,
        })
        .unwrap_or(zero_page);
    let viewport = ViewportDimensions {
        inner_width: window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(0.0) as u32,
        inner_height: window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(0.0) as u32,
    };
    (url, referrer, page, viewport)
}

#[cfg(not(target_arch = "wasm32"))]
fn page_context() -> (String, String, PageDimensions, ViewportDimensions) {
    (
        String::new(),
        String::new(),
        PageDimensions {
            scroll_width: 0,
            scroll_height: 0,
        },
        ViewportDimensions {
            inner_width: 0,
            inner_height: 0,
        },
    )
}

#[cfg(target_arch = "wasm32")]
fn page_identity() -> (String, String) {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return (String::new(), String::new());
    };
    let title = document.title();
    let route = document.location().map(|l| l.pathname().unwrap_or_default()).unwrap_or_default();
    (title, route)
}

#[cfg(not(target_arch = "wasm32"))]
fn page_identity() -> (String, String) {
    (String::new(), String::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SdkConfig {
        SdkConfig::try_new("proj", "https://collect.example.com/v1").unwrap()
    }

    #[tokio::test]
    async fn new_tracker_starts_running_and_accepts_events() {
        tokio::task::LocalSet::new()
            .run_until(async {
                let tracker = Tracker::new(config(), None).unwrap();
                tracker.track_custom("hello".to_string(), None);
                assert_eq!(tracker.queue.pending_len(), 1);
            })
            .await;
    }

    #[tokio::test]
    async fn paused_tracker_drops_new_events() {
        tokio::task::LocalSet::new()
            .run_until(async {
                let tracker = Tracker::new(config(), None).unwrap();
                tracker.pause();
                tracker.track_custom("hello".to_string(), None);
                assert_eq!(tracker.queue.pending_len(), 0);
            })
            .await;
    }

    #[tokio::test]
    async fn resume_restores_event_acceptance() {
        tokio::task::LocalSet::new()
            .run_until(async {
                let tracker = Tracker::new(config(), None).unwrap();
                tracker.pause();
                tracker.resume();
                tracker.track_custom("hello".to_string(), None);
                assert_eq!(tracker.queue.pending_len(), 1);
            })
            .await;
    }

    #[tokio::test]
    async fn destroyed_tracker_stays_destroyed() {
        tokio::task::LocalSet::new()
            .run_until(async {
                let tracker = Tracker::new(config(), None).unwrap();
                tracker.destroy().await;
                assert!(tracker.is_destroyed());
                tracker.track_custom("hello".to_string(), None);
                assert_eq!(tracker.queue.pending_len(), 0);
            })
            .await;
    }

    #[tokio::test]
    async fn snapshot_capture_is_a_noop_off_wasm() {
        let tracker = Tracker::new(config(), None).unwrap();
        tracker.track_snapshot(SnapshotKind::Initial);
        assert_eq!(tracker.queue.pending_len(), 0);
    }

    #[tokio::test]
    async fn set_user_id_is_threaded_into_event_context() {
        let tracker = Tracker::new(config(), None).unwrap();
        assert_eq!(tracker.event_context().user_id, None);

        tracker.set_user_id(Some("user-42".to_string()));
        assert_eq!(tracker.event_context().user_id, Some("user-42".to_string()));

        tracker.set_user_id(None);
        assert_eq!(tracker.event_context().user_id, None);
    }

    #[tokio::test]
    async fn set_client_id_overrides_the_session_manager() {
        let tracker = Tracker::new(config(), None).unwrap();
        tracker.set_client_id("client-99");
        assert_eq!(tracker.event_context().client_id, "client-99");
    }

    #[tokio::test]
    async fn new_session_rotates_the_session_id() {
        let tracker = Tracker::new(config(), None).unwrap();
        let first = tracker.get_session_id();
        let rotated = tracker.new_session();
        assert_ne!(rotated, first);
        assert_eq!(tracker.get_session_id(), rotated);
    }
}
