//! Plugin registration and lifecycle.

use std::collections::HashSet;

use crate::error::{PluginError, Result};
use crate::plugin::{Plugin, PluginContext};

/// Owns registered plugins and drives their lifecycle.
///
/// `register` is only valid before [`PluginRegistry::initialize`] has run;
/// after that, `initialize`/`destroy` are the only transitions available.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: Vec<Box<dyn Plugin>>,
    names: HashSet<String>,
    initialized: bool,
}

impl PluginRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::AlreadyInitialized`] if called after
    /// `initialize`, or [`PluginError::DuplicateName`] if a plugin with the
    /// same name is already registered.
    pub fn register(&mut self, plugin: Box<dyn Plugin>) -> Result<()> {
        if self.initialized {
            return Err(PluginError::AlreadyInitialized(plugin.name().to_string()));
        }
        if !self.names.insert(plugin.name().to_string()) {
            return Err(PluginError::DuplicateName(plugin.name().to_string()));
        }
        self.plugins.push(plugin);
        Ok(())
    }

    /// Initialize every registered plugin, in registration order.
    ///
    /// A plugin whose `init` fails is logged and skipped; the remaining
    /// plugins still initialize. Calling this twice is a no-op.
    pub async fn initialize(&mut self, context: PluginContext) {
        if self.initialized {
            return;
        }
        for plugin in &mut self.plugins {
            if let Err(err) = plugin.init(context.clone()).await {
                tracing::warn!(plugin = plugin.name(), error = %err, "plugin init failed");
                context.log(&format!("plugin '{}' failed to initialize: {err}", plugin.name()));
            }
        }
        self.initialized = true;
    }

    /// Pause every plugin. Optional pass-through; plugins with nothing to
    /// pause simply no-op.
    pub fn pause_all(&mut self) {
        for plugin in &mut self.plugins {
            plugin.pause();
        }
    }

    /// Resume every plugin after [`PluginRegistry::pause_all`].
    pub fn resume_all(&mut self) {
        for plugin in &mut self.plugins {
            plugin.resume();
        }
    }

    /// Tear down every plugin, clear the registry, and reset the
    /// initialized flag so a fresh `register`/`initialize` cycle is
    /// possible.
    pub async fn destroy(&mut self) {
        for plugin in &mut self.plugins {
            if let Err(err) = plugin.destroy().await {
                tracing::warn!(plugin = plugin.name(), error = %err, "plugin destroy failed");
            }
        }
        self.plugins.clear();
        self.names.clear();
        self.initialized = false;
    }

    /// Number of registered plugins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Whether the registry holds no plugins.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Whether `initialize` has already run.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result as PluginResult;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct RecordingTracker {
        calls: Rc<RefCell<Vec<String>>>,
    }

    impl crate::plugin::TrackerHandle for RecordingTracker {
        fn track_page_view(&self, is_initial_load: bool) {
            self.calls.borrow_mut().push(format!("page_view:{is_initial_load}"));
        }
        fn track_click(
            &self,
            _x: f64,
            _y: f64,
            _css_selector: String,
            _xpath: Option<String>,
            _tag_name: String,
            _text_hash: Option<String>,
        ) {
            self.calls.borrow_mut().push("click".to_string());
        }
        fn track_snapshot(&self, _kind: beaconkit_protocol::SnapshotKind) {
            self.calls.borrow_mut().push("snapshot".to_string());
        }
        fn track_custom(&self, name: String, _properties: Option<serde_json::Value>) {
            self.calls.borrow_mut().push(format!("custom:{name}"));
        }
        fn flush(&self) {
            self.calls.borrow_mut().push("flush".to_string());
        }
    }

    fn context() -> (PluginContext, Rc<RefCell<Vec<String>>>) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let tracker = Rc::new(RecordingTracker { calls: calls.clone() });
        (
            PluginContext {
                tracker,
                config: crate::plugin::PluginConfigView::default(),
                logger: None,
            },
            calls,
        )
    }

    struct NamedPlugin {
        name: &'static str,
        init_result: std::result::Result<(), &'static str>,
        destroyed: Rc<RefCell<bool>>,
    }

    #[async_trait::async_trait(?Send)]
    impl Plugin for NamedPlugin {
        fn name(&self) -> &str {
            self.name
        }

        async fn init(&mut self, context: PluginContext) -> PluginResult<()> {
            context.tracker.track_custom(self.name.to_string(), None);
            match self.init_result {
                Ok(()) => Ok(()),
                Err(_msg) => Err(PluginError::DuplicateName("forced failure".to_string())),
            }
        }

        async fn destroy(&mut self) -> PluginResult<()> {
            *self.destroyed.borrow_mut() = true;
            Ok(())
        }
    }

    fn plugin(name: &'static str, ok: bool) -> Box<dyn Plugin> {
        Box::new(NamedPlugin {
            name,
            init_result: if ok { Ok(()) } else { Err("boom") },
            destroyed: Rc::new(RefCell::new(false)),
        })
    }

    #[tokio::test]
    async fn register_rejects_duplicate_names() {
        let mut registry = PluginRegistry::new();
        registry.register(plugin("page-view", true)).unwrap();
        let err = registry.register(plugin("page-view", true)).unwrap_err();
        assert!(matches!(err, PluginError::DuplicateName(_)));
    }

    #[tokio::test]
    async fn register_rejects_after_initialize() {
        let mut registry = PluginRegistry::new();
        let (context, _calls) = context();
        registry.initialize(context).await;
        let err = registry.register(plugin("late", true)).unwrap_err();
        assert!(matches!(err, PluginError::AlreadyInitialized(_)));
    }

    #[tokio::test]
    async fn initialize_runs_every_plugin_even_if_one_fails() {
        let mut registry = PluginRegistry::new();
        registry.register(plugin("a", false)).unwrap();
        registry.register(plugin("b", true)).unwrap();
        let (context, calls) = context();
        registry.initialize(context).await;
        assert!(registry.is_initialized());
        assert_eq!(calls.borrow().as_slice(), ["custom:a", "custom:b"]);
    }

    #[tokio::test]
    async fn destroy_clears_the_registry_and_resets_initialized() {
        let mut registry = PluginRegistry::new();
        registry.register(plugin("a", true)).unwrap();
        let (context, _calls) = context();
        registry.initialize(context).await;
        registry.destroy().await;
        assert!(registry.is_empty());
        assert!(!registry.is_initialized());
        registry.register(plugin("a", true)).unwrap();
    }
}
