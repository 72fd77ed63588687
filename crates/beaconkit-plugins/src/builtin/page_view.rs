//! Initial-load and SPA-navigation page-view capture.

use async_trait::async_trait;

use crate::error::Result;
use crate::plugin::{Plugin, PluginContext};

/// Tracks the initial page load and subsequent SPA navigations.
///
/// On `wasm32` this monkey-patches `history.pushState` (preserving and
/// forwarding to the original) and listens for `popstate`; on other targets
/// `init` simply fires the initial page-view synchronously, which keeps the
/// enrichment and enable/disable logic testable without a browser.
pub struct PageViewPlugin {
    enabled: bool,
    #[cfg(target_arch = "wasm32")]
    wiring: Option<wasm::Wiring>,
}

impl PageViewPlugin {
    /// Create a new, unpaused page-view plugin.
    #[must_use]
    pub fn new() -> Self {
        Self {
            enabled: true,
            #[cfg(target_arch = "wasm32")]
            wiring: None,
        }
    }
}

impl Default for PageViewPlugin {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait(?Send)]
impl Plugin for PageViewPlugin {
    fn name(&self) -> &str {
        "page-view"
    }

    #[cfg(not(target_arch = "wasm32"))]
    async fn init(&mut self, context: PluginContext) -> Result<()> {
        context.tracker.track_page_view(true);
        Ok(())
    }

    #[cfg(target_arch = "wasm32")]
    async fn init(&mut self, context: PluginContext) -> Result<()> {
        self.wiring = wasm::install(context.clone());
        context.tracker.track_page_view(true);
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
    use std::cell::Cell;
    use std::rc::Rc;

    use wasm_bindgen::prelude::*;
    use wasm_bindgen::JsCast;

    use crate::plugin::PluginContext;

    /// Holds every closure and the original `pushState` reference so
    /// `destroy` can fully restore the page's history object.
    pub struct Wiring {
        popstate_closure: Closure<dyn FnMut(web_sys::Event)>,
        original_push_state: JsValue,
        enabled: Rc<Cell<bool>>,
    }

    impl Wiring {
        pub fn uninstall(self) {
            if let Some(window) = web_sys::window() {
                let _ = window
                    .remove_event_listener_with_callback(
                        "popstate",
                        self.popstate_closure.as_ref().unchecked_ref(),
                    );
                let history = window.history();
                if let Ok(history) = history {
                    let _ = js_sys::Reflect::set(
                        &history,
                        &JsValue::from_str("pushState"),
                        &self.original_push_state,
                    );
                }
            }
        }
    }

    pub fn install(context: PluginContext) -> Option<Wiring> {
        let window = web_sys::window()?;
        let history = window.history().ok()?;

        let enabled = Rc::new(Cell::new(true));

        let popstate_context = context.clone();
        let popstate_enabled = enabled.clone();
        let popstate_closure: Closure<dyn FnMut(web_sys::Event)> =
            Closure::new(move |_event: web_sys::Event| {
                if popstate_enabled.get() {
                    popstate_context.tracker.track_page_view(false);
                }
            });
        let _ = window
            .add_event_listener_with_callback("popstate", popstate_closure.as_ref().unchecked_ref());

        let original_push_state = js_sys::Reflect::get(&history, &JsValue::from_str("pushState")).ok()?;
        let original_fn: js_sys::Function = original_push_state.clone().dyn_into().ok()?;

        let patched_context = context;
        let patched_enabled = enabled.clone();
        let patched: Closure<dyn FnMut(JsValue, JsValue, JsValue, JsValue) -> JsValue> =
            Closure::new(move |this: JsValue, state: JsValue, title: JsValue, url: JsValue| {
                let result = original_fn
                    .call3(&this, &state, &title, &url)
                    .unwrap_or(JsValue::UNDEFINED);
                if patched_enabled.get() {
                    patched_context.tracker.track_page_view(false);
                }
                result
            });
        let _ = js_sys::Reflect::set(
            &history,
            &JsValue::from_str("pushState"),
            patched.as_ref().unchecked_ref(),
        );
        patched.forget();

        Some(Wiring {
            popstate_closure,
            original_push_state,
            enabled,
        })
    }
}
