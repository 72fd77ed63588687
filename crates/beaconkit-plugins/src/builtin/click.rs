//! Document-level click capture via event delegation.

use async_trait::async_trait;
use beaconkit_dom::{css_selector, xpath, DomNode};

use crate::error::Result;
use crate::plugin::{Plugin, PluginContext};

const DO_NOT_TRACK_ATTR: &str = "data-analytics-snapshot";

/// Details extracted from a resolved click target, ready to hand to
/// [`crate::plugin::TrackerHandle::track_click`].
#[derive(Debug, Clone, PartialEq)]
pub struct ClickDetails {
    /// Page-relative x coordinate.
    pub x: f64,
    /// Page-relative y coordinate.
    pub y: f64,
    /// CSS selector path from [`beaconkit_dom::css_selector`].
    pub css_selector: String,
    /// XPath from [`beaconkit_dom::xpath`].
    pub xpath: String,
    /// Uppercase tag name.
    pub tag_name: String,
    /// Non-cryptographic hash of the element's visible text, if any.
    pub text_hash: Option<String>,
}

/// Resolve click details for `target`, or `None` if the element or one of
/// its ancestors opts out via `data-analytics-snapshot="off"`.
pub fn resolve_click<N: DomNode>(target: &N, coordinates: Option<(f64, f64)>) -> Option<ClickDetails> {
    if has_do_not_track_ancestor(target) {
        return None;
    }

    let (x, y) = coordinates.unwrap_or_else(|| {
        let rect = target.bounding_rect();
        (rect.x, rect.y)
    });

    Some(ClickDetails {
        x,
        y,
        css_selector: css_selector(target),
        xpath: xpath(target),
        tag_name: target.tag_name().to_uppercase(),
        text_hash: hash_text(&target.text_content()),
    })
}

fn has_do_not_track_ancestor<N: DomNode>(node: &N) -> bool {
    let mut current = Some(node.clone());
    while let Some(n) = current {
        if n.attribute(DO_NOT_TRACK_ATTR).as_deref() == Some("off") {
            return true;
        }
        current = n.parent();
    }
    false
}

fn hash_text(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    trimmed.hash(&mut hasher);
    Some(format!("{:x}", hasher.finish()))
}

/// A single document-level click listener that resolves the event target
/// and forwards a click event to the tracker.
pub struct ClickPlugin {
    enabled: bool,
    #[cfg(target_arch = "wasm32")]
    wiring: Option<wasm::Wiring>,
}

impl ClickPlugin {
    /// Create a new, unpaused click plugin.
    #[must_use]
    pub fn new() -> Self {
        Self {
            enabled: true,
            #[cfg(target_arch = "wasm32")]
            wiring: None,
        }
    }
}

impl Default for ClickPlugin {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait(?Send)]
impl Plugin for ClickPlugin {
    fn name(&self) -> &str {
        "click-tracking"
    }

    #[cfg(not(target_arch = "wasm32"))]
    async fn init(&mut self, _context: PluginContext) -> Result<()> {
        Ok(())
    }

    #[cfg(target_arch = "wasm32")]
    async fn init(&mut self, context: PluginContext) -> Result<()> {
        self.wiring = wasm::install(context);
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

    use beaconkit_dom::node::WebElement;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen::JsCast;

    use crate::plugin::PluginContext;

    pub struct Wiring {
        closure: Closure<dyn FnMut(web_sys::MouseEvent)>,
    }

    impl Wiring {
        pub fn uninstall(self) {
            if let Some(document) = web_sys::window().and_then(|w| w.document()) {
                let _ = document.remove_event_listener_with_callback(
                    "click",
                    self.closure.as_ref().unchecked_ref(),
                );
            }
        }
    }

    pub fn install(context: PluginContext) -> Option<Wiring> {
        let document = web_sys::window()?.document()?;
        let enabled = Rc::new(Cell::new(true));
        let enabled_for_closure = enabled.clone();

        let closure: Closure<dyn FnMut(web_sys::MouseEvent)> = Closure::new(move |event: web_sys::MouseEvent| {
            if !enabled_for_closure.get() {
                return;
            }
            let Some(target) = event
                .target()
                .and_then(|t| t.dyn_into::<web_sys::Element>().ok())
            else {
                return;
            };
            let element = WebElement::new(target);
            if let Some(details) =
                super::resolve_click(&element, Some((event.page_x() as f64, event.page_y() as f64)))
            {
                context.tracker.track_click(
                    details.x,
                    details.y,
                    details.css_selector,
                    Some(details.xpath),
                    details.tag_name,
                    details.text_hash,
                );
            }
        });

        let _ = document
            .add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());

        Some(Wiring { closure })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beaconkit_dom::InMemoryElement;

    #[test]
    fn resolves_selector_and_tag_name_for_a_plain_click() {
        let target = InMemoryElement::new("button").with_attribute("id", "submit");
        let details = resolve_click(&target, Some((10.0, 20.0))).unwrap();
        assert_eq!(details.tag_name, "BUTTON");
        assert_eq!(details.x, 10.0);
        assert_eq!(details.y, 20.0);
        assert!(details.css_selector.contains("#submit"));
    }

    #[test]
    fn opt_out_marker_on_an_ancestor_suppresses_capture() {
        let root = InMemoryElement::new("div").with_attribute(DO_NOT_TRACK_ATTR, "off");
        let child = InMemoryElement::new("span").with_text("click me");
        let root = root.child(child);
        let child = root.children().into_iter().next().unwrap();
        assert!(resolve_click(&child, None).is_none());
    }

    #[test]
    fn empty_text_content_yields_no_hash() {
        let target = InMemoryElement::new("div");
        let details = resolve_click(&target, Some((0.0, 0.0))).unwrap();
        assert!(details.text_hash.is_none());
    }

    #[test]
    fn identical_text_hashes_identically() {
        let a = InMemoryElement::new("p").with_text("hello world");
        let b = InMemoryElement::new("p").with_text("hello world");
        assert_eq!(
            resolve_click(&a, Some((0.0, 0.0))).unwrap().text_hash,
            resolve_click(&b, Some((0.0, 0.0))).unwrap().text_hash
        );
    }
}
