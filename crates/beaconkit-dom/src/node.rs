//! A minimal, read-only view over an element tree.
//!
//! Selector generation and layout hashing only ever need to read structure
//! (tag, id, classes, siblings, geometry) — never mutate it — so they are
//! written against this trait rather than directly against `web_sys`. That
//! lets the same algorithm run against a real page in the browser and
//! against an in-memory fixture in tests.

/// An element's position and size in the page's coordinate space.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    /// Distance from the left edge of the page.
    pub x: f64,
    /// Distance from the top edge of the page.
    pub y: f64,
    /// Rendered width.
    pub width: f64,
    /// Rendered height.
    pub height: f64,
}

/// Read-only access to one element and its ancestry/descendants.
///
/// Implemented for [`InMemoryElement`] (tests, and any non-browser host) and,
/// on `wasm32`, for a `web_sys::Element` wrapper.
pub trait DomNode: Clone {
    /// The element's lowercase tag name, e.g. `"div"`.
    fn tag_name(&self) -> String;

    /// The element's `id` attribute, if set and non-empty.
    fn id(&self) -> Option<String>;

    /// The element's class list, in source order.
    fn class_list(&self) -> Vec<String>;

    /// The value of attribute `name`, if present.
    fn attribute(&self, name: &str) -> Option<String>;

    /// All attribute names present on this element.
    fn attribute_names(&self) -> Vec<String>;

    /// This element's children, in document order. Text nodes are not
    /// represented as children; use [`DomNode::text_content`] instead.
    fn children(&self) -> Vec<Self>;

    /// This element's parent, or `None` at the tree root.
    fn parent(&self) -> Option<Self>;

    /// Element siblings before this one, nearest first is not required —
    /// callers only care about the count and tag names.
    fn preceding_siblings(&self) -> Vec<Self>;

    /// The concatenation of this element's descendant text nodes.
    fn text_content(&self) -> String;

    /// The `value` IDL property, for form elements. `None` for elements that
    /// don't have one.
    fn value(&self) -> Option<String>;

    /// Layout rectangle in page coordinates.
    fn bounding_rect(&self) -> Rect;
}

/// An owned, in-memory element tree.
///
/// Used directly in tests, and as the target of
/// [`crate::snapshot::build_snapshot_tree`]'s deep clone on every platform —
/// the snapshot builder never needs the live document, only a read-only
/// [`DomNode`] view of it to copy out of.
#[derive(Debug, Clone, Default)]
pub struct InMemoryElement {
    /// Fields are `Rc`-shared so `children()`/`parent()` can cheaply hand out
    /// clones without copying subtrees, matching the zero-copy feel of a
    /// live DOM handle.
    inner: std::rc::Rc<InMemoryElementInner>,
}

#[derive(Debug)]
struct InMemoryElementInner {
    tag: String,
    attributes: std::collections::BTreeMap<String, String>,
    text: String,
    value: Option<String>,
    rect: Rect,
    children: std::cell::RefCell<Vec<InMemoryElement>>,
    parent: std::cell::RefCell<Option<std::rc::Weak<InMemoryElementInner>>>,
}

impl InMemoryElement {
    /// Build a new element with tag `tag`. Use [`InMemoryElement::child`] to
    /// grow the tree and [`InMemoryElement::with_attribute`]/etc. to attach
    /// state before children are added.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            inner: std::rc::Rc::new(InMemoryElementInner {
                tag: tag.into(),
                attributes: std::collections::BTreeMap::new(),
                text: String::new(),
                value: None,
                rect: Rect::default(),
                children: std::cell::RefCell::new(Vec::new()),
                parent: std::cell::RefCell::new(None),
            }),
        }
    }

    /// Set an attribute, builder-style. Only valid before the element is
    /// attached as a child (attributes are otherwise immutable, matching the
    /// read-only contract of [`DomNode`]).
    pub fn with_attribute(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        // `Rc::get_mut` succeeds only while this is the sole owner, i.e.
        // before `child()` has handed out a parent-pointing clone.
        let mut this = self;
        if let Some(inner) = std::rc::Rc::get_mut(&mut this.inner) {
            inner.attributes.insert(name.into(), value.into());
        }
        this
    }

    /// Set the text content, builder-style.
    pub fn with_text(self, text: impl Into<String>) -> Self {
        let mut this = self;
        if let Some(inner) = std::rc::Rc::get_mut(&mut this.inner) {
            inner.text = text.into();
        }
        this
    }

    /// Set the form `value`, builder-style.
    pub fn with_value(self, value: impl Into<String>) -> Self {
        let mut this = self;
        if let Some(inner) = std::rc::Rc::get_mut(&mut this.inner) {
            inner.value = Some(value.into());
        }
        this
    }

    /// Set the bounding rect, builder-style.
    pub fn with_rect(self, rect: Rect) -> Self {
        let mut this = self;
        if let Some(inner) = std::rc::Rc::get_mut(&mut this.inner) {
            inner.rect = rect;
        }
        this
    }

    /// Append `child`, linking its parent pointer back to `self`.
    pub fn child(self, child: InMemoryElement) -> Self {
        *child.inner.parent.borrow_mut() = Some(std::rc::Rc::downgrade(&self.inner));
        self.inner.children.borrow_mut().push(child);
        self
    }
}

impl DomNode for InMemoryElement {
    fn tag_name(&self) -> String {
        self.inner.tag.to_lowercase()
    }

    fn id(&self) -> Option<String> {
        self.inner
            .attributes
            .get("id")
            .filter(|v| !v.is_empty())
            .cloned()
    }

    fn class_list(&self) -> Vec<String> {
        self.inner
            .attributes
            .get("class")
            .map(|v| v.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.inner.attributes.get(name).cloned()
    }

    fn attribute_names(&self) -> Vec<String> {
        self.inner.attributes.keys().cloned().collect()
    }

    fn children(&self) -> Vec<Self> {
        self.inner.children.borrow().clone()
    }

    fn parent(&self) -> Option<Self> {
        self.inner
            .parent
            .borrow()
            .as_ref()
            .and_then(|weak| weak.upgrade())
            .map(|inner| InMemoryElement { inner })
    }

    fn preceding_siblings(&self) -> Vec<Self> {
        let Some(parent) = self.parent() else {
            return Vec::new();
        };
        let siblings = parent.inner.children.borrow();
        let Some(pos) = siblings
            .iter()
            .position(|c| std::rc::Rc::ptr_eq(&c.inner, &self.inner))
        else {
            return Vec::new();
        };
        siblings[..pos].to_vec()
    }

    fn text_content(&self) -> String {
        self.inner.text.clone()
    }

    fn value(&self) -> Option<String> {
        self.inner.value.clone()
    }

    fn bounding_rect(&self) -> Rect {
        self.inner.rect
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm::WebElement;

#[cfg(target_arch = "wasm32")]
mod wasm {
    use super::{DomNode, Rect};
    use wasm_bindgen::JsCast;

    /// A `web_sys::Element` wrapper implementing [`DomNode`].
    #[derive(Clone)]
    pub struct WebElement(web_sys::Element);

    impl WebElement {
        /// Wrap a live DOM element.
        pub fn new(element: web_sys::Element) -> Self {
            Self(element)
        }
    }

    impl DomNode for WebElement {
        fn tag_name(&self) -> String {
            self.0.tag_name().to_lowercase()
        }

        fn id(&self) -> Option<String> {
            let id = self.0.id();
            (!id.is_empty()).then_some(id)
        }

        fn class_list(&self) -> Vec<String> {
            let list = self.0.class_list();
            (0..list.length())
                .filter_map(|i| list.item(i))
                .collect()
        }

        fn attribute(&self, name: &str) -> Option<String> {
            self.0.get_attribute(name)
        }

        fn attribute_names(&self) -> Vec<String> {
            let attrs = self.0.attributes();
            (0..attrs.length())
                .filter_map(|i| attrs.item(i))
                .map(|a| a.name())
                .collect()
        }

        fn children(&self) -> Vec<Self> {
            let collection = self.0.children();
            (0..collection.length())
                .filter_map(|i| collection.item(i))
                .map(WebElement::new)
                .collect()
        }

        fn parent(&self) -> Option<Self> {
            self.0
                .parent_element()
                .map(WebElement::new)
        }

        fn preceding_siblings(&self) -> Vec<Self> {
            let Some(parent) = self.parent() else {
                return Vec::new();
            };
            let siblings = parent.children();
            let pos = siblings
                .iter()
                .position(|c| c.0.is_same_node(Some(&self.0)))
                .unwrap_or(0);
            siblings[..pos].to_vec()
        }

        fn text_content(&self) -> String {
            self.0.text_content().unwrap_or_default()
        }

        fn value(&self) -> Option<String> {
            self.0
                .dyn_ref::<web_sys::HtmlInputElement>()
                .map(|input| input.value())
        }

        fn bounding_rect(&self) -> Rect {
            let rect = self.0.get_bounding_client_rect();
            Rect {
                x: rect.x(),
                y: rect.y(),
                width: rect.width(),
                height: rect.height(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_a_small_tree_with_parent_links() {
        let child = InMemoryElement::new("span").with_attribute("id", "s1");
        let root = InMemoryElement::new("div")
            .with_attribute("id", "root")
            .child(child.clone());

        assert_eq!(root.children().len(), 1);
        assert_eq!(root.children()[0].id(), Some("s1".to_string()));
        assert_eq!(
            root.children()[0].parent().unwrap().id(),
            Some("root".to_string())
        );
    }

    #[test]
    fn preceding_siblings_excludes_self_and_later_nodes() {
        let root = InMemoryElement::new("ul")
            .child(InMemoryElement::new("li").with_text("a"))
            .child(InMemoryElement::new("li").with_text("b"))
            .child(InMemoryElement::new("li").with_text("c"));

        let third = &root.children()[2];
        assert_eq!(third.preceding_siblings().len(), 2);
    }
}
