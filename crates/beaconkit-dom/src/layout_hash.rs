//! Deterministic structural digest of a DOM subtree.

use sha2::{Digest, Sha256};

use crate::node::DomNode;

/// Minimum depth the walk is guaranteed to cover, per spec.
pub const MIN_DEPTH: usize = 20;

const TRANSIENT_CLASS_PREFIXES: &[&str] = &["active", "selected", "open", "hidden", "show"];
const MAX_CLASSES_PER_NODE: usize = 3;

fn is_transient_class(class: &str) -> bool {
    TRANSIENT_CLASS_PREFIXES
        .iter()
        .any(|prefix| class.starts_with(prefix))
}

/// Compute a `sha256:`-prefixed layout hash for `root`, walking to at least
/// [`MIN_DEPTH`] levels.
///
/// The hash covers tag name, id, up to three non-transient class names, and
/// the integer-rounded bounding rect of every element in the walk — never
/// text content, so copy edits don't change the hash but structural and
/// layout changes do.
pub fn layout_hash<N: DomNode>(root: &N) -> String {
    let mut hasher = Sha256::new();
    hash_node(root, 0, &mut hasher);
    format!("sha256:{:x}", hasher.finalize())
}

fn hash_node<N: DomNode>(node: &N, depth: usize, hasher: &mut Sha256) {
    hasher.update(node.tag_name().as_bytes());
    hasher.update(b"|");

    if let Some(id) = node.id() {
        hasher.update(b"#");
        hasher.update(id.as_bytes());
    }
    hasher.update(b"|");

    let mut classes: Vec<String> = node
        .class_list()
        .into_iter()
        .filter(|c| !is_transient_class(c))
        .collect();
    classes.truncate(MAX_CLASSES_PER_NODE);
    hasher.update(classes.join(".").as_bytes());
    hasher.update(b"|");

    let rect = node.bounding_rect();
    hasher.update(format!("{}x{}", rect.width as i64, rect.height as i64).as_bytes());
    hasher.update(b";");

    if depth >= MIN_DEPTH {
        return;
    }
    for child in node.children() {
        hash_node(&child, depth + 1, hasher);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{InMemoryElement, Rect};

    #[test]
    fn identical_structure_produces_identical_hash() {
        let build = || {
            InMemoryElement::new("div")
                .with_attribute("id", "root")
                .with_rect(Rect {
                    x: 0.0,
                    y: 0.0,
                    width: 100.0,
                    height: 50.0,
                })
                .child(InMemoryElement::new("span").with_attribute("class", "label"))
        };
        assert_eq!(layout_hash(&build()), layout_hash(&build()));
    }

    #[test]
    fn text_content_does_not_affect_hash() {
        let tree_a = InMemoryElement::new("p").with_text("hello");
        let tree_b = InMemoryElement::new("p").with_text("goodbye");
        assert_eq!(layout_hash(&tree_a), layout_hash(&tree_b));
    }

    #[test]
    fn transient_classes_are_excluded() {
        let with_transient =
            InMemoryElement::new("div").with_attribute("class", "card active");
        let without = InMemoryElement::new("div").with_attribute("class", "card");
        assert_eq!(layout_hash(&with_transient), layout_hash(&without));
    }

    #[test]
    fn structural_change_alters_the_hash() {
        let flat = InMemoryElement::new("div");
        let nested = InMemoryElement::new("div").child(InMemoryElement::new("span"));
        assert_ne!(layout_hash(&flat), layout_hash(&nested));
    }

    #[test]
    fn hash_is_prefixed_for_forward_compatibility() {
        assert!(layout_hash(&InMemoryElement::new("div")).starts_with("sha256:"));
    }
}
