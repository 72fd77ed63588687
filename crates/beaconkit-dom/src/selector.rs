//! CSS selector and XPath generation for a clicked element.

use crate::node::DomNode;

/// Build a CSS selector path from `node` up to the nearest ancestor with an
/// `id`, or to the document body if none is found.
///
/// Each level contributes its tag name; when preceding siblings share that
/// tag name, `:nth-of-type(k)` (1-based) disambiguates. An ancestor with an
/// `id` stops the walk and contributes `#id` instead of continuing further
/// up, since an id is already a stable anchor.
pub fn css_selector<N: DomNode>(node: &N) -> String {
    let mut segments = Vec::new();
    let mut current = Some(node.clone());

    while let Some(n) = current {
        if let Some(id) = n.id() {
            segments.push(format!("#{id}"));
            break;
        }

        segments.push(tag_segment(&n));

        if n.tag_name() == "body" {
            break;
        }

        current = n.parent();
    }

    segments.reverse();
    segments.join(" > ")
}

fn tag_segment<N: DomNode>(node: &N) -> String {
    let tag = node.tag_name();
    let same_tag_before = node
        .preceding_siblings()
        .iter()
        .filter(|s| s.tag_name() == tag)
        .count();

    if same_tag_before > 0 {
        format!("{tag}:nth-of-type({})", same_tag_before + 1)
    } else {
        tag
    }
}

/// Build an XPath from `node` to the document root, using a positional
/// index `tag[k]` (1-based) at every level regardless of id — unlike
/// [`css_selector`], which stops early at an id, XPath generation always
/// walks to the root so the path is self-contained.
pub fn xpath<N: DomNode>(node: &N) -> String {
    let mut segments = Vec::new();
    let mut current = Some(node.clone());

    while let Some(n) = current {
        let tag = n.tag_name();
        let index = n
            .preceding_siblings()
            .iter()
            .filter(|s| s.tag_name() == tag)
            .count()
            + 1;
        segments.push(format!("{tag}[{index}]"));
        current = n.parent();
    }

    segments.reverse();
    format!("/{}", segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::InMemoryElement;

    fn sample_tree() -> InMemoryElement {
        let target = InMemoryElement::new("button").with_text("Buy");
        let card = InMemoryElement::new("div")
            .with_attribute("class", "card")
            .child(InMemoryElement::new("button"))
            .child(target.clone());
        InMemoryElement::new("body")
            .with_attribute("id", "")
            .child(
                InMemoryElement::new("div")
                    .with_attribute("id", "app")
                    .child(card),
            )
    }

    fn find_target(root: &InMemoryElement) -> InMemoryElement {
        root.children()[0].children()[0].children()[1].clone()
    }

    #[test]
    fn css_selector_stops_at_nearest_id_ancestor() {
        let root = sample_tree();
        let target = find_target(&root);
        assert_eq!(css_selector(&target), "#app > div > button:nth-of-type(2)");
    }

    #[test]
    fn xpath_walks_to_root_regardless_of_id() {
        let root = sample_tree();
        let target = find_target(&root);
        let path = xpath(&target);
        assert_eq!(path, "/body[1]/div[1]/div[1]/button[2]");
    }

    #[test]
    fn first_of_several_same_tag_siblings_has_no_nth_suffix() {
        let root = sample_tree();
        let first_button = root.children()[0].children()[0].children()[0].clone();
        assert_eq!(css_selector(&first_button), "#app > div > button");
    }
}
