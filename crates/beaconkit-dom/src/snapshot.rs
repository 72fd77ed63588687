//! Sanitized, size-bounded DOM snapshot construction.
//!
//! Operates on a deep, owned clone of the target subtree — the live DOM
//! (whichever [`crate::node::DomNode`] backs it) is never mutated.

use std::collections::BTreeMap;

use base64::Engine;

use crate::error::{DomError, Result};
use crate::node::DomNode;
use crate::privacy::{default_sensitive_selectors, matches_any, CompoundSelector, MASK_PLACEHOLDER};

/// Default maximum serialized snapshot size before truncation, in bytes.
pub const DEFAULT_MAX_SNAPSHOT_SIZE_BYTES: usize = 512 * 1024;

/// Schema version stamped on every snapshot payload this crate produces.
pub const SCHEMA_VERSION: &str = "1";

const MARKER_OFF_ATTR: &str = "data-analytics-snapshot";

/// An owned, sanitized element tree ready for serialization.
#[derive(Debug, Clone, PartialEq)]
struct SnapshotNode {
    tag: String,
    attributes: BTreeMap<String, String>,
    text: String,
    children: Vec<SnapshotNode>,
}

/// Tallies produced while sanitizing a subtree, reported back as
/// [`beaconkit_protocol::MaskMetadata`].
#[derive(Debug, Default)]
struct MaskTally {
    masked_selectors: Vec<String>,
    blocked_count: u32,
}

impl MaskTally {
    fn record_selector(&mut self, source: &str) {
        if !self.masked_selectors.iter().any(|s| s == source) {
            self.masked_selectors.push(source.to_string());
        }
    }
}

/// The fully assembled result of [`build_snapshot`].
#[derive(Debug, Clone)]
pub struct SnapshotPayload {
    /// Base64-encoded, possibly-compressed serialized DOM.
    pub dom: String,
    /// How `dom` was encoded.
    pub compression: beaconkit_protocol::CompressionKind,
    /// Size in bytes of the serialized (pre-compression) string.
    pub original_size: u64,
    /// Size in bytes of `dom` after base64 decoding.
    pub compressed_size: u64,
    /// Whether the serialized string was truncated to fit the size bound.
    pub truncated: bool,
    /// Masking metadata.
    pub mask_metadata: beaconkit_protocol::MaskMetadata,
}

/// Build a sanitized snapshot of `root`.
///
/// `max_size_bytes` bounds the pre-compression serialized string; beyond it
/// the string is truncated proportionally with a trailing
/// `<!-- TRUNCATED -->` marker.
pub fn build_snapshot<N: DomNode>(
    root: &N,
    privacy: &crate::privacy::PrivacyConfig,
    max_size_bytes: usize,
) -> SnapshotPayload {
    let block_selectors = crate::privacy::parse_selector_list(&privacy.block_selectors.join(","));
    let mask_selectors = crate::privacy::parse_selector_list(&privacy.mask_selectors.join(","));
    let default_selectors = default_sensitive_selectors();

    let mut tally = MaskTally::default();
    let tree = clone_sanitized(
        root,
        privacy,
        &block_selectors,
        &mask_selectors,
        &default_selectors,
        &mut tally,
    );

    let (serialized, truncated) = match tree {
        Some(node) => {
            let xml = serialize(&node);
            bound_size(xml, max_size_bytes)
        }
        None => (
            "<!-- Serialization failed --><html><body></body></html>".to_string(),
            true,
        ),
    };

    let original_size = serialized.len() as u64;
    let (dom, compression, compressed_size) = match compress_gzip(serialized.as_bytes()) {
        Ok(compressed) => {
            let encoded = base64::engine::general_purpose::STANDARD.encode(&compressed);
            let size = encoded.len() as u64;
            (encoded, beaconkit_protocol::CompressionKind::Gzip, size)
        }
        Err(_) => {
            let encoded = base64::engine::general_purpose::STANDARD.encode(serialized.as_bytes());
            let size = encoded.len() as u64;
            (encoded, beaconkit_protocol::CompressionKind::None, size)
        }
    };

    SnapshotPayload {
        dom,
        compression,
        original_size,
        compressed_size,
        truncated,
        mask_metadata: beaconkit_protocol::MaskMetadata {
            masked_selectors: tally.masked_selectors,
            blocked_count: tally.blocked_count,
        },
    }
}

fn clone_sanitized<N: DomNode>(
    node: &N,
    privacy: &crate::privacy::PrivacyConfig,
    block: &[CompoundSelector],
    mask: &[CompoundSelector],
    default_mask: &[CompoundSelector],
    tally: &mut MaskTally,
) -> Option<SnapshotNode> {
    let tag = node.tag_name();
    if tag == "script" || tag == "noscript" {
        return None;
    }
    if node.attribute(MARKER_OFF_ATTR).as_deref() == Some("off") {
        return None;
    }
    if let Some(matched) = first_match(block, node) {
        tally.blocked_count += 1;
        tally.record_selector(matched);
        return None;
    }

    let mut attributes: BTreeMap<String, String> = node
        .attribute_names()
        .into_iter()
        .filter(|name| !name.starts_with("on"))
        .filter_map(|name| node.attribute(&name).map(|value| (name, value)))
        .collect();

    let mut text = node.text_content();

    let mask_source = first_match(mask, node).or_else(|| first_match(default_mask, node));
    if let Some(source) = mask_source {
        tally.record_selector(source);
        if attributes.contains_key("value") || node.value().is_some() {
            attributes.insert("value".to_string(), MASK_PLACEHOLDER.to_string());
        }
        attributes.retain(|key, _| !key.starts_with("data-"));
        text = MASK_PLACEHOLDER.to_string();
    } else if text.chars().count() > privacy.max_node_text_length {
        text = truncate_with_ellipsis(&text, privacy.max_node_text_length);
    }

    let children = node
        .children()
        .iter()
        .filter_map(|child| clone_sanitized(child, privacy, block, mask, default_mask, tally))
        .collect();

    Some(SnapshotNode {
        tag,
        attributes,
        text,
        children,
    })
}

fn first_match<'a, N: DomNode>(selectors: &'a [CompoundSelector], node: &N) -> Option<&'a str> {
    selectors
        .iter()
        .find(|s| matches_any(std::slice::from_ref(s), node))
        .map(|s| s.source())
}

fn truncate_with_ellipsis(text: &str, max_len: usize) -> String {
    if max_len == 0 {
        return "…".to_string();
    }
    let truncated: String = text.chars().take(max_len).collect();
    format!("{truncated}…")
}

fn serialize(node: &SnapshotNode) -> String {
    let mut out = String::new();
    serialize_into(node, &mut out);
    out
}

fn serialize_into(node: &SnapshotNode, out: &mut String) {
    out.push('<');
    out.push_str(&node.tag);
    for (name, value) in &node.attributes {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&escape_attr(value));
        out.push('"');
    }
    out.push('>');
    if !node.text.is_empty() {
        out.push_str(&escape_text(&node.text));
    }
    for child in &node.children {
        serialize_into(child, out);
    }
    out.push_str("</");
    out.push_str(&node.tag);
    out.push('>');
}

fn escape_attr(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

fn escape_text(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn bound_size(serialized: String, max_size_bytes: usize) -> (String, bool) {
    if serialized.len() <= max_size_bytes || max_size_bytes == 0 {
        return (serialized, false);
    }

    const MARKER: &str = "<!-- TRUNCATED -->";
    let budget = max_size_bytes.saturating_sub(MARKER.len());
    let mut boundary = budget.min(serialized.len());
    while boundary > 0 && !serialized.is_char_boundary(boundary) {
        boundary -= 1;
    }
    let mut truncated = serialized[..boundary].to_string();
    truncated.push_str(MARKER);
    (truncated, true)
}

fn compress_gzip(data: &[u8]) -> Result<Vec<u8>> {
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| DomError::Compression(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| DomError::Compression(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::InMemoryElement;
    use crate::privacy::PrivacyConfig;

    #[test]
    fn strips_script_and_noscript_elements() {
        let root = InMemoryElement::new("div")
            .child(InMemoryElement::new("script").with_text("evil()"))
            .child(InMemoryElement::new("noscript").with_text("fallback"))
            .child(InMemoryElement::new("p").with_text("hi"));

        let payload = build_snapshot(&root, &PrivacyConfig::default(), DEFAULT_MAX_SNAPSHOT_SIZE_BYTES);
        let decoded = decode(&payload);
        assert!(!decoded.contains("<script>"));
        assert!(!decoded.contains("<noscript>"));
        assert!(decoded.contains("<p>hi</p>"));
    }

    #[test]
    fn strips_on_star_attributes() {
        let root = InMemoryElement::new("button").with_attribute("onclick", "evil()");
        let payload = build_snapshot(&root, &PrivacyConfig::default(), DEFAULT_MAX_SNAPSHOT_SIZE_BYTES);
        assert!(!decode(&payload).contains("onclick"));
    }

    #[test]
    fn masks_password_inputs_by_default() {
        let root = InMemoryElement::new("input")
            .with_attribute("type", "password")
            .with_value("hunter2");
        let payload = build_snapshot(&root, &PrivacyConfig::default(), DEFAULT_MAX_SNAPSHOT_SIZE_BYTES);
        let decoded = decode(&payload);
        assert!(!decoded.contains("hunter2"));
        assert!(decoded.contains(MASK_PLACEHOLDER));
        assert!(payload
            .mask_metadata
            .masked_selectors
            .iter()
            .any(|s| s.contains("password")));
    }

    #[test]
    fn masks_custom_selector_and_blocks_another() {
        let root = InMemoryElement::new("div")
            .child(InMemoryElement::new("div").with_attribute("class", "secret").with_text("card 4111"))
            .child(InMemoryElement::new("div").with_attribute("class", "drop-me"));

        let mut privacy = PrivacyConfig::default();
        privacy.mask_selectors = vec![".secret".to_string()];
        privacy.block_selectors = vec![".drop-me".to_string()];

        let payload = build_snapshot(&root, &privacy, DEFAULT_MAX_SNAPSHOT_SIZE_BYTES);
        let decoded = decode(&payload);

        assert!(!decoded.contains("4111"));
        assert!(!decoded.contains("drop-me"));
        assert_eq!(payload.mask_metadata.blocked_count, 1);
        assert!(payload
            .mask_metadata
            .masked_selectors
            .contains(&".secret".to_string()));
    }

    #[test]
    fn marker_off_suppresses_subtree() {
        let root = InMemoryElement::new("div").child(
            InMemoryElement::new("div")
                .with_attribute("data-analytics-snapshot", "off")
                .with_text("invisible"),
        );
        let payload = build_snapshot(&root, &PrivacyConfig::default(), DEFAULT_MAX_SNAPSHOT_SIZE_BYTES);
        assert!(!decode(&payload).contains("invisible"));
    }

    #[test]
    fn truncates_when_over_size_budget() {
        let mut root = InMemoryElement::new("div");
        for _ in 0..50 {
            root = root.child(InMemoryElement::new("span").with_text("x".repeat(100)));
        }
        let payload = build_snapshot(&root, &PrivacyConfig::default(), 256);
        assert!(payload.truncated);
    }

    fn decode(payload: &SnapshotPayload) -> String {
        let compressed = base64::engine::general_purpose::STANDARD
            .decode(&payload.dom)
            .unwrap();
        match payload.compression {
            beaconkit_protocol::CompressionKind::Gzip => {
                use std::io::Read;
                let mut decoder = flate2::read::GzDecoder::new(&compressed[..]);
                let mut out = String::new();
                decoder.read_to_string(&mut out).unwrap();
                out
            }
            _ => String::from_utf8(compressed).unwrap(),
        }
    }
}
