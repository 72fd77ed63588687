//! Privacy configuration and the minimal selector matcher masking/blocking
//! is evaluated against.
//!
//! Block and mask selectors in practice are simple compound selectors —
//! `.secret`, `#ssn-field`, `[type="password"]` — never combinators across
//! multiple elements. This matcher covers exactly that: a comma-separated
//! list of compound selectors, each a sequence of type/class/id/attribute
//! simple selectors with no descendant or child combinator.

/// Placeholder text masked fields are replaced with.
pub const MASK_PLACEHOLDER: &str = "***MASKED***";

/// Privacy configuration controlling snapshot sanitization.
#[derive(Debug, Clone)]
pub struct PrivacyConfig {
    /// Elements matching any of these selectors are removed entirely.
    pub block_selectors: Vec<String>,
    /// Elements matching any of these selectors have their value/text masked.
    pub mask_selectors: Vec<String>,
    /// Snapshot capture is disabled outright when set.
    pub disable_snapshots: bool,
    /// Per-node text length cap before truncation with an ellipsis.
    pub max_node_text_length: usize,
}

impl Default for PrivacyConfig {
    fn default() -> Self {
        Self {
            block_selectors: Vec::new(),
            mask_selectors: Vec::new(),
            disable_snapshots: false,
            max_node_text_length: 200,
        }
    }
}

/// One simple selector in a compound selector: type, id, class, or
/// attribute-presence/-equality.
#[derive(Debug, Clone, PartialEq)]
enum SimpleSelector {
    Type(String),
    Id(String),
    Class(String),
    AttrPresent(String),
    AttrEquals(String, String),
    AttrContains(String, String),
}

/// A parsed compound selector: a conjunction of [`SimpleSelector`]s that all
/// must match the same element.
#[derive(Debug, Clone)]
pub struct CompoundSelector {
    simples: Vec<SimpleSelector>,
    source: String,
}

impl CompoundSelector {
    /// Parse `text` as a single compound selector (no combinators).
    pub fn parse(text: &str) -> Self {
        let mut simples = Vec::new();
        let mut rest = text.trim();

        while !rest.is_empty() {
            if let Some(stripped) = rest.strip_prefix('#') {
                let (token, remainder) = take_ident(stripped);
                simples.push(SimpleSelector::Id(token.to_string()));
                rest = remainder;
            } else if let Some(stripped) = rest.strip_prefix('.') {
                let (token, remainder) = take_ident(stripped);
                simples.push(SimpleSelector::Class(token.to_string()));
                rest = remainder;
            } else if let Some(stripped) = rest.strip_prefix('[') {
                let end = stripped.find(']').unwrap_or(stripped.len());
                let body = &stripped[..end];
                simples.push(parse_attr_selector(body));
                rest = stripped.get(end + 1..).unwrap_or("");
            } else {
                let (token, remainder) = take_ident(rest);
                if !token.is_empty() {
                    simples.push(SimpleSelector::Type(token.to_lowercase()));
                }
                rest = remainder;
            }
        }

        Self {
            simples,
            source: text.to_string(),
        }
    }

    /// The original selector text, e.g. for reporting in `maskedSelectors`.
    pub fn source(&self) -> &str {
        &self.source
    }

    fn matches<N: crate::node::DomNode>(&self, node: &N) -> bool {
        self.simples.iter().all(|s| simple_matches(s, node))
    }
}

fn take_ident(s: &str) -> (&str, &str) {
    let end = s
        .find(|c: char| !(c.is_alphanumeric() || c == '-' || c == '_'))
        .unwrap_or(s.len());
    s.split_at(end)
}

fn parse_attr_selector(body: &str) -> SimpleSelector {
    if let Some((name, value)) = body.split_once("*=") {
        return SimpleSelector::AttrContains(
            name.trim().to_string(),
            unquote(value.trim()).to_string(),
        );
    }
    if let Some((name, value)) = body.split_once('=') {
        return SimpleSelector::AttrEquals(
            name.trim().to_string(),
            unquote(value.trim()).to_string(),
        );
    }
    SimpleSelector::AttrPresent(body.trim().to_string())
}

fn unquote(s: &str) -> &str {
    s.trim_matches('"').trim_matches('\'')
}

fn simple_matches<N: crate::node::DomNode>(selector: &SimpleSelector, node: &N) -> bool {
    match selector {
        SimpleSelector::Type(tag) => &node.tag_name() == tag,
        SimpleSelector::Id(id) => node.id().as_deref() == Some(id.as_str()),
        SimpleSelector::Class(class) => node.class_list().iter().any(|c| c == class),
        SimpleSelector::AttrPresent(name) => node.attribute(name).is_some(),
        SimpleSelector::AttrEquals(name, value) => node.attribute(name).as_deref() == Some(value),
        SimpleSelector::AttrContains(name, value) => node
            .attribute(name)
            .is_some_and(|v| v.contains(value.as_str())),
    }
}

/// Parse a comma-separated list of compound selectors.
pub fn parse_selector_list(text: &str) -> Vec<CompoundSelector> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(CompoundSelector::parse)
        .collect()
}

/// Whether `node` matches any selector in `list`.
pub fn matches_any<N: crate::node::DomNode>(list: &[CompoundSelector], node: &N) -> bool {
    list.iter().any(|s| s.matches(node))
}

/// The default sensitive-field selectors applied regardless of caller
/// configuration: password/hidden inputs, credit-card/SSN autocomplete
/// hints, and name attributes containing `password`, `token`, or `secret`.
pub fn default_sensitive_selectors() -> Vec<CompoundSelector> {
    [
        "[type=\"password\"]",
        "[type=\"hidden\"]",
        "[autocomplete*=\"cc-\"]",
        "[autocomplete=\"ssn\"]",
        "[name*=\"password\"]",
        "[name*=\"token\"]",
        "[name*=\"secret\"]",
    ]
    .into_iter()
    .map(CompoundSelector::parse)
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::InMemoryElement;

    #[test]
    fn class_selector_matches() {
        let selectors = parse_selector_list(".secret");
        let node = InMemoryElement::new("div").with_attribute("class", "secret highlight");
        assert!(matches_any(&selectors, &node));
    }

    #[test]
    fn id_selector_matches_exact() {
        let selectors = parse_selector_list("#ssn-field");
        let matching = InMemoryElement::new("input").with_attribute("id", "ssn-field");
        let other = InMemoryElement::new("input").with_attribute("id", "email");
        assert!(matches_any(&selectors, &matching));
        assert!(!matches_any(&selectors, &other));
    }

    #[test]
    fn default_password_selector_matches_password_inputs() {
        let selectors = default_sensitive_selectors();
        let password = InMemoryElement::new("input").with_attribute("type", "password");
        assert!(matches_any(&selectors, &password));
    }

    #[test]
    fn default_selectors_match_cc_autocomplete() {
        let selectors = default_sensitive_selectors();
        let cc = InMemoryElement::new("input").with_attribute("autocomplete", "cc-number");
        assert!(matches_any(&selectors, &cc));
    }

    #[test]
    fn default_selectors_match_name_containing_secret() {
        let selectors = default_sensitive_selectors();
        let field = InMemoryElement::new("input").with_attribute("name", "client_secret");
        assert!(matches_any(&selectors, &field));
    }
}
