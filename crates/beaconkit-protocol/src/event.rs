//! Event types: the base record shared by every capture kind, and the
//! discriminated union of page-view, click, custom, and snapshot payloads.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The page's scrollable dimensions at capture time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PageDimensions {
    /// `document.scrollWidth` (or the host-provided equivalent).
    pub scroll_width: u32,
    /// `document.scrollHeight`.
    pub scroll_height: u32,
}

/// The viewport's dimensions at capture time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ViewportDimensions {
    /// `window.innerWidth`.
    pub inner_width: u32,
    /// `window.innerHeight`.
    pub inner_height: u32,
}

/// Coarse viewport classification used by snapshot events.
///
/// `mobile` below 768px, `tablet` below 1024px, `desktop` otherwise.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScreenClass {
    /// Viewport width < 768.
    Mobile,
    /// Viewport width < 1024.
    Tablet,
    /// Viewport width >= 1024.
    Desktop,
}

impl ScreenClass {
    /// Classify a viewport width per spec.
    pub fn from_viewport_width(width: u32) -> Self {
        if width < 768 {
            ScreenClass::Mobile
        } else if width < 1024 {
            ScreenClass::Tablet
        } else {
            ScreenClass::Desktop
        }
    }
}

/// Which kind of snapshot capture produced the event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotKind {
    /// The first snapshot taken after initial load.
    Initial,
    /// Taken because the DOM mutated and the layout hash changed.
    Mutation,
    /// Taken on a fixed interval.
    Periodic,
}

/// How the serialized DOM payload was encoded before transmission.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CompressionKind {
    /// Compressed with gzip, then base64-encoded.
    Gzip,
    /// Compressed with raw DEFLATE, then base64-encoded. Not currently
    /// produced by [`beaconkit-dom`](https://docs.rs/beaconkit-dom), but
    /// part of the wire contract so servers speaking this format can
    /// decode it if another implementation sends it.
    Deflate,
    /// Not compressed; the payload is base64 of the raw string.
    None,
}

/// Masking metadata attached to a snapshot event.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MaskMetadata {
    /// Selectors that matched at least one masked element, including the
    /// default sensitive-field selectors.
    pub masked_selectors: Vec<String>,
    /// Count of elements removed entirely by block selectors.
    pub blocked_count: u32,
}

/// The discriminated payload carried by an [`Event`], one variant per
/// capture kind in spec §3.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum EventPayload {
    /// A page view, either the initial load or an SPA navigation.
    #[serde(rename = "pageview")]
    PageView {
        /// `document.title` at capture time.
        title: String,
        /// The route (pathname) being viewed.
        route: String,
        /// `true` for the one-time initial load, `false` for SPA navigations.
        is_initial_load: bool,
    },
    /// A captured click, with element-path identification.
    #[serde(rename = "click")]
    Click {
        /// Page-relative x coordinate.
        x: f64,
        /// Page-relative y coordinate.
        y: f64,
        /// CSS selector path from the element to its nearest identified ancestor.
        selector: String,
        /// XPath using positional indices, if computed.
        xpath: Option<String>,
        /// The clicked element's tag name, uppercased.
        tag_name: String,
        /// Hash of the element's visible text, if any.
        text_hash: Option<String>,
    },
    /// A caller-supplied custom event.
    #[serde(rename = "custom")]
    Custom {
        /// The caller-supplied event name.
        name: String,
    },
    /// A sanitized DOM snapshot.
    #[serde(rename = "snapshot")]
    Snapshot {
        /// Which trigger produced this snapshot.
        kind: SnapshotKind,
        /// Coarse viewport classification at capture time.
        screen_class: ScreenClass,
        /// Deterministic structural digest, e.g. `sha256:...`.
        layout_hash: String,
        /// Base64-encoded, possibly-compressed serialized DOM payload.
        dom: String,
        /// How `dom` was encoded.
        compression: CompressionKind,
        /// Size in bytes of the serialized (pre-compression) string.
        original_size: u64,
        /// Size in bytes of `dom` after base64 decoding.
        compressed_size: u64,
        /// `true` if the payload was truncated to fit the size bound.
        truncated: bool,
        /// Masking metadata (selectors applied, elements blocked).
        mask_metadata: MaskMetadata,
        /// Schema version of the snapshot payload format.
        schema_version: String,
    },
}

impl EventPayload {
    /// The wire-format discriminator string for this variant
    /// (`"pageview"`, `"click"`, `"custom"`, or `"snapshot"`).
    pub fn kind(&self) -> &'static str {
        match self {
            EventPayload::PageView { .. } => "pageview",
            EventPayload::Click { .. } => "click",
            EventPayload::Custom { .. } => "custom",
            EventPayload::Snapshot { .. } => "snapshot",
        }
    }
}

/// A fully enriched analytics event: the base fields of spec §3 plus a
/// discriminated [`EventPayload`].
///
/// Constructed exclusively through [`Event::new`], which requires
/// `project_id` and `client_id` to be non-empty — spec §3's invariant that
/// "no event leaves the process with unvalidated identity fields" is
/// enforced at construction, not by convention.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Globally unique event id.
    pub event_id: Uuid,
    /// The tenant/project this event belongs to.
    pub project_id: String,
    /// Stable per-browser client identifier.
    pub client_id: String,
    /// Identifier of the session active at capture time.
    pub session_id: String,
    /// The authenticated user id, or `None` when anonymous.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub user_id: Option<String>,
    /// Milliseconds since the Unix epoch, monotonic within a capture thread.
    pub timestamp: i64,
    /// The page URL at capture time.
    pub url: String,
    /// `document.referrer` at capture time.
    pub referrer: String,
    /// The page's scrollable dimensions.
    pub page: PageDimensions,
    /// The viewport's dimensions.
    pub viewport: ViewportDimensions,
    /// Optional free-form properties supplied by the caller.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub properties: Option<HashMap<String, serde_json::Value>>,
    /// The discriminated event-kind payload.
    #[serde(flatten)]
    pub payload: EventPayload,
}

/// Identity and context fields every [`Event`] is enriched with before it
/// reaches the queue. Grouping these avoids an eight-argument `Event::new`.
#[derive(Debug, Clone)]
pub struct EventContext {
    /// The tenant/project this event belongs to.
    pub project_id: String,
    /// Stable per-browser client identifier.
    pub client_id: String,
    /// Identifier of the session active at capture time.
    pub session_id: String,
    /// The authenticated user id, or `None` when anonymous.
    pub user_id: Option<String>,
    /// The page URL at capture time.
    pub url: String,
    /// `document.referrer` at capture time.
    pub referrer: String,
    /// The page's scrollable dimensions.
    pub page: PageDimensions,
    /// The viewport's dimensions.
    pub viewport: ViewportDimensions,
}

impl Event {
    /// Construct a new event, enriched with `context` and timestamped
    /// `timestamp_ms`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::ProtocolError::MissingField`] if
    /// `project_id` or `client_id` is empty.
    pub fn new(
        context: EventContext,
        timestamp_ms: i64,
        properties: Option<HashMap<String, serde_json::Value>>,
        payload: EventPayload,
    ) -> crate::error::Result<Self> {
        if context.project_id.is_empty() {
            return Err(crate::error::ProtocolError::MissingField("projectId"));
        }
        if context.client_id.is_empty() {
            return Err(crate::error::ProtocolError::MissingField("clientId"));
        }

        Ok(Self {
            event_id: Uuid::new_v4(),
            project_id: context.project_id,
            client_id: context.client_id,
            session_id: context.session_id,
            user_id: context.user_id,
            timestamp: timestamp_ms,
            url: context.url,
            referrer: context.referrer,
            page: context.page,
            viewport: context.viewport,
            properties,
            payload,
        })
    }
}
