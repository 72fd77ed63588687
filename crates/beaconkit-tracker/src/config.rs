//! SDK configuration.

use beaconkit_dom::PrivacyConfig;
use beaconkit_plugins::SnapshotPluginConfig;

use crate::error::ConfigError;

/// Default number of events per batch.
pub const DEFAULT_BATCH_SIZE: usize = 50;
/// Default time a partial batch waits before flushing, in milliseconds.
pub const DEFAULT_BATCH_TIMEOUT_MS: u32 = 10_000;
/// Default `localStorage`/`InMemoryStore` key the session id is persisted under.
pub const DEFAULT_SESSION_STORAGE_KEY: &str = "omni_session_id";
/// Default inactivity window after which a session rotates, in milliseconds (30 minutes).
pub const DEFAULT_INACTIVITY_TIMEOUT_MS: i64 = 30 * 60 * 1000;
/// Default per-request timeout for the primary HTTP transmitter.
pub const DEFAULT_TRANSMIT_TIMEOUT_MS: u32 = 30_000;

/// Validated, immutable SDK configuration.
///
/// Constructed only through [`SdkConfig::builder`]/[`SdkConfig::try_new`],
/// which reject an empty `project_id` or `endpoint` — every other field
/// carries a spec-mandated default and cannot itself fail validation.
#[derive(Debug, Clone)]
pub struct SdkConfig {
    project_id: String,
    endpoint: String,
    beacon_endpoint: String,
    batch_size: usize,
    batch_timeout_ms: u32,
    transmit_timeout_ms: u32,
    debug: bool,
    session_storage_key: String,
    inactivity_timeout_ms: i64,
    snapshot: SnapshotPluginConfig,
    privacy: PrivacyConfig,
}

impl SdkConfig {
    /// Start a builder for `project_id`/`endpoint`, defaulted otherwise.
    #[must_use]
    pub fn builder(project_id: impl Into<String>, endpoint: impl Into<String>) -> SdkConfigBuilder {
        SdkConfigBuilder::new(project_id, endpoint)
    }

    /// Construct a configuration with every default, validating `project_id`
    /// and `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingProjectId`]/[`ConfigError::MissingEndpoint`]
    /// if either is empty.
    pub fn try_new(project_id: impl Into<String>, endpoint: impl Into<String>) -> Result<Self, ConfigError> {
        Self::builder(project_id, endpoint).build()
    }

    /// The tenant/project id events are stamped with.
    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// The collection endpoint the primary transmitter POSTs to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The endpoint the unload-safe fallback transmitter sends to.
    #[must_use]
    pub fn beacon_endpoint(&self) -> &str {
        &self.beacon_endpoint
    }

    /// Maximum events held before the queue flushes eagerly.
    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// How long a partial batch waits before flushing, in milliseconds.
    #[must_use]
    pub fn batch_timeout_ms(&self) -> u32 {
        self.batch_timeout_ms
    }

    /// Per-request timeout for the primary transmitter, in milliseconds.
    #[must_use]
    pub fn transmit_timeout_ms(&self) -> u32 {
        self.transmit_timeout_ms
    }

    /// Whether verbose diagnostics should be wired up for plugins.
    #[must_use]
    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Storage key the session id is persisted under.
    #[must_use]
    pub fn session_storage_key(&self) -> &str {
        &self.session_storage_key
    }

    /// Inactivity window after which a session rotates, in milliseconds.
    #[must_use]
    pub fn inactivity_timeout_ms(&self) -> i64 {
        self.inactivity_timeout_ms
    }

    /// Snapshot-capture configuration, mirrored to plugins.
    #[must_use]
    pub fn snapshot(&self) -> &SnapshotPluginConfig {
        &self.snapshot
    }

    /// Privacy configuration, mirrored to plugins and the snapshot builder.
    #[must_use]
    pub fn privacy(&self) -> &PrivacyConfig {
        &self.privacy
    }
}

/// Builder for [`SdkConfig`].
///
/// Mirrors the `with_*` builder style used across this workspace's other
/// configuration types.
pub struct SdkConfigBuilder {
    project_id: String,
    endpoint: String,
    beacon_endpoint: Option<String>,
    batch_size: usize,
    batch_timeout_ms: u32,
    transmit_timeout_ms: u32,
    debug: bool,
    session_storage_key: String,
    inactivity_timeout_ms: i64,
    snapshot: SnapshotPluginConfig,
    privacy: PrivacyConfig,
}

impl SdkConfigBuilder {
    fn new(project_id: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            endpoint: endpoint.into(),
            beacon_endpoint: None,
            batch_size: DEFAULT_BATCH_SIZE,
            batch_timeout_ms: DEFAULT_BATCH_TIMEOUT_MS,
            transmit_timeout_ms: DEFAULT_TRANSMIT_TIMEOUT_MS,
            debug: false,
            session_storage_key: DEFAULT_SESSION_STORAGE_KEY.to_string(),
            inactivity_timeout_ms: DEFAULT_INACTIVITY_TIMEOUT_MS,
            snapshot: SnapshotPluginConfig::default(),
            privacy: PrivacyConfig::default(),
        }
    }

    /// Override the endpoint the beacon fallback sends to. Defaults to the
    /// primary `endpoint` with `/beacon` appended if unset.
    #[must_use]
    pub fn with_beacon_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.beacon_endpoint = Some(endpoint.into());
        self
    }

    /// Override the default batch size (spec default: 50).
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Override the default batch timeout in milliseconds (spec default: 10000).
    #[must_use]
    pub fn with_batch_timeout_ms(mut self, batch_timeout_ms: u32) -> Self {
        self.batch_timeout_ms = batch_timeout_ms;
        self
    }

    /// Override the primary transmitter's per-request timeout, in milliseconds.
    #[must_use]
    pub fn with_transmit_timeout_ms(mut self, transmit_timeout_ms: u32) -> Self {
        self.transmit_timeout_ms = transmit_timeout_ms;
        self
    }

    /// Enable verbose plugin diagnostics.
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Override the session-storage key (spec default: `"omni_session_id"`).
    #[must_use]
    pub fn with_session_storage_key(mut self, key: impl Into<String>) -> Self {
        self.session_storage_key = key.into();
        self
    }

    /// Override the inactivity rotation window, in milliseconds.
    #[must_use]
    pub fn with_inactivity_timeout_ms(mut self, inactivity_timeout_ms: i64) -> Self {
        self.inactivity_timeout_ms = inactivity_timeout_ms;
        self
    }

    /// Override the `snapshot.*` configuration group.
    #[must_use]
    pub fn with_snapshot(mut self, snapshot: SnapshotPluginConfig) -> Self {
        self.snapshot = snapshot;
        self
    }

    /// Override the `privacy.*` configuration group.
    #[must_use]
    pub fn with_privacy(mut self, privacy: PrivacyConfig) -> Self {
        self.privacy = privacy;
        self
    }

    /// Validate and build the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingProjectId`] or
    /// [`ConfigError::MissingEndpoint`] if either is empty.
    pub fn build(self) -> Result<SdkConfig, ConfigError> {
        if self.project_id.is_empty() {
            return Err(ConfigError::MissingProjectId);
        }
        if self.endpoint.is_empty() {
            return Err(ConfigError::MissingEndpoint);
        }

        let beacon_endpoint = self
            .beacon_endpoint
            .unwrap_or_else(|| format!("{}/beacon", self.endpoint.trim_end_matches('/')));

        Ok(SdkConfig {
            project_id: self.project_id,
            endpoint: self.endpoint,
            beacon_endpoint,
            batch_size: self.batch_size,
            batch_timeout_ms: self.batch_timeout_ms,
            transmit_timeout_ms: self.transmit_timeout_ms,
            debug: self.debug,
            session_storage_key: self.session_storage_key,
            inactivity_timeout_ms: self.inactivity_timeout_ms,
            snapshot: self.snapshot,
            privacy: self.privacy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let config = SdkConfig::try_new("proj", "https://collect.example.com/v1").unwrap();
        assert_eq!(config.batch_size(), DEFAULT_BATCH_SIZE);
        assert_eq!(config.batch_timeout_ms(), DEFAULT_BATCH_TIMEOUT_MS);
        assert_eq!(config.session_storage_key(), DEFAULT_SESSION_STORAGE_KEY);
        assert_eq!(config.inactivity_timeout_ms(), DEFAULT_INACTIVITY_TIMEOUT_MS);
        assert!(!config.debug());
    }

    #[test]
    fn rejects_empty_project_id() {
        let err = SdkConfig::try_new("", "https://collect.example.com/v1").unwrap_err();
        assert_eq!(err, ConfigError::MissingProjectId);
    }

    #[test]
    fn rejects_empty_endpoint() {
        let err = SdkConfig::try_new("proj", "").unwrap_err();
        assert_eq!(err, ConfigError::MissingEndpoint);
    }

    #[test]
    fn derives_a_beacon_endpoint_when_unset() {
        let config = SdkConfig::try_new("proj", "https://collect.example.com/v1").unwrap();
        assert_eq!(config.beacon_endpoint(), "https://collect.example.com/v1/beacon");
    }

    #[test]
    fn builder_overrides_take_effect() {
        let config = SdkConfig::builder("proj", "https://collect.example.com/v1")
            .with_batch_size(10)
            .with_debug(true)
            .build()
            .unwrap();
        assert_eq!(config.batch_size(), 10);
        assert!(config.debug());
    }
}
