//! Error types for the tracker runtime.

use thiserror::Error;

/// Result type for tracker operations.
pub type Result<T> = std::result::Result<T, TrackerError>;

/// Errors raised while building or validating an [`crate::config::SdkConfig`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// `project_id` was empty.
    #[error("project_id must not be empty")]
    MissingProjectId,

    /// `endpoint` was empty.
    #[error("endpoint must not be empty")]
    MissingEndpoint,
}

/// Errors raised while constructing the batching queue's transmitters.
#[derive(Debug, Error)]
pub enum QueueError {
    /// A transmitter could not be constructed from configuration.
    #[error("failed to construct a transmitter: {0}")]
    TransmitterInit(#[from] beaconkit_transport::TransportError),
}

/// Top-level error surfaced across the `initialize_sdk`/`destroy_sdk`
/// boundary.
///
/// Per spec, only configuration errors are fatal; everything downstream
/// (identity storage, plugin init, transmission) degrades gracefully and
/// never reaches this type. It stays narrow on purpose.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Configuration failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The batching queue's transmitters could not be constructed.
    #[error(transparent)]
    Queue(#[from] QueueError),

    /// An event failed to construct at the protocol layer.
    #[error(transparent)]
    Protocol(#[from] beaconkit_protocol::ProtocolError),

    /// `initialize_sdk` was called while an SDK instance already existed.
    #[error("the SDK is already initialized")]
    AlreadyInitialized,

    /// An operation required an initialized SDK but none was present.
    #[error("the SDK has not been initialized")]
    NotInitialized,
}
