//! Transport error types.

use thiserror::Error;

/// Result type for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

/// Errors that can occur while delivering a batch.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request reached the network layer but the host rejected it, or
    /// the connection could not be established at all.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The send did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// The batch could not be encoded as JSON.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The host environment refused to perform the send at all, e.g.
    /// `navigator.sendBeacon` returning `false` or no host facility being
    /// registered.
    #[error("host rejected delivery: {0}")]
    HostRejected(String),

    /// Every configured transmitter failed.
    #[error("all transmitters failed, last error: {0}")]
    AllTransmittersFailed(String),
}
