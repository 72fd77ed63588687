//! Error types for protocol construction and (de)serialization.

use thiserror::Error;

/// Result type for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors that can occur while building or encoding protocol types.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// JSON serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A required identity field was empty when an event was constructed.
    #[error("missing required field: {0}")]
    MissingField(&'static str),
}
