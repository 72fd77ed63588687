//! Error types for DOM utilities.

use thiserror::Error;

/// Result type for DOM operations.
pub type Result<T> = std::result::Result<T, DomError>;

/// Errors that can occur while computing selectors or building snapshots.
#[derive(Debug, Error)]
pub enum DomError {
    /// A configured selector string could not be parsed.
    #[error("invalid selector {selector:?}: {reason}")]
    InvalidSelector {
        /// The selector text that failed to parse.
        selector: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Gzip compression of the serialized snapshot failed.
    #[error("compression failed: {0}")]
    Compression(String),
}
