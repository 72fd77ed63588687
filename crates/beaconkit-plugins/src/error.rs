//! Error types for the plugin registry.

use thiserror::Error;

/// Result type for plugin operations.
pub type Result<T> = std::result::Result<T, PluginError>;

/// Errors raised by [`crate::registry::PluginRegistry`].
#[derive(Debug, Error)]
pub enum PluginError {
    /// `register` was called with a name already present in the registry.
    #[error("a plugin named '{0}' is already registered")]
    DuplicateName(String),

    /// `register` was called after `initialize`.
    #[error("cannot register plugin '{0}': the registry has already initialized")]
    AlreadyInitialized(String),
}
