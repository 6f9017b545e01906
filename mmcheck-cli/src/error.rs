//! CLI error type.

use crate::config::ConfigError;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors surfaced by the CLI itself. Check failures are never
/// errors; they end up in the printed summary instead.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration could not be read or written.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// The probe client could not be constructed.
    #[error(transparent)]
    Probe(#[from] mmcheck::Error),

    /// Anything else.
    #[error("{0}")]
    Other(String),
}

impl CliError {
    /// Create a generic error with a message.
    #[must_use]
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}
