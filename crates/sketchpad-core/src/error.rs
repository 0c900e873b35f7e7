//! Error types for the drawing core.

use thiserror::Error;

/// Session errors, reported by the strict `try_*` stroke-capture calls.
///
/// The lenient calls treat every one of these as a no-op.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error("A stroke is already in progress")]
    InvalidState,
    #[error("No stroke in progress")]
    NoActiveStroke,
    #[error("Invalid stroke width: {0}")]
    InvalidWidth(f64),
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;
