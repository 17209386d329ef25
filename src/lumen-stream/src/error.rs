//! Error types for the streaming core.

use std::path::PathBuf;

use thiserror::Error;

use crate::formatter::FAILURE_PREFIX;

/// Result type alias for generation operations.
pub type Result<T> = std::result::Result<T, GenerationError>;

/// Failure of a single generation.
///
/// Every variant is scoped to one generation; none of them leave the session
/// unusable. [`GenerationError::is_retryable`] tells the transport whether a
/// second attempt is allowed and [`GenerationError::requires_login`] tells the
/// UI whether to route the user to the login flow instead of showing an
/// inline failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
    /// No identity token is available; no connection was attempted.
    #[error("Not logged in or the login session has expired")]
    AuthMissing,

    /// The input was empty or whitespace only.
    #[error("Please enter some content first")]
    EmptyInput,

    /// The server did not answer within the request timeout.
    #[error("Request timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    /// Non-2xx status, connection failure or a response without a body.
    #[error("Request failed: {message}")]
    Transport {
        status: Option<u16>,
        message: String,
    },

    /// The stream broke after it was opened.
    #[error("Failed while reading the response: {0}")]
    StreamRead(String),

    /// The generation was cancelled by the caller.
    #[error("Generation cancelled")]
    Cancelled,

    /// The session could not be configured.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl GenerationError {
    /// Build a transport error carrying an HTTP status.
    pub fn status(status: u16, reason: impl Into<String>) -> Self {
        Self::Transport {
            status: Some(status),
            message: format!("{} {}", status, reason.into()).trim_end().to_string(),
        }
    }

    /// Build a transport error without a status (connection level).
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Transport {
            status: None,
            message: message.into(),
        }
    }

    /// Whether the transport may retry after this error.
    ///
    /// Only failures that happen before the first byte of the body is read
    /// are retried, so a retry can never duplicate emitted chunks.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Transport { .. })
    }

    /// Whether the error means the user has to log in again.
    pub fn requires_login(&self) -> bool {
        match self {
            Self::AuthMissing => true,
            Self::Transport {
                status: Some(401 | 403),
                ..
            } => true,
            _ => false,
        }
    }

    /// Message shown to the user when a generation fails.
    pub fn user_message(&self) -> String {
        format!("{FAILURE_PREFIX}{self}")
    }

    /// HTTP status associated with the error, if any.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => *status,
            _ => None,
        }
    }

    /// Converts a reqwest error into the generation taxonomy.
    pub(crate) fn from_reqwest(err: &reqwest::Error, timeout_ms: u64) -> Self {
        if err.is_timeout() {
            return Self::Timeout { timeout_ms };
        }
        if let Some(status) = err.status() {
            return Self::status(status.as_u16(), status.canonical_reason().unwrap_or(""));
        }
        if err.is_connect() {
            return Self::connection(format!("could not connect: {err}"));
        }
        Self::connection(err.to_string())
    }
}

impl From<ConfigError> for GenerationError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {field} - {message}")]
    Invalid { field: String, message: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.to_string(),
            message: message.into(),
        }
    }
}
