//! Configuration for the streaming core.
//!
//! Every field has a default so a partial TOML file (or none at all) yields a
//! usable configuration. Durations are stored as milliseconds.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default generation endpoint.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8080/api/botPromptStream";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LumenConfig {
    /// Network transport settings.
    pub transport: TransportConfig,
    /// Reveal cadence and completion heuristic.
    pub typewriter: TypewriterConfig,
    /// Ingest buffer bounds.
    pub buffer: BufferConfig,
}

/// Settings for the HTTP transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Streaming endpoint receiving the form-encoded request.
    pub endpoint: String,
    /// Form field carrying the identity token.
    pub identity_field: String,
    /// Form field carrying the input text.
    pub content_field: String,
    /// Hard timeout from request start until the response head arrives.
    pub request_timeout_ms: u64,
    /// Timeout for establishing the TCP/TLS connection.
    pub connect_timeout_ms: u64,
    /// Number of retries after the first attempt.
    pub max_retries: u32,
    /// Fixed delay before a retry.
    pub retry_delay_ms: u64,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            identity_field: "openid".to_string(),
            content_field: "content".to_string(),
            request_timeout_ms: 30_000,
            connect_timeout_ms: 10_000,
            max_retries: 1,
            retry_delay_ms: 1_000,
        }
    }
}

impl TransportConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// Settings for the typewriter reveal.
///
/// The idle threshold and re-check grace are tuning values, not protocol
/// constants. They only need to exceed the longest expected gap between
/// fragments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypewriterConfig {
    /// Interval between two revealed characters.
    pub tick_interval_ms: u64,
    /// Silence after the last fragment after which the stream counts as done.
    pub idle_threshold_ms: u64,
    /// Delay before re-checking an idle, not yet finished stream.
    pub recheck_grace_ms: u64,
}

impl Default for TypewriterConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 30,
            idle_threshold_ms: 2_000,
            recheck_grace_ms: 500,
        }
    }
}

impl TypewriterConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn idle_threshold(&self) -> Duration {
        Duration::from_millis(self.idle_threshold_ms)
    }

    pub fn recheck_grace(&self) -> Duration {
        Duration::from_millis(self.recheck_grace_ms)
    }
}

/// Bounds of the ingest buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    /// Buffered length above which the buffer is compacted.
    pub high_water_chars: usize,
    /// Number of most recent characters kept by a compaction.
    pub retain_chars: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            high_water_chars: 10_000,
            retain_chars: 5_000,
        }
    }
}

impl LumenConfig {
    /// Parse a configuration from TOML text and validate it.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Load a configuration file, falling back to defaults when it is absent.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::NotFound { .. }) => Ok(Self::default()),
            other => other,
        }
    }

    /// Serialize the configuration as TOML.
    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }

    /// Check the invariants the pipeline relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let transport = &self.transport;
        if transport.endpoint.trim().is_empty() {
            return Err(ConfigError::invalid("transport.endpoint", "must not be empty"));
        }
        if transport.identity_field.trim().is_empty() {
            return Err(ConfigError::invalid(
                "transport.identity_field",
                "must not be empty",
            ));
        }
        if transport.content_field.trim().is_empty() {
            return Err(ConfigError::invalid(
                "transport.content_field",
                "must not be empty",
            ));
        }
        if transport.request_timeout_ms == 0 {
            return Err(ConfigError::invalid(
                "transport.request_timeout_ms",
                "must be greater than zero",
            ));
        }
        if self.typewriter.tick_interval_ms == 0 {
            return Err(ConfigError::invalid(
                "typewriter.tick_interval_ms",
                "must be greater than zero",
            ));
        }
        if self.typewriter.recheck_grace_ms == 0 {
            return Err(ConfigError::invalid(
                "typewriter.recheck_grace_ms",
                "must be greater than zero",
            ));
        }
        if self.buffer.retain_chars >= self.buffer.high_water_chars {
            return Err(ConfigError::invalid(
                "buffer.retain_chars",
                format!(
                    "must be below high_water_chars ({})",
                    self.buffer.high_water_chars
                ),
            ));
        }
        Ok(())
    }
}
