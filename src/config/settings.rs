//! Configuration structures for deserialisation.
//!
//! These structures map directly to the JSON configuration file format.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// Root configuration structure.
///
/// This is the top-level structure that matches the JSON config file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Optional JSON schema reference (ignored during parsing).
    #[serde(rename = "$schema", default)]
    _schema: Option<String>,

    /// Optional comment field (ignored during parsing).
    #[serde(rename = "_comment", default)]
    _comment: Option<String>,

    /// Transport settings.
    #[serde(default)]
    pub transport: TransportConfig,

    /// Paper reading settings.
    #[serde(default)]
    pub papers: PaperConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any validation checks fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.transport.bind_addr()?;

        for (field, value) in [
            ("sse_path", &self.transport.sse_path),
            ("message_path", &self.transport.message_path),
        ] {
            if !value.starts_with('/') {
                return Err(ConfigError::ValidationError {
                    message: format!("transport.{field} must start with '/', got '{value}'"),
                });
            }
        }

        if self.transport.sse_path == self.transport.message_path {
            return Err(ConfigError::ValidationError {
                message: "transport.sse_path and transport.message_path must differ".to_string(),
            });
        }

        if self.transport.channel_timeout_secs == 0 {
            return Err(ConfigError::ValidationError {
                message: "transport.channel_timeout_secs must be greater than zero".to_string(),
            });
        }

        if self.papers.summary_chars == 0 {
            return Err(ConfigError::ValidationError {
                message: "papers.summary_chars must be greater than zero".to_string(),
            });
        }

        Ok(())
    }
}

/// Which framing carries JSON-RPC messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    /// One message per line on stdin/stdout.
    #[default]
    Stdio,
    /// Server-sent events channel plus a POST endpoint.
    Sse,
}

/// Transport configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransportConfig {
    /// Transport used when none is given on the command line.
    #[serde(default)]
    pub mode: TransportMode,

    /// Listen address for the SSE transport.
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Path of the event-stream endpoint.
    #[serde(default = "default_sse_path")]
    pub sse_path: String,

    /// Path clients POST JSON-RPC messages to.
    #[serde(default = "default_message_path")]
    pub message_path: String,

    /// Maximum lifetime of an event stream, in seconds.
    #[serde(default = "default_channel_timeout")]
    pub channel_timeout_secs: u64,
}

impl TransportConfig {
    /// Parses the configured listen address.
    ///
    /// # Errors
    ///
    /// Returns an error if `bind` is not a valid socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .parse()
            .map_err(|e| ConfigError::ValidationError {
                message: format!("Invalid bind address '{}': {e}", self.bind),
            })
    }

    /// Maximum lifetime of an event stream.
    #[must_use]
    pub const fn channel_timeout(&self) -> Duration {
        Duration::from_secs(self.channel_timeout_secs)
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            mode: TransportMode::default(),
            bind: default_bind(),
            sse_path: default_sse_path(),
            message_path: default_message_path(),
            channel_timeout_secs: default_channel_timeout(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_sse_path() -> String {
    "/sse".to_string()
}

fn default_message_path() -> String {
    "/messages".to_string()
}

const fn default_channel_timeout() -> u64 {
    3600
}

/// Settings for the `read_paper` tool.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PaperConfig {
    /// Directories PDF files may be read from. Empty allows any path.
    #[serde(default)]
    pub allowed_paths: Vec<PathBuf>,

    /// Number of characters returned when `summaryOnly` is set.
    #[serde(default = "default_summary_chars")]
    pub summary_chars: usize,
}

impl Default for PaperConfig {
    fn default() -> Self {
        Self {
            allowed_paths: Vec::new(),
            summary_chars: default_summary_chars(),
        }
    }
}

const fn default_summary_chars() -> usize {
    2000
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}
