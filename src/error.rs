//! Error types for paper-indexer-mcp.
//!
//! Three families live here:
//!
//! - [`ConfigError`]: loading and validating the configuration file
//! - [`RegistryError`]: building the tool registry at startup
//! - [`McpError`]: request-time failures that travel back to the client as
//!   a JSON-RPC error object
//!
//! `McpError` messages go onto the wire verbatim, so they must describe the
//! failure without leaking internals such as backtraces.

use std::path::PathBuf;

use thiserror::Error;

use crate::mcp::protocol::{ErrorCode, JsonRpcErrorData};

/// Errors that can occur during configuration operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("failed to read configuration file: {path}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be parsed.
    #[error("failed to parse configuration file: {path}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Configuration file not found.
    #[error("configuration file not found: {path}")]
    NotFound {
        /// Path where the configuration file was expected.
        path: PathBuf,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation failure.
        message: String,
    },
}

/// Errors raised while assembling the tool registry.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    /// Two tools were registered under the same name.
    #[error("duplicate tool name: {name}")]
    DuplicateTool {
        /// The conflicting tool name.
        name: String,
    },
}

/// A request-scoped failure with a fixed JSON-RPC error code.
///
/// Each variant carries the human-readable message sent to the client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum McpError {
    /// The payload was not valid JSON.
    #[error("{0}")]
    ParseError(String),

    /// The payload was JSON but not a valid request envelope.
    #[error("{0}")]
    InvalidRequest(String),

    /// No handler exists for the requested method.
    #[error("{0}")]
    MethodNotFound(String),

    /// A required parameter was missing or malformed.
    #[error("{0}")]
    InvalidParams(String),

    /// Unexpected failure while serving the request.
    #[error("{0}")]
    Internal(String),

    /// `tools/call` named a tool that is not registered.
    #[error("{0}")]
    ToolNotFound(String),

    /// A referenced file or directory does not exist.
    #[error("{0}")]
    FileNotFound(String),

    /// Access to the resource was refused.
    #[error("{0}")]
    PermissionDenied(String),

    /// The operation exceeded its time budget.
    #[error("{0}")]
    Timeout(String),

    /// The tool failed in a way it did not report itself.
    #[error("{0}")]
    ToolExecutionFailed(String),
}

impl McpError {
    /// Returns the protocol error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::ParseError(_) => ErrorCode::ParseError,
            Self::InvalidRequest(_) => ErrorCode::InvalidRequest,
            Self::MethodNotFound(_) => ErrorCode::MethodNotFound,
            Self::InvalidParams(_) => ErrorCode::InvalidParams,
            Self::Internal(_) => ErrorCode::InternalError,
            Self::ToolNotFound(_) => ErrorCode::ToolNotFound,
            Self::FileNotFound(_) => ErrorCode::FileNotFound,
            Self::PermissionDenied(_) => ErrorCode::PermissionDenied,
            Self::Timeout(_) => ErrorCode::Timeout,
            Self::ToolExecutionFailed(_) => ErrorCode::ToolExecutionFailed,
        }
    }

    /// Returns the message carried by this error.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::ParseError(m)
            | Self::InvalidRequest(m)
            | Self::MethodNotFound(m)
            | Self::InvalidParams(m)
            | Self::Internal(m)
            | Self::ToolNotFound(m)
            | Self::FileNotFound(m)
            | Self::PermissionDenied(m)
            | Self::Timeout(m)
            | Self::ToolExecutionFailed(m) => m,
        }
    }
}

impl From<McpError> for JsonRpcErrorData {
    fn from(error: McpError) -> Self {
        Self::with_message(error.code(), error.message())
    }
}
