//! Tools exposed through `tools/list` and `tools/call`.
//!
//! A tool is anything implementing [`Tool`]. The dispatcher only ever sees
//! tools through a [`ToolRegistry`], which is assembled once at startup and
//! shared read-only afterwards.

pub mod pdf;
pub mod read_paper;
pub mod registry;

use serde::Serialize;
use serde_json::Value;

use crate::error::McpError;

pub use read_paper::ReadPaperTool;
pub use registry::ToolRegistry;

/// A named, schema-described capability callable via `tools/call`.
///
/// Implementations convert the untyped `arguments` into their own
/// parameters and report bad input as [`McpError::InvalidParams`].
pub trait Tool: Send + Sync {
    /// Unique tool name.
    fn name(&self) -> &str;

    /// Human-readable description shown to the client.
    fn description(&self) -> &str;

    /// JSON Schema describing the `arguments` object.
    fn input_schema(&self) -> Value;

    /// Runs the tool and returns its text output.
    ///
    /// # Errors
    ///
    /// Returns a typed error describing why the call failed.
    fn execute(&self, arguments: &Value) -> Result<String, McpError>;

    /// Returns the descriptor advertised in `tools/list`.
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
        }
    }
}

/// A tool definition for tools/list response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    /// Unique tool name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON Schema for the tool's input parameters.
    pub input_schema: Value,
}
