//! The `read_paper` tool: full text of a local PDF.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::PaperConfig;
use crate::error::McpError;
use crate::tools::pdf::PdfExtractor;
use crate::tools::Tool;

/// Arguments accepted by `read_paper`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReadPaperParams {
    /// Absolute path of the PDF.
    file_path: String,
    /// Return only the leading part of the text.
    #[serde(default)]
    summary_only: bool,
}

/// Reads the plain text of a local PDF file.
#[derive(Debug, Clone)]
pub struct ReadPaperTool {
    extractor: PdfExtractor,
    summary_chars: usize,
}

impl ReadPaperTool {
    /// Tool name advertised to clients.
    pub const NAME: &'static str = "read_paper";

    /// Creates the tool from the `papers` configuration section.
    #[must_use]
    pub fn new(config: PaperConfig) -> Self {
        Self {
            extractor: PdfExtractor::new(config.allowed_paths),
            summary_chars: config.summary_chars,
        }
    }
}

impl Tool for ReadPaperTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Reads the plain-text content of a local PDF file. \
         Suited to paper analysis, document summaries and similar tasks."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "filePath": {
                    "type": "string",
                    "description": "Absolute path of the PDF file, e.g. /Users/admin/paper.pdf"
                },
                "summaryOnly": {
                    "type": "boolean",
                    "description": format!(
                        "If true, only the first {} characters are returned.",
                        self.summary_chars
                    )
                }
            },
            "required": ["filePath"]
        })
    }

    fn execute(&self, arguments: &Value) -> Result<String, McpError> {
        let params = ReadPaperParams::deserialize(arguments).map_err(|e| {
            McpError::InvalidParams(format!("Invalid arguments for {}: {e}", Self::NAME))
        })?;

        let text = self.extractor.extract_text(&params.file_path)?;

        if params.summary_only {
            return Ok(truncate_chars(&text, self.summary_chars).to_string());
        }
        Ok(text)
    }
}

/// Returns at most the first `max` characters of `text`.
fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::protocol::ErrorCode;

    fn tool() -> ReadPaperTool {
        ReadPaperTool::new(PaperConfig::default())
    }

    #[test]
    fn schema_requires_file_path() {
        let schema = tool().input_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"], json!(["filePath"]));
        assert_eq!(schema["properties"]["filePath"]["type"], "string");
        assert_eq!(schema["properties"]["summaryOnly"]["type"], "boolean");
    }

    #[test]
    fn missing_file_path_is_invalid_params() {
        let err = tool().execute(&json!({})).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidParams);
        assert!(err.message().contains("filePath"));
    }

    #[test]
    fn wrong_type_is_invalid_params() {
        let err = tool().execute(&json!({"filePath": 42})).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidParams);
    }

    #[test]
    fn non_object_arguments_are_invalid_params() {
        let err = tool().execute(&Value::Null).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidParams);
    }

    #[test]
    fn nonexistent_file_is_not_found() {
        let err = tool()
            .execute(&json!({"filePath": "/no/such.pdf", "summaryOnly": true}))
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::FileNotFound);
    }

    fn fixture(name: &str) -> String {
        format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"))
    }

    #[test]
    fn summary_only_truncates_extracted_text() {
        let tool = ReadPaperTool::new(PaperConfig {
            summary_chars: 10,
            ..PaperConfig::default()
        });
        let path = fixture("paper.pdf");

        let full = tool.execute(&json!({"filePath": path})).unwrap();
        let summary = tool
            .execute(&json!({"filePath": path, "summaryOnly": true}))
            .unwrap();

        assert!(full.contains("See /Encrypt dictionary in section 7.6"));
        assert_eq!(summary.chars().count(), 10);
        assert!(full.starts_with(&summary));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo wörld", 5), "héllo");
        assert_eq!(truncate_chars("short", 100), "short");
        assert_eq!(truncate_chars("论文内容", 2), "论文");
        assert_eq!(truncate_chars("", 3), "");
    }
}
