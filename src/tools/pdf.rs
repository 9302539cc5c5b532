//! PDF text extraction.
//!
//! Thin wrapper around `lopdf` and `pdf-extract` that turns every way of
//! failing into a typed [`McpError`]. Each call opens, reads and drops its
//! own document; nothing is cached between calls.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use lopdf::Document;
use pdf_extract::PlainTextOutput;

use crate::error::McpError;

/// Extracts plain text from PDF files inside the allowed directories.
#[derive(Debug, Clone, Default)]
pub struct PdfExtractor {
    /// Directories files must live in. Empty means any path is accepted.
    allowed_paths: Vec<PathBuf>,
}

impl PdfExtractor {
    /// Creates an extractor restricted to `allowed_paths`.
    #[must_use]
    pub const fn new(allowed_paths: Vec<PathBuf>) -> Self {
        Self { allowed_paths }
    }

    /// Reads the full text of the PDF at `file_path`.
    ///
    /// # Errors
    ///
    /// - [`McpError::InvalidParams`] if the path is blank or not a regular file
    /// - [`McpError::FileNotFound`] if nothing exists at the path
    /// - [`McpError::PermissionDenied`] if the path cannot be inspected, lies
    ///   outside the allowed directories, or the document is encrypted
    /// - [`McpError::Internal`] if the file cannot be read or parsed, or
    ///   yields no text
    pub fn extract_text(&self, file_path: &str) -> Result<String, McpError> {
        if file_path.trim().is_empty() {
            return Err(McpError::InvalidParams(
                "File path cannot be empty".to_string(),
            ));
        }

        let path = Path::new(file_path);

        let metadata = std::fs::metadata(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => McpError::FileNotFound(format!("PDF file not found: {file_path}")),
            ErrorKind::PermissionDenied => {
                McpError::PermissionDenied(format!("Access denied: cannot inspect {file_path}"))
            }
            _ => McpError::Internal(format!("Failed to read PDF file: {e}")),
        })?;

        if !metadata.is_file() {
            return Err(McpError::InvalidParams(format!(
                "Path is not a file: {file_path}"
            )));
        }

        self.validate_path(path)?;

        let bytes = std::fs::read(path)
            .map_err(|e| McpError::Internal(format!("Failed to read PDF file: {e}")))?;

        let document = Document::load_mem(&bytes)
            .map_err(|e| McpError::Internal(format!("Failed to read PDF file: {e}")))?;

        // Only the trailer's /Encrypt dictionary counts, not text mentioning it
        if document.is_encrypted() {
            return Err(McpError::PermissionDenied(
                "The PDF is encrypted and cannot be read without a password.".to_string(),
            ));
        }

        let mut text = String::new();
        pdf_extract::output_doc(&document, &mut PlainTextOutput::new(&mut text))
            .map_err(|e| McpError::Internal(format!("Failed to read PDF file: {e}")))?;

        if text.trim().is_empty() {
            return Err(McpError::Internal(
                "PDF parsed successfully but contains no text (it might be a scanned image)."
                    .to_string(),
            ));
        }

        tracing::debug!(path = %file_path, chars = text.chars().count(), "Extracted PDF text");
        Ok(text)
    }

    /// Checks that an existing path lies within one of the allowed paths.
    fn validate_path(&self, path: &Path) -> Result<(), McpError> {
        if self.allowed_paths.is_empty() {
            return Ok(());
        }

        let canonical_path = path.canonicalize().map_err(|e| {
            McpError::Internal(format!("Failed to resolve path '{}': {e}", path.display()))
        })?;

        for allowed in &self.allowed_paths {
            let Ok(canonical_allowed) = allowed.canonicalize() else {
                continue; // Skip non-existent allowed paths
            };

            if canonical_path.starts_with(&canonical_allowed) {
                return Ok(());
            }
        }

        // Don't echo the configured directories back to the client
        Err(McpError::PermissionDenied(
            "Access denied: path is outside the configured allowed directories".to_string(),
        ))
    }
}
