use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum GranskaError {
    #[error("extraction failed: {0}")]
    Extraction(String),

    #[error("{tool} not found. {hint}")]
    ToolNotFound {
        tool: &'static str,
        hint: &'static str,
    },

    #[error("{tool} failed with exit code {code}: {stderr}")]
    ToolFailed {
        tool: &'static str,
        code: i32,
        stderr: String,
    },

    #[error("failed to read PDF: {0}")]
    Pdf(String),

    #[error("failed to read spreadsheet: {0}")]
    Spreadsheet(String),

    #[error("failed to read Office document: {0}")]
    Ooxml(String),

    #[error("OCR failed: {0}")]
    Ocr(String),

    #[error("unsupported document format for '{filename}' (mime type '{mime}')")]
    UnsupportedFormat { filename: String, mime: String },

    #[error("failed to load keyword table from {path}: {reason}")]
    KeywordsLoad { path: PathBuf, reason: String },

    #[error("invalid keyword table: {0}")]
    KeywordsInvalid(String),

    #[error("failed to load config from {path}: {reason}")]
    ConfigLoad { path: PathBuf, reason: String },

    #[error("invalid config: {0}")]
    ConfigInvalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GranskaError {
    /// Map a spawn error for an external tool, distinguishing a missing binary.
    pub(crate) fn spawn(tool: &'static str, hint: &'static str, e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::NotFound {
            GranskaError::ToolNotFound { tool, hint }
        } else {
            GranskaError::Extraction(format!("{tool} failed to start: {e}"))
        }
    }
}
