use crate::error::GranskaError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunables for the document reader. Every field has a default, so a config
/// file only needs to name what it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Embedded PDF text shorter than this (in characters) triggers OCR.
    pub min_text_chars: usize,
    /// Upper bound on pages rasterized for OCR. Bounds worst-case latency.
    pub max_ocr_pages: usize,
    /// Rasterization scale relative to the 72 dpi PDF viewport.
    pub render_scale: f32,
    /// Tesseract language packs, joined with '+'.
    pub ocr_languages: Vec<String>,
    /// Run page-level OCR on scoped threads.
    pub parallel_ocr: bool,
    pub tesseract_path: String,
    pub pdftotext_path: String,
    pub pdftoppm_path: String,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        ReaderConfig {
            min_text_chars: 100,
            max_ocr_pages: 5,
            render_scale: 2.0,
            ocr_languages: vec!["swe".into(), "eng".into()],
            parallel_ocr: false,
            tesseract_path: "tesseract".into(),
            pdftotext_path: "pdftotext".into(),
            pdftoppm_path: "pdftoppm".into(),
        }
    }
}

impl ReaderConfig {
    /// Language argument as passed to tesseract, e.g. "swe+eng".
    pub fn ocr_language_arg(&self) -> String {
        self.ocr_languages.join("+")
    }

    /// Render resolution in dots per inch.
    pub fn render_dpi(&self) -> u32 {
        dpi_for_scale(self.render_scale)
    }
}

/// Resolution for a scale relative to the 72 dpi PDF viewport, at least 1.
pub fn dpi_for_scale(scale: f32) -> u32 {
    (72.0 * scale).round().max(1.0) as u32
}

/// Load a reader config from a JSON file.
pub fn load_config(path: &Path) -> Result<ReaderConfig, GranskaError> {
    let content = std::fs::read_to_string(path).map_err(|e| GranskaError::ConfigLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let config: ReaderConfig =
        serde_json::from_str(&content).map_err(|e| GranskaError::ConfigLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    validate_config(&config)?;
    Ok(config)
}

/// Parse a reader config from a JSON string.
pub fn parse_config_str(json: &str) -> Result<ReaderConfig, GranskaError> {
    let config: ReaderConfig = serde_json::from_str(json)?;
    validate_config(&config)?;
    Ok(config)
}

pub fn validate_config(config: &ReaderConfig) -> Result<(), GranskaError> {
    if config.min_text_chars == 0 {
        return Err(GranskaError::ConfigInvalid(
            "min_text_chars must be at least 1".into(),
        ));
    }

    if config.max_ocr_pages == 0 || config.max_ocr_pages > 500 {
        return Err(GranskaError::ConfigInvalid(format!(
            "max_ocr_pages must be between 1 and 500 (got {})",
            config.max_ocr_pages
        )));
    }

    if !(0.5..=8.0).contains(&config.render_scale) {
        return Err(GranskaError::ConfigInvalid(format!(
            "render_scale must be between 0.5 and 8 (got {})",
            config.render_scale
        )));
    }

    if config.ocr_languages.is_empty() {
        return Err(GranskaError::ConfigInvalid(
            "ocr_languages must not be empty".into(),
        ));
    }

    for lang in &config.ocr_languages {
        if lang.is_empty() || !lang.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(GranskaError::ConfigInvalid(format!(
                "invalid OCR language '{lang}'"
            )));
        }
    }

    Ok(())
}
