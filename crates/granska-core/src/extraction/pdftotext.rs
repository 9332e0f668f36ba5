use crate::error::GranskaError;
use crate::extraction::pdf_native::read_info;
use crate::extraction::{PdfText, PdfTextExtractor};
use std::io::Write;
use std::process::Command;
use tracing::debug;

const HINT: &str =
    "Install poppler: brew install poppler (macOS) or apt install poppler-utils (Linux)";

/// PDF text backend using pdftotext (from poppler-utils).
///
/// Uses `pdftotext -layout` to preserve whitespace alignment of tables, which
/// the layout-table reader in `financial::table` relies on.
pub struct PdftotextExtractor {
    binary: String,
}

impl PdftotextExtractor {
    pub fn new(binary: &str) -> Self {
        PdftotextExtractor {
            binary: binary.to_string(),
        }
    }

    /// Check if pdftotext is available on the system.
    pub fn is_available(binary: &str) -> bool {
        Command::new(binary)
            .arg("-v")
            .output()
            .map(|o| o.status.success() || !o.stderr.is_empty())
            .unwrap_or(false)
    }
}

impl Default for PdftotextExtractor {
    fn default() -> Self {
        Self::new("pdftotext")
    }
}

impl PdfTextExtractor for PdftotextExtractor {
    fn extract_text(&self, pdf_bytes: &[u8]) -> Result<PdfText, GranskaError> {
        let mut tmpfile =
            tempfile::NamedTempFile::new().map_err(|e| GranskaError::Extraction(e.to_string()))?;
        tmpfile
            .write_all(pdf_bytes)
            .map_err(|e| GranskaError::Extraction(e.to_string()))?;

        let output = Command::new(&self.binary)
            .arg("-layout")
            .arg("-enc")
            .arg("UTF-8")
            .arg(tmpfile.path())
            .arg("-") // output to stdout
            .output()
            .map_err(|e| GranskaError::spawn("pdftotext", HINT, e))?;

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(GranskaError::ToolFailed {
                tool: "pdftotext",
                code,
                stderr,
            });
        }

        let raw = String::from_utf8_lossy(&output.stdout);
        let (text, layout_pages) = join_pages(&raw);

        // Document info is best-effort here; pdftotext already vouched for the file.
        let info = read_info(pdf_bytes).ok();
        let page_count = info
            .as_ref()
            .map(|i| i.page_count)
            .filter(|n| *n > 0)
            .unwrap_or(layout_pages);
        debug!(page_count, chars = text.len(), "pdftotext extraction done");

        Ok(PdfText {
            text,
            page_count,
            producer: info.as_ref().and_then(|i| i.producer.clone()),
            creation_date: info.and_then(|i| i.creation_date),
        })
    }

    fn backend_name(&self) -> &str {
        "pdftotext"
    }
}

/// Join pdftotext pages (form-feed separated) with newlines.
///
/// Returns the text and the number of pages seen. pdftotext terminates the
/// last page with a form feed too, so a trailing empty chunk is not a page.
fn join_pages(raw: &str) -> (String, usize) {
    let mut chunks: Vec<&str> = raw.split('\x0c').collect();
    if chunks.len() > 1 && chunks.last().is_some_and(|c| c.trim().is_empty()) {
        chunks.pop();
    }
    let pages = chunks.len();
    let text = chunks
        .iter()
        .map(|c| c.trim_end_matches('\n'))
        .collect::<Vec<_>>()
        .join("\n");
    (text, pages)
}
