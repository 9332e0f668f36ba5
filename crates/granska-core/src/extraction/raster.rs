use crate::config::dpi_for_scale;
use crate::error::GranskaError;
use crate::extraction::{PdfRasterizer, RenderedPage};
use std::io::Write;
use std::path::Path;
use std::process::Command;
use tracing::debug;

const HINT: &str =
    "Install poppler: brew install poppler (macOS) or apt install poppler-utils (Linux)";

/// Page rasterizer using pdftoppm (from poppler-utils).
pub struct PdftoppmRasterizer {
    binary: String,
}

impl PdftoppmRasterizer {
    pub fn new(binary: &str) -> Self {
        PdftoppmRasterizer {
            binary: binary.to_string(),
        }
    }
}

impl PdfRasterizer for PdftoppmRasterizer {
    fn render_pages(
        &self,
        pdf_bytes: &[u8],
        max_pages: usize,
        scale: f32,
    ) -> Result<Vec<RenderedPage>, GranskaError> {
        let workdir = tempfile::tempdir().map_err(|e| GranskaError::Extraction(e.to_string()))?;
        let pdf_path = workdir.path().join("input.pdf");
        std::fs::File::create(&pdf_path)
            .and_then(|mut f| f.write_all(pdf_bytes))
            .map_err(|e| GranskaError::Extraction(e.to_string()))?;

        let dpi = dpi_for_scale(scale);
        let prefix = workdir.path().join("page");
        let output = Command::new(&self.binary)
            .arg("-png")
            .arg("-r")
            .arg(dpi.to_string())
            .arg("-f")
            .arg("1")
            .arg("-l")
            .arg(max_pages.max(1).to_string())
            .arg(&pdf_path)
            .arg(&prefix)
            .output()
            .map_err(|e| GranskaError::spawn("pdftoppm", HINT, e))?;

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(GranskaError::ToolFailed {
                tool: "pdftoppm",
                code,
                stderr,
            });
        }

        let mut pages = Vec::new();
        for entry in std::fs::read_dir(workdir.path())? {
            let path = entry?.path();
            if let Some(page_number) = page_number_from_output(&path) {
                pages.push(RenderedPage {
                    page_number,
                    png: std::fs::read(&path)?,
                });
            }
        }
        pages.sort_by_key(|p| p.page_number);
        pages.truncate(max_pages);
        debug!(pages = pages.len(), dpi, "rasterized PDF pages");

        Ok(pages)
    }

    fn backend_name(&self) -> &str {
        "pdftoppm"
    }
}

/// pdftoppm names its output `page-1.png` or zero-padded `page-01.png`.
fn page_number_from_output(path: &Path) -> Option<usize> {
    if path.extension()?.to_str()? != "png" {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let number = stem.strip_prefix("page-")?;
    number.parse().ok()
}
