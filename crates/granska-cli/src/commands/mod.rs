pub mod detect;
pub mod financials;
pub mod keywords;
pub mod read;

use granska_core::config::{load_config, ReaderConfig};
use granska_core::error::GranskaError;
use granska_core::extraction::pdf_native::NativePdfExtractor;
use granska_core::extraction::pdftotext::PdftotextExtractor;
use granska_core::extraction::DocumentReader;
use std::path::{Path, PathBuf};

use crate::PdfBackend;

/// An uploaded file as the library sees it.
pub struct Upload {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub mime: String,
}

impl Upload {
    pub fn open(path: &Path, mime: Option<String>) -> Result<Self, GranskaError> {
        let bytes = std::fs::read(path)?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mime = mime.unwrap_or_else(|| guess_mime(&filename).to_string());
        Ok(Upload {
            bytes,
            filename,
            mime,
        })
    }
}

pub fn build_reader(
    backend: PdfBackend,
    config: Option<PathBuf>,
) -> Result<DocumentReader, GranskaError> {
    let config = match config {
        Some(path) => load_config(&path)?,
        None => ReaderConfig::default(),
    };
    Ok(match backend {
        PdfBackend::Auto => DocumentReader::from_system(config),
        PdfBackend::Pdftotext => {
            if !PdftotextExtractor::is_available(&config.pdftotext_path) {
                return Err(GranskaError::ToolNotFound {
                    tool: "pdftotext",
                    hint: "Install poppler-utils or use --pdf-backend native.",
                });
            }
            let pdf = Box::new(PdftotextExtractor::new(&config.pdftotext_path));
            DocumentReader::with_pdf_backend(config, pdf)
        }
        PdfBackend::Native => {
            DocumentReader::with_pdf_backend(config, Box::new(NativePdfExtractor::new()))
        }
    })
}

/// MIME type a browser would typically send for this file name.
pub fn guess_mime(filename: &str) -> &'static str {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "xls" => "application/vnd.ms-excel",
        "csv" => "text/csv",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "txt" | "md" => "text/plain",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "tif" | "tiff" => "image/tiff",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use granska_core::detect::detect_format;
    use granska_core::model::DocumentFormat;

    #[test]
    fn test_guessed_mime_detects_as_extension() {
        for (name, format) in [
            ("rr.xlsx", DocumentFormat::Excel),
            ("rr.csv", DocumentFormat::Excel),
            ("memo.docx", DocumentFormat::Word),
            ("deck.pptx", DocumentFormat::Powerpoint),
            ("scan.jpg", DocumentFormat::Image),
            ("bokslut.pdf", DocumentFormat::Pdf),
            ("notes.txt", DocumentFormat::Text),
        ] {
            assert_eq!(detect_format(guess_mime(name), name), format, "{name}");
        }
        assert_eq!(guess_mime("blob"), "application/octet-stream");
    }
}
