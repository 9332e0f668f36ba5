pub mod image;
pub mod ocr;
pub mod ooxml;
pub mod pdf;
pub mod pdf_native;
pub mod pdftotext;
pub mod presentation;
pub mod raster;
pub mod spreadsheet;
pub mod text;
pub mod word;

use crate::config::ReaderConfig;
use crate::detect::detect_format;
use crate::error::GranskaError;
use crate::model::{DocumentExtractionResult, DocumentFormat};
use tracing::{debug, info};

/// Text layer of a PDF plus the document-level facts read alongside it.
#[derive(Debug, Clone, Default)]
pub struct PdfText {
    pub text: String,
    pub page_count: usize,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
}

/// Trait for PDF text-layer extraction backends.
pub trait PdfTextExtractor: Send + Sync {
    /// Extract embedded text. Unparseable input is an error, never an empty result.
    fn extract_text(&self, pdf_bytes: &[u8]) -> Result<PdfText, GranskaError>;

    /// Name of this extraction backend (for diagnostics).
    fn backend_name(&self) -> &str;
}

/// A rasterized PDF page.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub page_number: usize,
    pub png: Vec<u8>,
}

/// Trait for PDF page rasterizers feeding the OCR engine.
pub trait PdfRasterizer: Send + Sync {
    /// Render pages `1..=max_pages` (or fewer) at `scale` times the 72 dpi viewport.
    fn render_pages(
        &self,
        pdf_bytes: &[u8],
        max_pages: usize,
        scale: f32,
    ) -> Result<Vec<RenderedPage>, GranskaError>;

    fn backend_name(&self) -> &str;
}

/// Text recognized from one image.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrPage {
    pub text: String,
    /// Mean recognition confidence in [0, 1].
    pub confidence: f64,
}

/// Trait for optical character recognition engines.
pub trait OcrEngine: Send + Sync {
    fn recognize(&self, image: &[u8]) -> Result<OcrPage, GranskaError>;

    /// Tesseract language string in effect, e.g. "swe+eng".
    fn language(&self) -> String;

    fn backend_name(&self) -> &str;
}

/// Format-agnostic reader. Built once with its capabilities resolved, then
/// shared across calls; it keeps no per-call state.
pub struct DocumentReader {
    config: ReaderConfig,
    pdf_text: Box<dyn PdfTextExtractor>,
    rasterizer: Box<dyn PdfRasterizer>,
    ocr: Box<dyn OcrEngine>,
}

impl DocumentReader {
    pub fn new(
        config: ReaderConfig,
        pdf_text: Box<dyn PdfTextExtractor>,
        rasterizer: Box<dyn PdfRasterizer>,
        ocr: Box<dyn OcrEngine>,
    ) -> Self {
        DocumentReader {
            config,
            pdf_text,
            rasterizer,
            ocr,
        }
    }

    /// Build a reader on the system tools: pdftotext when installed (else the
    /// pure-Rust backend), pdftoppm and tesseract.
    pub fn from_system(config: ReaderConfig) -> Self {
        let pdf_text: Box<dyn PdfTextExtractor> =
            if pdftotext::PdftotextExtractor::is_available(&config.pdftotext_path) {
                Box::new(pdftotext::PdftotextExtractor::new(&config.pdftotext_path))
            } else {
                Box::new(pdf_native::NativePdfExtractor::new())
            };
        Self::with_pdf_backend(config, pdf_text)
    }

    /// Like `from_system`, with an explicit PDF text backend.
    pub fn with_pdf_backend(config: ReaderConfig, pdf_text: Box<dyn PdfTextExtractor>) -> Self {
        let rasterizer = Box::new(raster::PdftoppmRasterizer::new(&config.pdftoppm_path));
        let ocr = Box::new(ocr::TesseractOcr::new(
            &config.tesseract_path,
            &config.ocr_language_arg(),
        ));
        info!(
            pdf_backend = pdf_text.backend_name(),
            "document reader initialised"
        );
        Self::new(config, pdf_text, rasterizer, ocr)
    }

    /// Detect the format of an upload and extract its text.
    ///
    /// An unresolvable format is returned as `UnsupportedFormat`; callers that
    /// want a best-effort decode can use [`text::extract`] directly.
    pub fn read(
        &self,
        bytes: &[u8],
        filename: &str,
        mime: &str,
    ) -> Result<DocumentExtractionResult, GranskaError> {
        let format = detect_format(mime, filename);
        debug!(filename, mime, %format, "detected document format");
        self.read_as(format, bytes, filename, mime)
    }

    /// Extract text from an upload whose format is already known.
    pub fn read_as(
        &self,
        format: DocumentFormat,
        bytes: &[u8],
        filename: &str,
        mime: &str,
    ) -> Result<DocumentExtractionResult, GranskaError> {
        match format {
            DocumentFormat::Pdf => pdf::extract(
                bytes,
                self.pdf_text.as_ref(),
                self.rasterizer.as_ref(),
                self.ocr.as_ref(),
                &self.config,
            ),
            DocumentFormat::Excel => spreadsheet::extract(bytes, filename),
            DocumentFormat::Word => word::extract(bytes),
            DocumentFormat::Powerpoint => presentation::extract(bytes),
            DocumentFormat::Text => Ok(text::extract(bytes)),
            DocumentFormat::Image => image::extract(bytes, filename, self.ocr.as_ref()),
            DocumentFormat::Unknown => Err(GranskaError::UnsupportedFormat {
                filename: filename.to_string(),
                mime: mime.to_string(),
            }),
        }
    }
}
