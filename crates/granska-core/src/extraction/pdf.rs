use crate::config::ReaderConfig;
use crate::error::GranskaError;
use crate::extraction::{OcrEngine, OcrPage, PdfRasterizer, PdfTextExtractor, RenderedPage};
use crate::model::{DocumentExtractionResult, DocumentFormat, META_EXTRACTION_METHOD};
use tracing::{debug, info, warn};

pub const TEXT_LAYER_CONFIDENCE: f64 = 0.95;
pub const OCR_CONFIDENCE_FLOOR: f64 = 0.6;
pub const SPARSE_TEXT_CONFIDENCE: f64 = 0.5;

const IMAGE_BASED_WARNING: &str =
    "document may be image-based (scanned); extracted text is sparse and should be verified";

/// Extract text from a PDF, falling back to OCR when the text layer is sparse.
///
/// A buffer the PDF backend cannot parse is an error. Rendering or OCR
/// failures during the fallback are not: the embedded text is returned at
/// reduced confidence with a warning.
pub fn extract(
    pdf_bytes: &[u8],
    pdf_text: &dyn PdfTextExtractor,
    rasterizer: &dyn PdfRasterizer,
    ocr: &dyn OcrEngine,
    config: &ReaderConfig,
) -> Result<DocumentExtractionResult, GranskaError> {
    let embedded = pdf_text.extract_text(pdf_bytes)?;
    let embedded_text = embedded.text.trim().to_string();
    let embedded_chars = embedded_text.chars().count();

    let base = |text: String, confidence: f64, method: &str| {
        let mut result = DocumentExtractionResult::new(text, DocumentFormat::Pdf, confidence)
            .with_pages(embedded.page_count)
            .with_meta(META_EXTRACTION_METHOD, method)
            .with_meta("pageCount", embedded.page_count)
            .with_meta("backend", pdf_text.backend_name());
        if let Some(ref producer) = embedded.producer {
            result = result.with_meta("producer", producer.as_str());
        }
        if let Some(ref created) = embedded.creation_date {
            result = result.with_meta("creationDate", created.as_str());
        }
        result
    };

    if embedded_chars >= config.min_text_chars {
        info!(chars = embedded_chars, "PDF text layer is sufficient");
        return Ok(base(embedded_text, TEXT_LAYER_CONFIDENCE, "text"));
    }

    debug!(
        chars = embedded_chars,
        threshold = config.min_text_chars,
        "PDF text layer is sparse, running OCR"
    );

    let mut warnings = Vec::new();
    match run_ocr(pdf_bytes, rasterizer, ocr, config) {
        Ok(outcome) if outcome.recognized_chars > embedded_chars => {
            info!(
                chars = outcome.recognized_chars,
                pages = outcome.page_confidences.len(),
                confidence = outcome.confidence,
                "using OCR text for PDF"
            );
            warnings.extend(outcome.warnings);
            if outcome.recognized_chars < config.min_text_chars {
                warnings.push(IMAGE_BASED_WARNING.to_string());
            }
            let result = base(outcome.text, outcome.confidence, "ocr")
                .with_meta("ocrLanguage", ocr.language())
                .with_meta("ocrPagesProcessed", outcome.page_confidences.len())
                .with_meta("ocrPageConfidences", outcome.page_confidences)
                .with_warnings(warnings);
            return Ok(result);
        }
        Ok(outcome) => {
            debug!("OCR produced no more text than the embedded layer");
            warnings.extend(outcome.warnings);
        }
        Err(e) => {
            warn!(error = %e, "OCR fallback failed");
            warnings.push(format!("OCR fallback failed: {e}"));
        }
    }

    warnings.push(IMAGE_BASED_WARNING.to_string());
    Ok(base(embedded_text, SPARSE_TEXT_CONFIDENCE, "text").with_warnings(warnings))
}

struct OcrOutcome {
    text: String,
    /// Characters recognized on the pages, page markers excluded.
    recognized_chars: usize,
    confidence: f64,
    page_confidences: Vec<f64>,
    warnings: Vec<String>,
}

/// OCR the rendered pages. A page that fails is skipped with a warning;
/// only a run in which every page fails is an error.
fn run_ocr(
    pdf_bytes: &[u8],
    rasterizer: &dyn PdfRasterizer,
    ocr: &dyn OcrEngine,
    config: &ReaderConfig,
) -> Result<OcrOutcome, GranskaError> {
    let pages = rasterizer.render_pages(pdf_bytes, config.max_ocr_pages, config.render_scale)?;
    if pages.is_empty() {
        return Err(GranskaError::Ocr("no pages could be rendered".into()));
    }
    let pages: Vec<RenderedPage> = pages.into_iter().take(config.max_ocr_pages).collect();

    let recognized = if config.parallel_ocr && pages.len() > 1 {
        recognize_parallel(&pages, ocr)
    } else {
        pages.iter().map(|p| recognize_page(p, ocr)).collect()
    };

    let mut text = String::new();
    let mut recognized_chars = 0;
    let mut page_confidences = Vec::with_capacity(recognized.len());
    let mut warnings = Vec::new();
    let mut first_error = None;
    for (page, result) in pages.iter().zip(recognized) {
        let result = match result {
            Ok(result) => result,
            Err(e) => {
                warn!(page = page.page_number, error = %e, "page OCR failed");
                warnings.push(format!("page {}: {e}", page.page_number));
                first_error.get_or_insert(e);
                continue;
            }
        };
        let page_text = result.text.trim();
        if !text.is_empty() {
            text.push('\n');
        }
        text.push_str(&format!("--- Page {} ---\n", page.page_number));
        text.push_str(page_text);
        recognized_chars += page_text.chars().count();
        page_confidences.push(result.confidence);
    }

    if page_confidences.is_empty() {
        if let Some(e) = first_error {
            return Err(e);
        }
    }
    if recognized_chars == 0 {
        text.clear();
    }

    Ok(OcrOutcome {
        text,
        recognized_chars,
        confidence: floor_ocr_confidence(mean(&page_confidences)),
        page_confidences,
        warnings,
    })
}

fn recognize_page(page: &RenderedPage, ocr: &dyn OcrEngine) -> Result<OcrPage, GranskaError> {
    let result = ocr.recognize(&page.png)?;
    debug!(
        page = page.page_number,
        chars = result.text.len(),
        confidence = result.confidence,
        "recognized page"
    );
    Ok(result)
}

/// One scoped thread per page, results in page order.
fn recognize_parallel(
    pages: &[RenderedPage],
    ocr: &dyn OcrEngine,
) -> Vec<Result<OcrPage, GranskaError>> {
    std::thread::scope(|scope| {
        let handles: Vec<_> = pages
            .iter()
            .map(|page| scope.spawn(move || recognize_page(page, ocr)))
            .collect();
        handles
            .into_iter()
            .map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|_| Err(GranskaError::Ocr("OCR worker panicked".into())))
            })
            .collect()
    })
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// OCR output is never reported as less trustworthy than the floor, nor above 1.
pub fn floor_ocr_confidence(c: f64) -> f64 {
    if c.is_nan() {
        return OCR_CONFIDENCE_FLOOR;
    }
    c.clamp(OCR_CONFIDENCE_FLOOR, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::PdfText;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedText(&'static str);

    impl PdfTextExtractor for FixedText {
        fn extract_text(&self, _pdf_bytes: &[u8]) -> Result<PdfText, GranskaError> {
            Ok(PdfText {
                text: self.0.to_string(),
                page_count: 7,
                producer: Some("Skanner 3000".into()),
                creation_date: None,
            })
        }

        fn backend_name(&self) -> &str {
            "fixed"
        }
    }

    struct Broken;

    impl PdfTextExtractor for Broken {
        fn extract_text(&self, _pdf_bytes: &[u8]) -> Result<PdfText, GranskaError> {
            Err(GranskaError::Pdf("invalid file header".into()))
        }

        fn backend_name(&self) -> &str {
            "broken"
        }
    }

    struct Pages {
        rendered: AtomicUsize,
    }

    impl PdfRasterizer for Pages {
        fn render_pages(
            &self,
            _pdf_bytes: &[u8],
            max_pages: usize,
            _scale: f32,
        ) -> Result<Vec<RenderedPage>, GranskaError> {
            let pages: Vec<RenderedPage> = (1..=7)
                .take(max_pages)
                .map(|n| RenderedPage {
                    page_number: n,
                    png: vec![n as u8],
                })
                .collect();
            self.rendered.store(pages.len(), Ordering::SeqCst);
            Ok(pages)
        }

        fn backend_name(&self) -> &str {
            "pages"
        }
    }

    struct NoRender;

    impl PdfRasterizer for NoRender {
        fn render_pages(
            &self,
            _pdf_bytes: &[u8],
            _max_pages: usize,
            _scale: f32,
        ) -> Result<Vec<RenderedPage>, GranskaError> {
            Err(GranskaError::ToolNotFound {
                tool: "pdftoppm",
                hint: "",
            })
        }

        fn backend_name(&self) -> &str {
            "none"
        }
    }

    struct Ocr {
        confidence: f64,
        text: &'static str,
    }

    impl OcrEngine for Ocr {
        fn recognize(&self, image: &[u8]) -> Result<OcrPage, GranskaError> {
            Ok(OcrPage {
                text: format!("{} {}", self.text, image[0]),
                confidence: self.confidence,
            })
        }

        fn language(&self) -> String {
            "swe+eng".into()
        }

        fn backend_name(&self) -> &str {
            "mock"
        }
    }

    /// Recognizes every page except `fails`, which errors.
    struct FlakyOcr {
        fails: u8,
    }

    impl OcrEngine for FlakyOcr {
        fn recognize(&self, image: &[u8]) -> Result<OcrPage, GranskaError> {
            if image[0] == self.fails {
                return Err(GranskaError::Ocr(format!("page {} unreadable", image[0])));
            }
            Ok(OcrPage {
                text: format!("Nettoomsättning 12 000 000 kronor, sida {}", image[0]),
                confidence: 0.8,
            })
        }

        fn language(&self) -> String {
            "swe+eng".into()
        }

        fn backend_name(&self) -> &str {
            "flaky"
        }
    }

    fn three_pages(parallel_ocr: bool) -> ReaderConfig {
        ReaderConfig {
            parallel_ocr,
            max_ocr_pages: 3,
            ..ReaderConfig::default()
        }
    }

    fn long_text() -> &'static str {
        "Årsredovisning för räkenskapsåret 2023. Nettoomsättning 12 000 000 kronor. \
         Rörelsens kostnader 9 000 000 kronor. Årets resultat 2 100 000 kronor."
    }

    #[test]
    fn test_text_layer_used_when_sufficient() {
        let raster = Pages { rendered: AtomicUsize::new(0) };
        let ocr = Ocr { confidence: 0.9, text: "x" };
        let r = extract(b"", &FixedText(long_text()), &raster, &ocr, &ReaderConfig::default())
            .unwrap();
        assert_eq!(r.confidence, TEXT_LAYER_CONFIDENCE);
        assert_eq!(r.extraction_method(), Some("text"));
        assert_eq!(r.pages, Some(7));
        assert_eq!(r.metadata["producer"], "Skanner 3000");
        assert_eq!(raster.rendered.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_sparse_text_triggers_ocr_capped_at_five_pages() {
        let raster = Pages { rendered: AtomicUsize::new(0) };
        let ocr = Ocr {
            confidence: 0.82,
            text: "Omsättning 10 000 000 Kostnader 8 000 000 Resultat efter finansiella poster",
        };
        let sparse = "Sida 1 av 7, inskannat dokument.";
        let r = extract(b"", &FixedText(sparse), &raster, &ocr, &ReaderConfig::default()).unwrap();
        assert_eq!(r.extraction_method(), Some("ocr"));
        assert_eq!(raster.rendered.load(Ordering::SeqCst), 5);
        assert_eq!(r.metadata["ocrPagesProcessed"], 5);
        assert!(r.text.contains("--- Page 1 ---"));
        assert!(r.text.contains("--- Page 5 ---"));
        assert!(!r.text.contains("--- Page 6 ---"));
        assert!((r.confidence - 0.82).abs() < 1e-9);
    }

    #[test]
    fn test_low_ocr_confidence_is_floored() {
        let raster = Pages { rendered: AtomicUsize::new(0) };
        let ocr = Ocr { confidence: 0.12, text: "suddig text" };
        let r = extract(b"", &FixedText(""), &raster, &ocr, &ReaderConfig::default()).unwrap();
        assert_eq!(r.extraction_method(), Some("ocr"));
        assert_eq!(r.confidence, OCR_CONFIDENCE_FLOOR);
    }

    #[test]
    fn test_ocr_failure_returns_embedded_text_with_warning() {
        let ocr = Ocr { confidence: 0.9, text: "x" };
        let r = extract(b"", &FixedText("kort"), &NoRender, &ocr, &ReaderConfig::default())
            .unwrap();
        assert_eq!(r.text, "kort");
        assert_eq!(r.extraction_method(), Some("text"));
        assert_eq!(r.confidence, SPARSE_TEXT_CONFIDENCE);
        let warnings = r.warnings();
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("OCR fallback failed"));
        assert!(warnings[1].contains("image-based"));
    }

    #[test]
    fn test_unparseable_pdf_propagates() {
        let raster = Pages { rendered: AtomicUsize::new(0) };
        let ocr = Ocr { confidence: 0.9, text: "x" };
        let err = extract(b"junk", &Broken, &raster, &ocr, &ReaderConfig::default()).unwrap_err();
        assert!(matches!(err, GranskaError::Pdf(_)));
    }

    #[test]
    fn test_parallel_ocr_keeps_page_order() {
        let raster = Pages { rendered: AtomicUsize::new(0) };
        let ocr = Ocr { confidence: 0.7, text: "sida" };
        let config = ReaderConfig {
            parallel_ocr: true,
            max_ocr_pages: 3,
            ..ReaderConfig::default()
        };
        let r = extract(b"", &FixedText(""), &raster, &ocr, &config).unwrap();
        let p1 = r.text.find("--- Page 1 ---").unwrap();
        let p2 = r.text.find("--- Page 2 ---").unwrap();
        let p3 = r.text.find("--- Page 3 ---").unwrap();
        assert!(p1 < p2 && p2 < p3);
        assert!(r.text.contains("sida 3"));
    }

    #[test]
    fn test_failed_page_is_skipped_with_warning() {
        for parallel in [false, true] {
            let raster = Pages { rendered: AtomicUsize::new(0) };
            let ocr = FlakyOcr { fails: 2 };
            let r = extract(b"", &FixedText("kort"), &raster, &ocr, &three_pages(parallel)).unwrap();
            assert_eq!(r.extraction_method(), Some("ocr"), "parallel={parallel}");
            assert!(r.text.contains("sida 1") && r.text.contains("sida 3"));
            assert!(!r.text.contains("--- Page 2 ---"));
            assert!((r.confidence - 0.8).abs() < 1e-9, "parallel={parallel}");
            assert_eq!(r.metadata["ocrPagesProcessed"], 2);
            let warnings = r.warnings();
            assert!(
                warnings.iter().any(|w| w == "page 2: OCR failed: page 2 unreadable"),
                "parallel={parallel}: {warnings:?}"
            );
        }
    }

    #[test]
    fn test_every_page_failing_falls_back_to_embedded_text() {
        struct AlwaysFails;
        impl OcrEngine for AlwaysFails {
            fn recognize(&self, _image: &[u8]) -> Result<OcrPage, GranskaError> {
                Err(GranskaError::Ocr("tesseract crashed".into()))
            }
            fn language(&self) -> String {
                "swe".into()
            }
            fn backend_name(&self) -> &str {
                "failing"
            }
        }

        for parallel in [false, true] {
            let raster = Pages { rendered: AtomicUsize::new(0) };
            let r = extract(b"", &FixedText("kort"), &raster, &AlwaysFails, &three_pages(parallel))
                .unwrap();
            assert_eq!(r.text, "kort");
            assert_eq!(r.confidence, SPARSE_TEXT_CONFIDENCE);
            let warnings = r.warnings();
            assert_eq!(
                warnings.iter().filter(|w| w.contains("OCR failed")).count(),
                1,
                "{warnings:?}"
            );
            assert!(warnings[0].starts_with("OCR fallback failed"));
        }
    }

    #[test]
    fn test_page_markers_do_not_count_as_recognized_text() {
        // Three near-empty pages: the markers alone outnumber the text layer.
        struct Blank;
        impl OcrEngine for Blank {
            fn recognize(&self, _image: &[u8]) -> Result<OcrPage, GranskaError> {
                Ok(OcrPage {
                    text: "i".into(),
                    confidence: 0.3,
                })
            }
            fn language(&self) -> String {
                "swe".into()
            }
            fn backend_name(&self) -> &str {
                "blank"
            }
        }

        let raster = Pages { rendered: AtomicUsize::new(0) };
        let layer = "Bilaga 3, sammanställning av nyckeltal";
        let r = extract(b"", &FixedText(layer), &raster, &Blank, &three_pages(false)).unwrap();
        assert_eq!(r.extraction_method(), Some("text"));
        assert_eq!(r.text, layer);
    }

    #[test]
    fn test_floor_ocr_confidence_bounds() {
        assert_eq!(floor_ocr_confidence(0.0), 0.6);
        assert_eq!(floor_ocr_confidence(1.4), 1.0);
        assert_eq!(floor_ocr_confidence(f64::NAN), 0.6);
        assert_eq!(floor_ocr_confidence(0.75), 0.75);
    }
}
