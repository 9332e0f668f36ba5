use crate::error::GranskaError;
use crate::extraction::pdf::floor_ocr_confidence;
use crate::extraction::OcrEngine;
use crate::model::{DocumentExtractionResult, DocumentFormat, META_EXTRACTION_METHOD};
use tracing::info;

/// OCR a standalone image. There is no other text source, so an engine
/// failure is returned as an error.
pub fn extract(
    bytes: &[u8],
    filename: &str,
    ocr: &dyn OcrEngine,
) -> Result<DocumentExtractionResult, GranskaError> {
    let page = ocr.recognize(bytes)?;
    let confidence = floor_ocr_confidence(page.confidence);
    info!(
        filename,
        chars = page.text.len(),
        confidence,
        backend = ocr.backend_name(),
        "image OCR done"
    );

    let mut warnings = Vec::new();
    if page.text.trim().is_empty() {
        warnings.push("OCR recognized no text in image".to_string());
    }

    Ok(
        DocumentExtractionResult::new(page.text, DocumentFormat::Image, confidence)
            .with_meta(META_EXTRACTION_METHOD, "ocr")
            .with_meta("ocrLanguage", ocr.language())
            .with_meta("fileName", filename)
            .with_warnings(warnings),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::OcrPage;

    struct Fixed(Result<OcrPage, ()>);

    impl OcrEngine for Fixed {
        fn recognize(&self, _image: &[u8]) -> Result<OcrPage, GranskaError> {
            self.0.clone().map_err(|_| GranskaError::ToolNotFound {
                tool: "tesseract",
                hint: "",
            })
        }

        fn language(&self) -> String {
            "swe+eng".into()
        }

        fn backend_name(&self) -> &str {
            "fixed"
        }
    }

    #[test]
    fn test_image_ocr_metadata() {
        let ocr = Fixed(Ok(OcrPage {
            text: "Kvitto 1 250 kr".into(),
            confidence: 0.91,
        }));
        let r = extract(b"png", "kvitto.png", &ocr).unwrap();
        assert_eq!(r.text, "Kvitto 1 250 kr");
        assert_eq!(r.format, DocumentFormat::Image);
        assert!((r.confidence - 0.91).abs() < 1e-9);
        assert_eq!(r.metadata["ocrLanguage"], "swe+eng");
        assert_eq!(r.metadata["fileName"], "kvitto.png");
        assert_eq!(r.extraction_method(), Some("ocr"));
    }

    #[test]
    fn test_confidence_floor() {
        let ocr = Fixed(Ok(OcrPage {
            text: "brus".into(),
            confidence: 0.2,
        }));
        assert_eq!(extract(b"png", "scan.jpg", &ocr).unwrap().confidence, 0.6);
    }

    #[test]
    fn test_missing_engine_is_fatal() {
        let err = extract(b"png", "scan.jpg", &Fixed(Err(()))).unwrap_err();
        assert!(matches!(err, GranskaError::ToolNotFound { .. }));
    }
}
