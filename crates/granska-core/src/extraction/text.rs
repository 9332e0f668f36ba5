use crate::model::{DocumentExtractionResult, DocumentFormat, META_EXTRACTION_METHOD};
use tracing::warn;

/// Plain-text passthrough. Valid UTF-8 comes back byte-for-byte at full
/// confidence; anything else is decoded lossily and flagged.
pub fn extract(bytes: &[u8]) -> DocumentExtractionResult {
    match std::str::from_utf8(bytes) {
        Ok(text) => DocumentExtractionResult::new(text, DocumentFormat::Text, 1.0)
            .with_meta(META_EXTRACTION_METHOD, "passthrough"),
        Err(e) => {
            warn!(error = %e, "text upload is not valid UTF-8");
            DocumentExtractionResult::new(
                String::from_utf8_lossy(bytes).into_owned(),
                DocumentFormat::Text,
                1.0,
            )
            .with_meta(META_EXTRACTION_METHOD, "passthrough")
            .with_warnings(vec![format!(
                "input is not valid UTF-8 ({e}); invalid bytes were replaced"
            )])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_round_trip_is_exact() {
        let input = "Nettoomsättning\t2023\r\n  10 000 000  \n\u{00A0}kr\n";
        let r = extract(input.as_bytes());
        assert_eq!(r.text, input);
        assert_eq!(r.confidence, 1.0);
        assert_eq!(r.format, DocumentFormat::Text);
        assert!(r.warnings().is_empty());
    }

    #[test]
    fn test_empty_input() {
        let r = extract(b"");
        assert_eq!(r.text, "");
        assert_eq!(r.confidence, 1.0);
    }

    #[test]
    fn test_invalid_utf8_is_flagged() {
        let r = extract(b"Oms\xe4ttning");
        assert_eq!(r.text, "Oms\u{FFFD}ttning");
        assert_eq!(r.warnings().len(), 1);
    }
}
