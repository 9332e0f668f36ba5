use crate::error::GranskaError;
use crate::extraction::{PdfText, PdfTextExtractor};
use lopdf::{Dictionary, Document, Object};
use tracing::debug;

/// Pure-Rust PDF text backend built on lopdf. Used when poppler is not installed.
pub struct NativePdfExtractor;

impl NativePdfExtractor {
    pub fn new() -> Self {
        NativePdfExtractor
    }
}

impl Default for NativePdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfTextExtractor for NativePdfExtractor {
    fn extract_text(&self, pdf_bytes: &[u8]) -> Result<PdfText, GranskaError> {
        let doc = load(pdf_bytes)?;
        let info = info_from_document(&doc);

        let mut page_texts = Vec::with_capacity(info.page_count);
        for page_number in doc.get_pages().keys() {
            match doc.extract_text(&[*page_number]) {
                Ok(t) => page_texts.push(t),
                Err(e) => {
                    // Unreadable text on one page leaves it empty; OCR may still recover it.
                    debug!(page_number, error = %e, "lopdf could not extract page text");
                    page_texts.push(String::new());
                }
            }
        }

        Ok(PdfText {
            text: page_texts.join("\n"),
            page_count: info.page_count,
            producer: info.producer,
            creation_date: info.creation_date,
        })
    }

    fn backend_name(&self) -> &str {
        "lopdf"
    }
}

/// Document-level facts from the PDF trailer and page tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PdfInfo {
    pub page_count: usize,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
}

/// Read page count, producer and creation date without extracting text.
pub fn read_info(pdf_bytes: &[u8]) -> Result<PdfInfo, GranskaError> {
    let doc = load(pdf_bytes)?;
    Ok(info_from_document(&doc))
}

fn load(pdf_bytes: &[u8]) -> Result<Document, GranskaError> {
    Document::load_mem(pdf_bytes).map_err(|e| GranskaError::Pdf(e.to_string()))
}

fn info_from_document(doc: &Document) -> PdfInfo {
    let dict = info_dictionary(doc);
    PdfInfo {
        page_count: doc.get_pages().len(),
        producer: dict.and_then(|d| string_entry(d, b"Producer")),
        creation_date: dict
            .and_then(|d| string_entry(d, b"CreationDate"))
            .map(|raw| normalize_pdf_date(&raw)),
    }
}

fn info_dictionary(doc: &Document) -> Option<&Dictionary> {
    match doc.trailer.get(b"Info").ok()? {
        Object::Reference(id) => doc.get_object(*id).ok()?.as_dict().ok(),
        Object::Dictionary(d) => Some(d),
        _ => None,
    }
}

fn string_entry(dict: &Dictionary, key: &[u8]) -> Option<String> {
    match dict.get(key).ok()? {
        Object::String(bytes, _) => {
            let s = decode_pdf_string(bytes);
            let s = s.trim();
            if s.is_empty() {
                None
            } else {
                Some(s.to_string())
            }
        }
        Object::Name(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
        _ => None,
    }
}

/// Decode a PDF text string: UTF-16BE with BOM, UTF-8 with BOM, otherwise
/// byte-per-char (PDFDocEncoding agrees with Latin-1 for printable text).
fn decode_pdf_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8_lossy(rest).into_owned();
    }
    bytes.iter().map(|&b| b as char).collect()
}

/// Turn `D:YYYYMMDDHHmmSS...` into `YYYY-MM-DDTHH:mm:SS`. Dates that do not
/// follow the pattern are returned unchanged.
fn normalize_pdf_date(raw: &str) -> String {
    let s = raw.strip_prefix("D:").unwrap_or(raw);
    let digits: String = s.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.len() < 8 {
        return raw.to_string();
    }
    let part = |from: usize, to: usize, default: &'static str| -> String {
        digits.get(from..to).map(str::to_string).unwrap_or_else(|| default.to_string())
    };
    format!(
        "{}-{}-{}T{}:{}:{}",
        part(0, 4, "0000"),
        part(4, 6, "01"),
        part(6, 8, "01"),
        part(8, 10, "00"),
        part(10, 12, "00"),
        part(12, 14, "00")
    )
}
