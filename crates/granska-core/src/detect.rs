use crate::model::DocumentFormat;
use std::path::Path;

const PDF_EXTENSIONS: &[&str] = &["pdf"];
const EXCEL_EXTENSIONS: &[&str] = &["xlsx", "xls", "xlsm", "xlsb", "ods", "csv"];
const WORD_EXTENSIONS: &[&str] = &["docx", "doc"];
const POWERPOINT_EXTENSIONS: &[&str] = &["pptx", "ppt"];
const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "json", "xml", "tsv", "log"];
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tif", "tiff", "bmp", "gif", "webp"];

/// Classify an upload by MIME type, falling back to the filename extension.
///
/// Client MIME types are often generic (`application/octet-stream`), so a
/// MIME type that matches nothing defers to the extension. Never fails.
pub fn detect_format(mime: &str, filename: &str) -> DocumentFormat {
    detect_from_mime(mime).unwrap_or_else(|| detect_from_extension(filename))
}

fn detect_from_mime(mime: &str) -> Option<DocumentFormat> {
    let m = mime.trim().to_ascii_lowercase();
    if m.is_empty() {
        return None;
    }

    if m.contains("pdf") {
        Some(DocumentFormat::Pdf)
    } else if m.contains("spreadsheet") || m.contains("excel") || m == "text/csv" {
        Some(DocumentFormat::Excel)
    } else if m.contains("wordprocessingml") || m.contains("word") {
        Some(DocumentFormat::Word)
    } else if m.contains("presentationml")
        || m.contains("presentation")
        || m.contains("powerpoint")
    {
        Some(DocumentFormat::Powerpoint)
    } else if m.contains("text") || m.contains("plain") {
        Some(DocumentFormat::Text)
    } else if m.starts_with("image/") {
        Some(DocumentFormat::Image)
    } else {
        None
    }
}

fn detect_from_extension(filename: &str) -> DocumentFormat {
    let ext = match Path::new(filename.trim())
        .extension()
        .and_then(|e| e.to_str())
    {
        Some(e) => e.to_ascii_lowercase(),
        None => return DocumentFormat::Unknown,
    };

    let table: [(&[&str], DocumentFormat); 6] = [
        (PDF_EXTENSIONS, DocumentFormat::Pdf),
        (EXCEL_EXTENSIONS, DocumentFormat::Excel),
        (WORD_EXTENSIONS, DocumentFormat::Word),
        (POWERPOINT_EXTENSIONS, DocumentFormat::Powerpoint),
        (TEXT_EXTENSIONS, DocumentFormat::Text),
        (IMAGE_EXTENSIONS, DocumentFormat::Image),
    ];

    table
        .iter()
        .find(|(exts, _)| exts.contains(&ext.as_str()))
        .map(|(_, format)| *format)
        .unwrap_or(DocumentFormat::Unknown)
}
