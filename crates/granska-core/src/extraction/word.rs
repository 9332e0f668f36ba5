use crate::error::GranskaError;
use crate::extraction::ooxml::{self, MAX_XML_ENTRY_BYTES};
use crate::model::{DocumentExtractionResult, DocumentFormat, META_EXTRACTION_METHOD};
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::{debug, warn};

pub const WORD_CONFIDENCE: f64 = 0.9;

const DOCUMENT_PART: &str = "word/document.xml";

/// Extract raw text from a .docx package.
///
/// Paragraphs end in newlines and table cells are tab-separated, so tables
/// survive as layout text for the financial parser. Conversion problems are
/// reported as warnings; only an unreadable container fails the call.
pub fn extract(bytes: &[u8]) -> Result<DocumentExtractionResult, GranskaError> {
    let mut archive = ooxml::open(bytes)?;
    let xml = ooxml::read_entry_bounded(&mut archive, DOCUMENT_PART, MAX_XML_ENTRY_BYTES)?;
    let body = document_text(&xml)?;

    let mut warnings = body.warnings;
    if body.text.trim().is_empty() {
        warnings.push("document body contains no text".to_string());
    }
    for w in &warnings {
        warn!(warning = %w, "docx conversion");
    }
    debug!(
        paragraphs = body.paragraphs,
        chars = body.text.len(),
        "docx extraction done"
    );

    Ok(
        DocumentExtractionResult::new(body.text, DocumentFormat::Word, WORD_CONFIDENCE)
            .with_meta(META_EXTRACTION_METHOD, "docx")
            .with_meta("paragraphCount", body.paragraphs)
            .with_warnings(warnings),
    )
}

struct DocumentBody {
    text: String,
    paragraphs: usize,
    warnings: Vec<String>,
}

/// Walk WordprocessingML, collecting `w:t` runs.
fn document_text(xml: &[u8]) -> Result<DocumentBody, GranskaError> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();

    let mut out = String::new();
    let mut paragraphs = 0usize;
    let mut warnings = Vec::new();
    let mut in_text = false;
    let mut cell_depth = 0usize;
    let mut skip_depth = 0usize;
    let mut skipped_objects = 0usize;
    let mut bad_entities = 0usize;

    loop {
        let event = match reader.read_event_into(&mut buf) {
            Ok(event) => event,
            Err(e) => {
                if out.trim().is_empty() {
                    return Err(GranskaError::Ooxml(format!("{DOCUMENT_PART}: {e}")));
                }
                warnings.push(format!(
                    "document XML is malformed at byte {}; text after that point was dropped",
                    reader.buffer_position()
                ));
                break;
            }
        };
        match event {
            Event::Start(e) => match e.local_name().as_ref() {
                b"drawing" | b"object" | b"pict" => {
                    if skip_depth == 0 {
                        skipped_objects += 1;
                    }
                    skip_depth += 1;
                }
                b"t" if skip_depth == 0 => in_text = true,
                b"tc" if skip_depth == 0 => cell_depth += 1,
                _ => {}
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"drawing" | b"object" | b"pict" => skip_depth = skip_depth.saturating_sub(1),
                _ if skip_depth > 0 => {}
                b"t" => in_text = false,
                b"p" => {
                    paragraphs += 1;
                    end_paragraph(&mut out, cell_depth > 0);
                }
                b"tc" => {
                    cell_depth = cell_depth.saturating_sub(1);
                    trim_end_spaces(&mut out);
                    out.push('\t');
                }
                b"tr" => {
                    if out.ends_with('\t') {
                        out.pop();
                    }
                    out.push('\n');
                }
                _ => {}
            },
            Event::Empty(e) if skip_depth == 0 => match e.local_name().as_ref() {
                b"tab" => out.push('\t'),
                b"br" | b"cr" => out.push('\n'),
                b"p" => {
                    paragraphs += 1;
                    end_paragraph(&mut out, cell_depth > 0);
                }
                _ => {}
            },
            Event::Text(t) if in_text && skip_depth == 0 => match t.unescape() {
                Ok(s) => out.push_str(&s),
                Err(_) => {
                    bad_entities += 1;
                    out.push_str(&String::from_utf8_lossy(&t));
                }
            },
            Event::CData(t) if in_text && skip_depth == 0 => {
                out.push_str(&String::from_utf8_lossy(&t));
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if skipped_objects > 0 {
        warnings.push(format!(
            "skipped {skipped_objects} embedded drawing(s) or object(s)"
        ));
    }
    if bad_entities > 0 {
        warnings.push(format!(
            "{bad_entities} text run(s) contained entities that could not be decoded"
        ));
    }

    let text = out
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim_matches('\n')
        .to_string();

    Ok(DocumentBody {
        text,
        paragraphs,
        warnings,
    })
}

/// Inside a table cell, paragraphs are joined with a space so the cell stays
/// on one line.
fn end_paragraph(out: &mut String, in_cell: bool) {
    if in_cell {
        if !out.is_empty() && !out.ends_with(['\t', '\n', ' ']) {
            out.push(' ');
        }
    } else {
        out.push('\n');
    }
}

fn trim_end_spaces(out: &mut String) {
    while out.ends_with(' ') {
        out.pop();
    }
}
