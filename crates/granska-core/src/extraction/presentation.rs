use crate::error::GranskaError;
use crate::extraction::ooxml::{self, MAX_XML_ENTRY_BYTES};
use crate::model::{DocumentExtractionResult, DocumentFormat, META_EXTRACTION_METHOD};
use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::{Map, Value};
use tracing::debug;

pub const PRESENTATION_CONFIDENCE: f64 = 0.85;

const SLIDE_PREFIX: &str = "ppt/slides/slide";

/// Extract slide text from a .pptx package, one `SLIDE: <file>` block per slide.
pub fn extract(bytes: &[u8]) -> Result<DocumentExtractionResult, GranskaError> {
    let mut archive = ooxml::open(bytes)?;
    let names = ooxml::numbered_entries(&archive, SLIDE_PREFIX, ".xml");

    let mut blocks = Vec::with_capacity(names.len());
    let mut slides = Map::new();
    let mut warnings = Vec::new();
    for name in &names {
        let xml = ooxml::read_entry_bounded(&mut archive, name, MAX_XML_ENTRY_BYTES)?;
        let file = name.rsplit('/').next().unwrap_or(name);
        let text = match slide_text(&xml) {
            Ok(text) => text,
            Err(e) => {
                warnings.push(format!("{file}: {e}"));
                String::new()
            }
        };
        debug!(slide = file, chars = text.len(), "read slide");
        blocks.push(format!("SLIDE: {file}\n{text}"));
        slides.insert(file.to_string(), Value::String(text));
    }

    if names.is_empty() {
        warnings.push("presentation contains no slides".to_string());
    }

    Ok(DocumentExtractionResult::new(
        blocks.join("\n\n"),
        DocumentFormat::Powerpoint,
        PRESENTATION_CONFIDENCE,
    )
    .with_pages(names.len())
    .with_meta(META_EXTRACTION_METHOD, "pptx")
    .with_meta("slideCount", names.len())
    .with_meta("slides", Value::Object(slides))
    .with_warnings(warnings))
}

/// All character data of a slide with tags stripped. Each DrawingML
/// paragraph (`a:p`) becomes one line.
fn slide_text(xml: &[u8]) -> Result<String, quick_xml::Error> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut out = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"t" => in_text = true,
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => {
                    if !out.is_empty() && !out.ends_with('\n') {
                        out.push('\n');
                    }
                }
                _ => {}
            },
            Event::Text(t) if in_text => {
                let s = t.unescape()?;
                out.push_str(&s);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(out.trim_end().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::ooxml::fixtures::zip_of;

    fn slide(paragraphs: &[&str]) -> String {
        let ps: String = paragraphs
            .iter()
            .map(|p| format!("<a:p><a:r><a:t>{p}</a:t></a:r></a:p>"))
            .collect();
        format!(
            r#"<p:sld xmlns:p="urn:p" xmlns:a="urn:a"><p:cSld><p:spTree><p:sp><p:txBody>{ps}</p:txBody></p:sp></p:spTree></p:cSld></p:sld>"#
        )
    }

    #[test]
    fn test_slides_in_numeric_order() {
        let s1 = slide(&["Investeringsmemorandum", "Konfidentiellt"]);
        let s2 = slide(&["Omsättning 2023: 12 MSEK"]);
        let s10 = slide(&["Kontakt"]);
        let bytes = zip_of(&[
            ("ppt/slides/slide10.xml", &s10),
            ("ppt/slides/slide2.xml", &s2),
            ("ppt/slides/slide1.xml", &s1),
            ("ppt/presentation.xml", "<p:presentation/>"),
        ]);
        let r = extract(&bytes).unwrap();
        assert_eq!(
            r.text,
            "SLIDE: slide1.xml\nInvesteringsmemorandum\nKonfidentiellt\n\n\
             SLIDE: slide2.xml\nOmsättning 2023: 12 MSEK\n\n\
             SLIDE: slide10.xml\nKontakt"
        );
        assert_eq!(r.pages, Some(3));
        assert_eq!(r.metadata["slideCount"], 3);
        assert_eq!(r.metadata["slides"]["slide2.xml"], "Omsättning 2023: 12 MSEK");
        assert_eq!(r.confidence, PRESENTATION_CONFIDENCE);
        assert_eq!(r.extraction_method(), Some("pptx"));
    }

    #[test]
    fn test_entities_decoded() {
        let bytes = zip_of(&[("ppt/slides/slide1.xml", &slide(&["M&amp;A &lt;2024&gt;"]))]);
        let r = extract(&bytes).unwrap();
        assert!(r.text.ends_with("M&A <2024>"));
    }

    #[test]
    fn test_no_slides_warns() {
        let bytes = zip_of(&[("ppt/presentation.xml", "<p:presentation/>")]);
        let r = extract(&bytes).unwrap();
        assert_eq!(r.pages, Some(0));
        assert_eq!(r.text, "");
        assert_eq!(r.warnings().len(), 1);
    }

    #[test]
    fn test_not_a_zip_is_an_error() {
        assert!(matches!(extract(b"PK?").unwrap_err(), GranskaError::Ooxml(_)));
    }
}
