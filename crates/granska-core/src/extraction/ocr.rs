use crate::error::GranskaError;
use crate::extraction::{OcrEngine, OcrPage};
use std::io::Write;
use std::process::Command;

const HINT: &str = "Install tesseract with the 'swe' and 'eng' language packs: \
     brew install tesseract tesseract-lang (macOS) or apt install tesseract-ocr tesseract-ocr-swe (Linux)";

/// OCR engine driving the tesseract CLI in TSV mode, which yields per-word
/// confidences alongside the text.
pub struct TesseractOcr {
    binary: String,
    language: String,
}

impl TesseractOcr {
    pub fn new(binary: &str, language: &str) -> Self {
        TesseractOcr {
            binary: binary.to_string(),
            language: language.to_string(),
        }
    }
}

impl OcrEngine for TesseractOcr {
    fn recognize(&self, image: &[u8]) -> Result<OcrPage, GranskaError> {
        let mut tmpfile =
            tempfile::NamedTempFile::new().map_err(|e| GranskaError::Extraction(e.to_string()))?;
        tmpfile
            .write_all(image)
            .map_err(|e| GranskaError::Extraction(e.to_string()))?;

        let output = Command::new(&self.binary)
            .arg(tmpfile.path())
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .arg("tsv")
            .output()
            .map_err(|e| GranskaError::spawn("tesseract", HINT, e))?;

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(GranskaError::ToolFailed {
                tool: "tesseract",
                code,
                stderr,
            });
        }

        parse_tsv(&String::from_utf8_lossy(&output.stdout))
    }

    fn language(&self) -> String {
        self.language.clone()
    }

    fn backend_name(&self) -> &str {
        "tesseract"
    }
}

/// Rebuild text and mean word confidence from tesseract TSV output.
///
/// Words sharing (page, block, paragraph, line) form a line; a new block is
/// separated by a blank line. Confidence -1 marks non-word rows and is skipped.
pub fn parse_tsv(tsv: &str) -> Result<OcrPage, GranskaError> {
    let mut lines = tsv.lines();
    let header = lines
        .next()
        .ok_or_else(|| GranskaError::Ocr("empty tesseract output".into()))?;
    let columns: Vec<&str> = header.split('\t').collect();
    let col = |name: &str| columns.iter().position(|c| *c == name);
    let (Some(level), Some(conf), Some(text)) = (col("level"), col("conf"), col("text")) else {
        return Err(GranskaError::Ocr(format!(
            "unexpected tesseract TSV header: {header}"
        )));
    };
    let key_cols: Vec<usize> = ["page_num", "block_num", "par_num", "line_num"]
        .iter()
        .filter_map(|&n| col(n))
        .collect();
    let block_col = col("block_num");

    let mut out = String::new();
    let mut current_line: Option<Vec<String>> = None;
    let mut current_block: Option<String> = None;
    let mut conf_sum = 0.0;
    let mut conf_count = 0usize;

    for row in lines {
        let fields: Vec<&str> = row.split('\t').collect();
        if fields.get(level).copied() != Some("5") {
            continue;
        }
        let word = fields.get(text).copied().unwrap_or("").trim();
        if word.is_empty() {
            continue;
        }
        let word_conf = fields
            .get(conf)
            .and_then(|c| c.trim().parse::<f64>().ok())
            .unwrap_or(-1.0);
        if word_conf >= 0.0 {
            conf_sum += word_conf;
            conf_count += 1;
        }

        let key: Vec<String> = key_cols
            .iter()
            .map(|&i| fields.get(i).copied().unwrap_or("").to_string())
            .collect();
        let block = block_col.and_then(|i| fields.get(i)).map(|s| s.to_string());

        let same_line = current_line.as_ref().is_some_and(|k| *k == key);
        if !same_line {
            if current_line.is_some() {
                out.push('\n');
                if block != current_block {
                    out.push('\n');
                }
            }
            current_line = Some(key);
            current_block = block;
        } else {
            out.push(' ');
        }
        out.push_str(word);
    }

    let confidence = if conf_count == 0 {
        0.0
    } else {
        (conf_sum / conf_count as f64 / 100.0).clamp(0.0, 1.0)
    };

    Ok(OcrPage {
        text: out,
        confidence,
    })
}
