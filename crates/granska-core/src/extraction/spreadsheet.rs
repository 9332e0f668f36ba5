use std::io::Cursor;
use std::path::Path;

use calamine::{Data, Reader};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::GranskaError;
use crate::model::{
    format_number, CellValue, DocumentExtractionResult, DocumentFormat, META_EXTRACTION_METHOD,
};

pub const SPREADSHEET_CONFIDENCE: f64 = 0.9;

/// One worksheet as a dense grid of cells, in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetGrid {
    pub name: String,
    pub rows: Vec<Vec<CellValue>>,
}

impl SheetGrid {
    /// Render as CSV (comma-delimited, RFC 4180 quoting). Trailing empty
    /// cells of each row are dropped.
    pub fn to_csv(&self) -> String {
        self.rows
            .iter()
            .map(|row| {
                let end = row
                    .iter()
                    .rposition(|c| !c.is_empty())
                    .map_or(0, |i| i + 1);
                row[..end]
                    .iter()
                    .map(csv_field)
                    .collect::<Vec<_>>()
                    .join(",")
            })
            .collect::<Vec<_>>()
            .join("\n")
            .trim_end_matches('\n')
            .to_string()
    }
}

/// Extract every sheet of a workbook (or a single CSV) as text.
pub fn extract(bytes: &[u8], filename: &str) -> Result<DocumentExtractionResult, GranskaError> {
    let sheets = read_workbook(bytes, filename)?;

    let mut names = Vec::with_capacity(sheets.len());
    let mut contents = Map::new();
    let mut blocks = Vec::with_capacity(sheets.len());
    for sheet in &sheets {
        let csv = sheet.to_csv();
        blocks.push(format!("=== Sheet: {} ===\n{csv}", sheet.name));
        contents.insert(sheet.name.clone(), Value::String(csv));
        names.push(sheet.name.clone());
    }

    Ok(DocumentExtractionResult::new(
        blocks.join("\n\n"),
        DocumentFormat::Excel,
        SPREADSHEET_CONFIDENCE,
    )
    .with_sheets(names)
    .with_meta(META_EXTRACTION_METHOD, "spreadsheet")
    .with_meta("sheetContents", Value::Object(contents)))
}

/// Read all sheets as grids. CSV files (by extension, or when the bytes are
/// not a workbook container and look like delimited text) become one sheet.
pub fn read_workbook(bytes: &[u8], filename: &str) -> Result<Vec<SheetGrid>, GranskaError> {
    if is_csv_name(filename) {
        return Ok(vec![read_csv(bytes, filename)?]);
    }

    let mut workbook = match calamine::open_workbook_auto_from_rs(Cursor::new(bytes)) {
        Ok(wb) => wb,
        Err(_) if !is_container(bytes) && std::str::from_utf8(bytes).is_ok() => {
            debug!("not a workbook container; reading as CSV");
            return Ok(vec![read_csv(bytes, filename)?]);
        }
        Err(e) => {
            return Err(GranskaError::Spreadsheet(format!(
                "failed to open workbook: {e}"
            )))
        }
    };

    let mut sheets = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| GranskaError::Spreadsheet(format!("sheet '{name}': {e}")))?;
        let rows: Vec<Vec<CellValue>> = range
            .rows()
            .map(|row| row.iter().map(cell_value).collect())
            .collect();
        debug!(sheet = %name, rows = rows.len(), "read worksheet");
        sheets.push(SheetGrid { name, rows });
    }
    Ok(sheets)
}

/// Zip (xlsx, ods) or OLE compound file (xls) magic.
fn is_container(bytes: &[u8]) -> bool {
    bytes.starts_with(b"PK\x03\x04") || bytes.starts_with(b"\xD0\xCF\x11\xE0")
}

fn is_csv_name(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
}

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::String(s) if s.trim().is_empty() => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.trim().to_string()),
        Data::Bool(b) => CellValue::Text(b.to_string()),
        Data::DateTime(dt) => CellValue::Text(dt.to_string()),
        _ => CellValue::Text(format!("{cell}")),
    }
}

fn csv_field(cell: &CellValue) -> String {
    let s = match cell {
        CellValue::Number(f) => format_number(*f),
        other => other.as_text(),
    };
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s
    }
}

fn read_csv(bytes: &[u8], filename: &str) -> Result<SheetGrid, GranskaError> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let first_line = bytes.split(|b| *b == b'\n').next().unwrap_or_default();
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(sniff_delimiter(&String::from_utf8_lossy(first_line)))
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut rows = Vec::new();
    for record in reader.byte_records() {
        let record =
            record.map_err(|e| GranskaError::Spreadsheet(format!("invalid CSV: {e}")))?;
        rows.push(
            record
                .iter()
                .map(|field| {
                    let f = String::from_utf8_lossy(field);
                    let f = f.trim();
                    if f.is_empty() {
                        CellValue::Empty
                    } else {
                        CellValue::Text(f.to_string())
                    }
                })
                .collect(),
        );
    }

    let name = Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("Sheet1")
        .to_string();
    debug!(sheet = %name, rows = rows.len(), "read CSV");
    Ok(SheetGrid { name, rows })
}

/// Pick the delimiter that occurs most often outside quotes on the header
/// line. Swedish exports use `;` because `,` is the decimal separator.
fn sniff_delimiter(first_line: &str) -> u8 {
    let mut counts = [(b';', 0usize), (b'\t', 0), (b',', 0)];
    let mut in_quotes = false;
    for c in first_line.bytes() {
        if c == b'"' {
            in_quotes = !in_quotes;
        } else if !in_quotes {
            if let Some(entry) = counts.iter_mut().find(|(d, _)| *d == c) {
                entry.1 += 1;
            }
        }
    }
    counts
        .iter()
        .filter(|(_, n)| *n > 0)
        .max_by_key(|(_, n)| *n)
        .map_or(b',', |(d, _)| *d)
}
