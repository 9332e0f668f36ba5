use std::collections::BTreeSet;

use crate::extraction::spreadsheet::SheetGrid;
use crate::financial::columns::{detect_year_columns, has_four_digit_year};
use crate::model::{CellValue, StatementRow, StatementTable};

/// How far down a sheet to look for the header row.
const HEADER_SCAN_ROWS: usize = 30;

/// Build a statement table from a worksheet grid.
pub fn from_grid(grid: &SheetGrid) -> StatementTable {
    from_rows(Some(grid.name.clone()), &grid.rows)
}

/// Build a statement table from layout text (pdftotext `-layout` output,
/// OCR lines, docx tables). Cells are split on tabs, or on runs of two or
/// more spaces when a line has no tabs.
pub fn from_text(text: &str) -> StatementTable {
    let rows: Vec<Vec<CellValue>> = text.lines().map(split_layout_line).collect();
    from_rows(None, &rows)
}

/// Pick the header row and key every following row by it.
///
/// The header row is the row within the first 30 with the most resolvable
/// year columns after its first column, four-digit years counting before
/// `år`/two-digit forms and the earliest row winning a tie; failing that,
/// the first non-empty row.
/// Empty headers become `col<N>` and repeated ones get a ` (2)`, ` (3)`
/// suffix, so headers are unique.
pub fn from_rows(name: Option<String>, rows: &[Vec<CellValue>]) -> StatementTable {
    let Some(header_idx) = find_header_row(rows) else {
        return StatementTable {
            name,
            headers: Vec::new(),
            rows: Vec::new(),
        };
    };

    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    let headers = unique_headers(&rows[header_idx], width);

    let body = rows[header_idx + 1..]
        .iter()
        .filter(|row| row.iter().any(|c| !c.is_empty()))
        .map(|row| {
            headers
                .iter()
                .zip(row.iter().chain(std::iter::repeat(&CellValue::Empty)))
                .map(|(h, c)| (h.clone(), c.clone()))
                .collect::<StatementRow>()
        })
        .collect();

    StatementTable {
        name,
        headers,
        rows: body,
    }
}

fn find_header_row(rows: &[Vec<CellValue>]) -> Option<usize> {
    let mut best: Option<(usize, (usize, usize))> = None;
    for (idx, row) in rows.iter().enumerate().take(HEADER_SCAN_ROWS) {
        let score = year_header_score(row);
        if score.1 > 0 && best.map_or(true, |(_, b)| score > b) {
            best = Some((idx, score));
        }
    }
    best.map(|(idx, _)| idx)
        .or_else(|| rows.iter().position(|row| row.iter().any(|c| !c.is_empty())))
}

/// (four-digit year columns, all resolved year columns) of a candidate
/// header row.
fn year_header_score(row: &[CellValue]) -> (usize, usize) {
    let headers: Vec<String> = row.iter().map(CellValue::as_text).collect();
    let (columns, _) = detect_year_columns(&headers);
    let four_digit = columns
        .iter()
        .filter(|c| has_four_digit_year(&c.header))
        .count();
    (four_digit, columns.len())
}

fn unique_headers(row: &[CellValue], width: usize) -> Vec<String> {
    let mut seen = BTreeSet::new();
    (0..width.max(row.len()))
        .map(|i| {
            let raw = row.get(i).map(CellValue::as_text).unwrap_or_default();
            let base = if raw.is_empty() {
                format!("col{}", i + 1)
            } else {
                raw
            };
            let mut header = base.clone();
            let mut n = 2;
            while !seen.insert(header.clone()) {
                header = format!("{base} ({n})");
                n += 1;
            }
            header
        })
        .collect()
}

/// Split a layout line into cells. A line indented by two or more spaces
/// (a right-aligned header over the label column) gets an empty first cell.
fn split_layout_line(line: &str) -> Vec<CellValue> {
    let line = line.trim_end();
    if line.trim().is_empty() {
        return Vec::new();
    }
    let mut cells: Vec<CellValue> = Vec::new();
    let segments: Vec<&str> = if line.contains('\t') {
        line.split('\t').collect()
    } else {
        if line.starts_with("  ") {
            cells.push(CellValue::Empty);
        }
        split_by_whitespace_gaps(line)
    };
    cells.extend(segments.into_iter().map(|s| {
        let s = s.trim();
        if s.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(s.to_string())
        }
    }));
    cells
}

/// Split a line by gaps of 2+ whitespace characters. Single spaces, as in
/// "10 000 000", stay inside a segment.
fn split_by_whitespace_gaps(line: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut start = None;
    let mut gap_start = 0;
    let mut space_count = 0;

    for (i, c) in line.char_indices() {
        if c.is_whitespace() {
            if space_count == 0 {
                gap_start = i;
            }
            space_count += 1;
            if space_count == 2 {
                if let Some(s) = start {
                    segments.push(&line[s..gap_start]);
                    start = None;
                }
            }
        } else {
            if start.is_none() {
                start = Some(i);
            }
            space_count = 0;
        }
    }

    if let Some(s) = start {
        segments.push(line[s..].trim_end());
    }

    segments
}
