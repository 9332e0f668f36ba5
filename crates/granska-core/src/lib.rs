pub mod config;
pub mod detect;
pub mod error;
pub mod extraction;
pub mod financial;
pub mod keywords;
pub mod model;

use detect::detect_format;
use error::GranskaError;
use extraction::spreadsheet::read_workbook;
use extraction::DocumentReader;
use financial::columns::detect_year_columns;
use financial::table;
use keywords::schema::KeywordTable;
use model::{DocumentFormat, ParsedFinancialData, StatementTable};
use tracing::info;

/// Run the financial pipeline on a table already in memory.
pub fn analyze_table(table: &StatementTable, keywords: &KeywordTable) -> ParsedFinancialData {
    financial::parse_statement(table, keywords)
}

/// Main API entry point: read an upload and extract its financial statement.
///
/// Spreadsheets are parsed sheet by sheet and the sheet with the most year
/// columns is used. Other formats go through the document reader and their
/// text is read as a layout table. Extraction warnings are carried into the
/// result.
pub fn analyze_document(
    bytes: &[u8],
    filename: &str,
    mime: &str,
    reader: &DocumentReader,
    keywords: &KeywordTable,
) -> Result<ParsedFinancialData, GranskaError> {
    let format = detect_format(mime, filename);

    if format == DocumentFormat::Excel {
        let tables: Vec<StatementTable> = read_workbook(bytes, filename)?
            .iter()
            .map(table::from_grid)
            .collect();
        let best = select_table(&tables).cloned().unwrap_or_default();
        info!(sheet = best.name.as_deref().unwrap_or(""), "parsing worksheet");
        return Ok(analyze_table(&best, keywords));
    }

    let extracted = reader.read_as(format, bytes, filename, mime)?;
    let statement = table::from_text(&extracted.text);
    let mut result = analyze_table(&statement, keywords);
    let mut warnings: Vec<String> = extracted
        .warnings()
        .into_iter()
        .map(|w| format!("extraction: {w}"))
        .collect();
    warnings.append(&mut result.warnings);
    result.warnings = warnings;
    Ok(result)
}

/// The table with the most resolved year columns; the earliest on a tie.
pub fn select_table(tables: &[StatementTable]) -> Option<&StatementTable> {
    let mut best: Option<(&StatementTable, usize)> = None;
    for t in tables {
        let n = detect_year_columns(&t.headers).0.len();
        if best.map_or(true, |(_, m)| n > m) {
            best = Some((t, n));
        }
    }
    best.map(|(t, _)| t)
}
