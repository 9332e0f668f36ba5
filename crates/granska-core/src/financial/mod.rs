pub mod addbacks;
pub mod columns;
pub mod normalize;
pub mod quality;
pub mod table;
pub mod values;

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::keywords::schema::{FieldKind, KeywordTable};
use crate::model::{CellValue, FinancialYear, ParsedFinancialData, StatementRow, StatementTable};
use addbacks::{suggest_add_backs, FlaggedItem};
use columns::{detect_year_columns, YearColumn};
use normalize::normalize_label;
use values::{cell_amount, Amount};

pub const NO_YEAR_COLUMNS: &str = "could not detect year columns";
pub const NO_YEARS_EXTRACTED: &str = "no financial years could be extracted";

/// Year series and diagnostics read from one statement table, before
/// add-backs and scoring.
#[derive(Debug, Clone, Default)]
pub struct StatementParse {
    pub years: Vec<FinancialYear>,
    pub detected_columns: Vec<String>,
    pub flagged: Vec<FlaggedItem>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Run the full financial pipeline on one table: parse, suggest add-backs,
/// score.
pub fn parse_statement(table: &StatementTable, keywords: &KeywordTable) -> ParsedFinancialData {
    let parse = parse_years(table, keywords);
    let add_backs_suggestions = suggest_add_backs(&parse.years, &parse.flagged);
    let (quality_score, data_quality) = quality::rate(&parse.years, parse.errors.len());
    info!(
        years = parse.years.len(),
        suggestions = add_backs_suggestions.len(),
        quality_score,
        %data_quality,
        "financial statement parsed"
    );

    ParsedFinancialData {
        years: parse.years,
        add_backs_suggestions,
        data_quality,
        quality_score,
        detected_columns: parse.detected_columns,
        errors: parse.errors,
        warnings: parse.warnings,
        source_sheet: table.name.clone(),
    }
}

/// Read yearly line items from a statement table.
///
/// The first row matching a field wins. Years whose revenue is not positive are
/// dropped; the rest are returned in ascending order.
pub fn parse_years(table: &StatementTable, keywords: &KeywordTable) -> StatementParse {
    let mut out = StatementParse::default();

    let (year_columns, column_warnings) = detect_year_columns(&table.headers);
    out.warnings.extend(column_warnings);
    out.detected_columns = year_columns.iter().map(|c| c.header.clone()).collect();

    if year_columns.is_empty() {
        out.warnings.push(NO_YEAR_COLUMNS.to_string());
        out.errors.push(NO_YEARS_EXTRACTED.to_string());
        return out;
    }
    debug!(columns = ?out.detected_columns, "year columns detected");

    let labelled: Vec<(String, &StatementRow)> = table
        .rows
        .iter()
        .map(|row| (normalize_label(&table.label(row)), row))
        .filter(|(label, _)| !label.is_empty())
        .collect();

    // Flagged rows are adjustment detail, never a headline field.
    let mut fields: BTreeMap<FieldKind, &StatementRow> = BTreeMap::new();
    for (label, row) in &labelled {
        if let Some(category) = keywords.add_back_category(label) {
            let amounts = year_columns
                .iter()
                .filter_map(|c| cell_amount(cell(row, c)).value().map(|v| (c.year, v)))
                .collect();
            out.flagged.push(FlaggedItem {
                category,
                label: table.label(row),
                amounts,
            });
            continue;
        }
        for kind in FieldKind::ALL {
            if !fields.contains_key(&kind) && keywords.matches(kind, label) {
                fields.insert(kind, *row);
            }
        }
    }
    debug!(fields = ?fields.keys().collect::<Vec<_>>(), "line items matched");

    let has_costs_row = fields.contains_key(&FieldKind::Costs);
    let has_ebitda_row = fields.contains_key(&FieldKind::Ebitda);
    if !has_costs_row {
        out.warnings
            .push("no costs row found; costs are reported as 0".to_string());
    }

    let mut reader = CellReader {
        table,
        warnings: &mut out.warnings,
    };
    let mut years = Vec::new();
    for column in &year_columns {
        let revenue = reader.field(&fields, FieldKind::Revenue, column);
        let costs = reader.field(&fields, FieldKind::Costs, column);
        let ebitda = reader.field(&fields, FieldKind::Ebitda, column);

        let mut year = FinancialYear::empty(column.year);
        year.revenue = revenue.unwrap_or_default();
        year.costs = costs.unwrap_or_default();
        year.ebit = reader.field(&fields, FieldKind::Ebit, column).unwrap_or_default();
        year.net_income = reader.field(&fields, FieldKind::NetIncome, column).unwrap_or_default();
        year.assets = reader.field(&fields, FieldKind::Assets, column);
        year.liabilities = reader.field(&fields, FieldKind::Liabilities, column);
        year.equity = reader.field(&fields, FieldKind::Equity, column);
        year.cash = reader.field(&fields, FieldKind::Cash, column);
        year.ebitda = match (ebitda, revenue, costs) {
            (Some(e), _, _) => e,
            (None, Some(r), Some(c)) if !has_ebitda_row => r - c.abs(),
            _ => Decimal::ZERO,
        };

        if year.revenue < Decimal::ZERO {
            out.errors.push(format!(
                "{}: revenue is negative ({}); year dropped",
                column.year, year.revenue
            ));
            continue;
        }
        if year.revenue.is_zero() {
            reader.warnings.push(format!(
                "{}: no revenue found; year dropped",
                column.year
            ));
            continue;
        }
        if year.ebitda > year.revenue {
            reader.warnings.push(format!(
                "{}: EBITDA ({}) exceeds revenue ({})",
                column.year, year.ebitda, year.revenue
            ));
        }
        years.push(year);
    }

    years.sort_by_key(|y| y.year);
    if years.is_empty() {
        out.errors.push(NO_YEARS_EXTRACTED.to_string());
    }
    out.years = years;
    out
}

fn cell<'a>(row: &'a StatementRow, column: &YearColumn) -> &'a CellValue {
    static EMPTY: CellValue = CellValue::Empty;
    row.get(&column.header).unwrap_or(&EMPTY)
}

/// Reads amounts from rows, warning once per unparseable cell.
struct CellReader<'t, 'w> {
    table: &'t StatementTable,
    warnings: &'w mut Vec<String>,
}

impl CellReader<'_, '_> {
    fn field(
        &mut self,
        fields: &BTreeMap<FieldKind, &StatementRow>,
        kind: FieldKind,
        column: &YearColumn,
    ) -> Option<Decimal> {
        fields.get(&kind).and_then(|row| self.amount(row, column))
    }

    fn amount(&mut self, row: &StatementRow, column: &YearColumn) -> Option<Decimal> {
        let amount = cell_amount(cell(row, column));
        if let Amount::Unparseable(raw) = &amount {
            self.warnings.push(format!(
                "{}: could not parse '{}' in row '{}'; using 0",
                column.year,
                raw,
                self.table.label(row)
            ));
        }
        amount.value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keywords::builtin::default_table;
    use crate::model::DataQuality;
    use rust_decimal_macros::dec;

    fn table(headers: &[&str], rows: &[&[&str]]) -> StatementTable {
        let headers: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
        let rows = rows
            .iter()
            .map(|cells| {
                headers
                    .iter()
                    .zip(cells.iter())
                    .map(|(h, c)| {
                        let v = if c.is_empty() {
                            CellValue::Empty
                        } else {
                            CellValue::Text(c.to_string())
                        };
                        (h.clone(), v)
                    })
                    .collect()
            })
            .collect();
        StatementTable {
            name: None,
            headers,
            rows,
        }
    }

    #[test]
    fn test_clean_three_year_statement() {
        let t = table(
            &["Item", "2022", "2023", "2024"],
            &[
                &["Omsättning", "10 000 000", "11 000 000", "12 000 000"],
                &["Kostnader", "8 000 000", "8 500 000", "9 000 000"],
            ],
        );
        let r = parse_statement(&t, &default_table().unwrap());
        assert_eq!(r.years.len(), 3);
        assert_eq!(
            r.years.iter().map(|y| y.ebitda).collect::<Vec<_>>(),
            vec![dec!(2000000), dec!(2500000), dec!(3000000)]
        );
        assert_eq!(r.detected_columns, vec!["2022", "2023", "2024"]);
        assert!(r.errors.is_empty());
        assert_eq!(r.quality_score, 75.0);
        assert_eq!(r.data_quality, DataQuality::Good);
        let owner = &r.add_backs_suggestions[0];
        assert_eq!(owner.category, crate::model::AddBackCategory::OwnerSalary);
        assert_eq!(owner.estimated_amount, dec!(550000));
    }

    #[test]
    fn test_no_year_columns() {
        let t = table(&["Item", "Amount"], &[&["Omsättning", "10 000 000"]]);
        let r = parse_statement(&t, &default_table().unwrap());
        assert!(r.years.is_empty());
        assert!(r.warnings.iter().any(|w| w == NO_YEAR_COLUMNS));
        assert!(r.detected_columns.is_empty());
        assert_eq!(r.quality_score, 0.0);
        assert_eq!(r.data_quality, DataQuality::Poor);
        assert!(r.add_backs_suggestions.is_empty());
    }

    #[test]
    fn test_unparseable_cell_reads_as_zero_with_warning() {
        let t = table(
            &["Post", "2022", "2023"],
            &[
                &["Nettoomsättning", "9 500 000", "10 000 000"],
                &["Rörelsens kostnader", "N/A", "-8 000 000"],
            ],
        );
        let p = parse_years(&t, &default_table().unwrap());
        assert_eq!(p.years.len(), 2);
        assert_eq!(p.years[0].costs, dec!(0));
        assert_eq!(p.years[1].costs, dec!(-8000000));
        assert_eq!(p.years[1].ebitda, dec!(2000000));
        assert!(p.warnings.iter().any(|w| w.contains("'N/A'")));
    }

    #[test]
    fn test_first_match_wins_and_ebit_excludes_ebitda() {
        let t = table(
            &["Post", "2023"],
            &[
                &["Nettoomsättning", "12 000 000"],
                &["Övriga rörelseintäkter", "400 000"],
                &["Summa rörelsens kostnader", "-9 000 000"],
                &["Rörelseresultat före avskrivningar", "3 400 000"],
                &["Avskrivningar", "-600 000"],
                &["Rörelseresultat", "2 800 000"],
                &["Årets resultat", "2 100 000"],
                &["Omsättning per anställd", "1 000 000"],
            ],
        );
        let p = parse_years(&t, &default_table().unwrap());
        let y = &p.years[0];
        assert_eq!(y.revenue, dec!(12000000));
        assert_eq!(y.costs, dec!(-9000000));
        assert_eq!(y.ebitda, dec!(3400000));
        assert_eq!(y.ebit, dec!(2800000));
        assert_eq!(y.net_income, dec!(2100000));
    }

    #[test]
    fn test_revenue_gate() {
        let t = table(
            &["Post", "2021", "2022", "2023"],
            &[
                &["Nettoomsättning", "-100", "", "5 000 000"],
                &["Kostnader", "50", "50", "4 000 000"],
            ],
        );
        let p = parse_years(&t, &default_table().unwrap());
        assert_eq!(p.years.iter().map(|y| y.year).collect::<Vec<_>>(), vec![2023]);
        assert_eq!(p.errors.len(), 1);
        assert!(p.errors[0].contains("negative"));
        assert!(p.warnings.iter().any(|w| w.starts_with("2022: no revenue")));
    }

    #[test]
    fn test_years_sorted_ascending() {
        let t = table(
            &["Post", "2024", "2023", "2022"],
            &[&["Intäkter", "3", "2", "1"]],
        );
        let p = parse_years(&t, &default_table().unwrap());
        assert_eq!(
            p.years.iter().map(|y| y.year).collect::<Vec<_>>(),
            vec![2022, 2023, 2024]
        );
        assert!(p.warnings.iter().any(|w| w.contains("no costs row")));
    }

    #[test]
    fn test_ebitda_over_revenue_warns() {
        let t = table(
            &["Post", "2023"],
            &[&["Omsättning", "1 000"], &["EBITDA", "5 000"]],
        );
        let p = parse_years(&t, &default_table().unwrap());
        assert!(p.warnings.iter().any(|w| w.contains("exceeds revenue")));
    }

    #[test]
    fn test_balance_sheet_fields() {
        let t = table(
            &["Post", "2023"],
            &[
                &["Nettoomsättning", "5 000 000"],
                &["Summa anläggningstillgångar", "1 000 000"],
                &["Kassa och bank", "750 000"],
                &["Summa tillgångar", "3 000 000"],
                &["Summa eget kapital", "1 200 000"],
                &["Summa skulder", "1 800 000"],
                &["Summa eget kapital och skulder", "3 000 000"],
            ],
        );
        let y = &parse_years(&t, &default_table().unwrap()).years[0];
        assert_eq!(y.assets, Some(dec!(3000000)));
        assert_eq!(y.cash, Some(dec!(750000)));
        assert_eq!(y.equity, Some(dec!(1200000)));
        assert_eq!(y.liabilities, Some(dec!(1800000)));
    }

    #[test]
    fn test_flagged_rows_become_suggestions() {
        let t = table(
            &["Post", "2022", "2023"],
            &[
                &["Nettoomsättning", "10 000 000", "11 000 000"],
                &["Kostnader", "-8 000 000", "-8 500 000"],
                &["Hyra till närstående bolag", "-300 000", "-300 000"],
            ],
        );
        let r = parse_statement(&t, &default_table().unwrap());
        let related = r
            .add_backs_suggestions
            .iter()
            .find(|s| s.source_label.is_some())
            .unwrap();
        assert_eq!(related.category, crate::model::AddBackCategory::RelatedParty);
        assert_eq!(related.estimated_amount, dec!(300000));
        assert_eq!(r.years[0].costs, dec!(-8000000));
    }
}
