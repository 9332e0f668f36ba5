use crate::model::CellValue;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Outcome of reading one cell as an amount.
#[derive(Debug, Clone, PartialEq)]
pub enum Amount {
    /// The cell is empty or holds a nil marker such as `-`.
    Absent,
    Value(Decimal),
    /// The cell holds text that is not a number. Counts as 0.
    Unparseable(String),
}

impl Amount {
    /// The amount, with unparseable cells read as 0.
    pub fn value(&self) -> Option<Decimal> {
        match self {
            Amount::Absent => None,
            Amount::Value(d) => Some(*d),
            Amount::Unparseable(_) => Some(Decimal::ZERO),
        }
    }
}

/// Read a cell as an amount. Number cells pass through.
pub fn cell_amount(cell: &CellValue) -> Amount {
    match cell {
        CellValue::Empty => Amount::Absent,
        CellValue::Number(f) => f64_to_decimal(*f).map_or_else(
            || Amount::Unparseable(f.to_string()),
            Amount::Value,
        ),
        CellValue::Text(s) => {
            let t = s.trim();
            if t.is_empty() || is_nil_marker(t) {
                Amount::Absent
            } else {
                parse_amount(t).map_or_else(|| Amount::Unparseable(t.to_string()), Amount::Value)
            }
        }
    }
}

/// Parse a Swedish or English amount string.
///
/// Handles formats like:
/// - "10 000 000" -> 10000000 (space, NBSP or narrow NBSP thousands separator)
/// - "1 234,50" -> 1234.50 (decimal comma)
/// - "1,234.50" -> 1234.50 (comma thousands, dot decimal)
/// - "−500" or "-500" -> -500 (Unicode minus sign)
/// - "(500)" -> -500 (accounting negative)
/// - "500 kr", "500 SEK", "500 tkr" -> 500 (currency suffix ignored)
pub fn parse_amount(s: &str) -> Option<Decimal> {
    let mut t: String = s
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{202F}' && *c != '\u{2009}')
        .map(|c| match c {
            '\u{2212}' | '\u{2013}' => '-',
            c => c,
        })
        .collect();

    for suffix in ["sek", "tkr", "kr", ":-"] {
        let cut = t.len().saturating_sub(suffix.len());
        if t.get(cut..).is_some_and(|end| end.eq_ignore_ascii_case(suffix)) {
            t.truncate(cut);
        }
    }

    let mut negative = false;
    if let Some(inner) = t.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
        negative = true;
        t = inner.to_string();
    }
    if let Some(rest) = t.strip_prefix('-') {
        negative = !negative;
        t = rest.to_string();
    }

    if t.is_empty() || !t.chars().all(|c| c.is_ascii_digit() || c == ',' || c == '.') {
        return None;
    }

    let normalized = normalize_separators(&t)?;
    let d = Decimal::from_str(&normalized).ok()?;
    Some(if negative { -d } else { d })
}

/// Decide which of `,` and `.` is the decimal separator and drop the other.
fn normalize_separators(t: &str) -> Option<String> {
    let commas = t.matches(',').count();
    let dots = t.matches('.').count();
    match (commas, dots) {
        (0, 0) | (0, 1) => Some(t.to_string()),
        (1, 0) => Some(t.replace(',', ".")),
        // "1,234.50": comma groups, dot decimal
        (_, 1) if t.rfind('.') > t.rfind(',') => Some(t.replace(',', "")),
        // "1.234,50": dot groups, comma decimal
        (1, _) if t.rfind(',') > t.rfind('.') => Some(t.replace('.', "").replace(',', ".")),
        // "1.234.567" or "1,234,567": grouping only
        (0, _) => Some(t.replace('.', "")),
        (_, 0) => Some(t.replace(',', "")),
        _ => None,
    }
}

fn is_nil_marker(t: &str) -> bool {
    matches!(t, "-" | "–" | "—" | "−")
}

/// Convert f64 to Decimal via its shortest round-trip string, so 0.1 stays 0.1.
pub fn f64_to_decimal(f: f64) -> Option<Decimal> {
    if !f.is_finite() {
        return None;
    }
    let s = format!("{f}");
    s.parse::<Decimal>()
        .ok()
        .or_else(|| Decimal::try_from(f).ok())
}
