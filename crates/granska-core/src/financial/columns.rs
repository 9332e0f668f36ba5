use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

static YEAR_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|[^\p{L}])(?:år|year|fy)(?:[^\p{L}]|$)").expect("valid regex")
});

static TWO_DIGIT_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^['’]?(\d{2})$").expect("valid regex"));

static DIGIT_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("valid regex"));

/// A header resolved to a fiscal year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearColumn {
    pub header: String,
    pub year: i32,
}

/// True if a header looks like it names a year column, whether or not a year
/// can be read from it.
pub fn is_year_like(header: &str) -> bool {
    let h = header.trim();
    last_four_digit_year(h).is_some() || YEAR_TOKEN.is_match(h) || TWO_DIGIT_YEAR.is_match(h)
}

/// True if the header carries a four-digit 19xx/20xx year.
pub fn has_four_digit_year(header: &str) -> bool {
    last_four_digit_year(header.trim()).is_some()
}

/// Last run of exactly four digits reading 19xx or 20xx.
fn last_four_digit_year(h: &str) -> Option<i32> {
    DIGIT_RUN
        .find_iter(h)
        .map(|m| m.as_str())
        .filter(|d| d.len() == 4 && (d.starts_with("19") || d.starts_with("20")))
        .last()
        .and_then(|d| d.parse().ok())
}

/// Resolve the year a header names.
///
/// A four-digit 19xx/20xx wins, and with several (`2022/2023`, a date range)
/// the last is taken since a fiscal year is named for the year it ends in. A
/// bare or apostrophe-prefixed two-digit year, or digits following `år`,
/// `year` or `fy`, resolve to 2000+n.
pub fn resolve_year(header: &str) -> Option<i32> {
    let h = header.trim();
    if let Some(y) = last_four_digit_year(h) {
        return Some(y);
    }
    if let Some(c) = TWO_DIGIT_YEAR.captures(h) {
        return c.get(1)?.as_str().parse::<i32>().ok().map(|n| 2000 + n);
    }
    if YEAR_TOKEN.is_match(h) {
        let digits = DIGIT_RUN.find_iter(h).last()?;
        if digits.as_str().len() == 2 {
            return digits.as_str().parse::<i32>().ok().map(|n| 2000 + n);
        }
    }
    None
}

/// Find the year columns among `headers`. The first header is the label
/// column and is never considered.
///
/// Returns the resolved columns in header order, and warnings for year-like
/// headers that could not be resolved or that repeat an earlier year.
pub fn detect_year_columns(headers: &[String]) -> (Vec<YearColumn>, Vec<String>) {
    let mut columns = Vec::new();
    let mut warnings = Vec::new();
    let mut seen = BTreeSet::new();

    for header in headers.iter().skip(1) {
        if !is_year_like(header) {
            continue;
        }
        let Some(year) = resolve_year(header) else {
            warnings.push(format!(
                "column '{header}' looks like a year column but names no year; skipped"
            ));
            continue;
        };
        if !seen.insert(year) {
            warnings.push(format!(
                "column '{header}' repeats year {year}; using the first column for that year"
            ));
            continue;
        }
        columns.push(YearColumn {
            header: header.clone(),
            year,
        });
    }

    (columns, warnings)
}
