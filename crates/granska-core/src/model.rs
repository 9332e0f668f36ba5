use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Free-form, format-specific metadata attached to an extraction result.
pub type Metadata = BTreeMap<String, serde_json::Value>;

pub const META_EXTRACTION_METHOD: &str = "extractionMethod";
pub const META_WARNINGS: &str = "warnings";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Excel,
    Word,
    Powerpoint,
    Text,
    Image,
    Unknown,
}

impl DocumentFormat {
    pub const ALL: [DocumentFormat; 7] = [
        DocumentFormat::Pdf,
        DocumentFormat::Excel,
        DocumentFormat::Word,
        DocumentFormat::Powerpoint,
        DocumentFormat::Text,
        DocumentFormat::Image,
        DocumentFormat::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Excel => "excel",
            DocumentFormat::Word => "word",
            DocumentFormat::Powerpoint => "powerpoint",
            DocumentFormat::Text => "text",
            DocumentFormat::Image => "image",
            DocumentFormat::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of the universal document reader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentExtractionResult {
    /// Full text, newline-delimited, in page/sheet/slide order.
    pub text: String,
    pub format: DocumentFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheets: Option<Vec<String>>,
    /// Estimated reliability in [0, 1].
    pub confidence: f64,
    #[serde(default)]
    pub metadata: Metadata,
}

impl DocumentExtractionResult {
    pub fn new(text: impl Into<String>, format: DocumentFormat, confidence: f64) -> Self {
        DocumentExtractionResult {
            text: text.into(),
            format,
            pages: None,
            sheets: None,
            confidence: clamp_confidence(confidence),
            metadata: Metadata::new(),
        }
    }

    pub fn with_pages(mut self, pages: usize) -> Self {
        self.pages = Some(pages);
        self
    }

    pub fn with_sheets(mut self, sheets: Vec<String>) -> Self {
        self.sheets = Some(sheets);
        self
    }

    pub fn with_meta(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    /// Attach warnings, appending to any already recorded. Empty input is a no-op.
    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        if warnings.is_empty() {
            return self;
        }
        let mut all = self.warnings();
        all.extend(warnings);
        self.metadata
            .insert(META_WARNINGS.to_string(), serde_json::Value::from(all));
        self
    }

    pub fn warnings(&self) -> Vec<String> {
        match self.metadata.get(META_WARNINGS) {
            Some(serde_json::Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn extraction_method(&self) -> Option<&str> {
        self.metadata
            .get(META_EXTRACTION_METHOD)
            .and_then(|v| v.as_str())
    }
}

/// Clamp a confidence figure into [0, 1]; NaN becomes 0.
pub fn clamp_confidence(c: f64) -> f64 {
    if c.is_nan() {
        0.0
    } else {
        c.clamp(0.0, 1.0)
    }
}

/// A single spreadsheet or layout-table cell.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Text(String),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Number(_) => false,
        }
    }

    /// Render the cell as display text. Whole floats print without a fraction.
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Number(f) => format_number(*f),
            CellValue::Text(s) => s.trim().to_string(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

pub(crate) fn format_number(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        format!("{f}")
    }
}

/// A row keyed by column header.
pub type StatementRow = BTreeMap<String, CellValue>;

/// Tabular rows handed to the financial statement parser.
///
/// `headers` are unique and ordered; the first header names the line-item
/// label column.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatementTable {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub headers: Vec<String>,
    pub rows: Vec<StatementRow>,
}

impl StatementTable {
    pub fn label_column(&self) -> Option<&str> {
        self.headers.first().map(|s| s.as_str())
    }

    /// Label (first column) of a row, or an empty string.
    pub fn label(&self, row: &StatementRow) -> String {
        self.label_column()
            .and_then(|col| row.get(col))
            .map(|c| c.as_text())
            .unwrap_or_default()
    }
}

/// One fiscal year's line items, in SEK.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialYear {
    pub year: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub revenue: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub costs: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub ebitda: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub ebit: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub net_income: Decimal,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub assets: Option<Decimal>,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub liabilities: Option<Decimal>,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub equity: Option<Decimal>,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub cash: Option<Decimal>,
}

impl FinancialYear {
    pub fn empty(year: i32) -> Self {
        FinancialYear {
            year,
            revenue: Decimal::ZERO,
            costs: Decimal::ZERO,
            ebitda: Decimal::ZERO,
            ebit: Decimal::ZERO,
            net_income: Decimal::ZERO,
            assets: None,
            liabilities: None,
            equity: None,
            cash: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddBackCategory {
    OwnerSalary,
    OneTimeCost,
    NonRecurringRevenue,
    StockCompensation,
    RelatedParty,
}

impl fmt::Display for AddBackCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AddBackCategory::OwnerSalary => "owner_salary",
            AddBackCategory::OneTimeCost => "one_time_cost",
            AddBackCategory::NonRecurringRevenue => "non_recurring_revenue",
            AddBackCategory::StockCompensation => "stock_compensation",
            AddBackCategory::RelatedParty => "related_party",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionConfidence {
    High,
    Medium,
    Low,
}

impl fmt::Display for SuggestionConfidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuggestionConfidence::High => write!(f, "high"),
            SuggestionConfidence::Medium => write!(f, "medium"),
            SuggestionConfidence::Low => write!(f, "low"),
        }
    }
}

/// A candidate EBITDA adjustment. Advisory only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddBackSuggestion {
    pub category: AddBackCategory,
    pub description: String,
    /// Signed amount in SEK, whole kronor.
    #[serde(with = "rust_decimal::serde::float")]
    pub estimated_amount: Decimal,
    pub confidence: SuggestionConfidence,
    pub recommendation: String,
    /// Row label that triggered a keyword-flagged suggestion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_label: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataQuality {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl DataQuality {
    pub fn from_score(score: f64) -> DataQuality {
        if score >= 90.0 {
            DataQuality::Excellent
        } else if score >= 75.0 {
            DataQuality::Good
        } else if score >= 60.0 {
            DataQuality::Fair
        } else {
            DataQuality::Poor
        }
    }
}

impl fmt::Display for DataQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataQuality::Excellent => write!(f, "excellent"),
            DataQuality::Good => write!(f, "good"),
            DataQuality::Fair => write!(f, "fair"),
            DataQuality::Poor => write!(f, "poor"),
        }
    }
}

/// Output of the financial pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedFinancialData {
    /// Strictly ascending by year, no duplicates.
    pub years: Vec<FinancialYear>,
    pub add_backs_suggestions: Vec<AddBackSuggestion>,
    pub data_quality: DataQuality,
    pub quality_score: f64,
    pub detected_columns: Vec<String>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_sheet: Option<String>,
}
