use crate::model::AddBackCategory;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A bilingual label dictionary mapping statement rows to fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordTable {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
    pub fields: BTreeMap<FieldKind, FieldKeywords>,
    /// Labels that flag a row as a candidate EBITDA adjustment.
    #[serde(default)]
    pub add_backs: BTreeMap<AddBackCategory, Vec<String>>,
}

impl KeywordTable {
    pub fn field(&self, kind: FieldKind) -> Option<&FieldKeywords> {
        self.fields.get(&kind)
    }

    /// True if a normalized label matches `kind`.
    pub fn matches(&self, kind: FieldKind, label: &str) -> bool {
        self.field(kind).is_some_and(|k| k.matches(label))
    }

    /// First add-back category (in category order) whose keywords occur in the label.
    pub fn add_back_category(&self, label: &str) -> Option<AddBackCategory> {
        self.add_backs
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| label.contains(k.as_str())))
            .map(|(category, _)| *category)
    }
}

/// Include/exclude keyword lists for one field. Keywords are lowercase
/// substrings of the normalized row label.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldKeywords {
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl FieldKeywords {
    pub fn matches(&self, label: &str) -> bool {
        self.include.iter().any(|k| label.contains(k.as_str()))
            && !self.exclude.iter().any(|k| label.contains(k.as_str()))
    }
}

/// Line items the statement parser looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Revenue,
    Costs,
    Ebitda,
    Ebit,
    NetIncome,
    Assets,
    Liabilities,
    Equity,
    Cash,
}

impl FieldKind {
    pub const ALL: [FieldKind; 9] = [
        FieldKind::Revenue,
        FieldKind::Costs,
        FieldKind::Ebitda,
        FieldKind::Ebit,
        FieldKind::NetIncome,
        FieldKind::Assets,
        FieldKind::Liabilities,
        FieldKind::Equity,
        FieldKind::Cash,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Revenue => "revenue",
            FieldKind::Costs => "costs",
            FieldKind::Ebitda => "ebitda",
            FieldKind::Ebit => "ebit",
            FieldKind::NetIncome => "net_income",
            FieldKind::Assets => "assets",
            FieldKind::Liabilities => "liabilities",
            FieldKind::Equity => "equity",
            FieldKind::Cash => "cash",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
