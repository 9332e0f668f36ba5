use crate::error::GranskaError;
use crate::keywords::schema::KeywordTable;
use crate::keywords::validate_keywords;

const SV_EN_JSON: &str = include_str!("../../../../keywords/sv-en.json");

/// Available predefined keyword tables.
pub const PRESETS: &[&str] = &["sv-en"];

/// Name of the table used when the caller names none.
pub const DEFAULT_PRESET: &str = "sv-en";

/// Load a predefined keyword table by name.
pub fn load_preset(name: &str) -> Result<KeywordTable, GranskaError> {
    let json = match name {
        "sv-en" => SV_EN_JSON,
        _ => {
            return Err(GranskaError::KeywordsInvalid(format!(
                "unknown preset '{}'. Available: {}",
                name,
                PRESETS.join(", ")
            )))
        }
    };
    let table: KeywordTable = serde_json::from_str(json)?;
    validate_keywords(&table)?;
    Ok(table)
}

/// The default bilingual table.
pub fn default_table() -> Result<KeywordTable, GranskaError> {
    load_preset(DEFAULT_PRESET)
}
