pub mod builtin;
pub mod schema;

use crate::error::GranskaError;
use schema::{FieldKind, KeywordTable};
use std::path::Path;

/// Load a keyword table from a JSON file.
pub fn load_keywords(path: &Path) -> Result<KeywordTable, GranskaError> {
    let content = std::fs::read_to_string(path).map_err(|e| GranskaError::KeywordsLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let table: KeywordTable =
        serde_json::from_str(&content).map_err(|e| GranskaError::KeywordsLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    validate_keywords(&table)?;
    Ok(table)
}

/// Parse a keyword table from a JSON string (no file path context).
pub fn parse_keywords_str(json: &str) -> Result<KeywordTable, GranskaError> {
    let table: KeywordTable = serde_json::from_str(json)?;
    validate_keywords(&table)?;
    Ok(table)
}

/// Validate that a keyword table is usable by the statement parser.
pub fn validate_keywords(table: &KeywordTable) -> Result<(), GranskaError> {
    if table.name.trim().is_empty() {
        return Err(GranskaError::KeywordsInvalid(
            "name must not be empty".into(),
        ));
    }

    match table.field(FieldKind::Revenue) {
        Some(k) if !k.include.is_empty() => {}
        _ => {
            return Err(GranskaError::KeywordsInvalid(
                "a 'revenue' field with at least one include keyword is required".into(),
            ))
        }
    }

    for (kind, keywords) in &table.fields {
        for k in keywords.include.iter().chain(&keywords.exclude) {
            check_keyword(k, &format!("field '{kind}'"))?;
        }
        if let Some(both) = keywords
            .include
            .iter()
            .find(|k| keywords.exclude.contains(k))
        {
            return Err(GranskaError::KeywordsInvalid(format!(
                "field '{kind}' lists '{both}' as both include and exclude"
            )));
        }
    }

    for (category, keywords) in &table.add_backs {
        for k in keywords {
            check_keyword(k, &format!("add-back category '{category}'"))?;
        }
    }

    Ok(())
}

fn check_keyword(keyword: &str, context: &str) -> Result<(), GranskaError> {
    if keyword.trim().is_empty() {
        return Err(GranskaError::KeywordsInvalid(format!(
            "{context} has an empty keyword"
        )));
    }
    if keyword != keyword.to_lowercase() {
        return Err(GranskaError::KeywordsInvalid(format!(
            "{context} keyword '{keyword}' must be lowercase"
        )));
    }
    Ok(())
}
