use granska_core::error::GranskaError;
use granska_core::keywords::builtin;
use granska_core::keywords::schema::{FieldKind, KeywordTable};
use std::path::Path;

pub fn list() -> Result<(), GranskaError> {
    println!("Available keyword tables:\n");
    for name in builtin::PRESETS {
        let table = builtin::load_preset(name)?;
        let default = if *name == builtin::DEFAULT_PRESET {
            " [default]"
        } else {
            ""
        };
        println!("  {:<8} {} (v{}){}", name, table.name, table.version, default);
        if let Some(ref desc) = table.description {
            println!("           {}", desc);
        }
        println!();
    }
    Ok(())
}

pub fn show(preset: &str) -> Result<(), GranskaError> {
    let table = builtin::load_preset(preset)?;

    println!("{} (version {})\n", table.name, table.version);
    if let Some(ref desc) = table.description {
        println!("{}\n", desc);
    }

    println!("A row is assigned to a field when its label contains an include");
    println!("keyword and no exclude keyword. The first matching row wins.\n");

    for kind in FieldKind::ALL {
        let Some(keywords) = table.field(kind) else {
            continue;
        };
        println!("  {kind}");
        println!("    include: {}", keywords.include.join(", "));
        if !keywords.exclude.is_empty() {
            println!("    exclude: {}", keywords.exclude.join(", "));
        }
        println!();
    }

    if !table.add_backs.is_empty() {
        println!("Add-back line items:\n");
        for (category, keywords) in &table.add_backs {
            println!("  {:<22} {}", category.to_string(), keywords.join(", "));
        }
        println!();
    }

    Ok(())
}

pub fn validate(file: &Path) -> Result<(), GranskaError> {
    let table = granska_core::keywords::load_keywords(file)?;

    println!("Keyword table '{}' (v{}) is valid.", table.name, table.version);
    println!("  Fields: {}", table.fields.len());
    println!("  Add-back categories: {}", table.add_backs.len());

    let warnings = coverage_warnings(&table);
    if !warnings.is_empty() {
        println!("\nWarnings:");
        for w in &warnings {
            println!("  - {}", w);
        }
    }

    Ok(())
}

/// Fields without include keywords are never filled; worth flagging, but
/// not invalid.
fn coverage_warnings(table: &KeywordTable) -> Vec<String> {
    FieldKind::ALL
        .iter()
        .filter(|kind| table.field(**kind).map_or(true, |k| k.include.is_empty()))
        .map(|kind| format!("field '{kind}' has no include keywords and will stay empty"))
        .collect()
}
