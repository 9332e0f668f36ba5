use granska_core::error::GranskaError;
use granska_core::keywords::{builtin, load_keywords};
use std::path::PathBuf;

use super::{build_reader, Upload};
use crate::{output, PdfBackend};

pub struct Args {
    pub input_file: PathBuf,
    pub mime: Option<String>,
    pub keywords: Option<PathBuf>,
    pub output_format: String,
    pub output_file: Option<PathBuf>,
    pub pdf_backend: PdfBackend,
    pub config: Option<PathBuf>,
}

pub fn run(args: Args) -> Result<(), GranskaError> {
    let upload = Upload::open(&args.input_file, args.mime)?;
    let keywords = match &args.keywords {
        Some(path) => load_keywords(path)?,
        None => builtin::default_table()?,
    };
    let reader = build_reader(args.pdf_backend, args.config)?;
    let parsed = granska_core::analyze_document(
        &upload.bytes,
        &upload.filename,
        &upload.mime,
        &reader,
        &keywords,
    )?;

    match args.output_file {
        Some(path) => {
            // Always write JSON when saving to file
            let json = serde_json::to_string_pretty(&parsed)?;
            std::fs::write(&path, json)?;
            eprintln!(
                "Parsed {} year(s), quality {} ({:.0}), written to {}",
                parsed.years.len(),
                parsed.data_quality,
                parsed.quality_score,
                path.display()
            );
            for e in &parsed.errors {
                eprintln!("  error: {e}");
            }
            for w in &parsed.warnings {
                eprintln!("  warning: {w}");
            }
        }
        None => match args.output_format.as_str() {
            "json" => output::json::print(&parsed)?,
            _ => output::table::print_financials(&parsed),
        },
    }

    Ok(())
}
