use granska_core::error::GranskaError;
use std::path::PathBuf;

use super::{build_reader, Upload};
use crate::{output, PdfBackend};

pub fn run(
    input_file: PathBuf,
    mime: Option<String>,
    output_format: &str,
    pdf_backend: PdfBackend,
    config: Option<PathBuf>,
) -> Result<(), GranskaError> {
    let upload = Upload::open(&input_file, mime)?;
    let reader = build_reader(pdf_backend, config)?;
    let result = reader.read(&upload.bytes, &upload.filename, &upload.mime)?;

    match output_format {
        "json" => output::json::print(&result)?,
        _ => output::table::print_extraction(&result),
    }
    Ok(())
}
