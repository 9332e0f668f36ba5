use granska_core::detect::detect_format;
use granska_core::error::GranskaError;
use std::path::Path;

use super::guess_mime;

pub fn run(input_file: &Path, mime: Option<String>) -> Result<(), GranskaError> {
    let filename = input_file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mime = mime.unwrap_or_else(|| guess_mime(&filename).to_string());
    let format = detect_format(&mime, &filename);
    println!("{format}  ({mime})");
    Ok(())
}
