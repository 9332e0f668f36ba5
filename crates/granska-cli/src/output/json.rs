use granska_core::error::GranskaError;
use serde::Serialize;

pub fn print<T: Serialize>(value: &T) -> Result<(), GranskaError> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}
