use crate::error::GranskaError;
use std::io::{Cursor, Read};
use zip::ZipArchive;

/// Upper bound on a single decompressed XML part. Guards against zip bombs.
pub const MAX_XML_ENTRY_BYTES: u64 = 32 * 1024 * 1024;

pub type Archive<'a> = ZipArchive<Cursor<&'a [u8]>>;

/// Open an Office Open XML container. Anything that is not a ZIP (a legacy
/// binary `.doc` or `.ppt`, a truncated upload) fails here.
pub fn open(bytes: &[u8]) -> Result<Archive<'_>, GranskaError> {
    ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| GranskaError::Ooxml(format!("not an Office Open XML package: {e}")))
}

/// Read one entry, refusing to inflate more than `max_bytes`.
pub fn read_entry_bounded(
    archive: &mut Archive<'_>,
    name: &str,
    max_bytes: u64,
) -> Result<Vec<u8>, GranskaError> {
    let entry = archive
        .by_name(name)
        .map_err(|e| GranskaError::Ooxml(format!("{name}: {e}")))?;
    let mut out = Vec::new();
    entry
        .take(max_bytes)
        .read_to_end(&mut out)
        .map_err(|e| GranskaError::Ooxml(format!("{name}: {e}")))?;
    if out.len() as u64 >= max_bytes {
        return Err(GranskaError::Ooxml(format!(
            "{name} exceeds size limit ({max_bytes} bytes)"
        )));
    }
    Ok(out)
}

/// Entry names starting with `prefix` and ending with `suffix`, ordered by the
/// number between them (`slide2.xml` before `slide10.xml`). Names without a
/// number sort last, alphabetically.
pub fn numbered_entries(archive: &Archive<'_>, prefix: &str, suffix: &str) -> Vec<String> {
    let mut names: Vec<String> = archive
        .file_names()
        .filter(|n| n.starts_with(prefix) && n.ends_with(suffix))
        .filter(|n| !n[prefix.len()..].contains('/'))
        .map(str::to_string)
        .collect();
    names.sort_by(|a, b| {
        let key = |n: &str| {
            n.get(prefix.len()..n.len() - suffix.len())
                .and_then(|mid| mid.parse::<u32>().ok())
                .unwrap_or(u32::MAX)
        };
        key(a).cmp(&key(b)).then_with(|| a.cmp(b))
    });
    names
}
