//! CLI command implementations.

pub mod dump;
pub mod files;
pub mod inspect;
pub mod verify;

use qute_log::parse_base_offset;
use std::collections::BTreeSet;
use std::path::Path;

/// Lists the base offsets of all segments in `dir`, ascending.
///
/// A segment counts if either its store or its index file is present.
pub fn list_segments(dir: &Path) -> Result<Vec<u64>, Box<dyn std::error::Error>> {
    if !dir.is_dir() {
        return Err(format!("Not a directory: {:?}", dir).into());
    }

    let mut offsets = BTreeSet::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if let Some(base_offset) = entry.file_name().to_str().and_then(parse_base_offset) {
            offsets.insert(base_offset);
        }
    }
    Ok(offsets.into_iter().collect())
}

/// Renders a payload for display: UTF-8 text when printable, hex otherwise.
pub fn display_value(value: &[u8]) -> String {
    match std::str::from_utf8(value) {
        Ok(text) if !text.chars().any(char::is_control) => text.to_string(),
        _ => value.iter().map(|b| format!("{b:02x}")).collect(),
    }
}
