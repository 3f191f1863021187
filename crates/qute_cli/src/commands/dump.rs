//! Dump command implementation.

use super::display_value;
use super::files::SegmentFiles;
use qute_codec::{Decode, Record};
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// A decoded record for display.
#[derive(Debug, Serialize)]
pub struct DumpedRecord {
    /// Absolute offset the record was read from.
    pub offset: u64,
    /// Offset stored inside the record.
    pub record_offset: u64,
    /// Payload length in bytes.
    pub len: usize,
    /// Payload as text or hex.
    pub value: String,
}

/// Runs the dump command.
pub fn run(
    path: &Path,
    base_offset: u64,
    from: Option<u64>,
    limit: Option<usize>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    info!("Dumping segment {} in {:?}", base_offset, path);

    let records = dump(path, base_offset, from, limit)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        _ => {
            for record in &records {
                println!(
                    "[{}] len={} value={}",
                    record.offset, record.len, record.value
                );
            }
            println!();
            println!("{} record(s)", records.len());
        }
    }

    Ok(())
}

/// Decodes records of one segment starting at `from` (default: the base
/// offset), up to `limit` records. The segment files are only read.
pub fn dump(
    path: &Path,
    base_offset: u64,
    from: Option<u64>,
    limit: Option<usize>,
) -> Result<Vec<DumpedRecord>, Box<dyn std::error::Error>> {
    let files = SegmentFiles::read(path, base_offset)?;
    let entries = files.index_entries();

    let start = from.unwrap_or(base_offset).max(base_offset);
    let limit = limit.unwrap_or(usize::MAX);

    let mut records = Vec::new();
    for offset in (start..files.next_offset()).take(limit) {
        let slot = usize::try_from(offset - base_offset)?;
        let (_, position) = entries[slot];
        let record = Record::decode(files.store_entry(position)?)?;
        records.push(DumpedRecord {
            offset,
            record_offset: record.offset,
            len: record.value.len(),
            value: display_value(&record.value),
        });
    }

    Ok(records)
}
