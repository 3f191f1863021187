//! Verify command implementation.

use super::files::SegmentFiles;
use super::list_segments;
use qute_codec::{Decode, Record};
use qute_log::LEN_WIDTH;
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

/// Verification result for one segment.
#[derive(Debug, Default)]
pub struct VerifyResult {
    /// Number of store entries walked.
    pub entries_checked: usize,
    /// Number of index entries checked.
    pub index_entries_checked: u64,
    /// Store entries after the last indexed one.
    pub unindexed_entries: usize,
    /// Zeroed index entries left by a segment that was not closed.
    pub preallocated_entries: u64,
    /// List of errors found.
    pub errors: Vec<String>,
}

impl VerifyResult {
    fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Runs the verify command.
///
/// Segment files are only read; nothing on disk is created or changed.
pub fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    println!("Verifying segments in {:?}", path);
    println!();

    let mut all_ok = true;
    for base_offset in list_segments(path)? {
        let files = SegmentFiles::read(path, base_offset)?;
        let result = verify_segment(&files);

        print_result(base_offset, &result);
        all_ok &= result.is_ok();
    }

    println!();
    if all_ok {
        println!("✓ Segment verification passed");
        Ok(())
    } else {
        println!("✗ Segment verification failed");
        Err("Verification failed".into())
    }
}

/// Checks store framing, index density, and record offsets of a segment
/// as it is on disk.
pub fn verify_segment(files: &SegmentFiles) -> VerifyResult {
    info!("Verifying segment {}", files.base_offset);

    let mut result = VerifyResult::default();
    let size = files.store_size();

    // Walk the store's length prefixes to find every entry boundary.
    let mut boundaries = Vec::new();
    let mut pos = 0u64;
    while pos < size {
        if pos + LEN_WIDTH > size {
            result.errors.push(format!(
                "Truncated length prefix at {}: {} bytes left",
                pos,
                size - pos
            ));
            break;
        }

        match files.store_entry(pos) {
            Ok(payload) => {
                boundaries.push(pos);
                result.entries_checked += 1;
                pos += LEN_WIDTH + payload.len() as u64;
            }
            Err(e) => {
                result
                    .errors
                    .push(format!("Truncated entry at {}: {}", pos, e));
                break;
            }
        }
    }

    let torn = files.torn_index_bytes();
    if torn > 0 {
        result
            .errors
            .push(format!("Index ends in a partial entry of {} bytes", torn));
    }

    let entries = files.index_entries();
    let reachable = usize::try_from(files.reachable_entries()).unwrap_or(entries.len());
    let preallocated = entries[reachable..]
        .iter()
        .rev()
        .take_while(|entry| **entry == (0, 0))
        .count();
    result.preallocated_entries = preallocated as u64;

    let valid: HashSet<u64> = boundaries.iter().copied().collect();
    let mut last_position = None;

    for (i, &(relative_offset, position)) in entries[..entries.len() - preallocated]
        .iter()
        .enumerate()
    {
        let i = i as u64;
        result.index_entries_checked += 1;

        if u64::from(relative_offset) != i {
            result.errors.push(format!(
                "Index entry {} has relative offset {}",
                i, relative_offset
            ));
        }
        if !valid.contains(&position) {
            result.errors.push(format!(
                "Index entry {} points at {}, not an entry boundary",
                i, position
            ));
            continue;
        }
        if last_position.is_some_and(|last| position <= last) {
            result.errors.push(format!(
                "Index entry {} position {} does not increase",
                i, position
            ));
        }
        last_position = Some(position);

        let offset = files.base_offset + i;
        match files.store_entry(position).map(Record::decode) {
            Ok(Ok(record)) if record.offset != offset => result.errors.push(format!(
                "Record at offset {} carries offset {}",
                offset, record.offset
            )),
            Ok(Ok(_)) => {}
            Ok(Err(e)) => result
                .errors
                .push(format!("Record at offset {} failed to decode: {}", offset, e)),
            Err(e) => result
                .errors
                .push(format!("Record at offset {} unreadable: {}", offset, e)),
        }
    }

    // Bytes appended before a failed index write are unreachable but harmless.
    let indexed = usize::try_from(result.index_entries_checked).unwrap_or(usize::MAX);
    result.unindexed_entries = boundaries.len().saturating_sub(indexed);

    result
}

fn print_result(base_offset: u64, result: &VerifyResult) {
    println!("Segment {}:", base_offset);
    println!("  Store entries: {}", result.entries_checked);
    println!("  Index entries: {}", result.index_entries_checked);
    if result.preallocated_entries > 0 {
        println!(
            "  Pre-allocated index entries: {} (not closed cleanly)",
            result.preallocated_entries
        );
    }
    if result.unindexed_entries > 0 {
        println!(
            "  Unindexed store entries: {} (unreachable)",
            result.unindexed_entries
        );
    }
    for error in &result.errors {
        println!("  ✗ {}", error);
    }
}
