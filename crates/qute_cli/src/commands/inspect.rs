//! Inspect command implementation.

use super::files::SegmentFiles;
use super::list_segments;
use qute_log::{Config, ENTRY_WIDTH};
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// Directory inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Directory path.
    pub path: String,
    /// Total records across all segments.
    pub record_count: u64,
    /// Total store bytes across all segments.
    pub store_size: u64,
    /// Per-segment details, ascending by base offset.
    pub segments: Vec<SegmentInfo>,
}

/// Statistics for a single segment.
#[derive(Debug, Serialize)]
pub struct SegmentInfo {
    /// First offset of the segment.
    pub base_offset: u64,
    /// Offset the next write would receive.
    pub next_offset: u64,
    /// Number of records.
    pub record_count: u64,
    /// Store file size in bytes.
    pub store_size: u64,
    /// Bytes used by index entries.
    pub index_size: u64,
    /// Index file length, larger than `index_size` if not closed cleanly.
    pub index_file_size: u64,
    /// Whether the segment has reached a limit.
    pub full: bool,
}

/// Runs the inspect command.
pub fn run(path: &Path, config: &Config, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let result = inspect(path, config)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

/// Collects statistics for every segment in `path` without modifying it.
pub fn inspect(path: &Path, config: &Config) -> Result<InspectResult, Box<dyn std::error::Error>> {
    info!("Inspecting segments in {:?}", path);

    let mut result = InspectResult {
        path: path.display().to_string(),
        record_count: 0,
        store_size: 0,
        segments: Vec::new(),
    };

    for base_offset in list_segments(path)? {
        let files = SegmentFiles::read(path, base_offset)?;
        let record_count = files.reachable_entries();
        let index_size = record_count * ENTRY_WIDTH;
        let info = SegmentInfo {
            base_offset,
            next_offset: files.next_offset(),
            record_count,
            store_size: files.store_size(),
            index_size,
            index_file_size: files.index_file_size(),
            full: index_size + ENTRY_WIDTH > config.max_index_bytes
                || files.store_size() >= config.max_store_bytes,
        };

        result.record_count += info.record_count;
        result.store_size += info.store_size;
        result.segments.push(info);
    }

    Ok(result)
}

fn print_text_output(result: &InspectResult) {
    println!("Qute Segment Inspection");
    println!("=======================");
    println!();
    println!("Path: {}", result.path);
    println!("Segments: {}", result.segments.len());
    println!("Records:  {}", result.record_count);
    println!("Store:    {}", format_size(result.store_size));

    if !result.segments.is_empty() {
        println!();
        println!(
            "  {:>10}  {:>10}  {:>8}  {:>10}  {:>10}  full",
            "base", "next", "records", "store", "index"
        );
        for seg in &result.segments {
            println!(
                "  {:>10}  {:>10}  {:>8}  {:>10}  {:>10}  {}",
                seg.base_offset,
                seg.next_offset,
                seg.record_count,
                format_size(seg.store_size),
                format_size(seg.index_size),
                if seg.full { "yes" } else { "no" }
            );
        }
    }
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.1} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
