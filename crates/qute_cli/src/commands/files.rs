//! Read-only view of a segment's files.
//!
//! The CLI never attaches through [`qute_log::Segment::open`], which creates
//! missing files, grows the index to its capacity and drops unreachable
//! entries. Commands work from a snapshot of the bytes on disk instead.

use qute_log::{
    is_reachable_entry, segment_file_name, LogError, LogResult, ENTRY_WIDTH, INDEX_EXTENSION,
    LEN_WIDTH, OFFSET_WIDTH, POSITION_WIDTH, STORE_EXTENSION,
};
use std::path::Path;

/// Store and index bytes of one segment as found on disk.
#[derive(Debug)]
pub struct SegmentFiles {
    /// Base offset from the file names.
    pub base_offset: u64,
    store: Vec<u8>,
    index: Vec<u8>,
}

impl SegmentFiles {
    /// Reads both files of the segment at `base_offset` in `dir`.
    ///
    /// A missing file reads as empty. Fails if neither file exists.
    pub fn read(dir: &Path, base_offset: u64) -> Result<Self, Box<dyn std::error::Error>> {
        let store_path = dir.join(segment_file_name(base_offset, STORE_EXTENSION));
        let index_path = dir.join(segment_file_name(base_offset, INDEX_EXTENSION));
        if !store_path.exists() && !index_path.exists() {
            return Err(format!("Segment {} not found in {:?}", base_offset, dir).into());
        }

        Ok(Self {
            base_offset,
            store: read_if_exists(&store_path)?,
            index: read_if_exists(&index_path)?,
        })
    }

    /// Returns the store file length.
    pub fn store_size(&self) -> u64 {
        self.store.len() as u64
    }

    /// Returns the index file length.
    pub fn index_file_size(&self) -> u64 {
        self.index.len() as u64
    }

    /// Returns the bytes after the last whole index entry.
    pub fn torn_index_bytes(&self) -> u64 {
        self.index_file_size() % ENTRY_WIDTH
    }

    /// Decodes every whole index entry in the file.
    pub fn index_entries(&self) -> Vec<(u32, u64)> {
        self.index
            .chunks_exact(ENTRY_WIDTH as usize)
            .map(|entry| {
                let (offset, position) = entry.split_at(OFFSET_WIDTH as usize);
                let mut offset_bytes = [0u8; OFFSET_WIDTH as usize];
                offset_bytes.copy_from_slice(offset);
                let mut position_bytes = [0u8; POSITION_WIDTH as usize];
                position_bytes.copy_from_slice(position);
                (
                    u32::from_be_bytes(offset_bytes),
                    u64::from_be_bytes(position_bytes),
                )
            })
            .collect()
    }

    /// Counts the leading entries a segment would keep on open.
    pub fn reachable_entries(&self) -> u64 {
        let entries = self.index_entries();
        let mut keep = entries.len();
        while keep > 0 {
            let (relative_offset, position) = entries[keep - 1];
            if is_reachable_entry(keep as u64 - 1, relative_offset, position, self.store_size()) {
                break;
            }
            keep -= 1;
        }
        keep as u64
    }

    /// Returns the offset the next write would receive after reopening.
    pub fn next_offset(&self) -> u64 {
        self.base_offset.saturating_add(self.reachable_entries())
    }

    /// Reads the payload of the store entry whose prefix starts at
    /// `position`.
    pub fn store_entry(&self, position: u64) -> LogResult<&[u8]> {
        let prefix = self.store_range(position, LEN_WIDTH)?;
        let mut len = [0u8; LEN_WIDTH as usize];
        len.copy_from_slice(prefix);
        self.store_range(position + LEN_WIDTH, u64::from_be_bytes(len))
    }

    fn store_range(&self, offset: u64, len: u64) -> LogResult<&[u8]> {
        let size = self.store_size();
        offset
            .checked_add(len)
            .filter(|&end| end <= size)
            .and_then(|end| Some(usize::try_from(offset).ok()?..usize::try_from(end).ok()?))
            .map(|range| &self.store[range])
            .ok_or(LogError::EndOfData { offset, len, size })
    }
}

fn read_if_exists(path: &Path) -> std::io::Result<Vec<u8>> {
    if path.exists() {
        std::fs::read(path)
    } else {
        Ok(Vec::new())
    }
}
