//! Memory-mapped offset index.
//!
//! ## Entry Format
//!
//! ```text
//! | relative_offset (4, big-endian) | position (8, big-endian) |
//! ```
//!
//! Entries are densely packed from byte 0. While open, the file is
//! pre-allocated to its full capacity and mapped read/write; on close it is
//! truncated back to the bytes actually used, which is how the next open
//! recovers the entry count.

use crate::error::{LogError, LogResult};
use memmap2::MmapMut;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Width of the relative offset field in bytes.
pub const OFFSET_WIDTH: u64 = 4;
/// Width of the store position field in bytes.
pub const POSITION_WIDTH: u64 = 8;
/// Width of one index entry in bytes.
pub const ENTRY_WIDTH: u64 = OFFSET_WIDTH + POSITION_WIDTH;

/// A fixed-capacity array of `(relative_offset, position)` entries backed
/// by a memory-mapped file.
///
/// The index has no internal lock. Writes take `&mut self`, so a shared
/// index can only be mutated by whoever holds it exclusively.
#[derive(Debug)]
pub struct Index {
    // Declared before `file` so the region is unmapped before the file
    // handle is closed on every drop path.
    mmap: MmapMut,
    file: File,
    path: PathBuf,
    size: u64,
}

impl Index {
    /// Opens or creates the index file at `path` with room for
    /// `max_index_bytes` of entries.
    ///
    /// Existing entries are kept: the logical size is the current file
    /// length (rounded down to a whole entry), and the capacity is never
    /// made smaller than that length.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::InvalidConfig`] if `max_index_bytes` cannot hold
    /// one entry, or an I/O error if the file cannot be grown or mapped.
    pub fn open(path: &Path, max_index_bytes: u64) -> LogResult<Self> {
        if max_index_bytes < ENTRY_WIDTH {
            return Err(LogError::invalid_config(format!(
                "index capacity {max_index_bytes} cannot hold a single entry"
            )));
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        let len = file.metadata()?.len();
        let size = round_down_to_entry(len);
        if size != len {
            warn!(
                path = %path.display(),
                len,
                "index ends in a partial entry, ignoring trailing bytes"
            );
        }

        let capacity = max_index_bytes.max(len);
        // SAFETY: the file was opened read/write and sized before mapping.
        // The map is owned by this value alongside the file and is the only
        // writer to the file while the index is open.
        #[allow(unsafe_code)]
        let mmap = grow_and_map(&file, len, capacity, |file| unsafe {
            MmapMut::map_mut(file)
        })?;

        debug!(path = %path.display(), size, capacity, "opened index");

        Ok(Self {
            mmap,
            file,
            path: path.to_path_buf(),
            size,
        })
    }

    /// Appends an entry.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::CapacityExceeded`] if another entry does not fit;
    /// nothing is written in that case.
    pub fn write_at(&mut self, relative_offset: u32, position: u64) -> LogResult<()> {
        let capacity = self.capacity();
        if self.size + ENTRY_WIDTH > capacity {
            return Err(LogError::CapacityExceeded {
                used: self.size,
                limit: capacity,
            });
        }

        let start = self.size as usize;
        let mid = start + OFFSET_WIDTH as usize;
        let end = start + ENTRY_WIDTH as usize;
        self.mmap[start..mid].copy_from_slice(&relative_offset.to_be_bytes());
        self.mmap[mid..end].copy_from_slice(&position.to_be_bytes());

        self.size += ENTRY_WIDTH;
        Ok(())
    }

    /// Reads entry number `entry` (0-based, in write order).
    ///
    /// # Errors
    ///
    /// Returns [`LogError::EndOfData`] if the entry has not been written.
    pub fn read_at(&self, entry: u64) -> LogResult<(u32, u64)> {
        let start = entry.saturating_mul(ENTRY_WIDTH);
        if self.size == 0 || start.saturating_add(ENTRY_WIDTH) > self.size {
            return Err(LogError::EndOfData {
                offset: start,
                len: ENTRY_WIDTH,
                size: self.size,
            });
        }

        let start = start as usize;
        let mid = start + OFFSET_WIDTH as usize;
        let end = start + ENTRY_WIDTH as usize;

        let mut offset = [0u8; OFFSET_WIDTH as usize];
        offset.copy_from_slice(&self.mmap[start..mid]);
        let mut position = [0u8; POSITION_WIDTH as usize];
        position.copy_from_slice(&self.mmap[mid..end]);

        Ok((u32::from_be_bytes(offset), u64::from_be_bytes(position)))
    }

    /// Reads the most recently written entry.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::EndOfData`] if the index is empty.
    pub fn read_last(&self) -> LogResult<(u32, u64)> {
        match self.len() {
            0 => Err(LogError::EndOfData {
                offset: 0,
                len: ENTRY_WIDTH,
                size: 0,
            }),
            n => self.read_at(n - 1),
        }
    }

    /// Drops every entry from `entries` onwards.
    ///
    /// The discarded region is zeroed in the map. Does nothing if the index
    /// holds `entries` or fewer entries.
    pub fn truncate_entries(&mut self, entries: u64) {
        let new_size = entries.saturating_mul(ENTRY_WIDTH);
        if new_size >= self.size {
            return;
        }
        self.mmap[new_size as usize..self.size as usize].fill(0);
        self.size = new_size;
    }

    /// Flushes mapped pages to the file, then fsyncs the file.
    ///
    /// # Errors
    ///
    /// Returns an error if either step fails.
    pub fn sync(&self) -> LogResult<()> {
        self.mmap.flush()?;
        self.file.sync_all()?;
        Ok(())
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.size / ENTRY_WIDTH
    }

    /// Returns true if no entries have been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Returns true if another entry does not fit.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.size + ENTRY_WIDTH > self.capacity()
    }

    /// Returns the bytes used by entries.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Returns the mapped capacity in bytes.
    #[must_use]
    pub fn capacity(&self) -> u64 {
        self.mmap.len() as u64
    }

    /// Returns the path of the index file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Syncs, unmaps, and truncates the file to the bytes in use.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync or the truncation fails.
    pub fn close(self) -> LogResult<()> {
        self.sync()?;

        let Self {
            mmap,
            file,
            path,
            size,
        } = self;

        // The file must not shrink underneath a live mapping.
        drop(mmap);
        file.set_len(size)?;
        file.sync_all()?;

        debug!(path = %path.display(), size, "closed index");
        Ok(())
    }
}

/// Grows `file` to `capacity` and maps it. If mapping fails the file is
/// shrunk back to `len`.
fn grow_and_map(
    file: &File,
    len: u64,
    capacity: u64,
    map: impl FnOnce(&File) -> io::Result<MmapMut>,
) -> io::Result<MmapMut> {
    if len < capacity {
        file.set_len(capacity)?;
    }
    match map(file) {
        Ok(mmap) => Ok(mmap),
        Err(e) => {
            if len < capacity {
                file.set_len(len)?;
            }
            Err(e)
        }
    }
}

fn round_down_to_entry(len: u64) -> u64 {
    (len / ENTRY_WIDTH) * ENTRY_WIDTH
}
