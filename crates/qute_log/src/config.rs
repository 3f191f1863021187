//! Segment configuration.

use crate::error::{LogError, LogResult};
use crate::index::ENTRY_WIDTH;

/// Sizing limits for a log segment.
///
/// A segment is full once either limit is reached. `max_index_bytes` is
/// also the size the index file is pre-allocated and mapped to, so it
/// bounds a segment to `max_index_bytes / 12` records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Store size in bytes at which the segment stops accepting writes.
    pub max_store_bytes: u64,

    /// Index capacity in bytes.
    pub max_index_bytes: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_store_bytes: 1024 * 1024,                                // 1 MiB
            max_index_bytes: (1024 * 1024 / ENTRY_WIDTH) * ENTRY_WIDTH, // ~1 MiB
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the store size limit.
    #[must_use]
    pub const fn max_store_bytes(mut self, bytes: u64) -> Self {
        self.max_store_bytes = bytes;
        self
    }

    /// Sets the index capacity.
    #[must_use]
    pub const fn max_index_bytes(mut self, bytes: u64) -> Self {
        self.max_index_bytes = bytes;
        self
    }

    /// Returns the number of records the index can hold.
    #[must_use]
    pub const fn max_records(&self) -> u64 {
        self.max_index_bytes / ENTRY_WIDTH
    }

    /// Checks that the limits describe a usable segment.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::InvalidConfig`] if the index cannot hold a
    /// single entry or the store limit is zero.
    pub fn validate(&self) -> LogResult<()> {
        if self.max_index_bytes < ENTRY_WIDTH {
            return Err(LogError::invalid_config(format!(
                "max_index_bytes must be at least {ENTRY_WIDTH}, got {}",
                self.max_index_bytes
            )));
        }
        if self.max_store_bytes == 0 {
            return Err(LogError::invalid_config("max_store_bytes must be non-zero"));
        }
        Ok(())
    }
}
