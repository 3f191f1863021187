//! Error types for log storage.

use std::io;
use thiserror::Error;

/// Result type for log storage operations.
pub type LogResult<T> = Result<T, LogError>;

/// Errors that can occur in the store, the index, or a segment.
#[derive(Debug, Error)]
pub enum LogError {
    /// An I/O or memory-mapping error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Record codec error.
    #[error("codec error: {0}")]
    Codec(#[from] qute_codec::CodecError),

    /// Attempted to read beyond the data currently held.
    #[error("read beyond end of data: offset {offset}, len {len}, size {size}")]
    EndOfData {
        /// The requested byte offset.
        offset: u64,
        /// The requested read length.
        len: u64,
        /// The number of bytes currently held.
        size: u64,
    },

    /// The write would exceed a configured capacity.
    #[error("capacity exceeded: {used} of {limit} used")]
    CapacityExceeded {
        /// Amount already used (bytes, or records for offset overflow).
        used: u64,
        /// Configured limit in the same unit.
        limit: u64,
    },

    /// The offset precedes the segment's base offset.
    #[error("offset {offset} precedes base offset {base_offset}")]
    InvalidOffset {
        /// The requested absolute offset.
        offset: u64,
        /// The segment's base offset.
        base_offset: u64,
    },

    /// The configuration is not usable.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the problem.
        message: String,
    },

    /// On-disk data is inconsistent.
    #[error("corrupted data: {message}")]
    Corrupted {
        /// Description of the corruption.
        message: String,
    },
}

impl LogError {
    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Creates a corrupted data error.
    pub fn corrupted(message: impl Into<String>) -> Self {
        Self::Corrupted {
            message: message.into(),
        }
    }

    /// Returns true if the requested data does not exist yet.
    #[must_use]
    pub fn is_end_of_data(&self) -> bool {
        matches!(self, Self::EndOfData { .. })
    }

    /// Returns true if the caller should roll over to a new segment.
    #[must_use]
    pub fn is_capacity_exceeded(&self) -> bool {
        matches!(self, Self::CapacityExceeded { .. })
    }

    /// Returns true if the offset belongs to an earlier segment.
    #[must_use]
    pub fn is_invalid_offset(&self) -> bool {
        matches!(self, Self::InvalidOffset { .. })
    }
}
