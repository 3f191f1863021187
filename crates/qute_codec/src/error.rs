//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur during encoding or decoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Failed to encode a record to CBOR.
    #[error("encoding failed: {message}")]
    EncodingFailed {
        /// Description of the encoding error.
        message: String,
    },

    /// Failed to decode CBOR bytes.
    #[error("decoding failed: {message}")]
    DecodingFailed {
        /// Description of the decoding error.
        message: String,
    },

    /// A required record field was absent.
    #[error("missing field: {field}")]
    MissingField {
        /// Name of the missing field.
        field: &'static str,
    },

    /// A record field had the wrong CBOR type.
    #[error("field {field} has unexpected type")]
    UnexpectedType {
        /// Name of the offending field.
        field: &'static str,
    },

    /// Bytes remained after a complete item was decoded.
    #[error("{count} trailing bytes after record")]
    TrailingBytes {
        /// Number of unconsumed bytes.
        count: usize,
    },
}

impl CodecError {
    /// Create an encoding failed error.
    pub fn encoding_failed(message: impl Into<String>) -> Self {
        Self::EncodingFailed {
            message: message.into(),
        }
    }

    /// Create a decoding failed error.
    pub fn decoding_failed(message: impl Into<String>) -> Self {
        Self::DecodingFailed {
            message: message.into(),
        }
    }
}
