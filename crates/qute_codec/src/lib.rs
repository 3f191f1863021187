//! # Qute Codec
//!
//! Record encoding for the Qute commit log.
//!
//! The log's storage layer treats payloads as opaque bytes. This crate is
//! the boundary where a structured record becomes those bytes and back:
//!
//! - [`Encode`] / [`Decode`] turn a value into bytes and back
//! - [`LogRecord`] adds the absolute offset the log assigns at write time
//! - [`Record`] is the default record type, encoded as a CBOR map
//!
//! ## Usage
//!
//! ```
//! use qute_codec::{Decode, Encode, LogRecord, Record};
//!
//! let mut record = Record::new(b"hello".to_vec());
//! record.set_offset(7);
//!
//! let bytes = record.encode().unwrap();
//! let decoded = Record::decode(&bytes).unwrap();
//! assert_eq!(decoded.offset(), 7);
//! assert_eq!(decoded.value, b"hello");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod record;

pub use error::{CodecError, CodecResult};
pub use record::Record;

/// Trait for types that can be encoded to bytes.
pub trait Encode {
    /// Encode this value to bytes.
    fn encode(&self) -> CodecResult<Vec<u8>>;
}

/// Trait for types that can be decoded from bytes.
pub trait Decode: Sized {
    /// Decode this value from bytes.
    fn decode(bytes: &[u8]) -> CodecResult<Self>;
}

/// A record that can be appended to the log.
///
/// The log assigns the absolute offset immediately before encoding, so the
/// offset travels inside the encoded bytes and comes back on decode.
pub trait LogRecord: Encode + Decode {
    /// Returns the absolute offset carried by this record.
    fn offset(&self) -> u64;

    /// Sets the absolute offset carried by this record.
    fn set_offset(&mut self, offset: u64);
}
