//! # Qute Log
//!
//! Storage core of the Qute commit log.
//!
//! A log is split into segments. Each segment owns two files:
//!
//! - a [`Store`]: length-prefixed record bytes, appended in order
//! - an [`Index`]: a memory-mapped array of `(relative offset, position)`
//!   entries that resolves an offset to a store position in O(1)
//!
//! A [`Segment`] binds the two, assigns absolute offsets, encodes records
//! through [`qute_codec`], and stops accepting writes once either file
//! reaches its configured limit. Creating, rotating and retiring segments
//! is left to the caller.
//!
//! ## Example
//!
//! ```no_run
//! use qute_codec::Record;
//! use qute_log::{Config, Segment};
//! use std::path::Path;
//!
//! let config = Config::new().max_store_bytes(4096).max_index_bytes(120);
//! let mut segment = Segment::open(Path::new("data"), 0, config.clone()).unwrap();
//!
//! let mut record = Record::new(b"hello".to_vec());
//! match segment.write(&mut record) {
//!     Ok(offset) => println!("wrote offset {offset}"),
//!     Err(e) if e.is_capacity_exceeded() => {
//!         let next = segment.next_offset();
//!         segment.close().unwrap();
//!         segment = Segment::open(Path::new("data"), next, config).unwrap();
//!         segment.write(&mut record).unwrap();
//!     }
//!     Err(e) => panic!("{e}"),
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod index;
mod segment;
mod store;

pub use config::Config;
pub use error::{LogError, LogResult};
pub use index::{Index, ENTRY_WIDTH, OFFSET_WIDTH, POSITION_WIDTH};
pub use segment::{
    is_reachable_entry, parse_base_offset, segment_file_name, Segment, INDEX_EXTENSION,
    STORE_EXTENSION,
};
pub use store::{Store, LEN_WIDTH};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
