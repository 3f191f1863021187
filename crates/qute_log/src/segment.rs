//! Log segments.
//!
//! A segment binds one [`Store`] and one [`Index`] that share a base
//! offset. Both files are named after the zero-padded base offset:
//!
//! ```text
//! <dir>/
//! ├─ 0000000016.store   # length-prefixed encoded records
//! └─ 0000000016.index   # (relative offset, store position) entries
//! ```
//!
//! The next offset is never persisted. It is derived from the last index
//! entry every time the segment is opened.

use crate::config::Config;
use crate::error::{LogError, LogResult};
use crate::index::{Index, ENTRY_WIDTH};
use crate::store::{Store, LEN_WIDTH};
use qute_codec::LogRecord;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File extension of segment store files.
pub const STORE_EXTENSION: &str = "store";
/// File extension of segment index files.
pub const INDEX_EXTENSION: &str = "index";

/// Returns the file name for a segment file, e.g. `0000000016.store`.
#[must_use]
pub fn segment_file_name(base_offset: u64, extension: &str) -> String {
    format!("{base_offset:010}.{extension}")
}

/// Parses the base offset out of a segment file name.
///
/// Returns `None` unless the name is `<digits>.store` or `<digits>.index`.
#[must_use]
pub fn parse_base_offset(file_name: &str) -> Option<u64> {
    let (stem, extension) = file_name.rsplit_once('.')?;
    if extension != STORE_EXTENSION && extension != INDEX_EXTENSION {
        return None;
    }
    if stem.is_empty() || !stem.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    stem.parse().ok()
}

/// A bounded shard of the log covering offsets from `base_offset` up to
/// (but excluding) `next_offset`.
///
/// # Concurrency
///
/// [`Segment::write`] takes `&mut self` and [`Segment::read`] takes
/// `&self`, so a segment shared behind a `RwLock` has exactly one writer
/// at a time while reads proceed against completed writes.
///
/// # Example
///
/// ```no_run
/// use qute_codec::Record;
/// use qute_log::{Config, Segment};
/// use std::path::Path;
///
/// let config = Config::new().max_index_bytes(1200);
/// let mut segment = Segment::open(Path::new("data"), 16, config).unwrap();
///
/// let mut record = Record::new(b"hello".to_vec());
/// let offset = segment.write(&mut record).unwrap();
/// assert_eq!(offset, 16);
///
/// let read: Record = segment.read(offset).unwrap();
/// assert_eq!(read.value, b"hello");
/// ```
#[derive(Debug)]
pub struct Segment {
    store: Store,
    index: Index,
    base_offset: u64,
    next_offset: u64,
    config: Config,
}

impl Segment {
    /// Opens or creates the segment starting at `base_offset` in `dir`.
    ///
    /// Reopening the same directory and base offset reattaches to the same
    /// files and recovers the next offset from the index.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::InvalidConfig`] for unusable limits, or an I/O
    /// error if either file cannot be opened.
    pub fn open(dir: &Path, base_offset: u64, config: Config) -> LogResult<Self> {
        config.validate()?;

        let store = Store::open(&dir.join(segment_file_name(base_offset, STORE_EXTENSION)))?;
        let mut index = Index::open(
            &dir.join(segment_file_name(base_offset, INDEX_EXTENSION)),
            config.max_index_bytes,
        )?;

        discard_unreachable_entries(&mut index, store.size())?;

        let next_offset = match index.read_last() {
            Ok((relative_offset, _)) => base_offset
                .checked_add(u64::from(relative_offset))
                .and_then(|last| last.checked_add(1))
                .ok_or_else(|| {
                    LogError::corrupted(format!(
                        "relative offset {relative_offset} overflows base offset {base_offset}"
                    ))
                })?,
            Err(e) if e.is_end_of_data() => base_offset,
            Err(e) => return Err(e),
        };

        debug!(
            base_offset,
            next_offset,
            store_size = store.size(),
            "opened segment"
        );

        Ok(Self {
            store,
            index,
            base_offset,
            next_offset,
            config,
        })
    }

    /// Appends a record and returns the absolute offset assigned to it.
    ///
    /// The offset is written into `record` before it is encoded.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::CapacityExceeded`] if the segment is full (the
    /// caller should roll to a new segment at [`Segment::next_offset`]),
    /// a codec error, or an I/O error. A full segment is left untouched.
    pub fn write<R: LogRecord>(&mut self, record: &mut R) -> LogResult<u64> {
        if self.is_full() {
            debug!(base_offset = self.base_offset, "segment full");
            return Err(self.capacity_error());
        }

        let offset = self.next_offset;
        let relative_offset =
            u32::try_from(offset - self.base_offset).map_err(|_| LogError::CapacityExceeded {
                used: self.len(),
                limit: u64::from(u32::MAX) + 1,
            })?;
        let next_offset = offset.checked_add(1).ok_or(LogError::CapacityExceeded {
            used: self.len(),
            limit: self.len(),
        })?;

        record.set_offset(offset);
        let bytes = record.encode()?;

        let (_, position) = self.store.append(&bytes)?;
        // A failure here leaves the appended bytes without an index entry.
        // They are unreachable but do not disturb existing entries.
        self.index.write_at(relative_offset, position)?;

        self.next_offset = next_offset;
        Ok(offset)
    }

    /// Reads and decodes the record at absolute `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::InvalidOffset`] if `offset` precedes the base
    /// offset, [`LogError::EndOfData`] if it has not been written, or a
    /// store or codec error.
    pub fn read<R: LogRecord>(&self, offset: u64) -> LogResult<R> {
        let bytes = self.read_raw(offset)?;
        Ok(R::decode(&bytes)?)
    }

    /// Reads the encoded bytes of the record at absolute `offset`.
    ///
    /// # Errors
    ///
    /// Same as [`Segment::read`], minus codec errors.
    pub fn read_raw(&self, offset: u64) -> LogResult<Vec<u8>> {
        if offset < self.base_offset {
            return Err(LogError::InvalidOffset {
                offset,
                base_offset: self.base_offset,
            });
        }

        let (_, position) = self.index.read_at(offset - self.base_offset)?;
        self.store.read(position)
    }

    /// Returns true once either the index or the store limit is reached.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.index_full() || self.store.size() >= self.config.max_store_bytes
    }

    fn index_full(&self) -> bool {
        self.index.size() + ENTRY_WIDTH > self.config.max_index_bytes
    }

    fn capacity_error(&self) -> LogError {
        if self.index_full() {
            LogError::CapacityExceeded {
                used: self.index.size(),
                limit: self.config.max_index_bytes,
            }
        } else {
            LogError::CapacityExceeded {
                used: self.store.size(),
                limit: self.config.max_store_bytes,
            }
        }
    }

    /// Flushes the store and syncs both files to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if any flush or fsync fails.
    pub fn sync(&self) -> LogResult<()> {
        self.store.sync()?;
        self.index.sync()
    }

    /// Returns the first offset this segment may contain.
    #[must_use]
    pub fn base_offset(&self) -> u64 {
        self.base_offset
    }

    /// Returns the offset the next write will be assigned.
    #[must_use]
    pub fn next_offset(&self) -> u64 {
        self.next_offset
    }

    /// Returns the number of records in the segment.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.next_offset - self.base_offset
    }

    /// Returns true if no records have been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the store size in bytes.
    #[must_use]
    pub fn store_size(&self) -> u64 {
        self.store.size()
    }

    /// Returns the bytes used by index entries.
    #[must_use]
    pub fn index_size(&self) -> u64 {
        self.index.size()
    }

    /// Returns the path of the store file.
    #[must_use]
    pub fn store_path(&self) -> &Path {
        self.store.path()
    }

    /// Returns the path of the index file.
    #[must_use]
    pub fn index_path(&self) -> &Path {
        self.index.path()
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Returns the underlying index.
    #[must_use]
    pub fn index(&self) -> &Index {
        &self.index
    }

    /// Returns the segment's limits.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Closes the index, then the store.
    ///
    /// # Errors
    ///
    /// Returns the first error from closing either file.
    pub fn close(self) -> LogResult<()> {
        let base_offset = self.base_offset;
        self.index.close()?;
        self.store.close()?;
        debug!(base_offset, "closed segment");
        Ok(())
    }

    /// Closes the segment and deletes both of its files.
    ///
    /// Files that are already gone are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if closing or deleting fails.
    pub fn remove(self) -> LogResult<()> {
        let base_offset = self.base_offset;
        let index_path: PathBuf = self.index.path().to_path_buf();
        let store_path: PathBuf = self.store.path().to_path_buf();

        self.close()?;
        remove_if_exists(&index_path)?;
        remove_if_exists(&store_path)?;

        debug!(base_offset, "removed segment");
        Ok(())
    }
}

/// Returns true if index entry number `slot` can belong to a segment whose
/// store holds `store_size` bytes.
///
/// Entry `i` is always written with relative offset `i` and points at a
/// complete length prefix in the store.
#[must_use]
pub fn is_reachable_entry(slot: u64, relative_offset: u32, position: u64, store_size: u64) -> bool {
    u64::from(relative_offset) == slot && position.saturating_add(LEN_WIDTH) <= store_size
}

/// Drops trailing index entries that cannot belong to this segment.
///
/// After an unclean shutdown the index keeps its zeroed pre-allocated tail,
/// and entries may point at store bytes that were still buffered when the
/// process died.
fn discard_unreachable_entries(index: &mut Index, store_size: u64) -> LogResult<()> {
    let total = index.len();
    let mut keep = total;

    while keep > 0 {
        let (relative_offset, position) = index.read_at(keep - 1)?;
        if is_reachable_entry(keep - 1, relative_offset, position, store_size) {
            break;
        }
        keep -= 1;
    }

    if keep < total {
        warn!(
            path = %index.path().display(),
            kept = keep,
            discarded = total - keep,
            "discarding index entries with no matching store data"
        );
        index.truncate_entries(keep);
    }
    Ok(())
}

fn remove_if_exists(path: &Path) -> LogResult<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::RwLock;
    use qute_codec::{CodecError, CodecResult, Decode, Encode, Record};
    use std::sync::Arc;
    use tempfile::tempdir;

    const BASE_OFFSET: u64 = 16;

    fn message() -> Record {
        Record::new(b"testing segment".to_vec())
    }

    fn encoded_width() -> u64 {
        let mut record = message();
        record.set_offset(BASE_OFFSET);
        record.encode().unwrap().len() as u64 + LEN_WIDTH
    }

    fn config(max_store_bytes: u64, max_index_bytes: u64) -> Config {
        Config::new()
            .max_store_bytes(max_store_bytes)
            .max_index_bytes(max_index_bytes)
    }

    #[test]
    fn file_names_are_zero_padded() {
        assert_eq!(segment_file_name(16, STORE_EXTENSION), "0000000016.store");
        assert_eq!(segment_file_name(0, INDEX_EXTENSION), "0000000000.index");
    }

    #[test]
    fn parse_base_offset_from_file_names() {
        assert_eq!(parse_base_offset("0000000016.store"), Some(16));
        assert_eq!(parse_base_offset("0000000016.index"), Some(16));
        assert_eq!(parse_base_offset("0000000016.log"), None);
        assert_eq!(parse_base_offset(".store"), None);
        assert_eq!(parse_base_offset("+16.store"), None);
        assert_eq!(parse_base_offset("notes.txt"), None);
    }

    #[test]
    fn open_creates_named_files() {
        let dir = tempdir().unwrap();
        let segment = Segment::open(dir.path(), BASE_OFFSET, Config::default()).unwrap();

        assert_eq!(segment.store_path(), dir.path().join("0000000016.store"));
        assert_eq!(segment.index_path(), dir.path().join("0000000016.index"));
        assert!(segment.store_path().exists());
        assert!(segment.index_path().exists());
    }

    #[test]
    fn open_rejects_invalid_config() {
        let dir = tempdir().unwrap();
        let result = Segment::open(dir.path(), BASE_OFFSET, config(1024, 0));
        assert!(matches!(result, Err(LogError::InvalidConfig { .. })));
    }

    #[test]
    fn write_and_read_records() {
        let dir = tempdir().unwrap();
        let config = config(1024, ENTRY_WIDTH * 3);
        let mut segment = Segment::open(dir.path(), BASE_OFFSET, config).unwrap();
        assert_eq!(segment.next_offset(), BASE_OFFSET);
        assert!(segment.is_empty());
        assert!(!segment.is_full());

        for i in 0..3 {
            let mut record = message();
            let offset = segment.write(&mut record).unwrap();
            assert_eq!(offset, BASE_OFFSET + i);
            assert_eq!(record.offset, offset);

            let got: Record = segment.read(offset).unwrap();
            assert_eq!(got.value, message().value);
            assert_eq!(got.offset, offset);
        }
        assert_eq!(segment.len(), 3);
    }

    #[test]
    fn segment_is_maxed_by_index() {
        let dir = tempdir().unwrap();
        let config = config(1024, ENTRY_WIDTH * 3);
        let mut segment = Segment::open(dir.path(), BASE_OFFSET, config).unwrap();

        for _ in 0..3 {
            segment.write(&mut message()).unwrap();
        }
        assert!(segment.is_full());

        let err = segment.write(&mut message()).unwrap_err();
        assert!(err.is_capacity_exceeded());
        assert_eq!(segment.next_offset(), BASE_OFFSET + 3);
    }

    #[test]
    fn segment_is_maxed_by_store() {
        let dir = tempdir().unwrap();
        let max_store = encoded_width() * 3;
        let config = config(max_store, 1024);
        let mut segment = Segment::open(dir.path(), BASE_OFFSET, config).unwrap();

        for _ in 0..3 {
            segment.write(&mut message()).unwrap();
        }
        assert!(segment.is_full());
        assert_eq!(segment.store_size(), max_store);

        let err = segment.write(&mut message()).unwrap_err();
        assert!(matches!(
            err,
            LogError::CapacityExceeded { used, limit } if used == max_store && limit == max_store
        ));
    }

    #[test]
    fn full_write_leaves_record_untouched() {
        let dir = tempdir().unwrap();
        let config = config(1024, ENTRY_WIDTH);
        let mut segment = Segment::open(dir.path(), BASE_OFFSET, config).unwrap();
        segment.write(&mut message()).unwrap();

        let mut record = message();
        record.offset = 999;
        assert!(segment.write(&mut record).is_err());
        assert_eq!(record.offset, 999);
        assert_eq!(segment.index_size(), ENTRY_WIDTH);
    }

    #[test]
    fn segment_rebuilds_state_from_existing_files() {
        let dir = tempdir().unwrap();
        let cfg = config(1024, ENTRY_WIDTH * 10);

        let mut segment = Segment::open(dir.path(), BASE_OFFSET, cfg.clone()).unwrap();
        for i in 0..3 {
            let offset = segment.write(&mut message()).unwrap();
            assert_eq!(offset, BASE_OFFSET + i);
        }
        segment.close().unwrap();

        let segment = Segment::open(dir.path(), BASE_OFFSET, cfg).unwrap();
        assert_eq!(segment.next_offset(), BASE_OFFSET + 3);
        assert!(!segment.is_full());

        let got: Record = segment.read(BASE_OFFSET).unwrap();
        assert_eq!(got.value, message().value);
        assert_eq!(got.offset, BASE_OFFSET);
    }

    #[test]
    fn reopened_segment_continues_writing() {
        let dir = tempdir().unwrap();
        let cfg = config(1024, ENTRY_WIDTH * 10);

        let mut segment = Segment::open(dir.path(), BASE_OFFSET, cfg.clone()).unwrap();
        segment.write(&mut Record::new(b"first".to_vec())).unwrap();
        segment.close().unwrap();

        let mut segment = Segment::open(dir.path(), BASE_OFFSET, cfg).unwrap();
        let offset = segment.write(&mut Record::new(b"second".to_vec())).unwrap();
        assert_eq!(offset, BASE_OFFSET + 1);

        let first: Record = segment.read(BASE_OFFSET).unwrap();
        let second: Record = segment.read(BASE_OFFSET + 1).unwrap();
        assert_eq!(first.value, b"first");
        assert_eq!(second.value, b"second");
    }

    #[test]
    fn recovers_after_unclean_shutdown() {
        let dir = tempdir().unwrap();
        let cfg = config(1024, ENTRY_WIDTH * 10);

        let mut segment = Segment::open(dir.path(), BASE_OFFSET, cfg.clone()).unwrap();
        for _ in 0..3 {
            segment.write(&mut message()).unwrap();
        }
        segment.sync().unwrap();
        // Dropped without close: the index file keeps its zeroed tail.
        drop(segment);

        let index_len = std::fs::metadata(dir.path().join("0000000016.index"))
            .unwrap()
            .len();
        assert_eq!(index_len, ENTRY_WIDTH * 10);

        let segment = Segment::open(dir.path(), BASE_OFFSET, cfg).unwrap();
        assert_eq!(segment.next_offset(), BASE_OFFSET + 3);
        assert_eq!(segment.index_size(), ENTRY_WIDTH * 3);

        let last: Record = segment.read(BASE_OFFSET + 2).unwrap();
        assert_eq!(last.offset, BASE_OFFSET + 2);
    }

    #[test]
    fn discards_entries_past_store_end() {
        let dir = tempdir().unwrap();
        let cfg = config(1024, ENTRY_WIDTH * 10);

        let mut segment = Segment::open(dir.path(), BASE_OFFSET, cfg.clone()).unwrap();
        for _ in 0..3 {
            segment.write(&mut message()).unwrap();
        }
        let store_path = segment.store_path().to_path_buf();
        segment.close().unwrap();

        // Simulate store bytes lost from the write buffer.
        let file = std::fs::OpenOptions::new()
            .write(true)
            .open(&store_path)
            .unwrap();
        file.set_len(encoded_width()).unwrap();
        drop(file);

        let segment = Segment::open(dir.path(), BASE_OFFSET, cfg).unwrap();
        assert_eq!(segment.next_offset(), BASE_OFFSET + 1);
        assert!(segment.read::<Record>(BASE_OFFSET).is_ok());
        assert!(segment
            .read::<Record>(BASE_OFFSET + 1)
            .unwrap_err()
            .is_end_of_data());
    }

    #[test]
    fn remove_cleans_up_files() {
        let dir = tempdir().unwrap();
        let cfg = config(1024, ENTRY_WIDTH * 3);

        let mut segment = Segment::open(dir.path(), BASE_OFFSET, cfg.clone()).unwrap();
        segment.write(&mut message()).unwrap();
        let store_path = segment.store_path().to_path_buf();
        let index_path = segment.index_path().to_path_buf();

        segment.remove().unwrap();
        assert!(!store_path.exists());
        assert!(!index_path.exists());

        let segment = Segment::open(dir.path(), BASE_OFFSET, cfg).unwrap();
        assert_eq!(segment.next_offset(), BASE_OFFSET);
        assert!(!segment.is_full());
    }

    #[test]
    fn remove_tolerates_missing_files() {
        let dir = tempdir().unwrap();
        let segment = Segment::open(dir.path(), BASE_OFFSET, Config::default()).unwrap();

        std::fs::remove_file(segment.store_path()).unwrap();
        assert!(segment.remove().is_ok());
    }

    #[test]
    fn read_before_base_offset_fails() {
        let dir = tempdir().unwrap();
        let config = config(1024, ENTRY_WIDTH * 3);
        let segment = Segment::open(dir.path(), BASE_OFFSET, config).unwrap();

        let err = segment.read::<Record>(BASE_OFFSET - 1).unwrap_err();
        assert!(err.is_invalid_offset());

        let err = segment.read::<Record>(0).unwrap_err();
        assert!(matches!(
            err,
            LogError::InvalidOffset {
                offset: 0,
                base_offset: BASE_OFFSET
            }
        ));
    }

    #[test]
    fn reachable_entries_are_dense_and_stored() {
        assert!(is_reachable_entry(0, 0, 0, LEN_WIDTH));
        assert!(is_reachable_entry(2, 2, 40, 48));
        assert!(!is_reachable_entry(2, 7, 40, 48));
        assert!(!is_reachable_entry(2, 2, 41, 48));
        assert!(!is_reachable_entry(0, 0, 0, 0));
    }

    #[test]
    fn open_rejects_next_offset_overflow() {
        let dir = tempdir().unwrap();
        let base_offset = u64::MAX;
        // One empty entry at relative offset 0: the next offset would be
        // u64::MAX + 1.
        std::fs::write(
            dir.path().join(segment_file_name(base_offset, STORE_EXTENSION)),
            0u64.to_be_bytes(),
        )
        .unwrap();
        std::fs::write(
            dir.path().join(segment_file_name(base_offset, INDEX_EXTENSION)),
            [0u8; ENTRY_WIDTH as usize],
        )
        .unwrap();

        let err = Segment::open(dir.path(), base_offset, Config::default()).unwrap_err();
        assert!(matches!(err, LogError::Corrupted { .. }));
    }

    #[test]
    fn write_at_last_offset_is_capacity_exceeded() {
        let dir = tempdir().unwrap();
        let mut segment = Segment::open(dir.path(), u64::MAX, Config::default()).unwrap();

        let mut record = message();
        let err = segment.write(&mut record).unwrap_err();
        assert!(err.is_capacity_exceeded());
        assert_eq!(record.offset, 0);
        assert_eq!(segment.store_size(), 0);
        assert_eq!(segment.next_offset(), u64::MAX);
    }

    #[test]
    fn read_unwritten_offset_fails() {
        let dir = tempdir().unwrap();
        let mut segment = Segment::open(dir.path(), BASE_OFFSET, Config::default()).unwrap();
        segment.write(&mut message()).unwrap();

        let err = segment.read::<Record>(BASE_OFFSET + 1).unwrap_err();
        assert!(err.is_end_of_data());
    }

    #[test]
    fn read_raw_returns_encoded_bytes() {
        let dir = tempdir().unwrap();
        let mut segment = Segment::open(dir.path(), BASE_OFFSET, Config::default()).unwrap();

        let mut record = message();
        let offset = segment.write(&mut record).unwrap();

        assert_eq!(segment.read_raw(offset).unwrap(), record.encode().unwrap());
    }

    /// Encodes like [`Record`] but refuses to decode.
    #[derive(Debug, Default)]
    struct Undecodable(Record);

    impl Encode for Undecodable {
        fn encode(&self) -> CodecResult<Vec<u8>> {
            self.0.encode()
        }
    }

    impl Decode for Undecodable {
        fn decode(_bytes: &[u8]) -> CodecResult<Self> {
            Err(CodecError::decoding_failed("refused"))
        }
    }

    impl LogRecord for Undecodable {
        fn offset(&self) -> u64 {
            self.0.offset
        }

        fn set_offset(&mut self, offset: u64) {
            self.0.offset = offset;
        }
    }

    #[test]
    fn decode_failure_propagates() {
        let dir = tempdir().unwrap();
        let mut segment = Segment::open(dir.path(), BASE_OFFSET, Config::default()).unwrap();

        let offset = segment.write(&mut Undecodable(message())).unwrap();
        let err = segment.read::<Undecodable>(offset).unwrap_err();
        assert!(matches!(err, LogError::Codec(CodecError::DecodingFailed { .. })));
    }

    #[test]
    fn concurrent_readers_see_completed_writes() {
        let dir = tempdir().unwrap();
        let segment = Segment::open(dir.path(), BASE_OFFSET, Config::default()).unwrap();
        let segment = Arc::new(RwLock::new(segment));

        let writer = {
            let segment = Arc::clone(&segment);
            std::thread::spawn(move || {
                for i in 0..100u32 {
                    let mut record = Record::new(i.to_be_bytes().to_vec());
                    segment.write().write(&mut record).unwrap();
                }
            })
        };

        let readers: Vec<_> = (0..3)
            .map(|_| {
                let segment = Arc::clone(&segment);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        let guard = segment.read();
                        let next = guard.next_offset();
                        if next > BASE_OFFSET {
                            let last: Record = guard.read(next - 1).unwrap();
                            assert_eq!(last.offset, next - 1);
                        }
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }

        let guard = segment.read();
        assert_eq!(guard.len(), 100);
        let last: Record = guard.read(BASE_OFFSET + 99).unwrap();
        assert_eq!(last.value, 99u32.to_be_bytes());
    }
}
