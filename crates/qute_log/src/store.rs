//! Append-only record store.
//!
//! A store file is a flat sequence of length-prefixed entries:
//!
//! ```text
//! | len (8, big-endian) | payload (len) | len (8) | payload (len) | ...
//! ```
//!
//! Entries are never rewritten. The position of an entry is the byte offset
//! of its length prefix and stays valid for the life of the file.

use crate::error::{LogError, LogResult};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::mem;
use std::path::{Path, PathBuf};
use tracing::{error, warn};

/// Width of the length prefix in bytes.
pub const LEN_WIDTH: u64 = 8;

/// Buffered, append-only byte storage with positional reads.
///
/// # Thread Safety
///
/// The write buffer and size are guarded by a single mutex, so appends and
/// reads on one store are linearized. A read always flushes the buffer
/// first, so a position returned by a completed `append` is readable.
///
/// # Example
///
/// ```no_run
/// use qute_log::Store;
/// use std::path::Path;
///
/// let store = Store::open(Path::new("0000000000.store")).unwrap();
/// let (_, position) = store.append(b"hello").unwrap();
/// assert_eq!(store.read(position).unwrap(), b"hello");
/// ```
#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    inner: Mutex<StoreInner>,
}

#[derive(Debug)]
struct StoreInner {
    writer: BufWriter<File>,
    size: u64,
    // Set when a failed append could not be rolled back.
    failed: bool,
}

impl StoreInner {
    fn write_entry(&mut self, payload: &[u8]) -> io::Result<()> {
        self.writer.write_all(&(payload.len() as u64).to_be_bytes())?;
        self.writer.write_all(payload)
    }

    /// Drops everything written after `position`, in the buffer or on disk.
    ///
    /// The file length plus the buffered bytes always form a prefix of the
    /// byte stream handed to the writer, so the bytes to keep are the
    /// buffered ones that still fall below `position`.
    fn rollback(&mut self, position: u64) -> io::Result<()> {
        let file = self.writer.get_ref().try_clone()?;
        let stale = mem::replace(&mut self.writer, BufWriter::new(file));
        let (mut file, buffered) = stale.into_parts();
        let buffered = buffered.unwrap_or_default();

        let file_len = file.metadata()?.len();
        if position > file_len {
            let keep = usize::try_from(position - file_len)
                .map_or(buffered.len(), |keep| keep.min(buffered.len()));
            file.write_all(&buffered[..keep])?;
        }
        file.set_len(position)
    }

    /// Reads exactly `buf.len()` bytes at `offset` after flushing.
    fn read_exact_at(&mut self, offset: u64, buf: &mut [u8]) -> LogResult<()> {
        self.writer.flush()?;

        let len = buf.len() as u64;
        match offset.checked_add(len) {
            Some(end) if end <= self.size => {}
            _ => {
                return Err(LogError::EndOfData {
                    offset,
                    len,
                    size: self.size,
                })
            }
        }

        if buf.is_empty() {
            return Ok(());
        }

        let file = self.writer.get_mut();
        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(buf)?;
        Ok(())
    }
}

impl Store {
    /// Opens or creates the store file at `path`.
    ///
    /// The size is taken from the existing file length, so reopening a
    /// store continues appending after its last entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or inspected.
    pub fn open(path: &Path) -> LogResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(path)?;

        let size = file.metadata()?.len();

        Ok(Self {
            path: path.to_path_buf(),
            inner: Mutex::new(StoreInner {
                writer: BufWriter::new(file),
                size,
                failed: false,
            }),
        })
    }

    /// Appends a length-prefixed payload.
    ///
    /// Returns `(bytes_written, position)` where `bytes_written` includes
    /// the 8-byte prefix and `position` is where the prefix begins.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails. Bytes of a failed append are
    /// discarded and the size is left unchanged. If they cannot be
    /// discarded, this and every later append fails with
    /// [`LogError::Corrupted`].
    pub fn append(&self, payload: &[u8]) -> LogResult<(u64, u64)> {
        let mut inner = self.inner.lock();
        if inner.failed {
            return Err(LogError::corrupted(format!(
                "store {} has unrecovered partial writes",
                self.path.display()
            )));
        }

        let position = inner.size;
        if let Err(e) = inner.write_entry(payload) {
            if let Err(rollback) = inner.rollback(position) {
                inner.failed = true;
                error!(
                    path = %self.path.display(),
                    position,
                    error = %rollback,
                    "failed to discard partial append"
                );
                return Err(LogError::corrupted(format!(
                    "append at {position} failed ({e}) and could not be rolled back ({rollback})"
                )));
            }
            warn!(path = %self.path.display(), position, error = %e, "append failed");
            return Err(e.into());
        }

        let written = LEN_WIDTH + payload.len() as u64;
        inner.size += written;

        Ok((written, position))
    }

    /// Reads the payload of the entry whose prefix starts at `position`.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::EndOfData`] if the prefix or the payload extends
    /// past the stored bytes, or an I/O error.
    pub fn read(&self, position: u64) -> LogResult<Vec<u8>> {
        let mut inner = self.inner.lock();

        let mut prefix = [0u8; LEN_WIDTH as usize];
        inner.read_exact_at(position, &mut prefix)?;
        let len = u64::from_be_bytes(prefix);

        // Bounds are checked before allocating so a corrupt prefix cannot
        // trigger a huge allocation.
        let start = position + LEN_WIDTH;
        if start.checked_add(len).map_or(true, |end| end > inner.size) {
            return Err(LogError::EndOfData {
                offset: start,
                len,
                size: inner.size,
            });
        }
        let len = usize::try_from(len).map_err(|_| {
            LogError::corrupted(format!("entry length {len} at {position} exceeds memory"))
        })?;

        let mut payload = vec![0u8; len];
        inner.read_exact_at(start, &mut payload)?;
        Ok(payload)
    }

    /// Reads exactly `buf.len()` raw bytes starting at `position`.
    ///
    /// Unlike [`Store::read`] this does not interpret length prefixes.
    /// Returns the number of bytes read.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::EndOfData`] if the range extends past the
    /// stored bytes, or an I/O error.
    pub fn read_range(&self, buf: &mut [u8], position: u64) -> LogResult<usize> {
        self.inner.lock().read_exact_at(position, buf)?;
        Ok(buf.len())
    }

    /// Pushes buffered writes to the OS.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush fails.
    pub fn flush(&self) -> LogResult<()> {
        self.inner.lock().writer.flush()?;
        Ok(())
    }

    /// Flushes buffered writes and fsyncs the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush or the fsync fails.
    pub fn sync(&self) -> LogResult<()> {
        let mut inner = self.inner.lock();
        inner.writer.flush()?;
        inner.writer.get_ref().sync_all()?;
        Ok(())
    }

    /// Returns the total bytes stored, including buffered bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.inner.lock().size
    }

    /// Returns the path of the store file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flushes buffered writes and closes the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the final flush fails.
    pub fn close(self) -> LogResult<()> {
        let inner = self.inner.into_inner();
        let file = inner.writer.into_inner().map_err(|e| e.into_error())?;
        drop(file);
        Ok(())
    }
}
