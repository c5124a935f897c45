//! Append-only record store.

use crate::error::{StorageError, StorageResult};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Width of the big-endian length prefix in front of every record.
pub const LEN_WIDTH: u64 = 8;

/// An append-only file of length-prefixed records.
///
/// Each record is stored as:
///
/// ```text
/// | length (8, big-endian) | payload (length) |
/// ```
///
/// # Buffering
///
/// Appends go through a [`BufWriter`]. Every read flushes the buffer first
/// while holding the store lock, so a read never misses bytes that an
/// earlier append returned a position for.
///
/// # Thread Safety
///
/// All methods take `&self`. An internal mutex serializes appends against
/// reads, which lets a store be shared (e.g. behind an `Arc`) between the
/// segment that writes it and raw readers streaming its bytes.
///
/// # Example
///
/// ```no_run
/// use seglog_storage::Store;
/// use std::path::Path;
///
/// let store = Store::open(Path::new("0.store")).unwrap();
/// let (written, position) = store.append(b"hello world").unwrap();
/// assert_eq!(written, 19);
/// assert_eq!(store.read(position).unwrap(), b"hello world");
/// ```
#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    inner: Mutex<StoreInner>,
}

#[derive(Debug)]
struct StoreInner {
    writer: BufWriter<File>,
    /// Logical size including buffered bytes; the next append lands here.
    size: u64,
    /// Set when a write failed partway and `size` may lag the file.
    needs_resync: bool,
}

impl StoreInner {
    fn write_frame(&mut self, payload: &[u8]) -> io::Result<u64> {
        let len = payload.len() as u64;
        self.writer.write_all(&len.to_be_bytes())?;
        self.writer.write_all(payload)?;
        Ok(LEN_WIDTH + len)
    }

    /// Records a failed write and tries to recover the logical size at once.
    fn mark_failed(&mut self) {
        self.needs_resync = true;
        if let Err(e) = self.resync() {
            tracing::warn!(error = %e, "store size resync failed, retrying on next append");
        }
    }

    /// Recomputes the logical size from the file and the write buffer.
    ///
    /// The file is opened in append mode, so whatever part of a failed frame
    /// reached the file or the buffer stays there as orphaned bytes and the
    /// next frame lands after it.
    fn resync(&mut self) -> io::Result<()> {
        let on_disk = self.writer.get_ref().metadata()?.len();
        self.size = on_disk + self.writer.buffer().len() as u64;
        self.needs_resync = false;
        Ok(())
    }

    fn read_exact_at(&mut self, position: u64, buf: &mut [u8]) -> io::Result<()> {
        let file = self.writer.get_mut();
        file.seek(SeekFrom::Start(position))?;
        file.read_exact(buf)
    }
}

impl Store {
    /// Opens or creates a store at the given path.
    ///
    /// An existing file is opened for reading and appending; its current
    /// length becomes the write position.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or created.
    pub fn open(path: &Path) -> StorageResult<Self> {
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
                needs_resync: false,
            }),
        })
    }

    /// Returns the path to the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the store size in bytes, buffered bytes included.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.inner.lock().size
    }

    /// Appends a record to the end of the store.
    ///
    /// Returns `(bytes_written, position)`, where `bytes_written` counts the
    /// length prefix and `position` is where the prefix starts.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffered write fails. Bytes of a failed frame
    /// that already reached the file are left in place, and the next append
    /// reports its position after them.
    pub fn append(&self, payload: &[u8]) -> StorageResult<(u64, u64)> {
        let mut inner = self.inner.lock();
        if inner.needs_resync {
            inner.resync()?;
        }
        let position = inner.size;

        match inner.write_frame(payload) {
            Ok(written) => {
                inner.size += written;
                Ok((written, position))
            }
            Err(e) => {
                inner.mark_failed();
                Err(e.into())
            }
        }
    }

    /// Reads the record whose length prefix starts at `position`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::ReadPastEnd`] if the prefix or the payload it
    /// announces extends beyond the store, or an I/O error.
    pub fn read(&self, position: u64) -> StorageResult<Vec<u8>> {
        let mut inner = self.inner.lock();
        inner.writer.flush()?;
        let size = inner.size;

        if position.saturating_add(LEN_WIDTH) > size {
            return Err(StorageError::ReadPastEnd {
                position,
                len: LEN_WIDTH,
                size,
            });
        }

        let mut header = [0u8; LEN_WIDTH as usize];
        inner.read_exact_at(position, &mut header)?;
        let len = u64::from_be_bytes(header);

        let payload_pos = position + LEN_WIDTH;
        if payload_pos.saturating_add(len) > size {
            return Err(StorageError::ReadPastEnd {
                position: payload_pos,
                len,
                size,
            });
        }

        let len = usize::try_from(len).map_err(|_| {
            StorageError::Corrupted(format!("record at {position} too large: {len} bytes"))
        })?;
        let mut payload = vec![0u8; len];
        inner.read_exact_at(payload_pos, &mut payload)?;

        Ok(payload)
    }

    /// Reads raw bytes starting at `offset` into `buf`.
    ///
    /// No framing is interpreted. Returns the number of bytes read, which is
    /// less than `buf.len()` only when the end of the store is reached and
    /// zero at or past the end.
    ///
    /// # Errors
    ///
    /// Returns an error if flushing or reading fails.
    pub fn read_at(&self, buf: &mut [u8], offset: u64) -> StorageResult<usize> {
        let mut inner = self.inner.lock();
        inner.writer.flush()?;

        if offset >= inner.size || buf.is_empty() {
            return Ok(0);
        }

        let file = inner.writer.get_mut();
        file.seek(SeekFrom::Start(offset))?;

        let mut filled = 0;
        while filled < buf.len() {
            match file.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Ok(filled)
    }

    /// Pushes buffered bytes to the OS.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush fails.
    pub fn flush(&self) -> StorageResult<()> {
        self.inner.lock().writer.flush()?;
        Ok(())
    }

    /// Flushes buffered bytes and syncs the file to durable storage.
    ///
    /// The file handle itself is released when the store is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush or the sync fails.
    pub fn close(&self) -> StorageResult<()> {
        let mut inner = self.inner.lock();
        inner.writer.flush()?;
        inner.writer.get_ref().sync_all()?;
        Ok(())
    }
}
