//! Memory-mapped offset index.

use crate::error::{StorageError, StorageResult};
use memmap2::MmapMut;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// Width of the relative offset field.
pub const OFFSET_WIDTH: u64 = 4;
/// Width of the store position field.
pub const POSITION_WIDTH: u64 = 8;
/// Width of one index entry.
pub const ENTRY_WIDTH: u64 = OFFSET_WIDTH + POSITION_WIDTH;

/// A fixed-capacity index mapping relative offsets to store positions.
///
/// Entries are 12 bytes, big-endian, appended densely:
///
/// ```text
/// | relative_offset (4) | position (8) |
/// ```
///
/// Entry `i` always carries relative offset `i`.
///
/// # Capacity
///
/// The backing file is grown to its full capacity before it is mapped so
/// that every write lands inside the mapping. [`Index::close`] shrinks the
/// file back to the bytes actually written, so a cleanly closed index file
/// is exactly `entries * 12` bytes long.
///
/// # Recovery
///
/// An index that was never closed is still at full capacity, zero-filled
/// past its real entries. On open the logical size is cut back to the dense
/// prefix of entries whose relative offset matches their slot. In such a
/// file a single zero entry in slot 0 reads as unwritten, so an unclosed
/// index holding exactly one entry reopens empty.
#[derive(Debug)]
pub struct Index {
    path: PathBuf,
    file: File,
    mmap: Option<MmapMut>,
    size: u64,
    closed: bool,
}

impl Index {
    /// Opens or creates an index with room for `max_index_bytes`.
    ///
    /// An existing file longer than `max_index_bytes` keeps its length as
    /// capacity so no written entry is lost.
    ///
    /// # Errors
    ///
    /// Returns an error if `max_index_bytes` cannot hold a single entry, or
    /// if the file cannot be opened, resized, or mapped.
    pub fn open(path: &Path, max_index_bytes: u64) -> StorageResult<Self> {
        if max_index_bytes < ENTRY_WIDTH {
            return Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!(
                    "index capacity {max_index_bytes} is smaller than one entry ({ENTRY_WIDTH} bytes)"
                ),
            )));
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        let on_disk = file.metadata()?.len();
        if on_disk > max_index_bytes {
            tracing::warn!(
                path = %path.display(),
                on_disk,
                max_index_bytes,
                "index larger than configured capacity, keeping on-disk size"
            );
        }
        let capacity = max_index_bytes.max(on_disk);
        file.set_len(capacity)?;

        // SAFETY: the file is open read/write and stays owned by this index
        // for the whole lifetime of the mapping. The mapping is dropped in
        // `finish` before the file is truncated, and every access is bounds
        // checked against `size`, which never exceeds the mapped length.
        #[allow(unsafe_code)]
        let mmap = unsafe { MmapMut::map_mut(&file)? };

        let size = recover_size(&mmap, on_disk, path);

        Ok(Self {
            path: path.to_path_buf(),
            file,
            mmap: Some(mmap),
            size,
            closed: false,
        })
    }

    /// Returns the path to the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the logical size in bytes (`entries * 12`).
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Returns the number of entries written.
    #[must_use]
    pub fn entries(&self) -> u64 {
        self.size / ENTRY_WIDTH
    }

    /// Returns the mapped capacity in bytes.
    #[must_use]
    pub fn capacity(&self) -> u64 {
        self.map().len() as u64
    }

    /// Returns `true` if another entry would not fit.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.size + ENTRY_WIDTH > self.capacity()
    }

    /// Returns `true` if no entry has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Appends an entry.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::OutOfSpace`] when the index is full. This
    /// signals that the owning segment is maxed rather than a failure.
    pub fn write(&mut self, relative_offset: u32, position: u64) -> StorageResult<()> {
        let capacity = self.capacity();
        if self.size + ENTRY_WIDTH > capacity {
            return Err(StorageError::OutOfSpace { capacity });
        }

        let start = self.size as usize;
        let mid = start + OFFSET_WIDTH as usize;
        let end = start + ENTRY_WIDTH as usize;

        let map = self.map_mut();
        map[start..mid].copy_from_slice(&relative_offset.to_be_bytes());
        map[mid..end].copy_from_slice(&position.to_be_bytes());

        self.size += ENTRY_WIDTH;
        Ok(())
    }

    /// Reads the entry for `relative_offset`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::EndOfIndex`] if the index is empty or holds
    /// no entry for `relative_offset`.
    pub fn read(&self, relative_offset: u32) -> StorageResult<(u32, u64)> {
        if self.size == 0 {
            return Err(StorageError::EndOfIndex);
        }
        self.entry(relative_offset)
    }

    /// Reads the most recently written entry.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::EndOfIndex`] if the index is empty.
    pub fn last(&self) -> StorageResult<(u32, u64)> {
        if self.size == 0 {
            return Err(StorageError::EndOfIndex);
        }
        let last = u32::try_from(self.entries() - 1)
            .map_err(|_| StorageError::Corrupted("index entry count overflows u32".into()))?;
        self.entry(last)
    }

    /// Drops every entry past the first `entries`.
    ///
    /// Used by recovery to forget entries that point past the end of the
    /// store. Has no effect if the index already holds fewer entries.
    pub fn truncate(&mut self, entries: u64) {
        self.size = self.size.min(entries * ENTRY_WIDTH);
    }

    /// Flushes the mapping to the file without closing.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush fails.
    pub fn sync(&self) -> StorageResult<()> {
        if let Some(mmap) = &self.mmap {
            mmap.flush()?;
        }
        Ok(())
    }

    /// Syncs the mapping and the file, then shrinks the file to the bytes
    /// actually written.
    ///
    /// # Errors
    ///
    /// Returns the first failing step.
    pub fn close(mut self) -> StorageResult<()> {
        self.finish()
    }

    fn finish(&mut self) -> StorageResult<()> {
        self.closed = true;

        // Sync before truncating: cutting the file first could drop pages
        // the mapping has not written back yet. Every step runs even if an
        // earlier one failed; the first error wins.
        let flushed = match self.mmap.take() {
            Some(mmap) => mmap.flush(),
            None => Ok(()),
        };
        let synced = self.file.sync_all();
        let shrunk = self.file.set_len(self.size);
        let resynced = self.file.sync_all();

        flushed?;
        synced?;
        shrunk?;
        resynced?;
        Ok(())
    }

    fn entry(&self, relative_offset: u32) -> StorageResult<(u32, u64)> {
        let start = u64::from(relative_offset) * ENTRY_WIDTH;
        if start + ENTRY_WIDTH > self.size {
            return Err(StorageError::EndOfIndex);
        }
        Ok(decode_entry(self.map(), start as usize))
    }

    fn map(&self) -> &[u8] {
        self.mmap.as_deref().unwrap_or(&[])
    }

    fn map_mut(&mut self) -> &mut [u8] {
        self.mmap.as_deref_mut().unwrap_or(&mut [])
    }
}

impl Drop for Index {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(e) = self.finish() {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to close index on drop");
        }
    }
}

fn decode_entry(map: &[u8], start: usize) -> (u32, u64) {
    let mid = start + OFFSET_WIDTH as usize;
    let end = start + ENTRY_WIDTH as usize;

    let mut offset = [0u8; OFFSET_WIDTH as usize];
    offset.copy_from_slice(&map[start..mid]);
    let mut position = [0u8; POSITION_WIDTH as usize];
    position.copy_from_slice(&map[mid..end]);

    (u32::from_be_bytes(offset), u64::from_be_bytes(position))
}

/// Rebuilds the logical size from the bytes that were on disk at open.
fn recover_size(map: &[u8], on_disk: u64, path: &Path) -> u64 {
    if on_disk % ENTRY_WIDTH != 0 {
        tracing::warn!(
            path = %path.display(),
            on_disk,
            "index length is not a whole number of entries, dropping torn tail"
        );
    }

    let candidates = on_disk / ENTRY_WIDTH;
    let mut valid = 0u64;
    while valid < candidates {
        let (offset, _) = decode_entry(map, (valid * ENTRY_WIDTH) as usize);
        if u64::from(offset) != valid {
            break;
        }
        valid += 1;
    }

    // A file still longer than one entry was never shrunk by `close`. Slot 0
    // of such a file is zero whether or not it was written, and a lone
    // (0, 0) there cannot be told apart from preallocated space.
    if valid == 1 && candidates > 1 && decode_entry(map, 0) == (0, 0) {
        valid = 0;
    }

    if valid < candidates {
        tracing::warn!(
            path = %path.display(),
            kept = valid,
            dropped = candidates - valid,
            "index was not closed cleanly, dropping unwritten entries"
        );
    }

    valid * ENTRY_WIDTH
}
