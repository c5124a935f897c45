//! Segments: one store plus one index over a contiguous offset range.
//!
//! A segment owns the half-open range `[base_offset, next_offset)`. The
//! store holds the encoded records, the index maps `offset - base_offset`
//! to the store position of each record.
//!
//! ## Recovery
//!
//! `next_offset` is derived from the index alone. Before that, trailing
//! index entries whose record does not fit inside the store are dropped;
//! they can only exist if the process died between the index write and the
//! store flush. Store bytes that no index entry points at (a store append
//! whose index write never happened) stay orphaned and are never read.

use crate::config::SegmentConfig;
use crate::dir;
use crate::error::{CoreError, CoreResult};
use seglog_codec::{Decode, Encode, Record};
use seglog_storage::{Index, StorageError, Store};
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

/// Point-in-time description of a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentInfo {
    /// First offset the segment may hold.
    pub base_offset: u64,
    /// Offset the next appended record receives.
    pub next_offset: u64,
    /// Store size in bytes.
    pub store_size: u64,
    /// Number of index entries.
    pub index_entries: u64,
    /// Whether the segment has reached a size limit.
    pub maxed: bool,
}

impl SegmentInfo {
    /// Number of records in the segment.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.next_offset - self.base_offset
    }

    /// Returns `true` if the segment holds no record.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A store and an index covering `[base_offset, next_offset)`.
pub struct Segment {
    store: Arc<Store>,
    index: Index,
    base_offset: u64,
    next_offset: u64,
    config: SegmentConfig,
}

impl Segment {
    /// Opens or creates the segment starting at `base_offset` in `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if either file cannot be opened or the index cannot
    /// be mapped.
    pub fn open(dir: &Path, base_offset: u64, config: &SegmentConfig) -> CoreResult<Self> {
        let store = Store::open(&dir::store_path(dir, base_offset))?;
        let mut index = Index::open(&dir::index_path(dir, base_offset), config.max_index_bytes)?;

        drop_dangling_entries(&store, &mut index)?;

        let next_offset = match index.last() {
            Ok((relative, _)) => base_offset + u64::from(relative) + 1,
            Err(StorageError::EndOfIndex) => base_offset,
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(
            base_offset,
            next_offset,
            store_size = store.size(),
            "opened segment"
        );

        Ok(Self {
            store: Arc::new(store),
            index,
            base_offset,
            next_offset,
            config: *config,
        })
    }

    /// Returns the first offset this segment may hold.
    #[must_use]
    pub fn base_offset(&self) -> u64 {
        self.base_offset
    }

    /// Returns the offset the next appended record receives.
    #[must_use]
    pub fn next_offset(&self) -> u64 {
        self.next_offset
    }

    /// Returns `true` if `offset` has been appended to this segment.
    #[must_use]
    pub fn contains(&self, offset: u64) -> bool {
        self.base_offset <= offset && offset < self.next_offset
    }

    /// Returns a shared handle to the store for raw reads.
    #[must_use]
    pub fn store(&self) -> Arc<Store> {
        Arc::clone(&self.store)
    }

    /// Returns a snapshot of the segment's state.
    #[must_use]
    pub fn info(&self) -> SegmentInfo {
        SegmentInfo {
            base_offset: self.base_offset,
            next_offset: self.next_offset,
            store_size: self.store.size(),
            index_entries: self.index.entries(),
            maxed: self.is_maxed(),
        }
    }

    /// Appends a record, stamping it with the assigned offset.
    ///
    /// A full index is reported before anything is written. If the index
    /// write fails after the store append, the store keeps the record bytes
    /// but no offset is consumed.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::OutOfSpace`] (wrapped) if the index is full,
    /// or any encode or write error.
    pub fn append(&mut self, record: &mut Record) -> CoreResult<u64> {
        let offset = self.next_offset;
        let relative = u32::try_from(offset - self.base_offset)
            .ok()
            .filter(|_| !self.index.is_full())
            .ok_or(StorageError::OutOfSpace {
                capacity: self.index.capacity(),
            })?;

        record.offset = offset;
        let bytes = record.encode()?;

        let (_, position) = self.store.append(&bytes)?;
        self.index.write(relative, position)?;
        self.next_offset += 1;

        Ok(offset)
    }

    /// Reads the record at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::OffsetOutOfRange`] if the segment does not hold
    /// `offset`, or a storage or decode error.
    pub fn read(&self, offset: u64) -> CoreResult<Record> {
        if !self.contains(offset) {
            return Err(CoreError::offset_out_of_range(offset));
        }
        let relative = u32::try_from(offset - self.base_offset)
            .map_err(|_| CoreError::offset_out_of_range(offset))?;

        let (_, position) = self.index.read(relative).map_err(|e| match e {
            StorageError::EndOfIndex => CoreError::offset_out_of_range(offset),
            other => other.into(),
        })?;

        let bytes = self.store.read(position)?;
        Ok(Record::decode(&bytes)?)
    }

    /// Returns `true` once the store or the index has reached its limit.
    #[must_use]
    pub fn is_maxed(&self) -> bool {
        self.store.size() >= self.config.max_store_bytes
            || self.index.size() >= self.config.max_index_bytes
            || self.index.is_full()
    }

    /// Closes the store and then the index.
    ///
    /// Both are attempted; the first failure is returned.
    pub fn close(self) -> CoreResult<()> {
        let Self {
            store,
            index,
            base_offset,
            ..
        } = self;

        let store_result = store.close();
        let index_result = index.close();

        tracing::debug!(base_offset, "closed segment");

        store_result?;
        index_result?;
        Ok(())
    }

    /// Closes the segment and deletes both of its files.
    ///
    /// Every step is attempted; the first failure is returned.
    pub fn remove(self) -> CoreResult<()> {
        let base_offset = self.base_offset;
        let store_path = self.store.path().to_path_buf();
        let index_path = self.index.path().to_path_buf();

        let closed = self.close();
        let store_removed = remove_file(&store_path);
        let index_removed = remove_file(&index_path);

        tracing::debug!(base_offset, "removed segment");

        closed?;
        store_removed?;
        index_removed?;
        Ok(())
    }
}

impl std::fmt::Debug for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Segment")
            .field("base_offset", &self.base_offset)
            .field("next_offset", &self.next_offset)
            .field("store_size", &self.store.size())
            .field("index_entries", &self.index.entries())
            .finish_non_exhaustive()
    }
}

fn remove_file(path: &Path) -> CoreResult<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
        _ => Ok(()),
    }
}

/// Drops trailing index entries whose record is not fully in the store.
fn drop_dangling_entries(store: &Store, index: &mut Index) -> CoreResult<()> {
    loop {
        let (relative, position) = match index.last() {
            Ok(entry) => entry,
            Err(StorageError::EndOfIndex) => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        match store.read(position) {
            Ok(_) => return Ok(()),
            Err(StorageError::ReadPastEnd { .. }) => {
                tracing::warn!(
                    path = %index.path().display(),
                    relative,
                    position,
                    store_size = store.size(),
                    "dropping index entry past end of store"
                );
                index.truncate(u64::from(relative));
            }
            Err(e) => return Err(e.into()),
        }
    }
}
