//! The segmented commit log.
//!
//! A [`Log`] is an ordered list of [`Segment`]s sorted by base offset. The
//! last segment is the active one and receives every append; when it
//! reaches a size limit a new segment starting at the next offset takes
//! over. All older segments are read-only.
//!
//! ## Locking
//!
//! One reader/writer lock guards the segment list:
//!
//! - `append`, `truncate`, `close`, `remove` and `reset` take it exclusively
//! - `read`, `lowest_offset`, `highest_offset`, `reader` and `segments`
//!   share it
//!
//! Rotation and truncation are therefore atomic with respect to readers.

mod reader;

pub use reader::LogReader;

use crate::config::Config;
use crate::dir;
use crate::error::{CoreError, CoreResult};
use crate::segment::{Segment, SegmentInfo};
use parking_lot::RwLock;
use seglog_codec::Record;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A durable, append-only sequence of records addressed by offset.
///
/// # Example
///
/// ```rust
/// use seglog_core::{Config, Log, Record};
///
/// let dir = tempfile::tempdir().unwrap();
/// let log = Log::open(dir.path(), Config::default()).unwrap();
///
/// let offset = log.append(Record::new(&b"hello world"[..])).unwrap();
/// assert_eq!(offset, 0);
/// assert_eq!(&log.read(offset).unwrap().value[..], b"hello world");
/// ```
pub struct Log {
    dir: PathBuf,
    config: Config,
    segments: RwLock<Vec<Segment>>,
}

impl Log {
    /// Opens the log stored in `dir`, creating it if needed.
    ///
    /// Zero size limits in `config` are replaced with the defaults. Existing
    /// segments are reopened in offset order; an empty directory gets one
    /// segment at `config.segment.initial_offset`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or any segment
    /// fails to open. No partially opened log is returned.
    pub fn open(dir: impl AsRef<Path>, config: Config) -> CoreResult<Self> {
        let config = config.with_defaults();
        config.validate()?;

        let dir = dir.as_ref().to_path_buf();
        let segments = setup(&dir, &config)?;

        tracing::info!(
            dir = %dir.display(),
            segments = segments.len(),
            lowest = segments.first().map(Segment::base_offset),
            next = segments.last().map(Segment::next_offset),
            "opened log"
        );

        Ok(Self {
            dir,
            config,
            segments: RwLock::new(segments),
        })
    }

    /// Returns the log directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the effective configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Appends a record and returns the offset assigned to it.
    ///
    /// If the active segment is maxed afterwards, a new segment starting at
    /// `offset + 1` becomes active.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NoSegments`] on a closed log, or any segment
    /// append or rotation error. A rotation error is reported even though
    /// the record itself was appended.
    pub fn append(&self, mut record: Record) -> CoreResult<u64> {
        let mut segments = self.segments.write();

        let active = segments.last().ok_or(CoreError::NoSegments)?;
        if active.is_maxed() {
            // Only reachable when a maxed segment was reopened as the tail.
            let base = active.next_offset();
            self.rotate(&mut segments, base)?;
        }

        let active = segments.last_mut().ok_or(CoreError::NoSegments)?;
        let offset = active.append(&mut record)?;

        if active.is_maxed() {
            self.rotate(&mut segments, offset + 1)?;
        }

        Ok(offset)
    }

    /// Reads the record at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::OffsetOutOfRange`] if no live segment holds
    /// `offset`, or a storage or decode error.
    pub fn read(&self, offset: u64) -> CoreResult<Record> {
        let segments = self.segments.read();

        let covering = segments.partition_point(|s| s.base_offset() <= offset);
        let segment = covering
            .checked_sub(1)
            .map(|i| &segments[i])
            .filter(|s| offset < s.next_offset())
            .ok_or(CoreError::offset_out_of_range(offset))?;

        segment.read(offset)
    }

    /// Returns the base offset of the oldest segment.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NoSegments`] on a closed log.
    pub fn lowest_offset(&self) -> CoreResult<u64> {
        self.segments
            .read()
            .first()
            .map(Segment::base_offset)
            .ok_or(CoreError::NoSegments)
    }

    /// Returns the offset of the newest record.
    ///
    /// For a log that has never been appended to this is one below the
    /// initial offset, saturating at zero.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NoSegments`] on a closed log.
    pub fn highest_offset(&self) -> CoreResult<u64> {
        self.segments
            .read()
            .last()
            .map(|s| s.next_offset().saturating_sub(1))
            .ok_or(CoreError::NoSegments)
    }

    /// Removes every segment whose records are all at or below `lowest`.
    ///
    /// A segment is removed when its `next_offset <= lowest + 1`. The active
    /// segment is never removed: if `lowest` covers it, it is kept and a
    /// warning is logged, so the log can still accept appends.
    ///
    /// # Errors
    ///
    /// Every eligible segment is removed even if one removal fails; the
    /// first failure is returned.
    pub fn truncate(&self, lowest: u64) -> CoreResult<()> {
        let mut segments = self.segments.write();
        let threshold = lowest.saturating_add(1);
        let active = segments.len().saturating_sub(1);

        let mut first_err = None;
        let mut kept = Vec::with_capacity(segments.len());
        let mut removed = 0usize;

        for (i, segment) in segments.drain(..).enumerate() {
            if segment.next_offset() > threshold {
                kept.push(segment);
                continue;
            }
            if i == active {
                tracing::warn!(
                    lowest,
                    base_offset = segment.base_offset(),
                    "truncation reaches the active segment, keeping it"
                );
                kept.push(segment);
                continue;
            }

            removed += 1;
            if let Err(e) = segment.remove() {
                tracing::warn!(error = %e, "failed to remove segment");
                first_err.get_or_insert(e);
            }
        }

        *segments = kept;

        if removed > 0 {
            tracing::debug!(lowest, removed, "truncated log");
            if let Err(e) = dir::sync_dir(&self.dir) {
                first_err.get_or_insert(e);
            }
        }

        first_err.map_or(Ok(()), Err)
    }

    /// Returns a raw byte stream over every segment store, oldest first.
    ///
    /// The stream covers the bytes present when this is called. Consumers
    /// parse the length-prefixed framing themselves.
    #[must_use]
    pub fn reader(&self) -> LogReader {
        let segments = self.segments.read();
        LogReader::new(segments.iter().map(Segment::store).collect())
    }

    /// Returns a snapshot of every segment, oldest first.
    #[must_use]
    pub fn segments(&self) -> Vec<SegmentInfo> {
        self.segments.read().iter().map(Segment::info).collect()
    }

    /// Closes every segment.
    ///
    /// The log holds no segments afterwards; further calls fail with
    /// [`CoreError::NoSegments`] or [`CoreError::OffsetOutOfRange`] until
    /// [`Log::reset`] is called or the log is reopened.
    ///
    /// # Errors
    ///
    /// Every segment is closed even if one fails; the first failure is
    /// returned.
    pub fn close(&self) -> CoreResult<()> {
        let mut segments = self.segments.write();
        close_all(&mut segments)
    }

    /// Closes the log and deletes its directory.
    ///
    /// # Errors
    ///
    /// The directory is deleted even if closing failed; the first failure
    /// is returned.
    pub fn remove(&self) -> CoreResult<()> {
        let mut segments = self.segments.write();
        self.remove_locked(&mut segments)
    }

    /// Deletes all data and starts over with one empty segment at the
    /// initial offset.
    ///
    /// # Errors
    ///
    /// Returns an error if removal or setup fails.
    pub fn reset(&self) -> CoreResult<()> {
        let mut segments = self.segments.write();
        self.remove_locked(&mut segments)?;
        *segments = setup(&self.dir, &self.config)?;

        tracing::info!(dir = %self.dir.display(), "reset log");
        Ok(())
    }

    fn remove_locked(&self, segments: &mut Vec<Segment>) -> CoreResult<()> {
        let closed = close_all(segments);

        match fs::remove_dir_all(&self.dir) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => return Err(e.into()),
            _ => {}
        }

        tracing::debug!(dir = %self.dir.display(), "removed log directory");
        closed
    }

    fn rotate(&self, segments: &mut Vec<Segment>, base_offset: u64) -> CoreResult<()> {
        let segment = Segment::open(&self.dir, base_offset, &self.config.segment)?;
        dir::sync_dir(&self.dir)?;
        segments.push(segment);

        tracing::debug!(base_offset, "rotated to new active segment");
        Ok(())
    }
}

impl std::fmt::Debug for Log {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Log")
            .field("dir", &self.dir)
            .field("config", &self.config)
            .field("segments", &self.segments.read().len())
            .finish()
    }
}

/// Opens every segment found in `dir`, or a fresh one at the initial offset.
fn setup(dir: &Path, config: &Config) -> CoreResult<Vec<Segment>> {
    fs::create_dir_all(dir)?;

    let mut segments = Vec::new();
    for base_offset in dir::list_base_offsets(dir)? {
        segments.push(Segment::open(dir, base_offset, &config.segment)?);
    }

    if segments.is_empty() {
        segments.push(Segment::open(
            dir,
            config.segment.initial_offset,
            &config.segment,
        )?);
        dir::sync_dir(dir)?;
    }

    Ok(segments)
}

fn close_all(segments: &mut Vec<Segment>) -> CoreResult<()> {
    let mut first_err = None;
    for segment in segments.drain(..) {
        if let Err(e) = segment.close() {
            tracing::warn!(error = %e, "failed to close segment");
            first_err.get_or_insert(e);
        }
    }
    first_err.map_or(Ok(()), Err)
}
