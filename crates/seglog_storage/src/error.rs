//! Error types for storage operations.

use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Attempted to read beyond the end of a store.
    #[error("read beyond end of store: position {position}, len {len}, size {size}")]
    ReadPastEnd {
        /// The requested read position.
        position: u64,
        /// The requested read length.
        len: u64,
        /// The current store size.
        size: u64,
    },

    /// The index holds no entry for the requested relative offset.
    ///
    /// This is a normal signal, not a failure: it is returned for an empty
    /// index and for lookups past the last written entry.
    #[error("end of index")]
    EndOfIndex,

    /// The index cannot hold another entry.
    #[error("index out of space: capacity {capacity} bytes")]
    OutOfSpace {
        /// Mapped capacity of the index in bytes.
        capacity: u64,
    },

    /// A file is corrupted.
    #[error("storage corrupted: {0}")]
    Corrupted(String),
}

impl StorageError {
    /// Returns `true` for [`StorageError::EndOfIndex`].
    #[must_use]
    pub fn is_end_of_index(&self) -> bool {
        matches!(self, Self::EndOfIndex)
    }

    /// Returns `true` for [`StorageError::OutOfSpace`].
    #[must_use]
    pub fn is_out_of_space(&self) -> bool {
        matches!(self, Self::OutOfSpace { .. })
    }
}

impl From<StorageError> for io::Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Io(e) => e,
            StorageError::ReadPastEnd { .. } | StorageError::EndOfIndex => {
                io::Error::new(io::ErrorKind::UnexpectedEof, err)
            }
            other => io::Error::new(io::ErrorKind::Other, other),
        }
    }
}
