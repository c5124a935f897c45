//! Error types for seglog core.

use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in log operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Store or index error.
    #[error("storage error: {0}")]
    Storage(#[from] seglog_storage::StorageError),

    /// Record codec error.
    #[error("codec error: {0}")]
    Codec(#[from] seglog_codec::CodecError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// No live segment covers the requested offset.
    #[error("offset out of range: {offset}")]
    OffsetOutOfRange {
        /// The requested offset.
        offset: u64,
    },

    /// The log holds no segments (it was closed).
    #[error("no segments available")]
    NoSegments,

    /// The configuration cannot be used.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the problem.
        message: String,
    },
}

impl CoreError {
    /// Creates an offset out of range error.
    pub fn offset_out_of_range(offset: u64) -> Self {
        Self::OffsetOutOfRange { offset }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Returns `true` for [`CoreError::OffsetOutOfRange`].
    #[must_use]
    pub fn is_out_of_range(&self) -> bool {
        matches!(self, Self::OffsetOutOfRange { .. })
    }
}
