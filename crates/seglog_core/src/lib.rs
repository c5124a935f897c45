//! # seglog Core
//!
//! A segmented, append-only commit log.
//!
//! This crate provides:
//! - [`Log`]: ordered records addressed by a monotonically increasing
//!   offset, with size-based segment rotation, truncation, and a raw
//!   byte reader for snapshot transfer
//! - [`Segment`]: one record store plus one offset index over a
//!   contiguous offset range
//! - [`Config`]: segment size limits and the initial offset
//!
//! Records are serialized by `seglog_codec`; the bytes on disk are laid
//! out by `seglog_storage`.
//!
//! ## Example
//!
//! ```rust
//! use seglog_core::{Config, Log, Record};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let log = Log::open(dir.path(), Config::new().max_store_bytes(4096)).unwrap();
//!
//! for value in ["a", "b", "c"] {
//!     log.append(Record::new(value.as_bytes().to_vec())).unwrap();
//! }
//!
//! assert_eq!(log.lowest_offset().unwrap(), 0);
//! assert_eq!(log.highest_offset().unwrap(), 2);
//! assert_eq!(&log.read(1).unwrap().value[..], b"b");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
pub mod dir;
mod error;
mod log;
mod segment;

pub use config::{Config, SegmentConfig, DEFAULT_MAX_INDEX_BYTES, DEFAULT_MAX_STORE_BYTES};
pub use error::{CoreError, CoreResult};
pub use log::{Log, LogReader};
pub use segment::{Segment, SegmentInfo};
pub use seglog_codec::{Decode, Encode, Record};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
