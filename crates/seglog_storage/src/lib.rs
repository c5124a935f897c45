//! # seglog Storage
//!
//! On-disk file formats for seglog segments.
//!
//! This crate provides the two files every segment is made of. It knows
//! nothing about segments, logical offsets, or record contents: the store
//! holds opaque payloads and the index maps small integers to positions.
//!
//! ## Files
//!
//! - [`Store`] - append-only, length-prefixed records, buffered writes
//! - [`Index`] - memory-mapped, fixed-width `relative offset -> position`
//!   entries
//!
//! ## Example
//!
//! ```rust
//! use seglog_storage::{Index, Store};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let store = Store::open(&dir.path().join("0.store")).unwrap();
//! let mut index = Index::open(&dir.path().join("0.index"), 1024).unwrap();
//!
//! let (_, position) = store.append(b"hello world").unwrap();
//! index.write(0, position).unwrap();
//!
//! let (_, position) = index.read(0).unwrap();
//! assert_eq!(store.read(position).unwrap(), b"hello world");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod index;
mod store;

pub use error::{StorageError, StorageResult};
pub use index::{Index, ENTRY_WIDTH, OFFSET_WIDTH, POSITION_WIDTH};
pub use store::{Store, LEN_WIDTH};
