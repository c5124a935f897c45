//! # seglog Codec
//!
//! Record model and serializer for seglog.
//!
//! The log core treats record bytes as opaque. This crate is the single
//! place that turns a [`Record`] into bytes and back, using CBOR via
//! `ciborium`.
//!
//! ## Usage
//!
//! ```
//! use seglog_codec::{Decode, Encode, Record};
//!
//! let record = Record::new(&b"hello world"[..]).with_offset(7);
//! let bytes = record.encode().unwrap();
//!
//! let decoded = Record::decode(&bytes).unwrap();
//! assert_eq!(decoded, record);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod record;

pub use error::{CodecError, CodecResult};
pub use record::Record;

/// Trait for types that can be encoded to bytes.
pub trait Encode {
    /// Encode this value to bytes.
    fn encode(&self) -> CodecResult<Vec<u8>>;
}

/// Trait for types that can be decoded from bytes.
pub trait Decode: Sized {
    /// Decode this value from bytes.
    fn decode(bytes: &[u8]) -> CodecResult<Self>;
}
