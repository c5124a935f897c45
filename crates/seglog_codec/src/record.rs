//! The record model stored in a log.

use crate::error::{CodecError, CodecResult};
use crate::{Decode, Encode};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A single log record.
///
/// `offset` is assigned by the log at append time; whatever the caller puts
/// there is overwritten.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Opaque payload.
    pub value: Bytes,
    /// Logical offset stamped on append.
    pub offset: u64,
}

impl Record {
    /// Creates a record with the given payload and offset 0.
    #[must_use]
    pub fn new(value: impl Into<Bytes>) -> Self {
        Self {
            value: value.into(),
            offset: 0,
        }
    }

    /// Returns the record with `offset` set.
    #[must_use]
    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }
}

impl Encode for Record {
    fn encode(&self) -> CodecResult<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.value.len() + 16);
        ciborium::into_writer(self, &mut buf)
            .map_err(|e| CodecError::encoding_failed(e.to_string()))?;
        Ok(buf)
    }
}

impl Decode for Record {
    fn decode(bytes: &[u8]) -> CodecResult<Self> {
        ciborium::from_reader(bytes).map_err(|e| CodecError::decoding_failed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_record() {
        let record = Record::new(&b"hello world"[..]).with_offset(42);
        let bytes = record.encode().unwrap();
        let decoded = Record::decode(&bytes).unwrap();
        assert_eq!(record, decoded);
    }

    #[test]
    fn value_is_a_byte_string() {
        let record = Record::new(vec![0xCA, 0xFE]);
        let bytes = record.encode().unwrap();

        // CBOR major type 2, length 2, followed by the raw payload.
        let needle = [0x42, 0xCA, 0xFE];
        assert!(bytes.windows(needle.len()).any(|w| w == needle));
    }

    #[test]
    fn empty_value() {
        let record = Record::default();
        let decoded = Record::decode(&record.encode().unwrap()).unwrap();
        assert!(decoded.value.is_empty());
        assert_eq!(decoded.offset, 0);
    }

    #[test]
    fn decode_garbage_fails() {
        let result = Record::decode(&[0xFF, 0x00, 0x13]);
        assert!(matches!(result, Err(CodecError::DecodingFailed { .. })));
    }

    #[test]
    fn decode_truncated_fails() {
        let bytes = Record::new(&b"hello world"[..]).encode().unwrap();
        let result = Record::decode(&bytes[..bytes.len() - 3]);
        assert!(result.is_err());
    }
}
