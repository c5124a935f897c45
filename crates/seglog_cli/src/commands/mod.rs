//! CLI command implementations.

pub mod append;
pub mod dump;
pub mod inspect;
pub mod read;
pub mod truncate;
pub mod verify;

use seglog_core::Record;
use serde::Serialize;

/// Record representation for output.
#[derive(Debug, Serialize)]
pub struct RecordInfo {
    /// Logical offset.
    pub offset: u64,
    /// Payload size in bytes.
    pub size: usize,
    /// Payload as UTF-8 when it is valid UTF-8.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Payload hex-encoded when it is not valid UTF-8.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hex: Option<String>,
}

impl From<&Record> for RecordInfo {
    fn from(record: &Record) -> Self {
        let (text, hex) = match std::str::from_utf8(&record.value) {
            Ok(text) => (Some(text.to_owned()), None),
            Err(_) => (None, Some(hex(&record.value))),
        };
        Self {
            offset: record.offset,
            size: record.value.len(),
            text,
            hex,
        }
    }
}

impl std::fmt::Display for RecordInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:>6}] {:>5} bytes  ", self.offset, self.size)?;
        match (&self.text, &self.hex) {
            (Some(text), _) => write!(f, "{text:?}"),
            (None, Some(hex)) => write!(f, "0x{hex}"),
            (None, None) => Ok(()),
        }
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Formats a byte count for humans, unit included.
pub fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} bytes", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_info_text() {
        let record = Record::new(&b"hello"[..]).with_offset(7);
        let info = RecordInfo::from(&record);
        assert_eq!(info.offset, 7);
        assert_eq!(info.size, 5);
        assert_eq!(info.text.as_deref(), Some("hello"));
        assert!(info.hex.is_none());
    }

    #[test]
    fn record_info_binary() {
        let record = Record::new(vec![0xff, 0x00, 0x10]);
        let info = RecordInfo::from(&record);
        assert!(info.text.is_none());
        assert_eq!(info.hex.as_deref(), Some("ff0010"));
        assert!(info.to_string().ends_with("0xff0010"));
    }

    #[test]
    fn sizes() {
        assert_eq!(format_size(512), "512 bytes");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }
}
