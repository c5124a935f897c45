//! Verify command implementation.

use seglog_core::{Decode, Log, Record};
use seglog_storage::LEN_WIDTH;
use std::io::Read;

/// Verification result.
#[derive(Debug)]
pub struct VerifyResult {
    /// Number of records checked.
    pub records_checked: u64,
    /// Number of valid records.
    pub valid_records: u64,
    /// Length-prefixed frames found in the raw stream.
    pub frames: u64,
    /// Bytes read from the raw stream.
    pub stream_bytes: u64,
    /// Sum of store sizes.
    pub store_bytes: u64,
    /// List of errors found.
    pub errors: Vec<String>,
}

impl VerifyResult {
    fn new() -> Self {
        Self {
            records_checked: 0,
            valid_records: 0,
            frames: 0,
            stream_bytes: 0,
            store_bytes: 0,
            errors: Vec::new(),
        }
    }

    /// Returns `true` when no problem was found.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty() && self.records_checked == self.valid_records
    }
}

/// Checks every indexed record and the raw stream framing.
pub fn verify(log: &Log) -> Result<VerifyResult, Box<dyn std::error::Error>> {
    let mut result = VerifyResult::new();
    let segments = log.segments();

    for segment in &segments {
        for offset in segment.base_offset..segment.next_offset {
            result.records_checked += 1;
            match log.read(offset) {
                Ok(record) if record.offset == offset => result.valid_records += 1,
                Ok(record) => result.errors.push(format!(
                    "offset {offset}: record carries offset {}",
                    record.offset
                )),
                Err(e) => result.errors.push(format!("offset {offset}: {e}")),
            }
        }
    }

    result.store_bytes = segments.iter().map(|s| s.store_size).sum();

    let mut bytes = Vec::new();
    log.reader().read_to_end(&mut bytes)?;
    result.stream_bytes = bytes.len() as u64;
    if result.stream_bytes != result.store_bytes {
        result.errors.push(format!(
            "raw stream holds {} bytes, stores hold {}",
            result.stream_bytes, result.store_bytes
        ));
    }

    check_frames(&bytes, &mut result);

    Ok(result)
}

/// Walks the length-prefixed frames of a raw stream.
///
/// Frames that do not decode as records are counted but not reported:
/// orphaned bytes from an interrupted append are expected.
fn check_frames(bytes: &[u8], result: &mut VerifyResult) {
    let width = LEN_WIDTH as usize;
    let mut pos = 0usize;
    let mut undecodable = 0u64;

    while pos < bytes.len() {
        let Some(header) = bytes.get(pos..pos + width) else {
            result
                .errors
                .push(format!("truncated length prefix at stream byte {pos}"));
            return;
        };
        let mut len = [0u8; 8];
        len.copy_from_slice(header);
        let len = u64::from_be_bytes(len);

        let start = pos + width;
        let Some(frame) = usize::try_from(len)
            .ok()
            .and_then(|len| bytes.get(start..start.checked_add(len)?))
        else {
            result.errors.push(format!(
                "frame at stream byte {pos} claims {len} bytes past the end"
            ));
            return;
        };

        if Record::decode(frame).is_err() {
            undecodable += 1;
        }
        result.frames += 1;
        pos = start + frame.len();
    }

    if undecodable > 0 {
        tracing::warn!(undecodable, "raw stream holds frames that are not records");
    }
}

/// Runs the verify command.
pub fn run(log: &Log) -> Result<(), Box<dyn std::error::Error>> {
    println!("Verifying log at {}", log.dir().display());
    println!();

    let result = verify(log)?;

    println!("Records:");
    println!("  Checked: {}", result.records_checked);
    println!("  Valid:   {}", result.valid_records);
    println!("Stream:");
    println!("  Frames:  {}", result.frames);
    println!("  Bytes:   {} / {}", result.stream_bytes, result.store_bytes);

    if !result.errors.is_empty() {
        println!();
        println!("Errors:");
        for error in result.errors.iter().take(10) {
            println!("  - {}", error);
        }
        if result.errors.len() > 10 {
            println!("  ... and {} more", result.errors.len() - 10);
        }
    }

    println!();
    if result.is_ok() {
        println!("✓ Log verification passed");
        Ok(())
    } else {
        println!("✗ Log verification failed");
        Err("Verification failed".into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seglog_core::Config;
    use tempfile::tempdir;

    #[test]
    fn healthy_log_verifies() {
        let temp = tempdir().unwrap();
        let log = Log::open(temp.path(), Config::new().max_store_bytes(64)).unwrap();
        for i in 0..10u8 {
            log.append(Record::new(vec![i; 10])).unwrap();
        }

        let result = verify(&log).unwrap();
        assert!(result.is_ok(), "{:?}", result.errors);
        assert_eq!(result.records_checked, 10);
        assert_eq!(result.frames, 10);
        assert_eq!(result.stream_bytes, result.store_bytes);
    }

    #[test]
    fn truncated_frame_is_reported() {
        let mut result = VerifyResult::new();
        let mut bytes = 100u64.to_be_bytes().to_vec();
        bytes.extend_from_slice(b"short");

        check_frames(&bytes, &mut result);
        assert_eq!(result.frames, 0);
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn empty_log_verifies() {
        let temp = tempdir().unwrap();
        let log = Log::open(temp.path(), Config::default()).unwrap();
        assert!(verify(&log).unwrap().is_ok());
    }
}
