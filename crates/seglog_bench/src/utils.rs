//! Benchmark utilities.

use rand::Rng;
use seglog_core::{Config, Log, Record};
use tempfile::TempDir;

/// Generate random record data of the specified size.
pub fn random_data(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen()).collect()
}

/// Generate records with the specified payload size.
pub fn generate_records(count: usize, payload_size: usize) -> Vec<Record> {
    (0..count)
        .map(|_| Record::new(random_data(payload_size)))
        .collect()
}

/// Opens a log in a fresh temp dir with `max_store_bytes` per segment.
///
/// The index is sized so that the store limit always triggers rotation first.
pub fn temp_log(max_store_bytes: u64) -> (TempDir, Log) {
    let dir = TempDir::new().unwrap();
    let config = Config::new()
        .max_store_bytes(max_store_bytes)
        .max_index_bytes(1024 * 1024);
    let log = Log::open(dir.path(), config).unwrap();
    (dir, log)
}

/// Opens a log and fills it with `count` records of `payload_size` bytes.
pub fn filled_log(count: usize, payload_size: usize) -> (TempDir, Log) {
    let (dir, log) = temp_log(64 * 1024);
    for record in generate_records(count, payload_size) {
        log.append(record).unwrap();
    }
    (dir, log)
}
