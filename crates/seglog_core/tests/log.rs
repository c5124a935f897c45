//! End-to-end log scenarios: rotation, truncation, recovery, concurrency.

use seglog_core::{Config, CoreError, Decode, Encode, Log, Record};
use seglog_storage::{Index, Store, LEN_WIDTH};
use std::fs;
use std::io::Read;
use std::sync::Arc;
use std::thread;
use tempfile::tempdir;

fn hello() -> Record {
    Record::new(&b"hello world"[..])
}

/// Splits a raw log stream into its length-prefixed frames.
fn frames(bytes: &[u8]) -> Vec<&[u8]> {
    let mut frames = Vec::new();
    let mut pos = 0usize;
    let width = LEN_WIDTH as usize;
    while pos + width <= bytes.len() {
        let mut len = [0u8; 8];
        len.copy_from_slice(&bytes[pos..pos + width]);
        let len = u64::from_be_bytes(len) as usize;
        frames.push(&bytes[pos + width..pos + width + len]);
        pos += width + len;
    }
    assert_eq!(pos, bytes.len(), "stream ends on a frame boundary");
    frames
}

#[test]
fn hello_world_scenario() {
    let temp = tempdir().unwrap();
    let log = Log::open(temp.path(), Config::new().max_store_bytes(32)).unwrap();

    let offsets: Vec<u64> = (0..3).map(|_| log.append(hello()).unwrap()).collect();
    assert_eq!(offsets, vec![0, 1, 2]);
    assert_eq!(log.read(0).unwrap().value, hello().value);

    log.truncate(1).unwrap();

    assert!(matches!(
        log.read(0),
        Err(CoreError::OffsetOutOfRange { offset: 0 })
    ));
    assert_eq!(log.read(2).unwrap().value, hello().value);
}

#[test]
fn index_scenario() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("0.index");

    let mut index = Index::open(&path, 1024).unwrap();
    index.write(0, 0).unwrap();
    index.write(1, 10).unwrap();

    assert_eq!(index.read(0).unwrap(), (0, 0));
    assert_eq!(index.read(1).unwrap(), (1, 10));
    assert!(index.read(2).unwrap_err().is_end_of_index());
    index.close().unwrap();

    let index = Index::open(&path, 1024).unwrap();
    assert_eq!(index.last().unwrap(), (1, 10));
}

#[test]
fn reopen_after_truncate_keeps_range() {
    let temp = tempdir().unwrap();
    let config = Config::new().max_store_bytes(64);

    let (lowest, highest) = {
        let log = Log::open(temp.path(), config).unwrap();
        for _ in 0..10 {
            log.append(hello()).unwrap();
        }
        log.truncate(4).unwrap();
        let range = (log.lowest_offset().unwrap(), log.highest_offset().unwrap());
        log.close().unwrap();
        range
    };

    let log = Log::open(temp.path(), config).unwrap();
    assert_eq!(log.lowest_offset().unwrap(), lowest);
    assert_eq!(log.highest_offset().unwrap(), highest);
    assert_eq!(highest, 9);

    for offset in lowest..=highest {
        assert_eq!(log.read(offset).unwrap().offset, offset);
    }
    assert!(lowest > 0);
    assert!(log.read(lowest - 1).unwrap_err().is_out_of_range());
}

#[test]
fn reopen_without_close_recovers() {
    let temp = tempdir().unwrap();
    let config = Config::default();

    {
        let log = Log::open(temp.path(), config).unwrap();
        for _ in 0..5 {
            log.append(hello()).unwrap();
        }
        // Dropping without close still flushes buffers and shrinks indexes.
    }

    let log = Log::open(temp.path(), config).unwrap();
    assert_eq!(log.highest_offset().unwrap(), 4);
    assert_eq!(log.append(hello()).unwrap(), 5);
}

#[test]
fn orphaned_store_bytes_are_ignored_on_recovery() {
    let temp = tempdir().unwrap();
    let config = Config::default();

    {
        let log = Log::open(temp.path(), config).unwrap();
        log.append(hello()).unwrap();
        log.close().unwrap();
    }

    // A store append whose index write never happened.
    {
        let store = Store::open(&temp.path().join("0.store")).unwrap();
        store.append(b"orphan").unwrap();
        store.close().unwrap();
    }

    let log = Log::open(temp.path(), config).unwrap();
    assert_eq!(log.highest_offset().unwrap(), 0);

    let offset = log.append(hello()).unwrap();
    assert_eq!(offset, 1);
    assert_eq!(log.read(1).unwrap().value, hello().value);

    // The raw stream still carries the orphan between the two records.
    let mut bytes = Vec::new();
    log.reader().read_to_end(&mut bytes).unwrap();
    let frames = frames(&bytes);
    assert_eq!(frames.len(), 3);
    assert_eq!(frames[1], b"orphan");
}

#[test]
fn unindexed_first_record_is_not_recovered() {
    let temp = tempdir().unwrap();

    // Killed after a large first frame bypassed the write buffer but before
    // its index entry was written; the index is still preallocated zeros.
    fs::write(temp.path().join("0.index"), vec![0u8; 1024]).unwrap();
    {
        let orphan = Record::new(vec![7u8; 9000]).encode().unwrap();
        let store = Store::open(&temp.path().join("0.store")).unwrap();
        store.append(&orphan).unwrap();
        store.close().unwrap();
    }

    let log = Log::open(temp.path(), Config::new().max_store_bytes(64 * 1024)).unwrap();
    assert!(log.read(0).unwrap_err().is_out_of_range());
    assert_eq!(log.segments()[0].next_offset, 0);

    assert_eq!(log.append(hello()).unwrap(), 0);
    assert_eq!(log.read(0).unwrap().value, hello().value);
}

#[test]
fn reader_spans_segments_in_order() {
    let temp = tempdir().unwrap();
    let log = Log::open(temp.path(), Config::new().max_store_bytes(100)).unwrap();

    for i in 0..12u8 {
        log.append(Record::new(vec![i; 20])).unwrap();
    }
    assert!(log.segments().len() > 2);

    let mut reader = log.reader();
    let total: u64 = log.segments().iter().map(|s| s.store_size).sum();
    assert_eq!(reader.remaining(), total);

    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes).unwrap();
    assert_eq!(bytes.len() as u64, total);
    assert_eq!(reader.remaining(), 0);

    for (i, frame) in frames(&bytes).into_iter().enumerate() {
        let record = Record::decode(frame).unwrap();
        assert_eq!(record.offset, i as u64);
        assert_eq!(&record.value[..], &[i as u8; 20][..]);
    }
}

#[test]
fn reader_is_a_snapshot() {
    let temp = tempdir().unwrap();
    let log = Log::open(temp.path(), Config::default()).unwrap();
    log.append(hello()).unwrap();

    let mut reader = log.reader();
    log.append(hello()).unwrap();

    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes).unwrap();
    assert_eq!(frames(&bytes).len(), 1);
}

#[test]
fn reader_outlives_truncation() {
    let temp = tempdir().unwrap();
    let log = Log::open(temp.path(), Config::new().max_store_bytes(32)).unwrap();
    for _ in 0..3 {
        log.append(hello()).unwrap();
    }

    let mut reader = log.reader();
    log.truncate(1).unwrap();

    let mut bytes = Vec::new();
    let result = reader.read_to_end(&mut bytes);
    // Unix keeps unlinked files readable through open handles.
    if cfg!(unix) {
        result.unwrap();
        assert_eq!(frames(&bytes).len(), 3);
    }
}

#[test]
fn concurrent_appends_and_reads() {
    let temp = tempdir().unwrap();
    let log = Arc::new(Log::open(temp.path(), Config::new().max_store_bytes(256)).unwrap());

    let writers: Vec<_> = (0..4)
        .map(|w| {
            let log = Arc::clone(&log);
            thread::spawn(move || {
                (0..50)
                    .map(|i| log.append(Record::new(format!("w{w}-{i}").into_bytes())).unwrap())
                    .collect::<Vec<u64>>()
            })
        })
        .collect();

    let reader = {
        let log = Arc::clone(&log);
        thread::spawn(move || {
            for _ in 0..200 {
                let highest = log.highest_offset().unwrap();
                if let Ok(record) = log.read(highest) {
                    assert_eq!(record.offset, highest);
                }
            }
        })
    };

    let mut offsets: Vec<u64> = writers
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    reader.join().unwrap();

    offsets.sort_unstable();
    assert_eq!(offsets, (0..200).collect::<Vec<u64>>());

    for offset in 0..200 {
        assert_eq!(log.read(offset).unwrap().offset, offset);
    }
}
