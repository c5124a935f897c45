//! Raw byte stream over every segment store.

use seglog_storage::Store;
use std::collections::VecDeque;
use std::io::{self, Read};
use std::sync::Arc;

/// A single-pass reader over the stores of a log, in segment order.
///
/// The reader yields the raw store bytes, length prefixes included, so a
/// consumer (e.g. a snapshot receiver) must parse the framing itself:
///
/// ```text
/// | length (8, big-endian) | record (length) | length | record | ...
/// ```
///
/// Each store is read up to the size it had when the reader was created,
/// which keeps the stream finite even while appends continue. Stores are
/// read lazily, one positional read at a time; nothing is copied up front.
#[derive(Debug)]
pub struct LogReader {
    cursors: VecDeque<Cursor>,
}

#[derive(Debug)]
struct Cursor {
    store: Arc<Store>,
    position: u64,
    end: u64,
}

impl LogReader {
    pub(crate) fn new(stores: Vec<Arc<Store>>) -> Self {
        let cursors = stores
            .into_iter()
            .map(|store| Cursor {
                end: store.size(),
                store,
                position: 0,
            })
            .collect();
        Self { cursors }
    }

    /// Returns the number of bytes not yet read.
    #[must_use]
    pub fn remaining(&self) -> u64 {
        self.cursors.iter().map(|c| c.end - c.position).sum()
    }
}

impl Read for LogReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        while let Some(cursor) = self.cursors.front_mut() {
            let left = cursor.end - cursor.position;
            if left > 0 {
                let want = buf.len().min(usize::try_from(left).unwrap_or(usize::MAX));
                let n = cursor.store.read_at(&mut buf[..want], cursor.position)?;
                if n > 0 {
                    cursor.position += n as u64;
                    return Ok(n);
                }
            }
            self.cursors.pop_front();
        }

        Ok(0)
    }
}
