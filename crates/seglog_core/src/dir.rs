//! Log directory layout.
//!
//! Every segment is a pair of files named after its base offset:
//!
//! ```text
//! <log_dir>/
//! ├─ 0.store      # length-prefixed records
//! ├─ 0.index      # relative offset -> store position
//! ├─ 3.store
//! └─ 3.index
//! ```
//!
//! Files with any other extension, or whose stem is not a decimal offset,
//! are ignored.

use crate::error::CoreResult;
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Extension of record store files.
pub const STORE_EXTENSION: &str = "store";

/// Extension of offset index files.
pub const INDEX_EXTENSION: &str = "index";

/// Returns the store path for the segment starting at `base_offset`.
#[must_use]
pub fn store_path(dir: &Path, base_offset: u64) -> PathBuf {
    dir.join(format!("{base_offset}.{STORE_EXTENSION}"))
}

/// Returns the index path for the segment starting at `base_offset`.
#[must_use]
pub fn index_path(dir: &Path, base_offset: u64) -> PathBuf {
    dir.join(format!("{base_offset}.{INDEX_EXTENSION}"))
}

/// Lists the base offsets of every segment in `dir`, ascending.
///
/// A store and its index share one base offset, so each segment appears
/// once even if only one of its files exists.
pub fn list_base_offsets(dir: &Path) -> CoreResult<Vec<u64>> {
    let mut offsets = BTreeSet::new();

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();

        let is_segment_file = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == STORE_EXTENSION || ext == INDEX_EXTENSION);
        if !is_segment_file {
            continue;
        }

        let stem = path.file_stem().and_then(|stem| stem.to_str());
        match stem.map(str::parse::<u64>) {
            Some(Ok(offset)) => {
                offsets.insert(offset);
            }
            _ => {
                tracing::warn!(path = %path.display(), "skipping file with non-numeric segment name");
            }
        }
    }

    Ok(offsets.into_iter().collect())
}

/// Syncs the directory so created and deleted segment files are durable.
#[cfg(unix)]
pub fn sync_dir(dir: &Path) -> CoreResult<()> {
    File::open(dir)?.sync_all()?;
    Ok(())
}

/// Syncs the directory so created and deleted segment files are durable.
///
/// NTFS journals metadata updates; there is no directory fsync to issue.
#[cfg(not(unix))]
pub fn sync_dir(_dir: &Path) -> CoreResult<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn paths_are_correct() {
        let dir = Path::new("/tmp/log");
        assert_eq!(store_path(dir, 16), dir.join("16.store"));
        assert_eq!(index_path(dir, 16), dir.join("16.index"));
    }

    #[test]
    fn list_dedupes_and_sorts() {
        let temp = tempdir().unwrap();
        for name in ["10.store", "10.index", "2.store", "2.index", "33.index"] {
            File::create(temp.path().join(name)).unwrap();
        }

        assert_eq!(list_base_offsets(temp.path()).unwrap(), vec![2, 10, 33]);
    }

    #[test]
    fn list_ignores_foreign_files() {
        let temp = tempdir().unwrap();
        for name in ["0.store", "0.index", "LOCK", "notes.txt", "abc.store"] {
            File::create(temp.path().join(name)).unwrap();
        }
        fs::create_dir(temp.path().join("nested")).unwrap();

        assert_eq!(list_base_offsets(temp.path()).unwrap(), vec![0]);
    }

    #[test]
    fn list_empty_dir() {
        let temp = tempdir().unwrap();
        assert!(list_base_offsets(temp.path()).unwrap().is_empty());
    }
}
