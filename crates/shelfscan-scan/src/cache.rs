//! Per-scan directory listing cache.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use compact_str::CompactString;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use shelfscan_core::ScanError;

/// One entry of a cached directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryMeta {
    /// Entry file name.
    pub name: CompactString,
    /// Whether the entry is a directory.
    pub is_dir: bool,
}

/// The cached result of listing one directory, name-sorted.
///
/// Sorting at read time makes every downstream ordering deterministic, so
/// repeated scans of an unchanged tree produce identical results.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DirSnapshot {
    /// Immediate entries in name order.
    pub entries: Vec<EntryMeta>,
}

impl DirSnapshot {
    /// Number of immediate entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the directory has no entries at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether any immediate entry is a directory.
    pub fn has_subdir(&self) -> bool {
        self.entries.iter().any(|e| e.is_dir)
    }

    /// Immediate file entries, in name order.
    pub fn files(&self) -> impl Iterator<Item = &EntryMeta> {
        self.entries.iter().filter(|e| !e.is_dir)
    }

    /// Immediate directory entries, in name order.
    pub fn dirs(&self) -> impl Iterator<Item = &EntryMeta> {
        self.entries.iter().filter(|e| e.is_dir)
    }
}

/// Memoizes directory listings for the duration of one scan.
///
/// The first read of a path lists it from storage; later reads return the
/// stored snapshot. The check-then-insert sequence runs under the map's
/// per-shard entry lock, so concurrent readers of the same path never
/// double-read while readers of different paths proceed independently.
/// Failed listings are not cached.
#[derive(Debug, Default)]
pub struct DirCache {
    snapshots: DashMap<PathBuf, Arc<DirSnapshot>>,
}

impl DirCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// List a directory, reading from storage at most once per path.
    pub fn read(&self, path: &Path) -> Result<Arc<DirSnapshot>, ScanError> {
        match self.snapshots.entry(path.to_path_buf()) {
            Entry::Occupied(hit) => Ok(Arc::clone(hit.get())),
            Entry::Vacant(slot) => {
                let snapshot = Arc::new(list_dir(path)?);
                slot.insert(Arc::clone(&snapshot));
                Ok(snapshot)
            }
        }
    }

    /// Number of distinct paths read so far.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Whether nothing has been read yet.
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

fn list_dir(path: &Path) -> Result<DirSnapshot, ScanError> {
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(path).map_err(|e| ScanError::io(path, e))? {
        let entry = entry.map_err(|e| ScanError::io(path, e))?;
        let file_type = entry.file_type().map_err(|e| ScanError::io(entry.path(), e))?;
        entries.push(EntryMeta {
            name: CompactString::from(entry.file_name().to_string_lossy()),
            is_dir: file_type.is_dir(),
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(DirSnapshot { entries })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_read_returns_sorted_entries() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("b")).unwrap();
        fs::create_dir(temp.path().join("a")).unwrap();
        fs::write(temp.path().join("c.txt"), "x").unwrap();

        let cache = DirCache::new();
        let snapshot = cache.read(temp.path()).unwrap();

        let names: Vec<&str> = snapshot.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c.txt"]);
        assert!(snapshot.has_subdir());
        assert_eq!(snapshot.dirs().count(), 2);
        assert_eq!(snapshot.files().count(), 1);
    }

    #[test]
    fn test_repeat_reads_share_one_snapshot() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("f"), "x").unwrap();

        let cache = DirCache::new();
        let first = cache.read(temp.path()).unwrap();
        let second = cache.read(temp.path()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_snapshot_survives_directory_removal() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("gone");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("f"), "x").unwrap();

        let cache = DirCache::new();
        let first = cache.read(&dir).unwrap();
        assert_eq!(first.len(), 1);

        // Removing the directory must not affect cached readers: the
        // second read never touches storage.
        fs::remove_dir_all(&dir).unwrap();
        let second = cache.read(&dir).unwrap();
        assert_eq!(second.len(), 1);
    }

    #[test]
    fn test_failed_listing_not_cached() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("later");

        let cache = DirCache::new();
        assert!(matches!(
            cache.read(&missing),
            Err(ScanError::NotFound { .. })
        ));
        assert!(cache.is_empty());

        // Once the directory exists the same path reads cleanly.
        fs::create_dir(&missing).unwrap();
        assert!(cache.read(&missing).is_ok());
        assert_eq!(cache.len(), 1);
    }
}
