//! Title classification: kind, icon/metadata status, children.

use std::path::Path;

use compact_str::CompactString;

use shelfscan_core::{
    ContentKind, ErrorPolicy, IconRef, ItemKind, ItemStatus, ScanError, ScanItem,
};

use crate::cache::{DirCache, DirSnapshot};
use crate::stats::StatsCollector;

/// Resolve a title folder's status from its immediate files.
///
/// `ok` requires both an `.ico` file and a file literally named
/// `desktop.ini`; an icon alone is `warn`; neither is `missing`.
pub fn resolve_status(snapshot: &DirSnapshot) -> ItemStatus {
    let mut has_ico = false;
    let mut has_ini = false;

    for entry in snapshot.files() {
        if is_ico(&entry.name) {
            has_ico = true;
        } else if entry.name == "desktop.ini" {
            has_ini = true;
        }
        if has_ico && has_ini {
            return ItemStatus::Ok;
        }
    }

    if has_ico {
        ItemStatus::Warn
    } else {
        ItemStatus::Missing
    }
}

/// Resolve the first `.ico` file of a title folder, in snapshot order.
///
/// Snapshot order is name-sorted, so the selection is stable across
/// repeated scans of an unchanged tree. Candidates that cannot be stat'd
/// are skipped in favor of the next one.
pub fn find_icon(dir: &Path, snapshot: &DirSnapshot) -> Option<IconRef> {
    for entry in snapshot.files() {
        if !is_ico(&entry.name) {
            continue;
        }
        let path = dir.join(entry.name.as_str());
        let Ok(meta) = std::fs::metadata(&path) else {
            continue;
        };
        return Some(IconRef {
            name: entry.name.clone(),
            path,
            size: meta.len(),
        });
    }
    None
}

fn is_ico(name: &str) -> bool {
    Path::new(name).extension().is_some_and(|e| e == "ico")
}

/// Classifies title folders into [`ScanItem`]s.
///
/// Child listings go through the directory cache; child read failures
/// follow the run's error policy.
pub struct Classifier<'a> {
    cache: &'a DirCache,
    content: ContentKind,
    policy: ErrorPolicy,
    collect_errors: bool,
    stats: &'a StatsCollector,
}

impl<'a> Classifier<'a> {
    pub fn new(
        cache: &'a DirCache,
        content: ContentKind,
        policy: ErrorPolicy,
        collect_errors: bool,
        stats: &'a StatsCollector,
    ) -> Self {
        Self {
            cache,
            content,
            policy,
            collect_errors,
            stats,
        }
    }

    /// Classify one title folder given its immediate entries.
    ///
    /// `group` is the ordered list of ancestor folder names from the scan
    /// root; children get the title's name appended to it.
    pub fn classify(
        &self,
        path: &Path,
        snapshot: &DirSnapshot,
        group: &[CompactString],
    ) -> Result<ScanItem, ScanError> {
        match self.content {
            ContentKind::Movies => self.classify_movie(path, snapshot, group),
            ContentKind::Tv => self.classify_show(path, snapshot, group),
        }
    }

    fn classify_movie(
        &self,
        path: &Path,
        snapshot: &DirSnapshot,
        group: &[CompactString],
    ) -> Result<ScanItem, ScanError> {
        let kind = if snapshot.has_subdir() {
            ItemKind::Collection
        } else {
            ItemKind::Single
        };
        let children = if snapshot.has_subdir() {
            self.movie_children(path, snapshot, group)?
        } else {
            Vec::new()
        };

        let mut item = ScanItem::new(kind, base_name(path), path, resolve_status(snapshot));
        item.icon = find_icon(path, snapshot);
        item.group = group.to_vec();
        item.items = children;
        Ok(item)
    }

    /// One level only: members of a collection are classified by their own
    /// entries but never recursed into further.
    fn movie_children(
        &self,
        parent: &Path,
        snapshot: &DirSnapshot,
        group: &[CompactString],
    ) -> Result<Vec<ScanItem>, ScanError> {
        let mut child_group = group.to_vec();
        child_group.push(base_name(parent));

        let mut children = Vec::new();
        for entry in snapshot.dirs() {
            let child_path = parent.join(entry.name.as_str());
            let child_snapshot = match self.cache.read(&child_path) {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    self.stats
                        .absorb(self.policy, self.collect_errors, &child_path, err)?;
                    continue;
                }
            };

            let kind = if child_snapshot.has_subdir() {
                ItemKind::Collection
            } else {
                ItemKind::Single
            };
            let mut child = ScanItem::new(
                kind,
                entry.name.clone(),
                &child_path,
                resolve_status(&child_snapshot),
            );
            child.icon = find_icon(&child_path, &child_snapshot);
            child.group = child_group.clone();
            children.push(child);
        }
        Ok(children)
    }

    fn classify_show(
        &self,
        path: &Path,
        snapshot: &DirSnapshot,
        group: &[CompactString],
    ) -> Result<ScanItem, ScanError> {
        let mut item = ScanItem::new(
            ItemKind::Show,
            base_name(path),
            path,
            resolve_status(snapshot),
        );
        item.icon = find_icon(path, snapshot);
        item.group = group.to_vec();

        let mut season_group = group.to_vec();
        season_group.push(item.name.clone());

        for entry in snapshot.dirs() {
            let season_path = path.join(entry.name.as_str());
            let season_snapshot = match self.cache.read(&season_path) {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    self.stats
                        .absorb(self.policy, self.collect_errors, &season_path, err)?;
                    continue;
                }
            };

            let mut season = ScanItem::new(
                ItemKind::Season,
                entry.name.clone(),
                &season_path,
                resolve_status(&season_snapshot),
            );
            season.group = season_group.clone();
            item.items.push(season);
        }
        Ok(item)
    }
}

fn base_name(path: &Path) -> CompactString {
    path.file_name()
        .map(|n| CompactString::from(n.to_string_lossy()))
        .unwrap_or_else(|| CompactString::from(path.to_string_lossy()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn snapshot_of(cache: &DirCache, path: &Path) -> std::sync::Arc<DirSnapshot> {
        cache.read(path).unwrap()
    }

    #[test]
    fn test_status_resolution() {
        let temp = TempDir::new().unwrap();
        let title = temp.path().join("Inception (2010)");
        fs::create_dir(&title).unwrap();
        let cache = DirCache::new();

        fs::write(title.join("Inception.mkv"), "x").unwrap();
        assert_eq!(
            resolve_status(&snapshot_of(&DirCache::new(), &title)),
            ItemStatus::Missing
        );

        fs::write(title.join("Inception.ico"), "icon").unwrap();
        assert_eq!(
            resolve_status(&snapshot_of(&DirCache::new(), &title)),
            ItemStatus::Warn
        );

        fs::write(title.join("desktop.ini"), "[ViewState]").unwrap();
        assert_eq!(
            resolve_status(&snapshot_of(&cache, &title)),
            ItemStatus::Ok
        );
    }

    #[test]
    fn test_icon_selection_is_stable() {
        let temp = TempDir::new().unwrap();
        let title = temp.path().join("T");
        fs::create_dir(&title).unwrap();
        fs::write(title.join("b.ico"), "bb").unwrap();
        fs::write(title.join("a.ico"), "aaaa").unwrap();

        // Name order, not creation order: `a.ico` wins every time.
        for _ in 0..3 {
            let icon = find_icon(&title, &snapshot_of(&DirCache::new(), &title)).unwrap();
            assert_eq!(icon.name, "a.ico");
            assert_eq!(icon.size, 4);
            assert_eq!(icon.path, title.join("a.ico"));
        }
    }

    #[test]
    fn test_movie_single_vs_collection() {
        let temp = TempDir::new().unwrap();
        let single = temp.path().join("Heat (1995)");
        fs::create_dir(&single).unwrap();
        fs::write(single.join("Heat.mkv"), "x").unwrap();

        let collection = temp.path().join("The Matrix Collection");
        fs::create_dir(&collection).unwrap();
        fs::write(collection.join("Collection.ico"), "i").unwrap();
        for part in ["The Matrix (1999)", "The Matrix Reloaded (2003)"] {
            let dir = collection.join(part);
            fs::create_dir(&dir).unwrap();
            fs::write(dir.join("movie.mkv"), "x").unwrap();
        }

        let cache = DirCache::new();
        let stats = StatsCollector::new();
        let classifier = Classifier::new(
            &cache,
            ContentKind::Movies,
            ErrorPolicy::Skip,
            false,
            &stats,
        );
        let group = [CompactString::from("Action")];

        let item = classifier
            .classify(&single, &snapshot_of(&cache, &single), &group)
            .unwrap();
        assert_eq!(item.kind, ItemKind::Single);
        assert_eq!(item.status, ItemStatus::Missing);
        assert!(item.items.is_empty());
        assert_eq!(item.group, vec![CompactString::from("Action")]);

        let item = classifier
            .classify(&collection, &snapshot_of(&cache, &collection), &group)
            .unwrap();
        assert_eq!(item.kind, ItemKind::Collection);
        assert_eq!(item.status, ItemStatus::Warn);
        assert_eq!(item.items.len(), 2);
        assert_eq!(item.items[0].name, "The Matrix (1999)");
        assert_eq!(item.items[0].kind, ItemKind::Single);
        assert_eq!(
            item.items[0].group,
            vec![
                CompactString::from("Action"),
                CompactString::from("The Matrix Collection")
            ]
        );
    }

    #[test]
    fn test_show_seasons() {
        let temp = TempDir::new().unwrap();
        let show = temp.path().join("Breaking Bad");
        fs::create_dir(&show).unwrap();
        fs::write(show.join("Breaking Bad.ico"), "i").unwrap();
        fs::write(show.join("desktop.ini"), "x").unwrap();

        let s1 = show.join("Season 01");
        fs::create_dir(&s1).unwrap();
        fs::write(s1.join("Season 01.ico"), "i").unwrap();
        fs::create_dir(show.join("Season 02")).unwrap();

        let cache = DirCache::new();
        let stats = StatsCollector::new();
        let classifier =
            Classifier::new(&cache, ContentKind::Tv, ErrorPolicy::Skip, false, &stats);
        let group = [CompactString::from("Drama")];

        let item = classifier
            .classify(&show, &snapshot_of(&cache, &show), &group)
            .unwrap();
        assert_eq!(item.kind, ItemKind::Show);
        assert_eq!(item.status, ItemStatus::Ok);
        assert_eq!(item.items.len(), 2);
        assert_eq!(item.items[0].kind, ItemKind::Season);
        assert_eq!(item.items[0].name, "Season 01");
        assert_eq!(item.items[0].status, ItemStatus::Warn);
        assert_eq!(item.items[1].status, ItemStatus::Missing);
        // Seasons carry status only, never an icon of their own.
        assert!(item.items.iter().all(|s| s.icon.is_none()));
    }
}
