//! Filter-aware depth-first traversal over the directory cache.

use std::cell::Cell;
use std::path::Path;

use tokio_util::sync::CancellationToken;
use tracing::trace;

use shelfscan_core::{ScanError, ScanOptions};

use crate::cache::{DirCache, DirSnapshot};
use crate::filter::EntryFilter;
use crate::stats::StatsCollector;

/// Totals from a callbacks-disabled counting pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkCounts {
    /// Entries that would reach the callbacks.
    pub entries: u64,
    /// Files that would be reported.
    pub files: u64,
    /// Directories that would be reported.
    pub dirs: u64,
}

/// Depth-first traversal primitive.
///
/// Visits matched entries through `on_file(path, size)` and
/// `on_dir(path, snapshot)` callbacks, applying, in order: skip-root,
/// hidden-entry pruning, the depth bound, skip-empty and leaf-only rules,
/// then name and extension filters. Listing and stat failures go through
/// the run's error policy; cancellation is checked at every visited entry.
///
/// Directory listings come from the [`DirCache`], so a second pass over the
/// same tree within one scan never re-reads storage.
pub struct Walker<'a> {
    cache: &'a DirCache,
    options: &'a ScanOptions,
    filter: EntryFilter,
    cancel: CancellationToken,
    stats: &'a StatsCollector,
}

impl<'a> Walker<'a> {
    /// Build a walker, compiling the filters eagerly.
    pub fn new(
        cache: &'a DirCache,
        options: &'a ScanOptions,
        cancel: CancellationToken,
        stats: &'a StatsCollector,
    ) -> Result<Self, ScanError> {
        let filter = EntryFilter::new(options)?;
        Ok(Self {
            cache,
            options,
            filter,
            cancel,
            stats,
        })
    }

    /// Walk the tree rooted at `root`, invoking the callbacks per match.
    pub fn walk<F, D>(&self, root: &Path, mut on_file: F, mut on_dir: D) -> Result<(), ScanError>
    where
        F: FnMut(&Path, u64) -> Result<(), ScanError>,
        D: FnMut(&Path, &DirSnapshot) -> Result<(), ScanError>,
    {
        self.visit_dir(root, 0, &mut on_file, &mut on_dir, true)
    }

    /// Count matchable entries without invoking callbacks or touching
    /// statistics. Used to size progress totals; also warms the cache for
    /// the real pass.
    pub fn count(&self, root: &Path) -> Result<WalkCounts, ScanError> {
        // Both visitor closures live at once, so the tallies sit in cells.
        let files = Cell::new(0u64);
        let dirs = Cell::new(0u64);
        self.visit_dir(
            root,
            0,
            &mut |_path: &Path, _size: u64| {
                files.set(files.get() + 1);
                Ok(())
            },
            &mut |_path: &Path, _snapshot: &DirSnapshot| {
                dirs.set(dirs.get() + 1);
                Ok(())
            },
            false,
        )?;
        Ok(WalkCounts {
            entries: files.get() + dirs.get(),
            files: files.get(),
            dirs: dirs.get(),
        })
    }

    fn visit_dir<F, D>(
        &self,
        path: &Path,
        depth: u32,
        on_file: &mut F,
        on_dir: &mut D,
        track: bool,
    ) -> Result<(), ScanError>
    where
        F: FnMut(&Path, u64) -> Result<(), ScanError>,
        D: FnMut(&Path, &DirSnapshot) -> Result<(), ScanError>,
    {
        if self.cancel.is_cancelled() {
            return Err(ScanError::Cancelled);
        }

        let snapshot = match self.cache.read(path) {
            Ok(snapshot) => snapshot,
            Err(err) => return self.handle_error(path, err, track),
        };
        trace!(path = %path.display(), depth, entries = snapshot.len(), "visiting directory");

        let include_this = depth >= self.options.min_depth;
        // Directories only reach the filter stage in a dir-reporting mode.
        if include_this && track && self.options.mode.wants_dirs() {
            self.stats.record_entry();
        }

        self.report_dir(path, &snapshot, depth, include_this, on_dir, track)?;

        for entry in &snapshot.entries {
            let child_depth = depth + 1;
            let hidden = !self.options.include_hidden && entry.name.starts_with('.');

            if entry.is_dir {
                // Hidden and too-deep directories are pruned: their
                // descendants are never visited.
                if hidden || self.beyond_max_depth(child_depth) {
                    self.record_skip(track);
                    continue;
                }
                let child = path.join(entry.name.as_str());
                self.visit_dir(&child, child_depth, on_file, on_dir, track)?;
            } else {
                if !self.options.mode.wants_files() {
                    continue;
                }
                if self.cancel.is_cancelled() {
                    return Err(ScanError::Cancelled);
                }
                if hidden || self.beyond_max_depth(child_depth) {
                    self.record_skip(track);
                    continue;
                }
                if child_depth < self.options.min_depth {
                    continue;
                }
                if track {
                    self.stats.record_entry();
                }
                if !self.filter.matches_file(&entry.name) {
                    self.record_skip(track);
                    continue;
                }

                let child = path.join(entry.name.as_str());
                let size = match std::fs::metadata(&child) {
                    Ok(meta) => meta.len(),
                    Err(err) => {
                        self.handle_error(&child, ScanError::io(&child, err), track)?;
                        continue;
                    }
                };
                if track {
                    self.stats.record_file(size);
                }
                on_file(&child, size)?;
            }
        }

        Ok(())
    }

    fn report_dir<D>(
        &self,
        path: &Path,
        snapshot: &DirSnapshot,
        depth: u32,
        include_this: bool,
        on_dir: &mut D,
        track: bool,
    ) -> Result<(), ScanError>
    where
        D: FnMut(&Path, &DirSnapshot) -> Result<(), ScanError>,
    {
        if !include_this || !self.options.mode.wants_dirs() {
            return Ok(());
        }
        if self.options.skip_root && depth == 0 {
            return Ok(());
        }
        if self.options.skip_empty_dirs && snapshot.is_empty() {
            self.record_skip(track);
            return Ok(());
        }
        // A leaf may still be nested deeper, so non-leaves are silently
        // passed over rather than counted as skips.
        if self.options.only_leaf && snapshot.has_subdir() {
            return Ok(());
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        if !self.filter.matches_dir(&name) {
            self.record_skip(track);
            return Ok(());
        }

        if track {
            self.stats.record_dir();
        }
        on_dir(path, snapshot)
    }

    fn beyond_max_depth(&self, depth: u32) -> bool {
        self.options.max_depth.is_some_and(|max| depth > max)
    }

    fn record_skip(&self, track: bool) {
        if track {
            self.stats.record_skip();
        }
    }

    fn handle_error(&self, path: &Path, err: ScanError, track: bool) -> Result<(), ScanError> {
        if !track {
            // Counting passes never fail on unreadable subtrees.
            if err.is_recoverable() {
                return Ok(());
            }
            return Err(err);
        }
        self.stats.absorb(
            self.options.error_policy,
            self.options.collect_errors,
            path,
            err,
        )
    }
}
