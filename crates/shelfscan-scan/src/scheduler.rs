//! Concurrent group scheduling and the scan entry point.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use compact_str::CompactString;
use tokio::sync::{Mutex, Semaphore, broadcast};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use shelfscan_core::{ContentKind, ScanError, ScanItem, ScanMode, ScanOptions, ScanResult};

use crate::assemble;
use crate::cache::DirCache;
use crate::classify::Classifier;
use crate::progress::ScanProgress;
use crate::stats::StatsCollector;
use crate::walker::Walker;

/// A library root to scan, with an optional source label stamped onto
/// every item found beneath it.
#[derive(Debug, Clone)]
pub struct ScanRoot {
    pub path: PathBuf,
    pub label: Option<CompactString>,
}

impl ScanRoot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            label: None,
        }
    }

    pub fn labeled(path: impl Into<PathBuf>, label: impl Into<CompactString>) -> Self {
        Self {
            path: path.into(),
            label: Some(label.into()),
        }
    }
}

/// One group directory queued for scanning.
struct GroupUnit {
    name: CompactString,
    path: PathBuf,
    label: Option<CompactString>,
}

/// Scans media library roots group by group, a bounded number of groups
/// at a time.
///
/// The scanner is cheap to construct and holds no filesystem state; each
/// call to [`scan`](Self::scan) runs with a fresh directory cache and
/// statistics collector.
pub struct MediaScanner {
    options: ScanOptions,
    cancel: CancellationToken,
    progress_tx: broadcast::Sender<ScanProgress>,
}

impl MediaScanner {
    pub fn new(options: ScanOptions) -> Result<Self, ScanError> {
        options.validate()?;
        let (progress_tx, _) = broadcast::channel(64);
        Ok(Self {
            options,
            cancel: CancellationToken::new(),
            progress_tx,
        })
    }

    /// Subscribe to progress snapshots. Only emitted when the options
    /// enable progress.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanProgress> {
        self.progress_tx.subscribe()
    }

    /// Token that aborts the scan when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Scan the given roots as `content` and assemble the result.
    ///
    /// Every immediate subdirectory of every root becomes a group; groups
    /// sharing a name across roots are merged. Group output order is
    /// deterministic regardless of the concurrency level.
    pub async fn scan(
        &self,
        content: ContentKind,
        roots: &[ScanRoot],
    ) -> Result<ScanResult, ScanError> {
        if self.cancel.is_cancelled() {
            return Err(ScanError::Cancelled);
        }

        let cache = Arc::new(DirCache::new());
        let stats = Arc::new(StatsCollector::new());
        let groups = self.enumerate_groups(roots, &cache, &stats)?;
        info!(
            content = ?content,
            roots = roots.len(),
            groups = groups.len(),
            "starting scan"
        );

        let entries_total = self.size_progress(&groups, &cache)?;
        let groups_total = groups.len();
        if self.options.enable_progress {
            let _ = self.progress_tx.send(ScanProgress {
                groups_total,
                groups_done: 0,
                entries_total,
                current_group: CompactString::new(""),
                elapsed: stats.elapsed(),
            });
        }

        let semaphore = Arc::new(Semaphore::new(self.options.concurrency));
        let results: Arc<Mutex<BTreeMap<CompactString, Vec<ScanItem>>>> =
            Arc::new(Mutex::new(BTreeMap::new()));
        let done = Arc::new(AtomicUsize::new(0));
        let mut set = JoinSet::new();

        for unit in groups {
            let permit = tokio::select! {
                _ = self.cancel.cancelled() => {
                    set.abort_all();
                    return Err(ScanError::Cancelled);
                }
                permit = Arc::clone(&semaphore).acquire_owned() => {
                    permit.map_err(|_| ScanError::Cancelled)?
                }
            };

            let options = self.options.clone();
            let cache = Arc::clone(&cache);
            let stats = Arc::clone(&stats);
            let cancel = self.cancel.clone();
            let results = Arc::clone(&results);
            let done = Arc::clone(&done);
            let progress_tx = self.progress_tx.clone();

            set.spawn_blocking(move || {
                let _permit = permit;
                let items = scan_group(&cache, &options, &cancel, &stats, content, &unit)?;

                {
                    let mut map = results.blocking_lock();
                    map.entry(unit.name.clone()).or_default().extend(items);
                }

                let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
                debug!(group = %unit.name, done = finished, "group scanned");
                if options.enable_progress {
                    let _ = progress_tx.send(ScanProgress {
                        groups_total,
                        groups_done: finished,
                        entries_total,
                        current_group: unit.name,
                        elapsed: stats.elapsed(),
                    });
                }
                Ok(())
            });
        }

        let mut first_err: Option<ScanError> = None;
        while let Some(joined) = set.join_next().await {
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(err) if err.is_cancelled() => continue,
                Err(err) => Err(ScanError::Other {
                    message: format!("scan task failed: {err}"),
                }),
            };
            if let Err(err) = outcome {
                if first_err.is_none() {
                    // First failure wins; cancel the rest of the scan.
                    self.cancel.cancel();
                    first_err = Some(err);
                }
            }
        }
        if let Some(err) = first_err {
            return Err(err);
        }
        if self.cancel.is_cancelled() {
            return Err(ScanError::Cancelled);
        }

        let mut map = {
            let mut guard = results.lock().await;
            std::mem::take(&mut *guard)
        };
        for items in map.values_mut() {
            items.sort_by(|a, b| a.name.cmp(&b.name));
        }

        let result = assemble::assemble(map, &stats, self.options.collect_stats);
        info!(
            groups = result.group_count,
            items = result.total_items,
            duration_ms = result.scan_duration_ms,
            "scan complete"
        );
        Ok(result)
    }

    /// List the group directories beneath each root, in root order then
    /// name order.
    fn enumerate_groups(
        &self,
        roots: &[ScanRoot],
        cache: &DirCache,
        stats: &StatsCollector,
    ) -> Result<Vec<GroupUnit>, ScanError> {
        let mut groups = Vec::new();
        for root in roots {
            let path = match root.path.canonicalize() {
                Ok(path) => path,
                Err(err) => {
                    let err = ScanError::io(&root.path, err);
                    stats.absorb(
                        self.options.error_policy,
                        self.options.collect_errors,
                        &root.path,
                        err,
                    )?;
                    continue;
                }
            };
            if !path.is_dir() {
                return Err(ScanError::NotADirectory { path });
            }

            let snapshot = match cache.read(&path) {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    stats.absorb(
                        self.options.error_policy,
                        self.options.collect_errors,
                        &path,
                        err,
                    )?;
                    continue;
                }
            };
            for entry in snapshot.dirs() {
                if !self.options.include_hidden && entry.name.starts_with('.') {
                    continue;
                }
                groups.push(GroupUnit {
                    name: entry.name.clone(),
                    path: path.join(entry.name.as_str()),
                    label: root.label.clone(),
                });
            }
        }
        Ok(groups)
    }

    /// Pre-pass that sizes the progress total and warms the cache. Runs
    /// only when progress is enabled; counting errors are not fatal under
    /// a skipping policy.
    fn size_progress(&self, groups: &[GroupUnit], cache: &DirCache) -> Result<u64, ScanError> {
        if !self.options.enable_progress {
            return Ok(0);
        }
        let counting_stats = StatsCollector::new();
        let walk_options = title_walk_options(&self.options);
        let walker = Walker::new(cache, &walk_options, self.cancel.clone(), &counting_stats)?;

        let mut total = 0u64;
        for unit in groups {
            total += walker.count(&unit.path)?.entries;
        }
        Ok(total)
    }
}

/// Walk options for enumerating title folders inside one group: the
/// immediate subdirectories only, with the caller's filters applied.
/// Leaf-only is honored as-is, so it restricts the scan to titles with
/// no nested folders.
fn title_walk_options(options: &ScanOptions) -> ScanOptions {
    let mut walk = options.clone();
    walk.mode = ScanMode::Dirs;
    walk.skip_root = true;
    walk.max_depth = Some(1);
    walk.min_depth = 0;
    walk.enable_progress = false;
    walk
}

/// Scan a single group directory synchronously. Runs on the blocking
/// pool; classification recursion below the title level goes through the
/// shared directory cache.
fn scan_group(
    cache: &DirCache,
    options: &ScanOptions,
    cancel: &CancellationToken,
    stats: &StatsCollector,
    content: ContentKind,
    unit: &GroupUnit,
) -> Result<Vec<ScanItem>, ScanError> {
    let walk_options = title_walk_options(options);
    let walker = Walker::new(cache, &walk_options, cancel.clone(), stats)?;
    let classifier = Classifier::new(
        cache,
        content,
        options.error_policy,
        options.collect_errors,
        stats,
    );
    let group = [unit.name.clone()];

    let mut items = Vec::new();
    walker.walk(
        &unit.path,
        |_path, _size| Ok(()),
        |path, snapshot| {
            let mut item = classifier.classify(path, snapshot, &group)?;
            item.source = unit.label.clone();
            items.push(item);
            Ok(())
        },
    )?;
    items.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(items)
}

impl Default for MediaScanner {
    fn default() -> Self {
        // Default options always validate.
        let (progress_tx, _) = broadcast::channel(64);
        Self {
            options: ScanOptions::default(),
            cancel: CancellationToken::new(),
            progress_tx,
        }
    }
}
