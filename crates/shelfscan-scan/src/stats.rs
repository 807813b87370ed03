//! Shared statistics accumulation across concurrent walk tasks.

use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::warn;

use shelfscan_core::{ErrorPolicy, ScanError, ScanIssue, WalkStats};

/// Thread-safe accumulator behind [`WalkStats`].
///
/// Counters are atomics so updates from concurrent group tasks are
/// order-independent; only captured error records take a short lock.
#[derive(Debug)]
pub struct StatsCollector {
    started: Instant,
    started_at: DateTime<Utc>,
    entries_visited: AtomicU64,
    files_visited: AtomicU64,
    dirs_visited: AtomicU64,
    matched: AtomicU64,
    skipped: AtomicU64,
    errors_count: AtomicU64,
    total_size: AtomicU64,
    min_file_size: AtomicU64,
    max_file_size: AtomicU64,
    errors: Mutex<Vec<ScanIssue>>,
}

impl StatsCollector {
    /// Start a collector for a new run.
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            started_at: Utc::now(),
            entries_visited: AtomicU64::new(0),
            files_visited: AtomicU64::new(0),
            dirs_visited: AtomicU64::new(0),
            matched: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            errors_count: AtomicU64::new(0),
            total_size: AtomicU64::new(0),
            min_file_size: AtomicU64::new(u64::MAX),
            max_file_size: AtomicU64::new(0),
            errors: Mutex::new(Vec::new()),
        }
    }

    /// Count an entry reaching the filter stage.
    pub fn record_entry(&self) {
        self.entries_visited.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a directory that passed all filters.
    pub fn record_dir(&self) {
        self.dirs_visited.fetch_add(1, Ordering::Relaxed);
        self.matched.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a file that passed all filters.
    pub fn record_file(&self, size: u64) {
        self.files_visited.fetch_add(1, Ordering::Relaxed);
        self.matched.fetch_add(1, Ordering::Relaxed);
        self.total_size.fetch_add(size, Ordering::Relaxed);
        self.min_file_size.fetch_min(size, Ordering::Relaxed);
        self.max_file_size.fetch_max(size, Ordering::Relaxed);
    }

    /// Count an entry skipped by filters or pruning.
    pub fn record_skip(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Route a recoverable error through the run's error policy.
    ///
    /// Under `Skip` the error is counted (and captured when
    /// `collect_errors` is set) and `Ok(())` is returned so traversal
    /// continues. `Stop` and `Propagate` return the error to the caller.
    pub fn absorb(
        &self,
        policy: ErrorPolicy,
        collect_errors: bool,
        path: &Path,
        error: ScanError,
    ) -> Result<(), ScanError> {
        if !error.is_recoverable() {
            return Err(error);
        }
        match policy {
            ErrorPolicy::Stop | ErrorPolicy::Propagate => Err(error),
            ErrorPolicy::Skip => {
                warn!(path = %path.display(), error = %error, "skipping unreadable entry");
                self.errors_count.fetch_add(1, Ordering::Relaxed);
                if collect_errors {
                    let issue = ScanIssue::new(path, &error);
                    let mut errors = self
                        .errors
                        .lock()
                        .unwrap_or_else(std::sync::PoisonError::into_inner);
                    errors.push(issue);
                }
                Ok(())
            }
        }
    }

    /// Errors counted so far.
    pub fn errors_count(&self) -> u64 {
        self.errors_count.load(Ordering::Relaxed)
    }

    /// Wall-clock time since the collector was created.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Produce the finalized statistics with derived rates.
    pub fn finalize(&self) -> WalkStats {
        let files_visited = self.files_visited.load(Ordering::Relaxed);
        let min = self.min_file_size.load(Ordering::Relaxed);

        let mut stats = WalkStats {
            entries_visited: self.entries_visited.load(Ordering::Relaxed),
            files_visited,
            dirs_visited: self.dirs_visited.load(Ordering::Relaxed),
            matched: self.matched.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            errors_count: self.errors_count.load(Ordering::Relaxed),
            errors: self
                .errors
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .clone(),
            total_size: self.total_size.load(Ordering::Relaxed),
            min_file_size: (files_visited > 0).then_some(min),
            max_file_size: self.max_file_size.load(Ordering::Relaxed),
            ..Default::default()
        };
        stats.finalize(self.started_at, Utc::now());
        stats
    }
}

impl Default for StatsCollector {
    fn default() -> Self {
        Self::new()
    }
}
