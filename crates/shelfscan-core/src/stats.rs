//! Walk statistics accumulated over one scan run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ScanIssue;

/// Counts, sizes, and rates gathered while walking.
///
/// Counters accumulate additively during the run; the derived fields
/// (average, rates) are computed once by [`WalkStats::finalize`] from the
/// totals and the elapsed wall-clock time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalkStats {
    /// When the walk started.
    pub started_at: Option<DateTime<Utc>>,
    /// When the walk ended.
    pub ended_at: Option<DateTime<Utc>>,
    /// Elapsed time in milliseconds.
    pub duration_ms: u64,

    /// Entries seen (files + directories reaching the filter stage).
    pub entries_visited: u64,
    /// Files that passed all filters.
    pub files_visited: u64,
    /// Directories that passed all filters.
    pub dirs_visited: u64,
    /// Entries that passed all filters (files + directories).
    pub matched: u64,
    /// Entries skipped by filters or pruning.
    pub skipped: u64,

    /// Errors encountered (skipped under the skip policy).
    pub errors_count: u64,
    /// Captured error records, present when `collect_errors` was enabled.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ScanIssue>,

    /// Total bytes across matched files.
    pub total_size: u64,
    /// Average matched file size in bytes.
    pub avg_file_size: u64,
    /// Smallest matched file size, if any file matched.
    pub min_file_size: Option<u64>,
    /// Largest matched file size in bytes.
    pub max_file_size: u64,

    /// Entries processed per second.
    pub entries_per_sec: f64,
    /// Files processed per second.
    pub files_per_sec: f64,
    /// Bytes processed per second.
    pub bytes_per_sec: f64,
}

impl WalkStats {
    /// Compute the derived fields from the accumulated totals.
    pub fn finalize(&mut self, started_at: DateTime<Utc>, ended_at: DateTime<Utc>) {
        self.started_at = Some(started_at);
        self.ended_at = Some(ended_at);

        let elapsed = (ended_at - started_at).to_std().unwrap_or_default();
        self.duration_ms = elapsed.as_millis() as u64;

        if self.files_visited > 0 {
            self.avg_file_size = self.total_size / self.files_visited;
        }

        let secs = elapsed.as_secs_f64();
        if secs > 0.0 {
            self.entries_per_sec = self.entries_visited as f64 / secs;
            self.files_per_sec = self.files_visited as f64 / secs;
            self.bytes_per_sec = self.total_size as f64 / secs;
        }
    }
}
