//! Progress snapshots broadcast while a scan runs.

use std::time::Duration;

use compact_str::CompactString;

/// A point-in-time view of a running scan.
///
/// Snapshots are broadcast after the pre-pass and once per completed
/// group; slow receivers may observe gaps but never stale totals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanProgress {
    /// Number of groups the scan will process.
    pub groups_total: usize,
    /// Groups fully scanned so far.
    pub groups_done: usize,
    /// Entries counted by the pre-pass, zero when progress sizing is off.
    pub entries_total: u64,
    /// Name of the group that most recently finished.
    pub current_group: CompactString,
    /// Wall time since the scan started.
    pub elapsed: Duration,
}

impl ScanProgress {
    /// Completion as a fraction in `0.0..=1.0`.
    pub fn fraction(&self) -> f64 {
        if self.groups_total == 0 {
            return 1.0;
        }
        self.groups_done as f64 / self.groups_total as f64
    }

    pub fn is_complete(&self) -> bool {
        self.groups_done >= self.groups_total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fraction() {
        let progress = ScanProgress {
            groups_total: 4,
            groups_done: 1,
            entries_total: 100,
            current_group: CompactString::from("Action"),
            elapsed: Duration::from_millis(5),
        };
        assert!((progress.fraction() - 0.25).abs() < f64::EPSILON);
        assert!(!progress.is_complete());
    }

    #[test]
    fn test_empty_scan_is_complete() {
        let progress = ScanProgress {
            groups_total: 0,
            groups_done: 0,
            entries_total: 0,
            current_group: CompactString::new(""),
            elapsed: Duration::ZERO,
        };
        assert_eq!(progress.fraction(), 1.0);
        assert!(progress.is_complete());
    }
}
