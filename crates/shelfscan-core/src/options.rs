//! Scan configuration types.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::ScanError;

/// Which entries the walker reports to its callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    /// Report files only.
    Files,
    /// Report directories only.
    #[default]
    Dirs,
    /// Report both files and directories.
    Mixed,
}

impl ScanMode {
    /// Whether file entries are reported.
    pub fn wants_files(self) -> bool {
        matches!(self, Self::Files | Self::Mixed)
    }

    /// Whether directory entries are reported.
    pub fn wants_dirs(self) -> bool {
        matches!(self, Self::Dirs | Self::Mixed)
    }
}

/// How listing and stat failures are handled during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Abort the entire scan on the first error; partial results are
    /// discarded.
    Stop,
    /// Skip the offending entry, count the error, keep going.
    #[default]
    Skip,
    /// Return the error to the walk caller without the scan-abort framing.
    Propagate,
}

/// Configuration for one scan run. Immutable once the scan starts.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::check"))]
pub struct ScanOptions {
    /// Traversal reporting mode.
    #[builder(default)]
    #[serde(default)]
    pub mode: ScanMode,

    /// Maximum depth relative to the walk root (None = unbounded).
    #[builder(default)]
    #[serde(default)]
    pub max_depth: Option<u32>,

    /// Entries shallower than this are traversed but not reported.
    #[builder(default = "0")]
    #[serde(default)]
    pub min_depth: u32,

    /// Report only directories with no subdirectories.
    #[builder(default = "false")]
    #[serde(default)]
    pub only_leaf: bool,

    /// Skip directories with zero entries.
    #[builder(default = "false")]
    #[serde(default)]
    pub skip_empty_dirs: bool,

    /// Do not report the walk root itself.
    #[builder(default = "false")]
    #[serde(default)]
    pub skip_root: bool,

    /// Visit entries whose name starts with a dot.
    #[builder(default = "false")]
    #[serde(default)]
    pub include_hidden: bool,

    /// Glob patterns an entry name must match (empty = match all).
    #[builder(default)]
    #[serde(default)]
    pub include_patterns: Vec<String>,

    /// Glob patterns that exclude an entry by name.
    #[builder(default)]
    #[serde(default)]
    pub exclude_patterns: Vec<String>,

    /// File extensions to include (files only; empty = all).
    #[builder(default)]
    #[serde(default)]
    pub include_exts: Vec<String>,

    /// File extensions to exclude (files only).
    #[builder(default)]
    #[serde(default)]
    pub exclude_exts: Vec<String>,

    /// Failure behavior for listing and stat errors.
    #[builder(default)]
    #[serde(default)]
    pub error_policy: ErrorPolicy,

    /// Capture each skipped error's value, not just the count.
    #[builder(default = "false")]
    #[serde(default)]
    pub collect_errors: bool,

    /// Attach walk statistics to the scan result.
    #[builder(default = "false")]
    #[serde(default)]
    pub collect_stats: bool,

    /// Emit incremental progress events.
    #[builder(default = "false")]
    #[serde(default)]
    pub enable_progress: bool,

    /// Maximum number of concurrently active group tasks (>= 1).
    #[builder(default = "4")]
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_concurrency() -> usize {
    4
}

impl ScanOptionsBuilder {
    fn check(&self) -> Result<(), String> {
        if self.concurrency == Some(0) {
            return Err("concurrency must be at least 1".to_string());
        }
        Ok(())
    }
}

impl ScanOptions {
    /// Create a new options builder.
    pub fn builder() -> ScanOptionsBuilder {
        ScanOptionsBuilder::default()
    }

    /// Validate the options eagerly, before any filesystem access.
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.concurrency == 0 {
            return Err(ScanError::InvalidOptions {
                message: "concurrency must be at least 1".into(),
            });
        }
        if let Some(max) = self.max_depth {
            if self.min_depth > max {
                return Err(ScanError::InvalidOptions {
                    message: format!(
                        "min_depth ({}) exceeds max_depth ({max})",
                        self.min_depth
                    ),
                });
            }
        }
        Ok(())
    }
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            mode: ScanMode::Dirs,
            max_depth: None,
            min_depth: 0,
            only_leaf: false,
            skip_empty_dirs: false,
            skip_root: false,
            include_hidden: false,
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            include_exts: Vec::new(),
            exclude_exts: Vec::new(),
            error_policy: ErrorPolicy::Skip,
            collect_errors: false,
            collect_stats: false,
            enable_progress: false,
            concurrency: 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let options = ScanOptions::builder().build().unwrap();
        assert_eq!(options.mode, ScanMode::Dirs);
        assert_eq!(options.max_depth, None);
        assert_eq!(options.error_policy, ErrorPolicy::Skip);
        assert_eq!(options.concurrency, 4);
        assert!(!options.include_hidden);
    }

    #[test]
    fn test_builder_rejects_zero_concurrency() {
        assert!(ScanOptions::builder().concurrency(0usize).build().is_err());
    }

    #[test]
    fn test_validate_depth_ordering() {
        let options = ScanOptions {
            max_depth: Some(1),
            min_depth: 3,
            ..Default::default()
        };
        assert!(matches!(
            options.validate(),
            Err(ScanError::InvalidOptions { .. })
        ));
    }

    #[test]
    fn test_mode_predicates() {
        assert!(ScanMode::Files.wants_files());
        assert!(!ScanMode::Files.wants_dirs());
        assert!(ScanMode::Dirs.wants_dirs());
        assert!(ScanMode::Mixed.wants_files() && ScanMode::Mixed.wants_dirs());
    }
}
