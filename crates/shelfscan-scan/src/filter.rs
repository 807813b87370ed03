//! Include/exclude filtering for entry names and file extensions.

use globset::{Glob, GlobSet, GlobSetBuilder};

use shelfscan_core::{ScanError, ScanOptions};

/// Compiled name and extension filters for one walk.
///
/// Pattern rules apply to both files and directories; extension rules apply
/// to files only. An entry fails when it matches an exclude rule or fails
/// to match a non-empty include list.
#[derive(Debug)]
pub struct EntryFilter {
    include: Option<GlobSet>,
    exclude: Option<GlobSet>,
    include_exts: Vec<String>,
    exclude_exts: Vec<String>,
}

impl EntryFilter {
    /// Compile the filters from scan options.
    ///
    /// Malformed glob patterns are rejected here, before any filesystem
    /// access.
    pub fn new(options: &ScanOptions) -> Result<Self, ScanError> {
        Ok(Self {
            include: build_set(&options.include_patterns)?,
            exclude: build_set(&options.exclude_patterns)?,
            include_exts: options.include_exts.iter().map(|e| normalize_ext(e)).collect(),
            exclude_exts: options.exclude_exts.iter().map(|e| normalize_ext(e)).collect(),
        })
    }

    /// Whether a directory name passes the pattern rules.
    pub fn matches_dir(&self, name: &str) -> bool {
        self.matches_patterns(name)
    }

    /// Whether a file name passes the pattern and extension rules.
    pub fn matches_file(&self, name: &str) -> bool {
        if !self.matches_patterns(name) {
            return false;
        }

        let ext = ext_of(name);
        if !self.include_exts.is_empty() {
            match &ext {
                Some(e) if self.include_exts.iter().any(|i| i == e) => {}
                _ => return false,
            }
        }
        if let Some(e) = &ext {
            if self.exclude_exts.iter().any(|x| x == e) {
                return false;
            }
        }
        true
    }

    fn matches_patterns(&self, name: &str) -> bool {
        if let Some(include) = &self.include {
            if !include.is_match(name) {
                return false;
            }
        }
        if let Some(exclude) = &self.exclude {
            if exclude.is_match(name) {
                return false;
            }
        }
        true
    }
}

fn build_set(patterns: &[String]) -> Result<Option<GlobSet>, ScanError> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| ScanError::InvalidOptions {
            message: format!("bad glob pattern {pattern:?}: {e}"),
        })?;
        builder.add(glob);
    }
    let set = builder.build().map_err(|e| ScanError::InvalidOptions {
        message: format!("cannot compile glob set: {e}"),
    })?;
    Ok(Some(set))
}

fn normalize_ext(ext: &str) -> String {
    ext.trim_start_matches('.').to_ascii_lowercase()
}

fn ext_of(name: &str) -> Option<String> {
    std::path::Path::new(name)
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> ScanOptions {
        ScanOptions::default()
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = EntryFilter::new(&options()).unwrap();
        assert!(filter.matches_dir("Action"));
        assert!(filter.matches_file("movie.mkv"));
    }

    #[test]
    fn test_include_patterns() {
        let mut opts = options();
        opts.include_patterns = vec!["*.mkv".into(), "*.mp4".into()];
        let filter = EntryFilter::new(&opts).unwrap();

        assert!(filter.matches_file("Heat.mkv"));
        assert!(!filter.matches_file("Heat.srt"));
    }

    #[test]
    fn test_exclude_wins() {
        let mut opts = options();
        opts.include_patterns = vec!["*.mkv".into()];
        opts.exclude_patterns = vec!["sample*".into()];
        let filter = EntryFilter::new(&opts).unwrap();

        assert!(filter.matches_file("Heat.mkv"));
        assert!(!filter.matches_file("sample.mkv"));
        assert!(!filter.matches_dir("samples"));
    }

    #[test]
    fn test_extension_filters_normalize_dot_and_case() {
        let mut opts = options();
        opts.include_exts = vec![".MKV".into()];
        let filter = EntryFilter::new(&opts).unwrap();

        assert!(filter.matches_file("Heat.mkv"));
        assert!(filter.matches_file("Heat.MKV"));
        assert!(!filter.matches_file("Heat.avi"));
        assert!(!filter.matches_file("noext"));
    }

    #[test]
    fn test_exclude_extension() {
        let mut opts = options();
        opts.exclude_exts = vec!["srt".into()];
        let filter = EntryFilter::new(&opts).unwrap();

        assert!(filter.matches_file("Heat.mkv"));
        assert!(!filter.matches_file("Heat.srt"));
    }

    #[test]
    fn test_bad_pattern_rejected_eagerly() {
        let mut opts = options();
        opts.include_patterns = vec!["a[".into()];
        assert!(matches!(
            EntryFilter::new(&opts),
            Err(ScanError::InvalidOptions { .. })
        ));
    }
}
