//! Error types for scanning operations.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during scanning.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A scan root is not a directory.
    #[error("Root path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// Options were rejected before the scan started.
    #[error("Invalid options: {message}")]
    InvalidOptions { message: String },

    /// The scan was cancelled by the caller.
    #[error("Scan cancelled")]
    Cancelled,

    /// Other error.
    #[error("{message}")]
    Other { message: String },
}

impl ScanError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }

    /// Whether this error may be absorbed by the skip-on-error policy.
    ///
    /// Listing and stat failures are recoverable; cancellation and
    /// malformed options are not.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::PermissionDenied { .. } | Self::NotFound { .. } | Self::Io { .. }
        )
    }
}

/// Serializable record of one skipped error, captured when `collect_errors`
/// is enabled.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScanIssue {
    /// Path where the error occurred.
    pub path: PathBuf,
    /// Human-readable message.
    pub message: String,
}

impl ScanIssue {
    /// Record an error against the path it occurred at.
    pub fn new(path: impl AsRef<Path>, error: &ScanError) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            message: error.to_string(),
        }
    }
}
