//! Media library scanning engine for shelfscan.
//!
//! This crate traverses library roots, classifies title folders, and
//! assembles a deterministic [`ScanResult`].
//!
//! # Overview
//!
//! `shelfscan-scan` turns a directory tree like `/media/Movies/<genre>/<title>`
//! into structured scan output. Key features:
//!
//! - **Concurrent groups** via a semaphore-bounded task set
//! - **Progress updates** via broadcast channels
//! - **Shared directory cache** so no directory is listed twice
//! - **Configurable** depth limits, glob filters, error policy, etc.
//!
//! # Example
//!
//! ```rust,no_run
//! use shelfscan_scan::{ContentKind, MediaScanner, ScanOptions, ScanRoot};
//!
//! # async fn run() -> Result<(), shelfscan_scan::ScanError> {
//! let scanner = MediaScanner::new(ScanOptions::default())?;
//! let roots = [ScanRoot::new("/media/Movies")];
//! let result = scanner.scan(ContentKind::Movies, &roots).await?;
//!
//! println!("{} titles in {} genres", result.total_items, result.group_count);
//! # Ok(())
//! # }
//! ```
//!
//! # Progress Monitoring
//!
//! Subscribe to progress snapshots before starting a scan:
//!
//! ```rust,no_run
//! use shelfscan_scan::{MediaScanner, ScanOptions};
//!
//! # fn run() -> Result<(), shelfscan_scan::ScanError> {
//! let options = ScanOptions { enable_progress: true, ..Default::default() };
//! let scanner = MediaScanner::new(options)?;
//! let mut progress_rx = scanner.subscribe();
//!
//! tokio::spawn(async move {
//!     while let Ok(progress) = progress_rx.recv().await {
//!         println!("{}/{} groups", progress.groups_done, progress.groups_total);
//!     }
//! });
//! # Ok(())
//! # }
//! ```

mod assemble;
mod cache;
mod classify;
mod filter;
mod progress;
mod scheduler;
mod stats;
mod walker;

pub use cache::{DirCache, DirSnapshot, EntryMeta};
pub use classify::{Classifier, find_icon, resolve_status};
pub use filter::EntryFilter;
pub use progress::ScanProgress;
pub use scheduler::{MediaScanner, ScanRoot};
pub use stats::StatsCollector;
pub use walker::{WalkCounts, Walker};

// Re-export core types for convenience
pub use shelfscan_core::{
    ContentKind, ErrorPolicy, IconRef, ItemKind, ItemStatus, ScanError, ScanGroup, ScanIssue,
    ScanItem, ScanMode, ScanOptions, ScanOptionsBuilder, ScanResult, WalkStats,
};
