//! Core types and traits for shelfscan.
//!
//! This crate provides the fundamental data structures used throughout
//! the shelfscan ecosystem: scan options, the classified media model
//! (items, groups, results), walk statistics, and error types.

mod error;
mod model;
mod options;
mod stats;

pub use error::{ScanError, ScanIssue};
pub use model::{
    ContentKind, IconRef, ItemKind, ItemStatus, ScanGroup, ScanItem, ScanResult,
};
pub use options::{ErrorPolicy, ScanMode, ScanOptions, ScanOptionsBuilder};
pub use stats::WalkStats;
