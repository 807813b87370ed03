//! Classified media model: items, groups, and the scan result document.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::stats::WalkStats;

/// Which kind of library a scan classifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    /// Movie titles; nested folders become collections.
    Movies,
    /// TV shows; immediate subfolders become seasons.
    Tv,
}

/// Classified kind of one scanned item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// A title folder with no subdirectories.
    Single,
    /// A movie folder containing further title folders.
    Collection,
    /// A TV show folder.
    Show,
    /// One season folder inside a show.
    Season,
}

/// Derived health of a title folder: icon plus companion metadata file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    /// Both an `.ico` file and `desktop.ini` are present.
    Ok,
    /// Only the `.ico` file is present.
    Warn,
    /// Neither is present.
    Missing,
}

/// Reference to the icon file resolved for an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IconRef {
    /// Icon file name.
    pub name: CompactString,
    /// Absolute path to the icon file.
    pub path: PathBuf,
    /// Icon file size in bytes.
    pub size: u64,
}

/// One classified entry of the library tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanItem {
    /// Classified kind.
    #[serde(rename = "type")]
    pub kind: ItemKind,
    /// Folder name.
    pub name: CompactString,
    /// Absolute path.
    pub path: PathBuf,
    /// Icon/metadata health.
    pub status: ItemStatus,
    /// Resolved icon, if any. Serialized as `null` when absent.
    pub icon: Option<IconRef>,
    /// Ancestor folder names from the scan root (e.g. the genre).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub group: Vec<CompactString>,
    /// Root label this item was found under, when the root was labeled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<CompactString>,
    /// Children (collection members or seasons). Omitted when empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<ScanItem>,
}

/// One top-level category folder and its classified items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanGroup {
    /// Group (genre/category) folder name.
    pub name: CompactString,
    /// Items in name order.
    pub items: Vec<ScanItem>,
}

/// The full scan output document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    /// Document kind tag, always `"raw"`.
    #[serde(rename = "type")]
    pub kind: CompactString,
    /// Wall-clock time the result was assembled.
    #[serde(rename = "generatedAt")]
    pub generated_at: DateTime<Utc>,
    /// Elapsed scan time in milliseconds.
    #[serde(rename = "scanDurationMs")]
    pub scan_duration_ms: u64,
    /// Number of top-level items across all groups.
    #[serde(rename = "totalItems")]
    pub total_items: usize,
    /// Number of groups with at least one item.
    #[serde(rename = "groupCount")]
    pub group_count: usize,
    /// Groups in name order.
    pub data: Vec<ScanGroup>,
    /// Walk statistics, present when `collect_stats` was enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<WalkStats>,
}

impl ScanItem {
    /// Create an item with no icon and no children.
    pub fn new(
        kind: ItemKind,
        name: impl Into<CompactString>,
        path: impl Into<PathBuf>,
        status: ItemStatus,
    ) -> Self {
        Self {
            kind,
            name: name.into(),
            path: path.into(),
            status,
            icon: None,
            group: Vec::new(),
            source: None,
            items: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_json_shape() {
        let item = ScanItem::new(
            ItemKind::Single,
            "Heat (1995)",
            "/media/Movies/Action/Heat (1995)",
            ItemStatus::Missing,
        );
        let value = serde_json::to_value(&item).unwrap();

        assert_eq!(value["type"], "single");
        assert_eq!(value["name"], "Heat (1995)");
        assert_eq!(value["status"], "missing");
        // Absent icon serializes as an explicit null.
        assert!(value["icon"].is_null());
        // Empty children and group are omitted entirely.
        assert!(value.get("items").is_none());
        assert!(value.get("group").is_none());
    }

    #[test]
    fn test_result_field_names() {
        let result = ScanResult {
            kind: "raw".into(),
            generated_at: Utc::now(),
            scan_duration_ms: 12,
            total_items: 2,
            group_count: 1,
            data: vec![ScanGroup {
                name: "Action".into(),
                items: Vec::new(),
            }],
            stats: None,
        };
        let value = serde_json::to_value(&result).unwrap();

        assert_eq!(value["type"], "raw");
        assert_eq!(value["totalItems"], 2);
        assert_eq!(value["groupCount"], 1);
        assert!(value["generatedAt"].is_string());
        assert!(value["scanDurationMs"].is_number());
        assert!(value.get("stats").is_none());
        assert_eq!(value["data"][0]["name"], "Action");
    }

    #[test]
    fn test_kind_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(ItemKind::Collection).unwrap(),
            "collection"
        );
        assert_eq!(serde_json::to_value(ItemStatus::Warn).unwrap(), "warn");
        assert_eq!(serde_json::to_value(ContentKind::Tv).unwrap(), "tv");
    }
}
