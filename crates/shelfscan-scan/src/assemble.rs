//! Final result assembly.

use std::collections::BTreeMap;

use chrono::Utc;
use compact_str::CompactString;

use shelfscan_core::{ScanGroup, ScanItem, ScanResult};

use crate::stats::StatsCollector;

/// Turn the merged per-group map into a [`ScanResult`].
///
/// The map's key order fixes the group order; item order within each
/// group was fixed by the scheduler before aggregation. Groups that
/// produced no items are dropped.
pub fn assemble(
    groups: BTreeMap<CompactString, Vec<ScanItem>>,
    stats: &StatsCollector,
    collect_stats: bool,
) -> ScanResult {
    let data: Vec<ScanGroup> = groups
        .into_iter()
        .filter(|(_, items)| !items.is_empty())
        .map(|(name, items)| ScanGroup { name, items })
        .collect();
    let total_items = data.iter().map(|group| group.items.len()).sum();

    ScanResult {
        kind: "raw".into(),
        generated_at: Utc::now(),
        scan_duration_ms: stats.elapsed().as_millis() as u64,
        total_items,
        group_count: data.len(),
        data,
        stats: collect_stats.then(|| stats.finalize()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelfscan_core::{ItemKind, ItemStatus};

    #[test]
    fn test_assemble_counts_and_order() {
        let mut groups: BTreeMap<CompactString, Vec<ScanItem>> = BTreeMap::new();
        groups.insert(
            CompactString::from("Comedy"),
            vec![ScanItem::new(
                ItemKind::Single,
                "Airplane!",
                "/m/Comedy/Airplane!",
                ItemStatus::Ok,
            )],
        );
        groups.insert(
            CompactString::from("Action"),
            vec![
                ScanItem::new(ItemKind::Single, "Heat", "/m/Action/Heat", ItemStatus::Ok),
                ScanItem::new(
                    ItemKind::Single,
                    "Ronin",
                    "/m/Action/Ronin",
                    ItemStatus::Missing,
                ),
            ],
        );
        groups.insert(CompactString::from("Empty"), Vec::new());

        let stats = StatsCollector::new();
        let result = assemble(groups, &stats, false);
        assert_eq!(result.kind, "raw");
        assert_eq!(result.total_items, 3);
        assert_eq!(result.group_count, 2);
        assert_eq!(result.data[0].name, "Action");
        assert_eq!(result.data[1].name, "Comedy");
        assert!(result.stats.is_none());
    }

    #[test]
    fn test_assemble_attaches_stats() {
        let stats = StatsCollector::new();
        stats.record_file(10);
        let result = assemble(BTreeMap::new(), &stats, true);
        let walk = result.stats.unwrap();
        assert_eq!(walk.files_visited, 1);
        assert_eq!(walk.total_size, 10);
    }
}
