//! Per-category usage breakdown for charting.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::models::{AppCategory, UsageRecord};

/// Usage summed over every record sharing a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryUsageItem {
    pub category: AppCategory,
    /// Total foreground time (ms)
    pub foreground_ms: u64,
    /// Number of apps in category
    pub app_count: u32,
    /// Percentage of the included foreground time (0.0 - 100.0)
    pub percentage: f64,
}

/// Records whose category label is in `filter`. An empty filter keeps all.
pub fn records_in_categories<'a>(
    records: &'a [UsageRecord],
    filter: &HashSet<String>,
) -> Vec<&'a UsageRecord> {
    records
        .iter()
        .filter(|record| filter.is_empty() || filter.contains(&record.category.label))
        .collect()
}

/// Group records by category, largest first, ties by label.
pub fn category_breakdown(
    records: &[UsageRecord],
    filter: &HashSet<String>,
) -> Vec<CategoryUsageItem> {
    let included = records_in_categories(records, filter);
    let total_ms: u64 = included
        .iter()
        .fold(0u64, |acc, record| acc.saturating_add(record.foreground_ms));

    let mut groups: BTreeMap<(i32, String), (u64, u32)> = BTreeMap::new();
    for record in included {
        let key = (record.category.id, record.category.label.clone());
        let entry = groups.entry(key).or_default();
        entry.0 = entry.0.saturating_add(record.foreground_ms);
        entry.1 += 1;
    }

    let mut items: Vec<CategoryUsageItem> = groups
        .into_iter()
        .map(|((id, label), (foreground_ms, app_count))| CategoryUsageItem {
            category: AppCategory { id, label },
            foreground_ms,
            app_count,
            percentage: if total_ms > 0 {
                (foreground_ms as f64 / total_ms as f64) * 100.0
            } else {
                0.0
            },
        })
        .collect();

    items.sort_by(|a, b| {
        b.foreground_ms
            .cmp(&a.foreground_ms)
            .then_with(|| a.category.label.cmp(&b.category.label))
    });
    items
}
