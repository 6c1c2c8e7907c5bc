//! Course counts by neighborhood demographic category.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use golf_map_analytics_models::{CategoryCount, DemographicCategory};
use golf_map_scan_models::Entity;

use crate::round_to;

/// Counts courses per [`DemographicCategory`], largest share first.
///
/// Only courses with a percentage are categorized. Empty categories are
/// omitted.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn category_breakdown(entities: &[Entity]) -> Vec<CategoryCount> {
    let mut counts: BTreeMap<DemographicCategory, usize> = BTreeMap::new();
    for pct in entities.iter().filter_map(|e| e.pct_attribute) {
        let category = DemographicCategory::from_pct(pct);
        *counts.entry(category).or_default() += 1;
    }

    let total: usize = counts.values().sum();

    let mut breakdown: Vec<CategoryCount> = counts
        .into_iter()
        .map(|(category, count)| CategoryCount {
            category,
            count,
            percentage_of_total: round_to(count as f64 / total as f64 * 100.0, 2),
        })
        .collect();

    // Stable, so equal counts stay in category order.
    breakdown.sort_by_key(|c| Reverse(c.count));
    breakdown
}
