//! Assembles the [`Report`] handed to chart rendering.

use std::path::Path;

use chrono::Utc;
use golf_map_analytics_models::Report;
use golf_map_scan_models::{Entity, GeoPoint};

use crate::AnalyticsError;
use crate::aggregate::{AggregateOptions, aggregate};
use crate::category::category_breakdown;
use crate::histogram::{DEFAULT_BINS, histogram};

/// Parameters for [`build_report`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportOptions {
    /// Aggregation threshold and precision.
    pub aggregate: AggregateOptions,
    /// Number of percentage histogram bins.
    pub histogram_bins: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            aggregate: AggregateOptions::default(),
            histogram_bins: DEFAULT_BINS,
        }
    }
}

/// Builds a report over `entities` measured from `origin`.
#[must_use]
pub fn build_report(entities: &[Entity], origin: GeoPoint, options: ReportOptions) -> Report {
    let aggregation = aggregate(entities, origin, options.aggregate);

    Report {
        origin,
        generated_at: Utc::now(),
        total_courses: entities.len(),
        courses_with_demographics: entities.iter().filter(|e| e.has_demographics()).count(),
        aggregation,
        histogram: histogram(entities, options.histogram_bins),
        categories: category_breakdown(entities),
    }
}

/// Logs the headline numbers of a report.
pub fn log_summary(report: &Report) {
    let split = &report.aggregation.split;

    log::info!(
        "{} courses around {} ({} with demographics)",
        report.total_courses,
        report.origin,
        report.courses_with_demographics
    );
    log::info!(
        "{} courses above {}%, {} at or below",
        split.above,
        split.threshold,
        split.at_or_below
    );
    match report.aggregation.mean_weighted_distance {
        Some(mean) => log::info!("Weighted mean distance: {mean} mi"),
        None => log::info!("Weighted mean distance: n/a (no weighted population)"),
    }
    for category in &report.categories {
        log::info!(
            "  {}: {} courses ({}%)",
            category.category.label(),
            category.count,
            category.percentage_of_total
        );
    }
}

/// Writes `report` to `path` as pretty-printed JSON.
///
/// # Errors
///
/// Returns [`AnalyticsError`] if serialization or the write fails.
pub fn write_report(path: &Path, report: &Report) -> Result<(), AnalyticsError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(report)?)?;

    log::info!("Report written to {}", path.display());
    Ok(())
}
