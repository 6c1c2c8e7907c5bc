#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Aggregation and report types for golf course demographic analysis.
//!
//! A [`Report`] is the hand-off to chart rendering: the distance-ordered
//! cumulative table, the population-weighted mean distance, the binary
//! threshold split, the percentage histogram, and the category breakdown.

use chrono::{DateTime, Utc};
use golf_map_scan_models::{Entity, GeoPoint};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A course with demographics, placed in the distance-ordered cumulative
/// table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedRow {
    /// The underlying course.
    #[serde(flatten)]
    pub entity: Entity,
    /// Great-circle distance from the search origin, in miles.
    pub distance_from_origin: f64,
    /// `pct_attribute / 100 * total_pop`.
    pub weighted_pop: f64,
    /// Running sum of `weighted_pop` up to and including this row.
    pub cumulative_weighted_pop: f64,
    /// `cumulative_weighted_pop / total_weighted_pop`.
    pub relative_fraction: f64,
}

/// Course counts on either side of a percentage threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinarySplit {
    /// The threshold `T`.
    pub threshold: f64,
    /// Courses with `pct_attribute > T`.
    pub above: usize,
    /// Courses with `pct_attribute <= T`.
    pub at_or_below: usize,
}

/// Output of the distance-weighted aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregation {
    /// Rows sorted by distance; empty when the total weighted population is
    /// zero.
    pub rows: Vec<AggregatedRow>,
    /// Sum of `weighted_pop` over all rows that qualified.
    pub total_weighted_pop: f64,
    /// Population-weighted mean distance in miles, rounded to the requested
    /// precision. `None` when the total weighted population is zero.
    pub mean_weighted_distance: Option<f64>,
    /// Threshold split over every course with a percentage.
    pub split: BinarySplit,
}

/// One fixed-width bin of the percentage histogram.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    /// Inclusive lower edge.
    pub lower: f64,
    /// Upper edge; exclusive except for the last bin.
    pub upper: f64,
    /// Courses whose percentage falls in the bin.
    pub count: usize,
}

/// Neighborhood grouping by share of the tracked population.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DemographicCategory {
    /// More than 50%.
    Majority,
    /// More than 25%, up to 50%.
    Significant,
    /// 25% or less.
    Minimal,
}

impl DemographicCategory {
    /// All categories, highest share first.
    pub const ALL: [Self; 3] = [Self::Majority, Self::Significant, Self::Minimal];

    /// Categorizes a percentage.
    #[must_use]
    pub fn from_pct(pct: f64) -> Self {
        if pct > 50.0 {
            Self::Majority
        } else if pct > 25.0 {
            Self::Significant
        } else {
            Self::Minimal
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Majority => "Majority (>50%)",
            Self::Significant => "Significant (25-50%)",
            Self::Minimal => "Minimal (<=25%)",
        }
    }
}

/// Course count in one [`DemographicCategory`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryCount {
    /// The category.
    pub category: DemographicCategory,
    /// Courses in the category.
    pub count: usize,
    /// Share of all categorized courses, 0-100, two decimals.
    pub percentage_of_total: f64,
}

/// Everything chart rendering needs for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Search origin distances are measured from.
    pub origin: GeoPoint,
    /// When the report was built.
    pub generated_at: DateTime<Utc>,
    /// Courses discovered, with or without demographics.
    pub total_courses: usize,
    /// Courses with both a percentage and a population.
    pub courses_with_demographics: usize,
    /// Distance-weighted aggregation.
    pub aggregation: Aggregation,
    /// Percentage histogram.
    pub histogram: Vec<HistogramBin>,
    /// Category breakdown, largest first.
    pub categories: Vec<CategoryCount>,
}
