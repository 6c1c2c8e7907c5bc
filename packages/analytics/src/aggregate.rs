//! Population-weighted distance aggregation.
//!
//! Only courses with both a percentage and a population take part in the
//! distance table. Each contributes `pct / 100 * total_pop` weighted
//! people; rows are ordered by distance from the origin (ties keep
//! discovery order) and carry the running sum and its fraction of the
//! total. When the total is zero there is nothing to weight by, so the
//! table is empty and the mean distance is `None`.
//!
//! The threshold split counts every course with a percentage, whether or
//! not it has a population.

use golf_map_analytics_models::{AggregatedRow, Aggregation, BinarySplit};
use golf_map_scan::distance::haversine_miles;
use golf_map_scan_models::{Entity, GeoPoint};

use crate::round_to;

/// Default threshold for the binary split, in percent.
pub const DEFAULT_THRESHOLD: f64 = 51.0;

/// Default decimal places for the mean distance.
pub const DEFAULT_PRECISION: u8 = 2;

/// Parameters for [`aggregate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregateOptions {
    /// Threshold `T` for the binary split.
    pub threshold: f64,
    /// Decimal places for `mean_weighted_distance`.
    pub precision: u8,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            precision: DEFAULT_PRECISION,
        }
    }
}

/// A course that qualified for the distance table.
struct Measured<'a> {
    entity: &'a Entity,
    distance: f64,
    weighted_pop: f64,
}

/// Aggregates `entities` around `origin`.
#[must_use]
pub fn aggregate(entities: &[Entity], origin: GeoPoint, options: AggregateOptions) -> Aggregation {
    let measured = entities
        .iter()
        .filter_map(|entity| {
            let pct = entity.pct_attribute?;
            let pop = entity.total_pop?;
            Some((entity, haversine_miles(origin, entity.location), pct, pop))
        })
        .map(|(entity, distance, pct, pop)| Measured {
            entity,
            distance,
            weighted_pop: weighted_pop(pct, pop),
        })
        .collect();

    let (rows, total_weighted_pop, mean_weighted_distance) =
        cumulative_by_distance(measured, options.precision);

    Aggregation {
        rows,
        total_weighted_pop,
        mean_weighted_distance,
        split: binary_split(entities, options.threshold),
    }
}

/// `pct / 100 * total_pop`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn weighted_pop(pct: f64, total_pop: u64) -> f64 {
    pct / 100.0 * total_pop as f64
}

/// Counts courses above and at-or-below `threshold`. Courses without a
/// percentage are in neither count.
#[must_use]
pub fn binary_split(entities: &[Entity], threshold: f64) -> BinarySplit {
    let with_pct: Vec<f64> = entities.iter().filter_map(|e| e.pct_attribute).collect();
    let above = with_pct.iter().filter(|&&pct| pct > threshold).count();
    let at_or_below = with_pct.iter().filter(|&&pct| pct <= threshold).count();

    BinarySplit {
        threshold,
        above,
        at_or_below,
    }
}

/// Distance-ordered rows, total weighted population, and rounded mean
/// distance.
type DistanceTable = (Vec<AggregatedRow>, f64, Option<f64>);

fn cumulative_by_distance(mut measured: Vec<Measured<'_>>, precision: u8) -> DistanceTable {
    measured.sort_by(|a, b| a.distance.total_cmp(&b.distance));

    let total_weighted_pop: f64 = measured.iter().map(|m| m.weighted_pop).sum();

    if total_weighted_pop <= 0.0 || !total_weighted_pop.is_finite() {
        if !measured.is_empty() {
            log::info!(
                "{} courses have demographics but zero weighted population; \
                 no distance table",
                measured.len()
            );
        }
        return (Vec::new(), total_weighted_pop, None);
    }

    let mut cumulative = 0.0;
    let mut weighted_distance = 0.0;
    let rows = measured
        .into_iter()
        .map(|m| {
            cumulative += m.weighted_pop;
            weighted_distance += m.distance * m.weighted_pop;
            AggregatedRow {
                entity: m.entity.clone(),
                distance_from_origin: m.distance,
                weighted_pop: m.weighted_pop,
                cumulative_weighted_pop: cumulative,
                relative_fraction: cumulative / total_weighted_pop,
            }
        })
        .collect();

    let mean = round_to(weighted_distance / total_weighted_pop, precision);

    (rows, total_weighted_pop, Some(mean))
}

#[cfg(test)]
mod tests {
    use golf_map_scan::distance::miles_to_lat_degrees;

    use super::*;

    const ORIGIN: GeoPoint = GeoPoint::new(38.938_3, -76.820_2);

    /// A course `miles` due north of [`ORIGIN`].
    fn course(id: &str, miles: f64, pct: Option<f64>, pop: Option<u64>) -> Entity {
        Entity {
            id: id.to_string(),
            name: format!("Course {id}"),
            location: GeoPoint::new(ORIGIN.lat + miles_to_lat_degrees(miles), ORIGIN.lng),
            pct_attribute: pct,
            total_pop: pop,
            region_id: None,
        }
    }

    #[test]
    fn worked_example() {
        let entities = vec![
            course("2", 12.0, Some(10.0), Some(2000)),
            course("1", 5.0, Some(60.0), Some(1000)),
        ];

        let result = aggregate(&entities, ORIGIN, AggregateOptions::default());

        assert_eq!(result.split.above, 1);
        assert_eq!(result.split.at_or_below, 1);

        let ids: Vec<&str> = result.rows.iter().map(|r| r.entity.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);

        assert!((result.rows[0].weighted_pop - 600.0).abs() < 1e-9);
        assert!((result.rows[1].weighted_pop - 200.0).abs() < 1e-9);
        assert!((result.total_weighted_pop - 800.0).abs() < 1e-9);
        assert!((result.rows[0].relative_fraction - 0.75).abs() < 1e-9);
        assert!((result.rows[1].relative_fraction - 1.0).abs() < 1e-9);
        assert!((result.rows[0].distance_from_origin - 5.0).abs() < 1e-6);
        assert_eq!(result.mean_weighted_distance, Some(6.75));
    }

    #[test]
    fn fractions_are_non_decreasing_and_end_at_one() {
        let entities: Vec<Entity> = (0..25u32)
            .map(|i| {
                course(
                    &i.to_string(),
                    f64::from((i * 7) % 13) + 0.5,
                    Some(f64::from(i * 4)),
                    Some(u64::from(100 + i * 37)),
                )
            })
            .collect();

        let result = aggregate(&entities, ORIGIN, AggregateOptions::default());

        assert!(!result.rows.is_empty());
        for pair in result.rows.windows(2) {
            assert!(pair[0].relative_fraction <= pair[1].relative_fraction);
            assert!(pair[0].distance_from_origin <= pair[1].distance_from_origin);
        }
        let last = result.rows.last().unwrap();
        assert!((last.relative_fraction - 1.0).abs() < 1e-9);
    }

    #[test]
    fn out_of_range_percentages_in_saved_session_are_ignored() {
        let contents = r#"{
            "metadata": { "origin": { "lat": 38.9383, "lng": -76.8202 } },
            "entities": [
                {
                    "id": "near",
                    "name": "Near",
                    "location": { "lat": 38.95, "lng": -76.8202 },
                    "pct_attribute": 150.0,
                    "total_pop": 1000
                },
                {
                    "id": "middle",
                    "name": "Middle",
                    "location": { "lat": 39.0, "lng": -76.8202 },
                    "pct_attribute": 60.0,
                    "total_pop": 1000
                },
                {
                    "id": "far",
                    "name": "Far",
                    "location": { "lat": 39.05, "lng": -76.8202 },
                    "pct_attribute": -40.0,
                    "total_pop": 1000
                }
            ]
        }"#;
        let saved = golf_map_scan::store::parse(contents).unwrap();

        let result = aggregate(&saved.entities, ORIGIN, AggregateOptions::default());

        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0].entity.id, "middle");
        assert!((result.total_weighted_pop - 600.0).abs() < 1e-9);
        for row in &result.rows {
            let fraction = row.relative_fraction;
            assert!(fraction > 0.0 && fraction <= 1.0, "{fraction}");
        }
        for pair in result.rows.windows(2) {
            assert!(pair[0].relative_fraction <= pair[1].relative_fraction);
        }
        assert_eq!(result.split.above, 1);
        assert_eq!(result.split.at_or_below, 0);
    }

    #[test]
    fn all_zero_percentages_yield_no_table() {
        let entities = vec![
            course("1", 3.0, Some(0.0), Some(1000)),
            course("2", 8.0, Some(0.0), Some(4000)),
        ];

        let result = aggregate(&entities, ORIGIN, AggregateOptions::default());

        assert!(result.rows.is_empty());
        assert_eq!(result.mean_weighted_distance, None);
        assert_eq!(result.split.at_or_below, 2);
    }

    #[test]
    fn no_courses_yield_no_table() {
        let result = aggregate(&[], ORIGIN, AggregateOptions::default());
        assert!(result.rows.is_empty());
        assert_eq!(result.mean_weighted_distance, None);
        assert_eq!(result.split.above + result.split.at_or_below, 0);
    }

    #[test]
    fn courses_missing_demographics_are_excluded_from_table() {
        let entities = vec![
            course("1", 4.0, Some(60.0), Some(1000)),
            course("2", 2.0, None, None),
            course("3", 1.0, Some(80.0), None),
        ];

        let result = aggregate(&entities, ORIGIN, AggregateOptions::default());

        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0].entity.id, "1");
        // Course 3 has a percentage, so it still counts in the split.
        assert_eq!(result.split.above, 2);
        assert_eq!(result.split.at_or_below, 0);
        assert_eq!(result.mean_weighted_distance, Some(4.0));
    }

    #[test]
    fn equal_distances_keep_discovery_order() {
        let entities = vec![
            course("b", 5.0, Some(10.0), Some(100)),
            course("a", 5.0, Some(10.0), Some(100)),
            course("c", 1.0, Some(10.0), Some(100)),
        ];

        let result = aggregate(&entities, ORIGIN, AggregateOptions::default());
        let ids: Vec<&str> = result.rows.iter().map(|r| r.entity.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
    }

    #[test]
    fn custom_threshold_and_precision() {
        let entities = vec![
            course("1", 1.0, Some(30.0), Some(100)),
            course("2", 2.0, Some(20.0), Some(100)),
        ];
        let options = AggregateOptions {
            threshold: 25.0,
            precision: 0,
        };

        let result = aggregate(&entities, ORIGIN, options);

        assert_eq!(result.split.above, 1);
        assert_eq!(result.split.at_or_below, 1);
        assert!((result.split.threshold - 25.0).abs() < f64::EPSILON);
        // (1 * 30 + 2 * 20) / 50 = 1.4
        assert_eq!(result.mean_weighted_distance, Some(1.0));
    }

    #[test]
    fn threshold_boundary_counts_as_at_or_below() {
        let entities = vec![course("1", 1.0, Some(51.0), None)];
        let split = binary_split(&entities, 51.0);
        assert_eq!(split.above, 0);
        assert_eq!(split.at_or_below, 1);
    }
}
