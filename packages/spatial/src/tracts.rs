//! Census tract polygons with per-tract demographics.
//!
//! Each feature is one tract: a `Polygon` or `MultiPolygon` geometry plus a
//! `geoid` (or `GEOID`), a `total_pop`, and either a precomputed `pct`
//! (`pct_attribute`) or a raw `group_pop` count from which the percentage
//! is derived.

use std::path::Path;

use geo::{BoundingRect, Contains, MultiPolygon};
use geojson::Feature;
use golf_map_scan::provider::{DemographicProvider, ProviderError};
use golf_map_scan_models::{Demographics, GeoPoint, is_valid_pct};
use rstar::{AABB, RTree, RTreeObject};

use crate::{SpatialError, count_property, number_property, read_features, string_property};

/// What is known about a tract's population.
enum TractStats {
    Known(Demographics),
    /// The tract has an identifier but no usable statistics.
    Unknown { region_id: String },
}

struct TractEntry {
    stats: TractStats,
    envelope: AABB<[f64; 2]>,
    polygon: MultiPolygon<f64>,
}

impl RTreeObject for TractEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// R-tree of census tracts answering point-in-tract demographic lookups.
pub struct TractIndex {
    tracts: RTree<TractEntry>,
}

impl TractIndex {
    /// Loads tract polygons and statistics from a `GeoJSON` file.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, SpatialError> {
        let index = Self::from_features(&read_features(path)?);
        log::info!(
            "Loaded {} census tracts into spatial index from {}",
            index.len(),
            path.display()
        );
        Ok(index)
    }

    /// Builds an index from `GeoJSON` text.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError`] if the text is not a feature or feature
    /// collection.
    pub fn from_geojson(geojson_str: &str) -> Result<Self, SpatialError> {
        Ok(Self::from_features(&crate::parse_features(geojson_str)?))
    }

    fn from_features(features: &[Feature]) -> Self {
        let mut entries = Vec::with_capacity(features.len());
        let mut skipped = 0usize;

        for feature in features {
            match feature_to_tract(feature) {
                Some(entry) => entries.push(entry),
                None => skipped += 1,
            }
        }

        if skipped > 0 {
            log::warn!("Skipped {skipped} tracts lacking a polygon or identifier");
        }

        let unknown = entries
            .iter()
            .filter(|entry| matches!(entry.stats, TractStats::Unknown { .. }))
            .count();
        if unknown > 0 {
            log::warn!("{unknown} tracts have missing or invalid statistics");
        }

        Self {
            tracts: RTree::bulk_load(entries),
        }
    }

    /// Number of indexed tracts, including those without statistics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tracts.size()
    }

    /// Whether the index has no tracts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tracts.size() == 0
    }

    /// Demographics of the tract containing `point`, if that tract has
    /// usable statistics.
    #[must_use]
    pub fn demographics_at(&self, point: GeoPoint) -> Option<&Demographics> {
        match &self.tract_at(point)?.stats {
            TractStats::Known(demographics) => Some(demographics),
            TractStats::Unknown { .. } => None,
        }
    }

    /// Tracts tile without overlap, so first match wins.
    fn tract_at(&self, point: GeoPoint) -> Option<&TractEntry> {
        let query = geo::Point::new(point.lng, point.lat);
        let query_env = AABB::from_point([point.lng, point.lat]);

        self.tracts
            .locate_in_envelope_intersecting(&query_env)
            .find(|entry| entry.polygon.contains(&query))
    }
}

impl DemographicProvider for TractIndex {
    fn lookup(&self, location: GeoPoint) -> Result<Option<Demographics>, ProviderError> {
        let Some(tract) = self.tract_at(location) else {
            return Ok(None);
        };

        match &tract.stats {
            TractStats::Known(demographics) => Ok(Some(demographics.clone())),
            TractStats::Unknown { region_id } => Err(ProviderError::Incomplete {
                region_id: region_id.clone(),
                message: "tract statistics missing or out of range".to_string(),
            }),
        }
    }
}

/// Tracts without usable statistics are kept when they carry an
/// identifier, so lookups can still report the enclosing region.
fn feature_to_tract(feature: &Feature) -> Option<TractEntry> {
    let polygon = feature_to_multipolygon(feature)?;
    let envelope = compute_envelope(&polygon)?;
    let region_id = string_property(feature, &["geoid", "GEOID", "census_geoid"]);

    let stats = match (feature_demographics(feature, region_id.clone()), region_id) {
        (Some(demographics), _) => TractStats::Known(demographics),
        (None, Some(region_id)) => TractStats::Unknown { region_id },
        (None, None) => return None,
    };

    Some(TractEntry {
        stats,
        envelope,
        polygon,
    })
}

fn feature_demographics(feature: &Feature, region_id: Option<String>) -> Option<Demographics> {
    let total_pop = count_property(feature, &["total_pop", "total_population"])?;

    let demographics = match number_property(feature, &["pct_attribute", "pct"]) {
        Some(pct) => Demographics {
            pct_attribute: pct,
            total_pop,
            region_id,
        },
        None => Demographics::from_counts(
            count_property(feature, &["group_pop"])?,
            total_pop,
            region_id,
        ),
    };

    if !is_valid_pct(demographics.pct_attribute) {
        log::warn!(
            "Tract {:?} has out-of-range percentage {}",
            demographics.region_id,
            demographics.pct_attribute
        );
        return None;
    }

    Some(demographics)
}

fn feature_to_multipolygon(feature: &Feature) -> Option<MultiPolygon<f64>> {
    let geometry: geo::Geometry<f64> = feature.geometry.clone()?.try_into().ok()?;
    match geometry {
        geo::Geometry::MultiPolygon(mp) => Some(mp),
        geo::Geometry::Polygon(p) => Some(MultiPolygon(vec![p])),
        _ => None,
    }
}

fn compute_envelope(mp: &MultiPolygon<f64>) -> Option<AABB<[f64; 2]>> {
    mp.bounding_rect()
        .map(|rect| AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(min_lng: f64, min_lat: f64, size: f64) -> serde_json::Value {
        serde_json::json!({
            "type": "Polygon",
            "coordinates": [[
                [min_lng, min_lat],
                [min_lng + size, min_lat],
                [min_lng + size, min_lat + size],
                [min_lng, min_lat + size],
                [min_lng, min_lat]
            ]]
        })
    }

    fn tracts_geojson() -> String {
        serde_json::json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "geometry": square(-77.0, 38.9, 0.1),
                    "properties": { "GEOID": "24033803502", "total_pop": 5120, "pct": 81.2 }
                },
                {
                    "type": "Feature",
                    "geometry": square(-76.9, 38.9, 0.1),
                    "properties": {
                        "geoid": "24033803601",
                        "total_pop": "4000",
                        "group_pop": "1000"
                    }
                },
                {
                    "type": "Feature",
                    "geometry": square(-76.8, 38.9, 0.1),
                    "properties": { "geoid": "bad-pct", "total_pop": 100, "pct": 140.0 }
                },
                {
                    "type": "Feature",
                    "geometry": { "type": "Point", "coordinates": [-76.7, 38.95] },
                    "properties": { "geoid": "not-a-polygon", "total_pop": 100, "pct": 10.0 }
                }
            ]
        })
        .to_string()
    }

    #[test]
    fn skips_features_without_polygon() {
        let index = TractIndex::from_geojson(&tracts_geojson()).unwrap();
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn finds_enclosing_tract() {
        let index = TractIndex::from_geojson(&tracts_geojson()).unwrap();

        let first = index.demographics_at(GeoPoint::new(38.95, -76.95)).unwrap();
        assert_eq!(first.region_id.as_deref(), Some("24033803502"));
        assert!((first.pct_attribute - 81.2).abs() < 1e-9);
        assert_eq!(first.total_pop, 5120);

        let second = index.demographics_at(GeoPoint::new(38.95, -76.85)).unwrap();
        assert_eq!(second.region_id.as_deref(), Some("24033803601"));
        assert!((second.pct_attribute - 25.0).abs() < 1e-9);
    }

    #[test]
    fn points_outside_every_tract_have_no_demographics() {
        let index = TractIndex::from_geojson(&tracts_geojson()).unwrap();

        let far_away = GeoPoint::new(40.0, -75.0);
        assert!(index.demographics_at(far_away).is_none());
        assert_eq!(index.lookup(far_away).unwrap(), None);
    }

    #[test]
    fn tract_with_bad_statistics_reports_its_region() {
        let index = TractIndex::from_geojson(&tracts_geojson()).unwrap();
        let inside_bad_pct = GeoPoint::new(38.95, -76.75);

        assert!(index.demographics_at(inside_bad_pct).is_none());
        assert!(matches!(
            index.lookup(inside_bad_pct),
            Err(ProviderError::Incomplete { region_id, .. }) if region_id == "bad-pct"
        ));
    }

    #[test]
    fn lookup_returns_owned_demographics() {
        let index = TractIndex::from_geojson(&tracts_geojson()).unwrap();
        let found = index.lookup(GeoPoint::new(38.95, -76.95)).unwrap().unwrap();
        assert_eq!(found.region_id.as_deref(), Some("24033803502"));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracts.geojson");
        std::fs::write(&path, tracts_geojson()).unwrap();

        assert_eq!(TractIndex::load(&path).unwrap().len(), 3);
    }
}
