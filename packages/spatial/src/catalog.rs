//! Course discovery from a local `GeoJSON` catalog.
//!
//! Each feature is one course. Point features are used as-is; polygon
//! features (course boundaries, as exported from `OpenStreetMap`) are
//! reduced to their centroid. The identifier is read from the `place_id`
//! or `id` property, falling back to the feature id.

use std::path::Path;

use geo::Centroid;
use geojson::Feature;
use golf_map_scan::distance::{haversine_miles, miles_to_lat_degrees};
use golf_map_scan::provider::{DiscoveryProvider, ProviderError};
use golf_map_scan_models::{Candidate, GeoPoint, Radius};
use rstar::{AABB, RTree, RTreeObject};

use crate::{SpatialError, read_features, string_property};

/// Envelope padding so the degree-space prefilter never clips the exact
/// great-circle check.
const ENVELOPE_PAD: f64 = 1.01;

/// A course stored in the R-tree, keyed by `[lng, lat]`.
struct CatalogEntry {
    candidate: Candidate,
}

impl RTreeObject for CatalogEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.candidate.location.lng, self.candidate.location.lat])
    }
}

/// Spatially indexed list of known golf courses.
pub struct CourseCatalog {
    courses: RTree<CatalogEntry>,
}

impl CourseCatalog {
    /// Loads a catalog from a `GeoJSON` file.
    ///
    /// Features without an identifier or a usable geometry are skipped with
    /// a warning.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, SpatialError> {
        let catalog = Self::from_features(read_features(path)?);
        log::info!(
            "Loaded {} courses into catalog from {}",
            catalog.len(),
            path.display()
        );
        Ok(catalog)
    }

    fn from_features(features: Vec<Feature>) -> Self {
        let candidates = features
            .into_iter()
            .filter_map(|feature| {
                let candidate = feature_to_candidate(&feature);
                if candidate.is_none() {
                    log::warn!(
                        "Skipping catalog feature without an id or location: {:?}",
                        feature.id
                    );
                }
                candidate
            })
            .collect();

        Self::from_candidates(candidates)
    }

    /// Builds a catalog from already-parsed courses.
    #[must_use]
    pub fn from_candidates(candidates: Vec<Candidate>) -> Self {
        let entries = candidates
            .into_iter()
            .map(|candidate| CatalogEntry { candidate })
            .collect();

        Self {
            courses: RTree::bulk_load(entries),
        }
    }

    /// Number of courses in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.courses.size()
    }

    /// Whether the catalog has no courses.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.courses.size() == 0
    }

    /// Courses within `radius` of `origin`, nearest first (ties by id).
    #[must_use]
    pub fn within(&self, origin: GeoPoint, radius: Radius) -> Vec<Candidate> {
        let miles = radius.as_miles();
        let envelope = search_envelope(origin, miles);

        let mut hits: Vec<(f64, &Candidate)> = self
            .courses
            .locate_in_envelope_intersecting(&envelope)
            .map(|entry| {
                (
                    haversine_miles(origin, entry.candidate.location),
                    &entry.candidate,
                )
            })
            .filter(|(distance, _)| *distance <= miles)
            .collect();

        hits.sort_by(|(da, a), (db, b)| da.total_cmp(db).then_with(|| a.id.cmp(&b.id)));
        hits.into_iter().map(|(_, c)| c.clone()).collect()
    }
}

impl DiscoveryProvider for CourseCatalog {
    fn search(&self, origin: GeoPoint, radius: Radius) -> Result<Vec<Candidate>, ProviderError> {
        Ok(self.within(origin, radius))
    }
}

fn feature_to_candidate(feature: &Feature) -> Option<Candidate> {
    let id = string_property(feature, &["place_id", "id"]).or_else(|| {
        feature.id.as_ref().map(|id| match id {
            geojson::feature::Id::String(s) => s.clone(),
            geojson::feature::Id::Number(n) => n.to_string(),
        })
    })?;

    let geometry: geo::Geometry<f64> = feature.geometry.clone()?.try_into().ok()?;
    let point = geometry.centroid()?;

    Some(Candidate {
        id,
        name: string_property(feature, &["name"]).unwrap_or_default(),
        location: GeoPoint::new(point.y(), point.x()),
    })
}

/// Degree-space bounding box that contains every point within `miles` of
/// `origin`. Falls back to the full longitude range near the poles and
/// across the antimeridian.
fn search_envelope(origin: GeoPoint, miles: f64) -> AABB<[f64; 2]> {
    let d_lat = miles_to_lat_degrees(miles) * ENVELOPE_PAD;
    let min_lat = (origin.lat - d_lat).max(-90.0);
    let max_lat = (origin.lat + d_lat).min(90.0);

    let widest = min_lat.abs().max(max_lat.abs()).to_radians().cos();
    let d_lng = if widest > 1e-9 { d_lat / widest } else { 360.0 };

    let (min_lng, max_lng) =
        if d_lng >= 180.0 || origin.lng - d_lng < -180.0 || origin.lng + d_lng > 180.0 {
            (-180.0, 180.0)
        } else {
            (origin.lng - d_lng, origin.lng + d_lng)
        };

    AABB::from_corners([min_lng, min_lat], [max_lng, max_lat])
}
