//! Great-circle distance on a spherical Earth.

use golf_map_scan_models::GeoPoint;

/// Mean Earth radius in statute miles.
pub const EARTH_RADIUS_MILES: f64 = 3958.8;

/// Haversine distance between two points, in miles.
///
/// The haversine term is clamped to `[0, 1]` before the inverse sine so
/// floating-point overshoot at antipodal points cannot produce `NaN`.
#[must_use]
pub fn haversine_miles(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (a.lat.to_radians().cos() * b.lat.to_radians().cos())
        .mul_add((d_lng / 2.0).sin().powi(2), (d_lat / 2.0).sin().powi(2));

    2.0 * EARTH_RADIUS_MILES * h.clamp(0.0, 1.0).sqrt().asin()
}

/// Degrees of latitude spanned by `miles` along a meridian.
#[must_use]
pub fn miles_to_lat_degrees(miles: f64) -> f64 {
    (miles / EARTH_RADIUS_MILES).to_degrees()
}
