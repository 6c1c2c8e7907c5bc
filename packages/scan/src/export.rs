//! Flat exports of discovered courses for spreadsheets and SQL engines.

use std::path::Path;

use golf_map_scan_models::Entity;
use serde::Serialize;

use crate::StoreError;
use crate::store::ensure_parent;

/// One CSV row per course.
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    name: &'a str,
    lat: f64,
    lng: f64,
    place_id: &'a str,
    census_geoid: Option<&'a str>,
    pct_attribute: Option<f64>,
    total_pop: Option<u64>,
}

impl<'a> From<&'a Entity> for CsvRow<'a> {
    fn from(e: &'a Entity) -> Self {
        Self {
            name: &e.name,
            lat: e.location.lat,
            lng: e.location.lng,
            place_id: &e.id,
            census_geoid: e.region_id.as_deref(),
            pct_attribute: e.pct_attribute,
            total_pop: e.total_pop,
        }
    }
}

/// Writes courses as CSV with a header row. Missing values are empty
/// cells.
///
/// # Errors
///
/// Returns [`StoreError`] if the file cannot be written.
pub fn write_csv(path: &Path, entities: &[Entity]) -> Result<(), StoreError> {
    ensure_parent(path)?;

    let mut writer = csv::Writer::from_path(path)?;
    for entity in entities {
        writer.serialize(CsvRow::from(entity))?;
    }
    writer.flush()?;

    log::info!("Exported {} courses to {}", entities.len(), path.display());
    Ok(())
}

/// Writes courses as a pretty-printed JSON array.
///
/// # Errors
///
/// Returns [`StoreError`] if serialization or the write fails.
pub fn write_json(path: &Path, entities: &[Entity]) -> Result<(), StoreError> {
    ensure_parent(path)?;
    std::fs::write(path, serde_json::to_string_pretty(entities)?)?;

    log::info!("Exported {} courses to {}", entities.len(), path.display());
    Ok(())
}
