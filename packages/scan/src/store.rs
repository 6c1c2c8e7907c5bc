//! JSON persistence for scan sessions.
//!
//! Sessions are written as `{ "metadata": {...}, "entities": [...] }`. The
//! loader also accepts a bare array of entities, which is how sessions were
//! stored before radius history was tracked.
//!
//! A file that cannot be read or parsed is not fatal: the loader logs a
//! warning and the caller starts from an empty session.

use std::path::{Path, PathBuf};

use chrono::Utc;
use golf_map_scan_models::{PersistedSession, SessionFile};

use crate::StoreError;
use crate::session::ScanSession;

/// Parses a session file in either the current or the legacy shape.
///
/// # Errors
///
/// Returns [`serde_json::Error`] if `contents` matches neither shape.
pub fn parse(contents: &str) -> Result<PersistedSession, serde_json::Error> {
    serde_json::from_str::<SessionFile>(contents).map(PersistedSession::from)
}

/// Loads a persisted session from `path`.
///
/// Returns `None` if the file does not exist, cannot be read, or is
/// malformed.
#[must_use]
pub fn load(path: &Path) -> Option<PersistedSession> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::info!("No session at {}, starting fresh", path.display());
            return None;
        }
        Err(e) => {
            log::warn!(
                "Failed to read session {}: {e}; starting fresh",
                path.display()
            );
            return None;
        }
    };

    match parse(&contents) {
        Ok(session) => {
            log::info!(
                "Loaded {} courses and {} completed radii from {}",
                session.entities.len(),
                session.metadata.radii_completed.len(),
                path.display()
            );
            Some(session)
        }
        Err(e) => {
            log::warn!(
                "Session {} is malformed ({e}); starting fresh",
                path.display()
            );
            None
        }
    }
}

/// Writes `session` to `path` as pretty-printed JSON, creating parent
/// directories as needed.
///
/// The JSON is written to a sibling `.tmp` file first and renamed over
/// `path`, so an interrupted save leaves the previous session intact.
///
/// # Errors
///
/// Returns [`StoreError`] if serialization, the write, or the rename fails.
pub fn save(path: &Path, session: &ScanSession) -> Result<(), StoreError> {
    ensure_parent(path)?;

    let persisted = session.to_persisted(Utc::now());
    let json = serde_json::to_string_pretty(&persisted)?;

    let tmp = temp_path(path);
    std::fs::write(&tmp, json)?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        if let Err(cleanup) = std::fs::remove_file(&tmp) {
            log::warn!("Failed to remove {}: {cleanup}", tmp.display());
        }
        return Err(e.into());
    }

    log::info!(
        "Saved {} courses to {}",
        persisted.metadata.total_count,
        path.display()
    );
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

/// Creates the parent directory of `path` if it has one.
pub(crate) fn ensure_parent(path: &Path) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}
