//! Persisted viewer location.
//!
//! The discovery pages remember where the viewer is so listings can be ranked
//! by distance. The location is written once per successful geolocation grant
//! and trusted for 30 days; after that the viewer is asked again.
//!
//! Storage is a port (`LocationStore`) so the ranking logic never touches the
//! filesystem directly: `FileLocationStore` persists a JSON record under the
//! platform data directory, `MemoryLocationStore` backs tests and embedders
//! without a disk. Concurrent writers are not reconciled; the last write wins.

use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::geo::GeoPoint;

/// How long a saved location stays valid
const LOCATION_TTL_DAYS: i64 = 30;

/// File name within the data directory
const LOCATION_FILE: &str = "location.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredLocation {
    point: GeoPoint,
    saved_at: DateTime<Utc>,
}

impl StoredLocation {
    fn new(point: GeoPoint) -> Self {
        Self { point, saved_at: Utc::now() }
    }

    fn is_expired(&self) -> bool {
        Utc::now() - self.saved_at >= Duration::days(LOCATION_TTL_DAYS)
    }
}

/// Storage port for the viewer's location.
pub trait LocationStore: Send + Sync {
    /// Persist the location, replacing any previous value.
    fn save(&self, point: GeoPoint) -> Result<()>;

    /// The last saved location, or `None` if nothing was saved, the record
    /// is unreadable, or it has expired. Never fails.
    fn load(&self) -> Option<GeoPoint>;

    /// Forget the saved location.
    fn clear(&self) -> Result<()>;
}

/// Location store backed by a JSON file.
pub struct FileLocationStore {
    path: PathBuf,
}

impl FileLocationStore {
    /// Store the location record inside `dir`.
    pub fn new(dir: PathBuf) -> Self {
        Self { path: dir.join(LOCATION_FILE) }
    }
}

impl LocationStore for FileLocationStore {
    fn save(&self, point: GeoPoint) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(&StoredLocation::new(point))?;
        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write location file: {}", self.path.display()))
    }

    fn load(&self) -> Option<GeoPoint> {
        let contents = std::fs::read_to_string(&self.path).ok()?;

        let stored: StoredLocation = match serde_json::from_str(&contents) {
            Ok(stored) => stored,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Discarding unreadable location file");
                return None;
            }
        };

        if stored.is_expired() {
            debug!(saved_at = %stored.saved_at, "Saved location expired");
            return None;
        }

        Some(stored.point)
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).context("Failed to remove location file"),
        }
    }
}

/// In-memory location store.
#[derive(Default)]
pub struct MemoryLocationStore {
    slot: Mutex<Option<StoredLocation>>,
}

impl MemoryLocationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocationStore for MemoryLocationStore {
    fn save(&self, point: GeoPoint) -> Result<()> {
        *self.slot.lock().unwrap() = Some(StoredLocation::new(point));
        Ok(())
    }

    fn load(&self) -> Option<GeoPoint> {
        let slot = self.slot.lock().unwrap();
        slot.as_ref().filter(|s| !s.is_expired()).map(|s| s.point)
    }

    fn clear(&self) -> Result<()> {
        *self.slot.lock().unwrap() = None;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const POINT: GeoPoint = GeoPoint { lat: 12.84, lng: 77.66 };

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryLocationStore::new();
        assert!(store.load().is_none());

        store.save(POINT).unwrap();
        assert_eq!(store.load(), Some(POINT));

        store.clear().unwrap();
        assert!(store.load().is_none());
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileLocationStore::new(dir.path().to_path_buf());

        assert!(store.load().is_none());
        store.save(POINT).unwrap();
        assert_eq!(store.load(), Some(POINT));
    }

    #[test]
    fn test_save_overwrites_previous() {
        let store = MemoryLocationStore::new();
        store.save(POINT).unwrap();

        let moved = GeoPoint::new(13.08, 80.27);
        store.save(moved).unwrap();
        assert_eq!(store.load(), Some(moved));
    }

    #[test]
    fn test_expired_location_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileLocationStore::new(dir.path().to_path_buf());

        let stale = StoredLocation {
            point: POINT,
            saved_at: Utc::now() - Duration::days(LOCATION_TTL_DAYS + 1),
        };
        std::fs::write(
            dir.path().join(LOCATION_FILE),
            serde_json::to_string(&stale).unwrap(),
        )
        .unwrap();

        assert!(store.load().is_none());
    }

    #[test]
    fn test_corrupt_file_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileLocationStore::new(dir.path().to_path_buf());

        std::fs::write(dir.path().join(LOCATION_FILE), "{not json").unwrap();
        assert!(store.load().is_none());
    }

    #[test]
    fn test_clear_missing_file_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileLocationStore::new(dir.path().to_path_buf());
        store.clear().unwrap();
    }
}
