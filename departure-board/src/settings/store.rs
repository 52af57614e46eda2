//! Disk-backed settings store.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::error::SettingsError;
use super::model::RefreshSettings;

/// Persistent storage for [`RefreshSettings`].
pub trait SettingsStore {
    /// Read the current settings.
    ///
    /// Empty or unparseable storage yields the defaults; only storage that
    /// cannot be accessed at all is an error.
    fn read(&self) -> Result<RefreshSettings, SettingsError>;

    /// Replace the stored settings.
    fn write(&self, settings: &RefreshSettings) -> Result<(), SettingsError>;
}

/// Settings kept as a single JSON document on disk.
#[derive(Debug, Clone)]
pub struct JsonFileSettingsStore {
    path: PathBuf,
}

impl JsonFileSettingsStore {
    /// Create a store backed by `path`. The file need not exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the settings file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> SettingsError {
        SettingsError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl SettingsStore for JsonFileSettingsStore {
    fn read(&self) -> Result<RefreshSettings, SettingsError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = ?self.path, "no settings file, using defaults");
                return Ok(RefreshSettings::default());
            }
            Err(e) => return Err(self.io_error(e)),
        };

        match serde_json::from_str::<RefreshSettings>(&contents) {
            Ok(settings) => Ok(settings.normalized()),
            Err(e) => {
                warn!(path = ?self.path, error = %e, "failed to parse settings, using defaults");
                Ok(RefreshSettings::default())
            }
        }
    }

    /// Creates parent directories if they don't exist.
    fn write(&self, settings: &RefreshSettings) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let json = serde_json::to_string_pretty(settings)?;
        std::fs::write(&self.path, json).map_err(|e| self.io_error(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Product;
    use crate::settings::StationChoice;
    use tempfile::tempdir;

    fn configured() -> RefreshSettings {
        RefreshSettings {
            current_station: Some(StationChoice {
                id: "900100003".to_string(),
                name: "S+U Alexanderplatz".to_string(),
                enabled_products: [Product::Subway, Product::Tram].into_iter().collect(),
            }),
            min_departure_minutes: 2,
            max_departure_count: 6,
            show_cancelled_departures: false,
        }
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let store = JsonFileSettingsStore::new(dir.path().join("settings.json"));

        assert_eq!(store.read().unwrap(), RefreshSettings::default());
    }

    #[test]
    fn save_and_load_settings() {
        let dir = tempdir().unwrap();
        let store = JsonFileSettingsStore::new(dir.path().join("settings.json"));

        store.write(&configured()).unwrap();
        assert_eq!(store.read().unwrap(), configured());
    }

    #[test]
    fn corrupt_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{\"currentStation\": ").unwrap();

        let store = JsonFileSettingsStore::new(&path);
        assert_eq!(store.read().unwrap(), RefreshSettings::default());
    }

    #[test]
    fn empty_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "").unwrap();

        let store = JsonFileSettingsStore::new(&path);
        assert_eq!(store.read().unwrap(), RefreshSettings::default());
    }

    #[test]
    fn out_of_range_values_are_clamped_on_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"minDepartureMinutes": 500, "maxDepartureCount": 0}"#).unwrap();

        let settings = JsonFileSettingsStore::new(&path).read().unwrap();
        assert_eq!(settings.min_departure_minutes, 30);
        assert_eq!(settings.max_departure_count, 1);
    }

    #[test]
    fn unknown_product_keeps_the_station() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"currentStation": {"id": "900100003", "enabledProducts": ["subway", "nationalExpress"]},
                "maxDepartureCount": 2}"#,
        )
        .unwrap();

        let settings = JsonFileSettingsStore::new(&path).read().unwrap();
        let station = settings.station().unwrap();
        assert_eq!(station.id, "900100003");
        assert_eq!(station.enabled_products, [Product::Subway].into_iter().collect());
        assert_eq!(settings.max_departure_count, 2);
    }

    #[test]
    fn negative_minutes_keep_the_station() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"currentStation": {"id": "900100003", "enabledProducts": ["subway"]},
                "minDepartureMinutes": -1, "maxDepartureCount": 99999999999}"#,
        )
        .unwrap();

        let settings = JsonFileSettingsStore::new(&path).read().unwrap();
        assert_eq!(settings.station_id(), Some("900100003"));
        assert_eq!(settings.min_departure_minutes, 0);
        assert_eq!(settings.max_departure_count, 12);
    }

    #[test]
    fn unreadable_path_is_an_error() {
        let dir = tempdir().unwrap();
        // A directory can be opened but not read as a file
        let store = JsonFileSettingsStore::new(dir.path());

        let err = store.read().unwrap_err();
        assert!(matches!(err, SettingsError::Io { .. }));
    }

    #[test]
    fn creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("dir").join("settings.json");
        let store = JsonFileSettingsStore::new(&path);

        store.write(&configured()).unwrap();
        assert!(path.exists());
        assert_eq!(store.path(), path.as_path());
    }
}
