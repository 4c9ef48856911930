//! Named-location registry: resolves a location name typed on the command line to the
//! coordinates the rest of the pipeline needs. Grounded on
//! `config/settings/ui_data_settings.py`'s `DataSettings.locations_file`, which names a
//! `data/locations.json` file separate from the cache warmer's popular-locations ranking;
//! the load/tolerate-missing-file shape follows `cache_warmer.rs`'s
//! `load_popular_locations`.

use crate::domain::LocationCoordinate;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
struct LocationEntry {
    name: String,
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
struct LocationsFile {
    locations: Vec<LocationEntry>,
}

/// A flat name → coordinate table. Lookups are exact-match; there is no fuzzy matching or
/// alias resolution, since the corpus never documents a resolution algorithm for unknown
/// names.
#[derive(Debug, Clone, Default)]
pub struct LocationRegistry {
    entries: Vec<LocationEntry>,
}

impl LocationRegistry {
    /// Loads the registry from disk. A missing or malformed file yields an empty registry
    /// rather than failing — `--location` with explicit coordinates still works, and an
    /// unresolvable name surfaces as a normal fatal `AppError::Location` at input
    /// validation time, not a startup failure.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<LocationsFile>(&contents) {
                Ok(parsed) => {
                    tracing::info!("loaded {} locations from {}", parsed.locations.len(), path.display());
                    Self { entries: parsed.locations }
                }
                Err(e) => {
                    tracing::warn!("failed to parse locations file {}: {e}", path.display());
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("locations file {} not readable: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn resolve(&self, name: &str) -> Option<LocationCoordinate> {
        self.entries.iter().find(|e| e.name == name).map(|e| LocationCoordinate {
            name: e.name.clone(),
            latitude: e.latitude,
            longitude: e.longitude,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_tolerates_missing_file() {
        let registry = LocationRegistry::load(Path::new("/nonexistent/locations.json"));
        assert!(registry.resolve("東京").is_none());
    }

    #[test]
    fn resolve_finds_exact_name_match() {
        let registry = LocationRegistry {
            entries: vec![LocationEntry { name: "東京".into(), latitude: 35.6762, longitude: 139.6503 }],
        };
        let coord = registry.resolve("東京").expect("should resolve");
        assert_eq!(coord.latitude, 35.6762);
    }

    #[test]
    fn resolve_returns_none_for_unknown_name() {
        let registry = LocationRegistry {
            entries: vec![LocationEntry { name: "東京".into(), latitude: 35.6762, longitude: 139.6503 }],
        };
        assert!(registry.resolve("大阪").is_none());
    }
}
