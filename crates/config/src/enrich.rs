//! Geolocation and cache settings

use std::path::PathBuf;

use serde::Deserialize;

/// Geolocation database configuration
///
/// ```toml
/// [geo]
/// database = "GeoLite2-City.mmdb"
/// locale = "en"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeoConfig {
    /// Path to a MaxMind City database. Without one, no address resolves
    /// and every row carries the sentinel labels.
    pub database: Option<PathBuf>,

    /// Locale used to pick city and country names
    /// Default: "en"
    pub locale: String,
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            database: None,
            locale: "en".into(),
        }
    }
}

/// Enrichment cache configuration
///
/// The cache lives for one run. Setting `snapshot_path` loads entries from
/// that file at startup and writes them back after a clean run.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub snapshot_path: Option<PathBuf>,
}

impl CacheConfig {
    pub fn snapshot_enabled(&self) -> bool {
        self.snapshot_path.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let geo = GeoConfig::default();
        assert!(geo.database.is_none());
        assert_eq!(geo.locale, "en");

        let cache = CacheConfig::default();
        assert!(!cache.snapshot_enabled());
    }

    #[test]
    fn test_deserialize_snapshot_path() {
        let cache: CacheConfig = toml::from_str(r#"snapshot_path = ".cache.json""#).unwrap();
        assert!(cache.snapshot_enabled());
        assert_eq!(cache.snapshot_path, Some(PathBuf::from(".cache.json")));
    }
}
