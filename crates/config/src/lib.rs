//! logfold configuration
//!
//! TOML-based configuration loading with sensible defaults. Every section is
//! optional; an empty file (or no file) is a valid configuration.
//!
//! # Parsing
//!
//! ```
//! use logfold_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str("[output]\nheader = true").unwrap();
//! assert!(config.output.header);
//! ```
//!
//! # Example Full Config
//!
//! ```toml
//! [log]
//! level = "info"
//!
//! [pipeline]
//! worker_multiplier = 2
//! error_mode = "strict"
//!
//! [input]
//! marker_len = 32
//!
//! [output]
//! dir = "out/"
//! compression = "gzip"
//!
//! [geo]
//! database = "GeoLite2-City.mmdb"
//!
//! [time]
//! timezone = "utc"
//! ```

mod enrich;
mod error;
mod logging;
mod output;
mod pipeline;
mod time;
mod validation;

use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use enrich::{CacheConfig, GeoConfig};
pub use error::{ConfigError, Result};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use output::{Compression, DEFAULT_BUFFER_SIZE, DEFAULT_FLUSH_EVERY, OutputConfig};
pub use pipeline::{DEFAULT_MARKER_LEN, ErrorMode, InputConfig, PipelineConfig};
pub use time::{TimeConfig, TimeZoneSetting};

use serde::Deserialize;

/// Main configuration structure
///
/// Built once at startup and handed to every component that needs it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging configuration
    pub log: LogConfig,

    /// Worker pool, channels and error policy
    pub pipeline: PipelineConfig,

    /// Input line framing
    pub input: InputConfig,

    /// Partitioned output files
    pub output: OutputConfig,

    /// Geolocation database
    pub geo: GeoConfig,

    /// Enrichment cache snapshot
    pub cache: CacheConfig,

    /// Timestamp rendering
    pub time: TimeConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read, contains invalid TOML or fails
    /// validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::Unreadable {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    /// Validate the configuration
    ///
    /// Called by the parsers; call again after applying CLI overrides.
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }

    fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(ConfigError::Malformed)?;
        config.validate()?;
        Ok(config)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_str("").unwrap();
        assert_eq!(config.pipeline.error_mode, ErrorMode::Strict);
        assert_eq!(config.input.marker_len, DEFAULT_MARKER_LEN);
        assert_eq!(config.output.compression, Compression::Gzip);
        assert_eq!(config.geo.locale, "en");
        assert!(!config.cache.snapshot_enabled());
        assert_eq!(config.time.timezone, TimeZoneSetting::Local);
    }

    #[test]
    fn test_full_config_parse() {
        let toml = r#"
[log]
level = "debug"
format = "json"

[pipeline]
worker_multiplier = 2
channel_capacity = 8
error_mode = "tolerant"

[input]
marker_len = 10

[output]
dir = "out"
file_prefix = "events"
header = true
compression = "none"
flush_every = 500

[geo]
database = "GeoLite2-City.mmdb"
locale = "de"

[cache]
snapshot_path = ".cache.json"

[time]
timezone = "+01:00"
"#;
        let config = Config::from_str(toml).unwrap();
        assert_eq!(config.log.level, LogLevel::Debug);
        assert_eq!(config.log.format, LogFormat::Json);
        assert_eq!(config.pipeline.worker_multiplier, 2);
        assert_eq!(config.pipeline.channel_capacity, 8);
        assert_eq!(config.pipeline.error_mode, ErrorMode::Tolerant);
        assert_eq!(config.input.marker_len, 10);
        assert_eq!(config.output.dir, Some(PathBuf::from("out")));
        assert_eq!(config.output.file_prefix, "events");
        assert!(config.output.header);
        assert_eq!(config.output.compression, Compression::None);
        assert_eq!(config.output.flush_every, 500);
        assert_eq!(config.geo.database, Some(PathBuf::from("GeoLite2-City.mmdb")));
        assert_eq!(config.geo.locale, "de");
        assert!(config.cache.snapshot_enabled());
        assert!(matches!(config.time.timezone, TimeZoneSetting::Fixed(_)));
    }

    #[test]
    fn test_invalid_toml() {
        let result = Config::from_str("[pipeline\nworker_multiplier = 1");
        assert!(matches!(result, Err(ConfigError::Malformed(_))));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[output]\nheader = true").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert!(config.output.header);
    }

    #[test]
    fn test_from_missing_file() {
        let result = Config::from_file("/nonexistent/logfold.toml");
        assert!(matches!(result, Err(ConfigError::Unreadable { .. })));
    }
}
