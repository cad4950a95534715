//! Enrichment error types

use std::path::PathBuf;

use thiserror::Error;

/// Result type for geolocation lookups
pub type GeoResult<T> = Result<T, GeoError>;

/// Errors from a geolocation provider
#[derive(Debug, Error)]
pub enum GeoError {
    /// Database could not be opened or is not a City database
    #[error("failed to open geolocation database '{path}': {message}")]
    Open { path: PathBuf, message: String },

    /// Lookup failed for a reason other than "address not present"
    #[error("geolocation lookup failed for {addr}: {message}")]
    Lookup { addr: String, message: String },
}

/// Errors from loading or saving a cache snapshot
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("I/O error on cache snapshot '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed cache snapshot '{path}': {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl CacheError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn format(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Format {
            path: path.into(),
            source,
        }
    }
}
