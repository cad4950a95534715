//! Geolocation enrichment for logfold
//!
//! - [`EnrichmentCache`]: concurrent address → (city, country) map shared
//!   by all workers
//! - [`GeoProvider`]: lookup seam, with [`MaxMindProvider`] for `.mmdb`
//!   City databases and [`StaticGeoProvider`]/[`NullGeoProvider`] for
//!   tests and database-less runs
//! - [`CacheSnapshot`]: optional on-disk warm start for the cache

pub mod cache;
pub mod error;
pub mod geo;
pub mod maxmind;
pub mod snapshot;

pub use cache::{CacheStats, CacheStatsSnapshot, EnrichmentCache};
pub use error::{CacheError, GeoError, GeoResult};
pub use geo::{GeoLabels, GeoProvider, Locality, MISSING_NAME, NullGeoProvider, StaticGeoProvider};
pub use maxmind::MaxMindProvider;
pub use snapshot::CacheSnapshot;
