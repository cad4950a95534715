//! Geolocation providers
//!
//! A provider maps a parsed network address to locality names keyed by
//! locale. Providers are read-only after construction and shared by every
//! worker, so they must be `Send + Sync`.

use std::collections::{BTreeMap, HashMap};
use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use crate::error::GeoResult;

/// Label used when a name cannot be resolved
pub const MISSING_NAME: &str = "nil";

/// Resolved (city, country) pair attached to a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoLabels {
    pub city: String,
    pub country: String,
}

impl GeoLabels {
    pub fn new(city: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            country: country.into(),
        }
    }

    /// Sentinel labels for an address that could not be resolved
    pub fn unresolved() -> Self {
        Self::new(MISSING_NAME, MISSING_NAME)
    }

    /// Pick names for `locale`, substituting the sentinel for any name the
    /// locality does not carry
    pub fn from_locality(locality: &Locality, locale: &str) -> Self {
        Self::new(
            locality.city(locale).unwrap_or(MISSING_NAME),
            locality.country(locale).unwrap_or(MISSING_NAME),
        )
    }
}

/// Locality names keyed by locale (e.g. "en", "de")
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Locality {
    pub city_names: BTreeMap<String, String>,
    pub country_names: BTreeMap<String, String>,
}

impl Locality {
    pub fn city(&self, locale: &str) -> Option<&str> {
        self.city_names.get(locale).map(String::as_str)
    }

    pub fn country(&self, locale: &str) -> Option<&str> {
        self.country_names.get(locale).map(String::as_str)
    }

    /// Convenience constructor for a single locale
    pub fn single(locale: &str, city: Option<&str>, country: Option<&str>) -> Self {
        let mut locality = Self::default();
        if let Some(city) = city {
            locality.city_names.insert(locale.to_string(), city.to_string());
        }
        if let Some(country) = country {
            locality
                .country_names
                .insert(locale.to_string(), country.to_string());
        }
        locality
    }
}

/// Geolocation lookup
pub trait GeoProvider: Send + Sync {
    /// Resolve an address
    ///
    /// Returns `Ok(None)` when the database has no record for the address.
    /// Errors are reserved for a broken database or reader.
    fn lookup(&self, addr: IpAddr) -> GeoResult<Option<Locality>>;

    /// Name of this provider for logging
    fn name(&self) -> &'static str;
}

/// In-memory provider backed by a fixed table
#[derive(Debug, Clone, Default)]
pub struct StaticGeoProvider {
    table: HashMap<IpAddr, Locality>,
}

impl StaticGeoProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the locality for an address
    #[must_use]
    pub fn with(mut self, addr: IpAddr, locality: Locality) -> Self {
        self.table.insert(addr, locality);
        self
    }

    pub fn insert(&mut self, addr: IpAddr, locality: Locality) {
        self.table.insert(addr, locality);
    }
}

impl GeoProvider for StaticGeoProvider {
    fn lookup(&self, addr: IpAddr) -> GeoResult<Option<Locality>> {
        Ok(self.table.get(&addr).cloned())
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

/// Provider that resolves nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NullGeoProvider;

impl GeoProvider for NullGeoProvider {
    fn lookup(&self, _addr: IpAddr) -> GeoResult<Option<Locality>> {
        Ok(None)
    }

    fn name(&self) -> &'static str {
        "null"
    }
}
