//! Enrichment Cache - address → (city, country)
//!
//! Shared by every worker. Reads take a shared lock so any number of
//! workers can look up concurrently; a store takes the exclusive lock for
//! the duration of one insert.
//!
//! # Semantics
//!
//! - No eviction, no TTL: an entry lives until the process exits
//! - Two workers missing on the same address may both resolve and store it.
//!   Resolution is deterministic, so the last store wins with an identical
//!   value.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::geo::GeoLabels;

#[cfg(test)]
#[path = "cache_test.rs"]
mod tests;

/// Cache statistics
#[derive(Debug, Default)]
pub struct CacheStats {
    /// Total lookups
    pub lookups: AtomicU64,

    /// Lookups that found an entry
    pub hits: AtomicU64,

    /// Lookups that found nothing
    pub misses: AtomicU64,

    /// Entries written (including overwrites)
    pub stores: AtomicU64,
}

impl CacheStats {
    /// Hit rate (0.0 - 1.0)
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed);
        let total = self.lookups.load(Ordering::Relaxed);
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }

    pub fn snapshot(&self) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            lookups: self.lookups.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            stores: self.stores.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`CacheStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStatsSnapshot {
    pub lookups: u64,
    pub hits: u64,
    pub misses: u64,
    pub stores: u64,
}

/// Concurrent address → geolocation cache
#[derive(Debug, Default)]
pub struct EnrichmentCache {
    entries: RwLock<HashMap<String, GeoLabels>>,
    stats: CacheStats,
}

impl EnrichmentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache pre-populated with entries (e.g. from a snapshot)
    pub fn with_entries(entries: HashMap<String, GeoLabels>) -> Self {
        Self {
            entries: RwLock::new(entries),
            stats: CacheStats::default(),
        }
    }

    /// Look up the labels stored for an address
    ///
    /// Returns `None` if the address was never stored.
    pub fn lookup(&self, key: &str) -> Option<GeoLabels> {
        self.stats.lookups.fetch_add(1, Ordering::Relaxed);

        let found = self.entries.read().get(key).cloned();
        match found {
            Some(labels) => {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                Some(labels)
            }
            None => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store the labels resolved for an address
    pub fn store(&self, key: impl Into<String>, labels: GeoLabels) {
        self.entries.write().insert(key.into(), labels);
        self.stats.stores.fetch_add(1, Ordering::Relaxed);
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Copy of every entry, for persisting a snapshot
    pub fn entries(&self) -> HashMap<String, GeoLabels> {
        self.entries.read().clone()
    }
}
