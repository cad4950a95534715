//! Cache Snapshot - warm-start file for the enrichment cache
//!
//! Resolved addresses are written to disk after a clean run and loaded
//! before the next one, so repeat runs over overlapping traffic skip most
//! database lookups.
//!
//! # File Format
//!
//! ```json
//! {
//!   "version": 1,
//!   "entries": [
//!     {"addr": "8.8.8.8", "city": "Mountain View", "country": "United States"}
//!   ]
//! }
//! ```

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cache::EnrichmentCache;
use crate::error::CacheError;
use crate::geo::GeoLabels;

#[cfg(test)]
#[path = "snapshot_test.rs"]
mod tests;

/// File format version
const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredEntry {
    addr: String,
    city: String,
    country: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotFile {
    version: u32,
    entries: Vec<StoredEntry>,
}

/// Snapshot file handle
#[derive(Debug, Clone)]
pub struct CacheSnapshot {
    path: PathBuf,
}

impl CacheSnapshot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load entries from disk
    ///
    /// A missing file is an empty snapshot.
    pub fn load(&self) -> Result<HashMap<String, GeoLabels>, CacheError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no cache snapshot found");
            return Ok(HashMap::new());
        }

        let file = File::open(&self.path).map_err(|e| CacheError::io(&self.path, e))?;
        let snapshot: SnapshotFile = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| CacheError::format(&self.path, e))?;

        if snapshot.version != FORMAT_VERSION {
            warn!(
                expected = FORMAT_VERSION,
                found = snapshot.version,
                "cache snapshot version mismatch"
            );
        }

        Ok(snapshot
            .entries
            .into_iter()
            .map(|e| (e.addr, GeoLabels::new(e.city, e.country)))
            .collect())
    }

    /// Load a snapshot straight into a fresh cache
    pub fn load_cache(&self) -> Result<EnrichmentCache, CacheError> {
        Ok(EnrichmentCache::with_entries(self.load()?))
    }

    /// Write every cache entry to disk
    ///
    /// Writes to a sibling temp file and renames it over the target, so a
    /// crash mid-write leaves the previous snapshot intact.
    pub fn save(&self, cache: &EnrichmentCache) -> Result<usize, CacheError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| CacheError::io(parent, e))?;
        }

        let mut entries: Vec<StoredEntry> = cache
            .entries()
            .into_iter()
            .map(|(addr, labels)| StoredEntry {
                addr,
                city: labels.city,
                country: labels.country,
            })
            .collect();
        entries.sort_by(|a, b| a.addr.cmp(&b.addr));
        let count = entries.len();

        let temp_path = self.path.with_extension("tmp");
        let file = File::create(&temp_path).map_err(|e| CacheError::io(&temp_path, e))?;
        let mut writer = BufWriter::new(file);

        let snapshot = SnapshotFile {
            version: FORMAT_VERSION,
            entries,
        };
        serde_json::to_writer_pretty(&mut writer, &snapshot)
            .map_err(|e| CacheError::format(&temp_path, e))?;
        writer.flush().map_err(|e| CacheError::io(&temp_path, e))?;

        fs::rename(&temp_path, &self.path).map_err(|e| CacheError::io(&self.path, e))?;

        debug!(path = %self.path.display(), entries = count, "saved cache snapshot");
        Ok(count)
    }
}
