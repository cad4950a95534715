//! MaxMind GeoIP2/GeoLite2 City database provider

use std::collections::BTreeMap;
use std::net::IpAddr;
use std::path::{Path, PathBuf};

use maxminddb::{MaxMindDBError, Reader, geoip2};
use tracing::info;

use crate::error::{GeoError, GeoResult};
use crate::geo::{GeoProvider, Locality};

/// City database loaded fully into memory
pub struct MaxMindProvider {
    reader: Reader<Vec<u8>>,
    path: PathBuf,
}

impl MaxMindProvider {
    /// Open a `.mmdb` City database
    pub fn open(path: impl AsRef<Path>) -> GeoResult<Self> {
        let path = path.as_ref().to_path_buf();
        let reader = Reader::open_readfile(&path).map_err(|e| GeoError::Open {
            path: path.clone(),
            message: e.to_string(),
        })?;

        info!(
            path = %path.display(),
            database_type = %reader.metadata.database_type,
            node_count = reader.metadata.node_count,
            "opened geolocation database"
        );

        Ok(Self { reader, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for MaxMindProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaxMindProvider")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

fn owned_names(names: Option<BTreeMap<&str, &str>>) -> BTreeMap<String, String> {
    names
        .unwrap_or_default()
        .into_iter()
        .map(|(locale, name)| (locale.to_string(), name.to_string()))
        .collect()
}

impl GeoProvider for MaxMindProvider {
    fn lookup(&self, addr: IpAddr) -> GeoResult<Option<Locality>> {
        match self.reader.lookup::<geoip2::City>(addr) {
            Ok(record) => Ok(Some(Locality {
                city_names: owned_names(record.city.and_then(|c| c.names)),
                country_names: owned_names(record.country.and_then(|c| c.names)),
            })),
            Err(MaxMindDBError::AddressNotFoundError(_)) => Ok(None),
            Err(e) => Err(GeoError::Lookup {
                addr: addr.to_string(),
                message: e.to_string(),
            }),
        }
    }

    fn name(&self) -> &'static str {
        "maxmind"
    }
}
