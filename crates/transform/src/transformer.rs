//! Record Transformer
//!
//! Turns one raw line into one fixed-schema [`OutputRecord`]:
//!
//! ```text
//! raw line → strip marker → normalize payload → decode envelope
//!          → event columns (typed formatters)
//!          → query columns (generic uri_<key> match, then overrides)
//!          → envelope columns
//!          → geo columns (cache, then provider on miss)
//! ```
//!
//! The transformer holds no per-call state, so one instance is shared by
//! every worker. The only shared mutable state it touches is the
//! [`EnrichmentCache`].

use std::borrow::Cow;
use std::net::IpAddr;
use std::sync::Arc;

use logfold_config::{Config, DEFAULT_MARKER_LEN, TimeZoneSetting};
use logfold_enrich::{EnrichmentCache, GeoLabels, GeoProvider};
use tracing::debug;

use crate::envelope::{self, Envelope};
use crate::error::TransformResult;
use crate::format::DateTimeFormatter;
use crate::query::RequestTarget;
use crate::schema::{ColumnSource, EnvelopeField, GeoField, Schema};

#[cfg(test)]
#[path = "transformer_test.rs"]
mod tests;

/// One transformed row, positioned by the schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRecord {
    fields: Vec<String>,
}

impl OutputRecord {
    pub fn new(fields: Vec<String>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn into_fields(self) -> Vec<String> {
        self.fields
    }
}

/// Transformer settings
#[derive(Debug, Clone)]
pub struct TransformerConfig {
    /// Bytes of envelope marker to strip from each line
    pub marker_len: usize,

    /// Locale used to pick city/country names
    pub locale: String,

    /// Zone for rendered timestamps
    pub timezone: TimeZoneSetting,
}

impl Default for TransformerConfig {
    fn default() -> Self {
        Self {
            marker_len: DEFAULT_MARKER_LEN,
            locale: "en".to_string(),
            timezone: TimeZoneSetting::Local,
        }
    }
}

impl From<&Config> for TransformerConfig {
    fn from(config: &Config) -> Self {
        Self {
            marker_len: config.input.marker_len,
            locale: config.geo.locale.clone(),
            timezone: config.time.timezone,
        }
    }
}

/// Strip control characters from a client address
pub fn clean_address(raw: &str) -> Cow<'_, str> {
    if raw.chars().any(char::is_control) {
        Cow::Owned(raw.chars().filter(|c| !c.is_control()).collect())
    } else {
        Cow::Borrowed(raw)
    }
}

/// Schema-driven line → record transformer
pub struct RecordTransformer {
    schema: Arc<Schema>,
    clock: DateTimeFormatter,
    marker_len: usize,
    locale: String,
    cache: Arc<EnrichmentCache>,
    provider: Arc<dyn GeoProvider>,
}

impl RecordTransformer {
    pub fn new(
        config: TransformerConfig,
        schema: Arc<Schema>,
        cache: Arc<EnrichmentCache>,
        provider: Arc<dyn GeoProvider>,
    ) -> Self {
        Self {
            schema,
            clock: DateTimeFormatter::new(config.timezone),
            marker_len: config.marker_len,
            locale: config.locale,
            cache,
            provider,
        }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn cache(&self) -> &Arc<EnrichmentCache> {
        &self.cache
    }

    /// Transform one raw line
    ///
    /// # Errors
    ///
    /// Decode, request target and provider failures. An address that does
    /// not parse is not an error.
    pub fn transform(&self, line: &str) -> TransformResult<OutputRecord> {
        let body = envelope::strip_marker(line, self.marker_len)?;
        let envelope = envelope::decode(body)?;
        let target = RequestTarget::parse(&envelope.request_uri)?;
        let labels = self.resolve(&envelope.remote_addr)?;

        let mut fields = self.fixed_columns(&envelope, &target, labels);
        self.apply_query(&mut fields, &target);

        Ok(OutputRecord::new(fields))
    }

    /// Event, envelope and geo columns
    fn fixed_columns(
        &self,
        envelope: &Envelope,
        target: &RequestTarget,
        labels: GeoLabels,
    ) -> Vec<String> {
        self.schema
            .columns()
            .iter()
            .map(|column| match column.source {
                ColumnSource::Event(field, format) => envelope
                    .event
                    .as_ref()
                    .map(|event| format.render(event.value(field), &self.clock))
                    .unwrap_or_default(),
                ColumnSource::Query => String::new(),
                ColumnSource::Envelope(field) => match field {
                    EnvelopeField::UserAgent => envelope.user_agent.clone(),
                    EnvelopeField::RemoteAddr => envelope.remote_addr.clone(),
                    EnvelopeField::ClientId => envelope.client_id.clone(),
                    EnvelopeField::RequestPath => target.path.clone(),
                    EnvelopeField::RequestTime => self.clock.format_seconds(envelope.request_time),
                },
                ColumnSource::Geo(GeoField::Country) => labels.country.clone(),
                ColumnSource::Geo(GeoField::City) => labels.city.clone(),
            })
            .collect()
    }

    /// Generic `uri_<key>` matches first, then the override keys, so an
    /// override always wins
    fn apply_query(&self, fields: &mut [String], target: &RequestTarget) {
        let joined: Vec<(String, String)> = target
            .joined()
            .map(|(key, value)| (key.to_lowercase(), value))
            .collect();

        for (key, value) in &joined {
            if let Some(i) = self.schema.query_index(key) {
                fields[i].clone_from(value);
            }
        }
        for (key, value) in &joined {
            if let Some(i) = self.schema.override_index(key) {
                fields[i].clone_from(value);
            }
        }
    }

    /// Geolocation labels for a raw client address
    fn resolve(&self, raw: &str) -> TransformResult<GeoLabels> {
        let key = clean_address(raw);
        if let Some(labels) = self.cache.lookup(&key) {
            return Ok(labels);
        }

        let addr: IpAddr = match key.parse() {
            Ok(addr) => addr,
            Err(_) => {
                debug!(addr = %key, "unparseable client address, skipping geolocation");
                return Ok(GeoLabels::unresolved());
            }
        };

        let labels = match self.provider.lookup(addr)? {
            Some(locality) => GeoLabels::from_locality(&locality, &self.locale),
            None => GeoLabels::unresolved(),
        };
        self.cache.store(key.into_owned(), labels.clone());
        Ok(labels)
    }
}

impl std::fmt::Debug for RecordTransformer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordTransformer")
            .field("columns", &self.schema.len())
            .field("marker_len", &self.marker_len)
            .field("locale", &self.locale)
            .field("timezone", &self.clock.zone())
            .field("provider", &self.provider.name())
            .finish()
    }
}
