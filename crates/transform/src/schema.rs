//! Static output schema
//!
//! The schema is a declarative column table: each column has a name (used
//! for the optional header row and for query-parameter matching) and a
//! [`ColumnSource`] describing where its value comes from. Formatting of
//! event attributes is fixed per column when the table is built, never
//! decided per value.

use std::collections::HashMap;

use crate::format::FieldFormat;

#[cfg(test)]
#[path = "schema_test.rs"]
mod tests;

/// Prefix shared by every query-parameter column
pub const QUERY_PREFIX: &str = "uri_";

/// Query keys that always land in a fixed column, taking precedence over
/// the generic `uri_<key>` match
pub const QUERY_OVERRIDES: &[(&str, &str)] = &[
    ("d", "uri_did"),
    ("dt", "uri_dm"),
    ("v", "uri_sv"),
    ("p", "uri_fv"),
];

/// Attributes of the nested event payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventField {
    N,
    Uid,
    Vs,
    M,
    Tg,
    Sn,
    Ps,
    Sc,
    Sp,
    St,
    Rid,
    Ori,
    Ord,
    Fc,
    Dr,
    Tc,
    Ct,
    Lc,
    Lf,
    Res,
    Typ,
    Ts,
}

/// Top-level envelope scalars
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvelopeField {
    UserAgent,
    RemoteAddr,
    ClientId,
    /// Path part of the request target
    RequestPath,
    /// Request time rendered as a date-time
    RequestTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeoField {
    Country,
    City,
}

/// Where a column's value comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnSource {
    Event(EventField, FieldFormat),
    /// Filled from query parameters matched by column name
    Query,
    Envelope(EnvelopeField),
    Geo(GeoField),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub source: ColumnSource,
}

/// Ordered column table
#[derive(Debug, Clone)]
pub struct Schema {
    columns: Vec<Column>,
    by_name: HashMap<&'static str, usize>,
    overrides: HashMap<&'static str, usize>,
}

impl Schema {
    /// Build a schema from a column table
    ///
    /// Override targets that are not columns of this table are ignored.
    pub fn new(columns: Vec<Column>) -> Self {
        let by_name: HashMap<&'static str, usize> = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name, i))
            .collect();

        let overrides = QUERY_OVERRIDES
            .iter()
            .filter_map(|(key, target)| by_name.get(target).map(|&i| (*key, i)))
            .collect();

        Self {
            columns,
            by_name,
            overrides,
        }
    }

    /// The 52-column layout written by logfold
    pub fn standard() -> Self {
        use ColumnSource::{Envelope, Event, Geo, Query};
        use EnvelopeField as E;
        use EventField as F;
        use FieldFormat::{Integer, MillisTimestamp, Text};

        let table: [(&'static str, ColumnSource); 52] = [
            ("event_fc", Event(F::Fc, Integer)),
            ("http_user_agent", Envelope(E::UserAgent)),
            ("event_ori", Event(F::Ori, Text)),
            ("event_uid", Event(F::Uid, Text)),
            ("event_ord", Event(F::Ord, Text)),
            ("uri_did", Query),
            ("event_lc", Event(F::Lc, Integer)),
            ("uri_n", Query),
            ("event_lf", Event(F::Lf, Integer)),
            ("uri_l", Query),
            ("event_dr", Event(F::Dr, Integer)),
            ("event_sp", Event(F::Sp, Text)),
            ("uri_tz", Query),
            ("event_st", Event(F::St, Text)),
            ("remote_addr", Envelope(E::RemoteAddr)),
            ("uri_av", Query),
            ("event_rid", Event(F::Rid, Text)),
            ("uri_access_token", Query),
            ("uri_an", Query),
            ("uri_app", Query),
            ("request_time_float", Envelope(E::RequestTime)),
            ("event_res", Event(F::Res, Integer)),
            ("uri_ov", Query),
            ("uri_os", Query),
            ("event_typ", Event(F::Typ, Integer)),
            ("uri_kv", Query),
            ("event_ct", Event(F::Ct, Integer)),
            ("uri_sv", Query),
            ("client_id", Envelope(E::ClientId)),
            ("request_uri", Envelope(E::RequestPath)),
            ("event_vs", Event(F::Vs, Text)),
            ("event_ps", Event(F::Ps, Text)),
            ("event_ts", Event(F::Ts, MillisTimestamp)),
            ("event_n", Event(F::N, Text)),
            ("event_m", Event(F::M, Text)),
            ("event_tc", Event(F::Tc, Integer)),
            ("uri_dm", Query),
            ("uri_fv", Query),
            ("event_tg", Event(F::Tg, Text)),
            ("event_sn", Event(F::Sn, Text)),
            ("uri_q", Query),
            ("uri_appkey", Query),
            ("uri_length", Query),
            ("uri_pretty", Query),
            ("uri_uid", Query),
            ("uri_title", Query),
            ("uri_category", Query),
            ("uri_id", Query),
            ("event_sc", Event(F::Sc, Text)),
            ("uri_f", Query),
            ("geo_country", Geo(GeoField::Country)),
            ("geo_city", Geo(GeoField::City)),
        ];

        Self::new(
            table
                .into_iter()
                .map(|(name, source)| Column { name, source })
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column names in output order (the header row)
    pub fn names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name).collect()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Position of the formatted request time, used for partitioning
    pub fn request_time_index(&self) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.source == ColumnSource::Envelope(EnvelopeField::RequestTime))
    }

    /// Column for a query key matched generically as `uri_<key>`
    ///
    /// `key` must already be lower-cased. Only query columns match.
    pub fn query_index(&self, key: &str) -> Option<usize> {
        let name = format!("{QUERY_PREFIX}{key}");
        self.index_of(&name)
            .filter(|&i| self.columns[i].source == ColumnSource::Query)
    }

    /// Fixed column for an override key (`d`, `dt`, `v`, `p`)
    ///
    /// `key` must already be lower-cased.
    pub fn override_index(&self, key: &str) -> Option<usize> {
        self.overrides.get(key).copied()
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::standard()
    }
}
