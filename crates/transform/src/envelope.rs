//! Envelope decoding
//!
//! An input line is a fixed-length marker followed by one JSON document:
//!
//! ```text
//! [2017-12-01 20:55:08 ~ SDK ~ 0] {"REQUEST_TIME_FLOAT":1512158108.2,"REQUEST_URI":"/t?d=1",...,"event":{...}}
//! ```
//!
//! Some producers write the `event` attribute as an empty or truncated
//! array. [`normalize_payload`] rewrites that value to `null` so the line
//! decodes with no payload.

use std::borrow::Cow;

use serde::Deserialize;

use crate::error::{TransformError, TransformResult};
use crate::format::EventValue;
use crate::schema::EventField;

const EVENT_KEY: &str = "\"event\":";

/// Decoded outer document for one logged request
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Envelope {
    #[serde(rename = "REQUEST_TIME_FLOAT")]
    pub request_time: f64,

    #[serde(rename = "REQUEST_URI")]
    pub request_uri: String,

    #[serde(rename = "REMOTE_ADDR")]
    pub remote_addr: String,

    #[serde(rename = "CLIENT_ID")]
    pub client_id: String,

    #[serde(rename = "HTTP_USER_AGENT")]
    pub user_agent: String,

    pub event: Option<EventPayload>,
}

/// Nested event attributes; missing attributes take their zero value
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EventPayload {
    pub n: String,
    pub uid: String,
    pub vs: String,
    pub m: String,
    pub tg: String,
    pub sn: String,
    pub ps: String,
    pub sc: String,
    pub sp: String,
    pub st: String,
    pub rid: String,
    pub ori: String,
    pub ord: String,

    pub fc: i64,
    pub dr: i64,
    pub tc: i64,
    pub ct: i64,
    pub lc: i64,
    pub lf: i64,
    pub res: i64,
    pub typ: i64,

    /// Epoch milliseconds
    pub ts: i64,
}

impl EventPayload {
    pub fn value(&self, field: EventField) -> EventValue<'_> {
        use EventField as F;
        match field {
            F::N => EventValue::Text(&self.n),
            F::Uid => EventValue::Text(&self.uid),
            F::Vs => EventValue::Text(&self.vs),
            F::M => EventValue::Text(&self.m),
            F::Tg => EventValue::Text(&self.tg),
            F::Sn => EventValue::Text(&self.sn),
            F::Ps => EventValue::Text(&self.ps),
            F::Sc => EventValue::Text(&self.sc),
            F::Sp => EventValue::Text(&self.sp),
            F::St => EventValue::Text(&self.st),
            F::Rid => EventValue::Text(&self.rid),
            F::Ori => EventValue::Text(&self.ori),
            F::Ord => EventValue::Text(&self.ord),
            F::Fc => EventValue::Integer(self.fc),
            F::Dr => EventValue::Integer(self.dr),
            F::Tc => EventValue::Integer(self.tc),
            F::Ct => EventValue::Integer(self.ct),
            F::Lc => EventValue::Integer(self.lc),
            F::Lf => EventValue::Integer(self.lf),
            F::Res => EventValue::Integer(self.res),
            F::Typ => EventValue::Integer(self.typ),
            F::Ts => EventValue::Integer(self.ts),
        }
    }
}

/// Strip the envelope marker and line terminator
pub fn strip_marker(line: &str, marker_len: usize) -> TransformResult<&str> {
    let body = line
        .get(marker_len..)
        .ok_or(TransformError::LineTooShort { marker_len })?;
    let body = body.strip_suffix('\n').unwrap_or(body);
    Ok(body.strip_suffix('\r').unwrap_or(body))
}

/// Rewrite an array-valued `"event":` attribute to `null`
///
/// Handles `[]`, complete arrays and arrays cut off before their closing
/// bracket.
pub fn normalize_payload(doc: &str) -> Cow<'_, str> {
    for (pos, _) in doc.match_indices(EVENT_KEY) {
        let value_start = pos + EVENT_KEY.len();
        let rest = &doc[value_start..];
        let trimmed = rest.trim_start();
        if !trimmed.starts_with('[') {
            continue;
        }

        let open = value_start + (rest.len() - trimmed.len());
        let close = array_end(doc, open);

        let mut fixed = String::with_capacity(doc.len());
        fixed.push_str(&doc[..value_start]);
        fixed.push_str("null");
        let tail = &doc[close..];
        if tail.starts_with('"') {
            fixed.push(',');
        }
        fixed.push_str(tail);
        return Cow::Owned(fixed);
    }
    Cow::Borrowed(doc)
}

/// Byte offset where the array value opened at `open` ends
///
/// A closed array ends after its `]`. An unclosed one ends where the
/// enclosing object resumes: at the separator before a `"key":` seen at
/// array depth, or at the object's closing `}`.
fn array_end(doc: &str, open: usize) -> usize {
    let bytes = doc.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    let mut string_start = open;
    let mut last_comma = None;

    for (i, &b) in bytes.iter().enumerate().skip(open) {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => {
                    in_string = false;
                    let is_key = doc[i + 1..].trim_start().starts_with(':');
                    if depth == 1 && is_key {
                        return last_comma.unwrap_or(string_start);
                    }
                }
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => {
                in_string = true;
                string_start = i;
            }
            b'[' | b'{' => depth += 1,
            b']' if depth == 1 => return i + 1,
            b'}' if depth == 1 => return i,
            b']' | b'}' => depth = depth.saturating_sub(1),
            b',' if depth == 1 => last_comma = Some(i),
            _ => {}
        }
    }
    bytes.len()
}

/// Decode one stripped line
pub fn decode(body: &str) -> TransformResult<Envelope> {
    let doc = normalize_payload(body);
    serde_json::from_str(&doc).map_err(|e| TransformError::decode(e.to_string()))
}
