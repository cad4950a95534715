//! logfold - Transform
//!
//! Turns raw request-log lines into fixed-schema output records.
//!
//! # Overview
//!
//! Each input line carries a fixed-length marker and one JSON envelope.
//! The [`RecordTransformer`] decodes the envelope, maps its attributes into
//! the positions of a static [`Schema`] and attaches geolocation labels for
//! the client address.
//!
//! # Design Principles
//!
//! - **Schema-driven**: columns, query matching and field formats all come
//!   from one declarative table
//! - **Typed formatting**: every event column gets its [`FieldFormat`] when
//!   the schema is built, not when a value is seen
//! - **Thread-safe**: one transformer is shared by every worker; the
//!   enrichment cache is the only shared mutable state
//!
//! # Modules
//!
//! - `envelope` - marker stripping, payload cleanup, JSON decoding
//! - `format` - typed field formatters and date-time rendering
//! - `query` - request target parsing and query grouping
//! - `schema` - the static column table
//! - `transformer` - the record transformer

pub mod envelope;
pub mod error;
pub mod format;
pub mod query;
pub mod schema;
pub mod transformer;

pub use envelope::{Envelope, EventPayload};
pub use error::{TransformError, TransformResult};
pub use format::{DATE_TIME_FORMAT, DateTimeFormatter, EventValue, FieldFormat};
pub use query::RequestTarget;
pub use schema::{Column, ColumnSource, EnvelopeField, EventField, GeoField, Schema};
pub use transformer::{OutputRecord, RecordTransformer, TransformerConfig, clean_address};
