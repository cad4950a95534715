//! logfold - Sinks
//!
//! Date-partitioned CSV output files.
//!
//! # Architecture
//!
//! The partition router owns one [`PartitionSink`] per calendar date and is
//! the only thing that touches them, so sinks carry no locking. Each sink
//! writes CSV rows through a chain writer that buffers and (by default)
//! gzip-compresses into its file.
//!
//! ```text
//! [Router] --row--> [PartitionSink] --> [csv::Writer] --> [ChainWrite] --> [File]
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use logfold_sinks::{PartitionKey, PartitionSinkFactory, util::GzipWriter};
//!
//! let factory = PartitionSinkFactory::new("out", "sdk-log", Arc::new(GzipWriter::default()));
//! let mut sink = factory.open(PartitionKey::from_request_time("2021-03-04 11:00:00.000"))?;
//! sink.append(["a", "b"])?;
//! let summary = sink.finalize()?;
//! ```

pub mod error;
pub mod metrics;
pub mod partition;

/// Shared utilities (chain writers, rate-limited logging)
pub mod util;

pub use error::{SinkError, SinkResult};
pub use metrics::{SinkMetrics, SinkMetricsSnapshot};
pub use partition::{PartitionKey, PartitionSink, PartitionSinkFactory, PartitionSummary};
