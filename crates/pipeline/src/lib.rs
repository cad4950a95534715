//! logfold - Pipeline
//!
//! Concurrent line → record → partition processing.
//!
//! # Architecture
//!
//! ```text
//!                        ┌─→ worker ─┐
//! [LineSource] ──MPMC──→ ├─→ worker ─┼──MPSC──→ [PartitionRouter] ──→ <prefix>-2021.03.04.csv.gz
//!  file / stdin          └─→ worker ─┘            one sink per date      <prefix>-2021.03.05.csv.gz
//! ```
//!
//! # Key Design
//!
//! - **Single reader**: one blocking thread reads and numbers lines
//! - **Work sharing**: workers pull from one MPMC receiver; output order is
//!   not input order
//! - **Backpressure**: both channels are bounded (capacity 1 by default), so
//!   a slow router stalls the workers and the reader
//! - **Single writer**: only the router touches partition files
//! - **Fail fast**: the first fatal error cancels every stage; opened files
//!   are still finalized
//!
//! # Example
//!
//! ```ignore
//! use logfold_pipeline::{LineSource, Pipeline, PipelineSettings, sink_factory};
//!
//! let sinks = sink_factory(&config.output, "/data/out", transformer.schema());
//! let pipeline = Pipeline::new(PipelineSettings::from(&config), transformer, sinks);
//! let summary = pipeline.run(LineSource::open("/logs/sdk.log.gz")?).await?;
//! ```

mod coordinator;
mod error;
mod metrics;
mod router;
mod shutdown;
mod source;
mod worker;

pub use coordinator::{Pipeline, PipelineSettings, PipelineSummary, sink_factory};
pub use error::{PipelineError, Result};
pub use metrics::{MetricsSnapshot, PipelineMetrics};
pub use router::{PartitionRouter, RouterSummary};
pub use shutdown::Shutdown;
pub use source::{LineSource, RawLine};
pub use worker::{WorkerContext, WorkerOutput, WorkerPool};
