//! Pipeline coordinator - wires reader, workers and router together
//!
//! # Topology
//!
//! ```text
//! [LineSource] --MPMC--> [worker × N] --MPSC--> [PartitionRouter] --> files
//!  (blocking)              (tokio)                  (blocking)
//! ```
//!
//! # Shutdown
//!
//! The reader drops its sender at end of input, workers drain the channel
//! and exit, the pool drops the last output sender, the router drains,
//! finalizes every partition and returns its summary. A fatal error
//! anywhere cancels the shared [`Shutdown`]; the same sequence then runs
//! early and the first error is returned.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use logfold_config::{Config, ErrorMode, OutputConfig};
use logfold_sinks::util::chain_writer_for;
use logfold_sinks::{PartitionSinkFactory, PartitionSummary};
use logfold_transform::{RecordTransformer, Schema};
use tokio::sync::mpsc;
use tokio::task::{self, JoinHandle};
use tracing::info;

use crate::error::{PipelineError, Result};
use crate::metrics::PipelineMetrics;
use crate::router::{PartitionRouter, RouterSummary};
use crate::shutdown::Shutdown;
use crate::source::{LineSource, RawLine};
use crate::worker::{WorkerContext, WorkerOutput, WorkerPool};

/// Runtime knobs for one run
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub workers: usize,
    pub channel_capacity: usize,
    pub error_mode: ErrorMode,
    pub flush_every: u64,
    pub progress_interval: Option<Duration>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for PipelineSettings {
    fn from(config: &Config) -> Self {
        Self {
            workers: config.pipeline.worker_count(),
            channel_capacity: config.pipeline.channel_capacity,
            error_mode: config.pipeline.error_mode,
            flush_every: config.output.flush_every,
            progress_interval: config.pipeline.progress_every(),
        }
    }
}

/// Partition factory for `output`, writing into `dir`
pub fn sink_factory(output: &OutputConfig, dir: impl Into<PathBuf>, schema: &Schema) -> PartitionSinkFactory {
    let writer = chain_writer_for(output.compression, output.buffer_size);
    let factory = PartitionSinkFactory::new(dir, output.file_prefix.clone(), writer);
    if output.header {
        factory.with_header(schema.names())
    } else {
        factory
    }
}

/// Totals for a completed run
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSummary {
    pub lines_read: u64,
    pub records_written: u64,
    pub records_rejected: u64,
    pub partitions: Vec<PartitionSummary>,
    pub cache_entries: usize,
    pub cache_hit_rate: f64,
    pub elapsed: Duration,
}

pub struct Pipeline {
    settings: PipelineSettings,
    transformer: Arc<RecordTransformer>,
    sinks: PartitionSinkFactory,
    metrics: Arc<PipelineMetrics>,
}

impl Pipeline {
    pub fn new(
        settings: PipelineSettings,
        transformer: Arc<RecordTransformer>,
        sinks: PartitionSinkFactory,
    ) -> Self {
        Self {
            settings,
            transformer,
            sinks,
            metrics: Arc::new(PipelineMetrics::new()),
        }
    }

    /// Live counters, valid after `run` has consumed the pipeline
    pub fn metrics(&self) -> Arc<PipelineMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Process `source` to completion
    ///
    /// # Errors
    ///
    /// The first fatal error: an unreadable input, a sink failure, or in
    /// strict mode a line that cannot be transformed. Partitions opened
    /// before the failure are still finalized.
    pub async fn run(self, source: LineSource) -> Result<PipelineSummary> {
        let Self {
            settings,
            transformer,
            sinks,
            metrics,
        } = self;

        let time_index = transformer
            .schema()
            .request_time_index()
            .ok_or_else(|| PipelineError::Schema("no request time column to partition by".into()))?;

        let sink_metrics = Arc::clone(sinks.metrics());
        let started = Instant::now();
        let shutdown = Arc::new(Shutdown::new());
        let capacity = settings.channel_capacity.max(1);
        let (line_tx, line_rx) = crossfire::mpmc::bounded_tx_blocking_rx_async::<RawLine>(capacity);
        let (output_tx, output_rx) = mpsc::channel::<WorkerOutput>(capacity);

        info!(
            source = source.name(),
            workers = settings.workers,
            channel_capacity = capacity,
            error_mode = settings.error_mode.as_str(),
            "pipeline starting"
        );

        let router = PartitionRouter::new(sinks, time_index, settings.flush_every)
            .with_metrics(Arc::clone(&metrics));
        let router_task = {
            let shutdown = Arc::clone(&shutdown);
            task::spawn_blocking(move || router.run(output_rx, &shutdown))
        };

        let pool = WorkerPool::spawn(
            settings.workers,
            WorkerContext {
                transformer: Arc::clone(&transformer),
                error_mode: settings.error_mode,
                shutdown: Arc::clone(&shutdown),
                metrics: Arc::clone(&metrics),
            },
            line_rx,
            output_tx,
        );

        let source = source.with_metrics(Arc::clone(&metrics));
        let reader_task = {
            let shutdown = Arc::clone(&shutdown);
            task::spawn_blocking(move || source.feed(line_tx, &shutdown))
        };

        let progress = settings
            .progress_interval
            .map(|interval| spawn_progress(interval, Arc::clone(&metrics)));

        if let Err(e) = reader_task.await {
            shutdown.fail(PipelineError::Task(format!("reader: {e}")));
        }
        if let Err(e) = pool.join().await {
            shutdown.fail(e);
        }
        let routed = match router_task.await {
            Ok(summary) => summary,
            Err(e) => {
                shutdown.fail(PipelineError::Task(format!("router: {e}")));
                RouterSummary::default()
            }
        };
        if let Some(progress) = progress {
            progress.abort();
        }

        if let Some(err) = shutdown.take_error() {
            return Err(err);
        }

        let cache = transformer.cache();
        let summary = PipelineSummary {
            lines_read: metrics.lines_read(),
            records_written: routed.records_written,
            records_rejected: routed.records_rejected,
            partitions: routed.partitions,
            cache_entries: cache.len(),
            cache_hit_rate: cache.stats().hit_rate(),
            elapsed: started.elapsed(),
        };

        let written = sink_metrics.snapshot();
        info!(
            lines_read = summary.lines_read,
            records_written = summary.records_written,
            records_rejected = summary.records_rejected,
            partitions = summary.partitions.len(),
            bytes_written = written.bytes_written,
            flushes = written.flush_count,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "pipeline finished"
        );
        Ok(summary)
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("settings", &self.settings)
            .field("sinks", &self.sinks)
            .finish_non_exhaustive()
    }
}

/// Log throughput every `interval` until aborted
fn spawn_progress(interval: Duration, metrics: Arc<PipelineMetrics>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // first tick completes immediately
        ticker.tick().await;
        let mut previous = metrics.snapshot();

        loop {
            ticker.tick().await;
            let current = metrics.snapshot();
            let delta = current.diff(&previous);
            info!(
                lines_read = current.lines_read,
                records_written = current.records_written,
                records_rejected = current.records_rejected,
                lines_per_sec = (delta.lines_read as f64 / interval.as_secs_f64()).round() as u64,
                mean_transform_us = current
                    .mean_transform_time()
                    .map(|d| d.as_micros() as u64)
                    .unwrap_or_default(),
                "progress"
            );
            previous = current;
        }
    })
}
