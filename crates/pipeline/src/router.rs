//! Partition router - records to per-date sinks
//!
//! The router is the single owner of every open [`PartitionSink`]. It picks
//! the sink by the date part of each record's request time, opening the
//! file on first use, and flushes all sinks together every `flush_every`
//! records.
//!
//! # Example
//!
//! ```ignore
//! let (tx, rx) = tokio::sync::mpsc::channel(1);
//! let router = PartitionRouter::new(factory, schema.request_time_index().unwrap(), 1_000_000);
//!
//! // Blocking: runs on its own thread until every sender is dropped
//! let summary = tokio::task::spawn_blocking(move || router.run(rx, &shutdown)).await?;
//! ```

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use logfold_sinks::util::RateLimitedLogger;
use logfold_sinks::{PartitionKey, PartitionSink, PartitionSinkFactory, PartitionSummary, SinkResult};
use logfold_transform::{OutputRecord, TransformError};
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::metrics::PipelineMetrics;
use crate::shutdown::Shutdown;
use crate::source::RawLine;
use crate::worker::WorkerOutput;

#[cfg(test)]
#[path = "router_test.rs"]
mod tests;

/// Outcome of a router run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouterSummary {
    pub records_written: u64,
    pub records_rejected: u64,
    /// Finalized partitions, ordered by key
    pub partitions: Vec<PartitionSummary>,
}

pub struct PartitionRouter {
    factory: PartitionSinkFactory,
    sinks: HashMap<PartitionKey, PartitionSink>,

    /// Column holding the formatted request time
    time_index: usize,

    flush_every: u64,
    since_flush: u64,

    records_written: u64,
    records_rejected: u64,

    reject_log: RateLimitedLogger,
    metrics: Arc<PipelineMetrics>,
}

impl PartitionRouter {
    pub fn new(factory: PartitionSinkFactory, time_index: usize, flush_every: u64) -> Self {
        Self {
            factory,
            sinks: HashMap::new(),
            time_index,
            flush_every: flush_every.max(1),
            since_flush: 0,
            records_written: 0,
            records_rejected: 0,
            reject_log: RateLimitedLogger::default(),
            metrics: Arc::new(PipelineMetrics::new()),
        }
    }

    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<PipelineMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    #[must_use]
    pub fn with_reject_log(mut self, logger: RateLimitedLogger) -> Self {
        self.reject_log = logger;
        self
    }

    /// Open partitions
    pub fn partition_count(&self) -> usize {
        self.sinks.len()
    }

    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    pub fn records_rejected(&self) -> u64 {
        self.records_rejected
    }

    pub fn handle(&mut self, output: WorkerOutput) -> SinkResult<()> {
        match output {
            WorkerOutput::Record(record) => self.route(&record),
            WorkerOutput::Rejected { line, error } => {
                self.reject(&line, &error);
                Ok(())
            }
        }
    }

    /// Append a record to its date's partition
    pub fn route(&mut self, record: &OutputRecord) -> SinkResult<()> {
        let key = PartitionKey::from_request_time(record.get(self.time_index).unwrap_or_default());
        let sink = match self.sinks.entry(key) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let sink = self.factory.open(entry.key().clone())?;
                entry.insert(sink)
            }
        };
        sink.append(record.fields())?;

        self.records_written += 1;
        self.metrics.record_written();

        self.since_flush += 1;
        if self.since_flush >= self.flush_every {
            self.flush_all()?;
        }
        Ok(())
    }

    /// Count and (rate limited) log a line skipped in tolerant mode
    pub fn reject(&mut self, line: &RawLine, error: &TransformError) {
        self.records_rejected += 1;
        self.metrics.record_rejected();
        self.reject_log
            .rejected(line.number, error, line.text.as_bytes());
    }

    /// Flush every open sink
    pub fn flush_all(&mut self) -> SinkResult<()> {
        for sink in self.sinks.values_mut() {
            sink.flush()?;
        }
        self.since_flush = 0;
        Ok(())
    }

    /// Finalize every open sink
    ///
    /// Keeps going after a failure so the other files still get their
    /// trailers; the first failure is returned.
    pub fn finish(self) -> SinkResult<RouterSummary> {
        let mut sinks: Vec<PartitionSink> = self.sinks.into_values().collect();
        sinks.sort_by(|a, b| a.key().cmp(b.key()));

        let mut partitions = Vec::with_capacity(sinks.len());
        let mut first_error = None;
        for sink in sinks {
            match sink.finalize() {
                Ok(summary) => partitions.push(summary),
                Err(err) => {
                    error!(error = %err, "failed to finalize partition");
                    first_error.get_or_insert(err);
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(RouterSummary {
                records_written: self.records_written,
                records_rejected: self.records_rejected,
                partitions,
            }),
        }
    }

    /// Consume worker output until every sender is gone, then finalize
    ///
    /// Blocks; run it off the async runtime. Sink errors are reported to
    /// `shutdown`, in which case the returned summary is empty.
    pub fn run(mut self, mut receiver: mpsc::Receiver<WorkerOutput>, shutdown: &Shutdown) -> RouterSummary {
        info!(
            dir = %self.factory.dir().display(),
            flush_every = self.flush_every,
            "router starting"
        );

        while let Some(output) = receiver.blocking_recv() {
            if let Err(err) = self.handle(output) {
                shutdown.fail(err.into());
                break;
            }
        }
        // wake any worker still waiting to send
        receiver.close();

        let summary = match self.finish() {
            Ok(summary) => summary,
            Err(err) => {
                shutdown.fail(err.into());
                RouterSummary::default()
            }
        };

        info!(
            records_written = summary.records_written,
            records_rejected = summary.records_rejected,
            partitions = summary.partitions.len(),
            "router shutting down"
        );
        summary
    }
}

impl std::fmt::Debug for PartitionRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PartitionRouter")
            .field("factory", &self.factory)
            .field("open_partitions", &self.sinks.len())
            .field("time_index", &self.time_index)
            .field("flush_every", &self.flush_every)
            .field("records_written", &self.records_written)
            .finish_non_exhaustive()
    }
}
