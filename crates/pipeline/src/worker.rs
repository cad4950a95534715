//! Worker pool - parallel line → record transformation
//!
//! Workers share one input receiver, so lines are handed out to whichever
//! worker is free and records reach the router in no particular order.
//! A worker exits when the input closes, when the router goes away or when
//! the run is cancelled.
//!
//! Transforms run inline on the async worker threads, so workers beyond the
//! runtime's thread count only add queueing. The binary sizes its runtime to
//! the worker count.

use std::sync::Arc;
use std::time::Instant;

use crossfire::MAsyncRx;
use logfold_config::ErrorMode;
use logfold_transform::{OutputRecord, RecordTransformer, TransformError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::metrics::PipelineMetrics;
use crate::shutdown::Shutdown;
use crate::source::RawLine;

/// What a worker hands to the router
#[derive(Debug)]
pub enum WorkerOutput {
    Record(OutputRecord),
    /// Line skipped in tolerant mode
    Rejected { line: RawLine, error: TransformError },
}

/// Everything a worker needs, cloned once per worker
#[derive(Clone)]
pub struct WorkerContext {
    pub transformer: Arc<RecordTransformer>,
    pub error_mode: ErrorMode,
    pub shutdown: Arc<Shutdown>,
    pub metrics: Arc<PipelineMetrics>,
}

/// Running worker tasks
#[derive(Debug)]
pub struct WorkerPool {
    handles: Vec<JoinHandle<u64>>,
}

impl WorkerPool {
    /// Spawn `count` workers on the current runtime
    ///
    /// The pool takes ownership of `output`; the router's receiver closes
    /// once the last worker exits.
    pub fn spawn(
        count: usize,
        context: WorkerContext,
        input: MAsyncRx<RawLine>,
        output: mpsc::Sender<WorkerOutput>,
    ) -> Self {
        let handles = (0..count.max(1))
            .map(|id| {
                tokio::spawn(run_worker(
                    id,
                    context.clone(),
                    input.clone(),
                    output.clone(),
                ))
            })
            .collect();
        Self { handles }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Wait for every worker; returns the lines they processed
    ///
    /// # Errors
    ///
    /// A worker that panicked. The remaining workers are still awaited.
    pub async fn join(self) -> Result<u64> {
        let mut processed = 0;
        let mut failure = None;
        for handle in self.handles {
            match handle.await {
                Ok(count) => processed += count,
                Err(e) => {
                    failure.get_or_insert(PipelineError::Task(format!("worker: {e}")));
                }
            }
        }
        match failure {
            Some(err) => Err(err),
            None => Ok(processed),
        }
    }
}

async fn run_worker(
    id: usize,
    context: WorkerContext,
    input: MAsyncRx<RawLine>,
    output: mpsc::Sender<WorkerOutput>,
) -> u64 {
    let WorkerContext {
        transformer,
        error_mode,
        shutdown,
        metrics,
    } = context;
    let mut processed = 0u64;

    loop {
        let line = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            received = input.recv() => match received {
                Ok(line) => line,
                Err(_) => break,
            },
        };
        processed += 1;

        let start = Instant::now();
        let message = match transformer.transform(&line.text) {
            Ok(record) => {
                metrics.record_transformed(start.elapsed());
                WorkerOutput::Record(record)
            }
            Err(error) => match error_mode {
                ErrorMode::Strict => {
                    shutdown.fail(PipelineError::transform(line.number, error));
                    break;
                }
                ErrorMode::Tolerant => WorkerOutput::Rejected { line, error },
            },
        };

        let sent = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            sent = output.send(message) => sent,
        };
        if sent.is_err() {
            break;
        }
    }

    debug!(worker = id, processed, "worker stopped");
    processed
}
