//! Partition sinks - one CSV file per calendar date
//!
//! # Layers
//!
//! ```text
//! [csv::Writer] → [ChainWrite: gzip encoder → BufWriter] → [File]
//! ```
//!
//! # Finalization
//!
//! [`PartitionSink::finalize`] unwinds the layers outermost first: the CSV
//! buffer is flushed, the compression trailer is written, the file buffer
//! is flushed, the file is synced and closed. It consumes the sink, so it
//! runs at most once per partition.

use std::fmt;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use csv::{Writer, WriterBuilder};
use tracing::{debug, info};

use crate::error::{SinkError, SinkResult};
use crate::metrics::SinkMetrics;
use crate::util::chain_writer::{ChainWrite, ChainWriter};

#[cfg(test)]
#[path = "partition_test.rs"]
mod tests;

/// Calendar-date partition key, e.g. `2021.03.04`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartitionKey(String);

impl PartitionKey {
    /// Derive the key from a formatted request time
    ///
    /// Takes the text before the first space and turns `-` into `.`; any
    /// other character unsafe in a file name becomes `_`.
    pub fn from_request_time(formatted: &str) -> Self {
        let date = formatted.split(' ').next().unwrap_or_default();
        Self(
            date.chars()
                .map(|c| match c {
                    '-' => '.',
                    c if c.is_ascii_alphanumeric() || c == '.' => c,
                    _ => '_',
                })
                .collect(),
        )
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of finalizing one partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionSummary {
    pub key: PartitionKey,
    pub path: PathBuf,
    pub records: u64,
    /// Uncompressed bytes, header included
    pub bytes: u64,
}

/// Opens partition sinks on demand
pub struct PartitionSinkFactory {
    dir: PathBuf,
    prefix: String,
    header: Option<Vec<String>>,
    writer: Arc<dyn ChainWriter>,
    metrics: Arc<SinkMetrics>,
}

impl PartitionSinkFactory {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>, writer: Arc<dyn ChainWriter>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            header: None,
            writer,
            metrics: Arc::new(SinkMetrics::new()),
        }
    }

    /// Write `names` as the first row of every new file
    #[must_use]
    pub fn with_header<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.header = Some(names.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<SinkMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &Arc<SinkMetrics> {
        &self.metrics
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `<dir>/<prefix>-<key><ext>`
    pub fn path_for(&self, key: &PartitionKey) -> PathBuf {
        self.dir.join(format!(
            "{}-{}{}",
            self.prefix,
            key,
            self.writer.file_extension()
        ))
    }

    /// Create (or truncate) the file for `key` and wrap it for writing
    pub fn open(&self, key: PartitionKey) -> SinkResult<PartitionSink> {
        fs::create_dir_all(&self.dir).map_err(|e| SinkError::create(&self.dir, e))?;

        let path = self.path_for(&key);
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .map_err(|e| SinkError::create(&path, e))?;
        let chain = self
            .writer
            .wrap(file)
            .map_err(|e| SinkError::create(&path, e))?;

        let mut writer = WriterBuilder::new().has_headers(false).from_writer(chain);
        if let Some(names) = &self.header {
            writer
                .write_record(names)
                .map_err(|e| SinkError::write(&path, e))?;
        }

        self.metrics.partition_opened();
        info!(partition = %key, path = %path.display(), "opened partition");

        Ok(PartitionSink {
            key,
            path,
            writer,
            records: 0,
            metrics: Arc::clone(&self.metrics),
        })
    }
}

impl fmt::Debug for PartitionSinkFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartitionSinkFactory")
            .field("dir", &self.dir)
            .field("prefix", &self.prefix)
            .field("header", &self.header.is_some())
            .field("extension", &self.writer.file_extension())
            .finish()
    }
}

/// One open partition file
pub struct PartitionSink {
    key: PartitionKey,
    path: PathBuf,
    writer: Writer<Box<dyn ChainWrite>>,
    records: u64,
    metrics: Arc<SinkMetrics>,
}

impl PartitionSink {
    pub fn key(&self) -> &PartitionKey {
        &self.key
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rows appended so far
    pub fn records(&self) -> u64 {
        self.records
    }

    /// Append one row
    pub fn append<I, T>(&mut self, fields: I) -> SinkResult<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        self.writer
            .write_record(fields)
            .map_err(|e| SinkError::write(&self.path, e))?;
        self.records += 1;
        self.metrics.record_written();
        Ok(())
    }

    /// Push buffered rows through the compressor to the file
    pub fn flush(&mut self) -> SinkResult<()> {
        self.writer
            .flush()
            .map_err(|e| SinkError::flush(&self.path, e))?;
        self.metrics.flushed();
        Ok(())
    }

    /// Flush, write the trailer, sync and close
    pub fn finalize(self) -> SinkResult<PartitionSummary> {
        let Self {
            key,
            path,
            writer,
            records,
            metrics,
        } = self;

        let chain = writer
            .into_inner()
            .map_err(|e| SinkError::flush(&path, e.into_error()))?;
        let bytes = chain.bytes_written();
        chain.finish().map_err(|e| SinkError::finish(&path, e))?;

        metrics.partition_finalized(bytes);
        debug!(partition = %key, records, bytes, "finalized partition");

        Ok(PartitionSummary {
            key,
            path,
            records,
            bytes,
        })
    }
}

impl fmt::Debug for PartitionSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartitionSink")
            .field("key", &self.key)
            .field("path", &self.path)
            .field("records", &self.records)
            .finish_non_exhaustive()
    }
}
