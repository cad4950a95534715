//! Line source - the single reader feeding the worker pool
//!
//! Reads a file or stdin line by line, transparently gunzipping input that
//! starts with the gzip magic bytes. Lines are numbered from 1 as they
//! appear in the (decompressed) input; blank lines are skipped but still
//! counted so numbers match what an editor shows.

use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;
use std::sync::Arc;

use crossfire::MTx;
use flate2::bufread::MultiGzDecoder;
use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use crate::metrics::PipelineMetrics;
use crate::shutdown::Shutdown;

#[cfg(test)]
#[path = "source_test.rs"]
mod tests;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Read buffer for the raw input (1MB)
const READ_BUFFER_SIZE: usize = 1024 * 1024;

/// One non-blank input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    /// 1-based position in the input
    pub number: u64,
    /// Line text without its terminator; invalid UTF-8 is replaced
    pub text: String,
}

pub struct LineSource {
    name: String,
    reader: Box<dyn BufRead + Send>,
    buf: Vec<u8>,
    line: u64,
    metrics: Option<Arc<PipelineMetrics>>,
}

impl LineSource {
    /// Open a file, gzip or plain
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let open_err = |source| PipelineError::Open {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(open_err)?;
        Self::from_reader(path.display().to_string(), file).map_err(open_err)
    }

    pub fn stdin() -> Result<Self> {
        Self::from_reader("<stdin>", io::stdin()).map_err(|source| PipelineError::Open {
            path: "<stdin>".into(),
            source,
        })
    }

    /// Wrap any reader, sniffing the first bytes for gzip
    pub fn from_reader<R>(name: impl Into<String>, reader: R) -> io::Result<Self>
    where
        R: Read + Send + 'static,
    {
        let mut buffered = BufReader::with_capacity(READ_BUFFER_SIZE, reader);
        let compressed = buffered.fill_buf()?.starts_with(&GZIP_MAGIC);
        let reader: Box<dyn BufRead + Send> = if compressed {
            Box::new(BufReader::with_capacity(
                READ_BUFFER_SIZE,
                MultiGzDecoder::new(buffered),
            ))
        } else {
            Box::new(buffered)
        };

        let name = name.into();
        debug!(source = %name, compressed, "opened input");
        Ok(Self {
            name,
            reader,
            buf: Vec::new(),
            line: 0,
            metrics: None,
        })
    }

    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<PipelineMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lines consumed so far, blank ones included
    pub fn position(&self) -> u64 {
        self.line
    }

    /// Next non-blank line, or None at end of input
    pub fn next_line(&mut self) -> Result<Option<RawLine>> {
        loop {
            self.buf.clear();
            let n = self
                .reader
                .read_until(b'\n', &mut self.buf)
                .map_err(|source| PipelineError::Read {
                    line: self.line,
                    source,
                })?;
            if n == 0 {
                return Ok(None);
            }
            self.line += 1;

            let text = strip_terminator(&self.buf);
            if text.iter().all(u8::is_ascii_whitespace) {
                if let Some(metrics) = &self.metrics {
                    metrics.record_skipped();
                }
                continue;
            }

            if let Some(metrics) = &self.metrics {
                metrics.record_line();
            }
            return Ok(Some(RawLine {
                number: self.line,
                text: String::from_utf8_lossy(text).into_owned(),
            }));
        }
    }

    /// Push every line into `tx` until the input ends, the channel closes
    /// or the run is cancelled. Blocks; run it off the async runtime.
    ///
    /// Returns the number of lines sent.
    pub fn feed(mut self, tx: MTx<RawLine>, shutdown: &Shutdown) -> u64 {
        let mut sent = 0u64;
        loop {
            if shutdown.is_cancelled() {
                debug!(source = %self.name, sent, "reader cancelled");
                return sent;
            }
            match self.next_line() {
                Ok(Some(line)) => {
                    if tx.send(line).is_err() {
                        debug!(source = %self.name, sent, "input channel closed");
                        return sent;
                    }
                    sent += 1;
                }
                Ok(None) => break,
                Err(err) => {
                    shutdown.fail(err);
                    return sent;
                }
            }
        }

        info!(source = %self.name, lines = self.line, sent, "input exhausted");
        sent
    }
}

impl Iterator for LineSource {
    type Item = Result<RawLine>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_line().transpose()
    }
}

impl fmt::Debug for LineSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineSource")
            .field("name", &self.name)
            .field("line", &self.line)
            .finish_non_exhaustive()
    }
}

/// Drop a trailing `\n` or `\r\n`
fn strip_terminator(bytes: &[u8]) -> &[u8] {
    let bytes = bytes.strip_suffix(b"\n").unwrap_or(bytes);
    bytes.strip_suffix(b"\r").unwrap_or(bytes)
}
