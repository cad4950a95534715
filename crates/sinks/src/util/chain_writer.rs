//! Chain writers for partition output files
//!
//! A chain writer wraps a freshly created file in a buffer and, optionally,
//! a compression layer. The partition sink writes CSV rows into the chain
//! and calls [`ChainWrite::finish`] exactly once when the run ends.
//!
//! # Available Writers
//!
//! - `GzipWriter` - gzip compressed output (`.csv.gz`)
//! - `PlainWriter` - buffered uncompressed output (`.csv`)
//!
//! # Example
//!
//! ```ignore
//! use std::fs::File;
//! use logfold_sinks::util::chain_writer::{ChainWriter, GzipWriter};
//!
//! let writer = GzipWriter::default();
//! let file = File::create("sdk-log-2021.03.04.csv.gz")?;
//! let mut chain = writer.wrap(file)?;
//!
//! chain.write_all(b"a,b,c\n")?;
//! chain.finish()?;
//! ```

use std::fs::File;
use std::io::{self, BufWriter, IntoInnerError, Write};
use std::sync::Arc;

use flate2::write::GzEncoder;
use logfold_config::Compression;

#[cfg(test)]
#[path = "chain_writer_test.rs"]
mod chain_writer_test;

/// Default buffer size between the compressor and the file
pub const DEFAULT_BUFFER_SIZE: usize = logfold_config::DEFAULT_BUFFER_SIZE;

/// Trait for pluggable chain writers
///
/// Implementations wrap a file and provide buffered writing with optional
/// compression. The chain owns the file from then on.
pub trait ChainWriter: Send + Sync {
    /// Wrap a file with this writer's buffering/compression strategy
    fn wrap(&self, file: File) -> io::Result<Box<dyn ChainWrite>>;

    /// File extension including the leading dot
    fn file_extension(&self) -> &'static str;
}

/// Trait for the actual write operations
///
/// `Write::flush` pushes everything written so far down to the file. For
/// compressed chains that ends the current deflate block, so the file is
/// readable up to that point but still lacks its trailer.
pub trait ChainWrite: Write + Send {
    /// Write the compression trailer, flush the buffer, sync and close the
    /// file, in that order
    fn finish(self: Box<Self>) -> io::Result<()>;

    /// Uncompressed bytes accepted so far
    fn bytes_written(&self) -> u64;
}

/// Chain writer matching the configured compression
pub fn chain_writer_for(compression: Compression, buffer_size: usize) -> Arc<dyn ChainWriter> {
    match compression {
        Compression::Gzip => Arc::new(GzipWriter::new(buffer_size)),
        Compression::None => Arc::new(PlainWriter::new(buffer_size)),
    }
}

fn close_file(writer: BufWriter<File>) -> io::Result<()> {
    let file = writer.into_inner().map_err(IntoInnerError::into_error)?;
    file.sync_all()
}

// ============================================================================
// GzipWriter - gzip compressed output
// ============================================================================

/// Gzip writer
#[derive(Debug, Clone)]
pub struct GzipWriter {
    buffer_size: usize,
    level: flate2::Compression,
}

impl GzipWriter {
    pub fn new(buffer_size: usize) -> Self {
        Self {
            buffer_size,
            level: flate2::Compression::default(),
        }
    }

    /// Override the compression level (0-9)
    #[must_use]
    pub fn with_level(mut self, level: u32) -> Self {
        self.level = flate2::Compression::new(level.min(9));
        self
    }
}

impl Default for GzipWriter {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_SIZE)
    }
}

impl ChainWriter for GzipWriter {
    fn wrap(&self, file: File) -> io::Result<Box<dyn ChainWrite>> {
        let buf_writer = BufWriter::with_capacity(self.buffer_size, file);
        Ok(Box::new(GzipChain {
            encoder: GzEncoder::new(buf_writer, self.level),
            bytes_written: 0,
        }))
    }

    fn file_extension(&self) -> &'static str {
        ".csv.gz"
    }
}

struct GzipChain {
    encoder: GzEncoder<BufWriter<File>>,
    bytes_written: u64,
}

impl Write for GzipChain {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.encoder.write(buf)?;
        self.bytes_written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.encoder.flush()
    }
}

impl ChainWrite for GzipChain {
    fn finish(self: Box<Self>) -> io::Result<()> {
        let buf_writer = self.encoder.finish()?;
        close_file(buf_writer)
    }

    fn bytes_written(&self) -> u64 {
        self.bytes_written
    }
}

// ============================================================================
// PlainWriter - buffered uncompressed output
// ============================================================================

/// Plain writer with buffering (no compression)
#[derive(Debug, Clone)]
pub struct PlainWriter {
    buffer_size: usize,
}

impl PlainWriter {
    pub fn new(buffer_size: usize) -> Self {
        Self { buffer_size }
    }
}

impl Default for PlainWriter {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_SIZE)
    }
}

impl ChainWriter for PlainWriter {
    fn wrap(&self, file: File) -> io::Result<Box<dyn ChainWrite>> {
        Ok(Box::new(PlainChain {
            writer: BufWriter::with_capacity(self.buffer_size, file),
            bytes_written: 0,
        }))
    }

    fn file_extension(&self) -> &'static str {
        ".csv"
    }
}

struct PlainChain {
    writer: BufWriter<File>,
    bytes_written: u64,
}

impl Write for PlainChain {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.writer.write(buf)?;
        self.bytes_written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

impl ChainWrite for PlainChain {
    fn finish(self: Box<Self>) -> io::Result<()> {
        close_file(self.writer)
    }

    fn bytes_written(&self) -> u64 {
        self.bytes_written
    }
}
