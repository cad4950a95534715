//! Pipeline error types
//!
//! Anything that ends a run. In tolerant mode transform failures never get
//! here; they are counted by the router instead.

use std::io;
use std::path::PathBuf;

use logfold_sinks::SinkError;
use logfold_transform::TransformError;
use thiserror::Error;

/// Pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input file could not be opened
    #[error("failed to open input '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Input stream failed mid-read
    #[error("failed to read input after line {line}: {source}")]
    Read {
        line: u64,
        #[source]
        source: io::Error,
    },

    /// A line could not be transformed (strict mode)
    #[error("line {line}: {source}")]
    Transform {
        line: u64,
        #[source]
        source: TransformError,
    },

    /// Partition file failure
    #[error(transparent)]
    Sink(#[from] SinkError),

    /// Schema cannot be routed
    #[error("invalid schema: {0}")]
    Schema(String),

    /// A pipeline task panicked or was aborted
    #[error("pipeline task failed: {0}")]
    Task(String),
}

impl PipelineError {
    pub fn transform(line: u64, source: TransformError) -> Self {
        Self::Transform { line, source }
    }

    /// Input line the error refers to, if any
    pub fn line(&self) -> Option<u64> {
        match self {
            Self::Read { line, .. } | Self::Transform { line, .. } => Some(*line),
            _ => None,
        }
    }
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_error_display() {
        let err = PipelineError::transform(7, TransformError::LineTooShort { marker_len: 32 });
        assert!(err.to_string().starts_with("line 7: "));
        assert_eq!(err.line(), Some(7));

        let err = PipelineError::Read {
            line: 12,
            source: io::Error::other("unexpected end of gzip stream"),
        };
        assert!(err.to_string().contains("after line 12"));

        let err = PipelineError::Open {
            path: PathBuf::from("/logs/missing.log"),
            source: io::Error::new(io::ErrorKind::NotFound, "not found"),
        };
        assert!(err.to_string().contains("/logs/missing.log"));
        assert_eq!(err.line(), None);

        let err = PipelineError::Task("worker panicked".into());
        assert!(err.to_string().contains("worker panicked"));
    }

    #[test]
    fn test_sink_error_is_transparent() {
        let sink = SinkError::flush(Path::new("/out/a.csv.gz"), io::Error::other("disk full"));
        let expected = sink.to_string();

        let err = PipelineError::from(sink);
        assert_eq!(err.to_string(), expected);
    }
}
