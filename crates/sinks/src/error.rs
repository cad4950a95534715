//! Sink errors
//!
//! Every variant carries the path of the file involved. All of them are
//! fatal to a run regardless of the error mode.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub type SinkResult<T> = Result<T, SinkError>;

#[derive(Debug, Error)]
pub enum SinkError {
    /// Output directory or file could not be created
    #[error("failed to create '{path}': {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A row could not be written
    #[error("write to '{path}' failed: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Buffered data could not be pushed to the file
    #[error("flush of '{path}' failed: {source}")]
    Flush {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Trailer, sync or close failed
    #[error("failed to finalize '{path}': {source}")]
    Finish {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl SinkError {
    pub fn create(path: &Path, source: io::Error) -> Self {
        Self::Create {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn write(path: &Path, source: csv::Error) -> Self {
        Self::Write {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn flush(path: &Path, source: io::Error) -> Self {
        Self::Flush {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn finish(path: &Path, source: io::Error) -> Self {
        Self::Finish {
            path: path.to_path_buf(),
            source,
        }
    }

    /// File the error refers to
    pub fn path(&self) -> &Path {
        match self {
            Self::Create { path, .. }
            | Self::Write { path, .. }
            | Self::Flush { path, .. }
            | Self::Finish { path, .. } => path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_includes_path() {
        let path = Path::new("/out/sdk-log-2021.03.04.csv.gz");

        let err = SinkError::create(path, io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
        assert_eq!(
            err.to_string(),
            "failed to create '/out/sdk-log-2021.03.04.csv.gz': denied"
        );
        assert_eq!(err.path(), path);

        let err = SinkError::flush(path, io::Error::other("disk full"));
        assert!(err.to_string().starts_with("flush of"));

        let err = SinkError::finish(path, io::Error::other("disk full"));
        assert!(err.to_string().contains("finalize"));
    }
}
