//! Transform error types
//!
//! Errors that can occur while turning one raw line into an output record.
//! Address-parse failures are not errors: resolution is skipped and the
//! sentinel labels are used.

use logfold_enrich::GeoError;
use thiserror::Error;

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;

/// Result type for transform operations
pub type TransformResult<T> = Result<T, TransformError>;

/// Errors that can occur during transformation
#[derive(Debug, Error)]
pub enum TransformError {
    /// Line ends before the envelope marker does
    #[error("line shorter than the {marker_len}-byte envelope marker")]
    LineTooShort { marker_len: usize },

    /// Envelope or nested payload is not a valid document
    #[error("failed to decode envelope: {0}")]
    DecodeError(String),

    /// Request target could not be parsed
    #[error("invalid request target '{target}': {message}")]
    UriError { target: String, message: String },

    /// Geolocation provider failed
    #[error(transparent)]
    Geo(#[from] GeoError),
}

impl TransformError {
    /// Create a decode error
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::DecodeError(msg.into())
    }

    /// Create a request target error
    pub fn uri(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UriError {
            target: target.into(),
            message: message.into(),
        }
    }

    /// Short error category for logs and counters
    pub fn kind(&self) -> &'static str {
        match self {
            Self::LineTooShort { .. } | Self::DecodeError(_) => "decode",
            Self::UriError { .. } => "uri",
            Self::Geo(_) => "geo",
        }
    }
}
