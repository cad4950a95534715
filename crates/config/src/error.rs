//! Errors raised while loading a config file

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read at all
    #[error("cannot read {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Not valid TOML, or a value of the wrong type
    #[error("malformed config: {0}")]
    Malformed(#[from] toml::de::Error),

    /// Well-formed but rejected by validation
    #[error("[{section}] {field}: {reason}")]
    Rejected {
        section: &'static str,
        field: &'static str,
        reason: String,
    },
}

impl ConfigError {
    pub fn rejected(section: &'static str, field: &'static str, reason: impl Into<String>) -> Self {
        Self::Rejected {
            section,
            field,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_names_section_and_field() {
        let err = ConfigError::rejected("pipeline", "worker_multiplier", "must be at least 1");
        assert_eq!(err.to_string(), "[pipeline] worker_multiplier: must be at least 1");
    }

    #[test]
    fn test_unreadable_shows_path() {
        let err = ConfigError::Unreadable {
            path: PathBuf::from("/etc/logfold.toml"),
            source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
        };
        let text = err.to_string();
        assert!(text.starts_with("cannot read /etc/logfold.toml"));
        assert!(text.ends_with("no such file"));
    }
}
