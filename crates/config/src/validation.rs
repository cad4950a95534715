//! Configuration validation
//!
//! Checks values that deserialize fine but cannot drive a run:
//! - zero-sized worker multiplier, channels or flush interval
//! - file prefixes that would escape the output directory
//! - empty geolocation locale

use crate::Config;
use crate::error::{ConfigError, Result};

/// Validate the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_pipeline(config)?;
    validate_output(config)?;
    validate_geo(config)?;
    Ok(())
}

fn validate_pipeline(config: &Config) -> Result<()> {
    if config.pipeline.worker_multiplier == 0 {
        return Err(ConfigError::rejected(
            "pipeline",
            "worker_multiplier",
            "must be at least 1",
        ));
    }
    if config.pipeline.channel_capacity == 0 {
        return Err(ConfigError::rejected(
            "pipeline",
            "channel_capacity",
            "must be at least 1",
        ));
    }
    Ok(())
}

fn validate_output(config: &Config) -> Result<()> {
    let output = &config.output;

    if output.file_prefix.is_empty() {
        return Err(ConfigError::rejected(
            "output",
            "file_prefix",
            "must not be empty",
        ));
    }
    if output.file_prefix.contains(['/', '\\']) || output.file_prefix.contains("..") {
        return Err(ConfigError::rejected(
            "output",
            "file_prefix",
            format!("'{}' must be a plain file name", output.file_prefix),
        ));
    }
    if output.flush_every == 0 {
        return Err(ConfigError::rejected(
            "output",
            "flush_every",
            "must be at least 1",
        ));
    }
    if output.buffer_size == 0 {
        return Err(ConfigError::rejected(
            "output",
            "buffer_size",
            "must be at least 1",
        ));
    }
    Ok(())
}

fn validate_geo(config: &Config) -> Result<()> {
    if config.geo.locale.trim().is_empty() {
        return Err(ConfigError::rejected("geo", "locale", "must not be empty"));
    }
    Ok(())
}
