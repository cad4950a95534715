//! Pipeline and input settings
//!
//! Controls worker pool sizing, channel depth, error policy and how raw
//! input lines are framed.

use std::time::Duration;

use serde::Deserialize;

/// Length of the envelope marker that prefixes every logged line,
/// e.g. `[2017-12-01 20:55:08 ~ SDK ~ 0] `
pub const DEFAULT_MARKER_LEN: usize = 32;

/// What the pipeline does when a single line cannot be transformed
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ErrorMode {
    /// First unrecoverable error stops the whole pipeline (default)
    #[default]
    Strict,
    /// Skip the offending line, count it and keep going
    Tolerant,
}

impl ErrorMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Tolerant => "tolerant",
        }
    }
}

/// Worker pool and channel configuration
///
/// ```toml
/// [pipeline]
/// worker_multiplier = 2
/// channel_capacity = 1
/// error_mode = "tolerant"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Workers per available core
    /// Default: 1
    pub worker_multiplier: usize,

    /// Capacity of the input and output channels. 1 keeps both channels
    /// close to a rendezvous so a slow router back-pressures the reader.
    /// Default: 1
    pub channel_capacity: usize,

    /// Error policy
    /// Default: strict
    pub error_mode: ErrorMode,

    /// Seconds between progress log lines, 0 disables them
    /// Default: 10
    pub progress_interval: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            worker_multiplier: 1,
            channel_capacity: 1,
            error_mode: ErrorMode::Strict,
            progress_interval: 10,
        }
    }
}

impl PipelineConfig {
    /// Number of workers: available cores × multiplier, at least 1
    pub fn worker_count(&self) -> usize {
        available_cores()
            .saturating_mul(self.worker_multiplier)
            .max(1)
    }

    /// Progress log interval, None when disabled
    pub fn progress_every(&self) -> Option<Duration> {
        (self.progress_interval > 0).then(|| Duration::from_secs(self.progress_interval))
    }
}

/// Input framing
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Number of bytes stripped from the start of every line
    /// Default: 32
    pub marker_len: usize,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            marker_len: DEFAULT_MARKER_LEN,
        }
    }
}

/// Number of available CPUs, defaulting to 4 if detection fails
fn available_cores() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.worker_multiplier, 1);
        assert_eq!(config.channel_capacity, 1);
        assert_eq!(config.error_mode, ErrorMode::Strict);
        assert_eq!(InputConfig::default().marker_len, 32);
    }

    #[test]
    fn test_marker_len_matches_sdk_prefix() {
        assert_eq!("[2017-12-01 20:55:08 ~ SDK ~ 0] ".len(), DEFAULT_MARKER_LEN);
    }

    #[test]
    fn test_worker_count_scales_with_multiplier() {
        let one = PipelineConfig::default().worker_count();
        let three = PipelineConfig {
            worker_multiplier: 3,
            ..Default::default()
        }
        .worker_count();

        assert!(one >= 1);
        assert_eq!(three, one * 3);
    }

    #[test]
    fn test_worker_count_never_zero() {
        let config = PipelineConfig {
            worker_multiplier: 0,
            ..Default::default()
        };
        assert_eq!(config.worker_count(), 1);
    }

    #[test]
    fn test_deserialize_tolerant() {
        let toml = r#"
worker_multiplier = 4
error_mode = "tolerant"
"#;
        let config: PipelineConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.worker_multiplier, 4);
        assert_eq!(config.error_mode, ErrorMode::Tolerant);
        assert_eq!(config.channel_capacity, 1);
        assert_eq!(config.progress_every(), Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_progress_disabled_by_zero() {
        let config: PipelineConfig = toml::from_str("progress_interval = 0").unwrap();
        assert_eq!(config.progress_every(), None);
    }
}
