//! Output sink settings

use std::path::PathBuf;

use serde::Deserialize;

/// Flush every open partition after this many appended records
pub const DEFAULT_FLUSH_EVERY: u64 = 1_000_000;

/// Default write buffer per partition file (256KB)
pub const DEFAULT_BUFFER_SIZE: usize = 256 * 1024;

/// Compression applied to partition files
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    /// No compression (`.csv`)
    None,
    /// Gzip (`.csv.gz`, default)
    #[default]
    Gzip,
}

/// Partitioned CSV output configuration
///
/// ```toml
/// [output]
/// dir = "/data/out"
/// file_prefix = "sdk-log"
/// header = true
/// compression = "gzip"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory for partition files. When unset the directory of the
    /// input file is used, or the working directory for stdin.
    pub dir: Option<PathBuf>,

    /// File name prefix: `<prefix>-<YYYY.MM.DD>.csv.gz`
    /// Default: "sdk-log"
    pub file_prefix: String,

    /// Write the column names as the first row of each new file
    /// Default: false
    pub header: bool,

    /// Default: gzip
    pub compression: Compression,

    /// Records appended (across all partitions) between batched flushes
    /// Default: 1,000,000
    pub flush_every: u64,

    /// Write buffer size per partition file in bytes
    /// Default: 256KB
    pub buffer_size: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: None,
            file_prefix: "sdk-log".into(),
            header: false,
            compression: Compression::Gzip,
            flush_every: DEFAULT_FLUSH_EVERY,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OutputConfig::default();
        assert!(config.dir.is_none());
        assert_eq!(config.file_prefix, "sdk-log");
        assert!(!config.header);
        assert_eq!(config.compression, Compression::Gzip);
        assert_eq!(config.flush_every, 1_000_000);
    }

    #[test]
    fn test_deserialize_partial() {
        let toml = r#"
dir = "/tmp/out"
compression = "none"
"#;
        let config: OutputConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.dir, Some(PathBuf::from("/tmp/out")));
        assert_eq!(config.compression, Compression::None);
        assert_eq!(config.file_prefix, "sdk-log");
        assert_eq!(config.buffer_size, DEFAULT_BUFFER_SIZE);
    }
}
