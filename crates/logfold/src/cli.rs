//! Command line arguments and how they override the config file

use std::path::{Path, PathBuf};

use clap::{ArgGroup, Parser};
use logfold_config::{Compression, Config, ErrorMode, LogLevel};

/// logfold - geo-enriched, date-partitioned CSV from SDK request logs
#[derive(Parser, Debug)]
#[command(name = "logfold")]
#[command(version, about, long_about = None)]
#[command(group(ArgGroup::new("input").required(true).args(["file", "stdin"])))]
pub struct Cli {
    /// Input log file, plain or gzip
    #[arg(short = 'f', long, value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Read the log from standard input
    #[arg(short = 'i', long)]
    pub stdin: bool,

    /// Workers per available core
    #[arg(short = 't', long = "threads", value_name = "MULTIPLIER")]
    pub worker_multiplier: Option<usize>,

    /// Path to configuration file (error if specified but not found)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error). Overrides config file.
    #[arg(short = 'l', long)]
    pub log_level: Option<LogLevel>,

    /// Directory for partition files (default: next to the input file)
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Write column names as the first row of every file
    #[arg(long)]
    pub header: bool,

    /// Skip lines that cannot be transformed instead of failing
    #[arg(long)]
    pub tolerant: bool,

    /// MaxMind City database
    #[arg(long, value_name = "PATH")]
    pub geo_db: Option<PathBuf>,

    /// Write plain `.csv` instead of `.csv.gz`
    #[arg(long)]
    pub no_compress: bool,
}

/// Where lines come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    File(PathBuf),
    Stdin,
}

impl Input {
    /// Output directory when none is configured: the input file's directory,
    /// or the working directory for stdin
    pub fn default_output_dir(&self) -> PathBuf {
        match self {
            Self::File(path) => match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            },
            Self::Stdin => PathBuf::from("."),
        }
    }
}

impl Cli {
    pub fn input(&self) -> Input {
        match &self.file {
            Some(path) if !self.stdin => Input::File(path.clone()),
            _ => Input::Stdin,
        }
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config.as_deref()
    }

    /// Apply flags on top of the file configuration
    pub fn apply(&self, config: &mut Config) {
        if let Some(multiplier) = self.worker_multiplier {
            config.pipeline.worker_multiplier = multiplier;
        }
        if let Some(level) = self.log_level {
            config.log.level = level;
        }
        if let Some(dir) = &self.output_dir {
            config.output.dir = Some(dir.clone());
        }
        if self.header {
            config.output.header = true;
        }
        if self.tolerant {
            config.pipeline.error_mode = ErrorMode::Tolerant;
        }
        if let Some(path) = &self.geo_db {
            config.geo.database = Some(path.clone());
        }
        if self.no_compress {
            config.output.compression = Compression::None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("logfold").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_input_required() {
        assert!(Cli::try_parse_from(["logfold"]).is_err());
        assert!(Cli::try_parse_from(["logfold", "-f", "a.log", "-i"]).is_err());
    }

    #[test]
    fn test_file_input() {
        let cli = parse(&["-f", "/logs/sdk.log.gz"]);
        assert_eq!(cli.input(), Input::File(PathBuf::from("/logs/sdk.log.gz")));
        assert_eq!(cli.input().default_output_dir(), PathBuf::from("/logs"));
    }

    #[test]
    fn test_stdin_input() {
        let cli = parse(&["-i"]);
        assert_eq!(cli.input(), Input::Stdin);
        assert_eq!(cli.input().default_output_dir(), PathBuf::from("."));
    }

    #[test]
    fn test_bare_file_name_writes_to_working_dir() {
        let cli = parse(&["-f", "sdk.log"]);
        assert_eq!(cli.input().default_output_dir(), PathBuf::from("."));
    }

    #[test]
    fn test_no_flags_keeps_config() {
        let mut config = Config::default();
        config.output.header = true;
        config.pipeline.worker_multiplier = 3;

        parse(&["-i"]).apply(&mut config);

        assert!(config.output.header);
        assert_eq!(config.pipeline.worker_multiplier, 3);
        assert_eq!(config.pipeline.error_mode, ErrorMode::Strict);
        assert_eq!(config.output.compression, Compression::Gzip);
    }

    #[test]
    fn test_flags_override_config() {
        let mut config = Config::default();
        let cli = parse(&[
            "-f",
            "sdk.log",
            "-t",
            "4",
            "-l",
            "debug",
            "-o",
            "/data/out",
            "--header",
            "--tolerant",
            "--geo-db",
            "/geo/City.mmdb",
            "--no-compress",
        ]);

        cli.apply(&mut config);

        assert_eq!(config.pipeline.worker_multiplier, 4);
        assert_eq!(config.log.level, LogLevel::Debug);
        assert_eq!(config.output.dir, Some(PathBuf::from("/data/out")));
        assert!(config.output.header);
        assert_eq!(config.pipeline.error_mode, ErrorMode::Tolerant);
        assert_eq!(config.geo.database, Some(PathBuf::from("/geo/City.mmdb")));
        assert_eq!(config.output.compression, Compression::None);
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        assert!(Cli::try_parse_from(["logfold", "-i", "-l", "loud"]).is_err());
    }
}
