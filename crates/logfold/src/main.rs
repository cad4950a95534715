//! logfold - SDK request logs to geo-enriched, date-partitioned CSV
//!
//! # Usage
//!
//! ```bash
//! # One gzip file per day next to the input
//! logfold -f /logs/sdk.log
//!
//! # From a pipe, tolerant of damaged lines, with a header row
//! zcat sdk.log.gz | logfold -i -o /data/out --header --tolerant
//!
//! # Resolve cities with a MaxMind database, 2 workers per core
//! logfold -f sdk.log --geo-db GeoLite2-City.mmdb -t 2
//! ```
//!
//! Logs go to stderr; the run summary goes to stdout.

mod cli;
mod run;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::runtime::{Builder, Runtime};
use logfold_config::{Config, LogFormat, LogLevel};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(&cli)?;
    cli.apply(&mut config);
    config.validate().context("invalid configuration")?;

    init_logging(config.log.level, config.log.format)?;
    let workers = config.pipeline.worker_count();
    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config_path().map(|p| p.display().to_string()).unwrap_or_else(|| "(default)".into()),
        workers,
        "logfold starting"
    );

    let runtime = build_runtime(workers).context("failed to start runtime")?;
    match runtime.block_on(run::run(config, cli.input())) {
        Ok(summary) => {
            print!("{}", run::format_summary(&summary));
            Ok(())
        }
        Err(e) => {
            error!(error = %format_args!("{e:#}"), "run failed");
            Err(e)
        }
    }
}

/// Multi-threaded runtime with one thread per transform worker
///
/// Transforms are synchronous CPU work, so the worker multiplier only adds
/// parallelism when the runtime has as many threads as there are workers.
/// The reader and router run on the separate blocking pool.
fn build_runtime(workers: usize) -> std::io::Result<Runtime> {
    Builder::new_multi_thread()
        .worker_threads(workers.max(1))
        .thread_name("logfold-worker")
        .enable_all()
        .build()
}

/// Config file if given (it must exist), defaults otherwise
fn load_config(cli: &Cli) -> Result<Config> {
    match cli.config_path() {
        Some(path) => {
            if !path.exists() {
                return Err(anyhow::anyhow!("config file not found: {}", path.display()));
            }
            Config::from_file(path).context("failed to load configuration")
        }
        None => Ok(Config::default()),
    }
}

/// Initialize the tracing subscriber, writing to stderr
fn init_logging(level: LogLevel, format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_new(level.as_str())
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Console => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(false),
            )
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }

    Ok(())
}
