//! One pipeline run: provider, cache, transformer, sinks, then the summary

use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::{Context, Result};
use logfold_config::Config;
use logfold_enrich::{CacheSnapshot, EnrichmentCache, GeoProvider, MaxMindProvider, NullGeoProvider};
use logfold_pipeline::{LineSource, Pipeline, PipelineSettings, PipelineSummary, sink_factory};
use logfold_transform::{RecordTransformer, Schema, TransformerConfig};
use tracing::{info, warn};

use crate::cli::Input;

/// Build every component from `config` and process `input`
pub async fn run(config: Config, input: Input) -> Result<PipelineSummary> {
    let provider = open_provider(&config)?;
    run_with_provider(config, input, provider).await
}

/// Process `input` resolving addresses through `provider`
///
/// A provider that resolves nothing fills the cache with `nil` labels, so
/// the snapshot is only saved when a real database was consulted.
async fn run_with_provider(
    config: Config,
    input: Input,
    provider: Arc<dyn GeoProvider>,
) -> Result<PipelineSummary> {
    let resolves = provider.name() != NullGeoProvider.name();
    let snapshot = config.cache.snapshot_path.as_ref().map(CacheSnapshot::new);
    let cache = match &snapshot {
        Some(snapshot) => snapshot.load_cache().with_context(|| {
            format!("failed to load cache snapshot {}", snapshot.path().display())
        })?,
        None => EnrichmentCache::new(),
    };
    let cache = Arc::new(cache);

    let schema = Arc::new(Schema::standard());
    let transformer = Arc::new(RecordTransformer::new(
        TransformerConfig::from(&config),
        Arc::clone(&schema),
        Arc::clone(&cache),
        provider,
    ));

    let output_dir = config
        .output
        .dir
        .clone()
        .unwrap_or_else(|| input.default_output_dir());
    let sinks = sink_factory(&config.output, output_dir, &schema);

    let source = match &input {
        Input::File(path) => LineSource::open(path)?,
        Input::Stdin => LineSource::stdin()?,
    };

    let summary = Pipeline::new(PipelineSettings::from(&config), transformer, sinks)
        .run(source)
        .await
        .context("pipeline failed")?;

    match snapshot {
        Some(snapshot) if !resolves => {
            warn!(path = %snapshot.path().display(), "no geolocation database, cache snapshot not saved");
        }
        Some(snapshot) => {
            let entries = snapshot.save(&cache).with_context(|| {
                format!("failed to save cache snapshot {}", snapshot.path().display())
            })?;
            info!(entries, path = %snapshot.path().display(), "saved cache snapshot");
        }
        None => {}
    }

    Ok(summary)
}

fn open_provider(config: &Config) -> Result<Arc<dyn GeoProvider>> {
    match &config.geo.database {
        Some(path) => {
            let provider = MaxMindProvider::open(path).context("failed to open geolocation database")?;
            Ok(Arc::new(provider))
        }
        None => {
            warn!("no geolocation database configured, every address resolves to nil");
            Ok(Arc::new(NullGeoProvider))
        }
    }
}

/// Human-readable run summary for stdout
pub fn format_summary(summary: &PipelineSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "lines read:       {}", summary.lines_read);
    let _ = writeln!(out, "records written:  {}", summary.records_written);
    let _ = writeln!(out, "records rejected: {}", summary.records_rejected);
    let _ = writeln!(out, "partitions:       {}", summary.partitions.len());
    for partition in &summary.partitions {
        let _ = writeln!(
            out,
            "  {} ({} records)",
            partition.path.display(),
            partition.records
        );
    }
    let _ = writeln!(
        out,
        "cache entries:    {} (hit rate {:.1}%)",
        summary.cache_entries,
        summary.cache_hit_rate * 100.0
    );
    let _ = writeln!(out, "elapsed:          {:.3}s", summary.elapsed.as_secs_f64());
    out
}
