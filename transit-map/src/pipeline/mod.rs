//! Batch geocoding run.
//!
//! Reads every input group up front, then makes one pass over the records
//! in source order: resolve through the cache and geocoder, aggregate into
//! lines, collect output rows and skips. Per-record failures end up in the
//! [`RunReport`]; only unreadable input or unwritable output aborts a run.

mod config;
mod report;

#[cfg(test)]
mod pipeline_tests;

pub use config::PipelineConfig;
pub use report::{RunReport, RunStats};

use std::path::Path;

use futures::stream::{self, StreamExt};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::dataset::{DatasetError, DatasetRow, DatasetWriter, StationGroup, StationListReader};
use crate::lines::LineAggregator;
use crate::stations::{
    CacheFile, GeocodeClient, GeocodeError, Geocoder, Resolution, StationCache, StationResolver,
};

/// Errors that abort a run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Input could not be read or output could not be written
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    /// Geocoding client could not be built
    #[error(transparent)]
    Geocode(#[from] GeocodeError),
}

/// Build a resolver with the retry and deadline settings of `config`.
///
/// The deadline clock starts now.
pub fn build_resolver<G: Geocoder>(
    geocoder: G,
    cache: StationCache,
    config: &PipelineConfig,
) -> StationResolver<G> {
    let resolver = StationResolver::new(geocoder, cache).with_max_retries(config.max_retries);
    match config.deadline {
        Some(budget) => resolver.with_deadline(Instant::now() + budget),
        None => resolver,
    }
}

/// Resolve every record of every group and aggregate the result.
///
/// Groups are processed in order, records within a group in order. With
/// `concurrency > 1` several records are in flight at once, but results
/// are consumed in input order.
pub async fn run<G: Geocoder>(
    groups: &[StationGroup],
    resolver: &StationResolver<G>,
    config: &PipelineConfig,
) -> RunReport {
    let before = resolver.stats();
    let mut aggregator = LineAggregator::new(config.color_scheme);
    let mut rows = Vec::new();
    let mut skipped = Vec::new();

    for group in groups {
        info!(
            line = %group.line_id,
            stations = group.records.len(),
            "resolving line"
        );

        let resolutions: Vec<Resolution> = stream::iter(&group.records)
            .map(|record| resolver.resolve(record))
            .buffered(config.concurrency.max(1))
            .collect()
            .await;

        for (record, resolution) in group.records.iter().zip(resolutions) {
            match resolution {
                Resolution::Resolved(station) => {
                    rows.push(DatasetRow::new(&record.line_id, &station));
                    aggregator.push(&record.line_id, station);
                }
                Resolution::Skipped(skip) => skipped.push(skip),
            }
        }
    }

    let after = resolver.stats();
    let stats = RunStats {
        records: groups.iter().map(|g| g.records.len()).sum(),
        resolved: rows.len(),
        lookups: after.lookups - before.lookups,
        cache_hits: after.cache_hits - before.cache_hits,
        malformed_rows: groups.iter().map(|g| g.malformed_rows).sum(),
    };

    RunReport {
        lines: aggregator.finish(),
        rows,
        skipped,
        stats,
    }
}

/// Geocode a directory of station lists into a flat dataset file using the
/// HTTP geocoding client.
pub async fn geocode_dir(
    input_dir: &Path,
    output: &Path,
    config: &PipelineConfig,
) -> Result<RunReport, PipelineError> {
    let mut client = GeocodeClient::new(config.geocode.clone())?;
    if let Some(budget) = config.deadline {
        client = client.with_deadline(Instant::now() + budget);
    }
    geocode_dir_with(client, input_dir, output, config).await
}

/// Geocode a directory of station lists with any geocoder.
///
/// Loads the cache file first if one is configured, and saves the
/// successful entries back after the output is written. A cache file that
/// cannot be saved is logged, not fatal.
pub async fn geocode_dir_with<G: Geocoder>(
    geocoder: G,
    input_dir: &Path,
    output: &Path,
    config: &PipelineConfig,
) -> Result<RunReport, PipelineError> {
    let groups = StationListReader::new()
        .with_header(config.has_header)
        .read_dir(input_dir)?;

    let cache_file = config.cache_file.clone().map(CacheFile::new);
    let cache = match cache_file.as_ref().and_then(CacheFile::load) {
        Some(entries) => {
            info!(entries = entries.len(), "loaded geocode cache");
            StationCache::with_entries(entries).await
        }
        None => StationCache::new(),
    };

    let resolver = build_resolver(geocoder, cache, config);
    let report = run(&groups, &resolver, config).await;
    debug!(keys = resolver.cache().len().await, "geocode cache size after run");

    let mut writer = DatasetWriter::create(output)?;
    writer.write_all(&report.rows)?;
    writer.finish()?;
    info!(path = %output.display(), rows = report.rows.len(), "wrote dataset");

    if let Some(file) = cache_file {
        let entries = resolver.cache().found_entries();
        match file.save(&entries) {
            Ok(()) => info!(path = %file.path().display(), entries = entries.len(), "saved geocode cache"),
            Err(e) => warn!(path = %file.path().display(), error = %e, "failed to save geocode cache"),
        }
    }

    Ok(report)
}
