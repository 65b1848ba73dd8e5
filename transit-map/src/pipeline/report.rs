//! Per-run report.

use tracing::{info, warn};

use crate::dataset::DatasetRow;
use crate::domain::Line;
use crate::stations::SkippedRecord;

/// Counters for one run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    /// Raw records fed to the resolver.
    pub records: usize,
    /// Records that produced a station.
    pub resolved: usize,
    /// Outbound geocoder calls, retries included.
    pub lookups: usize,
    /// Records answered from the cache.
    pub cache_hits: usize,
    /// Input rows dropped before resolution.
    pub malformed_rows: usize,
}

/// Everything a run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Lines in first-seen order.
    pub lines: Vec<Line>,
    /// Flat output rows in resolver encounter order.
    pub rows: Vec<DatasetRow>,
    /// Records left out of the output, with causes.
    pub skipped: Vec<SkippedRecord>,
    pub stats: RunStats,
}

impl RunReport {
    /// Log the run summary, one warning per skipped station.
    pub fn log_summary(&self) {
        for skip in &self.skipped {
            warn!(
                line = %skip.line_id,
                station = %skip.raw_name,
                reason = %skip.reason,
                "station missing from output"
            );
        }

        info!(
            lines = self.lines.len(),
            records = self.stats.records,
            resolved = self.stats.resolved,
            skipped = self.skipped.len(),
            lookups = self.stats.lookups,
            cache_hits = self.stats.cache_hits,
            malformed_rows = self.stats.malformed_rows,
            "run complete"
        );
    }
}
