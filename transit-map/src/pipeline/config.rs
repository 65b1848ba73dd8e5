//! Batch run configuration.

use std::time::Duration;

use crate::lines::ColorScheme;
use crate::stations::{CacheFileConfig, GeocodeConfig};

/// Configuration for one geocoding run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Geocoding client settings, including the politeness interval.
    pub geocode: GeocodeConfig,

    /// Extra attempts for transient geocoder failures.
    /// Empty results are never retried.
    pub max_retries: u32,

    /// Resolver invocations in flight at once. All of them share one cache
    /// and one rate limiter, so this only overlaps cache hits with the
    /// politeness wait; output order is unaffected.
    pub concurrency: usize,

    /// Overall budget for the run. Checked between lookups.
    pub deadline: Option<Duration>,

    /// How lines are colored.
    pub color_scheme: ColorScheme,

    /// Persist successful geocodes between runs.
    pub cache_file: Option<CacheFileConfig>,

    /// Input station lists start with a header row.
    pub has_header: bool,
}

impl PipelineConfig {
    /// Create a config with the given geocoder settings and defaults for
    /// everything else.
    pub fn new(geocode: GeocodeConfig) -> Self {
        Self {
            geocode,
            ..Self::default()
        }
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_color_scheme(mut self, scheme: ColorScheme) -> Self {
        self.color_scheme = scheme;
        self
    }

    pub fn with_cache_file(mut self, cache_file: CacheFileConfig) -> Self {
        self.cache_file = Some(cache_file);
        self
    }

    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            geocode: GeocodeConfig::default(),
            max_retries: 0,
            concurrency: 1,
            deadline: None,
            color_scheme: ColorScheme::Palette,
            cache_file: None,
            has_header: false,
        }
    }
}
