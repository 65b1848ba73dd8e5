//! Geocode cache keyed by canonical station name.
//!
//! The in-memory [`StationCache`] lives for one run and holds at most one
//! entry per [`CanonicalKey`]. Concurrent misses on the same key are
//! coalesced, so the geocoder is asked once no matter how many resolver
//! invocations race for it. [`CacheFile`] optionally carries successful
//! entries over to the next run.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use moka::future::Cache as MokaCache;
use serde::{Deserialize, Serialize};

use crate::domain::GeoCoordinate;

use super::error::CacheError;
use super::names::CanonicalKey;

/// Default on-disk TTL: 30 days. Stations rarely move.
const DEFAULT_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// A successful geocode for one canonical key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationCacheEntry {
    pub canonical_key: CanonicalKey,
    /// Display name of the first record that produced this entry.
    pub original_name: String,
    pub coordinate: GeoCoordinate,
}

/// What the cache remembers about a canonical key.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedLookup {
    Found(StationCacheEntry),
    /// The lookup failed earlier in this run; the key is not retried.
    Failed { reason: String },
}

/// Run-local station cache.
#[derive(Clone)]
pub struct StationCache {
    entries: MokaCache<CanonicalKey, CachedLookup>,
}

impl StationCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            entries: MokaCache::builder().build(),
        }
    }

    /// Create a cache pre-filled with entries from an earlier run.
    pub async fn with_entries(entries: impl IntoIterator<Item = StationCacheEntry>) -> Self {
        let cache = Self::new();
        for entry in entries {
            cache.insert(entry).await;
        }
        cache
    }

    /// Look up a key without triggering a lookup.
    pub async fn get(&self, key: &CanonicalKey) -> Option<CachedLookup> {
        self.entries.get(key).await
    }

    /// Return the cached outcome for `key`, running `lookup` on a miss.
    ///
    /// If several callers miss on the same key at once, only one `lookup`
    /// runs and the others wait for its result. A lookup that yields `None`
    /// stores nothing; a waiting caller then runs its own lookup.
    pub async fn get_or_lookup(
        &self,
        key: CanonicalKey,
        lookup: impl Future<Output = Option<CachedLookup>>,
    ) -> Option<CachedLookup> {
        self.entries.optionally_get_with(key, lookup).await
    }

    /// Insert a successful entry, replacing whatever the key held.
    pub async fn insert(&self, entry: StationCacheEntry) {
        self.entries
            .insert(entry.canonical_key.clone(), CachedLookup::Found(entry))
            .await;
    }

    /// All successful entries, ordered by key.
    pub fn found_entries(&self) -> Vec<StationCacheEntry> {
        let mut found: Vec<StationCacheEntry> = self
            .entries
            .iter()
            .filter_map(|(_, lookup)| match lookup {
                CachedLookup::Found(entry) => Some(entry),
                CachedLookup::Failed { .. } => None,
            })
            .collect();
        found.sort_by(|a, b| a.canonical_key.cmp(&b.canonical_key));
        found
    }

    /// Number of keys held, found or failed.
    pub async fn len(&self) -> u64 {
        self.entries.run_pending_tasks().await;
        self.entries.entry_count()
    }
}

impl Default for StationCache {
    fn default() -> Self {
        Self::new()
    }
}

/// On-disk snapshot of the cache with metadata.
#[derive(Debug, Serialize, Deserialize)]
struct CachedStations {
    /// Unix timestamp when the file was written.
    cached_at_secs: u64,
    stations: Vec<StationCacheEntry>,
}

/// Configuration for the on-disk cache file.
#[derive(Debug, Clone)]
pub struct CacheFileConfig {
    /// Path to the cache file.
    pub path: PathBuf,
    /// How long the file remains valid.
    pub ttl: Duration,
}

impl CacheFileConfig {
    /// Create a config with the given path and default TTL (30 days).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ttl: DEFAULT_TTL,
        }
    }

    /// Set a custom TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

/// Successful geocodes persisted between runs.
///
/// Only found entries are written; failures are retried on the next run.
#[derive(Debug, Clone)]
pub struct CacheFile {
    config: CacheFileConfig,
}

impl CacheFile {
    pub fn new(config: CacheFileConfig) -> Self {
        Self { config }
    }

    /// Try to load entries from the file.
    ///
    /// Returns `None` if the file doesn't exist, is invalid, or has expired.
    pub fn load(&self) -> Option<Vec<StationCacheEntry>> {
        let contents = std::fs::read_to_string(&self.config.path).ok()?;
        let cached: CachedStations = serde_json::from_str(&contents).ok()?;

        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .ok()?
            .as_secs();

        let age_secs = now.saturating_sub(cached.cached_at_secs);
        if age_secs >= self.config.ttl.as_secs() {
            return None;
        }

        Some(cached.stations)
    }

    /// Write entries to the file.
    ///
    /// Creates parent directories if they don't exist.
    pub fn save(&self, stations: &[StationCacheEntry]) -> Result<(), CacheError> {
        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map_err(|_| CacheError {
                message: "system time before unix epoch".to_string(),
            })?
            .as_secs();

        let cached = CachedStations {
            cached_at_secs: now,
            stations: stations.to_vec(),
        };

        if let Some(parent) = self.config.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| CacheError {
                message: format!("failed to create cache directory: {}", e),
            })?;
        }

        let json = serde_json::to_string_pretty(&cached).map_err(|e| CacheError {
            message: format!("failed to serialize cache: {}", e),
        })?;

        std::fs::write(&self.config.path, json).map_err(|e| CacheError {
            message: format!("failed to write cache file: {}", e),
        })?;

        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }
}
