//! Station resolution: canonical key, cache, then geocoder.
//!
//! Per-record failures never escape this module. A record either resolves
//! to a [`Station`] or comes back as a [`SkippedRecord`] carrying the cause.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::domain::{RawStationRecord, Station};

use super::cache::{CachedLookup, StationCache, StationCacheEntry};
use super::client::Geocoder;
use super::error::GeocodeError;
use super::names::CanonicalKey;

/// Why a record was left out of the output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    /// The geocoder failed for this record's canonical key.
    LookupFailed(String),
    /// An earlier record with the same canonical key already failed.
    PreviouslyFailed(String),
    /// The run deadline passed before this key could be looked up.
    DeadlineExceeded,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::LookupFailed(reason) => write!(f, "lookup failed: {reason}"),
            SkipReason::PreviouslyFailed(reason) => {
                write!(f, "lookup failed earlier in run: {reason}")
            }
            SkipReason::DeadlineExceeded => f.write_str("run deadline exceeded"),
        }
    }
}

/// A record dropped from the output, with its cause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRecord {
    pub line_id: String,
    pub raw_name: String,
    pub reason: SkipReason,
}

/// Outcome of resolving one record.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved(Station),
    Skipped(SkippedRecord),
}

/// Counters over the resolver's lifetime.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ResolverStats {
    /// Outbound geocoder calls, retries included.
    pub lookups: usize,
    /// Records answered from the cache.
    pub cache_hits: usize,
}

/// Resolves raw station records through the cache and the geocoder.
///
/// `resolve` takes `&self`, so several invocations may run concurrently;
/// the cache coalesces misses on the same key and the geocoder carries the
/// shared rate limit.
pub struct StationResolver<G> {
    geocoder: G,
    cache: StationCache,
    max_retries: u32,
    deadline: Option<Instant>,
    lookups: AtomicUsize,
    cache_hits: AtomicUsize,
}

impl<G: Geocoder> StationResolver<G> {
    /// Create a resolver with no retries and no deadline.
    pub fn new(geocoder: G, cache: StationCache) -> Self {
        Self {
            geocoder,
            cache,
            max_retries: 0,
            deadline: None,
            lookups: AtomicUsize::new(0),
            cache_hits: AtomicUsize::new(0),
        }
    }

    /// Retry transient geocoder failures up to `retries` extra times.
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Stop issuing new lookups once `deadline` has passed.
    ///
    /// Cached keys still resolve after the deadline; an in-flight request
    /// is never interrupted.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn geocoder(&self) -> &G {
        &self.geocoder
    }

    pub fn cache(&self) -> &StationCache {
        &self.cache
    }

    pub fn stats(&self) -> ResolverStats {
        ResolverStats {
            lookups: self.lookups.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
        }
    }

    /// Resolve one record.
    pub async fn resolve(&self, record: &RawStationRecord) -> Resolution {
        let key = CanonicalKey::from_raw(&record.raw_name);

        let (outcome, fresh) = match self.cache.get(&key).await {
            Some(hit) => (hit, false),
            None => {
                if self.deadline_passed() {
                    return self.skip(record, SkipReason::DeadlineExceeded);
                }

                let fresh = AtomicBool::new(false);
                let outcome = self
                    .cache
                    .get_or_lookup(key.clone(), async {
                        fresh.store(true, Ordering::Relaxed);
                        self.lookup(&key, &record.raw_name).await
                    })
                    .await;
                match outcome {
                    Some(outcome) => (outcome, fresh.into_inner()),
                    None => return self.skip(record, SkipReason::DeadlineExceeded),
                }
            }
        };

        if !fresh {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
            debug!(station = %record.raw_name, %key, "cache hit");
        }

        match outcome {
            CachedLookup::Found(entry) => {
                Resolution::Resolved(Station::new(&record.raw_name, entry.coordinate))
            }
            CachedLookup::Failed { reason } if fresh => {
                self.skip(record, SkipReason::LookupFailed(reason))
            }
            CachedLookup::Failed { reason } => {
                self.skip(record, SkipReason::PreviouslyFailed(reason))
            }
        }
    }

    /// Call the geocoder for a cache miss, retrying transient failures.
    ///
    /// `None` means the run deadline passed before a request went out. Nothing
    /// is cached for the key then.
    async fn lookup(&self, key: &CanonicalKey, raw_name: &str) -> Option<CachedLookup> {
        let mut attempt = 0;
        loop {
            // The caller may have waited on the cache or a coalesced lookup.
            if self.deadline_passed() {
                return None;
            }

            self.lookups.fetch_add(1, Ordering::Relaxed);
            debug!(station = %raw_name, attempt, "geocode lookup");

            match self.geocoder.resolve(raw_name).await {
                Ok(coordinate) => {
                    return Some(CachedLookup::Found(StationCacheEntry {
                        canonical_key: key.clone(),
                        original_name: raw_name.to_string(),
                        coordinate,
                    }));
                }
                Err(GeocodeError::DeadlineExceeded) => return None,
                Err(e) if self.should_retry(&e, attempt) => {
                    attempt += 1;
                    warn!(station = %raw_name, error = %e, attempt, "transient geocode failure, retrying");
                }
                Err(e) => {
                    return Some(CachedLookup::Failed {
                        reason: e.to_string(),
                    });
                }
            }
        }
    }

    fn should_retry(&self, error: &GeocodeError, attempt: u32) -> bool {
        error.is_transient() && attempt < self.max_retries && !self.deadline_passed()
    }

    fn deadline_passed(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    fn skip(&self, record: &RawStationRecord, reason: SkipReason) -> Resolution {
        warn!(line = %record.line_id, station = %record.raw_name, %reason, "skipping station");
        Resolution::Skipped(SkippedRecord {
            line_id: record.line_id.clone(),
            raw_name: record.raw_name.clone(),
            reason,
        })
    }
}
