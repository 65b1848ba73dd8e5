//! Station geocoding.
//!
//! Turns free-text station names into coordinates: names are reduced to a
//! [`CanonicalKey`], looked up in a run-local [`StationCache`], and only on
//! a miss sent to the rate-limited [`GeocodeClient`].

mod cache;
mod client;
mod error;
#[cfg(test)]
pub(crate) mod mock;
mod names;
mod rate_limit;
mod resolver;

pub use cache::{CacheFile, CacheFileConfig, CachedLookup, StationCache, StationCacheEntry};
pub use client::{GeocodeClient, GeocodeConfig, Geocoder, SearchResultDto};
pub use error::{CacheError, GeocodeError};
pub use names::{CanonicalKey, normalize};
pub use rate_limit::RateLimiter;
pub use resolver::{Resolution, ResolverStats, SkipReason, SkippedRecord, StationResolver};
