//! Geocoding error types.

use crate::domain::InvalidCoordinate;

/// Errors that can occur when resolving a station name to a coordinate.
///
/// Every variant is a per-record failure: the resolver logs it and skips
/// the record, the run continues.
#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    /// The geocoder answered with an empty result list
    #[error("no result for {query:?}")]
    NotFound { query: String },

    /// HTTP request failed (connect, timeout, body read)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Geocoder refused the request rate
    #[error("rate limited by geocoder")]
    RateLimited,

    /// Geocoder returned an error status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response JSON
    #[error("JSON parse error: {message}")]
    Json { message: String },

    /// First result had an unusable coordinate
    #[error(transparent)]
    InvalidCoordinate(#[from] InvalidCoordinate),

    /// The run deadline passed while waiting for a request slot
    #[error("run deadline passed before the request was sent")]
    DeadlineExceeded,

    /// Client could not be built from its configuration
    #[error("invalid geocoder configuration: {message}")]
    Config { message: String },
}

impl GeocodeError {
    /// Whether another attempt could plausibly succeed.
    ///
    /// An empty answer or a bad coordinate will come back the same way, so
    /// only transport and server-side failures are worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            GeocodeError::Http(_) | GeocodeError::RateLimited => true,
            GeocodeError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Errors from the on-disk geocode cache.
#[derive(Debug, thiserror::Error)]
#[error("cache error: {message}")]
pub struct CacheError {
    pub message: String,
}
