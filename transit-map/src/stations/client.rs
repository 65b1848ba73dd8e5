//! Geocoding client for a Nominatim-compatible search endpoint.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use tokio::time::Instant;
use tracing::debug;

use crate::domain::GeoCoordinate;

use super::error::GeocodeError;
use super::rate_limit::RateLimiter;

/// Default search endpoint (OpenStreetMap Nominatim).
const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org/search";

/// Nominatim's usage policy allows one request per second.
const DEFAULT_MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Prefixes that mark a name as belonging to the configured city's own
/// transit network, in addition to the city name itself.
const DEFAULT_LOCAL_PREFIXES: [&str; 3] = ["s ", "u ", "s+u "];

/// One entry of the search response.
///
/// Nominatim returns coordinates as decimal strings; everything except
/// `lat` and `lon` is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResultDto {
    pub lat: String,
    pub lon: String,
}

/// Something that can turn a station name into a coordinate.
///
/// The resolver is generic over this so it can be driven by a scripted
/// geocoder in tests.
pub trait Geocoder {
    /// Resolve one station name. Issues at most one outbound request and
    /// never retries.
    fn resolve(&self, name: &str)
    -> impl Future<Output = Result<GeoCoordinate, GeocodeError>> + Send;
}

/// Configuration for the geocoding client.
#[derive(Debug, Clone)]
pub struct GeocodeConfig {
    /// Search endpoint URL
    pub base_url: String,
    /// User-Agent sent with every request
    pub user_agent: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Minimum spacing between outbound requests
    pub min_interval: Duration,
    /// Country appended to every query
    pub country: String,
    /// City appended to queries for local transit names
    pub city: String,
    /// Lowercase name prefixes that mark a local transit name
    pub local_prefixes: Vec<String>,
}

impl GeocodeConfig {
    /// Create a config with production defaults (Berlin, Germany).
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: concat!("transit-map/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: 30,
            min_interval: DEFAULT_MIN_INTERVAL,
            country: "Germany".to_string(),
            city: "Berlin".to_string(),
            local_prefixes: DEFAULT_LOCAL_PREFIXES.map(String::from).to_vec(),
        }
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the User-Agent header.
    pub fn with_user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Set the politeness interval.
    /// Spacing actually enforced between requests.
    ///
    /// The public endpoint never gets less than its one request per second,
    /// whatever `min_interval` says.
    pub fn politeness_interval(&self) -> Duration {
        if self.base_url == DEFAULT_BASE_URL {
            self.min_interval.max(DEFAULT_MIN_INTERVAL)
        } else {
            self.min_interval
        }
    }

    pub fn with_min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = interval;
        self
    }

    /// Set the city and country used to qualify queries.
    pub fn with_region(mut self, city: impl Into<String>, country: impl Into<String>) -> Self {
        self.city = city.into();
        self.country = country.into();
        self
    }

    /// Replace the local transit prefixes. Matching is case-insensitive.
    pub fn with_local_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.local_prefixes = prefixes
            .into_iter()
            .map(|p| p.into().to_lowercase())
            .collect();
        self
    }

    /// Build the query string sent for a station name.
    ///
    /// Names starting with the city name or a local transit prefix get
    /// ", <city>, <country>"; everything else gets ", <country>".
    ///
    /// # Examples
    ///
    /// ```
    /// use transit_map::stations::GeocodeConfig;
    ///
    /// let config = GeocodeConfig::new();
    /// assert_eq!(config.qualify("U Stadtmitte"), "U Stadtmitte, Berlin, Germany");
    /// assert_eq!(config.qualify("Potsdam Hbf"), "Potsdam Hbf, Germany");
    /// ```
    pub fn qualify(&self, name: &str) -> String {
        let lower = name.to_lowercase();
        let local = lower.starts_with(&self.city.to_lowercase())
            || self
                .local_prefixes
                .iter()
                .any(|prefix| lower.starts_with(prefix.as_str()));

        if local {
            format!("{name}, {}, {}", self.city, self.country)
        } else {
            format!("{name}, {}", self.country)
        }
    }
}

impl Default for GeocodeConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// HTTP geocoding client.
///
/// Every call waits on the rate limiter before sending, including the
/// first. Clones share the limiter. With a deadline, a call whose slot
/// would come too late fails with [`GeocodeError::DeadlineExceeded`]
/// instead of sending.
#[derive(Debug, Clone)]
pub struct GeocodeClient {
    http: reqwest::Client,
    config: Arc<GeocodeConfig>,
    limiter: Arc<RateLimiter>,
    deadline: Option<Instant>,
}

impl GeocodeClient {
    /// Create a new client with its own rate limiter.
    pub fn new(config: GeocodeConfig) -> Result<Self, GeocodeError> {
        let limiter = Arc::new(RateLimiter::new(config.politeness_interval()));
        Self::with_rate_limiter(config, limiter)
    }

    /// Create a client that shares an existing rate limiter.
    pub fn with_rate_limiter(
        config: GeocodeConfig,
        limiter: Arc<RateLimiter>,
    ) -> Result<Self, GeocodeError> {
        let mut headers = HeaderMap::new();
        let agent = HeaderValue::from_str(&config.user_agent).map_err(|_| GeocodeError::Config {
            message: format!("invalid User-Agent: {:?}", config.user_agent),
        })?;
        headers.insert(USER_AGENT, agent);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            config: Arc::new(config),
            limiter,
            deadline: None,
        })
    }

    /// Stop sending requests at `deadline`.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResultDto>, GeocodeError> {
        let response = self
            .http
            .get(&self.config.base_url)
            .query(&[("format", "json"), ("q", query)])
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(GeocodeError::RateLimited);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GeocodeError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;

        serde_json::from_str(&body).map_err(|e| GeocodeError::Json {
            message: e.to_string(),
        })
    }
}

impl Geocoder for GeocodeClient {
    async fn resolve(&self, name: &str) -> Result<GeoCoordinate, GeocodeError> {
        let query = self.config.qualify(name);

        if !self.limiter.acquire(self.deadline).await {
            return Err(GeocodeError::DeadlineExceeded);
        }
        debug!(%query, "geocoding");

        let results = self.search(&query).await?;
        let first = results
            .into_iter()
            .next()
            .ok_or(GeocodeError::NotFound { query })?;

        Ok(GeoCoordinate::parse(&first.lat, &first.lon)?)
    }
}
