//! Station and coordinate types.

use serde::{Deserialize, Serialize};

/// Error returned when a latitude/longitude pair cannot be a real position.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid coordinate ({latitude}, {longitude}): {reason}")]
pub struct InvalidCoordinate {
    pub latitude: f64,
    pub longitude: f64,
    reason: &'static str,
}

/// A WGS84 position in decimal degrees.
///
/// Every `GeoCoordinate` is finite, in range, and not the (0, 0) origin.
/// The origin is what a failed lookup or a failed parse would collapse to,
/// so it is never accepted as a resolved station position.
///
/// # Examples
///
/// ```
/// use transit_map::domain::GeoCoordinate;
///
/// let alex = GeoCoordinate::new(52.5219, 13.4132).unwrap();
/// assert_eq!(alex.latitude(), 52.5219);
///
/// assert!(GeoCoordinate::new(0.0, 0.0).is_err());
/// assert!(GeoCoordinate::new(91.0, 13.0).is_err());
/// assert!(GeoCoordinate::new(f64::NAN, 13.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CoordinateFields")]
pub struct GeoCoordinate {
    latitude: f64,
    longitude: f64,
}

/// Unvalidated wire form, so deserialized coordinates pass through `new`.
#[derive(Deserialize)]
struct CoordinateFields {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<CoordinateFields> for GeoCoordinate {
    type Error = InvalidCoordinate;

    fn try_from(fields: CoordinateFields) -> Result<Self, Self::Error> {
        GeoCoordinate::new(fields.latitude, fields.longitude)
    }
}

impl GeoCoordinate {
    /// Create a coordinate, validating range and rejecting placeholders.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, InvalidCoordinate> {
        let reject = |reason| InvalidCoordinate {
            latitude,
            longitude,
            reason,
        };

        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(reject("must be finite"));
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(reject("latitude out of range"));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(reject("longitude out of range"));
        }
        if latitude == 0.0 && longitude == 0.0 {
            return Err(reject("placeholder origin"));
        }

        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Parse a coordinate from the decimal strings a geocoder returns.
    pub fn parse(latitude: &str, longitude: &str) -> Result<Self, InvalidCoordinate> {
        let lat = latitude.trim().parse::<f64>().unwrap_or(f64::NAN);
        let lon = longitude.trim().parse::<f64>().unwrap_or(f64::NAN);
        Self::new(lat, lon)
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// One row of a raw per-line station list, in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawStationRecord {
    /// Line the row was read for (the source file stem).
    pub line_id: String,
    /// Station name exactly as written in the source, minus surrounding
    /// whitespace.
    pub raw_name: String,
}

impl RawStationRecord {
    pub fn new(line_id: impl Into<String>, raw_name: impl Into<String>) -> Self {
        Self {
            line_id: line_id.into(),
            raw_name: raw_name.into(),
        }
    }
}

/// A resolved station as handed to the renderer.
///
/// `name` keeps the original display form, not the canonical key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

impl Station {
    pub fn new(name: impl Into<String>, coordinate: GeoCoordinate) -> Self {
        Self {
            name: name.into(),
            lat: coordinate.latitude(),
            lng: coordinate.longitude(),
        }
    }
}
