//! Domain types for the transit map dataset.
//!
//! Coordinates are validated at construction, so a `Station` built from a
//! `GeoCoordinate` never carries a placeholder position.

mod line;
mod station;

pub use line::Line;
pub use station::{GeoCoordinate, InvalidCoordinate, RawStationRecord, Station};
