//! Data transfer objects for the JSON API.

use serde::Serialize;

use crate::domain::Line;

/// Compact description of one line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineSummary {
    pub name: String,
    pub color: String,
    pub station_count: usize,
}

impl LineSummary {
    pub fn from_line(line: &Line) -> Self {
        Self {
            name: line.name().to_string(),
            color: line.color().to_string(),
            station_count: line.stations().len(),
        }
    }
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}
