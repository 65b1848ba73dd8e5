//! Transit line type.

use serde::{Deserialize, Serialize};

use super::Station;

/// A transit line with its stations in encounter order.
///
/// The color is fixed at construction; stations can only be appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    name: String,
    color: String,
    stations: Vec<Station>,
}

impl Line {
    /// Create an empty line.
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
            stations: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    /// Append a station after all previously added ones.
    pub(crate) fn push(&mut self, station: Station) {
        self.stations.push(station);
    }
}
