//! Application state for the web layer.

use std::sync::Arc;

use crate::domain::Line;

/// Shared application state.
///
/// The dataset is loaded once at startup and never changes.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Lines in dataset order
    pub lines: Arc<Vec<Line>>,
}

impl AppState {
    pub fn new(lines: Vec<Line>) -> Self {
        Self {
            lines: Arc::new(lines),
        }
    }

    /// Look up a line by identifier, ignoring case.
    pub fn find_line(&self, name: &str) -> Option<&Line> {
        let name = name.to_lowercase();
        self.lines.iter().find(|line| line.name() == name)
    }

    /// Total stations across all lines.
    pub fn station_count(&self) -> usize {
        self.lines.iter().map(|line| line.stations().len()).sum()
    }
}
