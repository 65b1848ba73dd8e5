//! Grouping of resolved stations into lines.

use std::collections::HashMap;

use crate::domain::{Line, Station};

use super::color::{ColorScheme, ColorSource};

/// Collects `(line identifier, station)` pairs into [`Line`]s.
///
/// Lines come out in the order their identifier was first seen, stations
/// in arrival order. A line's color is drawn from the color source exactly
/// once, when the line is created.
pub struct LineAggregator {
    lines: Vec<Line>,
    index: HashMap<String, usize>,
    colors: Box<dyn ColorSource + Send>,
}

impl LineAggregator {
    /// Create an aggregator using one of the built-in color schemes.
    pub fn new(scheme: ColorScheme) -> Self {
        Self::with_colors(scheme.source())
    }

    /// Create an aggregator with a custom color source.
    pub fn with_colors(colors: Box<dyn ColorSource + Send>) -> Self {
        Self {
            lines: Vec::new(),
            index: HashMap::new(),
            colors,
        }
    }

    /// Append a station to its line, creating the line on first sight.
    pub fn push(&mut self, line_id: &str, station: Station) {
        let idx = match self.index.get(line_id) {
            Some(&idx) => idx,
            None => {
                let color = self.colors.next_color(line_id);
                self.lines.push(Line::new(line_id, color));
                self.index.insert(line_id.to_string(), self.lines.len() - 1);
                self.lines.len() - 1
            }
        };
        self.lines[idx].push(station);
    }

    /// Finish and return the lines.
    pub fn finish(self) -> Vec<Line> {
        self.lines
    }
}

impl Default for LineAggregator {
    fn default() -> Self {
        Self::new(ColorScheme::default())
    }
}

/// Aggregate a whole stream in one call.
pub fn aggregate<I, S>(stations: I, scheme: ColorScheme) -> Vec<Line>
where
    I: IntoIterator<Item = (S, Station)>,
    S: AsRef<str>,
{
    let mut aggregator = LineAggregator::new(scheme);
    for (line_id, station) in stations {
        aggregator.push(line_id.as_ref(), station);
    }
    aggregator.finish()
}
