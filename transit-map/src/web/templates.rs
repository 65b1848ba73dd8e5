//! Askama templates for the map page.

use askama::Template;

use crate::domain::Line;

use super::dto::LineSummary;

/// Map page. The lines are embedded as JSON and drawn by `static/map.js`.
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    /// JSON array of lines, safe to place inside a `<script>` element.
    pub lines_json: String,
    pub legend: Vec<LineSummary>,
    pub station_count: usize,
}

impl IndexTemplate {
    pub fn new(lines: &[Line]) -> Result<Self, serde_json::Error> {
        Ok(Self {
            lines_json: script_safe_json(lines)?,
            legend: lines.iter().map(LineSummary::from_line).collect(),
            station_count: lines.iter().map(|l| l.stations().len()).sum(),
        })
    }
}

/// Serialize for inline `<script>` use.
///
/// `</` is written as `<\/` so a station name can't close the element.
fn script_safe_json(lines: &[Line]) -> Result<String, serde_json::Error> {
    Ok(serde_json::to_string(lines)?.replace("</", "<\\/"))
}
