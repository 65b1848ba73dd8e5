//! Flat dataset loader for the render side.
//!
//! Reads the `line_name,station_name,lat,lng` file produced by
//! [`DatasetWriter`](super::DatasetWriter) and groups it back into lines.

use std::io::Read;
use std::path::Path;

use tracing::{info, warn};

use crate::domain::{GeoCoordinate, Line, Station};
use crate::lines::{ColorScheme, LineAggregator};

use super::error::DatasetError;

/// Lines loaded from a flat dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDataset {
    pub lines: Vec<Line>,
    /// Rows skipped for too few fields or an unusable coordinate.
    pub malformed_rows: usize,
}

/// Load a flat dataset file.
pub fn load_path(path: &Path, scheme: ColorScheme) -> Result<LoadedDataset, DatasetError> {
    let file = std::fs::File::open(path).map_err(|source| DatasetError::SourceUnavailable {
        path: path.to_path_buf(),
        source,
    })?;

    let dataset = load(file, scheme).map_err(|source| DatasetError::Csv {
        path: path.to_path_buf(),
        source,
    })?;

    info!(
        path = %path.display(),
        lines = dataset.lines.len(),
        malformed = dataset.malformed_rows,
        "loaded dataset"
    );
    Ok(dataset)
}

/// Load a flat dataset from any reader.
///
/// The first row is a header and is skipped. Line identifiers are
/// lowercased, so `U1` and `u1` form one line.
pub fn load(input: impl Read, scheme: ColorScheme) -> Result<LoadedDataset, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(input);

    let mut aggregator = LineAggregator::new(scheme);
    let mut malformed_rows = 0;

    for row in reader.records() {
        let row = match row {
            Ok(row) => row,
            Err(e) if e.is_io_error() => return Err(e),
            Err(_) => {
                malformed_rows += 1;
                continue;
            }
        };

        if row.len() < 4 {
            malformed_rows += 1;
            continue;
        }

        let coordinate = match GeoCoordinate::parse(&row[2], &row[3]) {
            Ok(c) => c,
            Err(e) => {
                warn!(line = &row[0], station = &row[1], error = %e, "skipping row");
                malformed_rows += 1;
                continue;
            }
        };

        let line_id = row[0].trim().to_lowercase();
        aggregator.push(&line_id, Station::new(&row[1], coordinate));
    }

    Ok(LoadedDataset {
        lines: aggregator.finish(),
        malformed_rows,
    })
}
