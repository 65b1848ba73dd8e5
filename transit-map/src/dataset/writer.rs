//! Flat dataset writer.
//!
//! Output format, one row per resolved station in resolver order:
//!
//! ```text
//! line_name,station_name,lat,lng
//! u1,Warschauer Straße,52.5058,13.4497
//! ```

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::Station;

use super::error::DatasetError;

/// Column names of the flat dataset.
pub const HEADER: [&str; 4] = ["line_name", "station_name", "lat", "lng"];

/// One output row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetRow {
    pub line_name: String,
    pub station_name: String,
    pub lat: f64,
    pub lng: f64,
}

impl DatasetRow {
    pub fn new(line_id: &str, station: &Station) -> Self {
        Self {
            line_name: line_id.to_string(),
            station_name: station.name.clone(),
            lat: station.lat,
            lng: station.lng,
        }
    }
}

/// Writes [`DatasetRow`]s as CSV. The header is written even when no rows
/// follow.
pub struct DatasetWriter<W: Write> {
    inner: csv::Writer<W>,
}

impl DatasetWriter<File> {
    /// Create (or truncate) the output file.
    pub fn create(path: &Path) -> Result<Self, DatasetError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        Self::new(File::create(path)?)
    }
}

impl<W: Write> DatasetWriter<W> {
    pub fn new(output: W) -> Result<Self, DatasetError> {
        let mut inner = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(output);
        inner.write_record(HEADER)?;
        Ok(Self { inner })
    }

    pub fn write_row(&mut self, row: &DatasetRow) -> Result<(), DatasetError> {
        self.inner.serialize(row)?;
        Ok(())
    }

    pub fn write_all<'a>(
        &mut self,
        rows: impl IntoIterator<Item = &'a DatasetRow>,
    ) -> Result<(), DatasetError> {
        for row in rows {
            self.write_row(row)?;
        }
        Ok(())
    }

    /// Flush and return the underlying writer.
    pub fn finish(self) -> Result<W, DatasetError> {
        self.inner
            .into_inner()
            .map_err(|e| DatasetError::Io(e.into_error()))
    }
}
