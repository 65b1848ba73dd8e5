//! Raw station list reader.
//!
//! Each `*.csv` file in the input directory is one line's station list.
//! The line identifier is the file stem; the station name is the first
//! column of each row.

use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::domain::RawStationRecord;

use super::error::DatasetError;

/// One line's raw station list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationGroup {
    pub line_id: String,
    pub records: Vec<RawStationRecord>,
    /// Rows skipped because they had no station name.
    pub malformed_rows: usize,
}

/// Reads per-line station list files.
#[derive(Debug, Clone, Copy, Default)]
pub struct StationListReader {
    has_header: bool,
}

impl StationListReader {
    /// Reader for files without a header row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip the first row of every file.
    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    /// Read every `*.csv` file in `dir`, ordered by file name.
    ///
    /// Fails on the first file that cannot be read, so a line is never
    /// silently truncated.
    pub fn read_dir(&self, dir: &Path) -> Result<Vec<StationGroup>, DatasetError> {
        let unavailable = |source| DatasetError::SourceUnavailable {
            path: dir.to_path_buf(),
            source,
        };

        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
            .map_err(unavailable)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<Result<_, _>>()
            .map_err(unavailable)?;

        paths.retain(|p| p.is_file() && is_csv(p));
        paths.sort();

        let groups = paths
            .iter()
            .map(|path| self.read_file(path))
            .collect::<Result<Vec<_>, _>>()?;

        info!(dir = %dir.display(), lines = groups.len(), "read station lists");
        Ok(groups)
    }

    /// Read one station list file.
    pub fn read_file(&self, path: &Path) -> Result<StationGroup, DatasetError> {
        let line_id = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();

        let file = std::fs::File::open(path).map_err(|source| DatasetError::SourceUnavailable {
            path: path.to_path_buf(),
            source,
        })?;

        let group = self
            .read_group(&line_id, file)
            .map_err(|source| DatasetError::Csv {
                path: path.to_path_buf(),
                source,
            })?;

        debug!(
            path = %path.display(),
            line = %group.line_id,
            stations = group.records.len(),
            malformed = group.malformed_rows,
            "read station list"
        );
        Ok(group)
    }

    /// Read one station list from any reader.
    ///
    /// Rows whose first field is missing or blank are counted as malformed
    /// and skipped. Rows that fail to decode (bad UTF-8, for instance) are
    /// skipped the same way; only I/O failures are returned.
    pub fn read_group(&self, line_id: &str, input: impl Read) -> Result<StationGroup, csv::Error> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(self.has_header)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(input);

        let mut records = Vec::new();
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

            match row.get(0) {
                Some(name) if !name.is_empty() => {
                    records.push(RawStationRecord::new(line_id, name));
                }
                _ => malformed_rows += 1,
            }
        }

        Ok(StationGroup {
            line_id: line_id.to_string(),
            records,
            malformed_rows,
        })
    }
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
}
