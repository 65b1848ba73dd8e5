//! Dataset I/O error types.

use std::path::PathBuf;

/// Errors reading station lists or writing the flat dataset.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    /// An input group could not be opened or read
    #[error("cannot read {}: {source}", path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV stream failed at the I/O level
    #[error("CSV error in {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Writing the output failed
    #[error("write error: {0}")]
    Write(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
