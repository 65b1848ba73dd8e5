//! Dataset I/O: raw station lists in, flat geocoded rows out.

mod error;
mod loader;
mod reader;
mod writer;

pub use error::DatasetError;
pub use loader::{LoadedDataset, load, load_path};
pub use reader::{StationGroup, StationListReader};
pub use writer::{DatasetRow, DatasetWriter, HEADER};
