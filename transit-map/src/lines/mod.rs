//! Line aggregation and color assignment.

mod aggregate;
mod color;

pub use aggregate::{LineAggregator, aggregate};
pub use color::{ColorScheme, ColorSource, HashedColors, PALETTE, PaletteColors};
