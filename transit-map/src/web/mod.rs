//! Render server for a geocoded transit dataset.
//!
//! Serves the map page, the lines as JSON, and static assets.

mod dto;
mod routes;
mod state;
pub mod templates;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
pub use templates::*;
