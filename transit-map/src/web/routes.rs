//! HTTP route handlers.

use askama::Template;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use tower_http::services::ServeDir;
use tracing::{debug, error};

use crate::domain::Line;

use super::dto::*;
use super::state::AppState;
use super::templates::*;

/// Create the application router.
///
/// `static_dir` is the path to the static assets directory.
pub fn create_router(state: AppState, static_dir: &str) -> Router {
    Router::new()
        .route("/", get(index_page))
        .route("/health", get(health))
        .route("/api/lines", get(list_lines))
        .route("/api/lines/summary", get(line_summaries))
        .route("/api/lines/:name", get(get_line))
        .nest_service("/static", ServeDir::new(static_dir))
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Map page with every line.
async fn index_page(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let template = IndexTemplate::new(&state.lines).map_err(|e| AppError::Internal {
        message: format!("Failed to encode lines: {}", e),
    })?;

    let html = template.render().map_err(|e| AppError::Internal {
        message: format!("Template error: {}", e),
    })?;

    Ok(Html(html))
}

/// All lines with their stations.
async fn list_lines(State(state): State<AppState>) -> Json<Vec<Line>> {
    Json(state.lines.as_ref().clone())
}

/// Name, color and station count per line.
async fn line_summaries(State(state): State<AppState>) -> Json<Vec<LineSummary>> {
    Json(state.lines.iter().map(LineSummary::from_line).collect())
}

/// One line by identifier.
async fn get_line(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Line>, AppError> {
    state
        .find_line(&name)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound {
            message: format!("Unknown line: {}", name),
        })
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    NotFound { message: String },
    Internal { message: String },
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        if status.is_server_error() {
            error!(%status, %message, "request failed");
        } else {
            debug!(%status, %message, "request rejected");
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
