//! Health HTTP Route

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;

use super::author_routes::AuthorsState;
use super::problem::ProblemDetails;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub durable: bool,
    pub authors: usize,
    pub books: usize,
}

pub fn health_routes(state: Arc<AuthorsState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .with_state(state)
}

async fn health_handler(
    State(state): State<Arc<AuthorsState>>,
) -> Result<(StatusCode, Json<HealthResponse>), ProblemDetails> {
    let store = state.service.store();
    let stats = store
        .stats()
        .map_err(|e| ProblemDetails::internal(e.to_string()))?;

    Ok((
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            durable: store.is_durable(),
            authors: stats.authors,
            books: stats.books,
        }),
    ))
}
