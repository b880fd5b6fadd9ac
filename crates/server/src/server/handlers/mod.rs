//! Axum request handlers, one module per service.

pub mod accounts;
pub mod auth;
pub mod cards;
pub mod files;
pub mod notes;
pub mod sync;

use axum::{http::StatusCode, response::IntoResponse, Json};
use common::protocol::{ErrorResponse, HealthResponse};

/// `GET /health`: liveness check.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
    })
}

/// Catch-all 404 handler.
pub async fn not_found() -> impl IntoResponse {
    let err = ErrorResponse::new("not_found", "the requested resource does not exist");
    (StatusCode::NOT_FOUND, Json(err))
}
