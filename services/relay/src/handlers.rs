//! Axum Handlers for the liveness endpoint.

use axum::{http::StatusCode, response::IntoResponse};

/// Reports that the process is up. Carries no session state.
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Answers every request the liveness router does not recognise.
pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not Found")
}
