//! Axum Router Configuration
//!
//! The relay serves two routers on two ports: the client-facing WebSocket
//! endpoint and a stateless liveness probe.

use crate::{handlers, state::AppState, ws::ws_handler};

use axum::{Router, routing::get};
use std::sync::Arc;

/// Creates the client-facing router. Upgrades are accepted on any path.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    Router::new().fallback(ws_handler).with_state(app_state)
}

/// Creates the liveness router served on the secondary port.
pub fn create_health_router() -> Router {
    Router::new()
        .route(
            "/health",
            get(handlers::health).fallback(handlers::not_found),
        )
        .fallback(handlers::not_found)
}
