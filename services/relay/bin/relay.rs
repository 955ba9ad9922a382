//! Main Entrypoint for the Realtime Relay Service
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment.
//! 2. Loading the session instructions.
//! 3. Binding the relay and health check listeners.
//! 4. Serving both until shutdown.

use anyhow::Context;
use realtime_relay::{
    config::Config,
    router::{create_health_router, create_router},
    state::AppState,
    ws::provider::openai::DEFAULT_INSTRUCTIONS,
};
use std::{path::Path, sync::Arc};
use tracing::info;

/// Listens for the `Ctrl+C` signal to gracefully shut down the server.
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    info!("Received shutdown signal. Shutting down gracefully...");
}

/// Reads the instructions file if one is configured, else uses the built-in persona.
fn load_instructions(path: Option<&Path>) -> anyhow::Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Could not read instructions from {}", path.display())),
        None => Ok(DEFAULT_INSTRUCTIONS.to_string()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .init();

    // --- 3. Initialize Shared State ---
    let instructions = load_instructions(config.instructions_path.as_deref())?;
    let app_state = Arc::new(AppState::new(config, instructions));

    // --- 4. Bind Listeners ---
    let config = &app_state.config;
    let relay_listener = tokio::net::TcpListener::bind(config.bind_address)
        .await
        .with_context(|| format!("Failed to bind relay listener on {}", config.bind_address))?;
    info!(bind_address = %config.bind_address, "WebSocket relay running.");

    let health_listener = tokio::net::TcpListener::bind(config.health_address)
        .await
        .with_context(|| {
            format!(
                "Failed to bind health check listener on {}",
                config.health_address
            )
        })?;
    info!(bind_address = %config.health_address, "Health check server running.");

    // --- 5. Start Servers ---
    let relay = axum::serve(relay_listener, create_router(app_state.clone()))
        .with_graceful_shutdown(shutdown_signal());
    let health =
        axum::serve(health_listener, create_health_router()).with_graceful_shutdown(shutdown_signal());

    tokio::try_join!(relay.into_future(), health.into_future())?;

    info!("Server has shut down.");
    Ok(())
}
