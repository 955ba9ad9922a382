//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds the read-only
//! resources every relay session needs.

use crate::config::Config;
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Behavioral instructions sent to the upstream in every session configuration.
    pub instructions: Arc<String>,
}

impl AppState {
    pub fn new(config: Config, instructions: String) -> Self {
        Self {
            config: Arc::new(config),
            instructions: Arc::new(instructions),
        }
    }
}
