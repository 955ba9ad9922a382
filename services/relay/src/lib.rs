//! Realtime Relay Library Crate
//!
//! This library contains the relay between browser clients and the OpenAI
//! Realtime API: configuration, shared state, the liveness endpoint, routing
//! and the per-connection WebSocket session logic. The `relay` binary is a
//! thin wrapper around this library.

pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;
pub mod ws;
