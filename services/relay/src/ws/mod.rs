//! WebSocket Relay
//!
//! This module contains the logic for pairing each client WebSocket with one
//! upstream Realtime API connection. It is structured into submodules:
//!
//! - `protocol`: Classifies client frames and filters upstream events.
//! - `session`: Owns a client/upstream pair from upgrade to teardown.
//! - `provider`: Opens and configures the upstream connection.

pub mod protocol;
pub mod provider;
pub mod session;

pub use session::ws_handler;
