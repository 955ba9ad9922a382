//! Errors raised while relaying frames for a single session.
//!
//! None of these are fatal to the process: the session that produced one logs
//! it and carries on (or winds down), while every other session is untouched.

use tokio_tungstenite::tungstenite::{self, http::header::InvalidHeaderValue};

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The upstream handshake was rejected or a socket failed mid-stream.
    #[error("Upstream connection error: {0}")]
    Connection(#[from] tungstenite::Error),
    /// The API key cannot be carried in an HTTP header.
    #[error("Invalid upstream request header: {0}")]
    InvalidHeader(#[from] InvalidHeaderValue),
    /// A frame that looked like JSON was not a valid control message.
    #[error("Malformed control message: {0}")]
    Parse(#[from] serde_json::Error),
    /// A frame was addressed to the upstream before it was open, or after it closed.
    #[error("Upstream connection is not open")]
    NotOpen,
    /// The handshake task was aborted or panicked before reporting back.
    #[error("Upstream bootstrap task failed: {0}")]
    Bootstrap(#[from] tokio::task::JoinError),
}
