//! Manages the upstream WebSocket connection to the real-time voice API.

pub mod openai;

use crate::{error::RelayError, state::AppState};
use std::sync::Arc;
use tokio::{net::TcpStream, task::JoinHandle};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

/// An open, configured connection to the upstream API.
pub type UpstreamSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Starts the upstream handshake in its own task.
///
/// The session keeps reading client frames while the handshake is in flight
/// and picks up the socket from the returned handle once it resolves.
pub fn start_realtime_provider(
    state: Arc<AppState>,
) -> JoinHandle<Result<UpstreamSocket, RelayError>> {
    tokio::spawn(async move { openai::connect(&state).await })
}
