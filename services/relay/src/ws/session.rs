//! Manages one client WebSocket connection and the upstream connection paired with it.

use super::{
    protocol::{ClientFrame, ControlMessage, ServerMessage, UpstreamEvent},
    provider::{self, UpstreamSocket},
};
use crate::{error::RelayError, state::AppState};
use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::{self, protocol::Message as WsMessage};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Axum handler to upgrade an HTTP connection to a WebSocket.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Runs the session pair for one accepted client until the client leaves.
#[instrument(name = "relay_session", skip_all, fields(session_id = %Uuid::new_v4()))]
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    info!("Client connected.");
    SessionPair::new(socket, state).run().await;
    info!("Client disconnected. Session closed.");
}

/// The upstream half of a session pair.
///
/// Moves forward only: `Idle -> Bootstrapping -> Active -> Closed`, with any
/// state allowed to jump to `Closed`. Once `Closed` it is never reopened.
enum Upstream {
    /// No "start" received yet.
    Idle,
    /// Handshake and session configuration in flight.
    Bootstrapping(JoinHandle<Result<UpstreamSocket, RelayError>>),
    Active(UpstreamSocket),
    /// The link failed or ended; nothing more is forwarded in either direction.
    Closed,
}

/// Something the upstream half produced while the pair was waiting.
enum UpstreamSignal {
    Opened(Result<UpstreamSocket, RelayError>),
    Frame(Option<Result<WsMessage, tungstenite::Error>>),
}

enum PairEvent {
    Client(Option<Result<Message, axum::Error>>),
    Upstream(UpstreamSignal),
}

impl Upstream {
    /// Waits for the next upstream signal. Pends forever when there is no link
    /// to wait on, so it can sit in a `select!` next to the client.
    async fn next_signal(&mut self) -> UpstreamSignal {
        match self {
            Upstream::Bootstrapping(handle) => UpstreamSignal::Opened(match handle.await {
                Ok(result) => result,
                Err(e) => Err(e.into()),
            }),
            Upstream::Active(socket) => UpstreamSignal::Frame(socket.next().await),
            Upstream::Idle | Upstream::Closed => std::future::pending().await,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Upstream::Idle => "idle",
            Upstream::Bootstrapping(_) => "bootstrapping",
            Upstream::Active(_) => "active",
            Upstream::Closed => "closed",
        }
    }
}

/// Exclusively owns one client connection and at most one upstream connection.
///
/// All state is touched from the single task running [`SessionPair::run`].
struct SessionPair {
    client: WebSocket,
    upstream: Upstream,
    state: Arc<AppState>,
}

impl SessionPair {
    fn new(client: WebSocket, state: Arc<AppState>) -> Self {
        Self {
            client,
            upstream: Upstream::Idle,
            state,
        }
    }

    async fn run(mut self) {
        loop {
            let event = tokio::select! {
                frame = self.client.recv() => PairEvent::Client(frame),
                signal = self.upstream.next_signal() => PairEvent::Upstream(signal),
            };

            match event {
                PairEvent::Client(frame) => {
                    if !self.on_client_frame(frame).await {
                        break;
                    }
                }
                PairEvent::Upstream(signal) => self.on_upstream_signal(signal).await,
            }
        }

        if matches!(self.upstream, Upstream::Active(_)) {
            info!("Closing OpenAI connection.");
        }
        self.close_upstream().await;
    }

    /// Handles one client frame. Returns `false` once the client has gone away.
    async fn on_client_frame(&mut self, frame: Option<Result<Message, axum::Error>>) -> bool {
        let data = match frame {
            Some(Ok(Message::Text(text))) => Bytes::from(text),
            Some(Ok(Message::Binary(data))) => data,
            Some(Ok(Message::Ping(_) | Message::Pong(_))) => return true,
            Some(Ok(Message::Close(_))) | None => {
                info!("Client closed the connection.");
                return false;
            }
            Some(Err(e)) => {
                error!(error = %e, "Client WebSocket error.");
                return false;
            }
        };

        match ClientFrame::classify(data) {
            ClientFrame::Control(message) if message.is_start() => self.start(),
            ClientFrame::Control(message) => self.forward_control(message).await,
            ClientFrame::Audio(data) => {
                if let Err(e) = self.send_upstream(WsMessage::Binary(data)).await {
                    debug!(error = %e, "Dropping client audio frame.");
                }
            }
            ClientFrame::Malformed(e) => {
                error!(error = %RelayError::from(e), "Error handling client message.");
            }
        }
        true
    }

    /// Kicks off the upstream handshake on the first "start" and only then.
    fn start(&mut self) {
        if !matches!(self.upstream, Upstream::Idle) {
            warn!(upstream = self.upstream.name(), "Ignoring repeated start signal.");
            return;
        }
        info!("Start received. Connecting to OpenAI Realtime API...");
        self.upstream =
            Upstream::Bootstrapping(provider::start_realtime_provider(self.state.clone()));
    }

    async fn forward_control(&mut self, message: ControlMessage) {
        if !matches!(self.upstream, Upstream::Active(_)) {
            debug!(
                kind = %message.kind,
                error = %RelayError::NotOpen,
                "Dropping client control message."
            );
            return;
        }
        let result = match serde_json::to_string(&message) {
            Ok(json) => self.send_upstream(WsMessage::Text(json.into())).await,
            Err(e) => Err(e.into()),
        };
        if let Err(e) = result {
            debug!(kind = %message.kind, error = %e, "Dropping client control message.");
        }
    }

    async fn on_upstream_signal(&mut self, signal: UpstreamSignal) {
        match signal {
            UpstreamSignal::Opened(Ok(socket)) => {
                info!("Upstream session configured. Relaying.");
                self.upstream = Upstream::Active(socket);
            }
            UpstreamSignal::Opened(Err(e)) => {
                error!(error = %e, "OpenAI WebSocket error.");
                self.upstream = Upstream::Closed;
                self.notify_upstream_error().await;
            }
            UpstreamSignal::Frame(Some(Ok(frame))) => self.on_upstream_frame(frame).await,
            UpstreamSignal::Frame(Some(Err(e))) => {
                error!(error = %RelayError::from(e), "OpenAI WebSocket error.");
                self.upstream = Upstream::Closed;
                self.notify_upstream_error().await;
            }
            UpstreamSignal::Frame(None) => {
                info!("OpenAI connection closed.");
                self.upstream = Upstream::Closed;
            }
        }
    }

    /// Filters one upstream event and relays it to the client, byte for byte,
    /// if its type is on the allow-list.
    async fn on_upstream_frame(&mut self, frame: WsMessage) {
        let payload = match &frame {
            WsMessage::Text(text) => text.as_str(),
            WsMessage::Binary(data) => match std::str::from_utf8(data) {
                Ok(text) => text,
                Err(e) => {
                    error!(error = %e, "Error parsing OpenAI message.");
                    return;
                }
            },
            WsMessage::Close(_) => {
                info!("OpenAI connection closed.");
                self.close_upstream().await;
                return;
            }
            WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_) => return,
        };

        let event: UpstreamEvent = match serde_json::from_str(payload) {
            Ok(event) => event,
            Err(e) => {
                error!(error = %e, "Error parsing OpenAI message.");
                return;
            }
        };

        if event.is_error() {
            error!(error = ?event.error, "OpenAI error.");
        }
        if event.is_forwarded() {
            self.send_client(Message::Text(payload.to_owned().into()))
                .await;
        }
    }

    async fn send_upstream(&mut self, message: WsMessage) -> Result<(), RelayError> {
        match &mut self.upstream {
            Upstream::Active(socket) => Ok(socket.send(message).await?),
            _ => Err(RelayError::NotOpen),
        }
    }

    async fn send_client(&mut self, message: Message) {
        if let Err(e) = self.client.send(message).await {
            debug!(error = %e, "Dropping message for closed client.");
        }
    }

    async fn notify_upstream_error(&mut self) {
        match serde_json::to_string(&ServerMessage::upstream_error()) {
            Ok(json) => self.send_client(Message::Text(json.into())).await,
            Err(e) => error!(error = %e, "Failed to serialize error message."),
        }
    }

    /// Tears down whatever upstream link the pair holds. Frames still queued
    /// on it are not drained.
    async fn close_upstream(&mut self) {
        match std::mem::replace(&mut self.upstream, Upstream::Closed) {
            // Also flushes the reply to a close frame the upstream sent first.
            Upstream::Active(mut socket) => {
                if let Err(e) = socket.close(None).await {
                    debug!(error = %e, "OpenAI connection was already gone.");
                }
            }
            Upstream::Bootstrapping(handle) => {
                handle.abort();
                info!("Aborted OpenAI handshake.");
            }
            Upstream::Idle | Upstream::Closed => {}
        }
    }
}
