//! Opens and configures the WebSocket connection to the OpenAI Realtime API.

use super::UpstreamSocket;
use crate::{error::RelayError, state::AppState};
use futures_util::SinkExt;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{client::IntoClientRequest, protocol::Message as WsMessage},
};
use tracing::info;

/// Instructions used when no `INSTRUCTIONS_PATH` is configured.
pub const DEFAULT_INSTRUCTIONS: &str = include_str!("../../../prompts/prospect.md");

// --- Session configuration payload ---

/// Client events the relay itself sends to the Realtime API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RealtimeClientEvent {
    #[serde(rename = "session.update")]
    SessionUpdate { session: SessionConfig },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub modalities: Vec<Modality>,
    pub instructions: String,
    pub voice: Voice,
    pub input_audio_format: AudioFormat,
    pub output_audio_format: AudioFormat,
    pub turn_detection: TurnDetection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Text,
    Audio,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Voice {
    Alloy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioFormat {
    #[serde(rename = "pcm16")]
    Pcm16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnDetection {
    /// Voice-activity detection run by the upstream.
    ServerVad {
        threshold: f32,
        prefix_padding_ms: u32,
        silence_duration_ms: u32,
    },
}

impl SessionConfig {
    /// The fixed configuration for a call: text and audio, the `alloy` voice,
    /// PCM16 both ways and server-side turn detection.
    pub fn new(instructions: String) -> Self {
        Self {
            modalities: vec![Modality::Text, Modality::Audio],
            instructions,
            voice: Voice::Alloy,
            input_audio_format: AudioFormat::Pcm16,
            output_audio_format: AudioFormat::Pcm16,
            turn_detection: TurnDetection::ServerVad {
                threshold: 0.5,
                prefix_padding_ms: 300,
                silence_duration_ms: 500,
            },
        }
    }
}

// --- Connection bootstrap ---

/// Connects to the Realtime API and sends the session configuration.
///
/// The returned socket is open and configured. There is no retry and no
/// handshake timeout.
pub async fn connect(state: &AppState) -> Result<UpstreamSocket, RelayError> {
    let mut request = state.config.realtime_url.as_str().into_client_request()?;
    request.headers_mut().insert(
        "Authorization",
        format!("Bearer {}", state.config.openai_api_key.expose_secret()).parse()?,
    );
    request
        .headers_mut()
        .insert("OpenAI-Beta", "realtime=v1".parse()?);

    let (mut ws_stream, _) = connect_async(request).await?;
    info!("Connected to OpenAI Realtime API.");

    let event = RealtimeClientEvent::SessionUpdate {
        session: SessionConfig::new(state.instructions.to_string()),
    };
    ws_stream
        .send(WsMessage::Text(serde_json::to_string(&event)?.into()))
        .await?;

    Ok(ws_stream)
}
