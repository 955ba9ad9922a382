//! Defines the frames exchanged between the browser client, the relay and the
//! OpenAI Realtime API.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The control message type that asks the relay to open the upstream session.
pub const START: &str = "start";

/// Upstream event types that are relayed to the client. Everything else is dropped.
pub const FORWARDED_EVENT_TYPES: [&str; 11] = [
    "session.created",
    "session.updated",
    "response.audio.delta",
    "response.audio.done",
    "response.text.delta",
    "response.text.done",
    "response.done",
    "conversation.item.created",
    "input_audio_buffer.speech_started",
    "input_audio_buffer.speech_stopped",
    "error",
];

/// A structured message with a `type` discriminator.
///
/// Only the discriminator is interpreted; every other field is kept as-is so
/// the message can be re-serialized for the upstream without loss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ControlMessage {
    pub fn is_start(&self) -> bool {
        self.kind == START
    }
}

/// A raw client frame after classification.
#[derive(Debug)]
pub enum ClientFrame {
    /// The frame started with `{` and parsed as a control message.
    Control(ControlMessage),
    /// Anything else: a chunk of PCM16 audio, passed through untouched.
    Audio(Bytes),
    /// The frame started with `{` but was not a valid control message.
    Malformed(serde_json::Error),
}

impl ClientFrame {
    /// Classifies a frame by its first byte, independently of the WebSocket
    /// opcode it arrived with.
    pub fn classify(data: Bytes) -> Self {
        if data.first() != Some(&b'{') {
            return ClientFrame::Audio(data);
        }
        match serde_json::from_slice::<ControlMessage>(&data) {
            Ok(message) => ClientFrame::Control(message),
            Err(e) => ClientFrame::Malformed(e),
        }
    }
}

/// The part of an upstream event the relay needs to route it.
#[derive(Debug, Deserialize)]
pub struct UpstreamEvent {
    #[serde(rename = "type")]
    pub kind: String,
    /// Present on `error` events.
    #[serde(default)]
    pub error: Option<Value>,
}

impl UpstreamEvent {
    /// Whether the client is interested in this kind of event.
    pub fn is_forwarded(&self) -> bool {
        FORWARDED_EVENT_TYPES.contains(&self.kind.as_str())
    }

    pub fn is_error(&self) -> bool {
        self.kind == "error"
    }
}

/// Messages the relay itself originates towards the client.
#[derive(Serialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Reports that the upstream link failed.
    Error { error: ErrorDetail },
}

#[derive(Serialize, Debug, Clone)]
pub struct ErrorDetail {
    pub message: String,
}

impl ServerMessage {
    pub fn upstream_error() -> Self {
        ServerMessage::Error {
            error: ErrorDetail {
                message: "OpenAI connection error".to_string(),
            },
        }
    }
}
