//! Push-channel message types.
//!
//! The push channel is a WebSocket carrying JSON text frames. Every frame,
//! in either direction, is an envelope naming the event and its payload:
//!
//! ```json
//! {"event":"status","data":{"status":{"code":0,"text":"Ready","creditText":"$0.00"}}}
//! {"event":"vendError","data":{"error":{"code":1,"msg":"Motor jammed"}}}
//! {"event":"vendSuccess","data":{}}
//! ```
//!
//! # Protocol
//!
//! 1. Right after the connection opens the client sends a
//!    [`ClientEvent::StatusRequest`]; the server answers with a `status`
//!    frame.
//! 2. The server pushes `status` whenever the machine state or credit
//!    changes, and `vendSuccess` / `vendError` when a vend finishes.
//! 3. Older servers report failures through the generic `error` event
//!    instead of `vendError`. Both are part of the protocol.
//! 4. `refresh` asks the client to discard its state and start over;
//!    `shutdown` is sent when the server is stopping.
//!
//! Payloads are decoded per event name by [`decode_frame`]. A payload that
//! does not have the expected shape yields [`FrameError::Malformed`], so a
//! half-formed event never reaches the caller.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::status::StatusSnapshot;

/// Generic error payload (`error` event).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericError {
    #[serde(default)]
    pub code: i64,
    pub message: String,
}

/// Vend failure payload (`vendError` event).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendError {
    #[serde(default)]
    pub code: i64,
    pub msg: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ErrorEnvelope<T> {
    error: T,
}

/// Server-to-client push event.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    /// Machine status snapshot.
    Status(StatusSnapshot),
    /// Connection or status level failure.
    Error(GenericError),
    /// A vend attempt failed.
    VendError(VendError),
    /// A vend attempt completed.
    VendSuccess,
    /// Liveness signal. The payload is opaque.
    Heartbeat(serde_json::Value),
    /// Discard all client state and reconnect.
    Refresh,
    /// The server is going away.
    Shutdown,
}

impl ServerEvent {
    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::Status(_) => STATUS,
            ServerEvent::Error(_) => ERROR,
            ServerEvent::VendError(_) => VEND_ERROR,
            ServerEvent::VendSuccess => VEND_SUCCESS,
            ServerEvent::Heartbeat(_) => HEARTBEAT,
            ServerEvent::Refresh => REFRESH,
            ServerEvent::Shutdown => SHUTDOWN,
        }
    }
}

/// Client-to-server push event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientEvent {
    /// Ask for a status snapshot. Sent with an empty payload.
    StatusRequest,
}

impl ClientEvent {
    /// Encode this event as a JSON text frame.
    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        let envelope = match self {
            ClientEvent::StatusRequest => Envelope {
                event: STATUS.to_owned(),
                data: serde_json::Value::Object(serde_json::Map::new()),
            },
        };
        serde_json::to_string(&envelope)
    }
}

const STATUS: &str = "status";
const ERROR: &str = "error";
const VEND_ERROR: &str = "vendError";
const VEND_SUCCESS: &str = "vendSuccess";
const HEARTBEAT: &str = "heartbeat";
const REFRESH: &str = "refresh";
const SHUTDOWN: &str = "shutdown";

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    data: serde_json::Value,
}

/// Reasons a push frame could not be turned into a [`ServerEvent`].
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The frame is not a JSON envelope at all.
    #[error("invalid frame: {0}")]
    Json(#[from] serde_json::Error),

    /// The event is known but its payload lacks a required field.
    #[error("bad {event} response: {reason}")]
    Malformed { event: &'static str, reason: String },

    /// The event name is not part of the protocol.
    #[error("unknown event: {0}")]
    UnknownEvent(String),
}

/// Decode a JSON text frame into a typed [`ServerEvent`].
pub fn decode_frame(text: &str) -> Result<ServerEvent, FrameError> {
    let Envelope { event, data } = serde_json::from_str(text)?;
    match event.as_str() {
        STATUS => payload::<StatusSnapshot>(STATUS, data).map(ServerEvent::Status),
        ERROR => payload::<ErrorEnvelope<GenericError>>(ERROR, data)
            .map(|envelope| ServerEvent::Error(envelope.error)),
        VEND_ERROR => payload::<ErrorEnvelope<VendError>>(VEND_ERROR, data)
            .map(|envelope| ServerEvent::VendError(envelope.error)),
        VEND_SUCCESS => Ok(ServerEvent::VendSuccess),
        HEARTBEAT => Ok(ServerEvent::Heartbeat(data)),
        REFRESH => Ok(ServerEvent::Refresh),
        SHUTDOWN => Ok(ServerEvent::Shutdown),
        _ => Err(FrameError::UnknownEvent(event)),
    }
}

fn payload<T: DeserializeOwned>(
    event: &'static str,
    data: serde_json::Value,
) -> Result<T, FrameError> {
    serde_json::from_value(data).map_err(|e| FrameError::Malformed {
        event,
        reason: e.to_string(),
    })
}
