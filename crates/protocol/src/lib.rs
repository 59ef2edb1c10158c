//! Parley wire definitions shared by the server and browser clients.
//!
//! All realtime communication uses JSON event frames over a WebSocket:
//!
//! - `ClientFrame`: client → server named event
//! - `EventFrame`: server → client push (broadcast or targeted)
//!
//! HTTP endpoint paths and event names live here too so both sides agree on
//! them. Their values are arbitrary but must not change without a client
//! release.

pub mod dates;
pub mod message;

use serde::{Deserialize, Serialize};

pub use {
    dates::{DateAwareValue, convert_dates, is_date_string},
    message::{ChatMessage, MessageId, NewChatMessage, ValidationError},
};

// ── Constants ────────────────────────────────────────────────────────────────

pub const MAX_PAYLOAD_BYTES: usize = 524_288; // 512 KB

// ── Endpoints ────────────────────────────────────────────────────────────────

pub mod endpoints {
    pub const GET_ALL_MESSAGES: &str = "/api/get-all-messages";
    pub const SEND_MESSAGE: &str = "/api/send-message";
    pub const HEALTH: &str = "/health";
    pub const WS: &str = "/ws";
}

// ── Event names ──────────────────────────────────────────────────────────────

pub mod events {
    /// Client → server: post a new chat message (no id).
    pub const SEND_MESSAGE: &str = "send-message";
    /// Server → all clients: a message was stored (id assigned).
    pub const MESSAGE_RECEIVED: &str = "message-received";
    /// Server → one client: the last frame from that client was rejected.
    pub const ERROR: &str = "error";
}

// ── Error codes ──────────────────────────────────────────────────────────────

pub mod error_codes {
    pub const INVALID_REQUEST: &str = "INVALID_REQUEST";
    pub const UNKNOWN_EVENT: &str = "UNKNOWN_EVENT";
    pub const PAYLOAD_TOO_LARGE: &str = "PAYLOAD_TOO_LARGE";
    pub const UNAVAILABLE: &str = "UNAVAILABLE";
}

// ── Error shape ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorShape {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorShape {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Body of every non-2xx HTTP response produced by a plugin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorShape,
}

impl From<ErrorShape> for ErrorEnvelope {
    fn from(error: ErrorShape) -> Self {
        Self { error }
    }
}

// ── Frames ───────────────────────────────────────────────────────────────────

/// Server → client push.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventFrame {
    pub r#type: String, // always "event"
    pub event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seq: Option<u64>,
}

impl EventFrame {
    pub fn new(event: impl Into<String>, payload: serde_json::Value, seq: u64) -> Self {
        Self {
            r#type: "event".into(),
            event: event.into(),
            payload: Some(payload),
            seq: Some(seq),
        }
    }
}

/// Client → server frames. Only named events exist today.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientFrame {
    #[serde(rename = "event")]
    Event(InboundEvent),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundEvent {
    pub event: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}
