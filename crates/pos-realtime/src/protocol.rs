//! Control frames of the real-time channel.
//!
//! Order notifications themselves are defined next to the order domain;
//! this module covers what clients send and how the server answers them.

use serde::{Deserialize, Serialize};

/// Frames a client may send.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    /// Application-level keepalive, answered with [`ServerFrame::Pong`].
    Ping,
}

/// Control frames the server sends, in the same `{event, data}` envelope as
/// order notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "lowercase")]
pub enum ServerFrame {
    /// Answer to [`ClientMessage::Ping`].
    Pong,
    /// The last client frame could not be understood. The connection stays
    /// open.
    Error {
        /// Human-readable reason.
        message: String,
    },
}

impl ServerFrame {
    /// JSON text of the frame.
    #[must_use]
    pub fn to_json(&self) -> String {
        // Unit and string-only variants always serialize.
        serde_json::to_string(self).unwrap_or_else(|_| String::from(r#"{"event":"error"}"#))
    }
}

/// Parses a text frame from a client.
///
/// # Errors
///
/// Returns the JSON error when the frame is not a known [`ClientMessage`].
pub fn parse_client_message(text: &str) -> Result<ClientMessage, serde_json::Error> {
    serde_json::from_str(text)
}
