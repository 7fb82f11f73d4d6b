//! Client error types.

use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by [`crate::OrderSocketClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// The configured endpoint is not a usable WebSocket URL.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// The connection was not established in time.
    #[error("not connected after {0:?}")]
    Timeout(Duration),

    /// The client was closed.
    #[error("client closed")]
    Closed,

    /// WebSocket transport failure.
    #[error("transport error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),
}

impl From<url::ParseError> for ClientError {
    fn from(e: url::ParseError) -> Self {
        Self::InvalidEndpoint(e.to_string())
    }
}
