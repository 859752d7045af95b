//! Error types for the REST, realtime, and configuration layers.
//!
//! ERROR HANDLING
//! ==============
//! Nothing here escapes [`crate::SessionStore`]: actions turn an
//! [`ApiError`] into a notice via [`ApiError::user_message`] and a
//! [`PresenceError`] into a log line.

use crate::presence::packet::PacketError;

/// Failure of a single REST call against the auth endpoints.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response (DNS, connect, timeout).
    #[error("request failed: {0}")]
    Transport(String),

    /// The server answered with a non-success status.
    #[error("server rejected request with status {status}")]
    Rejected { status: u16, message: Option<String> },

    /// A success response carried a body that could not be decoded.
    #[error("invalid response body: {0}")]
    Decode(String),

    /// The underlying HTTP client could not be constructed.
    #[error("http client build failed: {0}")]
    HttpClientBuild(String),
}

impl ApiError {
    /// Text suitable for a user-facing notice.
    ///
    /// Prefers the server-supplied `message`; every other shape gets a
    /// fallback instead of failing.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected { message: Some(message), .. } if !message.trim().is_empty() => message.clone(),
            Self::Rejected { status, .. } => format!("Request failed ({status})"),
            Self::Transport(_) => "Unable to reach the server".to_owned(),
            Self::Decode(_) => "Unexpected response from the server".to_owned(),
            Self::HttpClientBuild(_) => "Client is misconfigured".to_owned(),
        }
    }

    /// HTTP status of a rejected request, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Failure to open or run the realtime presence channel.
#[derive(Debug, thiserror::Error)]
pub enum PresenceError {
    #[error("invalid socket URL: {0}")]
    InvalidUrl(String),
    #[error("websocket connect failed: {0}")]
    Connect(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("socket.io handshake failed: {0}")]
    Handshake(String),
    #[error("timed out waiting for socket.io handshake")]
    Timeout,
    #[error("websocket closed")]
    Closed,
    #[error("packet decode failed: {0}")]
    Packet(#[from] PacketError),
}

impl From<tokio_tungstenite::tungstenite::Error> for PresenceError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Connect(Box::new(err))
    }
}

/// Invalid or missing configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("config parse failed: {0}")]
    Parse(String),
    #[error("CHAT_ORIGIN is required in production mode")]
    MissingOrigin,
    #[error("invalid URL for {var}: {value}")]
    InvalidUrl { var: &'static str, value: String },
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
