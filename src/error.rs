//! Error types for surreal-link.

use thiserror::Error;
use uuid::Uuid;

/// Result type for surreal-link operations.
pub type Result<T> = std::result::Result<T, SurrealLinkError>;

/// Errors that can occur while talking to the server.
///
/// Errors are scoped: a failure of one request or one live query is delivered
/// to that caller only. Only connection-wide conditions (socket loss, dispose)
/// reach every in-flight request of an engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SurrealLinkError {
    /// Opening the socket or replaying session setup failed.
    #[error("Connection failed: {0}")]
    ConnectionError(String),

    /// Binary encoding was requested but the server is too old for it.
    #[error("Server version {actual} does not support binary encoding (requires >= {required})")]
    IncompatibleVersion { required: String, actual: String },

    /// Writing to the socket failed, or no socket is open.
    #[error("WebSocket error: {0}")]
    WebSocketError(String),

    /// The server answered the request with an error.
    #[error("Server error (code {code}): {message}")]
    ServerError { code: i64, message: String },

    /// A statement of a `query` call returned an error status.
    #[error("Query error: {0}")]
    QueryError(String),

    /// A frame or reply value could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Timeout: {0}")]
    TimeoutError(String),

    /// The caller cancelled the request.
    #[error("Request cancelled")]
    Cancelled,

    /// The socket went away while the request was in flight.
    #[error("Connection closed: {0}")]
    ConnectionClosed(String),

    /// The engine has been disposed and will not reconnect.
    #[error("Connection disposed")]
    Disposed,

    #[error("Live query not found: {0}")]
    LiveQueryNotFound(Uuid),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl SurrealLinkError {
    /// Returns true when retrying the same operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConnectionError(_)
                | Self::WebSocketError(_)
                | Self::TimeoutError(_)
                | Self::ConnectionClosed(_)
        )
    }

    pub fn is_disposed(&self) -> bool {
        matches!(self, Self::Disposed)
    }
}

impl From<serde_json::Error> for SurrealLinkError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

impl From<rmp_serde::encode::Error> for SurrealLinkError {
    fn from(err: rmp_serde::encode::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

impl From<rmp_serde::decode::Error> for SurrealLinkError {
    fn from(err: rmp_serde::decode::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}
