use serde::{Deserialize, Serialize};

use super::encoding::Encoding;

/// Connection-level options for the WebSocket engine.
///
/// These options control:
/// - The wire encoding negotiated at connect time
/// - The namespace/database selected right after the socket opens
/// - The buffer size of every live-query sink
///
/// Credentials live in [`AuthProvider`](crate::AuthProvider); timeouts live in
/// [`SurrealLinkTimeouts`](crate::SurrealLinkTimeouts).
///
/// # Example
///
/// ```rust
/// use surreal_link::{ConnectionOptions, Encoding};
///
/// let options = ConnectionOptions::default()
///     .with_encoding(Encoding::MessagePack)
///     .with_namespace("test")
///     .with_database("test")
///     .with_event_channel_capacity(1024);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionOptions {
    /// Wire encoding, fixed for the lifetime of a connection
    /// Default: Json
    #[serde(default)]
    pub encoding: Encoding,

    /// Namespace selected with `use` after connecting
    #[serde(default)]
    pub namespace: Option<String>,

    /// Database selected with `use` after connecting
    #[serde(default)]
    pub database: Option<String>,

    /// Number of notifications buffered per live-query sink.
    ///
    /// When a sink's buffer is full, further notifications for that sink are
    /// dropped (other sinks of the same live query are unaffected). The
    /// terminal closure event is never dropped.
    /// Default: 8192
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

fn default_event_channel_capacity() -> usize {
    crate::connection::DEFAULT_EVENT_CHANNEL_CAPACITY
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            encoding: Encoding::default(),
            namespace: None,
            database: None,
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

impl ConnectionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Set the per-sink notification buffer. Zero is clamped to one.
    pub fn with_event_channel_capacity(mut self, capacity: usize) -> Self {
        self.event_channel_capacity = capacity.max(1);
        self
    }
}
