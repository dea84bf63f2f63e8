use serde::{Deserialize, Serialize};
use std::fmt;

use super::server_version::ServerVersion;

/// Oldest server release that speaks the binary encoding over WebSocket.
pub const MIN_BINARY_PROTOCOL_VERSION: ServerVersion = ServerVersion::new(1, 4, 0);

/// Wire encoding negotiated once per connection.
///
/// The choice is fixed when the socket opens (as the WebSocket subprotocol)
/// and never changes for the lifetime of that connection.
///
/// SurrealDB's own binary protocol is CBOR. The binary mode here is
/// MessagePack under the `msgpack` subprotocol, so it only works against
/// servers (or proxies) that accept that subprotocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Encoding {
    /// Human-readable JSON text frames
    #[default]
    Json,
    /// Compact MessagePack binary frames
    MessagePack,
}

impl Encoding {
    /// WebSocket subprotocol announced during the upgrade.
    pub fn subprotocol(self) -> &'static str {
        match self {
            Encoding::Json => "json",
            Encoding::MessagePack => "msgpack",
        }
    }

    pub fn is_binary(self) -> bool {
        matches!(self, Encoding::MessagePack)
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.subprotocol())
    }
}
