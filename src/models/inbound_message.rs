use serde_json::Value as JsonValue;

use super::live_notification::LiveNotification;
use super::rpc_error::RpcError;

/// Decoded shape of one frame read from the socket.
///
/// Exists only while the dispatch loop routes that frame.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// Reply to an earlier request, matched by correlation id
    Reply {
        id: String,
        outcome: Result<JsonValue, RpcError>,
    },
    /// Server-pushed live-query notification
    Notification(LiveNotification),
    /// Anything else; dropped by the dispatch loop
    Unrecognized,
}

impl InboundMessage {
    pub fn is_reply(&self) -> bool {
        matches!(self, InboundMessage::Reply { .. })
    }

    pub fn is_notification(&self) -> bool {
        matches!(self, InboundMessage::Notification(_))
    }
}
