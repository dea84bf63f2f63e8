//! Encoding boundary between the engine and the wire.
//!
//! The engine only ever calls [`encode_request`] and [`decode_frame`]; it
//! does not look inside payload values. Text frames are always JSON; binary
//! frames follow the connection's negotiated [`Encoding`].

use crate::{
    error::{Result, SurrealLinkError},
    models::{Encoding, InboundMessage, LiveNotification, RpcError, RpcRequest},
};
use bytes::Bytes;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tokio_tungstenite::tungstenite::protocol::Message;

/// Loose view of any inbound frame, classified afterwards.
#[derive(Debug, Deserialize)]
struct RawFrame {
    #[serde(default)]
    id: Option<JsonValue>,
    #[serde(default)]
    result: Option<JsonValue>,
    #[serde(default)]
    error: Option<JsonValue>,
}

/// Encode a request envelope into one WebSocket frame.
pub fn encode_request(encoding: Encoding, request: &RpcRequest) -> Result<Message> {
    match encoding {
        Encoding::Json => {
            let payload = serde_json::to_string(request)?;
            Ok(Message::Text(payload.into()))
        },
        Encoding::MessagePack => {
            let payload = rmp_serde::to_vec_named(request)?;
            Ok(Message::Binary(Bytes::from(payload)))
        },
    }
}

/// Decode one WebSocket frame.
///
/// Returns `Ok(None)` for control frames (ping/pong/close), which carry no
/// RPC message.
pub fn decode_frame(encoding: Encoding, frame: &Message) -> Result<Option<InboundMessage>> {
    match frame {
        Message::Text(text) => decode_payload(Encoding::Json, text.as_bytes()).map(Some),
        Message::Binary(data) => decode_payload(encoding, data).map(Some),
        _ => Ok(None),
    }
}

/// Decode a frame payload into an [`InboundMessage`].
pub fn decode_payload(encoding: Encoding, payload: &[u8]) -> Result<InboundMessage> {
    let raw: RawFrame = match encoding {
        Encoding::Json => serde_json::from_slice(payload)?,
        Encoding::MessagePack => rmp_serde::from_slice(payload)?,
    };
    Ok(classify(raw))
}

fn classify(raw: RawFrame) -> InboundMessage {
    if let Some(id) = raw.id.as_ref().and_then(correlation_id) {
        let outcome = match raw.error {
            Some(error) => Err(rpc_error(error)),
            None => Ok(raw.result.unwrap_or(JsonValue::Null)),
        };
        return InboundMessage::Reply { id, outcome };
    }

    match raw.result.as_ref().and_then(LiveNotification::from_value) {
        Some(notification) => InboundMessage::Notification(notification),
        None => InboundMessage::Unrecognized,
    }
}

fn correlation_id(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(id) => Some(id.clone()),
        JsonValue::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

fn rpc_error(value: JsonValue) -> RpcError {
    match value {
        JsonValue::String(message) => RpcError { code: 0, message },
        other => serde_json::from_value(other.clone()).unwrap_or_else(|_| RpcError {
            code: 0,
            message: other.to_string(),
        }),
    }
}
