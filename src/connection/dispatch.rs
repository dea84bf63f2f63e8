//! The single reader of one socket.
//!
//! Decodes each inbound frame and routes it without ever waiting on a
//! consumer: replies go to [`PendingRequests`], notifications to
//! [`LiveQueryRegistry`] (whose `try_send` never blocks). Frames are routed
//! in read order, which gives per-request and per-live-query ordering.
//!
//! A frame that fails to decode or matches nothing is logged and dropped;
//! only the end of the stream stops the loop.

use crate::{
    codec,
    connection::{
        engine::WsEngine, id_gen::EngineId, live_registry::LiveQueryRegistry,
        pending::PendingRequests, websocket::WsReader,
    },
    event_handlers::{DisconnectReason, EventHandlers},
    models::{ClosureReason, Encoding, InboundMessage, LiveEvent},
};
use futures_util::StreamExt;
use log::{debug, warn};
use std::sync::{Arc, Weak};
use tokio_tungstenite::tungstenite::protocol::Message;

/// Everything the reader needs, without a strong reference to the engine.
pub(crate) struct DispatchContext {
    pub engine: Weak<WsEngine>,
    pub owner: EngineId,
    pub generation: u64,
    pub encoding: Encoding,
    pub pending: Arc<PendingRequests>,
    pub live: Arc<LiveQueryRegistry>,
    pub handlers: EventHandlers,
}

pub(crate) async fn run_dispatch_loop(context: DispatchContext, mut reader: WsReader) {
    let reason = loop {
        match reader.next().await {
            Some(Ok(Message::Close(frame))) => {
                break DisconnectReason::server(&context.owner, frame.as_ref());
            },
            Some(Ok(frame)) => route_frame(&context, &frame),
            Some(Err(e)) => {
                break DisconnectReason::transport(
                    &context.owner,
                    format!("WebSocket read failed: {}", e),
                );
            },
            None => break DisconnectReason::transport(&context.owner, "WebSocket stream ended"),
        }
    };

    debug!("[surreal-link] Dispatch loop stopped, {}", reason);
    if let Some(engine) = context.engine.upgrade() {
        engine.handle_socket_lost(context.generation, reason).await;
    }
}

fn route_frame(context: &DispatchContext, frame: &Message) {
    if context.handlers.wants_receive() {
        match frame {
            Message::Text(text) => context.handlers.emit_receive(text.as_str()),
            Message::Binary(data) => context
                .handlers
                .emit_receive(&format!("<binary frame: {} bytes>", data.len())),
            _ => {},
        }
    }

    let message = match codec::decode_frame(context.encoding, frame) {
        Ok(Some(message)) => message,
        Ok(None) => return,
        Err(e) => {
            warn!("[surreal-link] Dropping undecodable frame: {}", e);
            return;
        },
    };

    match message {
        InboundMessage::Reply { id, outcome } => {
            let resolved = match outcome {
                Ok(value) => context.pending.resolve_success(&context.owner, &id, value),
                Err(error) => context.pending.resolve_failure(&context.owner, &id, error.into()),
            };
            if !resolved {
                debug!("[surreal-link] Dropping reply for unknown request {}", id);
            }
        },
        InboundMessage::Notification(notification) => {
            let live_id = notification.id;
            match LiveEvent::from_notification(notification) {
                Some(event) => {
                    context.live.broadcast(&context.owner, live_id, event);
                },
                None => {
                    debug!("[surreal-link] Server killed live query {}", live_id);
                    context.live.close(&context.owner, live_id, ClosureReason::QueryKilled);
                },
            }
        },
        InboundMessage::Unrecognized => {
            debug!("[surreal-link] Dropping unrecognized frame");
        },
    }
}
