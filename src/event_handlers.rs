//! Lifecycle hooks of one engine.
//!
//! Every payload names the engine it comes from, so one set of handlers can
//! be shared by several clients:
//!
//! - [`on_connect`](EventHandlers::on_connect): setup replay finished, the engine is `Initialized`
//! - [`on_disconnect`](EventHandlers::on_disconnect): the engine was disposed, by the caller or by socket loss
//! - [`on_error`](EventHandlers::on_error): a connect attempt failed, or an initialized socket was lost
//! - [`on_receive`](EventHandlers::on_receive) / [`on_send`](EventHandlers::on_send): raw frame tracing
//!
//! # Example
//!
//! ```rust,no_run
//! use surreal_link::{EventHandlers, SurrealLinkClient};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let handlers = EventHandlers::new()
//!     .on_connect(|engine| println!("engine {} ready", engine))
//!     .on_disconnect(|reason| println!("{}", reason))
//!     .on_error(|error| eprintln!("{}", error));
//!
//! let client = SurrealLinkClient::builder()
//!     .url("ws://localhost:8000")
//!     .event_handlers(handlers)
//!     .build()?;
//! # Ok(())
//! # }
//! ```

use crate::{
    connection::{engine::ConnectionPhase, id_gen::EngineId},
    error::SurrealLinkError,
};
use std::{fmt, sync::Arc};
use tokio_tungstenite::tungstenite::protocol::CloseFrame;

/// Which side ended a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectInitiator {
    /// `dispose()` / `disconnect()` on this side
    Client,
    /// The server sent a close frame
    Server,
    /// The stream failed or ended without a close frame
    Transport,
}

impl fmt::Display for DisconnectInitiator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisconnectInitiator::Client => f.write_str("client"),
            DisconnectInitiator::Server => f.write_str("server"),
            DisconnectInitiator::Transport => f.write_str("transport"),
        }
    }
}

/// Why an engine's connection ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisconnectReason {
    pub engine: EngineId,
    pub initiator: DisconnectInitiator,
    pub message: String,
    /// Close code from the server's close frame
    pub code: Option<u16>,
}

impl DisconnectReason {
    pub(crate) fn client(engine: &EngineId) -> Self {
        Self {
            engine: engine.clone(),
            initiator: DisconnectInitiator::Client,
            message: "client disconnected".to_string(),
            code: None,
        }
    }

    pub(crate) fn server(engine: &EngineId, frame: Option<&CloseFrame>) -> Self {
        let (message, code) = match frame {
            Some(frame) if !frame.reason.as_str().is_empty() => {
                (frame.reason.as_str().to_string(), Some(u16::from(frame.code)))
            },
            Some(frame) => ("server closed the connection".to_string(), Some(u16::from(frame.code))),
            None => ("server closed the connection".to_string(), None),
        };
        Self {
            engine: engine.clone(),
            initiator: DisconnectInitiator::Server,
            message,
            code,
        }
    }

    pub(crate) fn transport(engine: &EngineId, message: impl Into<String>) -> Self {
        Self {
            engine: engine.clone(),
            initiator: DisconnectInitiator::Transport,
            message: message.into(),
            code: None,
        }
    }

    /// True unless the caller asked for the disconnect.
    pub fn is_unexpected(&self) -> bool {
        self.initiator != DisconnectInitiator::Client
    }
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "engine {} disconnected by {}: {}", self.engine, self.initiator, self.message)?;
        if let Some(code) = self.code {
            write!(f, " (close code {})", code)?;
        }
        Ok(())
    }
}

/// Payload of the `on_error` hook.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionError {
    pub engine: EngineId,
    /// Phase the engine was in when the failure happened
    pub phase: ConnectionPhase,
    pub message: String,
    /// The next request will try a fresh connect. False once the engine is
    /// disposed.
    pub recoverable: bool,
}

impl ConnectionError {
    pub(crate) fn connect_failed(
        engine: &EngineId,
        phase: ConnectionPhase,
        err: &SurrealLinkError,
    ) -> Self {
        Self {
            engine: engine.clone(),
            phase,
            message: err.to_string(),
            recoverable: err.is_retryable(),
        }
    }

    pub(crate) fn socket_lost(engine: &EngineId, reason: &DisconnectReason) -> Self {
        Self {
            engine: engine.clone(),
            phase: ConnectionPhase::Initialized,
            message: format!("socket lost ({}): {}", reason.initiator, reason.message),
            recoverable: false,
        }
    }
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "engine {} ({:?}): {}", self.engine, self.phase, self.message)
    }
}

type ConnectHook = Arc<dyn Fn(&EngineId) + Send + Sync>;
type DisconnectHook = Arc<dyn Fn(DisconnectReason) + Send + Sync>;
type ErrorHook = Arc<dyn Fn(ConnectionError) + Send + Sync>;
type FrameHook = Arc<dyn Fn(&str) + Send + Sync>;

/// Optional callbacks, run inline on the engine's tasks. Keep them short.
#[derive(Clone, Default)]
pub struct EventHandlers {
    connect: Option<ConnectHook>,
    disconnect: Option<DisconnectHook>,
    error: Option<ErrorHook>,
    receive: Option<FrameHook>,
    send: Option<FrameHook>,
}

impl EventHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_connect(mut self, f: impl Fn(&EngineId) + Send + Sync + 'static) -> Self {
        self.connect = Some(Arc::new(f));
        self
    }

    pub fn on_disconnect(mut self, f: impl Fn(DisconnectReason) + Send + Sync + 'static) -> Self {
        self.disconnect = Some(Arc::new(f));
        self
    }

    pub fn on_error(mut self, f: impl Fn(ConnectionError) + Send + Sync + 'static) -> Self {
        self.error = Some(Arc::new(f));
        self
    }

    /// Inbound frames. Binary frames arrive as a `<binary frame: N bytes>` placeholder.
    pub fn on_receive(mut self, f: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.receive = Some(Arc::new(f));
        self
    }

    /// Outbound requests, rendered as JSON whatever the wire encoding.
    pub fn on_send(mut self, f: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.send = Some(Arc::new(f));
        self
    }

    pub fn has_any(&self) -> bool {
        self.connect.is_some()
            || self.disconnect.is_some()
            || self.error.is_some()
            || self.receive.is_some()
            || self.send.is_some()
    }

    // ==================== Emitters ====================

    pub(crate) fn emit_connect(&self, engine: &EngineId) {
        if let Some(hook) = &self.connect {
            hook(engine);
        }
    }

    pub(crate) fn emit_disconnect(&self, reason: DisconnectReason) {
        if let Some(hook) = &self.disconnect {
            hook(reason);
        }
    }

    pub(crate) fn emit_error(&self, error: ConnectionError) {
        if let Some(hook) = &self.error {
            hook(error);
        }
    }

    pub(crate) fn emit_receive(&self, raw: &str) {
        if let Some(hook) = &self.receive {
            hook(raw);
        }
    }

    pub(crate) fn emit_send(&self, raw: &str) {
        if let Some(hook) = &self.send {
            hook(raw);
        }
    }

    pub(crate) fn wants_send(&self) -> bool {
        self.send.is_some()
    }

    pub(crate) fn wants_receive(&self) -> bool {
        self.receive.is_some()
    }
}

impl fmt::Debug for EventHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let set: Vec<&str> = [
            ("connect", self.connect.is_some()),
            ("disconnect", self.disconnect.is_some()),
            ("error", self.error.is_some()),
            ("receive", self.receive.is_some()),
            ("send", self.send.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, present)| present.then_some(name))
        .collect();
        f.debug_struct("EventHandlers").field("set", &set).finish()
    }
}
