//! WebSocket connection management.
//!
//! This module contains:
//! - [`id_gen`]: correlation and engine identifiers
//! - [`pending`]: process-wide registry of in-flight requests
//! - [`live_registry`]: process-wide registry of live-query fan-out groups
//! - [`engine`]: the connection lifecycle manager and request sender
//! - [`dispatch`]: the single reader task per socket
//! - [`keepalive`]: periodic `ping` while the connection is initialized
//! - [`websocket`]: URL resolution and socket helpers

pub(crate) mod dispatch;
pub mod engine;
pub mod id_gen;
pub(crate) mod keepalive;
pub mod live_registry;
pub mod pending;
pub mod websocket;

pub use engine::WsEngine;
pub use id_gen::EngineId;
pub use live_registry::{LiveQueryRegistry, LiveStream};
pub use pending::PendingRequests;

/// Default capacity for live-query sink channels.
pub(crate) const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 8192;

/// A duration far enough in the future (~100 years) to act as "never" for
/// deadline calculations without overflowing `Instant::now() + dur`.
pub(crate) const FAR_FUTURE: std::time::Duration =
    std::time::Duration::from_secs(100 * 365 * 24 * 3600);
