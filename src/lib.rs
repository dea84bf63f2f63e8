//! # surreal-link
//!
//! Client library for SurrealDB-style RPC over a single WebSocket.
//!
//! Many tasks can issue requests concurrently; each request is tagged with a
//! correlation id and its reply is routed back to the caller that sent it.
//! Live queries push notifications over the same socket, and every live query
//! can be consumed by any number of independent streams.
//!
//! ## Features
//!
//! - **Multiplexing**: one socket per client, any number of concurrent requests
//! - **Live queries**: fan-out of server notifications to independent consumers
//! - **Encodings**: JSON text frames or MessagePack binary frames
//! - **Session replay**: namespace/database and credentials re-sent on connect
//! - **Keep-alive**: periodic `ping` with per-connection jitter
//!
//! ## Example
//!
//! ```rust,no_run
//! use surreal_link::{AuthProvider, LiveEvent, SurrealLinkClient};
//!
//! # async fn example() -> surreal_link::Result<()> {
//! let client = SurrealLinkClient::builder()
//!     .url("ws://localhost:8000")
//!     .namespace("test")
//!     .database("test")
//!     .auth(AuthProvider::root("root", "root"))
//!     .build()?;
//!
//! let live = client.live_table("person", false).await?;
//! let mut events = live.stream()?;
//!
//! client.create("person", Some(serde_json::json!({ "name": "Tobie" }))).await?;
//!
//! while let Some(event) = events.next().await {
//!     match event {
//!         LiveEvent::Create(record) => println!("created {}", record),
//!         LiveEvent::Closed(reason) => println!("closed: {}", reason),
//!         _ => {},
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod codec;
pub mod connection;
pub mod error;
pub mod event_handlers;
pub mod live;
pub mod models;
pub mod timeouts;

pub use auth::{AuthProvider, Credentials};
pub use client::{SurrealLinkClient, SurrealLinkClientBuilder};
pub use connection::{
    engine::ConnectionPhase, EngineId, LiveQueryRegistry, LiveStream, PendingRequests, WsEngine,
};
pub use error::{Result, SurrealLinkError};
pub use event_handlers::{ConnectionError, DisconnectInitiator, DisconnectReason, EventHandlers};
pub use live::LiveQuery;
pub use models::{
    ClosureReason, ConnectionOptions, Encoding, InboundMessage, LiveAction, LiveEvent,
    LiveNotification, QueryResult, RpcError, RpcRequest, ServerVersion,
};
pub use timeouts::{SurrealLinkTimeouts, SurrealLinkTimeoutsBuilder};
pub use tokio_util::sync::CancellationToken;
