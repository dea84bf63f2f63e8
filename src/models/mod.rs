//! Data models for the surreal-link client library.
//!
//! Defines connection configuration, the request/reply envelopes written to
//! and read from the socket, and the events delivered to live-query sinks.

pub mod closure_reason;
pub mod connection_options;
pub mod encoding;
pub mod inbound_message;
pub mod live_event;
pub mod live_notification;
pub mod query_result;
pub mod rpc_error;
pub mod rpc_request;
pub mod server_version;


pub use closure_reason::ClosureReason;
pub use connection_options::ConnectionOptions;
pub use encoding::{Encoding, MIN_BINARY_PROTOCOL_VERSION};
pub use inbound_message::InboundMessage;
pub use live_event::LiveEvent;
pub use live_notification::{LiveAction, LiveNotification};
pub use query_result::QueryResult;
pub use rpc_error::RpcError;
pub use rpc_request::RpcRequest;
pub use server_version::ServerVersion;
