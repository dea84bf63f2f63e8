//! Low-level WebSocket helpers: endpoint resolution, opening the socket with
//! the negotiated subprotocol, and keep-alive jitter.

use crate::{
    error::{Result, SurrealLinkError},
    models::Encoding,
    timeouts::SurrealLinkTimeouts,
};
use futures_util::stream::{SplitSink, SplitStream};
use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    time::Duration,
};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{
        client::IntoClientRequest,
        http::{header::SEC_WEBSOCKET_PROTOCOL, HeaderValue},
        protocol::Message,
    },
    MaybeTlsStream,
};
use url::Url;

pub type WebSocketStream = tokio_tungstenite::WebSocketStream<MaybeTlsStream<TcpStream>>;
pub type WsWriter = SplitSink<WebSocketStream, Message>;
pub type WsReader = SplitStream<WebSocketStream>;

/// RPC endpoint path used when the configured URL has none.
const RPC_PATH: &str = "/rpc";

/// Turn a user-supplied endpoint into the WebSocket RPC URL.
///
/// `http`/`https` map to `ws`/`wss`. An empty path becomes `/rpc`; any other
/// path is kept so the client can sit behind a proxy prefix.
pub fn resolve_ws_url(endpoint: &str) -> Result<String> {
    let mut url = Url::parse(endpoint.trim()).map_err(|e| {
        SurrealLinkError::ConfigurationError(format!("Invalid endpoint '{}': {}", endpoint, e))
    })?;

    if url.host_str().is_none() {
        return Err(SurrealLinkError::ConfigurationError(
            "Endpoint must include a host".to_string(),
        ));
    }

    if !url.username().is_empty() || url.password().is_some() {
        return Err(SurrealLinkError::ConfigurationError(
            "Endpoint must not include username/password; use AuthProvider instead".to_string(),
        ));
    }

    let ws_scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(SurrealLinkError::ConfigurationError(format!(
                "Unsupported endpoint scheme '{}'; expected http(s) or ws(s)",
                other
            )));
        },
    };

    url.set_scheme(ws_scheme).map_err(|_| {
        SurrealLinkError::ConfigurationError("Failed to set WebSocket URL scheme".to_string())
    })?;
    url.set_fragment(None);
    if url.path().is_empty() || url.path() == "/" {
        url.set_path(RPC_PATH);
    }

    Ok(url.to_string())
}

/// Open the socket, announcing `encoding` as the WebSocket subprotocol.
pub async fn open_socket(
    url: &str,
    encoding: Encoding,
    timeouts: &SurrealLinkTimeouts,
) -> Result<WebSocketStream> {
    let mut request = url.into_client_request().map_err(|e| {
        SurrealLinkError::ConfigurationError(format!("Failed to build WebSocket request: {}", e))
    })?;
    request
        .headers_mut()
        .insert(SEC_WEBSOCKET_PROTOCOL, HeaderValue::from_static(encoding.subprotocol()));

    let connect_result = if SurrealLinkTimeouts::is_no_timeout(timeouts.connection_timeout) {
        Ok(connect_async(request).await)
    } else {
        tokio::time::timeout(timeouts.connection_timeout, connect_async(request)).await
    };

    match connect_result {
        Ok(Ok((stream, _response))) => Ok(stream),
        Ok(Err(tokio_tungstenite::tungstenite::Error::Http(response))) => {
            let message = match response.status().as_u16() {
                401 => "Unauthorized: WebSocket upgrade rejected".to_string(),
                403 => "Forbidden: access to WebSocket denied".to_string(),
                code => format!("WebSocket HTTP error: {}", code),
            };
            Err(SurrealLinkError::ConnectionError(message))
        },
        Ok(Err(e)) => Err(SurrealLinkError::ConnectionError(format!(
            "Failed to connect to {}: {}",
            url, e
        ))),
        Err(_) => Err(SurrealLinkError::TimeoutError(format!(
            "Connection timeout ({:?})",
            timeouts.connection_timeout
        ))),
    }
}

/// Spread keep-alive pings of different engines over `base` +/- 20%.
///
/// The offset is derived from `key`, so one engine keeps a steady cadence.
/// Intervals too long for whole milliseconds saturate instead of wrapping.
pub(crate) fn jitter_keepalive_interval(base: Duration, key: &str) -> Duration {
    let base_ms = u64::try_from(base.as_millis()).unwrap_or(u64::MAX);
    let span = base_ms / 5;
    if span == 0 {
        return base;
    }

    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    // Position inside [base - span, base + span].
    let position = hasher.finish() % (2 * span + 1);
    Duration::from_millis((base_ms - span).saturating_add(position))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_ws_url_maps_scheme_and_path() {
        assert_eq!(resolve_ws_url("http://localhost:8000").unwrap(), "ws://localhost:8000/rpc");
        assert_eq!(resolve_ws_url("https://db.example.com/").unwrap(), "wss://db.example.com/rpc");
        assert_eq!(resolve_ws_url("ws://127.0.0.1:8000/rpc").unwrap(), "ws://127.0.0.1:8000/rpc");
        assert_eq!(
            resolve_ws_url("wss://proxy.example.com/surreal/rpc").unwrap(),
            "wss://proxy.example.com/surreal/rpc"
        );
    }

    #[test]
    fn test_resolve_ws_url_rejects_bad_input() {
        assert!(matches!(
            resolve_ws_url("not a url"),
            Err(SurrealLinkError::ConfigurationError(_))
        ));
        assert!(resolve_ws_url("ftp://localhost").is_err());
        assert!(resolve_ws_url("ws://root:root@localhost:8000").is_err());
    }

    #[test]
    fn test_jitter_stays_within_twenty_percent() {
        let base = Duration::from_secs(30);
        for key in ["a1b2c3d4", "00000000", "ffffffff", "deadbeef"] {
            let jittered = jitter_keepalive_interval(base, key);
            assert!(jittered >= Duration::from_secs(24), "{:?}", jittered);
            assert!(jittered <= Duration::from_secs(36), "{:?}", jittered);
            assert_eq!(jittered, jitter_keepalive_interval(base, key));
        }
        assert_eq!(jitter_keepalive_interval(Duration::ZERO, "x"), Duration::ZERO);
        assert_eq!(
            jitter_keepalive_interval(Duration::from_millis(4), "x"),
            Duration::from_millis(4)
        );
    }

    #[test]
    fn test_jitter_saturates_for_huge_intervals() {
        let huge = jitter_keepalive_interval(Duration::MAX, "a1b2c3d4");
        let floor = Duration::from_millis(u64::MAX - u64::MAX / 5);
        assert!(huge >= floor, "{:?}", huge);
    }
}
