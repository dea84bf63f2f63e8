//! In-process mock RPC server for integration tests.
//!
//! Speaks the same request/response envelope as a real server over
//! WebSocket, in JSON text frames or MessagePack binary frames depending on
//! the negotiated subprotocol. Live queries are tracked per connection and
//! `create`/`update`/`delete` push notifications to every matching live
//! query before replying, so a client sees the events before the reply.

#![allow(dead_code)]

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{json, Value as JsonValue};
use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};
use surreal_link::{
    AuthProvider, ConnectionOptions, Encoding, EventHandlers, SurrealLinkClient,
    SurrealLinkTimeouts,
};
use tokio::{
    net::{TcpListener, TcpStream},
    sync::mpsc,
    task::JoinHandle,
};
use tokio_tungstenite::tungstenite::{
    handshake::server::{ErrorResponse, Request, Response},
    http::header::SEC_WEBSOCKET_PROTOCOL,
    protocol::Message,
};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

pub const MOCK_TOKEN: &str = "mock-token";

#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Reply to the `version` method
    pub version: String,
    /// Number of `use` requests rejected before they start succeeding
    pub fail_use_times: usize,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            version: "surrealdb-2.0.0".to_string(),
            fail_use_times: 0,
        }
    }
}

struct LiveEntry {
    table: String,
    connection: usize,
}

struct Connection {
    outbound: mpsc::UnboundedSender<Message>,
    binary: bool,
    token: CancellationToken,
}

#[derive(Default)]
struct MockState {
    accepted: AtomicUsize,
    fail_use_remaining: AtomicUsize,
    version: Mutex<String>,
    connections: Mutex<HashMap<usize, Connection>>,
    live: Mutex<HashMap<Uuid, LiveEntry>>,
    calls: Mutex<Vec<(String, Vec<JsonValue>)>>,
}

pub struct MockServer {
    addr: SocketAddr,
    state: Arc<MockState>,
    task: JoinHandle<()>,
}

impl MockServer {
    pub async fn start() -> Self {
        Self::start_with(MockConfig::default()).await
    }

    pub async fn start_with(config: MockConfig) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock server");
        let addr = listener.local_addr().expect("mock server address");

        let state = Arc::new(MockState::default());
        state.fail_use_remaining.store(config.fail_use_times, Ordering::SeqCst);
        *state.version.lock() = config.version;

        let accept_state = state.clone();
        let task = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let state = accept_state.clone();
                tokio::spawn(serve_connection(state, stream));
            }
        });

        Self { addr, state, task }
    }

    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Number of WebSocket handshakes completed so far.
    pub fn accepted(&self) -> usize {
        self.state.accepted.load(Ordering::SeqCst)
    }

    /// Params of every request received with `method`, in arrival order.
    pub fn calls(&self, method: &str) -> Vec<Vec<JsonValue>> {
        self.state
            .calls
            .lock()
            .iter()
            .filter(|(name, _)| name == method)
            .map(|(_, params)| params.clone())
            .collect()
    }

    pub fn live_count(&self) -> usize {
        self.state.live.lock().len()
    }

    /// Send `value` to every open connection, encoded for that connection.
    pub fn push_raw(&self, value: JsonValue) {
        let connections = self.state.connections.lock();
        for connection in connections.values() {
            let _ = connection.outbound.send(encode(connection.binary, &value));
        }
    }

    /// Push a server-side `KILLED` notification for `id`.
    pub fn kill_from_server(&self, id: Uuid) {
        self.state.live.lock().remove(&id);
        self.push_raw(json!({
            "result": { "id": id.to_string(), "action": "KILLED", "result": null }
        }));
    }

    /// Abort every open connection without a close handshake.
    pub fn drop_connections(&self) {
        let connections = std::mem::take(&mut *self.state.connections.lock());
        for connection in connections.into_values() {
            connection.token.cancel();
        }
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.task.abort();
        self.drop_connections();
    }
}

async fn serve_connection(state: Arc<MockState>, stream: TcpStream) {
    let protocol: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));
    let negotiated = protocol.clone();
    let callback = move |request: &Request, mut response: Response| -> Result<Response, ErrorResponse> {
        if let Some(value) = request.headers().get(SEC_WEBSOCKET_PROTOCOL) {
            *negotiated.lock() = value.to_str().ok().map(str::to_string);
            response.headers_mut().insert(SEC_WEBSOCKET_PROTOCOL, value.clone());
        }
        Ok(response)
    };

    let mut ws = match tokio_tungstenite::accept_hdr_async(stream, callback).await {
        Ok(ws) => ws,
        Err(_) => return,
    };

    let binary = protocol.lock().as_deref() == Some("msgpack");
    let connection_id = state.accepted.fetch_add(1, Ordering::SeqCst);
    let (outbound, mut outbound_rx) = mpsc::unbounded_channel();
    let token = CancellationToken::new();
    state.connections.lock().insert(
        connection_id,
        Connection {
            outbound: outbound.clone(),
            binary,
            token: token.clone(),
        },
    );

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            Some(frame) = outbound_rx.recv() => {
                if ws.send(frame).await.is_err() {
                    break;
                }
            },
            inbound = ws.next() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    if let Ok(request) = serde_json::from_str::<JsonValue>(text.as_str()) {
                        handle_request(&state, connection_id, binary, &outbound, request);
                    }
                },
                Some(Ok(Message::Binary(data))) => {
                    if let Ok(request) = rmp_serde::from_slice::<JsonValue>(&data) {
                        handle_request(&state, connection_id, binary, &outbound, request);
                    }
                },
                Some(Ok(_)) => {},
                Some(Err(_)) | None => break,
            },
        }
    }

    state.connections.lock().remove(&connection_id);
    state.live.lock().retain(|_, entry| entry.connection != connection_id);
}

fn handle_request(
    state: &MockState,
    connection_id: usize,
    binary: bool,
    outbound: &mpsc::UnboundedSender<Message>,
    request: JsonValue,
) {
    let id = request.get("id").cloned().unwrap_or(JsonValue::Null);
    let method = request.get("method").and_then(JsonValue::as_str).unwrap_or_default().to_string();
    let params = match request.get("params") {
        Some(JsonValue::Array(params)) => params.clone(),
        _ => Vec::new(),
    };
    state.calls.lock().push((method.clone(), params.clone()));

    let reply = |outcome: Result<JsonValue, (i64, &str)>| {
        let envelope = match outcome {
            Ok(result) => json!({ "id": id, "result": result }),
            Err((code, message)) => json!({ "id": id, "error": { "code": code, "message": message } }),
        };
        let _ = outbound.send(encode(binary, &envelope));
    };

    match method.as_str() {
        "use" => {
            let rejected = state
                .fail_use_remaining
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if rejected {
                reply(Err((-32000, "namespace not available")));
            } else {
                reply(Ok(JsonValue::Null));
            }
        },
        "signin" | "signup" => reply(Ok(json!(MOCK_TOKEN))),
        "authenticate" | "invalidate" | "let" | "unset" | "ping" => reply(Ok(JsonValue::Null)),
        "version" => {
            let version = state.version.lock().clone();
            reply(Ok(json!(version)));
        },
        "live" => {
            let table = params.first().and_then(JsonValue::as_str).unwrap_or_default();
            let live_id = register_live(state, table, connection_id);
            reply(Ok(json!(live_id.to_string())));
        },
        "kill" => {
            let removed = params
                .first()
                .and_then(JsonValue::as_str)
                .and_then(|raw| Uuid::parse_str(raw).ok())
                .and_then(|live_id| state.live.lock().remove(&live_id));
            match removed {
                Some(_) => reply(Ok(JsonValue::Null)),
                None => reply(Err((-32000, "live query not found"))),
            }
        },
        "query" => {
            let sql = params.first().and_then(JsonValue::as_str).unwrap_or_default();
            let result = match live_select_table(sql) {
                Some(table) => json!(register_live(state, table, connection_id).to_string()),
                None => json!([]),
            };
            reply(Ok(json!([{ "status": "OK", "time": "1ms", "result": result }])));
        },
        "create" | "update" | "delete" => {
            let thing = params.first().and_then(JsonValue::as_str).unwrap_or_default();
            let table = thing.split(':').next().unwrap_or_default();
            let mut record = params.get(1).cloned().unwrap_or_else(|| json!({}));
            if let JsonValue::Object(fields) = &mut record {
                fields.insert("id".to_string(), json!(thing));
            }

            let action = method.to_uppercase();
            notify(state, table, &action, &record);
            reply(Ok(record));
        },
        "echo" => reply(Ok(JsonValue::Array(params))),
        "fail" => reply(Err((-32000, "forced failure"))),
        "slow" => {},
        _ => reply(Err((-32601, "Method not found"))),
    }
}

fn register_live(state: &MockState, table: &str, connection: usize) -> Uuid {
    let live_id = Uuid::new_v4();
    state.live.lock().insert(
        live_id,
        LiveEntry {
            table: table.to_string(),
            connection,
        },
    );
    live_id
}

fn notify(state: &MockState, table: &str, action: &str, record: &JsonValue) {
    let live = state.live.lock();
    let connections = state.connections.lock();
    for (live_id, entry) in live.iter() {
        if entry.table != table {
            continue;
        }
        if let Some(connection) = connections.get(&entry.connection) {
            let notification = json!({
                "result": { "id": live_id.to_string(), "action": action, "result": record }
            });
            let _ = connection.outbound.send(encode(connection.binary, &notification));
        }
    }
}

/// Table name of a `LIVE SELECT ... FROM <table>` statement.
fn live_select_table(sql: &str) -> Option<&str> {
    if !sql.trim_start().to_uppercase().starts_with("LIVE SELECT") {
        return None;
    }
    let upper = sql.to_uppercase();
    let from = upper.find(" FROM ")? + " FROM ".len();
    sql[from..].split_whitespace().next().map(|t| t.trim_end_matches(';'))
}

fn encode(binary: bool, value: &JsonValue) -> Message {
    if binary {
        let payload = rmp_serde::to_vec_named(value).expect("encode msgpack");
        Message::Binary(payload.into())
    } else {
        Message::Text(value.to_string().into())
    }
}

/// Accepts TCP connections but never answers the WebSocket upgrade, so a
/// client stays in its connect step until its connection timeout.
pub struct StalledServer {
    addr: SocketAddr,
    task: JoinHandle<()>,
}

impl StalledServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stalled server");
        let addr = listener.local_addr().expect("stalled server address");
        let task = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });
        Self { addr, task }
    }

    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }
}

impl Drop for StalledServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

// ==================== Client helpers ====================

pub fn client_for(server: &MockServer) -> SurrealLinkClient {
    client_with(server, ConnectionOptions::default(), AuthProvider::none())
}

pub fn client_with(
    server: &MockServer,
    options: ConnectionOptions,
    auth: AuthProvider,
) -> SurrealLinkClient {
    client_with_handlers(server, options, auth, EventHandlers::new())
}

pub fn client_with_handlers(
    server: &MockServer,
    options: ConnectionOptions,
    auth: AuthProvider,
    handlers: EventHandlers,
) -> SurrealLinkClient {
    SurrealLinkClient::builder()
        .url(server.url())
        .connection_options(options)
        .auth(auth)
        .timeouts(SurrealLinkTimeouts::fast())
        .event_handlers(handlers)
        .build()
        .expect("build client")
}

pub fn msgpack_options() -> ConnectionOptions {
    ConnectionOptions::default().with_encoding(Encoding::MessagePack)
}

/// Upper bound for any single await in these tests.
pub const STEP: Duration = Duration::from_secs(5);

/// Poll `condition` every 10ms until it holds or `STEP` elapses.
pub async fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + STEP;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
