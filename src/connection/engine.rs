//! WebSocket engine: connection lifecycle manager and request sender.
//!
//! One engine owns at most one socket at a time and multiplexes every caller
//! over it:
//!
//! - Single-flight connect behind an async gate, with the "already started"
//!   check repeated inside the gate
//! - Post-connect setup replay (`use`, `signin`/`authenticate`, `version`
//!   check for binary encoding)
//! - Request/reply correlation through the shared [`PendingRequests`]
//! - Live-query fan-out through the shared [`LiveQueryRegistry`]
//! - Keep-alive pings while initialized
//! - Idempotent, exhaustive disposal
//!
//! Phases: `Idle -> Connecting -> Connected -> Initialized -> Disposed`. A
//! failed connect attempt returns to `Idle`; `Disposed` is terminal.

use crate::{
    auth::{AuthProvider, Credentials},
    codec,
    connection::{
        dispatch::{self, DispatchContext},
        id_gen::EngineId,
        keepalive,
        live_registry::{LiveQueryRegistry, LiveStream},
        pending::{PendingRequests, ReplyReceiver},
        websocket::{self, WsWriter},
        FAR_FUTURE,
    },
    error::{Result, SurrealLinkError},
    event_handlers::{ConnectionError, DisconnectReason, EventHandlers},
    models::{
        ClosureReason, ConnectionOptions, Encoding, QueryResult, RpcRequest, ServerVersion,
        MIN_BINARY_PROTOCOL_VERSION,
    },
    timeouts::SurrealLinkTimeouts,
};
use futures_util::{future::join_all, SinkExt, StreamExt};
use log::{debug, info, warn};
use parking_lot::Mutex;
use serde_json::{json, Value as JsonValue};
use std::{
    future::Future,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Where an engine is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionPhase {
    /// No socket; the next call connects
    Idle,
    /// A connect attempt holds the gate
    Connecting,
    /// Socket open, setup replay in progress
    Connected,
    /// Setup complete, ready for any request
    Initialized,
    /// Terminal
    Disposed,
}

/// Session state replayed after every connect.
#[derive(Debug, Clone, Default)]
struct Session {
    namespace: Option<String>,
    database: Option<String>,
    auth: AuthProvider,
    /// Token returned by the last successful `signin`/`signup`/`authenticate`
    token: Option<String>,
}

pub struct WsEngine {
    id: EngineId,
    url: String,
    options: ConnectionOptions,
    timeouts: SurrealLinkTimeouts,
    handlers: EventHandlers,
    session: Mutex<Session>,
    phase: Mutex<ConnectionPhase>,
    /// Bumped on every connect attempt so a stale reader cannot tear down a newer socket.
    generation: AtomicU64,
    connect_gate: Arc<tokio::sync::Mutex<()>>,
    writer: tokio::sync::Mutex<Option<WsWriter>>,
    reader: Mutex<Option<JoinHandle<()>>>,
    keepalive: Mutex<Option<CancellationToken>>,
    /// Cancelled by `shutdown`; aborts an in-flight connect attempt.
    closing: CancellationToken,
    server_version: Mutex<Option<ServerVersion>>,
    pending: Arc<PendingRequests>,
    live: Arc<LiveQueryRegistry>,
}

impl WsEngine {
    /// Create an engine. Nothing is opened until the first request.
    pub fn new(
        endpoint: &str,
        options: ConnectionOptions,
        auth: AuthProvider,
        timeouts: SurrealLinkTimeouts,
        handlers: EventHandlers,
    ) -> Result<Arc<Self>> {
        let url = websocket::resolve_ws_url(endpoint)?;
        let session = Session {
            namespace: options.namespace.clone(),
            database: options.database.clone(),
            auth,
            token: None,
        };

        Ok(Arc::new(Self {
            id: EngineId::allocate(),
            url,
            options,
            timeouts,
            handlers,
            session: Mutex::new(session),
            phase: Mutex::new(ConnectionPhase::Idle),
            generation: AtomicU64::new(0),
            connect_gate: Arc::new(tokio::sync::Mutex::new(())),
            writer: tokio::sync::Mutex::new(None),
            reader: Mutex::new(None),
            keepalive: Mutex::new(None),
            closing: CancellationToken::new(),
            server_version: Mutex::new(None),
            pending: PendingRequests::global(),
            live: LiveQueryRegistry::global(),
        }))
    }

    // ==================== Accessors ====================

    pub fn id(&self) -> &EngineId {
        &self.id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn encoding(&self) -> Encoding {
        self.options.encoding
    }

    pub fn phase(&self) -> ConnectionPhase {
        *self.phase.lock()
    }

    /// True once setup has completed and until the engine is disposed.
    pub fn is_connected(&self) -> bool {
        self.phase() == ConnectionPhase::Initialized
    }

    pub fn is_disposed(&self) -> bool {
        self.phase() == ConnectionPhase::Disposed
    }

    /// Server version observed during setup (binary encoding only).
    pub fn server_version(&self) -> Option<ServerVersion> {
        *self.server_version.lock()
    }

    /// Token carried from the last successful authentication.
    pub fn token(&self) -> Option<String> {
        self.session.lock().token.clone()
    }

    /// Number of requests of this engine still waiting for a reply.
    pub fn pending_count(&self) -> usize {
        self.pending.owned_count(&self.id)
    }

    /// Ids of the live queries this engine currently has open locally.
    pub fn live_query_ids(&self) -> Vec<Uuid> {
        self.live.owned_ids(&self.id)
    }

    // ==================== Lifecycle ====================

    /// Make sure the socket is open (and, if `require_initialized`, that
    /// setup has completed), connecting if necessary.
    ///
    /// Concurrent first callers share one connect attempt. A failed attempt
    /// leaves the engine `Idle`, so the next call retries.
    pub async fn ensure_started(self: &Arc<Self>, require_initialized: bool) -> Result<()> {
        if self.is_started(require_initialized)? {
            return Ok(());
        }

        let gate = self.connect_gate.clone().lock_owned().await;
        if self.is_started(require_initialized)? {
            return Ok(());
        }

        // The attempt owns the gate and runs to completion even if this
        // caller is dropped, so the phase never stalls half-way.
        let engine = self.clone();
        let attempt = tokio::spawn(async move {
            let _gate = gate;
            let result = tokio::select! {
                result = engine.connect_and_initialize() => result,
                _ = engine.closing.cancelled() => Err(SurrealLinkError::Disposed),
            };
            if let Err(e) = &result {
                engine.abandon_attempt(e).await;
            }
            result
        });

        attempt.await.map_err(|e| {
            SurrealLinkError::ConnectionError(format!("Connect task failed: {}", e))
        })?
    }

    fn is_started(&self, require_initialized: bool) -> Result<bool> {
        match self.phase() {
            ConnectionPhase::Disposed => Err(SurrealLinkError::Disposed),
            ConnectionPhase::Initialized => Ok(true),
            ConnectionPhase::Connected => Ok(!require_initialized),
            ConnectionPhase::Idle | ConnectionPhase::Connecting => Ok(false),
        }
    }

    async fn connect_and_initialize(self: &Arc<Self>) -> Result<()> {
        {
            let mut phase = self.phase.lock();
            if *phase == ConnectionPhase::Disposed {
                return Err(SurrealLinkError::Disposed);
            }
            *phase = ConnectionPhase::Connecting;
        }
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        info!(
            "[surreal-link] Engine {} connecting to {} (encoding={})",
            self.id, self.url, self.options.encoding
        );
        let stream =
            websocket::open_socket(&self.url, self.options.encoding, &self.timeouts).await?;
        let (writer, reader) = stream.split();
        *self.writer.lock().await = Some(writer);

        let context = DispatchContext {
            engine: Arc::downgrade(self),
            owner: self.id.clone(),
            generation,
            encoding: self.options.encoding,
            pending: self.pending.clone(),
            live: self.live.clone(),
            handlers: self.handlers.clone(),
        };
        let task = tokio::spawn(dispatch::run_dispatch_loop(context, reader));
        *self.reader.lock() = Some(task);

        self.advance(ConnectionPhase::Connecting, ConnectionPhase::Connected)?;

        self.replay_session().await?;
        if self.options.encoding.is_binary() {
            self.check_binary_support().await?;
        }
        self.start_keepalive();

        self.advance(ConnectionPhase::Connected, ConnectionPhase::Initialized)?;
        info!("[surreal-link] Engine {} ready", self.id);
        self.handlers.emit_connect(&self.id);
        Ok(())
    }

    /// Move from `from` to `to`; anything else means dispose won the race.
    fn advance(&self, from: ConnectionPhase, to: ConnectionPhase) -> Result<()> {
        let mut phase = self.phase.lock();
        if *phase == from {
            *phase = to;
            Ok(())
        } else {
            Err(SurrealLinkError::Disposed)
        }
    }

    async fn replay_session(&self) -> Result<()> {
        let session = self.session.lock().clone();

        if session.namespace.is_some() || session.database.is_some() {
            let params = vec![json!(session.namespace), json!(session.database)];
            self.send_raw("use", params, None, self.timeouts.receive_timeout)
                .await
                .map_err(|e| setup_failure("use", e))?;
        }

        match session.auth {
            AuthProvider::None => {},
            AuthProvider::Token(token) => {
                self.send_raw(
                    "authenticate",
                    vec![json!(token)],
                    None,
                    self.timeouts.receive_timeout,
                )
                .await
                .map_err(|e| setup_failure("authenticate", e))?;
                self.session.lock().token = Some(token);
            },
            AuthProvider::Credentials(credentials) => {
                let reply = self
                    .send_raw(
                        "signin",
                        vec![credentials.to_value()],
                        None,
                        self.timeouts.receive_timeout,
                    )
                    .await
                    .map_err(|e| setup_failure("signin", e))?;
                if let JsonValue::String(token) = reply {
                    self.session.lock().token = Some(token);
                }
            },
        }

        Ok(())
    }

    async fn check_binary_support(&self) -> Result<()> {
        let reply = self
            .send_raw("version", Vec::new(), None, self.timeouts.receive_timeout)
            .await
            .map_err(|e| setup_failure("version", e))?;

        let version = reply.as_str().and_then(ServerVersion::parse).ok_or_else(|| {
            SurrealLinkError::ConnectionError(format!("Unexpected `version` reply: {}", reply))
        })?;
        *self.server_version.lock() = Some(version);

        if version < MIN_BINARY_PROTOCOL_VERSION {
            return Err(SurrealLinkError::IncompatibleVersion {
                required: MIN_BINARY_PROTOCOL_VERSION.to_string(),
                actual: version.to_string(),
            });
        }
        debug!(
            "[surreal-link] Server {} supports {} encoding",
            version, self.options.encoding
        );
        Ok(())
    }

    /// Undo a failed connect attempt so the next call starts from `Idle`.
    async fn abandon_attempt(&self, err: &SurrealLinkError) {
        if !err.is_disposed() {
            warn!("[surreal-link] Engine {} connect attempt failed: {}", self.id, err);
            self.handlers
                .emit_error(ConnectionError::connect_failed(&self.id, self.phase(), err));
        }

        self.stop_keepalive();
        self.generation.fetch_add(1, Ordering::SeqCst);
        let reader = self.reader.lock().take();
        if let Some(task) = reader {
            task.abort();
        }
        let writer = self.writer.lock().await.take();
        if let Some(mut writer) = writer {
            let _ = bounded(self.timeouts.close_timeout, writer.close()).await;
        }
        self.pending.fail_all_owned_by(
            &self.id,
            SurrealLinkError::ConnectionClosed("connect attempt failed".to_string()),
        );

        let mut phase = self.phase.lock();
        if *phase != ConnectionPhase::Disposed {
            *phase = ConnectionPhase::Idle;
        }
    }

    fn start_keepalive(self: &Arc<Self>) {
        if SurrealLinkTimeouts::is_no_timeout(self.timeouts.keepalive_interval) {
            return;
        }

        let period =
            websocket::jitter_keepalive_interval(self.timeouts.keepalive_interval, self.id.as_str());
        let token = CancellationToken::new();
        keepalive::spawn_keepalive(Arc::downgrade(self), period, token.clone());

        if let Some(previous) = self.keepalive.lock().replace(token) {
            previous.cancel();
        }
    }

    fn stop_keepalive(&self) {
        let token = self.keepalive.lock().take();
        if let Some(token) = token {
            token.cancel();
        }
    }

    /// Tear the engine down. Idempotent; never fails.
    ///
    /// Closes every live query of this engine with
    /// [`ClosureReason::SocketClosed`] (best-effort `kill` on the server),
    /// closes the socket and fails every pending request with
    /// [`SurrealLinkError::Disposed`]. Later calls never reconnect.
    pub async fn dispose(&self) {
        self.shutdown(DisconnectReason::client(&self.id), false).await;
    }

    /// Called by the dispatch loop when its socket ends.
    pub(crate) async fn handle_socket_lost(&self, generation: u64, reason: DisconnectReason) {
        if self.generation.load(Ordering::SeqCst) != generation {
            return;
        }

        match self.phase() {
            ConnectionPhase::Initialized => {
                warn!("[surreal-link] Engine {} lost its socket: {}", self.id, reason.message);
                self.handlers.emit_error(ConnectionError::socket_lost(&self.id, &reason));
                self.shutdown(reason, true).await;
            },
            ConnectionPhase::Connecting | ConnectionPhase::Connected => {
                // Setup requests fail; the connect attempt unwinds and stays retryable.
                self.pending.fail_all_owned_by(
                    &self.id,
                    SurrealLinkError::ConnectionClosed(reason.message.clone()),
                );
            },
            ConnectionPhase::Idle | ConnectionPhase::Disposed => {},
        }
    }

    async fn shutdown(&self, reason: DisconnectReason, socket_lost: bool) {
        let previous = std::mem::replace(&mut *self.phase.lock(), ConnectionPhase::Disposed);
        if previous == ConnectionPhase::Disposed {
            return;
        }

        info!("[surreal-link] Disposing engine {} ({})", self.id, reason.message);
        self.closing.cancel();
        self.stop_keepalive();

        let closed = self.live.close_all_owned_by(&self.id, ClosureReason::SocketClosed);
        if !socket_lost && !closed.is_empty() {
            let kills = closed.iter().map(|live_id| {
                self.send_raw(
                    "kill",
                    vec![json!(live_id.to_string())],
                    None,
                    self.timeouts.close_timeout,
                )
            });
            for (live_id, result) in closed.iter().zip(join_all(kills).await) {
                if let Err(e) = result {
                    debug!("[surreal-link] Best-effort kill of {} failed: {}", live_id, e);
                }
            }
        }

        let writer = self.writer.lock().await.take();
        if let Some(mut writer) = writer {
            match bounded(self.timeouts.close_timeout, writer.close()).await {
                Some(Ok(())) => {},
                Some(Err(e)) => debug!("[surreal-link] Close handshake failed: {}", e),
                None => debug!("[surreal-link] Close handshake timed out"),
            }
        }

        let reader = self.reader.lock().take();
        if let Some(task) = reader {
            // When the reader itself reported the loss it is already exiting.
            if !socket_lost {
                task.abort();
            }
        }

        let cancelled = self.pending.cancel_all_owned_by(&self.id);
        info!(
            "[surreal-link] Engine {} disposed ({} live quer{} closed, {} request(s) cancelled)",
            self.id,
            closed.len(),
            if closed.len() == 1 { "y" } else { "ies" },
            cancelled
        );

        if previous != ConnectionPhase::Idle {
            self.handlers.emit_disconnect(reason);
        }
    }

    // ==================== Requests ====================

    /// Send one request and wait for its reply.
    ///
    /// `cancel` abandons only this caller's wait, including a wait on the
    /// connect attempt; the shared registries, the socket and the attempt
    /// itself are left untouched.
    pub async fn send(
        self: &Arc<Self>,
        method: &str,
        params: Vec<JsonValue>,
        require_initialized: bool,
        cancel: Option<&CancellationToken>,
    ) -> Result<JsonValue> {
        match cancel {
            Some(token) if token.is_cancelled() => return Err(SurrealLinkError::Cancelled),
            Some(token) => tokio::select! {
                started = self.ensure_started(require_initialized) => started?,
                _ = token.cancelled() => return Err(SurrealLinkError::Cancelled),
            },
            None => self.ensure_started(require_initialized).await?,
        }
        self.send_raw(method, params, cancel, self.timeouts.receive_timeout).await
    }

    /// Register, write and await, without touching the lifecycle.
    async fn send_raw(
        &self,
        method: &str,
        params: Vec<JsonValue>,
        cancel: Option<&CancellationToken>,
        reply_timeout: Duration,
    ) -> Result<JsonValue> {
        let (id, rx) = self.pending.register(&self.id);
        let request = RpcRequest::new(id.clone(), method, params);

        if let Err(e) = self.write_request(&request).await {
            self.pending.resolve_failure(&self.id, &id, e.clone());
            return Err(e);
        }

        self.await_reply(&request, rx, cancel, reply_timeout).await
    }

    async fn write_request(&self, request: &RpcRequest) -> Result<()> {
        let frame = codec::encode_request(self.options.encoding, request)?;
        if self.handlers.wants_send() {
            if let Ok(raw) = serde_json::to_string(request) {
                self.handlers.emit_send(&raw);
            }
        }

        let mut guard = self.writer.lock().await;
        let writer = guard.as_mut().ok_or_else(|| {
            SurrealLinkError::WebSocketError("WebSocket is not open".to_string())
        })?;

        match bounded(self.timeouts.send_timeout, writer.send(frame)).await {
            Some(Ok(())) => Ok(()),
            Some(Err(e)) => Err(SurrealLinkError::WebSocketError(format!(
                "Failed to send `{}`: {}",
                request.method, e
            ))),
            None => Err(SurrealLinkError::TimeoutError(format!(
                "Sending `{}` took longer than {:?}",
                request.method, self.timeouts.send_timeout
            ))),
        }
    }

    async fn await_reply(
        &self,
        request: &RpcRequest,
        rx: ReplyReceiver,
        cancel: Option<&CancellationToken>,
        reply_timeout: Duration,
    ) -> Result<JsonValue> {
        let limit = if SurrealLinkTimeouts::is_no_timeout(reply_timeout) {
            FAR_FUTURE
        } else {
            reply_timeout
        };
        let deadline = tokio::time::sleep(limit);
        tokio::pin!(deadline);

        let cancelled = async {
            match cancel {
                Some(token) => token.cancelled().await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            reply = rx => reply.unwrap_or_else(|_| {
                Err(SurrealLinkError::ConnectionClosed("reply slot dropped".to_string()))
            }),
            _ = cancelled => {
                self.pending.forget(&self.id, &request.id);
                Err(SurrealLinkError::Cancelled)
            },
            _ = &mut deadline => {
                self.pending.forget(&self.id, &request.id);
                Err(SurrealLinkError::TimeoutError(format!(
                    "No reply to `{}` within {:?}",
                    request.method, reply_timeout
                )))
            },
        }
    }

    // ==================== Session ====================

    /// Switch namespace and/or database; remembered for later connects.
    pub async fn use_ns(self: &Arc<Self>, ns: Option<String>, db: Option<String>) -> Result<()> {
        self.send("use", vec![json!(ns), json!(db)], true, None).await?;

        let mut session = self.session.lock();
        if ns.is_some() {
            session.namespace = ns;
        }
        if db.is_some() {
            session.database = db;
        }
        Ok(())
    }

    /// Sign in; the credentials replace the configured auth.
    pub async fn signin(self: &Arc<Self>, credentials: Credentials) -> Result<JsonValue> {
        let reply = self.send("signin", vec![credentials.to_value()], true, None).await?;

        let mut session = self.session.lock();
        session.token = reply.as_str().map(str::to_string);
        session.auth = AuthProvider::Credentials(credentials);
        Ok(reply)
    }

    /// Sign up a record user; the returned token becomes the configured auth.
    pub async fn signup(self: &Arc<Self>, credentials: Credentials) -> Result<JsonValue> {
        let reply = self.send("signup", vec![credentials.to_value()], true, None).await?;

        if let Some(token) = reply.as_str() {
            let mut session = self.session.lock();
            session.token = Some(token.to_string());
            session.auth = AuthProvider::Token(token.to_string());
        }
        Ok(reply)
    }

    pub async fn authenticate(self: &Arc<Self>, token: &str) -> Result<()> {
        self.send("authenticate", vec![json!(token)], true, None).await?;

        let mut session = self.session.lock();
        session.token = Some(token.to_string());
        session.auth = AuthProvider::Token(token.to_string());
        Ok(())
    }

    /// Drop the authenticated session.
    pub async fn invalidate(self: &Arc<Self>) -> Result<()> {
        self.send("invalidate", Vec::new(), true, None).await?;

        let mut session = self.session.lock();
        session.token = None;
        session.auth = AuthProvider::None;
        Ok(())
    }

    // ==================== Live Queries ====================

    /// Start a live query on a whole table.
    pub async fn live_table(self: &Arc<Self>, table: &str, diff: bool) -> Result<Uuid> {
        let reply = self.send("live", vec![json!(table), json!(diff)], true, None).await?;
        let id = parse_live_id(&reply)?;
        self.live.ensure(id, &self.id);
        Ok(id)
    }

    /// Start a live query from a `LIVE SELECT` statement.
    pub async fn live_query(self: &Arc<Self>, sql: &str, vars: Option<JsonValue>) -> Result<Uuid> {
        let reply = self.send("query", query_params(sql, vars), true, None).await?;
        let results: Vec<QueryResult> = serde_json::from_value(reply)?;
        let first = results.into_iter().next().ok_or_else(|| {
            SurrealLinkError::QueryError("LIVE SELECT returned no statement result".to_string())
        })?;

        let id = parse_live_id(&first.into_result()?)?;
        self.live.ensure(id, &self.id);
        Ok(id)
    }

    /// Attach a new sink to `id`, creating the fan-out group if needed.
    ///
    /// Works for ids learned outside [`live_table`](Self::live_table) /
    /// [`live_query`](Self::live_query), and may be called any number of
    /// times for the same id.
    pub fn listen(&self, id: Uuid) -> Result<LiveStream> {
        if self.is_disposed() {
            return Err(SurrealLinkError::Disposed);
        }
        self.live.ensure(id, &self.id);
        self.live.add_sink(id, &self.id, self.options.event_channel_capacity)
    }

    /// Attach a new sink to an existing group only.
    pub fn attach(&self, id: Uuid) -> Result<LiveStream> {
        if self.is_disposed() {
            return Err(SurrealLinkError::Disposed);
        }
        self.live.add_sink(id, &self.id, self.options.event_channel_capacity)
    }

    /// Close every sink of `id` with `reason`, then kill it on the server.
    pub async fn kill(self: &Arc<Self>, id: Uuid, reason: ClosureReason) -> Result<()> {
        self.live.close(&self.id, id, reason);
        self.send("kill", vec![json!(id.to_string())], true, None).await?;
        Ok(())
    }
}

impl Drop for WsEngine {
    fn drop(&mut self) {
        if let Some(token) = self.keepalive.get_mut().take() {
            token.cancel();
        }
        self.live.close_all_owned_by(&self.id, ClosureReason::SocketClosed);
        if let Some(task) = self.reader.get_mut().take() {
            task.abort();
        }
        self.pending.cancel_all_owned_by(&self.id);
        self.id.release();
    }
}

impl std::fmt::Debug for WsEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsEngine")
            .field("id", &self.id)
            .field("url", &self.url)
            .field("encoding", &self.options.encoding)
            .field("phase", &self.phase())
            .finish()
    }
}

/// Parameters of a `query` request.
pub(crate) fn query_params(sql: &str, vars: Option<JsonValue>) -> Vec<JsonValue> {
    let mut params = vec![json!(sql)];
    if let Some(vars) = vars {
        params.push(vars);
    }
    params
}

fn parse_live_id(value: &JsonValue) -> Result<Uuid> {
    value
        .as_str()
        .and_then(|raw| Uuid::parse_str(raw).ok())
        .ok_or_else(|| {
            SurrealLinkError::SerializationError(format!("Expected a live query id, got {}", value))
        })
}

fn setup_failure(step: &str, err: SurrealLinkError) -> SurrealLinkError {
    match err {
        SurrealLinkError::Disposed => err,
        other => SurrealLinkError::ConnectionError(format!("`{}` failed during connect: {}", step, other)),
    }
}

/// Await `fut` for at most `limit`; zero or huge limits wait forever.
async fn bounded<F: Future>(limit: Duration, fut: F) -> Option<F::Output> {
    if SurrealLinkTimeouts::is_no_timeout(limit) {
        Some(fut.await)
    } else {
        tokio::time::timeout(limit, fut).await.ok()
    }
}
