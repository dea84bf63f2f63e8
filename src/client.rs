//! Main surreal-link client with builder pattern.
//!
//! A thin facade over one [`WsEngine`]: every method is a single RPC call
//! through the multiplexed connection, which is opened lazily by the first
//! call (or explicitly with [`SurrealLinkClient::connect`]).

use crate::{
    auth::{AuthProvider, Credentials},
    connection::{
        engine::{query_params, ConnectionPhase, WsEngine},
        live_registry::LiveStream,
    },
    error::{Result, SurrealLinkError},
    event_handlers::EventHandlers,
    live::LiveQuery,
    models::{ClosureReason, ConnectionOptions, Encoding, QueryResult, ServerVersion},
    timeouts::SurrealLinkTimeouts,
};
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Main surreal-link client.
///
/// Cheap to clone; all clones share one connection. Dropping the last clone
/// tears the connection down. Use [`SurrealLinkClientBuilder`] to construct
/// instances.
///
/// # Examples
///
/// ```rust,no_run
/// use surreal_link::{AuthProvider, SurrealLinkClient};
///
/// # async fn example() -> surreal_link::Result<()> {
/// let client = SurrealLinkClient::builder()
///     .url("ws://localhost:8000")
///     .namespace("test")
///     .database("test")
///     .auth(AuthProvider::root("root", "root"))
///     .build()?;
///
/// let results = client.query("SELECT * FROM person", None).await?;
/// println!("Result: {:?}", results);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct SurrealLinkClient {
    engine: Arc<WsEngine>,
}

impl SurrealLinkClient {
    /// Create a new builder for configuring the client
    pub fn builder() -> SurrealLinkClientBuilder {
        SurrealLinkClientBuilder::new()
    }

    // ==================== Connection ====================

    /// Open the connection and run setup now instead of on first use.
    pub async fn connect(&self) -> Result<()> {
        self.engine.ensure_started(true).await
    }

    /// Dispose the connection. Pending requests fail, live queries close
    /// with [`ClosureReason::SocketClosed`], and the client cannot reconnect.
    pub async fn disconnect(&self) {
        self.engine.dispose().await;
    }

    pub fn is_connected(&self) -> bool {
        self.engine.is_connected()
    }

    pub fn phase(&self) -> ConnectionPhase {
        self.engine.phase()
    }

    pub fn encoding(&self) -> Encoding {
        self.engine.encoding()
    }

    /// Token from the last successful authentication, if any.
    pub fn token(&self) -> Option<String> {
        self.engine.token()
    }

    /// Server version checked during setup (binary encoding only).
    pub fn server_version(&self) -> Option<ServerVersion> {
        self.engine.server_version()
    }

    /// Returns false if the server does not answer a `ping`.
    pub async fn health(&self) -> bool {
        self.engine.send("ping", Vec::new(), true, None).await.is_ok()
    }

    pub async fn version(&self) -> Result<String> {
        let reply = self.engine.send("version", Vec::new(), true, None).await?;
        match reply {
            JsonValue::String(version) => Ok(version),
            other => Err(SurrealLinkError::SerializationError(format!(
                "Expected a version string, got {}",
                other
            ))),
        }
    }

    // ==================== Session ====================

    pub async fn use_ns(&self, ns: impl Into<String>, db: impl Into<String>) -> Result<()> {
        self.engine.use_ns(Some(ns.into()), Some(db.into())).await
    }

    /// Sign in. Returns the server reply (a token for scoped users).
    pub async fn signin(&self, credentials: Credentials) -> Result<JsonValue> {
        self.engine.signin(credentials).await
    }

    pub async fn signup(&self, credentials: Credentials) -> Result<JsonValue> {
        self.engine.signup(credentials).await
    }

    pub async fn authenticate(&self, token: &str) -> Result<()> {
        self.engine.authenticate(token).await
    }

    pub async fn invalidate(&self) -> Result<()> {
        self.engine.invalidate().await
    }

    /// Define a connection-wide parameter (`$key`).
    pub async fn set(&self, key: &str, value: JsonValue) -> Result<()> {
        self.engine.send("let", vec![json!(key), value], true, None).await?;
        Ok(())
    }

    pub async fn unset(&self, key: &str) -> Result<()> {
        self.engine.send("unset", vec![json!(key)], true, None).await?;
        Ok(())
    }

    /// Details of the authenticated record user.
    pub async fn info(&self) -> Result<JsonValue> {
        self.engine.send("info", Vec::new(), true, None).await
    }

    // ==================== Queries ====================

    /// Run one or more statements. One [`QueryResult`] per statement.
    pub async fn query(&self, sql: &str, vars: Option<JsonValue>) -> Result<Vec<QueryResult>> {
        let reply = self.engine.send("query", query_params(sql, vars), true, None).await?;
        Ok(serde_json::from_value(reply)?)
    }

    /// `thing` is a table (`person`) or a record id (`person:tobie`).
    pub async fn select(&self, thing: &str) -> Result<JsonValue> {
        self.engine.send("select", vec![json!(thing)], true, None).await
    }

    pub async fn create(&self, thing: &str, data: Option<JsonValue>) -> Result<JsonValue> {
        self.engine.send("create", thing_params(thing, data), true, None).await
    }

    /// Replace the content of `thing`.
    pub async fn update(&self, thing: &str, data: Option<JsonValue>) -> Result<JsonValue> {
        self.engine.send("update", thing_params(thing, data), true, None).await
    }

    /// Merge `data` into `thing`.
    pub async fn merge(&self, thing: &str, data: JsonValue) -> Result<JsonValue> {
        self.engine.send("merge", vec![json!(thing), data], true, None).await
    }

    pub async fn delete(&self, thing: &str) -> Result<JsonValue> {
        self.engine.send("delete", vec![json!(thing)], true, None).await
    }

    /// Send an arbitrary RPC method.
    pub async fn send(&self, method: &str, params: Vec<JsonValue>) -> Result<JsonValue> {
        self.engine.send(method, params, true, None).await
    }

    /// Send an arbitrary RPC method; cancelling `token` abandons the wait
    /// with [`SurrealLinkError::Cancelled`].
    pub async fn send_with_cancel(
        &self,
        method: &str,
        params: Vec<JsonValue>,
        token: &CancellationToken,
    ) -> Result<JsonValue> {
        self.engine.send(method, params, true, Some(token)).await
    }

    // ==================== Live Queries ====================

    /// Start a live query on a table. With `diff`, updates carry patches.
    pub async fn live_table(&self, table: &str, diff: bool) -> Result<LiveQuery> {
        let id = self.engine.live_table(table, diff).await?;
        Ok(LiveQuery::new(id, &self.engine))
    }

    /// Start a live query from a `LIVE SELECT ...` statement.
    pub async fn live_query(&self, sql: &str, vars: Option<JsonValue>) -> Result<LiveQuery> {
        let id = self.engine.live_query(sql, vars).await?;
        Ok(LiveQuery::new(id, &self.engine))
    }

    /// Attach a consumer to a live query id, which may have been obtained
    /// elsewhere (for example from a raw `query`).
    pub fn listen(&self, id: Uuid) -> Result<LiveStream> {
        self.engine.listen(id)
    }

    /// Kill a live query; its consumers close with [`ClosureReason::QueryKilled`].
    pub async fn kill(&self, id: Uuid) -> Result<()> {
        self.engine.kill(id, ClosureReason::QueryKilled).await
    }
}

fn thing_params(thing: &str, data: Option<JsonValue>) -> Vec<JsonValue> {
    let mut params = vec![json!(thing)];
    if let Some(data) = data {
        params.push(data);
    }
    params
}

/// Builder for configuring [`SurrealLinkClient`] instances.
#[derive(Debug, Default)]
pub struct SurrealLinkClientBuilder {
    url: Option<String>,
    auth: AuthProvider,
    timeouts: SurrealLinkTimeouts,
    connection_options: ConnectionOptions,
    event_handlers: EventHandlers,
}

impl SurrealLinkClientBuilder {
    fn new() -> Self {
        Self::default()
    }

    /// Server endpoint: `ws://`, `wss://`, `http://` or `https://`.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Namespace selected after every connect.
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.connection_options.namespace = Some(namespace.into());
        self
    }

    /// Database selected after every connect.
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.connection_options.database = Some(database.into());
        self
    }

    /// Credentials replayed after every connect.
    pub fn auth(mut self, auth: AuthProvider) -> Self {
        self.auth = auth;
        self
    }

    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.connection_options.encoding = encoding;
        self
    }

    pub fn timeouts(mut self, timeouts: SurrealLinkTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Replace all connection options. Call before
    /// [`namespace`](Self::namespace) / [`database`](Self::database) /
    /// [`encoding`](Self::encoding), which write into them.
    pub fn connection_options(mut self, options: ConnectionOptions) -> Self {
        self.connection_options = options;
        self
    }

    pub fn event_handlers(mut self, handlers: EventHandlers) -> Self {
        self.event_handlers = handlers;
        self
    }

    /// Build the client. No connection is opened yet.
    pub fn build(self) -> Result<SurrealLinkClient> {
        let url = self
            .url
            .ok_or_else(|| SurrealLinkError::ConfigurationError("url is required".into()))?;

        let engine = WsEngine::new(
            &url,
            self.connection_options,
            self.auth,
            self.timeouts,
            self.event_handlers,
        )?;

        Ok(SurrealLinkClient { engine })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_pattern() {
        let client = SurrealLinkClient::builder()
            .url("http://localhost:8000")
            .namespace("test")
            .database("test")
            .auth(AuthProvider::root("root", "root"))
            .encoding(Encoding::MessagePack)
            .timeouts(SurrealLinkTimeouts::fast())
            .build()
            .unwrap();

        assert_eq!(client.encoding(), Encoding::MessagePack);
        assert_eq!(client.phase(), ConnectionPhase::Idle);
        assert!(!client.is_connected());
    }

    #[test]
    fn test_builder_missing_url() {
        let result = SurrealLinkClient::builder().build();
        assert!(matches!(result, Err(SurrealLinkError::ConfigurationError(_))));
    }

    #[test]
    fn test_thing_params() {
        assert_eq!(thing_params("person", None), vec![json!("person")]);
        assert_eq!(
            thing_params("person:1", Some(json!({ "name": "A" }))),
            vec![json!("person:1"), json!({ "name": "A" })]
        );
    }
}
