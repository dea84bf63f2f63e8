//! Live-query handle and typed views over a live stream.

use crate::{
    connection::{engine::WsEngine, live_registry::LiveStream},
    error::{Result, SurrealLinkError},
    models::{ClosureReason, LiveEvent},
};
use futures_util::{future, Stream, StreamExt};
use serde_json::Value as JsonValue;
use std::sync::{Arc, Weak};
use uuid::Uuid;

/// A live query started through [`SurrealLinkClient`](crate::SurrealLinkClient).
///
/// The handle does not keep the connection alive. Each call to
/// [`stream`](Self::stream) attaches one more independent consumer.
///
/// # Example
///
/// ```rust,no_run
/// use surreal_link::{live, LiveEvent, SurrealLinkClient};
///
/// # async fn example() -> surreal_link::Result<()> {
/// let client = SurrealLinkClient::builder()
///     .url("ws://localhost:8000")
///     .namespace("test")
///     .database("test")
///     .build()?;
///
/// let query = client.live_table("person", false).await?;
/// let mut all = query.stream()?;
/// let created = live::creates(query.stream()?);
///
/// while let Some(event) = all.next().await {
///     if let LiveEvent::Closed(reason) = event {
///         println!("closed: {}", reason);
///     }
/// }
/// # drop(created);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct LiveQuery {
    id: Uuid,
    engine: Weak<WsEngine>,
}

impl LiveQuery {
    pub(crate) fn new(id: Uuid, engine: &Arc<WsEngine>) -> Self {
        Self {
            id,
            engine: Arc::downgrade(engine),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Attach a new consumer.
    ///
    /// Fails with [`SurrealLinkError::LiveQueryNotFound`] once the query has
    /// been killed or its connection disposed.
    pub fn stream(&self) -> Result<LiveStream> {
        self.engine()?.attach(self.id)
    }

    /// Kill the live query; every consumer receives
    /// [`LiveEvent::Closed`] with [`ClosureReason::QueryKilled`].
    pub async fn kill(&self) -> Result<()> {
        self.engine()?.kill(self.id, ClosureReason::QueryKilled).await
    }

    fn engine(&self) -> Result<Arc<WsEngine>> {
        self.engine.upgrade().ok_or(SurrealLinkError::Disposed)
    }
}

/// Records created, in order. Ends when the live query closes.
pub fn creates<S>(events: S) -> impl Stream<Item = JsonValue>
where
    S: Stream<Item = LiveEvent>,
{
    events.filter_map(|event| {
        future::ready(match event {
            LiveEvent::Create(record) => Some(record),
            _ => None,
        })
    })
}

/// Records updated (or diffs, for `DIFF` live queries), in order.
pub fn updates<S>(events: S) -> impl Stream<Item = JsonValue>
where
    S: Stream<Item = LiveEvent>,
{
    events.filter_map(|event| {
        future::ready(match event {
            LiveEvent::Update(record) => Some(record),
            _ => None,
        })
    })
}

/// Records deleted, in order.
pub fn deletes<S>(events: S) -> impl Stream<Item = JsonValue>
where
    S: Stream<Item = LiveEvent>,
{
    events.filter_map(|event| {
        future::ready(match event {
            LiveEvent::Delete(record) => Some(record),
            _ => None,
        })
    })
}
