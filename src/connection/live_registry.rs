//! Live-query registry: one fan-out group per subscription id.
//!
//! A group holds any number of independent sinks. Each sink is a bounded
//! `mpsc` queue drained by its own [`LiveStream`], so a slow consumer only
//! ever fills its own queue. Broadcasting uses `try_send`: a full queue drops
//! that one notification for that one sink and logs it.
//!
//! The terminal closure event does not travel through the queue. Closing a
//! group records the reason in each sink's `OnceLock` and then drops the
//! sender; the stream yields everything still buffered, then
//! [`LiveEvent::Closed`] once, then ends. A full queue therefore can never
//! swallow the closure.

use crate::{
    connection::id_gen::EngineId,
    error::{Result, SurrealLinkError},
    models::{ClosureReason, LiveEvent},
};
use dashmap::{mapref::entry::Entry, DashMap};
use futures_util::Stream;
use log::{debug, warn};
use once_cell::sync::Lazy;
use std::{
    pin::Pin,
    sync::{Arc, OnceLock},
    task::{Context, Poll},
};
use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

static GLOBAL: Lazy<Arc<LiveQueryRegistry>> = Lazy::new(|| Arc::new(LiveQueryRegistry::new()));

struct LiveSink {
    tx: mpsc::Sender<LiveEvent>,
    closure: Arc<OnceLock<ClosureReason>>,
}

struct LiveGroup {
    owner: EngineId,
    sinks: Vec<LiveSink>,
}

/// Registry of live-query fan-out groups, keyed by subscription id.
#[derive(Default)]
pub struct LiveQueryRegistry {
    groups: DashMap<Uuid, LiveGroup>,
}

impl LiveQueryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry shared by all engines.
    pub fn global() -> Arc<Self> {
        GLOBAL.clone()
    }

    // ==================== Group Lifecycle ====================

    /// Create the group for `id` if it does not exist yet.
    ///
    /// Returns true if this call created it.
    pub fn ensure(&self, id: Uuid, owner: &EngineId) -> bool {
        match self.groups.entry(id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(LiveGroup {
                    owner: owner.clone(),
                    sinks: Vec::new(),
                });
                debug!("[surreal-link] Live query {} registered for engine {}", id, owner);
                true
            },
        }
    }

    /// Attach a new sink to an existing group.
    ///
    /// Fails with [`SurrealLinkError::LiveQueryNotFound`] if the group was
    /// never created or has already been closed.
    pub fn add_sink(&self, id: Uuid, owner: &EngineId, capacity: usize) -> Result<LiveStream> {
        let mut group = match self.groups.get_mut(&id) {
            Some(group) if &group.owner == owner => group,
            _ => return Err(SurrealLinkError::LiveQueryNotFound(id)),
        };

        let (tx, rx) = mpsc::channel(capacity.max(1));
        let closure = Arc::new(OnceLock::new());
        group.sinks.push(LiveSink {
            tx,
            closure: closure.clone(),
        });

        Ok(LiveStream::new(id, rx, closure))
    }

    /// Deliver `event` to every sink currently attached to `id`.
    ///
    /// Returns the number of sinks that accepted the event. Unknown ids are
    /// dropped silently (kill races). Sinks whose stream was dropped are
    /// pruned.
    pub fn broadcast(&self, owner: &EngineId, id: Uuid, event: LiveEvent) -> usize {
        let mut group = match self.groups.get_mut(&id) {
            Some(group) if &group.owner == owner => group,
            _ => {
                debug!("[surreal-link] Dropping notification for unknown live query {}", id);
                return 0;
            },
        };

        let mut delivered = 0;
        group.sinks.retain(|sink| match sink.tx.try_send(event.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            },
            Err(TrySendError::Full(_)) => {
                warn!(
                    "[surreal-link] Live query {} sink is full; dropping notification",
                    id
                );
                true
            },
            Err(TrySendError::Closed(_)) => false,
        });
        delivered
    }

    /// Remove the group for `id` and close each of its sinks with `reason`.
    ///
    /// Returns false if there was no such group (already closed, or never
    /// created by `owner`).
    pub fn close(&self, owner: &EngineId, id: Uuid, reason: ClosureReason) -> bool {
        let group = match self.groups.remove_if(&id, |_, group| &group.owner == owner) {
            Some((_, group)) => group,
            None => return false,
        };

        let sink_count = group.sinks.len();
        for sink in group.sinks {
            let _ = sink.closure.set(reason);
            drop(sink.tx);
        }

        debug!(
            "[surreal-link] Live query {} closed ({}), {} sink(s) notified",
            id, reason, sink_count
        );
        true
    }

    /// Close every group owned by `owner`. Returns the ids that were closed.
    pub fn close_all_owned_by(&self, owner: &EngineId, reason: ClosureReason) -> Vec<Uuid> {
        self.owned_ids(owner)
            .into_iter()
            .filter(|id| self.close(owner, *id, reason))
            .collect()
    }

    // ==================== Queries ====================

    pub fn owned_ids(&self, owner: &EngineId) -> Vec<Uuid> {
        self.groups
            .iter()
            .filter(|entry| &entry.value().owner == owner)
            .map(|entry| *entry.key())
            .collect()
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.groups.contains_key(&id)
    }

    /// Number of sinks attached to `id` (zero if the group does not exist).
    pub fn sink_count(&self, id: Uuid) -> usize {
        self.groups.get(&id).map(|group| group.sinks.len()).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// One consumer of a live query.
///
/// Yields change events in the order they were read from the socket, then
/// exactly one [`LiveEvent::Closed`], then `None`.
pub struct LiveStream {
    id: Uuid,
    rx: mpsc::Receiver<LiveEvent>,
    closure: Arc<OnceLock<ClosureReason>>,
    finished: bool,
}

impl LiveStream {
    fn new(id: Uuid, rx: mpsc::Receiver<LiveEvent>, closure: Arc<OnceLock<ClosureReason>>) -> Self {
        Self {
            id,
            rx,
            closure,
            finished: false,
        }
    }

    /// Subscription id this stream is attached to.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// True once the closure event has been yielded.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Receive the next event.
    pub async fn next(&mut self) -> Option<LiveEvent> {
        std::future::poll_fn(|cx| Pin::new(&mut *self).poll_next(cx)).await
    }
}

impl Stream for LiveStream {
    type Item = LiveEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.finished {
            return Poll::Ready(None);
        }

        match self.rx.poll_recv(cx) {
            Poll::Ready(Some(event)) => Poll::Ready(Some(event)),
            Poll::Ready(None) => {
                self.finished = true;
                // The sender only goes away without a reason if the registry
                // itself was torn down.
                let reason = self.closure.get().copied().unwrap_or(ClosureReason::SocketClosed);
                Poll::Ready(Some(LiveEvent::Closed(reason)))
            },
            Poll::Pending => Poll::Pending,
        }
    }
}

impl std::fmt::Debug for LiveStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveStream")
            .field("id", &self.id)
            .field("finished", &self.finished)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn owner() -> EngineId {
        EngineId::fixed("aaaaaaaa")
    }

    #[test]
    fn test_ensure_is_idempotent() {
        let registry = LiveQueryRegistry::new();
        let id = Uuid::new_v4();

        assert!(registry.ensure(id, &owner()));
        assert!(!registry.ensure(id, &owner()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_add_sink_requires_existing_group() {
        let registry = LiveQueryRegistry::new();
        let id = Uuid::new_v4();

        let err = registry.add_sink(id, &owner(), 8).unwrap_err();
        assert_eq!(err, SurrealLinkError::LiveQueryNotFound(id));

        registry.ensure(id, &owner());
        assert!(registry.add_sink(id, &EngineId::fixed("bbbbbbbb"), 8).is_err());
        assert!(registry.add_sink(id, &owner(), 8).is_ok());
    }

    #[tokio::test]
    async fn test_broadcast_reaches_every_sink_of_the_id_only() {
        let registry = LiveQueryRegistry::new();
        let id = Uuid::new_v4();
        let other = Uuid::new_v4();
        registry.ensure(id, &owner());
        registry.ensure(other, &owner());

        let mut a = registry.add_sink(id, &owner(), 8).unwrap();
        let mut b = registry.add_sink(id, &owner(), 8).unwrap();
        let mut c = registry.add_sink(id, &owner(), 8).unwrap();
        let mut unrelated = registry.add_sink(other, &owner(), 8).unwrap();

        let event = LiveEvent::Create(json!({ "id": "person:1" }));
        assert_eq!(registry.broadcast(&owner(), id, event.clone()), 3);

        assert_eq!(a.next().await, Some(event.clone()));
        assert_eq!(b.next().await, Some(event.clone()));
        assert_eq!(c.next().await, Some(event));

        registry.close(&owner(), other, ClosureReason::QueryKilled);
        assert_eq!(
            unrelated.next().await,
            Some(LiveEvent::Closed(ClosureReason::QueryKilled))
        );
    }

    #[tokio::test]
    async fn test_late_sink_does_not_see_earlier_events() {
        let registry = LiveQueryRegistry::new();
        let id = Uuid::new_v4();
        registry.ensure(id, &owner());

        let mut early = registry.add_sink(id, &owner(), 8).unwrap();
        registry.broadcast(&owner(), id, LiveEvent::Create(json!(1)));
        let mut late = registry.add_sink(id, &owner(), 8).unwrap();
        registry.broadcast(&owner(), id, LiveEvent::Update(json!(2)));
        registry.close(&owner(), id, ClosureReason::QueryKilled);

        assert_eq!(early.next().await, Some(LiveEvent::Create(json!(1))));
        assert_eq!(early.next().await, Some(LiveEvent::Update(json!(2))));
        assert_eq!(late.next().await, Some(LiveEvent::Update(json!(2))));
        assert!(late.next().await.unwrap().is_closed());
    }

    #[tokio::test]
    async fn test_close_delivers_buffered_events_then_single_closure() {
        let registry = LiveQueryRegistry::new();
        let id = Uuid::new_v4();
        registry.ensure(id, &owner());
        let mut sink = registry.add_sink(id, &owner(), 8).unwrap();

        registry.broadcast(&owner(), id, LiveEvent::Create(json!(1)));
        registry.broadcast(&owner(), id, LiveEvent::Update(json!(2)));
        registry.broadcast(&owner(), id, LiveEvent::Delete(json!(3)));
        assert!(registry.close(&owner(), id, ClosureReason::QueryKilled));

        assert_eq!(sink.next().await, Some(LiveEvent::Create(json!(1))));
        assert_eq!(sink.next().await, Some(LiveEvent::Update(json!(2))));
        assert_eq!(sink.next().await, Some(LiveEvent::Delete(json!(3))));
        assert_eq!(
            sink.next().await,
            Some(LiveEvent::Closed(ClosureReason::QueryKilled))
        );
        assert_eq!(sink.next().await, None);
        assert_eq!(sink.next().await, None);
        assert!(sink.is_finished());
    }

    #[tokio::test]
    async fn test_closed_group_drops_further_notifications() {
        let registry = LiveQueryRegistry::new();
        let id = Uuid::new_v4();
        registry.ensure(id, &owner());
        let _sink = registry.add_sink(id, &owner(), 8).unwrap();

        assert!(registry.close(&owner(), id, ClosureReason::QueryKilled));
        assert!(!registry.close(&owner(), id, ClosureReason::QueryKilled));
        assert_eq!(registry.broadcast(&owner(), id, LiveEvent::Create(json!(1))), 0);
        assert!(registry.add_sink(id, &owner(), 8).is_err());
    }

    #[tokio::test]
    async fn test_full_sink_drops_but_keeps_closure() {
        let registry = LiveQueryRegistry::new();
        let id = Uuid::new_v4();
        registry.ensure(id, &owner());
        let mut slow = registry.add_sink(id, &owner(), 1).unwrap();
        let mut fast = registry.add_sink(id, &owner(), 8).unwrap();

        assert_eq!(registry.broadcast(&owner(), id, LiveEvent::Create(json!(1))), 2);
        assert_eq!(registry.broadcast(&owner(), id, LiveEvent::Create(json!(2))), 1);
        registry.close(&owner(), id, ClosureReason::SocketClosed);

        assert_eq!(slow.next().await, Some(LiveEvent::Create(json!(1))));
        assert_eq!(
            slow.next().await,
            Some(LiveEvent::Closed(ClosureReason::SocketClosed))
        );

        assert_eq!(fast.next().await, Some(LiveEvent::Create(json!(1))));
        assert_eq!(fast.next().await, Some(LiveEvent::Create(json!(2))));
        assert!(fast.next().await.unwrap().is_closed());
    }

    #[test]
    fn test_dropped_sinks_are_pruned_on_broadcast() {
        let registry = LiveQueryRegistry::new();
        let id = Uuid::new_v4();
        registry.ensure(id, &owner());
        let kept = registry.add_sink(id, &owner(), 8).unwrap();
        drop(registry.add_sink(id, &owner(), 8).unwrap());

        assert_eq!(registry.sink_count(id), 2);
        assert_eq!(registry.broadcast(&owner(), id, LiveEvent::Create(json!(1))), 1);
        assert_eq!(registry.sink_count(id), 1);
        drop(kept);
    }

    #[tokio::test]
    async fn test_close_all_owned_by_leaves_other_engines_alone() {
        let registry = LiveQueryRegistry::new();
        let mine = EngineId::fixed("aaaaaaaa");
        let theirs = EngineId::fixed("bbbbbbbb");

        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        registry.ensure(a, &mine);
        registry.ensure(b, &mine);
        registry.ensure(c, &theirs);

        let mut sink_a = registry.add_sink(a, &mine, 8).unwrap();
        let mut closed = registry.close_all_owned_by(&mine, ClosureReason::SocketClosed);
        closed.sort();
        let mut expected = vec![a, b];
        expected.sort();

        assert_eq!(closed, expected);
        assert!(registry.contains(c));
        assert_eq!(
            sink_a.next().await,
            Some(LiveEvent::Closed(ClosureReason::SocketClosed))
        );
    }

    #[tokio::test]
    async fn test_live_stream_implements_stream() {
        use futures_util::StreamExt;

        let registry = LiveQueryRegistry::new();
        let id = Uuid::new_v4();
        registry.ensure(id, &owner());
        let sink = registry.add_sink(id, &owner(), 8).unwrap();

        registry.broadcast(&owner(), id, LiveEvent::Create(json!(1)));
        registry.close(&owner(), id, ClosureReason::QueryKilled);

        let events: Vec<LiveEvent> = sink.collect().await;
        assert_eq!(
            events,
            vec![
                LiveEvent::Create(json!(1)),
                LiveEvent::Closed(ClosureReason::QueryKilled)
            ]
        );
    }
}
