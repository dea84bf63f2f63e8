//! Pending-request registry.
//!
//! Maps a correlation id to the one-shot slot its caller awaits. The map is
//! shared by every engine in the process; each entry carries its owner's
//! [`EngineId`] and every removal checks it, so one engine can never resolve
//! or drain another engine's requests.
//!
//! Every removal goes through `DashMap::remove_if`, which makes resolution
//! exactly-once: whichever of reply, cancellation, or teardown gets there
//! first wins, and the rest are no-ops.

use crate::{
    connection::id_gen::{random_id, EngineId},
    error::{Result, SurrealLinkError},
};
use dashmap::{mapref::entry::Entry, DashMap};
use log::debug;
use once_cell::sync::Lazy;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tokio::sync::oneshot;

/// Receiving half handed to the caller of [`PendingRequests::register`].
pub type ReplyReceiver = oneshot::Receiver<Result<JsonValue>>;

static GLOBAL: Lazy<Arc<PendingRequests>> = Lazy::new(|| Arc::new(PendingRequests::new()));

struct PendingEntry {
    owner: EngineId,
    tx: oneshot::Sender<Result<JsonValue>>,
}

/// Registry of requests awaiting a reply.
#[derive(Default)]
pub struct PendingRequests {
    entries: DashMap<String, PendingEntry>,
}

impl PendingRequests {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry shared by all engines.
    pub fn global() -> Arc<Self> {
        GLOBAL.clone()
    }

    /// Insert an unresolved slot under a fresh correlation id.
    ///
    /// The id is checked against the map at insertion time and regenerated
    /// on collision, so it is never one that is currently outstanding.
    pub fn register(&self, owner: &EngineId) -> (String, ReplyReceiver) {
        let (tx, rx) = oneshot::channel();
        loop {
            let id = random_id();
            match self.entries.entry(id.clone()) {
                Entry::Occupied(_) => continue,
                Entry::Vacant(slot) => {
                    slot.insert(PendingEntry {
                        owner: owner.clone(),
                        tx,
                    });
                    return (id, rx);
                },
            }
        }
    }

    /// Complete a request with its reply value.
    ///
    /// Returns false (and does nothing) if no request with this id is
    /// outstanding for `owner`.
    pub fn resolve_success(&self, owner: &EngineId, id: &str, value: JsonValue) -> bool {
        self.complete(owner, id, Ok(value))
    }

    /// Complete a request with an error.
    pub fn resolve_failure(&self, owner: &EngineId, id: &str, error: SurrealLinkError) -> bool {
        self.complete(owner, id, Err(error))
    }

    /// Drop a request without completing it.
    ///
    /// Used by a caller abandoning its own wait (cancellation, timeout). A
    /// late reply for the id is then treated as an orphan.
    pub fn forget(&self, owner: &EngineId, id: &str) -> bool {
        self.take(owner, id).is_some()
    }

    /// Fail every request owned by `owner` with [`SurrealLinkError::Disposed`].
    pub fn cancel_all_owned_by(&self, owner: &EngineId) -> usize {
        self.fail_all_owned_by(owner, SurrealLinkError::Disposed)
    }

    /// Fail every request owned by `owner` with `error`.
    pub fn fail_all_owned_by(&self, owner: &EngineId, error: SurrealLinkError) -> usize {
        let ids: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| &entry.value().owner == owner)
            .map(|entry| entry.key().clone())
            .collect();

        let mut failed = 0;
        for id in ids {
            if self.complete(owner, &id, Err(error.clone())) {
                failed += 1;
            }
        }

        if failed > 0 {
            debug!(
                "[surreal-link] Failed {} pending request(s) of engine {}: {}",
                failed, owner, error
            );
        }
        failed
    }

    /// Number of outstanding requests owned by `owner`.
    pub fn owned_count(&self, owner: &EngineId) -> usize {
        self.entries.iter().filter(|entry| &entry.value().owner == owner).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn complete(&self, owner: &EngineId, id: &str, outcome: Result<JsonValue>) -> bool {
        match self.take(owner, id) {
            Some(entry) => {
                // The caller may have stopped waiting; that is not an error.
                let _ = entry.tx.send(outcome);
                true
            },
            None => false,
        }
    }

    fn take(&self, owner: &EngineId, id: &str) -> Option<PendingEntry> {
        self.entries
            .remove_if(id, |_, entry| &entry.owner == owner)
            .map(|(_, entry)| entry)
    }
}
