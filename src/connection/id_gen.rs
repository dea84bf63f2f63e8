//! Identifier generation.
//!
//! Ids are 8 random hex characters. Randomness alone is not trusted for
//! uniqueness: every registry that keys on a generated id retries on
//! collision at insertion time.

use dashmap::DashSet;
use once_cell::sync::Lazy;
use std::fmt;

/// Engine ids currently held by a live [`WsEngine`](super::WsEngine).
static LIVE_ENGINE_IDS: Lazy<DashSet<String>> = Lazy::new(DashSet::new);

/// Generate a random 8-character lowercase hex id.
pub fn random_id() -> String {
    format!("{:08x}", rand::random::<u32>())
}

/// Stable identity of one engine instance.
///
/// Tags every entry the engine places in the shared registries so that
/// several engines in one process never resolve or close each other's work.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EngineId(String);

impl EngineId {
    /// Allocate an id not held by any other live engine.
    pub fn allocate() -> Self {
        loop {
            let candidate = random_id();
            if LIVE_ENGINE_IDS.insert(candidate.clone()) {
                return Self(candidate);
            }
        }
    }

    /// Return the id to the pool. Called once, when the engine is dropped.
    pub(crate) fn release(&self) {
        LIVE_ENGINE_IDS.remove(&self.0);
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[cfg(test)]
    pub(crate) fn fixed(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl fmt::Display for EngineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
