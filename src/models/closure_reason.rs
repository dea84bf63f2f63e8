use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a live query stopped delivering events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClosureReason {
    /// The live query was killed, locally or by the server
    QueryKilled,
    /// The owning connection was disposed or lost
    SocketClosed,
}

impl fmt::Display for ClosureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClosureReason::QueryKilled => write!(f, "query killed"),
            ClosureReason::SocketClosed => write!(f, "socket closed"),
        }
    }
}
