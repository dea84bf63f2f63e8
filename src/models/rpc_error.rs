use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::SurrealLinkError;

/// Error object carried by a failed reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

impl From<RpcError> for SurrealLinkError {
    fn from(err: RpcError) -> Self {
        SurrealLinkError::ServerError {
            code: err.code,
            message: err.message,
        }
    }
}
