use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{Result, SurrealLinkError};

/// Result of one statement inside a `query` reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// `OK` or `ERR`
    pub status: String,
    /// Server-side execution time, e.g. `"1.2ms"`
    #[serde(default)]
    pub time: String,
    /// Statement output; the error message when `status` is `ERR`
    #[serde(default)]
    pub result: JsonValue,
}

impl QueryResult {
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("OK")
    }

    /// Turn an `ERR` statement into a [`SurrealLinkError::QueryError`].
    pub fn into_result(self) -> Result<JsonValue> {
        if self.is_ok() {
            Ok(self.result)
        } else {
            let message = match self.result {
                JsonValue::String(message) => message,
                other => other.to_string(),
            };
            Err(SurrealLinkError::QueryError(message))
        }
    }
}
