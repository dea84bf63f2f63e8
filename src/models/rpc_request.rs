use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Request envelope written to the socket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    /// Correlation id echoed back in the reply
    pub id: String,
    /// RPC method name (`query`, `live`, `kill`, ...)
    pub method: String,
    /// Positional parameters, omitted when empty
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<JsonValue>,
}

impl RpcRequest {
    pub fn new(id: impl Into<String>, method: impl Into<String>, params: Vec<JsonValue>) -> Self {
        Self {
            id: id.into(),
            method: method.into(),
            params,
        }
    }
}
