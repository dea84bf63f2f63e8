use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Kind of change reported by a live-query notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LiveAction {
    Create,
    Update,
    Delete,
    /// The server terminated the live query on its side
    Killed,
}

impl LiveAction {
    /// Parse the wire form (`CREATE`, `update`, ...). Case-insensitive.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_uppercase().as_str() {
            "CREATE" => Some(LiveAction::Create),
            "UPDATE" => Some(LiveAction::Update),
            "DELETE" => Some(LiveAction::Delete),
            "KILLED" => Some(LiveAction::Killed),
            _ => None,
        }
    }
}

/// Unsolicited push message for one live query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveNotification {
    /// Subscription id assigned by the server when the live query started
    pub id: Uuid,
    pub action: LiveAction,
    /// Record (or diff) the change applies to
    #[serde(default)]
    pub result: JsonValue,
}

impl LiveNotification {
    /// Extract a notification from the `result` object of an id-less frame.
    ///
    /// Returns `None` if the object lacks a parseable `id` or a known `action`.
    pub fn from_value(value: &JsonValue) -> Option<Self> {
        let object = value.as_object()?;
        let id = object.get("id")?.as_str().and_then(|s| Uuid::parse_str(s).ok())?;
        let action = object.get("action")?.as_str().and_then(LiveAction::parse)?;
        let result = object.get("result").cloned().unwrap_or(JsonValue::Null);

        Some(Self { id, action, result })
    }
}
