use serde_json::Value as JsonValue;

use super::closure_reason::ClosureReason;
use super::live_notification::{LiveAction, LiveNotification};

/// Event yielded by a live-query sink.
///
/// Every sink ends with exactly one [`LiveEvent::Closed`], after which the
/// stream is exhausted.
#[derive(Debug, Clone, PartialEq)]
pub enum LiveEvent {
    /// A record was created
    Create(JsonValue),
    /// A record was updated (full record, or a patch list for `DIFF` queries)
    Update(JsonValue),
    /// A record was deleted
    Delete(JsonValue),
    /// Terminal event: the live query will not deliver anything else
    Closed(ClosureReason),
}

impl LiveEvent {
    /// Convert a notification into the event delivered to sinks.
    ///
    /// `KILLED` notifications have no event form; they close the live query.
    pub fn from_notification(notification: LiveNotification) -> Option<Self> {
        match notification.action {
            LiveAction::Create => Some(LiveEvent::Create(notification.result)),
            LiveAction::Update => Some(LiveEvent::Update(notification.result)),
            LiveAction::Delete => Some(LiveEvent::Delete(notification.result)),
            LiveAction::Killed => None,
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, LiveEvent::Closed(_))
    }

    pub fn closure_reason(&self) -> Option<ClosureReason> {
        match self {
            LiveEvent::Closed(reason) => Some(*reason),
            _ => None,
        }
    }

    /// Payload of a change event, `None` for the terminal event.
    pub fn record(&self) -> Option<&JsonValue> {
        match self {
            LiveEvent::Create(value) | LiveEvent::Update(value) | LiveEvent::Delete(value) => {
                Some(value)
            },
            LiveEvent::Closed(_) => None,
        }
    }
}
