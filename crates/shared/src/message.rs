use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const SKIP_WAITING: &str = "SKIP_WAITING";

/// Messages the page can post to the worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlMessage {
    /// Activate the waiting worker without waiting for every tab to close
    SkipWaiting,
}

impl ControlMessage {
    /// Returns None for anything that isn't a recognised message. Only the
    /// `{ type: ... }` object shape is a message, bare strings are ignored.
    pub fn parse(value: &Value) -> Option<Self> {
        match value {
            Value::Object(_) => Self::deserialize(value).ok(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOutcome {
    SkippedWaiting,
    Ignored,
}
