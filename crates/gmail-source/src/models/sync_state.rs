//! Persisted cursor for incremental message sync

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Name of the cursor field on message records and in persisted state
pub const CURSOR_FIELD: &str = "internal_date";

/// Highest `internal_date` (ms since epoch) seen across emitted messages
///
/// Serializes as `{"internal_date": <ms>}`, or `{}` before the first
/// message has been seen. The value only ever moves forward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncCursorState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_date: Option<i64>,
}

impl SyncCursorState {
    /// Empty state for a first sync
    pub fn empty() -> Self {
        Self::default()
    }

    /// State holding the given cursor
    pub fn at(internal_date_ms: i64) -> Self {
        Self {
            internal_date: Some(internal_date_ms),
        }
    }

    /// Read state from a host-supplied mapping
    ///
    /// Accepts the cursor as an integer or as a numeric string. Anything
    /// else is treated as no cursor.
    pub fn from_value(value: &Value) -> Self {
        let internal_date = match value.get(CURSOR_FIELD) {
            Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        };
        Self { internal_date }
    }

    /// Serialize to the persisted mapping
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::Object(Default::default()))
    }

    /// Cursor value, 0 when nothing has been seen
    pub fn cursor_or_zero(&self) -> i64 {
        self.internal_date.unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.internal_date.is_none()
    }
}
