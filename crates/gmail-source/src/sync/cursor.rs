//! Incremental cursor tracking
//!
//! Pure functions over [`SyncCursorState`]: building the resume filter
//! and folding emitted records into a running maximum.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

use crate::gmail::after_clause;
use crate::models::{CURSOR_FIELD, SyncCursorState};

/// Search expression for a resumed sync
///
/// With a prior cursor, appends `after:YYYY/M/D` for the cursor's UTC
/// calendar date. Gmail's `after:` is day-granular, so messages from the
/// cursor's own day are listed again on resume.
pub fn compute_filter_for_state(prior: &SyncCursorState, base_query: &str) -> String {
    let Some(cursor_ms) = prior.internal_date else {
        return base_query.to_string();
    };

    let Some(cursor) = Utc.timestamp_millis_opt(cursor_ms).single() else {
        log::warn!("Ignoring out-of-range cursor {}", cursor_ms);
        return base_query.to_string();
    };

    let clause = after_clause(cursor.date_naive());
    let base_query = base_query.trim();
    if base_query.is_empty() {
        clause
    } else {
        format!("{} {}", base_query, clause)
    }
}

/// Fold one emitted record into the state
///
/// Returns `current` unchanged when the record has no usable cursor value
/// or is not newer than the stored cursor.
pub fn advance(current: SyncCursorState, record: &Value) -> SyncCursorState {
    let Some(value) = record.get(CURSOR_FIELD) else {
        return current;
    };

    let Some(record_ms) = parse_cursor_value(value) else {
        log::debug!("Unparsable cursor value {:?}, state unchanged", value);
        return current;
    };

    if record_ms > current.cursor_or_zero() {
        SyncCursorState::at(record_ms)
    } else {
        current
    }
}

/// Epoch milliseconds from an ISO-8601 instant or a millisecond number
///
/// Instants without an offset are taken as UTC.
pub fn parse_cursor_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => parse_instant_millis(s.trim()),
        _ => None,
    }
}

fn parse_instant_millis(s: &str) -> Option<i64> {
    if s.is_empty() {
        return None;
    }

    if let Ok(instant) = DateTime::parse_from_rfc3339(s) {
        return Some(instant.timestamp_millis());
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
        .map(|naive| naive.and_utc().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // 2024-03-05T12:00:00Z
    const MARCH_5_NOON: i64 = 1_709_640_000_000;

    #[test]
    fn test_filter_without_state() {
        assert_eq!(compute_filter_for_state(&SyncCursorState::empty(), ""), "");
        assert_eq!(
            compute_filter_for_state(&SyncCursorState::empty(), "from:boss"),
            "from:boss"
        );
    }

    #[test]
    fn test_filter_with_state() {
        let state = SyncCursorState::at(MARCH_5_NOON);
        assert_eq!(compute_filter_for_state(&state, ""), "after:2024/3/5");
        assert_eq!(
            compute_filter_for_state(&state, "from:boss"),
            "from:boss after:2024/3/5"
        );
    }

    #[test]
    fn test_filter_uses_utc_date() {
        // 2024-12-31T23:59:59.999Z stays on the 31st regardless of local time
        let state = SyncCursorState::at(1_735_689_599_999);
        assert_eq!(compute_filter_for_state(&state, ""), "after:2024/12/31");
    }

    #[test]
    fn test_advance_moves_forward() {
        let state = SyncCursorState::empty();
        let state = advance(state, &json!({"internal_date": "2024-03-05T12:00:00+00:00"}));
        assert_eq!(state, SyncCursorState::at(MARCH_5_NOON));

        let state = advance(state, &json!({"internal_date": "2024-03-05T12:00:01Z"}));
        assert_eq!(state, SyncCursorState::at(MARCH_5_NOON + 1000));
    }

    #[test]
    fn test_advance_never_regresses() {
        let state = SyncCursorState::at(MARCH_5_NOON);
        let older = json!({"internal_date": "2024-01-01T00:00:00Z"});
        assert_eq!(advance(state, &older), state);
        let same = json!({"internal_date": "2024-03-05T12:00:00Z"});
        assert_eq!(advance(state, &same), state);
    }

    #[test]
    fn test_advance_ignores_missing_or_bad_cursor() {
        let state = SyncCursorState::at(MARCH_5_NOON);
        assert_eq!(advance(state, &json!({"id": "m1"})), state);
        assert_eq!(advance(state, &json!({"internal_date": null})), state);
        assert_eq!(advance(state, &json!({"internal_date": "not a date"})), state);
        assert_eq!(advance(state, &json!({"internal_date": ""})), state);
        assert_eq!(advance(SyncCursorState::empty(), &json!({})), SyncCursorState::empty());
    }

    #[test]
    fn test_advance_is_order_independent() {
        let records = [
            json!({"internal_date": "2024-03-01T00:00:00Z"}),
            json!({"internal_date": "2024-03-05T12:00:00Z"}),
            json!({"internal_date": "2024-02-10T08:30:00Z"}),
        ];

        let forward = records
            .iter()
            .fold(SyncCursorState::empty(), |s, r| advance(s, r));
        let backward = records
            .iter()
            .rev()
            .fold(SyncCursorState::empty(), |s, r| advance(s, r));
        assert_eq!(forward, backward);
        assert_eq!(forward, SyncCursorState::at(MARCH_5_NOON));
    }

    #[test]
    fn test_parse_cursor_value_formats() {
        assert_eq!(
            parse_cursor_value(&json!("2024-03-05T12:00:00.000Z")),
            Some(MARCH_5_NOON)
        );
        assert_eq!(
            parse_cursor_value(&json!("2024-03-05T13:00:00+01:00")),
            Some(MARCH_5_NOON)
        );
        assert_eq!(parse_cursor_value(&json!("2024-03-05T12:00:00")), Some(MARCH_5_NOON));
        assert_eq!(parse_cursor_value(&json!(MARCH_5_NOON)), Some(MARCH_5_NOON));
        assert_eq!(parse_cursor_value(&json!(true)), None);
    }
}
