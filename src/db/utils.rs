//! Helpers shared by every backend.
//!
//! Both stores keep the same on-disk representation for ids, timestamps
//! and setting payloads, so a database written by one can be read by the
//! other.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

use crate::db::{DbError, DbResult, models::Timestamp};

/// Map a caller-supplied identifier onto a row id.
///
/// Returns `None` for anything other than the exact text
/// [`format_row_id`] mints; such identifiers name nothing.
pub fn parse_row_id(id: &str) -> Option<i64> {
    id.parse::<i64>()
        .ok()
        .filter(|n| *n > 0 && format_row_id(*n) == id)
}

/// Render a row id as an opaque identifier.
pub fn format_row_id(row_id: i64) -> String {
    row_id.to_string()
}

/// Serialize a timestamp as RFC 3339 text, keeping sub-second precision.
pub fn encode_timestamp(ts: Option<&Timestamp>) -> Option<String> {
    ts.map(|t| t.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

/// Parse a timestamp previously written by [`encode_timestamp`].
pub fn decode_timestamp(raw: Option<String>) -> DbResult<Option<Timestamp>> {
    match raw.filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => DateTime::parse_from_rfc3339(&s)
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(|e| DbError::InvalidData {
                message: format!("invalid timestamp '{}': {}", s, e),
                help: "timestamps are stored as RFC 3339 text".to_string(),
            }),
    }
}

/// Serialize a setting payload.
pub fn encode_value(value: &Value) -> DbResult<String> {
    serde_json::to_string(value).map_err(|e| DbError::InvalidData {
        message: format!("setting value is not serializable: {}", e),
        help: "setting values must be representable as JSON".to_string(),
    })
}

/// Parse a stored setting payload.
pub fn decode_value(key: &str, raw: &str) -> DbResult<Value> {
    serde_json::from_str(raw).map_err(|e| DbError::InvalidData {
        message: format!("setting '{}' holds invalid JSON: {}", key, e),
        help: "rewrite the setting with set_setting".to_string(),
    })
}

/// The value handed out for settings that were never set.
pub fn empty_setting() -> Value {
    Value::Array(vec![])
}

/// Reject empty setting keys before they reach the engine.
pub fn validate_setting_key(key: &str) -> DbResult<()> {
    if key.is_empty() {
        return Err(DbError::Validation {
            message: "setting key cannot be empty".to_string(),
        });
    }
    Ok(())
}
