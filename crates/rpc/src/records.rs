//! Accessors for the loosely typed values Odoo returns.
//!
//! Empty scalar fields come back as `false`, and many2one fields as
//! `[id, display_name]` (or `false`).

use serde_json::{Map, Value};

pub type Record = Map<String, Value>;

pub fn record_id(record: &Record) -> Option<i64> {
    record.get("id").and_then(Value::as_i64)
}

pub fn many2one_id(record: &Record, field: &str) -> Option<i64> {
    match record.get(field)? {
        Value::Array(pair) => pair.first().and_then(Value::as_i64),
        Value::Number(number) => number.as_i64(),
        _ => None,
    }
}

pub fn many2one_name(record: &Record, field: &str) -> Option<String> {
    match record.get(field)? {
        Value::Array(pair) => pair.get(1).and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

/// `false`, `null` and missing all read as `None`.
pub fn text_field(record: &Record, field: &str) -> Option<String> {
    match record.get(field)? {
        Value::String(text) => Some(text.clone()),
        _ => None,
    }
}

pub fn bool_field(record: &Record, field: &str) -> bool {
    record.get(field).and_then(Value::as_bool).unwrap_or(false)
}

pub fn id_list(record: &Record, field: &str) -> Vec<i64> {
    match record.get(field) {
        Some(Value::Array(ids)) => ids.iter().filter_map(Value::as_i64).collect(),
        _ => Vec::new(),
    }
}

/// `create` answers with an id, or a one-element id list for batch calls.
pub fn created_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::Array(ids) => ids.first().and_then(Value::as_i64),
        _ => None,
    }
}
