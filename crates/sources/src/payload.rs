//! Zero-substituting accessors for JSON payloads
//!
//! Backends omit fields freely. Every accessor here degrades a missing or
//! mistyped field to zero instead of failing the whole computation.

use serde_json::Value;

/// Walk nested object keys
pub fn field<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |current, key| current.get(*key))
}

/// Numeric value of a field; numbers and numeric strings are accepted
pub fn number(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    if parsed.is_finite() {
        parsed
    } else {
        0.0
    }
}

/// Length of an array field (0 for anything else)
pub fn array_len(value: Option<&Value>) -> f64 {
    value
        .and_then(Value::as_array)
        .map(|items| items.len() as f64)
        .unwrap_or(0.0)
}

/// Sum the named fields over every object in an array
pub fn sum_fields(items: Option<&Value>, fields: &[&str]) -> f64 {
    items
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .flat_map(|item| fields.iter().map(move |f| number(item.get(*f))))
                .sum()
        })
        .unwrap_or(0.0)
}

/// `used / total` as a percentage; 0 when the total is unknown
pub fn ratio_percent(used: f64, total: f64) -> f64 {
    if total > 0.0 {
        used / total * 100.0
    } else {
        0.0
    }
}

/// Identifier-like field that may be a string or a number
pub fn key_string(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}
