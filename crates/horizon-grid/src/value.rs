//! Structural equality over plain JSON-like values.

use serde_json::Value;

/// Structural, symmetric deep equality.
///
/// - maps are equal when both have exactly the same keys and every key's
///   values are structurally equal; key order is irrelevant
/// - sequences compare positionally
/// - numbers compare by numeric value, so `1` equals `1.0`
/// - a key that is present with a falsy value (`0`, `""`, `false`, `null`) is
///   still present: `{"a": 0}` differs from `{}`
pub fn structurally_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Object(left), Value::Object(right)) => {
            left.len() == right.len()
                && left.iter().all(|(key, value)| {
                    right
                        .get(key)
                        .is_some_and(|other| structurally_equal(value, other))
                })
        }
        (Value::Array(left), Value::Array(right)) => {
            left.len() == right.len()
                && left
                    .iter()
                    .zip(right)
                    .all(|(value, other)| structurally_equal(value, other))
        }
        (Value::Number(left), Value::Number(right)) => {
            if let (Some(l), Some(r)) = (left.as_i64(), right.as_i64()) {
                l == r
            } else if let (Some(l), Some(r)) = (left.as_u64(), right.as_u64()) {
                l == r
            } else {
                left.as_f64() == right.as_f64()
            }
        }
        _ => a == b,
    }
}
