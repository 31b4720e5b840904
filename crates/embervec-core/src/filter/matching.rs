//! Condition matching logic and helper functions.

use super::Condition;
use crate::point::Payload;
use serde_json::Value;

impl Condition {
    /// Evaluates the condition against a payload.
    #[must_use]
    pub fn matches(&self, payload: &Payload) -> bool {
        match self {
            Self::Eq { field, value } => {
                get_field(payload, field).is_some_and(|v| values_equal(v, value))
            }
            Self::Gt { field, value } => number_field(payload, field).is_some_and(|v| v > *value),
            Self::Gte { field, value } => {
                number_field(payload, field).is_some_and(|v| v >= *value)
            }
            Self::Lt { field, value } => number_field(payload, field).is_some_and(|v| v < *value),
            Self::Lte { field, value } => {
                number_field(payload, field).is_some_and(|v| v <= *value)
            }
            Self::In { field, values } => get_field(payload, field)
                .is_some_and(|v| values.iter().any(|val| values_equal(v, val))),
            Self::And { conditions } => conditions.iter().all(|c| c.matches(payload)),
        }
    }
}

/// Gets a field from a payload, supporting dot notation for nested fields.
fn get_field<'a>(payload: &'a Payload, field: &str) -> Option<&'a Value> {
    let mut parts = field.split('.');
    let mut current = payload.get(parts.next()?)?;
    for part in parts {
        current = current.get(part)?;
    }
    Some(current)
}

fn number_field(payload: &Payload, field: &str) -> Option<f64> {
    get_field(payload, field).and_then(Value::as_f64)
}

/// Strict JSON equality, except that numbers compare as f64 so that `1` and
/// `1.0` are equal.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a
            .as_f64()
            .zip(b.as_f64())
            .is_some_and(|(a, b)| a == b),
        _ => a == b,
    }
}
