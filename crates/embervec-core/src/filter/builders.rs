//! Condition constructors shared by the JSON parser and programmatic callers.

use super::Condition;
use serde_json::Value;

/// Numeric comparison against a bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// `field > bound`
    Gt,
    /// `field >= bound`
    Gte,
    /// `field < bound`
    Lt,
    /// `field <= bound`
    Lte,
}

impl Comparison {
    /// Maps a JSON operator key to a comparison.
    #[must_use]
    pub fn from_operator(op: &str) -> Option<Self> {
        match op {
            "gt" => Some(Self::Gt),
            "gte" => Some(Self::Gte),
            "lt" => Some(Self::Lt),
            "lte" => Some(Self::Lte),
            _ => None,
        }
    }
}

impl Condition {
    /// `field == value`
    #[must_use]
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Numeric range condition.
    #[must_use]
    pub fn compare(field: impl Into<String>, op: Comparison, bound: f64) -> Self {
        let field = field.into();
        match op {
            Comparison::Gt => Self::Gt { field, value: bound },
            Comparison::Gte => Self::Gte { field, value: bound },
            Comparison::Lt => Self::Lt { field, value: bound },
            Comparison::Lte => Self::Lte { field, value: bound },
        }
    }

    /// `field` equals one of `values`.
    #[must_use]
    pub fn any_of(field: impl Into<String>, values: Vec<Value>) -> Self {
        Self::In {
            field: field.into(),
            values,
        }
    }

    /// Every condition must hold; an empty list matches everything.
    #[must_use]
    pub fn and(conditions: Vec<Condition>) -> Self {
        Self::And { conditions }
    }
}
