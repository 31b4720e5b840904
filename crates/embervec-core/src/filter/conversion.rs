//! Parsing of the JSON filter shape into validated conditions.
//!
//! ```text
//! {"tag": "a"}                      -> Eq
//! {"tag": {"eq": "a"}}              -> Eq
//! {"score": {"gte": 1, "lt": 5}}    -> Gte AND Lt
//! {"tag": {"any": ["a", "b"]}}      -> In
//! ```
//!
//! Top-level keys are ANDed together.

use super::{Comparison, Condition, Filter};
use crate::error::{Error, Result};
use serde_json::{Map, Value};

const OPERATORS: [&str; 6] = ["eq", "gt", "gte", "lt", "lte", "any"];

impl Filter {
    /// Builds a filter from its JSON representation.
    ///
    /// An empty object yields a filter that matches everything.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFilter`] if the value is not an object, mixes
    /// operator and non-operator keys, uses an unknown operator, has a
    /// non-numeric range bound, or an `any` operand that is not an array.
    pub fn from_json(value: &Value) -> Result<Self> {
        let Value::Object(fields) = value else {
            return Err(Error::InvalidFilter(format!(
                "filter must be an object, got {}",
                type_name(value)
            )));
        };

        let mut conditions = Vec::with_capacity(fields.len());
        for (field, rule) in fields {
            if field.is_empty() {
                return Err(Error::InvalidFilter("empty field name".to_string()));
            }
            parse_field(field, rule, &mut conditions)?;
        }

        let condition = if conditions.len() == 1 {
            conditions.remove(0)
        } else {
            Condition::And { conditions }
        };
        Ok(Self::new(condition))
    }
}

fn parse_field(field: &str, rule: &Value, out: &mut Vec<Condition>) -> Result<()> {
    let Value::Object(ops) = rule else {
        out.push(Condition::eq(field, rule.clone()));
        return Ok(());
    };

    if ops.is_empty() {
        return Err(Error::InvalidFilter(format!(
            "field '{field}' has an empty operator object"
        )));
    }

    let operator_keys = ops.keys().filter(|k| OPERATORS.contains(&k.as_str())).count();
    if operator_keys == 0 {
        let unknown = ops.keys().next().map_or("", String::as_str);
        return Err(Error::InvalidFilter(format!(
            "unknown operator '{unknown}' on field '{field}' (use dot notation for nested fields)"
        )));
    }
    if operator_keys != ops.len() {
        return Err(Error::InvalidFilter(format!(
            "field '{field}' mixes operators with unknown keys: {:?}",
            ops.keys().collect::<Vec<_>>()
        )));
    }

    parse_operators(field, ops, out)
}

fn parse_operators(field: &str, ops: &Map<String, Value>, out: &mut Vec<Condition>) -> Result<()> {
    for (op, operand) in ops {
        let condition = match op.as_str() {
            "eq" => Condition::eq(field, operand.clone()),
            "any" => {
                let Value::Array(values) = operand else {
                    return Err(Error::InvalidFilter(format!(
                        "'any' on field '{field}' expects an array, got {}",
                        type_name(operand)
                    )));
                };
                Condition::any_of(field, values.clone())
            }
            other => match Comparison::from_operator(other) {
                Some(cmp) => Condition::compare(field, cmp, numeric_bound(field, op, operand)?),
                None => {
                    return Err(Error::InvalidFilter(format!(
                        "unknown operator '{other}' on field '{field}'"
                    )))
                }
            },
        };
        out.push(condition);
    }
    Ok(())
}

fn numeric_bound(field: &str, op: &str, operand: &Value) -> Result<f64> {
    operand.as_f64().ok_or_else(|| {
        Error::InvalidFilter(format!(
            "'{op}' on field '{field}' expects a number, got {}",
            type_name(operand)
        ))
    })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
