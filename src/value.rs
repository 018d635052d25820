//! Dynamic value helpers.
//!
//! Validation runs over `serde_json::Value` uniformly. Rust structs are
//! serialised first and then validated in [`Scope::Record`], where the field
//! names of every object come from a [`FieldNameProvider`] instead of the map
//! keys.
use std::fmt::Debug;

use serde_json::{Map, Value};

/// How object targets expose their property names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Decoded document: every key of a map is a property.
    Document,
    /// Serialised record: property names come from the object's provider.
    Record,
}

/// Derives the field names of a serialised record.
pub trait FieldNameProvider: Send + Sync + Debug {
    fn field_names(&self, record: &Map<String, Value>) -> Vec<String>;
}

/// Every serialised key is a field.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerializedFieldNames;

impl FieldNameProvider for SerializedFieldNames {
    fn field_names(&self, record: &Map<String, Value>) -> Vec<String> {
        record.keys().cloned().collect()
    }
}

/// Only keys holding a non-null value are fields, so `None` members of a
/// struct count as absent and their defaults apply.
#[derive(Debug, Clone, Copy, Default)]
pub struct PresentFieldNames;

impl FieldNameProvider for PresentFieldNames {
    fn field_names(&self, record: &Map<String, Value>) -> Vec<String> {
        record
            .iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, _)| k.clone())
            .collect()
    }
}

pub fn kind_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Deep equality where numbers compare by value (`1 == 1.0`).
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| values_equal(x, y)))
        }
        _ => a == b,
    }
}

/// True for numbers with no fractional part, whatever their decoded width.
pub fn is_whole(f: f64) -> bool {
    f.is_finite() && f.fract() == 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_compare_by_value() {
        assert!(values_equal(&json!(1), &json!(1.0)));
        assert!(values_equal(&json!([1, {"a": 2}]), &json!([1.0, {"a": 2.0}])));
        assert!(!values_equal(&json!("1"), &json!(1)));
        assert!(!values_equal(&json!({"a": 1}), &json!({"a": 1, "b": 2})));
    }

    #[test]
    fn present_field_names_skip_nulls() {
        let record = json!({"name": null, "age": 3});
        let Value::Object(map) = record else { unreachable!() };
        assert_eq!(PresentFieldNames.field_names(&map), vec!["age".to_string()]);
        assert_eq!(SerializedFieldNames.field_names(&map).len(), 2);
    }
}
