//! Type inference for schemas that omit `type`: the keywords present imply it.
use serde_json::Value;

use crate::schema::{Exclusive, PrimitiveType, Schema};
use crate::value::is_whole;

/// Implied types, in the order objects, arrays, strings, numbers, then
/// whatever kinds the `enum` values add.
pub(crate) fn guess_types(s: &Schema) -> Vec<PrimitiveType> {
    let mut out = Vec::new();
    if implies_object(s) {
        push(&mut out, PrimitiveType::Object);
    }
    if implies_array(s) {
        push(&mut out, PrimitiveType::Array);
    }
    if implies_string(s) {
        push(&mut out, PrimitiveType::String);
    }
    if let Some(t) = implied_numeric(s) {
        push(&mut out, t);
    }
    if let Some(values) = &s.enum_ {
        for v in values {
            push(&mut out, kind_of(v));
        }
    }
    // number subsumes integer
    if out.contains(&PrimitiveType::Number) {
        out.retain(|t| *t != PrimitiveType::Integer);
    }
    out
}

fn push(out: &mut Vec<PrimitiveType>, t: PrimitiveType) {
    if !out.contains(&t) {
        out.push(t);
    }
}

fn implies_object(s: &Schema) -> bool {
    !s.properties.is_empty()
        || !s.required.is_empty()
        || !s.dependencies.is_empty()
        || s.additional_properties.is_some()
}

fn implies_array(s: &Schema) -> bool {
    s.items.is_some()
        || s.additional_items.is_some()
        || s.min_items.is_some()
        || s.max_items.is_some()
        || s.unique_items.is_some()
}

fn implies_string(s: &Schema) -> bool {
    s.pattern.is_some() || s.min_length.is_some() || s.max_length.is_some() || s.format.is_some()
}

/// Integer when every numeric bound is whole.
fn implied_numeric(s: &Schema) -> Option<PrimitiveType> {
    let mut bounds: Vec<f64> = [s.minimum, s.maximum, s.multiple_of].into_iter().flatten().collect();
    for e in [s.exclusive_minimum, s.exclusive_maximum].into_iter().flatten() {
        if let Exclusive::Limit(x) = e {
            bounds.push(x);
        }
    }
    if bounds.is_empty() {
        return None;
    }
    Some(if bounds.iter().all(|b| is_whole(*b)) {
        PrimitiveType::Integer
    } else {
        PrimitiveType::Number
    })
}

fn kind_of(v: &Value) -> PrimitiveType {
    match v {
        Value::Null => PrimitiveType::Null,
        Value::Bool(_) => PrimitiveType::Boolean,
        Value::Number(n) if n.is_i64() || n.is_u64() => PrimitiveType::Integer,
        Value::Number(n) if n.as_f64().is_some_and(is_whole) => PrimitiveType::Integer,
        Value::Number(_) => PrimitiveType::Number,
        Value::String(_) => PrimitiveType::String,
        Value::Array(_) => PrimitiveType::Array,
        Value::Object(_) => PrimitiveType::Object,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use PrimitiveType::*;

    fn guess(doc: Value) -> Vec<PrimitiveType> {
        guess_types(&Schema::from_value(&doc).unwrap())
    }

    #[test]
    fn keywords_imply_types() {
        assert_eq!(guess(json!({"properties": {"a": {}}})), vec![Object]);
        assert_eq!(guess(json!({"required": ["a"]})), vec![Object]);
        assert_eq!(guess(json!({"items": {}})), vec![Array]);
        assert_eq!(guess(json!({"maxLength": 3})), vec![String]);
        assert_eq!(guess(json!({"minimum": 0, "maximum": 10})), vec![Integer]);
        assert_eq!(guess(json!({"minimum": 0, "maximum": 0.5})), vec![Number]);
        assert_eq!(guess(json!({"exclusiveMinimum": 1.5})), vec![Number]);
        assert!(guess(json!({})).is_empty());
        assert!(guess(json!({"exclusiveMinimum": true})).is_empty());
    }

    #[test]
    fn enum_values_add_their_kinds() {
        assert_eq!(guess(json!({"enum": ["a", "b"]})), vec![String]);
        assert_eq!(guess(json!({"enum": [1, 2.0]})), vec![Integer]);
        assert_eq!(guess(json!({"enum": [1, 2.5, null]})), vec![Number, Null]);
        assert_eq!(guess(json!({"maxLength": 2, "enum": [true]})), vec![String, Boolean]);
    }
}
