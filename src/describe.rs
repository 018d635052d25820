//! Constraint tree → schema document.
//!
//! Emits the keywords a compiled tree actually enforces, so feeding the output
//! back through the compiler yields a validator with the same behaviour.
//! References are emitted by name and never followed.
use serde_json::{Map, Value, json};

use crate::constraint::{ArrayConstraint, Constraint, NumberConstraint, ObjectConstraint, StringConstraint};
use crate::validator::Validator;
use crate::value::is_whole;

/// Largest magnitude at which every whole `f64` is an exact integer.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

pub fn to_schema(c: &Constraint) -> Value {
    match c {
        Constraint::Empty => json!({}),
        Constraint::Null => json!({ "type": "null" }),
        Constraint::Boolean(b) => {
            let mut o = json!({ "type": "boolean" });
            if let Some(x) = b.expected {
                o["enum"] = json!([x]);
            }
            with_default(o, b.default.as_ref())
        }
        Constraint::Number(n) => number_schema("number", n),
        Constraint::Integer(i) => number_schema("integer", &i.number),
        Constraint::String(s) => string_schema(s),
        Constraint::Array(a) => array_schema(a),
        Constraint::Object(o) => object_schema(o),
        Constraint::Enum(e) => json!({ "enum": e.values }),
        Constraint::All(x) => json!({ "allOf": x.constraints.iter().map(to_schema).collect::<Vec<_>>() }),
        Constraint::Any(x) => json!({ "anyOf": x.constraints.iter().map(to_schema).collect::<Vec<_>>() }),
        Constraint::OneOf(x) => json!({ "oneOf": x.constraints.iter().map(to_schema).collect::<Vec<_>>() }),
        Constraint::Not(x) => json!({ "not": to_schema(&x.constraint) }),
        Constraint::Reference(r) => json!({ "$ref": r.reference() }),
    }
}

/// The root schema, with every `#/definitions/<name>` reference the validator
/// knows about written back under `definitions`.
///
/// Other pointer references are emitted as-is and only resolve if the
/// emitted root happens to have the same shape at that pointer.
pub fn validator_schema(v: &Validator) -> Value {
    let root = to_schema(v.root());
    let mut definitions = Map::new();
    for name in v.references().names() {
        let Some(key) = definition_key(&name) else { continue };
        if let Some(c) = v.references().get(&name) {
            definitions.insert(key, to_schema(&c));
        }
    }
    if definitions.is_empty() {
        return root;
    }
    match root {
        Value::Object(mut map) => {
            map.insert("definitions".into(), Value::Object(definitions));
            Value::Object(map)
        }
        other => other,
    }
}

/// `#/definitions/a~1b` → `a/b`. Nested pointers below a definition are skipped.
fn definition_key(reference: &str) -> Option<String> {
    let rest = reference.strip_prefix("#/definitions/")?;
    if rest.contains('/') {
        return None;
    }
    Some(rest.replace("~1", "/").replace("~0", "~"))
}

fn with_default(mut o: Value, default: Option<&Value>) -> Value {
    if let Some(d) = default {
        o["default"] = d.clone();
    }
    o
}

fn number(f: f64) -> Value {
    if is_whole(f) && f.abs() <= MAX_EXACT_INTEGER {
        Value::from(f as i64)
    } else {
        Value::from(f)
    }
}

fn number_schema(ty: &str, n: &NumberConstraint) -> Value {
    let mut o = json!({ "type": ty });
    if let Some(m) = n.minimum {
        o["minimum"] = number(m);
        if n.exclusive_minimum {
            o["exclusiveMinimum"] = Value::Bool(true);
        }
    }
    if let Some(m) = n.maximum {
        o["maximum"] = number(m);
        if n.exclusive_maximum {
            o["exclusiveMaximum"] = Value::Bool(true);
        }
    }
    if let Some(m) = n.multiple_of {
        o["multipleOf"] = number(m);
    }
    if let Some(e) = &n.enums {
        o["enum"] = Value::Array(e.values.clone());
    }
    with_default(o, n.default.as_ref())
}

fn string_schema(s: &StringConstraint) -> Value {
    let mut o = json!({ "type": "string" });
    if let Some(n) = s.min_length {
        o["minLength"] = Value::from(n);
    }
    if let Some(n) = s.max_length {
        o["maxLength"] = Value::from(n);
    }
    if let Some(rx) = &s.pattern {
        o["pattern"] = Value::from(rx.as_str());
    }
    if let Some(f) = &s.format {
        o["format"] = Value::from(f.as_str());
    }
    if let Some(e) = &s.enums {
        o["enum"] = Value::Array(e.values.clone());
    }
    with_default(o, s.default.as_ref())
}

fn array_schema(a: &ArrayConstraint) -> Value {
    let mut o = json!({ "type": "array" });
    if let Some(item) = &a.items {
        o["items"] = to_schema(item);
    } else if !a.positional_items.is_empty() {
        o["items"] = Value::Array(a.positional_items.iter().map(to_schema).collect());
        match a.additional_items.as_deref() {
            None => o["additionalItems"] = Value::Bool(false),
            Some(Constraint::Empty) => {}
            Some(c) => o["additionalItems"] = to_schema(c),
        }
    }
    if let Some(n) = a.min_items {
        o["minItems"] = Value::from(n);
    }
    if let Some(n) = a.max_items {
        o["maxItems"] = Value::from(n);
    }
    if a.unique_items {
        o["uniqueItems"] = Value::Bool(true);
    }
    with_default(o, a.default.as_ref())
}

fn object_schema(c: &ObjectConstraint) -> Value {
    let mut o = json!({ "type": "object" });

    let props: Map<String, Value> = c
        .properties()
        .into_iter()
        .map(|(name, p)| (name, to_schema(&p)))
        .collect();
    if !props.is_empty() {
        o["properties"] = Value::Object(props);
    }

    let required = c.required_names();
    if !required.is_empty() {
        o["required"] = Value::Array(required.into_iter().map(Value::from).collect());
    }

    let deps: Map<String, Value> = c
        .dependencies()
        .into_iter()
        .map(|(name, targets)| (name, Value::Array(targets.into_iter().map(Value::from).collect())))
        .collect();
    if !deps.is_empty() {
        o["dependencies"] = Value::Object(deps);
    }

    // always explicit: what an absent keyword means depends on compile options
    o["additionalProperties"] = match c.additional() {
        None => Value::Bool(false),
        Some(Constraint::Empty) => Value::Bool(true),
        Some(a) => to_schema(a),
    };

    with_default(o, c.declared_default())
}
