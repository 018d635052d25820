use json_val::{Compiler, ErrorKind};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::{Value, json};

fn compile(schema: Value) -> json_val::Validator {
    Compiler::new().compile(&schema).unwrap()
}

// ---- array length bounds ---- //

proptest! {
    #[test]
    fn array_length_bounds(min in 0usize..6, span in 0usize..6, len in 0usize..16) {
        let max = min + span;
        let v = compile(json!({"type": "array", "minItems": min, "maxItems": max}));
        let doc = Value::Array(vec![json!(null); len]);
        let outcome = v.validate(&doc);
        if len < min || len > max {
            prop_assert_eq!(outcome.unwrap_err().kind(), ErrorKind::RangeViolation);
        } else {
            prop_assert!(outcome.is_ok());
        }
    }

    #[test]
    fn required_property_toggles_outcome(name in "[a-z]{1,8}", n in any::<i32>()) {
        let v = compile(json!({
            "type": "object",
            "properties": {name.clone(): {"type": "integer"}},
            "required": [name.clone()]
        }));
        let err = v.validate(&json!({})).unwrap_err();
        prop_assert_eq!(err.kind(), ErrorKind::StructuralViolation);
        let doc = json!({name: n});
        prop_assert!(v.validate(&doc).is_ok());
    }

    #[test]
    fn disjoint_one_of_passes_each_integer_once(n in any::<i64>()) {
        let v = compile(json!({"oneOf": [
            {"type": "integer", "exclusiveMaximum": 0},
            {"type": "integer", "minimum": 0}
        ]}));
        prop_assert!(v.validate(&json!(n)).is_ok());
    }
}

// ---- fixed examples ---- //

#[test]
fn integer_round_trip() {
    let v = compile(json!({"type": "integer", "minimum": 5, "maximum": 15, "default": 10}));
    assert!(v.validate(&json!(10)).is_ok());
    assert_eq!(v.validate(&json!(4)).unwrap_err().kind(), ErrorKind::RangeViolation);
    assert_eq!(v.validate(&json!(16)).unwrap_err().kind(), ErrorKind::RangeViolation);
    assert!(v.root().has_default());
    assert_eq!(v.root().default_value(), Some(json!(10)));
}

#[test]
fn tuple_mode() {
    let v = compile(json!({
        "items": [{"type": "string"}, {"type": "integer"}],
        "additionalItems": false
    }));
    assert!(v.validate(&json!(["a", 1])).is_ok());
    assert_eq!(
        v.validate(&json!(["a", 1, "extra"])).unwrap_err().kind(),
        ErrorKind::StructuralViolation
    );
    assert_eq!(v.validate(&json!([1, "a"])).unwrap_err().kind(), ErrorKind::TypeMismatch);
}

#[test]
fn self_reference() {
    let v = compile(json!({"type": "object", "properties": {"child": {"$ref": "#"}}}));
    assert!(v.validate(&json!({"child": {}})).is_ok());
    let err = v.validate(&json!({"child": {"child": 5}})).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    assert_eq!(err.to_string(), "property 'child': property 'child': expected object, found number");
}

#[test]
fn recursive_definition_deep_document() {
    let v = compile(json!({
        "definitions": {
            "tree": {
                "type": "object",
                "properties": {
                    "value": {"type": "integer"},
                    "children": {"type": "array", "items": {"$ref": "#/definitions/tree"}}
                },
                "required": ["value"]
            }
        },
        "$ref": "#/definitions/tree"
    }));

    let mut doc = json!({"value": 0});
    for i in 1..50 {
        doc = json!({"value": i, "children": [doc, {"value": -i}]});
    }
    assert!(v.validate(&doc).is_ok());
    assert!(v.validate(&json!({"value": 1, "children": [{"children": []}]})).is_err());
}

#[test]
fn defaults_apply_through_references() {
    let v = compile(json!({
        "definitions": {
            "retry": {
                "type": "object",
                "properties": {
                    "attempts": {"type": "integer", "default": 3},
                    "backoff": {"type": "string", "enum": ["linear", "exponential"], "default": "linear"}
                }
            }
        },
        "type": "object",
        "properties": {
            "name": {"type": "string"},
            "retry": {"$ref": "#/definitions/retry"}
        },
        "required": ["name"]
    }));

    let mut doc = json!({"name": "job", "retry": {"attempts": 5}});
    assert!(v.validate(&doc).is_ok());
    v.apply_defaults(&mut doc);
    assert_eq!(
        doc,
        json!({"name": "job", "retry": {"attempts": 5, "backoff": "linear"}})
    );
}

#[test]
fn validator_is_shared_across_rayon_workers() {
    use rayon::prelude::*;

    let v = compile(json!({"type": "object", "properties": {"next": {"$ref": "#"}, "n": {"type": "integer"}}}));
    let docs: Vec<Value> = (0..200)
        .map(|i| if i % 2 == 0 { json!({"n": i, "next": {"n": i}}) } else { json!({"next": {"n": "x"}}) })
        .collect();
    let passed = docs.par_iter().filter(|d| v.validate(d).is_ok()).count();
    assert_eq!(passed, 100);
}

#[test]
fn recursive_object_with_its_own_default() {
    let v = compile(json!({
        "type": "object",
        "properties": {"child": {"$ref": "#"}},
        "default": {}
    }));
    assert!(v.validate(&json!({})).is_ok());
    assert!(v.validate(&json!({"child": {"child": {}}})).is_ok());
    assert_eq!(v.validate(&json!({"child": 1})).unwrap_err().kind(), ErrorKind::TypeMismatch);

    let mut doc = json!({"child": {}});
    v.apply_defaults(&mut doc);
    assert_eq!(doc, json!({"child": {"child": {}}}));
}

#[test]
fn reference_cycle_through_a_combinator() {
    let v = compile(json!({
        "definitions": {
            "n": {"anyOf": [{"type": "null"}, {"$ref": "#/definitions/n"}]}
        },
        "type": "object",
        "properties": {"child": {"$ref": "#/definitions/n"}}
    }));
    assert!(v.validate(&json!({})).is_ok());
    assert!(v.validate(&json!({"child": null})).is_ok());
    assert_eq!(
        v.validate(&json!({"child": 5})).unwrap_err().kind(),
        ErrorKind::CombinatorViolation
    );

    let mut doc = json!({});
    v.apply_defaults(&mut doc);
    assert_eq!(doc, json!({}));
}
