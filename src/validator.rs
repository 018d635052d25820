//! The validator root: the root constraint plus the reference table that
//! `$ref` nodes resolve against.
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;
use serde_json::Value;

use crate::constraint::{Constraint, ReferenceConstraint};
use crate::error::ValidationError;
use crate::value::Scope;

/// Reference name → constraint. Owns every registered constraint.
///
/// Always accessed under its lock: references resolve lazily, possibly from
/// many validating threads at once.
#[derive(Debug, Default)]
pub struct ReferenceTable {
    entries: RwLock<HashMap<String, Arc<Constraint>>>,
}

impl ReferenceTable {
    pub fn insert(&self, name: impl Into<String>, c: Arc<Constraint>) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), c);
    }

    pub fn get(&self, name: &str) -> Option<Arc<Constraint>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}

#[derive(Debug)]
pub struct Validator {
    root: Arc<Constraint>,
    references: Arc<ReferenceTable>,
}

impl Default for Validator {
    fn default() -> Self {
        Self {
            root: Arc::new(Constraint::Empty),
            references: Arc::default(),
        }
    }
}

impl Validator {
    /// An empty validator that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_root(&mut self, c: impl Into<Constraint>) -> &mut Self {
        self.root = Arc::new(c.into());
        self
    }

    pub(crate) fn set_root_shared(&mut self, c: Arc<Constraint>) {
        self.root = c;
    }

    pub fn root(&self) -> &Arc<Constraint> {
        &self.root
    }

    pub fn references(&self) -> &Arc<ReferenceTable> {
        &self.references
    }

    pub fn set_reference(&self, name: impl Into<String>, c: impl Into<Constraint>) -> &Self {
        self.references.insert(name, Arc::new(c.into()));
        self
    }

    pub fn get_reference(&self, name: &str) -> Result<Arc<Constraint>, ValidationError> {
        self.references
            .get(name)
            .ok_or_else(|| ValidationError::Reference(name.to_string()))
    }

    /// A `$ref` node bound to this validator's table.
    pub fn reference(&self, name: impl Into<String>) -> ReferenceConstraint {
        ReferenceConstraint::new(self, name)
    }

    pub fn validate(&self, v: &Value) -> Result<(), ValidationError> {
        self.root.check(v, Scope::Document)
    }

    /// Validate a Rust value through its `Serialize` form. Object field names
    /// come from each object's field name provider.
    pub fn validate_record<T: Serialize>(&self, record: &T) -> Result<(), ValidationError> {
        let v = serde_json::to_value(record)
            .map_err(|e| ValidationError::Unserializable(e.to_string()))?;
        self.root.check(&v, Scope::Record)
    }

    /// Insert declared defaults for absent, non-required properties.
    pub fn apply_defaults(&self, v: &mut Value) {
        self.root.apply_defaults(v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::{IntegerConstraint, ObjectConstraint, StringConstraint};
    use crate::error::ErrorKind;
    use crate::value::PresentFieldNames;
    use serde_json::json;

    #[test]
    fn empty_validator_accepts_everything() {
        assert!(Validator::new().validate(&json!([1, "a", null])).is_ok());
    }

    #[test]
    fn programmatic_self_reference() {
        let mut v = Validator::new();
        let node = ObjectConstraint::new()
            .prop("value", IntegerConstraint::new())
            .prop("next", v.reference("#"));
        v.set_root(node);
        v.references().insert("#", Arc::clone(v.root()));

        assert!(v.validate(&json!({"value": 1, "next": {"value": 2, "next": {}}})).is_ok());
        let err = v.validate(&json!({"next": {"next": {"value": "x"}}})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn get_reference() {
        let v = Validator::new();
        assert_eq!(v.get_reference("#/x").unwrap_err().kind(), ErrorKind::ReferenceError);
        v.set_reference("#/x", StringConstraint::new());
        assert!(v.get_reference("#/x").is_ok());
        assert_eq!(v.references().names(), vec!["#/x".to_string()]);
    }

    #[test]
    fn records_and_defaults() {
        #[derive(Serialize)]
        struct Person {
            name: Option<String>,
            age: i32,
        }

        let mut v = Validator::new();
        v.set_root(
            ObjectConstraint::new()
                .prop("name", StringConstraint::new().with_default(json!("John Doe")))
                .prop("age", IntegerConstraint::new())
                .field_names(Arc::new(PresentFieldNames)),
        );
        assert!(v.validate_record(&Person { name: None, age: 10 }).is_ok());
        assert!(v.validate_record(&Person { name: Some("Jane".into()), age: 10 }).is_ok());
        assert!(v.validate(&json!({"name": null, "age": 10})).is_err());

        let mut doc = json!({"age": 10});
        v.apply_defaults(&mut doc);
        assert_eq!(doc, json!({"age": 10, "name": "John Doe"}));
    }

    #[test]
    fn shared_across_threads() {
        let mut v = Validator::new();
        v.set_root(IntegerConstraint::new().minimum(0.0));
        let v = Arc::new(v);
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let v = Arc::clone(&v);
                std::thread::spawn(move || v.validate(&json!(i)).is_ok())
            })
            .collect();
        for h in handles {
            assert!(h.join().unwrap());
        }
    }

    #[test]
    fn mutation_while_validating_in_parallel() {
        use rayon::prelude::*;

        let mut v = Validator::new();
        let root = ObjectConstraint::new()
            .prop("item", v.reference("#/definitions/item"))
            .additional_properties(Some(Constraint::Empty));
        v.set_root(root);
        v.set_reference("#/definitions/item", IntegerConstraint::new().minimum(0.0));

        let docs: Vec<Value> = (0..2000i64)
            .map(|i| {
                let item = if i % 2 == 0 { i } else { -i - 1 };
                json!({"item": item, format!("p{}", i % 50): i})
            })
            .collect();

        let passed = std::thread::scope(|s| {
            s.spawn(|| {
                let Constraint::Object(obj) = v.root().as_ref() else { panic!("expected object root") };
                for i in 0..50 {
                    obj.add_prop(format!("p{i}"), Constraint::Empty)
                        .add_prop_dependency(format!("p{i}"), "item")
                        .set_required("item", true);
                    v.set_reference("#/definitions/item", IntegerConstraint::new().minimum(0.0));
                }
            });
            docs.par_iter().filter(|d| v.validate(d).is_ok()).count()
        });
        assert_eq!(passed, 1000);

        let Constraint::Object(obj) = v.root().as_ref() else { panic!("expected object root") };
        assert_eq!(obj.properties().len(), 51);
        assert!(obj.is_prop_required("item"));
    }
}
