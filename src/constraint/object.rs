use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use indexmap::{IndexMap, IndexSet};
use serde_json::Value;
use tracing::trace;

use super::{CheckCtx, Constraint};
use crate::error::ValidationError;
use crate::value::{FieldNameProvider, Scope, SerializedFieldNames};

/// Record rules.
///
/// Properties, the required set and property dependencies sit behind their own
/// locks, so a shared constraint can still gain members while other threads
/// validate against it. Validation snapshots the property table and never
/// holds a lock while descending into children.
#[derive(Debug)]
pub struct ObjectConstraint {
    default: Option<Value>,
    properties: RwLock<IndexMap<String, Arc<Constraint>>>,
    required: RwLock<IndexSet<String>>,
    dependencies: RwLock<IndexMap<String, Vec<String>>>,
    additional_properties: Option<Box<Constraint>>,
    field_names: Arc<dyn FieldNameProvider>,
}

impl Default for ObjectConstraint {
    fn default() -> Self {
        Self {
            default: None,
            properties: RwLock::default(),
            required: RwLock::default(),
            dependencies: RwLock::default(),
            additional_properties: None,
            field_names: Arc::new(SerializedFieldNames),
        }
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

impl ObjectConstraint {
    /// An object that allows no undeclared properties.
    pub fn new() -> Self {
        Self::default()
    }

    // ---------------------------- shared mutation ---------------------------- //

    pub fn add_prop(&self, name: impl Into<String>, c: impl Into<Constraint>) -> &Self {
        write(&self.properties).insert(name.into(), Arc::new(c.into()));
        self
    }

    pub fn set_required(&self, name: impl Into<String>, required: bool) -> &Self {
        let name = name.into();
        let mut set = write(&self.required);
        if required {
            set.insert(name);
        } else {
            set.shift_remove(&name);
        }
        self
    }

    /// If `name` is present, `depends_on` must be present too.
    pub fn add_prop_dependency(&self, name: impl Into<String>, depends_on: impl Into<String>) -> &Self {
        write(&self.dependencies)
            .entry(name.into())
            .or_default()
            .push(depends_on.into());
        self
    }

    // -------------------------------- builder -------------------------------- //

    pub fn prop(self, name: impl Into<String>, c: impl Into<Constraint>) -> Self {
        self.add_prop(name, c);
        self
    }

    pub fn required_prop(self, name: impl Into<String>, c: impl Into<Constraint>) -> Self {
        let name = name.into();
        self.set_required(name.clone(), true);
        self.prop(name, c)
    }

    pub fn dependency(self, name: impl Into<String>, depends_on: impl Into<String>) -> Self {
        self.add_prop_dependency(name, depends_on);
        self
    }

    /// `None` rejects undeclared properties; `Some` validates them.
    pub fn additional_properties(mut self, c: Option<Constraint>) -> Self {
        self.additional_properties = c.map(Box::new);
        self
    }

    pub fn with_default(mut self, v: Value) -> Self {
        self.default = Some(v);
        self
    }

    pub fn field_names(mut self, provider: Arc<dyn FieldNameProvider>) -> Self {
        self.field_names = provider;
        self
    }

    // ------------------------------- inspection ------------------------------ //

    pub fn declared_default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Snapshot of the declared properties in declaration order.
    pub fn properties(&self) -> Vec<(String, Arc<Constraint>)> {
        read(&self.properties)
            .iter()
            .map(|(k, c)| (k.clone(), Arc::clone(c)))
            .collect()
    }

    pub fn property(&self, name: &str) -> Option<Arc<Constraint>> {
        read(&self.properties).get(name).cloned()
    }

    pub fn is_prop_required(&self, name: &str) -> bool {
        read(&self.required).contains(name)
    }

    pub fn required_names(&self) -> Vec<String> {
        read(&self.required).iter().cloned().collect()
    }

    pub fn dependencies(&self) -> IndexMap<String, Vec<String>> {
        read(&self.dependencies).clone()
    }

    pub fn additional(&self) -> Option<&Constraint> {
        self.additional_properties.as_deref()
    }

    // ------------------------------- validation ------------------------------ //

    pub fn validate(&self, v: &Value) -> Result<(), ValidationError> {
        self.check(v, CheckCtx::new(Scope::Document))
    }

    pub(crate) fn check(&self, v: &Value, cx: CheckCtx<'_>) -> Result<(), ValidationError> {
        let Value::Object(map) = v else {
            return Err(ValidationError::type_mismatch("object", v));
        };

        // a provider may name fields the serialised form does not carry
        let names = match cx.scope() {
            Scope::Document => map.keys().cloned().collect::<Vec<_>>(),
            Scope::Record => self
                .field_names
                .field_names(map)
                .into_iter()
                .filter(|name| map.contains_key(name))
                .collect(),
        };
        let mut pending: IndexSet<String> = names.into_iter().collect();
        let mut seen: HashSet<String> = HashSet::new();

        for (name, c) in self.properties() {
            let present = pending.shift_remove(&name);
            match map.get(&name) {
                Some(value) if present => {
                    c.check_in(value, cx.descend()).map_err(|e| e.at_property(&name))?;
                    seen.insert(name);
                }
                _ => {
                    if self.is_prop_required(&name) {
                        return Err(ValidationError::Structural(format!(
                            "property '{name}' is required"
                        )));
                    }
                    // a default is held to the same rules as a live value,
                    // once per path: a recursive default would otherwise
                    // reach this same property again
                    if cx.is_default_pending(self, &name) {
                        trace!(property = %name, "default already being validated");
                        continue;
                    }
                    if let Some(dv) = c.default_value() {
                        trace!(property = %name, "validating default value");
                        cx.with_pending_default(self, &name, |cx| c.check_in(&dv, cx.descend()))
                            .map_err(|e| e.at_property(&name))?;
                        seen.insert(name);
                    }
                }
            }
        }

        if !pending.is_empty() {
            let Some(extra) = &self.additional_properties else {
                let names = pending.iter().map(String::as_str).collect::<Vec<_>>().join("', '");
                return Err(ValidationError::Structural(format!(
                    "additional properties are not allowed: '{names}'"
                )));
            };
            for name in pending {
                let Some(value) = map.get(&name) else { continue };
                extra.check_in(value, cx.descend()).map_err(|e| e.at_property(&name))?;
                seen.insert(name);
            }
        }

        for (name, deps) in read(&self.dependencies).iter() {
            if !seen.contains(name) {
                continue;
            }
            if let Some(missing) = deps.iter().find(|d| !seen.contains(d.as_str())) {
                return Err(ValidationError::Structural(format!(
                    "required dependency is missing: '{name}' requires '{missing}'"
                )));
            }
        }
        Ok(())
    }

    pub(crate) fn apply_defaults(&self, v: &mut Value) {
        let Value::Object(map) = v else { return };
        for (name, c) in self.properties() {
            match map.get_mut(&name) {
                Some(child) => c.apply_defaults(child),
                None => {
                    if self.is_prop_required(&name) {
                        continue;
                    }
                    if let Some(dv) = c.default_value() {
                        map.insert(name, dv);
                    }
                }
            }
        }
    }
}
