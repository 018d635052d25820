use std::sync::{Arc, OnceLock, Weak};

use serde_json::Value;
use tracing::trace;

use super::{CheckCtx, Constraint};
use crate::error::ValidationError;
use crate::validator::{ReferenceTable, Validator};

/// A constraint defined elsewhere, looked up by name in the validator's
/// reference table on first use.
///
/// Neither the table nor the resolved constraint is owned here, so
/// self-referential trees do not form reference-count cycles.
#[derive(Debug)]
pub struct ReferenceConstraint {
    table: Weak<ReferenceTable>,
    reference: String,
    resolved: OnceLock<Weak<Constraint>>,
}

impl ReferenceConstraint {
    pub fn new(validator: &Validator, reference: impl Into<String>) -> Self {
        Self::with_table(validator.references(), reference)
    }

    pub(crate) fn with_table(table: &Arc<ReferenceTable>, reference: impl Into<String>) -> Self {
        Self {
            table: Arc::downgrade(table),
            reference: reference.into(),
            resolved: OnceLock::new(),
        }
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn resolved(&self) -> Result<Arc<Constraint>, ValidationError> {
        if let Some(c) = self.resolved.get().and_then(Weak::upgrade) {
            return Ok(c);
        }
        let c = self
            .table
            .upgrade()
            .and_then(|table| table.get(&self.reference))
            .ok_or_else(|| ValidationError::Reference(self.reference.clone()))?;
        trace!(reference = %self.reference, "reference resolved");
        // first resolution wins; later callers reuse it
        let _ = self.resolved.set(Arc::downgrade(&c));
        Ok(c)
    }

    /// Entering the same target twice for one value is a loop that can never
    /// finish, so it fails instead.
    pub(crate) fn check(&self, v: &Value, cx: CheckCtx<'_>) -> Result<(), ValidationError> {
        let target = self.resolved()?;
        if cx.has_entered(&target) {
            return Err(ValidationError::CircularReference(self.reference.clone()));
        }
        cx.with_entered(&target, |cx| target.check_in(v, cx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::{AnyConstraint, IntegerConstraint, StringConstraint};
    use crate::error::ErrorKind;
    use crate::value::Scope;
    use serde_json::json;

    #[test]
    fn resolves_lazily_and_caches() {
        let v = Validator::new();
        let r = ReferenceConstraint::new(&v, "#/definitions/name");

        let err = r.check(&json!("x"), CheckCtx::new(Scope::Document)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ReferenceError);

        v.set_reference("#/definitions/name", StringConstraint::new());
        assert!(r.check(&json!("x"), CheckCtx::new(Scope::Document)).is_ok());
        assert!(r.check(&json!(1), CheckCtx::new(Scope::Document)).is_err());

        let first = r.resolved().unwrap();
        let again = r.resolved().unwrap();
        assert!(Arc::ptr_eq(&first, &again));
    }

    #[test]
    fn default_comes_from_target() {
        let v = Validator::new();
        v.set_reference("#/d", IntegerConstraint::new().with_default(json!(7)));
        let c = Constraint::Reference(ReferenceConstraint::new(&v, "#/d"));
        assert!(c.has_default());
        assert_eq!(c.default_value(), Some(json!(7)));
    }

    #[test]
    fn dropped_validator_is_a_reference_error() {
        let r = {
            let v = Validator::new();
            v.set_reference("#", StringConstraint::new());
            ReferenceConstraint::new(&v, "#")
        };
        assert_eq!(r.resolved().unwrap_err().kind(), ErrorKind::ReferenceError);
    }

    #[test]
    fn loop_without_progress_is_an_error() {
        let mut v = Validator::new();
        let nullable_self = AnyConstraint::new().add(Constraint::Null).add(v.reference("#"));
        v.set_root(nullable_self);
        v.references().insert("#", Arc::clone(v.root()));

        assert!(v.validate(&json!(null)).is_ok());
        let err = v.validate(&json!(5)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CombinatorViolation);

        let r = ReferenceConstraint::new(&v, "#");
        let target = r.resolved().unwrap();
        let cx = CheckCtx::new(Scope::Document);
        let err = cx.with_entered(&target, |cx| r.check(&json!(5), cx)).unwrap_err();
        assert_eq!(err, ValidationError::CircularReference("#".into()));
        assert_eq!(v.root().default_value(), None);
    }
}
