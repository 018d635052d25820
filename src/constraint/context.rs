//! Per-call validation state.
//!
//! Recursive schemas can revisit a constraint without consuming any of the
//! value: a reference that loops back to itself through combinators, or an
//! absent property whose default is checked against a constraint that has the
//! same absent property. Both are tracked here as stack-allocated frames, so a
//! validation call never allocates for them and threads share nothing.
use std::ptr;

use super::{Constraint, ObjectConstraint};
use crate::value::Scope;

/// A reference target entered at the current value.
struct Entered<'a> {
    target: &'a Constraint,
    parent: Option<&'a Entered<'a>>,
}

/// An absent property whose default is being validated.
struct PendingDefault<'a> {
    object: &'a ObjectConstraint,
    property: &'a str,
    parent: Option<&'a PendingDefault<'a>>,
}

#[derive(Clone, Copy)]
pub(crate) struct CheckCtx<'a> {
    scope: Scope,
    entered: Option<&'a Entered<'a>>,
    defaults: Option<&'a PendingDefault<'a>>,
}

impl<'a> CheckCtx<'a> {
    pub(crate) fn new(scope: Scope) -> Self {
        Self { scope, entered: None, defaults: None }
    }

    pub(crate) fn scope(&self) -> Scope {
        self.scope
    }

    /// Context for a child value. Reference loops only matter while the value
    /// stays the same, so the entered list starts over.
    pub(crate) fn descend(self) -> Self {
        Self { entered: None, ..self }
    }

    pub(crate) fn has_entered(&self, target: &Constraint) -> bool {
        let mut frame = self.entered;
        while let Some(f) = frame {
            if ptr::eq(f.target, target) {
                return true;
            }
            frame = f.parent;
        }
        false
    }

    pub(crate) fn with_entered<R>(self, target: &Constraint, f: impl FnOnce(CheckCtx<'_>) -> R) -> R {
        let frame = Entered { target, parent: self.entered };
        f(CheckCtx {
            scope: self.scope,
            entered: Some(&frame),
            defaults: self.defaults,
        })
    }

    pub(crate) fn is_default_pending(&self, object: &ObjectConstraint, property: &str) -> bool {
        let mut frame = self.defaults;
        while let Some(f) = frame {
            if ptr::eq(f.object, object) && f.property == property {
                return true;
            }
            frame = f.parent;
        }
        false
    }

    pub(crate) fn with_pending_default<R>(
        self,
        object: &ObjectConstraint,
        property: &str,
        f: impl FnOnce(CheckCtx<'_>) -> R,
    ) -> R {
        let frame = PendingDefault { object, property, parent: self.defaults };
        f(CheckCtx {
            scope: self.scope,
            entered: self.entered,
            defaults: Some(&frame),
        })
    }
}
