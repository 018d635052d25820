//! The compiled constraint tree.
//!
//! Every checkable node is one variant of the closed [`Constraint`] enum.
//! Validation, default lookup and re-serialisation (see `describe`) all
//! dispatch on the same enum, so adding a variant is a compile error
//! everywhere it is not handled.
pub mod array;
pub mod boolean;
pub mod combinator;
mod context;
pub mod enumeration;
pub mod format;
pub mod number;
pub mod object;
pub mod reference;
pub mod string;

use std::sync::Arc;

use serde_json::Value;

use crate::error::ValidationError;
use crate::value::Scope;

pub use array::ArrayConstraint;
pub use boolean::BooleanConstraint;
pub use combinator::{AllConstraint, AnyConstraint, NotConstraint, OneOfConstraint};
pub(crate) use context::CheckCtx;
pub use enumeration::EnumConstraint;
pub use format::Format;
pub use number::{IntegerConstraint, NumberConstraint};
pub use object::ObjectConstraint;
pub use reference::ReferenceConstraint;
pub use string::StringConstraint;

#[derive(Debug)]
pub enum Constraint {
    /// Accepts every value.
    Empty,
    /// Accepts exactly `null`.
    Null,
    Boolean(BooleanConstraint),
    Number(NumberConstraint),
    Integer(IntegerConstraint),
    String(StringConstraint),
    Array(ArrayConstraint),
    Object(ObjectConstraint),
    Enum(EnumConstraint),
    All(AllConstraint),
    Any(AnyConstraint),
    OneOf(OneOfConstraint),
    Not(NotConstraint),
    Reference(ReferenceConstraint),
}

impl Constraint {
    /// Validate a decoded document value.
    pub fn validate(&self, v: &Value) -> Result<(), ValidationError> {
        self.check(v, Scope::Document)
    }

    pub fn check(&self, v: &Value, scope: Scope) -> Result<(), ValidationError> {
        self.check_in(v, CheckCtx::new(scope))
    }

    pub(crate) fn check_in(&self, v: &Value, cx: CheckCtx<'_>) -> Result<(), ValidationError> {
        match self {
            Self::Empty => Ok(()),
            Self::Null => match v {
                Value::Null => Ok(()),
                _ => Err(ValidationError::type_mismatch("null", v)),
            },
            Self::Boolean(c) => c.validate(v),
            Self::Number(c) => c.validate(v),
            Self::Integer(c) => c.validate(v),
            Self::String(c) => c.validate(v),
            Self::Array(c) => c.check(v, cx),
            Self::Object(c) => c.check(v, cx),
            Self::Enum(c) => c.validate(v),
            Self::All(c) => c.check(v, cx),
            Self::Any(c) => c.check(v, cx),
            Self::OneOf(c) => c.check(v, cx),
            Self::Not(c) => c.check(v, cx),
            Self::Reference(c) => c.check(v, cx),
        }
    }

    pub fn has_default(&self) -> bool {
        self.default_value().is_some()
    }

    /// The declared default. Combinators report the first child that has one.
    pub fn default_value(&self) -> Option<Value> {
        self.lookup_default(&mut Vec::new())
    }

    /// `visited` holds the reference targets already followed; a target seen
    /// twice is a cycle with no default on it.
    fn lookup_default(&self, visited: &mut Vec<*const Constraint>) -> Option<Value> {
        match self {
            Self::Empty | Self::Null | Self::Enum(_) | Self::Not(_) => None,
            Self::Boolean(c) => c.default.clone(),
            Self::Number(c) => c.default.clone(),
            Self::Integer(c) => c.number.default.clone(),
            Self::String(c) => c.default.clone(),
            Self::Array(c) => c.default.clone(),
            Self::Object(c) => c.declared_default().cloned(),
            Self::All(c) => first_default(&c.constraints, visited),
            Self::Any(c) => first_default(&c.constraints, visited),
            Self::OneOf(c) => first_default(&c.constraints, visited),
            Self::Reference(c) => {
                let target = c.resolved().ok()?;
                if !enter(visited, &target) {
                    return None;
                }
                target.lookup_default(visited)
            }
        }
    }

    /// Fill absent, non-required object properties with their defaults.
    pub fn apply_defaults(&self, v: &mut Value) {
        self.apply_defaults_in(v, &mut Vec::new());
    }

    /// `visited` is per value: objects restart it for each child.
    fn apply_defaults_in(&self, v: &mut Value, visited: &mut Vec<*const Constraint>) {
        match self {
            Self::Object(c) => c.apply_defaults(v),
            Self::All(c) => {
                for child in &c.constraints {
                    child.apply_defaults_in(v, visited);
                }
            }
            Self::Reference(c) => {
                let Ok(target) = c.resolved() else { return };
                if enter(visited, &target) {
                    target.apply_defaults_in(v, visited);
                }
            }
            _ => {}
        }
    }

    /// Variant name, as used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Null => "null",
            Self::Boolean(_) => "boolean",
            Self::Number(_) => "number",
            Self::Integer(_) => "integer",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
            Self::Enum(_) => "enum",
            Self::All(_) => "allOf",
            Self::Any(_) => "anyOf",
            Self::OneOf(_) => "oneOf",
            Self::Not(_) => "not",
            Self::Reference(_) => "$ref",
        }
    }
}

fn first_default(constraints: &[Constraint], visited: &mut Vec<*const Constraint>) -> Option<Value> {
    constraints.iter().find_map(|c| c.lookup_default(visited))
}

/// Records `target` as followed; false if it already was.
fn enter(visited: &mut Vec<*const Constraint>, target: &Arc<Constraint>) -> bool {
    let ptr = Arc::as_ptr(target);
    if visited.contains(&ptr) {
        return false;
    }
    visited.push(ptr);
    true
}

macro_rules! impl_from_variant {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Constraint {
                fn from(c: $ty) -> Self {
                    Constraint::$variant(c)
                }
            }
        )*
    };
}

impl_from_variant! {
    BooleanConstraint => Boolean,
    NumberConstraint => Number,
    IntegerConstraint => Integer,
    StringConstraint => String,
    ArrayConstraint => Array,
    ObjectConstraint => Object,
    EnumConstraint => Enum,
    AllConstraint => All,
    AnyConstraint => Any,
    OneOfConstraint => OneOf,
    NotConstraint => Not,
    ReferenceConstraint => Reference,
}
