use serde_json::Value;
use tracing::trace;

use super::{CheckCtx, Constraint};
use crate::error::ValidationError;

/// Conjunction. Stops at the first failing child and returns its error.
#[derive(Debug, Default)]
pub struct AllConstraint {
    pub constraints: Vec<Constraint>,
}

/// At least one child must pass.
#[derive(Debug, Default)]
pub struct AnyConstraint {
    pub constraints: Vec<Constraint>,
}

/// Exactly one child must pass. Every child is evaluated.
#[derive(Debug, Default)]
pub struct OneOfConstraint {
    pub constraints: Vec<Constraint>,
}

/// Passes only when the wrapped constraint fails.
#[derive(Debug)]
pub struct NotConstraint {
    pub constraint: Box<Constraint>,
}

impl AllConstraint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(mut self, c: impl Into<Constraint>) -> Self {
        self.constraints.push(c.into());
        self
    }

    /// Collapse to the only child, or to `Empty` when there is none.
    pub fn reduce(mut self) -> Constraint {
        match self.constraints.len() {
            0 => Constraint::Empty,
            1 => self.constraints.remove(0),
            _ => Constraint::All(self),
        }
    }

    pub(crate) fn check(&self, v: &Value, cx: CheckCtx<'_>) -> Result<(), ValidationError> {
        for c in &self.constraints {
            c.check_in(v, cx)?;
        }
        Ok(())
    }
}

impl AnyConstraint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(mut self, c: impl Into<Constraint>) -> Self {
        self.constraints.push(c.into());
        self
    }

    pub fn reduce(mut self) -> Constraint {
        if self.constraints.len() == 1 {
            return self.constraints.remove(0);
        }
        Constraint::Any(self)
    }

    pub(crate) fn check(&self, v: &Value, cx: CheckCtx<'_>) -> Result<(), ValidationError> {
        if self.constraints.iter().any(|c| c.check_in(v, cx).is_ok()) {
            return Ok(());
        }
        Err(ValidationError::Combinator(format!(
            "could not validate against any of the {} constraints",
            self.constraints.len()
        )))
    }
}

impl OneOfConstraint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(mut self, c: impl Into<Constraint>) -> Self {
        self.constraints.push(c.into());
        self
    }

    pub fn reduce(mut self) -> Constraint {
        if self.constraints.len() == 1 {
            return self.constraints.remove(0);
        }
        Constraint::OneOf(self)
    }

    pub(crate) fn check(&self, v: &Value, cx: CheckCtx<'_>) -> Result<(), ValidationError> {
        let passed = self
            .constraints
            .iter()
            .filter(|c| c.check_in(v, cx).is_ok())
            .count();
        trace!(passed, of = self.constraints.len(), "oneOf evaluated");
        match passed {
            1 => Ok(()),
            0 => Err(ValidationError::Combinator(
                "none of the oneOf constraints matched".to_string(),
            )),
            n => Err(ValidationError::Combinator(format!(
                "{n} of the oneOf constraints matched, expected exactly one"
            ))),
        }
    }
}

impl NotConstraint {
    pub fn new(c: impl Into<Constraint>) -> Self {
        Self { constraint: Box::new(c.into()) }
    }

    pub(crate) fn check(&self, v: &Value, cx: CheckCtx<'_>) -> Result<(), ValidationError> {
        match self.constraint.check_in(v, cx) {
            Ok(()) => Err(ValidationError::Combinator(format!(
                "negated {} constraint unexpectedly passed",
                self.constraint.name()
            ))),
            Err(_) => Ok(()),
        }
    }
}
