use std::collections::HashSet;

use serde_json::Value;

use super::{CheckCtx, Constraint};
use crate::error::ValidationError;
use crate::value::Scope;

/// Sequence rules, in one of two modes:
/// - list: `items` is set and every element must satisfy it;
/// - tuple: element `i` must satisfy `positional_items[i]`, and elements past
///   the positional list must satisfy `additional_items` (`None` rejects them).
///
/// `unique_items` compares the compact JSON text of elements, so `1` and `1.0`
/// are distinct, and so are objects whose keys are in a different order.
#[derive(Debug)]
pub struct ArrayConstraint {
    pub default: Option<Value>,
    pub items: Option<Box<Constraint>>,
    pub positional_items: Vec<Constraint>,
    pub additional_items: Option<Box<Constraint>>,
    pub min_items: Option<usize>,
    pub max_items: Option<usize>,
    pub unique_items: bool,
}

impl Default for ArrayConstraint {
    fn default() -> Self {
        Self {
            default: None,
            items: None,
            positional_items: Vec::new(),
            additional_items: Some(Box::new(Constraint::Empty)),
            min_items: None,
            max_items: None,
            unique_items: false,
        }
    }
}

impl ArrayConstraint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default(mut self, v: Value) -> Self {
        self.default = Some(v);
        self
    }

    pub fn items(mut self, c: impl Into<Constraint>) -> Self {
        self.items = Some(Box::new(c.into()));
        self
    }

    pub fn positional_items(mut self, cs: Vec<Constraint>) -> Self {
        self.positional_items = cs;
        self
    }

    /// `None` forbids elements past the positional list.
    pub fn additional_items(mut self, c: Option<Constraint>) -> Self {
        self.additional_items = c.map(Box::new);
        self
    }

    pub fn min_items(mut self, n: usize) -> Self {
        self.min_items = Some(n);
        self
    }

    pub fn max_items(mut self, n: usize) -> Self {
        self.max_items = Some(n);
        self
    }

    pub fn unique_items(mut self, b: bool) -> Self {
        self.unique_items = b;
        self
    }

    pub fn validate(&self, v: &Value) -> Result<(), ValidationError> {
        self.check(v, CheckCtx::new(Scope::Document))
    }

    pub(crate) fn check(&self, v: &Value, cx: CheckCtx<'_>) -> Result<(), ValidationError> {
        let Value::Array(xs) = v else {
            return Err(ValidationError::type_mismatch("array", v));
        };

        let len = xs.len();
        if let Some(min) = self.min_items {
            if len < min {
                return Err(ValidationError::Range(format!(
                    "{len} items, fewer than minItems {min}"
                )));
            }
        }
        if let Some(max) = self.max_items {
            if len > max {
                return Err(ValidationError::Range(format!(
                    "{len} items, more than maxItems {max}"
                )));
            }
        }

        if self.unique_items {
            let mut seen = HashSet::with_capacity(len);
            for (i, x) in xs.iter().enumerate() {
                if !seen.insert(x.to_string()) {
                    return Err(ValidationError::Structural(format!(
                        "duplicate element found at index {i}: {x}"
                    )));
                }
            }
        }

        // list mode: positional rules do not apply
        if let Some(item) = &self.items {
            for (i, x) in xs.iter().enumerate() {
                item.check_in(x, cx.descend()).map_err(|e| e.at_item(i))?;
            }
            return Ok(());
        }

        // tuple mode
        for (i, (x, c)) in xs.iter().zip(&self.positional_items).enumerate() {
            c.check_in(x, cx.descend()).map_err(|e| e.at_item(i))?;
        }

        let positional = self.positional_items.len();
        if len > positional {
            let Some(extra) = &self.additional_items else {
                return Err(ValidationError::Structural(format!(
                    "additional elements found in array: expected at most {positional}, got {len}"
                )));
            };
            for (i, x) in xs.iter().enumerate().skip(positional) {
                extra.check_in(x, cx.descend()).map_err(|e| e.at_item(i))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::{IntegerConstraint, StringConstraint};
    use crate::error::ErrorKind;
    use serde_json::json;

    fn tuple() -> ArrayConstraint {
        ArrayConstraint::new()
            .positional_items(vec![
                StringConstraint::new().into(),
                IntegerConstraint::new().into(),
            ])
            .additional_items(None)
    }

    #[test]
    fn tuple_mode() {
        let c = tuple();
        assert!(c.validate(&json!(["a", 1])).is_ok());
        assert!(c.validate(&json!(["a"])).is_ok());
        assert_eq!(
            c.validate(&json!(["a", 1, "extra"])).unwrap_err().kind(),
            ErrorKind::StructuralViolation
        );
        assert_eq!(c.validate(&json!([1, "a"])).unwrap_err().kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn tuple_overflow_checks_every_extra_element() {
        let c = tuple().additional_items(Some(StringConstraint::new().into()));
        assert!(c.validate(&json!(["a", 1, "b", "c"])).is_ok());
        let err = c.validate(&json!(["a", 1, "b", 2])).unwrap_err();
        assert!(matches!(err, ValidationError::Item { index: 3, .. }));
    }

    #[test]
    fn list_mode_ignores_positional_rules() {
        let c = tuple().items(IntegerConstraint::new());
        assert!(c.validate(&json!([1, 2, 3, 4])).is_ok());
        assert!(c.validate(&json!(["a", 1])).is_err());
    }

    #[test]
    fn length_bounds() {
        let c = ArrayConstraint::new().min_items(1).max_items(2);
        assert!(c.validate(&json!([])).is_err());
        assert!(c.validate(&json!([1])).is_ok());
        assert!(c.validate(&json!([1, 2])).is_ok());
        assert_eq!(c.validate(&json!([1, 2, 3])).unwrap_err().kind(), ErrorKind::RangeViolation);
    }

    #[test]
    fn unique_items_compares_text() {
        let c = ArrayConstraint::new().unique_items(true);
        assert!(c.validate(&json!([1, 2, 3])).is_ok());
        assert_eq!(c.validate(&json!(["a", "a"])).unwrap_err().kind(), ErrorKind::StructuralViolation);
        assert!(c.validate(&json!([{"a": 1}, {"a": 1}])).is_err());
        // textual comparison: these print differently
        assert!(c.validate(&json!([1, 1.0])).is_ok());
    }

    #[test]
    fn rejects_non_arrays() {
        assert_eq!(
            ArrayConstraint::new().validate(&json!({"0": 1})).unwrap_err().kind(),
            ErrorKind::TypeMismatch
        );
    }
}
