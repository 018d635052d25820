use serde_json::Value;

use crate::error::ValidationError;

#[derive(Debug, Clone, Default)]
pub struct BooleanConstraint {
    pub default: Option<Value>,
    /// When set, the value must equal this.
    pub expected: Option<bool>,
}

impl BooleanConstraint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default(mut self, v: Value) -> Self {
        self.default = Some(v);
        self
    }

    pub fn expect_value(mut self, b: bool) -> Self {
        self.expected = Some(b);
        self
    }

    pub fn validate(&self, v: &Value) -> Result<(), ValidationError> {
        let Value::Bool(b) = v else {
            return Err(ValidationError::type_mismatch("boolean", v));
        };
        match self.expected {
            Some(expected) if expected != *b => Err(ValidationError::Format(format!(
                "expected value to be {expected}, but got {b}"
            ))),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn kind_and_expected_value() {
        let c = BooleanConstraint::new();
        assert!(c.validate(&json!(false)).is_ok());
        assert_eq!(c.validate(&json!("true")).unwrap_err().kind(), ErrorKind::TypeMismatch);

        let c = BooleanConstraint::new().expect_value(true);
        assert!(c.validate(&json!(true)).is_ok());
        assert_eq!(c.validate(&json!(false)).unwrap_err().kind(), ErrorKind::FormatViolation);
    }
}
