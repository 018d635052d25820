use serde_json::Value;

use super::EnumConstraint;
use crate::error::ValidationError;
use crate::value::is_whole;

/// Tolerance for `multipleOf` on quotients that are not exactly representable.
const MULTIPLE_OF_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Default)]
pub struct NumberConstraint {
    pub default: Option<Value>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    /// Makes `minimum` strict.
    pub exclusive_minimum: bool,
    /// Makes `maximum` strict.
    pub exclusive_maximum: bool,
    pub multiple_of: Option<f64>,
    pub enums: Option<EnumConstraint>,
}

impl NumberConstraint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default(mut self, v: Value) -> Self {
        self.default = Some(v);
        self
    }

    pub fn minimum(mut self, n: f64) -> Self {
        self.minimum = Some(n);
        self
    }

    pub fn maximum(mut self, n: f64) -> Self {
        self.maximum = Some(n);
        self
    }

    pub fn exclusive_minimum(mut self, b: bool) -> Self {
        self.exclusive_minimum = b;
        self
    }

    pub fn exclusive_maximum(mut self, b: bool) -> Self {
        self.exclusive_maximum = b;
        self
    }

    pub fn multiple_of(mut self, n: f64) -> Self {
        self.multiple_of = Some(n);
        self
    }

    pub fn enums(mut self, values: Vec<Value>) -> Self {
        self.enums = Some(EnumConstraint::new(values));
        self
    }

    pub fn validate(&self, v: &Value) -> Result<(), ValidationError> {
        let Some(f) = v.as_f64() else {
            return Err(ValidationError::type_mismatch("number", v));
        };
        self.check_number(f, v)
    }

    /// Range, multiple and enum checks on an already-typed number.
    pub(crate) fn check_number(&self, f: f64, v: &Value) -> Result<(), ValidationError> {
        if let Some(min) = self.minimum {
            if self.exclusive_minimum && f <= min {
                return Err(ValidationError::Range(format!(
                    "numeric value {f} must be greater than {min}"
                )));
            }
            if f < min {
                return Err(ValidationError::Range(format!(
                    "numeric value {f} less than minimum {min}"
                )));
            }
        }

        if let Some(max) = self.maximum {
            if self.exclusive_maximum && f >= max {
                return Err(ValidationError::Range(format!(
                    "numeric value {f} must be less than {max}"
                )));
            }
            if f > max {
                return Err(ValidationError::Range(format!(
                    "numeric value {f} greater than maximum {max}"
                )));
            }
        }

        if let Some(m) = self.multiple_of {
            let q = f / m;
            if (q - q.round()).abs() > MULTIPLE_OF_EPSILON {
                return Err(ValidationError::Range(format!(
                    "numeric value {f} is not a multiple of {m}"
                )));
            }
        }

        if let Some(enums) = &self.enums {
            enums.validate(v)?;
        }
        Ok(())
    }
}

/// A number with no fractional part.
///
/// Decoded JSON may carry whole numbers as floats (`10.0`); those pass.
#[derive(Debug, Clone, Default)]
pub struct IntegerConstraint {
    pub number: NumberConstraint,
}

impl IntegerConstraint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default(mut self, v: Value) -> Self {
        self.number.default = Some(v);
        self
    }

    pub fn minimum(mut self, n: f64) -> Self {
        self.number.minimum = Some(n);
        self
    }

    pub fn maximum(mut self, n: f64) -> Self {
        self.number.maximum = Some(n);
        self
    }

    pub fn exclusive_minimum(mut self, b: bool) -> Self {
        self.number.exclusive_minimum = b;
        self
    }

    pub fn exclusive_maximum(mut self, b: bool) -> Self {
        self.number.exclusive_maximum = b;
        self
    }

    pub fn multiple_of(mut self, n: f64) -> Self {
        self.number.multiple_of = Some(n);
        self
    }

    pub fn enums(mut self, values: Vec<Value>) -> Self {
        self.number.enums = Some(EnumConstraint::new(values));
        self
    }

    pub fn validate(&self, v: &Value) -> Result<(), ValidationError> {
        let Value::Number(n) = v else {
            return Err(ValidationError::type_mismatch("integer", v));
        };
        let Some(f) = n.as_f64() else {
            return Err(ValidationError::type_mismatch("integer", v));
        };
        if !(n.is_i64() || n.is_u64() || is_whole(f)) {
            return Err(ValidationError::TypeMismatch { expected: "integer", found: "number" });
        }
        self.number.check_number(f, v)
    }
}
