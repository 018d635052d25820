use serde_json::Value;

use crate::error::ValidationError;
use crate::value::values_equal;

/// Passes when the value equals one of a fixed list of allowed values.
#[derive(Debug, Clone, Default)]
pub struct EnumConstraint {
    pub values: Vec<Value>,
}

impl EnumConstraint {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn validate(&self, v: &Value) -> Result<(), ValidationError> {
        if self.values.iter().any(|e| values_equal(e, v)) {
            return Ok(());
        }
        Err(ValidationError::Format(format!("value {v} is not in enumeration")))
    }
}
