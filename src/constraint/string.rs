use regex::Regex;
use serde_json::Value;

use super::{EnumConstraint, Format};
use crate::error::ValidationError;

/// String rules. Lengths count Unicode scalar values, not bytes.
///
/// A default is never substituted for an empty string: `""` is a value.
#[derive(Debug, Clone, Default)]
pub struct StringConstraint {
    pub default: Option<Value>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub format: Option<Format>,
    /// Must match somewhere in the value (unanchored search).
    pub pattern: Option<Regex>,
    pub enums: Option<EnumConstraint>,
}

impl StringConstraint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default(mut self, v: Value) -> Self {
        self.default = Some(v);
        self
    }

    pub fn min_length(mut self, n: usize) -> Self {
        self.min_length = Some(n);
        self
    }

    pub fn max_length(mut self, n: usize) -> Self {
        self.max_length = Some(n);
        self
    }

    pub fn format(mut self, f: Format) -> Self {
        self.format = Some(f);
        self
    }

    pub fn pattern(mut self, rx: Regex) -> Self {
        self.pattern = Some(rx);
        self
    }

    pub fn pattern_str(self, pattern: &str) -> Result<Self, regex::Error> {
        Ok(self.pattern(Regex::new(pattern)?))
    }

    pub fn enums(mut self, values: Vec<Value>) -> Self {
        self.enums = Some(EnumConstraint::new(values));
        self
    }

    pub fn validate(&self, v: &Value) -> Result<(), ValidationError> {
        let Value::String(s) = v else {
            return Err(ValidationError::type_mismatch("string", v));
        };

        let len = s.chars().count();
        if let Some(max) = self.max_length {
            if len > max {
                return Err(ValidationError::Range(format!(
                    "string length {len} longer than maxLength {max}"
                )));
            }
        }
        if let Some(min) = self.min_length {
            if len < min {
                return Err(ValidationError::Range(format!(
                    "string length {len} shorter than minLength {min}"
                )));
            }
        }

        if let Some(format) = self.format {
            format.check(s)?;
        }

        if let Some(rx) = &self.pattern {
            if !rx.is_match(s) {
                return Err(ValidationError::Format(format!(
                    "string does not match regular expression '{}'",
                    rx.as_str()
                )));
            }
        }

        if let Some(enums) = &self.enums {
            enums.validate(v)?;
        }
        Ok(())
    }
}
