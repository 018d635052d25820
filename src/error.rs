use thiserror::Error;

/// Coarse classification of a validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    TypeMismatch,
    RangeViolation,
    FormatViolation,
    StructuralViolation,
    CombinatorViolation,
    ReferenceError,
}

/// A terminal validation failure. The first failure found is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("{0}")]
    Range(String),

    #[error("{0}")]
    Format(String),

    #[error("{0}")]
    Structural(String),

    #[error("{0}")]
    Combinator(String),

    #[error("unresolved reference '{0}'")]
    Reference(String),

    #[error("reference '{0}' leads back to itself without consuming the value")]
    CircularReference(String),

    #[error("property '{name}': {source}")]
    Property {
        name: String,
        #[source]
        source: Box<ValidationError>,
    },

    #[error("item {index}: {source}")]
    Item {
        index: usize,
        #[source]
        source: Box<ValidationError>,
    },

    #[error("record could not be serialized: {0}")]
    Unserializable(String),
}

impl ValidationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TypeMismatch { .. } | Self::Unserializable(_) => ErrorKind::TypeMismatch,
            Self::Range(_) => ErrorKind::RangeViolation,
            Self::Format(_) => ErrorKind::FormatViolation,
            Self::Structural(_) => ErrorKind::StructuralViolation,
            Self::Combinator(_) => ErrorKind::CombinatorViolation,
            Self::Reference(_) | Self::CircularReference(_) => ErrorKind::ReferenceError,
            Self::Property { source, .. } | Self::Item { source, .. } => source.kind(),
        }
    }

    pub(crate) fn at_property(self, name: &str) -> Self {
        Self::Property { name: name.to_string(), source: Box::new(self) }
    }

    pub(crate) fn at_item(self, index: usize) -> Self {
        Self::Item { index, source: Box::new(self) }
    }

    pub(crate) fn type_mismatch(expected: &'static str, v: &serde_json::Value) -> Self {
        Self::TypeMismatch { expected, found: crate::value::kind_name(v) }
    }
}

/// Compilation failure. No partially built validator is ever returned.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("invalid schema document: {0}")]
    Schema(String),

    #[error("unknown type '{0}'")]
    UnknownType(String),

    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("unsupported reference '{0}': only document fragments ('#...') are resolved")]
    UnsupportedReference(String),

    #[error("reference '{reference}' could not be resolved: {reason}")]
    UnresolvedReference { reference: String, reason: String },

    #[error("schema nesting exceeds the depth limit of {0}")]
    DepthExceeded(usize),
}
