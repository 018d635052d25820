//! `$ref` resolution against the schema document.
use std::fmt::Debug;

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("'{0}' is not a document fragment reference")]
    NotFragment(String),
    #[error("no value at '{0}'")]
    NotFound(String),
}

/// Resolves a reference string against a document.
pub trait PointerResolver: Send + Sync + Debug {
    fn resolve<'a>(&self, document: &'a Value, reference: &str) -> Result<&'a Value, ResolveError>;
}

/// Fragment references holding an RFC 6901 JSON pointer: `#`, `#/definitions/x`,
/// `#/properties/a~1b` and so on. `#` is the whole document.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPointer;

impl PointerResolver for JsonPointer {
    fn resolve<'a>(&self, document: &'a Value, reference: &str) -> Result<&'a Value, ResolveError> {
        let Some(pointer) = reference.strip_prefix('#') else {
            return Err(ResolveError::NotFragment(reference.to_string()));
        };
        if pointer.is_empty() {
            return Ok(document);
        }
        if !pointer.starts_with('/') {
            return Err(ResolveError::NotFragment(reference.to_string()));
        }
        document
            .pointer(pointer)
            .ok_or_else(|| ResolveError::NotFound(reference.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolves_fragments() {
        let doc = json!({"definitions": {"a/b": {"type": "string"}, "list": [1, {"x": 2}]}});
        assert_eq!(JsonPointer.resolve(&doc, "#"), Ok(&doc));
        assert_eq!(
            JsonPointer.resolve(&doc, "#/definitions/a~1b"),
            Ok(&json!({"type": "string"}))
        );
        assert_eq!(JsonPointer.resolve(&doc, "#/definitions/list/1/x"), Ok(&json!(2)));
        assert_eq!(
            JsonPointer.resolve(&doc, "#/definitions/missing"),
            Err(ResolveError::NotFound("#/definitions/missing".into()))
        );
        assert!(matches!(
            JsonPointer.resolve(&doc, "other.json#/a"),
            Err(ResolveError::NotFragment(_))
        ));
        assert!(matches!(JsonPointer.resolve(&doc, "#anchor"), Err(ResolveError::NotFragment(_))));
    }
}
