//! Compile JSON-Schema-like documents into reusable constraint trees and
//! validate decoded JSON values (or serialisable Rust records) against them.
//!
//! ```
//! use json_val::Compiler;
//! use serde_json::json;
//!
//! let schema = json!({
//!     "type": "object",
//!     "properties": {"child": {"$ref": "#"}}
//! });
//! let validator = Compiler::new().compile(&schema).unwrap();
//! assert!(validator.validate(&json!({"child": {}})).is_ok());
//! assert!(validator.validate(&json!({"child": {"child": 5}})).is_err());
//! ```
pub mod cli;
pub mod compiler;
pub mod constraint;
pub mod describe;
pub mod error;
pub mod jq_exec;
pub mod path_de;
pub mod pointer;
pub mod schema;
pub mod validator;
pub mod value;

pub use compiler::{CompileOptions, Compiler};
pub use constraint::Constraint;
pub use error::{BuildError, ErrorKind, ValidationError};
pub use schema::Schema;
pub use validator::Validator;
pub use value::{FieldNameProvider, PresentFieldNames, Scope, SerializedFieldNames};
