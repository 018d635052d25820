//! Schema document model.
//!
//! A typed view over a JSON-Schema-like document (draft-04 keywords, plus the
//! draft-06 numeric form of `exclusiveMinimum`/`exclusiveMaximum`). Every
//! bound is an `Option`, so an absent keyword is never confused with zero.
//! Unknown keywords are ignored.
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::BuildError;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(rename = "$ref")]
    pub reference: Option<String>,
    #[serde(rename = "type")]
    pub type_: Option<TypeDecl>,
    #[serde(rename = "enum")]
    pub enum_: Option<Vec<Value>>,
    /// `Some(Value::Null)` when the document says `"default": null`.
    #[serde(default, deserialize_with = "present")]
    pub default: Option<Value>,

    pub not: Option<Box<Schema>>,
    pub all_of: Option<Vec<Schema>>,
    pub any_of: Option<Vec<Schema>>,
    pub one_of: Option<Vec<Schema>>,

    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub exclusive_minimum: Option<Exclusive>,
    pub exclusive_maximum: Option<Exclusive>,
    pub multiple_of: Option<f64>,

    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<String>,
    pub format: Option<String>,

    pub items: Option<Items>,
    pub additional_items: Option<Additional>,
    pub min_items: Option<usize>,
    pub max_items: Option<usize>,
    pub unique_items: Option<bool>,

    #[serde(default)]
    pub properties: IndexMap<String, Schema>,
    #[serde(default)]
    pub required: Vec<String>,
    pub additional_properties: Option<Additional>,
    #[serde(default)]
    pub dependencies: IndexMap<String, Dependency>,
    #[serde(default)]
    pub definitions: IndexMap<String, Schema>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TypeDecl {
    One(String),
    Many(Vec<String>),
}

/// Draft-04 flag on the sibling bound, or a draft-06 strict limit.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
pub enum Exclusive {
    Flag(bool),
    Limit(f64),
}

/// A list of schemas selects tuple mode.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Items {
    Tuple(Vec<Schema>),
    Single(Box<Schema>),
}

/// `additionalItems` / `additionalProperties`: absent, `true`/`false`, or a schema.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Additional {
    Allowed(bool),
    Schema(Box<Schema>),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Dependency {
    Properties(Vec<String>),
    Schema(Box<Schema>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Null,
    Boolean,
    Integer,
    Number,
    String,
    Array,
    Object,
}

impl PrimitiveType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::String => "string",
            Self::Array => "array",
            Self::Object => "object",
        }
    }
}

impl FromStr for PrimitiveType {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "null" => Ok(Self::Null),
            "boolean" => Ok(Self::Boolean),
            "integer" => Ok(Self::Integer),
            "number" => Ok(Self::Number),
            "string" => Ok(Self::String),
            "array" => Ok(Self::Array),
            "object" => Ok(Self::Object),
            other => Err(BuildError::UnknownType(other.to_string())),
        }
    }
}

fn present<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(d).map(Some)
}

impl Schema {
    pub fn from_value(document: &Value) -> Result<Self, BuildError> {
        crate::path_de::from_value_with_path(document).map_err(BuildError::Schema)
    }

    pub fn parse(src: &str) -> Result<Self, BuildError> {
        crate::path_de::from_str_with_path(src).map_err(BuildError::Schema)
    }

    /// Declared types in declaration order, duplicates dropped.
    pub fn declared_types(&self) -> Result<Vec<PrimitiveType>, BuildError> {
        let names: Vec<&str> = match &self.type_ {
            None => Vec::new(),
            Some(TypeDecl::One(s)) => vec![s.as_str()],
            Some(TypeDecl::Many(xs)) => xs.iter().map(String::as_str).collect(),
        };
        let mut out = Vec::with_capacity(names.len());
        for name in names {
            let t = name.parse::<PrimitiveType>()?;
            if !out.contains(&t) {
                out.push(t);
            }
        }
        Ok(out)
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name)
    }
}
