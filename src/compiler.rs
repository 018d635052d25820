//! Schema → constraint tree.
//!
//! Compilation is two passes:
//! 1. walk the schema, emitting a placeholder [`ReferenceConstraint`] for every
//!    `$ref` and recording the reference string instead of descending into it;
//! 2. resolve each recorded reference exactly once, compile its target (which
//!    may record further references) and register it in the validator's table.
//!
//! Nothing is dereferenced until both passes are done, so self- and mutually
//! referential schemas compile without recursing forever.
mod guess;

use std::sync::Arc;

use indexmap::IndexSet;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::constraint::{
    AllConstraint, AnyConstraint, ArrayConstraint, BooleanConstraint, Constraint, EnumConstraint,
    Format, IntegerConstraint, NotConstraint, NumberConstraint, ObjectConstraint,
    OneOfConstraint, ReferenceConstraint, StringConstraint,
};
use crate::error::BuildError;
use crate::pointer::{JsonPointer, PointerResolver};
use crate::schema::{Additional, Dependency, Exclusive, Items, PrimitiveType, Schema};
use crate::validator::{ReferenceTable, Validator};
use crate::value::{FieldNameProvider, SerializedFieldNames};

// ------------------------------- Policy ---------------------------------- //

/// Schema nesting allowed before compilation gives up.
pub const DEFAULT_MAX_DEPTH: usize = 256;

// ------------------------------- Options --------------------------------- //

#[derive(Debug, Clone)]
pub struct CompileOptions {
    pub max_depth: usize,
    /// Treat a missing `additionalProperties` as `false`.
    pub deny_unknown_properties: bool,
    pub field_names: Arc<dyn FieldNameProvider>,
    pub resolver: Arc<dyn PointerResolver>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            deny_unknown_properties: false,
            field_names: Arc::new(SerializedFieldNames),
            resolver: Arc::new(JsonPointer),
        }
    }
}

impl CompileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_depth(mut self, n: usize) -> Self {
        self.max_depth = n;
        self
    }

    pub fn deny_unknown_properties(mut self, b: bool) -> Self {
        self.deny_unknown_properties = b;
        self
    }

    pub fn field_names(mut self, provider: Arc<dyn FieldNameProvider>) -> Self {
        self.field_names = provider;
        self
    }

    pub fn resolver(mut self, resolver: Arc<dyn PointerResolver>) -> Self {
        self.resolver = resolver;
        self
    }
}

// ------------------------------- Compiler -------------------------------- //

#[derive(Debug, Clone, Default)]
pub struct Compiler {
    options: CompileOptions,
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: CompileOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Compile a whole schema document.
    pub fn compile(&self, document: &Value) -> Result<Validator, BuildError> {
        let schema = Schema::from_value(document)?;
        self.assemble(document, &schema, true)
    }

    /// Compile an already decoded schema. `document` is what `$ref`s resolve
    /// against, and `schema` must be its decoded form.
    pub fn compile_schema(&self, document: &Value, schema: &Schema) -> Result<Validator, BuildError> {
        self.assemble(document, schema, true)
    }

    /// Compile the sub-schema at `pointer` (`/definitions/x` or
    /// `#/definitions/x`). References still resolve against the whole document.
    pub fn compile_at(&self, document: &Value, pointer: &str) -> Result<Validator, BuildError> {
        let reference = if pointer.starts_with('#') {
            pointer.to_string()
        } else {
            format!("#{pointer}")
        };
        let target = self
            .options
            .resolver
            .resolve(document, &reference)
            .map_err(|e| unresolved(&reference, e))?;
        let schema = Schema::from_value(target)?;
        self.assemble(document, &schema, reference == "#")
    }

    fn assemble(&self, document: &Value, schema: &Schema, root_is_document: bool) -> Result<Validator, BuildError> {
        let mut validator = Validator::new();
        let table = Arc::clone(validator.references());
        let mut cx = BuildCtx {
            options: &self.options,
            table: Arc::clone(&table),
            refs: IndexSet::new(),
            depth: 0,
        };

        let root = Arc::new(cx.build(schema)?);

        // second pass; `refs` grows while targets are compiled
        let mut next = 0;
        while let Some(reference) = cx.refs.get_index(next).cloned() {
            next += 1;
            if reference == "#" && root_is_document {
                debug!("registering '#' as the root constraint");
                table.insert("#", Arc::clone(&root));
                continue;
            }
            let target = self
                .options
                .resolver
                .resolve(document, &reference)
                .map_err(|e| unresolved(&reference, e))?;
            let sub = Schema::from_value(target).map_err(|e| unresolved(&reference, e))?;
            let c = cx.build(&sub)?;
            debug!(reference = %reference, kind = c.name(), "registering reference");
            table.insert(reference, Arc::new(c));
        }

        validator.set_root_shared(root);
        Ok(validator)
    }
}

fn unresolved(reference: &str, reason: impl std::fmt::Display) -> BuildError {
    BuildError::UnresolvedReference {
        reference: reference.to_string(),
        reason: reason.to_string(),
    }
}

// ------------------------------ Build pass ------------------------------- //

struct BuildCtx<'o> {
    options: &'o CompileOptions,
    table: Arc<ReferenceTable>,
    /// Every reference seen so far, in discovery order.
    refs: IndexSet<String>,
    depth: usize,
}

impl BuildCtx<'_> {
    fn build(&mut self, s: &Schema) -> Result<Constraint, BuildError> {
        if self.depth >= self.options.max_depth {
            return Err(BuildError::DepthExceeded(self.options.max_depth));
        }
        self.depth += 1;
        let out = self.build_node(s);
        self.depth -= 1;
        out
    }

    fn build_each(&mut self, list: &[Schema]) -> Result<Vec<Constraint>, BuildError> {
        list.iter().map(|s| self.build(s)).collect()
    }

    fn build_node(&mut self, s: &Schema) -> Result<Constraint, BuildError> {
        if let Some(reference) = &s.reference {
            if !reference.starts_with('#') {
                return Err(BuildError::UnsupportedReference(reference.clone()));
            }
            self.refs.insert(reference.clone());
            return Ok(ReferenceConstraint::with_table(&self.table, reference.as_str()).into());
        }

        let mut types = s.declared_types()?;
        if types.is_empty() {
            types = guess::guess_types(s);
            if !types.is_empty() {
                debug!(types = ?types, "guessed schema types");
            }
        }

        let mut all = AllConstraint::new();

        let mut typed = types
            .iter()
            .map(|t| self.build_typed(*t, s))
            .collect::<Result<Vec<_>, _>>()?;
        all = match typed.len() {
            0 => all,
            1 => all.add(typed.remove(0)),
            _ => all.add(AnyConstraint { constraints: typed }),
        };

        if let Some(values) = &s.enum_ {
            if types.is_empty() || !types.iter().all(|t| consumes_enum(*t, values)) {
                all = all.add(EnumConstraint::new(values.clone()));
            }
        }

        if let Some(not) = &s.not {
            all = all.add(NotConstraint::new(self.build(not)?));
        }
        if let Some(list) = &s.all_of {
            for c in self.build_each(list)? {
                all = all.add(c);
            }
        }
        if let Some(list) = &s.any_of {
            all = all.add(AnyConstraint { constraints: self.build_each(list)? }.reduce());
        }
        if let Some(list) = &s.one_of {
            all = all.add(OneOfConstraint { constraints: self.build_each(list)? }.reduce());
        }

        Ok(all.reduce())
    }

    fn build_typed(&mut self, t: PrimitiveType, s: &Schema) -> Result<Constraint, BuildError> {
        let c = match t {
            PrimitiveType::Null => Constraint::Null,
            PrimitiveType::Boolean => {
                let mut c = BooleanConstraint::new();
                c.default = s.default.clone();
                if let Some([Value::Bool(b)]) = s.enum_.as_deref() {
                    c.expected = Some(*b);
                }
                c.into()
            }
            PrimitiveType::Number => number_constraint(s)?.into(),
            PrimitiveType::Integer => IntegerConstraint { number: number_constraint(s)? }.into(),
            PrimitiveType::String => string_constraint(s)?.into(),
            PrimitiveType::Array => self.build_array(s)?.into(),
            PrimitiveType::Object => self.build_object(s)?.into(),
        };
        Ok(c)
    }

    fn build_array(&mut self, s: &Schema) -> Result<ArrayConstraint, BuildError> {
        let mut c = ArrayConstraint::new();
        c.default = s.default.clone();
        match &s.items {
            Some(Items::Single(item)) => c.items = Some(Box::new(self.build(item)?)),
            Some(Items::Tuple(list)) => {
                c.positional_items = self.build_each(list)?;
                c.additional_items = self
                    .build_additional(s.additional_items.as_ref(), Some(Constraint::Empty))?
                    .map(Box::new);
            }
            None => {}
        }
        c.min_items = s.min_items;
        c.max_items = s.max_items;
        c.unique_items = s.unique_items.unwrap_or(false);
        Ok(c)
    }

    fn build_object(&mut self, s: &Schema) -> Result<ObjectConstraint, BuildError> {
        let absent = if self.options.deny_unknown_properties {
            None
        } else {
            Some(Constraint::Empty)
        };
        let additional = self.build_additional(s.additional_properties.as_ref(), absent)?;
        let mut c = ObjectConstraint::new()
            .field_names(Arc::clone(&self.options.field_names))
            .additional_properties(additional);
        if let Some(d) = &s.default {
            c = c.with_default(d.clone());
        }

        for (name, prop) in &s.properties {
            c.add_prop(name.as_str(), self.build(prop)?);
        }
        for name in &s.required {
            if !s.properties.contains_key(name) {
                c.add_prop(name.as_str(), Constraint::Empty);
            }
            c.set_required(name.as_str(), true);
        }
        for (name, dep) in &s.dependencies {
            match dep {
                Dependency::Properties(targets) => {
                    for target in targets {
                        c.add_prop_dependency(name.as_str(), target.as_str());
                    }
                }
                Dependency::Schema(_) => debug!(property = %name, "schema dependency is not enforced"),
            }
        }
        Ok(c)
    }

    /// `absent` is what a missing keyword means for this position.
    fn build_additional(
        &mut self,
        a: Option<&Additional>,
        absent: Option<Constraint>,
    ) -> Result<Option<Constraint>, BuildError> {
        Ok(match a {
            None => absent,
            Some(Additional::Allowed(true)) => Some(Constraint::Empty),
            Some(Additional::Allowed(false)) => None,
            Some(Additional::Schema(s)) => Some(self.build(s)?),
        })
    }
}

/// Whether the typed constraint for `t` checks `enum` itself.
fn consumes_enum(t: PrimitiveType, values: &[Value]) -> bool {
    match t {
        PrimitiveType::String | PrimitiveType::Number | PrimitiveType::Integer => true,
        PrimitiveType::Boolean => matches!(values, [Value::Bool(_)]),
        _ => false,
    }
}

fn number_constraint(s: &Schema) -> Result<NumberConstraint, BuildError> {
    let mut c = NumberConstraint::new();
    c.default = s.default.clone();
    c.minimum = s.minimum;
    c.maximum = s.maximum;

    match s.exclusive_minimum {
        Some(Exclusive::Flag(b)) => c.exclusive_minimum = b,
        Some(Exclusive::Limit(x)) => {
            if c.minimum.is_none_or(|m| x >= m) {
                c.minimum = Some(x);
                c.exclusive_minimum = true;
            }
        }
        None => {}
    }
    match s.exclusive_maximum {
        Some(Exclusive::Flag(b)) => c.exclusive_maximum = b,
        Some(Exclusive::Limit(x)) => {
            if c.maximum.is_none_or(|m| x <= m) {
                c.maximum = Some(x);
                c.exclusive_maximum = true;
            }
        }
        None => {}
    }

    if let Some(m) = s.multiple_of {
        if !(m > 0.0) {
            return Err(BuildError::Schema(format!("multipleOf must be greater than 0, got {m}")));
        }
        c.multiple_of = Some(m);
    }
    c.enums = s.enum_.clone().map(EnumConstraint::new);
    Ok(c)
}

fn string_constraint(s: &Schema) -> Result<StringConstraint, BuildError> {
    let mut c = StringConstraint::new();
    c.default = s.default.clone();
    c.min_length = s.min_length;
    c.max_length = s.max_length;
    if let Some(name) = &s.format {
        match name.parse::<Format>() {
            Ok(f) => c.format = Some(f),
            Err(()) => debug!(format = %name, "unknown format is not checked"),
        }
    }
    if let Some(p) = &s.pattern {
        let rx = Regex::new(p).map_err(|source| BuildError::InvalidPattern {
            pattern: p.clone(),
            source,
        })?;
        c.pattern = Some(rx);
    }
    c.enums = s.enum_.clone().map(EnumConstraint::new);
    Ok(c)
}
