#![deny(missing_docs)]

//! # Schema Builder
//!
//! Owns the definitions map and builds the schema for registered
//! declarations. Cycles are broken by inserting a placeholder before
//! recursing, so self-referential types resolve to a `$ref` that is
//! completed in place.

pub mod combined;
pub mod composer;
pub mod fields;
pub mod sweep;

use crate::config::Config;
use crate::error::AppResult;
use crate::parser::ast::{TypeBody, TypeExpr};
use crate::parser::parse_type_expr_str;
use crate::registry::{
    normalize_generic_schema_name, ConstValue, DeclId, FileId, Registry, ResolvedType,
    TypeDecl,
};
use crate::spec::Schema;
use crate::type_mapping::primitive_entry;
use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Builds and owns the definitions map.
pub struct SchemaBuilder {
    config: Config,
    definitions: IndexMap<String, Schema>,
    built: HashMap<(DeclId, Vec<String>, bool), String>,
    in_progress: HashSet<String>,
}

impl SchemaBuilder {
    /// Creates a builder for the given configuration.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            definitions: IndexMap::new(),
            built: HashMap::new(),
            in_progress: HashSet::new(),
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The definitions built so far.
    pub fn definitions(&self) -> &IndexMap<String, Schema> {
        &self.definitions
    }

    /// Consumes the builder, yielding the definitions map.
    pub fn into_definitions(self) -> IndexMap<String, Schema> {
        self.definitions
    }

    /// Resolves a type token to a schema in the context of a file:
    /// primitives inline, everything else as `$ref` into definitions.
    pub fn schema_for_token(
        &mut self,
        registry: &mut Registry,
        token: &str,
        file_id: FileId,
        public: bool,
    ) -> AppResult<Schema> {
        let expr = parse_type_expr_str(token)?;
        let subs = HashMap::new();
        let ctx = fields::StructContext {
            file_id,
            substitutions: &subs,
            public,
        };
        let schema = fields::schema_for_expr(self, registry, &expr, &ctx)?;
        Ok(schema.unwrap_or_default())
    }

    /// Resolves a qualified model name to a `$ref`, building its
    /// definition on first use. An unresolved name degrades to a plain
    /// object schema; an incomplete schema beats an aborted build.
    pub(crate) fn schema_for_model(
        &mut self,
        registry: &mut Registry,
        name: &str,
        file_id: FileId,
        public: bool,
    ) -> AppResult<Schema> {
        match registry.find_type(name, file_id) {
            Some(resolved) => {
                let schema_name = self.build_decl(registry, &resolved, public)?;
                Ok(Schema::reference(&schema_name))
            }
            None => {
                debug!("unresolved type '{}', emitting object fallback", name);
                Ok(Schema::object())
            }
        }
    }

    /// Builds the definition for a resolved declaration and returns its
    /// schema name. Identical requests are memoized; a name already in
    /// definitions is adopted without rebuilding.
    pub fn build_decl(
        &mut self,
        registry: &mut Registry,
        resolved: &ResolvedType,
        public: bool,
    ) -> AppResult<String> {
        let decl = registry.decl(resolved.decl).clone();
        // Public companions exist for structs; every other kind keeps its
        // only form even inside a public build.
        let public = public && decl.is_struct();

        let schema_name = schema_name_for(&decl, &resolved.type_args, public);
        let key = (resolved.decl, resolved.type_args.clone(), public);

        if let Some(memoized) = self.built.get(&key) {
            return Ok(memoized.clone());
        }
        if self.definitions.contains_key(&schema_name) {
            self.built.insert(key, schema_name.clone());
            return Ok(schema_name);
        }

        // Placeholder first: recursive references resolve against it and
        // the entry is completed in place below.
        self.definitions
            .insert(schema_name.clone(), Schema::object());
        self.in_progress.insert(schema_name.clone());

        let schema = self.build_body(registry, &decl, &resolved.type_args, public)?;

        self.in_progress.remove(&schema_name);
        self.definitions.insert(schema_name.clone(), schema);
        self.built.insert(key, schema_name.clone());

        if decl.is_struct() && !public && !decl.no_public {
            self.build_decl(registry, resolved, true)?;
        }

        Ok(schema_name)
    }

    fn build_body(
        &mut self,
        registry: &mut Registry,
        decl: &TypeDecl,
        type_args: &[String],
        public: bool,
    ) -> AppResult<Schema> {
        match &decl.spec.body {
            TypeBody::Struct(body) => {
                let subs = fields::substitution_map(&decl.spec.type_params, type_args);
                let ctx = fields::StructContext {
                    file_id: decl.file_id,
                    substitutions: &subs,
                    public,
                };
                fields::build_struct_schema(self, registry, body, &ctx)
            }
            TypeBody::Interface => Ok(Schema::object()),
            TypeBody::Alias(expr) => self.build_alias(registry, decl, expr, type_args, public),
        }
    }

    fn build_alias(
        &mut self,
        registry: &mut Registry,
        decl: &TypeDecl,
        expr: &TypeExpr,
        type_args: &[String],
        public: bool,
    ) -> AppResult<Schema> {
        // An alias whose name carries constants is an enum.
        if let TypeExpr::Ident(underlying) = expr {
            let values = registry.enum_values(&decl.pkg_path, &decl.spec.name);
            if !values.is_empty() {
                return Ok(enum_schema(decl, underlying, &values));
            }
        }

        let subs = fields::substitution_map(&decl.spec.type_params, type_args);
        let ctx = fields::StructContext {
            file_id: decl.file_id,
            substitutions: &subs,
            public,
        };
        let Some(schema) = fields::schema_for_expr(self, registry, expr, &ctx)? else {
            return Ok(Schema::object());
        };

        // An alias to another model copies the resolved definition so the
        // alias name stands on its own. Targets still being built stay
        // references to avoid copying a placeholder.
        if let Some(target) = schema.ref_name() {
            if !self.in_progress.contains(target) {
                if let Some(resolved) = self.definitions.get(target) {
                    return Ok(resolved.clone());
                }
            }
        }
        Ok(schema)
    }
}

/// The definition name of a declaration instance: `@name` override or the
/// registry-disambiguated name, generic arguments normalized into it, and
/// the `Public` suffix for public variants.
fn schema_name_for(decl: &TypeDecl, type_args: &[String], public: bool) -> String {
    let base = decl
        .name_override
        .clone()
        .unwrap_or_else(|| decl.schema_name.clone());
    let mut name = if type_args.is_empty() {
        base
    } else {
        normalize_generic_schema_name(&format!("{}[{}]", base, type_args.join(",")))
    };
    if public {
        name.push_str("Public");
    }
    name
}

/// Emits an enum schema from a const group: underlying primitive type,
/// `enum` values, and the `x-enum-varnames` extension.
fn enum_schema(decl: &TypeDecl, underlying: &str, values: &[(String, ConstValue)]) -> Schema {
    let entry = decl
        .primitive
        .clone()
        .or_else(|| primitive_entry(underlying))
        .unwrap_or_else(|| infer_primitive(&values[0].1));

    let mut schema = Schema::primitive(&entry.schema_type, entry.format.as_deref());
    schema.enum_values = values.iter().map(|(_, value)| value.to_json()).collect();
    schema.extensions.insert(
        "x-enum-varnames".to_string(),
        JsonValue::Array(
            values
                .iter()
                .map(|(name, _)| JsonValue::String(name.clone()))
                .collect(),
        ),
    );
    schema
}

fn infer_primitive(value: &ConstValue) -> crate::config::PrimitiveEntry {
    use crate::config::PrimitiveEntry;
    match value {
        ConstValue::Int(_) => PrimitiveEntry::plain("integer"),
        ConstValue::Float(_) => PrimitiveEntry::plain("number"),
        ConstValue::Str(_) => PrimitiveEntry::plain("string"),
        ConstValue::Bool(_) => PrimitiveEntry::plain("boolean"),
    }
}
