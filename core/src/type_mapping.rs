#![deny(missing_docs)]

//! # Type Mapping
//!
//! Classifies type expressions into schema shapes. Handles primitives,
//! extended primitives (time, UUID, decimal), slices, maps, pointers,
//! interfaces, custom wrappers, and generic instantiations.

use crate::config::{Config, PrimitiveEntry};
use crate::parser::ast::{File, StructBody, TypeExpr};

/// The classification of one type expression.
#[derive(Debug, Clone, PartialEq)]
pub enum TransType {
    /// A primitive or extended-primitive leaf.
    Primitive(PrimitiveEntry),
    /// `interface{}` / `any`: an empty schema accepting any JSON value.
    Any,
    /// An array; the element type is retained for recursion.
    Array(TypeExpr),
    /// A map; the value type is retained for recursion.
    Map(TypeExpr),
    /// An inline struct literal type.
    Inline(StructBody),
    /// A reference to a model, carrying its qualified name.
    Model(String),
    /// Functions, channels: no schema meaning, the field is skipped.
    Unsupported,
}

/// Maps a primitive type name to its schema cell, per the OpenAPI 2.0
/// table. OpenAPI's own type names are accepted so annotation tokens
/// classify the same way source tokens do.
pub fn primitive_entry(name: &str) -> Option<PrimitiveEntry> {
    match name {
        "string" => Some(PrimitiveEntry::plain("string")),
        "bool" | "boolean" => Some(PrimitiveEntry::plain("boolean")),
        "int" | "uint" | "uintptr" | "integer" => Some(PrimitiveEntry::plain("integer")),
        "int8" | "int16" | "int32" | "uint8" | "uint16" | "uint32" | "byte" | "rune" => {
            Some(PrimitiveEntry::formatted("integer", "int32"))
        }
        "int64" | "uint64" => Some(PrimitiveEntry::formatted("integer", "int64")),
        "float32" => Some(PrimitiveEntry::formatted("number", "float")),
        "float64" => Some(PrimitiveEntry::formatted("number", "double")),
        "number" => Some(PrimitiveEntry::plain("number")),
        _ => None,
    }
}

/// Whether `name` is a primitive type name.
pub fn is_primitive_name(name: &str) -> bool {
    primitive_entry(name).is_some()
}

/// Checks a selector against the extended-primitive and field-sugar
/// tables, by its short form and by every import path that binds the
/// selector's package name in `file`.
pub fn selector_entry(
    pkg: &str,
    name: &str,
    file: &File,
    config: &Config,
) -> Option<PrimitiveEntry> {
    let short = format!("{}.{}", pkg, name);
    if let Some(entry) = config.extended_primitives.get(&short) {
        return Some(entry.clone());
    }
    if let Some(entry) = config.field_sugar.get(&short) {
        return Some(entry.clone());
    }
    for import in &file.imports {
        if import.bound_name() == Some(pkg) {
            let full = format!("{}.{}", import.path, name);
            if let Some(entry) = config.extended_primitives.get(&full) {
                return Some(entry.clone());
            }
            if let Some(entry) = config.field_sugar.get(&full) {
                return Some(entry.clone());
            }
        }
    }
    None
}

/// Checks a dotted string token against the extended-primitive table.
pub fn extended_entry_for_token(token: &str, config: &Config) -> Option<PrimitiveEntry> {
    config.extended_primitives.get(token).cloned()
}

/// Whether the generic wrapper named by `base` is a known custom-model
/// wrapper whose first parameter carries the payload.
fn is_custom_wrapper(base: &TypeExpr, file: &File, config: &Config) -> bool {
    match base.deref() {
        TypeExpr::Ident(name) => config.custom_wrappers.contains(name),
        TypeExpr::Selector { pkg, name } => {
            let short = format!("{}.{}", pkg, name);
            if config.custom_wrappers.contains(&short) {
                return true;
            }
            file.imports.iter().any(|import| {
                import.bound_name() == Some(pkg.as_str())
                    && config
                        .custom_wrappers
                        .contains(&format!("{}.{}", import.path, name))
            })
        }
        _ => false,
    }
}

/// Produces the qualified model name for a reference expression.
///
/// Selectors keep their short `pkg.Name` form; bare identifiers are
/// qualified with the owning package's name.
pub fn qualified_model_name(expr: &TypeExpr, own_pkg: &str) -> String {
    match expr.deref() {
        TypeExpr::Ident(name) => {
            if own_pkg.is_empty() {
                name.clone()
            } else {
                format!("{}.{}", own_pkg, name)
            }
        }
        TypeExpr::Selector { pkg, name } => format!("{}.{}", pkg, name),
        TypeExpr::Generic { base, args } => {
            let args: Vec<String> = args.iter().map(|a| a.to_token()).collect();
            format!("{}[{}]", qualified_model_name(base, own_pkg), args.join(","))
        }
        other => other.to_token(),
    }
}

/// Classifies a type expression in the context of its file.
///
/// Rules, in priority order: pointer stripping, interfaces, primitives,
/// extended primitives, arrays, maps, generic wrappers, model references.
pub fn classify(expr: &TypeExpr, file: &File, config: &Config) -> TransType {
    match expr.deref() {
        TypeExpr::Interface => TransType::Any,
        TypeExpr::Unsupported => TransType::Unsupported,
        TypeExpr::Struct(body) => TransType::Inline(body.clone()),
        TypeExpr::Ident(name) => match primitive_entry(name) {
            Some(entry) => TransType::Primitive(entry),
            None => TransType::Model(qualified_model_name(expr, &file.package)),
        },
        TypeExpr::Selector { pkg, name } => match selector_entry(pkg, name, file, config) {
            Some(entry) => TransType::Primitive(entry),
            None => TransType::Model(format!("{}.{}", pkg, name)),
        },
        TypeExpr::Array(elem) => TransType::Array((**elem).clone()),
        TypeExpr::Map { value, .. } => TransType::Map((**value).clone()),
        TypeExpr::Generic { base, args } => {
            if is_custom_wrapper(base, file, config) {
                match args.first() {
                    Some(payload) => classify(payload.deref(), file, config),
                    None => TransType::Any,
                }
            } else {
                TransType::Model(qualified_model_name(expr, &file.package))
            }
        }
        TypeExpr::Pointer(_) => unreachable!("deref strips pointers"),
    }
}
