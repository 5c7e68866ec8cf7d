//! # Struct and Field Lowering
//!
//! Converts struct bodies into object schemas: tag decoding, naming
//! strategies, classification, embedded-field promotion, generic
//! parameter substitution, and public-variant filtering.

use crate::config::PropertyStrategy;
use crate::error::AppResult;
use crate::parser::ast::{StructBody, TypeBody, TypeExpr};
use crate::parser::parse_type_expr_str;
use crate::registry::{FileId, Registry};
use crate::schema::SchemaBuilder;
use crate::spec::Schema;
use crate::tags::{coerce_literal, CustomSchema, FieldTagInfo};
use crate::type_mapping::{classify, TransType};
use heck::{ToLowerCamelCase, ToSnakeCase, ToUpperCamelCase};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use tracing::debug;

/// Context for lowering one struct body.
pub(crate) struct StructContext<'a> {
    /// File the body was declared in; selector resolution uses its imports.
    pub file_id: FileId,
    /// Generic parameter substitutions: parameter name to argument token.
    pub substitutions: &'a HashMap<String, String>,
    /// Whether this is a public-variant build.
    pub public: bool,
}

/// One lowered field, before insertion into the object schema.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FieldSpec {
    /// Effective property name.
    pub name: String,
    /// Property schema.
    pub schema: Schema,
    /// Resolved requiredness.
    pub required: bool,
}

/// Builds the `(parameter name -> argument token)` map for a generic
/// instantiation. Surplus parameters map to nothing and fall back to any.
pub(crate) fn substitution_map(params: &[String], args: &[String]) -> HashMap<String, String> {
    params
        .iter()
        .zip(args.iter())
        .map(|(param, arg)| (param.clone(), arg.clone()))
        .collect()
}

/// Lowers a struct body to an object schema.
pub(crate) fn build_struct_schema(
    builder: &mut SchemaBuilder,
    registry: &mut Registry,
    body: &StructBody,
    ctx: &StructContext<'_>,
) -> AppResult<Schema> {
    let mut schema = Schema::object();

    for field in &body.fields {
        let tags = crate::tags::decode_tags(field.tag.as_deref())?;
        if tags.ignore {
            continue;
        }

        if field.is_embedded() && tags.explicit_name().is_none() {
            merge_embedded(builder, registry, field, ctx, &mut schema)?;
            continue;
        }

        let declared_names: Vec<&str> = if field.is_embedded() {
            // A json-named embedding behaves like a named field whose type
            // references the embedded type's schema.
            vec![embedded_type_name(&field.type_expr)]
        } else {
            field.names.iter().map(String::as_str).collect()
        };

        for declared in declared_names {
            if !is_exported(declared) {
                continue;
            }
            if ctx.public && !tags.visibility.is_public() {
                continue;
            }
            let Some(spec) = lower_field(
                builder,
                registry,
                declared,
                &field.type_expr,
                &field.doc,
                field.comment.as_deref(),
                &tags,
                ctx,
            )?
            else {
                continue;
            };

            if spec.required && !schema.required.contains(&spec.name) {
                schema.required.push(spec.name.clone());
            }
            schema.properties.insert(spec.name, spec.schema);
        }
    }

    Ok(schema)
}

/// Lowers one named field.
#[allow(clippy::too_many_arguments)]
fn lower_field(
    builder: &mut SchemaBuilder,
    registry: &mut Registry,
    declared: &str,
    type_expr: &TypeExpr,
    doc: &[String],
    comment: Option<&str>,
    tags: &FieldTagInfo,
    ctx: &StructContext<'_>,
) -> AppResult<Option<FieldSpec>> {
    let name = match tags.explicit_name() {
        Some(explicit) => explicit.to_string(),
        None => apply_strategy(builder.config().property_strategy, declared),
    };

    let derived = match &tags.swagger_type {
        Some(custom) => Some(custom_override_schema(custom)),
        None => schema_for_expr(builder, registry, type_expr, ctx)?,
    };
    let Some(mut schema) = derived else {
        return Ok(None);
    };

    apply_tag_attributes(&mut schema, tags, doc, comment);

    let required = tags.required.unwrap_or_else(|| {
        if tags.omit_empty {
            false
        } else {
            builder.config().required_by_default
        }
    });

    Ok(Some(FieldSpec {
        name,
        schema,
        required,
    }))
}

/// Computes the schema of a type expression: the shared recursion used for
/// field types, array elements, and map values.
///
/// Returns `None` for types with no schema meaning (functions, channels);
/// the caller drops the field.
pub(crate) fn schema_for_expr(
    builder: &mut SchemaBuilder,
    registry: &mut Registry,
    expr: &TypeExpr,
    ctx: &StructContext<'_>,
) -> AppResult<Option<Schema>> {
    let expr = substitute_expr(expr, ctx.substitutions);
    let trans = {
        let file = registry.file(ctx.file_id);
        classify(&expr, file, builder.config())
    };

    let schema = match trans {
        TransType::Primitive(entry) => {
            Some(Schema::primitive(&entry.schema_type, entry.format.as_deref()))
        }
        TransType::Any => Some(Schema::default()),
        TransType::Array(elem) => {
            let items = schema_for_expr(builder, registry, &elem, ctx)?.unwrap_or_default();
            Some(Schema::array(items))
        }
        TransType::Map(value) => {
            let value = schema_for_expr(builder, registry, &value, ctx)?.unwrap_or_default();
            Some(Schema::map_of(value))
        }
        TransType::Inline(body) => Some(build_struct_schema(builder, registry, &body, ctx)?),
        TransType::Model(name) => {
            Some(builder.schema_for_model(registry, &name, ctx.file_id, ctx.public)?)
        }
        TransType::Unsupported => None,
    };
    Ok(schema)
}

/// Merges an embedded struct's properties and required list, as if its
/// fields were spelled out. Outer named fields shadow embedded ones.
fn merge_embedded(
    builder: &mut SchemaBuilder,
    registry: &mut Registry,
    field: &crate::parser::ast::Field,
    ctx: &StructContext<'_>,
    out: &mut Schema,
) -> AppResult<()> {
    let expr = substitute_expr(field.type_expr.deref(), ctx.substitutions);
    let token = expr.to_token();

    let Some(resolved) = registry.find_type(&token, ctx.file_id) else {
        debug!("unresolved embedded type '{}'", token);
        return Ok(());
    };
    let decl = registry.decl(resolved.decl).clone();
    let TypeBody::Struct(body) = &decl.spec.body else {
        debug!("embedded type '{}' is not a struct", token);
        return Ok(());
    };

    let subs = substitution_map(&decl.spec.type_params, &resolved.type_args);
    let embedded_ctx = StructContext {
        file_id: decl.file_id,
        substitutions: &subs,
        public: ctx.public,
    };
    let embedded = build_struct_schema(builder, registry, body, &embedded_ctx)?;

    for (name, property) in embedded.properties {
        let known = out.properties.contains_key(&name);
        if !known {
            if embedded.required.contains(&name) && !out.required.contains(&name) {
                out.required.push(name.clone());
            }
            out.properties.insert(name, property);
        }
    }

    Ok(())
}

/// Applies generic parameter substitutions throughout an expression.
fn substitute_expr(expr: &TypeExpr, subs: &HashMap<String, String>) -> TypeExpr {
    if subs.is_empty() {
        return expr.clone();
    }
    match expr {
        TypeExpr::Ident(name) => match subs.get(name) {
            Some(token) => match parse_type_expr_str(token) {
                Ok(parsed) => parsed,
                Err(err) => {
                    debug!("unparsable type argument '{}': {}", token, err);
                    expr.clone()
                }
            },
            None => expr.clone(),
        },
        TypeExpr::Pointer(inner) => {
            TypeExpr::Pointer(Box::new(substitute_expr(inner, subs)))
        }
        TypeExpr::Array(elem) => TypeExpr::Array(Box::new(substitute_expr(elem, subs))),
        TypeExpr::Map { key, value } => TypeExpr::Map {
            key: Box::new(substitute_expr(key, subs)),
            value: Box::new(substitute_expr(value, subs)),
        },
        TypeExpr::Generic { base, args } => TypeExpr::Generic {
            base: Box::new(substitute_expr(base, subs)),
            args: args.iter().map(|arg| substitute_expr(arg, subs)).collect(),
        },
        other => other.clone(),
    }
}

/// Converts a `swaggertype` override into its schema.
fn custom_override_schema(custom: &CustomSchema) -> Schema {
    match custom {
        CustomSchema::Primitive(name) => match name.as_str() {
            "object" => Schema::object(),
            other => Schema::primitive(other, None),
        },
        CustomSchema::Array(inner) => Schema::array(custom_override_schema(inner)),
        CustomSchema::Object(inner) => Schema::map_of(custom_override_schema(inner)),
    }
}

/// Applies decoded tag attributes to a derived schema. References carry
/// no sibling attributes in this format, so they are left untouched.
fn apply_tag_attributes(
    schema: &mut Schema,
    tags: &FieldTagInfo,
    doc: &[String],
    comment: Option<&str>,
) {
    if schema.reference.is_some() {
        return;
    }

    // The `,string` json flag re-types numeric fields.
    if tags.as_string
        && matches!(
            schema.schema_type.as_deref(),
            Some("integer") | Some("number")
        )
    {
        schema.schema_type = Some("string".to_string());
        schema.format = None;
    }

    let schema_type = schema.schema_type.clone().unwrap_or_default();

    if !tags.enums.is_empty() {
        let target = if schema_type == "array" {
            schema
                .items
                .as_ref()
                .and_then(|items| items.schema_type.clone())
                .unwrap_or_default()
        } else {
            schema_type.clone()
        };
        let values: Vec<JsonValue> = tags
            .enums
            .iter()
            .filter_map(|value| coerce_literal(value, &target))
            .collect();
        if schema_type == "array" {
            if let Some(items) = schema.items.as_mut() {
                items.enum_values = values;
            }
        } else {
            schema.enum_values = values;
        }
    }

    match schema_type.as_str() {
        "integer" | "number" => {
            schema.minimum = tags.minimum.or(schema.minimum);
            schema.maximum = tags.maximum.or(schema.maximum);
            schema.multiple_of = tags.multiple_of;
        }
        "string" => {
            schema.min_length = tags.min_length.or(tags.minimum.map(|n| n as u64));
            schema.max_length = tags.max_length.or(tags.maximum.map(|n| n as u64));
        }
        "array" => {
            schema.min_items = tags.min_items.or(tags.minimum.map(|n| n as u64));
            schema.max_items = tags.max_items.or(tags.maximum.map(|n| n as u64));
            schema.unique_items = tags.unique_items;
        }
        _ => {}
    }

    if let Some(example) = &tags.example {
        schema.example = coerce_literal(example, &schema_type);
    }
    if let Some(default) = &tags.default {
        schema.default = coerce_literal(default, &schema_type);
    }
    if let Some(format) = &tags.format {
        schema.format = Some(format.clone());
    }
    if let Some(title) = &tags.title {
        schema.title = Some(title.clone());
    }
    if tags.read_only {
        schema.read_only = true;
    }
    for (name, value) in &tags.extensions {
        schema.extensions.insert(name.clone(), value.clone());
    }
    if !tags.enum_varnames.is_empty() {
        schema.extensions.insert(
            "x-enum-varnames".to_string(),
            JsonValue::Array(
                tags.enum_varnames
                    .iter()
                    .map(|name| JsonValue::String(name.clone()))
                    .collect(),
            ),
        );
    }

    if schema.description.is_none() {
        let text = comment
            .map(str::to_string)
            .filter(|t| !t.is_empty())
            .or_else(|| {
                let joined = doc.join(" ").trim().to_string();
                (!joined.is_empty()).then_some(joined)
            });
        schema.description = text;
    }
}

/// Applies the configured naming strategy to an untagged field name.
fn apply_strategy(strategy: PropertyStrategy, name: &str) -> String {
    match strategy {
        PropertyStrategy::CamelCase => name.to_lower_camel_case(),
        PropertyStrategy::SnakeCase => name.to_snake_case(),
        PropertyStrategy::PascalCase => name.to_upper_camel_case(),
    }
}

/// The last name segment of an embedded type expression.
fn embedded_type_name(expr: &TypeExpr) -> &str {
    match expr.deref() {
        TypeExpr::Ident(name) => name,
        TypeExpr::Selector { name, .. } => name,
        TypeExpr::Generic { base, .. } => embedded_type_name(base),
        _ => "",
    }
}

fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_uppercase())
}
