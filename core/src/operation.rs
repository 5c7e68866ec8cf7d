#![deny(missing_docs)]

//! # Operation Parser
//!
//! Parses a function's doc comment block into an HTTP operation. Type
//! references in `@Param`, `@Success`, `@Failure`, and `@Header` resolve
//! through the schema builder; combined forms compose through the allOf
//! composer.

use crate::error::{AppError, AppResult};
use crate::registry::{FileId, Registry};
use crate::schema::combined::{is_combined, parse_combined_type};
use crate::schema::composer::{compose, flatten_composed};
use crate::schema::SchemaBuilder;
use crate::spec::{Header, Operation, Parameter, Response, Schema};
use crate::tags::coerce_literal;
use crate::type_mapping::primitive_entry;
use indexmap::IndexMap;
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

/// A route binding from `@Router`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteKey {
    /// Route template path.
    pub path: String,
    /// Lowercase HTTP method.
    pub method: String,
}

/// A parsed operation and the routes it binds to.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedOperation {
    /// Routes from `@Router` lines, in order.
    pub routes: Vec<RouteKey>,
    /// The operation object.
    pub operation: Operation,
}

/// Parses one function doc block. Returns `None` when the block carries
/// no `@Router` binding.
pub fn parse_operation(
    builder: &mut SchemaBuilder,
    registry: &mut Registry,
    doc: &[String],
    file_id: FileId,
    parent_fn: &str,
) -> AppResult<Option<ParsedOperation>> {
    // The public marker changes qualification for every type reference in
    // the block, so it is detected up front.
    let public = doc
        .iter()
        .any(|line| attribute_of(line).is_some_and(|(attribute, _)| attribute == "public"));

    let mut operation = Operation::default();
    let mut routes = Vec::new();
    let mut description_lines: Vec<String> = Vec::new();

    for line in doc {
        let Some((attribute, value)) = attribute_of(line) else {
            continue;
        };
        match attribute.as_str() {
            "summary" => operation.summary = Some(value.to_string()),
            "description" => description_lines.push(value.to_string()),
            "tags" => {
                operation.tags = value
                    .split(',')
                    .map(|tag| tag.trim().to_string())
                    .filter(|tag| !tag.is_empty())
                    .collect();
            }
            "id" => operation.operation_id = Some(value.to_string()),
            "accept" => operation.consumes = mime_list(value),
            "produce" => operation.produces = mime_list(value),
            "deprecated" => operation.deprecated = true,
            "security" => {
                let mut requirement = IndexMap::new();
                requirement.insert(value.trim().to_string(), Vec::new());
                operation.security.push(requirement);
            }
            "param" => {
                let parameter =
                    parse_param(builder, registry, value, file_id, parent_fn, public)?;
                operation.parameters.push(parameter);
            }
            "success" | "failure" => {
                let (code, response) =
                    parse_response(builder, registry, value, file_id, parent_fn, public)?;
                operation.responses.insert(code, response);
            }
            "header" => {
                apply_header(&mut operation, value)?;
            }
            "router" => {
                routes.push(parse_router(value)?);
            }
            _ => {}
        }
    }

    if routes.is_empty() {
        return Ok(None);
    }
    if !description_lines.is_empty() {
        operation.description = Some(description_lines.join("\n"));
    }

    Ok(Some(ParsedOperation { routes, operation }))
}

/// Splits a doc line into its lowercase attribute and the remaining text.
fn attribute_of(line: &str) -> Option<(String, &str)> {
    let trimmed = line.trim();
    let rest = trimmed.strip_prefix('@')?;
    let end = rest
        .find(char::is_whitespace)
        .unwrap_or(rest.len());
    let attribute = rest[..end].to_lowercase();
    Some((attribute, rest[end..].trim_start()))
}

/// Resolves a response data token: combined forms compose, plain forms
/// resolve directly. Base wrappers keep their non-public form; data
/// payloads follow the operation's public marker.
pub fn resolve_data_schema(
    builder: &mut SchemaBuilder,
    registry: &mut Registry,
    token: &str,
    file_id: FileId,
    parent_fn: &str,
    public: bool,
) -> AppResult<Schema> {
    if is_combined(token) {
        let combined = parse_combined_type(token)?;
        let base_token = scoped_token(registry, &combined.base, file_id, parent_fn);
        let base = builder.schema_for_token(registry, &base_token, file_id, false)?;

        let mut overrides = IndexMap::new();
        for (field, value) in &combined.overrides {
            let schema = if is_combined(value) {
                resolve_data_schema(builder, registry, value, file_id, parent_fn, public)?
            } else {
                let value_token = scoped_token(registry, value, file_id, parent_fn);
                builder.schema_for_token(registry, &value_token, file_id, public)?
            };
            overrides.insert(field.clone(), schema);
        }

        return Ok(flatten_composed(compose(base, overrides)));
    }

    let token = scoped_token(registry, token, file_id, parent_fn);
    builder.schema_for_token(registry, &token, file_id, public)
}

/// Prefers the parent-function-scoped declaration for bare type names, so
/// body-local types stay out of the package namespace.
fn scoped_token(
    registry: &mut Registry,
    token: &str,
    file_id: FileId,
    parent_fn: &str,
) -> String {
    if parent_fn.is_empty() || token.contains('.') || !is_bare_name(token) {
        return token.to_string();
    }
    let qualified = format!("{}.{}", parent_fn, token);
    if registry.find_type(&qualified, file_id).is_some() {
        qualified
    } else {
        token.to_string()
    }
}

fn is_bare_name(token: &str) -> bool {
    !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_')
}

/// Parses `@Param name in type required "description" [attributes]`.
fn parse_param(
    builder: &mut SchemaBuilder,
    registry: &mut Registry,
    value: &str,
    file_id: FileId,
    parent_fn: &str,
    public: bool,
) -> AppResult<Parameter> {
    static PARAM_RE: OnceLock<Regex> = OnceLock::new();
    let param_re = PARAM_RE.get_or_init(|| {
        Regex::new(r#"^(\S+)\s+(\w+)\s+(\S+)\s+(\w+)\s+"([^"]*)"(?:\s+(.*))?$"#)
            .expect("Invalid regex")
    });

    let captures = param_re.captures(value.trim()).ok_or_else(|| {
        AppError::Parse(format!("malformed @Param line: '{}'", value))
    })?;

    let name = captures[1].to_string();
    let location = captures[2].to_lowercase();
    let type_token = captures[3].to_string();
    let required = &captures[4] == "true" || &captures[4] == "required";
    let description = captures[5].to_string();
    let attributes = captures.get(6).map(|m| m.as_str()).unwrap_or("");

    let mut parameter = Parameter {
        name,
        location: location.clone(),
        description: (!description.is_empty()).then_some(description),
        required: required || location == "path",
        ..Parameter::default()
    };

    if location == "body" {
        let schema =
            resolve_data_schema(builder, registry, &type_token, file_id, parent_fn, public)?;
        parameter.schema = Some(schema);
    } else {
        apply_primitive_param(&mut parameter, builder, registry, &type_token, file_id)?;
    }

    apply_param_attributes(&mut parameter, attributes);
    Ok(parameter)
}

/// Fills the primitive type cells of a non-body parameter. Enum aliases
/// surface their values inline; anything unresolvable degrades to string.
fn apply_primitive_param(
    parameter: &mut Parameter,
    builder: &mut SchemaBuilder,
    registry: &mut Registry,
    token: &str,
    file_id: FileId,
) -> AppResult<()> {
    if let Some(elem) = token.strip_prefix("[]") {
        parameter.param_type = Some("array".to_string());
        let entry = primitive_entry(elem).unwrap_or_else(|| {
            debug!("non-primitive array parameter '{}', using string items", token);
            crate::config::PrimitiveEntry::plain("string")
        });
        parameter.items = Some(Box::new(Schema::primitive(
            &entry.schema_type,
            entry.format.as_deref(),
        )));
        parameter.collection_format = Some(builder.config().collection_format.clone());
        return Ok(());
    }

    if let Some(entry) = primitive_entry(token) {
        parameter.param_type = Some(entry.schema_type);
        parameter.format = entry.format;
        return Ok(());
    }

    // Enum alias: inline the underlying type and values.
    if let Some(resolved) = registry.find_type(token, file_id) {
        let decl = registry.decl(resolved.decl).clone();
        let values = registry.enum_values(&decl.pkg_path, &decl.spec.name);
        if !values.is_empty() {
            let entry = decl
                .primitive
                .clone()
                .unwrap_or_else(|| crate::config::PrimitiveEntry::plain("integer"));
            parameter.param_type = Some(entry.schema_type);
            parameter.format = entry.format;
            parameter.enum_values = values.iter().map(|(_, v)| v.to_json()).collect();
            return Ok(());
        }
    }

    debug!("unresolved parameter type '{}', using string", token);
    parameter.param_type = Some("string".to_string());
    Ok(())
}

/// Applies trailing `name(value)` attributes of a `@Param` line.
fn apply_param_attributes(parameter: &mut Parameter, attributes: &str) {
    static ATTR_RE: OnceLock<Regex> = OnceLock::new();
    let attr_re = ATTR_RE
        .get_or_init(|| Regex::new(r"(\w+)\(([^)]*)\)").expect("Invalid regex"));

    let coercion_type = parameter
        .param_type
        .clone()
        .unwrap_or_else(|| "string".to_string());

    for captures in attr_re.captures_iter(attributes) {
        let name = captures[1].to_lowercase();
        let value = captures[2].trim();
        match name.as_str() {
            "enums" => {
                parameter.enum_values = value
                    .split(',')
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .filter_map(|v| coerce_literal(v, &coercion_type))
                    .collect();
            }
            "minimum" => parameter.minimum = value.parse().ok(),
            "maximum" => parameter.maximum = value.parse().ok(),
            "minlength" => parameter.min_length = value.parse().ok(),
            "maxlength" => parameter.max_length = value.parse().ok(),
            "default" => parameter.default = coerce_literal(value, &coercion_type),
            "example" => parameter.example = coerce_literal(value, &coercion_type),
            "collectionformat" => {
                parameter.collection_format = Some(value.to_string());
            }
            _ => {}
        }
    }
}

/// Parses `@Success`/`@Failure`: `code {kind} type "description"`, with
/// the kind and type optional.
fn parse_response(
    builder: &mut SchemaBuilder,
    registry: &mut Registry,
    value: &str,
    file_id: FileId,
    parent_fn: &str,
    public: bool,
) -> AppResult<(String, Response)> {
    static RESPONSE_RE: OnceLock<Regex> = OnceLock::new();
    let response_re = RESPONSE_RE.get_or_init(|| {
        Regex::new(r#"^(\d+|default)(?:\s+\{(\w+)\}\s+(\S+))?(?:\s+"([^"]*)")?\s*$"#)
            .expect("Invalid regex")
    });

    let captures = response_re.captures(value.trim()).ok_or_else(|| {
        AppError::Parse(format!("malformed response line: '{}'", value))
    })?;

    let code = captures[1].to_string();
    let description = captures
        .get(4)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();

    let schema = match (captures.get(2), captures.get(3)) {
        (Some(kind), Some(token)) => Some(resolve_kinded_schema(
            builder,
            registry,
            kind.as_str(),
            token.as_str(),
            file_id,
            parent_fn,
            public,
        )?),
        _ => None,
    };

    Ok((
        code,
        Response {
            description,
            schema,
            headers: IndexMap::new(),
        },
    ))
}

/// Builds the schema for a `{kind} type` pair.
fn resolve_kinded_schema(
    builder: &mut SchemaBuilder,
    registry: &mut Registry,
    kind: &str,
    token: &str,
    file_id: FileId,
    parent_fn: &str,
    public: bool,
) -> AppResult<Schema> {
    match kind {
        "object" => {
            resolve_data_schema(builder, registry, token, file_id, parent_fn, public)
        }
        "array" => {
            let items =
                resolve_data_schema(builder, registry, token, file_id, parent_fn, public)?;
            Ok(Schema::array(items))
        }
        "string" | "integer" | "boolean" | "number" => {
            // The token may refine the kind (`{integer} int64`).
            let entry = primitive_entry(token)
                .unwrap_or_else(|| crate::config::PrimitiveEntry::plain(kind));
            Ok(Schema::primitive(&entry.schema_type, entry.format.as_deref()))
        }
        other => Err(AppError::Parse(format!(
            "unknown response kind '{{{}}}'",
            other
        ))),
    }
}

/// Parses `@Header code {type} Name "description"` onto the matching
/// response.
fn apply_header(operation: &mut Operation, value: &str) -> AppResult<()> {
    static HEADER_RE: OnceLock<Regex> = OnceLock::new();
    let header_re = HEADER_RE.get_or_init(|| {
        Regex::new(r#"^(\d+|default|all)\s+\{(\w+)\}\s+(\S+)\s+"([^"]*)"$"#)
            .expect("Invalid regex")
    });

    let captures = header_re.captures(value.trim()).ok_or_else(|| {
        AppError::Parse(format!("malformed @Header line: '{}'", value))
    })?;

    let code = captures[1].to_string();
    let header = Header {
        header_type: captures[2].to_string(),
        format: None,
        description: Some(captures[4].to_string()),
    };
    let name = captures[3].to_string();

    if code == "all" {
        for response in operation.responses.values_mut() {
            response.headers.insert(name.clone(), header.clone());
        }
        return Ok(());
    }

    if let Some(response) = operation.responses.get_mut(&code) {
        response.headers.insert(name, header);
    } else {
        debug!("@Header for unknown response code {}", code);
    }
    Ok(())
}

/// Parses `@Router /path [method]`.
fn parse_router(value: &str) -> AppResult<RouteKey> {
    static ROUTER_RE: OnceLock<Regex> = OnceLock::new();
    let router_re = ROUTER_RE
        .get_or_init(|| Regex::new(r"^(\S+)\s+\[(\w+)\]$").expect("Invalid regex"));

    let captures = router_re.captures(value.trim()).ok_or_else(|| {
        AppError::Parse(format!("malformed @Router line: '{}'", value))
    })?;

    Ok(RouteKey {
        path: captures[1].to_string(),
        method: captures[2].to_lowercase(),
    })
}

/// Expands MIME aliases; tokens already containing `/` pass through.
fn mime_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| match token {
            "json" => "application/json".to_string(),
            "xml" => "text/xml".to_string(),
            "plain" => "text/plain".to_string(),
            "html" => "text/html".to_string(),
            "mpfd" => "multipart/form-data".to_string(),
            "x-www-form-urlencoded" => "application/x-www-form-urlencoded".to_string(),
            "json-api" => "application/vnd.api+json".to_string(),
            "octet-stream" => "application/octet-stream".to_string(),
            "png" => "image/png".to_string(),
            "jpeg" => "image/jpeg".to_string(),
            "gif" => "image/gif".to_string(),
            other => other.to_string(),
        })
        .collect()
}
