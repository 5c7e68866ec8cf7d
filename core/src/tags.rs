#![deny(missing_docs)]

//! # Tag Decoder
//!
//! Parses a field's tag bag into a normalized `FieldTagInfo` record. The
//! decoder is pure: it never touches the registry, and type-directed
//! coercion of literals happens against the schema type the caller already
//! derived.

use crate::error::{AppError, AppResult};
use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use tracing::debug;

/// Field visibility, from the `public` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    /// Readable through public variants.
    View,
    /// Readable and writable through public variants.
    Edit,
    /// Excluded from public variants. Absent or unrecognized tags land here.
    #[default]
    Private,
}

impl Visibility {
    /// Whether the field appears in public-variant schemas.
    pub fn is_public(&self) -> bool {
        matches!(self, Visibility::View | Visibility::Edit)
    }
}

/// A `swaggertype` override schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomSchema {
    /// `primitive,<T>` or a bare primitive token.
    Primitive(String),
    /// `array,<rest>`: items follow the same grammar.
    Array(Box<CustomSchema>),
    /// `object,<rest>`: additionalProperties follow the same grammar.
    Object(Box<CustomSchema>),
}

/// Decoded tags for one field. Absence means default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldTagInfo {
    /// Name from the `json` tag (or `column` fallback).
    pub json_name: Option<String>,
    /// Parameter names from `form`/`header`/`uri` tags, in that precedence.
    pub param_name: Option<String>,
    /// `json:",omitempty"` flag.
    pub omit_empty: bool,
    /// `json:",string"` flag: the schema type becomes string.
    pub as_string: bool,
    /// `json:"-"` or `swaggerignore:"true"`.
    pub ignore: bool,
    /// `public` tag visibility.
    pub visibility: Visibility,
    /// Tri-state requiredness from `binding`/`validate` tokens.
    pub required: Option<bool>,
    /// Lower numeric bound (`min=`, `gte=`, `minimum`).
    pub minimum: Option<f64>,
    /// Upper numeric bound (`max=`, `lte=`, `maximum`).
    pub maximum: Option<f64>,
    /// `multipleOf` tag.
    pub multiple_of: Option<f64>,
    /// `minLength` tag.
    pub min_length: Option<u64>,
    /// `maxLength` tag.
    pub max_length: Option<u64>,
    /// `minItems` tag.
    pub min_items: Option<u64>,
    /// `maxItems` tag.
    pub max_items: Option<u64>,
    /// `unique` binding token on array fields.
    pub unique_items: bool,
    /// Enum values from `enums` or `oneof=`, raw; coerced by field type.
    pub enums: Vec<String>,
    /// `example` literal, raw.
    pub example: Option<String>,
    /// `swag_default` literal, raw.
    pub default: Option<String>,
    /// `format` override.
    pub format: Option<String>,
    /// `title` attribute.
    pub title: Option<String>,
    /// `readonly:"true"`.
    pub read_only: bool,
    /// Vendor extensions from the `extensions` tag.
    pub extensions: IndexMap<String, JsonValue>,
    /// `x-enum-varnames` list.
    pub enum_varnames: Vec<String>,
    /// Parsed `swaggertype` override.
    pub swagger_type: Option<CustomSchema>,
}

impl FieldTagInfo {
    /// The effective explicit name: json first, then the parameter tags.
    pub fn explicit_name(&self) -> Option<&str> {
        self.json_name.as_deref().or(self.param_name.as_deref())
    }
}

/// Decodes the raw tag bag of one field.
///
/// A missing bag decodes to all defaults. Invalid numeric values are
/// dropped with a debug log; a malformed `swaggertype` is a parse error.
pub fn decode_tags(raw: Option<&str>) -> AppResult<FieldTagInfo> {
    let mut info = FieldTagInfo::default();
    let Some(raw) = raw else {
        return Ok(info);
    };

    let mut column_name: Option<String> = None;
    let mut form: Option<String> = None;
    let mut header: Option<String> = None;
    let mut uri: Option<String> = None;

    for (key, value) in iter_tag_pairs(raw) {
        match key.as_str() {
            "json" => decode_json_value(&value, &mut info),
            "column" => {
                if !value.is_empty() {
                    column_name = Some(value);
                }
            }
            "form" => form = first_token(&value),
            "header" => header = first_token(&value),
            "uri" => uri = first_token(&value),
            "binding" | "validate" => decode_binding(&value, &mut info),
            "enums" => {
                info.enums = split_csv(&value);
            }
            "minimum" => info.minimum = parse_number(&key, &value),
            "maximum" => info.maximum = parse_number(&key, &value),
            "multipleOf" => info.multiple_of = parse_number(&key, &value),
            "minLength" => info.min_length = parse_count(&key, &value),
            "maxLength" => info.max_length = parse_count(&key, &value),
            "minItems" => info.min_items = parse_count(&key, &value),
            "maxItems" => info.max_items = parse_count(&key, &value),
            "example" => info.example = Some(value),
            "swag_default" | "default" => info.default = Some(value),
            "format" => info.format = Some(value),
            "title" => info.title = Some(value),
            "readonly" => info.read_only = value == "true",
            "extensions" => decode_extensions(&value, &mut info.extensions),
            "x-enum-varnames" => info.enum_varnames = split_csv(&value),
            "swaggertype" => {
                info.swagger_type = Some(parse_custom_schema(&value)?);
            }
            "swaggerignore" => {
                if value == "true" {
                    info.ignore = true;
                }
            }
            "public" => {
                info.visibility = match value.as_str() {
                    "view" => Visibility::View,
                    "edit" => Visibility::Edit,
                    _ => Visibility::Private,
                };
            }
            _ => {}
        }
    }

    if info.json_name.is_none() {
        info.json_name = column_name;
    }
    info.param_name = form.or(header).or(uri);

    Ok(info)
}

/// Iterates `key:"value"` pairs of a tag bag, unescaping the values.
fn iter_tag_pairs(raw: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    let mut chars = raw.chars().peekable();

    loop {
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        let mut key = String::new();
        while let Some(&c) = chars.peek() {
            if c == ':' || c.is_whitespace() {
                break;
            }
            key.push(c);
            chars.next();
        }
        if key.is_empty() {
            break;
        }
        if chars.peek() != Some(&':') {
            break;
        }
        chars.next();
        if chars.peek() != Some(&'"') {
            break;
        }
        chars.next();
        let mut value = String::new();
        let mut closed = false;
        while let Some(c) = chars.next() {
            match c {
                '"' => {
                    closed = true;
                    break;
                }
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        if escaped != '"' {
                            value.push('\\');
                        }
                        value.push(escaped);
                    }
                }
                _ => value.push(c),
            }
        }
        if !closed {
            break;
        }
        pairs.push((key, value));
    }

    pairs
}

fn decode_json_value(value: &str, info: &mut FieldTagInfo) {
    let tokens: Vec<&str> = value.split(',').collect();
    match tokens.first() {
        // `json:"-"` ignores the field; `json:"-,"` names it "-".
        Some(&"-") if tokens.len() == 1 => {
            info.ignore = true;
            return;
        }
        Some(name) if !name.is_empty() => {
            info.json_name = Some((*name).to_string());
        }
        _ => {}
    }
    for flag in tokens.iter().skip(1) {
        match *flag {
            "omitempty" => info.omit_empty = true,
            "string" => info.as_string = true,
            _ => {}
        }
    }
}

/// Decodes `binding`/`validate` token lists.
fn decode_binding(value: &str, info: &mut FieldTagInfo) {
    for token in split_outside_quotes(value, ',') {
        let token = token.trim();
        if token == "dive" {
            // Everything after dive constrains element values, not the
            // field itself.
            break;
        }
        match token {
            "required" => info.required = Some(true),
            "optional" | "omitempty" => info.required = Some(false),
            "unique" => info.unique_items = true,
            _ => {
                if let Some(rest) = token.strip_prefix("min=").or_else(|| token.strip_prefix("gte="))
                {
                    info.minimum = parse_number(token, rest);
                } else if let Some(rest) =
                    token.strip_prefix("max=").or_else(|| token.strip_prefix("lte="))
                {
                    info.maximum = parse_number(token, rest);
                } else if let Some(rest) = token.strip_prefix("oneof=") {
                    info.enums = split_oneof(rest);
                }
            }
        }
    }
}

/// Splits `oneof=` values on spaces, honoring single-quoted tokens.
fn split_oneof(value: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    for c in value.chars() {
        match c {
            '\'' => in_quotes = !in_quotes,
            ' ' if !in_quotes => {
                if !current.is_empty() {
                    out.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

/// Splits on `sep`, ignoring separators inside single quotes.
fn split_outside_quotes(value: &str, sep: char) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    for c in value.chars() {
        if c == '\'' {
            in_quotes = !in_quotes;
            current.push(c);
        } else if c == sep && !in_quotes {
            out.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    out.push(current);
    out
}

fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn first_token(value: &str) -> Option<String> {
    let name = value.split(',').next().unwrap_or("").trim();
    if name.is_empty() || name == "-" {
        None
    } else {
        Some(name.to_string())
    }
}

fn parse_number(key: &str, value: &str) -> Option<f64> {
    match value.trim().parse::<f64>() {
        Ok(n) => Some(n),
        Err(_) => {
            debug!("ignoring invalid numeric tag {}={:?}", key, value);
            None
        }
    }
}

fn parse_count(key: &str, value: &str) -> Option<u64> {
    match value.trim().parse::<u64>() {
        Ok(n) => Some(n),
        Err(_) => {
            debug!("ignoring invalid count tag {}={:?}", key, value);
            None
        }
    }
}

/// Decodes the `extensions` tag: comma-separated `name` or `name=value`
/// entries, names normalized to an `x-` prefix.
fn decode_extensions(value: &str, extensions: &mut IndexMap<String, JsonValue>) {
    for entry in value.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let (name, val) = match entry.split_once('=') {
            Some((name, val)) => (name, JsonValue::String(val.to_string())),
            None => (entry, JsonValue::Bool(true)),
        };
        let name = if name.starts_with("x-") {
            name.to_string()
        } else {
            format!("x-{}", name)
        };
        extensions.insert(name, val);
    }
}

/// Parses the `swaggertype` grammar: tokens separated by commas.
pub fn parse_custom_schema(value: &str) -> AppResult<CustomSchema> {
    let tokens: Vec<&str> = value.split(',').map(str::trim).collect();
    parse_custom_tokens(&tokens)
}

fn parse_custom_tokens(tokens: &[&str]) -> AppResult<CustomSchema> {
    let (first, rest) = tokens
        .split_first()
        .ok_or_else(|| AppError::Parse("swaggertype: empty override".to_string()))?;

    match *first {
        "primitive" => {
            let inner = rest
                .first()
                .ok_or_else(|| AppError::Parse("swaggertype: primitive needs a type".to_string()))?;
            ensure_primitive(inner)?;
            Ok(CustomSchema::Primitive((*inner).to_string()))
        }
        "array" => {
            if rest.is_empty() {
                return Err(AppError::Parse(
                    "swaggertype: array needs an item type".to_string(),
                ));
            }
            Ok(CustomSchema::Array(Box::new(parse_custom_tokens(rest)?)))
        }
        "object" => {
            if rest.is_empty() {
                return Err(AppError::Parse(
                    "swaggertype: object needs a value type".to_string(),
                ));
            }
            Ok(CustomSchema::Object(Box::new(parse_custom_tokens(rest)?)))
        }
        other if rest.is_empty() => {
            ensure_primitive(other)?;
            Ok(CustomSchema::Primitive(other.to_string()))
        }
        other => Err(AppError::Parse(format!(
            "swaggertype: unexpected token '{}'",
            other
        ))),
    }
}

fn ensure_primitive(token: &str) -> AppResult<()> {
    match token {
        "string" | "integer" | "number" | "boolean" | "object" | "array" => Ok(()),
        other => Err(AppError::Parse(format!(
            "swaggertype: '{}' is not a primitive",
            other
        ))),
    }
}

/// Coerces a literal to a JSON value of the given schema type.
///
/// Returns `None` (and logs) when the literal does not fit; the offending
/// tag is ignored and other constraints still apply.
pub fn coerce_literal(value: &str, schema_type: &str) -> Option<JsonValue> {
    match schema_type {
        "integer" => match value.parse::<i64>() {
            Ok(n) => Some(JsonValue::from(n)),
            Err(_) => {
                debug!("ignoring non-integer literal {:?}", value);
                None
            }
        },
        "number" => match value.parse::<f64>() {
            Ok(n) => serde_json::Number::from_f64(n).map(JsonValue::Number),
            Err(_) => {
                debug!("ignoring non-numeric literal {:?}", value);
                None
            }
        },
        "boolean" => match value.parse::<bool>() {
            Ok(b) => Some(JsonValue::Bool(b)),
            Err(_) => {
                debug!("ignoring non-boolean literal {:?}", value);
                None
            }
        },
        _ => Some(JsonValue::String(value.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_json_name_and_flags() {
        let info = decode_tags(Some(r#"json:"email,omitempty""#)).unwrap();
        assert_eq!(info.json_name.as_deref(), Some("email"));
        assert!(info.omit_empty);
        assert!(!info.ignore);

        let ignored = decode_tags(Some(r#"json:"-""#)).unwrap();
        assert!(ignored.ignore);

        let dash_named = decode_tags(Some(r#"json:"-,""#)).unwrap();
        assert!(!dash_named.ignore);
        assert_eq!(dash_named.json_name.as_deref(), Some("-"));

        let stringly = decode_tags(Some(r#"json:"count,string""#)).unwrap();
        assert!(stringly.as_string);
    }

    #[test]
    fn test_column_fallback() {
        let info = decode_tags(Some(r#"column:"user_id""#)).unwrap();
        assert_eq!(info.json_name.as_deref(), Some("user_id"));

        let json_wins = decode_tags(Some(r#"json:"id" column:"user_id""#)).unwrap();
        assert_eq!(json_wins.json_name.as_deref(), Some("id"));
    }

    #[test]
    fn test_binding_tokens() {
        let info =
            decode_tags(Some(r#"binding:"required,min=1,max=10,unique""#)).unwrap();
        assert_eq!(info.required, Some(true));
        assert_eq!(info.minimum, Some(1.0));
        assert_eq!(info.maximum, Some(10.0));
        assert!(info.unique_items);

        let optional = decode_tags(Some(r#"validate:"optional,gte=5,lte=9""#)).unwrap();
        assert_eq!(optional.required, Some(false));
        assert_eq!(optional.minimum, Some(5.0));
        assert_eq!(optional.maximum, Some(9.0));
    }

    #[test]
    fn test_binding_dive_terminates() {
        let info = decode_tags(Some(r#"validate:"required,dive,min=3""#)).unwrap();
        assert_eq!(info.required, Some(true));
        assert_eq!(info.minimum, None);
    }

    #[test]
    fn test_oneof_with_quotes() {
        let info =
            decode_tags(Some(r#"validate:"oneof=red green 'dark blue'""#)).unwrap();
        assert_eq!(info.enums, vec!["red", "green", "dark blue"]);
    }

    #[test]
    fn test_enums_tag() {
        let info = decode_tags(Some(r#"enums:"A,B,C""#)).unwrap();
        assert_eq!(info.enums, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_invalid_numeric_ignored() {
        let info = decode_tags(Some(r#"minimum:"abc" maximum:"10""#)).unwrap();
        assert_eq!(info.minimum, None);
        assert_eq!(info.maximum, Some(10.0));
    }

    #[test]
    fn test_extensions() {
        let info =
            decode_tags(Some(r#"extensions:"x-nullable,abc=def""#)).unwrap();
        assert_eq!(info.extensions.get("x-nullable"), Some(&JsonValue::Bool(true)));
        assert_eq!(
            info.extensions.get("x-abc"),
            Some(&JsonValue::String("def".into()))
        );
    }

    #[test]
    fn test_swaggertype_grammar() {
        assert_eq!(
            parse_custom_schema("primitive,string").unwrap(),
            CustomSchema::Primitive("string".into())
        );
        assert_eq!(
            parse_custom_schema("array,integer").unwrap(),
            CustomSchema::Array(Box::new(CustomSchema::Primitive("integer".into())))
        );
        assert_eq!(
            parse_custom_schema("object,array,string").unwrap(),
            CustomSchema::Object(Box::new(CustomSchema::Array(Box::new(
                CustomSchema::Primitive("string".into())
            ))))
        );
        assert_eq!(
            parse_custom_schema("number").unwrap(),
            CustomSchema::Primitive("number".into())
        );
        assert!(parse_custom_schema("primitive,NotAType").is_err());
        assert!(parse_custom_schema("").is_err());
    }

    #[test]
    fn test_visibility() {
        let view = decode_tags(Some(r#"public:"view""#)).unwrap();
        assert_eq!(view.visibility, Visibility::View);
        assert!(view.visibility.is_public());

        let other = decode_tags(Some(r#"public:"secret""#)).unwrap();
        assert_eq!(other.visibility, Visibility::Private);

        let absent = decode_tags(None).unwrap();
        assert_eq!(absent.visibility, Visibility::Private);
    }

    #[test]
    fn test_param_name_precedence() {
        let info = decode_tags(Some(r#"uri:"from_uri" form:"from_form""#)).unwrap();
        assert_eq!(info.param_name.as_deref(), Some("from_form"));
    }

    #[test]
    fn test_coerce_literal() {
        assert_eq!(coerce_literal("42", "integer"), Some(JsonValue::from(42)));
        assert_eq!(coerce_literal("x", "integer"), None);
        assert_eq!(coerce_literal("true", "boolean"), Some(JsonValue::Bool(true)));
        assert_eq!(
            coerce_literal("hi", "string"),
            Some(JsonValue::String("hi".into()))
        );
    }
}
