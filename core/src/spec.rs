#![deny(missing_docs)]

//! # Document Model
//!
//! Serde types for the emitted OpenAPI 2.0 subset. Optional members are
//! skipped when unset so the output carries only what was declared; maps
//! preserve insertion order and definitions are sorted by the driver
//! before serialization.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value as JsonValue;

/// Reference prefix for definition schemas.
pub const DEFINITIONS_PREFIX: &str = "#/definitions/";

/// The root document.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Spec {
    /// Always `"2.0"`.
    pub swagger: String,
    /// API metadata.
    pub info: Info,
    /// Host serving the API.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// Base path of the API.
    #[serde(rename = "basePath", skip_serializing_if = "Option::is_none")]
    pub base_path: Option<String>,
    /// Transfer protocols.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub schemes: Vec<String>,
    /// Path items keyed by route template.
    pub paths: IndexMap<String, PathItem>,
    /// Named schema definitions.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub definitions: IndexMap<String, Schema>,
    /// Tag metadata.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

impl Default for Spec {
    fn default() -> Self {
        Self {
            swagger: "2.0".to_string(),
            info: Info::default(),
            host: None,
            base_path: None,
            schemes: Vec::new(),
            paths: IndexMap::new(),
            definitions: IndexMap::new(),
            tags: Vec::new(),
        }
    }
}

impl Spec {
    /// Sorts the definitions map by name for reproducible emission.
    pub fn sort_definitions(&mut self) {
        self.definitions.sort_keys();
    }
}

/// API metadata.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Info {
    /// API title.
    pub title: String,
    /// Long description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Terms of service URL.
    #[serde(rename = "termsOfService", skip_serializing_if = "Option::is_none")]
    pub terms_of_service: Option<String>,
    /// Contact information.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
    /// License information.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<License>,
    /// Document version.
    pub version: String,
}

impl Default for Info {
    fn default() -> Self {
        Self {
            title: "Swagger Example API".to_string(),
            description: None,
            terms_of_service: None,
            contact: None,
            license: None,
            version: "1.0".to_string(),
        }
    }
}

/// Contact metadata.
#[derive(Debug, Clone, Serialize, PartialEq, Default)]
pub struct Contact {
    /// Contact name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Contact URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Contact email.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// License metadata.
#[derive(Debug, Clone, Serialize, PartialEq, Default)]
pub struct License {
    /// License name.
    pub name: String,
    /// License URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Tag metadata.
#[derive(Debug, Clone, Serialize, PartialEq, Default)]
pub struct Tag {
    /// Tag name.
    pub name: String,
    /// Tag description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Operations of one route, keyed by lowercase HTTP method.
#[derive(Debug, Clone, Serialize, PartialEq, Default)]
pub struct PathItem {
    /// Method to operation.
    #[serde(flatten)]
    pub operations: IndexMap<String, Operation>,
}

/// One HTTP operation.
#[derive(Debug, Clone, Serialize, PartialEq, Default)]
pub struct Operation {
    /// Grouping tags.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Short summary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Long description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Unique operation id.
    #[serde(rename = "operationId", skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    /// Consumed MIME types.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub consumes: Vec<String>,
    /// Produced MIME types.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub produces: Vec<String>,
    /// Parameters in declaration order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    /// Responses keyed by status code (or `default`).
    pub responses: IndexMap<String, Response>,
    /// Deprecation marker.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
    /// Security requirements.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub security: Vec<IndexMap<String, Vec<String>>>,
}

/// One operation parameter.
#[derive(Debug, Clone, Serialize, PartialEq, Default)]
pub struct Parameter {
    /// Parameter name.
    pub name: String,
    /// Location: query, path, header, body, or formData.
    #[serde(rename = "in")]
    pub location: String,
    /// Description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the parameter must be present.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    /// Body parameters carry a schema.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
    /// Non-body parameters carry a primitive type.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub param_type: Option<String>,
    /// Format of the primitive type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Item schema for array parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    /// Collection format token for array parameters.
    #[serde(rename = "collectionFormat", skip_serializing_if = "Option::is_none")]
    pub collection_format: Option<String>,
    /// Enumerated values.
    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<JsonValue>,
    /// Lower numeric bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    /// Upper numeric bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    /// Minimum string length.
    #[serde(rename = "minLength", skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    /// Maximum string length.
    #[serde(rename = "maxLength", skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    /// Default value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<JsonValue>,
    /// Example value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<JsonValue>,
}

/// One response.
#[derive(Debug, Clone, Serialize, PartialEq, Default)]
pub struct Response {
    /// Response description; required by the format, possibly empty.
    pub description: String,
    /// Body schema.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
    /// Response headers.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub headers: IndexMap<String, Header>,
}

/// One response header.
#[derive(Debug, Clone, Serialize, PartialEq, Default)]
pub struct Header {
    /// Header type.
    #[serde(rename = "type")]
    pub header_type: String,
    /// Header format.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// An OpenAPI 2.0 schema fragment: a primitive leaf, an array, a map, an
/// object, a `$ref`, or an `allOf` list.
#[derive(Debug, Clone, Serialize, PartialEq, Default)]
pub struct Schema {
    /// Reference to a named definition.
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Schema type.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    /// Format qualifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Array item schema.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    /// Map value schema.
    #[serde(
        rename = "additionalProperties",
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_properties: Option<Box<Schema>>,
    /// Object properties in declaration order.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, Schema>,
    /// Required property names.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    /// Composition list.
    #[serde(rename = "allOf", skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<Schema>,
    /// Enumerated values.
    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<JsonValue>,
    /// Lower numeric bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    /// Upper numeric bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    /// Multiple-of constraint.
    #[serde(rename = "multipleOf", skip_serializing_if = "Option::is_none")]
    pub multiple_of: Option<f64>,
    /// Minimum string length.
    #[serde(rename = "minLength", skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    /// Maximum string length.
    #[serde(rename = "maxLength", skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    /// Minimum item count.
    #[serde(rename = "minItems", skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    /// Maximum item count.
    #[serde(rename = "maxItems", skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
    /// Uniqueness constraint for arrays.
    #[serde(rename = "uniqueItems", skip_serializing_if = "std::ops::Not::not")]
    pub unique_items: bool,
    /// Example value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<JsonValue>,
    /// Default value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<JsonValue>,
    /// Read-only marker.
    #[serde(rename = "readOnly", skip_serializing_if = "std::ops::Not::not")]
    pub read_only: bool,
    /// Vendor extensions (`x-...`), flattened into the schema object.
    /// An empty map emits nothing.
    #[serde(flatten)]
    pub extensions: IndexMap<String, JsonValue>,
}

impl Schema {
    /// An object schema with no properties.
    pub fn object() -> Self {
        Schema {
            schema_type: Some("object".to_string()),
            ..Schema::default()
        }
    }

    /// A schema of the given primitive type.
    pub fn primitive(schema_type: &str, format: Option<&str>) -> Self {
        Schema {
            schema_type: Some(schema_type.to_string()),
            format: format.map(str::to_string),
            ..Schema::default()
        }
    }

    /// A `$ref` to a named definition.
    pub fn reference(name: &str) -> Self {
        Schema {
            reference: Some(format!("{}{}", DEFINITIONS_PREFIX, name)),
            ..Schema::default()
        }
    }

    /// An array of the given item schema.
    pub fn array(items: Schema) -> Self {
        Schema {
            schema_type: Some("array".to_string()),
            items: Some(Box::new(items)),
            ..Schema::default()
        }
    }

    /// An object mapping arbitrary keys to the given value schema.
    pub fn map_of(value: Schema) -> Self {
        Schema {
            schema_type: Some("object".to_string()),
            additional_properties: Some(Box::new(value)),
            ..Schema::default()
        }
    }

    /// The definition name this schema references, if it is a `$ref`.
    pub fn ref_name(&self) -> Option<&str> {
        self.reference
            .as_deref()
            .and_then(|r| r.strip_prefix(DEFINITIONS_PREFIX))
    }

    /// Whether this is an empty object: no reference, no properties, no
    /// composition, at most a bare `object` type.
    pub fn is_empty_object(&self) -> bool {
        self.reference.is_none()
            && self.properties.is_empty()
            && self.all_of.is_empty()
            && self.additional_properties.is_none()
            && self.items.is_none()
            && matches!(self.schema_type.as_deref(), None | Some("object"))
    }
}
