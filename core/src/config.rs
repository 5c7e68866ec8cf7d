#![deny(missing_docs)]

//! # Generator Configuration
//!
//! Plain data consumed by the generator and the schema pipeline. The CLI
//! layer maps its flags onto this struct; the core never reads the
//! environment or the command line itself.

use std::collections::{HashMap, HashSet};

/// Naming strategy applied to struct fields that carry no explicit
/// `json`/`form`/`header`/`uri` tag name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PropertyStrategy {
    /// `FieldName` becomes `fieldName`.
    #[default]
    CamelCase,
    /// `FieldName` becomes `field_name`.
    SnakeCase,
    /// `FieldName` stays `FieldName`.
    PascalCase,
}

/// Gates loading of packages that live outside the parsed source tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DependencyMode {
    /// Never load external packages.
    #[default]
    None,
    /// Load external packages only while resolving model references.
    Models,
    /// Load external packages for everything, operations included.
    All,
}

impl DependencyMode {
    /// Whether external packages may be loaded at all.
    pub fn allows_models(&self) -> bool {
        !matches!(self, Self::None)
    }
}

/// A primitive schema cell: `(type, format)`.
///
/// Used by the extended-primitive and field-sugar tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimitiveEntry {
    /// OpenAPI schema type (`string`, `integer`, ...).
    pub schema_type: String,
    /// Optional OpenAPI format (`date-time`, `uuid`, ...).
    pub format: Option<String>,
}

impl PrimitiveEntry {
    /// Creates an entry with no format.
    pub fn plain(schema_type: &str) -> Self {
        Self {
            schema_type: schema_type.to_string(),
            format: None,
        }
    }

    /// Creates an entry with a format.
    pub fn formatted(schema_type: &str, format: &str) -> Self {
        Self {
            schema_type: schema_type.to_string(),
            format: Some(format.to_string()),
        }
    }
}

/// Configuration observed by the core.
#[derive(Debug, Clone)]
pub struct Config {
    /// Naming strategy for un-tagged field names.
    pub property_strategy: PropertyStrategy,
    /// Default `required` value for fields without a binding/validate tag.
    pub required_by_default: bool,
    /// External-package loading mode.
    pub dependency_mode: DependencyMode,
    /// Collection format token for query array parameters.
    pub collection_format: String,
    /// Whether a duplicate `(method, path)` registration is an error.
    pub strict_route_duplicates: bool,
    /// Closed set of selector types treated as primitives.
    ///
    /// Keyed by both short (`time.Time`) and fully qualified
    /// (`github.com/google/uuid.UUID`) forms. The set ships with defaults
    /// and is extendable; membership is a table lookup, never a pattern
    /// match.
    pub extended_primitives: HashMap<String, PrimitiveEntry>,
    /// Generic wrapper base names whose first type parameter is the
    /// payload (`types.Field[T]` style). Lookups strip package pointers.
    pub custom_wrappers: HashSet<String>,
    /// Field-sugar selector types reduced directly to primitives
    /// (`types.String`, `types.Int`, ...).
    pub field_sugar: HashMap<String, PrimitiveEntry>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            property_strategy: PropertyStrategy::default(),
            required_by_default: false,
            dependency_mode: DependencyMode::default(),
            collection_format: "csv".to_string(),
            strict_route_duplicates: false,
            extended_primitives: default_extended_primitives(),
            custom_wrappers: default_custom_wrappers(),
            field_sugar: default_field_sugar(),
        }
    }
}

fn default_extended_primitives() -> HashMap<String, PrimitiveEntry> {
    let mut table = HashMap::new();

    for name in ["time.Time", "time/time.Time"] {
        table.insert(name.to_string(), PrimitiveEntry::formatted("string", "date-time"));
    }

    for name in [
        "uuid.UUID",
        "guuid.UUID",
        "github.com/google/uuid.UUID",
        "github.com/gofrs/uuid.UUID",
        "github.com/satori/go.uuid.UUID",
    ] {
        table.insert(name.to_string(), PrimitiveEntry::formatted("string", "uuid"));
    }

    for name in [
        "decimal.Decimal",
        "decimal.NullDecimal",
        "github.com/shopspring/decimal.Decimal",
        "github.com/shopspring/decimal.NullDecimal",
    ] {
        table.insert(name.to_string(), PrimitiveEntry::plain("number"));
    }

    table
}

fn default_custom_wrappers() -> HashSet<String> {
    ["types.Field", "types.SliceField", "null.Val"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn default_field_sugar() -> HashMap<String, PrimitiveEntry> {
    let mut table = HashMap::new();
    table.insert("types.String".to_string(), PrimitiveEntry::plain("string"));
    table.insert("types.Int".to_string(), PrimitiveEntry::formatted("integer", "int64"));
    table.insert("types.Bool".to_string(), PrimitiveEntry::plain("boolean"));
    table.insert("types.UUID".to_string(), PrimitiveEntry::formatted("string", "uuid"));
    table.insert("types.Float".to_string(), PrimitiveEntry::formatted("number", "double"));
    table.insert("types.Decimal".to_string(), PrimitiveEntry::plain("number"));
    table.insert("types.Time".to_string(), PrimitiveEntry::formatted("string", "date-time"));
    table
}
