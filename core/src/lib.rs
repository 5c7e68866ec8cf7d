#![deny(missing_docs)]

//! # Swaggen Core
//!
//! Symbol-and-schema resolution engine: turns an annotated source tree
//! into an OpenAPI 2.0 document. The registry builds a cross-file symbol
//! table, the schema pipeline lowers types into definitions with correct
//! `$ref` chains, and the composer folds partial overrides over base
//! response shapes.

/// Shared error types.
pub mod error;

/// Generator configuration.
pub mod config;

/// Host-language parsing.
pub mod parser;

/// Tag decoding.
pub mod tags;

/// Type-expression classification.
pub mod type_mapping;

/// Cross-file symbol table.
pub mod registry;

/// Emitted document model.
pub mod spec;

/// Schema building, composition, and sweeping.
pub mod schema;

/// Operation annotation parsing.
pub mod operation;

/// Document-level metadata parsing.
pub mod general;

/// Run orchestration.
pub mod generator;

pub use config::{Config, DependencyMode, PropertyStrategy};
pub use error::{AppError, AppResult};
pub use generator::Generator;
pub use registry::{DependencyLoader, Registry, RegistryOptions};
pub use schema::SchemaBuilder;
pub use spec::{Schema, Spec};
