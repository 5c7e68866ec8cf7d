#![deny(missing_docs)]

//! # Parser Module
//!
//! Handles parsing of host-language source into the declaration AST the
//! registry consumes. The tokenizer and parser are hand-written; only
//! declarations are materialized, function bodies are skipped apart from
//! their local type declarations.

pub mod ast;
pub mod decls;
pub mod lexer;
pub mod token;

// Re-export the entry point and the types the rest of the crate touches.
pub use ast::{
    ConstBlock, ConstExpr, ConstSpec, Decl, Field, File, FuncDecl, ImportSpec,
    StructBody, TypeBody, TypeExpr, TypeSpec,
};
pub use decls::{parse_file, parse_type_expr_str};
