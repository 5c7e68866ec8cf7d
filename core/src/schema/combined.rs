//! # Combined-Type Parser
//!
//! Parses `Base{field=T,field=[]T,field=map[K]V}` response forms into a
//! base reference plus per-field override tokens. Splitting respects
//! bracket depth so nested forms stay intact.

use crate::error::{AppError, AppResult};

/// A parsed combined type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombinedType {
    /// The base type token.
    pub base: String,
    /// `(field, type token)` overrides in source order.
    pub overrides: Vec<(String, String)>,
}

/// Whether a type token carries a combined-form override block.
pub fn is_combined(token: &str) -> bool {
    find_top_level_brace(token).is_some()
}

/// Parses a combined type token.
///
/// `Base` alone (no braces) parses as a combined type with no overrides.
/// Unbalanced braces and malformed overrides are parse errors.
pub fn parse_combined_type(token: &str) -> AppResult<CombinedType> {
    let Some(open) = find_top_level_brace(token) else {
        return Ok(CombinedType {
            base: token.trim().to_string(),
            overrides: Vec::new(),
        });
    };

    let base = token[..open].trim().to_string();
    if base.is_empty() {
        return Err(AppError::Parse(format!(
            "combined type '{}' has no base type",
            token
        )));
    }
    if !token.ends_with('}') {
        return Err(AppError::Parse(format!(
            "combined type '{}' is missing its closing brace",
            token
        )));
    }

    let inner = &token[open + 1..token.len() - 1];
    if !braces_balance(inner) {
        return Err(AppError::Parse(format!(
            "combined type '{}' has unbalanced braces",
            token
        )));
    }

    let mut overrides = Vec::new();
    for part in split_top_level(inner, ',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let Some(eq) = find_top_level(part, '=') else {
            return Err(AppError::Parse(format!(
                "combined type override '{}' is missing '='",
                part
            )));
        };
        let field = part[..eq].trim();
        let value = part[eq + 1..].trim();
        if field.is_empty() || value.is_empty() {
            return Err(AppError::Parse(format!(
                "combined type override '{}' is malformed",
                part
            )));
        }
        overrides.push((field.to_string(), value.to_string()));
    }

    Ok(CombinedType { base, overrides })
}

/// Finds the first `{` at zero bracket depth.
fn find_top_level_brace(token: &str) -> Option<usize> {
    let mut depth = 0i32;
    for (idx, c) in token.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth -= 1,
            '{' if depth == 0 => return Some(idx),
            _ => {}
        }
    }
    None
}

/// Finds the first occurrence of `needle` at zero depth for both bracket
/// kinds.
fn find_top_level(token: &str, needle: char) -> Option<usize> {
    let mut depth = 0i32;
    for (idx, c) in token.char_indices() {
        match c {
            '[' | '{' => depth += 1,
            ']' | '}' => depth -= 1,
            c if c == needle && depth == 0 => return Some(idx),
            _ => {}
        }
    }
    None
}

/// Splits on `sep` at zero depth for both bracket kinds.
fn split_top_level(token: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0usize;
    for (idx, c) in token.char_indices() {
        match c {
            '[' | '{' => depth += 1,
            ']' | '}' => depth -= 1,
            c if c == sep && depth == 0 => {
                parts.push(&token[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(&token[start..]);
    parts
}

fn braces_balance(token: &str) -> bool {
    let mut depth = 0i32;
    for c in token.chars() {
        match c {
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}
