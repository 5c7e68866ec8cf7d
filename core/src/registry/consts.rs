//! # Constant Evaluation
//!
//! Lazy, memoized evaluation of constant expressions, `iota` included.
//! Identifiers resolve through the constant table, selectors through the
//! owning file's imports. A per-call visited set breaks cycles.

use crate::parser::ast::ConstExpr;
use crate::registry::{ConstVar, Registry};
use serde_json::Value as JsonValue;
use std::collections::HashSet;
use tracing::debug;

/// A fully evaluated constant.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    /// Integer constants, including rune values.
    Int(i64),
    /// Floating point constants.
    Float(f64),
    /// String constants.
    Str(String),
    /// Boolean constants.
    Bool(bool),
}

impl ConstValue {
    /// Converts to a JSON value for schema emission.
    pub fn to_json(&self) -> JsonValue {
        match self {
            ConstValue::Int(n) => JsonValue::from(*n),
            ConstValue::Float(n) => serde_json::Number::from_f64(*n)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            ConstValue::Str(s) => JsonValue::String(s.clone()),
            ConstValue::Bool(b) => JsonValue::Bool(*b),
        }
    }

    fn as_float(&self) -> Option<f64> {
        match self {
            ConstValue::Int(n) => Some(*n as f64),
            ConstValue::Float(n) => Some(*n),
            _ => None,
        }
    }
}

impl Registry {
    /// Evaluates a package constant by name. Values are computed on first
    /// use and memoized; a cycle evaluates to `None`.
    pub fn const_value(&self, pkg_path: &str, name: &str) -> Option<ConstValue> {
        let mut visiting = HashSet::new();
        self.eval_const(pkg_path, name, &mut visiting)
    }

    pub(crate) fn eval_const(
        &self,
        pkg_path: &str,
        name: &str,
        visiting: &mut HashSet<(String, String)>,
    ) -> Option<ConstValue> {
        let key = (pkg_path.to_string(), name.to_string());
        if let Some(memoized) = self.const_memo.borrow().get(&key) {
            return memoized.clone();
        }
        if !visiting.insert(key.clone()) {
            debug!("constant cycle at {}.{}", pkg_path, name);
            return None;
        }

        let package = self.package(pkg_path)?;
        let var = package.consts.get(name)?;
        let value = var
            .expr
            .as_ref()
            .and_then(|expr| self.eval_expr(expr, var, pkg_path, visiting));

        self.const_memo.borrow_mut().insert(key, value.clone());
        value
    }

    fn eval_expr(
        &self,
        expr: &ConstExpr,
        ctx: &ConstVar,
        pkg_path: &str,
        visiting: &mut HashSet<(String, String)>,
    ) -> Option<ConstValue> {
        match expr {
            ConstExpr::Int(n) => Some(ConstValue::Int(*n)),
            ConstExpr::Float(n) => Some(ConstValue::Float(*n)),
            ConstExpr::Str(s) => Some(ConstValue::Str(s.clone())),
            ConstExpr::Rune(n) => Some(ConstValue::Int(*n)),
            ConstExpr::Paren(inner) => self.eval_expr(inner, ctx, pkg_path, visiting),
            ConstExpr::Ident(name) => match name.as_str() {
                "iota" => Some(ConstValue::Int(ctx.iota)),
                "true" => Some(ConstValue::Bool(true)),
                "false" => Some(ConstValue::Bool(false)),
                other => self.eval_const(pkg_path, other, visiting),
            },
            ConstExpr::Selector { pkg, name } => {
                let file = self.file(ctx.file_id);
                for candidate in self.candidate_packages(file, pkg) {
                    if let Some(value) = self.eval_const(&candidate, name, visiting) {
                        return Some(value);
                    }
                }
                debug!("unresolved constant selector {}.{}", pkg, name);
                None
            }
            ConstExpr::Unary { op, expr } => {
                let value = self.eval_expr(expr, ctx, pkg_path, visiting)?;
                eval_unary(op, value)
            }
            ConstExpr::Binary { op, lhs, rhs } => {
                let lhs = self.eval_expr(lhs, ctx, pkg_path, visiting)?;
                let rhs = self.eval_expr(rhs, ctx, pkg_path, visiting)?;
                eval_binary(op, lhs, rhs)
            }
            ConstExpr::Call { func, arg } => {
                let value = self.eval_expr(arg, ctx, pkg_path, visiting)?;
                Some(apply_conversion(func, value))
            }
        }
    }
}

fn eval_unary(op: &str, value: ConstValue) -> Option<ConstValue> {
    match (op, value) {
        ("-", ConstValue::Int(n)) => Some(ConstValue::Int(-n)),
        ("-", ConstValue::Float(n)) => Some(ConstValue::Float(-n)),
        ("+", value) => Some(value),
        ("^", ConstValue::Int(n)) => Some(ConstValue::Int(!n)),
        ("!", ConstValue::Bool(b)) => Some(ConstValue::Bool(!b)),
        _ => None,
    }
}

fn eval_binary(op: &str, lhs: ConstValue, rhs: ConstValue) -> Option<ConstValue> {
    use ConstValue::{Bool, Float, Int, Str};

    // Integer arithmetic stays integral; mixing with a float promotes.
    if let (Int(a), Int(b)) = (&lhs, &rhs) {
        let (a, b) = (*a, *b);
        return match op {
            "+" => Some(Int(a.wrapping_add(b))),
            "-" => Some(Int(a.wrapping_sub(b))),
            "*" => Some(Int(a.wrapping_mul(b))),
            "/" => (b != 0).then(|| Int(a / b)),
            "%" => (b != 0).then(|| Int(a % b)),
            "<<" => Some(Int(a.wrapping_shl(b as u32))),
            ">>" => Some(Int(a.wrapping_shr(b as u32))),
            "&" => Some(Int(a & b)),
            "|" => Some(Int(a | b)),
            "^" => Some(Int(a ^ b)),
            "&^" => Some(Int(a & !b)),
            "==" => Some(Bool(a == b)),
            "!=" => Some(Bool(a != b)),
            "<" => Some(Bool(a < b)),
            "<=" => Some(Bool(a <= b)),
            ">" => Some(Bool(a > b)),
            ">=" => Some(Bool(a >= b)),
            _ => None,
        };
    }

    if let (Str(a), Str(b)) = (&lhs, &rhs) {
        return match op {
            "+" => Some(Str(format!("{}{}", a, b))),
            "==" => Some(Bool(a == b)),
            "!=" => Some(Bool(a != b)),
            _ => None,
        };
    }

    if let (Bool(a), Bool(b)) = (&lhs, &rhs) {
        return match op {
            "&&" => Some(Bool(*a && *b)),
            "||" => Some(Bool(*a || *b)),
            "==" => Some(Bool(a == b)),
            "!=" => Some(Bool(a != b)),
            _ => None,
        };
    }

    let (a, b) = (lhs.as_float()?, rhs.as_float()?);
    match op {
        "+" => Some(Float(a + b)),
        "-" => Some(Float(a - b)),
        "*" => Some(Float(a * b)),
        "/" => (b != 0.0).then(|| Float(a / b)),
        "==" => Some(Bool(a == b)),
        "!=" => Some(Bool(a != b)),
        "<" => Some(Bool(a < b)),
        "<=" => Some(Bool(a <= b)),
        ">" => Some(Bool(a > b)),
        ">=" => Some(Bool(a >= b)),
        _ => None,
    }
}

/// Applies a conversion call. The numeric family of the target decides the
/// representation; user-defined targets (`Role(1)`) keep the value as-is.
fn apply_conversion(func: &ConstExpr, value: ConstValue) -> ConstValue {
    let target = match func {
        ConstExpr::Ident(name) => name.as_str(),
        ConstExpr::Selector { name, .. } => name.as_str(),
        _ => return value,
    };
    match target {
        "int" | "int8" | "int16" | "int32" | "int64" | "uint" | "uint8" | "uint16"
        | "uint32" | "uint64" | "byte" | "rune" => match value {
            ConstValue::Float(n) => ConstValue::Int(n as i64),
            other => other,
        },
        "float32" | "float64" => match value {
            ConstValue::Int(n) => ConstValue::Float(n as f64),
            other => other,
        },
        "string" => match value {
            ConstValue::Int(n) => ConstValue::Str(
                char::from_u32(n as u32).map(String::from).unwrap_or_default(),
            ),
            other => other,
        },
        _ => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use pretty_assertions::assert_eq;

    fn registry_with(source: &str) -> Registry {
        let mut registry = Registry::new(Default::default());
        registry
            .collect_file("example.com/role", "role/role.go", source, false)
            .unwrap();
        registry.materialize();
        registry
    }

    #[test]
    fn test_iota_sequence() {
        let registry = registry_with(
            r#"
package role

type Role int

const (
	RoleAdmin Role = iota + 1
	RoleUser
	RoleGuest
)
"#,
        );
        assert_eq!(
            registry.const_value("example.com/role", "RoleAdmin"),
            Some(ConstValue::Int(1))
        );
        assert_eq!(
            registry.const_value("example.com/role", "RoleUser"),
            Some(ConstValue::Int(2))
        );
        assert_eq!(
            registry.const_value("example.com/role", "RoleGuest"),
            Some(ConstValue::Int(3))
        );
    }

    #[test]
    fn test_bit_shift_iota() {
        let registry = registry_with(
            r#"
package role

const (
	FlagRead = 1 << iota
	FlagWrite
	FlagAdmin
)
"#,
        );
        assert_eq!(
            registry.const_value("example.com/role", "FlagRead"),
            Some(ConstValue::Int(1))
        );
        assert_eq!(
            registry.const_value("example.com/role", "FlagWrite"),
            Some(ConstValue::Int(2))
        );
        assert_eq!(
            registry.const_value("example.com/role", "FlagAdmin"),
            Some(ConstValue::Int(4))
        );
    }

    #[test]
    fn test_identifier_reference_and_strings() {
        let registry = registry_with(
            r#"
package role

const Base = "role"
const Admin = Base + ":admin"
"#,
        );
        assert_eq!(
            registry.const_value("example.com/role", "Admin"),
            Some(ConstValue::Str("role:admin".into()))
        );
    }

    #[test]
    fn test_conversion_keeps_value() {
        let registry = registry_with(
            r#"
package role

type Role int

const Admin = Role(7)
"#,
        );
        assert_eq!(
            registry.const_value("example.com/role", "Admin"),
            Some(ConstValue::Int(7))
        );
    }

    #[test]
    fn test_cycle_is_broken() {
        let registry = registry_with(
            r#"
package role

const A = B
const B = A
"#,
        );
        assert_eq!(registry.const_value("example.com/role", "A"), None);
        // The memo records the failure; later lookups stay None.
        assert_eq!(registry.const_value("example.com/role", "A"), None);
    }

    #[test]
    fn test_unknown_is_none() {
        let registry = registry_with("package role\n");
        assert_eq!(registry.const_value("example.com/role", "Missing"), None);
    }
}
