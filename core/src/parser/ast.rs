//! # Source AST
//!
//! Definition of the declaration-level syntax tree the registry consumes.
//! Function bodies are not represented beyond their local type
//! declarations; expression statements never reach the schema pipeline.

/// A parsed source file.
#[derive(Debug, Clone, PartialEq)]
pub struct File {
    /// Path the file was registered under.
    pub path: String,
    /// Short package name from the package clause.
    pub package: String,
    /// Doc comment block attached to the package clause.
    pub package_doc: Vec<String>,
    /// Import records in declaration order.
    pub imports: Vec<ImportSpec>,
    /// Top-level declarations in source order.
    pub decls: Vec<Decl>,
}

impl File {
    /// Iterates all type declarations, top-level and function-local.
    pub fn type_specs(&self) -> impl Iterator<Item = (&TypeSpec, Option<&str>)> {
        self.decls.iter().flat_map(|decl| match decl {
            Decl::Type(specs) => specs
                .iter()
                .map(|s| (s, None))
                .collect::<Vec<_>>()
                .into_iter(),
            Decl::Func(func) => func
                .local_types
                .iter()
                .map(|s| (s, Some(func.name.as_str())))
                .collect::<Vec<_>>()
                .into_iter(),
            Decl::Const(_) => Vec::new().into_iter(),
        })
    }

    /// Iterates all const blocks.
    pub fn const_blocks(&self) -> impl Iterator<Item = &ConstBlock> {
        self.decls.iter().filter_map(|decl| match decl {
            Decl::Const(block) => Some(block),
            _ => None,
        })
    }

    /// Iterates all function declarations.
    pub fn funcs(&self) -> impl Iterator<Item = &FuncDecl> {
        self.decls.iter().filter_map(|decl| match decl {
            Decl::Func(func) => Some(func),
            _ => None,
        })
    }
}

/// One import record: `{alias?, path}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpec {
    /// Explicit alias. `_` (blank) and `.` (dot) imports keep their marker
    /// here; `None` means the package is referred to by its default name.
    pub alias: Option<String>,
    /// Import path without quotes.
    pub path: String,
}

impl ImportSpec {
    /// The last path segment, used as the default package name.
    pub fn default_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// The name this import binds in the file, if it binds one.
    ///
    /// Blank imports bind nothing; dot imports merge into the file scope
    /// and are matched separately.
    pub fn bound_name(&self) -> Option<&str> {
        match self.alias.as_deref() {
            Some("_") | Some(".") => None,
            Some(alias) => Some(alias),
            None => Some(self.default_name()),
        }
    }

    /// Whether this is a dot import.
    pub fn is_dot(&self) -> bool {
        self.alias.as_deref() == Some(".")
    }
}

/// A top-level declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    /// A `type` declaration (possibly a grouped block).
    Type(Vec<TypeSpec>),
    /// A `const` declaration block.
    Const(ConstBlock),
    /// A function declaration, reduced to its doc block and local types.
    Func(FuncDecl),
}

/// One type specification.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeSpec {
    /// Doc comment lines, comment markers stripped.
    pub doc: Vec<String>,
    /// Declared name.
    pub name: String,
    /// Generic type parameter names; constraints are discarded.
    pub type_params: Vec<String>,
    /// The declared body.
    pub body: TypeBody,
    /// 1-based line of the declaration.
    pub line: u32,
}

/// The body of a type specification.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeBody {
    /// `struct { ... }`
    Struct(StructBody),
    /// `interface { ... }`; members are irrelevant to schemas.
    Interface,
    /// `type X Y` or `type X = Y` for any other `Y`.
    Alias(TypeExpr),
}

/// The field list of a struct.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StructBody {
    /// Fields in declaration order.
    pub fields: Vec<Field>,
}

/// One field declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Doc comment lines above the field.
    pub doc: Vec<String>,
    /// Trailing same-line comment, if any.
    pub comment: Option<String>,
    /// Declared names. Empty for an embedded field.
    pub names: Vec<String>,
    /// The field type.
    pub type_expr: TypeExpr,
    /// Raw tag string with backticks/quotes removed.
    pub tag: Option<String>,
}

impl Field {
    /// Whether this is an embedded (promoted) field.
    pub fn is_embedded(&self) -> bool {
        self.names.is_empty()
    }
}

/// A type expression.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    /// A bare identifier: `string`, `Account`.
    Ident(String),
    /// A package-qualified selector: `pkg.Name`.
    Selector {
        /// Package qualifier.
        pkg: String,
        /// Selected name.
        name: String,
    },
    /// `*T`. The prefix is stripped before classification.
    Pointer(Box<TypeExpr>),
    /// `[]T` or `[N]T`; the length is irrelevant to schemas.
    Array(Box<TypeExpr>),
    /// `map[K]V`.
    Map {
        /// Key type.
        key: Box<TypeExpr>,
        /// Value type.
        value: Box<TypeExpr>,
    },
    /// `interface{}` / `any`: any JSON value.
    Interface,
    /// An inline `struct { ... }` literal type.
    Struct(StructBody),
    /// A generic instantiation: `Wrapper[T]`, `types.Field[string]`.
    Generic {
        /// The wrapper being instantiated.
        base: Box<TypeExpr>,
        /// Type arguments in order.
        args: Vec<TypeExpr>,
    },
    /// Function, channel, and other types with no schema meaning.
    Unsupported,
}

impl TypeExpr {
    /// Strips pointer prefixes recursively.
    pub fn deref(&self) -> &TypeExpr {
        match self {
            TypeExpr::Pointer(inner) => inner.deref(),
            other => other,
        }
    }

    /// Renders the expression back to a canonical source form.
    pub fn to_token(&self) -> String {
        match self {
            TypeExpr::Ident(name) => name.clone(),
            TypeExpr::Selector { pkg, name } => format!("{}.{}", pkg, name),
            TypeExpr::Pointer(inner) => format!("*{}", inner.to_token()),
            TypeExpr::Array(elem) => format!("[]{}", elem.to_token()),
            TypeExpr::Map { key, value } => {
                format!("map[{}]{}", key.to_token(), value.to_token())
            }
            TypeExpr::Interface => "interface{}".to_string(),
            TypeExpr::Struct(_) => "struct{}".to_string(),
            TypeExpr::Generic { base, args } => {
                let args: Vec<String> = args.iter().map(|a| a.to_token()).collect();
                format!("{}[{}]", base.to_token(), args.join(","))
            }
            TypeExpr::Unsupported => "func()".to_string(),
        }
    }
}

/// A grouped const declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstBlock {
    /// Specs in declaration order.
    pub specs: Vec<ConstSpec>,
}

/// One const specification line.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstSpec {
    /// Doc comment lines.
    pub doc: Vec<String>,
    /// Trailing same-line comment.
    pub comment: Option<String>,
    /// Declared names.
    pub names: Vec<String>,
    /// Declared type, when present.
    pub type_expr: Option<TypeExpr>,
    /// Value expressions, one per name. Empty means the spec inherits the
    /// previous line's expressions with the advanced `iota`.
    pub values: Vec<ConstExpr>,
    /// Index of this spec within its block, the `iota` value.
    pub iota: i64,
}

/// A constant expression.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstExpr {
    /// An identifier, including `iota`.
    Ident(String),
    /// A cross-package constant: `pkg.Name`.
    Selector {
        /// Package qualifier.
        pkg: String,
        /// Selected name.
        name: String,
    },
    /// An integer literal.
    Int(i64),
    /// A float literal.
    Float(f64),
    /// A string literal (decoded).
    Str(String),
    /// A rune literal, stored as its scalar value.
    Rune(i64),
    /// A unary operation.
    Unary {
        /// Operator text: `-`, `+`, `^`.
        op: String,
        /// Operand.
        expr: Box<ConstExpr>,
    },
    /// A binary operation.
    Binary {
        /// Operator text.
        op: String,
        /// Left operand.
        lhs: Box<ConstExpr>,
        /// Right operand.
        rhs: Box<ConstExpr>,
    },
    /// A parenthesized expression.
    Paren(Box<ConstExpr>),
    /// A conversion or call with a single argument: `Role(1)`.
    Call {
        /// The callee; conversions carry the target type here.
        func: Box<ConstExpr>,
        /// The single argument. Calls with other arities are not constant
        /// expressions the evaluator supports.
        arg: Box<ConstExpr>,
    },
}

/// A function declaration, reduced to what the generator consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct FuncDecl {
    /// Doc comment lines; operation annotations live here.
    pub doc: Vec<String>,
    /// Function name.
    pub name: String,
    /// Type declarations found in the function body.
    pub local_types: Vec<TypeSpec>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_names() {
        let plain = ImportSpec {
            alias: None,
            path: "github.com/org/repo/account".into(),
        };
        assert_eq!(plain.bound_name(), Some("account"));

        let aliased = ImportSpec {
            alias: Some("acc".into()),
            path: "github.com/org/repo/account".into(),
        };
        assert_eq!(aliased.bound_name(), Some("acc"));

        let blank = ImportSpec {
            alias: Some("_".into()),
            path: "embed".into(),
        };
        assert_eq!(blank.bound_name(), None);

        let dot = ImportSpec {
            alias: Some(".".into()),
            path: "math".into(),
        };
        assert_eq!(dot.bound_name(), None);
        assert!(dot.is_dot());
    }

    #[test]
    fn test_type_expr_roundtrip() {
        let expr = TypeExpr::Map {
            key: Box::new(TypeExpr::Ident("string".into())),
            value: Box::new(TypeExpr::Array(Box::new(TypeExpr::Selector {
                pkg: "account".into(),
                name: "Account".into(),
            }))),
        };
        assert_eq!(expr.to_token(), "map[string][]account.Account");
    }

    #[test]
    fn test_pointer_deref() {
        let expr = TypeExpr::Pointer(Box::new(TypeExpr::Pointer(Box::new(
            TypeExpr::Ident("User".into()),
        ))));
        assert_eq!(expr.deref(), &TypeExpr::Ident("User".into()));
    }
}
