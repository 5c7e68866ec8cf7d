#![deny(missing_docs)]

//! # Registry
//!
//! Cross-file symbol table: packages, type declarations, and constant
//! groups. Files are collected first; a second phase materializes
//! declarations, maintaining a uniqueness map that disambiguates type
//! names shared across packages.

pub mod consts;

pub use consts::ConstValue;

use crate::config::{DependencyMode, PrimitiveEntry};
use crate::error::AppResult;
use crate::parser::ast::{ConstExpr, File, TypeBody, TypeExpr, TypeSpec};
use crate::parser::parse_file;
use crate::type_mapping::{is_primitive_name, primitive_entry};
use indexmap::IndexMap;
use std::cell::RefCell;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Index of a registered file.
pub type FileId = usize;

/// Index of a registered type declaration.
pub type DeclId = usize;

/// Loads source files of a package that lives outside the parsed tree.
///
/// Implementations must release any handles they acquire before returning.
pub trait DependencyLoader {
    /// Returns `(file_path, source)` pairs for the package at `import_path`.
    fn load(&self, import_path: &str) -> AppResult<Vec<(String, String)>>;
}

/// Registry construction options.
#[derive(Default)]
pub struct RegistryOptions {
    /// Gates external-package loading during lookup.
    pub dependency_mode: DependencyMode,
    /// Loader used when `dependency_mode` allows it.
    pub loader: Option<Box<dyn DependencyLoader>>,
}

/// One registered file.
pub struct FileEntry {
    /// The parsed file.
    pub file: File,
    /// Package path the file was registered under.
    pub pkg_path: String,
    /// Vendor/stdlib files are registered for symbol lookup but excluded
    /// from the operation-parsing walk.
    pub vendored: bool,
}

/// A registered type declaration.
#[derive(Debug, Clone)]
pub struct TypeDecl {
    /// Package path of the declaring package.
    pub pkg_path: String,
    /// File the declaration appears in.
    pub file_id: FileId,
    /// Lookup name; function-scoped types carry their parent-function
    /// qualifier (`Fn.Name`).
    pub name: String,
    /// The declaration body.
    pub spec: TypeSpec,
    /// Definition name; equals `name` while globally unique, else carries
    /// the package prefix.
    pub schema_name: String,
    /// Cleared when another package declares the same name.
    pub is_unique: bool,
    /// Parent function for body-local declarations.
    pub parent_fn: Option<String>,
    /// `@name` doc override.
    pub name_override: Option<String>,
    /// `@NoPublic` doc marker: suppresses the public companion schema.
    pub no_public: bool,
    /// Pre-built primitive cell for struct-free primitive aliases.
    pub primitive: Option<PrimitiveEntry>,
}

impl TypeDecl {
    /// Whether the declaration is a struct.
    pub fn is_struct(&self) -> bool {
        matches!(self.spec.body, TypeBody::Struct(_))
    }
}

/// One constant in a package's table.
#[derive(Debug, Clone)]
pub struct ConstVar {
    /// Constant name.
    pub name: String,
    /// File the constant is declared in.
    pub file_id: FileId,
    /// Declared (or inherited) type token, when present.
    pub type_name: Option<String>,
    /// Value expression; inherited from the previous spec when the source
    /// omitted it. `None` only for malformed input.
    pub expr: Option<ConstExpr>,
    /// The `iota` value for this spec.
    pub iota: i64,
    /// Trailing comment or first doc line.
    pub comment: Option<String>,
}

/// A package and its symbol tables.
pub struct Package {
    /// Package path.
    pub path: String,
    /// Short name from the package clause.
    pub short_name: String,
    /// Files registered under this package.
    pub files: Vec<FileId>,
    /// Type declarations by lookup name.
    pub types: HashMap<String, DeclId>,
    /// Constant table by name.
    pub consts: HashMap<String, ConstVar>,
    /// Constant names in declaration order.
    pub ordered_consts: Vec<String>,
}

/// Result of a type lookup: the declaration plus any generic arguments
/// carried by the queried name. Substitution is performed lazily by the
/// schema pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedType {
    /// The resolved declaration.
    pub decl: DeclId,
    /// Generic argument tokens, in order.
    pub type_args: Vec<String>,
}

/// The cross-file symbol table.
pub struct Registry {
    options: RegistryOptions,
    files: Vec<FileEntry>,
    file_index: HashMap<(String, String), FileId>,
    packages: IndexMap<String, Package>,
    decls: Vec<TypeDecl>,
    unique_map: HashMap<String, Option<DeclId>>,
    materialized: usize,
    pub(crate) const_memo: RefCell<HashMap<(String, String), Option<ConstValue>>>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new(options: RegistryOptions) -> Self {
        Self {
            options,
            files: Vec::new(),
            file_index: HashMap::new(),
            packages: IndexMap::new(),
            decls: Vec::new(),
            unique_map: HashMap::new(),
            materialized: 0,
            const_memo: RefCell::new(HashMap::new()),
        }
    }

    // ------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------

    /// Parses and stores a file under `pkg_path`. Registering the same
    /// `(pkg_path, path)` twice is a no-op.
    pub fn collect_file(
        &mut self,
        pkg_path: &str,
        path: &str,
        source: &str,
        vendored: bool,
    ) -> AppResult<FileId> {
        let key = (pkg_path.to_string(), path.to_string());
        if let Some(existing) = self.file_index.get(&key) {
            return Ok(*existing);
        }
        let file = parse_file(path, source)?;
        Ok(self.add_parsed_file(pkg_path, file, vendored))
    }

    /// Stores an already parsed file. Duplicate `(pkg_path, path)` is a
    /// no-op.
    pub fn add_parsed_file(&mut self, pkg_path: &str, file: File, vendored: bool) -> FileId {
        let key = (pkg_path.to_string(), file.path.clone());
        if let Some(existing) = self.file_index.get(&key) {
            return *existing;
        }
        let id = self.files.len();
        self.files.push(FileEntry {
            file,
            pkg_path: pkg_path.to_string(),
            vendored,
        });
        self.file_index.insert(key, id);
        id
    }

    // ------------------------------------------------------------------
    // Materialization
    // ------------------------------------------------------------------

    /// Materializes type declarations and constant tables for every file
    /// registered since the previous call.
    pub fn materialize(&mut self) {
        while self.materialized < self.files.len() {
            let file_id = self.materialized;
            self.materialized += 1;
            self.materialize_file(file_id);
        }
    }

    fn materialize_file(&mut self, file_id: FileId) {
        let (pkg_path, short_name) = {
            let entry = &self.files[file_id];
            (entry.pkg_path.clone(), entry.file.package.clone())
        };

        let package = self
            .packages
            .entry(pkg_path.clone())
            .or_insert_with(|| Package {
                path: pkg_path.clone(),
                short_name: short_name.clone(),
                files: Vec::new(),
                types: HashMap::new(),
                consts: HashMap::new(),
                ordered_consts: Vec::new(),
            });
        package.files.push(file_id);

        let specs: Vec<(TypeSpec, Option<String>)> = self.files[file_id]
            .file
            .type_specs()
            .map(|(spec, parent)| (spec.clone(), parent.map(str::to_string)))
            .collect();
        for (spec, parent_fn) in specs {
            self.register_type_spec(file_id, &pkg_path, &short_name, spec, parent_fn);
        }

        let blocks: Vec<crate::parser::ast::ConstBlock> = self.files[file_id]
            .file
            .const_blocks()
            .cloned()
            .collect();
        for block in blocks {
            self.register_const_block(file_id, &pkg_path, block);
        }
    }

    fn register_type_spec(
        &mut self,
        file_id: FileId,
        pkg_path: &str,
        short_name: &str,
        spec: TypeSpec,
        parent_fn: Option<String>,
    ) {
        let key = match &parent_fn {
            Some(parent) => format!("{}.{}", parent, spec.name),
            None => spec.name.clone(),
        };

        let name_override = doc_marker_value(&spec.doc, "@name");
        let no_public = doc_has_marker(&spec.doc, "@NoPublic");
        let primitive = match &spec.body {
            TypeBody::Alias(TypeExpr::Ident(name)) => primitive_entry(name),
            _ => None,
        };

        let id = self.decls.len();
        let mut decl = TypeDecl {
            pkg_path: pkg_path.to_string(),
            file_id,
            name: key.clone(),
            spec,
            schema_name: key.clone(),
            is_unique: true,
            parent_fn,
            name_override,
            no_public,
            primitive,
        };

        if let Some(package) = self.packages.get_mut(pkg_path) {
            if package.types.insert(key.clone(), id).is_some() {
                warn!("duplicate declaration of {} in {}", key, pkg_path);
            }
        }

        match self.unique_map.get(&key).copied() {
            None => {
                self.unique_map.insert(key, Some(id));
            }
            Some(Some(prev_id)) if self.decls[prev_id].pkg_path == pkg_path => {
                // Same-package duplicate: last wins, already warned above.
                self.unique_map.insert(key, Some(id));
            }
            Some(Some(prev_id)) => {
                let prev_short = self
                    .packages
                    .get(&self.decls[prev_id].pkg_path)
                    .map(|p| p.short_name.clone())
                    .unwrap_or_default();
                let prev = &mut self.decls[prev_id];
                prev.is_unique = false;
                prev.schema_name = format!("{}.{}", prev_short, key);
                let prev_schema_name = prev.schema_name.clone();

                decl.is_unique = false;
                decl.schema_name = format!("{}.{}", short_name, key);

                self.unique_map.insert(key, None);
                self.unique_map.insert(prev_schema_name, Some(prev_id));
                self.unique_map.insert(decl.schema_name.clone(), Some(id));
            }
            Some(None) => {
                decl.is_unique = false;
                decl.schema_name = format!("{}.{}", short_name, key);
                self.unique_map.insert(decl.schema_name.clone(), Some(id));
            }
        }

        self.decls.push(decl);
    }

    fn register_const_block(
        &mut self,
        file_id: FileId,
        pkg_path: &str,
        block: crate::parser::ast::ConstBlock,
    ) {
        let Some(package) = self.packages.get_mut(pkg_path) else {
            return;
        };

        let mut last_type: Option<String> = None;
        let mut last_values: Vec<ConstExpr> = Vec::new();

        for spec in block.specs {
            let (type_name, values) = if spec.values.is_empty() {
                // Omitted values inherit the previous spec's type and
                // expressions; `iota` advances.
                (last_type.clone(), last_values.clone())
            } else {
                let type_name = spec.type_expr.as_ref().map(type_token);
                last_type = type_name.clone();
                last_values = spec.values.clone();
                (type_name, spec.values.clone())
            };

            let comment = spec
                .comment
                .clone()
                .or_else(|| spec.doc.first().cloned());

            for (index, name) in spec.names.iter().enumerate() {
                if name == "_" {
                    continue;
                }
                let var = ConstVar {
                    name: name.clone(),
                    file_id,
                    type_name: type_name.clone(),
                    expr: values.get(index).cloned(),
                    iota: spec.iota,
                    comment: comment.clone(),
                };
                if package.consts.insert(name.clone(), var).is_none() {
                    package.ordered_consts.push(name.clone());
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// The parsed file for an id.
    pub fn file(&self, id: FileId) -> &File {
        &self.files[id].file
    }

    /// The registration entry for an id.
    pub fn file_entry(&self, id: FileId) -> &FileEntry {
        &self.files[id]
    }

    /// A declaration by id.
    pub fn decl(&self, id: DeclId) -> &TypeDecl {
        &self.decls[id]
    }

    /// A package by path.
    pub fn package(&self, path: &str) -> Option<&Package> {
        self.packages.get(path)
    }

    /// Number of registered declarations.
    pub fn decl_count(&self) -> usize {
        self.decls.len()
    }

    /// Files to walk for operations: vendor and stdlib files excluded,
    /// lexicographic path order for reproducible output.
    pub fn files_for_operations(&self) -> Vec<FileId> {
        let mut ids: Vec<FileId> = (0..self.files.len())
            .filter(|id| !self.files[*id].vendored)
            .collect();
        ids.sort_by(|a, b| self.files[*a].file.path.cmp(&self.files[*b].file.path));
        ids
    }

    /// Evaluated `(name, value)` pairs of the constants declared with the
    /// given type, in declaration order.
    pub fn enum_values(&self, pkg_path: &str, type_name: &str) -> Vec<(String, ConstValue)> {
        let Some(package) = self.package(pkg_path) else {
            return Vec::new();
        };
        let names: Vec<String> = package
            .ordered_consts
            .iter()
            .filter(|name| {
                package
                    .consts
                    .get(*name)
                    .and_then(|var| var.type_name.as_deref())
                    == Some(type_name)
            })
            .cloned()
            .collect();

        names
            .into_iter()
            .filter_map(|name| {
                self.const_value(pkg_path, &name)
                    .map(|value| (name, value))
            })
            .collect()
    }

    // ------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------

    /// Resolves a type name in the context of a file.
    ///
    /// Primitives resolve to nothing. Dotted names are matched through the
    /// file's imports (aliases included), loading external packages when
    /// the dependency mode allows. Bare names try the file's own package,
    /// then dot imports, then `@name` overrides.
    pub fn find_type(&mut self, name: &str, file_id: FileId) -> Option<ResolvedType> {
        if is_primitive_name(name) {
            return None;
        }

        let (base, type_args) = split_generic_name(name);

        let entry = &self.files[file_id];
        let own_path = entry.pkg_path.clone();

        // The own package is tried on the full key first so that
        // function-qualified names (`Fn.Name`) are not mistaken for
        // package selectors.
        if let Some(decl) = self
            .packages
            .get(&own_path)
            .and_then(|pkg| pkg.types.get(base).copied())
        {
            return Some(ResolvedType {
                decl,
                type_args,
            });
        }

        if let Some((pkg_token, type_name)) = base.rsplit_once('.') {
            return self.find_qualified(pkg_token, type_name, file_id, type_args);
        }

        let entry = &self.files[file_id];

        // Packages imported without name qualification.
        let dot_paths: Vec<String> = entry
            .file
            .imports
            .iter()
            .filter(|import| import.is_dot())
            .map(|import| import.path.clone())
            .collect();
        for path in dot_paths {
            if let Some(registered) = self.registered_path(&path) {
                if let Some(decl) = self
                    .packages
                    .get(&registered)
                    .and_then(|pkg| pkg.types.get(base).copied())
                {
                    return Some(ResolvedType {
                        decl,
                        type_args,
                    });
                }
            }
        }

        // `@name` overrides.
        for (id, decl) in self.decls.iter().enumerate() {
            if decl.name_override.as_deref() == Some(base) {
                return Some(ResolvedType {
                    decl: id,
                    type_args,
                });
            }
        }

        debug!("unresolved type '{}'", name);
        None
    }

    fn find_qualified(
        &mut self,
        pkg_token: &str,
        type_name: &str,
        file_id: FileId,
        type_args: Vec<String>,
    ) -> Option<ResolvedType> {
        let (own_pkg, own_path, imports) = {
            let entry = &self.files[file_id];
            (
                entry.file.package.clone(),
                entry.pkg_path.clone(),
                entry.file.imports.clone(),
            )
        };

        let mut candidates: Vec<String> = Vec::new();
        if pkg_token == own_pkg {
            candidates.push(own_path);
        }
        for import in &imports {
            if import.bound_name() == Some(pkg_token) || import.path == pkg_token {
                if let Some(registered) = self.registered_path(&import.path) {
                    candidates.push(registered);
                }
            }
        }
        if candidates.is_empty() {
            // Fall back to the unique registered package with this short
            // name; files inside a tree routinely qualify siblings without
            // full-path imports being registered under identical keys.
            let matches: Vec<String> = self
                .packages
                .values()
                .filter(|pkg| pkg.short_name == pkg_token)
                .map(|pkg| pkg.path.clone())
                .collect();
            if matches.len() == 1 {
                candidates.extend(matches);
            }
        }

        if candidates.is_empty() && self.options.dependency_mode.allows_models() {
            let import_path = imports
                .iter()
                .find(|import| {
                    import.bound_name() == Some(pkg_token) || import.path == pkg_token
                })
                .map(|import| import.path.clone());
            if let Some(path) = import_path {
                if self.load_external(&path) {
                    if let Some(registered) = self.registered_path(&path) {
                        candidates.push(registered);
                    }
                }
            }
        }

        for candidate in candidates {
            if let Some(decl) = self
                .packages
                .get(&candidate)
                .and_then(|pkg| pkg.types.get(type_name).copied())
            {
                return Some(ResolvedType {
                    decl,
                    type_args,
                });
            }
        }

        debug!("unresolved type '{}.{}'", pkg_token, type_name);
        None
    }

    /// Maps an import path to a registered package path: exact match
    /// first, then the longest suffix overlap.
    fn registered_path(&self, import_path: &str) -> Option<String> {
        if self.packages.contains_key(import_path) {
            return Some(import_path.to_string());
        }
        let mut best: Option<(usize, String)> = None;
        for path in self.packages.keys() {
            let overlap = if import_path.ends_with(&format!("/{}", path)) || path == import_path {
                path.len()
            } else if path.ends_with(&format!("/{}", import_path)) {
                import_path.len()
            } else {
                continue;
            };
            if best.as_ref().is_none_or(|(len, _)| overlap > *len) {
                best = Some((overlap, path.clone()));
            }
        }
        best.map(|(_, path)| path)
    }

    /// Candidate registered package paths for a selector qualifier, based
    /// on a file's import records.
    pub(crate) fn candidate_packages(&self, file: &File, pkg_token: &str) -> Vec<String> {
        let mut out = Vec::new();
        for import in &file.imports {
            if import.bound_name() == Some(pkg_token) || import.path == pkg_token {
                if let Some(registered) = self.registered_path(&import.path) {
                    out.push(registered);
                }
            }
        }
        if out.is_empty() {
            let matches: Vec<String> = self
                .packages
                .values()
                .filter(|pkg| pkg.short_name == pkg_token)
                .map(|pkg| pkg.path.clone())
                .collect();
            if matches.len() == 1 {
                out.extend(matches);
            }
        }
        out
    }

    /// Loads an external package through the configured loader. Returns
    /// whether any file was registered.
    fn load_external(&mut self, import_path: &str) -> bool {
        let loaded = match &self.options.loader {
            Some(loader) => match loader.load(import_path) {
                Ok(files) => files,
                Err(err) => {
                    debug!("failed to load external package {}: {}", import_path, err);
                    return false;
                }
            },
            None => return false,
        };
        if loaded.is_empty() {
            return false;
        }
        for (path, source) in loaded {
            match self.collect_file(import_path, &path, &source, true) {
                Ok(_) => {}
                Err(err) => {
                    debug!("skipping unparsable external file {}: {}", path, err);
                }
            }
        }
        self.materialize();
        true
    }
}

/// Splits a generic instantiation token into its base name and argument
/// tokens, respecting bracket depth. Names without brackets come back
/// unchanged with no arguments.
pub fn split_generic_name(name: &str) -> (&str, Vec<String>) {
    let Some(open) = name.find('[') else {
        return (name, Vec::new());
    };
    if !name.ends_with(']') {
        return (name, Vec::new());
    }
    let base = &name[..open];
    let inner = &name[open + 1..name.len() - 1];

    let mut args = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    for c in inner.chars() {
        match c {
            '[' => {
                depth += 1;
                current.push(c);
            }
            ']' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if depth == 0 => {
                args.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        args.push(current.trim().to_string());
    }
    (base, args)
}

/// Forms the stable definition name of a generic instantiation by
/// replacing `.` with `_` inside the bracketed parameters.
pub fn normalize_generic_schema_name(name: &str) -> String {
    let Some(open) = name.find('[') else {
        return name.to_string();
    };
    let (base, params) = name.split_at(open);
    format!("{}{}", base, params.replace('.', "_"))
}

fn type_token(expr: &TypeExpr) -> String {
    expr.to_token()
}

fn doc_marker_value(doc: &[String], marker: &str) -> Option<String> {
    for line in doc {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix(marker) {
            let value = rest.trim();
            if !value.is_empty() && rest.starts_with(char::is_whitespace) {
                return Some(value.split_whitespace().next().unwrap_or("").to_string());
            }
        }
    }
    None
}

fn doc_has_marker(doc: &[String], marker: &str) -> bool {
    doc.iter().any(|line| {
        let line = line.trim();
        line == marker || line.starts_with(&format!("{} ", marker))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn registry() -> Registry {
        Registry::new(RegistryOptions::default())
    }

    #[test]
    fn test_collect_file_is_idempotent() {
        let source = "package account\n\ntype Account struct {\n\tID string `json:\"id\"`\n}\n";
        let mut reg = registry();
        reg.collect_file("example.com/account", "account/account.go", source, false)
            .unwrap();
        reg.materialize();
        let count = reg.decl_count();
        let unique = reg.decl(0).is_unique;

        reg.collect_file("example.com/account", "account/account.go", source, false)
            .unwrap();
        reg.materialize();
        assert_eq!(reg.decl_count(), count);
        assert_eq!(reg.decl(0).is_unique, unique);
    }

    #[test]
    fn test_unique_name_collision_disambiguates_both() {
        let mut reg = registry();
        reg.collect_file(
            "example.com/account",
            "account/model.go",
            "package account\n\ntype Model struct {\n\tID string `json:\"id\"`\n}\n",
            false,
        )
        .unwrap();
        reg.collect_file(
            "example.com/billing",
            "billing/model.go",
            "package billing\n\ntype Model struct {\n\tTotal int `json:\"total\"`\n}\n",
            false,
        )
        .unwrap();
        reg.materialize();

        assert_eq!(reg.decl(0).schema_name, "account.Model");
        assert!(!reg.decl(0).is_unique);
        assert_eq!(reg.decl(1).schema_name, "billing.Model");
        assert!(!reg.decl(1).is_unique);
    }

    #[test]
    fn test_unique_name_stays_plain() {
        let mut reg = registry();
        reg.collect_file(
            "example.com/account",
            "account/model.go",
            "package account\n\ntype Account struct {\n\tID string `json:\"id\"`\n}\n",
            false,
        )
        .unwrap();
        reg.materialize();
        assert_eq!(reg.decl(0).schema_name, "Account");
        assert!(reg.decl(0).is_unique);
    }

    #[test]
    fn test_find_type_in_own_package() {
        let mut reg = registry();
        let file_id = reg
            .collect_file(
                "example.com/account",
                "account/model.go",
                "package account\n\ntype Account struct {\n\tID string `json:\"id\"`\n}\n",
                false,
            )
            .unwrap();
        reg.materialize();

        let hit = reg.find_type("Account", file_id).unwrap();
        assert_eq!(reg.decl(hit.decl).name, "Account");
        // Own-package qualification resolves the same way.
        let hit = reg.find_type("account.Account", file_id).unwrap();
        assert_eq!(reg.decl(hit.decl).name, "Account");
        // Primitives resolve to nothing.
        assert!(reg.find_type("string", file_id).is_none());
    }

    #[test]
    fn test_find_type_through_aliased_import() {
        let mut reg = registry();
        reg.collect_file(
            "example.com/models/account",
            "models/account/account.go",
            "package account\n\ntype Account struct {\n\tID string `json:\"id\"`\n}\n",
            false,
        )
        .unwrap();
        let handlers = reg
            .collect_file(
                "example.com/handlers",
                "handlers/get.go",
                "package handlers\n\nimport acc \"example.com/models/account\"\n",
                false,
            )
            .unwrap();
        reg.materialize();

        let hit = reg.find_type("acc.Account", handlers).unwrap();
        assert_eq!(reg.decl(hit.decl).pkg_path, "example.com/models/account");
        // The default short name is not bound once an alias exists.
        assert!(reg.find_type("zzz.Account", handlers).is_none());
    }

    #[test]
    fn test_find_type_through_dot_import() {
        let mut reg = registry();
        reg.collect_file(
            "example.com/shared",
            "shared/types.go",
            "package shared\n\ntype Envelope struct {\n\tOK bool `json:\"ok\"`\n}\n",
            false,
        )
        .unwrap();
        let file_id = reg
            .collect_file(
                "example.com/api",
                "api/api.go",
                "package api\n\nimport . \"example.com/shared\"\n",
                false,
            )
            .unwrap();
        reg.materialize();

        let hit = reg.find_type("Envelope", file_id).unwrap();
        assert_eq!(reg.decl(hit.decl).pkg_path, "example.com/shared");
    }

    #[test]
    fn test_find_type_name_override() {
        let mut reg = registry();
        let file_id = reg
            .collect_file(
                "example.com/account",
                "account/model.go",
                "package account\n\n// Account model.\n// @name PublicAccount\ntype Account struct {\n\tID string `json:\"id\"`\n}\n",
                false,
            )
            .unwrap();
        reg.materialize();

        let hit = reg.find_type("PublicAccount", file_id).unwrap();
        assert_eq!(reg.decl(hit.decl).name, "Account");
        assert_eq!(
            reg.decl(hit.decl).name_override.as_deref(),
            Some("PublicAccount")
        );
    }

    #[test]
    fn test_find_type_generic_instantiation() {
        let mut reg = registry();
        let file_id = reg
            .collect_file(
                "example.com/response",
                "response/wrapper.go",
                "package response\n\ntype Wrapper[T any] struct {\n\tData T `json:\"data\"`\n}\n",
                false,
            )
            .unwrap();
        reg.materialize();

        let hit = reg
            .find_type("response.Wrapper[account.Account]", file_id)
            .unwrap();
        assert_eq!(reg.decl(hit.decl).name, "Wrapper");
        assert_eq!(hit.type_args, vec!["account.Account"]);
    }

    #[test]
    fn test_function_scoped_type_is_namespaced() {
        let mut reg = registry();
        let file_id = reg
            .collect_file(
                "example.com/handlers",
                "handlers/get.go",
                r#"
package handlers

func GetThing() {
	type reply struct {
		OK bool `json:"ok"`
	}
	_ = reply{}
}
"#,
                false,
            )
            .unwrap();
        reg.materialize();

        assert!(reg.find_type("reply", file_id).is_none());
        let hit = reg.find_type("GetThing.reply", file_id).unwrap();
        assert_eq!(reg.decl(hit.decl).parent_fn.as_deref(), Some("GetThing"));
    }

    #[test]
    fn test_vendored_files_excluded_from_operation_walk() {
        let mut reg = registry();
        reg.collect_file(
            "example.com/app",
            "app/b.go",
            "package app\n",
            false,
        )
        .unwrap();
        reg.collect_file(
            "example.com/vendorlib",
            "vendor/lib/lib.go",
            "package vendorlib\n",
            true,
        )
        .unwrap();
        reg.collect_file(
            "example.com/app",
            "app/a.go",
            "package app\n",
            false,
        )
        .unwrap();
        reg.materialize();

        let walk = reg.files_for_operations();
        let paths: Vec<&str> = walk.iter().map(|id| reg.file(*id).path.as_str()).collect();
        assert_eq!(paths, vec!["app/a.go", "app/b.go"]);
    }

    #[test]
    fn test_split_generic_name() {
        assert_eq!(split_generic_name("Account"), ("Account", vec![]));
        let (base, args) = split_generic_name("Wrapper[a.A,map[string]b.B]");
        assert_eq!(base, "Wrapper");
        assert_eq!(args, vec!["a.A", "map[string]b.B"]);
    }

    #[test]
    fn test_normalize_generic_schema_name() {
        assert_eq!(
            normalize_generic_schema_name("response.Wrapper[account.Account]"),
            "response.Wrapper[account_Account]"
        );
        assert_eq!(normalize_generic_schema_name("Account"), "Account");
    }

    #[test]
    fn test_primitive_alias_prebuilt() {
        let mut reg = registry();
        reg.collect_file(
            "example.com/ids",
            "ids/ids.go",
            "package ids\n\ntype ID string\n",
            false,
        )
        .unwrap();
        reg.materialize();
        let prim = reg.decl(0).primitive.clone().unwrap();
        assert_eq!(prim.schema_type, "string");
    }

    #[test]
    fn test_enum_values_in_declaration_order() {
        let mut reg = registry();
        reg.collect_file(
            "example.com/role",
            "role/role.go",
            r#"
package role

type Role int

const (
	RoleAdmin Role = iota + 1
	RoleUser
	RoleGuest
)

const Unrelated = "x"
"#,
            false,
        )
        .unwrap();
        reg.materialize();

        let values = reg.enum_values("example.com/role", "Role");
        let names: Vec<&str> = values.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["RoleAdmin", "RoleUser", "RoleGuest"]);
        assert_eq!(values[0].1, ConstValue::Int(1));
        assert_eq!(values[2].1, ConstValue::Int(3));
    }
}
