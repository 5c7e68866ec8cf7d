#![deny(missing_docs)]

//! # Generator
//!
//! Orchestrates the phases of a run, strictly in order: collect files,
//! materialize the registry, apply general metadata, parse operations,
//! build referenced schemas, and sweep unused definitions. Everything is
//! single-threaded; the phases share one registry and one builder.

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::general::apply_general_info;
use crate::operation::parse_operation;
use crate::registry::{DependencyLoader, FileId, Registry, RegistryOptions};
use crate::schema::sweep::sweep_unused_definitions;
use crate::schema::SchemaBuilder;
use crate::spec::{PathItem, Spec};
use tracing::{debug, warn};

/// Drives a generation run.
pub struct Generator {
    config: Config,
    registry: Registry,
    builder: SchemaBuilder,
    main_file: Option<String>,
}

impl Generator {
    /// Creates a generator for the given configuration.
    pub fn new(config: Config) -> Self {
        let registry = Registry::new(RegistryOptions {
            dependency_mode: config.dependency_mode,
            loader: None,
        });
        let builder = SchemaBuilder::new(config.clone());
        Self {
            config,
            registry,
            builder,
            main_file: None,
        }
    }

    /// Installs the external-package loader.
    pub fn with_loader(mut self, loader: Box<dyn DependencyLoader>) -> Self {
        self.registry = Registry::new(RegistryOptions {
            dependency_mode: self.config.dependency_mode,
            loader: Some(loader),
        });
        self
    }

    /// Registers one source file. Files that fail to parse are reported
    /// as errors; the driver decides whether to skip them.
    pub fn collect_file(
        &mut self,
        pkg_path: &str,
        path: &str,
        source: &str,
        vendored: bool,
    ) -> AppResult<FileId> {
        self.registry.collect_file(pkg_path, path, source, vendored)
    }

    /// Marks the file whose doc block carries the general API metadata.
    pub fn set_main_file(&mut self, path: &str) {
        self.main_file = Some(path.to_string());
    }

    /// Runs the remaining phases and yields the document.
    pub fn build(mut self) -> AppResult<Spec> {
        self.registry.materialize();

        let mut spec = Spec::default();

        if let Some(main) = &self.main_file {
            let doc = self.find_main_doc(main);
            match doc {
                Some(doc) => apply_general_info(&mut spec, &doc),
                None => warn!("general info file '{}' is not registered", main),
            }
        }

        self.parse_operations(&mut spec)?;

        spec.definitions = self.builder.into_definitions();
        sweep_unused_definitions(&mut spec);
        spec.sort_definitions();

        Ok(spec)
    }

    fn find_main_doc(&self, main: &str) -> Option<Vec<String>> {
        for file_id in self.registry.files_for_operations() {
            let file = self.registry.file(file_id);
            if file.path == main || file.path.ends_with(main) {
                return Some(file.package_doc.clone());
            }
        }
        None
    }

    fn parse_operations(&mut self, spec: &mut Spec) -> AppResult<()> {
        for file_id in self.registry.files_for_operations() {
            let funcs: Vec<(String, Vec<String>)> = self
                .registry
                .file(file_id)
                .funcs()
                .map(|func| (func.name.clone(), func.doc.clone()))
                .collect();

            for (name, doc) in funcs {
                let Some(parsed) = parse_operation(
                    &mut self.builder,
                    &mut self.registry,
                    &doc,
                    file_id,
                    &name,
                )?
                else {
                    continue;
                };

                for route in parsed.routes {
                    let item = spec
                        .paths
                        .entry(route.path.clone())
                        .or_insert_with(PathItem::default);
                    if item.operations.contains_key(&route.method) {
                        if self.config.strict_route_duplicates {
                            return Err(AppError::General(format!(
                                "duplicate route {} [{}]",
                                route.path, route.method
                            )));
                        }
                        warn!(
                            "duplicate route {} [{}], keeping the last one",
                            route.path, route.method
                        );
                    }
                    item.operations
                        .insert(route.method, parsed.operation.clone());
                }
                debug!("parsed operation for {}", name);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_phases_produce_swept_sorted_document() {
        let mut generator = Generator::new(Config::default());
        generator
            .collect_file(
                "example.com/account",
                "account/account.go",
                r#"
package account

type Account struct {
	ID string `json:"id"`
}

type Orphan struct {
	X string `json:"x"`
}
"#,
                false,
            )
            .unwrap();
        generator
            .collect_file(
                "example.com/handlers",
                "handlers/get.go",
                r#"
package handlers

// @Summary Get account
// @Success 200 {object} account.Account
// @Router /accounts/{id} [get]
func GetAccount() {}
"#,
                false,
            )
            .unwrap();

        let spec = generator.build().unwrap();
        assert!(spec.paths.contains_key("/accounts/{id}"));
        // Orphan was never referenced, and never built.
        assert!(spec.definitions.contains_key("Account"));
        assert!(!spec.definitions.contains_key("Orphan"));
    }

    #[test]
    fn test_duplicate_route_last_wins() {
        let mut generator = Generator::new(Config::default());
        generator
            .collect_file(
                "example.com/handlers",
                "handlers/a.go",
                r#"
package handlers

// @Summary First
// @Success 200 {string} string
// @Router /ping [get]
func First() {}

// @Summary Second
// @Success 200 {string} string
// @Router /ping [get]
func Second() {}
"#,
                false,
            )
            .unwrap();

        let spec = generator.build().unwrap();
        let operation = &spec.paths["/ping"].operations["get"];
        assert_eq!(operation.summary.as_deref(), Some("Second"));
    }

    #[test]
    fn test_duplicate_route_strict_errors() {
        let config = Config {
            strict_route_duplicates: true,
            ..Config::default()
        };
        let mut generator = Generator::new(config);
        generator
            .collect_file(
                "example.com/handlers",
                "handlers/a.go",
                r#"
package handlers

// @Success 200 {string} string
// @Router /ping [get]
func First() {}

// @Success 200 {string} string
// @Router /ping [get]
func Second() {}
"#,
                false,
            )
            .unwrap();

        assert!(generator.build().is_err());
    }

    #[test]
    fn test_general_info_from_main_file() {
        let mut generator = Generator::new(Config::default());
        generator
            .collect_file(
                "example.com/cmd",
                "cmd/main.go",
                r#"
// @title Ping API
// @version 0.9
// @host ping.example.com
package main

func main() {}
"#,
                false,
            )
            .unwrap();
        generator.set_main_file("cmd/main.go");

        let spec = generator.build().unwrap();
        assert_eq!(spec.info.title, "Ping API");
        assert_eq!(spec.info.version, "0.9");
        assert_eq!(spec.host.as_deref(), Some("ping.example.com"));
    }
}
