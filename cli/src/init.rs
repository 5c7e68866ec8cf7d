//! The `init` command: walk a source tree, generate the document, write
//! it out.

use clap::{Args, ValueEnum};
use std::path::{Path, PathBuf};
use swaggen_core::config::DependencyMode;
use swaggen_core::{AppError, AppResult, Config, Generator, PropertyStrategy};
use tracing::warn;
use walkdir::WalkDir;

use crate::loader::FsLoader;

/// Output document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// `swagger.json`.
    Json,
    /// `swagger.yaml`.
    Yaml,
}

/// Naming strategy token for untagged fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    /// `FieldName` becomes `fieldName`.
    Camelcase,
    /// `FieldName` becomes `field_name`.
    Snakecase,
    /// `FieldName` stays `FieldName`.
    Pascalcase,
}

impl StrategyArg {
    fn to_config(self) -> PropertyStrategy {
        match self {
            StrategyArg::Camelcase => PropertyStrategy::CamelCase,
            StrategyArg::Snakecase => PropertyStrategy::SnakeCase,
            StrategyArg::Pascalcase => PropertyStrategy::PascalCase,
        }
    }
}

/// External-package loading mode token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DependencyArg {
    /// Never load external packages.
    None,
    /// Load them while resolving model references.
    Models,
    /// Load them for everything.
    All,
}

impl DependencyArg {
    fn to_config(self) -> DependencyMode {
        match self {
            DependencyArg::None => DependencyMode::None,
            DependencyArg::Models => DependencyMode::Models,
            DependencyArg::All => DependencyMode::All,
        }
    }
}

/// Collection format token for query array parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CollectionFormatArg {
    /// Comma separated.
    Csv,
    /// Space separated.
    Ssv,
    /// Tab separated.
    Tsv,
    /// Pipe separated.
    Pipes,
    /// Repeated parameter instances.
    Multi,
}

impl CollectionFormatArg {
    fn token(self) -> &'static str {
        match self {
            CollectionFormatArg::Csv => "csv",
            CollectionFormatArg::Ssv => "ssv",
            CollectionFormatArg::Tsv => "tsv",
            CollectionFormatArg::Pipes => "pipes",
            CollectionFormatArg::Multi => "multi",
        }
    }
}

/// Arguments for `swaggen init`.
#[derive(Debug, Args)]
pub struct InitArgs {
    /// Directory to search for annotated source files.
    #[arg(long, short = 'd', default_value = ".")]
    pub dir: PathBuf,

    /// File holding the general API annotations, relative to `--dir`.
    #[arg(long = "general-info", short = 'g', default_value = "main.go")]
    pub general_info: String,

    /// Output directory for the generated document.
    #[arg(long, short = 'o', default_value = "docs")]
    pub output: PathBuf,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Naming strategy for untagged fields.
    #[arg(
        long = "property-strategy",
        value_enum,
        default_value_t = StrategyArg::Camelcase
    )]
    pub property_strategy: StrategyArg,

    /// Treat fields without a binding/validate tag as required.
    #[arg(long = "required-by-default")]
    pub required_by_default: bool,

    /// Register vendor packages for symbol lookup.
    #[arg(long = "parse-vendor")]
    pub parse_vendor: bool,

    /// External-package loading mode.
    #[arg(
        long = "parse-dependency",
        value_enum,
        default_value_t = DependencyArg::None
    )]
    pub parse_dependency: DependencyArg,

    /// Walk `internal` directories as well.
    #[arg(long = "parse-internal")]
    pub parse_internal: bool,

    /// Collection format for query array parameters.
    #[arg(
        long = "collection-format",
        value_enum,
        default_value_t = CollectionFormatArg::Csv
    )]
    pub collection_format: CollectionFormatArg,

    /// Fail on duplicate (method, path) registrations.
    #[arg(long)]
    pub strict: bool,

    /// Comma-separated directory names to skip.
    #[arg(long, value_delimiter = ',')]
    pub exclude: Vec<String>,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            OutputFormat::Json => "json",
            OutputFormat::Yaml => "yaml",
        })
    }
}

impl std::fmt::Display for StrategyArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            StrategyArg::Camelcase => "camelcase",
            StrategyArg::Snakecase => "snakecase",
            StrategyArg::Pascalcase => "pascalcase",
        })
    }
}

impl std::fmt::Display for DependencyArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            DependencyArg::None => "none",
            DependencyArg::Models => "models",
            DependencyArg::All => "all",
        })
    }
}

impl std::fmt::Display for CollectionFormatArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}

/// Runs the command.
pub fn execute(args: &InitArgs) -> AppResult<()> {
    let config = config_from(args);
    let mut generator =
        Generator::new(config).with_loader(Box::new(FsLoader::new(&args.dir)));

    collect_tree(&mut generator, args)?;
    generator.set_main_file(&args.general_info);

    let spec = generator.build()?;

    std::fs::create_dir_all(&args.output)?;
    match args.format {
        OutputFormat::Json => {
            let rendered = serde_json::to_string_pretty(&spec)
                .map_err(|e| AppError::General(format!("serialization failed: {}", e)))?;
            std::fs::write(args.output.join("swagger.json"), rendered + "\n")?;
        }
        OutputFormat::Yaml => {
            let rendered = serde_yaml::to_string(&spec)
                .map_err(|e| AppError::General(format!("serialization failed: {}", e)))?;
            std::fs::write(args.output.join("swagger.yaml"), rendered)?;
        }
    }

    Ok(())
}

fn config_from(args: &InitArgs) -> Config {
    Config {
        property_strategy: args.property_strategy.to_config(),
        required_by_default: args.required_by_default,
        dependency_mode: args.parse_dependency.to_config(),
        collection_format: args.collection_format.token().to_string(),
        strict_route_duplicates: args.strict,
        ..Config::default()
    }
}

/// Walks the tree and registers every source file, computing a package
/// path from the directory layout.
fn collect_tree(generator: &mut Generator, args: &InitArgs) -> AppResult<()> {
    for entry in WalkDir::new(&args.dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| walk_into(entry, args))
    {
        let entry = entry.map_err(|e| AppError::General(format!("walk failed: {}", e)))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !name.ends_with(".go") || name.ends_with("_test.go") {
            continue;
        }

        let relative = path
            .strip_prefix(&args.dir)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");
        let vendored = relative.starts_with("vendor/");
        let pkg_path = package_path(&relative);

        let source = std::fs::read_to_string(path)?;
        match generator.collect_file(&pkg_path, &relative, &source, vendored) {
            Ok(_) => {}
            Err(err) => warn!("skipping {}: {}", relative, err),
        }
    }
    Ok(())
}

/// Decides whether the walk descends into a directory.
fn walk_into(entry: &walkdir::DirEntry, args: &InitArgs) -> bool {
    if !entry.file_type().is_dir() {
        return true;
    }
    let Some(name) = entry.file_name().to_str() else {
        return false;
    };
    if entry.depth() == 0 {
        return true;
    }
    if name.starts_with('.') || name == "testdata" {
        return false;
    }
    if name == "vendor" && !args.parse_vendor {
        return false;
    }
    if name == "internal" && !args.parse_internal {
        return false;
    }
    !args.exclude.iter().any(|excluded| excluded == name)
}

/// The package path of a file: its directory, vendor prefix stripped so
/// vendored packages register under their import paths.
fn package_path(relative: &str) -> String {
    let dir = Path::new(relative)
        .parent()
        .map(|p| p.to_string_lossy().replace('\\', "/"))
        .unwrap_or_default();
    let dir = dir
        .strip_prefix("vendor/")
        .map(str::to_string)
        .unwrap_or(dir);
    if dir.is_empty() {
        ".".to_string()
    } else {
        dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_path() {
        assert_eq!(package_path("account/model.go"), "account");
        assert_eq!(package_path("main.go"), ".");
        assert_eq!(
            package_path("vendor/github.com/google/uuid/uuid.go"),
            "github.com/google/uuid"
        );
    }

    #[test]
    fn test_arg_tokens_map_to_config() {
        assert_eq!(
            StrategyArg::Snakecase.to_config(),
            PropertyStrategy::SnakeCase
        );
        assert_eq!(DependencyArg::All.to_config(), DependencyMode::All);
        assert_eq!(CollectionFormatArg::Multi.token(), "multi");
    }

    #[test]
    fn test_init_generates_document() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path();

        std::fs::write(
            dir.join("main.go"),
            r#"
// @title Demo API
// @version 1.2
package main

func main() {}
"#,
        )
        .unwrap();

        std::fs::create_dir_all(dir.join("account")).unwrap();
        std::fs::write(
            dir.join("account/account.go"),
            r#"
package account

type Account struct {
	ID string `json:"id"`
}
"#,
        )
        .unwrap();

        std::fs::create_dir_all(dir.join("handlers")).unwrap();
        std::fs::write(
            dir.join("handlers/get.go"),
            r#"
package handlers

// @Summary Get account
// @Success 200 {object} account.Account
// @Router /accounts/{id} [get]
func GetAccount() {}
"#,
        )
        .unwrap();

        let output = root.path().join("docs");
        let args = InitArgs {
            dir: dir.to_path_buf(),
            general_info: "main.go".to_string(),
            output: output.clone(),
            format: OutputFormat::Json,
            property_strategy: StrategyArg::Camelcase,
            required_by_default: false,
            parse_vendor: false,
            parse_dependency: DependencyArg::None,
            parse_internal: false,
            collection_format: CollectionFormatArg::Csv,
            strict: false,
            exclude: Vec::new(),
        };

        execute(&args).unwrap();

        let rendered = std::fs::read_to_string(output.join("swagger.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["swagger"], "2.0");
        assert_eq!(value["info"]["title"], "Demo API");
        assert!(value["paths"]["/accounts/{id}"]["get"].is_object());
        assert!(value["definitions"]["Account"].is_object());
    }
}
