//! Filesystem loader for external packages.

use std::path::PathBuf;
use swaggen_core::registry::DependencyLoader;
use swaggen_core::{AppError, AppResult};

/// Loads external packages from a list of source roots: the project's
/// `vendor/` directory first, then `$GOPATH/src` when set.
pub struct FsLoader {
    roots: Vec<PathBuf>,
}

impl FsLoader {
    /// Builds a loader rooted at the project directory.
    pub fn new(project_dir: &std::path::Path) -> Self {
        let mut roots = vec![project_dir.join("vendor")];
        if let Ok(gopath) = std::env::var("GOPATH") {
            roots.push(PathBuf::from(gopath).join("src"));
        }
        Self { roots }
    }
}

impl DependencyLoader for FsLoader {
    fn load(&self, import_path: &str) -> AppResult<Vec<(String, String)>> {
        for root in &self.roots {
            let dir = root.join(import_path);
            if !dir.is_dir() {
                continue;
            }
            let mut files = Vec::new();
            for entry in std::fs::read_dir(&dir)? {
                let entry = entry?;
                let path = entry.path();
                let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                    continue;
                };
                if !name.ends_with(".go") || name.ends_with("_test.go") {
                    continue;
                }
                let source = std::fs::read_to_string(&path)?;
                files.push((format!("{}/{}", import_path, name), source));
            }
            if !files.is_empty() {
                return Ok(files);
            }
        }
        Err(AppError::General(format!(
            "package '{}' not found under any source root",
            import_path
        )))
    }
}
