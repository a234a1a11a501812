//! Module path resolution.
//!
//! Implements the import-path resolution algorithm: `@stdlib/` prefix
//! rewriting, absolute paths used verbatim, relative-to-importer resolution,
//! `.hml` suffix normalization, and canonicalization to the cache key used by
//! the module loader. The stdlib root itself is discovered by the CLI
//! collaborator (via `hamlet_config::discover_stdlib_root`, which touches the
//! environment and filesystem) and handed to the resolver as a plain path —
//! the core never reads the environment on its own.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::diagnostic::{error_codes, Diagnostic};
use crate::span::Span;

const STDLIB_PREFIX: &str = "@stdlib/";
const MODULE_SUFFIX: &str = ".hml";

pub struct ModuleResolver {
    root: PathBuf,
    stdlib_root: Option<PathBuf>,
    /// Dependency edges added as modules are discovered, used purely for
    /// diagnostics (`check_circular`); the authoritative cycle check happens
    /// during the loader's own `LOADING`-state probe.
    dependencies: HashMap<PathBuf, HashSet<PathBuf>>,
}

impl ModuleResolver {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            stdlib_root: None,
            dependencies: HashMap::new(),
        }
    }

    pub fn with_stdlib_root(mut self, stdlib_root: PathBuf) -> Self {
        self.stdlib_root = Some(stdlib_root);
        self
    }

    /// Resolve an import's source string against the importing module's path
    /// (or the project root, for the entry point itself).
    pub fn resolve_path(
        &self,
        source: &str,
        importer: &Path,
        span: Span,
    ) -> Result<PathBuf, Diagnostic> {
        let candidate = if let Some(rest) = source.strip_prefix(STDLIB_PREFIX) {
            let stdlib_root = self.stdlib_root.as_deref().ok_or_else(|| {
                Diagnostic::error_with_code(
                    error_codes::IMPORT_RESOLUTION,
                    format!("cannot resolve '{source}': no stdlib root configured"),
                    span,
                )
                .with_help("set HAMLET_STDLIB_ROOT or stdlib_root in hamlet.toml".to_string())
            })?;
            stdlib_root.join(rest)
        } else {
            let path = Path::new(source);
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                let base = importer.parent().unwrap_or(&self.root);
                base.join(path)
            }
        };

        let candidate = append_suffix_if_missing(candidate);

        std::fs::canonicalize(&candidate).map_err(|_| {
            Diagnostic::error_with_code(
                error_codes::IMPORT_RESOLUTION,
                format!("cannot resolve import '{source}'"),
                span,
            )
            .with_label(format!("looked for: {}", candidate.display()))
            .with_help("check the import path and that the file exists".to_string())
        })
    }

    pub fn add_dependency(&mut self, from: PathBuf, to: PathBuf) {
        self.dependencies.entry(from).or_default().insert(to);
    }

    /// Diagnostic-only circular-dependency probe (DFS over the recorded edges
    /// starting at `entry`); the loader's `LOADING`-state check is what
    /// actually prevents infinite recursion.
    pub fn check_circular(&self, entry: &Path, span: Span) -> Result<(), Diagnostic> {
        let mut visited = HashSet::new();
        let mut stack = vec![entry.to_path_buf()];
        while let Some(node) = stack.pop() {
            if !visited.insert(node.clone()) {
                return Err(Diagnostic::error_with_code(
                    error_codes::CIRCULAR_DEPENDENCY,
                    "circular dependency detected",
                    span,
                )
                .with_label(format!("module: {}", node.display())));
            }
            if let Some(deps) = self.dependencies.get(&node) {
                stack.extend(deps.iter().cloned());
            }
            visited.remove(&node);
        }
        Ok(())
    }

    #[cfg(test)]
    pub fn clear(&mut self) {
        self.dependencies.clear();
    }
}

fn append_suffix_if_missing(path: PathBuf) -> PathBuf {
    if path.extension().is_some_and(|ext| ext == "hml") {
        path
    } else {
        let mut s = path.into_os_string();
        s.push(MODULE_SUFFIX);
        PathBuf::from(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn appends_hml_suffix() {
        let p = append_suffix_if_missing(PathBuf::from("math"));
        assert_eq!(p, PathBuf::from("math.hml"));
    }

    #[test]
    fn leaves_existing_hml_suffix() {
        let p = append_suffix_if_missing(PathBuf::from("math.hml"));
        assert_eq!(p, PathBuf::from("math.hml"));
    }

    #[test]
    fn resolves_relative_to_importer_directory() {
        let dir = tempdir().unwrap();
        let sub = dir.path().join("lib");
        fs::create_dir(&sub).unwrap();
        fs::write(sub.join("math.hml"), "export const pi = 3;").unwrap();
        let importer = sub.join("main.hml");
        fs::write(&importer, "").unwrap();

        let resolver = ModuleResolver::new(dir.path().to_path_buf());
        let resolved = resolver.resolve_path("math", &importer, Span::dummy()).unwrap();
        assert_eq!(resolved, sub.join("math.hml").canonicalize().unwrap());
    }

    #[test]
    fn resolves_stdlib_prefix_against_configured_root() {
        let dir = tempdir().unwrap();
        let stdlib = dir.path().join("stdlib");
        fs::create_dir(&stdlib).unwrap();
        fs::write(stdlib.join("strings.hml"), "export fn len() {}").unwrap();
        let importer = dir.path().join("main.hml");
        fs::write(&importer, "").unwrap();

        let resolver = ModuleResolver::new(dir.path().to_path_buf()).with_stdlib_root(stdlib.clone());
        let resolved = resolver
            .resolve_path("@stdlib/strings", &importer, Span::dummy())
            .unwrap();
        assert_eq!(resolved, stdlib.join("strings.hml").canonicalize().unwrap());
    }

    #[test]
    fn missing_file_is_import_resolution_error() {
        let dir = tempdir().unwrap();
        let importer = dir.path().join("main.hml");
        fs::write(&importer, "").unwrap();
        let resolver = ModuleResolver::new(dir.path().to_path_buf());
        let err = resolver
            .resolve_path("does-not-exist", &importer, Span::dummy())
            .unwrap_err();
        assert_eq!(err.code, error_codes::IMPORT_RESOLUTION);
    }
}
