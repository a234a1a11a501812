//! Module loading and caching.
//!
//! Loads module files, builds the dependency graph, mangles cross-module
//! symbol names, and returns compiled modules in topological order for the
//! program pipeline (4.J) to emit.

use crate::ast::{ImportKind, Program, Stmt, StmtKind};
use crate::diagnostic::{error_codes, Diagnostic};
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::resolver::ModuleResolver;
use crate::span::Span;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleState {
    Loading,
    Loaded,
}

#[derive(Debug, Clone)]
pub struct ExportedSymbol {
    pub name: String,
    pub mangled_name: String,
    pub is_function: bool,
    pub num_params: usize,
}

#[derive(Debug, Clone)]
pub struct ImportBinding {
    pub local_name: String,
    pub original_name: String,
    pub module_prefix: String,
    pub is_function: bool,
    pub num_params: usize,
}

/// A `import * as ns from "source"` binding: `ns` resolves to an object
/// literal built from the target module's full export list.
#[derive(Debug, Clone)]
pub struct NamespaceImportBinding {
    pub local_name: String,
    pub module_prefix: String,
    pub exports: Vec<ExportedSymbol>,
}

#[derive(Debug, Clone)]
pub struct CompiledModule {
    pub absolute_path: PathBuf,
    pub module_prefix: String,
    pub state: ModuleState,
    pub statements: Vec<Stmt>,
    pub exports: Vec<ExportedSymbol>,
    pub imports: Vec<ImportBinding>,
    pub namespace_imports: Vec<NamespaceImportBinding>,
}

impl CompiledModule {
    pub fn find_export(&self, name: &str) -> Option<&ExportedSymbol> {
        self.exports.iter().find(|e| e.name == name)
    }
}

impl ImportBinding {
    /// The mangled C name this binding resolves to in the importing module,
    /// matching the naming scheme `collect_exports` used to produce it.
    pub fn mangled_name(&self) -> String {
        if self.is_function {
            format!("{}fn_{}", self.module_prefix, self.original_name)
        } else {
            format!("{}{}", self.module_prefix, self.original_name)
        }
    }
}

pub struct ModuleLoader {
    resolver: ModuleResolver,
    modules: HashMap<PathBuf, CompiledModule>,
    /// Discovery order; also determines `_modN_` numbering (1-based).
    order: Vec<PathBuf>,
    dependencies: HashMap<PathBuf, Vec<PathBuf>>,
}

impl ModuleLoader {
    pub fn new(resolver: ModuleResolver) -> Self {
        Self {
            resolver,
            modules: HashMap::new(),
            order: Vec::new(),
            dependencies: HashMap::new(),
        }
    }

    /// Compile the entry module and every module it (transitively) imports.
    /// Returns the compiled modules in topological order — dependencies
    /// before dependents — plus any tolerant diagnostics collected along
    /// the way (e.g. `UnknownExport`).
    pub fn compile_entry(
        &mut self,
        entry_point: &Path,
    ) -> Result<(Vec<CompiledModule>, Vec<Diagnostic>), Vec<Diagnostic>> {
        let mut tolerant = Vec::new();
        let abs_entry = entry_point.to_path_buf();
        self.compile_module(&abs_entry, Span::dummy(), &mut tolerant)?;
        let ordered = self.topological_sort(&abs_entry)?;
        let modules = ordered
            .into_iter()
            .map(|path| {
                self.modules
                    .get(&path)
                    .expect("module should exist in cache after loading")
                    .clone()
            })
            .collect();
        Ok((modules, tolerant))
    }

    fn compile_module(
        &mut self,
        path: &Path,
        span: Span,
        tolerant: &mut Vec<Diagnostic>,
    ) -> Result<(), Vec<Diagnostic>> {
        if let Some(existing) = self.modules.get(path) {
            return match existing.state {
                ModuleState::Loaded => Ok(()),
                ModuleState::Loading => Err(vec![Diagnostic::error_with_code(
                    error_codes::CIRCULAR_DEPENDENCY,
                    "circular dependency detected",
                    span,
                )
                .with_label(format!("module: {}", path.display()))
                .with_help("refactor to remove circular imports between modules".to_string())]),
            };
        }

        // The prefix is assigned once this module finishes loading, not when
        // it starts — so a dependency that completes its own (possibly
        // recursive) load first claims a lower `_modN_` number than the
        // importer that triggered it, even though the importer started
        // first. The placeholder below only needs to be unique enough for
        // the `Loading`-state cycle check above; nothing reads it before
        // it's finalized.
        self.modules.insert(
            path.to_path_buf(),
            CompiledModule {
                absolute_path: path.to_path_buf(),
                module_prefix: String::new(),
                state: ModuleState::Loading,
                statements: Vec::new(),
                exports: Vec::new(),
                imports: Vec::new(),
                namespace_imports: Vec::new(),
            },
        );

        let source = fs::read_to_string(path).map_err(|e| {
            vec![Diagnostic::error_with_code(
                error_codes::MODULE_LOAD,
                format!("failed to read module file: {e}"),
                span,
            )
            .with_label(format!("path: {}", path.display()))
            .with_help("ensure the file exists and you have read permissions".to_string())]
        })?;

        let mut lexer = Lexer::new(&source);
        let (tokens, lex_diags) = lexer.tokenize();
        if !lex_diags.is_empty() {
            return Err(lex_diags);
        }

        let mut parser = Parser::new(tokens);
        let (program, parse_diags) = parser.parse();
        if !parse_diags.is_empty() {
            return Err(parse_diags);
        }

        let mut deps = Vec::new();
        let mut seen_deps = HashSet::new();
        let mut imports = Vec::new();
        let mut namespace_imports = Vec::new();

        for stmt in &program.statements {
            let StmtKind::Import(import_decl) = &stmt.kind else {
                continue;
            };
            let dep_path = self
                .resolver
                .resolve_path(&import_decl.source, path, import_decl.span)
                .map_err(|e| vec![e])?;

            if seen_deps.insert(dep_path.clone()) {
                deps.push(dep_path.clone());
                self.resolver.add_dependency(path.to_path_buf(), dep_path.clone());
            }
            self.compile_module(&dep_path, import_decl.span, tolerant)?;

            let dep = self
                .modules
                .get(&dep_path)
                .expect("dependency compiled above")
                .clone();

            match &import_decl.kind {
                ImportKind::Namespace { alias } => {
                    namespace_imports.push(NamespaceImportBinding {
                        local_name: alias.clone(),
                        module_prefix: dep.module_prefix.clone(),
                        exports: dep.exports.clone(),
                    });
                }
                ImportKind::Named(specs) => {
                    for spec in specs {
                        match dep.find_export(&spec.imported_name) {
                            Some(exported) => imports.push(ImportBinding {
                                local_name: spec.local_name.clone(),
                                original_name: spec.imported_name.clone(),
                                module_prefix: dep.module_prefix.clone(),
                                is_function: exported.is_function,
                                num_params: exported.num_params,
                            }),
                            None => tolerant.push(
                                Diagnostic::error_with_code(
                                    error_codes::UNKNOWN_EXPORT,
                                    format!(
                                        "module '{}' has no export named '{}'",
                                        dep_path.display(),
                                        spec.imported_name
                                    ),
                                    import_decl.span,
                                )
                                .with_help(
                                    "a null binding is substituted; check the module's exports"
                                        .to_string(),
                                ),
                            ),
                        }
                    }
                }
            }
        }

        let module_prefix = format!("_mod{}_", self.order.len() + 1);
        self.order.push(path.to_path_buf());

        let exports = collect_exports(&program, &module_prefix);
        self.dependencies.insert(path.to_path_buf(), deps);

        let module = self
            .modules
            .get_mut(path)
            .expect("module was inserted above");
        module.module_prefix = module_prefix;
        module.statements = program.statements;
        module.exports = exports;
        module.imports = imports;
        module.namespace_imports = namespace_imports;
        module.state = ModuleState::Loaded;

        Ok(())
    }

    fn topological_sort(&self, entry: &Path) -> Result<Vec<PathBuf>, Vec<Diagnostic>> {
        let reachable = self.find_reachable(entry);
        let mut in_degree: HashMap<PathBuf, usize> =
            reachable.iter().map(|n| (n.clone(), 0)).collect();

        for from in &reachable {
            if let Some(deps) = self.dependencies.get(from) {
                for dep in deps {
                    if reachable.contains(dep) {
                        *in_degree.get_mut(from).expect("reachable node") += 1;
                    }
                }
            }
        }

        let mut queue: VecDeque<PathBuf> = in_degree
            .iter()
            .filter(|(_, &deg)| deg == 0)
            .map(|(n, _)| n.clone())
            .collect();

        let mut sorted = Vec::new();
        while let Some(node) = queue.pop_front() {
            sorted.push(node.clone());
            for from in &reachable {
                if let Some(deps) = self.dependencies.get(from) {
                    if deps.contains(&node) {
                        let degree = in_degree.get_mut(from).expect("reachable node");
                        *degree -= 1;
                        if *degree == 0 {
                            queue.push_back(from.clone());
                        }
                    }
                }
            }
        }

        if sorted.len() != reachable.len() {
            return Err(vec![Diagnostic::error_with_code(
                error_codes::CIRCULAR_DEPENDENCY,
                "circular dependency detected during topological sort",
                Span::dummy(),
            )
            .with_help("remove circular imports between modules".to_string())]);
        }

        Ok(sorted)
    }

    fn find_reachable(&self, entry: &Path) -> HashSet<PathBuf> {
        let mut reachable = HashSet::new();
        let mut stack = vec![entry.to_path_buf()];
        while let Some(node) = stack.pop() {
            if reachable.insert(node.clone()) {
                if let Some(deps) = self.dependencies.get(&node) {
                    stack.extend(deps.iter().cloned());
                }
            }
        }
        reachable
    }

    pub fn get_module(&self, path: &Path) -> Option<&CompiledModule> {
        self.modules.get(path)
    }

    #[cfg(test)]
    pub fn clear(&mut self) {
        self.modules.clear();
        self.order.clear();
        self.dependencies.clear();
        self.resolver.clear();
    }
}

/// Two-pass export collection: explicit `export` statements first, then
/// every top-level function not already exported.
fn collect_exports(program: &Program, module_prefix: &str) -> Vec<ExportedSymbol> {
    let mut exports = Vec::new();
    let mut seen = HashSet::new();

    for stmt in &program.statements {
        if let StmtKind::Export(inner) = &stmt.kind {
            if let Some(symbol) = exported_symbol_for(inner, module_prefix) {
                if seen.insert(symbol.name.clone()) {
                    exports.push(symbol);
                }
            }
        }
    }

    for stmt in &program.statements {
        if let StmtKind::FunctionDecl(decl) = &stmt.kind {
            if seen.insert(decl.name.clone()) {
                exports.push(ExportedSymbol {
                    name: decl.name.clone(),
                    mangled_name: format!("{module_prefix}fn_{}", decl.name),
                    is_function: true,
                    num_params: decl.params.len(),
                });
            }
        }
    }

    exports
}

fn exported_symbol_for(stmt: &Stmt, module_prefix: &str) -> Option<ExportedSymbol> {
    match &stmt.kind {
        StmtKind::FunctionDecl(decl) => Some(ExportedSymbol {
            name: decl.name.clone(),
            mangled_name: format!("{module_prefix}fn_{}", decl.name),
            is_function: true,
            num_params: decl.params.len(),
        }),
        StmtKind::Let { name, .. } | StmtKind::Const { name, .. } => Some(ExportedSymbol {
            name: name.clone(),
            mangled_name: format!("{module_prefix}{name}"),
            is_function: false,
            num_params: 0,
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn loads_single_module_with_no_imports() {
        let dir = tempdir().unwrap();
        let main = write(dir.path(), "main.hml", "let x = 1;");
        let mut loader = ModuleLoader::new(ModuleResolver::new(dir.path().to_path_buf()));
        let (modules, diags) = loader.compile_entry(&main).unwrap();
        assert!(diags.is_empty());
        assert_eq!(modules.len(), 1);
        assert_eq!(modules[0].module_prefix, "_mod1_");
    }

    #[test]
    fn named_import_resolves_mangled_name() {
        let dir = tempdir().unwrap();
        write(dir.path(), "math.hml", "export fn add(a, b) { return a + b; }");
        let main = write(
            dir.path(),
            "main.hml",
            r#"import { add } from "math"; let r = add(1, 2);"#,
        );
        let mut loader = ModuleLoader::new(ModuleResolver::new(dir.path().to_path_buf()));
        let (modules, diags) = loader.compile_entry(&main).unwrap();
        assert!(diags.is_empty());
        // math.hml is a dependency, so it is emitted before main.hml.
        let math_module = modules.iter().find(|m| m.module_prefix == "_mod1_").unwrap();
        assert_eq!(math_module.exports.len(), 1);
        assert_eq!(math_module.exports[0].mangled_name, "_mod1_fn_add");

        let main_module = modules.iter().find(|m| m.module_prefix == "_mod2_").unwrap();
        assert_eq!(main_module.imports.len(), 1);
        assert_eq!(main_module.imports[0].module_prefix, "_mod1_");
        assert!(main_module.imports[0].is_function);
        assert_eq!(main_module.imports[0].num_params, 2);
    }

    #[test]
    fn unknown_export_is_tolerant() {
        let dir = tempdir().unwrap();
        write(dir.path(), "math.hml", "export const pi = 3;");
        let main = write(
            dir.path(),
            "main.hml",
            r#"import { missing } from "math";"#,
        );
        let mut loader = ModuleLoader::new(ModuleResolver::new(dir.path().to_path_buf()));
        let (_, diags) = loader.compile_entry(&main).unwrap();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, error_codes::UNKNOWN_EXPORT);
        assert!(diags[0].is_tolerant());
    }

    #[test]
    fn circular_import_is_an_error() {
        let dir = tempdir().unwrap();
        write(dir.path(), "a.hml", r#"import { b } from "b";"#);
        write(dir.path(), "b.hml", r#"import { a } from "a";"#);
        let main = write(dir.path(), "a.hml", r#"import { b } from "b";"#);
        let mut loader = ModuleLoader::new(ModuleResolver::new(dir.path().to_path_buf()));
        let result = loader.compile_entry(&main);
        assert!(result.is_err());
        let diags = result.unwrap_err();
        assert_eq!(diags[0].code, error_codes::CIRCULAR_DEPENDENCY);
    }
}
