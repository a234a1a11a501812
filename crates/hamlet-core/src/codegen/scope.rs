//! Scope & locals tracker (component B).
//!
//! Lexical name resolution during emission. A `Scope` is a stack of frames;
//! lookups walk the frame stack, but the codegen context additionally
//! consults module/import-level name sets that live outside the lexical
//! stack entirely (see [`NameResolution`]).

use std::collections::HashSet;

#[derive(Debug, Default)]
pub struct Scope {
    frames: Vec<HashSet<String>>,
}

impl Scope {
    pub fn new() -> Self {
        Self { frames: vec![HashSet::new()] }
    }

    pub fn push_scope(&mut self) {
        self.frames.push(HashSet::new());
    }

    pub fn pop_scope(&mut self) {
        self.frames.pop();
        if self.frames.is_empty() {
            self.frames.push(HashSet::new());
        }
    }

    /// Add a name to the current (innermost) frame. No-op if already present
    /// in that frame.
    pub fn add(&mut self, name: impl Into<String>) {
        self.frames.last_mut().expect("scope always has a frame").insert(name.into());
    }

    /// True if `name` is bound in the innermost frame only.
    pub fn has(&self, name: &str) -> bool {
        self.frames.last().is_some_and(|f| f.contains(name))
    }

    /// True if `name` is bound anywhere in the frame stack.
    pub fn is_defined(&self, name: &str) -> bool {
        self.frames.iter().any(|f| f.contains(name))
    }
}

/// Where an identifier resolves to, in the priority order codegen's
/// expression emitter relies on (4.B):
/// shadow > local > main_func/main_var > module > imports > builtin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameResolution {
    /// Resolves bare, e.g. a catch parameter or a local `let`.
    Bare(String),
    /// Resolves with a `_main_` prefix.
    MainPrefixed(String),
    /// Resolves with the current module's `_modN_` prefix.
    ModulePrefixed(String),
    /// Resolves to an import binding's already-mangled name.
    Imported(String),
    /// No lexical/module binding found; falls to builtin/global resolution.
    Unresolved,
}

/// Flat name sets that live outside the lexical scope stack: shadow names,
/// locals (for bodies of named functions/closures currently being emitted),
/// const-ness, and the main file's own top-level vars/funcs/imports.
#[derive(Debug, Default)]
pub struct NameTables {
    pub shadow: HashSet<String>,
    pub locals: HashSet<String>,
    pub const_vars: HashSet<String>,
    pub main_vars: HashSet<String>,
    pub main_funcs: HashSet<String>,
    /// Names this module itself declares at top level (its own
    /// lets/consts/functions) — the only names that resolve through the
    /// module-prefix branch. Without this, a bare reference to an *imported*
    /// name inside a module body would wrongly resolve to that module's own
    /// prefix instead of the import's mangled name.
    pub module_locals: HashSet<String>,
    /// Subset of `module_locals` that are function declarations rather than
    /// `let`/`const` — functions mangle through an extra `fn_` segment, so
    /// `resolve` needs to tell the two apart.
    pub module_funcs: HashSet<String>,
    /// local_name -> mangled_name, for imports visible in the current context
    /// (main-file imports, or the current module's own imports).
    pub imports: std::collections::HashMap<String, String>,
}

impl NameTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&self, name: &str, module_prefix: Option<&str>) -> NameResolution {
        if self.shadow.contains(name) {
            return NameResolution::Bare(name.to_string());
        }
        if self.locals.contains(name) {
            return NameResolution::Bare(name.to_string());
        }
        if self.main_funcs.contains(name) {
            return NameResolution::MainPrefixed(format!("_main_fn_{name}"));
        }
        if self.main_vars.contains(name) {
            return NameResolution::MainPrefixed(format!("_main_{name}"));
        }
        if self.module_locals.contains(name) {
            if let Some(prefix) = module_prefix {
                if self.module_funcs.contains(name) {
                    return NameResolution::ModulePrefixed(format!("{prefix}fn_{name}"));
                }
                return NameResolution::ModulePrefixed(format!("{prefix}{name}"));
            }
        }
        if let Some(mangled) = self.imports.get(name) {
            return NameResolution::Imported(mangled.clone());
        }
        NameResolution::Unresolved
    }

    pub fn is_const(&self, name: &str) -> bool {
        self.const_vars.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shadow_beats_local() {
        let mut tables = NameTables::new();
        tables.locals.insert("e".to_string());
        tables.shadow.insert("e".to_string());
        assert_eq!(tables.resolve("e", None), NameResolution::Bare("e".to_string()));
    }

    #[test]
    fn main_var_gets_prefixed() {
        let mut tables = NameTables::new();
        tables.main_vars.insert("count".to_string());
        assert_eq!(
            tables.resolve("count", None),
            NameResolution::MainPrefixed("_main_count".to_string())
        );
    }

    #[test]
    fn main_func_gets_fn_prefixed_distinctly_from_a_var_of_the_same_name_space() {
        let mut tables = NameTables::new();
        tables.main_funcs.insert("helper".to_string());
        tables.main_vars.insert("count".to_string());
        assert_eq!(
            tables.resolve("helper", None),
            NameResolution::MainPrefixed("_main_fn_helper".to_string())
        );
        assert_eq!(
            tables.resolve("count", None),
            NameResolution::MainPrefixed("_main_count".to_string())
        );
    }

    #[test]
    fn module_func_gets_fn_prefixed_distinctly_from_a_module_var() {
        let mut tables = NameTables::new();
        tables.module_locals.insert("helper".to_string());
        tables.module_funcs.insert("helper".to_string());
        tables.module_locals.insert("total".to_string());
        assert_eq!(
            tables.resolve("helper", Some("_mod1_")),
            NameResolution::ModulePrefixed("_mod1_fn_helper".to_string())
        );
        assert_eq!(
            tables.resolve("total", Some("_mod1_")),
            NameResolution::ModulePrefixed("_mod1_total".to_string())
        );
    }

    #[test]
    fn unresolved_falls_through_to_builtin() {
        let tables = NameTables::new();
        assert_eq!(tables.resolve("print", None), NameResolution::Unresolved);
    }

    #[test]
    fn scope_frames_are_lifo() {
        let mut scope = Scope::new();
        scope.add("x");
        scope.push_scope();
        scope.add("y");
        assert!(scope.is_defined("x"));
        assert!(scope.has("y"));
        assert!(!scope.has("x"));
        scope.pop_scope();
        assert!(!scope.is_defined("y"));
        assert!(scope.is_defined("x"));
    }
}
