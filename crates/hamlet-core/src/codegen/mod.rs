//! AST-to-C code generation.
//!
//! Each submodule here is one of the components from the design: scope and
//! name resolution (B), free-variable analysis (C), shared closure
//! environments (D), the defer engine (E), try/finally lowering (F), the
//! expression (G) and statement (H) emitters, the FFI wrapper emitter (K),
//! and the closure-literal lowering that glues C, D and G together. Module
//! loading/caching (I) and the multi-pass program pipeline (J) live in
//! `module_loader.rs` and `pipeline.rs` respectively, since both need the
//! whole-program view this module's per-function context doesn't carry.

pub mod closures;
pub mod defer;
pub mod expr;
pub mod ffi;
pub mod freevars;
pub mod method_dispatch;
pub mod pipeline;
pub mod scope;
pub mod shared_env;
pub mod stmt;
pub mod tryfinally;

use crate::ast::FunctionExpr;
use crate::diagnostic::Diagnostic;
use crate::codegen::defer::DeferStack;
use crate::codegen::scope::{NameResolution, NameTables, Scope};
use crate::codegen::tryfinally::TryFinallyStack;

/// A function expression discovered during emission, recorded so the
/// program pipeline can emit its body in a later fixpoint pass (4.J step 5).
/// `shared_env_indices` is filled in by the shared-env planner (4.D) when the
/// enclosing function has more than one direct-child closure; `None` means
/// this closure's captures each resolve directly rather than through a
/// shared environment slot.
#[derive(Debug, Clone)]
pub struct ClosureRecord {
    pub func_name: String,
    pub captured_vars: Vec<String>,
    pub shared_env_indices: Option<Vec<Option<usize>>>,
    pub func_expr: FunctionExpr,
    pub source_module: Option<String>,
}

/// Per-function emission state. A fresh `CodegenContext` (or at least fresh
/// `names`/`scope`/`defer_stack`/`try_finally` — `closures` and
/// `diagnostics` accumulate program-wide) is used for each function body the
/// pipeline emits.
pub struct CodegenContext {
    pub names: NameTables,
    pub scope: Scope,
    pub defer_stack: DeferStack,
    pub try_finally: TryFinallyStack,
    pub closures: Vec<ClosureRecord>,
    pub diagnostics: Vec<Diagnostic>,
    /// `_modN_` prefix of the module currently being emitted, or `None` when
    /// emitting the main file (whose own top-level names use `_main_`
    /// instead, tracked via `names.main_vars`/`names.main_funcs`).
    pub module_prefix: Option<String>,
    pub loop_depth: usize,
    /// One entry per enclosing loop currently being emitted. `Some(label)`
    /// means a `continue` here must `goto` that label instead of using a
    /// native C `continue` — needed for `for`/`for-in`, whose increment or
    /// advance step would otherwise be skipped.
    continue_targets: Vec<Option<String>>,
    tmp_counter: usize,
    closure_counter: usize,
    label_counter: usize,
}

impl Default for CodegenContext {
    fn default() -> Self {
        Self::new()
    }
}

impl CodegenContext {
    pub fn new() -> Self {
        Self {
            names: NameTables::new(),
            scope: Scope::new(),
            defer_stack: DeferStack::new(),
            try_finally: TryFinallyStack::new(),
            closures: Vec::new(),
            diagnostics: Vec::new(),
            module_prefix: None,
            loop_depth: 0,
            continue_targets: Vec::new(),
            tmp_counter: 0,
            closure_counter: 0,
            label_counter: 0,
        }
    }

    pub fn for_module(module_prefix: String) -> Self {
        Self { module_prefix: Some(module_prefix), ..Self::new() }
    }

    /// Seed this context's closure-name counter. The program pipeline uses
    /// this to keep closure names globally unique across every function
    /// body it emits — each body gets its own fresh `CodegenContext`, so
    /// without an externally-threaded starting point every body would
    /// otherwise start back at `closure_0`.
    pub fn with_closure_counter(mut self, start: usize) -> Self {
        self.closure_counter = start;
        self
    }

    /// In-place variant of [`Self::with_closure_counter`], for re-syncing a
    /// long-lived context (e.g. the pipeline's main-body context) against
    /// the running global count between statements.
    pub fn set_closure_counter(&mut self, n: usize) {
        self.closure_counter = n;
    }

    /// Current value of the closure-name counter, read back by the pipeline
    /// after emitting a body so the next context can continue from here.
    pub fn closure_counter(&self) -> usize {
        self.closure_counter
    }

    /// A fresh C temporary name, `_tmp0`, `_tmp1`, ... unique within the
    /// function body currently being emitted.
    pub fn fresh_tmp(&mut self) -> String {
        let n = self.tmp_counter;
        self.tmp_counter += 1;
        format!("_tmp{n}")
    }

    /// A fresh top-level C function name for a closure literal encountered
    /// during emission of the current function body.
    pub fn fresh_closure_name(&mut self) -> String {
        let n = self.closure_counter;
        self.closure_counter += 1;
        let prefix = self.module_prefix.as_deref().unwrap_or("_main_");
        format!("{prefix}closure_{n}")
    }

    pub fn resolve_identifier(&self, name: &str) -> NameResolution {
        self.names.resolve(name, self.module_prefix.as_deref())
    }

    /// A fresh, globally-unique C label, e.g. `_for_continue_0`.
    pub fn fresh_label(&mut self, prefix: &str) -> String {
        let n = self.label_counter;
        self.label_counter += 1;
        format!("_{prefix}_{n}")
    }

    pub fn push_continue_target(&mut self, target: Option<String>) {
        self.continue_targets.push(target);
    }

    pub fn pop_continue_target(&mut self) {
        self.continue_targets.pop();
    }

    /// The `goto` label the nearest enclosing loop requires `continue` to
    /// jump to, or `None` if a native C `continue` is correct there.
    pub fn continue_target(&self) -> Option<String> {
        self.continue_targets.last().cloned().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_tmp_counts_up() {
        let mut ctx = CodegenContext::new();
        assert_eq!(ctx.fresh_tmp(), "_tmp0");
        assert_eq!(ctx.fresh_tmp(), "_tmp1");
    }

    #[test]
    fn closure_names_use_module_prefix() {
        let mut ctx = CodegenContext::for_module("_mod1_".to_string());
        assert_eq!(ctx.fresh_closure_name(), "_mod1_closure_0");
    }
}
