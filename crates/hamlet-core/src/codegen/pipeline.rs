//! Program pipeline (component J).
//!
//! Ties components A-K together into one compiler entry point: load and
//! cache every module reachable from the entry file (I), then emit C in the
//! fixed multi-pass order the design calls for — module function bodies,
//! the main file's own named functions and `extern fn` wrappers, the main
//! body itself, and finally a fixpoint pass over whatever closures any of
//! the above discovered along the way (closures can themselves contain
//! further closures, so this keeps going until nothing new turns up) — then
//! assembles everything into the one fixed C section order a real `.c` file
//! needs: forward declarations before any of the bodies that use them.

use crate::ast::{FunctionDecl, Param, Stmt, StmtKind};
use crate::codegen::ffi::emit_extern_wrapper;
use crate::codegen::stmt::{codegen_block, codegen_stmt};
use crate::codegen::{ClosureRecord, CodegenContext};
use crate::diagnostic::Diagnostic;
use crate::module_loader::{CompiledModule, ModuleLoader};
use crate::resolver::ModuleResolver;
use std::path::Path;

pub struct CompiledProgram {
    pub source: String,
    pub diagnostics: Vec<Diagnostic>,
}

const RUNTIME_HEADER: &str = "\
#include <setjmp.h>\n\
#include <signal.h>\n\
#include <sys/socket.h>\n\
#include \"hamlet_runtime.h\"\n";

const SIGNAL_MACROS: &str = "\
#define HML_SIGINT 2\n\
#define HML_SIGTERM 15\n";

pub fn compile(entry_point: &Path, resolver: ModuleResolver) -> Result<CompiledProgram, Vec<Diagnostic>> {
    let canonical_entry =
        std::fs::canonicalize(entry_point).unwrap_or_else(|_| entry_point.to_path_buf());

    let mut loader = ModuleLoader::new(resolver);
    let (modules, mut diagnostics) = loader.compile_entry(&canonical_entry)?;

    let main_module = modules
        .iter()
        .find(|m| m.absolute_path == canonical_entry)
        .expect("entry point is always among its own compiled modules")
        .clone();
    let imported_modules: Vec<CompiledModule> = modules
        .into_iter()
        .filter(|m| m.absolute_path != canonical_entry)
        .collect();

    let mut pending_closures: Vec<ClosureRecord> = Vec::new();
    // Closure names are assigned by a per-context counter (`_tmp`-style),
    // but the pipeline gives each function body its own fresh context — so
    // this single running count is threaded through every context the
    // pipeline creates, keeping closure names globally unique even though
    // the contexts that mint them are not.
    let mut closure_seq: usize = 0;

    let mut module_fwd = String::new();
    let mut module_impls = String::new();
    for module in &imported_modules {
        let emitted = emit_module(module, &mut diagnostics, &mut closure_seq);
        module_fwd.push_str(&emitted.forward_decls);
        module_impls.push_str(&emitted.impls);
        pending_closures.extend(emitted.closures);
    }

    let main_emitted = emit_main_file(&main_module, &imported_modules, &mut diagnostics, &mut closure_seq);
    pending_closures.extend(main_emitted.closures);

    let mut closure_fwd = String::new();
    let mut closure_impls = String::new();
    let mut i = 0;
    while i < pending_closures.len() {
        let record = pending_closures[i].clone();
        let emitted = emit_closure(&record, &mut diagnostics, &mut closure_seq);
        closure_fwd.push_str(&emitted.forward_decls);
        closure_impls.push_str(&emitted.impls);
        pending_closures.extend(emitted.closures);
        i += 1;
    }

    let source = format!(
        "{RUNTIME_HEADER}\n{SIGNAL_MACROS}\n\
         /* FFI globals */\nstatic void *_ffi_lib;\n{}\n\
         /* closure forward declarations */\n{closure_fwd}\n\
         /* module forward declarations */\n{module_fwd}\n\
         /* named function forward declarations */\n{}\n\
         /* closure implementations */\n{closure_impls}\n\
         /* extern fn wrapper implementations */\n{}\n\
         /* module implementations */\n{module_impls}\n\
         /* named function implementations */\n{}\n\
         int main(void) {{\n{}\nreturn 0;\n}}\n",
        main_emitted.extern_ptr_decls,
        main_emitted.named_fn_fwd,
        main_emitted.extern_impls,
        main_emitted.named_fn_impls,
        main_emitted.body,
    );

    Ok(CompiledProgram { source, diagnostics })
}

struct EmittedModule {
    forward_decls: String,
    impls: String,
    closures: Vec<ClosureRecord>,
}

/// Seed a [`crate::codegen::scope::NameTables`] with every top-level
/// let/const/function this set of statements declares, so forward
/// references within the same scope resolve (4.J pre-scan).
fn collect_top_level_names(
    statements: &[Stmt],
) -> (std::collections::HashSet<String>, std::collections::HashSet<String>) {
    let mut vars = std::collections::HashSet::new();
    let mut funcs = std::collections::HashSet::new();
    for stmt in statements {
        let inner = match &stmt.kind {
            StmtKind::Export(inner) => &inner.kind,
            other => other,
        };
        match inner {
            StmtKind::Let { name, .. } | StmtKind::Const { name, .. } => {
                vars.insert(name.clone());
            }
            StmtKind::FunctionDecl(decl) => {
                funcs.insert(decl.name.clone());
            }
            StmtKind::Enum { name, .. } | StmtKind::DefineObject { name, .. } => {
                vars.insert(name.clone());
            }
            _ => {}
        }
    }
    (vars, funcs)
}

fn emit_module(
    module: &CompiledModule,
    diagnostics: &mut Vec<Diagnostic>,
    closure_seq: &mut usize,
) -> EmittedModule {
    let (module_vars, module_funcs) = collect_top_level_names(&module.statements);
    let mut forward_decls = String::new();
    let mut impls = String::new();
    let mut closures = Vec::new();

    for stmt in &module.statements {
        let kind: &StmtKind = match &stmt.kind {
            StmtKind::Export(inner) => &inner.kind,
            other => other,
        };
        match kind {
            StmtKind::FunctionDecl(decl) => {
                let mangled = module
                    .find_export(&decl.name)
                    .map(|e| e.mangled_name.clone())
                    .unwrap_or_else(|| format!("{}fn_{}", module.module_prefix, decl.name));
                let mut ctx = fresh_module_ctx(module, &module_vars, &module_funcs, *closure_seq);
                forward_decls.push_str(&forward_decl_for(&mangled, decl));
                impls.push_str(&emit_function_body(&mut ctx, &mangled, decl));
                *closure_seq = ctx.closure_counter();
                closures.extend(ctx.closures);
                diagnostics.append(&mut ctx.diagnostics);
            }
            StmtKind::Let { name, initializer, .. } => {
                let mangled = format!("{}{name}", module.module_prefix);
                let mut ctx = fresh_module_ctx(module, &module_vars, &module_funcs, *closure_seq);
                let init = match initializer {
                    Some(e) => crate::codegen::expr::codegen_expr(&mut ctx, e),
                    None => crate::codegen::expr::Emitted::literal_null(),
                };
                forward_decls.push_str(&format!("static HmlValue {mangled};\n"));
                impls.push_str(&format!(
                    "static void {mangled}_init(void) {{\n{}{mangled} = {};\n}}\n",
                    init.prelude, init.value
                ));
                *closure_seq = ctx.closure_counter();
                closures.extend(ctx.closures);
                diagnostics.append(&mut ctx.diagnostics);
            }
            StmtKind::Const { name, initializer, .. } => {
                let mangled = format!("{}{name}", module.module_prefix);
                let mut ctx = fresh_module_ctx(module, &module_vars, &module_funcs, *closure_seq);
                let init = crate::codegen::expr::codegen_expr(&mut ctx, initializer);
                forward_decls.push_str(&format!("static HmlValue {mangled};\n"));
                impls.push_str(&format!(
                    "static void {mangled}_init(void) {{\n{}{mangled} = {};\n}}\n",
                    init.prelude, init.value
                ));
                *closure_seq = ctx.closure_counter();
                closures.extend(ctx.closures);
                diagnostics.append(&mut ctx.diagnostics);
            }
            _ => {}
        }
    }

    EmittedModule { forward_decls, impls, closures }
}

fn fresh_module_ctx(
    module: &CompiledModule,
    module_vars: &std::collections::HashSet<String>,
    module_funcs: &std::collections::HashSet<String>,
    closure_seq: usize,
) -> CodegenContext {
    let mut ctx = CodegenContext::for_module(module.module_prefix.clone()).with_closure_counter(closure_seq);
    ctx.names.module_locals.extend(module_vars.iter().cloned());
    ctx.names.module_locals.extend(module_funcs.iter().cloned());
    ctx.names.module_funcs.extend(module_funcs.iter().cloned());
    for import in &module.imports {
        ctx.names.imports.insert(import.local_name.clone(), import.mangled_name());
    }
    for ns in &module.namespace_imports {
        ctx.names.imports.insert(ns.local_name.clone(), format!("/* namespace */ {}", ns.module_prefix));
    }
    ctx
}

fn forward_decl_for(mangled_name: &str, decl: &FunctionDecl) -> String {
    format!(
        "HmlValue {mangled_name}({});\n",
        param_list(&decl.params)
    )
}

fn param_list(params: &[Param]) -> String {
    let mut parts = vec!["HmlClosureEnv *_env".to_string()];
    parts.extend(params.iter().map(|p| format!("HmlValue {}", p.name)));
    parts.join(", ")
}

fn emit_function_body(ctx: &mut CodegenContext, mangled_name: &str, decl: &FunctionDecl) -> String {
    ctx.scope.push_scope();
    for p in &decl.params {
        ctx.scope.add(&p.name);
        ctx.names.locals.insert(p.name.clone());
    }
    let body = codegen_block(ctx, &decl.body);
    ctx.scope.pop_scope();
    format!(
        "HmlValue {mangled_name}({}) {{\n(void)_env;\n{body}return {}();\n}}\n",
        param_list(&decl.params),
        crate::value_kind::ValueKind::Null.ctor_name()
    )
}

struct EmittedMain {
    named_fn_fwd: String,
    named_fn_impls: String,
    extern_ptr_decls: String,
    extern_impls: String,
    body: String,
    closures: Vec<ClosureRecord>,
}

fn emit_main_file(
    main_module: &CompiledModule,
    imported_modules: &[CompiledModule],
    diagnostics: &mut Vec<Diagnostic>,
    closure_seq: &mut usize,
) -> EmittedMain {
    let (main_vars, main_funcs) = collect_top_level_names(&main_module.statements);
    let _ = imported_modules;

    let mut named_fn_fwd = String::new();
    let mut named_fn_impls = String::new();
    let mut extern_ptr_decls = String::new();
    let mut extern_impls = String::new();
    let mut closures = Vec::new();
    let mut body = String::new();

    let fresh_main_ctx = |main_vars: &std::collections::HashSet<String>,
                          main_funcs: &std::collections::HashSet<String>,
                          seq: usize| {
        let mut ctx = CodegenContext::new().with_closure_counter(seq);
        ctx.names.main_vars.extend(main_vars.iter().cloned());
        ctx.names.main_funcs.extend(main_funcs.iter().cloned());
        for import in &main_module.imports {
            ctx.names.imports.insert(import.local_name.clone(), import.mangled_name());
        }
        for ns in &main_module.namespace_imports {
            ctx.names
                .imports
                .insert(ns.local_name.clone(), format!("/* namespace */ {}", ns.module_prefix));
        }
        ctx
    };

    // One long-lived context for statements emitted directly into `main`'s
    // own body, re-synced against `closure_seq` around every use so its
    // `_tmp`/scope state survives across statements while closure names stay
    // globally unique against the other contexts this function also spins up.
    let mut body_ctx = fresh_main_ctx(&main_vars, &main_funcs, *closure_seq);

    for stmt in &main_module.statements {
        let kind: &StmtKind = match &stmt.kind {
            StmtKind::Export(inner) => &inner.kind,
            other => other,
        };
        match kind {
            StmtKind::FunctionDecl(decl) => {
                let mangled = format!("_main_fn_{}", decl.name);
                let mut ctx = fresh_main_ctx(&main_vars, &main_funcs, *closure_seq);
                named_fn_fwd.push_str(&forward_decl_for(&mangled, decl));
                named_fn_impls.push_str(&emit_function_body(&mut ctx, &mangled, decl));
                *closure_seq = ctx.closure_counter();
                body_ctx.set_closure_counter(*closure_seq);
                closures.extend(ctx.closures);
                diagnostics.append(&mut ctx.diagnostics);
            }
            StmtKind::ExternFn { name, params, return_type } => {
                extern_ptr_decls.push_str(&format!("static void *_ffi_ptr_{name};\n"));
                named_fn_fwd.push_str(&format!("HmlValue hml_fn_{name}({});\n", param_list(params)));
                extern_impls.push_str(&emit_extern_wrapper(name, params, return_type));
            }
            // Top-level `let`/`const` in the main file are promoted to
            // globals (`_main_<name>`) rather than locals of `main`, so that
            // closures and named functions declared in the same file —
            // which have no lexical access to `main`'s own stack frame — can
            // still reach them through the ordinary `MainPrefixed`
            // resolution path.
            StmtKind::Let { name, initializer, .. } => {
                let mangled = format!("_main_{name}");
                let mut ctx = fresh_main_ctx(&main_vars, &main_funcs, *closure_seq);
                let init = match initializer {
                    Some(e) => crate::codegen::expr::codegen_expr(&mut ctx, e),
                    None => crate::codegen::expr::Emitted::literal_null(),
                };
                named_fn_fwd.push_str(&format!("static HmlValue {mangled};\n"));
                named_fn_impls.push_str(&format!(
                    "static void {mangled}_init(void) {{\n{}{mangled} = {};\n}}\n",
                    init.prelude, init.value
                ));
                body.push_str(&format!("{mangled}_init();\n"));
                *closure_seq = ctx.closure_counter();
                body_ctx.set_closure_counter(*closure_seq);
                closures.extend(ctx.closures);
                diagnostics.append(&mut ctx.diagnostics);
            }
            StmtKind::Const { name, initializer, .. } => {
                let mangled = format!("_main_{name}");
                let mut ctx = fresh_main_ctx(&main_vars, &main_funcs, *closure_seq);
                let init = crate::codegen::expr::codegen_expr(&mut ctx, initializer);
                named_fn_fwd.push_str(&format!("static HmlValue {mangled};\n"));
                named_fn_impls.push_str(&format!(
                    "static void {mangled}_init(void) {{\n{}{mangled} = {};\n}}\n",
                    init.prelude, init.value
                ));
                body.push_str(&format!("{mangled}_init();\n"));
                *closure_seq = ctx.closure_counter();
                body_ctx.set_closure_counter(*closure_seq);
                closures.extend(ctx.closures);
                diagnostics.append(&mut ctx.diagnostics);
            }
            StmtKind::Import(_) => {}
            _ => {
                body_ctx.set_closure_counter(*closure_seq);
                body.push_str(&codegen_stmt(&mut body_ctx, stmt));
                *closure_seq = body_ctx.closure_counter();
            }
        }
    }
    closures.extend(std::mem::take(&mut body_ctx.closures));
    diagnostics.append(&mut body_ctx.diagnostics);

    EmittedMain {
        named_fn_fwd,
        named_fn_impls,
        extern_ptr_decls,
        extern_impls,
        body,
        closures,
    }
}

struct EmittedClosure {
    forward_decls: String,
    impls: String,
    closures: Vec<ClosureRecord>,
}

fn emit_closure(
    record: &ClosureRecord,
    diagnostics: &mut Vec<Diagnostic>,
    closure_seq: &mut usize,
) -> EmittedClosure {
    let mut ctx = match &record.source_module {
        Some(prefix) => CodegenContext::for_module(prefix.clone()),
        None => CodegenContext::new(),
    }
    .with_closure_counter(*closure_seq);
    ctx.scope.push_scope();

    // Captured values are read back out of the closure's own environment at
    // the top of its body (`HmlValue name = hml_closure_env_get(_env, i)`).
    for name in &record.captured_vars {
        ctx.scope.add(name);
        ctx.names.locals.insert(name.clone());
    }
    for p in &record.func_expr.params {
        ctx.scope.add(&p.name);
        ctx.names.locals.insert(p.name.clone());
    }
    if let Some(name) = &record.func_expr.name {
        // Self-reference: the closure's own name resolves to a direct
        // recursive call using its own mangled top-level name.
        ctx.names.locals.insert(name.clone());
        ctx.names.imports.insert(name.clone(), record.func_name.clone());
    }

    let mut capture_unpack = String::new();
    for (i, name) in record.captured_vars.iter().enumerate() {
        capture_unpack.push_str(&format!("HmlValue {name} = hml_closure_env_get(_env, {i});\n"));
    }

    let body_code = codegen_block(&mut ctx, &record.func_expr.body);
    ctx.scope.pop_scope();
    *closure_seq = ctx.closure_counter();
    diagnostics.append(&mut ctx.diagnostics);

    let params = param_list(&record.func_expr.params);
    let fwd = format!("HmlValue {}({params});\n", record.func_name);
    let imp = format!(
        "HmlValue {}({params}) {{\n{capture_unpack}{body_code}return {}();\n}}\n",
        record.func_name,
        crate::value_kind::ValueKind::Null.ctor_name()
    );

    EmittedClosure { forward_decls: fwd, impls: imp, closures: ctx.closures }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::ModuleResolver;
    use tempfile::tempdir;

    fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        std::fs::write(dir.join(name), content).unwrap();
        dir.join(name)
    }

    #[test]
    fn compiles_entry_with_no_imports() {
        let dir = tempdir().unwrap();
        let main = write(dir.path(), "main.hml", "let x = 1;\nprint(x);\n");
        let program = compile(&main, ModuleResolver::new(dir.path().to_path_buf())).unwrap();
        assert!(program.source.contains("int main(void)"));
        assert!(program.source.contains("HmlValue _main_x"));
    }

    #[test]
    fn compiles_entry_with_imported_module_function() {
        let dir = tempdir().unwrap();
        write(dir.path(), "math.hml", "export fn add(a, b) { return a + b; }");
        let main = write(
            dir.path(),
            "main.hml",
            r#"import { add } from "math"; let r = add(1, 2);"#,
        );
        let program = compile(&main, ModuleResolver::new(dir.path().to_path_buf())).unwrap();
        assert!(program.source.contains("_mod1_fn_add"));
        assert!(program.source.contains("hml_op_add"));
    }

    #[test]
    fn calling_a_sibling_function_in_the_same_file_uses_the_fn_mangled_name() {
        let dir = tempdir().unwrap();
        let main = write(
            dir.path(),
            "main.hml",
            "fn helper(x) { return x; }\nlet y = helper(1);\n",
        );
        let program = compile(&main, ModuleResolver::new(dir.path().to_path_buf())).unwrap();
        assert!(program.source.contains("HmlValue _main_fn_helper(HmlClosureEnv *_env"));
        assert!(program.source.contains("_main_fn_helper(NULL, "));
        assert!(!program.source.contains("_main_helper("));
    }

    #[test]
    fn calling_a_sibling_function_in_the_same_module_uses_the_fn_mangled_name() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "math.hml",
            "fn helper(x) { return x; }\nexport fn add_one(x) { return helper(x); }",
        );
        let main = write(
            dir.path(),
            "main.hml",
            r#"import { add_one } from "math"; let r = add_one(1);"#,
        );
        let program = compile(&main, ModuleResolver::new(dir.path().to_path_buf())).unwrap();
        assert!(program.source.contains("_mod1_fn_helper(NULL, "));
        assert!(!program.source.contains("_mod1_helper("));
    }

    #[test]
    fn closures_are_emitted_via_fixpoint_pass() {
        let dir = tempdir().unwrap();
        let main = write(
            dir.path(),
            "main.hml",
            "let make = fn() { let n = 0; return fn() { return n; }; };",
        );
        let program = compile(&main, ModuleResolver::new(dir.path().to_path_buf())).unwrap();
        assert!(program.source.contains("_main_closure_0"));
        assert!(program.source.contains("_main_closure_1"));
    }
}
