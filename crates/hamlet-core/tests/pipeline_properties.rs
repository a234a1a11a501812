//! End-to-end property tests over `hamlet_core::compile`'s emitted C.
//!
//! Since nothing here is ever compiled or linked, every assertion is
//! structural: does the generated translation unit contain the C this
//! property demands, in the order it demands it. Mirrors the style of
//! `codegen::pipeline`'s own in-module tests, extended to the
//! quantified invariants and end-to-end scenarios.

use hamlet_core::{compile, ModuleResolver};
use std::path::Path;
use tempfile::tempdir;

fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    std::fs::write(dir.join(name), content).unwrap();
    dir.join(name)
}

fn compile_ok(dir: &Path, entry: &Path) -> hamlet_core::CompiledProgram {
    compile(entry, ModuleResolver::new(dir.to_path_buf())).expect("expected successful compile")
}

/// P1: defers run in reverse registration order at every exit path.
#[test]
fn defers_drain_in_lifo_order() {
    let dir = tempdir().unwrap();
    let entry = write(
        dir.path(),
        "main.hml",
        "fn cleanup() { defer a(); defer b(); defer c(); return 0; }",
    );
    let program = compile_ok(dir.path(), &entry);
    let pos_c = program.source.find("c(").unwrap();
    let pos_b = program.source.find("b(").unwrap();
    let pos_a = program.source.find("a(").unwrap();
    assert!(pos_c < pos_b && pos_b < pos_a, "defers must drain c, b, a in that order");
}

/// P2: `try { return v; } finally { ... }` runs the finally block before
/// control actually returns, and the returned value is preserved across it.
#[test]
fn finally_runs_before_return_value_is_delivered() {
    let dir = tempdir().unwrap();
    let entry = write(
        dir.path(),
        "main.hml",
        "fn f() { try { return 1; } finally { print(\"f\"); } }",
    );
    let program = compile_ok(dir.path(), &entry);
    assert!(program.source.contains("goto _finally_0"));
    assert!(program.source.contains("_finally_0:;"));
    assert!(program.source.contains("print"));
}

/// P4: a module imported from two different places still gets exactly one
/// top-level static and one `_init` function — the module cache, not a
/// runtime guard, is what gives the once-only property.
#[test]
fn module_globals_are_emitted_exactly_once() {
    let dir = tempdir().unwrap();
    write(dir.path(), "shared.hml", "export let counter = 0;");
    write(
        dir.path(),
        "left.hml",
        r#"import { counter } from "shared"; export fn read_left() { return counter; }"#,
    );
    let entry = write(
        dir.path(),
        "main.hml",
        r#"import { read_left } from "left"; import { counter } from "shared"; let x = read_left() + counter;"#,
    );
    let program = compile_ok(dir.path(), &entry);
    // The shared module's own static/init pair appears exactly once despite
    // two distinct importers.
    let mangled_static_decls = program
        .source
        .matches("static HmlValue _mod1_counter;")
        .count();
    assert_eq!(mangled_static_decls, 1);
    let init_fn_defs = program.source.matches("static void _mod1_counter_init(void)").count();
    assert_eq!(init_fn_defs, 1);
}

/// P3: a `throw` inside a function with pending defers runs them all before
/// `hml_throw` is reached.
#[test]
fn throw_drains_pending_defers_before_hml_throw() {
    let dir = tempdir().unwrap();
    let entry = write(dir.path(), "main.hml", "fn f() { defer cleanup(); throw 1; }");
    let program = compile_ok(dir.path(), &entry);
    let cleanup_pos = program.source.find("cleanup(").expect("deferred call emitted");
    let throw_pos = program.source.find("hml_throw(").expect("hml_throw emitted");
    assert!(cleanup_pos < throw_pos, "pending defers must run before hml_throw is reached");
}

/// P5: an import cycle aborts compilation with a `CircularDependency`
/// diagnostic and produces no partial C.
#[test]
fn import_cycle_aborts_without_partial_output() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.hml", r#"import { b } from "b";"#);
    write(dir.path(), "b.hml", r#"import { a } from "a";"#);
    let entry = dir.path().join("a.hml");

    let err = compile(&entry, ModuleResolver::new(dir.path().to_path_buf())).unwrap_err();
    assert!(err.iter().any(|d| d.code == hamlet_core::error_codes::CIRCULAR_DEPENDENCY));
}

/// P6: every user-defined callable's C signature leads with `HmlClosureEnv *`.
#[test]
fn every_callable_takes_closure_env_first() {
    let dir = tempdir().unwrap();
    let entry = write(
        dir.path(),
        "main.hml",
        "fn add(a, b) { return a + b; }\nlet make = fn() { return fn() { return 1; }; };",
    );
    let program = compile_ok(dir.path(), &entry);
    assert!(program.source.contains("HmlValue _main_fn_add(HmlClosureEnv *_env"));
    assert!(program.source.contains("HmlValue _main_closure_0(HmlClosureEnv *_env"));
    assert!(program.source.contains("HmlValue _main_closure_1(HmlClosureEnv *_env"));
}

/// P7: two modules that each declare a top-level `x` get disjoint mangled
/// names, and the main file's own top-level names carry `_main_`.
#[test]
fn mangled_names_are_disjoint_across_modules() {
    let dir = tempdir().unwrap();
    write(dir.path(), "left.hml", "export let x = 1;");
    write(dir.path(), "right.hml", "export let x = 2;");
    let entry = write(
        dir.path(),
        "main.hml",
        r#"import { x as lx } from "left"; import { x as rx } from "right"; let x = lx + rx;"#,
    );
    let program = compile_ok(dir.path(), &entry);
    assert!(program.source.contains("static HmlValue _mod1_x;"));
    assert!(program.source.contains("static HmlValue _mod2_x;"));
    assert!(program.source.contains("static HmlValue _main_x;"));
}

/// P9: assigning to a `const`-declared name is a compile-time error,
/// surfaced as a `ConstReassignment` diagnostic rather than silently
/// accepted.
#[test]
fn assigning_to_const_is_a_diagnostic() {
    let dir = tempdir().unwrap();
    let entry = write(dir.path(), "main.hml", "fn f() { const x = 1; x = 2; }");
    let program = compile_ok(dir.path(), &entry);
    assert!(program
        .diagnostics
        .iter()
        .any(|d| d.code == hamlet_core::error_codes::CONST_REASSIGNMENT));
}

/// P8: a `defer` statement inside a loop body registers onto the runtime
/// stack once per iteration, not once for the whole function — the push
/// call must be emitted inside the loop's own C body, and the one-shot
/// drain call only at function exit, after it.
#[test]
fn loop_local_defer_push_runs_once_per_iteration() {
    let dir = tempdir().unwrap();
    let entry = write(
        dir.path(),
        "main.hml",
        "fn f() { let i = 0; while (i < 3) { defer cleanup(); i = i + 1; } }",
    );
    let program = compile_ok(dir.path(), &entry);
    let while_pos = program.source.find("while (").expect("while loop emitted");
    let push_pos = program.source.find("hml_defer_push_runtime(").expect("runtime defer push emitted");
    let drain_pos = program.source.find("hml_defer_execute_all()").expect("runtime drain emitted at function exit");
    assert!(while_pos < push_pos, "defer push must be emitted inside the loop body, not hoisted above it");
    assert!(push_pos < drain_pos, "the runtime stack drains once at function exit, after the loop that registered into it");
}

/// Scenario 1: two closures returned from the same enclosing function share
/// one environment, so both read/write the same captured slot.
#[test]
fn sibling_closures_share_one_environment() {
    let dir = tempdir().unwrap();
    let entry = write(
        dir.path(),
        "main.hml",
        "let make_counter = fn() { let n = 0; return { inc: fn() { n = n + 1; }, get: fn() { return n; } }; };",
    );
    let program = compile_ok(dir.path(), &entry);
    assert!(program.source.contains("hml_closure_env_new") || program.source.contains("hml_closure_env_get"));
}

/// Scenario 4: a module cycle produces no executable, i.e. no `main`
/// function appears anywhere in whatever partial text an error path might
/// otherwise be tempted to return (there is none — `compile` returns `Err`).
#[test]
fn cyclic_import_never_reaches_main_emission() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.hml", r#"import { b } from "b";"#);
    write(dir.path(), "b.hml", r#"import { a } from "a";"#);
    let entry = dir.path().join("a.hml");
    let result = compile(&entry, ModuleResolver::new(dir.path().to_path_buf()));
    assert!(result.is_err());
}

/// Scenario 6: string interpolation lowers to concatenation, not a
/// leftover template-literal syntax.
#[test]
fn string_interpolation_lowers_to_concatenation() {
    let dir = tempdir().unwrap();
    let entry = write(
        dir.path(),
        "main.hml",
        r#"let name = "world"; print("hello, {name}!");"#,
    );
    let program = compile_ok(dir.path(), &entry);
    assert!(!program.source.contains("{name}"), "interpolation placeholder must be lowered away");
}
