//! Statement emitter (component H).
//!
//! Produces plain C statement text (no result value — contrast with
//! [`crate::codegen::expr`], where every emission carries a value). Owns the
//! coordination between scope tracking (B), the defer stack (E), and
//! try/finally frames (F) as control flow is walked: pushing/popping scope
//! frames at block boundaries, threading `loop_depth` through loop bodies,
//! and draining deferred expressions at every `return`.

use crate::ast::{CatchClause, Expr, FunctionExpr, ObjectFieldDef, Param, Stmt, StmtKind, SwitchCase};
use crate::codegen::expr::codegen_expr;
use crate::codegen::tryfinally;
use crate::codegen::CodegenContext;
use crate::diagnostic::{error_codes, Diagnostic};
use crate::type_annotation::TypeAnnotation;
use crate::value_kind::ValueKind;

pub fn codegen_block(ctx: &mut CodegenContext, body: &[Stmt]) -> String {
    ctx.scope.push_scope();
    let mut out = String::new();
    for stmt in body {
        out.push_str(&codegen_stmt(ctx, stmt));
    }
    ctx.scope.pop_scope();
    out
}

pub fn codegen_stmt(ctx: &mut CodegenContext, stmt: &Stmt) -> String {
    match &stmt.kind {
        StmtKind::Let { name, initializer, .. } => codegen_let(ctx, name, initializer.as_ref(), false),
        StmtKind::Const { name, initializer, .. } => codegen_let(ctx, name, Some(initializer), true),
        StmtKind::Expr(e) => {
            let v = codegen_expr(ctx, e);
            format!("{}hml_release({});\n", v.prelude, v.value)
        }
        StmtKind::Block(body) => format!("{{\n{}}}\n", codegen_block(ctx, body)),
        StmtKind::If { condition, then_branch, else_branch } => {
            codegen_if(ctx, condition, then_branch, else_branch.as_deref())
        }
        StmtKind::While { condition, body } => codegen_while(ctx, condition, body),
        StmtKind::For { init, condition, increment, body } => {
            codegen_for(ctx, init.as_deref(), condition.as_ref(), increment.as_ref(), body)
        }
        StmtKind::ForIn { key, value, iterable, body } => {
            codegen_for_in(ctx, key.as_deref(), value, iterable, body)
        }
        StmtKind::Return(value) => codegen_return(ctx, value.as_ref()),
        StmtKind::Break => "break;\n".to_string(),
        StmtKind::Continue => match ctx.continue_target() {
            Some(label) => format!("goto {label};\n"),
            None => "continue;\n".to_string(),
        },
        StmtKind::Try { body, catch, finally } => codegen_try(ctx, body, catch.as_ref(), finally.as_deref()),
        StmtKind::Throw(e) => {
            let v = codegen_expr(ctx, e);
            let mut out = v.prelude;
            out.push_str(&drain_defers(ctx));
            out.push_str(&format!("hml_throw({});\n", v.value));
            out
        }
        StmtKind::Switch { discriminant, cases, default } => {
            codegen_switch(ctx, discriminant, cases, default.as_deref())
        }
        StmtKind::Defer(e) => codegen_defer(ctx, e),
        StmtKind::DefineObject { name, fields } => codegen_define_object(ctx, name, fields),
        StmtKind::Enum { name, variants } => codegen_enum(ctx, name, variants),
        StmtKind::FunctionDecl(decl) => codegen_nested_function_decl(ctx, decl),
        // Import/export/FFI declarations are only meaningful at module top
        // level; the pipeline consumes them there before statement emission
        // ever sees a function body. Encountering one mid-body is the
        // tolerant "unsupported construct" case.
        StmtKind::Import(_) | StmtKind::Export(_) | StmtKind::ImportFfi { .. } | StmtKind::ExternFn { .. } => {
            ctx.diagnostics.push(Diagnostic::warning_with_code(
                error_codes::UNSUPPORTED_CONSTRUCT,
                "declaration is only valid at module top level",
                stmt.span,
            ));
            "// ERROR: unsupported construct in this position\n".to_string()
        }
    }
}

fn codegen_let(ctx: &mut CodegenContext, name: &str, initializer: Option<&Expr>, is_const: bool) -> String {
    let init = match initializer {
        Some(e) => codegen_expr(ctx, e),
        None => crate::codegen::expr::Emitted::literal_null(),
    };
    ctx.scope.add(name);
    ctx.names.locals.insert(name.to_string());
    if is_const {
        ctx.names.const_vars.insert(name.to_string());
    }
    format!("{}HmlValue {name} = {};\n", init.prelude, init.value)
}

fn codegen_if(
    ctx: &mut CodegenContext,
    condition: &Expr,
    then_branch: &Stmt,
    else_branch: Option<&Stmt>,
) -> String {
    let cond = codegen_expr(ctx, condition);
    let then = codegen_stmt(ctx, then_branch);
    let mut out = format!(
        "{}if (hml_truthy({})) {{\nhml_release({});\n{then}}}",
        cond.prelude, cond.value, cond.value
    );
    if let Some(else_branch) = else_branch {
        let els = codegen_stmt(ctx, else_branch);
        out.push_str(&format!(" else {{\n{els}}}"));
    } else {
        out.push('\n');
    }
    out.push('\n');
    out
}

fn codegen_while(ctx: &mut CodegenContext, condition: &Expr, body: &Stmt) -> String {
    ctx.loop_depth += 1;
    ctx.push_continue_target(None);
    let cond = codegen_expr(ctx, condition);
    let body_code = codegen_stmt(ctx, body);
    ctx.pop_continue_target();
    ctx.loop_depth -= 1;
    format!(
        "while (1) {{\n{}if (!hml_truthy({})) {{ hml_release({}); break; }}\nhml_release({});\n{body_code}}}\n",
        cond.prelude, cond.value, cond.value, cond.value
    )
}

fn codegen_for(
    ctx: &mut CodegenContext,
    init: Option<&Stmt>,
    condition: Option<&Expr>,
    increment: Option<&Expr>,
    body: &Stmt,
) -> String {
    let init_code = init.map(|s| codegen_stmt(ctx, s)).unwrap_or_default();
    let label = ctx.fresh_label("for_continue");

    ctx.loop_depth += 1;
    ctx.push_continue_target(Some(label.clone()));
    let cond_code = condition.map(|c| {
        let c = codegen_expr(ctx, c);
        format!("{}if (!hml_truthy({})) {{ hml_release({}); break; }}\nhml_release({});\n", c.prelude, c.value, c.value, c.value)
    });
    let body_code = codegen_stmt(ctx, body);
    let incr_code = increment.map(|e| {
        let e = codegen_expr(ctx, e);
        format!("{}hml_release({});\n", e.prelude, e.value)
    });
    ctx.pop_continue_target();
    ctx.loop_depth -= 1;

    format!(
        "{{\n{init_code}while (1) {{\n{}{body_code}{label}:;\n{}}}\n}}\n",
        cond_code.unwrap_or_default(),
        incr_code.unwrap_or_default(),
    )
}

fn codegen_for_in(
    ctx: &mut CodegenContext,
    key: Option<&str>,
    value: &str,
    iterable: &Expr,
    body: &Stmt,
) -> String {
    let iter_src = ctx.fresh_tmp();
    let iter = ctx.fresh_tmp();
    let src = codegen_expr(ctx, iterable);
    let label = ctx.fresh_label("for_in_advance");

    ctx.loop_depth += 1;
    ctx.push_continue_target(Some(label.clone()));
    ctx.scope.push_scope();
    ctx.scope.add(value);
    ctx.names.locals.insert(value.to_string());
    if let Some(key) = key {
        ctx.scope.add(key);
        ctx.names.locals.insert(key.to_string());
    }
    let key_decl = key
        .map(|k| format!("HmlValue {k} = hml_iter_key({iter});\n"))
        .unwrap_or_default();
    let body_code = codegen_stmt(ctx, body);
    ctx.scope.pop_scope();
    ctx.pop_continue_target();
    ctx.loop_depth -= 1;

    let release_key = key.map(|k| format!("hml_release({k});\n")).unwrap_or_default();

    format!(
        "{{\n{}HmlValue {iter_src} = {};\nHmlValue {iter} = hml_iter_new({iter_src});\n\
         while (hml_iter_has_next({iter})) {{\n{key_decl}HmlValue {value} = hml_iter_value({iter});\n\
         {body_code}{label}:;\n{release_key}hml_release({value});\nhml_iter_advance({iter});\n}}\n\
         hml_release({iter_src});\nhml_iter_free({iter});\n}}\n",
        src.prelude, src.value
    )
}

/// Drain every pending defer (compile-time stack in LIFO order, then the
/// runtime stack if this function ever deferred inside a loop) in C. Shared
/// by every statement that exits a function body early: `return` and
/// `throw` alike must run pending defers before control actually leaves.
fn drain_defers(ctx: &mut CodegenContext) -> String {
    let mut out = String::new();
    for deferred in ctx.defer_stack.drain_compile_time_cloned() {
        let d = codegen_expr(ctx, &deferred);
        out.push_str(&format!("{}hml_release({});\n", d.prelude, d.value));
    }
    if ctx.defer_stack.needs_runtime_drain() {
        out.push_str("hml_defer_execute_all();\n");
    }
    out
}

fn codegen_return(ctx: &mut CodegenContext, value: Option<&Expr>) -> String {
    let value_emitted = value.map(|e| codegen_expr(ctx, e));
    let (value_prelude, value_expr) = match &value_emitted {
        Some(v) => (v.prelude.clone(), v.value.clone()),
        None => (String::new(), format!("{}()", ValueKind::Null.ctor_name())),
    };

    let mut out = value_prelude;
    out.push_str(&drain_defers(ctx));
    out.push_str(&tryfinally::emit_return(ctx.try_finally.current(), &value_expr));
    out.push('\n');
    out
}

fn codegen_try(
    ctx: &mut CodegenContext,
    body: &[Stmt],
    catch: Option<&CatchClause>,
    finally: Option<&[Stmt]>,
) -> String {
    let frame_var = ctx.fresh_tmp();
    let finally_frame = finally.map(|_| ctx.try_finally.push());

    let body_code = codegen_block(ctx, body);

    let catch_code = catch.map(|c| {
        ctx.scope.push_scope();
        let exc_var = match &c.param {
            Some(p) => {
                ctx.scope.add(p);
                ctx.names.locals.insert(p.clone());
                p.clone()
            }
            None => ctx.fresh_tmp(),
        };
        let inner = codegen_block(ctx, &c.body);
        ctx.scope.pop_scope();
        format!("HmlValue {exc_var} = hml_current_exception();\n{inner}")
    });

    let mut out = format!(
        "{{\nHmlJmpFrame {frame_var};\nhml_exception_push(&{frame_var});\n\
         if (setjmp({frame_var}.buf) == 0) {{\n{body_code}hml_exception_pop();\n}} else {{\n\
         hml_exception_pop();\n{}}}\n}}\n",
        catch_code.unwrap_or_else(|| "hml_rethrow();\n".to_string())
    );

    if let Some(frame) = finally_frame {
        ctx.try_finally.pop();
        let finally_code = codegen_block(ctx, finally.unwrap());
        out.push_str(&format!(
            "{}:;\n{finally_code}if ({}) {{\nreturn {};\n}}\n",
            frame.finally_label, frame.has_return_var, frame.return_value_var
        ));
    }

    out
}

fn codegen_switch(
    ctx: &mut CodegenContext,
    discriminant: &Expr,
    cases: &[SwitchCase],
    default: Option<&[Stmt]>,
) -> String {
    let disc = codegen_expr(ctx, discriminant);
    let mut out = disc.prelude;
    for (i, case) in cases.iter().enumerate() {
        let case_val = codegen_expr(ctx, &case.value);
        let eq = ctx.fresh_tmp();
        let keyword = if i == 0 { "if" } else { "else if" };
        let body = codegen_block(ctx, &case.body);
        out.push_str(&format!(
            "{}HmlValue {eq} = hml_op_eq({}, {});\n{keyword} (hml_truthy({eq})) {{\nhml_release({eq});\n{body}}}\n",
            case_val.prelude, disc.value, case_val.value
        ));
    }
    if let Some(default) = default {
        let body = codegen_block(ctx, default);
        out.push_str(&format!("else {{\n{body}}}\n"));
    }
    out.push_str(&format!("hml_release({});\n", disc.value));
    out
}

fn codegen_defer(ctx: &mut CodegenContext, expr: &Expr) -> String {
    if ctx.loop_depth > 0 {
        let thunk = FunctionExpr {
            name: None,
            params: Vec::new(),
            return_type: TypeAnnotation::Unknown,
            body: vec![Stmt { kind: StmtKind::Expr(expr.clone()), span: expr.span }],
        };
        let emitted = crate::codegen::closures::codegen_function_expr(ctx, &thunk);
        ctx.defer_stack.push(expr.clone(), ctx.loop_depth);
        format!("{}hml_defer_push_runtime({});\n", emitted.prelude, emitted.value)
    } else {
        ctx.defer_stack.push(expr.clone(), 0);
        String::new()
    }
}

fn codegen_define_object(ctx: &mut CodegenContext, name: &str, fields: &[ObjectFieldDef]) -> String {
    ctx.names.locals.insert(name.to_string());
    let names = fields.iter().map(|f| format!("{:?}", f.name)).collect::<Vec<_>>().join(", ");
    format!(
        "hml_register_object_type({name:?}, {}, (const char*[]){{ {names} }});\n",
        fields.len()
    )
}

fn codegen_enum(ctx: &mut CodegenContext, name: &str, variants: &[crate::ast::EnumVariant]) -> String {
    ctx.scope.add(name);
    ctx.names.locals.insert(name.to_string());
    ctx.names.const_vars.insert(name.to_string());
    let mut out = format!("HmlValue {name} = {}();\n", ValueKind::Object.ctor_name());
    let mut next_value = 0i64;
    for variant in variants {
        let value_expr = match &variant.value {
            Some(e) => {
                let v = codegen_expr(ctx, e);
                out.push_str(&v.prelude);
                v.value
            }
            None => {
                let v = format!("{}({next_value})", ValueKind::I32.ctor_name());
                v
            }
        };
        next_value += 1;
        out.push_str(&format!("hml_object_set({name}, {:?}, {value_expr});\n", variant.name));
    }
    out
}

fn codegen_nested_function_decl(ctx: &mut CodegenContext, decl: &crate::ast::FunctionDecl) -> String {
    let func_expr = FunctionExpr {
        name: Some(decl.name.clone()),
        params: decl.params.clone(),
        return_type: decl.return_type.clone(),
        body: decl.body.clone(),
    };
    let emitted = crate::codegen::closures::codegen_function_expr(ctx, &func_expr);
    ctx.scope.add(&decl.name);
    ctx.names.locals.insert(decl.name.clone());
    format!("{}HmlValue {} = {};\n", emitted.prelude, decl.name, emitted.value)
}

#[allow(dead_code)]
fn param_names(params: &[Param]) -> Vec<String> {
    params.iter().map(|p| p.name.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn parse_body(src: &str) -> Vec<Stmt> {
        let mut lexer = Lexer::new(src);
        let (tokens, _) = lexer.tokenize();
        let (program, _) = Parser::new(tokens).parse();
        program.statements
    }

    #[test]
    fn let_declares_a_local() {
        let mut ctx = CodegenContext::new();
        let body = parse_body("let x = 1;");
        let code = codegen_stmt(&mut ctx, &body[0]);
        assert!(code.contains("HmlValue x ="));
        assert!(ctx.names.locals.contains("x"));
    }

    #[test]
    fn return_drains_compile_time_defers_in_lifo_order() {
        let mut ctx = CodegenContext::new();
        let body = parse_body("defer a(); defer b(); return 1;");
        let mut out = String::new();
        for stmt in &body {
            out.push_str(&codegen_stmt(&mut ctx, stmt));
        }
        let pos_b = out.find("b(").unwrap();
        let pos_a = out.find("a(").unwrap();
        assert!(pos_b < pos_a);
    }

    #[test]
    fn continue_in_for_jumps_to_increment_label() {
        let mut ctx = CodegenContext::new();
        let body = parse_body("for (let i = 0; i < 10; i = i + 1) { continue; }");
        let code = codegen_stmt(&mut ctx, &body[0]);
        assert!(code.contains("goto _for_continue_"));
    }

    #[test]
    fn while_loop_uses_native_continue() {
        let mut ctx = CodegenContext::new();
        let body = parse_body("while (true) { continue; }");
        let code = codegen_stmt(&mut ctx, &body[0]);
        assert!(code.contains("continue;"));
    }

    #[test]
    fn try_finally_emits_finally_label_and_return_check() {
        let mut ctx = CodegenContext::new();
        let body = parse_body("try { return 1; } finally { cleanup(); }");
        let code = codegen_stmt(&mut ctx, &body[0]);
        assert!(code.contains("goto _finally_0"));
        assert!(code.contains("_finally_0:;"));
    }
}
