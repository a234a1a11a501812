//! Closure literal lowering — the part of the expression emitter (4.G) that
//! turns a `fn(...) { ... }` expression into a heap-allocated closure value.
//!
//! Every function expression encountered during emission is registered as a
//! [`crate::codegen::ClosureRecord`] and given a fresh top-level C function
//! name; the pipeline (component J) later emits each record's actual body in
//! its own fixpoint pass, since a closure's body can itself contain further
//! closures discovered only once it is emitted. This module only emits the
//! *call site* — the environment allocation and the value construction that
//! replaces the `fn` expression at its point of use.

use crate::ast::FunctionExpr;
use crate::codegen::expr::Emitted;
use crate::codegen::freevars::free_vars_of_function_expr;
use crate::codegen::scope::NameResolution;
use crate::codegen::{ClosureRecord, CodegenContext};

pub fn codegen_function_expr(ctx: &mut CodegenContext, func_expr: &FunctionExpr) -> Emitted {
    let captured_vars = free_vars_of_function_expr(func_expr);
    let func_name = ctx.fresh_closure_name();

    ctx.closures.push(ClosureRecord {
        func_name: func_name.clone(),
        captured_vars: captured_vars.clone(),
        shared_env_indices: None,
        func_expr: func_expr.clone(),
        source_module: ctx.module_prefix.clone(),
    });

    if captured_vars.is_empty() {
        let tmp = ctx.fresh_tmp();
        return Emitted {
            prelude: format!(
                "HmlValue {tmp} = hml_val_function((HmlFnPtr){func_name}, NULL);\n"
            ),
            value: tmp,
        };
    }

    let env = ctx.fresh_tmp();
    let mut prelude = format!(
        "HmlClosureEnv *{env} = hml_closure_env_new({});\n",
        captured_vars.len()
    );
    for (i, name) in captured_vars.iter().enumerate() {
        let value = match ctx.resolve_identifier(name) {
            NameResolution::Bare(n)
            | NameResolution::MainPrefixed(n)
            | NameResolution::ModulePrefixed(n)
            | NameResolution::Imported(n) => n,
            NameResolution::Unresolved => format!("{}()", crate::value_kind::ValueKind::Null.ctor_name()),
        };
        prelude.push_str(&format!("hml_closure_env_set({env}, {i}, {value});\n"));
    }
    let tmp = ctx.fresh_tmp();
    prelude.push_str(&format!(
        "HmlValue {tmp} = hml_val_function((HmlFnPtr){func_name}, {env});\n"
    ));
    Emitted { prelude, value: tmp }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn parse_one_function_expr(src: &str) -> FunctionExpr {
        let mut lexer = Lexer::new(src);
        let (tokens, _) = lexer.tokenize();
        let expr = Parser::new(tokens).parse_expr_for_test();
        match expr.kind {
            crate::ast::ExprKind::Function(f) => f,
            _ => panic!("expected a function expression"),
        }
    }

    #[test]
    fn closure_with_no_captures_passes_null_env() {
        let mut ctx = CodegenContext::new();
        let func_expr = parse_one_function_expr("fn(x) { return x; }");
        let e = codegen_function_expr(&mut ctx, &func_expr);
        assert!(e.prelude.contains("hml_val_function"));
        assert!(e.prelude.contains(", NULL)"));
        assert_eq!(ctx.closures.len(), 1);
    }

    #[test]
    fn closure_with_captures_allocates_env() {
        let mut ctx = CodegenContext::new();
        ctx.names.locals.insert("n".to_string());
        let func_expr = parse_one_function_expr("fn() { return n; }");
        let e = codegen_function_expr(&mut ctx, &func_expr);
        assert!(e.prelude.contains("hml_closure_env_new(1)"));
        assert!(e.prelude.contains("hml_closure_env_set"));
        assert_eq!(ctx.closures[0].captured_vars, vec!["n".to_string()]);
    }
}
