//! Shared-env planner (component D).
//!
//! For each function body about to be emitted, a pre-pass finds every
//! direct-child function expression and unions their free variables into
//! one shared environment owned by the enclosing function. Without sharing,
//! N sibling closures that each capture the same K variables would allocate
//! N separate environments; one shared environment gives O(K) allocation and
//! lets the closures observe each other's mutations naturally.

use crate::ast::{Expr, ExprKind, FunctionExpr, Stmt, StmtKind};
use crate::codegen::freevars::free_vars_of_function_expr;

/// Environment shared by every direct-child closure of one enclosing
/// function. `vars` is the ordered, deduped union of their free variables;
/// `capacity` is `vars.len()` (kept distinct per the data model so the
/// runtime struct can grow independently of the planning-time vector).
#[derive(Debug, Clone)]
pub struct SharedEnv {
    pub name: String,
    pub vars: Vec<String>,
    pub capacity: usize,
}

impl SharedEnv {
    /// Index of `var` within this environment, or `None` if it isn't one of
    /// the shared captures (closures with extra captures outside the shared
    /// set resolve those via the `-1` "direct outer identifier" fallback).
    pub fn index_of(&self, var: &str) -> Option<usize> {
        self.vars.iter().position(|v| v == var)
    }
}

/// One direct-child function expression found during the pre-pass, along
/// with the indices (into the shared env) of each of its own free vars.
/// `-1` (represented here as `None`) means "not part of the shared
/// environment, resolve the outer identifier directly".
pub struct PlannedClosure<'a> {
    pub func_expr: &'a FunctionExpr,
    pub own_free_vars: Vec<String>,
    pub shared_env_indices: Vec<Option<usize>>,
}

/// Plan a shared environment for `enclosing_name`'s direct-child closures.
/// Returns `None` if the body contains no nested function expressions.
pub fn plan_shared_env<'a>(
    enclosing_name: &str,
    body: &'a [Stmt],
) -> Option<(SharedEnv, Vec<PlannedClosure<'a>>)> {
    let mut found = Vec::new();
    for stmt in body {
        collect_direct_child_closures_stmt(stmt, &mut found);
    }
    if found.is_empty() {
        return None;
    }

    let mut vars: Vec<String> = Vec::new();
    let mut per_closure_free = Vec::new();
    for func_expr in &found {
        let free = free_vars_of_function_expr(func_expr);
        for v in &free {
            if !vars.contains(v) {
                vars.push(v.clone());
            }
        }
        per_closure_free.push(free);
    }

    let env = SharedEnv {
        name: format!("_shared_env_{enclosing_name}"),
        vars: vars.clone(),
        capacity: vars.len(),
    };

    let planned = found
        .into_iter()
        .zip(per_closure_free)
        .map(|(func_expr, own_free_vars)| {
            let shared_env_indices = own_free_vars.iter().map(|v| env.index_of(v)).collect();
            PlannedClosure { func_expr, own_free_vars, shared_env_indices }
        })
        .collect();

    Some((env, planned))
}

/// Collect function expressions that appear directly in this body — i.e.
/// not inside the body of *another* function expression, which gets its own
/// independent shared-env plan when it is itself emitted.
fn collect_direct_child_closures_stmt<'a>(stmt: &'a Stmt, out: &mut Vec<&'a FunctionExpr>) {
    match &stmt.kind {
        StmtKind::Let { initializer, .. } => {
            if let Some(e) = initializer {
                collect_direct_child_closures_expr(e, out);
            }
        }
        StmtKind::Const { initializer, .. } => collect_direct_child_closures_expr(initializer, out),
        StmtKind::Expr(e) => collect_direct_child_closures_expr(e, out),
        StmtKind::Block(body) => {
            for s in body {
                collect_direct_child_closures_stmt(s, out);
            }
        }
        StmtKind::If { condition, then_branch, else_branch } => {
            collect_direct_child_closures_expr(condition, out);
            collect_direct_child_closures_stmt(then_branch, out);
            if let Some(e) = else_branch {
                collect_direct_child_closures_stmt(e, out);
            }
        }
        StmtKind::While { condition, body } => {
            collect_direct_child_closures_expr(condition, out);
            collect_direct_child_closures_stmt(body, out);
        }
        StmtKind::For { init, condition, increment, body } => {
            if let Some(s) = init {
                collect_direct_child_closures_stmt(s, out);
            }
            if let Some(e) = condition {
                collect_direct_child_closures_expr(e, out);
            }
            if let Some(e) = increment {
                collect_direct_child_closures_expr(e, out);
            }
            collect_direct_child_closures_stmt(body, out);
        }
        StmtKind::ForIn { iterable, body, .. } => {
            collect_direct_child_closures_expr(iterable, out);
            collect_direct_child_closures_stmt(body, out);
        }
        StmtKind::Return(Some(e)) => collect_direct_child_closures_expr(e, out),
        StmtKind::Return(None) | StmtKind::Break | StmtKind::Continue => {}
        StmtKind::Try { body, catch, finally } => {
            for s in body {
                collect_direct_child_closures_stmt(s, out);
            }
            if let Some(catch) = catch {
                for s in &catch.body {
                    collect_direct_child_closures_stmt(s, out);
                }
            }
            if let Some(finally) = finally {
                for s in finally {
                    collect_direct_child_closures_stmt(s, out);
                }
            }
        }
        StmtKind::Throw(e) => collect_direct_child_closures_expr(e, out),
        StmtKind::Switch { discriminant, cases, default } => {
            collect_direct_child_closures_expr(discriminant, out);
            for case in cases {
                collect_direct_child_closures_expr(&case.value, out);
                for s in &case.body {
                    collect_direct_child_closures_stmt(s, out);
                }
            }
            if let Some(default) = default {
                for s in default {
                    collect_direct_child_closures_stmt(s, out);
                }
            }
        }
        StmtKind::Defer(e) => collect_direct_child_closures_expr(e, out),
        StmtKind::DefineObject { .. } | StmtKind::Enum { .. } => {}
        StmtKind::FunctionDecl(_) => {}
        StmtKind::Import(_) | StmtKind::ImportFfi { .. } | StmtKind::ExternFn { .. } => {}
        StmtKind::Export(inner) => collect_direct_child_closures_stmt(inner, out),
    }
}

fn collect_direct_child_closures_expr<'a>(expr: &'a Expr, out: &mut Vec<&'a FunctionExpr>) {
    match &expr.kind {
        ExprKind::Function(func_expr) => out.push(func_expr),
        ExprKind::Binary { left, right, .. } => {
            collect_direct_child_closures_expr(left, out);
            collect_direct_child_closures_expr(right, out);
        }
        ExprKind::Unary { operand, .. }
        | ExprKind::Await(operand)
        | ExprKind::PreIncrement(operand)
        | ExprKind::PreDecrement(operand)
        | ExprKind::PostIncrement(operand)
        | ExprKind::PostDecrement(operand) => collect_direct_child_closures_expr(operand, out),
        ExprKind::Ternary { condition, then_expr, else_expr } => {
            collect_direct_child_closures_expr(condition, out);
            collect_direct_child_closures_expr(then_expr, out);
            collect_direct_child_closures_expr(else_expr, out);
        }
        ExprKind::Call { callee, args, .. } => {
            collect_direct_child_closures_expr(callee, out);
            for a in args {
                collect_direct_child_closures_expr(a, out);
            }
        }
        ExprKind::Index { object, index, .. } => {
            collect_direct_child_closures_expr(object, out);
            collect_direct_child_closures_expr(index, out);
        }
        ExprKind::IndexAssign { object, index, value } => {
            collect_direct_child_closures_expr(object, out);
            collect_direct_child_closures_expr(index, out);
            collect_direct_child_closures_expr(value, out);
        }
        ExprKind::GetProperty { object, .. } => collect_direct_child_closures_expr(object, out),
        ExprKind::SetProperty { object, value, .. } => {
            collect_direct_child_closures_expr(object, out);
            collect_direct_child_closures_expr(value, out);
        }
        ExprKind::ArrayLiteral(items) => {
            for item in items {
                collect_direct_child_closures_expr(item, out);
            }
        }
        ExprKind::ObjectLiteral(fields) => {
            for (_, v) in fields {
                collect_direct_child_closures_expr(v, out);
            }
        }
        ExprKind::Interpolation(parts) => {
            for part in parts {
                if let crate::ast::InterpolationPart::Expr(e) = part {
                    collect_direct_child_closures_expr(e, out);
                }
            }
        }
        ExprKind::NullCoalesce { left, right } => {
            collect_direct_child_closures_expr(left, out);
            collect_direct_child_closures_expr(right, out);
        }
        ExprKind::Assign { target, value } => {
            collect_direct_child_closures_expr(target, out);
            collect_direct_child_closures_expr(value, out);
        }
        ExprKind::IntLiteral(_)
        | ExprKind::FloatLiteral(_)
        | ExprKind::StringLiteral(_)
        | ExprKind::RuneLiteral(_)
        | ExprKind::BoolLiteral(_)
        | ExprKind::NullLiteral
        | ExprKind::Identifier(_) => {}
    }
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
    fn no_nested_closures_returns_none() {
        let body = parse_body("let x = 1;");
        assert!(plan_shared_env("make", &body).is_none());
    }

    #[test]
    fn siblings_share_one_environment() {
        let body = parse_body(
            r#"
            let n = 0;
            let inc = fn() { n = n + 1; };
            let get = fn() { return n; };
            "#,
        );
        let (env, planned) = plan_shared_env("make_counter", &body).unwrap();
        assert_eq!(env.vars, vec!["n".to_string()]);
        assert_eq!(planned.len(), 2);
        for closure in &planned {
            assert_eq!(closure.shared_env_indices, vec![Some(0)]);
        }
    }
}
