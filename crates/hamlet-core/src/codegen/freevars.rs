//! Free-variable analyzer (component C).
//!
//! Walks an expression/statement tree with a local scope that records
//! bindings as they come into view, and returns the deduped, ordered set of
//! identifiers referenced but not bound locally. Consumed by the closure
//! emitter (4.G) and the shared-env planner (4.D).

use crate::ast::{Expr, ExprKind, FunctionExpr, InterpolationPart, Stmt, StmtKind};
use std::collections::HashSet;

#[derive(Debug, Default)]
struct LocalScope {
    frames: Vec<HashSet<String>>,
}

impl LocalScope {
    fn new() -> Self {
        Self { frames: vec![HashSet::new()] }
    }

    fn push(&mut self) {
        self.frames.push(HashSet::new());
    }

    fn pop(&mut self) {
        self.frames.pop();
    }

    fn bind(&mut self, name: &str) {
        self.frames.last_mut().expect("scope has a frame").insert(name.to_string());
    }

    fn is_bound(&self, name: &str) -> bool {
        self.frames.iter().any(|f| f.contains(name))
    }
}

/// Ordered, deduped free-variable collector.
#[derive(Debug, Default)]
struct FreeVars {
    seen: HashSet<String>,
    order: Vec<String>,
}

impl FreeVars {
    fn record(&mut self, name: &str) {
        if self.seen.insert(name.to_string()) {
            self.order.push(name.to_string());
        }
    }
}

/// Compute the free variables of a function body, seeded with its
/// parameter names (which are bound, not free).
pub fn free_vars_of_function(params: &[String], body: &[Stmt]) -> Vec<String> {
    let mut scope = LocalScope::new();
    for p in params {
        scope.bind(p);
    }
    let mut free = FreeVars::default();
    for stmt in body {
        walk_stmt(stmt, &mut scope, &mut free);
    }
    free.order
}

/// Compute the free variables of a function-expression's own body, as if it
/// were the function being emitted (used when the closure emitter analyzes
/// its own immediate captures, independent of any enclosing function).
pub fn free_vars_of_function_expr(func_expr: &FunctionExpr) -> Vec<String> {
    let mut params: Vec<String> = func_expr.params.iter().map(|p| p.name.clone()).collect();
    if let Some(name) = &func_expr.name {
        params.push(name.clone());
    }
    free_vars_of_function(&params, &func_expr.body)
}

fn walk_stmt(stmt: &Stmt, scope: &mut LocalScope, free: &mut FreeVars) {
    match &stmt.kind {
        StmtKind::Let { name, initializer, .. } => {
            if let Some(init) = initializer {
                walk_expr(init, scope, free);
            }
            scope.bind(name);
        }
        StmtKind::Const { name, initializer, .. } => {
            walk_expr(initializer, scope, free);
            scope.bind(name);
        }
        StmtKind::Expr(e) => walk_expr(e, scope, free),
        StmtKind::Block(body) => {
            scope.push();
            for s in body {
                walk_stmt(s, scope, free);
            }
            scope.pop();
        }
        StmtKind::If { condition, then_branch, else_branch } => {
            walk_expr(condition, scope, free);
            walk_stmt(then_branch, scope, free);
            if let Some(else_branch) = else_branch {
                walk_stmt(else_branch, scope, free);
            }
        }
        StmtKind::While { condition, body } => {
            walk_expr(condition, scope, free);
            walk_stmt(body, scope, free);
        }
        StmtKind::For { init, condition, increment, body } => {
            scope.push();
            if let Some(init) = init {
                walk_stmt(init, scope, free);
            }
            if let Some(condition) = condition {
                walk_expr(condition, scope, free);
            }
            if let Some(increment) = increment {
                walk_expr(increment, scope, free);
            }
            walk_stmt(body, scope, free);
            scope.pop();
        }
        StmtKind::ForIn { key, value, iterable, body } => {
            walk_expr(iterable, scope, free);
            scope.push();
            if let Some(key) = key {
                scope.bind(key);
            }
            scope.bind(value);
            walk_stmt(body, scope, free);
            scope.pop();
        }
        StmtKind::Return(value) => {
            if let Some(value) = value {
                walk_expr(value, scope, free);
            }
        }
        StmtKind::Break | StmtKind::Continue => {}
        StmtKind::Try { body, catch, finally } => {
            scope.push();
            for s in body {
                walk_stmt(s, scope, free);
            }
            scope.pop();
            if let Some(catch) = catch {
                scope.push();
                if let Some(param) = &catch.param {
                    scope.bind(param);
                }
                for s in &catch.body {
                    walk_stmt(s, scope, free);
                }
                scope.pop();
            }
            if let Some(finally) = finally {
                scope.push();
                for s in finally {
                    walk_stmt(s, scope, free);
                }
                scope.pop();
            }
        }
        StmtKind::Throw(e) => walk_expr(e, scope, free),
        StmtKind::Switch { discriminant, cases, default } => {
            walk_expr(discriminant, scope, free);
            for case in cases {
                walk_expr(&case.value, scope, free);
                scope.push();
                for s in &case.body {
                    walk_stmt(s, scope, free);
                }
                scope.pop();
            }
            if let Some(default) = default {
                scope.push();
                for s in default {
                    walk_stmt(s, scope, free);
                }
                scope.pop();
            }
        }
        StmtKind::Defer(e) => walk_expr(e, scope, free),
        StmtKind::DefineObject { fields, .. } => {
            for field in fields {
                if let Some(default) = &field.default_value {
                    walk_expr(default, scope, free);
                }
            }
        }
        StmtKind::Enum { variants, .. } => {
            for variant in variants {
                if let Some(value) = &variant.value {
                    walk_expr(value, scope, free);
                }
            }
        }
        StmtKind::FunctionDecl(decl) => {
            let mut inner = LocalScope::new();
            inner.bind(&decl.name);
            for p in &decl.params {
                inner.bind(&p.name);
            }
            let mut inner_free = FreeVars::default();
            for s in &decl.body {
                walk_stmt(s, &mut inner, &mut inner_free);
            }
            for name in &inner_free.order {
                if !scope.is_bound(name) {
                    free.record(name);
                }
            }
        }
        StmtKind::Import(_) | StmtKind::ImportFfi { .. } | StmtKind::ExternFn { .. } => {}
        StmtKind::Export(inner) => walk_stmt(inner, scope, free),
    }
}

fn walk_expr(expr: &Expr, scope: &mut LocalScope, free: &mut FreeVars) {
    match &expr.kind {
        ExprKind::IntLiteral(_)
        | ExprKind::FloatLiteral(_)
        | ExprKind::StringLiteral(_)
        | ExprKind::RuneLiteral(_)
        | ExprKind::BoolLiteral(_)
        | ExprKind::NullLiteral => {}
        ExprKind::Identifier(name) => {
            if !scope.is_bound(name) {
                free.record(name);
            }
        }
        ExprKind::Binary { left, right, .. } => {
            walk_expr(left, scope, free);
            walk_expr(right, scope, free);
        }
        ExprKind::Unary { operand, .. } => walk_expr(operand, scope, free),
        ExprKind::Ternary { condition, then_expr, else_expr } => {
            walk_expr(condition, scope, free);
            walk_expr(then_expr, scope, free);
            walk_expr(else_expr, scope, free);
        }
        ExprKind::Call { callee, args, .. } => {
            walk_expr(callee, scope, free);
            for a in args {
                walk_expr(a, scope, free);
            }
        }
        ExprKind::Index { object, index, .. } => {
            walk_expr(object, scope, free);
            walk_expr(index, scope, free);
        }
        ExprKind::IndexAssign { object, index, value } => {
            walk_expr(object, scope, free);
            walk_expr(index, scope, free);
            walk_expr(value, scope, free);
        }
        ExprKind::GetProperty { object, .. } => walk_expr(object, scope, free),
        ExprKind::SetProperty { object, value, .. } => {
            walk_expr(object, scope, free);
            walk_expr(value, scope, free);
        }
        ExprKind::ArrayLiteral(items) => {
            for item in items {
                walk_expr(item, scope, free);
            }
        }
        ExprKind::ObjectLiteral(fields) => {
            for (_, value) in fields {
                walk_expr(value, scope, free);
            }
        }
        ExprKind::Function(func_expr) => walk_function_expr(func_expr, scope, free),
        ExprKind::Interpolation(parts) => {
            for part in parts {
                if let InterpolationPart::Expr(e) = part {
                    walk_expr(e, scope, free);
                }
            }
        }
        ExprKind::Await(inner)
        | ExprKind::PreIncrement(inner)
        | ExprKind::PreDecrement(inner)
        | ExprKind::PostIncrement(inner)
        | ExprKind::PostDecrement(inner) => walk_expr(inner, scope, free),
        ExprKind::NullCoalesce { left, right } => {
            walk_expr(left, scope, free);
            walk_expr(right, scope, free);
        }
        ExprKind::Assign { target, value } => {
            walk_expr(target, scope, free);
            walk_expr(value, scope, free);
        }
    }
}

/// A nested function expression opens a fresh scope seeded with its own
/// parameters. Its free variables (computed against that fresh scope) are
/// also free to the *enclosing* scope whenever the enclosing scope doesn't
/// bind them either — that's what the outer closure must itself capture
/// (or receive from further out) to hand down to the inner one.
fn walk_function_expr(func_expr: &FunctionExpr, outer_scope: &LocalScope, free: &mut FreeVars) {
    let mut inner = LocalScope::new();
    for p in &func_expr.params {
        inner.bind(&p.name);
    }
    if let Some(name) = &func_expr.name {
        inner.bind(name);
    }
    let mut inner_free = FreeVars::default();
    for stmt in &func_expr.body {
        walk_stmt(stmt, &mut inner, &mut inner_free);
    }
    for name in &inner_free.order {
        if !outer_scope.is_bound(name) {
            free.record(name);
        }
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
    fn nested_decl_referencing_enclosing_local_does_not_leak_out() {
        // `n` is bound by `outer`'s own `let`, so a nested `fn inner` that
        // reads it must not make `n` show up as one of `outer`'s own free
        // variables — `n` is local to `outer`, not free to it.
        let body = parse_body("fn outer() { let n = 0; fn inner() { return n; } }");
        if let StmtKind::FunctionDecl(decl) = &body[0].kind {
            let free = free_vars_of_function(&[], &decl.body);
            assert_eq!(free, Vec::<String>::new());
        } else {
            panic!("expected a FunctionDecl");
        }
    }

    #[test]
    fn nested_function_decl_does_not_leak_into_enclosing_free_vars() {
        let body = parse_body("fn outer() { let n = 0; fn inner() { return n; } return inner(); }");
        if let StmtKind::FunctionDecl(decl) = &body[0].kind {
            let free = free_vars_of_function(&[], &decl.body);
            assert!(!free.contains(&"n".to_string()), "n is outer's own local, not free to outer");
        } else {
            panic!("expected a FunctionDecl");
        }
    }

    #[test]
    fn nested_function_decl_excludes_self_recursive_name() {
        let body = parse_body("fn outer() { fn inner() { return inner(); } }");
        if let StmtKind::FunctionDecl(decl) = &body[0].kind {
            let free = free_vars_of_function(&[], &decl.body);
            assert!(!free.contains(&"inner".to_string()), "inner's own name is bound within itself, not free");
        } else {
            panic!("expected a FunctionDecl");
        }
    }

    #[test]
    fn params_are_not_free() {
        let body = parse_body("fn f(x) { return x + 1; }");
        if let StmtKind::FunctionDecl(decl) = &body[0].kind {
            let params: Vec<String> = decl.params.iter().map(|p| p.name.clone()).collect();
            let free = free_vars_of_function(&params, &decl.body);
            assert!(!free.contains(&"x".to_string()));
        }
    }

    #[test]
    fn let_initializer_can_reference_outer_free_var() {
        let body = parse_body("let y = x + 1;");
        let free = free_vars_of_function(&[], &body);
        assert_eq!(free, vec!["x".to_string()]);
    }

    #[test]
    fn for_in_binds_key_and_value() {
        let body = parse_body("for (k, v in items) { print(k); print(v); }");
        let free = free_vars_of_function(&[], &body);
        assert_eq!(free, vec!["items".to_string()]);
    }
}
