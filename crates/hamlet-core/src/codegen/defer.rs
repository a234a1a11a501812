//! Defer engine (component E).
//!
//! Two modes, selected by whether the current function body is inside a
//! loop when the `defer` statement is reached:
//!
//! - **Compile-time stack** (default): `defer expr;` pushes a reference to
//!   `expr` onto a per-function Rust-side stack. At every `return` path and
//!   at implicit fall-through, the statement emitter walks this stack in
//!   LIFO order, evaluating and releasing each deferred expression.
//! - **Runtime stack** (active when `loop_depth > 0`, since the number of
//!   iterations isn't known at compile time): `defer` instead emits a call
//!   that pushes onto a runtime per-call-frame stack, and function exit
//!   emits a single unconditional `hml_defer_execute_all()`.

use crate::ast::Expr;

#[derive(Debug, Default)]
pub struct DeferStack {
    /// Compile-time deferred expressions, in registration order (LIFO drain
    /// means callers iterate this in reverse).
    entries: Vec<Expr>,
    /// True once any `defer` in the current function was registered while
    /// `loop_depth > 0` — once true, function exit must also emit the
    /// runtime drain call, since some defers may have gone to the runtime
    /// stack instead of this Rust-side one.
    used_runtime_stack: bool,
}

impl DeferStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a `defer expr;` statement. `loop_depth` is the emitter's
    /// current nesting count of `while`/`for`/`for-in` bodies.
    pub fn push(&mut self, expr: Expr, loop_depth: usize) {
        if loop_depth > 0 {
            self.used_runtime_stack = true;
        } else {
            self.entries.push(expr);
        }
    }

    /// Compile-time deferred expressions to emit at this exit point, in LIFO
    /// (most-recently-deferred-first) order.
    pub fn drain_compile_time(&self) -> impl Iterator<Item = &Expr> {
        self.entries.iter().rev()
    }

    /// Owned clone of [`DeferStack::drain_compile_time`]'s order. A function
    /// body can have several `return` statements, each of which must replay
    /// the same still-active defers — so draining never clears `entries`;
    /// clones let the statement emitter feed each expression back through
    /// the (separately borrowed) expression emitter at every exit point.
    pub fn drain_compile_time_cloned(&self) -> Vec<Expr> {
        self.entries.iter().rev().cloned().collect()
    }

    pub fn needs_runtime_drain(&self) -> bool {
        self.used_runtime_stack
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && !self.used_runtime_stack
    }

    /// Save and clear the stack for a nested function's own emission; the
    /// caller restores it with [`DeferStack::restore`] afterward.
    pub fn save_and_reset(&mut self) -> DeferStack {
        std::mem::take(self)
    }

    pub fn restore(&mut self, saved: DeferStack) {
        *self = saved;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::Span;
    use crate::ast::ExprKind;

    fn dummy_expr(name: &str) -> Expr {
        Expr { kind: ExprKind::Identifier(name.to_string()), span: Span::dummy() }
    }

    #[test]
    fn drains_in_lifo_order() {
        let mut stack = DeferStack::new();
        stack.push(dummy_expr("a"), 0);
        stack.push(dummy_expr("b"), 0);
        let names: Vec<_> = stack
            .drain_compile_time()
            .map(|e| match &e.kind {
                ExprKind::Identifier(n) => n.clone(),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(names, vec!["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn defer_in_loop_uses_runtime_stack() {
        let mut stack = DeferStack::new();
        stack.push(dummy_expr("a"), 1);
        assert!(stack.needs_runtime_drain());
        assert_eq!(stack.drain_compile_time().count(), 0);
    }

    #[test]
    fn save_and_restore_preserves_nested_isolation() {
        let mut stack = DeferStack::new();
        stack.push(dummy_expr("outer"), 0);
        let saved = stack.save_and_reset();
        assert!(stack.is_empty());
        stack.push(dummy_expr("inner"), 0);
        stack.restore(saved);
        assert_eq!(stack.drain_compile_time().count(), 1);
    }
}
