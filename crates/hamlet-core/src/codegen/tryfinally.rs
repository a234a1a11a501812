//! Try/finally lowering (component F).
//!
//! Each `try` opens a runtime exception frame via `setjmp`. Catch runs when
//! the frame's jump returns nonzero; otherwise the exception is recorded for
//! rethrow after finally. The frame is popped *before* the finally body is
//! emitted, so exceptions thrown inside finally propagate to the next outer
//! handler rather than re-entering this one.
//!
//! Return-through-finally: while a finally clause is active, a nested
//! `return` can't jump straight out — it has to run the finally first. The
//! emitter tracks this with a stack of frames; `return` consults the top
//! frame (if any) to decide whether to emit a direct C `return` or a
//! store-then-`goto`.

/// One entry per enclosing `try` that has a `finally` clause. Pushed when
/// the statement emitter starts lowering such a `try`, popped once its
/// finally body has been fully emitted.
#[derive(Debug, Clone)]
pub struct TryFinallyFrame {
    pub finally_label: String,
    pub return_value_var: String,
    pub has_return_var: String,
}

#[derive(Debug, Default)]
pub struct TryFinallyStack {
    frames: Vec<TryFinallyFrame>,
    next_id: usize,
}

impl TryFinallyStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a fresh frame for a `try` with a `finally` clause, returning the
    /// C declarations the caller must emit for the two tracking variables.
    pub fn push(&mut self) -> TryFinallyFrame {
        let id = self.next_id;
        self.next_id += 1;
        let frame = TryFinallyFrame {
            finally_label: format!("_finally_{id}"),
            return_value_var: format!("_finally_retval_{id}"),
            has_return_var: format!("_finally_hasret_{id}"),
        };
        self.frames.push(frame.clone());
        frame
    }

    pub fn pop(&mut self) {
        self.frames.pop();
    }

    /// The frame a `return` currently in scope must route through, if any.
    pub fn current(&self) -> Option<&TryFinallyFrame> {
        self.frames.last()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}

/// Emit the C for a `return` statement given whether a try-finally frame is
/// active. `value_expr` is the already-emitted C expression text for the
/// return value (or `"hml_val_null()"` for a bare `return;`).
pub fn emit_return(frame: Option<&TryFinallyFrame>, value_expr: &str) -> String {
    match frame {
        Some(frame) => format!(
            "{} = {};\n{} = 1;\ngoto {};",
            frame.return_value_var, value_expr, frame.has_return_var, frame.finally_label
        ),
        None => format!("return {value_expr};"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_return_with_no_active_frame() {
        assert_eq!(emit_return(None, "_tmp0"), "return _tmp0;");
    }

    #[test]
    fn return_through_finally_stores_and_jumps() {
        let mut stack = TryFinallyStack::new();
        let frame = stack.push();
        let emitted = emit_return(Some(&frame), "_tmp0");
        assert!(emitted.contains(&frame.return_value_var));
        assert!(emitted.contains(&format!("goto {};", frame.finally_label)));
        stack.pop();
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn nested_frames_use_distinct_labels() {
        let mut stack = TryFinallyStack::new();
        let outer = stack.push();
        let inner = stack.push();
        assert_ne!(outer.finally_label, inner.finally_label);
        assert_eq!(stack.current().unwrap().finally_label, inner.finally_label);
    }
}
