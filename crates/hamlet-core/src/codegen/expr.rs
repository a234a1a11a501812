//! Expression emitter (component G).
//!
//! Each expression produces a fresh C temporary holding an `HmlValue`. The
//! *caller* of [`codegen_expr`] owns one reference to the result and is
//! responsible for releasing it — the statement emitter releases after use;
//! binary/unary operands are released immediately after feeding the
//! operator helper. Every emission is a `(prelude, value)` pair: `prelude`
//! is zero or more C statements that must run first, `value` is the C
//! expression (almost always a bare `_tmpN`) that then denotes the result.

use crate::ast::{BinaryOp, Expr, ExprKind, InterpolationPart, UnaryOp};
use crate::codegen::method_dispatch::{self, MethodDispatch};
use crate::codegen::scope::NameResolution;
use crate::codegen::CodegenContext;
use crate::value_kind::ValueKind;

pub struct Emitted {
    pub prelude: String,
    pub value: String,
}

impl Emitted {
    fn just(value: impl Into<String>) -> Self {
        Self { prelude: String::new(), value: value.into() }
    }

    /// A bare `hml_val_null()`, with no preceding statements. Used by callers
    /// outside this module (e.g. the statement emitter's `let` with no
    /// initializer) that need a ready-made null value.
    pub fn literal_null() -> Self {
        Self::just(format!("{}()", ValueKind::Null.ctor_name()))
    }
}

/// Well-known identifiers that resolve to builtin constants rather than a
/// lexical/module binding (POSIX signal numbers, math constants).
fn builtin_constant(name: &str) -> Option<&'static str> {
    Some(match name {
        "SIGINT" => "hml_val_i32(2)",
        "SIGTERM" => "hml_val_i32(15)",
        "SIGKILL" => "hml_val_i32(9)",
        "PI" => "hml_val_f64(3.14159265358979323846)",
        "E" => "hml_val_f64(2.71828182845904523536)",
        _ => return None,
    })
}

/// Builtin direct calls: `(name, arity) -> runtime helper`. `None` arity
/// means variadic.
fn builtin_call(name: &str, argc: usize) -> Option<&'static str> {
    Some(match (name, argc) {
        ("print", _) => "hml_builtin_print",
        ("typeof", 1) => "hml_builtin_typeof",
        ("panic", 1) => "hml_builtin_panic",
        ("exec", _) => "hml_builtin_exec",
        ("spawn", 1) => "hml_builtin_spawn",
        ("join", 1) => "hml_builtin_join",
        ("detach", 1) => "hml_builtin_detach",
        ("channel", 0) => "hml_builtin_channel_new",
        ("sqrt", 1) => "hml_builtin_sqrt",
        ("pow", 2) => "hml_builtin_pow",
        ("now", 0) => "hml_builtin_now",
        ("env", 1) => "hml_builtin_env_get",
        ("len", 1) => "hml_len",
        _ => return None,
    })
}

fn binary_op_helper(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "hml_op_add",
        BinaryOp::Sub => "hml_op_sub",
        BinaryOp::Mul => "hml_op_mul",
        BinaryOp::Div => "hml_op_div",
        BinaryOp::Mod => "hml_op_mod",
        BinaryOp::Eq => "hml_op_eq",
        BinaryOp::NotEq => "hml_op_neq",
        BinaryOp::Lt => "hml_op_lt",
        BinaryOp::LtEq => "hml_op_lte",
        BinaryOp::Gt => "hml_op_gt",
        BinaryOp::GtEq => "hml_op_gte",
        BinaryOp::And => "hml_op_and",
        BinaryOp::Or => "hml_op_or",
    }
}

pub fn codegen_expr(ctx: &mut CodegenContext, expr: &Expr) -> Emitted {
    match &expr.kind {
        ExprKind::IntLiteral(n) => {
            let kind = ValueKind::for_integer_literal(*n);
            Emitted::just(format!("{}({n})", kind.ctor_name()))
        }
        ExprKind::FloatLiteral(f) => Emitted::just(format!("{}({f:?})", ValueKind::F64.ctor_name())),
        ExprKind::StringLiteral(s) => {
            Emitted::just(format!("{}({:?})", ValueKind::String.ctor_name(), s))
        }
        ExprKind::RuneLiteral(c) => {
            Emitted::just(format!("{}('{}')", ValueKind::Rune.ctor_name(), escape_c_char(*c)))
        }
        ExprKind::BoolLiteral(b) => Emitted::just(format!("{}({})", ValueKind::Bool.ctor_name(), *b as u8)),
        ExprKind::NullLiteral => Emitted::just(format!("{}()", ValueKind::Null.ctor_name())),
        ExprKind::Identifier(name) => codegen_identifier(ctx, name),
        ExprKind::Binary { op, left, right } => codegen_binary(ctx, *op, left, right),
        ExprKind::Unary { op, operand } => codegen_unary(ctx, *op, operand),
        ExprKind::Ternary { condition, then_expr, else_expr } => {
            codegen_ternary(ctx, condition, then_expr, else_expr)
        }
        ExprKind::Call { callee, args, optional } => codegen_call(ctx, callee, args, *optional),
        ExprKind::Index { object, index, optional } => codegen_index(ctx, object, index, *optional),
        ExprKind::IndexAssign { object, index, value } => {
            codegen_index_assign(ctx, object, index, value)
        }
        ExprKind::GetProperty { object, name, optional } => {
            codegen_get_property(ctx, object, name, *optional)
        }
        ExprKind::SetProperty { object, name, value } => {
            codegen_set_property(ctx, object, name, value)
        }
        ExprKind::ArrayLiteral(items) => codegen_array_literal(ctx, items),
        ExprKind::ObjectLiteral(fields) => codegen_object_literal(ctx, fields),
        ExprKind::Function(func_expr) => crate::codegen::closures::codegen_function_expr(ctx, func_expr),
        ExprKind::Interpolation(parts) => codegen_interpolation(ctx, parts),
        ExprKind::Await(inner) => {
            let e = codegen_expr(ctx, inner);
            let tmp = ctx.fresh_tmp();
            Emitted {
                prelude: format!("{}HmlValue {tmp} = hml_await({});\n", e.prelude, e.value),
                value: tmp,
            }
        }
        ExprKind::NullCoalesce { left, right } => codegen_null_coalesce(ctx, left, right),
        ExprKind::PreIncrement(operand) => codegen_inc_dec(ctx, operand, true, true),
        ExprKind::PreDecrement(operand) => codegen_inc_dec(ctx, operand, false, true),
        ExprKind::PostIncrement(operand) => codegen_inc_dec(ctx, operand, true, false),
        ExprKind::PostDecrement(operand) => codegen_inc_dec(ctx, operand, false, false),
        ExprKind::Assign { target, value } => codegen_assign(ctx, target, value),
    }
}

fn escape_c_char(c: char) -> String {
    match c {
        '\'' => "\\'".to_string(),
        '\\' => "\\\\".to_string(),
        '\n' => "\\n".to_string(),
        other => other.to_string(),
    }
}

fn codegen_identifier(ctx: &mut CodegenContext, name: &str) -> Emitted {
    match ctx.resolve_identifier(name) {
        NameResolution::Bare(n) => Emitted::just(n),
        NameResolution::MainPrefixed(n) => Emitted::just(n),
        NameResolution::ModulePrefixed(n) => Emitted::just(n),
        NameResolution::Imported(n) => Emitted::just(n),
        NameResolution::Unresolved => {
            if let Some(constant) = builtin_constant(name) {
                Emitted::just(constant)
            } else {
                ctx.diagnostics.push(crate::diagnostic::Diagnostic::warning_with_code(
                    crate::diagnostic::error_codes::GENERIC_WARNING,
                    format!("reference to undefined name '{name}'"),
                    crate::span::Span::dummy(),
                ));
                Emitted::just(format!("{}()", ValueKind::Null.ctor_name()))
            }
        }
    }
}

fn codegen_binary(ctx: &mut CodegenContext, op: BinaryOp, left: &Expr, right: &Expr) -> Emitted {
    let l = codegen_expr(ctx, left);
    let r = codegen_expr(ctx, right);
    let tmp = ctx.fresh_tmp();
    let helper = binary_op_helper(op);
    let prelude = format!(
        "{}{}HmlValue {tmp} = {helper}({}, {});\nhml_release({});\nhml_release({});\n",
        l.prelude, r.prelude, l.value, r.value, l.value, r.value
    );
    Emitted { prelude, value: tmp }
}

fn codegen_unary(ctx: &mut CodegenContext, op: UnaryOp, operand: &Expr) -> Emitted {
    let e = codegen_expr(ctx, operand);
    let tmp = ctx.fresh_tmp();
    let helper = match op {
        UnaryOp::Neg => "hml_op_neg",
        UnaryOp::Not => "hml_op_not",
    };
    Emitted {
        prelude: format!("{}HmlValue {tmp} = {helper}({});\nhml_release({});\n", e.prelude, e.value, e.value),
        value: tmp,
    }
}

fn codegen_ternary(ctx: &mut CodegenContext, condition: &Expr, then_expr: &Expr, else_expr: &Expr) -> Emitted {
    let cond = codegen_expr(ctx, condition);
    let result = ctx.fresh_tmp();
    let then = codegen_expr(ctx, then_expr);
    let els = codegen_expr(ctx, else_expr);
    let prelude = format!(
        "{}HmlValue {result};\nif (hml_truthy({})) {{\n{}{result} = {};\n}} else {{\n{}{result} = {};\n}}\nhml_release({});\n",
        cond.prelude, cond.value, then.prelude, then.value, els.prelude, els.value, cond.value
    );
    Emitted { prelude, value: result }
}

fn codegen_array_literal(ctx: &mut CodegenContext, items: &[Expr]) -> Emitted {
    let mut prelude = String::new();
    let mut values = Vec::with_capacity(items.len());
    for item in items {
        let e = codegen_expr(ctx, item);
        prelude.push_str(&e.prelude);
        values.push(e.value);
    }
    let tmp = ctx.fresh_tmp();
    let elems = if values.is_empty() {
        "NULL".to_string()
    } else {
        format!("(HmlValue[]){{ {} }}", values.join(", "))
    };
    prelude.push_str(&format!("HmlValue {tmp} = hml_val_array({elems}, {});\n", values.len()));
    Emitted { prelude, value: tmp }
}

fn codegen_object_literal(ctx: &mut CodegenContext, fields: &[(String, Expr)]) -> Emitted {
    let tmp = ctx.fresh_tmp();
    let mut prelude = format!("HmlValue {tmp} = hml_val_object();\n");
    for (name, value) in fields {
        let e = codegen_expr(ctx, value);
        prelude.push_str(&e.prelude);
        prelude.push_str(&format!("hml_object_set({tmp}, {:?}, {});\n", name, e.value));
    }
    Emitted { prelude, value: tmp }
}

fn codegen_interpolation(ctx: &mut CodegenContext, parts: &[InterpolationPart]) -> Emitted {
    let tmp = ctx.fresh_tmp();
    let mut prelude = format!("HmlValue {tmp} = {}(\"\");\n", ValueKind::String.ctor_name());
    for part in parts {
        match part {
            InterpolationPart::Literal(lit) => {
                prelude.push_str(&format!(
                    "{{\nHmlValue _piece = {}({:?});\nHmlValue _joined = hml_string_concat({tmp}, _piece);\nhml_release({tmp});\nhml_release(_piece);\n{tmp} = _joined;\n}}\n",
                    ValueKind::String.ctor_name(),
                    lit
                ));
            }
            InterpolationPart::Expr(e) => {
                let emitted = codegen_expr(ctx, e);
                prelude.push_str(&emitted.prelude);
                prelude.push_str(&format!(
                    "{{\nHmlValue _piece = hml_to_string({});\nhml_release({});\nHmlValue _joined = hml_string_concat({tmp}, _piece);\nhml_release({tmp});\nhml_release(_piece);\n{tmp} = _joined;\n}}\n",
                    emitted.value, emitted.value
                ));
            }
        }
    }
    Emitted { prelude, value: tmp }
}

fn codegen_null_coalesce(ctx: &mut CodegenContext, left: &Expr, right: &Expr) -> Emitted {
    let l = codegen_expr(ctx, left);
    let result = ctx.fresh_tmp();
    let r = codegen_expr(ctx, right);
    let prelude = format!(
        "{}HmlValue {result};\nif (!hml_is_null({})) {{\n{result} = {};\n}} else {{\nhml_release({});\n{}{result} = {};\n}}\n",
        l.prelude, l.value, l.value, l.value, r.prelude, r.value
    );
    Emitted { prelude, value: result }
}

fn codegen_inc_dec(ctx: &mut CodegenContext, operand: &Expr, increment: bool, prefix: bool) -> Emitted {
    if !operand.is_simple_lvalue() {
        ctx.diagnostics.push(crate::diagnostic::Diagnostic::warning_with_code(
            crate::diagnostic::error_codes::GENERIC_WARNING,
            "increment/decrement of a complex l-value is not supported; substituting null",
            expr_span(operand),
        ));
        return Emitted::just(format!("{}()", ValueKind::Null.ctor_name()));
    }
    let ExprKind::Identifier(name) = &operand.kind else { unreachable!() };
    let target = codegen_identifier(ctx, name).value;
    let helper = if increment { "hml_op_add" } else { "hml_op_sub" };
    let one = ctx.fresh_tmp();
    let new_val = ctx.fresh_tmp();
    let old_val = ctx.fresh_tmp();
    let mut prelude = format!(
        "HmlValue {old_val} = {target};\nHmlValue {one} = {}(1);\nHmlValue {new_val} = {helper}({old_val}, {one});\nhml_release({one});\nhml_release({target});\n{target} = {new_val};\n",
        ValueKind::I32.ctor_name()
    );
    let result = ctx.fresh_tmp();
    if prefix {
        prelude.push_str(&format!("HmlValue {result} = hml_retain({new_val});\n"));
    } else {
        prelude.push_str(&format!("HmlValue {result} = {old_val};\n"));
    }
    Emitted { prelude, value: result }
}

fn expr_span(e: &Expr) -> crate::span::Span {
    e.span
}

fn codegen_assign(ctx: &mut CodegenContext, target: &Expr, value: &Expr) -> Emitted {
    let ExprKind::Identifier(name) = &target.kind else {
        // `obj.f = v` / `a[i] = v` desugar to SetProperty/IndexAssign in the
        // parser; a plain identifier is the only remaining assign target.
        return codegen_expr(ctx, value);
    };
    if ctx.names.is_const(name) {
        ctx.diagnostics.push(crate::diagnostic::Diagnostic::error_with_code(
            crate::diagnostic::error_codes::CONST_REASSIGNMENT,
            format!("cannot assign to const '{name}'"),
            target.span,
        ));
    }
    let lhs = codegen_identifier(ctx, name).value;
    let rhs = codegen_expr(ctx, value);
    let result = ctx.fresh_tmp();
    let prelude = format!(
        "{}hml_release({lhs});\n{lhs} = {};\nHmlValue {result} = hml_retain({lhs});\n",
        rhs.prelude, rhs.value
    );
    Emitted { prelude, value: result }
}

fn codegen_get_property(ctx: &mut CodegenContext, object: &Expr, name: &str, optional: bool) -> Emitted {
    let obj = codegen_expr(ctx, object);
    let result = ctx.fresh_tmp();
    let body = if name == "length" {
        format!(
            "if (hml_kind({}) == HML_KIND_ARRAY) {{ {result} = hml_val_i32(hml_array_len({})); }}\n\
             else if (hml_kind({}) == HML_KIND_STRING) {{ {result} = hml_val_i32(hml_string_len({})); }}\n\
             else if (hml_kind({}) == HML_KIND_BUFFER) {{ {result} = hml_val_i32(hml_buffer_len({})); }}\n\
             else {{ {result} = hml_object_get({}, \"length\"); }}\n",
            obj.value, obj.value, obj.value, obj.value, obj.value, obj.value, obj.value
        )
    } else {
        format!("{result} = hml_object_get({}, {:?});\n", obj.value, name)
    };
    let prelude = if optional {
        format!(
            "{}HmlValue {result};\nif (hml_is_null({})) {{\n{result} = {}();\n}} else {{\n{body}}}\n",
            obj.prelude, obj.value, ValueKind::Null.ctor_name()
        )
    } else {
        format!("{}HmlValue {result};\n{body}", obj.prelude)
    };
    Emitted { prelude, value: result }
}

fn codegen_set_property(ctx: &mut CodegenContext, object: &Expr, name: &str, value: &Expr) -> Emitted {
    let obj = codegen_expr(ctx, object);
    let val = codegen_expr(ctx, value);
    let result = ctx.fresh_tmp();
    let prelude = format!(
        "{}{}hml_object_set({}, {:?}, {});\nHmlValue {result} = hml_retain({});\n",
        obj.prelude, val.prelude, obj.value, name, val.value, val.value
    );
    Emitted { prelude, value: result }
}

fn codegen_index(ctx: &mut CodegenContext, object: &Expr, index: &Expr, optional: bool) -> Emitted {
    let obj = codegen_expr(ctx, object);
    let idx = codegen_expr(ctx, index);
    let result = ctx.fresh_tmp();
    let body = format!(
        "if (hml_kind({o}) == HML_KIND_ARRAY) {{ {result} = hml_array_get({o}, {i}); }}\n\
         else if (hml_kind({o}) == HML_KIND_STRING) {{ {result} = hml_string_char_at({o}, {i}); }}\n\
         else if (hml_kind({o}) == HML_KIND_BUFFER) {{ {result} = hml_buffer_get({o}, {i}); }}\n\
         else {{ {result} = hml_object_get_dynamic({o}, {i}); }}\n",
        o = obj.value, i = idx.value, result = result
    );
    let prelude = if optional {
        format!(
            "{}{}HmlValue {result};\nif (hml_is_null({})) {{\n{result} = {}();\n}} else {{\n{body}}}\n",
            obj.prelude, idx.prelude, obj.value, ValueKind::Null.ctor_name()
        )
    } else {
        format!("{}{}HmlValue {result};\n{body}", obj.prelude, idx.prelude)
    };
    Emitted { prelude, value: result }
}

fn codegen_index_assign(ctx: &mut CodegenContext, object: &Expr, index: &Expr, value: &Expr) -> Emitted {
    let obj = codegen_expr(ctx, object);
    let idx = codegen_expr(ctx, index);
    let val = codegen_expr(ctx, value);
    let result = ctx.fresh_tmp();
    let prelude = format!(
        "{}{}{}hml_array_set({}, {}, {});\nHmlValue {result} = hml_retain({});\n",
        obj.prelude, idx.prelude, val.prelude, obj.value, idx.value, val.value, val.value
    );
    Emitted { prelude, value: result }
}

fn codegen_call(ctx: &mut CodegenContext, callee: &Expr, args: &[Expr], optional: bool) -> Emitted {
    // Path 2: method call on a receiver, `obj.method(args)`.
    if let ExprKind::GetProperty { object, name, optional: prop_optional } = &callee.kind {
        return codegen_method_call(ctx, object, name, args, optional || *prop_optional);
    }

    // Path 1: builtin, direct.
    if let ExprKind::Identifier(name) = &callee.kind {
        if matches!(ctx.resolve_identifier(name), NameResolution::Unresolved) {
            if let Some(helper) = builtin_call(name, args.len()) {
                return codegen_args_and_call(ctx, helper, args, true);
            }
        }
        // Direct call: identifier known to name a user function in scope.
        let target = codegen_identifier(ctx, name).value;
        return codegen_args_and_call(ctx, &target, args, true);
    }

    // Path 3: general call — evaluate callee, pack args, invoke call_function.
    let callee_e = codegen_expr(ctx, callee);
    let mut prelude = callee_e.prelude;
    let mut arg_values = Vec::with_capacity(args.len());
    for a in args {
        let e = codegen_expr(ctx, a);
        prelude.push_str(&e.prelude);
        arg_values.push(e.value);
    }
    let array = if arg_values.is_empty() {
        "NULL".to_string()
    } else {
        format!("(HmlValue[]){{ {} }}", arg_values.join(", "))
    };
    let result = ctx.fresh_tmp();
    if optional {
        prelude.push_str(&format!(
            "HmlValue {result};\nif (hml_is_null({})) {{\n{result} = {}();\n}} else {{\n{result} = hml_call_function({}, {array}, {});\n}}\n",
            callee_e.value, ValueKind::Null.ctor_name(), callee_e.value, arg_values.len()
        ));
    } else {
        prelude.push_str(&format!(
            "HmlValue {result} = hml_call_function({}, {array}, {});\n",
            callee_e.value, arg_values.len()
        ));
    }
    Emitted { prelude, value: result }
}

/// Emit the argument-evaluation prelude plus a direct call to `target`,
/// which is either a builtin runtime helper or a mangled user function name
/// — both obey the uniform calling convention's `HmlClosureEnv *` first
/// parameter, so the call site always passes `NULL` for it here (indirect
/// dispatch through a closure's own env pointer happens inside
/// `hml_call_function`, not at a direct call site).
fn codegen_args_and_call(ctx: &mut CodegenContext, target: &str, args: &[Expr], pass_null_env: bool) -> Emitted {
    let mut prelude = String::new();
    let mut values = Vec::with_capacity(args.len());
    for a in args {
        let e = codegen_expr(ctx, a);
        prelude.push_str(&e.prelude);
        values.push(e.value);
    }
    let result = ctx.fresh_tmp();
    let mut call_args = if pass_null_env { vec!["NULL".to_string()] } else { vec![] };
    call_args.extend(values);
    prelude.push_str(&format!("HmlValue {result} = {target}({});\n", call_args.join(", ")));
    Emitted { prelude, value: result }
}

fn codegen_method_call(ctx: &mut CodegenContext, object: &Expr, method: &str, args: &[Expr], optional: bool) -> Emitted {
    let obj = codegen_expr(ctx, object);
    let mut arg_prelude = String::new();
    let mut arg_values = Vec::with_capacity(args.len());
    for a in args {
        let e = codegen_expr(ctx, a);
        arg_prelude.push_str(&e.prelude);
        arg_values.push(e.value);
    }
    let result = ctx.fresh_tmp();
    let mut call_args = vec![obj.value.clone()];
    call_args.extend(arg_values.clone());
    let args_joined = call_args.join(", ");

    let body = match method_dispatch::resolve_method(method) {
        MethodDispatch::Unique(helper) => format!("{result} = {helper}({args_joined});\n"),
        MethodDispatch::RuntimeBranch(branches) => {
            let mut s = String::new();
            for (i, (kind_tag, helper)) in branches.iter().enumerate() {
                let keyword = if i == 0 { "if" } else { "else if" };
                s.push_str(&format!(
                    "{keyword} (hml_kind({}) == {kind_tag}) {{ {result} = {helper}({args_joined}); }}\n",
                    obj.value
                ));
            }
            s.push_str(&format!("else {{ {result} = hml_call_method({}, {:?}, {}); }}\n", obj.value, method, arg_values.len()));
            s
        }
        MethodDispatch::Dynamic => {
            let array = if arg_values.is_empty() {
                "NULL".to_string()
            } else {
                format!("(HmlValue[]){{ {} }}", arg_values.join(", "))
            };
            format!("{result} = hml_call_method({}, {:?}, {array});\n", obj.value, method)
        }
    };

    let prelude = if optional {
        format!(
            "{}{}HmlValue {result};\nif (hml_is_null({})) {{\n{result} = {}();\n}} else {{\n{body}}}\n",
            obj.prelude, arg_prelude, obj.value, ValueKind::Null.ctor_name()
        )
    } else {
        format!("{}{}HmlValue {result};\n{body}", obj.prelude, arg_prelude)
    };
    Emitted { prelude, value: result }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::CodegenContext;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn parse_expr(src: &str) -> Expr {
        let mut lexer = Lexer::new(src);
        let (tokens, _) = lexer.tokenize();
        let mut parser = Parser::new(tokens);
        parser.parse_expr_for_test()
    }

    #[test]
    fn integer_literal_picks_i32_ctor() {
        let mut ctx = CodegenContext::new();
        let e = codegen_expr(&mut ctx, &parse_expr("42"));
        assert!(e.value.contains("hml_val_i32(42)"));
    }

    #[test]
    fn binary_add_releases_both_operands() {
        let mut ctx = CodegenContext::new();
        let e = codegen_expr(&mut ctx, &parse_expr("1 + 2"));
        assert!(e.prelude.contains("hml_op_add"));
        assert_eq!(e.prelude.matches("hml_release").count(), 2);
    }

    #[test]
    fn slice_method_call_branches_on_runtime_kind() {
        let mut ctx = CodegenContext::new();
        let e = codegen_expr(&mut ctx, &parse_expr("x.slice(0, 1)"));
        assert!(e.prelude.contains("HML_KIND_STRING"));
        assert!(e.prelude.contains("HML_KIND_ARRAY"));
    }

    #[test]
    fn optional_chain_short_circuits_on_null() {
        let mut ctx = CodegenContext::new();
        let e = codegen_expr(&mut ctx, &parse_expr("x?.y"));
        assert!(e.prelude.contains("hml_is_null"));
    }
}
