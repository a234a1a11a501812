//! Abstract syntax tree.
//!
//! The AST is a read-only input to the codegen core from the backend's point
//! of view: parsing owns construction, codegen only traverses it (node
//! ownership is structural — a node's children are dropped when it is).

use crate::span::Span;
use crate::type_annotation::TypeAnnotation;

#[derive(Debug, Clone)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub type_annotation: TypeAnnotation,
}

#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: TypeAnnotation,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub struct FunctionExpr {
    /// `Some` for a self-referential `let f = fn f() { ... f() ... };` form.
    pub name: Option<String>,
    pub params: Vec<Param>,
    pub return_type: TypeAnnotation,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub struct CatchClause {
    pub param: Option<String>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub struct SwitchCase {
    pub value: Expr,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub struct ObjectFieldDef {
    pub name: String,
    pub type_annotation: TypeAnnotation,
    pub is_optional: bool,
    pub default_value: Option<Expr>,
}

#[derive(Debug, Clone)]
pub struct EnumVariant {
    pub name: String,
    /// Explicit value, or `None` to auto-increment from the preceding
    /// explicit value (default start 0).
    pub value: Option<Expr>,
}

#[derive(Debug, Clone)]
pub enum ImportKind {
    /// `import * as ns from "source"` — binds a single namespace object.
    Namespace { alias: String },
    /// `import { a, b as c } from "source"`.
    Named(Vec<ImportSpecifier>),
}

#[derive(Debug, Clone)]
pub struct ImportSpecifier {
    pub imported_name: String,
    pub local_name: String,
}

#[derive(Debug, Clone)]
pub struct ImportDecl {
    pub source: String,
    pub kind: ImportKind,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone)]
pub enum StmtKind {
    Let {
        name: String,
        type_annotation: TypeAnnotation,
        initializer: Option<Expr>,
    },
    Const {
        name: String,
        type_annotation: TypeAnnotation,
        initializer: Expr,
    },
    Expr(Expr),
    Block(Vec<Stmt>),
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
    },
    For {
        init: Option<Box<Stmt>>,
        condition: Option<Expr>,
        increment: Option<Expr>,
        body: Box<Stmt>,
    },
    ForIn {
        key: Option<String>,
        value: String,
        iterable: Expr,
        body: Box<Stmt>,
    },
    Return(Option<Expr>),
    Break,
    Continue,
    Try {
        body: Vec<Stmt>,
        catch: Option<CatchClause>,
        finally: Option<Vec<Stmt>>,
    },
    Throw(Expr),
    Switch {
        discriminant: Expr,
        cases: Vec<SwitchCase>,
        default: Option<Vec<Stmt>>,
    },
    Defer(Expr),
    DefineObject {
        name: String,
        fields: Vec<ObjectFieldDef>,
    },
    Enum {
        name: String,
        variants: Vec<EnumVariant>,
    },
    FunctionDecl(FunctionDecl),
    Import(ImportDecl),
    /// `export <decl>`; re-exports (`export { name }` re-exporting an import)
    /// are consumed during module analysis and emit nothing downstream.
    Export(Box<Stmt>),
    ImportFfi {
        library_path: Expr,
        alias: String,
    },
    ExternFn {
        name: String,
        params: Vec<Param>,
        return_type: TypeAnnotation,
    },
}

#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum InterpolationPart {
    Literal(String),
    Expr(Expr),
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    IntLiteral(i64),
    FloatLiteral(f64),
    StringLiteral(String),
    RuneLiteral(char),
    BoolLiteral(bool),
    NullLiteral,
    Identifier(String),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Ternary {
        condition: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        optional: bool,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
        optional: bool,
    },
    IndexAssign {
        object: Box<Expr>,
        index: Box<Expr>,
        value: Box<Expr>,
    },
    GetProperty {
        object: Box<Expr>,
        name: String,
        optional: bool,
    },
    SetProperty {
        object: Box<Expr>,
        name: String,
        value: Box<Expr>,
    },
    ArrayLiteral(Vec<Expr>),
    ObjectLiteral(Vec<(String, Expr)>),
    Function(FunctionExpr),
    /// String interpolation: interleaved literal/expression parts,
    /// concatenated left to right.
    Interpolation(Vec<InterpolationPart>),
    Await(Box<Expr>),
    NullCoalesce {
        left: Box<Expr>,
        right: Box<Expr>,
    },
    PreIncrement(Box<Expr>),
    PreDecrement(Box<Expr>),
    PostIncrement(Box<Expr>),
    PostDecrement(Box<Expr>),
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
    },
}

impl Expr {
    /// True for the l-value forms the increment/decrement emitter supports
    /// directly (bare identifiers). Anything else is a "complex l-value"
    /// that degrades to a null result with a warning (4.G).
    pub fn is_simple_lvalue(&self) -> bool {
        matches!(self.kind, ExprKind::Identifier(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_is_simple_lvalue() {
        let e = Expr {
            kind: ExprKind::Identifier("x".into()),
            span: Span::dummy(),
        };
        assert!(e.is_simple_lvalue());
    }

    #[test]
    fn property_access_is_not_simple_lvalue() {
        let e = Expr {
            kind: ExprKind::GetProperty {
                object: Box::new(Expr {
                    kind: ExprKind::Identifier("obj".into()),
                    span: Span::dummy(),
                }),
                name: "field".into(),
                optional: false,
            },
            span: Span::dummy(),
        };
        assert!(!e.is_simple_lvalue());
    }
}
