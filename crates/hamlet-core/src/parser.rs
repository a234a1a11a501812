//! Parsing (tokens to AST).
//!
//! An external collaborator from the codegen core's point of view, but
//! implemented as a real recursive-descent/Pratt parser so the toolchain has
//! a genuine end-to-end path from source text to generated C.

use crate::ast::*;
use crate::diagnostic::{error_codes, Diagnostic};
use crate::span::Span;
use crate::token::{Token, TokenKind};
use crate::type_annotation::TypeAnnotation;
use crate::value_kind::ValueKind;

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    diagnostics: Vec<Diagnostic>,
}

type PResult<T> = Result<T, ()>;

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            diagnostics: Vec::new(),
        }
    }

    pub fn parse(&mut self) -> (Program, Vec<Diagnostic>) {
        let mut statements = Vec::new();
        while !self.at_eof() {
            match self.parse_stmt() {
                Ok(stmt) => statements.push(stmt),
                Err(()) => self.synchronize(),
            }
        }
        (Program { statements }, std::mem::take(&mut self.diagnostics))
    }

    // --- token stream helpers ---

    fn at_eof(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        if !self.at_eof() {
            self.pos += 1;
        }
        tok
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.peek_kind()) == std::mem::discriminant(kind)
    }

    fn matches(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, what: &str) -> PResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            self.error(format!("expected {what}"));
            Err(())
        }
    }

    fn expect_ident(&mut self) -> PResult<String> {
        if let TokenKind::Ident(name) = self.peek_kind().clone() {
            self.advance();
            Ok(name)
        } else {
            self.error("expected identifier".to_string());
            Err(())
        }
    }

    fn error(&mut self, message: String) {
        let span = self.peek().span;
        self.diagnostics
            .push(Diagnostic::error_with_code(error_codes::PARSE_FAILURE, message, span));
    }

    fn synchronize(&mut self) {
        while !self.at_eof() {
            if self.matches(&TokenKind::Semicolon) {
                return;
            }
            self.advance();
        }
    }

    // --- statements ---

    fn parse_stmt(&mut self) -> PResult<Stmt> {
        let start = self.peek().span;
        let kind = match self.peek_kind().clone() {
            TokenKind::Let => self.parse_let()?,
            TokenKind::Const => self.parse_const()?,
            TokenKind::Fn => self.parse_function_decl()?,
            TokenKind::If => self.parse_if()?,
            TokenKind::While => self.parse_while()?,
            TokenKind::For => self.parse_for()?,
            TokenKind::LeftBrace => StmtKind::Block(self.parse_block()?),
            TokenKind::Return => self.parse_return()?,
            TokenKind::Break => {
                self.advance();
                self.matches(&TokenKind::Semicolon);
                StmtKind::Break
            }
            TokenKind::Continue => {
                self.advance();
                self.matches(&TokenKind::Semicolon);
                StmtKind::Continue
            }
            TokenKind::Try => self.parse_try()?,
            TokenKind::Throw => {
                self.advance();
                let expr = self.parse_expr()?;
                self.matches(&TokenKind::Semicolon);
                StmtKind::Throw(expr)
            }
            TokenKind::Switch => self.parse_switch()?,
            TokenKind::Defer => {
                self.advance();
                let expr = self.parse_expr()?;
                self.matches(&TokenKind::Semicolon);
                StmtKind::Defer(expr)
            }
            TokenKind::Object => self.parse_define_object()?,
            TokenKind::Enum => self.parse_enum()?,
            TokenKind::Import if self.peek_ahead_is_ffi() => self.parse_import_ffi()?,
            TokenKind::Import => self.parse_import()?,
            TokenKind::Export => self.parse_export()?,
            TokenKind::Extern => self.parse_extern_fn()?,
            _ => {
                let expr = self.parse_expr()?;
                self.matches(&TokenKind::Semicolon);
                StmtKind::Expr(expr)
            }
        };
        let end = self.tokens[self.pos.saturating_sub(1).min(self.tokens.len() - 1)].span;
        Ok(Stmt {
            kind,
            span: start.merge(end),
        })
    }

    fn peek_ahead_is_ffi(&self) -> bool {
        // `import "lib" as name;` (no `from`/braces) denotes an FFI library load.
        matches!(self.tokens.get(self.pos + 1).map(|t| &t.kind), Some(TokenKind::String(_)))
    }

    fn parse_type_annotation(&mut self) -> PResult<TypeAnnotation> {
        if !self.matches(&TokenKind::Colon) {
            return Ok(TypeAnnotation::Unknown);
        }
        self.parse_type_ref()
    }

    fn parse_type_ref(&mut self) -> PResult<TypeAnnotation> {
        if matches!(self.peek_kind(), TokenKind::LeftBracket) {
            self.advance();
            let inner = self.parse_type_ref()?;
            self.expect(&TokenKind::RightBracket, "']'")?;
            return Ok(TypeAnnotation::Array(Box::new(inner)));
        }
        let name = self.expect_ident()?;
        Ok(match name.as_str() {
            "bool" => TypeAnnotation::Primitive(ValueKind::Bool),
            "i8" => TypeAnnotation::Primitive(ValueKind::I8),
            "i16" => TypeAnnotation::Primitive(ValueKind::I16),
            "i32" => TypeAnnotation::Primitive(ValueKind::I32),
            "i64" => TypeAnnotation::Primitive(ValueKind::I64),
            "u8" => TypeAnnotation::Primitive(ValueKind::U8),
            "u16" => TypeAnnotation::Primitive(ValueKind::U16),
            "u32" => TypeAnnotation::Primitive(ValueKind::U32),
            "u64" => TypeAnnotation::Primitive(ValueKind::U64),
            "f32" => TypeAnnotation::Primitive(ValueKind::F32),
            "f64" => TypeAnnotation::Primitive(ValueKind::F64),
            "rune" => TypeAnnotation::Primitive(ValueKind::Rune),
            "string" => TypeAnnotation::Primitive(ValueKind::String),
            other => TypeAnnotation::Object(other.to_string()),
        })
    }

    fn parse_let(&mut self) -> PResult<StmtKind> {
        self.advance();
        let name = self.expect_ident()?;
        let type_annotation = self.parse_type_annotation()?;
        let initializer = if self.matches(&TokenKind::Equal) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        self.matches(&TokenKind::Semicolon);
        Ok(StmtKind::Let {
            name,
            type_annotation,
            initializer,
        })
    }

    fn parse_const(&mut self) -> PResult<StmtKind> {
        self.advance();
        let name = self.expect_ident()?;
        let type_annotation = self.parse_type_annotation()?;
        self.expect(&TokenKind::Equal, "'=' in const declaration")?;
        let initializer = self.parse_expr()?;
        self.matches(&TokenKind::Semicolon);
        Ok(StmtKind::Const {
            name,
            type_annotation,
            initializer,
        })
    }

    fn parse_params(&mut self) -> PResult<Vec<Param>> {
        self.expect(&TokenKind::LeftParen, "'('")?;
        let mut params = Vec::new();
        while !self.check(&TokenKind::RightParen) {
            let name = self.expect_ident()?;
            let type_annotation = self.parse_type_annotation()?;
            params.push(Param { name, type_annotation });
            if !self.matches(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RightParen, "')'")?;
        Ok(params)
    }

    fn parse_return_type(&mut self) -> PResult<TypeAnnotation> {
        if self.matches(&TokenKind::Arrow) {
            self.parse_type_ref()
        } else {
            Ok(TypeAnnotation::Unknown)
        }
    }

    fn parse_function_decl(&mut self) -> PResult<StmtKind> {
        self.advance();
        let name = self.expect_ident()?;
        let params = self.parse_params()?;
        let return_type = self.parse_return_type()?;
        let body = self.parse_block()?;
        Ok(StmtKind::FunctionDecl(FunctionDecl {
            name,
            params,
            return_type,
            body,
        }))
    }

    fn parse_block(&mut self) -> PResult<Vec<Stmt>> {
        self.expect(&TokenKind::LeftBrace, "'{'")?;
        let mut stmts = Vec::new();
        while !self.check(&TokenKind::RightBrace) && !self.at_eof() {
            stmts.push(self.parse_stmt()?);
        }
        self.expect(&TokenKind::RightBrace, "'}'")?;
        Ok(stmts)
    }

    fn parse_single_or_block(&mut self) -> PResult<Box<Stmt>> {
        Ok(Box::new(self.parse_stmt()?))
    }

    fn parse_if(&mut self) -> PResult<StmtKind> {
        self.advance();
        self.expect(&TokenKind::LeftParen, "'(' after 'if'")?;
        let condition = self.parse_expr()?;
        self.expect(&TokenKind::RightParen, "')'")?;
        let then_branch = self.parse_single_or_block()?;
        let else_branch = if self.matches(&TokenKind::Else) {
            Some(self.parse_single_or_block()?)
        } else {
            None
        };
        Ok(StmtKind::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn parse_while(&mut self) -> PResult<StmtKind> {
        self.advance();
        self.expect(&TokenKind::LeftParen, "'(' after 'while'")?;
        let condition = self.parse_expr()?;
        self.expect(&TokenKind::RightParen, "')'")?;
        let body = self.parse_single_or_block()?;
        Ok(StmtKind::While { condition, body })
    }

    fn parse_for(&mut self) -> PResult<StmtKind> {
        self.advance();
        self.expect(&TokenKind::LeftParen, "'(' after 'for'")?;

        // for-in: `for (k, v in iterable)` or `for (v in iterable)`
        if let TokenKind::Ident(first) = self.peek_kind().clone() {
            let save = self.pos;
            self.advance();
            if self.matches(&TokenKind::Comma) {
                let value = self.expect_ident()?;
                self.expect(&TokenKind::In, "'in'")?;
                let iterable = self.parse_expr()?;
                self.expect(&TokenKind::RightParen, "')'")?;
                let body = self.parse_single_or_block()?;
                return Ok(StmtKind::ForIn {
                    key: Some(first),
                    value,
                    iterable,
                    body,
                });
            } else if self.matches(&TokenKind::In) {
                let iterable = self.parse_expr()?;
                self.expect(&TokenKind::RightParen, "')'")?;
                let body = self.parse_single_or_block()?;
                return Ok(StmtKind::ForIn {
                    key: None,
                    value: first,
                    iterable,
                    body,
                });
            }
            self.pos = save;
        }

        let init = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(Box::new(self.parse_stmt()?))
        };
        if init.is_none() {
            self.expect(&TokenKind::Semicolon, "';'")?;
        }
        let condition = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(&TokenKind::Semicolon, "';'")?;
        let increment = if self.check(&TokenKind::RightParen) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(&TokenKind::RightParen, "')'")?;
        let body = self.parse_single_or_block()?;
        Ok(StmtKind::For {
            init,
            condition,
            increment,
            body,
        })
    }

    fn parse_return(&mut self) -> PResult<StmtKind> {
        self.advance();
        let value = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.matches(&TokenKind::Semicolon);
        Ok(StmtKind::Return(value))
    }

    fn parse_try(&mut self) -> PResult<StmtKind> {
        self.advance();
        let body = self.parse_block()?;
        let catch = if self.matches(&TokenKind::Catch) {
            let param = if self.matches(&TokenKind::LeftParen) {
                let name = self.expect_ident()?;
                self.expect(&TokenKind::RightParen, "')'")?;
                Some(name)
            } else {
                None
            };
            let body = self.parse_block()?;
            Some(CatchClause { param, body })
        } else {
            None
        };
        let finally = if self.matches(&TokenKind::Finally) {
            Some(self.parse_block()?)
        } else {
            None
        };
        Ok(StmtKind::Try { body, catch, finally })
    }

    fn parse_switch(&mut self) -> PResult<StmtKind> {
        self.advance();
        self.expect(&TokenKind::LeftParen, "'(' after 'switch'")?;
        let discriminant = self.parse_expr()?;
        self.expect(&TokenKind::RightParen, "')'")?;
        self.expect(&TokenKind::LeftBrace, "'{'")?;
        let mut cases = Vec::new();
        let mut default = None;
        while !self.check(&TokenKind::RightBrace) && !self.at_eof() {
            if self.matches(&TokenKind::Case) {
                let value = self.parse_expr()?;
                self.expect(&TokenKind::Colon, "':'")?;
                let mut body = Vec::new();
                while !matches!(self.peek_kind(), TokenKind::Case | TokenKind::Default | TokenKind::RightBrace) {
                    body.push(self.parse_stmt()?);
                }
                cases.push(SwitchCase { value, body });
            } else if self.matches(&TokenKind::Default) {
                self.expect(&TokenKind::Colon, "':'")?;
                let mut body = Vec::new();
                while !matches!(self.peek_kind(), TokenKind::Case | TokenKind::Default | TokenKind::RightBrace) {
                    body.push(self.parse_stmt()?);
                }
                default = Some(body);
            } else {
                self.error("expected 'case' or 'default'".to_string());
                return Err(());
            }
        }
        self.expect(&TokenKind::RightBrace, "'}'")?;
        Ok(StmtKind::Switch {
            discriminant,
            cases,
            default,
        })
    }

    fn parse_define_object(&mut self) -> PResult<StmtKind> {
        self.advance();
        let name = self.expect_ident()?;
        self.expect(&TokenKind::LeftBrace, "'{'")?;
        let mut fields = Vec::new();
        while !self.check(&TokenKind::RightBrace) {
            let is_optional = self.matches(&TokenKind::Question);
            let name = self.expect_ident()?;
            let type_annotation = self.parse_type_annotation()?;
            let default_value = if self.matches(&TokenKind::Equal) {
                Some(self.parse_expr()?)
            } else {
                None
            };
            fields.push(ObjectFieldDef {
                name,
                type_annotation,
                is_optional,
                default_value,
            });
            if !self.matches(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RightBrace, "'}'")?;
        Ok(StmtKind::DefineObject { name, fields })
    }

    fn parse_enum(&mut self) -> PResult<StmtKind> {
        self.advance();
        let name = self.expect_ident()?;
        self.expect(&TokenKind::LeftBrace, "'{'")?;
        let mut variants = Vec::new();
        while !self.check(&TokenKind::RightBrace) {
            let name = self.expect_ident()?;
            let value = if self.matches(&TokenKind::Equal) {
                Some(self.parse_expr()?)
            } else {
                None
            };
            variants.push(EnumVariant { name, value });
            if !self.matches(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RightBrace, "'}'")?;
        Ok(StmtKind::Enum { name, variants })
    }

    fn parse_import(&mut self) -> PResult<StmtKind> {
        self.advance();
        let kind = if self.matches(&TokenKind::Star) {
            self.expect(&TokenKind::As, "'as'")?;
            let alias = self.expect_ident()?;
            ImportKind::Namespace { alias }
        } else {
            self.expect(&TokenKind::LeftBrace, "'{'")?;
            let mut specs = Vec::new();
            while !self.check(&TokenKind::RightBrace) {
                let imported_name = self.expect_ident()?;
                let local_name = if self.matches(&TokenKind::As) {
                    self.expect_ident()?
                } else {
                    imported_name.clone()
                };
                specs.push(ImportSpecifier {
                    imported_name,
                    local_name,
                });
                if !self.matches(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(&TokenKind::RightBrace, "'}'")?;
            ImportKind::Named(specs)
        };
        self.expect(&TokenKind::From, "'from'")?;
        let source_span = self.peek().span;
        let source = self.expect_string()?;
        self.matches(&TokenKind::Semicolon);
        Ok(StmtKind::Import(ImportDecl {
            source,
            kind,
            span: source_span,
        }))
    }

    fn parse_import_ffi(&mut self) -> PResult<StmtKind> {
        self.advance();
        let span = self.peek().span;
        let library_path = Expr {
            kind: ExprKind::StringLiteral(self.expect_string()?),
            span,
        };
        self.expect(&TokenKind::As, "'as'")?;
        let alias = self.expect_ident()?;
        self.matches(&TokenKind::Semicolon);
        Ok(StmtKind::ImportFfi { library_path, alias })
    }

    fn expect_string(&mut self) -> PResult<String> {
        if let TokenKind::String(s) = self.peek_kind().clone() {
            self.advance();
            Ok(s)
        } else {
            self.error("expected string literal".to_string());
            Err(())
        }
    }

    fn parse_export(&mut self) -> PResult<StmtKind> {
        self.advance();
        let inner = self.parse_stmt()?;
        Ok(StmtKind::Export(Box::new(inner)))
    }

    fn parse_extern_fn(&mut self) -> PResult<StmtKind> {
        self.advance();
        self.expect(&TokenKind::Fn, "'fn' after 'extern'")?;
        let name = self.expect_ident()?;
        let params = self.parse_params()?;
        let return_type = self.parse_return_type()?;
        self.matches(&TokenKind::Semicolon);
        Ok(StmtKind::ExternFn {
            name,
            params,
            return_type,
        })
    }

    // --- expressions (precedence climbing) ---

    fn parse_expr(&mut self) -> PResult<Expr> {
        self.parse_assignment()
    }

    /// Parse a single standalone expression. Used by other crate modules'
    /// tests that need an `Expr` without a full statement around it.
    #[cfg(test)]
    pub fn parse_expr_for_test(&mut self) -> Expr {
        self.parse_expr().expect("test expression should parse")
    }

    fn parse_assignment(&mut self) -> PResult<Expr> {
        let expr = self.parse_ternary()?;
        if self.matches(&TokenKind::Equal) {
            let value = self.parse_assignment()?;
            let span = expr.span.merge(value.span);
            return Ok(match expr.kind {
                ExprKind::Index { object, index, .. } => Expr {
                    kind: ExprKind::IndexAssign { object, index, value: Box::new(value) },
                    span,
                },
                ExprKind::GetProperty { object, name, .. } => Expr {
                    kind: ExprKind::SetProperty { object, name, value: Box::new(value) },
                    span,
                },
                _ => Expr {
                    kind: ExprKind::Assign {
                        target: Box::new(expr),
                        value: Box::new(value),
                    },
                    span,
                },
            });
        }
        Ok(expr)
    }

    fn parse_ternary(&mut self) -> PResult<Expr> {
        let condition = self.parse_null_coalesce()?;
        if self.matches(&TokenKind::Question) {
            let then_expr = self.parse_expr()?;
            self.expect(&TokenKind::Colon, "':' in ternary")?;
            let else_expr = self.parse_expr()?;
            let span = condition.span.merge(else_expr.span);
            return Ok(Expr {
                kind: ExprKind::Ternary {
                    condition: Box::new(condition),
                    then_expr: Box::new(then_expr),
                    else_expr: Box::new(else_expr),
                },
                span,
            });
        }
        Ok(condition)
    }

    fn parse_null_coalesce(&mut self) -> PResult<Expr> {
        let mut left = self.parse_logical_or()?;
        while self.matches(&TokenKind::QuestionQuestion) {
            let right = self.parse_logical_or()?;
            let span = left.span.merge(right.span);
            left = Expr {
                kind: ExprKind::NullCoalesce {
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            };
        }
        Ok(left)
    }

    fn parse_binary_level(
        &mut self,
        next: fn(&mut Self) -> PResult<Expr>,
        ops: &[(TokenKind, BinaryOp)],
    ) -> PResult<Expr> {
        let mut left = next(self)?;
        loop {
            let Some((_, op)) = ops.iter().find(|(k, _)| self.check(k)) else {
                break;
            };
            self.advance();
            let right = next(self)?;
            let span = left.span.merge(right.span);
            left = Expr {
                kind: ExprKind::Binary {
                    op: *op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            };
        }
        Ok(left)
    }

    fn parse_logical_or(&mut self) -> PResult<Expr> {
        self.parse_binary_level(Self::parse_logical_and, &[(TokenKind::PipePipe, BinaryOp::Or)])
    }

    fn parse_logical_and(&mut self) -> PResult<Expr> {
        self.parse_binary_level(Self::parse_equality, &[(TokenKind::AmpAmp, BinaryOp::And)])
    }

    fn parse_equality(&mut self) -> PResult<Expr> {
        self.parse_binary_level(
            Self::parse_comparison,
            &[
                (TokenKind::EqualEqual, BinaryOp::Eq),
                (TokenKind::BangEqual, BinaryOp::NotEq),
            ],
        )
    }

    fn parse_comparison(&mut self) -> PResult<Expr> {
        self.parse_binary_level(
            Self::parse_additive,
            &[
                (TokenKind::Less, BinaryOp::Lt),
                (TokenKind::LessEqual, BinaryOp::LtEq),
                (TokenKind::Greater, BinaryOp::Gt),
                (TokenKind::GreaterEqual, BinaryOp::GtEq),
            ],
        )
    }

    fn parse_additive(&mut self) -> PResult<Expr> {
        self.parse_binary_level(
            Self::parse_multiplicative,
            &[(TokenKind::Plus, BinaryOp::Add), (TokenKind::Minus, BinaryOp::Sub)],
        )
    }

    fn parse_multiplicative(&mut self) -> PResult<Expr> {
        self.parse_binary_level(
            Self::parse_unary,
            &[
                (TokenKind::Star, BinaryOp::Mul),
                (TokenKind::Slash, BinaryOp::Div),
                (TokenKind::Percent, BinaryOp::Mod),
            ],
        )
    }

    fn parse_unary(&mut self) -> PResult<Expr> {
        let start = self.peek().span;
        if self.matches(&TokenKind::Minus) {
            let operand = self.parse_unary()?;
            let span = start.merge(operand.span);
            return Ok(Expr {
                kind: ExprKind::Unary { op: UnaryOp::Neg, operand: Box::new(operand) },
                span,
            });
        }
        if self.matches(&TokenKind::Bang) {
            let operand = self.parse_unary()?;
            let span = start.merge(operand.span);
            return Ok(Expr {
                kind: ExprKind::Unary { op: UnaryOp::Not, operand: Box::new(operand) },
                span,
            });
        }
        if self.matches(&TokenKind::PlusPlus) {
            let operand = self.parse_unary()?;
            let span = start.merge(operand.span);
            return Ok(Expr { kind: ExprKind::PreIncrement(Box::new(operand)), span });
        }
        if self.matches(&TokenKind::MinusMinus) {
            let operand = self.parse_unary()?;
            let span = start.merge(operand.span);
            return Ok(Expr { kind: ExprKind::PreDecrement(Box::new(operand)), span });
        }
        if self.matches(&TokenKind::Await) {
            let operand = self.parse_unary()?;
            let span = start.merge(operand.span);
            return Ok(Expr { kind: ExprKind::Await(Box::new(operand)), span });
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> PResult<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.matches(&TokenKind::Dot) {
                let name = self.expect_ident()?;
                let span = expr.span;
                expr = Expr {
                    kind: ExprKind::GetProperty { object: Box::new(expr), name, optional: false },
                    span,
                };
            } else if self.matches(&TokenKind::QuestionDot) {
                if self.matches(&TokenKind::LeftBracket) {
                    let index = self.parse_expr()?;
                    self.expect(&TokenKind::RightBracket, "']'")?;
                    let span = expr.span.merge(index.span);
                    expr = Expr {
                        kind: ExprKind::Index { object: Box::new(expr), index: Box::new(index), optional: true },
                        span,
                    };
                } else if self.matches(&TokenKind::LeftParen) {
                    let args = self.parse_args()?;
                    let span = expr.span;
                    expr = Expr {
                        kind: ExprKind::Call { callee: Box::new(expr), args, optional: true },
                        span,
                    };
                } else {
                    let name = self.expect_ident()?;
                    let span = expr.span;
                    expr = Expr {
                        kind: ExprKind::GetProperty { object: Box::new(expr), name, optional: true },
                        span,
                    };
                }
            } else if self.matches(&TokenKind::LeftBracket) {
                let index = self.parse_expr()?;
                self.expect(&TokenKind::RightBracket, "']'")?;
                let span = expr.span.merge(index.span);
                expr = Expr {
                    kind: ExprKind::Index { object: Box::new(expr), index: Box::new(index), optional: false },
                    span,
                };
            } else if self.matches(&TokenKind::LeftParen) {
                let args = self.parse_args()?;
                let span = expr.span;
                expr = Expr {
                    kind: ExprKind::Call { callee: Box::new(expr), args, optional: false },
                    span,
                };
            } else if self.matches(&TokenKind::PlusPlus) {
                let span = expr.span;
                expr = Expr { kind: ExprKind::PostIncrement(Box::new(expr)), span };
            } else if self.matches(&TokenKind::MinusMinus) {
                let span = expr.span;
                expr = Expr { kind: ExprKind::PostDecrement(Box::new(expr)), span };
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_args(&mut self) -> PResult<Vec<Expr>> {
        let mut args = Vec::new();
        while !self.check(&TokenKind::RightParen) {
            args.push(self.parse_expr()?);
            if !self.matches(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RightParen, "')'")?;
        Ok(args)
    }

    fn parse_primary(&mut self) -> PResult<Expr> {
        let span = self.peek().span;
        let kind = match self.peek_kind().clone() {
            TokenKind::Integer(n) => {
                self.advance();
                ExprKind::IntLiteral(n)
            }
            TokenKind::Float(f) => {
                self.advance();
                ExprKind::FloatLiteral(f)
            }
            TokenKind::String(s) => {
                self.advance();
                ExprKind::StringLiteral(s)
            }
            TokenKind::InterpolatedString(s) => {
                self.advance();
                ExprKind::Interpolation(parse_interpolation_parts(&s, span))
            }
            TokenKind::Rune(c) => {
                self.advance();
                ExprKind::RuneLiteral(c)
            }
            TokenKind::True => {
                self.advance();
                ExprKind::BoolLiteral(true)
            }
            TokenKind::False => {
                self.advance();
                ExprKind::BoolLiteral(false)
            }
            TokenKind::Null => {
                self.advance();
                ExprKind::NullLiteral
            }
            TokenKind::Ident(name) => {
                self.advance();
                ExprKind::Identifier(name)
            }
            TokenKind::Fn => return self.parse_function_expr(),
            TokenKind::LeftParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(&TokenKind::RightParen, "')'")?;
                return Ok(inner);
            }
            TokenKind::LeftBracket => {
                self.advance();
                let mut elems = Vec::new();
                while !self.check(&TokenKind::RightBracket) {
                    elems.push(self.parse_expr()?);
                    if !self.matches(&TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(&TokenKind::RightBracket, "']'")?;
                ExprKind::ArrayLiteral(elems)
            }
            TokenKind::LeftBrace => {
                self.advance();
                let mut fields = Vec::new();
                while !self.check(&TokenKind::RightBrace) {
                    let name = self.expect_ident()?;
                    self.expect(&TokenKind::Colon, "':'")?;
                    let value = self.parse_expr()?;
                    fields.push((name, value));
                    if !self.matches(&TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(&TokenKind::RightBrace, "'}'")?;
                ExprKind::ObjectLiteral(fields)
            }
            _ => {
                self.error("expected expression".to_string());
                return Err(());
            }
        };
        Ok(Expr { kind, span })
    }

    fn parse_function_expr(&mut self) -> PResult<Expr> {
        let start = self.peek().span;
        self.advance();
        let name = if let TokenKind::Ident(_) = self.peek_kind() {
            Some(self.expect_ident()?)
        } else {
            None
        };
        let params = self.parse_params()?;
        let return_type = self.parse_return_type()?;
        let body = self.parse_block()?;
        Ok(Expr {
            kind: ExprKind::Function(FunctionExpr { name, params, return_type, body }),
            span: start,
        })
    }
}

/// Split a raw interpolated-string token's contents on `{expr}` boundaries.
/// Each embedded expression is itself lexed and parsed independently.
fn parse_interpolation_parts(raw: &str, span: Span) -> Vec<InterpolationPart> {
    let mut parts = Vec::new();
    let mut literal = String::new();
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '{' {
            let mut expr_src = String::new();
            let mut depth = 1;
            for c2 in chars.by_ref() {
                if c2 == '{' {
                    depth += 1;
                } else if c2 == '}' {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                expr_src.push(c2);
            }
            if !literal.is_empty() {
                parts.push(InterpolationPart::Literal(std::mem::take(&mut literal)));
            }
            let mut lexer = crate::lexer::Lexer::new(&expr_src);
            let (tokens, _) = lexer.tokenize();
            let mut parser = Parser::new(tokens);
            if let Ok(expr) = parser.parse_expr() {
                parts.push(InterpolationPart::Expr(expr));
            }
        } else {
            literal.push(c);
        }
    }
    if !literal.is_empty() {
        parts.push(InterpolationPart::Literal(literal));
    }
    let _ = span;
    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn parse(src: &str) -> (Program, Vec<Diagnostic>) {
        let mut lexer = Lexer::new(src);
        let (tokens, _) = lexer.tokenize();
        Parser::new(tokens).parse()
    }

    #[test]
    fn parses_let_with_binary_initializer() {
        let (program, diags) = parse("let x = 1 + 2 * 3;");
        assert!(diags.is_empty());
        assert_eq!(program.statements.len(), 1);
        assert!(matches!(program.statements[0].kind, StmtKind::Let { .. }));
    }

    #[test]
    fn parses_function_with_closure_returning_pair() {
        let src = r#"
            fn make_counter() {
                let n = 0;
                return { inc: fn() { n = n + 1; }, get: fn() { return n; } };
            }
        "#;
        let (program, diags) = parse(src);
        assert!(diags.is_empty());
        assert_eq!(program.statements.len(), 1);
    }

    #[test]
    fn parses_try_catch_finally() {
        let src = r#"
            try {
                return 1;
            } catch (e) {
                print(e);
            } finally {
                print("f");
            }
        "#;
        let (program, diags) = parse(src);
        assert!(diags.is_empty());
        assert!(matches!(program.statements[0].kind, StmtKind::Try { .. }));
    }

    #[test]
    fn parses_optional_chain_and_null_coalesce() {
        let (program, diags) = parse("let x = obj?.field ?? 0;");
        assert!(diags.is_empty());
        assert_eq!(program.statements.len(), 1);
    }

    #[test]
    fn parses_import_and_export() {
        let (program, diags) = parse(r#"import { add } from "math"; export let total = add(1, 2);"#);
        assert!(diags.is_empty());
        assert_eq!(program.statements.len(), 2);
        assert!(matches!(program.statements[0].kind, StmtKind::Import(_)));
        assert!(matches!(program.statements[1].kind, StmtKind::Export(_)));
    }

    #[test]
    fn parses_defer_and_throw() {
        let (program, diags) = parse(r#"fn f() { defer cleanup(); throw "boom"; }"#);
        assert!(diags.is_empty());
        if let StmtKind::FunctionDecl(decl) = &program.statements[0].kind {
            assert!(matches!(decl.body[0].kind, StmtKind::Defer(_)));
            assert!(matches!(decl.body[1].kind, StmtKind::Throw(_)));
        } else {
            panic!("expected function decl");
        }
    }
}
