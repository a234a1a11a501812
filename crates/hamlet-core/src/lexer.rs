//! Lexical analysis (source text to tokens).
//!
//! An external collaborator from the codegen core's point of view — the
//! backend only ever consumes an AST — but implemented here to give the
//! toolchain a real end-to-end path from `.hml` source to generated C.

use crate::diagnostic::{error_codes, Diagnostic};
use crate::span::Span;
use crate::token::{Token, TokenKind};

pub struct Lexer<'a> {
    chars: Vec<char>,
    pos: usize,
    diagnostics: Vec<Diagnostic>,
    _source: &'a str,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            diagnostics: Vec::new(),
            _source: source,
        }
    }

    pub fn tokenize(&mut self) -> (Vec<Token>, Vec<Diagnostic>) {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia();
            let start = self.pos;
            let Some(c) = self.peek() else {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    span: Span::new(start, start),
                });
                break;
            };

            let kind = if c.is_ascii_digit() {
                self.lex_number()
            } else if c == '"' {
                self.lex_string()
            } else if c == '\'' {
                self.lex_rune()
            } else if is_ident_start(c) {
                self.lex_ident_or_keyword()
            } else {
                self.lex_operator()
            };

            if let Some(kind) = kind {
                tokens.push(Token {
                    kind,
                    span: Span::new(start, self.pos),
                });
            }
        }
        (tokens, std::mem::take(&mut self.diagnostics))
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.pos += 1;
                }
                Some('/') if self.peek_at(1) == Some('/') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.pos += 1;
                    }
                }
                _ => break,
            }
        }
    }

    fn lex_number(&mut self) -> Option<TokenKind> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        let mut is_float = false;
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            self.pos += 1;
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.pos += 1;
            }
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        if is_float {
            Some(TokenKind::Float(text.parse().unwrap_or(0.0)))
        } else {
            Some(TokenKind::Integer(text.parse().unwrap_or(0)))
        }
    }

    fn lex_string(&mut self) -> Option<TokenKind> {
        self.advance(); // opening quote
        let mut value = String::new();
        let mut has_interpolation = false;
        loop {
            match self.advance() {
                None | Some('"') => break,
                Some('\\') => match self.advance() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('"') => value.push('"'),
                    Some('\\') => value.push('\\'),
                    Some(other) => value.push(other),
                    None => break,
                },
                Some('{') => {
                    has_interpolation = true;
                    value.push('{');
                }
                Some(c) => value.push(c),
            }
        }
        Some(if has_interpolation {
            TokenKind::InterpolatedString(value)
        } else {
            TokenKind::String(value)
        })
    }

    fn lex_rune(&mut self) -> Option<TokenKind> {
        self.advance(); // opening quote
        let c = self.advance().unwrap_or('\0');
        if self.peek() == Some('\'') {
            self.advance();
        }
        Some(TokenKind::Rune(c))
    }

    fn lex_ident_or_keyword(&mut self) -> Option<TokenKind> {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_continue) {
            self.pos += 1;
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        match text.as_str() {
            "true" => Some(TokenKind::True),
            "false" => Some(TokenKind::False),
            _ => Some(TokenKind::keyword_from_str(&text).unwrap_or(TokenKind::Ident(text))),
        }
    }

    fn lex_operator(&mut self) -> Option<TokenKind> {
        let c = self.advance().unwrap();
        let kind = match c {
            '+' if self.peek() == Some('+') => {
                self.advance();
                TokenKind::PlusPlus
            }
            '-' if self.peek() == Some('-') => {
                self.advance();
                TokenKind::MinusMinus
            }
            '-' if self.peek() == Some('>') => {
                self.advance();
                TokenKind::Arrow
            }
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '=' if self.peek() == Some('=') => {
                self.advance();
                TokenKind::EqualEqual
            }
            '=' => TokenKind::Equal,
            '!' if self.peek() == Some('=') => {
                self.advance();
                TokenKind::BangEqual
            }
            '!' => TokenKind::Bang,
            '<' if self.peek() == Some('=') => {
                self.advance();
                TokenKind::LessEqual
            }
            '<' => TokenKind::Less,
            '>' if self.peek() == Some('=') => {
                self.advance();
                TokenKind::GreaterEqual
            }
            '>' => TokenKind::Greater,
            '&' if self.peek() == Some('&') => {
                self.advance();
                TokenKind::AmpAmp
            }
            '|' if self.peek() == Some('|') => {
                self.advance();
                TokenKind::PipePipe
            }
            '?' if self.peek() == Some('?') => {
                self.advance();
                TokenKind::QuestionQuestion
            }
            '?' if self.peek() == Some('.') => {
                self.advance();
                TokenKind::QuestionDot
            }
            '?' => TokenKind::Question,
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '{' => TokenKind::LeftBrace,
            '}' => TokenKind::RightBrace,
            '[' => TokenKind::LeftBracket,
            ']' => TokenKind::RightBracket,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            ';' => TokenKind::Semicolon,
            '.' => TokenKind::Dot,
            other => {
                self.diagnostics.push(Diagnostic::error_with_code(
                    error_codes::PARSE_FAILURE,
                    format!("unexpected character '{other}'"),
                    Span::new(self.pos - 1, self.pos),
                ));
                return None;
            }
        };
        Some(kind)
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexes_let_statement() {
        let mut lexer = Lexer::new("let x = 42;");
        let (tokens, diags) = lexer.tokenize();
        assert!(diags.is_empty());
        let kinds: Vec<_> = tokens.iter().map(|t| &t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                &TokenKind::Let,
                &TokenKind::Ident("x".into()),
                &TokenKind::Equal,
                &TokenKind::Integer(42),
                &TokenKind::Semicolon,
                &TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_optional_chain_operators() {
        let mut lexer = Lexer::new("a?.b ?? c");
        let (tokens, _) = lexer.tokenize();
        assert!(tokens.iter().any(|t| t.kind == TokenKind::QuestionDot));
        assert!(tokens.iter().any(|t| t.kind == TokenKind::QuestionQuestion));
    }

    #[test]
    fn reports_unexpected_character() {
        let mut lexer = Lexer::new("let x = @;");
        let (_, diags) = lexer.tokenize();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, error_codes::PARSE_FAILURE);
    }

    #[test]
    fn detects_interpolated_string() {
        let mut lexer = Lexer::new(r#""hello, {name}!""#);
        let (tokens, _) = lexer.tokenize();
        assert!(matches!(tokens[0].kind, TokenKind::InterpolatedString(_)));
    }
}
