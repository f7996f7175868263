//! Lexical token model.

use std::rc::Rc;

use crate::symbols::Variable;
use crate::types::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Newline,
    Eof,
    Id,
    Keyword,
    Variable,
    Procedure,
    StringLit,
    BaseLit,
    ExpLit,
    DecLit,
    IntLit,
    Punctuation,
    LineNum,
    LineLabel,
    LineNumLabel,
}

/// The payload a token carries, shaped by its `TokenKind`.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenValue {
    None,
    Str(String),
    Int(i64),
    Float(f64),
    /// `_float` literal mantissa/decimal-exponent pair.
    MantissaExp(i64, i64),
    Variable(Rc<Variable>),
    /// Procedure tokens only carry the resolved name; the full `Procedure`
    /// stays owned by the symbol store to avoid aliasing it mutably.
    Procedure(String),
    Id(String, Rc<Type>),
    LineNum(u64),
    LineLabel(String),
    LineNumLabel(u64, String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: TokenValue,
    pub lineno: usize,
}

impl Token {
    pub fn new(kind: TokenKind, value: TokenValue, lineno: usize) -> Self {
        Token { kind, value, lineno }
    }

    pub fn eof(lineno: usize) -> Self {
        Token::new(TokenKind::Eof, TokenValue::None, lineno)
    }

    /// `NEWLINE` carrying one of the four distinguishing spellings:
    /// `"\n"` (real newline), `":"` (statement separator), `"'"` (line
    /// comment), or `"rem"` (REM remark).
    pub fn newline(spelling: &str, lineno: usize) -> Self {
        Token::new(
            TokenKind::Newline,
            TokenValue::Str(spelling.to_string()),
            lineno,
        )
    }

    pub fn is_newline_valued(&self, spelling: &str) -> bool {
        self.kind == TokenKind::Newline && matches!(&self.value, TokenValue::Str(s) if s == spelling)
    }

    /// True for `NEWLINE`, `EOF`, or the keyword `else` — the three things
    /// that can close a single-line statement list.
    pub fn is_line_terminator(&self) -> bool {
        self.kind == TokenKind::Newline
            || self.kind == TokenKind::Eof
            || self.is_keyword("else")
    }

    pub fn is_keyword(&self, name: &str) -> bool {
        self.kind == TokenKind::Keyword
            && matches!(&self.value, TokenValue::Str(s) if s.eq_ignore_ascii_case(name))
    }

    pub fn is_punctuation(&self, text: &str) -> bool {
        self.kind == TokenKind::Punctuation
            && matches!(&self.value, TokenValue::Str(s) if s == text)
    }

    pub fn keyword_name(&self) -> Option<&str> {
        match (&self.kind, &self.value) {
            (TokenKind::Keyword, TokenValue::Str(s)) => Some(s),
            _ => None,
        }
    }
}
