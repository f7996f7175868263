//! Parse context: owns the lexer, a one-token lookahead, and a push-back
//! stack so the expression and statement parsers can each look one token
//! ahead (and occasionally put one back) without owning scanning logic
//! themselves.

use crate::config::ParserConfig;
use crate::error::{ParseError, ParseErrorKind};
use crate::lexer::Lexer;
use crate::symbols::SymbolStore;
use crate::token::{Token, TokenKind, TokenValue};

pub struct ParseContext {
    lexer: Lexer,
    pub symbols: SymbolStore,
    tok: Token,
    pushed_back: Vec<Token>,
    config: ParserConfig,
}

impl ParseContext {
    pub fn new(source: &str, config: ParserConfig) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(source);
        let mut symbols = SymbolStore::new();
        let tok = lexer.next_token(&mut symbols)?;
        let mut ctx = ParseContext {
            lexer,
            symbols,
            tok,
            pushed_back: Vec::new(),
            config,
        };
        ctx.trace_current();
        Ok(ctx)
    }

    fn trace_current(&self) {
        if self.config.trace_tokens {
            tracing::trace!(kind = ?self.tok.kind, value = ?self.tok.value, line = self.tok.lineno, "token");
        }
    }

    pub fn current(&self) -> &Token {
        &self.tok
    }

    /// Advances to the next token, returning the one just consumed.
    pub fn advance(&mut self) -> Result<Token, ParseError> {
        let next = if let Some(t) = self.pushed_back.pop() {
            t
        } else {
            self.lexer.next_token(&mut self.symbols)?
        };
        let consumed = std::mem::replace(&mut self.tok, next);
        self.trace_current();
        Ok(consumed)
    }

    /// Puts `previous` back as the current token, pushing the token that was
    /// current onto the rewind stack.
    pub fn reverse(&mut self, previous: Token) {
        let displaced = std::mem::replace(&mut self.tok, previous);
        self.pushed_back.push(displaced);
        self.trace_current();
    }

    pub fn at_a(&self, kind: TokenKind, value: Option<&TokenValue>) -> bool {
        self.tok.kind == kind && value.map_or(true, |v| &self.tok.value == v)
    }

    pub fn at_keyword(&self, name: &str) -> bool {
        self.tok.is_keyword(name)
    }

    pub fn at_punctuation(&self, text: &str) -> bool {
        self.tok.is_punctuation(text)
    }

    pub fn at_line_terminator(&self) -> bool {
        self.tok.is_line_terminator()
    }

    /// Advances past the current token if it matches; otherwise leaves it in
    /// place and returns `false`.
    pub fn skip(&mut self, kind: TokenKind, value: Option<&TokenValue>) -> Result<bool, ParseError> {
        if self.at_a(kind, value) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub fn skip_keyword(&mut self, name: &str) -> Result<bool, ParseError> {
        if self.at_keyword(name) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub fn skip_punctuation(&mut self, text: &str) -> Result<bool, ParseError> {
        if self.at_punctuation(text) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Consumes the current token if it matches both `kind` and `value`,
    /// failing with `UnexpectedToken` otherwise.
    pub fn consume(&mut self, kind: TokenKind, value: Option<&TokenValue>) -> Result<Token, ParseError> {
        let kind_matches = self.tok.kind == kind;
        let value_matches = value.map_or(true, |v| &self.tok.value == v);
        if kind_matches && value_matches {
            self.advance()
        } else {
            Err(ParseError::at(
                self.tok.lineno,
                ParseErrorKind::UnexpectedToken,
                format!("unexpected token {:?}", self.tok.kind),
            ))
        }
    }

    pub fn consume_keyword(&mut self, name: &str) -> Result<Token, ParseError> {
        if self.at_keyword(name) {
            self.advance()
        } else {
            Err(ParseError::at(
                self.tok.lineno,
                ParseErrorKind::UnexpectedToken,
                format!("expected keyword '{name}', found {:?}", self.tok.kind),
            ))
        }
    }

    pub fn consume_punctuation(&mut self, text: &str) -> Result<Token, ParseError> {
        if self.at_punctuation(text) {
            self.advance()
        } else {
            Err(ParseError::at(
                self.tok.lineno,
                ParseErrorKind::UnexpectedToken,
                format!("expected '{text}', found {:?}", self.tok.kind),
            ))
        }
    }
}
