//! Hand-rolled character scanner.
//!
//! No external lexer-generator crate is used — tokens are produced by a
//! direct character-by-character scan over the source text, consulting the
//! symbol table only at the point an identifier needs to be classified.

use crate::error::{ParseError, ParseErrorKind};
use crate::symbols::SymbolStore;
use crate::token::{Token, TokenKind, TokenValue};
use crate::types::{self, Bounds};

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    at_line_start: bool,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Lexer {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            at_line_start: true,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn skip_inline_whitespace(&mut self) {
        while matches!(self.peek(), Some(' ') | Some('\t')) {
            self.bump();
        }
    }

    fn at_newline_seq(&self) -> bool {
        self.peek() == Some('\n') || (self.peek() == Some('\r') && self.peek_at(1) == Some('\n'))
    }

    fn consume_newline_seq(&mut self) {
        if self.peek() == Some('\r') {
            self.bump();
        }
        if self.peek() == Some('\n') {
            self.bump();
        }
        self.line += 1;
    }

    /// `_` followed by optional inline whitespace and a newline splices the
    /// next physical line onto this one; produces no token.
    fn try_consume_line_join(&mut self) -> bool {
        if self.peek() != Some('_') {
            return false;
        }
        let checkpoint = self.pos;
        self.bump();
        while matches!(self.peek(), Some(' ') | Some('\t')) {
            self.bump();
        }
        if self.at_newline_seq() {
            self.consume_newline_seq();
            return true;
        }
        self.pos = checkpoint;
        false
    }

    fn matches_rem_word(&self) -> bool {
        let is_rem = matches!(
            (self.peek_at(0), self.peek_at(1), self.peek_at(2)),
            (Some(a), Some(b), Some(c))
                if a.eq_ignore_ascii_case(&'r') && b.eq_ignore_ascii_case(&'e') && c.eq_ignore_ascii_case(&'m')
        );
        if !is_rem {
            return false;
        }
        match self.peek_at(3) {
            None => true,
            Some(c) => !(c.is_alphanumeric() || c == '_' || c == '.'),
        }
    }

    pub fn next_token(&mut self, symbols: &mut SymbolStore) -> Result<Token, ParseError> {
        self.skip_inline_whitespace();

        if self.try_consume_line_join() {
            return self.next_token(symbols);
        }

        if self.at_newline_seq() {
            let line = self.line;
            self.consume_newline_seq();
            self.at_line_start = true;
            return Ok(Token::newline("\n", line));
        }

        if self.peek().is_none() {
            return Ok(Token::eof(self.line));
        }

        if self.at_line_start {
            if let Some(tok) = self.try_line_prefix()? {
                self.at_line_start = false;
                return Ok(tok);
            }
        }
        self.at_line_start = false;

        let ch = self.peek().unwrap();
        match ch {
            ':' => {
                self.bump();
                Ok(Token::newline(":", self.line))
            }
            '\'' => self.lex_comment(),
            '"' => self.lex_string(),
            '&' if matches!(self.peek_at(1), Some(c) if matches!(c.to_ascii_uppercase(), 'H' | 'O' | 'B')) =>
            {
                self.lex_base_lit(symbols)
            }
            c if c.is_ascii_digit() || c == '.' => self.lex_number(),
            c if c.is_alphabetic() || c == '_' || c == '?' => {
                if self.matches_rem_word() {
                    self.lex_remark()
                } else {
                    self.lex_id_or_keyword(symbols)
                }
            }
            _ => self.lex_punctuation_or_error(),
        }
    }

    fn try_line_prefix(&mut self) -> Result<Option<Token>, ParseError> {
        let start_line = self.line;
        let checkpoint = self.pos;
        let Some(c) = self.peek() else {
            return Ok(None);
        };

        if c.is_ascii_digit() {
            let mut digits = String::new();
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    digits.push(c);
                    self.bump();
                } else {
                    break;
                }
            }
            let after_digits = self.pos;
            self.skip_inline_whitespace();
            if let Some(label) = self.try_scan_bare_label_text() {
                self.skip_inline_whitespace();
                if self.peek() == Some(':') {
                    self.bump();
                    let num: u64 = digits.parse().map_err(|_| {
                        ParseError::at(start_line, ParseErrorKind::LiteralOutOfRange, "line number out of range")
                    })?;
                    return Ok(Some(Token::new(
                        TokenKind::LineNumLabel,
                        TokenValue::LineNumLabel(num, label),
                        start_line,
                    )));
                }
            }
            self.pos = after_digits;
            let num: u64 = digits.parse().map_err(|_| {
                ParseError::at(start_line, ParseErrorKind::LiteralOutOfRange, "line number out of range")
            })?;
            return Ok(Some(Token::new(TokenKind::LineNum, TokenValue::LineNum(num), start_line)));
        }

        if c.is_alphabetic() || c == '_' {
            if let Some(label) = self.try_scan_bare_label_text() {
                self.skip_inline_whitespace();
                if self.peek() == Some(':') {
                    self.bump();
                    return Ok(Some(Token::new(
                        TokenKind::LineLabel,
                        TokenValue::LineLabel(label),
                        start_line,
                    )));
                }
            }
            self.pos = checkpoint;
            return Ok(None);
        }

        Ok(None)
    }

    fn try_scan_bare_label_text(&mut self) -> Option<String> {
        let checkpoint = self.pos;
        if !matches!(self.peek(), Some(c) if c.is_alphabetic() || c == '_') {
            return None;
        }
        let mut s = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == '.' {
                s.push(c);
                self.bump();
            } else {
                break;
            }
        }
        let mut trailing_dots = 0usize;
        while s.ends_with('.') {
            s.pop();
            trailing_dots += 1;
        }
        self.pos -= trailing_dots;
        if s.is_empty() {
            self.pos = checkpoint;
            return None;
        }
        Some(s)
    }

    fn lex_comment(&mut self) -> Result<Token, ParseError> {
        let line = self.line;
        self.bump(); // '
        while self.peek().is_some() && !self.at_newline_seq() {
            self.bump();
        }
        if self.at_newline_seq() {
            self.consume_newline_seq();
            self.at_line_start = true;
        }
        Ok(Token::newline("'", line))
    }

    fn lex_remark(&mut self) -> Result<Token, ParseError> {
        let line = self.line;
        self.bump();
        self.bump();
        self.bump(); // R E M
        while self.peek().is_some() && !self.at_newline_seq() {
            self.bump();
        }
        if self.at_newline_seq() {
            self.consume_newline_seq();
            self.at_line_start = true;
        }
        Ok(Token::newline("rem", line))
    }

    fn lex_string(&mut self) -> Result<Token, ParseError> {
        let line = self.line;
        self.bump(); // opening quote
        let mut s = String::new();
        loop {
            match self.peek() {
                None => {
                    return Err(ParseError::at(line, ParseErrorKind::StrayCharacter, "unterminated string literal"))
                }
                Some('"') => {
                    self.bump();
                    break;
                }
                Some('\n') | Some('\r') => {
                    return Err(ParseError::at(line, ParseErrorKind::StrayCharacter, "unterminated string literal"))
                }
                Some(c) => {
                    s.push(c);
                    self.bump();
                }
            }
        }
        Ok(Token::new(TokenKind::StringLit, TokenValue::Str(s), line))
    }

    fn lex_number(&mut self) -> Result<Token, ParseError> {
        let start_line = self.line;
        let mut int_part = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                int_part.push(c);
                self.bump();
            } else {
                break;
            }
        }
        let mut frac_part = String::new();
        let mut has_dot = false;
        if self.peek() == Some('.') {
            has_dot = true;
            self.bump();
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    frac_part.push(c);
                    self.bump();
                } else {
                    break;
                }
            }
        }
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(ParseError::at(
                start_line,
                ParseErrorKind::StrayCharacter,
                "expected digits in numeric literal",
            ));
        }

        if matches!(self.peek(), Some('D') | Some('d') | Some('E') | Some('e') | Some('F') | Some('f')) {
            return self.lex_exp_lit(int_part, frac_part, start_line);
        }

        if has_dot {
            let text = format!("{int_part}.{frac_part}");
            let v: f64 = text
                .parse()
                .map_err(|_| ParseError::at(start_line, ParseErrorKind::StrayCharacter, "invalid decimal literal"))?;
            return Ok(Token::new(TokenKind::DecLit, TokenValue::Float(v), start_line));
        }

        let v: i64 = int_part.parse().map_err(|_| {
            ParseError::at(start_line, ParseErrorKind::LiteralOutOfRange, "integer literal out of range")
        })?;
        Ok(Token::new(TokenKind::IntLit, TokenValue::Int(v), start_line))
    }

    fn lex_exp_lit(&mut self, int_part: String, frac_part: String, start_line: usize) -> Result<Token, ParseError> {
        let flag = self.bump().unwrap();
        let mut negative = false;
        if matches!(self.peek(), Some('+') | Some('-')) {
            negative = self.peek() == Some('-');
            self.bump();
        }
        let mut exp_digits = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                exp_digits.push(c);
                self.bump();
            } else {
                break;
            }
        }
        let magnitude: i64 = if exp_digits.is_empty() { 0 } else {
            exp_digits
                .parse()
                .map_err(|_| ParseError::at(start_line, ParseErrorKind::LiteralOutOfRange, "exponent out of range"))?
        };
        let exponent = if negative { -magnitude } else { magnitude };

        match flag {
            'F' | 'f' => {
                let mantissa_text = format!("{int_part}{frac_part}");
                let mantissa: i64 = mantissa_text.parse().map_err(|_| {
                    ParseError::at(start_line, ParseErrorKind::StrayCharacter, "invalid _float literal mantissa")
                })?;
                let decimal_exponent = exponent - frac_part.len() as i64;
                Ok(Token::new(
                    TokenKind::ExpLit,
                    TokenValue::MantissaExp(mantissa, decimal_exponent),
                    start_line,
                ))
            }
            'D' | 'd' | 'E' | 'e' => {
                let text = format!("{int_part}.{frac_part}e{exponent}");
                let v: f64 = text.parse().map_err(|_| {
                    ParseError::at(start_line, ParseErrorKind::StrayCharacter, "invalid exponent literal")
                })?;
                let type_name = if matches!(flag, 'D' | 'd') { "double" } else { "single" };
                let ty = &types::builtin_types()[type_name];
                let in_range = matches!(ty.bounds, Bounds::Float(min, max) if v >= min && v <= max);
                if !in_range {
                    return Err(ParseError::at(
                        start_line,
                        ParseErrorKind::LiteralOutOfRange,
                        "literal outside range of requested type",
                    ));
                }
                Ok(Token::new(TokenKind::ExpLit, TokenValue::Float(v), start_line))
            }
            _ => unreachable!(),
        }
    }

    fn lex_base_lit(&mut self, symbols: &mut SymbolStore) -> Result<Token, ParseError> {
        let start_line = self.line;
        self.bump(); // '&'
        let kind_char = self.bump().unwrap();
        let (radix, digit_ok): (u32, fn(char) -> bool) = match kind_char.to_ascii_uppercase() {
            'H' => (16, |c: char| c.is_ascii_hexdigit()),
            'O' => (8, |c: char| matches!(c, '0'..='7')),
            'B' => (2, |c: char| matches!(c, '0' | '1')),
            _ => unreachable!(),
        };
        let mut digits = String::new();
        while let Some(c) = self.peek() {
            if digit_ok(c) {
                digits.push(c);
                self.bump();
            } else {
                break;
            }
        }
        if digits.is_empty() {
            return Err(ParseError::at(
                start_line,
                ParseErrorKind::StrayCharacter,
                "expected digits after base literal prefix",
            ));
        }
        let magnitude = u128::from_str_radix(&digits, radix).map_err(|_| {
            ParseError::at(start_line, ParseErrorKind::LiteralOutOfRange, "base literal out of range")
        })?;

        let sigil = self.scan_sigil();
        let (value, _ty) = if let Some(sig) = &sigil {
            let ty = symbols.lookup_sigil(Some(sig))?;
            types::constrain_base_int_value(magnitude, &ty)?
        } else {
            types::detect_base_int_type(magnitude)?
        };
        Ok(Token::new(TokenKind::BaseLit, TokenValue::Int(value), start_line))
    }

    fn lex_id_or_keyword(&mut self, symbols: &mut SymbolStore) -> Result<Token, ParseError> {
        let start_line = self.line;
        if self.peek() == Some('?') {
            self.bump();
            return self.classify_name("?", None, symbols, start_line);
        }
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == '.' {
                name.push(c);
                self.bump();
            } else {
                break;
            }
        }
        let mut trailing_dots = 0usize;
        while name.ends_with('.') {
            name.pop();
            trailing_dots += 1;
        }
        self.pos -= trailing_dots;

        let sigil = self.scan_sigil();
        self.classify_name(&name, sigil, symbols, start_line)
    }

    fn scan_sigil(&mut self) -> Option<String> {
        let mut s = String::new();
        match self.peek() {
            Some('~') => {
                s.push('~');
                self.bump();
                match self.peek() {
                    Some('`') => {
                        s.push('`');
                        self.bump();
                        self.consume_digits(&mut s);
                    }
                    Some('%') => {
                        s.push('%');
                        self.bump();
                        match self.peek() {
                            Some('%') => {
                                s.push('%');
                                self.bump();
                            }
                            Some('&') => {
                                s.push('&');
                                self.bump();
                            }
                            _ => {}
                        }
                    }
                    Some('&') => {
                        s.push('&');
                        self.bump();
                        if self.peek() == Some('&') {
                            s.push('&');
                            self.bump();
                        }
                    }
                    _ => {
                        self.pos -= 1;
                        return None;
                    }
                }
            }
            Some('`') => {
                s.push('`');
                self.bump();
                self.consume_digits(&mut s);
            }
            Some('%') => {
                s.push('%');
                self.bump();
                match self.peek() {
                    Some('%') => {
                        s.push('%');
                        self.bump();
                    }
                    Some('&') => {
                        s.push('&');
                        self.bump();
                    }
                    _ => {}
                }
            }
            Some('&') => {
                s.push('&');
                self.bump();
                if self.peek() == Some('&') {
                    s.push('&');
                    self.bump();
                }
            }
            Some('!') => {
                s.push('!');
                self.bump();
            }
            Some('#') => {
                s.push('#');
                self.bump();
                if self.peek() == Some('#') {
                    s.push('#');
                    self.bump();
                }
            }
            Some('$') => {
                s.push('$');
                self.bump();
                self.consume_digits(&mut s);
            }
            _ => return None,
        }
        Some(s)
    }

    fn consume_digits(&mut self, out: &mut String) {
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                out.push(c);
                self.bump();
            } else {
                break;
            }
        }
    }

    fn classify_name(
        &self,
        raw_name: &str,
        sigil: Option<String>,
        symbols: &mut SymbolStore,
        lineno: usize,
    ) -> Result<Token, ParseError> {
        let name = raw_name.to_lowercase();
        tracing::trace!(%name, ?sigil, "classifying identifier");

        if symbols.is_keyword(&name) {
            return match &sigil {
                None => Ok(Token::new(TokenKind::Keyword, TokenValue::Str(name), lineno)),
                Some(s) if s.starts_with('$') => self.finish_identifier(&name, sigil, symbols, lineno),
                Some(_) => Err(ParseError::at(
                    lineno,
                    ParseErrorKind::IllegalSigilOnKeyword,
                    format!("'{name}' is a keyword and cannot carry a type sigil"),
                )),
            };
        }
        self.finish_identifier(&name, sigil, symbols, lineno)
    }

    fn finish_identifier(
        &self,
        name: &str,
        sigil: Option<String>,
        symbols: &mut SymbolStore,
        lineno: usize,
    ) -> Result<Token, ParseError> {
        let proc_signature = symbols.procedures.get(name).map(|p| p.signature.clone());
        if let Some(signature) = proc_signature {
            if let (Some(sig_text), Some(sig)) = (&sigil, &signature) {
                let resolved = symbols.lookup_sigil(Some(sig_text))?;
                if resolved != sig.ret {
                    return Err(ParseError::at(
                        lineno,
                        ParseErrorKind::ProcedureSigilConflict,
                        format!("'{name}' does not return the type requested by sigil '{sig_text}'"),
                    ));
                }
            }
            return Ok(Token::new(TokenKind::Procedure, TokenValue::Procedure(name.to_string()), lineno));
        }

        if let Some(var) = symbols.find_variable_with_sigil(name, sigil.as_deref())? {
            return Ok(Token::new(TokenKind::Variable, TokenValue::Variable(var), lineno));
        }

        let ty = symbols.lookup_sigil(sigil.as_deref())?;
        Ok(Token::new(TokenKind::Id, TokenValue::Id(name.to_string(), ty), lineno))
    }

    fn lex_punctuation_or_error(&mut self) -> Result<Token, ParseError> {
        let line = self.line;
        let c = self.bump().unwrap();
        let text: &'static str = match c {
            '<' => {
                if self.peek() == Some('=') {
                    self.bump();
                    "<="
                } else if self.peek() == Some('>') {
                    self.bump();
                    "<>"
                } else {
                    "<"
                }
            }
            '>' => {
                if self.peek() == Some('=') {
                    self.bump();
                    ">="
                } else {
                    ">"
                }
            }
            '=' => "=",
            '(' => "(",
            ')' => ")",
            '*' => "*",
            '/' => "/",
            '^' => "^",
            '\\' => "\\",
            '+' => "+",
            '-' => "-",
            ';' => ";",
            ',' => ",",
            '.' => ".",
            '#' => "#",
            _ => {
                return Err(ParseError::at(
                    line,
                    ParseErrorKind::StrayCharacter,
                    format!("unexpected character '{c}'"),
                ))
            }
        };
        Ok(Token::new(TokenKind::Punctuation, TokenValue::Str(text.to_string()), line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(src: &str) -> Vec<Token> {
        let mut symbols = SymbolStore::new();
        let mut lexer = Lexer::new(src);
        let mut out = Vec::new();
        loop {
            let tok = lexer.next_token(&mut symbols).expect("lex error");
            let done = tok.kind == TokenKind::Eof;
            out.push(tok);
            if done {
                break;
            }
        }
        out
    }

    #[test]
    fn keyword_is_case_insensitive() {
        let a = tokens("PRINT");
        let b = tokens("print");
        assert_eq!(a[0].kind, TokenKind::Keyword);
        assert_eq!(b[0].kind, TokenKind::Keyword);
        assert_eq!(a[0].value, b[0].value);
    }

    #[test]
    fn keyword_with_non_dollar_sigil_is_an_error() {
        let mut symbols = SymbolStore::new();
        let mut lexer = Lexer::new("print%");
        assert!(lexer.next_token(&mut symbols).is_err());
    }

    #[test]
    fn keyword_with_dollar_sigil_is_an_identifier() {
        let mut symbols = SymbolStore::new();
        let mut lexer = Lexer::new("print$");
        let tok = lexer.next_token(&mut symbols).unwrap();
        assert_eq!(tok.kind, TokenKind::Id);
    }

    #[test]
    fn colon_normalizes_to_newline() {
        let toks = tokens(":");
        assert!(toks[0].is_newline_valued(":"));
    }

    #[test]
    fn line_comment_normalizes_to_newline() {
        let toks = tokens("' hello\n");
        assert!(toks[0].is_newline_valued("'"));
    }

    #[test]
    fn remark_normalizes_to_newline() {
        let toks = tokens("REM hello\n");
        assert!(toks[0].is_newline_valued("rem"));
    }

    #[test]
    fn rem_prefixed_identifier_is_not_a_remark() {
        let toks = tokens("remark = 1");
        assert_eq!(toks[0].kind, TokenKind::Id);
    }

    #[test]
    fn base_lit_reinterprets_two_s_complement_when_out_of_signed_range() {
        let toks = tokens("&HFFFF");
        assert_eq!(toks[0].kind, TokenKind::BaseLit);
        assert_eq!(toks[0].value, TokenValue::Int(-1));
    }

    #[test]
    fn exp_lit_with_f_flag_is_a_mantissa_exponent_pair() {
        let toks = tokens("1.725F+2");
        assert_eq!(toks[0].kind, TokenKind::ExpLit);
        assert_eq!(toks[0].value, TokenValue::MantissaExp(1725, -1));
    }

    #[test]
    fn exp_lit_out_of_range_is_an_error() {
        let mut symbols = SymbolStore::new();
        let mut lexer = Lexer::new("1E999");
        assert!(lexer.next_token(&mut symbols).is_err());
    }

    #[test]
    fn line_join_splices_without_emitting_a_token() {
        let toks = tokens("foo = _\n1");
        // foo, =, 1, EOF -- no NEWLINE in between
        assert!(toks.iter().all(|t| t.kind != TokenKind::Newline));
    }

    #[test]
    fn line_label_requires_colon_and_column_zero() {
        let toks = tokens("start:\nprint \"x\"");
        assert_eq!(toks[0].kind, TokenKind::LineLabel);
    }

    #[test]
    fn bare_digits_at_line_start_is_a_line_number() {
        let toks = tokens("10 print 1");
        assert_eq!(toks[0].kind, TokenKind::LineNum);
    }

    #[test]
    fn sigil_round_trip_through_lexer() {
        let mut symbols = SymbolStore::new();
        let mut lexer = Lexer::new("x%");
        let tok = lexer.next_token(&mut symbols).unwrap();
        match tok.value {
            TokenValue::Id(name, ty) => {
                assert_eq!(name, "x");
                assert_eq!(ty.name, "integer");
            }
            other => panic!("expected Id token, got {other:?}"),
        }
    }
}
