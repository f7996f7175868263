//! Token-stream-level behavior that is easiest to observe end to end:
//! case-insensitivity, sigil errors, and REM/`:`/`'` normalization.

use qb_frontend::lexer::Lexer;
use qb_frontend::symbols::SymbolStore;
use qb_frontend::token::{TokenKind, TokenValue};

fn all_tokens(src: &str) -> Vec<qb_frontend::token::Token> {
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
fn case_insensitive_keyword_and_identifier_streams_match() {
    let upper = all_tokens("IF X THEN PRINT X");
    let lower = all_tokens("if x then print x");
    assert_eq!(upper.len(), lower.len());
    for (a, b) in upper.iter().zip(lower.iter()) {
        assert_eq!(a.kind, b.kind);
    }
}

#[test]
fn keyword_followed_by_non_dollar_sigil_is_an_error() {
    let mut symbols = SymbolStore::new();
    let mut lexer = Lexer::new("if%");
    assert!(lexer.next_token(&mut symbols).is_err());
}

#[test]
fn unterminated_string_is_an_error() {
    let mut symbols = SymbolStore::new();
    let mut lexer = Lexer::new("\"unterminated");
    assert!(lexer.next_token(&mut symbols).is_err());
}

#[test]
fn colon_comment_and_remark_all_normalize_to_newline_kind() {
    for src in [":", "' a comment\n", "REM a remark\n"] {
        let toks = all_tokens(src);
        assert_eq!(toks[0].kind, TokenKind::Newline, "input: {src:?}");
    }
}

#[test]
fn bare_line_label_allows_space_before_colon() {
    let toks = all_tokens("foo :\n");
    assert_eq!(toks[0].kind, TokenKind::LineLabel);
    assert_eq!(toks[0].value, TokenValue::LineLabel("foo".to_string()));
}

#[test]
fn numbered_line_label_allows_space_before_colon() {
    let toks = all_tokens("10 foo :\n");
    assert_eq!(toks[0].kind, TokenKind::LineNumLabel);
    assert_eq!(toks[0].value, TokenValue::LineNumLabel(10, "foo".to_string()));
}

#[test]
fn stray_character_is_an_error() {
    let mut symbols = SymbolStore::new();
    let mut lexer = Lexer::new("@");
    assert!(lexer.next_token(&mut symbols).is_err());
}
