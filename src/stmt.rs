//! Statement and block parsing, including the multi-shape `IF` statement.

use std::rc::Rc;

use crate::ast::{ConstantValue, Expr, IfBranch, ProcDefinition, Statement};
use crate::config::ParserConfig;
use crate::context::ParseContext;
use crate::error::{ParseError, ParseErrorKind};
use crate::symbols::{Procedure, SymbolStore};
use crate::token::TokenKind;
use crate::types::{builtin_types, TypeSignature};

impl ParseContext {
    /// Parses one statement. Assumes the current token is the statement's
    /// first token (leading blank lines are the caller's job).
    pub fn parse_stmt(&mut self) -> Result<Statement, ParseError> {
        if let Some(name) = self.current().keyword_name().map(str::to_string) {
            return match name.as_str() {
                "print" | "?" => self.parse_print(),
                "if" => self.parse_if(),
                other => Err(ParseError::at(
                    self.current().lineno,
                    ParseErrorKind::UnexpectedToken,
                    format!("unexpected keyword '{other}'"),
                )),
            };
        }
        match self.current().kind {
            TokenKind::Variable => self.parse_assignment(),
            TokenKind::Procedure => self.parse_procedure_call(),
            TokenKind::Id => self.parse_unknown_var_or_procedure(),
            kind => Err(ParseError::at(
                self.current().lineno,
                ParseErrorKind::UnexpectedToken,
                format!("expected a statement, found {kind:?}"),
            )),
        }
    }

    fn parse_assignment(&mut self) -> Result<Statement, ParseError> {
        let lval = self.parse_lvalue()?;
        self.consume_punctuation("=")?;
        let rval = self.parse_expr(0)?;
        Ok(Statement::Assignment { lval, rval })
    }

    fn parse_procedure_call(&mut self) -> Result<Statement, ParseError> {
        let tok = self.advance()?;
        Err(ParseError::at(
            tok.lineno,
            ParseErrorKind::Unimplemented,
            "procedure calls are not implemented",
        ))
    }

    /// A bare `ID` token at statement position: disambiguate implicit
    /// assignment from (unimplemented) call/array-declaration forms by
    /// peeking one token ahead.
    fn parse_unknown_var_or_procedure(&mut self) -> Result<Statement, ParseError> {
        let tok = self.advance()?;
        let line = tok.lineno;
        if self.at_punctuation("=") {
            self.reverse(tok);
            return self.parse_assignment();
        }
        if self.at_punctuation("(") {
            return Err(ParseError::at(
                line,
                ParseErrorKind::Unimplemented,
                "implicit array declaration is not implemented",
            ));
        }
        Err(ParseError::at(
            line,
            ParseErrorKind::Unimplemented,
            "bare identifier statement form is not implemented",
        ))
    }

    fn parse_print(&mut self) -> Result<Statement, ParseError> {
        self.advance()?; // 'print' or '?'
        let mut params = Vec::new();
        let mut final_newline = true;
        while !self.at_line_terminator() {
            if self.skip_punctuation(",")? {
                params.push(tab_separator());
                final_newline = false;
                continue;
            }
            if self.skip_punctuation(";")? {
                final_newline = false;
                continue;
            }
            params.push(self.parse_expr(0)?);
            final_newline = true;
        }
        if final_newline {
            params.push(final_newline_constant());
        }
        Ok(Statement::Print { params })
    }

    fn parse_if(&mut self) -> Result<Statement, ParseError> {
        self.advance()?; // 'if'
        let guard = self.parse_expr(0)?;
        self.consume_keyword("then")?;

        if self.current().is_newline_valued("rem") {
            self.advance()?;
            return Ok(Statement::If {
                guard,
                thens: Vec::new(),
                elseifs: Vec::new(),
                elses: Vec::new(),
            });
        }

        if !self.current().is_newline_valued("\n") {
            let thens = self.parse_single_line_block(true)?;
            let mut elses = Vec::new();
            if self.skip_keyword("else")? {
                elses = self.parse_single_line_block(true)?;
            }
            if self.at_keyword("else") {
                return Err(ParseError::at(
                    self.current().lineno,
                    ParseErrorKind::DuplicateElse,
                    "if already has an else clause",
                ));
            }
            return Ok(Statement::If {
                guard,
                thens,
                elseifs: Vec::new(),
                elses,
            });
        }

        let thens = self.parse_block()?;
        let mut elseifs = Vec::new();
        while self.skip_keyword("elseif")? {
            let elseif_guard = self.parse_expr(0)?;
            self.consume_keyword("then")?;
            let body = self.parse_block()?;
            elseifs.push(IfBranch {
                guard: elseif_guard,
                body,
            });
        }
        let mut elses = Vec::new();
        if self.skip_keyword("else")? {
            elses = self.parse_block()?;
        }
        if self.at_keyword("else") {
            return Err(ParseError::at(
                self.current().lineno,
                ParseErrorKind::DuplicateElse,
                "if already has an else clause",
            ));
        }
        self.consume_end_if()?;

        Ok(Statement::If {
            guard,
            thens,
            elseifs,
            elses,
        })
    }

    /// Parses a single-line `THEN`/`ELSE` statement list: statements joined
    /// by the statement separator, stopping at a real newline, `EOF`, or
    /// (when `stop_at_else`) the keyword `else`.
    fn parse_single_line_block(&mut self, stop_at_else: bool) -> Result<Vec<Statement>, ParseError> {
        let mut stmts = Vec::new();
        while self.current().kind == TokenKind::Newline && !self.current().is_newline_valued("\n") {
            self.advance()?;
        }
        loop {
            if self.current().is_newline_valued("\n") || self.current().kind == TokenKind::Eof {
                break;
            }
            if stop_at_else && self.at_keyword("else") {
                break;
            }
            stmts.push(self.parse_stmt()?);
            while self.current().kind == TokenKind::Newline && !self.current().is_newline_valued("\n") {
                self.advance()?;
            }
        }
        Ok(stmts)
    }

    /// Parses a multi-line statement block, stopping at (without consuming)
    /// one of the recognized block-end markers.
    fn parse_block(&mut self) -> Result<Vec<Statement>, ParseError> {
        let mut stmts = Vec::new();
        loop {
            while self.skip(TokenKind::Newline, None)? {}
            if self.at_block_end_marker()? {
                break;
            }
            stmts.push(self.parse_stmt()?);
        }
        Ok(stmts)
    }

    fn at_block_end_marker(&mut self) -> Result<bool, ParseError> {
        if self.current().kind == TokenKind::Eof {
            return Ok(true);
        }
        for kw in ["else", "elseif", "endif", "loop", "next", "wend", "case", "sub", "function"] {
            if self.at_keyword(kw) {
                return Ok(true);
            }
        }
        if self.at_keyword("end") {
            let end_tok = self.advance()?;
            let followed_by_keyword = self.current().kind == TokenKind::Keyword;
            self.reverse(end_tok);
            return Ok(followed_by_keyword);
        }
        Ok(false)
    }

    fn consume_end_if(&mut self) -> Result<(), ParseError> {
        if self.skip_keyword("endif")? {
            return Ok(());
        }
        self.consume_keyword("end")?;
        self.consume_keyword("if")?;
        Ok(())
    }
}

fn tab_separator() -> Expr {
    Expr::Constant {
        value: ConstantValue::Str(Statement::TAB_SEPARATOR.to_string()),
        ty: Rc::clone(&builtin_types()["string"]),
    }
}

fn final_newline_constant() -> Expr {
    Expr::Constant {
        value: ConstantValue::Str(Statement::FINAL_NEWLINE.to_string()),
        ty: Rc::clone(&builtin_types()["string"]),
    }
}

/// Parses a full compilation unit, returning the populated symbol store
/// with its top-level statements filed under the synthetic `_main`
/// procedure. Stops (without consuming) at the first `sub`/`function`
/// keyword, since procedure definitions are not implemented.
pub fn parse_program(source: &str, config: ParserConfig) -> Result<SymbolStore, ParseError> {
    let mut ctx = ParseContext::new(source, config)?;
    let mut statements = Vec::new();
    loop {
        while ctx.skip(TokenKind::Newline, None)? {}
        if ctx.current().kind == TokenKind::Eof {
            break;
        }
        if ctx.at_keyword("sub") || ctx.at_keyword("function") {
            break;
        }
        statements.push(ctx.parse_stmt()?);
    }

    let main_signature = TypeSignature {
        ret: Rc::clone(&builtin_types()["_none"]),
        params: Vec::new(),
    };
    ctx.symbols.procedures.insert(
        "_main".to_string(),
        Procedure {
            name: "_main".to_string(),
            signature: Some(main_signature),
            body: Some(ProcDefinition { statements }),
        },
    );
    Ok(ctx.symbols)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Node;

    fn parse(src: &str) -> SymbolStore {
        parse_program(src, ParserConfig::default()).unwrap()
    }

    fn main_body(store: &SymbolStore) -> &ProcDefinition {
        store.procedures["_main"].body.as_ref().unwrap()
    }

    #[test]
    fn print_appends_final_newline_constant() {
        let store = parse("? 1");
        let body = main_body(&store);
        let print = body.find(|n| matches!(n, Node::Stmt(Statement::Print { .. }))).unwrap();
        let Statement::Print { params } = print.as_stmt().unwrap() else {
            unreachable!()
        };
        assert_eq!(params.len(), 2);
        assert_eq!(
            params[1],
            Expr::Constant {
                value: ConstantValue::Str("\n".to_string()),
                ty: Rc::clone(&builtin_types()["string"]),
            }
        );
    }

    #[test]
    fn print_comma_emits_tab_separator_and_suppresses_final_newline() {
        let store = parse("? 1,");
        let body = main_body(&store);
        let Statement::Print { params } = &body.statements[0] else {
            unreachable!()
        };
        assert_eq!(params.len(), 2);
        assert_eq!(
            params[1],
            Expr::Constant {
                value: ConstantValue::Str("\t".to_string()),
                ty: Rc::clone(&builtin_types()["string"]),
            }
        );
    }

    #[test]
    fn assignment_reuses_existing_variable() {
        let store = parse("foo = 32 : foo = 17");
        let body = main_body(&store);
        let assignments = body.find_all(|n| matches!(n, Node::Stmt(Statement::Assignment { .. })));
        assert_eq!(assignments.len(), 2);
        assert!(store.find_variable("foo").is_some());
    }

    #[test]
    fn single_line_if_then_else() {
        let store = parse("if 1 then print \"a\"; else print \"b\";");
        let body = main_body(&store);
        let if_stmt = body.find(|n| matches!(n, Node::Stmt(Statement::If { .. }))).unwrap();
        let Statement::If { thens, elses, elseifs, .. } = if_stmt.as_stmt().unwrap() else {
            unreachable!()
        };
        assert_eq!(thens.len(), 1);
        assert_eq!(elses.len(), 1);
        assert!(elseifs.is_empty());
    }

    #[test]
    fn if_then_rem_is_a_no_op() {
        let store = parse("if 1 then rem\n");
        let body = main_body(&store);
        let Statement::If { thens, elses, .. } = &body.statements[0] else {
            unreachable!()
        };
        assert!(thens.is_empty());
        assert!(elses.is_empty());
    }

    #[test]
    fn multi_line_if_with_elseif_chain() {
        let src = "if 1 then\nprint \"a\"\nelseif 2 then\nprint \"b\"\nelse\nprint \"c\"\nend if\n";
        let store = parse(src);
        let body = main_body(&store);
        let Statement::If { thens, elseifs, elses, .. } = &body.statements[0] else {
            unreachable!()
        };
        assert_eq!(thens.len(), 1);
        assert_eq!(elseifs.len(), 1);
        assert_eq!(elses.len(), 1);
    }

    #[test]
    fn endif_and_end_if_are_both_accepted_terminators() {
        assert!(parse_program("if 1 then\nprint 1\nendif\n", ParserConfig::default()).is_ok());
        assert!(parse_program("if 1 then\nprint 1\nend if\n", ParserConfig::default()).is_ok());
    }

    #[test]
    fn double_else_is_an_error() {
        let result = parse_program(
            "if 1 then\nprint 1\nelse\nprint 2\nelse\nprint 3\nend if\n",
            ParserConfig::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn elseif_after_else_is_an_error() {
        let result = parse_program(
            "if 1 then print \"a\" else print \"b\" elseif 1 then print \"c\"",
            ParserConfig::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn nested_if_inside_then_body() {
        let src = "if 1 then\nif 2 then\nprint 1\nend if\nend if\n";
        let store = parse(src);
        let body = main_body(&store);
        let Statement::If { thens, .. } = &body.statements[0] else {
            unreachable!()
        };
        assert!(matches!(thens[0], Statement::If { .. }));
    }
}
