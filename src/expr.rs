//! Pratt expression parser.
//!
//! A single binding-power loop handles every binary operator; prefix `-`
//! (negation) and prefix `not` each have their own dedicated binding power
//! so they bind tighter or looser than the binary table as the grammar
//! requires. All binary operators are treated as left-associative by the
//! same mechanism: the recursive call uses the operator's own precedence as
//! its right-binding-power floor, so a same-precedence operator immediately
//! following stops the recursion and bubbles back up to the caller's loop.

use std::rc::Rc;

use crate::ast::{ConstantValue, Expr, LValue};
use crate::context::ParseContext;
use crate::error::{ParseError, ParseErrorKind};
use crate::token::{TokenKind, TokenValue};
use crate::types::builtin_types;

const PREC_NOT: u8 = 7;
const PREC_NEGATION: u8 = 13;

fn binary_precedence(op: &str) -> Option<u8> {
    match op {
        "imp" => Some(2),
        "eqv" => Some(3),
        "xor" => Some(4),
        "or" => Some(5),
        "and" => Some(6),
        "=" | "<>" | "<" | ">" | "<=" | ">=" => Some(8),
        "+" | "-" => Some(9),
        "mod" => Some(10),
        "\\" => Some(11),
        "*" | "/" => Some(12),
        "^" => Some(14),
        _ => None,
    }
}

impl ParseContext {
    /// Current token's spelling as an operator candidate, if it is a
    /// keyword-operator (`and`, `mod`, …) or punctuation operator.
    fn current_operator(&self) -> Option<&'static str> {
        if let Some(name) = self.current().keyword_name() {
            return match name {
                "imp" => Some("imp"),
                "eqv" => Some("eqv"),
                "xor" => Some("xor"),
                "or" => Some("or"),
                "and" => Some("and"),
                "mod" => Some("mod"),
                _ => None,
            };
        }
        if self.current().kind == TokenKind::Punctuation {
            if let TokenValue::Str(s) = &self.current().value {
                return match s.as_str() {
                    "=" => Some("="),
                    "<>" => Some("<>"),
                    "<" => Some("<"),
                    ">" => Some(">"),
                    "<=" => Some("<="),
                    ">=" => Some(">="),
                    "+" => Some("+"),
                    "-" => Some("-"),
                    "\\" => Some("\\"),
                    "*" => Some("*"),
                    "/" => Some("/"),
                    "^" => Some("^"),
                    _ => None,
                };
            }
        }
        None
    }

    /// Parses an expression, stopping at the first operator binding no
    /// tighter than `right_binding`.
    pub fn parse_expr(&mut self, right_binding: u8) -> Result<Expr, ParseError> {
        let mut left = self.parse_nud()?;
        loop {
            let Some(op) = self.current_operator() else {
                break;
            };
            let Some(prec) = binary_precedence(op) else {
                break;
            };
            if prec <= right_binding {
                break;
            }
            self.advance()?;
            let right = self.parse_expr(prec)?;
            left = Expr::BinOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_nud(&mut self) -> Result<Expr, ParseError> {
        let tok = self.advance()?;
        let line = tok.lineno;

        if tok.kind == TokenKind::Punctuation {
            if let TokenValue::Str(s) = &tok.value {
                match s.as_str() {
                    "(" => {
                        let inner = self.parse_expr(0)?;
                        self.consume_punctuation(")")?;
                        return Ok(inner);
                    }
                    "-" => {
                        let operand = self.parse_expr(PREC_NEGATION)?;
                        return Ok(Expr::UniOp {
                            op: "negation",
                            param: Box::new(operand),
                        });
                    }
                    _ => {}
                }
            }
        }

        if tok.is_keyword("not") {
            let operand = self.parse_expr(PREC_NOT)?;
            return Ok(Expr::UniOp {
                op: "not",
                param: Box::new(operand),
            });
        }

        match (tok.kind, tok.value) {
            (TokenKind::StringLit, TokenValue::Str(s)) => Ok(Expr::Constant {
                value: ConstantValue::Str(s),
                ty: Rc::clone(&builtin_types()["string"]),
            }),
            (TokenKind::IntLit, TokenValue::Int(v)) | (TokenKind::BaseLit, TokenValue::Int(v)) => {
                Ok(Expr::Constant {
                    value: ConstantValue::Int(v),
                    ty: self.detect_numeric_type(),
                })
            }
            (TokenKind::DecLit, TokenValue::Float(v)) | (TokenKind::ExpLit, TokenValue::Float(v)) => {
                Ok(Expr::Constant {
                    value: ConstantValue::Float(v),
                    ty: self.detect_numeric_type(),
                })
            }
            (TokenKind::ExpLit, TokenValue::MantissaExp(m, e)) => Ok(Expr::Constant {
                value: ConstantValue::MantissaExp(m, e),
                ty: self.detect_numeric_type(),
            }),
            (TokenKind::Variable, TokenValue::Variable(v)) => Ok(Expr::Var { target: v }),
            (TokenKind::Id, value) => {
                self.reverse_token(TokenKind::Id, value, line);
                let lvalue = self.parse_lvalue()?;
                Ok(lvalue_to_expr(lvalue))
            }
            (TokenKind::Procedure, _) => Err(ParseError::at(
                line,
                ParseErrorKind::Unimplemented,
                "procedure calls in expression position are not implemented",
            )),
            (kind, _) => Err(ParseError::at(
                line,
                ParseErrorKind::UnexpectedToken,
                format!("unexpected token {kind:?} in expression"),
            )),
        }
    }

    fn reverse_token(&mut self, kind: TokenKind, value: TokenValue, lineno: usize) {
        self.reverse(crate::token::Token::new(kind, value, lineno));
    }

    /// Numeric-type detection is a stub: it always reports `single`,
    /// regardless of the literal's own lexical type tag. Reproduced as-is;
    /// refining this is explicitly left as future work.
    fn detect_numeric_type(&self) -> Rc<crate::types::Type> {
        Rc::clone(&builtin_types()["single"])
    }

    /// Parses an l-value: an existing variable, or (via implicit
    /// declaration) a fresh one created at the sigil-resolved type.
    pub fn parse_lvalue(&mut self) -> Result<LValue, ParseError> {
        let tok = self.advance()?;
        match (tok.kind, tok.value) {
            (TokenKind::Variable, TokenValue::Variable(v)) => Ok(LValue::Var(v)),
            (TokenKind::Id, TokenValue::Id(name, ty)) => {
                let var = self.symbols.create_local(&name, Some(ty))?;
                Ok(LValue::Var(var))
            }
            _ => Err(ParseError::at(
                tok.lineno,
                ParseErrorKind::UnexpectedToken,
                "expected a variable",
            )),
        }
    }
}

fn lvalue_to_expr(lvalue: LValue) -> Expr {
    match lvalue {
        LValue::Var(target) => Expr::Var { target },
    }
}
