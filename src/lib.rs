//! Front end for a QuickBASIC-family language: lexer, symbol table, and
//! recursive-descent/Pratt parser producing a typed syntax tree.
//!
//! The parser is the whole surface of this crate — there is no code
//! generator or runtime here. A caller gets a [`Program`] back, which wraps
//! the populated symbol table (including the synthesized `_main` procedure
//! holding the parsed top-level statements).
//!
//! ```
//! let program = qb_frontend::parse("x = 1 + 2\nprint x\n").unwrap();
//! assert!(program.globals.find_procedure("_main").is_some());
//! ```

pub mod ast;
pub mod config;
pub mod context;
pub mod error;
pub mod expr;
pub mod lexer;
pub mod stmt;
pub mod symbols;
pub mod token;
pub mod types;

pub use config::ParserConfig;
pub use error::{ParseError, ParseErrorKind};
pub use symbols::SymbolStore;

/// The result of parsing one compilation unit: a symbol table holding every
/// procedure (currently just `_main`) and every variable created along the
/// way.
#[derive(Debug)]
pub struct Program {
    pub globals: SymbolStore,
}

/// Parses `source` with default configuration (tracing disabled unless the
/// `TRACE_TOKENS` environment variable is set).
pub fn parse(source: &str) -> Result<Program, ParseError> {
    parse_with_config(source, &ParserConfig::from_env())
}

/// Parses `source` under an explicit [`ParserConfig`].
pub fn parse_with_config(source: &str, config: &ParserConfig) -> Result<Program, ParseError> {
    let globals = stmt::parse_program(source, config.clone())?;
    Ok(Program { globals })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_assignment_and_print_into_main() {
        let program = parse("x = 1 + 2\nprint x\n").unwrap();
        let main = program.globals.find_procedure("_main").unwrap();
        assert_eq!(main.body.as_ref().unwrap().statements.len(), 2);
    }

    #[test]
    fn surfaces_parse_errors_with_line_numbers() {
        let err = parse("x = \n").unwrap_err();
        assert!(err.line.is_some());
    }
}
