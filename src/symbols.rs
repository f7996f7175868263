//! The symbol table: keywords, procedures, and variables.
//!
//! The lexer only reads from a [`SymbolStore`] (classifying names against
//! it); the parser is the only thing that writes to it (registering
//! variables created by implicit declaration, and the top-level `_main`
//! procedure). Both run on the same thread, so the store is plain
//! `HashMap`s behind `Rc` handles rather than anything synchronized.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use std::sync::OnceLock;

use crate::ast::ProcDefinition;
use crate::error::{ParseError, ParseErrorKind};
use crate::types::{self, Type, TypeCache, TypeSignature};

fn keywords() -> &'static HashSet<&'static str> {
    static KEYWORDS: OnceLock<HashSet<&'static str>> = OnceLock::new();
    KEYWORDS.get_or_init(|| {
        HashSet::from([
            "dim", "as", "const", "sub", "function", "if", "then", "else", "elseif", "endif",
            "end", "do", "while", "loop", "wend", "goto", "exit", "imp", "eqv", "xor", "or",
            "and", "not", "mod", "print", "?",
        ])
    })
}

pub fn is_keyword(name: &str) -> bool {
    keywords().contains(name)
}

/// A single BASIC variable: a name paired with a type. The same textual
/// name may exist simultaneously as several independent `Variable`s at
/// different types (`x%` and `x$` never alias).
#[derive(Debug, Clone)]
pub struct Variable {
    pub name: String,
    pub ty: Rc<Type>,
}

impl PartialEq for Variable {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.ty == other.ty
    }
}

/// A procedure: built-ins carry a signature and no body; user procedures
/// accumulate a body once their statements have been parsed.
#[derive(Debug)]
pub struct Procedure {
    pub name: String,
    pub signature: Option<TypeSignature>,
    pub body: Option<ProcDefinition>,
}

// No built-in procedures are implemented yet; procedure calls remain an
// unimplemented grammar production (see stmt.rs). Kept as a typed, empty
// table rather than removed so a future built-in has a table to land in.
#[allow(dead_code)]
fn builtin_procedures() -> &'static HashMap<&'static str, TypeSignature> {
    static PROCS: OnceLock<HashMap<&'static str, TypeSignature>> = OnceLock::new();
    PROCS.get_or_init(HashMap::new)
}

/// Holds every procedure, variable, and cached parametric type for one
/// compilation unit.
#[derive(Debug, Default)]
pub struct SymbolStore {
    pub procedures: HashMap<String, Procedure>,
    variables: HashMap<String, HashMap<String, Rc<Variable>>>,
    type_cache: TypeCache,
}

impl SymbolStore {
    pub fn new() -> Self {
        SymbolStore::default()
    }

    pub fn is_keyword(&self, name: &str) -> bool {
        is_keyword(name)
    }

    pub fn default_type(&self) -> Rc<Type> {
        types::default_type()
    }

    pub fn lookup_sigil(&mut self, sigil: Option<&str>) -> Result<Rc<Type>, ParseError> {
        types::lookup_sigil(sigil, &mut self.type_cache)
    }

    /// Looks up a user procedure. Built-ins are consulted too, but none are
    /// registered yet (see [`builtin_procedures`]).
    pub fn find_procedure(&self, name: &str) -> Option<&Procedure> {
        self.procedures.get(name)
    }

    /// Looks up a variable by name, resolving `sigil` to a type first.
    pub fn find_variable_with_sigil(
        &mut self,
        name: &str,
        sigil: Option<&str>,
    ) -> Result<Option<Rc<Variable>>, ParseError> {
        let ty = self.lookup_sigil(sigil)?;
        Ok(self.find_variable_of_type(name, &ty))
    }

    /// Looks up a variable at a known type, without touching the sigil cache.
    pub fn find_variable_of_type(&self, name: &str, ty: &Rc<Type>) -> Option<Rc<Variable>> {
        self.variables.get(name)?.get(&ty.name).cloned()
    }

    /// Looks up any variable registered under `name`, regardless of type.
    /// Used by tests and callers that already know the name is unambiguous.
    pub fn find_variable(&self, name: &str) -> Option<Rc<Variable>> {
        self.variables.get(name)?.values().next().cloned()
    }

    /// Registers a fresh variable at `ty` (or the default type). Fails if a
    /// variable already exists at that exact `(name, type)` pair.
    pub fn create_local(
        &mut self,
        name: &str,
        ty: Option<Rc<Type>>,
    ) -> Result<Rc<Variable>, ParseError> {
        let ty = ty.unwrap_or_else(types::default_type);
        let by_type = self.variables.entry(name.to_string()).or_default();
        if by_type.contains_key(&ty.name) {
            return Err(ParseError::new(
                ParseErrorKind::DuplicateVariable,
                format!("variable '{name}' already declared at type '{}'", ty.name),
            ));
        }
        let var = Rc::new(Variable {
            name: name.to_string(),
            ty,
        });
        by_type.insert(var.ty.name.clone(), Rc::clone(&var));
        Ok(var)
    }
}
