//! Parser-wide configuration.
//!
//! Kept tiny and explicit rather than reading the environment ad hoc from
//! inside the lexer, so a caller (or a test) can pin behavior without
//! mutating process environment.

/// Knobs that affect parsing without affecting the grammar itself.
#[derive(Debug, Clone, Default)]
pub struct ParserConfig {
    /// When set, the parse context traces every token movement via
    /// `tracing::trace!` instead of staying silent.
    pub trace_tokens: bool,
}

impl ParserConfig {
    /// Reads `TRACE_TOKENS` from the process environment. Presence, not
    /// value, is significant.
    pub fn from_env() -> Self {
        ParserConfig {
            trace_tokens: std::env::var_os("TRACE_TOKENS").is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_has_tracing_disabled() {
        assert!(!ParserConfig::default().trace_tokens);
    }
}
