use crate::compiler::{source::LineMap, CompilerDisplay, CompilerDisplayError};

/// Errors found while loading a grammar description.
#[derive(Clone, Debug, PartialEq)]
pub enum GrammarError {
    UnexpectedChar(char),
    UnterminatedLiteral,
    ExpectedButFound(&'static str, String),
    InvalidLiteral(String),
    UnknownNodeKind(String),
    UnknownTerminal(String),
    UndefinedRule(String),
    DuplicateRule(String),
    MissingRoot(String),
    LeftRecursion(Vec<String>),
    Empty,
}

impl CompilerDisplay for GrammarError {
    fn fmt(&self, _: &LineMap) -> Result<String, CompilerDisplayError> {
        use GrammarError::*;
        let msg = match self {
            UnexpectedChar(c) => format!("Unexpected character {:?} in grammar", c),
            UnterminatedLiteral => format!("Unterminated literal in grammar"),
            ExpectedButFound(expected, found) => {
                format!("Expected {} but found {}", expected, found)
            }
            InvalidLiteral(lit) => format!(
                "Literal {:?} does not scan to exactly one keyword or operator token",
                lit
            ),
            UnknownNodeKind(name) => format!("Rule {} does not name a known node kind", name),
            UnknownTerminal(name) => format!("Unknown token kind {}", name),
            UndefinedRule(name) => format!("Reference to undefined rule {}", name),
            DuplicateRule(name) => format!("Rule {} is defined more than once", name),
            MissingRoot(name) => format!("Grammar has no root rule {}", name),
            LeftRecursion(cycle) => format!("Left recursion: {}", cycle.join(" -> ")),
            Empty => format!("Grammar defines no rules"),
        };

        Ok(msg)
    }
}
