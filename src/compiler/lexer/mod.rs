use super::{source::LineMap, CompilerDisplay, CompilerDisplayError};

mod tests;

pub mod lexer;
pub mod tokens;

pub use lexer::Scanner;
pub use tokens::{Token, TokenKind, TokenValue};

/// Errors which can be encountered while scanning a compilation unit.  These
/// never stop the scanner: they are carried by an error token and reported by
/// the parser when it reaches that token.
#[derive(Clone, Debug, PartialEq)]
pub enum LexerError {
    UnexpectedChar(char),
    InvalidEscapeSequence(char),
    ExpectedEscapeCharacter,
    UnterminatedString,
    UnterminatedChar,
    EmptyChar,
    InvalidInteger(String),
    InvalidNumber(String),
}

impl std::fmt::Display for LexerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use LexerError::*;
        match self {
            UnexpectedChar(c) => f.write_fmt(format_args!("Unexpected character {:?}", c)),
            InvalidEscapeSequence(c) => f.write_fmt(format_args!("Invalid escape sequence \\{}", c)),
            ExpectedEscapeCharacter => f.write_str("Expected an escape character after \\"),
            UnterminatedString => f.write_str("Unterminated string literal"),
            UnterminatedChar => f.write_str("Unterminated character literal"),
            EmptyChar => f.write_str("Empty character literal"),
            InvalidInteger(text) => {
                f.write_fmt(format_args!("Integer literal {} does not fit in 64 bits", text))
            }
            InvalidNumber(text) => f.write_fmt(format_args!("Invalid number {}", text)),
        }
    }
}

impl CompilerDisplay for LexerError {
    fn fmt(&self, _: &LineMap) -> Result<String, CompilerDisplayError> {
        Ok(format!("{}", self))
    }
}
