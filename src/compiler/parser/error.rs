use crate::compiler::{
    lexer::{LexerError, Token, TokenKind},
    source::LineMap,
    CompilerDisplay, CompilerDisplayError,
};

/// Compiler errors that happen within the Parser stage of compilation.
#[derive(Clone, Debug, PartialEq)]
pub enum ParserError {
    /// No rule accepts the token at the furthest position the parser reached.
    /// Carries every token kind that some rule would have accepted there.
    ExpectedButFound(Vec<TokenKind>, Token),

    /// The furthest position the parser reached holds a token the scanner
    /// could not recognize.
    Lexical(LexerError),

    /// The input nests deeper than the parser can follow.
    NestingTooDeep(usize),
}

impl CompilerDisplay for ParserError {
    fn fmt(&self, lm: &LineMap) -> Result<String, CompilerDisplayError> {
        let msg = match self {
            ParserError::ExpectedButFound(expected, found) => {
                let found = found.fmt(lm)?;
                match expected.len() {
                    0 => format!("Unexpected {}", found),
                    1 => format!("Expected {} but found {}", expected[0], found),
                    _ => format!(
                        "Expected one of {} but found {}",
                        expected
                            .iter()
                            .map(|k| format!("{}", k))
                            .collect::<Vec<_>>()
                            .join(", "),
                        found
                    ),
                }
            }
            ParserError::Lexical(e) => e.fmt(lm)?,
            ParserError::NestingTooDeep(limit) => format!(
                "Expression is nested too deeply: more than {} grammar rules are open",
                limit
            ),
        };

        Ok(msg)
    }
}
