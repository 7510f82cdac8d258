use std::fmt::Display;

use super::source::{LineMap, Position, Span};

/// Represents all errors that are generated from within the Compiler
/// module and its submodules.
///
/// This type captures common metadata which is necessarily present for
/// all errors which are caused by input source code.  E.g. the span of
/// source code that the error occurs on. This also handles formatting all
/// error messages with the universal metadata along with the inner metadata.
///
/// The inner error allows metadata which is specific to a submodule within
/// the compiler. E.g., the errors themselves are submodule specific and
/// are stored in the `inner` field.
#[derive(Clone, Debug, PartialEq)]
pub struct CompilerError<IE: CompilerDisplay> {
    span: Span,
    inner: IE,
}

impl<IE> CompilerError<IE>
where
    IE: CompilerDisplay,
{
    pub fn new(span: Span, inner: IE) -> Self {
        CompilerError { span, inner }
    }

    pub fn inner(&self) -> &IE {
        &self.inner
    }

    pub fn into_inner(self) -> IE {
        self.inner
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn position(&self, lm: &LineMap) -> Position {
        lm.position(self.span.low())
    }

    /// Converts the inner error into a different error type while keeping the
    /// span that the error was raised on.
    pub fn map_inner<E: CompilerDisplay, F: FnOnce(IE) -> E>(self, f: F) -> CompilerError<E> {
        CompilerError {
            span: self.span,
            inner: f(self.inner),
        }
    }
}

impl<IE> CompilerDisplay for CompilerError<IE>
where
    IE: CompilerDisplay,
{
    fn fmt(&self, lm: &LineMap) -> Result<String, CompilerDisplayError> {
        let inner = self.inner.fmt(lm)?;
        Ok(format!("{}: {}", self.position(lm), inner))
    }
}

/// Format trait for rendering any Compiler value into a human readable form.
/// Implementations may use the [`LineMap`] to quote the source code an error
/// refers to.
pub trait CompilerDisplay {
    fn fmt(&self, lm: &LineMap) -> Result<String, CompilerDisplayError>;
}

/// Errors that can occur while rendering a value for the user.
#[derive(Clone, Debug, PartialEq)]
pub enum CompilerDisplayError {
    SpanOutOfBounds(Span),
}

impl Display for CompilerDisplayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompilerDisplayError::SpanOutOfBounds(span) => {
                f.write_fmt(format_args!("Span {} is not within the source text", span))
            }
        }
    }
}

/// Returns the source text covered by `span`, with runs of whitespace
/// compressed to a single space so it can be quoted on one line.
pub fn quote_span(lm: &LineMap, span: Span) -> Result<String, CompilerDisplayError> {
    let text = lm
        .text_in_span(span)
        .ok_or(CompilerDisplayError::SpanOutOfBounds(span))?;
    Ok(text.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// Classification of a failed compilation.  Every failure terminates the
/// whole compilation, so this exists for tooling which reacts differently to
/// each class (exit codes, coloring).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorClass {
    /// The grammar description could not be loaded.
    Grammar,
    /// The program text does not conform to the grammar.
    Syntax,
    /// The program is well formed but is not a valid program.
    Semantic,
    /// The compiler itself violated one of its invariants.
    Internal,
}

impl Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorClass::Grammar => f.write_str("grammar error"),
            ErrorClass::Syntax => f.write_str("syntax error"),
            ErrorClass::Semantic => f.write_str("semantic error"),
            ErrorClass::Internal => f.write_str("compiler panic"),
        }
    }
}

/// The error returned by a failed compilation: the classification, the
/// message rendered against the source text, and where it happened.
#[derive(Clone, Debug, PartialEq)]
pub struct CompileError {
    pub class: ErrorClass,
    pub message: String,
    pub position: Option<Position>,
}

impl CompileError {
    pub fn new(class: ErrorClass, message: String, position: Option<Position>) -> CompileError {
        CompileError {
            class,
            message,
            position,
        }
    }

    /// Renders a stage error against the source text it was raised on.
    pub fn from_stage<E: CompilerDisplay>(
        class: ErrorClass,
        err: &CompilerError<E>,
        lm: &LineMap,
    ) -> CompileError {
        let message = err
            .inner()
            .fmt(lm)
            .unwrap_or_else(|display_err| format!("{}", display_err));
        CompileError::new(class, message, Some(err.position(lm)))
    }
}

impl Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.position {
            Some(pos) => f.write_fmt(format_args!("{} at ({}): {}", self.class, pos, self.message)),
            None => f.write_fmt(format_args!("{}: {}", self.class, self.message)),
        }
    }
}

impl std::error::Error for CompileError {}

/// Creates an `Err` holding a [`CompilerError`] for the given span.
#[macro_export]
macro_rules! err {
    ($span:expr, $kind:expr) => {
        Err($crate::compiler::CompilerError::new($span, $kind))
    };
}
