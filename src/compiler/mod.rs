//! The compiler front end for the OpenDSPL language.
//!
//! Compilation runs in stages, each in its own submodule:
//! 1. `lexer` scans the text of a program into tokens.
//! 2. `parser` runs a `grammar` over the tokens and produces a reduced parse
//!    tree.
//! 3. `semantics` resolves names, checks types, computes constant operations
//!    and produces the symbolic IR defined in `ir`.
//! 4. `assembly` inlines processes, collapses field accesses, validates the
//!    endpoints of the program and derives its clock.
//!
//! Every stage fails fast: the first error found stops the compilation and is
//! returned as a [`CompileError`].  Errors caused by the compiler itself are
//! classified as [`ErrorClass::Internal`] so tooling can tell them apart from
//! mistakes in the program.

pub mod assembly;
pub mod grammar;
pub mod ir;
pub mod lexer;
pub mod mangle;
pub mod parser;
pub mod semantics;
pub mod source;

mod error;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::diagnostics::{Diagnostic, StageTracing};

pub use error::{quote_span, CompileError, CompilerDisplay, CompilerDisplayError, CompilerError, ErrorClass};
pub use source::{LineMap, Offset, Position, Span};

use self::{
    grammar::{Grammar, GrammarError},
    ir::Program,
    lexer::Scanner,
    parser::Parser,
};

/// The rule whole programs are parsed from.
pub const DEFAULT_ROOT: &str = "program";

/// Settings for a single compilation.
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    /// Name of the grammar rule the text is parsed from.
    pub root: String,
    pub tracing: StageTracing,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            root: DEFAULT_ROOT.into(),
            tracing: StageTracing::default(),
        }
    }
}

/// A successfully compiled program with the warnings found along the way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Compilation {
    pub program: Program,
    pub warnings: Vec<Diagnostic>,
}

/// Compiles `text` with the builtin grammar.
pub fn compile(text: &str) -> Result<Compilation, CompileError> {
    compile_with(Grammar::builtin(), text, &Options::default())
}

/// Compiles `text` with `grammar`, starting from the rule named in `options`.
pub fn compile_with(
    grammar: &Grammar,
    text: &str,
    options: &Options,
) -> Result<Compilation, CompileError> {
    let line_map = LineMap::new(text);

    let mut parser = Parser::new(grammar, &options.root).map_err(|e| root_error(&e))?;
    parser.set_tracing(options.tracing.parser);

    debug!("Scanning {} bytes", text.len());
    let mut scanner = Scanner::new(text);
    scanner.set_tracing(options.tracing.lexer);
    let tokens = scanner.tokenize();

    let tree = parser
        .parse_tokens(text, &tokens)
        .map_err(|e| CompileError::from_stage(ErrorClass::Syntax, &e, &line_map))?;

    let analysis = semantics::analyze(&tree, &line_map, options.tracing.semantics).map_err(|e| {
        let class = classify(e.inner().is_internal());
        CompileError::from_stage(class, &e, &line_map)
    })?;

    let assembled = assembly::assemble(analysis, &line_map).map_err(|e| {
        let class = classify(e.inner().is_internal());
        CompileError::from_stage(class, &e, &line_map)
    })?;

    for warning in &assembled.warnings {
        warn!("{}", warning);
    }

    Ok(Compilation {
        program: assembled.program,
        warnings: assembled.warnings,
    })
}

/// Loads a grammar description.  Errors are positioned within the grammar
/// text.
pub fn load_grammar(text: &str) -> Result<Grammar, CompileError> {
    Grammar::load(text)
        .map_err(|e| CompileError::from_stage(ErrorClass::Grammar, &e, &LineMap::new(text)))
}

/// A missing root rule is a problem with the grammar, not with the program
/// text, so it has no position.
fn root_error(err: &CompilerError<GrammarError>) -> CompileError {
    let message = err
        .inner()
        .fmt(&LineMap::new(""))
        .unwrap_or_else(|display_err| format!("{}", display_err));
    CompileError::new(ErrorClass::Grammar, message, None)
}

fn classify(is_internal: bool) -> ErrorClass {
    if is_internal {
        ErrorClass::Internal
    } else {
        ErrorClass::Semantic
    }
}
