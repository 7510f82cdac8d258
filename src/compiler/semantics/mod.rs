//! Semantic analysis turns the parse tree of a program into the symbolic IR.
//!
//! Names are resolved against a stack of lexical scopes, declared types are
//! checked against the values bound to them, and operations on values known
//! while compiling are computed.  All state of an analysis lives in an
//! [`AnalysisContext`] which is passed to every step explicitly.

mod analyzer;
mod context;
mod error;
pub mod fold;
mod tests;

use crate::{
    compiler::{ir::Block, parser::ParseTree, source::LineMap, CompilerError},
    diagnostics::{Diagnostic, TracingConfig},
};

pub use context::{AnalysisContext, Declaration};
pub use error::SemanticError;

pub type SemanticResult<T> = Result<T, CompilerError<SemanticError>>;

/// Result of analyzing a program.
#[derive(Debug)]
pub struct Analysis {
    pub block: Block,
    pub warnings: Vec<Diagnostic>,

    /// The first scope id which was not used.  Later passes which create
    /// scopes start counting here.
    pub scope_count: u32,
}

pub fn analyze(
    tree: &ParseTree,
    line_map: &LineMap,
    tracing: TracingConfig,
) -> SemanticResult<Analysis> {
    let mut ctx = AnalysisContext::new(line_map, tracing);
    let block = analyzer::analyze_tree(tree, &mut ctx)?;
    let scope_count = ctx.scope_count();
    Ok(Analysis {
        block,
        warnings: ctx.into_warnings(),
        scope_count,
    })
}
