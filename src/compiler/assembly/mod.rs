//! Assembly turns the analyzed program into its final form.
//!
//! The passes run in order: every declaration is collected into a
//! [`DeclMap`], calls of processes are inlined and the processes removed,
//! field accesses are collapsed into references, and the result is checked.
//! Finally the endpoints and the clock of the program are determined.

mod compress;
mod declmap;
mod endpoints;
mod error;
mod flatten;
mod tests;
mod validate;

use log::info;

use crate::{
    compiler::{
        ir::{Program, Value},
        semantics::Analysis,
        source::LineMap,
        CompilerError,
    },
    diagnostics::Diagnostic,
};

pub use declmap::DeclMap;
pub use error::AssemblyError;

pub type AssemblyResult<T> = Result<T, CompilerError<AssemblyError>>;

/// The assembled program and every warning found while compiling it.
#[derive(Debug)]
pub struct Assembly {
    pub program: Program,
    pub warnings: Vec<Diagnostic>,
}

pub fn assemble(analysis: Analysis, line_map: &LineMap) -> AssemblyResult<Assembly> {
    let Analysis {
        block,
        mut warnings,
        scope_count,
    } = analysis;

    let map = DeclMap::build(&block)?;
    let mut flattener = flatten::Flattener::new(&map, scope_count);
    let block = flattener.run(block)?;
    for span in flattener.constant_delays() {
        warnings.push(Diagnostic::warning(
            "Delaying a constant has no effect".into(),
            Some(line_map.position(span.low())),
        ));
    }

    let block = compress::compress(block);
    let map = DeclMap::build(&block)?;
    validate::check(&block, &map)?;

    let (sources, sinks) = endpoints::extract(&map);
    let clock = endpoints::clock(&sources, &sinks)?;
    validate::check_sources(&block, &map)?;

    let imports = map
        .iter()
        .filter_map(|decl| match &decl.value {
            Value::Import(path) => Some(path.join(".")),
            _ => None,
        })
        .collect();

    info!(
        "Assembled {} statements, {} sources, {} sinks",
        block.statements.len(),
        sources.len(),
        sinks.len()
    );

    Ok(Assembly {
        program: Program {
            block,
            declarations: map.into_symbols(),
            imports,
            sources,
            sinks,
            clock,
        },
        warnings,
    })
}
