use log::debug;

use crate::compiler::ir::{Clock, Literal, StructKind, Symbol};
use crate::err;

use super::{AssemblyError, AssemblyResult, DeclMap};

/// Splits the endpoint declarations of `map` into sources and sinks, in
/// declaration order.
pub fn extract(map: &DeclMap) -> (Vec<Symbol>, Vec<Symbol>) {
    let mut sources = vec![];
    let mut sinks = vec![];
    for decl in map.iter() {
        match decl.as_struct().map(|st| &st.kind) {
            Some(StructKind::Source) => sources.push(decl.clone()),
            Some(StructKind::Sink) => sinks.push(decl.clone()),
            _ => (),
        }
    }
    (sources, sinks)
}

/// Determines the sample rate of the program.  Every source must run at the
/// same rate.  A program without endpoints has no clock; a program with sinks
/// but no source is an error.
pub fn clock(sources: &[Symbol], sinks: &[Symbol]) -> AssemblyResult<Option<Clock>> {
    let first = match sources.first() {
        Some(first) => first,
        None if sinks.is_empty() => return Ok(None),
        None => return err!(sinks[0].span, AssemblyError::NoSource),
    };

    let rate = rate_of(first);
    for other in &sources[1..] {
        let other_rate = rate_of(other);
        if other_rate != rate {
            return err!(
                other.span,
                AssemblyError::InconsistentClock(
                    display_name(first),
                    rate,
                    display_name(other),
                    other_rate
                )
            );
        }
    }

    debug!("Clock runs at {} taken from {}", rate, first.generated_name);
    Ok(Some(Clock {
        rate,
        source: first.generated_name.clone(),
    }))
}

fn rate_of(source: &Symbol) -> i64 {
    match source
        .as_struct()
        .and_then(|st| st.member("rate"))
        .and_then(|rate| rate.literal())
    {
        Some(Literal::Int(rate)) => *rate,
        _ => panic!(
            "compiler panic: source {} has no constant rate",
            source.generated_name
        ),
    }
}

fn display_name(sym: &Symbol) -> String {
    sym.name.clone().unwrap_or_else(|| sym.generated_name.clone())
}

