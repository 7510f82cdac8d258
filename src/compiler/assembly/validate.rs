//! Checks on the assembled program.  Any call, process or field access left
//! over by the earlier passes is a bug in the compiler; the remaining checks
//! are about how the program wires its endpoints.

use std::collections::{HashMap, HashSet};

use log::debug;

use crate::compiler::ir::{Block, StructKind, Symbol, SymbolRef, Value};
use crate::err;

use super::{AssemblyError, AssemblyResult, DeclMap};

/// Checks that every value refers to a declaration and that every sink is
/// driven by exactly one connection.
pub fn check(block: &Block, map: &DeclMap) -> AssemblyResult<()> {
    let mut drivers: HashMap<String, usize> = HashMap::new();
    for stmt in &block.statements {
        check_symbol(stmt, map, &mut drivers)?;
    }

    for sink in map.iter().filter(|d| is_endpoint(d, StructKind::Sink)) {
        let name = sink.name.clone().unwrap_or_default();
        match drivers.get(&sink.generated_name).copied().unwrap_or(0) {
            0 => return err!(sink.span, AssemblyError::UndrivenSink(name)),
            1 => (),
            n => return err!(sink.span, AssemblyError::MultiplyDrivenSink(name, n)),
        }
    }

    Ok(())
}

/// Checks that the value every connection drives its sink with depends on
/// the output of a source.
pub fn check_sources(block: &Block, map: &DeclMap) -> AssemblyResult<()> {
    for stmt in &block.statements {
        if let Value::Connection(conn) = &stmt.value {
            let mut visited = HashSet::new();
            if !depends_on_source(&conn.value, map, &mut visited) {
                return err!(
                    stmt.span,
                    AssemblyError::SinkWithoutSource(conn.target.name.clone())
                );
            }
            debug!("{} depends on a source", conn.target);
        }
    }
    Ok(())
}

fn check_symbol(
    sym: &Symbol,
    map: &DeclMap,
    drivers: &mut HashMap<String, usize>,
) -> AssemblyResult<()> {
    match &sym.value {
        Value::Call(call) => {
            return err!(sym.span, AssemblyError::UnflattenedCall(call.callee.to_string()))
        }
        Value::Process(_) => {
            let name = sym.name.clone().unwrap_or_else(|| sym.generated_name.clone());
            return err!(sym.span, AssemblyError::UnflattenedProcess(name));
        }
        Value::Struct(st) if st.kind == StructKind::Access => {
            return err!(
                sym.span,
                AssemblyError::UncompressedAccess(sym.generated_name.clone())
            )
        }
        Value::Reference(path) => {
            if map.resolve(path).is_none() {
                return err!(sym.span, AssemblyError::Unresolved(path.to_string()));
            }
        }
        Value::Connection(conn) => {
            if map.resolve(&conn.target).is_none() {
                return err!(sym.span, AssemblyError::Unresolved(conn.target.to_string()));
            }
            *drivers.entry(conn.target.root_name()).or_insert(0) += 1;
        }
        _ => (),
    }

    for child in sym.children() {
        check_symbol(child, map, drivers)?;
    }
    Ok(())
}

fn depends_on_source(sym: &Symbol, map: &DeclMap, visited: &mut HashSet<String>) -> bool {
    let path = match &sym.value {
        Value::Reference(path) => path,
        _ => {
            return sym
                .children()
                .into_iter()
                .any(|child| depends_on_source(child, map, visited))
        }
    };

    if !visited.insert(path.generated_name()) {
        return false;
    }

    if let Some(reads_source) = reads_source(path, map) {
        return reads_source;
    }

    match map.resolve(path) {
        Some(target) => depends_on_source(target, map, visited),
        None => false,
    }
}

/// Whether `path`, after following aliases, reads the signal of a source.
/// `None` if the root of `path` is not a source.
fn reads_source(path: &SymbolRef, map: &DeclMap) -> Option<bool> {
    let mut path = path.clone();
    loop {
        let decl = map.get(&path.root_name())?;
        match &decl.value {
            Value::Struct(st) if st.kind == StructKind::Source => {
                return Some(path.fields.first().map_or(true, |f| f != "rate"))
            }
            Value::Reference(alias) => {
                let mut next = alias.clone();
                next.fields.extend(path.fields);
                path = next;
            }
            _ => return None,
        }
    }
}

fn is_endpoint(sym: &Symbol, kind: StructKind) -> bool {
    sym.as_struct().map_or(false, |st| st.kind == kind)
}
