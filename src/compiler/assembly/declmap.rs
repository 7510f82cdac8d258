use std::collections::HashMap;

use log::debug;

use crate::compiler::ir::{Block, StructKind, Symbol, SymbolRef, Value};
use crate::err;

use super::{AssemblyError, AssemblyResult};

/// Every declaration of a program keyed by generated name, in declaration
/// order.
#[derive(Debug, Clone, Default)]
pub struct DeclMap {
    index: HashMap<String, usize>,
    symbols: Vec<Symbol>,
}

impl DeclMap {
    /// Collects the declarations among the statements of `block`.
    pub fn build(block: &Block) -> AssemblyResult<DeclMap> {
        let mut map = DeclMap::default();
        for sym in block.statements.iter().filter(|s| s.decl_type.is_some()) {
            map.insert(sym.clone())?;
        }
        debug!("Declaration map holds {} declarations", map.len());
        Ok(map)
    }

    /// Adds a declaration.  Declaring a record again with a record literal
    /// adds the fields of the literal to the record; any other repeated
    /// declaration is an error.
    pub fn insert(&mut self, sym: Symbol) -> AssemblyResult<()> {
        let idx = match self.index.get(&sym.generated_name) {
            Some(idx) => *idx,
            None => {
                self.index
                    .insert(sym.generated_name.clone(), self.symbols.len());
                self.symbols.push(sym);
                return Ok(());
            }
        };

        let name = sym.name.clone().unwrap_or_default();
        let span = sym.span;
        match (&mut self.symbols[idx].value, sym.value) {
            (Value::Struct(existing), Value::Struct(fields))
                if is_plain_record(&existing.kind)
                    && is_plain_record(&fields.kind)
                    && fields.is_anonymous =>
            {
                debug!("Merge fields into {}", name);
                existing.merge(fields);
                Ok(())
            }
            _ => err!(span, AssemblyError::Redeclared(name)),
        }
    }

    pub fn get(&self, generated_name: &str) -> Option<&Symbol> {
        self.index.get(generated_name).map(|idx| &self.symbols[*idx])
    }

    /// Finds the value `path` refers to.  Fields of imported modules are
    /// external and resolve to the module itself.
    pub fn resolve(&self, path: &SymbolRef) -> Option<&Symbol> {
        let mut current = self.get(&path.root_name())?;
        for (idx, field) in path.fields.iter().enumerate() {
            current = match &current.value {
                Value::Import(_) => return Some(current),
                Value::Struct(st) => st.member(field)?,
                Value::Reference(alias) => {
                    let mut rest = alias.clone();
                    rest.fields.extend(path.fields[idx..].iter().cloned());
                    return self.resolve(&rest);
                }
                _ => return None,
            };
        }
        Some(current)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn into_symbols(self) -> Vec<Symbol> {
        self.symbols
    }
}

fn is_plain_record(kind: &StructKind) -> bool {
    match kind {
        StructKind::Record | StructKind::Instance(_) => true,
        _ => false,
    }
}
