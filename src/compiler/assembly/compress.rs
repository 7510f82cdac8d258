//! Replaces field accesses by plain references to the accessed field.
//!
//! After inlining, every field access has a declaration as its root, so the
//! chain of containers can be collapsed into a single path.

use crate::compiler::ir::{Block, StructKind, Symbol, Value, ValueKind};

pub fn compress(mut block: Block) -> Block {
    for stmt in &mut block.statements {
        compress_symbol(stmt);
    }
    block
}

fn compress_symbol(sym: &mut Symbol) {
    let path = match &sym.value {
        Value::Struct(st) if st.kind == StructKind::Access => sym.access_path(),
        _ => None,
    };

    match path {
        Some(path) => {
            if sym.decl_type.is_none() {
                sym.generated_name = path.generated_name();
            }
            sym.kind = ValueKind::Identifier;
            sym.value = Value::Reference(path);
        }
        None => {
            for child in sym.children_mut() {
                compress_symbol(child);
            }
        }
    }
}
