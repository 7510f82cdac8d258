//! Inlines every call of a process and removes process declarations.
//!
//! Each call is replaced by the return value of the process.  The local
//! declarations of the process body are copied in front of the statement
//! containing the call, in a fresh scope so that repeated calls do not
//! collide, and every use of a parameter is replaced by the argument given
//! for it.  Expressions are simplified again afterwards since arguments may
//! be constants.

use std::collections::HashMap;

use log::debug;

use crate::compiler::{
    ir::{Block, Call, DeclType, ProcessDef, StructKind, Symbol, Value, ValueKind},
    semantics::fold,
    Span,
};
use crate::err;

use super::{AssemblyError, AssemblyResult, DeclMap};

pub struct Flattener {
    processes: HashMap<String, ProcessDef>,
    next_scope: u32,

    /// Delays which lost their effect because their operand became a
    /// constant.
    constant_delays: Vec<Span>,
}

impl Flattener {
    /// Creates a flattener for the processes declared in `map`.  New scopes
    /// are numbered from `next_scope` on.
    pub fn new(map: &DeclMap, next_scope: u32) -> Flattener {
        let mut processes: HashMap<String, ProcessDef> = HashMap::new();
        for decl in map.iter() {
            match &decl.value {
                Value::Process(def) => {
                    processes.insert(decl.generated_name.clone(), def.as_ref().clone());
                }
                Value::Reference(alias) if decl.decl_type == Some(DeclType::Process) => {
                    if let Some(def) = processes.get(&alias.root_name()).cloned() {
                        processes.insert(decl.generated_name.clone(), def);
                    }
                }
                _ => (),
            }
        }

        Flattener {
            processes,
            next_scope,
            constant_delays: vec![],
        }
    }

    pub fn run(&mut self, block: Block) -> AssemblyResult<Block> {
        let mut statements = vec![];
        for stmt in block.statements {
            if is_process(&stmt) {
                debug!("Remove process {}", stmt.generated_name);
                continue;
            }

            let mut hoisted = vec![];
            let stmt = self.inline(stmt, &mut hoisted)?;
            statements.extend(hoisted);
            statements.push(stmt);
        }

        Ok(Block {
            statements,
            scope: block.scope,
        })
    }

    pub fn constant_delays(&self) -> &[Span] {
        &self.constant_delays
    }

    /// Replaces the calls within `sym`.  Declarations the replaced calls
    /// depend on are added to `hoisted`.
    fn inline(&mut self, mut sym: Symbol, hoisted: &mut Vec<Symbol>) -> AssemblyResult<Symbol> {
        if !contains_call(&sym) {
            return Ok(sym);
        }

        for child in sym.children_mut() {
            let taken = std::mem::replace(child, placeholder());
            *child = self.inline(taken, hoisted)?;
        }

        match std::mem::replace(&mut sym.value, Value::None) {
            Value::Call(call) => {
                let mut result = self.expand(*call, sym.span, hoisted)?;
                result.rebind_from(&sym);
                Ok(result)
            }
            value => {
                sym.value = value;
                refold(sym, &mut self.constant_delays)
            }
        }
    }

    fn expand(&mut self, call: Call, span: Span, hoisted: &mut Vec<Symbol>) -> AssemblyResult<Symbol> {
        let def = match self.processes.get(&call.callee.root_name()) {
            Some(def) => def.clone(),
            None => return err!(span, AssemblyError::Unresolved(call.callee.to_string())),
        };

        let scope = self.next_scope;
        self.next_scope += 1;
        debug!(
            "Inline call {} of {} into scope {}",
            call.site, call.callee, scope
        );

        let rewrite = Rewrite {
            from: def.scope(),
            to: scope,
            args: def
                .params
                .iter()
                .map(|p| p.name.clone())
                .zip(call.args)
                .collect(),
        };

        for stmt in def.body.statements {
            let stmt = rewrite.apply(stmt, &mut self.constant_delays)?;
            let stmt = self.inline(stmt, hoisted)?;
            hoisted.push(stmt);
        }

        let ret = rewrite.apply(def.ret, &mut self.constant_delays)?;
        self.inline(ret, hoisted)
    }
}

/// Moves a copy of a process body from the scope of the process to the scope
/// of one call and substitutes the arguments of the call.
struct Rewrite {
    from: u32,
    to: u32,
    args: HashMap<String, Symbol>,
}

impl Rewrite {
    fn apply(&self, mut sym: Symbol, constant_delays: &mut Vec<Span>) -> AssemblyResult<Symbol> {
        if sym.scope_id == Some(self.from) {
            match (sym.name.clone(), sym.decl_type.clone()) {
                (Some(name), Some(decl_type)) => sym.bind(&name, self.to, decl_type),
                _ => sym.scope_id = Some(self.to),
            }
        }

        if let Value::Reference(target) = &sym.value {
            if target.scope != self.from {
                return Ok(sym);
            }

            if let (true, Some(arg)) = (target.fields.is_empty(), self.args.get(&target.name)) {
                let mut arg = arg.clone();
                arg.rebind_from(&sym);
                return Ok(arg);
            }

            let mut target = target.clone();
            target.scope = self.to;
            if sym.decl_type.is_none() {
                sym.generated_name = target.generated_name();
            }
            sym.value = Value::Reference(target);
            return Ok(sym);
        }

        if let Value::Connection(conn) = &mut sym.value {
            if conn.target.scope == self.from {
                conn.target.scope = self.to;
                sym.generated_name = conn.target.generated_name();
            }
        }

        for child in sym.children_mut() {
            let taken = std::mem::replace(child, placeholder());
            *child = self.apply(taken, constant_delays)?;
        }

        let access = match &sym.value {
            Value::Struct(st) if st.kind == StructKind::Access => sym.access_path(),
            _ => None,
        };
        if let (Some(path), None) = (access, &sym.decl_type) {
            sym.generated_name = path.generated_name();
        }

        refold(sym, constant_delays)
    }
}

/// Simplifies an operation again after its operands have changed.  The
/// declaration attributes of `sym` are kept.
fn refold(mut sym: Symbol, constant_delays: &mut Vec<Span>) -> AssemblyResult<Symbol> {
    let op = match std::mem::replace(&mut sym.value, Value::None) {
        Value::Operation(op) => *op,
        value => {
            sym.value = value;
            return Ok(sym);
        }
    };

    let span = sym.span;
    let folded = if sym.kind == ValueKind::Delay {
        if sym.delay_depth == 0 {
            sym.value = Value::Operation(Box::new(op));
            return Ok(sym);
        }
        if op.lhs.kind.is_immediate() {
            constant_delays.push(span);
        }
        fold::delay(
            op.lhs,
            sym.delay_depth as i64,
            sym.scope_id.unwrap_or(0),
            span,
        )
    } else {
        match op.rhs {
            Some(rhs) => fold::binary(op.operator, op.lhs, rhs, span),
            None => fold::unary(op.operator, op.lhs, span),
        }
    };

    let mut folded = folded.map_err(|e| e.map_inner(AssemblyError::Semantic))?;
    folded.rebind_from(&sym);
    Ok(folded)
}

fn is_process(sym: &Symbol) -> bool {
    sym.kind == ValueKind::Process || sym.decl_type == Some(DeclType::Process)
}

fn contains_call(sym: &Symbol) -> bool {
    match sym.value {
        Value::Call(_) => true,
        _ => sym.children().into_iter().any(contains_call),
    }
}

fn placeholder() -> Symbol {
    Symbol::new(ValueKind::Identifier, Value::None, Span::zero())
}
