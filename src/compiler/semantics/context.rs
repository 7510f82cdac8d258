use std::collections::HashMap;

use log::debug;

use crate::{
    compiler::{
        ir::{DeclType, RecordShape, Shape},
        source::LineMap,
        Span,
    },
    diagnostics::{Diagnostic, TracingConfig},
    err,
};

use super::{SemanticError, SemanticResult};

/// What the analyzer knows about a declared name.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub decl_type: DeclType,
    pub shape: Shape,
    pub scope: u32,
    pub span: Span,
    /// Bound to a record literal or instance, so later record literals may
    /// add fields to it.
    pub holds_record: bool,
}

#[derive(Debug)]
struct Scope {
    id: u32,
    decls: HashMap<String, Declaration>,
}

/// State threaded through every step of the analysis: the stack of open
/// scopes, the counters used to make generated names unique, and the warnings
/// found so far.
#[derive(Debug)]
pub struct AnalysisContext<'a> {
    line_map: &'a LineMap<'a>,
    tracing: TracingConfig,
    stack: Vec<Scope>,
    next_scope: u32,
    next_call_site: u32,
    in_process: bool,
    warnings: Vec<Diagnostic>,
}

impl<'a> AnalysisContext<'a> {
    /// Creates a context with the global scope open.  The global scope has
    /// id 0.
    pub fn new(line_map: &'a LineMap<'a>, tracing: TracingConfig) -> AnalysisContext<'a> {
        AnalysisContext {
            line_map,
            tracing,
            stack: vec![Scope {
                id: 0,
                decls: HashMap::new(),
            }],
            next_scope: 1,
            next_call_site: 0,
            in_process: false,
            warnings: vec![],
        }
    }

    pub fn tracing(&self) -> TracingConfig {
        self.tracing
    }

    /// The line `span` starts on.
    pub fn line(&self, span: Span) -> u32 {
        self.line_map.position(span.low()).line
    }

    /// Opens a new scope and returns its id.  Ids are never reused.
    pub fn enter_scope(&mut self) -> u32 {
        let id = self.next_scope;
        self.next_scope += 1;
        debug!("Enter scope {}", id);
        self.stack.push(Scope {
            id,
            decls: HashMap::new(),
        });
        id
    }

    pub fn exit_scope(&mut self) {
        if self.stack.len() == 1 {
            panic!("compiler panic: attempted to leave the global scope");
        }
        let scope = self.stack.pop();
        debug!("Exit scope {:?}", scope.map(|s| s.id));
    }

    pub fn scope(&self) -> u32 {
        self.stack.last().map(|s| s.id).unwrap_or(0)
    }

    pub fn in_process(&self) -> bool {
        self.in_process
    }

    pub fn set_in_process(&mut self, in_process: bool) {
        self.in_process = in_process;
    }

    /// Finds the innermost declaration of `name`.
    pub fn lookup(&self, name: &str) -> Option<&Declaration> {
        self.stack.iter().rev().find_map(|s| s.decls.get(name))
    }

    /// Finds a declaration of `name` in the innermost scope only.
    pub fn lookup_local(&self, name: &str) -> Option<&Declaration> {
        self.stack.last().and_then(|s| s.decls.get(name))
    }

    /// Adds `name` to the innermost scope.  Fails if the scope already
    /// declares `name`.
    pub fn declare(&mut self, name: &str, decl: Declaration) -> SemanticResult<()> {
        let span = decl.span;
        let scope = self
            .stack
            .last_mut()
            .expect("compiler panic: the scope stack is empty");
        if scope.decls.contains_key(name) {
            return err!(span, SemanticError::AlreadyDeclared(name.into()));
        }

        debug!("Declare {} in scope {}", name, scope.id);
        scope.decls.insert(name.into(), decl);
        Ok(())
    }

    /// Adds the fields of `fields` to the record `name` declared in the
    /// innermost scope.
    pub fn merge_record(&mut self, name: &str, fields: RecordShape) {
        let decl = self.stack.last_mut().and_then(|s| s.decls.get_mut(name));
        match decl {
            Some(Declaration {
                shape: Shape::Record(record),
                ..
            }) => record.merge(fields),
            _ => panic!("compiler panic: {} is not a record in this scope", name),
        }
    }

    /// Returns a number distinguishing this call from every other call in the
    /// program.
    pub fn next_call_site(&mut self) -> u32 {
        let site = self.next_call_site;
        self.next_call_site += 1;
        site
    }

    /// The first scope id which has not been handed out.
    pub fn scope_count(&self) -> u32 {
        self.next_scope
    }

    pub fn warn(&mut self, span: Span, message: String) {
        let position = self.line_map.position(span.low());
        self.warnings
            .push(Diagnostic::warning(message, Some(position)));
    }

    pub fn into_warnings(self) -> Vec<Diagnostic> {
        self.warnings
    }
}
