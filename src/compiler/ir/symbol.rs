use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::compiler::{mangle, Span};

use super::{DeclType, OperatorKind, Primitive, ValueKind};

/// The unit of the intermediate representation.  Everything the analyzer
/// produces from an expression or statement is a `Symbol`; named symbols are
/// declarations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    pub kind: ValueKind,

    /// Declared name, or the field name for members of a record.
    pub name: Option<String>,

    pub value: Value,

    /// Name the value has in generated code.  Empty for immediates which have
    /// not been bound to a name.
    pub generated_name: String,

    pub is_delay: bool,
    pub delay_depth: u32,

    /// Scope the symbol was declared in.  Only set for declarations and for
    /// delays, whose generated names depend on the scope.
    pub scope_id: Option<u32>,

    pub decl_type: Option<DeclType>,

    /// For values which are not immediates or expressions: the scalar kind the
    /// value has at run time, if it has one.
    pub evaluates_to: Option<Primitive>,

    pub span: Span,
}

impl Symbol {
    pub fn new(kind: ValueKind, value: Value, span: Span) -> Symbol {
        Symbol {
            kind,
            name: None,
            value,
            generated_name: String::new(),
            is_delay: false,
            delay_depth: 0,
            scope_id: None,
            decl_type: None,
            evaluates_to: None,
            span,
        }
    }

    pub fn immediate(literal: Literal, span: Span) -> Symbol {
        Symbol::new(
            ValueKind::Immediate(literal.primitive()),
            Value::Literal(literal),
            span,
        )
    }

    /// An expression whose result is named `generated_name`.
    pub fn expression(
        primitive: Primitive,
        generated_name: String,
        op: Operation,
        span: Span,
    ) -> Symbol {
        let mut sym = Symbol::new(
            ValueKind::Expression(primitive),
            Value::Operation(Box::new(op)),
            span,
        );
        sym.generated_name = generated_name;
        sym
    }

    /// A use of the declaration `target`.
    pub fn reference(target: SymbolRef, evaluates_to: Option<Primitive>, span: Span) -> Symbol {
        let mut sym = Symbol::new(ValueKind::Identifier, Value::None, span);
        sym.generated_name = target.generated_name();
        sym.evaluates_to = evaluates_to;
        sym.value = Value::Reference(target);
        sym
    }

    /// The scalar kind this symbol has at run time.
    pub fn primitive(&self) -> Option<Primitive> {
        match self.kind {
            ValueKind::Immediate(p) | ValueKind::Expression(p) => Some(p),
            _ => self.evaluates_to,
        }
    }

    pub fn literal(&self) -> Option<&Literal> {
        match &self.value {
            Value::Literal(l) if self.kind.is_immediate() => Some(l),
            _ => None,
        }
    }

    pub fn operation(&self) -> Option<&Operation> {
        match &self.value {
            Value::Operation(op) => Some(op),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&Struct> {
        match &self.value {
            Value::Struct(s) => Some(s),
            _ => None,
        }
    }

    /// The declaration and path of fields a reference or field access refers
    /// to.
    pub fn access_path(&self) -> Option<SymbolRef> {
        match &self.value {
            Value::Reference(r) => Some(r.clone()),
            Value::Struct(st) if st.kind == StructKind::Access => {
                let container = st.members.first()?;
                let mut path = container.access_path()?;
                path.fields.push(container.name.clone()?);
                Some(path)
            }
            _ => None,
        }
    }

    /// The name other values use to refer to this one when building their
    /// own generated names.
    pub fn reference_name(&self) -> String {
        match (self.generated_name.is_empty(), self.literal()) {
            (true, Some(literal)) => literal.mangled_name(),
            _ => self.generated_name.clone(),
        }
    }

    /// Turns this symbol into the declaration `name` in `scope`.  Members of
    /// records are named after the record.
    pub fn bind(&mut self, name: &str, scope: u32, decl_type: DeclType) {
        self.name = Some(name.into());
        self.scope_id = Some(scope);
        self.decl_type = Some(decl_type);
        self.generated_name = mangle::scoped_name(scope, name);
        if let Value::Struct(st) = &mut self.value {
            st.name_members(name, scope);
        }
    }

    /// Copies the declaration attributes of `declared` onto this symbol.  Used
    /// when the value of a declaration is replaced by a simplified value.
    pub fn rebind_from(&mut self, declared: &Symbol) {
        if let (Some(name), Some(scope), Some(decl_type)) =
            (&declared.name, declared.scope_id, &declared.decl_type)
        {
            self.name = Some(name.clone());
            self.scope_id = Some(scope);
            self.decl_type = Some(decl_type.clone());
            self.generated_name = declared.generated_name.clone();
        }
    }

    pub fn children(&self) -> Vec<&Symbol> {
        match &self.value {
            Value::Operation(op) => op.operands().collect(),
            Value::Struct(st) => st.members.iter().collect(),
            Value::Process(p) => p.body.statements.iter().chain(Some(&p.ret)).collect(),
            Value::Call(call) => call.args.iter().collect(),
            Value::Connection(c) => vec![&c.value],
            Value::None
            | Value::Literal(_)
            | Value::Reference(_)
            | Value::Import(_) => vec![],
        }
    }

    pub fn children_mut(&mut self) -> Vec<&mut Symbol> {
        match &mut self.value {
            Value::Operation(op) => {
                let op = op.as_mut();
                let mut children = vec![&mut op.lhs];
                if let Some(rhs) = op.rhs.as_mut() {
                    children.push(rhs);
                }
                children
            }
            Value::Struct(st) => st.members.iter_mut().collect(),
            Value::Process(p) => {
                let p = p.as_mut();
                p.body.statements.iter_mut().chain(Some(&mut p.ret)).collect()
            }
            Value::Call(call) => call.args.iter_mut().collect(),
            Value::Connection(c) => vec![&mut c.value],
            Value::None
            | Value::Literal(_)
            | Value::Reference(_)
            | Value::Import(_) => vec![],
        }
    }
}

/// The value held by a [`Symbol`].  Which variant is present follows from the
/// symbol's [`ValueKind`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Run time values with no compile time content, e.g. the output of a
    /// source.
    None,
    Literal(Literal),
    Operation(Box<Operation>),
    Struct(Struct),
    Reference(SymbolRef),
    Process(Box<ProcessDef>),
    Call(Box<Call>),
    Connection(Box<Connection>),

    /// The dotted path of an imported module.
    Import(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    List(Vec<Literal>),
}

impl Literal {
    pub fn primitive(&self) -> Primitive {
        match self {
            Literal::Int(_) => Primitive::Int,
            Literal::Float(_) => Primitive::Float,
            Literal::Bool(_) => Primitive::Bool,
            Literal::Str(_) => Primitive::Str,
            Literal::List(_) => Primitive::List,
        }
    }

    /// Renders the literal as an identifier fragment for use inside generated
    /// names: `-` becomes `n` and `.` becomes `d`.
    pub fn mangled_name(&self) -> String {
        let text = match self {
            Literal::Int(i) if *i < 0 => format!("n{}", i.unsigned_abs()),
            Literal::Float(f) => format!("{:?}", f),
            _ => format!("{}", self),
        };
        text.chars()
            .filter_map(|c| match c {
                '-' => Some('n'),
                '.' => Some('d'),
                c if c.is_ascii_alphanumeric() || c == '_' => Some(c),
                _ => None,
            })
            .collect()
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::Int(i) => f.write_fmt(format_args!("{}", i)),
            Literal::Float(v) => f.write_fmt(format_args!("{:?}", v)),
            Literal::Bool(b) => f.write_fmt(format_args!("{}", b)),
            Literal::Str(s) => f.write_fmt(format_args!("{:?}", s)),
            Literal::List(items) => {
                f.write_str("[")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    f.write_fmt(format_args!("{}", item))?;
                }
                f.write_str("]")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub is_binary: bool,
    pub operator: OperatorKind,
    pub lhs: Symbol,
    pub rhs: Option<Symbol>,
}

impl Operation {
    pub fn binary(operator: OperatorKind, lhs: Symbol, rhs: Symbol) -> Operation {
        Operation {
            is_binary: true,
            operator,
            lhs,
            rhs: Some(rhs),
        }
    }

    pub fn unary(operator: OperatorKind, operand: Symbol) -> Operation {
        Operation {
            is_binary: false,
            operator,
            lhs: operand,
            rhs: None,
        }
    }

    pub fn operands(&self) -> impl Iterator<Item = &Symbol> {
        Some(&self.lhs).into_iter().chain(self.rhs.as_ref())
    }
}

/// Names a declaration, optionally followed by a path of fields into it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SymbolRef {
    pub name: String,
    pub scope: u32,
    pub fields: Vec<String>,
}

impl SymbolRef {
    pub fn new(name: &str, scope: u32) -> SymbolRef {
        SymbolRef {
            name: name.into(),
            scope,
            fields: vec![],
        }
    }

    /// Generated name of the declaration this refers to, ignoring fields.
    pub fn root_name(&self) -> String {
        mangle::scoped_name(self.scope, &self.name)
    }

    /// Generated name of the value this refers to.
    pub fn generated_name(&self) -> String {
        if self.fields.is_empty() {
            self.root_name()
        } else {
            mangle::scoped_name(
                self.scope,
                &format!("{}_{}", self.name, self.fields.join("_")),
            )
        }
    }
}

impl Display for SymbolRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)?;
        for field in &self.fields {
            f.write_fmt(format_args!(".{}", field))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StructKind {
    /// A record literal or a record type declaration.
    Record,

    /// Built by calling the record type with the given name.
    Instance(String),

    Source,
    Sink,

    /// A field access.  The single member is the container and is named after
    /// the accessed field.
    Access,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Struct {
    pub members: Vec<Symbol>,
    pub is_anonymous: bool,
    pub kind: StructKind,
}

impl Struct {
    pub fn member(&self, name: &str) -> Option<&Symbol> {
        self.members
            .iter()
            .find(|m| m.name.as_deref() == Some(name))
    }

    /// Adds the members of `other`, replacing members with the same name.
    pub fn merge(&mut self, other: Struct) {
        for member in other.members {
            match self.members.iter_mut().find(|m| m.name == member.name) {
                Some(existing) => *existing = member,
                None => self.members.push(member),
            }
        }
    }

    fn name_members(&mut self, owner: &str, scope: u32) {
        if self.kind == StructKind::Access {
            return;
        }

        for member in &mut self.members {
            let field = match &member.name {
                Some(field) => format!("{}_{}", owner, field),
                None => continue,
            };
            member.scope_id = Some(scope);
            member.generated_name = mangle::scoped_name(scope, &field);
            if let Value::Struct(inner) = &mut member.value {
                inner.name_members(&field, scope);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub statements: Vec<Symbol>,
    pub scope: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub decl_type: DeclType,
    pub generated_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessDef {
    pub params: Vec<Parameter>,
    pub body: Block,
    pub ret: Symbol,
}

impl ProcessDef {
    pub fn scope(&self) -> u32 {
        self.body.scope
    }
}

/// A call of a process.  Arguments are in parameter order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Call {
    pub callee: SymbolRef,
    pub args: Vec<Symbol>,

    /// Distinguishes calls of the same process.
    pub site: u32,
}

/// Drives an endpoint input with a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub target: SymbolRef,
    pub value: Symbol,
}

/// The fully assembled program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub block: Block,

    /// Every declaration of the program in declaration order.
    pub declarations: Vec<Symbol>,

    /// Dotted paths of the imported modules.
    pub imports: Vec<String>,

    pub sources: Vec<Symbol>,
    pub sinks: Vec<Symbol>,

    /// Absent when the program declares no endpoints.
    pub clock: Option<Clock>,
}

/// The sample rate the program runs at, and the source it was taken from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clock {
    pub rate: i64,
    pub source: String,
}
