use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::compiler::lexer::TokenKind;

/// Host kinds of values the compiler can compute with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Primitive {
    Int,
    Float,
    Bool,
    Str,
    List,
}

impl Display for Primitive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Primitive::Int => f.write_str("int"),
            Primitive::Float => f.write_str("float"),
            Primitive::Bool => f.write_str("bool"),
            Primitive::Str => f.write_str("string"),
            Primitive::List => f.write_str("list"),
        }
    }
}

/// What kind of value a [`Symbol`](super::Symbol) holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueKind {
    /// Known while compiling; the symbol carries the value.
    Immediate(Primitive),

    /// Only known at run time; the symbol carries the name of the result.
    Expression(Primitive),

    /// A use of a declared name.
    Identifier,
    Struct,
    Block,
    Delay,
    Process,
    Call,
    Connection,
    Module,
}

impl ValueKind {
    pub fn is_immediate(&self) -> bool {
        match self {
            ValueKind::Immediate(_) => true,
            _ => false,
        }
    }
}

impl Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueKind::Immediate(p) => f.write_fmt(format_args!("immediate {}", p)),
            ValueKind::Expression(p) => f.write_fmt(format_args!("{} expression", p)),
            ValueKind::Identifier => f.write_str("identifier"),
            ValueKind::Struct => f.write_str("record"),
            ValueKind::Block => f.write_str("block"),
            ValueKind::Delay => f.write_str("delayed value"),
            ValueKind::Process => f.write_str("process"),
            ValueKind::Call => f.write_str("call"),
            ValueKind::Connection => f.write_str("connection"),
            ValueKind::Module => f.write_str("module"),
        }
    }
}

/// A type named in a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeclType {
    Byte,
    I16,
    I24,
    I32,
    I64,
    U16,
    U24,
    U32,
    U64,
    F32,
    F64,
    Bool,
    Number,
    Record,
    Process,
    Module,

    /// A previously declared record, used as a type.
    Custom(String),
}

impl DeclType {
    pub fn from_token(kind: TokenKind) -> Option<DeclType> {
        Some(match kind {
            TokenKind::Byte => DeclType::Byte,
            TokenKind::I16 => DeclType::I16,
            TokenKind::I24 => DeclType::I24,
            TokenKind::I32 => DeclType::I32,
            TokenKind::I64 => DeclType::I64,
            TokenKind::U16 => DeclType::U16,
            TokenKind::U24 => DeclType::U24,
            TokenKind::U32 => DeclType::U32,
            TokenKind::U64 => DeclType::U64,
            TokenKind::F32 => DeclType::F32,
            TokenKind::F64 => DeclType::F64,
            TokenKind::Bool => DeclType::Bool,
            TokenKind::Number => DeclType::Number,
            TokenKind::Record => DeclType::Record,
            TokenKind::Process => DeclType::Process,
            TokenKind::Module => DeclType::Module,
            _ => return None,
        })
    }

    /// The range of values an integer type can hold, or `None` if this is
    /// not an integer type.
    pub fn int_range(&self) -> Option<(i64, i64)> {
        match self {
            DeclType::Byte => Some((0, 255)),
            DeclType::I16 => Some((i16::MIN as i64, i16::MAX as i64)),
            DeclType::I24 => Some((-(1 << 23), (1 << 23) - 1)),
            DeclType::I32 => Some((i32::MIN as i64, i32::MAX as i64)),
            DeclType::I64 => Some((i64::MIN, i64::MAX)),
            DeclType::U16 => Some((0, u16::MAX as i64)),
            DeclType::U24 => Some((0, (1 << 24) - 1)),
            DeclType::U32 => Some((0, u32::MAX as i64)),
            DeclType::U64 => Some((0, i64::MAX)),
            _ => None,
        }
    }

    /// The single scalar kind a value of this type has.
    pub fn primitive(&self) -> Option<Primitive> {
        match self {
            DeclType::F32 | DeclType::F64 => Some(Primitive::Float),
            DeclType::Bool => Some(Primitive::Bool),
            t if t.int_range().is_some() => Some(Primitive::Int),
            _ => None,
        }
    }

    /// Compatibility between declared types and the shapes of values.
    /// Custom record types also require their fields to match, which is
    /// checked against the record's declaration.
    pub fn accepts(&self, shape: &Shape) -> bool {
        match (self, shape) {
            (_, Shape::External) => *self != DeclType::Module,
            (DeclType::Number, Shape::Scalar(Primitive::Int))
            | (DeclType::Number, Shape::Scalar(Primitive::Float)) => true,
            (DeclType::Record, Shape::Record(_)) => true,
            (DeclType::Custom(_), Shape::Record(r)) => r.endpoint.is_none(),
            (DeclType::Process, Shape::Process(_)) => true,
            (DeclType::Module, Shape::Module) => true,
            (t, Shape::Scalar(p)) => t.primitive() == Some(*p),
            _ => false,
        }
    }
}

impl Display for DeclType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DeclType::Byte => "byte",
            DeclType::I16 => "i16",
            DeclType::I24 => "i24",
            DeclType::I32 => "i32",
            DeclType::I64 => "i64",
            DeclType::U16 => "u16",
            DeclType::U24 => "u24",
            DeclType::U32 => "u32",
            DeclType::U64 => "u64",
            DeclType::F32 => "f32",
            DeclType::F64 => "f64",
            DeclType::Bool => "bool",
            DeclType::Number => "number",
            DeclType::Record => "record",
            DeclType::Process => "process",
            DeclType::Module => "module",
            DeclType::Custom(name) => name,
        };
        f.write_str(name)
    }
}

/// Marks a record built by one of the endpoint constructors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Endpoint {
    Source,
    Sink,
}

/// The structure of a value as far as the analyzer needs to know it to check
/// uses of the value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Scalar(Primitive),
    Record(RecordShape),
    Process(Signature),
    Module,

    /// A member of an imported module.  Nothing is known about it.
    External,
}

impl Shape {
    pub fn scalar(&self) -> Option<Primitive> {
        match self {
            Shape::Scalar(p) => Some(*p),
            _ => None,
        }
    }
}

impl Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Shape::Scalar(p) => f.write_fmt(format_args!("{}", p)),
            Shape::Record(r) => match (&r.endpoint, &r.type_name) {
                (Some(Endpoint::Source), _) => f.write_str("source"),
                (Some(Endpoint::Sink), _) => f.write_str("sink"),
                (None, Some(name)) => f.write_fmt(format_args!("record {}", name)),
                (None, None) => f.write_str("record"),
            },
            Shape::Process(_) => f.write_str("process"),
            Shape::Module => f.write_str("module"),
            Shape::External => f.write_str("external value"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordShape {
    pub fields: Vec<(String, Shape)>,
    pub endpoint: Option<Endpoint>,

    /// Name of the record type this record was instantiated from.
    pub type_name: Option<String>,
}

impl RecordShape {
    pub fn field(&self, name: &str) -> Option<&Shape> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    /// Adds the fields of `other`, replacing fields with the same name.
    pub fn merge(&mut self, other: RecordShape) {
        for (name, shape) in other.fields {
            match self.fields.iter_mut().find(|(n, _)| *n == name) {
                Some(field) => field.1 = shape,
                None => self.fields.push((name, shape)),
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    pub params: Vec<(String, DeclType)>,
    pub ret: Primitive,
}
