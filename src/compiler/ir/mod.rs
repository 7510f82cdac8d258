//! The symbolic intermediate representation produced by semantic analysis
//! and rewritten by the assembly passes.

mod operator;
mod symbol;
mod types;

pub use operator::{OperatorClass, OperatorKind};
pub use symbol::{
    Block, Call, Clock, Connection, Literal, Operation, Parameter, ProcessDef, Program, Struct,
    StructKind, Symbol, SymbolRef, Value,
};
pub use types::{DeclType, Endpoint, Primitive, RecordShape, Shape, Signature, ValueKind};
