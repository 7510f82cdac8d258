use crate::compiler::{
    semantics::SemanticError, source::LineMap, CompilerDisplay, CompilerDisplayError,
};

/// Errors found while assembling an analyzed program into its final form.
#[derive(Clone, Debug, PartialEq)]
pub enum AssemblyError {
    Redeclared(String),
    Unresolved(String),
    UnflattenedCall(String),
    UnflattenedProcess(String),
    UncompressedAccess(String),
    UndrivenSink(String),
    MultiplyDrivenSink(String, usize),
    SinkWithoutSource(String),
    NoSource,
    InconsistentClock(String, i64, String, i64),

    /// Simplifying an inlined process body failed.
    Semantic(SemanticError),
}

impl AssemblyError {
    /// Whether this error is caused by a bug in the compiler rather than by
    /// the program being compiled.
    pub fn is_internal(&self) -> bool {
        match self {
            AssemblyError::Unresolved(_)
            | AssemblyError::UnflattenedCall(_)
            | AssemblyError::UnflattenedProcess(_)
            | AssemblyError::UncompressedAccess(_) => true,
            AssemblyError::Semantic(e) => e.is_internal(),
            _ => false,
        }
    }
}

impl CompilerDisplay for AssemblyError {
    fn fmt(&self, lm: &LineMap) -> Result<String, CompilerDisplayError> {
        let msg = match self {
            AssemblyError::Redeclared(name) => format!("{} is declared more than once", name),
            AssemblyError::Unresolved(name) => {
                format!("{} does not refer to any declaration", name)
            }
            AssemblyError::UnflattenedCall(name) => {
                format!("Call of {} remains after inlining", name)
            }
            AssemblyError::UnflattenedProcess(name) => {
                format!("Process {} remains after inlining", name)
            }
            AssemblyError::UncompressedAccess(name) => {
                format!("Field access {} remains after compression", name)
            }
            AssemblyError::UndrivenSink(name) => format!("Sink {} has no input", name),
            AssemblyError::MultiplyDrivenSink(name, n) => {
                format!("Sink {} is driven by {} connections", name, n)
            }
            AssemblyError::SinkWithoutSource(name) => {
                format!("The input of sink {} does not depend on any source", name)
            }
            AssemblyError::NoSource => "The program does not declare a source".into(),
            AssemblyError::InconsistentClock(first, rate, other, other_rate) => format!(
                "Source {} runs at {} but source {} runs at {}",
                other, other_rate, first, rate
            ),
            AssemblyError::Semantic(e) => e.fmt(lm)?,
        };
        Ok(msg)
    }
}
