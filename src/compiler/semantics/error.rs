use crate::compiler::{
    ir::{DeclType, OperatorKind, Primitive},
    source::LineMap,
    CompilerDisplay, CompilerDisplayError,
};

/// Errors generated during semantic analysis of a program, and while
/// simplifying expressions after processes have been inlined.
#[derive(Clone, Debug, PartialEq)]
pub enum SemanticError {
    NotDefined(String),
    AlreadyDeclared(String),

    /// The value assigned to a declaration does not have the declared type.
    BindMismatch(String, DeclType, String),
    OutOfRange(DeclType, i64),
    CannotImplicitlyCast(OperatorKind, Primitive, Primitive),
    OpExpected(OperatorKind, &'static str, String),
    Overflow(OperatorKind),
    DivisionByZero,
    NegativeExponent(i64),
    ShiftOutOfRange(i64),
    NonFiniteResult(OperatorKind),
    InvalidDelay(i64),
    NotDelayable(String),
    MemberAccessInvalidRoot(String),
    MemberNotFound(String, String),
    NotCallable(String),
    CallWrongNumParams(String, usize, usize),
    UnknownParameter(String, String),
    DuplicateArgument(String),
    PositionalAfterNamed,
    ArgumentMismatch(String, DeclType, String),
    InvalidParameterType(String, DeclType),
    InvalidReturnType(String),
    MissingReturn,
    ReturnInvalidLocation,
    NestedProcess,
    NotAType(String),
    RecordMissingField(String, String),
    RecordUnexpectedField(String, String),
    RecordFieldMismatch(String, String, String),
    DuplicateField(String),
    ProcessInRecord(String),
    MergeIntoNonLiteral(String),
    InvalidAssignmentTarget,
    ConnectionToNonSink(String),
    ConnectionExpectsFloat(String),
    InvalidSourceRate(String),
    SinkArguments(usize),
    ModuleNotImported,
    ExternalValue(String),
    InconsistentListElements(Primitive, Primitive),
    ListElementNotConstant(String),

    /// The parse tree does not have the structure the grammar guarantees.
    InvalidStructure(String),
}

impl SemanticError {
    /// Whether this error is caused by a bug in the compiler rather than by
    /// the program being compiled.
    pub fn is_internal(&self) -> bool {
        match self {
            SemanticError::InvalidStructure(_) => true,
            _ => false,
        }
    }
}

impl CompilerDisplay for SemanticError {
    fn fmt(&self, _: &LineMap) -> Result<String, CompilerDisplayError> {
        let msg = match self {
            SemanticError::NotDefined(name) => {
                format!("Could not find definition for {} in this scope", name)
            }
            SemanticError::AlreadyDeclared(name) => format!("{} already declared", name),
            SemanticError::BindMismatch(name, expected, actual) => {
                format!("{} is of type {} but is assigned {}", name, expected, actual)
            }
            SemanticError::OutOfRange(ty, value) => {
                format!("{} does not fit in type {}", value, ty)
            }
            SemanticError::CannotImplicitlyCast(op, l, r) => format!(
                "{} cannot be applied to {} and {}: cannot implicitly cast {} to {}",
                op, l, r, r, l
            ),
            SemanticError::OpExpected(op, expected, actual) => {
                format!("{} expected {} but found {}", op, expected, actual)
            }
            SemanticError::Overflow(op) => format!("Integer overflow in {}", op),
            SemanticError::DivisionByZero => "Division by zero".into(),
            SemanticError::NegativeExponent(e) => {
                format!("Integer raised to negative power {}", e)
            }
            SemanticError::ShiftOutOfRange(s) => {
                format!("Shift amount {} is not between 0 and 63", s)
            }
            SemanticError::NonFiniteResult(op) => format!("{} produces a non-finite value", op),
            SemanticError::InvalidDelay(n) => {
                format!("Delay must be at least one sample but is {}", n)
            }
            SemanticError::NotDelayable(actual) => format!("Cannot delay {}", actual),
            SemanticError::MemberAccessInvalidRoot(actual) => {
                format!("Member access requires a named record but found {}", actual)
            }
            SemanticError::MemberNotFound(owner, member) => {
                format!("{} does not have member {}", owner, member)
            }
            SemanticError::NotCallable(name) => format!("{} cannot be called", name),
            SemanticError::CallWrongNumParams(name, expected, actual) => format!(
                "Incorrect number of parameters passed to {}. Expected {} but got {}",
                name, expected, actual
            ),
            SemanticError::UnknownParameter(name, param) => {
                format!("{} does not have a parameter {}", name, param)
            }
            SemanticError::DuplicateArgument(param) => {
                format!("Parameter {} is given more than once", param)
            }
            SemanticError::PositionalAfterNamed => {
                "Positional arguments must come before named arguments".into()
            }
            SemanticError::ArgumentMismatch(param, expected, actual) => format!(
                "Parameter {} expects {} but got {}",
                param, expected, actual
            ),
            SemanticError::InvalidParameterType(param, ty) => format!(
                "Parameter {} has type {} but parameters must be integer, float or bool",
                param, ty
            ),
            SemanticError::InvalidReturnType(actual) => {
                format!("A process must return an integer, float or bool but returns {}", actual)
            }
            SemanticError::MissingReturn => "A process body must end with a return".into(),
            SemanticError::ReturnInvalidLocation => {
                "return is only allowed as the last statement of a process".into()
            }
            SemanticError::NestedProcess => {
                "Processes can only be declared at the top level".into()
            }
            SemanticError::NotAType(name) => format!("{} is not a record type", name),
            SemanticError::RecordMissingField(ty, field) => {
                format!("{} requires field {}", ty, field)
            }
            SemanticError::RecordUnexpectedField(ty, field) => {
                format!("{} does not have field {}", ty, field)
            }
            SemanticError::RecordFieldMismatch(ty, field, actual) => {
                format!("{}.{} has a different type than {}", ty, field, actual)
            }
            SemanticError::DuplicateField(field) => format!("Field {} is given more than once", field),
            SemanticError::ProcessInRecord(field) => {
                format!("Field {} holds a process but records cannot hold processes", field)
            }
            SemanticError::MergeIntoNonLiteral(name) => format!(
                "Fields can only be added to {} if it is declared with a record literal or instance",
                name
            ),
            SemanticError::InvalidAssignmentTarget => {
                "Only the input of a sink can be assigned to".into()
            }
            SemanticError::ConnectionToNonSink(target) => {
                format!("{} is not the input of a sink", target)
            }
            SemanticError::ConnectionExpectsFloat(actual) => {
                format!("A sink input expects float but got {}", actual)
            }
            SemanticError::InvalidSourceRate(actual) => format!(
                "source expects a positive integer sample rate but got {}",
                actual
            ),
            SemanticError::SinkArguments(n) => {
                format!("sink expects no arguments but got {}", n)
            }
            SemanticError::ModuleNotImported => {
                "Values of type module can only be declared by import".into()
            }
            SemanticError::ExternalValue(name) => {
                format!("{} is a member of an imported module and has no known type", name)
            }
            SemanticError::InconsistentListElements(first, other) => format!(
                "Inconsistent types in list: expected {} but found {}",
                first, other
            ),
            SemanticError::ListElementNotConstant(actual) => {
                format!("List elements must be constants but found {}", actual)
            }
            SemanticError::InvalidStructure(msg) => format!("Invalid parse tree: {}", msg),
        };
        Ok(msg)
    }
}
