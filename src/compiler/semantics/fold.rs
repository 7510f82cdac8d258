//! Simplification of operations.  Operations on immediates are computed
//! while compiling; all other operations become expressions named after their
//! operands.  Shared by the analyzer and by the passes which rewrite the
//! program after processes have been inlined.

use std::convert::TryFrom;

use crate::compiler::{
    ir::{Literal, Operation, OperatorClass, OperatorKind, Primitive, Symbol, Value, ValueKind},
    mangle, CompilerError, Span,
};
use crate::err;

use super::{SemanticError, SemanticResult};

/// Applies the binary operator `op` to `lhs` and `rhs`.
pub fn binary(op: OperatorKind, lhs: Symbol, rhs: Symbol, span: Span) -> SemanticResult<Symbol> {
    let lp = operand(op, &lhs, span)?;
    let rp = operand(op, &rhs, span)?;
    if lp != rp {
        return err!(span, SemanticError::CannotImplicitlyCast(op, lp, rp));
    }

    let result = match op.class() {
        OperatorClass::Comparison | OperatorClass::Equality => Primitive::Bool,
        _ => lp,
    };

    match (lhs.literal(), rhs.literal()) {
        (Some(l), Some(r)) => fold_binary(op, l, r)
            .map(|lit| Symbol::immediate(lit, span))
            .map_err(|e| CompilerError::new(span, e)),
        _ => {
            let name = mangle::mangle(&lhs.reference_name(), &rhs.reference_name(), op.code());
            Ok(Symbol::expression(
                result,
                name,
                Operation::binary(op, lhs, rhs),
                span,
            ))
        }
    }
}

/// Applies the prefix operator `op` to `operand`.
pub fn unary(op: OperatorKind, value: Symbol, span: Span) -> SemanticResult<Symbol> {
    let p = operand(op, &value, span)?;
    match value.literal() {
        Some(lit) => fold_unary(op, lit)
            .map(|lit| Symbol::immediate(lit, span))
            .map_err(|e| CompilerError::new(span, e)),
        None => {
            let name = mangle::mangle_unary(&value.reference_name(), op.code());
            Ok(Symbol::expression(
                p,
                name,
                Operation::unary(op, value),
                span,
            ))
        }
    }
}

/// Delays `value` by `depth` samples in scope `scope`.  Delaying a delayed
/// value adds the depths.  Delaying an immediate has no effect; the result has
/// depth zero.
pub fn delay(value: Symbol, depth: i64, scope: u32, span: Span) -> SemanticResult<Symbol> {
    if depth < 1 || depth > u32::MAX as i64 {
        return err!(span, SemanticError::InvalidDelay(depth));
    }

    let (inner, depth) = if value.kind == ValueKind::Delay {
        let total = value.delay_depth.saturating_add(depth as u32);
        match value.value {
            Value::Operation(op) => {
                let op = *op;
                let depth = if op.lhs.kind.is_immediate() { 0 } else { total };
                (op.lhs, depth)
            }
            _ => panic!("compiler panic: delayed value without an operand"),
        }
    } else {
        let depth = if value.kind.is_immediate() { 0 } else { depth as u32 };
        (value, depth)
    };

    let primitive = match inner.primitive() {
        Some(p @ Primitive::Int) | Some(p @ Primitive::Float) | Some(p @ Primitive::Bool) => p,
        Some(p) if inner.kind.is_immediate() => p,
        _ => return err!(span, SemanticError::NotDelayable(describe(&inner))),
    };

    let name = mangle::mangle(
        &mangle::base32(scope as i64),
        &inner.reference_name(),
        &format!("{}{}", OperatorKind::Delay.code(), mangle::base32(depth as i64)),
    );

    let mut sym = Symbol::new(
        ValueKind::Delay,
        Value::Operation(Box::new(Operation::unary(OperatorKind::Delay, inner))),
        span,
    );
    sym.generated_name = name;
    sym.is_delay = true;
    sym.delay_depth = depth;
    sym.scope_id = Some(scope);
    sym.evaluates_to = Some(primitive);
    Ok(sym)
}

/// Describes what kind of value a symbol is for use in error messages.
pub fn describe(sym: &Symbol) -> String {
    match (sym.primitive(), sym.kind) {
        (Some(p), ValueKind::Immediate(_)) => format!("{}", p),
        (Some(p), _) => format!("{} {}", p, sym.kind),
        (None, kind) => format!("{}", kind),
    }
}

/// Checks that `sym` is a valid operand of `op` and returns its kind.
fn operand(op: OperatorKind, sym: &Symbol, span: Span) -> SemanticResult<Primitive> {
    let (accepted, expected): (&[Primitive], &'static str) = match op.class() {
        OperatorClass::Arithmetic | OperatorClass::Comparison => {
            (&[Primitive::Int, Primitive::Float], "int or float")
        }
        OperatorClass::Bitwise => (&[Primitive::Int], "int"),
        OperatorClass::Boolean => (&[Primitive::Bool], "bool"),
        OperatorClass::Equality => (
            &[Primitive::Int, Primitive::Float, Primitive::Bool],
            "int, float or bool",
        ),
        OperatorClass::Delay => (
            &[Primitive::Int, Primitive::Float, Primitive::Bool],
            "int, float or bool",
        ),
    };

    match sym.primitive() {
        Some(p) if accepted.contains(&p) => Ok(p),
        _ => err!(span, SemanticError::OpExpected(op, expected, describe(sym))),
    }
}

fn fold_binary(op: OperatorKind, l: &Literal, r: &Literal) -> Result<Literal, SemanticError> {
    match (l, r) {
        (Literal::Int(a), Literal::Int(b)) => fold_int(op, *a, *b),
        (Literal::Float(a), Literal::Float(b)) => fold_float(op, *a, *b),
        (Literal::Bool(a), Literal::Bool(b)) => fold_bool(op, *a, *b),
        _ => Err(SemanticError::CannotImplicitlyCast(
            op,
            l.primitive(),
            r.primitive(),
        )),
    }
}

fn fold_int(op: OperatorKind, a: i64, b: i64) -> Result<Literal, SemanticError> {
    let overflow = SemanticError::Overflow(op);
    let value = match op {
        OperatorKind::Add => a.checked_add(b).ok_or(overflow)?,
        OperatorKind::Sub => a.checked_sub(b).ok_or(overflow)?,
        OperatorKind::Mul => a.checked_mul(b).ok_or(overflow)?,
        OperatorKind::Div | OperatorKind::Mod if b == 0 => {
            return Err(SemanticError::DivisionByZero)
        }
        OperatorKind::Div => a.checked_div(b).ok_or(overflow)?,
        OperatorKind::Mod => a.checked_rem(b).ok_or(overflow)?,
        OperatorKind::Pow if b < 0 => return Err(SemanticError::NegativeExponent(b)),
        OperatorKind::Pow => u32::try_from(b)
            .ok()
            .and_then(|b| a.checked_pow(b))
            .ok_or(overflow)?,
        OperatorKind::BitAnd => a & b,
        OperatorKind::BitOr => a | b,
        OperatorKind::BitXor => a ^ b,
        OperatorKind::Lsh | OperatorKind::Rsh if !(0..64).contains(&b) => {
            return Err(SemanticError::ShiftOutOfRange(b))
        }
        OperatorKind::Lsh => a << b,
        OperatorKind::Rsh => a >> b,
        OperatorKind::Greater => return Ok(Literal::Bool(a > b)),
        OperatorKind::GreaterEq => return Ok(Literal::Bool(a >= b)),
        OperatorKind::Equal => return Ok(Literal::Bool(a == b)),
        OperatorKind::Less => return Ok(Literal::Bool(a < b)),
        OperatorKind::LessEq => return Ok(Literal::Bool(a <= b)),
        OperatorKind::NotEqual => return Ok(Literal::Bool(a != b)),
        _ => panic!("compiler panic: {} is not a binary integer operator", op),
    };
    Ok(Literal::Int(value))
}

fn fold_float(op: OperatorKind, a: f64, b: f64) -> Result<Literal, SemanticError> {
    let value = match op {
        OperatorKind::Add => a + b,
        OperatorKind::Sub => a - b,
        OperatorKind::Mul => a * b,
        OperatorKind::Div | OperatorKind::Mod if b == 0.0 => {
            return Err(SemanticError::DivisionByZero)
        }
        OperatorKind::Div => a / b,
        OperatorKind::Mod => a % b,
        OperatorKind::Pow => a.powf(b),
        OperatorKind::Greater => return Ok(Literal::Bool(a > b)),
        OperatorKind::GreaterEq => return Ok(Literal::Bool(a >= b)),
        OperatorKind::Equal => return Ok(Literal::Bool(a == b)),
        OperatorKind::Less => return Ok(Literal::Bool(a < b)),
        OperatorKind::LessEq => return Ok(Literal::Bool(a <= b)),
        OperatorKind::NotEqual => return Ok(Literal::Bool(a != b)),
        _ => panic!("compiler panic: {} is not a binary float operator", op),
    };

    if value.is_finite() {
        Ok(Literal::Float(value))
    } else {
        Err(SemanticError::NonFiniteResult(op))
    }
}

fn fold_bool(op: OperatorKind, a: bool, b: bool) -> Result<Literal, SemanticError> {
    Ok(Literal::Bool(match op {
        OperatorKind::And => a && b,
        OperatorKind::Or => a || b,
        OperatorKind::Equal => a == b,
        OperatorKind::NotEqual => a != b,
        _ => panic!("compiler panic: {} is not a binary bool operator", op),
    }))
}

fn fold_unary(op: OperatorKind, lit: &Literal) -> Result<Literal, SemanticError> {
    match (op, lit) {
        (OperatorKind::Neg, Literal::Int(i)) => i
            .checked_neg()
            .map(Literal::Int)
            .ok_or(SemanticError::Overflow(op)),
        (OperatorKind::Neg, Literal::Float(f)) => Ok(Literal::Float(-f)),
        (OperatorKind::BitNot, Literal::Int(i)) => Ok(Literal::Int(!i)),
        (OperatorKind::Not, Literal::Bool(b)) => Ok(Literal::Bool(!b)),
        _ => panic!("compiler panic: {} cannot be applied to {}", op, lit),
    }
}
