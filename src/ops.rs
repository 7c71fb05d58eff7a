//! Operator dispatch over base values.
//!
//! Every binary operator requires both operands to be base values of the same
//! kind; nothing is ever widened or coerced. Results of arithmetic and bitwise
//! operators keep the operand kind, comparisons and logical operators yield
//! `bool`. Results carry the span of the expression that produced them.

use crate::ast::{BinaryOp, UnaryOp};
use crate::error::{LoopError, Span};
use crate::value::{Scalar, Value};

/// Applies `$body` to matching integer payloads, rewrapping in the same kind.
macro_rules! integer_op {
    ($l:expr, $r:expr, |$a:ident, $b:ident| $body:expr) => {
        match ($l, $r) {
            (&Scalar::I8($a), &Scalar::I8($b)) => Some(Scalar::I8($body)),
            (&Scalar::I16($a), &Scalar::I16($b)) => Some(Scalar::I16($body)),
            (&Scalar::I32($a), &Scalar::I32($b)) => Some(Scalar::I32($body)),
            (&Scalar::I64($a), &Scalar::I64($b)) => Some(Scalar::I64($body)),
            (&Scalar::U8($a), &Scalar::U8($b)) => Some(Scalar::U8($body)),
            (&Scalar::U16($a), &Scalar::U16($b)) => Some(Scalar::U16($body)),
            (&Scalar::U32($a), &Scalar::U32($b)) => Some(Scalar::U32($body)),
            (&Scalar::U64($a), &Scalar::U64($b)) => Some(Scalar::U64($body)),
            _ => None,
        }
    };
}

macro_rules! float_op {
    ($l:expr, $r:expr, |$a:ident, $b:ident| $body:expr) => {
        match ($l, $r) {
            (&Scalar::F32($a), &Scalar::F32($b)) => Some(Scalar::F32($body)),
            (&Scalar::F64($a), &Scalar::F64($b)) => Some(Scalar::F64($body)),
            _ => None,
        }
    };
}

/// Ordering comparison over numeric kinds and strings.
macro_rules! ordering_op {
    ($l:expr, $r:expr, |$a:ident, $b:ident| $body:expr) => {
        match ($l, $r) {
            (&Scalar::I8($a), &Scalar::I8($b)) => Some($body),
            (&Scalar::I16($a), &Scalar::I16($b)) => Some($body),
            (&Scalar::I32($a), &Scalar::I32($b)) => Some($body),
            (&Scalar::I64($a), &Scalar::I64($b)) => Some($body),
            (&Scalar::U8($a), &Scalar::U8($b)) => Some($body),
            (&Scalar::U16($a), &Scalar::U16($b)) => Some($body),
            (&Scalar::U32($a), &Scalar::U32($b)) => Some($body),
            (&Scalar::U64($a), &Scalar::U64($b)) => Some($body),
            (&Scalar::F32($a), &Scalar::F32($b)) => Some($body),
            (&Scalar::F64($a), &Scalar::F64($b)) => Some($body),
            (Scalar::Str($a), Scalar::Str($b)) => Some($body),
            _ => None,
        }
    };
}

pub fn binary(operator: BinaryOp, left: &Value, right: &Value, span: Span) -> Result<Value, LoopError> {
    match operator {
        BinaryOp::Add => add(left, right, span),
        BinaryOp::Subtract => subtract(left, right, span),
        BinaryOp::Multiply => multiply(left, right, span),
        BinaryOp::Divide => divide(left, right, span),
        BinaryOp::Modulo => modulo(left, right, span),
        BinaryOp::BitAnd => bit_and(left, right, span),
        BinaryOp::BitOr => bit_or(left, right, span),
        BinaryOp::BitXor => bit_xor(left, right, span),
        BinaryOp::ShiftLeft => shift_left(left, right, span),
        BinaryOp::ShiftRight => shift_right(left, right, span),
        BinaryOp::Equal => equal(left, right, span),
        BinaryOp::NotEqual => not_equal(left, right, span),
        BinaryOp::Greater => greater(left, right, span),
        BinaryOp::GreaterEqual => greater_equal(left, right, span),
        BinaryOp::Less => less(left, right, span),
        BinaryOp::LessEqual => less_equal(left, right, span),
        BinaryOp::And => and(left, right, span),
        BinaryOp::Or => or(left, right, span),
    }
}

pub fn unary(operator: UnaryOp, operand: &Value, span: Span) -> Result<Value, LoopError> {
    match operator {
        UnaryOp::Negate => negate(operand, span),
        UnaryOp::Not => not(operand, span),
        UnaryOp::BitNot => bit_not(operand, span),
        UnaryOp::AddressOf => address_of(operand, span),
    }
}

fn check_operands(left: &Value, right: &Value, op: BinaryOp, span: Span) -> Result<(), LoopError> {
    if !left.is_base() || !right.is_base() || left.kind() != right.kind() {
        return Err(LoopError::runtime_error_with_help(
            span,
            format!(
                "type mismatch: cannot apply '{}' to {} and {}",
                op.symbol(),
                left.type_name(),
                right.type_name()
            ),
            "Operands must have the same type; values are never converted implicitly.".to_string(),
        ));
    }
    Ok(())
}

fn unsupported(op: &str, value: &Value, span: Span) -> LoopError {
    LoopError::runtime_error(
        span,
        format!("unsupported types for '{}': {}", op, value.type_name()),
    )
}

fn finish(result: Option<Scalar>, op: BinaryOp, left: &Value, span: Span) -> Result<Value, LoopError> {
    result
        .map(|scalar| Value::new(scalar, span))
        .ok_or_else(|| unsupported(op.symbol(), left, span))
}

fn finish_bool(result: Option<bool>, op: BinaryOp, left: &Value, span: Span) -> Result<Value, LoopError> {
    finish(result.map(Scalar::Bool), op, left, span)
}

pub fn add(left: &Value, right: &Value, span: Span) -> Result<Value, LoopError> {
    check_operands(left, right, BinaryOp::Add, span)?;
    let (l, r) = (left.scalar(), right.scalar());
    let result = integer_op!(l, r, |a, b| a.wrapping_add(b))
        .or_else(|| float_op!(l, r, |a, b| a + b))
        .or_else(|| match (l, r) {
            (Scalar::Str(a), Scalar::Str(b)) => Some(Scalar::Str(format!("{}{}", a, b))),
            _ => None,
        });
    finish(result, BinaryOp::Add, left, span)
}

pub fn subtract(left: &Value, right: &Value, span: Span) -> Result<Value, LoopError> {
    check_operands(left, right, BinaryOp::Subtract, span)?;
    let (l, r) = (left.scalar(), right.scalar());
    let result = integer_op!(l, r, |a, b| a.wrapping_sub(b)).or_else(|| float_op!(l, r, |a, b| a - b));
    finish(result, BinaryOp::Subtract, left, span)
}

pub fn multiply(left: &Value, right: &Value, span: Span) -> Result<Value, LoopError> {
    check_operands(left, right, BinaryOp::Multiply, span)?;
    let (l, r) = (left.scalar(), right.scalar());
    let result = integer_op!(l, r, |a, b| a.wrapping_mul(b)).or_else(|| float_op!(l, r, |a, b| a * b));
    finish(result, BinaryOp::Multiply, left, span)
}

fn check_divisor(right: &Value, span: Span) -> Result<(), LoopError> {
    if right.scalar().as_i128() == Some(0) {
        return Err(LoopError::runtime_error(span, "division by zero".to_string()));
    }
    Ok(())
}

/// Integer division truncates toward zero; float division follows IEEE.
pub fn divide(left: &Value, right: &Value, span: Span) -> Result<Value, LoopError> {
    check_operands(left, right, BinaryOp::Divide, span)?;
    check_divisor(right, span)?;
    let (l, r) = (left.scalar(), right.scalar());
    let result = integer_op!(l, r, |a, b| a.wrapping_div(b)).or_else(|| float_op!(l, r, |a, b| a / b));
    finish(result, BinaryOp::Divide, left, span)
}

pub fn modulo(left: &Value, right: &Value, span: Span) -> Result<Value, LoopError> {
    check_operands(left, right, BinaryOp::Modulo, span)?;
    check_divisor(right, span)?;
    let result = integer_op!(left.scalar(), right.scalar(), |a, b| a.wrapping_rem(b));
    finish(result, BinaryOp::Modulo, left, span)
}

pub fn bit_and(left: &Value, right: &Value, span: Span) -> Result<Value, LoopError> {
    check_operands(left, right, BinaryOp::BitAnd, span)?;
    let result = integer_op!(left.scalar(), right.scalar(), |a, b| a & b);
    finish(result, BinaryOp::BitAnd, left, span)
}

pub fn bit_or(left: &Value, right: &Value, span: Span) -> Result<Value, LoopError> {
    check_operands(left, right, BinaryOp::BitOr, span)?;
    let result = integer_op!(left.scalar(), right.scalar(), |a, b| a | b);
    finish(result, BinaryOp::BitOr, left, span)
}

pub fn bit_xor(left: &Value, right: &Value, span: Span) -> Result<Value, LoopError> {
    check_operands(left, right, BinaryOp::BitXor, span)?;
    let result = integer_op!(left.scalar(), right.scalar(), |a, b| a ^ b);
    finish(result, BinaryOp::BitXor, left, span)
}

/// Shift amounts must lie in `0..bits` of the operand kind.
fn check_shift(left: &Value, right: &Value, span: Span) -> Result<(), LoopError> {
    if let (Some(bits), Some(amount)) = (left.kind().bits(), right.scalar().as_i128()) {
        if amount < 0 || amount >= bits as i128 {
            return Err(LoopError::runtime_error(
                span,
                format!("shift amount out of range: {} for {}", amount, left.type_name()),
            ));
        }
    }
    Ok(())
}

pub fn shift_left(left: &Value, right: &Value, span: Span) -> Result<Value, LoopError> {
    check_operands(left, right, BinaryOp::ShiftLeft, span)?;
    check_shift(left, right, span)?;
    let result = integer_op!(left.scalar(), right.scalar(), |a, b| a.wrapping_shl(b as u32));
    finish(result, BinaryOp::ShiftLeft, left, span)
}

/// Arithmetic shift for signed kinds, logical for unsigned.
pub fn shift_right(left: &Value, right: &Value, span: Span) -> Result<Value, LoopError> {
    check_operands(left, right, BinaryOp::ShiftRight, span)?;
    check_shift(left, right, span)?;
    let result = integer_op!(left.scalar(), right.scalar(), |a, b| a.wrapping_shr(b as u32));
    finish(result, BinaryOp::ShiftRight, left, span)
}

pub fn equal(left: &Value, right: &Value, span: Span) -> Result<Value, LoopError> {
    check_operands(left, right, BinaryOp::Equal, span)?;
    Ok(Value::bool(left.scalar() == right.scalar(), span))
}

pub fn not_equal(left: &Value, right: &Value, span: Span) -> Result<Value, LoopError> {
    check_operands(left, right, BinaryOp::NotEqual, span)?;
    Ok(Value::bool(left.scalar() != right.scalar(), span))
}

pub fn greater(left: &Value, right: &Value, span: Span) -> Result<Value, LoopError> {
    check_operands(left, right, BinaryOp::Greater, span)?;
    let result = ordering_op!(left.scalar(), right.scalar(), |a, b| a > b);
    finish_bool(result, BinaryOp::Greater, left, span)
}

pub fn greater_equal(left: &Value, right: &Value, span: Span) -> Result<Value, LoopError> {
    check_operands(left, right, BinaryOp::GreaterEqual, span)?;
    let result = ordering_op!(left.scalar(), right.scalar(), |a, b| a >= b);
    finish_bool(result, BinaryOp::GreaterEqual, left, span)
}

pub fn less(left: &Value, right: &Value, span: Span) -> Result<Value, LoopError> {
    check_operands(left, right, BinaryOp::Less, span)?;
    let result = ordering_op!(left.scalar(), right.scalar(), |a, b| a < b);
    finish_bool(result, BinaryOp::Less, left, span)
}

pub fn less_equal(left: &Value, right: &Value, span: Span) -> Result<Value, LoopError> {
    check_operands(left, right, BinaryOp::LessEqual, span)?;
    let result = ordering_op!(left.scalar(), right.scalar(), |a, b| a <= b);
    finish_bool(result, BinaryOp::LessEqual, left, span)
}

pub fn and(left: &Value, right: &Value, span: Span) -> Result<Value, LoopError> {
    check_operands(left, right, BinaryOp::And, span)?;
    let result = match (left.as_bool(), right.as_bool()) {
        (Some(a), Some(b)) => Some(a && b),
        _ => None,
    };
    finish_bool(result, BinaryOp::And, left, span)
}

pub fn or(left: &Value, right: &Value, span: Span) -> Result<Value, LoopError> {
    check_operands(left, right, BinaryOp::Or, span)?;
    let result = match (left.as_bool(), right.as_bool()) {
        (Some(a), Some(b)) => Some(a || b),
        _ => None,
    };
    finish_bool(result, BinaryOp::Or, left, span)
}

fn check_operand(operand: &Value, op: UnaryOp, span: Span) -> Result<(), LoopError> {
    if !operand.is_base() {
        return Err(LoopError::runtime_error(
            span,
            format!("type mismatch: cannot apply '{}' to {}", op.symbol(), operand.type_name()),
        ));
    }
    Ok(())
}

/// Negation of signed integers (wrapping) and floats.
pub fn negate(operand: &Value, span: Span) -> Result<Value, LoopError> {
    check_operand(operand, UnaryOp::Negate, span)?;
    let result = match *operand.scalar() {
        Scalar::I8(n) => Scalar::I8(n.wrapping_neg()),
        Scalar::I16(n) => Scalar::I16(n.wrapping_neg()),
        Scalar::I32(n) => Scalar::I32(n.wrapping_neg()),
        Scalar::I64(n) => Scalar::I64(n.wrapping_neg()),
        Scalar::F32(n) => Scalar::F32(-n),
        Scalar::F64(n) => Scalar::F64(-n),
        _ => return Err(unsupported(UnaryOp::Negate.symbol(), operand, span)),
    };
    Ok(Value::new(result, span))
}

pub fn not(operand: &Value, span: Span) -> Result<Value, LoopError> {
    check_operand(operand, UnaryOp::Not, span)?;
    match operand.as_bool() {
        Some(b) => Ok(Value::bool(!b, span)),
        None => Err(unsupported(UnaryOp::Not.symbol(), operand, span)),
    }
}

pub fn bit_not(operand: &Value, span: Span) -> Result<Value, LoopError> {
    check_operand(operand, UnaryOp::BitNot, span)?;
    let result = match *operand.scalar() {
        Scalar::I8(n) => Scalar::I8(!n),
        Scalar::I16(n) => Scalar::I16(!n),
        Scalar::I32(n) => Scalar::I32(!n),
        Scalar::I64(n) => Scalar::I64(!n),
        Scalar::U8(n) => Scalar::U8(!n),
        Scalar::U16(n) => Scalar::U16(!n),
        Scalar::U32(n) => Scalar::U32(!n),
        Scalar::U64(n) => Scalar::U64(!n),
        _ => return Err(unsupported(UnaryOp::BitNot.symbol(), operand, span)),
    };
    Ok(Value::new(result, span))
}

/// `#` is recognised by the lexer and parser but has no runtime meaning yet.
pub fn address_of(_operand: &Value, span: Span) -> Result<Value, LoopError> {
    Err(LoopError::runtime_error_with_help(
        span,
        "address-of operator is not implemented".to_string(),
        "'#' is reserved for references and cannot be evaluated yet.".to_string(),
    ))
}
