use crate::error::{LoopError, Span};
use std::fmt;

/// The twelve built-in scalar kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Bool,
    Str,
}

impl Kind {
    pub fn name(&self) -> &'static str {
        match self {
            Kind::I8 => "i8",
            Kind::I16 => "i16",
            Kind::I32 => "i32",
            Kind::I64 => "i64",
            Kind::U8 => "u8",
            Kind::U16 => "u16",
            Kind::U32 => "u32",
            Kind::U64 => "u64",
            Kind::F32 => "f32",
            Kind::F64 => "f64",
            Kind::Bool => "bool",
            Kind::Str => "string",
        }
    }

    pub fn is_signed_integer(&self) -> bool {
        matches!(self, Kind::I8 | Kind::I16 | Kind::I32 | Kind::I64)
    }

    pub fn is_integer(&self) -> bool {
        self.is_signed_integer() || matches!(self, Kind::U8 | Kind::U16 | Kind::U32 | Kind::U64)
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Kind::F32 | Kind::F64)
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_float()
    }

    /// Width in bits of the integer kinds.
    pub fn bits(&self) -> Option<u32> {
        match self {
            Kind::I8 | Kind::U8 => Some(8),
            Kind::I16 | Kind::U16 => Some(16),
            Kind::I32 | Kind::U32 => Some(32),
            Kind::I64 | Kind::U64 => Some(64),
            _ => None,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Native payload of a value, one case per kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Bool(bool),
    Str(String),
}

impl Scalar {
    pub fn kind(&self) -> Kind {
        match self {
            Scalar::I8(_) => Kind::I8,
            Scalar::I16(_) => Kind::I16,
            Scalar::I32(_) => Kind::I32,
            Scalar::I64(_) => Kind::I64,
            Scalar::U8(_) => Kind::U8,
            Scalar::U16(_) => Kind::U16,
            Scalar::U32(_) => Kind::U32,
            Scalar::U64(_) => Kind::U64,
            Scalar::F32(_) => Kind::F32,
            Scalar::F64(_) => Kind::F64,
            Scalar::Bool(_) => Kind::Bool,
            Scalar::Str(_) => Kind::Str,
        }
    }

    /// Integer payload widened for range checks.
    pub fn as_i128(&self) -> Option<i128> {
        match *self {
            Scalar::I8(n) => Some(n as i128),
            Scalar::I16(n) => Some(n as i128),
            Scalar::I32(n) => Some(n as i128),
            Scalar::I64(n) => Some(n as i128),
            Scalar::U8(n) => Some(n as i128),
            Scalar::U16(n) => Some(n as i128),
            Scalar::U32(n) => Some(n as i128),
            Scalar::U64(n) => Some(n as i128),
            _ => None,
        }
    }
}

/// An immutable runtime value together with the source it came from.
///
/// Equality compares payloads only; two values from different places in the
/// source are equal when their kinds and contents are.
#[derive(Debug, Clone)]
pub struct Value {
    scalar: Scalar,
    span: Span,
}

impl Value {
    pub fn new(scalar: Scalar, span: Span) -> Self {
        Self { scalar, span }
    }

    pub fn bool(b: bool, span: Span) -> Self {
        Self::new(Scalar::Bool(b), span)
    }

    pub fn string(s: impl Into<String>, span: Span) -> Self {
        Self::new(Scalar::Str(s.into()), span)
    }

    pub fn scalar(&self) -> &Scalar {
        &self.scalar
    }

    pub fn kind(&self) -> Kind {
        self.scalar.kind()
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Every value today is a base scalar; composite values are reserved.
    pub fn is_base(&self) -> bool {
        true
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.scalar {
            Scalar::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.kind().name()
    }

    /// Builds the value of a numeric literal. Without a suffix, integers are
    /// `i32` and anything with a fraction or exponent is `f32`.
    pub fn from_number_literal(text: &str, suffix: Option<Kind>, span: Span) -> Result<Value, LoopError> {
        let is_float = text.contains(|c: char| matches!(c, '.' | 'e' | 'E'));
        let kind = suffix.unwrap_or(if is_float { Kind::F32 } else { Kind::I32 });

        if is_float && kind.is_integer() {
            return Err(LoopError::parse_error_with_help(
                span,
                format!("float literal '{}' cannot have type {}", text, kind),
                "Use an f32 or f64 suffix for literals with a fraction or exponent.".to_string(),
            ));
        }

        let out_of_range =
            || LoopError::parse_error(span, format!("integer literal out of range for {}", kind));
        let invalid = || LoopError::parse_error(span, format!("invalid numeric literal '{}'", text));

        let scalar = match kind {
            Kind::I8 => Scalar::I8(text.parse().map_err(|_| out_of_range())?),
            Kind::I16 => Scalar::I16(text.parse().map_err(|_| out_of_range())?),
            Kind::I32 => Scalar::I32(text.parse().map_err(|_| out_of_range())?),
            Kind::I64 => Scalar::I64(text.parse().map_err(|_| out_of_range())?),
            Kind::U8 => Scalar::U8(text.parse().map_err(|_| out_of_range())?),
            Kind::U16 => Scalar::U16(text.parse().map_err(|_| out_of_range())?),
            Kind::U32 => Scalar::U32(text.parse().map_err(|_| out_of_range())?),
            Kind::U64 => Scalar::U64(text.parse().map_err(|_| out_of_range())?),
            Kind::F32 => Scalar::F32(text.parse().map_err(|_| invalid())?),
            Kind::F64 => Scalar::F64(text.parse().map_err(|_| invalid())?),
            Kind::Bool | Kind::Str => return Err(invalid()),
        };

        Ok(Value::new(scalar, span))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.scalar == other.scalar
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.scalar {
            Scalar::I8(n) => write!(f, "{}", n),
            Scalar::I16(n) => write!(f, "{}", n),
            Scalar::I32(n) => write!(f, "{}", n),
            Scalar::I64(n) => write!(f, "{}", n),
            Scalar::U8(n) => write!(f, "{}", n),
            Scalar::U16(n) => write!(f, "{}", n),
            Scalar::U32(n) => write!(f, "{}", n),
            Scalar::U64(n) => write!(f, "{}", n),
            // Floats always show a fractional part
            Scalar::F32(n) => {
                if n.is_finite() && n.fract() == 0.0 {
                    write!(f, "{:.1}", n)
                } else {
                    write!(f, "{}", n)
                }
            }
            Scalar::F64(n) => {
                if n.is_finite() && n.fract() == 0.0 {
                    write!(f, "{:.1}", n)
                } else {
                    write!(f, "{}", n)
                }
            }
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Str(s) => write!(f, "{}", s),
        }
    }
}
