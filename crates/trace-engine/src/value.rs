//! The tagged-union `Value` type shared by variables, heap fields, and the
//! expression evaluator's results.
//!
//! A heap-independent, freely cloneable value type used both for live state
//! and for the JSON representation handed to callers. Unlike a reference-
//! counted object graph, this `Value` has no reference-counted variants at
//! all -- every variant here is `Copy` or cheaply `Clone`, so snapshot
//! deep-copying falls out of `#[derive(Clone)]` with no special handling.

use std::fmt;

use serde::Serialize;
use serde_json::json;

use crate::ids::Ref;

/// A runtime value.
///
/// Only `Null` compares equal to itself among "empty" values; there is no
/// general notion of equality beyond this (callers needing comparisons go
/// through the condition evaluator, which compares via [`Value::as_number`]
/// or [`Value::as_str_display`]).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Char(char),
    Str(String),
    /// An opaque address token, e.g. the result of `&x`.
    Addr(String),
    Null,
}

impl Value {
    /// Renders the value the way the UI's `Variable.value` / `HeapObject`
    /// field expects it: a JSON number, string, or (for arrays, handled by
    /// the caller) an array of these.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Int(i) => json!(*i),
            Self::Float(f) => json!(*f),
            Self::Bool(b) => json!(*b),
            Self::Char(c) => json!(c.to_string()),
            Self::Str(s) => json!(s),
            Self::Addr(s) => json!(s),
            Self::Null => json!("nullptr"),
        }
    }

    /// Converts this value into the numeric domain used by the expression
    /// evaluator's arithmetic. Non-numeric values evaluate to `0`: unknown
    /// forms never fail, they degrade to zero.
    #[must_use]
    pub fn as_number(&self) -> Num {
        match self {
            Self::Int(i) => Num::Int(*i),
            Self::Float(f) => Num::Float(*f),
            Self::Bool(b) => Num::Int(i64::from(*b)),
            Self::Char(c) => Num::Int(i64::from(*c as u32)),
            Self::Str(s) => s.trim().parse::<i64>().map(Num::Int).unwrap_or(Num::Int(0)),
            Self::Addr(_) | Self::Null => Num::Int(0),
        }
    }

    /// True if the value is "truthy" for condition-evaluator fallback: a
    /// non-zero number, a non-empty string, or the literal `true`.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Int(i) => *i != 0,
            Self::Float(f) => *f != 0.0,
            Self::Bool(b) => *b,
            Self::Char(c) => *c != '\0',
            Self::Str(s) => !s.is_empty(),
            Self::Addr(_) => true,
            Self::Null => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Char(c) => write!(f, "{c}"),
            Self::Str(s) => write!(f, "{s}"),
            Self::Addr(s) => write!(f, "{s}"),
            Self::Null => write!(f, "nullptr"),
        }
    }
}

/// Numeric domain used internally by the expression evaluator. Mixing an
/// `Int` with a `Float` promotes to `Float`, matching ordinary C++ usual
/// arithmetic conversions for the subset of types this engine models.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    #[must_use]
    pub fn to_f64(self) -> f64 {
        match self {
            Self::Int(i) => i as f64,
            Self::Float(f) => f,
        }
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            Self::Int(i) => Value::Int(i),
            Self::Float(f) => Value::Float(f),
        }
    }

    #[must_use]
    pub fn add(self, other: Self) -> Self {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Self::Int(a.wrapping_add(b)),
            _ => Self::Float(self.to_f64() + other.to_f64()),
        }
    }

    #[must_use]
    pub fn sub(self, other: Self) -> Self {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Self::Int(a.wrapping_sub(b)),
            _ => Self::Float(self.to_f64() - other.to_f64()),
        }
    }

    #[must_use]
    pub fn mul(self, other: Self) -> Self {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Self::Int(a.wrapping_mul(b)),
            _ => Self::Float(self.to_f64() * other.to_f64()),
        }
    }

    /// Division: integer division truncates toward zero; division by zero
    /// yields `0` rather than trapping.
    #[must_use]
    pub fn div(self, other: Self) -> Self {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => {
                if b == 0 {
                    Self::Int(0)
                } else {
                    Self::Int(a.wrapping_div(b))
                }
            }
            _ => {
                let divisor = other.to_f64();
                if divisor == 0.0 {
                    Self::Float(0.0)
                } else {
                    Self::Float(self.to_f64() / divisor)
                }
            }
        }
    }

    /// Modulo: integer-only in this subset; non-integer operands truncate to
    /// `i64` first. Modulo by zero yields `0`.
    #[must_use]
    pub fn rem(self, other: Self) -> Self {
        let a = self.to_i64_trunc();
        let b = other.to_i64_trunc();
        if b == 0 { Self::Int(0) } else { Self::Int(a.wrapping_rem(b)) }
    }

    #[must_use]
    pub fn neg(self) -> Self {
        match self {
            Self::Int(i) => Self::Int(-i),
            Self::Float(f) => Self::Float(-f),
        }
    }

    #[must_use]
    pub fn to_i64_trunc(self) -> i64 {
        match self {
            Self::Int(i) => i,
            Self::Float(f) => f.trunc() as i64,
        }
    }

    #[must_use]
    pub fn compare(self, other: Self) -> std::cmp::Ordering {
        self.to_f64().partial_cmp(&other.to_f64()).unwrap_or(std::cmp::Ordering::Equal)
    }
}

/// Marks how a value (variable or heap field) should be rendered by the
/// front end. Distinct from the C++ declared type string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VisualKind {
    Primitive,
    Array,
    Pointer,
}

impl VisualKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Primitive => "primitive",
            Self::Array => "array",
            Self::Pointer => "pointer",
        }
    }
}

/// What `points_to` currently resolves to, kept alongside the rendered
/// address string so the engine can validate invariant 1 cheaply.
pub type PointsTo = Option<Ref>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_division_truncates_toward_zero() {
        assert_eq!(Num::Int(7).div(Num::Int(2)), Num::Int(3));
        assert_eq!(Num::Int(-7).div(Num::Int(2)), Num::Int(-3));
    }

    #[test]
    fn division_by_zero_yields_zero() {
        assert_eq!(Num::Int(5).div(Num::Int(0)), Num::Int(0));
        assert_eq!(Num::Float(5.0).div(Num::Float(0.0)), Num::Float(0.0));
    }

    #[test]
    fn modulo_by_zero_yields_zero() {
        assert_eq!(Num::Int(10).rem(Num::Int(0)), Num::Int(0));
    }

    #[test]
    fn mixed_int_float_promotes_to_float() {
        assert_eq!(Num::Int(2).add(Num::Float(0.5)), Num::Float(2.5));
    }
}
