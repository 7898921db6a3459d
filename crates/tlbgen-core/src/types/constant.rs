//! Decoded constant values.
//!
//! Constants come from two places: the value of a `VarKind::Const` variable
//! (enumerators and module constants) and the default value of a parameter
//! flagged `HASDEFAULT`. Full variant marshalling lives outside this crate;
//! `Constant` only covers what a declaration needs to print.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::VarType;

/// A constant value read from a type library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Constant
{
    /// `null`
    Null,
    /// Boolean
    Bool(bool),
    /// Signed integer
    Int(i64),
    /// Unsigned integer too large for `Int`
    UInt(u64),
    /// Floating point
    Real(f64),
    /// String
    Str(String),
    /// No value (`VT_EMPTY`)
    #[serde(skip)]
    Empty,
}

impl Constant
{
    /// Variant type a provider stores this constant as.
    pub fn var_type(&self) -> VarType
    {
        match self {
            Self::Empty => VarType::EMPTY,
            Self::Null => VarType::NULL,
            Self::Bool(_) => VarType::BOOL,
            Self::Int(v) if i32::try_from(*v).is_ok() => VarType::I4,
            Self::Int(_) => VarType::I8,
            Self::UInt(_) => VarType::UI8,
            Self::Real(_) => VarType::R8,
            Self::Str(_) => VarType::BSTR,
        }
    }

    /// Integer value, if this constant is integral and fits in `i64`.
    pub fn as_i64(&self) -> Option<i64>
    {
        match self {
            Self::Int(v) => Some(*v),
            Self::UInt(v) => i64::try_from(*v).ok(),
            Self::Bool(v) => Some(i64::from(*v)),
            _ => None,
        }
    }

    /// Render as a C++ literal.
    pub fn to_cpp_literal(&self) -> String
    {
        match self {
            Self::Empty | Self::Null => "nullptr".to_string(),
            Self::Bool(true) => "VARIANT_TRUE".to_string(),
            Self::Bool(false) => "VARIANT_FALSE".to_string(),
            Self::Int(v) if *v == i64::from(i32::MIN) => "(-2147483647 - 1)".to_string(),
            Self::Int(v) if i32::try_from(*v).is_ok() => v.to_string(),
            Self::Int(v) => format!("{v}LL"),
            Self::UInt(v) => format!("{v}ULL"),
            Self::Real(v) if v.fract() == 0.0 && v.is_finite() => format!("{v:.1}"),
            Self::Real(v) => v.to_string(),
            Self::Str(s) => format!("L\"{}\"", escape_cpp(s)),
        }
    }
}

impl fmt::Display for Constant
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            Self::Empty => f.write_str("<empty>"),
            Self::Null => f.write_str("null"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::UInt(v) => write!(f, "{v}"),
            Self::Real(v) => write!(f, "{v}"),
            Self::Str(s) => write!(f, "{s:?}"),
        }
    }
}

/// Escape a string for a C++ wide string literal.
fn escape_cpp(text: &str) -> String
{
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out
}
