//! Variant type codes.

use std::fmt;

use serde::{Serialize, Serializer};

/// Automation variant type code (`VARTYPE`)
///
/// The low twelve bits name the base type; `ARRAY` and `BYREF` are modifier
/// bits that may be or'ed onto a base type in variants, but never appear in
/// type descriptors (those use `PTR`, `SAFEARRAY` and `CARRAY` instead).
///
/// ## Example
///
/// ```rust
/// use tlbgen_core::types::VarType;
///
/// let vt = VarType::from_name("i4").unwrap();
/// assert_eq!(vt, VarType::I4);
/// assert!(vt.is_primitive());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct VarType(pub u16);

impl VarType
{
    pub const EMPTY: Self = Self(0);
    pub const NULL: Self = Self(1);
    pub const I2: Self = Self(2);
    pub const I4: Self = Self(3);
    pub const R4: Self = Self(4);
    pub const R8: Self = Self(5);
    pub const CY: Self = Self(6);
    pub const DATE: Self = Self(7);
    pub const BSTR: Self = Self(8);
    pub const DISPATCH: Self = Self(9);
    pub const ERROR: Self = Self(10);
    pub const BOOL: Self = Self(11);
    pub const VARIANT: Self = Self(12);
    pub const UNKNOWN: Self = Self(13);
    pub const DECIMAL: Self = Self(14);
    pub const I1: Self = Self(16);
    pub const UI1: Self = Self(17);
    pub const UI2: Self = Self(18);
    pub const UI4: Self = Self(19);
    pub const I8: Self = Self(20);
    pub const UI8: Self = Self(21);
    pub const INT: Self = Self(22);
    pub const UINT: Self = Self(23);
    pub const VOID: Self = Self(24);
    pub const HRESULT: Self = Self(25);
    pub const PTR: Self = Self(26);
    pub const SAFEARRAY: Self = Self(27);
    pub const CARRAY: Self = Self(28);
    pub const USERDEFINED: Self = Self(29);
    pub const LPSTR: Self = Self(30);
    pub const LPWSTR: Self = Self(31);

    /// Array modifier bit
    pub const ARRAY: Self = Self(0x2000);
    /// By-reference modifier bit
    pub const BYREF: Self = Self(0x4000);
    /// Mask selecting the base type
    pub const TYPEMASK: u16 = 0x0fff;

    /// Primitive names accepted in manifests, paired with their codes.
    const NAMES: &'static [(&'static str, VarType)] = &[
        ("empty", Self::EMPTY),
        ("null", Self::NULL),
        ("i2", Self::I2),
        ("i4", Self::I4),
        ("r4", Self::R4),
        ("r8", Self::R8),
        ("cy", Self::CY),
        ("date", Self::DATE),
        ("bstr", Self::BSTR),
        ("dispatch", Self::DISPATCH),
        ("error", Self::ERROR),
        ("bool", Self::BOOL),
        ("variant", Self::VARIANT),
        ("unknown", Self::UNKNOWN),
        ("decimal", Self::DECIMAL),
        ("i1", Self::I1),
        ("ui1", Self::UI1),
        ("ui2", Self::UI2),
        ("ui4", Self::UI4),
        ("i8", Self::I8),
        ("ui8", Self::UI8),
        ("int", Self::INT),
        ("uint", Self::UINT),
        ("void", Self::VOID),
        ("hresult", Self::HRESULT),
        ("lpstr", Self::LPSTR),
        ("lpwstr", Self::LPWSTR),
    ];

    /// Look up a primitive by its manifest name (case-insensitive).
    ///
    /// Structural codes (`ptr`, `safearray`, `carray`, `userdefined`) are not
    /// primitives and return `None`.
    pub fn from_name(name: &str) -> Option<Self>
    {
        let lower = name.to_ascii_lowercase();
        Self::NAMES.iter().find(|(n, _)| *n == lower).map(|(_, vt)| *vt)
    }

    /// Manifest name of a primitive, if it has one.
    pub fn name(self) -> Option<&'static str>
    {
        Self::NAMES.iter().find(|(_, vt)| *vt == self).map(|(n, _)| *n)
    }

    /// Base type with the modifier bits stripped.
    #[must_use]
    pub const fn base(self) -> Self
    {
        Self(self.0 & Self::TYPEMASK)
    }

    /// Whether the by-reference bit is set.
    pub const fn is_byref(self) -> bool
    {
        self.0 & Self::BYREF.0 != 0
    }

    /// Whether this code is a terminal type with no nested descriptor.
    pub fn is_primitive(self) -> bool
    {
        !matches!(
            self.base(),
            Self::PTR | Self::SAFEARRAY | Self::CARRAY | Self::USERDEFINED
        )
    }

    /// Whether the integer value of a constant of this type is signed.
    pub fn is_signed_integer(self) -> bool
    {
        matches!(self.base(), Self::I1 | Self::I2 | Self::I4 | Self::I8 | Self::INT | Self::ERROR)
    }

    /// Whether this is an unsigned integer type.
    pub fn is_unsigned_integer(self) -> bool
    {
        matches!(self.base(), Self::UI1 | Self::UI2 | Self::UI4 | Self::UI8 | Self::UINT)
    }
}

impl fmt::Display for VarType
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let structural = match self.base() {
            Self::PTR => Some("ptr"),
            Self::SAFEARRAY => Some("safearray"),
            Self::CARRAY => Some("carray"),
            Self::USERDEFINED => Some("userdefined"),
            _ => None,
        };
        match structural.or_else(|| self.base().name()) {
            Some(name) => write!(f, "VT_{}", name.to_ascii_uppercase())?,
            None => write!(f, "VT_0x{:04x}", self.base().0)?,
        }
        if self.is_byref() {
            write!(f, "|VT_BYREF")?;
        }
        if self.0 & Self::ARRAY.0 != 0 {
            write!(f, "|VT_ARRAY")?;
        }
        Ok(())
    }
}

/// Serialized as its display name (`"VT_I4"`)
impl Serialize for VarType
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error>
    {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_name_lookup_is_case_insensitive()
    {
        assert_eq!(VarType::from_name("BSTR"), Some(VarType::BSTR));
        assert_eq!(VarType::from_name("Hresult"), Some(VarType::HRESULT));
        assert_eq!(VarType::from_name("ptr"), None);
        assert_eq!(VarType::from_name("nonsense"), None);
    }

    #[test]
    fn test_structural_codes_are_not_primitive()
    {
        assert!(VarType::I4.is_primitive());
        assert!(VarType::VOID.is_primitive());
        assert!(!VarType::PTR.is_primitive());
        assert!(!VarType::SAFEARRAY.is_primitive());
        assert!(!VarType::CARRAY.is_primitive());
        assert!(!VarType::USERDEFINED.is_primitive());
    }

    #[test]
    fn test_display()
    {
        assert_eq!(VarType::I4.to_string(), "VT_I4");
        assert_eq!(VarType::USERDEFINED.to_string(), "VT_USERDEFINED");
        assert_eq!(VarType(VarType::BSTR.0 | VarType::BYREF.0).to_string(), "VT_BSTR|VT_BYREF");
        assert_eq!(VarType(0x0fff).to_string(), "VT_0x0fff");
    }
}
