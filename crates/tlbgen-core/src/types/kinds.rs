//! Enumerated codes found in type library records.
//!
//! Each enum decodes from the raw `u32` a provider stores and encodes back to
//! it. Codes this crate does not know decode to `Unknown` rather than failing,
//! so a newer provider never breaks enumeration.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! raw_code {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $value:literal, $text:literal; )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name
        {
            $( $(#[$vmeta])* $variant, )*
            /// Code not known to this crate
            Unknown(u32),
        }

        impl $name
        {
            /// Decode a raw provider code
            pub const fn from_raw(raw: u32) -> Self
            {
                match raw {
                    $( $value => Self::$variant, )*
                    other => Self::Unknown(other),
                }
            }

            /// Encode back to the raw provider code
            pub const fn raw(self) -> u32
            {
                match self {
                    $( Self::$variant => $value, )*
                    Self::Unknown(other) => other,
                }
            }
        }

        impl fmt::Display for $name
        {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
            {
                match self {
                    $( Self::$variant => f.write_str($text), )*
                    Self::Unknown(other) => write!(f, "unknown({other})"),
                }
            }
        }
    };
}

raw_code! {
    /// Kind of a library member (`TYPEKIND`)
    TypeKind {
        /// Set of enumerators
        Enum = 0, "enum";
        /// Structure with no methods
        Record = 1, "record";
        /// Module of static functions and data
        Module = 2, "module";
        /// Interface with virtual functions
        Interface = 3, "interface";
        /// Dispatch-only interface
        Dispatch = 4, "dispatch";
        /// Component object class
        Coclass = 5, "coclass";
        /// Alias of another type
        Alias = 6, "alias";
        /// Union of fields at offset zero
        Union = 7, "union";
    }
}

raw_code! {
    /// Kind of a variable (`VARKIND`)
    VarKind {
        /// Field of an instance
        PerInstance = 0, "per_instance";
        /// Static member
        Static = 1, "static";
        /// Named constant
        Const = 2, "const";
        /// Dispatch property
        Dispatch = 3, "dispatch";
    }
}

raw_code! {
    /// Kind of a function (`FUNCKIND`)
    FuncKind {
        /// Virtual with an implementation
        Virtual = 0, "virtual";
        /// Pure virtual
        PureVirtual = 1, "pure_virtual";
        /// Non-virtual
        NonVirtual = 2, "non_virtual";
        /// Static
        Static = 3, "static";
        /// Reachable only through `IDispatch::Invoke`
        Dispatch = 4, "dispatch";
    }
}

raw_code! {
    /// Calling convention (`CALLCONV`)
    CallConv {
        /// `__fastcall`
        FastCall = 0, "fastcall";
        /// `__cdecl`
        Cdecl = 1, "cdecl";
        /// Pascal
        Pascal = 2, "pascal";
        /// Macintosh Pascal
        MacPascal = 3, "macpascal";
        /// `__stdcall`
        StdCall = 4, "stdcall";
        /// Floating point fastcall
        FpFastCall = 5, "fpfastcall";
        /// `__syscall`
        SysCall = 6, "syscall";
    }
}

raw_code! {
    /// Target operating system of a library (`SYSKIND`)
    SysKind {
        /// 16-bit Windows
        Win16 = 0, "win16";
        /// 32-bit Windows
        Win32 = 1, "win32";
        /// Macintosh
        Mac = 2, "mac";
        /// 64-bit Windows
        Win64 = 3, "win64";
    }
}

impl TypeKind
{
    /// Whether members of this kind carry callable functions.
    pub const fn is_interface(self) -> bool
    {
        matches!(self, Self::Interface | Self::Dispatch)
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_raw_round_trip()
    {
        for raw in 0..8 {
            assert_eq!(TypeKind::from_raw(raw).raw(), raw);
        }
        assert_eq!(TypeKind::from_raw(4), TypeKind::Dispatch);
        assert_eq!(VarKind::from_raw(2), VarKind::Const);
        assert_eq!(FuncKind::from_raw(4), FuncKind::Dispatch);
        assert_eq!(CallConv::from_raw(4), CallConv::StdCall);
        assert_eq!(SysKind::from_raw(3), SysKind::Win64);
    }

    #[test]
    fn test_unknown_codes_survive()
    {
        let kind = TypeKind::from_raw(42);
        assert_eq!(kind, TypeKind::Unknown(42));
        assert_eq!(kind.raw(), 42);
        assert_eq!(kind.to_string(), "unknown(42)");
    }

    #[test]
    fn test_serde_names()
    {
        let kind: TypeKind = serde_json::from_str("\"dispatch\"").unwrap();
        assert_eq!(kind, TypeKind::Dispatch);
        let kind: VarKind = serde_json::from_str("\"per_instance\"").unwrap();
        assert_eq!(kind, VarKind::PerInstance);
        assert!(serde_json::from_str::<SysKind>("\"amiga\"").is_err());
    }
}
