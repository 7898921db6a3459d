//! # Typed Flag Sets
//!
//! One newtype per flag word found in type library records. Each flag set
//! carries its own constants, so a parameter flag can never be tested
//! against a function flag by accident.
//!
//! ```rust
//! use tlbgen_core::types::ParamFlags;
//!
//! let flags = ParamFlags::OUT | ParamFlags::RETVAL;
//! assert!(flags.contains(ParamFlags::RETVAL));
//! assert!(!flags.contains(ParamFlags::IN));
//! assert_eq!(ParamFlags::from_name("retval"), Some(ParamFlags::RETVAL));
//! ```

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

use serde::{Serialize, Serializer};

macro_rules! flag_set {
    (
        $(#[$meta:meta])*
        $name:ident: $repr:ty {
            $( $(#[$cmeta:meta])* $flag:ident = $value:expr, $text:literal; )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
        #[repr(transparent)]
        pub struct $name(pub $repr);

        impl $name
        {
            $( $(#[$cmeta])* pub const $flag: Self = Self($value); )*

            const NAMES: &'static [(&'static str, $name)] = &[$( ($text, Self::$flag), )*];

            /// No flags set
            pub const fn empty() -> Self
            {
                Self(0)
            }

            /// Create from raw bits
            pub const fn from_bits(bits: $repr) -> Self
            {
                Self(bits)
            }

            /// Get raw bits
            pub const fn bits(self) -> $repr
            {
                self.0
            }

            /// Check if every bit of `other` is set
            pub const fn contains(self, other: Self) -> bool
            {
                (self.0 & other.0) == other.0
            }

            /// Check if no bit is set
            pub const fn is_empty(self) -> bool
            {
                self.0 == 0
            }

            /// Look up a single flag by its manifest name
            pub fn from_name(name: &str) -> Option<Self>
            {
                let lower = name.to_ascii_lowercase();
                Self::NAMES.iter().find(|(n, _)| *n == lower).map(|(_, f)| *f)
            }

            /// Combine a list of manifest names into one flag set
            ///
            /// Returns the first unknown name as the error.
            pub fn from_names<'a, I>(names: I) -> Result<Self, &'a str>
            where
                I: IntoIterator<Item = &'a String>,
            {
                names.into_iter().try_fold(Self::empty(), |acc, name| {
                    Self::from_name(name).map(|f| acc | f).ok_or(name.as_str())
                })
            }

            /// Names of the set flags, in declaration order
            pub fn names(self) -> Vec<&'static str>
            {
                Self::NAMES
                    .iter()
                    .filter(|(_, f)| !f.is_empty() && self.contains(*f))
                    .map(|(n, _)| *n)
                    .collect()
            }
        }

        impl BitOr for $name
        {
            type Output = Self;

            fn bitor(self, rhs: Self) -> Self
            {
                Self(self.0 | rhs.0)
            }
        }

        impl BitOrAssign for $name
        {
            fn bitor_assign(&mut self, rhs: Self)
            {
                self.0 |= rhs.0;
            }
        }

        impl BitAnd for $name
        {
            type Output = Self;

            fn bitand(self, rhs: Self) -> Self
            {
                Self(self.0 & rhs.0)
            }
        }

        impl Serialize for $name
        {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error>
            {
                serializer.collect_seq(self.names())
            }
        }

        impl fmt::Debug for $name
        {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
            {
                write!(f, "{}({:#x}: {})", stringify!($name), self.0, self.names().join("|"))
            }
        }
    };
}

flag_set! {
    /// Parameter flags (`PARAMFLAG_*`)
    ParamFlags: u16 {
        /// Input parameter
        IN = 0x01, "in";
        /// Output parameter
        OUT = 0x02, "out";
        /// Locale identifier parameter
        LCID = 0x04, "lcid";
        /// Parameter holds the return value
        RETVAL = 0x08, "retval";
        /// Optional parameter
        OPT = 0x10, "opt";
        /// Parameter carries a default value
        HASDEFAULT = 0x20, "has_default";
        /// Parameter carries custom data
        HASCUSTDATA = 0x40, "has_cust_data";
    }
}

flag_set! {
    /// Function flags (`FUNCFLAG_*`)
    FuncFlags: u16 {
        /// Not accessible from macro languages
        RESTRICTED = 0x0001, "restricted";
        /// Function returns an event source
        SOURCE = 0x0002, "source";
        /// Supports data binding
        BINDABLE = 0x0004, "bindable";
        /// Calls `OnRequestEdit` before changing
        REQUESTEDIT = 0x0008, "request_edit";
        /// Displayed to the user as bindable
        DISPLAYBIND = 0x0010, "display_bind";
        /// Default bindable property
        DEFAULTBIND = 0x0020, "default_bind";
        /// Not displayed to the user
        HIDDEN = 0x0040, "hidden";
        /// Supports `GetLastError`
        USESGETLASTERROR = 0x0080, "uses_get_last_error";
        /// Default collection member
        DEFAULTCOLLELEM = 0x0100, "default_coll_elem";
        /// Default UI member
        UIDEFAULT = 0x0200, "ui_default";
        /// Not shown in property browsers
        NONBROWSABLE = 0x0400, "non_browsable";
        /// Replaceable member
        REPLACEABLE = 0x0800, "replaceable";
        /// Immediately bound
        IMMEDIATEBIND = 0x1000, "immediate_bind";
    }
}

flag_set! {
    /// Variable flags (`VARFLAG_*`)
    VarFlags: u16 {
        /// Assignment not allowed
        READONLY = 0x0001, "readonly";
        /// Event source
        SOURCE = 0x0002, "source";
        /// Supports data binding
        BINDABLE = 0x0004, "bindable";
        /// Calls `OnRequestEdit` before changing
        REQUESTEDIT = 0x0008, "request_edit";
        /// Displayed to the user as bindable
        DISPLAYBIND = 0x0010, "display_bind";
        /// Default bindable property
        DEFAULTBIND = 0x0020, "default_bind";
        /// Not displayed to the user
        HIDDEN = 0x0040, "hidden";
        /// Not accessible from macro languages
        RESTRICTED = 0x0080, "restricted";
        /// Default collection member
        DEFAULTCOLLELEM = 0x0100, "default_coll_elem";
        /// Default UI member
        UIDEFAULT = 0x0200, "ui_default";
        /// Not shown in property browsers
        NONBROWSABLE = 0x0400, "non_browsable";
        /// Replaceable member
        REPLACEABLE = 0x0800, "replaceable";
        /// Immediately bound
        IMMEDIATEBIND = 0x1000, "immediate_bind";
    }
}

flag_set! {
    /// Type flags (`TYPEFLAG_*`)
    TypeFlags: u16 {
        /// Application object
        APPOBJECT = 0x0001, "app_object";
        /// Instances can be created
        CANCREATE = 0x0002, "can_create";
        /// Requires a license
        LICENSED = 0x0004, "licensed";
        /// Predeclared identifier
        PREDECLID = 0x0008, "predecl_id";
        /// Not displayed to browsers
        HIDDEN = 0x0010, "hidden";
        /// Control
        CONTROL = 0x0020, "control";
        /// Dual interface (vtable and dispatch)
        DUAL = 0x0040, "dual";
        /// Members cannot be added at run time
        NONEXTENSIBLE = 0x0080, "non_extensible";
        /// Automation compatible
        OLEAUTOMATION = 0x0100, "ole_automation";
        /// Not accessible from macro languages
        RESTRICTED = 0x0200, "restricted";
        /// Supports aggregation
        AGGREGATABLE = 0x0400, "aggregatable";
        /// Replaceable
        REPLACEABLE = 0x0800, "replaceable";
        /// Derives from `IDispatch`
        DISPATCHABLE = 0x1000, "dispatchable";
        /// Reverse binding order
        REVERSEBIND = 0x2000, "reverse_bind";
        /// Proxy interface
        PROXY = 0x4000, "proxy";
    }
}

flag_set! {
    /// Library flags (`LIBFLAG_*`)
    LibFlags: u16 {
        /// Not accessible from macro languages
        RESTRICTED = 0x01, "restricted";
        /// Describes controls
        CONTROL = 0x02, "control";
        /// Not displayed to users
        HIDDEN = 0x04, "hidden";
        /// Persisted on disk
        HASDISKIMAGE = 0x08, "has_disk_image";
    }
}

flag_set! {
    /// Implemented-interface flags (`IMPLTYPEFLAG_*`)
    ImplTypeFlags: i32 {
        /// Default interface of a coclass
        DEFAULT = 0x1, "default";
        /// Event source
        SOURCE = 0x2, "source";
        /// Not accessible from macro languages
        RESTRICTED = 0x4, "restricted";
        /// Default vtable interface
        DEFAULTVTABLE = 0x8, "default_vtable";
    }
}

flag_set! {
    /// IDL attributes of a type (`IDLFLAG_*`)
    IdlFlags: u16 {
        /// Input
        IN = 0x1, "in";
        /// Output
        OUT = 0x2, "out";
        /// Locale identifier
        LCID = 0x4, "lcid";
        /// Return value
        RETVAL = 0x8, "retval";
    }
}

flag_set! {
    /// How a member is invoked (`INVOKEKIND`), also the dispatch flags of a call
    InvokeKind: u32 {
        /// Plain method call
        FUNC = 0x1, "func";
        /// Property read
        PROPERTYGET = 0x2, "get";
        /// Property write by value
        PROPERTYPUT = 0x4, "put";
        /// Property write by reference
        PROPERTYPUTREF = 0x8, "putref";
    }
}

impl InvokeKind
{
    /// Accessor prefix used for generated member names (`get_`, `put_`, `putref_`).
    pub fn accessor_prefix(self) -> &'static str
    {
        if self.contains(Self::PROPERTYPUTREF) {
            "putref_"
        } else if self.contains(Self::PROPERTYPUT) {
            "put_"
        } else if self.contains(Self::PROPERTYGET) {
            "get_"
        } else {
            ""
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_combine_and_contains()
    {
        let flags = ParamFlags::IN | ParamFlags::OPT;
        assert!(flags.contains(ParamFlags::IN));
        assert!(flags.contains(ParamFlags::OPT));
        assert!(!flags.contains(ParamFlags::OUT));
        assert!(!flags.contains(ParamFlags::IN | ParamFlags::OUT));
        assert_eq!((flags & ParamFlags::IN), ParamFlags::IN);
    }

    #[test]
    fn test_from_names()
    {
        let names = vec!["dual".to_string(), "ole_automation".to_string()];
        let flags = TypeFlags::from_names(&names).unwrap();
        assert_eq!(flags, TypeFlags::DUAL | TypeFlags::OLEAUTOMATION);
        assert_eq!(flags.names(), vec!["dual", "ole_automation"]);

        let bad = vec!["dual".to_string(), "shiny".to_string()];
        assert_eq!(TypeFlags::from_names(&bad), Err("shiny"));
    }

    #[test]
    fn test_empty()
    {
        assert!(FuncFlags::empty().is_empty());
        assert!(FuncFlags::default().is_empty());
        assert!(FuncFlags::empty().names().is_empty());
        assert!(FuncFlags::HIDDEN.contains(FuncFlags::empty()));
    }

    #[test]
    fn test_accessor_prefix()
    {
        assert_eq!(InvokeKind::FUNC.accessor_prefix(), "");
        assert_eq!(InvokeKind::PROPERTYGET.accessor_prefix(), "get_");
        assert_eq!(InvokeKind::PROPERTYPUT.accessor_prefix(), "put_");
        assert_eq!(InvokeKind::PROPERTYPUTREF.accessor_prefix(), "putref_");
    }

    #[test]
    fn test_debug_lists_names()
    {
        let text = format!("{:?}", LibFlags::HIDDEN | LibFlags::CONTROL);
        assert!(text.starts_with("LibFlags(0x6"));
        assert!(text.contains("control|hidden"));
    }
}
