//! # Raw Provider Records
//!
//! Fixed-layout records exchanged with a reflection provider. They follow the
//! shape of the OLE Automation descriptors (`TYPEDESC`, `ARRAYDESC`,
//! `ELEMDESC`, `FUNCDESC`, `VARDESC`, `TYPEATTR`, `TLIBATTR`) so that a
//! native backend can hand its records over with a cast, while in-process
//! providers can build them directly.
//!
//! ## Safety Notes
//!
//! The records hold raw pointers into memory owned by the provider. A pointer
//! found inside a record is valid only while the record itself has not been
//! released. Nothing in this module dereferences them; the safe views in
//! [`crate::descriptor`] do, bounded by the lifetime of the owning resource.
//!
//! Differences from the native layout: `ARRAYDESC` bounds are a pointer
//! instead of a trailing array, `ELEMDESC` always carries a `PARAMDESC`,
//! and constant values use the normalised [`RawVariant`].

use std::ptr;

use uuid::Uuid;

use crate::types::{HRefType, Lcid, MemberId, VarType};

/// Nested payload of a type descriptor, selected by `vt`
#[repr(C)]
#[derive(Clone, Copy)]
pub union TypeDescUnion
{
    /// `VT_PTR` and `VT_SAFEARRAY`: the pointee or element type
    pub lptdesc: *const RawTypeDesc,
    /// `VT_CARRAY`: the array description
    pub lpadesc: *const RawArrayDesc,
    /// `VT_USERDEFINED`: reference to resolve through the owning type
    pub hreftype: HRefType,
}

/// Type descriptor (`TYPEDESC`)
#[repr(C)]
#[derive(Clone, Copy)]
pub struct RawTypeDesc
{
    /// Nested payload
    pub u: TypeDescUnion,
    /// Variant type selecting the payload
    pub vt: VarType,
}

impl RawTypeDesc
{
    /// Terminal descriptor with no payload.
    pub const fn primitive(vt: VarType) -> Self
    {
        Self {
            u: TypeDescUnion { lptdesc: ptr::null() },
            vt,
        }
    }

    /// `VT_USERDEFINED` descriptor referring to `href`.
    pub const fn user_defined(href: HRefType) -> Self
    {
        Self {
            u: TypeDescUnion { hreftype: href },
            vt: VarType::USERDEFINED,
        }
    }

    /// `VT_PTR` or `VT_SAFEARRAY` descriptor around `inner`.
    pub const fn indirect(vt: VarType, inner: *const RawTypeDesc) -> Self
    {
        Self {
            u: TypeDescUnion { lptdesc: inner },
            vt,
        }
    }

    /// `VT_CARRAY` descriptor around `array`.
    pub const fn c_array(array: *const RawArrayDesc) -> Self
    {
        Self {
            u: TypeDescUnion { lpadesc: array },
            vt: VarType::CARRAY,
        }
    }
}

/// Bounds of one array dimension (`SAFEARRAYBOUND`)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSafeArrayBound
{
    /// Number of elements
    pub c_elements: u32,
    /// Lower bound
    pub l_lbound: i32,
}

/// C-style array descriptor (`ARRAYDESC`)
#[repr(C)]
#[derive(Clone, Copy)]
pub struct RawArrayDesc
{
    /// Element type
    pub tdesc_elem: RawTypeDesc,
    /// Number of dimensions
    pub c_dims: u16,
    /// `c_dims` bounds
    pub rgbounds: *const RawSafeArrayBound,
}

/// Borrowed string inside a provider record
#[repr(C)]
#[derive(Clone, Copy)]
pub struct RawStr
{
    /// UTF-8 bytes
    pub ptr: *const u8,
    /// Byte length
    pub len: usize,
}

/// Constant payload, selected by the variant type
#[repr(C)]
#[derive(Clone, Copy)]
pub union VariantData
{
    /// Signed integers and `VT_ERROR`
    pub llval: i64,
    /// Unsigned integers
    pub ullval: u64,
    /// `VT_R4` and `VT_R8`
    pub dblval: f64,
    /// `VT_BOOL` (`VARIANT_TRUE` is -1)
    pub boolval: i16,
    /// `VT_BSTR`, `VT_LPSTR`, `VT_LPWSTR`
    pub strval: RawStr,
}

/// Constant value (`VARIANT`, normalised to 64-bit payloads)
#[repr(C)]
#[derive(Clone, Copy)]
pub struct RawVariant
{
    /// Variant type
    pub vt: VarType,
    /// Payload
    pub data: VariantData,
}

impl RawVariant
{
    /// Variant with no value.
    pub const fn empty() -> Self
    {
        Self {
            vt: VarType::EMPTY,
            data: VariantData { llval: 0 },
        }
    }
}

/// Extended parameter description holding a default value (`PARAMDESCEX`)
#[repr(C)]
#[derive(Clone, Copy)]
pub struct RawParamDescEx
{
    /// Size of this structure
    pub cbytes: u32,
    /// Default value
    pub var_default_value: RawVariant,
}

/// Parameter description (`PARAMDESC`)
#[repr(C)]
#[derive(Clone, Copy)]
pub struct RawParamDesc
{
    /// Default value, non-null iff `PARAMFLAG_FHASDEFAULT` is set
    pub pparamdescex: *const RawParamDescEx,
    /// `PARAMFLAG_*` bits
    pub w_param_flags: u16,
}

impl RawParamDesc
{
    /// Parameter description with no flags and no default.
    pub const fn none() -> Self
    {
        Self {
            pparamdescex: ptr::null(),
            w_param_flags: 0,
        }
    }
}

/// Element description: a type plus parameter information (`ELEMDESC`)
#[repr(C)]
#[derive(Clone, Copy)]
pub struct RawElemDesc
{
    /// Element type
    pub tdesc: RawTypeDesc,
    /// Parameter information
    pub paramdesc: RawParamDesc,
}

/// Function description (`FUNCDESC`)
#[repr(C)]
pub struct RawFuncDesc
{
    /// Member id
    pub memid: MemberId,
    /// `c_scodes` status codes the function may return
    pub lprgscode: *const i32,
    /// `c_params` parameter descriptions
    pub lprgelemdesc_param: *const RawElemDesc,
    /// `FUNCKIND` code
    pub funckind: u32,
    /// `INVOKEKIND` bits
    pub invkind: u32,
    /// `CALLCONV` code
    pub callconv: u32,
    /// Total parameter count
    pub c_params: i16,
    /// Optional parameter count
    pub c_params_opt: i16,
    /// Offset in the virtual table
    pub o_vft: i16,
    /// Number of status codes
    pub c_scodes: i16,
    /// Return type
    pub elemdesc_func: RawElemDesc,
    /// `FUNCFLAG_*` bits
    pub w_func_flags: u16,
}

/// Offset or constant value of a variable, selected by `varkind`
#[repr(C)]
#[derive(Clone, Copy)]
pub union VarDescUnion
{
    /// Instance offset (per-instance variables)
    pub oinst: u32,
    /// Constant value (`VAR_CONST`)
    pub lpvar_value: *const RawVariant,
}

/// Variable description (`VARDESC`)
#[repr(C)]
pub struct RawVarDesc
{
    /// Member id
    pub memid: MemberId,
    /// Offset or value
    pub u: VarDescUnion,
    /// Variable type
    pub elemdesc_var: RawElemDesc,
    /// `VARFLAG_*` bits
    pub w_var_flags: u16,
    /// `VARKIND` code
    pub varkind: u32,
}

/// Globally unique identifier as stored by providers (`GUID`)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RawGuid
{
    pub data1: u32,
    pub data2: u16,
    pub data3: u16,
    pub data4: [u8; 8],
}

impl From<RawGuid> for Uuid
{
    fn from(guid: RawGuid) -> Self
    {
        Uuid::from_fields(guid.data1, guid.data2, guid.data3, &guid.data4)
    }
}

impl From<Uuid> for RawGuid
{
    fn from(uuid: Uuid) -> Self
    {
        let (data1, data2, data3, data4) = uuid.as_fields();
        Self {
            data1,
            data2,
            data3,
            data4: *data4,
        }
    }
}

/// IDL attributes (`IDLDESC`)
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct RawIdlDesc
{
    /// Reserved
    pub dw_reserved: usize,
    /// `IDLFLAG_*` bits
    pub w_idl_flags: u16,
}

/// Attributes of a type (`TYPEATTR`)
#[repr(C)]
pub struct RawTypeAttr
{
    pub guid: RawGuid,
    pub lcid: Lcid,
    pub dw_reserved: u32,
    pub memid_constructor: MemberId,
    pub memid_destructor: MemberId,
    pub cb_size_instance: u32,
    /// `TYPEKIND` code
    pub typekind: u32,
    pub c_funcs: u16,
    pub c_vars: u16,
    pub c_impl_types: u16,
    pub cb_size_vft: u16,
    pub cb_alignment: u16,
    /// `TYPEFLAG_*` bits
    pub w_type_flags: u16,
    pub w_major_ver_num: u16,
    pub w_minor_ver_num: u16,
    /// Aliased type, meaningful only for `TKIND_ALIAS`
    pub tdesc_alias: RawTypeDesc,
    pub idldesc_type: RawIdlDesc,
}

/// Attributes of a library (`TLIBATTR`)
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawTLibAttr
{
    pub guid: RawGuid,
    pub lcid: Lcid,
    /// `SYSKIND` code
    pub syskind: u32,
    pub w_major_ver_num: u16,
    pub w_minor_ver_num: u16,
    /// `LIBFLAG_*` bits
    pub w_lib_flags: u16,
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_guid_conversion_round_trip()
    {
        let uuid = Uuid::parse_str("00020400-0000-0000-c000-000000000046").unwrap();
        let raw = RawGuid::from(uuid);
        assert_eq!(raw.data1, 0x0002_0400);
        assert_eq!(raw.data4, [0xc0, 0, 0, 0, 0, 0, 0, 0x46]);
        assert_eq!(Uuid::from(raw), uuid);
    }

    #[test]
    fn test_primitive_descriptor()
    {
        let desc = RawTypeDesc::primitive(VarType::I4);
        assert_eq!(desc.vt, VarType::I4);
        let reference = RawTypeDesc::user_defined(12);
        assert_eq!(reference.vt, VarType::USERDEFINED);
        // SAFETY: `user_defined` writes the hreftype member.
        assert_eq!(unsafe { reference.u.hreftype }, 12);
    }
}
