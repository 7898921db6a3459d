//! Value views: type, array, element and parameter descriptors.

use std::fmt;

use tracing::debug;

use crate::provider::ffi::{RawArrayDesc, RawElemDesc, RawParamDesc, RawSafeArrayBound, RawStr, RawTypeDesc, RawVariant};
use crate::types::{Constant, HRefType, ParamFlags, VarType};

/// Which nested descriptor a [`TypeDesc`] carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeDescKind
{
    /// Terminal type, nothing nested
    Primitive,
    /// `VT_PTR`: [`TypeDesc::pointer`] is the pointee
    Pointer,
    /// `VT_SAFEARRAY`: [`TypeDesc::pointer`] is the element type
    SafeArray,
    /// `VT_CARRAY`: [`TypeDesc::array`] describes the array
    CArray,
    /// `VT_USERDEFINED`: [`TypeDesc::reference`] names the type
    UserDefined,
}

/// Type descriptor (`TYPEDESC`)
#[derive(Clone, Copy)]
pub struct TypeDesc<'a>
{
    raw: &'a RawTypeDesc,
}

impl<'a> TypeDesc<'a>
{
    /// View a raw descriptor.
    ///
    /// # Safety
    ///
    /// Every pointer nested in `raw` (pointee, array description, bounds)
    /// must be valid for `'a`.
    pub unsafe fn from_raw(raw: &'a RawTypeDesc) -> Self
    {
        Self { raw }
    }

    /// Variant type code.
    pub fn vt(self) -> VarType
    {
        self.raw.vt
    }

    /// Classify the descriptor by the nested payload it carries.
    pub fn kind(self) -> TypeDescKind
    {
        match self.raw.vt.base() {
            VarType::PTR => TypeDescKind::Pointer,
            VarType::SAFEARRAY => TypeDescKind::SafeArray,
            VarType::CARRAY => TypeDescKind::CArray,
            VarType::USERDEFINED => TypeDescKind::UserDefined,
            _ => TypeDescKind::Primitive,
        }
    }

    /// Pointee of a `VT_PTR`, or element type of a `VT_SAFEARRAY`.
    ///
    /// ## Panics
    ///
    /// Panics unless [`TypeDesc::kind`] is `Pointer` or `SafeArray`.
    pub fn pointer(self) -> TypeDesc<'a>
    {
        assert!(
            matches!(self.kind(), TypeDescKind::Pointer | TypeDescKind::SafeArray),
            "precondition violated: pointer() on a {} type descriptor",
            self.raw.vt
        );
        // SAFETY: the variant tag selects `lptdesc`, valid for 'a per `from_raw`.
        unsafe { TypeDesc::from_raw(&*self.raw.u.lptdesc) }
    }

    /// Array description of a `VT_CARRAY`.
    ///
    /// ## Panics
    ///
    /// Panics unless [`TypeDesc::kind`] is `CArray`.
    pub fn array(self) -> ArrayDesc<'a>
    {
        assert!(
            self.kind() == TypeDescKind::CArray,
            "precondition violated: array() on a {} type descriptor",
            self.raw.vt
        );
        // SAFETY: the variant tag selects `lpadesc`, valid for 'a per `from_raw`.
        ArrayDesc {
            raw: unsafe { &*self.raw.u.lpadesc },
        }
    }

    /// Opaque reference of a `VT_USERDEFINED`.
    ///
    /// ## Panics
    ///
    /// Panics unless [`TypeDesc::kind`] is `UserDefined`.
    pub fn reference(self) -> HRefType
    {
        assert!(
            self.kind() == TypeDescKind::UserDefined,
            "precondition violated: reference() on a {} type descriptor",
            self.raw.vt
        );
        // SAFETY: the variant tag selects `hreftype`.
        unsafe { self.raw.u.hreftype }
    }
}

impl fmt::Debug for TypeDesc<'_>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self.kind() {
            TypeDescKind::Primitive => write!(f, "{}", self.vt()),
            TypeDescKind::Pointer => write!(f, "Ptr({:?})", self.pointer()),
            TypeDescKind::SafeArray => write!(f, "SafeArray({:?})", self.pointer()),
            TypeDescKind::CArray => write!(f, "{:?}", self.array()),
            TypeDescKind::UserDefined => write!(f, "UserDefined({:#x})", self.reference()),
        }
    }
}

/// C-style array descriptor (`ARRAYDESC`)
#[derive(Clone, Copy)]
pub struct ArrayDesc<'a>
{
    raw: &'a RawArrayDesc,
}

impl<'a> ArrayDesc<'a>
{
    /// Element type.
    pub fn element_type(self) -> TypeDesc<'a>
    {
        // SAFETY: nested in a descriptor already valid for 'a.
        unsafe { TypeDesc::from_raw(&self.raw.tdesc_elem) }
    }

    /// Number of dimensions.
    pub fn count(self) -> usize
    {
        usize::from(self.raw.c_dims)
    }

    /// All dimension bounds, outermost first.
    pub fn bounds(self) -> &'a [RawSafeArrayBound]
    {
        if self.raw.c_dims == 0 || self.raw.rgbounds.is_null() {
            return &[];
        }
        // SAFETY: providers hand out `c_dims` bounds at `rgbounds`, valid for 'a.
        unsafe { std::slice::from_raw_parts(self.raw.rgbounds, self.count()) }
    }

    /// Bounds of dimension `index`.
    ///
    /// ## Panics
    ///
    /// Panics if `index` is not below [`ArrayDesc::count`].
    pub fn bound(self, index: usize) -> RawSafeArrayBound
    {
        assert!(
            index < self.count(),
            "precondition violated: bound({index}) of a {}-dimensional array",
            self.count()
        );
        self.bounds()[index]
    }
}

impl fmt::Debug for ArrayDesc<'_>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("ArrayDesc")
            .field("element", &self.element_type())
            .field("bounds", &self.bounds())
            .finish()
    }
}

/// Element description (`ELEMDESC`): a type plus parameter information
#[derive(Clone, Copy)]
pub struct ElemDesc<'a>
{
    raw: &'a RawElemDesc,
}

impl<'a> ElemDesc<'a>
{
    /// View a raw element description.
    ///
    /// # Safety
    ///
    /// Same contract as [`TypeDesc::from_raw`], extended to the default
    /// value pointer of the parameter description.
    pub unsafe fn from_raw(raw: &'a RawElemDesc) -> Self
    {
        Self { raw }
    }

    /// Element type.
    pub fn type_desc(self) -> TypeDesc<'a>
    {
        // SAFETY: nested in a descriptor already valid for 'a.
        unsafe { TypeDesc::from_raw(&self.raw.tdesc) }
    }

    /// Parameter information.
    pub fn param(self) -> ParamDesc<'a>
    {
        ParamDesc { raw: &self.raw.paramdesc }
    }
}

impl fmt::Debug for ElemDesc<'_>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("ElemDesc")
            .field("type", &self.type_desc())
            .field("flags", &self.param().flags())
            .finish()
    }
}

/// Parameter description (`PARAMDESC`)
#[derive(Clone, Copy)]
pub struct ParamDesc<'a>
{
    raw: &'a RawParamDesc,
}

impl ParamDesc<'_>
{
    /// Parameter flags.
    pub fn flags(self) -> ParamFlags
    {
        ParamFlags::from_bits(self.raw.w_param_flags)
    }

    /// Whether a default value is present.
    pub fn has_default(self) -> bool
    {
        self.flags().contains(ParamFlags::HASDEFAULT) && !self.raw.pparamdescex.is_null()
    }

    /// Default value.
    ///
    /// ## Panics
    ///
    /// Panics unless [`ParamDesc::has_default`] holds.
    pub fn default_value(self) -> Constant
    {
        assert!(self.has_default(), "precondition violated: default_value() on a parameter without a default");
        // SAFETY: checked non-null above; valid for the view's lifetime.
        let ex = unsafe { &*self.raw.pparamdescex };
        // SAFETY: string payloads are valid while the owning record is.
        unsafe { decode_variant(&ex.var_default_value) }
    }
}

/// Decode a raw constant.
///
/// Variant types with no [`Constant`] counterpart decode to `Constant::Empty`.
///
/// # Safety
///
/// A string payload must point at `len` valid bytes.
pub(crate) unsafe fn decode_variant(raw: &RawVariant) -> Constant
{
    let vt = raw.vt.base();
    // SAFETY: each arm reads the union member selected by `vt`.
    unsafe {
        match vt {
            VarType::EMPTY => Constant::Empty,
            VarType::NULL => Constant::Null,
            VarType::BOOL => Constant::Bool(raw.data.boolval != 0),
            VarType::R4 | VarType::R8 | VarType::DATE => Constant::Real(raw.data.dblval),
            #[allow(clippy::cast_precision_loss)]
            VarType::CY => Constant::Real(raw.data.llval as f64 / 10_000.0),
            VarType::BSTR | VarType::LPSTR | VarType::LPWSTR => Constant::Str(decode_str(raw.data.strval)),
            vt if vt.is_signed_integer() => Constant::Int(raw.data.llval),
            vt if vt.is_unsigned_integer() => {
                let value = raw.data.ullval;
                i64::try_from(value).map_or(Constant::UInt(value), Constant::Int)
            }
            other => {
                debug!(vt = %other, "constant of this variant type is not decoded");
                Constant::Empty
            }
        }
    }
}

unsafe fn decode_str(raw: RawStr) -> String
{
    if raw.ptr.is_null() || raw.len == 0 {
        return String::new();
    }
    // SAFETY: forwarded contract of `decode_variant`.
    let bytes = unsafe { std::slice::from_raw_parts(raw.ptr, raw.len) };
    String::from_utf8_lossy(bytes).into_owned()
}
