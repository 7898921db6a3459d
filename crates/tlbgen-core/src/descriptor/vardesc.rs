//! Variable descriptors.

use std::fmt;
use std::rc::Rc;

use crate::handle::ResourceHandle;
use crate::provider::ffi::RawVarDesc;
use crate::provider::{CallContext, ProviderCallError, TypeInfoProvider};
use crate::types::{Constant, MemberId, VarFlags, VarKind};

use super::ElemDesc;
use super::typedesc::decode_variant;

/// Variable description (`VARDESC`), released through `ReleaseVarDesc`
///
/// Enumerators and module constants are `VarKind::Const` variables carrying
/// a [`VarDesc::value`]; record fields carry an [`VarDesc::offset`] instead.
#[derive(Clone, Default)]
pub struct VarDesc
{
    handle: ResourceHandle<RawVarDesc, dyn TypeInfoProvider>,
}

impl VarDesc
{
    /// Acquire the variable at `index` of `info`.
    ///
    /// ## Errors
    ///
    /// Returns a `ProviderCallError` for `GetVarDesc` if the provider fails.
    pub(crate) fn acquire(info: &Rc<dyn TypeInfoProvider>, index: u32) -> Result<Self, ProviderCallError>
    {
        // SAFETY: `TypeInfoProvider` guarantees the record stays valid until
        // `release_var_desc`, which only the handle calls.
        let handle = unsafe {
            ResourceHandle::acquire(Rc::clone(info), |provider| {
                provider
                    .var_desc(index)
                    .call("GetVarDesc", || format!("variable {index}"))
            })
        }?;
        Ok(Self { handle })
    }

    pub fn is_valid(&self) -> bool
    {
        self.handle.is_valid()
    }

    fn raw(&self) -> &RawVarDesc
    {
        self.handle.get()
    }

    pub fn member_id(&self) -> MemberId
    {
        self.raw().memid
    }

    pub fn kind(&self) -> VarKind
    {
        VarKind::from_raw(self.raw().varkind)
    }

    pub fn flags(&self) -> VarFlags
    {
        VarFlags::from_bits(self.raw().w_var_flags)
    }

    /// Type of the variable.
    pub fn elem(&self) -> ElemDesc<'_>
    {
        // SAFETY: the record and its nested pointers live as long as `self`.
        unsafe { ElemDesc::from_raw(&self.raw().elemdesc_var) }
    }

    /// Offset of a field within its instance.
    ///
    /// ## Panics
    ///
    /// Panics if the variable is a constant.
    pub fn offset(&self) -> u32
    {
        assert!(
            self.kind() != VarKind::Const,
            "precondition violated: offset() on a constant variable"
        );
        // SAFETY: non-constant variables store `oinst`.
        unsafe { self.raw().u.oinst }
    }

    /// Value of a constant.
    ///
    /// ## Panics
    ///
    /// Panics unless [`VarDesc::kind`] is `VarKind::Const`.
    pub fn value(&self) -> Constant
    {
        assert!(
            self.kind() == VarKind::Const,
            "precondition violated: value() on a {} variable",
            self.kind()
        );
        let raw = self.raw();
        // SAFETY: constants store `lpvar_value`, valid while the record is.
        let value = unsafe { raw.u.lpvar_value };
        if value.is_null() {
            return Constant::Empty;
        }
        // SAFETY: see above; string payloads share the record's lifetime.
        unsafe { decode_variant(&*value) }
    }
}

impl fmt::Debug for VarDesc
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        if !self.is_valid() {
            return f.write_str("VarDesc(invalid)");
        }
        f.debug_struct("VarDesc")
            .field("member_id", &format_args!("{:#x}", self.member_id()))
            .field("kind", &self.kind())
            .field("elem", &self.elem())
            .finish()
    }
}
