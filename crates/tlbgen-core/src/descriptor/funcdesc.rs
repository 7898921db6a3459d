//! Function descriptors.

use std::fmt;
use std::rc::Rc;

use crate::handle::ResourceHandle;
use crate::provider::ffi::RawFuncDesc;
use crate::provider::{CallContext, ProviderCallError, TypeInfoProvider};
use crate::types::{CallConv, FuncFlags, FuncKind, InvokeKind, MemberId};

use super::ElemDesc;

/// Function description (`FUNCDESC`), released through `ReleaseFuncDesc`
///
/// Cloning shares the record; it is released once, when the last clone
/// drops.
#[derive(Clone, Default)]
pub struct FuncDesc
{
    handle: ResourceHandle<RawFuncDesc, dyn TypeInfoProvider>,
}

impl FuncDesc
{
    /// Acquire the function at `index` of `info`.
    ///
    /// ## Errors
    ///
    /// Returns a `ProviderCallError` for `GetFuncDesc` if the provider fails,
    /// e.g. for an index past the function count.
    pub(crate) fn acquire(info: &Rc<dyn TypeInfoProvider>, index: u32) -> Result<Self, ProviderCallError>
    {
        // SAFETY: `TypeInfoProvider` guarantees the record stays valid until
        // `release_func_desc`, which only the handle calls.
        let handle = unsafe {
            ResourceHandle::acquire(Rc::clone(info), |provider| {
                provider
                    .func_desc(index)
                    .call("GetFuncDesc", || format!("function {index}"))
            })
        }?;
        Ok(Self { handle })
    }

    /// Whether this view holds a record.
    pub fn is_valid(&self) -> bool
    {
        self.handle.is_valid()
    }

    fn raw(&self) -> &RawFuncDesc
    {
        self.handle.get()
    }

    /// Member id (the dispatch id for dispatch members).
    pub fn member_id(&self) -> MemberId
    {
        self.raw().memid
    }

    pub fn func_kind(&self) -> FuncKind
    {
        FuncKind::from_raw(self.raw().funckind)
    }

    /// Method call or property accessor.
    pub fn invoke_kind(&self) -> InvokeKind
    {
        InvokeKind::from_bits(self.raw().invkind)
    }

    pub fn call_conv(&self) -> CallConv
    {
        CallConv::from_raw(self.raw().callconv)
    }

    /// Number of parameters.
    pub fn args(&self) -> usize
    {
        usize::try_from(self.raw().c_params).unwrap_or(0)
    }

    /// Number of optional parameters; `-1` marks a trailing variable argument list.
    pub fn optional_args(&self) -> i16
    {
        self.raw().c_params_opt
    }

    /// Offset in the virtual table.
    pub fn vtable_offset(&self) -> i16
    {
        self.raw().o_vft
    }

    pub fn flags(&self) -> FuncFlags
    {
        FuncFlags::from_bits(self.raw().w_func_flags)
    }

    /// Status codes the function may return.
    pub fn scodes(&self) -> &[i32]
    {
        let raw = self.raw();
        let count = usize::try_from(raw.c_scodes).unwrap_or(0);
        if count == 0 || raw.lprgscode.is_null() {
            return &[];
        }
        // SAFETY: `c_scodes` codes live at `lprgscode` while the record does.
        unsafe { std::slice::from_raw_parts(raw.lprgscode, count) }
    }

    /// Return type.
    pub fn returns(&self) -> ElemDesc<'_>
    {
        // SAFETY: the record and its nested pointers live as long as `self`.
        unsafe { ElemDesc::from_raw(&self.raw().elemdesc_func) }
    }

    /// Parameter at `index`.
    ///
    /// ## Panics
    ///
    /// Panics if `index` is not below [`FuncDesc::args`].
    pub fn arg(&self, index: usize) -> ElemDesc<'_>
    {
        let count = self.args();
        assert!(
            index < count,
            "precondition violated: arg({index}) of a function with {count} parameters"
        );
        // SAFETY: `c_params` descriptions live at `lprgelemdesc_param`
        // while the record does, and `index` is in range.
        unsafe { ElemDesc::from_raw(&*self.raw().lprgelemdesc_param.add(index)) }
    }

    /// All parameters in declaration order.
    pub fn params(&self) -> impl Iterator<Item = ElemDesc<'_>>
    {
        (0..self.args()).map(move |index| self.arg(index))
    }
}

impl fmt::Debug for FuncDesc
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        if !self.is_valid() {
            return f.write_str("FuncDesc(invalid)");
        }
        f.debug_struct("FuncDesc")
            .field("member_id", &format_args!("{:#x}", self.member_id()))
            .field("invoke_kind", &self.invoke_kind())
            .field("args", &self.args())
            .finish()
    }
}
