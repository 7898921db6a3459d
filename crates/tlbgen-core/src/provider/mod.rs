//! # Reflection Providers
//!
//! The foreign surface this crate reads metadata from.
//!
//! A provider is modelled on the OLE Automation pair `ITypeLib` /
//! `ITypeInfo`: a library enumerates type-info objects, and each type-info
//! hands out raw descriptor records that must be given back to the same
//! object once the caller is done with them.
//!
//! - [`TypeLibProvider`]: one library
//! - [`TypeInfoProvider`]: one member of a library
//! - [`LibraryLoader`]: opens a library from a path
//!
//! Calls report failure with a bare [`HResult`]; the safe wrappers in
//! [`crate::library`] and [`crate::descriptor`] attach the operation name.
//!
//! ## Implementations
//!
//! - **memory**: in-process provider built from a JSON manifest, always
//!   available. See [`memory`].
//!
//! A native COM backend would implement the same two traits over the real
//! interfaces; nothing above this module depends on where records come from.
//!
//! ## Why trait objects?
//!
//! Handles and descriptors hold `Rc<dyn TypeInfoProvider>`, so a single
//! library walk can mix members from different providers (a user library
//! whose interfaces derive from `stdole`, for instance).

pub mod error;
pub mod ffi;
pub mod memory;

use std::path::Path;
use std::ptr::NonNull;
use std::rc::Rc;

pub use error::{CallContext, HResult, ProviderCallError, ProviderCode, ProviderResult};
use ffi::{RawFuncDesc, RawTLibAttr, RawTypeAttr, RawVarDesc};

use crate::types::{DllEntry, Documentation, HRefType, ImplTypeFlags, InvokeKind, MemberId};

/// A type library (`ITypeLib`)
///
/// # Safety
///
/// Records returned by [`TypeLibProvider::lib_attr`] must stay valid and
/// unchanged until they are handed back through
/// [`TypeLibProvider::release_lib_attr`].
pub unsafe trait TypeLibProvider
{
    /// Number of members (`GetTypeInfoCount`).
    fn type_info_count(&self) -> u32;

    /// Member at `index` (`GetTypeInfo`).
    ///
    /// Asking twice for the same index while the first handle is alive must
    /// return the same object, so that identity comparison works.
    fn type_info(&self, index: u32) -> ProviderResult<Rc<dyn TypeInfoProvider>>;

    /// Documentation of the member at `index`, or of the library itself for
    /// `-1` (`GetDocumentation`).
    fn documentation(&self, index: i32) -> ProviderResult<Documentation>;

    /// Library attributes (`GetLibAttr`). Must be handed back through
    /// [`TypeLibProvider::release_lib_attr`].
    fn lib_attr(&self) -> ProviderResult<NonNull<RawTLibAttr>>;

    /// Release attributes returned by [`TypeLibProvider::lib_attr`] (`ReleaseTLibAttr`).
    ///
    /// # Safety
    ///
    /// `attr` must have come from `lib_attr` on this object and must not
    /// have been released already.
    unsafe fn release_lib_attr(&self, attr: NonNull<RawTLibAttr>);
}

/// A library member (`ITypeInfo`)
///
/// # Safety
///
/// Every record returned by `type_attr`, `func_desc` and `var_desc`, and
/// every pointer reachable from it, must stay valid and unchanged until the
/// record is handed back through the matching release call. Strings inside
/// records must be valid UTF-8.
pub unsafe trait TypeInfoProvider
{
    /// Type attributes (`GetTypeAttr`).
    fn type_attr(&self) -> ProviderResult<NonNull<RawTypeAttr>>;

    /// Release attributes from [`TypeInfoProvider::type_attr`] (`ReleaseTypeAttr`).
    ///
    /// # Safety
    ///
    /// `attr` must have come from `type_attr` on this object and must not
    /// have been released already.
    unsafe fn release_type_attr(&self, attr: NonNull<RawTypeAttr>);

    /// Function description at `index` (`GetFuncDesc`).
    fn func_desc(&self, index: u32) -> ProviderResult<NonNull<RawFuncDesc>>;

    /// Release a function description (`ReleaseFuncDesc`).
    ///
    /// # Safety
    ///
    /// `desc` must have come from `func_desc` on this object and must not
    /// have been released already.
    unsafe fn release_func_desc(&self, desc: NonNull<RawFuncDesc>);

    /// Variable description at `index` (`GetVarDesc`).
    fn var_desc(&self, index: u32) -> ProviderResult<NonNull<RawVarDesc>>;

    /// Release a variable description (`ReleaseVarDesc`).
    ///
    /// # Safety
    ///
    /// `desc` must have come from `var_desc` on this object and must not
    /// have been released already.
    unsafe fn release_var_desc(&self, desc: NonNull<RawVarDesc>);

    /// Documentation of a member, or of the type for `MEMBERID_NIL` (`GetDocumentation`).
    fn documentation(&self, member: MemberId) -> ProviderResult<Documentation>;

    /// Name of a member followed by its parameter names (`GetNames`).
    fn names(&self, member: MemberId) -> ProviderResult<Vec<String>>;

    /// Library containing this member and the member's index in it (`GetContainingTypeLib`).
    fn containing_type_lib(&self) -> ProviderResult<(Rc<dyn TypeLibProvider>, u32)>;

    /// Reference to the implemented or inherited type at `index` (`GetRefTypeOfImplType`).
    fn ref_type_of_impl_type(&self, index: u32) -> ProviderResult<HRefType>;

    /// Flags of the implemented type at `index` (`GetImplTypeFlags`).
    fn impl_type_flags(&self, index: u32) -> ProviderResult<ImplTypeFlags>;

    /// Resolve a type reference (`GetRefTypeInfo`).
    fn ref_type_info(&self, href: HRefType) -> ProviderResult<Rc<dyn TypeInfoProvider>>;

    /// DLL entry point of a module function (`GetDllEntry`).
    fn dll_entry(&self, member: MemberId, invoke: InvokeKind) -> ProviderResult<DllEntry>;
}

/// Opens libraries by path (`LoadTypeLibEx`)
pub trait LibraryLoader
{
    /// Load the library at `path`.
    ///
    /// ## Errors
    ///
    /// Returns a `ProviderCallError` for operation `LoadTypeLib` if the
    /// library cannot be located or read.
    fn load(&self, path: &Path) -> Result<Rc<dyn TypeLibProvider>, ProviderCallError>;
}

/// Hand a raw record back to the object that allocated it.
///
/// Implemented for the provider trait objects, once per record type they
/// allocate, so a [`crate::handle::ResourceHandle`] knows which release call
/// belongs to its pointer.
pub trait Release<T>
{
    /// Release `ptr`.
    ///
    /// # Safety
    ///
    /// `ptr` must have been allocated by this object and not released yet.
    unsafe fn release(&self, ptr: NonNull<T>);
}

impl Release<RawTLibAttr> for dyn TypeLibProvider
{
    unsafe fn release(&self, ptr: NonNull<RawTLibAttr>)
    {
        // SAFETY: forwarded contract.
        unsafe { self.release_lib_attr(ptr) }
    }
}

impl Release<RawTypeAttr> for dyn TypeInfoProvider
{
    unsafe fn release(&self, ptr: NonNull<RawTypeAttr>)
    {
        // SAFETY: forwarded contract.
        unsafe { self.release_type_attr(ptr) }
    }
}

impl Release<RawFuncDesc> for dyn TypeInfoProvider
{
    unsafe fn release(&self, ptr: NonNull<RawFuncDesc>)
    {
        // SAFETY: forwarded contract.
        unsafe { self.release_func_desc(ptr) }
    }
}

impl Release<RawVarDesc> for dyn TypeInfoProvider
{
    unsafe fn release(&self, ptr: NonNull<RawVarDesc>)
    {
        // SAFETY: forwarded contract.
        unsafe { self.release_var_desc(ptr) }
    }
}
