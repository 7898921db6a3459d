//! Type and library attributes.

use std::fmt;
use std::rc::Rc;

use uuid::Uuid;

use crate::handle::ResourceHandle;
use crate::provider::ffi::{RawTLibAttr, RawTypeAttr};
use crate::provider::{CallContext, ProviderCallError, TypeInfoProvider, TypeLibProvider};
use crate::types::{IdlFlags, Lcid, LibFlags, MemberId, SysKind, TypeFlags, TypeKind};

use super::TypeDesc;

/// Attributes of a library member (`TYPEATTR`), released through `ReleaseTypeAttr`
#[derive(Clone, Default)]
pub struct TypeAttr
{
    handle: ResourceHandle<RawTypeAttr, dyn TypeInfoProvider>,
}

impl TypeAttr
{
    /// ## Errors
    ///
    /// Returns a `ProviderCallError` for `GetTypeAttr` if the provider fails.
    pub(crate) fn acquire(info: &Rc<dyn TypeInfoProvider>) -> Result<Self, ProviderCallError>
    {
        // SAFETY: `TypeInfoProvider` guarantees the record stays valid until
        // `release_type_attr`, which only the handle calls.
        let handle = unsafe {
            ResourceHandle::acquire(Rc::clone(info), |provider| provider.type_attr().call("GetTypeAttr", String::new))
        }?;
        Ok(Self { handle })
    }

    pub fn is_valid(&self) -> bool
    {
        self.handle.is_valid()
    }

    fn raw(&self) -> &RawTypeAttr
    {
        self.handle.get()
    }

    pub fn guid(&self) -> Uuid
    {
        Uuid::from(self.raw().guid)
    }

    pub fn lcid(&self) -> Lcid
    {
        self.raw().lcid
    }

    /// Member id of the constructor, `MEMBERID_NIL` if none.
    pub fn constructor(&self) -> MemberId
    {
        self.raw().memid_constructor
    }

    /// Member id of the destructor, `MEMBERID_NIL` if none.
    pub fn destructor(&self) -> MemberId
    {
        self.raw().memid_destructor
    }

    /// Size of an instance in bytes.
    pub fn size(&self) -> u32
    {
        self.raw().cb_size_instance
    }

    pub fn kind(&self) -> TypeKind
    {
        TypeKind::from_raw(self.raw().typekind)
    }

    /// Number of functions.
    pub fn functions(&self) -> u16
    {
        self.raw().c_funcs
    }

    /// Number of variables.
    pub fn variables(&self) -> u16
    {
        self.raw().c_vars
    }

    /// Number of implemented or inherited interfaces.
    pub fn interfaces(&self) -> u16
    {
        self.raw().c_impl_types
    }

    /// Size of the virtual table in bytes.
    pub fn vtable_size(&self) -> u16
    {
        self.raw().cb_size_vft
    }

    pub fn alignment(&self) -> u16
    {
        self.raw().cb_alignment
    }

    pub fn flags(&self) -> TypeFlags
    {
        TypeFlags::from_bits(self.raw().w_type_flags)
    }

    /// `(major, minor)` version.
    pub fn version(&self) -> (u16, u16)
    {
        (self.raw().w_major_ver_num, self.raw().w_minor_ver_num)
    }

    /// Aliased type.
    ///
    /// ## Panics
    ///
    /// Panics unless [`TypeAttr::kind`] is `TypeKind::Alias`.
    pub fn alias(&self) -> TypeDesc<'_>
    {
        assert!(
            self.kind() == TypeKind::Alias,
            "precondition violated: alias() on a {} type",
            self.kind()
        );
        // SAFETY: the record and its nested pointers live as long as `self`.
        unsafe { TypeDesc::from_raw(&self.raw().tdesc_alias) }
    }

    pub fn idl_flags(&self) -> IdlFlags
    {
        IdlFlags::from_bits(self.raw().idldesc_type.w_idl_flags)
    }
}

impl fmt::Debug for TypeAttr
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        if !self.is_valid() {
            return f.write_str("TypeAttr(invalid)");
        }
        f.debug_struct("TypeAttr")
            .field("guid", &self.guid())
            .field("kind", &self.kind())
            .field("functions", &self.functions())
            .field("variables", &self.variables())
            .field("interfaces", &self.interfaces())
            .finish()
    }
}

/// Attributes of a library (`TLIBATTR`), released through `ReleaseTLibAttr`
#[derive(Clone, Default)]
pub struct TypeLibAttr
{
    handle: ResourceHandle<RawTLibAttr, dyn TypeLibProvider>,
}

impl TypeLibAttr
{
    /// ## Errors
    ///
    /// Returns a `ProviderCallError` for `GetLibAttr` if the provider fails.
    pub(crate) fn acquire(lib: &Rc<dyn TypeLibProvider>) -> Result<Self, ProviderCallError>
    {
        // SAFETY: `TypeLibProvider` guarantees the record stays valid until
        // `release_lib_attr`, which only the handle calls.
        let handle =
            unsafe { ResourceHandle::acquire(Rc::clone(lib), |provider| provider.lib_attr().call("GetLibAttr", String::new)) }?;
        Ok(Self { handle })
    }

    pub fn is_valid(&self) -> bool
    {
        self.handle.is_valid()
    }

    fn raw(&self) -> &RawTLibAttr
    {
        self.handle.get()
    }

    pub fn guid(&self) -> Uuid
    {
        Uuid::from(self.raw().guid)
    }

    pub fn lcid(&self) -> Lcid
    {
        self.raw().lcid
    }

    pub fn syskind(&self) -> SysKind
    {
        SysKind::from_raw(self.raw().syskind)
    }

    /// `(major, minor)` version.
    pub fn version(&self) -> (u16, u16)
    {
        (self.raw().w_major_ver_num, self.raw().w_minor_ver_num)
    }

    pub fn flags(&self) -> LibFlags
    {
        LibFlags::from_bits(self.raw().w_lib_flags)
    }
}

impl fmt::Debug for TypeLibAttr
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        if !self.is_valid() {
            return f.write_str("TypeLibAttr(invalid)");
        }
        f.debug_struct("TypeLibAttr")
            .field("guid", &self.guid())
            .field("syskind", &self.syskind())
            .field("version", &self.version())
            .finish()
    }
}
