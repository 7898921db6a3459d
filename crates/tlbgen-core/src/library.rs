//! # Library and Member Enumeration
//!
//! [`TypeLib`] and [`TypeInfo`] are the safe handles over the provider
//! traits. Both are cheap to clone (they share one `Rc`) and compare by
//! identity: two handles are equal iff they wrap the same provider object,
//! whatever the objects contain.
//!
//! ```rust
//! use tlbgen_core::library::TypeLib;
//! use tlbgen_core::provider::memory::MemoryTypeLib;
//!
//! let manifest = r#"{
//!     "name": "Shapes",
//!     "guid": "5a0e1f2c-3b4d-4e6f-8a9b-0c1d2e3f4a5b",
//!     "types": [
//!         { "name": "Color", "kind": "enum",
//!           "variables": [ { "name": "Red", "value": 0 }, { "name": "Blue", "value": 1 } ] }
//!     ]
//! }"#;
//! let lib = TypeLib::from_provider(MemoryTypeLib::from_json_str(manifest).unwrap());
//! assert_eq!(lib.count(), 1);
//!
//! let color = lib.info(0).unwrap();
//! assert_eq!(color, lib.info(0).unwrap());
//! assert_eq!(color.attr().unwrap().variables(), 2);
//! assert_eq!(color.var(1).unwrap().value().as_i64(), Some(1));
//! ```

use std::fmt;
use std::path::Path;
use std::rc::Rc;

use tracing::debug;

use crate::descriptor::{FuncDesc, TypeAttr, TypeLibAttr, VarDesc};
use crate::provider::memory::ManifestLoader;
use crate::provider::{CallContext, LibraryLoader, ProviderCallError, TypeInfoProvider, TypeLibProvider};
use crate::types::{DllEntry, Documentation, HRefType, ImplTypeFlags, InvokeKind, MemberId, MEMBERID_NIL};

/// Index passed to [`TypeLib::documentation`] for the library's own documentation
pub const LIBRARY_DOCUMENTATION: i32 = -1;

fn same_object<T: ?Sized>(left: &Rc<T>, right: &Rc<T>) -> bool
{
    std::ptr::eq(Rc::as_ptr(left).cast::<()>(), Rc::as_ptr(right).cast::<()>())
}

/// Handle to a type library (`ITypeLib`)
#[derive(Clone)]
pub struct TypeLib
{
    provider: Rc<dyn TypeLibProvider>,
}

impl TypeLib
{
    /// Open a library manifest with the built-in [`ManifestLoader`].
    ///
    /// ## Errors
    ///
    /// Returns a `ProviderCallError` for `LoadTypeLib` if the library cannot
    /// be found or parsed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ProviderCallError>
    {
        Self::open_with(&ManifestLoader, path)
    }

    /// Open a library through `loader`.
    ///
    /// ## Errors
    ///
    /// Whatever the loader reports; no handle is returned on failure.
    pub fn open_with(loader: &dyn LibraryLoader, path: impl AsRef<Path>) -> Result<Self, ProviderCallError>
    {
        let path = path.as_ref();
        debug!(path = %path.display(), "opening type library");
        loader.load(path).map(Self::from_rc)
    }

    /// Wrap a provider object.
    pub fn from_provider<P>(provider: Rc<P>) -> Self
    where
        P: TypeLibProvider + 'static,
    {
        Self { provider }
    }

    /// Wrap an already type-erased provider object.
    pub fn from_rc(provider: Rc<dyn TypeLibProvider>) -> Self
    {
        Self { provider }
    }

    /// The underlying provider object.
    pub fn provider(&self) -> &Rc<dyn TypeLibProvider>
    {
        &self.provider
    }

    /// Number of members.
    pub fn count(&self) -> u32
    {
        self.provider.type_info_count()
    }

    /// Member at `index`.
    ///
    /// ## Errors
    ///
    /// Returns a `ProviderCallError` for `GetTypeInfo` on an out-of-range index
    /// or provider failure.
    pub fn info(&self, index: u32) -> Result<TypeInfo, ProviderCallError>
    {
        self.provider
            .type_info(index)
            .call("GetTypeInfo", || format!("index {index}"))
            .map(TypeInfo::from_rc)
    }

    /// All members in index order.
    pub fn infos(&self) -> impl Iterator<Item = Result<TypeInfo, ProviderCallError>> + '_
    {
        (0..self.count()).map(move |index| self.info(index))
    }

    /// Documentation of the member at `index`, or of the library for
    /// [`LIBRARY_DOCUMENTATION`].
    ///
    /// ## Errors
    ///
    /// Returns a `ProviderCallError` for `GetDocumentation`.
    pub fn documentation(&self, index: i32) -> Result<Documentation, ProviderCallError>
    {
        self.provider
            .documentation(index)
            .call("GetDocumentation", || format!("index {index}"))
    }

    /// Library attributes.
    ///
    /// ## Errors
    ///
    /// Returns a `ProviderCallError` for `GetLibAttr`.
    pub fn attr(&self) -> Result<TypeLibAttr, ProviderCallError>
    {
        TypeLibAttr::acquire(&self.provider)
    }

    /// First member whose documented name equals `name`.
    ///
    /// ## Errors
    ///
    /// Returns the first provider failure met while scanning.
    pub fn find(&self, name: &str) -> Result<Option<TypeInfo>, ProviderCallError>
    {
        for index in 0..self.count() {
            let index_doc = i32::try_from(index).unwrap_or(i32::MAX);
            if self.documentation(index_doc)?.name == name {
                return self.info(index).map(Some);
            }
        }
        Ok(None)
    }
}

impl PartialEq for TypeLib
{
    fn eq(&self, other: &Self) -> bool
    {
        same_object(&self.provider, &other.provider)
    }
}

impl Eq for TypeLib {}

impl fmt::Debug for TypeLib
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("TypeLib")
            .field("provider", &Rc::as_ptr(&self.provider).cast::<()>())
            .field("count", &self.count())
            .finish()
    }
}

/// Handle to a library member (`ITypeInfo`)
#[derive(Clone)]
pub struct TypeInfo
{
    provider: Rc<dyn TypeInfoProvider>,
}

impl TypeInfo
{
    /// Wrap a provider object.
    pub fn from_rc(provider: Rc<dyn TypeInfoProvider>) -> Self
    {
        Self { provider }
    }

    /// The underlying provider object.
    pub fn provider(&self) -> &Rc<dyn TypeInfoProvider>
    {
        &self.provider
    }

    /// Type attributes.
    ///
    /// ## Errors
    ///
    /// Returns a `ProviderCallError` for `GetTypeAttr`.
    pub fn attr(&self) -> Result<TypeAttr, ProviderCallError>
    {
        TypeAttr::acquire(&self.provider)
    }

    /// Documentation of member `id`, or of the type itself for [`MEMBERID_NIL`].
    ///
    /// ## Errors
    ///
    /// Returns a `ProviderCallError` for `GetDocumentation`.
    pub fn documentation(&self, id: MemberId) -> Result<Documentation, ProviderCallError>
    {
        self.provider
            .documentation(id)
            .call("GetDocumentation", || format!("member {id:#x}"))
    }

    /// Name of the type.
    ///
    /// ## Errors
    ///
    /// Returns a `ProviderCallError` for `GetDocumentation`.
    pub fn name(&self) -> Result<String, ProviderCallError>
    {
        self.documentation(MEMBERID_NIL).map(|doc| doc.name)
    }

    /// Variable at `index`, below [`TypeAttr::variables`].
    ///
    /// ## Errors
    ///
    /// Returns a `ProviderCallError` for `GetVarDesc`.
    pub fn var(&self, index: u32) -> Result<VarDesc, ProviderCallError>
    {
        VarDesc::acquire(&self.provider, index)
    }

    /// Function at `index`, below [`TypeAttr::functions`].
    ///
    /// ## Errors
    ///
    /// Returns a `ProviderCallError` for `GetFuncDesc`.
    pub fn func(&self, index: u32) -> Result<FuncDesc, ProviderCallError>
    {
        FuncDesc::acquire(&self.provider, index)
    }

    /// Library containing this member, and the member's index in it.
    ///
    /// ## Errors
    ///
    /// Returns a `ProviderCallError` for `GetContainingTypeLib` if the member
    /// is not backed by a library.
    pub fn typelib(&self) -> Result<(TypeLib, u32), ProviderCallError>
    {
        self.provider
            .containing_type_lib()
            .call("GetContainingTypeLib", String::new)
            .map(|(lib, index)| (TypeLib::from_rc(lib), index))
    }

    /// Resolve an opaque reference taken from a type descriptor of this
    /// member, or from [`TypeInfo::impl_type`].
    ///
    /// This is the only place user-defined types are followed.
    ///
    /// ## Errors
    ///
    /// Returns a `ProviderCallError` for `GetRefTypeInfo` if the reference
    /// is unknown or its library cannot be loaded.
    pub fn referenced_type(&self, href: HRefType) -> Result<TypeInfo, ProviderCallError>
    {
        self.provider
            .ref_type_info(href)
            .call("GetRefTypeInfo", || format!("reference {href:#x}"))
            .map(Self::from_rc)
    }

    /// Reference and flags of the implemented or inherited interface at
    /// `index`, below [`TypeAttr::interfaces`].
    ///
    /// ## Errors
    ///
    /// Returns a `ProviderCallError` for `GetRefTypeOfImplType` or `GetImplTypeFlags`.
    pub fn impl_type(&self, index: u32) -> Result<(HRefType, ImplTypeFlags), ProviderCallError>
    {
        let href = self
            .provider
            .ref_type_of_impl_type(index)
            .call("GetRefTypeOfImplType", || format!("index {index}"))?;
        let flags = self
            .provider
            .impl_type_flags(index)
            .call("GetImplTypeFlags", || format!("index {index}"))?;
        Ok((href, flags))
    }

    /// Name of member `id` followed by its parameter names.
    ///
    /// ## Errors
    ///
    /// Returns a `ProviderCallError` for `GetNames`.
    pub fn names(&self, id: MemberId) -> Result<Vec<String>, ProviderCallError>
    {
        self.provider
            .names(id)
            .call("GetNames", || format!("member {id:#x}"))
    }

    /// DLL entry point of a module function.
    ///
    /// ## Errors
    ///
    /// Returns a `ProviderCallError` for `GetDllEntry`, in particular
    /// `TYPE_E_BADMODULEKIND` when the member is not a module.
    pub fn dll_entry(&self, id: MemberId, invoke: InvokeKind) -> Result<DllEntry, ProviderCallError>
    {
        self.provider
            .dll_entry(id, invoke)
            .call("GetDllEntry", || format!("member {id:#x}"))
    }
}

impl PartialEq for TypeInfo
{
    fn eq(&self, other: &Self) -> bool
    {
        same_object(&self.provider, &other.provider)
    }
}

impl Eq for TypeInfo {}

impl fmt::Debug for TypeInfo
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("TypeInfo")
            .field("provider", &Rc::as_ptr(&self.provider).cast::<()>())
            .finish()
    }
}
