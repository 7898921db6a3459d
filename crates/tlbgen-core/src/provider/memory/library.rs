use std::cell::RefCell;
use std::ptr::NonNull;
use std::rc::{Rc, Weak};

use tracing::{debug, trace};

use super::arena::{AllocationStats, LiveBlocks};
use super::info::MemoryTypeInfo;
use super::lower::{self, LibrarySpec, TypeSpec};
use super::manifest::{LibraryManifest, ManifestError};
use super::stdole;
use crate::provider::ffi::{RawGuid, RawTLibAttr};
use crate::provider::{HResult, ProviderResult, TypeInfoProvider, TypeLibProvider};
use crate::types::Documentation;

/// Library built from a manifest
pub struct MemoryTypeLib
{
    this: Weak<MemoryTypeLib>,
    spec: LibrarySpec,
    imports: Option<Rc<MemoryTypeLib>>,
    members: RefCell<Vec<Weak<MemoryTypeInfo>>>,
    lib_attrs: LiveBlocks<RawTLibAttr>,
    stats: Rc<AllocationStats>,
}

impl MemoryTypeLib
{
    /// Parse and build a library; its `stdole` import shares its counters.
    ///
    /// ## Errors
    ///
    /// Returns a `ManifestError` for malformed JSON or an invalid manifest.
    pub fn from_json_str(text: &str) -> Result<Rc<Self>, ManifestError>
    {
        Self::from_manifest(&LibraryManifest::from_json_str(text)?)
    }

    /// Build a library from a parsed manifest.
    ///
    /// ## Errors
    ///
    /// Returns a `ManifestError` if the manifest does not validate.
    pub fn from_manifest(manifest: &LibraryManifest) -> Result<Rc<Self>, ManifestError>
    {
        let stats = Rc::new(AllocationStats::default());
        let stdole = Self::build(&LibraryManifest::from_json_str(stdole::MANIFEST)?, None, Rc::clone(&stats))?;
        Self::build(manifest, Some(stdole), stats)
    }

    fn build(
        manifest: &LibraryManifest,
        imports: Option<Rc<MemoryTypeLib>>,
        stats: Rc<AllocationStats>,
    ) -> Result<Rc<Self>, ManifestError>
    {
        let spec = lower::lower_library(manifest, imports.as_deref())?;
        debug!(library = %spec.doc.name, types = spec.types.len(), "built in-memory type library");
        let members = RefCell::new(vec![Weak::new(); spec.types.len()]);
        Ok(Rc::new_cyclic(|this| Self {
            this: this.clone(),
            spec,
            imports,
            members,
            lib_attrs: LiveBlocks::new(Rc::clone(&stats)),
            stats,
        }))
    }

    /// Counters of every record this library, its members and its imports handed out.
    pub fn stats(&self) -> &Rc<AllocationStats>
    {
        &self.stats
    }

    /// The imported `stdole` library, if any.
    pub fn imports(&self) -> Option<&Rc<MemoryTypeLib>>
    {
        self.imports.as_ref()
    }

    pub(crate) fn type_spec(&self, index: u32) -> Option<&TypeSpec>
    {
        self.spec.types.get(index as usize)
    }

    pub(crate) fn index_of(&self, name: &str) -> Option<u32>
    {
        self.spec
            .types
            .iter()
            .position(|ty| ty.doc.name == name)
            .and_then(|index| u32::try_from(index).ok())
    }

    /// Member at `index`, reusing the live object if there is one.
    pub(crate) fn member(&self, index: u32) -> ProviderResult<Rc<MemoryTypeInfo>>
    {
        let slot = index as usize;
        let mut members = self.members.borrow_mut();
        let cached = members.get(slot).ok_or(HResult::TYPE_E_ELEMENTNOTFOUND)?;
        if let Some(live) = cached.upgrade() {
            return Ok(live);
        }
        let library = self.this.upgrade().ok_or(HResult::E_FAIL)?;
        let info = Rc::new(MemoryTypeInfo::new(library, index, Rc::clone(&self.stats)));
        trace!(index, "created type info");
        members[slot] = Rc::downgrade(&info);
        Ok(info)
    }
}

// SAFETY: library attribute blocks stay allocated in `lib_attrs` until
// `release_lib_attr` reclaims them.
unsafe impl TypeLibProvider for MemoryTypeLib
{
    fn type_info_count(&self) -> u32
    {
        u32::try_from(self.spec.types.len()).unwrap_or(u32::MAX)
    }

    fn type_info(&self, index: u32) -> ProviderResult<Rc<dyn TypeInfoProvider>>
    {
        let info: Rc<dyn TypeInfoProvider> = self.member(index)?;
        Ok(info)
    }

    fn documentation(&self, index: i32) -> ProviderResult<Documentation>
    {
        if index == -1 {
            return Ok(self.spec.doc.clone());
        }
        let index = u32::try_from(index).map_err(|_| HResult::TYPE_E_ELEMENTNOTFOUND)?;
        self.type_spec(index)
            .map(|ty| ty.doc.clone())
            .ok_or(HResult::TYPE_E_ELEMENTNOTFOUND)
    }

    fn lib_attr(&self) -> ProviderResult<NonNull<RawTLibAttr>>
    {
        let attr = RawTLibAttr {
            guid: RawGuid::from(self.spec.guid),
            lcid: self.spec.lcid,
            syskind: self.spec.syskind.raw(),
            w_major_ver_num: self.spec.version.0,
            w_minor_ver_num: self.spec.version.1,
            w_lib_flags: self.spec.flags.bits(),
        };
        Ok(self.lib_attrs.lend(Box::new(attr)))
    }

    unsafe fn release_lib_attr(&self, attr: NonNull<RawTLibAttr>)
    {
        self.lib_attrs.reclaim(attr);
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    const SHAPES: &str = r#"{
        "name": "Shapes",
        "doc": "Geometry",
        "guid": "5a0e1f2c-3b4d-4e6f-8a9b-0c1d2e3f4a5b",
        "version": { "major": 2, "minor": 3 },
        "types": [
            { "name": "Point", "kind": "record", "variables": [ { "name": "x", "type": { "primitive": "r8" } } ] },
            { "name": "IShape", "kind": "dispatch", "implements": ["IDispatch"] }
        ]
    }"#;

    #[test]
    fn test_member_identity_is_cached()
    {
        let lib = MemoryTypeLib::from_json_str(SHAPES).unwrap();
        let first = lib.member(1).unwrap();
        let second = lib.member(1).unwrap();
        assert!(Rc::ptr_eq(&first, &second));
        assert!(!Rc::ptr_eq(&first, &lib.member(0).unwrap()));
    }

    #[test]
    fn test_member_recreated_after_last_handle_drops()
    {
        let lib = MemoryTypeLib::from_json_str(SHAPES).unwrap();
        let weak = Rc::downgrade(&lib.member(0).unwrap());
        assert!(weak.upgrade().is_none());
        assert!(lib.member(0).is_ok());
    }

    #[test]
    fn test_documentation_and_range()
    {
        let lib = MemoryTypeLib::from_json_str(SHAPES).unwrap();
        assert_eq!(lib.documentation(-1).unwrap().doc, "Geometry");
        assert_eq!(lib.documentation(1).unwrap().name, "IShape");
        assert_eq!(lib.documentation(2).unwrap_err(), HResult::TYPE_E_ELEMENTNOTFOUND);
        assert_eq!(lib.documentation(-5).unwrap_err(), HResult::TYPE_E_ELEMENTNOTFOUND);
        assert_eq!(lib.type_info(9).err(), Some(HResult::TYPE_E_ELEMENTNOTFOUND));
    }

    #[test]
    fn test_stdole_is_imported()
    {
        let lib = MemoryTypeLib::from_json_str(SHAPES).unwrap();
        let stdole = lib.imports().unwrap();
        assert_eq!(stdole.index_of("IDispatch"), Some(1));
        assert!(Rc::ptr_eq(stdole.stats(), lib.stats()));
    }

    #[test]
    fn test_lib_attr_release_counts()
    {
        let lib = MemoryTypeLib::from_json_str(SHAPES).unwrap();
        let attr = lib.lib_attr().unwrap();
        // SAFETY: freshly lent, not released yet.
        let raw = unsafe { attr.as_ref() };
        assert_eq!((raw.w_major_ver_num, raw.w_minor_ver_num), (2, 3));
        assert_eq!(lib.stats().outstanding(), 1);
        // SAFETY: released exactly once.
        unsafe { lib.release_lib_attr(attr) };
        assert_eq!(lib.stats().outstanding(), 0);
        assert_eq!(lib.stats().invalid_releases(), 0);
    }
}
