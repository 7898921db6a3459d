//! # In-Memory Provider
//!
//! A complete [`TypeLibProvider`](super::TypeLibProvider) /
//! [`TypeInfoProvider`](super::TypeInfoProvider) pair built from a JSON
//! library manifest (see [`manifest`]).
//!
//! It behaves like a registered type library as far as the rest of the crate
//! can tell:
//!
//! - `type_info(i)` returns the same object for as long as any handle to it
//!   is alive, so handles compare by identity;
//! - every record is built on request and must be released through the
//!   matching call; [`AllocationStats`] counts acquisitions, releases and
//!   invalid releases;
//! - interfaces may derive from the built-in `stdole` library
//!   (`IUnknown`, `IDispatch`), which is a separate library object;
//! - a `user` name that matches no type yields a reference whose resolution
//!   fails with `TYPE_E_CANTLOADLIBRARY`, like a reference into a library
//!   that is not installed.

mod arena;
mod info;
mod library;
mod lower;
pub mod manifest;
pub mod stdole;

use std::fs;
use std::path::Path;
use std::rc::Rc;

pub use arena::AllocationStats;
pub use info::MemoryTypeInfo;
pub use library::MemoryTypeLib;
pub use manifest::{LibraryManifest, ManifestError};

use super::{HResult, LibraryLoader, ProviderCallError, TypeLibProvider};
use crate::types::HRefType;

/// Bit marking a reference into the imported (`stdole`) library
pub const IMPORTED: HRefType = 0x8000_0000;

/// Reference produced for a type name that matched nothing
pub const UNRESOLVED: HRefType = 0xFFFF_FFFF;

/// Loads JSON manifests from disk (`LoadTypeLibEx` for the in-memory provider)
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestLoader;

impl LibraryLoader for ManifestLoader
{
    fn load(&self, path: &Path) -> Result<Rc<dyn TypeLibProvider>, ProviderCallError>
    {
        let text = fs::read_to_string(path).map_err(|e| {
            ProviderCallError::new("LoadTypeLib", HResult::TYPE_E_CANTLOADLIBRARY, format!("{}: {e}", path.display()))
        })?;
        let library = MemoryTypeLib::from_json_str(&text).map_err(|e| {
            ProviderCallError::new("LoadTypeLib", HResult::TYPE_E_INVDATAREAD, format!("{}: {e}", path.display()))
        })?;
        Ok(library)
    }
}
