//! Common module for library exports

pub use crate::descriptor::{ArrayDesc, ElemDesc, FuncDesc, ParamDesc, TypeAttr, TypeDesc, TypeDescKind, TypeLibAttr, VarDesc};
pub use crate::emit::{write_library, EmitOptions, EmptySections, Files};
pub use crate::error::{TlbError, TlbResult};
pub use crate::generator::{GenerationReport, Generator, GeneratorOptions};
pub use crate::handle::ResourceHandle;
pub use crate::library::{TypeInfo, TypeLib, LIBRARY_DOCUMENTATION};
pub use crate::model::{FailurePolicy, ModelBuilder, ModelType, TypeLibDescription};
pub use crate::provider::memory::{ManifestLoader, MemoryTypeLib};
pub use crate::provider::{HResult, LibraryLoader, ProviderCallError, ProviderCode, TypeInfoProvider, TypeLibProvider};
pub use crate::types::{Constant, InvokeKind, TypeKind, VarType, MEMBERID_NIL};
