//! # tlbgen-core
//!
//! Type library introspection and C++ binding emission for tlbgen.
//!
//! This crate reads the metadata an OLE Automation style reflection provider
//! publishes (libraries, interfaces, records, enums and their members) and
//! turns it into C++ headers and sources:
//!
//! - [`provider`]: the reflection surface (`TypeLibProvider`,
//!   `TypeInfoProvider`) and the in-memory manifest provider
//! - [`handle`]: release-once ownership of raw provider records
//! - [`descriptor`]: typed views over those records
//! - [`library`]: library and member enumeration
//! - [`model`]: owned snapshots of enums, records and interfaces
//! - [`emit`]: C++ rendering and file output
//! - [`generator`]: open → build → emit for whole libraries
//!
//! ## Example
//!
//! ```rust
//! use tlbgen_core::prelude::*;
//!
//! let manifest = r#"{
//!     "name": "Shapes",
//!     "guid": "5a0e1f2c-3b4d-4e6f-8a9b-0c1d2e3f4a5b",
//!     "types": [
//!         { "name": "Color", "kind": "enum", "variables": [ { "name": "Red" }, { "name": "Blue" } ] }
//!     ]
//! }"#;
//! let lib = TypeLib::from_provider(MemoryTypeLib::from_json_str(manifest).unwrap());
//! let model = ModelBuilder::new().build(&lib).unwrap();
//! assert_eq!(model.enums[0].values[1].value, 1);
//!
//! let out = tempfile::tempdir().unwrap();
//! let files = write_library(&model, out.path(), EmitOptions::default()).unwrap();
//! assert_eq!(files.headers.len(), 2);
//! ```
//!
//! ## Why unsafe code is needed
//!
//! Providers hand out raw `#[repr(C)]` records, the way `ITypeInfo` does.
//! Reading them and handing them back is `unsafe`; [`handle`] and
//! [`descriptor`] wrap that in safe views whose lifetimes are tied to the
//! provider object, so nothing above them touches a raw pointer.
//!
//! Everything is single-threaded: handles hold `Rc`, so they are `!Send`.

pub mod descriptor;
pub mod emit;
pub mod error;
pub mod generator;
pub mod handle;
pub mod library;
pub mod model;
pub mod prelude;
pub mod provider;
pub mod types;

pub use error::{TlbError, TlbResult};
pub use library::{TypeInfo, TypeLib};
