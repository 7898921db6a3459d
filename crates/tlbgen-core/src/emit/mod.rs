//! # Code Emission
//!
//! Turns a [`TypeLibDescription`](crate::model::TypeLibDescription) into
//! three C++ files:
//!
//! | file                | contents                                                 |
//! |---------------------|----------------------------------------------------------|
//! | `<ImportName>.hpp`  | banner, include of the definition header                 |
//! | `<LibraryId>.hpp`   | banner, `#include <tlbgen.hpp>`, ENUMS, FORWARD, STRUCTS, INTERFACES |
//! | `<LibraryId>.cpp`   | banner, include of the definition header, INTERFACES     |
//!
//! `ImportName` is the documented library name and `LibraryId` the
//! upper-case hyphenated library GUID. Every line ends in `\r\n`, and output
//! depends only on the model, so emitting twice gives identical bytes.
//!
//! Each section is `// TITLE`, a dashed separator of the same length, a
//! blank line, one entity per line break and a closing blank line. Empty
//! sections are rendered the same way unless
//! [`EmptySections::Suppress`] is requested.
//!
//! ```rust
//! use tlbgen_core::emit::{render_definition_header, EmitOptions};
//! use tlbgen_core::model::TypeLibDescription;
//!
//! let model = TypeLibDescription {
//!     name: "Empty".into(),
//!     doc: String::new(),
//!     guid: uuid::Uuid::nil(),
//!     version: (1, 0),
//!     enums: vec![],
//!     records: vec![],
//!     interfaces: vec![],
//! };
//! let header = render_definition_header(&model, EmitOptions::default());
//! assert!(header.ends_with("// INTERFACES\r\n// ----------\r\n\r\n\r\n"));
//! ```

pub mod render;
mod writer;

pub use writer::{
    render_definition_header, render_definition_source, render_import_header, write_headers, write_library,
    write_sources, EmitOptions, EmptySections, Files, BANNER,
};
