use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use super::render::{self, CRLF};
use crate::error::{TlbError, TlbResult};
use crate::model::TypeLibDescription;

/// Warning prefixed to every emitted file
pub const BANNER: &str = concat!(
    "/**\r\n",
    " *            **DO NOT EDIT THIS FILE**              \r\n",
    " *  This file was automatically generated by tlbgen. \r\n",
    " *  Any changes to this file will be overwritten.    \r\n",
    " */\r\n",
    "\r\n",
);

/// Paths written for one or more libraries, in write order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Files
{
    pub headers: Vec<PathBuf>,
    pub sources: Vec<PathBuf>,
}

impl Files
{
    /// Append another ledger.
    pub fn extend(&mut self, other: Files)
    {
        self.headers.extend(other.headers);
        self.sources.extend(other.sources);
    }

    /// Every path, headers first.
    pub fn iter(&self) -> impl Iterator<Item = &Path>
    {
        self.headers.iter().chain(&self.sources).map(PathBuf::as_path)
    }
}

/// Rendering of sections with no entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptySections
{
    /// Title, separator and blank line, like any other section
    #[default]
    Render,
    /// Leave the section out entirely
    Suppress,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EmitOptions
{
    pub sections: EmptySections,
}

fn section<T, F>(out: &mut String, title: &str, items: &[T], options: EmitOptions, render: F)
where
    F: Fn(&T) -> String,
{
    if items.is_empty() && options.sections == EmptySections::Suppress {
        return;
    }
    out.push_str(&format!("// {title}{CRLF}// {}{CRLF}{CRLF}", "-".repeat(title.len())));
    for item in items {
        out.push_str(&render(item));
        out.push_str(CRLF);
    }
    out.push_str(CRLF);
}

/// `<ImportName>.hpp`: the banner and an include of the definition header.
pub fn render_import_header(model: &TypeLibDescription) -> String
{
    format!("{BANNER}#include \"{}.hpp\"{CRLF}", model.library_id())
}

/// `<LibraryId>.hpp`: enums, forward declarations, records and interfaces.
pub fn render_definition_header(model: &TypeLibDescription, options: EmitOptions) -> String
{
    let mut out = format!("{BANNER}#include <tlbgen.hpp>{CRLF}{CRLF}");
    section(&mut out, "ENUMS", &model.enums, options, render::enum_header);
    section(&mut out, "FORWARD", &model.records, options, render::record_forward);
    section(&mut out, "STRUCTS", &model.records, options, render::record_header);
    section(&mut out, "INTERFACES", &model.interfaces, options, render::interface_header);
    out
}

/// `<LibraryId>.cpp`: interface definitions.
pub fn render_definition_source(model: &TypeLibDescription, options: EmitOptions) -> String
{
    let mut out = format!("{BANNER}#include \"{}.hpp\"{CRLF}{CRLF}", model.library_id());
    section(&mut out, "INTERFACES", &model.interfaces, options, render::interface_source);
    out
}

fn write_file(path: PathBuf, contents: &str) -> TlbResult<PathBuf>
{
    fs::write(&path, contents).map_err(|source| TlbError::FileWrite {
        path: path.clone(),
        source,
    })?;
    info!(path = %path.display(), bytes = contents.len(), "wrote file");
    Ok(path)
}

fn import_name(model: &TypeLibDescription) -> TlbResult<&str>
{
    let name = model.name.as_str();
    if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(TlbError::InvalidArgument(format!(
            "library name {name:?} cannot be used as a file name"
        )));
    }
    Ok(name)
}

/// Write `<ImportName>.hpp` and `<LibraryId>.hpp` into `directory`.
///
/// ## Errors
///
/// Returns `FileWrite` for the first file that cannot be written (earlier
/// files stay on disk), or `InvalidArgument` if the library name is not
/// usable as a file name.
pub fn write_headers(model: &TypeLibDescription, directory: &Path, files: &mut Files, options: EmitOptions) -> TlbResult<()>
{
    let import = directory.join(format!("{}.hpp", import_name(model)?));
    files.headers.push(write_file(import, &render_import_header(model))?);

    let definition = directory.join(format!("{}.hpp", model.library_id()));
    files
        .headers
        .push(write_file(definition, &render_definition_header(model, options))?);
    Ok(())
}

/// Write `<LibraryId>.cpp` into `directory`.
///
/// ## Errors
///
/// Returns `FileWrite` if the file cannot be written.
pub fn write_sources(model: &TypeLibDescription, directory: &Path, files: &mut Files, options: EmitOptions) -> TlbResult<()>
{
    let source = directory.join(format!("{}.cpp", model.library_id()));
    files
        .sources
        .push(write_file(source, &render_definition_source(model, options))?);
    Ok(())
}

/// Write all three files of a library and return their paths.
///
/// ## Errors
///
/// See [`write_headers`] and [`write_sources`].
pub fn write_library(model: &TypeLibDescription, directory: &Path, options: EmitOptions) -> TlbResult<Files>
{
    let mut files = Files::default();
    write_headers(model, directory, &mut files, options)?;
    write_sources(model, directory, &mut files, options)?;
    Ok(files)
}

#[cfg(test)]
mod tests
{
    use uuid::Uuid;

    use super::*;
    use crate::model::{Enum, EnumValue};

    fn model() -> TypeLibDescription
    {
        TypeLibDescription {
            name: "Tiny".into(),
            doc: String::new(),
            guid: Uuid::parse_str("0000000a-0000-0000-c000-0000000000ff").unwrap(),
            version: (1, 0),
            enums: vec![Enum {
                name: "Flag".into(),
                doc: String::new(),
                values: vec![EnumValue { name: "On".into(), value: 1 }],
            }],
            records: Vec::new(),
            interfaces: Vec::new(),
        }
    }

    #[test]
    fn test_banner_lines_share_width()
    {
        let widths: Vec<_> = BANNER.split(CRLF).skip(1).take(3).map(str::len).collect();
        assert_eq!(widths, [53, 53, 53]);
    }

    #[test]
    fn test_import_header()
    {
        assert_eq!(
            render_import_header(&model()),
            format!("{BANNER}#include \"0000000A-0000-0000-C000-0000000000FF.hpp\"\r\n")
        );
    }

    #[test]
    fn test_definition_header_sections()
    {
        let text = render_definition_header(&model(), EmitOptions::default());
        let body = text.strip_prefix(BANNER).unwrap();
        assert_eq!(
            body,
            concat!(
                "#include <tlbgen.hpp>\r\n\r\n",
                "// ENUMS\r\n// -----\r\n\r\n",
                "enum class Flag: int32_t\r\n{\r\n    On = 1,\r\n};\r\n\r\n",
                "// FORWARD\r\n// -------\r\n\r\n\r\n",
                "// STRUCTS\r\n// -------\r\n\r\n\r\n",
                "// INTERFACES\r\n// ----------\r\n\r\n\r\n",
            )
        );
    }

    #[test]
    fn test_suppressed_empty_sections()
    {
        let options = EmitOptions {
            sections: EmptySections::Suppress,
        };
        let text = render_definition_header(&model(), options);
        assert!(text.contains("// ENUMS"));
        assert!(!text.contains("// FORWARD"));
        assert!(!text.contains("// INTERFACES"));
        assert!(render_definition_source(&model(), options).ends_with("#include \"0000000A-0000-0000-C000-0000000000FF.hpp\"\r\n\r\n"));
    }

    #[test]
    fn test_write_library_ledger()
    {
        let dir = tempfile::tempdir().unwrap();
        let files = write_library(&model(), dir.path(), EmitOptions::default()).unwrap();
        assert_eq!(files.headers, [
            dir.path().join("Tiny.hpp"),
            dir.path().join("0000000A-0000-0000-C000-0000000000FF.hpp"),
        ]);
        assert_eq!(files.sources, [dir.path().join("0000000A-0000-0000-C000-0000000000FF.cpp")]);
        assert_eq!(files.iter().count(), 3);
        let written = fs::read_to_string(&files.headers[0]).unwrap();
        assert_eq!(written, render_import_header(&model()));
    }

    #[test]
    fn test_unwritable_directory()
    {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent");
        let error = write_library(&model(), &missing, EmitOptions::default()).unwrap_err();
        assert!(matches!(error, TlbError::FileWrite { ref path, .. } if path == &missing.join("Tiny.hpp")));
    }

    #[test]
    fn test_unusable_library_name()
    {
        let dir = tempfile::tempdir().unwrap();
        let mut bad = model();
        bad.name = "../escape".into();
        let error = write_library(&bad, dir.path(), EmitOptions::default()).unwrap_err();
        assert!(matches!(error, TlbError::InvalidArgument(_)));
    }
}
