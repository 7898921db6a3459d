//! # Generator
//!
//! Drives open → build → emit for one or more libraries.
//!
//! Libraries are processed one after another and share nothing: each gets
//! its own provider, its own descriptors and its own emission pass, and all
//! of them are released before the next library is opened.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{error, info};

use crate::emit::{self, EmitOptions, Files};
use crate::error::{TlbError, TlbResult};
use crate::library::TypeLib;
use crate::model::{FailurePolicy, ModelBuilder, TypeLibDescription};
use crate::provider::memory::ManifestLoader;
use crate::provider::LibraryLoader;

/// Generation settings
#[derive(Debug, Clone, Copy, Default)]
pub struct GeneratorOptions
{
    pub emit: EmitOptions,
    /// Per-member failure handling inside one library
    pub on_member_error: FailurePolicy,
    /// Continue with the remaining libraries after one fails
    pub keep_going: bool,
}

/// Outcome of [`Generator::generate_all`]
#[derive(Debug, Default)]
pub struct GenerationReport
{
    /// Files of every library that was generated
    pub files: Files,
    /// Libraries that failed, with the reason
    pub failures: Vec<(PathBuf, TlbError)>,
}

impl GenerationReport
{
    pub fn is_success(&self) -> bool
    {
        self.failures.is_empty()
    }
}

/// Generates bindings for libraries opened through a [`LibraryLoader`]
pub struct Generator
{
    loader: Box<dyn LibraryLoader>,
    options: GeneratorOptions,
}

impl Generator
{
    /// Generator reading JSON manifests.
    pub fn new(options: GeneratorOptions) -> Self
    {
        Self::with_loader(Box::new(ManifestLoader), options)
    }

    pub fn with_loader(loader: Box<dyn LibraryLoader>, options: GeneratorOptions) -> Self
    {
        Self { loader, options }
    }

    pub fn options(&self) -> &GeneratorOptions
    {
        &self.options
    }

    /// Build the model of an open library.
    ///
    /// ## Errors
    ///
    /// Returns `ProviderCall` as described in [`ModelBuilder::build`].
    pub fn describe(&self, lib: &TypeLib) -> TlbResult<TypeLibDescription>
    {
        Ok(ModelBuilder::with_policy(self.options.on_member_error).build(lib)?)
    }

    /// Build and emit one open library into `out_dir`.
    ///
    /// ## Errors
    ///
    /// Returns `ProviderCall` if decoding fails (no file is written then),
    /// or the emission error of the first file that cannot be written.
    pub fn generate(&self, lib: &TypeLib, out_dir: &Path) -> TlbResult<Files>
    {
        let model = self.describe(lib)?;
        prepare_directory(out_dir)?;
        emit::write_library(&model, out_dir, self.options.emit)
    }

    /// Open the library at `path`, then [`Generator::generate`] it.
    ///
    /// ## Errors
    ///
    /// Returns `ProviderCall` for `LoadTypeLib` if the library cannot be opened,
    /// otherwise as [`Generator::generate`].
    pub fn generate_path(&self, path: &Path, out_dir: &Path) -> TlbResult<Files>
    {
        info!(library = %path.display(), out = %out_dir.display(), "generating bindings");
        let lib = TypeLib::open_with(self.loader.as_ref(), path)?;
        self.generate(&lib, out_dir)
    }

    /// Generate every library in `paths`, in order.
    ///
    /// Without [`GeneratorOptions::keep_going`] the first failure stops the
    /// run; files of libraries generated before it stay on disk.
    pub fn generate_all(&self, paths: &[PathBuf], out_dir: &Path) -> GenerationReport
    {
        let mut report = GenerationReport::default();
        for path in paths {
            match self.generate_path(path, out_dir) {
                Ok(files) => report.files.extend(files),
                Err(e) => {
                    error!(library = %path.display(), error = %e, "generation failed");
                    report.failures.push((path.clone(), e));
                    if !self.options.keep_going {
                        break;
                    }
                }
            }
        }
        report
    }
}

/// Create `out_dir` if needed.
fn prepare_directory(out_dir: &Path) -> TlbResult<()>
{
    if out_dir.exists() && !out_dir.is_dir() {
        return Err(TlbError::InvalidArgument(format!(
            "output path {} is not a directory",
            out_dir.display()
        )));
    }
    fs::create_dir_all(out_dir)?;
    Ok(())
}

#[cfg(test)]
mod tests
{
    use std::io::Write;

    use super::*;
    use crate::provider::ProviderCode;

    fn manifest(dir: &Path, file: &str, name: &str) -> PathBuf
    {
        let path = dir.join(file);
        let mut out = fs::File::create(&path).unwrap();
        write!(out, r#"{{ "name": "{name}", "guid": "00000000-0000-0000-0000-00000000{:04x}" }}"#, name.len()).unwrap();
        path
    }

    #[test]
    fn test_generate_all_stops_at_first_failure()
    {
        let input = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let paths = vec![
            manifest(input.path(), "a.json", "Alpha"),
            input.path().join("missing.json"),
            manifest(input.path(), "b.json", "Beta2"),
        ];

        let report = Generator::new(GeneratorOptions::default()).generate_all(&paths, out.path());
        assert_eq!(report.files.headers.len(), 2);
        assert_eq!(report.failures.len(), 1);
        match &report.failures[0].1 {
            TlbError::ProviderCall(e) => assert_eq!(e.reason, ProviderCode::CantLoadLibrary),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_keep_going_generates_the_rest()
    {
        let input = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let paths = vec![
            input.path().join("missing.json"),
            manifest(input.path(), "a.json", "Alpha"),
            manifest(input.path(), "b.json", "Gamma12"),
        ];
        let options = GeneratorOptions {
            keep_going: true,
            ..GeneratorOptions::default()
        };

        let report = Generator::new(options).generate_all(&paths, out.path());
        assert!(!report.is_success());
        assert_eq!(report.files.sources.len(), 2);
        assert!(out.path().join("Gamma12.hpp").exists());
    }

    #[test]
    fn test_output_directory_is_created()
    {
        let input = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let nested = out.path().join("gen").join("include");
        let path = manifest(input.path(), "a.json", "Alpha");
        let files = Generator::new(GeneratorOptions::default())
            .generate_path(&path, &nested)
            .unwrap();
        assert!(files.iter().all(Path::exists));

        let file_target = manifest(input.path(), "c.json", "Clash");
        let error = Generator::new(GeneratorOptions::default())
            .generate_path(&path, &file_target)
            .unwrap_err();
        assert!(matches!(error, TlbError::InvalidArgument(_)));
    }
}
