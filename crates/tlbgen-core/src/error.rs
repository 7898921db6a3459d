//! # Error Types
//!
//! Errors raised while generating bindings for a library.
//!
//! We use `thiserror` to derive the `Error` trait and messages.
//!
//! ## Error Categories
//!
//! 1. **Provider errors**: ProviderCall (any failed reflection call, never retried)
//! 2. **Output errors**: FileWrite (an emitted file could not be created or written)
//! 3. **Usage errors**: InvalidArgument
//! 4. **I/O errors**: Io (directory handling outside a specific output file)
//!
//! Precondition violations (reading a variant-specific field of the wrong
//! descriptor, indexing past an advertised count) are programming errors and
//! panic instead of returning one of these.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::provider::ProviderCallError;

/// Main error type for generation
#[derive(Error, Debug)]
pub enum TlbError
{
    /// A reflection provider call failed
    ///
    /// Carries the operation name and the member it was made for.
    #[error(transparent)]
    ProviderCall(#[from] ProviderCallError),

    /// An output file could not be created or written
    ///
    /// Files written before the failure are left in place.
    #[error("Failed to write {}: {source}", path.display())]
    FileWrite
    {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Invalid argument passed to a generator function
    ///
    /// Examples:
    /// - An output path that is not a directory
    /// - An empty list of libraries
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl TlbError
{
    /// Whether the failure came from the reflection provider rather than
    /// from writing output.
    pub fn is_provider_error(&self) -> bool
    {
        matches!(self, Self::ProviderCall(_))
    }
}

/// Result alias for generation
pub type TlbResult<T> = std::result::Result<T, TlbError>;

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::provider::HResult;

    #[test]
    fn test_provider_errors_convert()
    {
        let error: TlbError = ProviderCallError::new("GetTypeInfo", HResult::E_INVALIDARG, "index 4").into();
        assert!(error.is_provider_error());
        assert!(error.to_string().starts_with("GetTypeInfo failed"));
    }

    #[test]
    fn test_file_write_names_path()
    {
        let error = TlbError::FileWrite {
            path: PathBuf::from("out/Shapes.hpp"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(!error.is_provider_error());
        assert_eq!(error.to_string(), "Failed to write out/Shapes.hpp: denied");
    }
}
