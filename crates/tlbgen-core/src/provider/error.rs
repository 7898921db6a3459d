//! # Provider Call Errors
//!
//! Reflection providers report failure the way OLE Automation does: with an
//! `HRESULT` status code. This module wraps those codes and attaches the name
//! of the call that failed so that a failure deep inside a library walk can
//! still be diagnosed.
//!
//! Provider trait methods return [`ProviderResult`], i.e. a bare code. The
//! decoding layer turns that into a [`ProviderCallError`] naming the
//! operation and the member it was working on.

use std::fmt;

use thiserror::Error;

/// Status code returned by a provider call (`HRESULT`)
///
/// Negative values are failures. Codes are kept as the raw `i32` so unknown
/// codes from a provider survive unchanged.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct HResult(pub i32);

#[allow(clippy::cast_possible_wrap)]
impl HResult
{
    /// Success
    pub const S_OK: Self = Self(0);
    /// Not implemented
    pub const E_NOTIMPL: Self = Self(0x8000_4001_u32 as i32);
    /// Unspecified failure
    pub const E_FAIL: Self = Self(0x8000_4005_u32 as i32);
    /// Ran out of memory
    pub const E_OUTOFMEMORY: Self = Self(0x8007_000E_u32 as i32);
    /// One or more arguments are invalid
    pub const E_INVALIDARG: Self = Self(0x8007_0057_u32 as i32);
    /// Error reading the library image
    pub const TYPE_E_INVDATAREAD: Self = Self(0x8002_8018_u32 as i32);
    /// Library not registered
    pub const TYPE_E_LIBNOTREGISTERED: Self = Self(0x8002_801D_u32 as i32);
    /// Element not found
    pub const TYPE_E_ELEMENTNOTFOUND: Self = Self(0x8002_802B_u32 as i32);
    /// Operation not valid for this kind of module
    pub const TYPE_E_BADMODULEKIND: Self = Self(0x8002_88BD_u32 as i32);
    /// Library could not be loaded
    pub const TYPE_E_CANTLOADLIBRARY: Self = Self(0x8002_9C4A_u32 as i32);

    /// Whether this code reports failure.
    pub const fn is_failure(self) -> bool
    {
        self.0 < 0
    }
}

impl fmt::Debug for HResult
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "HResult({self})")
    }
}

impl fmt::Display for HResult
{
    #[allow(clippy::cast_sign_loss)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "0x{:08X}", self.0 as u32)
    }
}

/// Result of a raw provider call
pub type ProviderResult<T> = std::result::Result<T, HResult>;

/// Well-known provider status codes
///
/// ## Why convert to an enum?
///
/// - **Type safety**: callers can match on the failure they care about
/// - **Better error messages**: descriptive text instead of hex
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderCode
{
    /// `E_INVALIDARG`: an index or argument was out of range
    #[error("E_INVALIDARG: Invalid argument")]
    InvalidArg,

    /// `TYPE_E_ELEMENTNOTFOUND`: no member, reference or name matched
    #[error("TYPE_E_ELEMENTNOTFOUND: Element not found")]
    ElementNotFound,

    /// `TYPE_E_CANTLOADLIBRARY` / `TYPE_E_LIBNOTREGISTERED`: the library could not be located
    #[error("TYPE_E_CANTLOADLIBRARY: Library could not be loaded")]
    CantLoadLibrary,

    /// `TYPE_E_INVDATAREAD`: the library image is malformed
    #[error("TYPE_E_INVDATAREAD: Malformed library data")]
    InvalidData,

    /// `TYPE_E_BADMODULEKIND`: the call does not apply to this kind of type
    #[error("TYPE_E_BADMODULEKIND: Operation not valid for this type kind")]
    BadModuleKind,

    /// `E_OUTOFMEMORY`
    #[error("E_OUTOFMEMORY: Out of memory")]
    OutOfMemory,

    /// `E_NOTIMPL`
    #[error("E_NOTIMPL: Not implemented by provider")]
    NotImplemented,

    /// Any other code
    #[error("Provider error {0}")]
    Unknown(HResult),
}

impl From<HResult> for ProviderCode
{
    fn from(code: HResult) -> Self
    {
        match code {
            HResult::E_INVALIDARG => ProviderCode::InvalidArg,
            HResult::TYPE_E_ELEMENTNOTFOUND => ProviderCode::ElementNotFound,
            HResult::TYPE_E_CANTLOADLIBRARY | HResult::TYPE_E_LIBNOTREGISTERED => ProviderCode::CantLoadLibrary,
            HResult::TYPE_E_INVDATAREAD => ProviderCode::InvalidData,
            HResult::TYPE_E_BADMODULEKIND => ProviderCode::BadModuleKind,
            HResult::E_OUTOFMEMORY => ProviderCode::OutOfMemory,
            HResult::E_NOTIMPL => ProviderCode::NotImplemented,
            other => ProviderCode::Unknown(other),
        }
    }
}

/// A reflection provider call failed
///
/// Carries the name of the provider operation (`GetFuncDesc`,
/// `GetRefTypeInfo`, ...), the status code and free-form context naming the
/// member or index involved. Provider failures are never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{operation} failed ({code}): {reason}{}", context_suffix(.context))]
pub struct ProviderCallError
{
    /// Provider operation that failed
    pub operation: &'static str,
    /// Status code the provider returned
    pub code: HResult,
    /// Decoded status code
    pub reason: ProviderCode,
    /// Member, index or path the call was made for
    pub context: String,
}

fn context_suffix(context: &str) -> String
{
    if context.is_empty() {
        String::new()
    } else {
        format!(" [{context}]")
    }
}

impl ProviderCallError
{
    /// Create an error for a failed operation.
    pub fn new(operation: &'static str, code: HResult, context: impl Into<String>) -> Self
    {
        Self {
            operation,
            code,
            reason: ProviderCode::from(code),
            context: context.into(),
        }
    }

    /// Prefix additional context (outermost first).
    #[must_use]
    pub fn within(mut self, outer: impl fmt::Display) -> Self
    {
        self.context = if self.context.is_empty() {
            outer.to_string()
        } else {
            format!("{outer}: {}", self.context)
        };
        self
    }
}

/// Attach an operation name to a raw provider result.
///
/// ```rust
/// use tlbgen_core::provider::error::{HResult, ProviderCallError, ProviderCode, ProviderResult, CallContext};
///
/// let raw: ProviderResult<u32> = Err(HResult::E_INVALIDARG);
/// let error = raw.call("GetTypeInfo", || "index 7".to_string()).unwrap_err();
/// assert_eq!(error.reason, ProviderCode::InvalidArg);
/// assert!(error.to_string().contains("GetTypeInfo"));
/// ```
pub trait CallContext<T>
{
    /// Convert a failure code into a [`ProviderCallError`] for `operation`.
    ///
    /// ## Errors
    ///
    /// Returns the wrapped error if the raw call failed.
    fn call<F>(self, operation: &'static str, context: F) -> Result<T, ProviderCallError>
    where
        F: FnOnce() -> String;
}

impl<T> CallContext<T> for ProviderResult<T>
{
    fn call<F>(self, operation: &'static str, context: F) -> Result<T, ProviderCallError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|code| ProviderCallError::new(operation, code, context()))
    }
}
