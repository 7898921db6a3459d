//! JSON library manifests.
//!
//! A manifest describes one library: its documentation and attributes, and
//! an ordered list of types. Type expressions are externally tagged:
//!
//! ```json
//! { "primitive": "i4" }
//! { "pointer": { "user": "Point" } }
//! { "safe_array": { "primitive": "bstr" } }
//! { "c_array": { "element": { "primitive": "r8" }, "bounds": [ { "elements": 4 } ] } }
//! { "user": "IDispatch" }
//! ```
//!
//! Names given to `user` are looked up among the library's own types first,
//! then among the built-in `stdole` types (`IUnknown`, `IDispatch`).

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::types::{CallConv, Constant, FuncKind, MemberId, SysKind, TypeKind, VarKind};

/// Problems found while reading or lowering a manifest
#[derive(Error, Debug)]
pub enum ManifestError
{
    #[error("Invalid manifest JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{owner}: unknown primitive type '{name}'")]
    UnknownPrimitive
    {
        owner: String,
        name: String,
    },

    #[error("{owner}: unknown flag '{flag}'")]
    UnknownFlag
    {
        owner: String,
        flag: String,
    },

    #[error("{owner}: unknown invoke kind '{name}'")]
    UnknownInvokeKind
    {
        owner: String,
        name: String,
    },

    #[error("Type '{0}' is declared more than once")]
    DuplicateType(String),

    #[error("{owner}: variable needs a type")]
    MissingType
    {
        owner: String,
    },

    #[error("{owner}: C array needs at least one bound")]
    EmptyArray
    {
        owner: String,
    },

    #[error("{owner}: too many {what}")]
    TooMany
    {
        owner: String,
        what: &'static str,
    },
}

/// `major.minor` version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionManifest
{
    #[serde(default)]
    pub major: u16,
    #[serde(default)]
    pub minor: u16,
}

impl Default for VersionManifest
{
    fn default() -> Self
    {
        Self { major: 1, minor: 0 }
    }
}

/// A whole library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LibraryManifest
{
    pub name: String,
    #[serde(default)]
    pub doc: String,
    #[serde(default)]
    pub help_context: u32,
    #[serde(default)]
    pub help_file: String,
    pub guid: Uuid,
    #[serde(default)]
    pub lcid: u32,
    #[serde(default = "default_syskind")]
    pub syskind: SysKind,
    #[serde(default)]
    pub version: VersionManifest,
    #[serde(default)]
    pub flags: Vec<String>,
    #[serde(default)]
    pub types: Vec<TypeManifest>,
}

fn default_syskind() -> SysKind
{
    SysKind::Win32
}

/// One library member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeManifest
{
    pub name: String,
    pub kind: TypeKind,
    #[serde(default)]
    pub doc: String,
    #[serde(default)]
    pub help_context: u32,
    #[serde(default)]
    pub guid: Option<Uuid>,
    #[serde(default)]
    pub version: VersionManifest,
    #[serde(default)]
    pub flags: Vec<String>,
    /// Aliased type, for `alias` kinds
    #[serde(default)]
    pub alias: Option<TypeExpr>,
    #[serde(default)]
    pub variables: Vec<VariableManifest>,
    #[serde(default)]
    pub functions: Vec<FunctionManifest>,
    /// Implemented (coclass) or inherited (interface) types
    #[serde(default)]
    pub implements: Vec<ImplementsManifest>,
}

/// Type expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeExpr
{
    /// Primitive by name (`i4`, `bstr`, `variant`, ...)
    Primitive(String),
    /// Pointer to a type
    Pointer(Box<TypeExpr>),
    /// `SAFEARRAY` of a type
    SafeArray(Box<TypeExpr>),
    /// Fixed-size array
    CArray
    {
        element: Box<TypeExpr>,
        bounds: Vec<BoundManifest>,
    },
    /// Named user-defined type
    User(String),
}

/// One dimension of a C array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundManifest
{
    pub elements: u32,
    #[serde(default)]
    pub lower: i32,
}

/// Enumerator, record field, dispatch property or module constant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VariableManifest
{
    pub name: String,
    #[serde(default)]
    pub doc: String,
    #[serde(default)]
    pub id: Option<MemberId>,
    /// Defaults to `i4` for enumerators
    #[serde(default, rename = "type")]
    pub ty: Option<TypeExpr>,
    /// Makes the variable a constant; enumerators without one continue from
    /// the previous value
    #[serde(default)]
    pub value: Option<Constant>,
    /// Overrides the kind inferred from the member and value
    #[serde(default)]
    pub kind: Option<VarKind>,
    #[serde(default)]
    pub flags: Vec<String>,
}

/// Method or property accessor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FunctionManifest
{
    pub name: String,
    #[serde(default)]
    pub doc: String,
    /// Functions sharing a name share the id of the first by default
    #[serde(default)]
    pub id: Option<MemberId>,
    /// `func`, `get`, `put` or `putref`
    #[serde(default)]
    pub invoke: Option<String>,
    #[serde(default)]
    pub kind: Option<FuncKind>,
    #[serde(default)]
    pub call_conv: Option<CallConv>,
    /// Defaults to `hresult` for vtable interfaces and `void` elsewhere
    #[serde(default)]
    pub returns: Option<TypeExpr>,
    #[serde(default)]
    pub params: Vec<ParamManifest>,
    #[serde(default)]
    pub flags: Vec<String>,
    #[serde(default)]
    pub scodes: Vec<i32>,
    /// Export of a module function
    #[serde(default)]
    pub entry: Option<EntryManifest>,
}

/// Function parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParamManifest
{
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeExpr,
    /// `in`, `out`, `retval`, `opt`, `lcid`; `in` when neither `in` nor `out` is given
    #[serde(default)]
    pub flags: Vec<String>,
    /// Default value; implies `opt`
    #[serde(default)]
    pub default: Option<Constant>,
}

/// DLL export of a module function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntryManifest
{
    pub dll: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub ordinal: u16,
}

/// Implemented or inherited type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImplementsManifest
{
    /// Just the name
    Name(String),
    /// Name and `IMPLTYPEFLAG_*` names
    Detailed
    {
        name: String,
        #[serde(default)]
        flags: Vec<String>,
    },
}

impl ImplementsManifest
{
    pub fn name(&self) -> &str
    {
        match self {
            Self::Name(name) | Self::Detailed { name, .. } => name,
        }
    }

    pub fn flags(&self) -> &[String]
    {
        match self {
            Self::Name(_) => &[],
            Self::Detailed { flags, .. } => flags,
        }
    }
}

impl LibraryManifest
{
    /// Parse a manifest.
    ///
    /// ## Errors
    ///
    /// Returns `ManifestError::Json` on malformed or unexpected input.
    pub fn from_json_str(text: &str) -> Result<Self, ManifestError>
    {
        Ok(serde_json::from_str(text)?)
    }
}
