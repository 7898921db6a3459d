//! # Types
//!
//! Provider-agnostic value types used throughout the crate.
//!
//! These are the vocabulary of type library metadata (variant codes, kinds,
//! flag words, constants, documentation) independent of which provider
//! produced them.

pub mod constant;
pub mod documentation;
pub mod flags;
pub mod kinds;
pub mod vartype;

/// Identifier of a member (function or variable) within a type (`MEMBERID`)
pub type MemberId = i32;

/// Opaque reference to another type, resolved through its owner (`HREFTYPE`)
pub type HRefType = u32;

/// Locale identifier (`LCID`)
pub type Lcid = u32;

/// Member id meaning "the type itself" in documentation lookups
pub const MEMBERID_NIL: MemberId = -1;

// Re-export all public types
pub use constant::Constant;
pub use documentation::{DllEntry, Documentation};
pub use flags::{FuncFlags, IdlFlags, ImplTypeFlags, InvokeKind, LibFlags, ParamFlags, TypeFlags, VarFlags};
pub use kinds::{CallConv, FuncKind, SysKind, TypeKind, VarKind};
pub use vartype::VarType;
