//! # Descriptor Decoding
//!
//! Read-only views over the raw records a provider hands out.
//!
//! Two families:
//!
//! - **Value views** ([`TypeDesc`], [`ArrayDesc`], [`ElemDesc`], [`ParamDesc`])
//!   are `Copy` projections of records embedded in a larger record. They
//!   borrow the resource they came from and cannot outlive it.
//! - **Resource views** ([`TypeAttr`], [`TypeLibAttr`], [`FuncDesc`],
//!   [`VarDesc`]) are acquired with a provider call and own a
//!   [`ResourceHandle`](crate::handle::ResourceHandle), so the record is
//!   released when the last clone of the view drops.
//!
//! Accessors that only make sense for one variant of a record
//! ([`TypeDesc::pointer`], [`ParamDesc::default_value`], [`VarDesc::value`],
//! ...) assert their precondition and panic when it does not hold. Check
//! [`TypeDesc::kind`], [`ParamDesc::has_default`] or [`VarDesc::kind`]
//! first.
//!
//! Nested user-defined types are never followed here: [`TypeDesc::reference`]
//! returns the opaque [`HRefType`](crate::types::HRefType), which only
//! [`TypeInfo::referenced_type`](crate::library::TypeInfo::referenced_type)
//! resolves.

pub mod attr;
pub mod funcdesc;
pub mod typedesc;
pub mod vardesc;

pub use attr::{TypeAttr, TypeLibAttr};
pub use funcdesc::FuncDesc;
pub use typedesc::{ArrayDesc, ElemDesc, ParamDesc, TypeDesc, TypeDescKind};
pub use vardesc::VarDesc;
