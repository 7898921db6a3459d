//! # Type Model
//!
//! Owned snapshots of the enums, records and interfaces of one library,
//! ready for emission. Nothing here holds a provider handle: once
//! [`ModelBuilder::build`] returns, the library can be dropped.
//!
//! ## Decoding rules
//!
//! - enumerators are the constant variables of an enum, as `i64`;
//! - record fields keep declaration order; unions set [`Record::union`];
//! - methods flagged restricted, and the `IUnknown`/`IDispatch` methods a
//!   dispinterface lists, are left out;
//! - an `[out, retval]` parameter becomes the method's return type, and a
//!   bare `HRESULT` return becomes `void`;
//! - dispinterfaces and dual interfaces are kept; vtable-only interfaces are
//!   left out, and a pointer to one becomes `IUnknown*`;
//! - user-defined types are resolved one level ([`ModelType::Named`]);
//! - records follow the records they embed by value, and interfaces follow
//!   their bases.

mod builder;
mod entities;
mod order;

pub use builder::{FailurePolicy, ModelBuilder};
pub use entities::{Enum, EnumValue, Field, Interface, Method, ModelType, Param, Record, TypeLibDescription};
