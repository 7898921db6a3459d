//! # Resource Handles
//!
//! RAII ownership of raw records a provider allocated on our behalf.
//!
//! Calls such as `GetFuncDesc` return a pointer the caller must hand back
//! with the matching release call (`ReleaseFuncDesc`) on the *same* object.
//! [`ResourceHandle`] ties the three together: the pointer, a strong
//! reference to the provider object, and the release call (through the
//! [`Release`] impl of the provider type).
//!
//! ## Ownership rules
//!
//! - A handle built from a null pointer is *invalid*; [`ResourceHandle::is_valid`] is `false`.
//! - Cloning shares the acquisition. The provider object stays alive while any clone exists.
//! - Moving a handle never releases.
//! - The release call fires exactly once, when the last clone drops.
//!
//! ## Example
//!
//! ```rust
//! use std::cell::Cell;
//! use std::ptr::NonNull;
//! use std::rc::Rc;
//!
//! use tlbgen_core::handle::ResourceHandle;
//! use tlbgen_core::provider::Release;
//!
//! struct Owner
//! {
//!     released: Cell<usize>,
//! }
//!
//! impl Release<u32> for Owner
//! {
//!     unsafe fn release(&self, ptr: NonNull<u32>)
//!     {
//!         drop(unsafe { Box::from_raw(ptr.as_ptr()) });
//!         self.released.set(self.released.get() + 1);
//!     }
//! }
//!
//! let owner = Rc::new(Owner { released: Cell::new(0) });
//! let raw = Box::into_raw(Box::new(7_u32));
//! // SAFETY: `raw` is a fresh allocation `Owner::release` knows how to free.
//! let handle = unsafe { ResourceHandle::from_raw(Rc::clone(&owner), raw) };
//! let copy = handle.clone();
//! drop(handle);
//! assert_eq!(owner.released.get(), 0);
//! assert_eq!(*copy.get(), 7);
//! drop(copy);
//! assert_eq!(owner.released.get(), 1);
//! ```

use std::fmt;
use std::ptr::NonNull;
use std::rc::Rc;

use tracing::trace;

use crate::provider::{ProviderCallError, Release};

/// One acquired pointer plus the object that must release it.
struct Acquired<T, P>
where
    P: ?Sized + Release<T>,
{
    ptr: NonNull<T>,
    owner: Rc<P>,
}

impl<T, P> Drop for Acquired<T, P>
where
    P: ?Sized + Release<T>,
{
    fn drop(&mut self)
    {
        trace!(ptr = ?self.ptr, record = std::any::type_name::<T>(), "releasing provider record");
        // SAFETY: `ptr` was obtained from `owner` (contract of `from_raw` /
        // `acquire`) and this is the only place it is released: `Acquired`
        // is never cloned, only shared through `Rc`.
        unsafe { self.owner.release(self.ptr) }
    }
}

/// Shared ownership of a provider-allocated record
///
/// `T` is the raw record type, `P` the provider type that allocated it
/// (usually `dyn TypeInfoProvider` or `dyn TypeLibProvider`).
pub struct ResourceHandle<T, P>
where
    P: ?Sized + Release<T>,
{
    inner: Option<Rc<Acquired<T, P>>>,
}

impl<T, P> ResourceHandle<T, P>
where
    P: ?Sized + Release<T>,
{
    /// An invalid handle that owns nothing.
    pub const fn invalid() -> Self
    {
        Self { inner: None }
    }

    /// Take ownership of `ptr`, allocated by `owner`.
    ///
    /// A null `ptr` yields an invalid handle and `owner` is dropped.
    ///
    /// # Safety
    ///
    /// A non-null `ptr` must have been allocated by `owner`, must not be
    /// owned by any other handle, and must stay valid until
    /// `owner.release(ptr)` is called.
    pub unsafe fn from_raw(owner: Rc<P>, ptr: *mut T) -> Self
    {
        Self {
            inner: NonNull::new(ptr).map(|ptr| Rc::new(Acquired { ptr, owner })),
        }
    }

    /// Run a provider call and take ownership of the record it returns.
    ///
    /// The error of a failed call is returned as-is; no handle, valid or
    /// not, is produced in that case.
    ///
    /// ## Errors
    ///
    /// Whatever `call` returns.
    ///
    /// # Safety
    ///
    /// On success `call` must return a pointer allocated by `owner` that
    /// nothing else owns (see [`ResourceHandle::from_raw`]).
    pub unsafe fn acquire<F>(owner: Rc<P>, call: F) -> Result<Self, ProviderCallError>
    where
        F: FnOnce(&P) -> Result<NonNull<T>, ProviderCallError>,
    {
        let ptr = call(&owner)?;
        trace!(?ptr, record = std::any::type_name::<T>(), "acquired provider record");
        Ok(Self {
            inner: Some(Rc::new(Acquired { ptr, owner })),
        })
    }

    /// Whether this handle owns a record.
    pub fn is_valid(&self) -> bool
    {
        self.inner.is_some()
    }

    /// Borrow the record.
    ///
    /// ## Panics
    ///
    /// Panics if the handle is invalid. Callers check [`ResourceHandle::is_valid`]
    /// first; reading through an invalid handle is a programming error.
    pub fn get(&self) -> &T
    {
        let acquired = self
            .inner
            .as_ref()
            .unwrap_or_else(|| panic!("precondition violated: {} read through an invalid handle", std::any::type_name::<T>()));
        // SAFETY: the record stays allocated until `Acquired` drops, which
        // cannot happen while `self` borrows it.
        unsafe { acquired.ptr.as_ref() }
    }

    /// Provider object the record was acquired from.
    pub fn owner(&self) -> Option<&Rc<P>>
    {
        self.inner.as_ref().map(|acquired| &acquired.owner)
    }

    /// Number of handles sharing this acquisition (0 when invalid).
    pub fn use_count(&self) -> usize
    {
        self.inner.as_ref().map_or(0, Rc::strong_count)
    }

    /// Raw pointer to the record, null when invalid.
    pub fn as_ptr(&self) -> *const T
    {
        self.inner
            .as_ref()
            .map_or(std::ptr::null(), |acquired| acquired.ptr.as_ptr().cast_const())
    }
}

impl<T, P> Clone for ResourceHandle<T, P>
where
    P: ?Sized + Release<T>,
{
    fn clone(&self) -> Self
    {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T, P> Default for ResourceHandle<T, P>
where
    P: ?Sized + Release<T>,
{
    fn default() -> Self
    {
        Self::invalid()
    }
}

impl<T, P> fmt::Debug for ResourceHandle<T, P>
where
    P: ?Sized + Release<T>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("ResourceHandle")
            .field("ptr", &self.as_ptr())
            .field("use_count", &self.use_count())
            .finish()
    }
}
