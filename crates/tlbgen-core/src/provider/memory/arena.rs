//! Raw record storage for the in-memory provider.
//!
//! Records are built on demand, boxed together with everything their
//! pointers refer to, and lent to the caller until it hands them back.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::ptr::{self, NonNull};
use std::rc::Rc;

use tracing::warn;

use super::lower::TypeNode;
use crate::provider::ffi::{
    RawArrayDesc, RawElemDesc, RawParamDesc, RawParamDescEx, RawSafeArrayBound, RawStr, RawTypeDesc, RawVariant,
    VariantData,
};
use crate::types::{Constant, ParamFlags, VarType};

/// Allocation counters shared by a library, its members and its imports
#[derive(Debug, Default)]
pub struct AllocationStats
{
    acquired: Cell<usize>,
    released: Cell<usize>,
    invalid_releases: Cell<usize>,
}

impl AllocationStats
{
    /// Records handed out so far.
    pub fn acquired(&self) -> usize
    {
        self.acquired.get()
    }

    /// Records handed back so far.
    pub fn released(&self) -> usize
    {
        self.released.get()
    }

    /// Records handed out and not yet handed back.
    pub fn outstanding(&self) -> usize
    {
        self.acquired() - self.released()
    }

    /// Release calls for pointers that were not outstanding (double or foreign releases).
    pub fn invalid_releases(&self) -> usize
    {
        self.invalid_releases.get()
    }
}

/// Blocks currently lent out, keyed by address
///
/// Each block is `#[repr(C)]` with its record as first field, so the record
/// pointer and the block pointer share an address.
pub(crate) struct LiveBlocks<B>
{
    live: RefCell<HashMap<usize, NonNull<B>>>,
    stats: Rc<AllocationStats>,
}

impl<B> LiveBlocks<B>
{
    pub(crate) fn new(stats: Rc<AllocationStats>) -> Self
    {
        Self {
            live: RefCell::new(HashMap::new()),
            stats,
        }
    }

    /// Lend `block` out and return the pointer to its record.
    pub(crate) fn lend<R>(&self, block: Box<B>) -> NonNull<R>
    {
        let ptr = NonNull::from(Box::leak(block));
        self.live.borrow_mut().insert(ptr.as_ptr() as usize, ptr);
        self.stats.acquired.set(self.stats.acquired.get() + 1);
        ptr.cast()
    }

    /// Take a record back and free its block.
    ///
    /// Unknown pointers are counted and otherwise ignored.
    pub(crate) fn reclaim<R>(&self, record: NonNull<R>)
    {
        let key = record.as_ptr() as usize;
        let Some(block) = self.live.borrow_mut().remove(&key) else {
            warn!(ptr = ?record, "release of a record that is not outstanding");
            self.stats.invalid_releases.set(self.stats.invalid_releases.get() + 1);
            return;
        };
        // SAFETY: `block` came from `Box::leak` in `lend` and was just
        // removed from the live set, so it is freed exactly once.
        drop(unsafe { Box::from_raw(block.as_ptr()) });
        self.stats.released.set(self.stats.released.get() + 1);
    }
}

impl<B> Drop for LiveBlocks<B>
{
    fn drop(&mut self)
    {
        for (_, block) in self.live.get_mut().drain() {
            // SAFETY: still owned by the live set; nobody can release it
            // any more once its owner is gone.
            drop(unsafe { Box::from_raw(block.as_ptr()) });
        }
    }
}

/// Heap storage for everything nested inside one record
///
/// Values are boxed before their address is taken, so growing a store
/// never moves them.
#[derive(Default)]
pub(crate) struct TypeArena
{
    types: Vec<Box<RawTypeDesc>>,
    arrays: Vec<Box<RawArrayDesc>>,
    bounds: Vec<Box<[RawSafeArrayBound]>>,
    defaults: Vec<Box<RawParamDescEx>>,
    values: Vec<Box<RawVariant>>,
    strings: Vec<Box<str>>,
}

fn keep<T>(store: &mut Vec<Box<T>>, value: T) -> *const T
{
    store.push(Box::new(value));
    store.last().map_or(ptr::null(), |boxed| ptr::from_ref(&**boxed))
}

impl TypeArena
{
    /// Lower a type into a raw descriptor whose nested pointers live in this arena.
    pub(crate) fn type_desc(&mut self, node: &TypeNode) -> RawTypeDesc
    {
        match node {
            TypeNode::Primitive(vt) => RawTypeDesc::primitive(*vt),
            TypeNode::Pointer(inner) => {
                let raw = self.type_desc(inner);
                RawTypeDesc::indirect(VarType::PTR, keep(&mut self.types, raw))
            }
            TypeNode::SafeArray(inner) => {
                let raw = self.type_desc(inner);
                RawTypeDesc::indirect(VarType::SAFEARRAY, keep(&mut self.types, raw))
            }
            TypeNode::CArray { element, bounds } => {
                let tdesc_elem = self.type_desc(element);
                self.bounds.push(bounds.clone().into_boxed_slice());
                let rgbounds = self.bounds.last().map_or(ptr::null(), |b| b.as_ptr());
                let array = RawArrayDesc {
                    tdesc_elem,
                    c_dims: u16::try_from(bounds.len()).unwrap_or(u16::MAX),
                    rgbounds,
                };
                RawTypeDesc::c_array(keep(&mut self.arrays, array))
            }
            TypeNode::User(href) => RawTypeDesc::user_defined(*href),
        }
    }

    /// Lower a parameter or variable element.
    pub(crate) fn elem_desc(&mut self, node: &TypeNode, flags: ParamFlags, default: Option<&Constant>) -> RawElemDesc
    {
        let tdesc = self.type_desc(node);
        let pparamdescex = match default {
            Some(value) => {
                let var_default_value = self.variant(value);
                keep(&mut self.defaults, RawParamDescEx {
                    cbytes: u32::try_from(std::mem::size_of::<RawParamDescEx>()).unwrap_or(u32::MAX),
                    var_default_value,
                })
            }
            None => ptr::null(),
        };
        RawElemDesc {
            tdesc,
            paramdesc: RawParamDesc {
                pparamdescex,
                w_param_flags: flags.bits(),
            },
        }
    }

    /// Store a constant and return its address.
    pub(crate) fn value(&mut self, value: &Constant) -> *const RawVariant
    {
        let raw = self.variant(value);
        keep(&mut self.values, raw)
    }

    fn variant(&mut self, value: &Constant) -> RawVariant
    {
        let vt = value.var_type();
        let data = match value {
            Constant::Empty | Constant::Null => VariantData { llval: 0 },
            Constant::Bool(v) => VariantData { boolval: if *v { -1 } else { 0 } },
            Constant::Int(v) => VariantData { llval: *v },
            Constant::UInt(v) => VariantData { ullval: *v },
            Constant::Real(v) => VariantData { dblval: *v },
            Constant::Str(text) => {
                self.strings.push(text.clone().into_boxed_str());
                let stored = self.strings.last().map_or("", |s| &**s);
                VariantData {
                    strval: RawStr {
                        ptr: stored.as_ptr(),
                        len: stored.len(),
                    },
                }
            }
        };
        RawVariant { vt, data }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::descriptor::{TypeDesc, TypeDescKind};

    #[test]
    fn test_nested_lowering_survives_growth()
    {
        let mut arena = TypeArena::default();
        let node = TypeNode::Pointer(Box::new(TypeNode::CArray {
            element: Box::new(TypeNode::Primitive(VarType::I4)),
            bounds: vec![RawSafeArrayBound { c_elements: 3, l_lbound: 0 }],
        }));
        let raw = arena.type_desc(&node);
        // Force the stores to reallocate
        for _ in 0..64 {
            let _ = arena.type_desc(&TypeNode::Pointer(Box::new(TypeNode::Primitive(VarType::BSTR))));
        }
        // SAFETY: the arena is alive and never frees while in scope.
        let desc = unsafe { TypeDesc::from_raw(&raw) };
        assert_eq!(desc.kind(), TypeDescKind::Pointer);
        let array = desc.pointer().array();
        assert_eq!(array.count(), 1);
        assert_eq!(array.bound(0).c_elements, 3);
        assert_eq!(array.element_type().vt(), VarType::I4);
    }

    #[test]
    fn test_live_blocks_count_releases()
    {
        let stats = Rc::new(AllocationStats::default());
        let blocks = LiveBlocks::<u64>::new(Rc::clone(&stats));
        let first: NonNull<u64> = blocks.lend(Box::new(1));
        let second: NonNull<u64> = blocks.lend(Box::new(2));
        assert_eq!(stats.outstanding(), 2);

        blocks.reclaim(first);
        assert_eq!(stats.released(), 1);
        blocks.reclaim(first);
        assert_eq!(stats.invalid_releases(), 1);
        assert_eq!(stats.released(), 1);

        blocks.reclaim(second);
        assert_eq!(stats.outstanding(), 0);
    }
}
