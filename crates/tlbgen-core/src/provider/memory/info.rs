use std::ptr::{self, NonNull};
use std::rc::Rc;

use super::arena::{AllocationStats, LiveBlocks, TypeArena};
use super::library::MemoryTypeLib;
use super::lower::{FuncSpec, TypeSpec, VarSpec};
use super::{IMPORTED, UNRESOLVED};
use crate::provider::ffi::{
    RawElemDesc, RawFuncDesc, RawGuid, RawIdlDesc, RawParamDesc, RawTypeAttr, RawTypeDesc, RawVarDesc, VarDescUnion,
};
use crate::provider::{HResult, ProviderResult, TypeInfoProvider, TypeLibProvider};
use crate::types::{
    DllEntry, Documentation, HRefType, ImplTypeFlags, InvokeKind, MemberId, ParamFlags, TypeKind, VarKind, VarType,
    MEMBERID_NIL,
};

#[repr(C)]
struct AttrBlock
{
    attr: RawTypeAttr,
    _arena: TypeArena,
}

#[repr(C)]
struct FuncBlock
{
    desc: RawFuncDesc,
    _params: Vec<RawElemDesc>,
    _scodes: Vec<i32>,
    _arena: TypeArena,
}

#[repr(C)]
struct VarBlock
{
    desc: RawVarDesc,
    _arena: TypeArena,
}

/// Member of a [`MemoryTypeLib`]
///
/// Keeps its library alive; the library only caches a weak reference back.
pub struct MemoryTypeInfo
{
    library: Rc<MemoryTypeLib>,
    index: u32,
    attrs: LiveBlocks<AttrBlock>,
    funcs: LiveBlocks<FuncBlock>,
    vars: LiveBlocks<VarBlock>,
}

impl MemoryTypeInfo
{
    pub(crate) fn new(library: Rc<MemoryTypeLib>, index: u32, stats: Rc<AllocationStats>) -> Self
    {
        Self {
            library,
            index,
            attrs: LiveBlocks::new(Rc::clone(&stats)),
            funcs: LiveBlocks::new(Rc::clone(&stats)),
            vars: LiveBlocks::new(stats),
        }
    }

    fn spec(&self) -> ProviderResult<&TypeSpec>
    {
        self.library.type_spec(self.index).ok_or(HResult::E_FAIL)
    }

    fn func_spec(&self, id: MemberId) -> Option<&FuncSpec>
    {
        self.spec().ok()?.funcs.iter().find(|f| f.id == id)
    }

    fn var_spec(&self, id: MemberId) -> Option<&VarSpec>
    {
        self.spec().ok()?.vars.iter().find(|v| v.id == id)
    }
}

// SAFETY: every record is boxed together with the storage its pointers refer
// to and stays in a live set until the matching release call reclaims it.
unsafe impl TypeInfoProvider for MemoryTypeInfo
{
    fn type_attr(&self) -> ProviderResult<NonNull<RawTypeAttr>>
    {
        let spec = self.spec()?;
        let mut arena = TypeArena::default();
        let tdesc_alias = match &spec.alias {
            Some(node) => arena.type_desc(node),
            None => RawTypeDesc::primitive(VarType::EMPTY),
        };
        let count = |len: usize| u16::try_from(len).unwrap_or(u16::MAX);
        let attr = RawTypeAttr {
            guid: RawGuid::from(spec.guid),
            lcid: spec.lcid,
            dw_reserved: 0,
            memid_constructor: MEMBERID_NIL,
            memid_destructor: MEMBERID_NIL,
            cb_size_instance: spec.size,
            typekind: spec.kind.raw(),
            c_funcs: count(spec.funcs.len()),
            c_vars: count(spec.vars.len()),
            c_impl_types: count(spec.impls.len()),
            cb_size_vft: spec.vtable_size,
            cb_alignment: spec.alignment,
            w_type_flags: spec.flags.bits(),
            w_major_ver_num: spec.version.0,
            w_minor_ver_num: spec.version.1,
            tdesc_alias,
            idldesc_type: RawIdlDesc::default(),
        };
        Ok(self.attrs.lend(Box::new(AttrBlock { attr, _arena: arena })))
    }

    unsafe fn release_type_attr(&self, attr: NonNull<RawTypeAttr>)
    {
        self.attrs.reclaim(attr);
    }

    fn func_desc(&self, index: u32) -> ProviderResult<NonNull<RawFuncDesc>>
    {
        let func = self.spec()?.funcs.get(index as usize).ok_or(HResult::E_INVALIDARG)?;
        let mut arena = TypeArena::default();
        let params: Vec<RawElemDesc> = func
            .params
            .iter()
            .map(|p| arena.elem_desc(&p.ty, p.flags, p.default.as_ref()))
            .collect();
        let scodes = func.scodes.clone();
        let desc = RawFuncDesc {
            memid: func.id,
            lprgscode: if scodes.is_empty() { ptr::null() } else { scodes.as_ptr() },
            lprgelemdesc_param: if params.is_empty() { ptr::null() } else { params.as_ptr() },
            funckind: func.kind.raw(),
            invkind: func.invoke.bits(),
            callconv: func.call_conv.raw(),
            c_params: i16::try_from(params.len()).unwrap_or(i16::MAX),
            c_params_opt: func.optional,
            o_vft: func.vtable_offset,
            c_scodes: i16::try_from(scodes.len()).unwrap_or(i16::MAX),
            elemdesc_func: arena.elem_desc(&func.returns, ParamFlags::empty(), None),
            w_func_flags: func.flags.bits(),
        };
        Ok(self.funcs.lend(Box::new(FuncBlock {
            desc,
            _params: params,
            _scodes: scodes,
            _arena: arena,
        })))
    }

    unsafe fn release_func_desc(&self, desc: NonNull<RawFuncDesc>)
    {
        self.funcs.reclaim(desc);
    }

    fn var_desc(&self, index: u32) -> ProviderResult<NonNull<RawVarDesc>>
    {
        let var = self.spec()?.vars.get(index as usize).ok_or(HResult::E_INVALIDARG)?;
        let mut arena = TypeArena::default();
        let u = match (&var.value, var.kind) {
            (Some(value), VarKind::Const) => VarDescUnion {
                lpvar_value: arena.value(value),
            },
            (None, VarKind::Const) => VarDescUnion { lpvar_value: ptr::null() },
            _ => VarDescUnion { oinst: var.offset },
        };
        let desc = RawVarDesc {
            memid: var.id,
            u,
            elemdesc_var: RawElemDesc {
                tdesc: arena.type_desc(&var.ty),
                paramdesc: RawParamDesc::none(),
            },
            w_var_flags: var.flags.bits(),
            varkind: var.kind.raw(),
        };
        Ok(self.vars.lend(Box::new(VarBlock { desc, _arena: arena })))
    }

    unsafe fn release_var_desc(&self, desc: NonNull<RawVarDesc>)
    {
        self.vars.reclaim(desc);
    }

    fn documentation(&self, member: MemberId) -> ProviderResult<Documentation>
    {
        if member == MEMBERID_NIL {
            return Ok(self.spec()?.doc.clone());
        }
        if let Some(func) = self.func_spec(member) {
            return Ok(func.doc.clone());
        }
        self.var_spec(member)
            .map(|var| var.doc.clone())
            .ok_or(HResult::TYPE_E_ELEMENTNOTFOUND)
    }

    fn names(&self, member: MemberId) -> ProviderResult<Vec<String>>
    {
        if let Some(func) = self.func_spec(member) {
            let mut names = Vec::with_capacity(func.params.len() + 1);
            names.push(func.doc.name.clone());
            // A property put's value parameter has no name of its own
            let named = if func.invoke.contains(InvokeKind::PROPERTYPUT) || func.invoke.contains(InvokeKind::PROPERTYPUTREF) {
                func.params.len().saturating_sub(1)
            } else {
                func.params.len()
            };
            names.extend(func.params.iter().take(named).map(|p| p.name.clone()));
            return Ok(names);
        }
        self.var_spec(member)
            .map(|var| vec![var.doc.name.clone()])
            .ok_or(HResult::TYPE_E_ELEMENTNOTFOUND)
    }

    fn containing_type_lib(&self) -> ProviderResult<(Rc<dyn TypeLibProvider>, u32)>
    {
        let library: Rc<dyn TypeLibProvider> = Rc::clone(&self.library) as Rc<dyn TypeLibProvider>;
        Ok((library, self.index))
    }

    fn ref_type_of_impl_type(&self, index: u32) -> ProviderResult<HRefType>
    {
        self.spec()?
            .impls
            .get(index as usize)
            .map(|(href, _)| *href)
            .ok_or(HResult::TYPE_E_ELEMENTNOTFOUND)
    }

    fn impl_type_flags(&self, index: u32) -> ProviderResult<ImplTypeFlags>
    {
        self.spec()?
            .impls
            .get(index as usize)
            .map(|(_, flags)| *flags)
            .ok_or(HResult::TYPE_E_ELEMENTNOTFOUND)
    }

    fn ref_type_info(&self, href: HRefType) -> ProviderResult<Rc<dyn TypeInfoProvider>>
    {
        if href == UNRESOLVED {
            return Err(HResult::TYPE_E_CANTLOADLIBRARY);
        }
        let info: Rc<dyn TypeInfoProvider> = if href & IMPORTED != 0 {
            let imports = self.library.imports().ok_or(HResult::TYPE_E_CANTLOADLIBRARY)?;
            imports.member(href & !IMPORTED)?
        } else {
            self.library.member(href)?
        };
        Ok(info)
    }

    fn dll_entry(&self, member: MemberId, invoke: InvokeKind) -> ProviderResult<DllEntry>
    {
        let spec = self.spec()?;
        if spec.kind != TypeKind::Module {
            return Err(HResult::TYPE_E_BADMODULEKIND);
        }
        spec.funcs
            .iter()
            .find(|f| f.id == member && f.invoke == invoke)
            .and_then(|f| f.entry.clone())
            .ok_or(HResult::TYPE_E_ELEMENTNOTFOUND)
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::provider::memory::lower::TypeNode;
    use crate::types::{Constant, FuncKind};

    const LIB: &str = r#"{
        "name": "Media",
        "guid": "11111111-2222-3333-4444-555555555555",
        "types": [
            { "name": "Mode", "kind": "enum", "variables": [ { "name": "Off" }, { "name": "On" } ] },
            { "name": "IPlayer", "kind": "dispatch", "implements": ["IDispatch"], "functions": [
                { "name": "Play", "params": [
                    { "name": "speed", "type": { "primitive": "r8" } },
                    { "name": "mode", "type": { "user": "Mode" }, "default": 1 } ] },
                { "name": "Volume", "invoke": "put", "params": [ { "name": "value", "type": { "primitive": "i4" } } ] }
            ] },
            { "name": "Native", "kind": "module", "functions": [
                { "name": "Beep", "entry": { "dll": "user32.dll" } } ] }
        ]
    }"#;

    fn member(index: u32) -> Rc<MemoryTypeInfo>
    {
        MemoryTypeLib::from_json_str(LIB).unwrap().member(index).unwrap()
    }

    #[test]
    fn test_func_desc_parameters()
    {
        let info = member(1);
        let desc = info.func_desc(0).unwrap();
        {
            // SAFETY: lent and not yet released.
            let raw = unsafe { desc.as_ref() };
            assert_eq!(raw.c_params, 2);
            assert_eq!(FuncKind::from_raw(raw.funckind), FuncKind::Dispatch);
            // SAFETY: two parameters at `lprgelemdesc_param`.
            let second = unsafe { &*raw.lprgelemdesc_param.add(1) };
            assert!(ParamFlags::from_bits(second.paramdesc.w_param_flags).contains(ParamFlags::HASDEFAULT));
            assert!(!second.paramdesc.pparamdescex.is_null());
        }
        // SAFETY: released exactly once.
        unsafe { info.release_func_desc(desc) };
        assert_eq!(info.library.stats().outstanding(), 0);
    }

    #[test]
    fn test_out_of_range_descriptors()
    {
        let info = member(1);
        assert_eq!(info.func_desc(2).unwrap_err(), HResult::E_INVALIDARG);
        assert_eq!(info.var_desc(0).unwrap_err(), HResult::E_INVALIDARG);
        assert_eq!(info.ref_type_of_impl_type(1).unwrap_err(), HResult::TYPE_E_ELEMENTNOTFOUND);
    }

    #[test]
    fn test_names_skip_put_value()
    {
        let info = member(1);
        let play = info.spec().unwrap().funcs[0].id;
        let volume = info.spec().unwrap().funcs[1].id;
        assert_eq!(info.names(play).unwrap(), ["Play", "speed", "mode"]);
        assert_eq!(info.names(volume).unwrap(), ["Volume"]);
        assert_eq!(info.names(7).unwrap_err(), HResult::TYPE_E_ELEMENTNOTFOUND);
    }

    #[test]
    fn test_references_resolve_across_libraries()
    {
        let info = member(1);
        let base = info.ref_type_of_impl_type(0).unwrap();
        assert_ne!(base & IMPORTED, 0);
        let dispatch = info.ref_type_info(base).unwrap();
        assert_eq!(dispatch.documentation(MEMBERID_NIL).unwrap().name, "IDispatch");
        let (stdole, index) = dispatch.containing_type_lib().unwrap();
        assert_eq!(index, 1);
        assert_eq!(stdole.documentation(-1).unwrap().name, "stdole");

        assert_eq!(info.spec().unwrap().funcs[0].params[1].ty, TypeNode::User(0));
        assert_eq!(info.ref_type_info(UNRESOLVED).err(), Some(HResult::TYPE_E_CANTLOADLIBRARY));
    }

    #[test]
    fn test_constant_variable()
    {
        let info = member(0);
        let desc = info.var_desc(1).unwrap();
        {
            // SAFETY: lent and not yet released.
            let raw = unsafe { desc.as_ref() };
            assert_eq!(VarKind::from_raw(raw.varkind), VarKind::Const);
            // SAFETY: constants store a value pointer.
            let value = unsafe { &*raw.u.lpvar_value };
            assert_eq!(value.vt, Constant::Int(1).var_type());
        }
        // SAFETY: released exactly once.
        unsafe { info.release_var_desc(desc) };
    }

    #[test]
    fn test_dll_entry_only_for_modules()
    {
        let native = member(2);
        let id = native.spec().unwrap().funcs[0].id;
        let entry = native.dll_entry(id, InvokeKind::FUNC).unwrap();
        assert_eq!(entry.dll_name.as_deref(), Some("user32.dll"));
        assert_eq!(entry.entry_name.as_deref(), Some("Beep"));

        let player = member(1);
        assert_eq!(player.dll_entry(id, InvokeKind::FUNC).unwrap_err(), HResult::TYPE_E_BADMODULEKIND);
    }
}
