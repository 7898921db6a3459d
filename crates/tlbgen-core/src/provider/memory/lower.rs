//! Validation and lowering of manifests into provider-ready specs.

use std::collections::HashMap;

use tracing::debug;
use uuid::Uuid;

use super::manifest::{FunctionManifest, LibraryManifest, ManifestError, TypeExpr, TypeManifest, VariableManifest};
use super::{MemoryTypeLib, IMPORTED, UNRESOLVED};
use crate::provider::ffi::RawSafeArrayBound;
use crate::types::{
    CallConv, Constant, DllEntry, Documentation, FuncFlags, FuncKind, HRefType, ImplTypeFlags, InvokeKind, LibFlags,
    MemberId, ParamFlags, SysKind, TypeFlags, TypeKind, VarFlags, VarKind, VarType,
};

/// Default member id of the first function without an explicit id
const FIRST_FUNC_ID: MemberId = 0x6002_0000;
/// Default member id of the first variable without an explicit id
const FIRST_VAR_ID: MemberId = 0x4000_0000;

/// A type expression with names resolved to references
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TypeNode
{
    Primitive(VarType),
    Pointer(Box<TypeNode>),
    SafeArray(Box<TypeNode>),
    CArray
    {
        element: Box<TypeNode>,
        bounds: Vec<RawSafeArrayBound>,
    },
    User(HRefType),
}

pub(crate) struct LibrarySpec
{
    pub doc: Documentation,
    pub guid: Uuid,
    pub lcid: u32,
    pub syskind: SysKind,
    pub version: (u16, u16),
    pub flags: LibFlags,
    pub types: Vec<TypeSpec>,
}

pub(crate) struct TypeSpec
{
    pub doc: Documentation,
    pub kind: TypeKind,
    pub guid: Uuid,
    pub lcid: u32,
    pub version: (u16, u16),
    pub flags: TypeFlags,
    pub size: u32,
    pub alignment: u16,
    pub vtable_size: u16,
    pub alias: Option<TypeNode>,
    pub vars: Vec<VarSpec>,
    pub funcs: Vec<FuncSpec>,
    pub impls: Vec<(HRefType, ImplTypeFlags)>,
}

pub(crate) struct VarSpec
{
    pub id: MemberId,
    pub doc: Documentation,
    pub kind: VarKind,
    pub flags: VarFlags,
    pub ty: TypeNode,
    pub value: Option<Constant>,
    pub offset: u32,
}

pub(crate) struct FuncSpec
{
    pub id: MemberId,
    pub doc: Documentation,
    pub invoke: InvokeKind,
    pub kind: FuncKind,
    pub call_conv: CallConv,
    pub flags: FuncFlags,
    pub params: Vec<ParamSpec>,
    pub returns: TypeNode,
    pub scodes: Vec<i32>,
    pub optional: i16,
    pub vtable_offset: i16,
    pub entry: Option<DllEntry>,
}

pub(crate) struct ParamSpec
{
    pub name: String,
    pub ty: TypeNode,
    pub flags: ParamFlags,
    pub default: Option<Constant>,
}

/// Resolves type names to references
struct Resolver<'a>
{
    local: HashMap<&'a str, u32>,
    kinds: Vec<TypeKind>,
    imports: Option<&'a MemoryTypeLib>,
}

impl Resolver<'_>
{
    fn href(&self, name: &str) -> HRefType
    {
        if let Some(index) = self.local.get(name) {
            return *index;
        }
        if let Some(index) = self.imports.and_then(|lib| lib.index_of(name)) {
            return IMPORTED | index;
        }
        debug!(name, "type name does not resolve; reference left dangling");
        UNRESOLVED
    }

    fn node(&self, expr: &TypeExpr, owner: &str) -> Result<TypeNode, ManifestError>
    {
        Ok(match expr {
            TypeExpr::Primitive(name) => {
                TypeNode::Primitive(VarType::from_name(name).ok_or_else(|| ManifestError::UnknownPrimitive {
                    owner: owner.to_string(),
                    name: name.clone(),
                })?)
            }
            TypeExpr::Pointer(inner) => TypeNode::Pointer(Box::new(self.node(inner, owner)?)),
            TypeExpr::SafeArray(inner) => TypeNode::SafeArray(Box::new(self.node(inner, owner)?)),
            TypeExpr::CArray { element, bounds } => {
                if bounds.is_empty() {
                    return Err(ManifestError::EmptyArray { owner: owner.to_string() });
                }
                if bounds.len() > usize::from(u16::MAX) {
                    return Err(ManifestError::TooMany {
                        owner: owner.to_string(),
                        what: "array dimensions",
                    });
                }
                TypeNode::CArray {
                    element: Box::new(self.node(element, owner)?),
                    bounds: bounds
                        .iter()
                        .map(|b| RawSafeArrayBound {
                            c_elements: b.elements,
                            l_lbound: b.lower,
                        })
                        .collect(),
                }
            }
            TypeExpr::User(name) => TypeNode::User(self.href(name)),
        })
    }

    /// Layout of a value of this type as `(size, alignment)`.
    fn layout(&self, node: &TypeNode, pointer: u32, sizes: &HashMap<u32, (u32, u16)>) -> (u32, u16)
    {
        match node {
            TypeNode::Primitive(vt) => primitive_layout(*vt, pointer),
            TypeNode::Pointer(_) | TypeNode::SafeArray(_) => (pointer, pointer_alignment(pointer)),
            TypeNode::CArray { element, bounds } => {
                let (size, alignment) = self.layout(element, pointer, sizes);
                let count = bounds.iter().fold(1_u32, |acc, b| acc.saturating_mul(b.c_elements));
                (size.saturating_mul(count), alignment)
            }
            TypeNode::User(href) if *href & IMPORTED == 0 && *href != UNRESOLVED => {
                match self.kinds.get(*href as usize) {
                    Some(TypeKind::Enum) => (4, 4),
                    Some(TypeKind::Record | TypeKind::Union) => sizes.get(href).copied().unwrap_or((0, 1)),
                    _ => (pointer, pointer_alignment(pointer)),
                }
            }
            TypeNode::User(_) => (pointer, pointer_alignment(pointer)),
        }
    }
}

fn pointer_alignment(pointer: u32) -> u16
{
    if pointer == 8 { 8 } else { 4 }
}

fn primitive_layout(vt: VarType, pointer: u32) -> (u32, u16)
{
    match vt.base() {
        VarType::I1 | VarType::UI1 => (1, 1),
        VarType::I2 | VarType::UI2 | VarType::BOOL => (2, 2),
        VarType::I4 | VarType::UI4 | VarType::INT | VarType::UINT | VarType::R4 | VarType::ERROR | VarType::HRESULT => {
            (4, 4)
        }
        VarType::I8 | VarType::UI8 | VarType::R8 | VarType::CY | VarType::DATE => (8, 8),
        VarType::VARIANT => (if pointer == 8 { 24 } else { 16 }, 8),
        VarType::DECIMAL => (16, 8),
        VarType::VOID | VarType::EMPTY | VarType::NULL => (0, 1),
        _ => (pointer, pointer_alignment(pointer)),
    }
}

fn round_up(value: u32, alignment: u16) -> u32
{
    let alignment = u32::from(alignment.max(1));
    value.div_ceil(alignment).saturating_mul(alignment)
}

fn flags_of<T, F>(names: &[String], owner: &str, parse: F) -> Result<T, ManifestError>
where
    F: Fn(&[String]) -> Result<T, &str>,
{
    parse(names).map_err(|flag| ManifestError::UnknownFlag {
        owner: owner.to_string(),
        flag: flag.to_string(),
    })
}

fn count_of(len: usize, owner: &str, what: &'static str) -> Result<u16, ManifestError>
{
    u16::try_from(len).map_err(|_| ManifestError::TooMany {
        owner: owner.to_string(),
        what,
    })
}

/// Validate `manifest` and lower it against the types of `imports`.
pub(crate) fn lower_library(manifest: &LibraryManifest, imports: Option<&MemoryTypeLib>) -> Result<LibrarySpec, ManifestError>
{
    let mut local = HashMap::new();
    for (index, ty) in manifest.types.iter().enumerate() {
        let index = u32::try_from(index).map_err(|_| ManifestError::TooMany {
            owner: manifest.name.clone(),
            what: "types",
        })?;
        if local.insert(ty.name.as_str(), index).is_some() {
            return Err(ManifestError::DuplicateType(ty.name.clone()));
        }
    }
    let resolver = Resolver {
        local,
        kinds: manifest.types.iter().map(|ty| ty.kind).collect(),
        imports,
    };
    let pointer = if manifest.syskind == SysKind::Win64 { 8 } else { 4 };

    let mut types: Vec<Option<TypeSpec>> = (0..manifest.types.len()).map(|_| None).collect();
    let mut sizes = HashMap::new();
    // Records embedded by value must be laid out before their containers.
    for index in layout_order(manifest, &resolver) {
        let spec = lower_type(&manifest.types[index], manifest, &resolver, pointer, &sizes)?;
        if matches!(spec.kind, TypeKind::Record | TypeKind::Union) {
            let key = u32::try_from(index).unwrap_or(UNRESOLVED);
            sizes.insert(key, (spec.size, spec.alignment));
        }
        types[index] = Some(spec);
    }

    Ok(LibrarySpec {
        doc: Documentation {
            name: manifest.name.clone(),
            doc: manifest.doc.clone(),
            help_context: manifest.help_context,
            help_file: manifest.help_file.clone(),
        },
        guid: manifest.guid,
        lcid: manifest.lcid,
        syskind: manifest.syskind,
        version: (manifest.version.major, manifest.version.minor),
        flags: flags_of(&manifest.flags, &manifest.name, |n| LibFlags::from_names(n))?,
        types: types.into_iter().flatten().collect(),
    })
}

/// Type indices ordered so that a record follows every record it embeds by
/// value. Cycles (only possible in malformed input) fall back to declaration
/// order.
fn layout_order(manifest: &LibraryManifest, resolver: &Resolver<'_>) -> Vec<usize>
{
    fn embedded(expr: &TypeExpr, resolver: &Resolver<'_>, out: &mut Vec<usize>)
    {
        match expr {
            TypeExpr::User(name) => {
                if let Some(index) = resolver.local.get(name.as_str()) {
                    out.push(*index as usize);
                }
            }
            TypeExpr::CArray { element, .. } => embedded(element, resolver, out),
            TypeExpr::Primitive(_) | TypeExpr::Pointer(_) | TypeExpr::SafeArray(_) => {}
        }
    }

    fn visit(index: usize, manifest: &LibraryManifest, resolver: &Resolver<'_>, state: &mut [u8], order: &mut Vec<usize>)
    {
        if state[index] != 0 {
            return;
        }
        state[index] = 1;
        let mut deps = Vec::new();
        for var in &manifest.types[index].variables {
            if let Some(ty) = &var.ty {
                embedded(ty, resolver, &mut deps);
            }
        }
        for dep in deps {
            visit(dep, manifest, resolver, state, order);
        }
        state[index] = 2;
        order.push(index);
    }

    let mut state = vec![0_u8; manifest.types.len()];
    let mut order = Vec::with_capacity(manifest.types.len());
    for index in 0..manifest.types.len() {
        visit(index, manifest, resolver, &mut state, &mut order);
    }
    order
}

fn lower_type(
    ty: &TypeManifest,
    library: &LibraryManifest,
    resolver: &Resolver<'_>,
    pointer: u32,
    sizes: &HashMap<u32, (u32, u16)>,
) -> Result<TypeSpec, ManifestError>
{
    let owner = ty.name.as_str();
    let mut flags = flags_of(&ty.flags, owner, |n| TypeFlags::from_names(n))?;

    let mut impls = Vec::with_capacity(ty.implements.len());
    for base in &ty.implements {
        let impl_flags = flags_of(base.flags(), owner, |n| ImplTypeFlags::from_names(n))?;
        impls.push((resolver.href(base.name()), impl_flags));
    }
    let derives_dispatch = ty.implements.iter().any(|base| base.name() == "IDispatch");
    if ty.kind == TypeKind::Dispatch || derives_dispatch {
        flags |= TypeFlags::DISPATCHABLE;
    }

    let vars = lower_variables(ty, resolver, pointer, sizes)?;
    let (size, alignment) = match ty.kind {
        TypeKind::Record => {
            let alignment = vars
                .iter()
                .map(|v| resolver.layout(&v.ty, pointer, sizes).1)
                .max()
                .unwrap_or(1);
            let end = vars
                .iter()
                .map(|v| v.offset + resolver.layout(&v.ty, pointer, sizes).0)
                .max()
                .unwrap_or(0);
            (round_up(end, alignment), alignment)
        }
        TypeKind::Union => {
            let (size, alignment) = vars
                .iter()
                .map(|v| resolver.layout(&v.ty, pointer, sizes))
                .fold((0, 1), |(s, a), (vs, va)| (s.max(vs), a.max(va)));
            (round_up(size, alignment), alignment)
        }
        TypeKind::Enum => (4, 4),
        _ => (pointer, pointer_alignment(pointer)),
    };

    // Slots taken by IUnknown (3) or IDispatch (7) ahead of the type's own functions
    let inherited_slots: u16 = match ty.implements.first().map(|b| b.name()) {
        None => 0,
        Some("IUnknown") => 3,
        Some(_) => 7,
    };
    let funcs = lower_functions(ty, resolver, inherited_slots, pointer)?;
    let slots = inherited_slots.saturating_add(count_of(funcs.len(), owner, "functions")?);
    #[allow(clippy::cast_possible_truncation)]
    let vtable_size = if ty.kind.is_interface() { slots.saturating_mul(pointer as u16) } else { 0 };

    let alias = match (&ty.alias, ty.kind) {
        (Some(expr), _) => Some(resolver.node(expr, owner)?),
        (None, TypeKind::Alias) => return Err(ManifestError::MissingType { owner: owner.to_string() }),
        (None, _) => None,
    };

    count_of(vars.len(), owner, "variables")?;
    count_of(impls.len(), owner, "implemented types")?;

    Ok(TypeSpec {
        doc: Documentation {
            name: ty.name.clone(),
            doc: ty.doc.clone(),
            help_context: ty.help_context,
            help_file: library.help_file.clone(),
        },
        kind: ty.kind,
        guid: ty.guid.unwrap_or_default(),
        lcid: library.lcid,
        version: (ty.version.major, ty.version.minor),
        flags,
        size,
        alignment,
        vtable_size,
        alias,
        vars,
        funcs,
        impls,
    })
}

fn lower_variables(
    ty: &TypeManifest,
    resolver: &Resolver<'_>,
    pointer: u32,
    sizes: &HashMap<u32, (u32, u16)>,
) -> Result<Vec<VarSpec>, ManifestError>
{
    let mut vars = Vec::with_capacity(ty.variables.len());
    let mut next_enum_value = 0_i64;
    let mut offset = 0_u32;
    for (index, var) in ty.variables.iter().enumerate() {
        let owner = format!("{}.{}", ty.name, var.name);
        let value = match (&var.value, ty.kind) {
            (Some(value), _) => Some(value.clone()),
            (None, TypeKind::Enum) => Some(Constant::Int(next_enum_value)),
            (None, _) => None,
        };
        if let Some(v) = value.as_ref().and_then(Constant::as_i64) {
            next_enum_value = v.saturating_add(1);
        }
        let kind = var.kind.unwrap_or(match (ty.kind, &value) {
            (_, Some(_)) => VarKind::Const,
            (TypeKind::Dispatch, None) => VarKind::Dispatch,
            (_, None) => VarKind::PerInstance,
        });
        let ty_node = variable_type(var, ty.kind, &value, resolver, &owner)?;

        let var_offset = match (ty.kind, kind) {
            (TypeKind::Record, VarKind::PerInstance) => {
                let (size, alignment) = resolver.layout(&ty_node, pointer, sizes);
                let start = round_up(offset, alignment);
                offset = start.saturating_add(size);
                start
            }
            _ => 0,
        };

        vars.push(VarSpec {
            id: var.id.unwrap_or(FIRST_VAR_ID + i32::try_from(index).unwrap_or(0)),
            doc: Documentation {
                name: var.name.clone(),
                doc: var.doc.clone(),
                ..Documentation::default()
            },
            kind,
            flags: flags_of(&var.flags, &owner, |n| VarFlags::from_names(n))?,
            ty: ty_node,
            value,
            offset: var_offset,
        });
    }
    Ok(vars)
}

fn variable_type(
    var: &VariableManifest,
    kind: TypeKind,
    value: &Option<Constant>,
    resolver: &Resolver<'_>,
    owner: &str,
) -> Result<TypeNode, ManifestError>
{
    match (&var.ty, kind, value) {
        (Some(expr), _, _) => resolver.node(expr, owner),
        (None, TypeKind::Enum, _) => Ok(TypeNode::Primitive(VarType::I4)),
        (None, _, Some(value)) => Ok(TypeNode::Primitive(value.var_type())),
        (None, _, None) => Err(ManifestError::MissingType { owner: owner.to_string() }),
    }
}

fn lower_functions(
    ty: &TypeManifest,
    resolver: &Resolver<'_>,
    inherited_slots: u16,
    pointer: u32,
) -> Result<Vec<FuncSpec>, ManifestError>
{
    let mut funcs: Vec<FuncSpec> = Vec::with_capacity(ty.functions.len());
    for (index, func) in ty.functions.iter().enumerate() {
        let owner = format!("{}.{}", ty.name, func.name);
        let id = func.id.unwrap_or_else(|| {
            funcs
                .iter()
                .find(|f| f.doc.name == func.name)
                .map_or(FIRST_FUNC_ID + i32::try_from(index).unwrap_or(0), |f| f.id)
        });
        let slot = inherited_slots.saturating_add(u16::try_from(index).unwrap_or(u16::MAX));
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let vtable_offset = if ty.kind.is_interface() { (slot.saturating_mul(pointer as u16)) as i16 } else { 0 };
        funcs.push(lower_function(func, ty.kind, id, vtable_offset, resolver, &owner)?);
    }
    Ok(funcs)
}

fn lower_function(
    func: &FunctionManifest,
    type_kind: TypeKind,
    id: MemberId,
    vtable_offset: i16,
    resolver: &Resolver<'_>,
    owner: &str,
) -> Result<FuncSpec, ManifestError>
{
    let invoke = match &func.invoke {
        Some(name) => InvokeKind::from_name(name).ok_or_else(|| ManifestError::UnknownInvokeKind {
            owner: owner.to_string(),
            name: name.clone(),
        })?,
        None => InvokeKind::FUNC,
    };

    let mut params = Vec::with_capacity(func.params.len());
    for param in &func.params {
        let param_owner = format!("{owner}({})", param.name);
        let mut flags = flags_of(&param.flags, &param_owner, |n| ParamFlags::from_names(n))?;
        if flags.contains(ParamFlags::RETVAL) {
            flags |= ParamFlags::OUT;
        }
        if param.default.is_some() {
            flags |= ParamFlags::HASDEFAULT | ParamFlags::OPT;
        }
        if !flags.contains(ParamFlags::IN) && !flags.contains(ParamFlags::OUT) {
            flags |= ParamFlags::IN;
        }
        params.push(ParamSpec {
            name: param.name.clone(),
            ty: resolver.node(&param.ty, &param_owner)?,
            flags,
            default: param.default.clone(),
        });
    }
    let optional = params
        .iter()
        .filter(|p| p.flags.contains(ParamFlags::OPT) && !p.flags.contains(ParamFlags::HASDEFAULT))
        .count();

    let returns = match &func.returns {
        Some(expr) => resolver.node(expr, owner)?,
        None if type_kind == TypeKind::Interface => TypeNode::Primitive(VarType::HRESULT),
        None => TypeNode::Primitive(VarType::VOID),
    };

    let default_kind = match type_kind {
        TypeKind::Dispatch => FuncKind::Dispatch,
        TypeKind::Module => FuncKind::Static,
        _ => FuncKind::PureVirtual,
    };

    count_of(params.len(), owner, "parameters")?;
    if func.scodes.len() > i16::MAX as usize {
        return Err(ManifestError::TooMany {
            owner: owner.to_string(),
            what: "status codes",
        });
    }

    Ok(FuncSpec {
        id,
        doc: Documentation {
            name: func.name.clone(),
            doc: func.doc.clone(),
            ..Documentation::default()
        },
        invoke,
        kind: func.kind.unwrap_or(default_kind),
        call_conv: func.call_conv.unwrap_or(CallConv::StdCall),
        flags: flags_of(&func.flags, owner, |n| FuncFlags::from_names(n))?,
        params,
        returns,
        scodes: func.scodes.clone(),
        optional: i16::try_from(optional).unwrap_or(i16::MAX),
        vtable_offset,
        entry: func.entry.as_ref().map(|entry| DllEntry {
            dll_name: Some(entry.dll.clone()),
            entry_name: entry.name.clone().or_else(|| (entry.ordinal == 0).then(|| func.name.clone())),
            ordinal: entry.ordinal,
        }),
    })
}
