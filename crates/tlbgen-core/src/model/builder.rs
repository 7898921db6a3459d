use tracing::{debug, trace, warn};

use super::entities::{Enum, EnumValue, Field, Interface, Method, ModelType, Param, Record, TypeLibDescription};
use super::order;
use crate::descriptor::{FuncDesc, TypeAttr, TypeDesc, TypeDescKind};
use crate::library::{TypeInfo, TypeLib, LIBRARY_DOCUMENTATION};
use crate::provider::ProviderCallError;
use crate::types::{
    FuncFlags, InvokeKind, MemberId, ParamFlags, TypeFlags, TypeKind, VarKind, VarType, MEMBERID_NIL,
};

/// What to do when one member of a library fails to decode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy
{
    /// Fail the whole library; no model is published
    #[default]
    Abort,
    /// Log a warning and leave the member out
    Skip,
}

/// Walks a [`TypeLib`] and snapshots its enums, records and interfaces.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelBuilder
{
    policy: FailurePolicy,
}

enum Entity
{
    Enum(Enum),
    Record(Record),
    Interface(Interface),
}

/// Whether members of this kind get a generated class
///
/// Classes forward calls through `IDispatch::Invoke`, so interfaces without a
/// dispatch side are left out.
fn has_dispatch(attr: &TypeAttr) -> bool
{
    match attr.kind() {
        TypeKind::Dispatch => true,
        TypeKind::Interface => attr.flags().contains(TypeFlags::DUAL),
        _ => false,
    }
}

/// `IUnknown` and `IDispatch` methods as listed by dispinterfaces
fn is_plumbing(id: MemberId) -> bool
{
    (0x6000_0000..=0x6000_0002).contains(&id) || (0x6001_0000..=0x6001_0003).contains(&id)
}

impl ModelBuilder
{
    pub fn new() -> Self
    {
        Self::default()
    }

    #[must_use]
    pub fn with_policy(policy: FailurePolicy) -> Self
    {
        Self { policy }
    }

    pub fn policy(&self) -> FailurePolicy
    {
        self.policy
    }

    /// Build the model of every member of `lib`.
    ///
    /// Enums keep index order. Records are reordered so that a record follows
    /// the records it embeds by value, and interfaces so that an interface
    /// follows its bases. Coclasses, modules, aliases and vtable-only
    /// interfaces are not part of the model and are passed over.
    ///
    /// ## Errors
    ///
    /// Returns a `ProviderCallError` if the library itself cannot be read,
    /// or, under [`FailurePolicy::Abort`], the first member failure with the
    /// member's name in its context.
    pub fn build(&self, lib: &TypeLib) -> Result<TypeLibDescription, ProviderCallError>
    {
        let doc = lib.documentation(LIBRARY_DOCUMENTATION)?;
        let attr = lib.attr()?;
        let mut description = TypeLibDescription {
            name: doc.name,
            doc: doc.doc,
            guid: attr.guid(),
            version: attr.version(),
            enums: Vec::new(),
            records: Vec::new(),
            interfaces: Vec::new(),
        };
        drop(attr);

        for index in 0..lib.count() {
            match self.member(lib, index) {
                Ok(Some(Entity::Enum(item))) => description.enums.push(item),
                Ok(Some(Entity::Record(item))) => description.records.push(item),
                Ok(Some(Entity::Interface(item))) => description.interfaces.push(item),
                Ok(None) => {}
                Err(error) if self.policy == FailurePolicy::Skip => {
                    warn!(library = %description.name, index, %error, "skipping member that failed to decode");
                }
                Err(error) => return Err(error.within(&description.name)),
            }
        }

        description.records = order::order_records(std::mem::take(&mut description.records));
        description.interfaces = order::order_interfaces(std::mem::take(&mut description.interfaces));

        let (enums, records, interfaces) = description.counts();
        debug!(library = %description.name, enums, records, interfaces, "built type library model");
        Ok(description)
    }

    fn member(&self, lib: &TypeLib, index: u32) -> Result<Option<Entity>, ProviderCallError>
    {
        let info = lib.info(index)?;
        let doc = info.documentation(MEMBERID_NIL)?;
        let attr = info.attr().map_err(|e| e.within(&doc.name))?;
        let decoder = Decoder { lib, info: &info };
        let entity = match attr.kind() {
            TypeKind::Enum => decoder.enumeration(&attr, doc.name.clone(), doc.doc).map(Entity::Enum),
            TypeKind::Record | TypeKind::Union => decoder.record(&attr, doc.name.clone(), doc.doc).map(Entity::Record),
            TypeKind::Interface | TypeKind::Dispatch if has_dispatch(&attr) => {
                decoder.interface(&attr, doc.name.clone(), doc.doc).map(Entity::Interface)
            }
            TypeKind::Interface => {
                debug!(name = %doc.name, "interface has no dispatch side; not emitted");
                return Ok(None);
            }
            other => {
                debug!(name = %doc.name, kind = %other, "member kind is not emitted");
                return Ok(None);
            }
        };
        let entity = entity.map_err(|e| e.within(&doc.name))?;
        debug!(name = %doc.name, kind = %attr.kind(), "decoded member");
        Ok(Some(entity))
    }
}

/// Decoding state for one member
struct Decoder<'a>
{
    lib: &'a TypeLib,
    info: &'a TypeInfo,
}

impl Decoder<'_>
{
    fn enumeration(&self, attr: &TypeAttr, name: String, doc: String) -> Result<Enum, ProviderCallError>
    {
        let mut values = Vec::with_capacity(usize::from(attr.variables()));
        for index in 0..attr.variables() {
            let var = self.info.var(u32::from(index))?;
            let member = self.info.documentation(var.member_id())?.name;
            if var.kind() != VarKind::Const {
                debug!(enumerator = %member, "enumerator is not a constant");
                continue;
            }
            match var.value().as_i64() {
                Some(value) => values.push(EnumValue { name: member, value }),
                None => debug!(enumerator = %member, "enumerator value is not integral"),
            }
        }
        Ok(Enum { name, doc, values })
    }

    fn record(&self, attr: &TypeAttr, name: String, doc: String) -> Result<Record, ProviderCallError>
    {
        let mut fields = Vec::with_capacity(usize::from(attr.variables()));
        for index in 0..attr.variables() {
            let var = self.info.var(u32::from(index))?;
            let field = self.info.documentation(var.member_id())?.name;
            if var.kind() == VarKind::Const {
                continue;
            }
            let ty = self.decode(var.elem().type_desc())?;
            fields.push(Field { name: field, ty });
        }
        Ok(Record {
            name,
            doc,
            union: attr.kind() == TypeKind::Union,
            fields,
        })
    }

    fn interface(&self, attr: &TypeAttr, name: String, doc: String) -> Result<Interface, ProviderCallError>
    {
        let dual = attr.flags().contains(TypeFlags::DUAL);
        let mut bases = Vec::with_capacity(usize::from(attr.interfaces()));
        for index in 0..attr.interfaces() {
            let (href, _) = self.info.impl_type(u32::from(index))?;
            bases.push(self.info.referenced_type(href)?.name()?);
        }

        let mut methods = Vec::with_capacity(usize::from(attr.functions()));
        for index in 0..attr.functions() {
            let func = self.info.func(u32::from(index))?;
            if func.flags().contains(FuncFlags::RESTRICTED) || is_plumbing(func.member_id()) {
                trace!(id = func.member_id(), "skipping restricted method");
                continue;
            }
            methods.push(self.method(&func)?);
        }

        Ok(Interface {
            name,
            doc,
            guid: attr.guid(),
            dual,
            bases,
            methods,
        })
    }

    fn method(&self, func: &FuncDesc) -> Result<Method, ProviderCallError>
    {
        let id = func.member_id();
        let doc = self.info.documentation(id)?;
        let names = self.info.names(id)?;
        let invoke = func.invoke_kind();

        let mut returns = self.decode(func.returns().type_desc())?;
        if returns == ModelType::Primitive(VarType::HRESULT) {
            returns = ModelType::Primitive(VarType::VOID);
        }

        let mut params = Vec::with_capacity(func.args());
        for (index, elem) in func.params().enumerate() {
            let param = elem.param();
            let ty = self.decode(elem.type_desc())?;
            if param.flags().contains(ParamFlags::RETVAL) {
                returns = ty.pointee().clone();
                continue;
            }
            // Property accessors share one id, and `names` answers with the
            // first function under it; a setter takes the getter's names.
            let name = names
                .get(index + 1)
                .cloned()
                .unwrap_or_else(|| unnamed_param(invoke, index));
            params.push(Param {
                name,
                ty,
                flags: param.flags(),
                default: param.has_default().then(|| param.default_value()),
            });
        }

        Ok(Method {
            name: doc.name,
            doc: doc.doc,
            id,
            invoke,
            returns,
            params,
        })
    }

    fn decode(&self, desc: TypeDesc<'_>) -> Result<ModelType, ProviderCallError>
    {
        Ok(match desc.kind() {
            TypeDescKind::Primitive => ModelType::Primitive(desc.vt().base()),
            TypeDescKind::Pointer => {
                let pointee = desc.pointer();
                match self.decode(pointee)? {
                    ModelType::Primitive(VarType::UNKNOWN) if pointee.kind() == TypeDescKind::UserDefined => {
                        ModelType::Primitive(VarType::UNKNOWN)
                    }
                    inner => ModelType::Pointer(Box::new(inner)),
                }
            }
            TypeDescKind::SafeArray => ModelType::SafeArray(Box::new(self.decode(desc.pointer())?)),
            TypeDescKind::CArray => {
                let array = desc.array();
                ModelType::CArray {
                    element: Box::new(self.decode(array.element_type())?),
                    dims: array.bounds().iter().map(|b| b.c_elements).collect(),
                }
            }
            TypeDescKind::UserDefined => self.named(desc.reference())?,
        })
    }

    /// Resolve a reference one level: name, kind and owning library only.
    ///
    /// A vtable-only interface has no generated class and resolves to
    /// `IUnknown`; a pointer to it then reads as `IUnknown*`.
    fn named(&self, href: u32) -> Result<ModelType, ProviderCallError>
    {
        let target = self.info.referenced_type(href)?;
        let name = target.name()?;
        let attr = target.attr()?;
        let kind = attr.kind();
        if kind == TypeKind::Interface && !has_dispatch(&attr) && !matches!(name.as_str(), "IUnknown" | "IDispatch") {
            trace!(href, %name, "vtable-only interface referenced as IUnknown");
            return Ok(ModelType::Primitive(VarType::UNKNOWN));
        }
        drop(attr);
        let (owner, _) = target.typelib()?;
        let library = if owner == *self.lib {
            None
        } else {
            Some(owner.documentation(LIBRARY_DOCUMENTATION)?.name)
        };
        trace!(href, %name, "resolved type reference");
        Ok(ModelType::Named { name, kind, library })
    }
}

/// Name for a parameter the provider did not name (the value of a property put).
fn unnamed_param(invoke: InvokeKind, index: usize) -> String
{
    if invoke.contains(InvokeKind::PROPERTYPUT) || invoke.contains(InvokeKind::PROPERTYPUTREF) {
        "value".to_string()
    } else {
        format!("arg{index}")
    }
}

#[cfg(test)]
mod tests
{
    use smallvec::smallvec;

    use super::*;
    use crate::provider::memory::MemoryTypeLib;
    use crate::provider::ProviderCode;
    use crate::types::Constant;

    const MEDIA: &str = r#"{
        "name": "Media",
        "guid": "0b7f3c1e-8d2a-4f5b-9c6d-1e2f3a4b5c6d",
        "types": [
            { "name": "Mode", "kind": "enum", "variables": [ { "name": "Off" }, { "name": "Loop", "value": 4 } ] },
            { "name": "Frame", "kind": "record", "variables": [
                { "name": "pixels", "type": { "c_array": { "element": { "primitive": "ui1" },
                                                           "bounds": [ { "elements": 4 }, { "elements": 2 } ] } } },
                { "name": "next", "type": { "pointer": { "user": "Frame" } } } ] },
            { "name": "IPlayer", "kind": "interface", "flags": ["dual"], "implements": ["IDispatch"], "functions": [
                { "name": "QueryInterface", "id": 1610612736 },
                { "name": "Hidden", "flags": ["restricted"] },
                { "name": "Position", "invoke": "get", "params": [
                    { "name": "pos", "type": { "pointer": { "primitive": "r8" } }, "flags": ["out", "retval"] } ] },
                { "name": "Position", "invoke": "put", "params": [ { "name": "pos", "type": { "primitive": "r8" } } ] },
                { "name": "Play", "params": [
                    { "name": "mode", "type": { "user": "Mode" }, "default": 4 },
                    { "name": "host", "type": { "user": "IDispatch" } } ] }
            ] },
            { "name": "Player", "kind": "coclass", "implements": [ { "name": "IPlayer", "flags": ["default"] } ] }
        ]
    }"#;

    fn build(json: &str, policy: FailurePolicy) -> Result<TypeLibDescription, ProviderCallError>
    {
        let lib = TypeLib::from_provider(MemoryTypeLib::from_json_str(json).unwrap());
        ModelBuilder::with_policy(policy).build(&lib)
    }

    #[test]
    fn test_builds_every_emitted_kind()
    {
        let model = build(MEDIA, FailurePolicy::Abort).unwrap();
        assert_eq!(model.name, "Media");
        assert_eq!(model.counts(), (1, 1, 1));

        let values: Vec<_> = model.enums[0].values.iter().map(|v| (v.name.as_str(), v.value)).collect();
        assert_eq!(values, [("Off", 0), ("Loop", 4)]);

        let frame = &model.records[0];
        assert!(!frame.union);
        assert_eq!(frame.fields[0].ty, ModelType::CArray {
            element: Box::new(ModelType::Primitive(VarType::UI1)),
            dims: smallvec![4, 2],
        });
        assert!(matches!(frame.fields[1].ty.pointee(), ModelType::Named { name, library: None, .. } if name == "Frame"));
    }

    #[test]
    fn test_interface_methods()
    {
        let model = build(MEDIA, FailurePolicy::Abort).unwrap();
        let player = &model.interfaces[0];
        assert!(player.dual);
        assert_eq!(player.bases, ["IDispatch"]);

        let names: Vec<_> = player.methods.iter().map(Method::cpp_name).collect();
        assert_eq!(names, ["get_Position", "put_Position", "Play"]);

        let get = &player.methods[0];
        assert_eq!(get.returns, ModelType::Primitive(VarType::R8));
        assert!(get.params.is_empty());

        let put = &player.methods[1];
        assert!(put.returns.is_void());
        assert_eq!(put.params[0].name, "pos");
        assert_eq!(put.id, get.id);

        let play = &player.methods[2];
        assert_eq!(play.params[0].default, Some(Constant::Int(4)));
        assert!(matches!(&play.params[1].ty, ModelType::Named { library: Some(lib), kind: TypeKind::Interface, .. } if lib == "stdole"));
    }

    #[test]
    fn test_vtable_interfaces_left_out()
    {
        let json = r#"{
            "name": "Engines",
            "guid": "00000000-0000-0000-0000-0000000000e0",
            "types": [
                { "name": "IGear", "kind": "interface", "implements": ["IUnknown"], "functions": [ { "name": "Turn" } ] },
                { "name": "IMotor", "kind": "dispatch", "implements": ["IDispatch"], "functions": [
                    { "name": "Fit", "params": [
                        { "name": "gear", "type": { "pointer": { "user": "IGear" } } },
                        { "name": "root", "type": { "pointer": { "user": "IUnknown" } } } ] } ] }
            ]
        }"#;
        let model = build(json, FailurePolicy::Abort).unwrap();
        assert_eq!(model.counts(), (0, 0, 1));

        let fit = &model.interfaces[0].methods[0];
        assert_eq!(fit.params[0].ty, ModelType::Primitive(VarType::UNKNOWN));
        assert!(matches!(fit.params[1].ty.pointee(), ModelType::Named { name, .. } if name == "IUnknown"));
    }

    #[test]
    fn test_records_and_interfaces_in_dependency_order()
    {
        let json = r#"{
            "name": "Ordered",
            "guid": "00000000-0000-0000-0000-0000000000d0",
            "types": [
                { "name": "IChild", "kind": "dispatch", "implements": ["IParent"] },
                { "name": "Outer", "kind": "record", "variables": [ { "name": "inner", "type": { "user": "Inner" } } ] },
                { "name": "IParent", "kind": "dispatch", "implements": ["IDispatch"] },
                { "name": "Inner", "kind": "record", "variables": [ { "name": "x", "type": { "primitive": "i2" } } ] }
            ]
        }"#;
        let model = build(json, FailurePolicy::Abort).unwrap();
        let records: Vec<_> = model.records.iter().map(|r| r.name.as_str()).collect();
        let interfaces: Vec<_> = model.interfaces.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(records, ["Inner", "Outer"]);
        assert_eq!(interfaces, ["IParent", "IChild"]);
    }

    #[test]
    fn test_member_failure_policies()
    {
        let json = r#"{
            "name": "Broken",
            "guid": "00000000-0000-0000-0000-0000000000b0",
            "types": [
                { "name": "Good", "kind": "enum", "variables": [ { "name": "A" } ] },
                { "name": "Bad", "kind": "record", "variables": [ { "name": "x", "type": { "user": "Nowhere" } } ] }
            ]
        }"#;

        let error = build(json, FailurePolicy::Abort).unwrap_err();
        assert_eq!(error.operation, "GetRefTypeInfo");
        assert_eq!(error.reason, ProviderCode::CantLoadLibrary);
        assert!(error.context.starts_with("Broken: Bad"));

        let model = build(json, FailurePolicy::Skip).unwrap();
        assert_eq!(model.counts(), (1, 0, 0));
    }

    #[test]
    fn test_plumbing_ids()
    {
        assert!(is_plumbing(0x6000_0001));
        assert!(is_plumbing(0x6001_0003));
        assert!(!is_plumbing(0x6002_0000));
        assert_eq!(unnamed_param(InvokeKind::FUNC, 2), "arg2");
    }
}
