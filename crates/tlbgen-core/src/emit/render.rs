//! C++ text of individual model entities.
//!
//! Every function returns the entity's text with `\r\n` between lines and
//! no trailing line break; the writer adds that.

use std::fmt::Write as _;

use crate::model::{Enum, Interface, Method, ModelType, Param, Record};
use crate::types::{Constant, InvokeKind, TypeKind, VarType};

/// Line terminator of every emitted file
pub const CRLF: &str = "\r\n";

/// Base class of interfaces deriving directly from `IUnknown` or `IDispatch`
const DISPATCH_BASE: &str = "tlbgen::Dispatch";

const INDENT: &str = "    ";

/// C++ spelling of a primitive automation type.
pub fn primitive(vt: VarType) -> &'static str
{
    match vt.base() {
        VarType::I1 => "int8_t",
        VarType::UI1 => "uint8_t",
        VarType::I2 => "int16_t",
        VarType::UI2 => "uint16_t",
        VarType::I4 | VarType::INT => "int32_t",
        VarType::UI4 | VarType::UINT => "uint32_t",
        VarType::I8 => "int64_t",
        VarType::UI8 => "uint64_t",
        VarType::R4 => "float",
        VarType::R8 => "double",
        VarType::CY => "CY",
        VarType::DATE => "DATE",
        VarType::BSTR => "BSTR",
        VarType::DISPATCH => "IDispatch*",
        VarType::ERROR => "SCODE",
        VarType::BOOL => "VARIANT_BOOL",
        VarType::VARIANT => "VARIANT",
        VarType::UNKNOWN => "IUnknown*",
        VarType::DECIMAL => "DECIMAL",
        VarType::HRESULT => "HRESULT",
        VarType::LPSTR => "LPSTR",
        VarType::LPWSTR => "LPWSTR",
        _ => "void",
    }
}

/// C++ type of `ty`, without the array suffix of a C array.
pub fn cpp_type(ty: &ModelType) -> String
{
    match ty {
        ModelType::Primitive(vt) => primitive(*vt).to_string(),
        ModelType::Pointer(inner) => format!("{}*", cpp_type(inner)),
        ModelType::SafeArray(_) => "SAFEARRAY*".to_string(),
        ModelType::CArray { element, .. } => cpp_type(element),
        ModelType::Named {
            name,
            kind: TypeKind::Interface | TypeKind::Dispatch,
            library: None,
        } => format!("class {name}"),
        ModelType::Named { name, .. } => name.clone(),
    }
}

/// `type name` with one `[n]` per array dimension.
pub fn declarator(ty: &ModelType, name: &str) -> String
{
    let mut text = format!("{} {name}", cpp_type(ty));
    if let ModelType::CArray { dims, .. } = ty {
        for dim in dims {
            let _ = write!(text, "[{dim}]");
        }
    }
    text
}

fn doc_line(out: &mut String, indent: &str, doc: &str)
{
    if !doc.is_empty() {
        out.push_str(&format!("{indent}// {}{CRLF}", doc.replace(['\r', '\n'], " ")));
    }
}

/// Smallest of `int32_t`, `uint32_t` and `int64_t` holding every value.
pub fn enum_base(item: &Enum) -> &'static str
{
    let within = |range: std::ops::RangeInclusive<i64>| item.values.iter().all(|v| range.contains(&v.value));
    if within(i64::from(i32::MIN)..=i64::from(i32::MAX)) {
        "int32_t"
    } else if within(0..=i64::from(u32::MAX)) {
        "uint32_t"
    } else {
        "int64_t"
    }
}

/// `enum class Name: <base> { ... };`
pub fn enum_header(item: &Enum) -> String
{
    let mut out = String::new();
    doc_line(&mut out, "", &item.doc);
    out.push_str(&format!("enum class {}: {}{CRLF}{{{CRLF}", item.name, enum_base(item)));
    for value in &item.values {
        let literal = Constant::Int(value.value).to_cpp_literal();
        out.push_str(&format!("{INDENT}{} = {literal},{CRLF}", value.name));
    }
    out.push_str("};");
    out
}

/// Forward declaration of a record.
pub fn record_forward(item: &Record) -> String
{
    format!("{} {};", item.keyword(), item.name)
}

/// Full record declaration, one field per line.
pub fn record_header(item: &Record) -> String
{
    let mut out = String::new();
    doc_line(&mut out, "", &item.doc);
    out.push_str(&format!("{} {}{CRLF}{{{CRLF}", item.keyword(), item.name));
    for field in &item.fields {
        out.push_str(&format!("{INDENT}{};{CRLF}", declarator(&field.ty, &field.name)));
    }
    out.push_str("};");
    out
}

/// Class the generated class derives from.
pub fn base_class(item: &Interface) -> &str
{
    match item.bases.first().map(String::as_str) {
        None | Some("IUnknown" | "IDispatch") => DISPATCH_BASE,
        Some(base) => base,
    }
}

/// Default argument literal, cast to the parameter's enum type when it has one.
fn default_literal(param: &Param, value: &Constant) -> String
{
    match &param.ty {
        ModelType::Named {
            name,
            kind: TypeKind::Enum,
            ..
        } => format!("static_cast<{name}>({})", value.to_cpp_literal()),
        _ => value.to_cpp_literal(),
    }
}

/// Parameter list; defaults are only written for the trailing run of
/// defaulted parameters, and only when `with_defaults` is set.
fn parameter_list(method: &Method, with_defaults: bool) -> String
{
    let trailing = method
        .params
        .iter()
        .rev()
        .take_while(|p| p.default.is_some())
        .count();
    let first_default = method.params.len() - trailing;
    method
        .params
        .iter()
        .enumerate()
        .map(|(index, param)| {
            let mut text = declarator(&param.ty, &param.name);
            match &param.default {
                Some(value) if with_defaults && index >= first_default => {
                    let _ = write!(text, " = {}", default_literal(param, value));
                }
                _ => {}
            }
            text
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Interface declaration: a class with one member function per method.
pub fn interface_header(item: &Interface) -> String
{
    let base = base_class(item);
    let mut out = String::new();
    doc_line(&mut out, "", &item.doc);
    out.push_str(&format!("class {}: public {base}{CRLF}{{{CRLF}public:{CRLF}", item.name));
    out.push_str(&format!("{INDENT}using {base}::{};{CRLF}", base.rsplit("::").next().unwrap_or(base)));
    if !item.methods.is_empty() {
        out.push_str(CRLF);
    }
    for method in &item.methods {
        doc_line(&mut out, INDENT, &method.doc);
        out.push_str(&format!(
            "{INDENT}{} {}({});{CRLF}",
            cpp_type(&method.returns),
            method.cpp_name(),
            parameter_list(method, true)
        ));
    }
    out.push_str("};");
    out
}

/// Dispatch flag constant for an invoke kind.
fn invoke_flag(invoke: InvokeKind) -> &'static str
{
    if invoke.contains(InvokeKind::PROPERTYPUTREF) {
        "tlbgen::PUTREF"
    } else if invoke.contains(InvokeKind::PROPERTYPUT) {
        "tlbgen::PUT"
    } else if invoke.contains(InvokeKind::PROPERTYGET) {
        "tlbgen::GET"
    } else {
        "tlbgen::METHOD"
    }
}

fn method_source(owner: &str, method: &Method) -> String
{
    let returns = cpp_type(&method.returns);
    #[allow(clippy::cast_sign_loss)]
    let mut call = format!("invoke<{returns}>(0x{:08X}, {}", method.id as u32, invoke_flag(method.invoke));
    for param in &method.params {
        let _ = write!(call, ", {}", param.name);
    }
    call.push(')');
    let statement = if method.returns.is_void() { call } else { format!("return {call}") };
    format!(
        "{returns} {owner}::{}({}){CRLF}{{{CRLF}{INDENT}{statement};{CRLF}}}",
        method.cpp_name(),
        parameter_list(method, false)
    )
}

/// Interface definitions: one `invoke` forwarding body per method.
pub fn interface_source(item: &Interface) -> String
{
    let mut out = format!("// {}", item.name);
    for method in &item.methods {
        out.push_str(CRLF);
        out.push_str(CRLF);
        out.push_str(&method_source(&item.name, method));
    }
    out
}

#[cfg(test)]
mod tests
{
    use smallvec::smallvec;
    use uuid::Uuid;

    use super::*;
    use crate::model::{EnumValue, Field};
    use crate::types::ParamFlags;

    fn named(name: &str, kind: TypeKind) -> ModelType
    {
        ModelType::Named {
            name: name.into(),
            kind,
            library: None,
        }
    }

    fn param(name: &str, ty: ModelType, default: Option<Constant>) -> Param
    {
        Param {
            name: name.into(),
            ty,
            flags: ParamFlags::IN,
            default,
        }
    }

    fn player() -> Interface
    {
        Interface {
            name: "IPlayer".into(),
            doc: String::new(),
            guid: Uuid::nil(),
            dual: false,
            bases: vec!["IDispatch".into()],
            methods: vec![
                Method {
                    name: "Position".into(),
                    doc: "Playback position".into(),
                    id: 3,
                    invoke: InvokeKind::PROPERTYGET,
                    returns: ModelType::Primitive(VarType::R8),
                    params: Vec::new(),
                },
                Method {
                    name: "Play".into(),
                    doc: String::new(),
                    id: 0x6002_0001,
                    invoke: InvokeKind::FUNC,
                    returns: ModelType::Primitive(VarType::VOID),
                    params: vec![
                        param("speed", ModelType::Primitive(VarType::R8), Some(Constant::Real(1.0))),
                        param("target", ModelType::Pointer(Box::new(named("IScreen", TypeKind::Dispatch))), None),
                        param("mode", named("Mode", TypeKind::Enum), Some(Constant::Int(2))),
                    ],
                },
            ],
        }
    }

    #[test]
    fn test_type_spellings()
    {
        assert_eq!(cpp_type(&ModelType::Primitive(VarType::BOOL)), "VARIANT_BOOL");
        assert_eq!(cpp_type(&ModelType::Primitive(VarType::DISPATCH)), "IDispatch*");
        let bstr_ptr = ModelType::Pointer(Box::new(ModelType::Pointer(Box::new(ModelType::Primitive(VarType::BSTR)))));
        assert_eq!(cpp_type(&bstr_ptr), "BSTR**");
        assert_eq!(cpp_type(&ModelType::SafeArray(Box::new(ModelType::Primitive(VarType::I4)))), "SAFEARRAY*");
        let grid = ModelType::CArray {
            element: Box::new(ModelType::Primitive(VarType::I2)),
            dims: smallvec![3, 4],
        };
        assert_eq!(declarator(&grid, "cells"), "int16_t cells[3][4]");
    }

    #[test]
    fn test_enum_rendering()
    {
        let item = Enum {
            name: "Mode".into(),
            doc: String::new(),
            values: vec![
                EnumValue { name: "Off".into(), value: 0 },
                EnumValue { name: "Low".into(), value: -1 },
            ],
        };
        assert_eq!(enum_header(&item), "enum class Mode: int32_t\r\n{\r\n    Off = 0,\r\n    Low = -1,\r\n};");
    }

    #[test]
    fn test_enum_base_follows_value_range()
    {
        let item = |values: &[i64]| Enum {
            name: "Mask".into(),
            doc: String::new(),
            values: values
                .iter()
                .map(|&value| EnumValue { name: format!("V{value}"), value })
                .collect(),
        };
        assert_eq!(enum_base(&item(&[])), "int32_t");
        assert_eq!(enum_base(&item(&[i64::from(i32::MIN), 0x7FFF_FFFF])), "int32_t");
        assert_eq!(enum_base(&item(&[0, 0xFFFF_FFFF])), "uint32_t");
        assert_eq!(enum_base(&item(&[-1, 0xFFFF_FFFF])), "int64_t");
        assert_eq!(enum_base(&item(&[0x1_0000_0000])), "int64_t");
        assert_eq!(
            enum_header(&item(&[1, 0xFFFF_FFFF])),
            "enum class Mask: uint32_t\r\n{\r\n    V1 = 1,\r\n    V4294967295 = 4294967295LL,\r\n};"
        );
    }

    #[test]
    fn test_interface_references()
    {
        let local = ModelType::Pointer(Box::new(named("IScreen", TypeKind::Dispatch)));
        assert_eq!(cpp_type(&local), "class IScreen*");
        let foreign = ModelType::Pointer(Box::new(ModelType::Named {
            name: "IDispatch".into(),
            kind: TypeKind::Interface,
            library: Some("stdole".into()),
        }));
        assert_eq!(declarator(&foreign, "host"), "IDispatch* host");
        assert_eq!(cpp_type(&ModelType::Pointer(Box::new(foreign))), "IDispatch**");
        assert_eq!(cpp_type(&named("Mode", TypeKind::Enum)), "Mode");
    }

    #[test]
    fn test_record_rendering()
    {
        let item = Record {
            name: "Frame".into(),
            doc: "One frame".into(),
            union: false,
            fields: vec![
                Field { name: "width".into(), ty: ModelType::Primitive(VarType::UI4) },
                Field { name: "next".into(), ty: ModelType::Pointer(Box::new(named("Frame", TypeKind::Record))) },
            ],
        };
        assert_eq!(record_forward(&item), "struct Frame;");
        assert_eq!(
            record_header(&item),
            "// One frame\r\nstruct Frame\r\n{\r\n    uint32_t width;\r\n    Frame* next;\r\n};"
        );
    }

    #[test]
    fn test_interface_header()
    {
        let text = interface_header(&player());
        let lines: Vec<_> = text.split(CRLF).collect();
        assert_eq!(lines, [
            "class IPlayer: public tlbgen::Dispatch",
            "{",
            "public:",
            "    using tlbgen::Dispatch::Dispatch;",
            "",
            "    // Playback position",
            "    double get_Position();",
            "    void Play(double speed, class IScreen* target, Mode mode = static_cast<Mode>(2));",
            "};",
        ]);
    }

    #[test]
    fn test_interface_source()
    {
        let text = interface_source(&player());
        let lines: Vec<_> = text.split(CRLF).collect();
        assert_eq!(lines, [
            "// IPlayer",
            "",
            "double IPlayer::get_Position()",
            "{",
            "    return invoke<double>(0x00000003, tlbgen::GET);",
            "}",
            "",
            "void IPlayer::Play(double speed, class IScreen* target, Mode mode)",
            "{",
            "    invoke<void>(0x60020001, tlbgen::METHOD, speed, target, mode);",
            "}",
        ]);
    }

    #[test]
    fn test_derived_interface_uses_its_base()
    {
        let mut item = player();
        item.bases = vec!["IMedia".into()];
        item.methods.clear();
        assert_eq!(interface_header(&item), "class IPlayer: public IMedia\r\n{\r\npublic:\r\n    using IMedia::IMedia;\r\n};");
        assert_eq!(interface_source(&item), "// IPlayer");
    }
}
