//! End-to-end tests: manifest → model → emitted files

use std::fs;
use std::path::Path;

use serde_json::json;
use tlbgen_core::emit::{render_definition_header, EmitOptions, EmptySections, BANNER};
use tlbgen_core::generator::{Generator, GeneratorOptions};
use tlbgen_core::model::{FailurePolicy, ModelBuilder};
use tlbgen_core::provider::memory::MemoryTypeLib;
use tlbgen_core::{TlbError, TypeLib};

fn library(manifest: &serde_json::Value) -> TypeLib
{
    TypeLib::from_provider(MemoryTypeLib::from_json_str(&manifest.to_string()).unwrap())
}

/// `enums` enums, `records` records and `interfaces` dispatch interfaces
fn counted(enums: usize, records: usize, interfaces: usize) -> serde_json::Value
{
    let mut types = Vec::new();
    for i in 0..enums {
        types.push(json!({ "name": format!("Enum{i}"), "kind": "enum", "variables": [ { "name": format!("E{i}Zero") } ] }));
    }
    for i in 0..records {
        types.push(json!({ "name": format!("Rec{i}"), "kind": "record",
                           "variables": [ { "name": "size", "type": { "primitive": "ui4" } } ] }));
    }
    for i in 0..interfaces {
        types.push(json!({ "name": format!("IFace{i}"), "kind": "dispatch", "implements": ["IDispatch"],
                           "functions": [ { "name": "Run" } ] }));
    }
    json!({ "name": "Counted", "guid": "3f2504e0-4f89-11d3-9a0c-0305e82c3301", "types": types })
}

fn lines(path: &Path) -> Vec<String>
{
    let text = fs::read_to_string(path).unwrap();
    assert!(!text.replace("\r\n", "").contains('\n'), "bare line feed in {}", path.display());
    text.split("\r\n").map(str::to_owned).collect()
}

fn count(lines: &[String], pred: impl Fn(&str) -> bool) -> usize
{
    lines.iter().filter(|l| pred(l)).count()
}

#[test]
fn test_empty_library_header()
{
    let lib = library(&json!({ "name": "Nothing", "guid": "00000000-0000-0000-0000-000000000001" }));
    let model = ModelBuilder::new().build(&lib).unwrap();
    let header = render_definition_header(&model, EmitOptions::default());

    let expected = format!(
        "{BANNER}#include <tlbgen.hpp>\r\n\r\n\
         // ENUMS\r\n// -----\r\n\r\n\r\n\
         // FORWARD\r\n// -------\r\n\r\n\r\n\
         // STRUCTS\r\n// -------\r\n\r\n\r\n\
         // INTERFACES\r\n// ----------\r\n\r\n\r\n"
    );
    assert_eq!(header, expected);

    let suppressed = render_definition_header(&model, EmitOptions {
        sections: EmptySections::Suppress,
    });
    assert_eq!(suppressed, format!("{BANNER}#include <tlbgen.hpp>\r\n\r\n"));
}

#[test]
fn test_entity_counts_survive_emission()
{
    let (n, m, k) = (3, 2, 4);
    let out = tempfile::tempdir().unwrap();
    let lib = library(&counted(n, m, k));
    let files = Generator::new(GeneratorOptions::default()).generate(&lib, out.path()).unwrap();
    assert_eq!(files.headers.len(), 2);
    assert_eq!(files.sources.len(), 1);

    let id = "3F2504E0-4F89-11D3-9A0C-0305E82C3301";
    assert_eq!(files.headers[0], out.path().join("Counted.hpp"));
    assert_eq!(files.headers[1], out.path().join(format!("{id}.hpp")));

    let import = lines(&files.headers[0]);
    assert!(import.contains(&format!("#include \"{id}.hpp\"")));

    let header = lines(&files.headers[1]);
    assert_eq!(count(&header, |l| l.starts_with("enum class Enum")), n);
    assert_eq!(count(&header, |l| l.starts_with("struct Rec") && l.ends_with(';')), m);
    assert_eq!(count(&header, |l| l.starts_with("struct Rec") && !l.ends_with(';')), m);
    assert_eq!(count(&header, |l| l.starts_with("class IFace")), k);

    let source = lines(&files.sources[0]);
    assert_eq!(count(&source, |l| l.starts_with("// IFace")), k);
    assert!(source.contains(&format!("#include \"{id}.hpp\"")));
}

#[test]
fn test_generation_is_repeatable()
{
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    let generator = Generator::new(GeneratorOptions::default());
    let a = generator.generate(&library(&counted(2, 2, 2)), first.path()).unwrap();
    let b = generator.generate(&library(&counted(2, 2, 2)), second.path()).unwrap();

    for (left, right) in a.iter().zip(b.iter()) {
        assert_eq!(left.file_name(), right.file_name());
        assert_eq!(fs::read(left).unwrap(), fs::read(right).unwrap());
    }
}

#[test]
fn test_failed_member_policy()
{
    let manifest = json!({
        "name": "Partial",
        "guid": "00000000-0000-0000-0000-0000000000c1",
        "types": [
            { "name": "Fine", "kind": "enum", "variables": [ { "name": "A" } ] },
            { "name": "IBroken", "kind": "dispatch", "implements": ["IDispatch"], "functions": [
                { "name": "Take", "params": [ { "name": "it", "type": { "user": "Missing" } } ] } ] }
        ]
    });
    let out = tempfile::tempdir().unwrap();

    let error = Generator::new(GeneratorOptions::default())
        .generate(&library(&manifest), out.path())
        .unwrap_err();
    assert!(error.is_provider_error());
    assert!(matches!(&error, TlbError::ProviderCall(e) if e.context.starts_with("Partial: IBroken")));
    assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);

    let options = GeneratorOptions {
        on_member_error: FailurePolicy::Skip,
        ..GeneratorOptions::default()
    };
    let files = Generator::new(options).generate(&library(&manifest), out.path()).unwrap();
    let header = fs::read_to_string(&files.headers[1]).unwrap();
    assert!(header.contains("enum class Fine"));
    assert!(!header.contains("IBroken"));
}

#[test]
fn test_demo_library_bindings()
{
    let lib = TypeLib::from_provider(MemoryTypeLib::from_json_str(include_str!("../../../demos/media.json")).unwrap());
    let out = tempfile::tempdir().unwrap();
    let files = Generator::new(GeneratorOptions::default()).generate(&lib, out.path()).unwrap();
    assert_eq!(files.headers[0], out.path().join("MediaLib.hpp"));

    let header = lines(&files.headers[1]);
    for expected in [
        "// How playback continues at the end of a track",
        "enum class PlayMode: int32_t",
        "    Shuffle = 8,",
        "struct Frame;",
        "    uint8_t palette[16][3];",
        "    Frame* next;",
        "class IPlayer: public tlbgen::Dispatch",
        "    using tlbgen::Dispatch::Dispatch;",
        "    int32_t get_Volume();",
        "    void put_Volume(int32_t level);",
        "    void Open(BSTR path, PlayMode mode = static_cast<PlayMode>(1));",
        "    Frame Snapshot();",
    ] {
        assert!(header.iter().any(|l| l == expected), "missing {expected:?}");
    }

    let source = lines(&files.sources[0]);
    for expected in [
        "int32_t IPlayer::get_Volume()",
        "    return invoke<int32_t>(0x60020000, tlbgen::GET);",
        "    invoke<void>(0x60020000, tlbgen::PUT, level);",
        "void IPlayer::Open(BSTR path, PlayMode mode)",
        "    invoke<void>(0x60020002, tlbgen::METHOD, path, mode);",
    ] {
        assert!(source.iter().any(|l| l == expected), "missing {expected:?}");
    }
}

const LAYOUT: &str = r#"{
    "name": "Layout",
    "guid": "6d1c2b3a-9e8f-4a7b-8c6d-5e4f3a2b1c0d",
    "types": [
        { "name": "Outer", "kind": "record", "variables": [
            { "name": "inner", "type": { "user": "Inner" } },
            { "name": "cells", "type": { "c_array": { "element": { "user": "Inner" }, "bounds": [ { "elements": 2 } ] } } },
            { "name": "link", "type": { "pointer": { "user": "Outer" } } } ] },
        { "name": "Inner", "kind": "record", "variables": [ { "name": "x", "type": { "primitive": "i4" } } ] },
        { "name": "Mask", "kind": "enum", "variables": [ { "name": "None", "value": 0 }, { "name": "All", "value": 4294967295 } ] },
        { "name": "IViewer", "kind": "interface", "flags": ["dual"], "implements": ["IBase"], "functions": [
            { "name": "Attach", "params": [
                { "name": "host", "type": { "pointer": { "user": "IDispatch" } } },
                { "name": "raw", "type": { "pointer": { "user": "IEngine" } } },
                { "name": "names", "type": { "pointer": { "pointer": { "primitive": "bstr" } } } },
                { "name": "base", "type": { "pointer": { "user": "IBase" } } } ] } ] },
        { "name": "IBase", "kind": "interface", "flags": ["dual"], "implements": ["IDispatch"], "functions": [
            { "name": "Reset" } ] },
        { "name": "IEngine", "kind": "interface", "implements": ["IUnknown"], "functions": [
            { "name": "Spin", "params": [ { "name": "rpm", "type": { "primitive": "i4" } } ] } ] }
    ]
}"#;

fn layout_files() -> (String, String)
{
    let lib = TypeLib::from_provider(MemoryTypeLib::from_json_str(LAYOUT).unwrap());
    let out = tempfile::tempdir().unwrap();
    let files = Generator::new(GeneratorOptions::default()).generate(&lib, out.path()).unwrap();
    let header = fs::read_to_string(&files.headers[1]).unwrap();
    let source = fs::read_to_string(&files.sources[0]).unwrap();
    (header, source)
}

#[test]
fn test_embedded_record_declared_first()
{
    let (header, _) = layout_files();
    let forward = "// FORWARD\r\n// -------\r\n\r\nstruct Inner;\r\nstruct Outer;\r\n\r\n";
    let structs = concat!(
        "// STRUCTS\r\n// -------\r\n\r\n",
        "struct Inner\r\n{\r\n    int32_t x;\r\n};\r\n",
        "struct Outer\r\n{\r\n    Inner inner;\r\n    Inner cells[2];\r\n    Outer* link;\r\n};\r\n",
        "\r\n",
    );
    assert!(header.contains(forward), "{header}");
    assert!(header.contains(structs), "{header}");
}

#[test]
fn test_unsigned_enum_values()
{
    let (header, _) = layout_files();
    let mask = "enum class Mask: uint32_t\r\n{\r\n    None = 0,\r\n    All = 4294967295LL,\r\n};\r\n";
    assert!(header.contains(mask), "{header}");
}

#[test]
fn test_interface_references()
{
    let (header, source) = layout_files();
    let classes = concat!(
        "// INTERFACES\r\n// ----------\r\n\r\n",
        "class IBase: public tlbgen::Dispatch\r\n{\r\npublic:\r\n    using tlbgen::Dispatch::Dispatch;\r\n\r\n",
        "    void Reset();\r\n};\r\n",
        "class IViewer: public IBase\r\n{\r\npublic:\r\n    using IBase::IBase;\r\n\r\n",
        "    void Attach(IDispatch* host, IUnknown* raw, BSTR** names, class IBase* base);\r\n};\r\n",
        "\r\n",
    );
    assert!(header.ends_with(classes), "{header}");

    let bodies = concat!(
        "// INTERFACES\r\n// ----------\r\n\r\n",
        "// IBase\r\n\r\nvoid IBase::Reset()\r\n{\r\n    invoke<void>(0x60020000, tlbgen::METHOD);\r\n}\r\n",
        "// IViewer\r\n\r\n",
        "void IViewer::Attach(IDispatch* host, IUnknown* raw, BSTR** names, class IBase* base)\r\n{\r\n",
        "    invoke<void>(0x60020000, tlbgen::METHOD, host, raw, names, base);\r\n}\r\n",
        "\r\n",
    );
    assert!(source.ends_with(bodies), "{source}");
}

#[test]
fn test_vtable_interface_not_emitted()
{
    let (header, source) = layout_files();
    assert!(!header.contains("IEngine"));
    assert!(!source.contains("IEngine"));
    assert!(!source.contains("Spin"));
}
