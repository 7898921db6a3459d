//! Built-in `stdole` library.
//!
//! Holds the two interfaces every automation interface derives from, so
//! that `{"user": "IDispatch"}` in a manifest resolves to a member of
//! another library, the way it does against a registered type library.

/// Manifest of the built-in library
pub(crate) const MANIFEST: &str = r#"{
    "name": "stdole",
    "doc": "OLE Automation",
    "guid": "00020430-0000-0000-c000-000000000046",
    "version": { "major": 2, "minor": 0 },
    "types": [
        {
            "name": "IUnknown",
            "kind": "interface",
            "guid": "00000000-0000-0000-c000-000000000046",
            "flags": ["hidden"],
            "functions": [
                {
                    "name": "QueryInterface",
                    "id": 1610612736,
                    "flags": ["restricted"],
                    "params": [
                        { "name": "riid", "type": { "pointer": { "primitive": "void" } } },
                        { "name": "ppvObj", "type": { "pointer": { "pointer": { "primitive": "void" } } }, "flags": ["out"] }
                    ]
                },
                { "name": "AddRef", "id": 1610612737, "flags": ["restricted"], "returns": { "primitive": "ui4" } },
                { "name": "Release", "id": 1610612738, "flags": ["restricted"], "returns": { "primitive": "ui4" } }
            ]
        },
        {
            "name": "IDispatch",
            "kind": "interface",
            "guid": "00020400-0000-0000-c000-000000000046",
            "flags": ["hidden"],
            "implements": ["IUnknown"],
            "functions": [
                {
                    "name": "GetTypeInfoCount",
                    "id": 1610678272,
                    "flags": ["restricted"],
                    "params": [ { "name": "pctinfo", "type": { "pointer": { "primitive": "uint" } }, "flags": ["out"] } ]
                },
                {
                    "name": "GetTypeInfo",
                    "id": 1610678273,
                    "flags": ["restricted"],
                    "params": [
                        { "name": "itinfo", "type": { "primitive": "uint" } },
                        { "name": "lcid", "type": { "primitive": "ui4" } },
                        { "name": "pptinfo", "type": { "pointer": { "pointer": { "primitive": "void" } } }, "flags": ["out"] }
                    ]
                },
                {
                    "name": "GetIDsOfNames",
                    "id": 1610678274,
                    "flags": ["restricted"],
                    "params": [
                        { "name": "riid", "type": { "pointer": { "primitive": "void" } } },
                        { "name": "rgszNames", "type": { "pointer": { "pointer": { "primitive": "i1" } } } },
                        { "name": "cNames", "type": { "primitive": "uint" } },
                        { "name": "lcid", "type": { "primitive": "ui4" } },
                        { "name": "rgdispid", "type": { "pointer": { "primitive": "i4" } }, "flags": ["out"] }
                    ]
                },
                {
                    "name": "Invoke",
                    "id": 1610678275,
                    "flags": ["restricted"],
                    "params": [
                        { "name": "dispidMember", "type": { "primitive": "i4" } },
                        { "name": "riid", "type": { "pointer": { "primitive": "void" } } },
                        { "name": "lcid", "type": { "primitive": "ui4" } },
                        { "name": "wFlags", "type": { "primitive": "ui2" } },
                        { "name": "pdispparams", "type": { "pointer": { "primitive": "void" } } },
                        { "name": "pvarResult", "type": { "pointer": { "primitive": "variant" } }, "flags": ["out"] },
                        { "name": "pexcepinfo", "type": { "pointer": { "primitive": "void" } }, "flags": ["out"] },
                        { "name": "puArgErr", "type": { "pointer": { "primitive": "uint" } }, "flags": ["out"] }
                    ]
                }
            ]
        }
    ]
}"#;

/// Names resolved against this library
pub const UNKNOWN: &str = "IUnknown";
/// See [`UNKNOWN`]
pub const DISPATCH: &str = "IDispatch";
